use crate::model::Id;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct VoteMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
pub enum VoteDirection {
    Up,
    Down,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ViewerVote {
    pub id: Id<VoteMarker>,
    pub direction: VoteDirection,
}

/// Up and down votes of one post, together with the requesting viewer's own vote.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub viewer_vote: Option<ViewerVote>,
}

impl VoteTally {
    #[must_use]
    pub fn score(&self) -> i64 {
        i64::try_from(self.upvotes)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(self.downvotes).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn upvoted(&self) -> bool {
        matches!(
            self.viewer_vote,
            Some(ViewerVote {
                direction: VoteDirection::Up,
                ..
            })
        )
    }

    #[must_use]
    pub fn downvoted(&self) -> bool {
        matches!(
            self.viewer_vote,
            Some(ViewerVote {
                direction: VoteDirection::Down,
                ..
            })
        )
    }
}

/// Per option vote counts of a poll. `voted_for` is the zero based index of the option the
/// viewer picked.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PollTally {
    pub option_votes: Vec<u64>,
    pub voted_for: Option<usize>,
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        vote::{VoteDirection, VoteTally, ViewerVote},
    };

    #[test]
    fn tally_score() {
        let tally = VoteTally {
            upvotes: 3,
            downvotes: 5,
            viewer_vote: Some(ViewerVote {
                id: Id::new(9),
                direction: VoteDirection::Down,
            }),
        };

        assert_eq!(tally.score(), -2);
        assert!(tally.downvoted());
        assert!(!tally.upvoted());
        assert_eq!(VoteTally::default().score(), 0);
    }
}
