use socialsquare_common::model::{
    ModelValidationError,
    post::{
        Category, ImageContent, POLL_MAX_OPTIONS, PollContent, PollOption, Post, PostContent,
        PostKind, PostStub, ThreadContent, ThreadImage, ViewRecord, ViewedBy,
    },
    user::{PublicId, User, UserHandle},
    vote::{PollTally, ViewerVote, VoteDirection, VoteTally},
};
use socialsquare_feed::ranking::RankingCandidate;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub public_id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub profile_image_key: Option<String>,
    pub following: Vec<Uuid>,
}

/// Exposure counters aggregated per post. Both arrays are `NULL` when nobody viewed the post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct ExposureColumns {
    pub viewers: Option<Vec<Uuid>>,
    pub amounts: Option<Vec<i32>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct StubRecord {
    pub post_id: i64,
    pub date_posted: Option<OffsetDateTime>,
    #[sqlx(flatten)]
    pub exposure: ExposureColumns,
    pub interacted: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct ImageRecord {
    pub post_id: i64,
    pub creator_id: i64,
    pub date_posted: OffsetDateTime,
    pub image_key: String,
    pub title: String,
    pub description: String,
    pub allow_screenshots: bool,
    pub tags: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PollRecord {
    pub post_id: i64,
    pub creator_id: i64,
    pub date_posted: OffsetDateTime,
    pub title: String,
    pub subtitle: String,
    pub option_texts: Vec<String>,
    pub option_colors: Vec<String>,
    pub allow_screenshots: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct ThreadRecord {
    pub post_id: i64,
    pub creator_id: i64,
    pub date_posted: OffsetDateTime,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub tags: String,
    pub category_id: i64,
    pub image_key: Option<String>,
    pub image_description: Option<String>,
    pub nsfw: bool,
    pub nsfl: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct VoteTallyRecord {
    pub upvotes: i64,
    pub downvotes: i64,
    pub viewer_vote_id: Option<i64>,
    pub viewer_upvoted: Option<bool>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PollOptionVotesRecord {
    pub option_index: i32,
    pub votes: i64,
    pub voted: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CategoryRecord {
    pub category_id: i64,
    pub title: String,
    pub image_key: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CandidateRecord {
    pub post_id: i64,
    pub date_posted: OffsetDateTime,
    pub score: i64,
    pub total_views: i64,
    pub viewer_exposure: i32,
}

fn count<T: TryFrom<i64>>(value: i64) -> Result<T, ModelValidationError> {
    T::try_from(value).map_err(|_| ModelValidationError::NegativeCount(value))
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            public_id: value.public_id.into(),
            handle: UserHandle::new(value.handle)?,
            display_name: value.display_name,
            profile_image_key: value.profile_image_key,
            following: value.following.into_iter().map(PublicId::from).collect(),
        })
    }
}

impl TryFrom<ExposureColumns> for ViewedBy {
    type Error = ModelValidationError;

    fn try_from(value: ExposureColumns) -> Result<Self, Self::Error> {
        let viewers = value.viewers.unwrap_or_default();
        let amounts = value.amounts.unwrap_or_default();
        if viewers.len() != amounts.len() {
            return Err(ModelValidationError::ExposureMismatch {
                viewers: viewers.len(),
                amounts: amounts.len(),
            });
        }

        viewers
            .into_iter()
            .zip(amounts)
            .map(|(viewer, amount)| -> Result<ViewRecord, ModelValidationError> {
                Ok(ViewRecord {
                    viewer: viewer.into(),
                    amount: count(i64::from(amount))?,
                })
            })
            .collect()
    }
}

impl StubRecord {
    pub(crate) fn into_stub(self, kind: PostKind) -> Result<PostStub, ModelValidationError> {
        Ok(PostStub {
            id: self.post_id.cast_unsigned().into(),
            kind,
            date_posted: self.date_posted.map(OffsetDateTime::to_utc),
            viewed_by: self.exposure.try_into()?,
            interacted: self.interacted,
        })
    }
}

impl TryFrom<ImageRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: ImageRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            creator_id: value.creator_id.cast_unsigned().into(),
            date_posted: value.date_posted.to_utc(),
            content: PostContent::Image(ImageContent {
                image_key: value.image_key,
                title: value.title,
                description: value.description,
                allow_screenshots: value.allow_screenshots,
                tags: value.tags,
            }),
        })
    }
}

impl TryFrom<PollRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PollRecord) -> Result<Self, Self::Error> {
        let (texts, colors) = (value.option_texts, value.option_colors);
        if texts.len() != colors.len() {
            return Err(ModelValidationError::PollOptionMismatch {
                texts: texts.len(),
                colors: colors.len(),
            });
        }
        if texts.len() > POLL_MAX_OPTIONS {
            return Err(ModelValidationError::TooManyPollOptions(texts.len()));
        }

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            creator_id: value.creator_id.cast_unsigned().into(),
            date_posted: value.date_posted.to_utc(),
            content: PostContent::Poll(PollContent {
                title: value.title,
                subtitle: value.subtitle,
                options: texts
                    .into_iter()
                    .zip(colors)
                    .map(|(text, color)| PollOption { text, color })
                    .collect(),
                allow_screenshots: value.allow_screenshots,
            }),
        })
    }
}

impl TryFrom<ThreadRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: ThreadRecord) -> Result<Self, Self::Error> {
        let image = value.image_key.map(|key| ThreadImage {
            key,
            description: value.image_description.unwrap_or_default(),
        });

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            creator_id: value.creator_id.cast_unsigned().into(),
            date_posted: value.date_posted.to_utc(),
            content: PostContent::Thread(ThreadContent {
                title: value.title,
                subtitle: value.subtitle,
                body: value.body,
                tags: value.tags,
                category_id: value.category_id.cast_unsigned().into(),
                image,
                nsfw: value.nsfw,
                nsfl: value.nsfl,
            }),
        })
    }
}

impl TryFrom<VoteTallyRecord> for VoteTally {
    type Error = ModelValidationError;

    fn try_from(value: VoteTallyRecord) -> Result<Self, Self::Error> {
        let viewer_vote = value
            .viewer_vote_id
            .zip(value.viewer_upvoted)
            .map(|(id, upvoted)| ViewerVote {
                id: id.cast_unsigned().into(),
                direction: if upvoted {
                    VoteDirection::Up
                } else {
                    VoteDirection::Down
                },
            });

        Ok(Self {
            upvotes: count(value.upvotes)?,
            downvotes: count(value.downvotes)?,
            viewer_vote,
        })
    }
}

/// Folds per option vote counts into a tally over `options` options. Votes for options that
/// no longer exist are ignored.
pub(crate) fn poll_tally(
    records: Vec<PollOptionVotesRecord>,
    options: usize,
) -> Result<PollTally, ModelValidationError> {
    let mut tally = PollTally {
        option_votes: vec![0; options],
        voted_for: None,
    };

    for record in records {
        let index: usize = count(i64::from(record.option_index))?;
        if let Some(votes) = tally.option_votes.get_mut(index) {
            *votes = count(record.votes)?;
            if record.voted {
                tally.voted_for = Some(index);
            }
        }
    }

    Ok(tally)
}

impl From<CategoryRecord> for Category {
    fn from(value: CategoryRecord) -> Self {
        Self {
            id: value.category_id.cast_unsigned().into(),
            title: value.title,
            image_key: value.image_key,
        }
    }
}

impl TryFrom<CandidateRecord> for RankingCandidate {
    type Error = ModelValidationError;

    fn try_from(value: CandidateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            date_posted: value.date_posted.to_utc(),
            score: value.score,
            total_views: count(value.total_views)?,
            viewer_exposure: count(i64::from(value.viewer_exposure))?,
        })
    }
}
