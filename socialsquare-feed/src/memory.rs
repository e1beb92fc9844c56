//! In-memory stores backing the engine tests.

use crate::{
    Enricher, FeedEngine, FeedStores, PostRepository,
    ranking::{EngagementRanking, RankingCandidate, RankingCandidates, RankingOracle},
    store::{EngagementStore, PostStore, StoreError, StoreResult, UserDirectory},
};
use async_trait::async_trait;
use socialsquare_common::model::{
    Id,
    post::{
        Category, CategoryMarker, ImageContent, PollContent, PollOption, Post, PostContent,
        PostKind, PostMarker, PostStub, ThreadContent, ViewedBy,
    },
    user::{PublicId, User, UserHandle, UserMarker},
    vote::{PollTally, VoteDirection, VoteMarker, VoteTally, ViewerVote},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};
use time::{Duration, UtcDateTime};
use uuid::Uuid;

struct StoredPost {
    post: Post,
    dated: bool,
    viewed_by: ViewedBy,
}

struct StoredVote {
    id: Id<VoteMarker>,
    kind: PostKind,
    post: Id<PostMarker>,
    voter: PublicId,
    direction: VoteDirection,
}

#[derive(Default)]
struct State {
    last_id: u64,
    users: Vec<User>,
    orphaned: HashSet<Id<UserMarker>>,
    posts: Vec<StoredPost>,
    votes: Vec<StoredVote>,
    poll_votes: Vec<(Id<PostMarker>, Id<UserMarker>, usize)>,
    comments: HashMap<(PostKind, Id<PostMarker>), u64>,
    categories: Vec<Category>,
    failing: HashSet<PostKind>,
}

impl State {
    fn next_id<Marker>(&mut self) -> Id<Marker> {
        self.last_id += 1;
        Id::new(self.last_id)
    }

    fn post_mut(&mut self, id: Id<PostMarker>) -> &mut StoredPost {
        self.posts
            .iter_mut()
            .find(|stored| stored.post.id == id)
            .expect("unknown post")
    }

    fn check(&self, kind: PostKind) -> StoreResult<()> {
        if self.failing.contains(&kind) {
            Err(StoreError::new(format!("{kind} collection is unavailable")))
        } else {
            Ok(())
        }
    }

    fn tally(&self, kind: PostKind, post: Id<PostMarker>, viewer: PublicId) -> VoteTally {
        let mut tally = VoteTally::default();
        for vote in self
            .votes
            .iter()
            .filter(|vote| vote.kind == kind && vote.post == post)
        {
            match vote.direction {
                VoteDirection::Up => tally.upvotes += 1,
                VoteDirection::Down => tally.downvotes += 1,
            }
            if vote.voter == viewer {
                tally.viewer_vote = Some(ViewerVote {
                    id: vote.id,
                    direction: vote.direction,
                });
            }
        }
        tally
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

struct MemoryPostStore {
    kind: PostKind,
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn add_user(&self, handle: &str) -> User {
        let mut state = self.state();
        let id: Id<UserMarker> = state.next_id();
        let user = User {
            id,
            public_id: PublicId(Uuid::from_u128(u128::from(id.get()))),
            handle: UserHandle::new(handle.to_owned()).unwrap(),
            display_name: handle.to_uppercase(),
            profile_image_key: None,
            following: Vec::new(),
        };
        state.users.push(user.clone());
        user
    }

    pub(crate) fn follow(&self, follower: Id<UserMarker>, followed: PublicId) {
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|user| user.id == follower)
            .expect("unknown follower");
        user.following.push(followed);
    }

    /// Makes lookups by internal id fail, as for an account deleted while its posts remain.
    pub(crate) fn orphan(&self, user: Id<UserMarker>) {
        self.state().orphaned.insert(user);
    }

    pub(crate) fn fail_kind(&self, kind: PostKind) {
        self.state().failing.insert(kind);
    }

    fn add_post(
        &self,
        creator: Id<UserMarker>,
        seconds: i64,
        content: impl FnOnce(&mut State, Id<PostMarker>) -> PostContent,
    ) -> Id<PostMarker> {
        let mut state = self.state();
        let id = state.next_id();
        let content = content(&mut state, id);
        state.posts.push(StoredPost {
            post: Post {
                id,
                creator_id: creator,
                date_posted: UtcDateTime::UNIX_EPOCH + Duration::seconds(seconds),
                content,
            },
            dated: true,
            viewed_by: ViewedBy::default(),
        });
        id
    }

    pub(crate) fn add_image(&self, creator: Id<UserMarker>, seconds: i64) -> Id<PostMarker> {
        self.add_post(creator, seconds, |_, id| {
            PostContent::Image(ImageContent {
                image_key: format!("image-{id}"),
                title: format!("Image {id}"),
                ..ImageContent::default()
            })
        })
    }

    pub(crate) fn add_poll(&self, creator: Id<UserMarker>, seconds: i64) -> Id<PostMarker> {
        self.add_post(creator, seconds, |_, id| {
            PostContent::Poll(PollContent {
                title: format!("Poll {id}"),
                options: ["yes", "no"]
                    .map(|text| PollOption {
                        text: text.to_owned(),
                        color: "Red".to_owned(),
                    })
                    .to_vec(),
                ..PollContent::default()
            })
        })
    }

    pub(crate) fn add_thread(&self, creator: Id<UserMarker>, seconds: i64) -> Id<PostMarker> {
        self.add_post(creator, seconds, |state, id| {
            let category_id: Id<CategoryMarker> = state.next_id();
            state.categories.push(Category {
                id: category_id,
                title: format!("category of {id}"),
                image_key: None,
            });
            PostContent::Thread(ThreadContent {
                title: format!("Thread {id}"),
                category_id,
                ..ThreadContent::default()
            })
        })
    }

    pub(crate) fn clear_date(&self, post: Id<PostMarker>) {
        self.state().post_mut(post).dated = false;
    }

    pub(crate) fn remove_category_of(&self, post: Id<PostMarker>) {
        let mut state = self.state();
        let PostContent::Thread(thread) = &state.post_mut(post).post.content else {
            panic!("not a thread");
        };
        let category = thread.category_id;
        state.categories.retain(|existing| existing.id != category);
    }

    pub(crate) fn set_exposure(&self, post: Id<PostMarker>, viewer: PublicId, amount: u32) {
        let mut state = self.state();
        let viewed_by = &mut state.post_mut(post).viewed_by;
        while viewed_by.amount_for(viewer) < amount {
            viewed_by.record_exposure(viewer);
        }
    }

    pub(crate) fn exposure(&self, post: Id<PostMarker>, viewer: PublicId) -> u32 {
        self.state().post_mut(post).viewed_by.amount_for(viewer)
    }

    pub(crate) fn vote(
        &self,
        post: Id<PostMarker>,
        kind: PostKind,
        voter: PublicId,
        direction: VoteDirection,
    ) -> Id<VoteMarker> {
        let mut state = self.state();
        let id = state.next_id();
        state.votes.push(StoredVote {
            id,
            kind,
            post,
            voter,
            direction,
        });
        id
    }

    pub(crate) fn poll_vote(&self, post: Id<PostMarker>, voter: Id<UserMarker>, option: usize) {
        self.state().poll_votes.push((post, voter, option));
    }

    pub(crate) fn add_comments(&self, post: Id<PostMarker>, kind: PostKind, amount: u64) {
        *self.state().comments.entry((kind, post)).or_default() += amount;
    }

    pub(crate) fn posts(&self, ids: &[Id<PostMarker>]) -> Vec<Post> {
        let mut state = self.state();
        ids.iter()
            .map(|&id| state.post_mut(id).post.clone())
            .collect()
    }

    pub(crate) fn post_store(&self, kind: PostKind) -> Arc<dyn PostStore> {
        Arc::new(MemoryPostStore {
            kind,
            state: Arc::clone(&self.state),
        })
    }

    pub(crate) fn repository(&self) -> PostRepository {
        PostRepository::new(
            self.post_store(PostKind::Image),
            self.post_store(PostKind::Poll),
            self.post_store(PostKind::Thread),
        )
    }

    pub(crate) fn enricher(&self) -> Enricher {
        Enricher::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    pub(crate) fn ranking(&self, candidate_limit: usize) -> EngagementRanking {
        EngagementRanking::new(Arc::new(self.clone()), candidate_limit)
    }

    pub(crate) fn engine(&self) -> FeedEngine {
        self.engine_with_oracle(Arc::new(self.ranking(200)))
    }

    pub(crate) fn engine_with_oracle(&self, oracle: Arc<dyn RankingOracle>) -> FeedEngine {
        FeedEngine::new(FeedStores {
            users: Arc::new(self.clone()),
            posts: self.repository(),
            engagement: Arc::new(self.clone()),
            oracle,
        })
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn user_by_id(&self, id: Id<UserMarker>) -> StoreResult<Option<User>> {
        let state = self.state();
        if state.orphaned.contains(&id) {
            return Ok(None);
        }
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn user_by_public_id(&self, public_id: PublicId) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.public_id == public_id)
            .cloned())
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    fn kind(&self) -> PostKind {
        self.kind
    }

    async fn stubs_by_creator(
        &self,
        creator: Id<UserMarker>,
        viewer: PublicId,
    ) -> StoreResult<Vec<PostStub>> {
        let state = self.state.lock().unwrap();
        state.check(self.kind)?;

        Ok(state
            .posts
            .iter()
            .filter(|stored| stored.post.kind() == self.kind && stored.post.creator_id == creator)
            .map(|stored| PostStub {
                id: stored.post.id,
                kind: self.kind,
                date_posted: stored.dated.then_some(stored.post.date_posted),
                viewed_by: stored.viewed_by.clone(),
                interacted: state
                    .tally(self.kind, stored.post.id, viewer)
                    .viewer_vote
                    .is_some(),
            })
            .collect())
    }

    async fn posts_by_ids(&self, ids: &[Id<PostMarker>]) -> StoreResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        state.check(self.kind)?;

        // Reverse order, callers must not rely on it.
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|stored| {
                stored.dated && stored.post.kind() == self.kind && ids.contains(&stored.post.id)
            })
            .map(|stored| stored.post.clone())
            .collect())
    }

    async fn increment_exposure(
        &self,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<Option<u32>> {
        let mut state = self.state.lock().unwrap();
        state.check(self.kind)?;

        Ok(state
            .posts
            .iter_mut()
            .find(|stored| stored.post.kind() == self.kind && stored.post.id == post)
            .map(|stored| stored.viewed_by.record_exposure(viewer)))
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn vote_tally(
        &self,
        kind: PostKind,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<VoteTally> {
        Ok(self.state().tally(kind, post, viewer))
    }

    async fn poll_tally(
        &self,
        post: Id<PostMarker>,
        viewer: Id<UserMarker>,
        options: usize,
    ) -> StoreResult<PollTally> {
        let state = self.state();
        let mut tally = PollTally {
            option_votes: vec![0; options],
            voted_for: None,
        };
        for &(_, voter, option) in state.poll_votes.iter().filter(|vote| vote.0 == post) {
            if let Some(votes) = tally.option_votes.get_mut(option) {
                *votes += 1;
            }
            if voter == viewer {
                tally.voted_for = Some(option);
            }
        }
        Ok(tally)
    }

    async fn comment_count(&self, kind: PostKind, post: Id<PostMarker>) -> StoreResult<u64> {
        Ok(self
            .state()
            .comments
            .get(&(kind, post))
            .copied()
            .unwrap_or(0))
    }

    async fn category(&self, id: Id<CategoryMarker>) -> StoreResult<Option<Category>> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned())
    }
}

#[async_trait]
impl RankingCandidates for MemoryStore {
    async fn recent_image_candidates(
        &self,
        viewer: PublicId,
        limit: usize,
    ) -> StoreResult<Vec<RankingCandidate>> {
        let state = self.state();
        state.check(PostKind::Image)?;

        let mut images: Vec<&StoredPost> = state
            .posts
            .iter()
            .filter(|stored| stored.dated && stored.post.kind() == PostKind::Image)
            .collect();
        images.sort_by(|a, b| b.post.date_posted.cmp(&a.post.date_posted));

        Ok(images
            .into_iter()
            .take(limit)
            .map(|stored| RankingCandidate {
                id: stored.post.id,
                date_posted: stored.post.date_posted,
                score: state.tally(PostKind::Image, stored.post.id, viewer).score(),
                total_views: stored
                    .viewed_by
                    .iter()
                    .map(|record| u64::from(record.amount))
                    .sum(),
                viewer_exposure: stored.viewed_by.amount_for(viewer),
            })
            .collect())
    }
}
