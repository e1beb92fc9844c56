use crate::{engine::FeedEngine, error::FeedError};
use socialsquare_common::model::{
    Id,
    post::{Post, PostKind, PostMarker},
    user::UserMarker,
    view::FeedPage,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl FeedEngine {
    /// The for-you feed: image posts picked and ordered by the ranking oracle.
    pub async fn compose_personalized_feed(
        &self,
        viewer_id: Id<UserMarker>,
        already_rendered: &HashSet<Id<PostMarker>>,
    ) -> Result<FeedPage, FeedError> {
        let viewer = self
            .users
            .user_by_id(viewer_id)
            .await?
            .ok_or(FeedError::ViewerNotFound(viewer_id))?;

        let mut ranked = self
            .oracle
            .rank(&viewer, already_rendered, self.page_size)
            .await?;
        ranked.truncate(self.page_size);
        debug!(viewer = %viewer.public_id, ranked = ranked.len(), "Oracle ranked posts");

        if ranked.is_empty() {
            return Err(FeedError::NoUnseenPosts);
        }

        let mut found: HashMap<Id<PostMarker>, Post> = self
            .posts
            .fetch_by_ids(PostKind::Image, &ranked)
            .await?
            .into_iter()
            .map(|post| (post.id, post))
            .collect();
        if found.is_empty() {
            return Err(FeedError::ImagesUnavailable);
        }

        let ordered: Vec<Post> = ranked.iter().filter_map(|id| found.remove(id)).collect();
        let views = self.enricher.enrich(ordered, &viewer).await;
        if views.is_empty() {
            return Err(FeedError::NoValidPosts);
        }

        Ok(FeedPage::new(views))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        FeedError, FeedErrorKind, PAGE_SIZE,
        memory::MemoryStore,
        ranking::{RankingError, RankingOracle},
    };
    use async_trait::async_trait;
    use socialsquare_common::model::{Id, post::PostMarker, user::User};
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    /// Returns a fixed answer and remembers what it was asked.
    struct ScriptedOracle {
        answer: Option<Vec<Id<PostMarker>>>,
        asked: Mutex<Vec<(HashSet<Id<PostMarker>>, usize)>>,
    }

    impl ScriptedOracle {
        fn answering(answer: Option<Vec<Id<PostMarker>>>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RankingOracle for ScriptedOracle {
        async fn rank(
            &self,
            _viewer: &User,
            exclude: &HashSet<Id<PostMarker>>,
            page_size: usize,
        ) -> Result<Vec<Id<PostMarker>>, RankingError> {
            self.asked.lock().unwrap().push((exclude.clone(), page_size));
            self.answer
                .clone()
                .ok_or_else(|| RankingError::Oracle("scripted failure".to_owned()))
        }
    }

    #[tokio::test]
    async fn keeps_oracle_order() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let ada = store.add_user("ada");
        let first = store.add_image(ada.id, 10);
        let second = store.add_image(ada.id, 30);
        let third = store.add_image(ada.id, 20);
        let oracle = ScriptedOracle::answering(Some(vec![second, first, third]));
        let rendered = HashSet::from([Id::new(77)]);

        let page = store
            .engine_with_oracle(oracle.clone())
            .compose_personalized_feed(viewer.id, &rendered)
            .await
            .unwrap();

        assert_eq!(page.ids().collect::<Vec<_>>(), [second, first, third]);
        assert!(page.posts().iter().all(|post| post.has_seen_posts.is_none()));
        assert_eq!(*oracle.asked.lock().unwrap(), [(rendered, PAGE_SIZE)]);
    }

    #[tokio::test]
    async fn nothing_left_to_rank() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");

        let error = store
            .engine_with_oracle(ScriptedOracle::answering(Some(Vec::new())))
            .compose_personalized_feed(viewer.id, &HashSet::new())
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::NoUnseenPosts));
        assert_eq!(error.kind(), FeedErrorKind::NotFound);
        assert!(error.to_string().contains("not seen"));
    }

    #[tokio::test]
    async fn oracle_failure_is_server_error() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");

        let error = store
            .engine_with_oracle(ScriptedOracle::answering(None))
            .compose_personalized_feed(viewer.id, &HashSet::new())
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::Ranking(_)));
        assert_eq!(error.kind(), FeedErrorKind::Server);
    }

    #[tokio::test]
    async fn unknown_ids_and_orphans() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let gone = store.add_user("gone");
        let orphan = store.add_image(gone.id, 10);
        store.orphan(gone.id);

        let unknown = store
            .engine_with_oracle(ScriptedOracle::answering(Some(vec![Id::new(999)])))
            .compose_personalized_feed(viewer.id, &HashSet::new())
            .await
            .unwrap_err();
        assert!(matches!(unknown, FeedError::ImagesUnavailable));

        let orphaned = store
            .engine_with_oracle(ScriptedOracle::answering(Some(vec![orphan])))
            .compose_personalized_feed(viewer.id, &HashSet::new())
            .await
            .unwrap_err();
        assert!(matches!(orphaned, FeedError::NoValidPosts));
        assert_eq!(orphaned.kind(), FeedErrorKind::BadInput);
    }

    #[tokio::test]
    async fn partial_drops_still_succeed() {
        let store = MemoryStore::new();
        let viewer = store.add_user("viewer");
        let ada = store.add_user("ada");
        let gone = store.add_user("gone");
        let kept = store.add_image(ada.id, 10);
        let orphan = store.add_image(gone.id, 20);
        store.orphan(gone.id);

        let page = store
            .engine_with_oracle(ScriptedOracle::answering(Some(vec![orphan, kept])))
            .compose_personalized_feed(viewer.id, &HashSet::new())
            .await
            .unwrap();

        assert_eq!(page.ids().collect::<Vec<_>>(), [kept]);
    }

    #[tokio::test]
    async fn missing_viewer() {
        let store = MemoryStore::new();

        let error = store
            .engine_with_oracle(ScriptedOracle::answering(Some(Vec::new())))
            .compose_personalized_feed(Id::new(1), &HashSet::new())
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::ViewerNotFound(_)));
    }
}
