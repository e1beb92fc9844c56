use crate::record::{
    CandidateRecord, CategoryRecord, ImageRecord, PollOptionVotesRecord, PollRecord, StubRecord,
    ThreadRecord, UserRecord, VoteTallyRecord, poll_tally,
};
use socialsquare_common::model::{
    Id, ModelValidationError,
    post::{Category, CategoryMarker, Post, PostKind, PostMarker, PostStub},
    user::{PublicId, User, UserMarker},
    vote::{PollTally, VoteTally},
};
use socialsquare_feed::ranking::RankingCandidate;
use sqlx::{PgPool, migrate::MigrateError, query_as, query_scalar};
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const USER_COLUMNS: &str = "
    users.user_id,
    users.public_id,
    users.handle,
    users.display_name,
    users.profile_image_key,
    users.following
";

/// Table holding the posts of `kind`.
fn post_table(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Image => "posts.images",
        PostKind::Poll => "posts.polls",
        PostKind::Thread => "posts.threads",
    }
}

/// Columns specific to the posts of `kind`, as selected from alias `p`.
fn content_columns(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Image => "p.image_key, p.title, p.description, p.allow_screenshots, p.tags",
        PostKind::Poll => {
            "p.title, p.subtitle, p.option_texts, p.option_colors, p.allow_screenshots"
        }
        PostKind::Thread => {
            "p.title, p.subtitle, p.body, p.tags, p.category_id, p.image_key, \
             p.image_description, p.nsfw, p.nsfl"
        }
    }
}

/// Aggregates the exposure counters of post `p` of kind `$1` into `viewers` and `amounts`.
const EXPOSURE_JOIN: &str = "
    LEFT JOIN LATERAL (
        SELECT
            array_agg(exposures.viewer_public_id) AS viewers,
            array_agg(exposures.amount) AS amounts
        FROM
            posts.exposures
        WHERE
            exposures.kind = $1
            AND exposures.post_id = p.post_id
    ) exposure ON TRUE
";

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users.users WHERE users.user_id = $1"
        ))
        .bind(user_id.get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_by_public_id(&self, public_id: PublicId) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users.users WHERE users.public_id = $1"
        ))
        .bind(public_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    /// Stubs of all posts of `kind` by `creator`, with `interacted` computed for `viewer`.
    pub async fn fetch_stubs(
        &self,
        kind: PostKind,
        creator: Id<UserMarker>,
        viewer: PublicId,
    ) -> Result<Vec<PostStub>> {
        let query = format!(
            "
            SELECT
                p.post_id,
                p.date_posted,
                exposure.viewers,
                exposure.amounts,
                EXISTS (
                    SELECT 1
                    FROM engagement.votes
                    WHERE
                        votes.kind = $1
                        AND votes.post_id = p.post_id
                        AND votes.voter_public_id = $3
                ) AS interacted
            FROM
                {table} p
                {EXPOSURE_JOIN}
            WHERE
                p.creator_id = $2
            ",
            table = post_table(kind),
        );

        let records = query_as::<_, StubRecord>(&query)
            .bind(kind.as_str())
            .bind(creator.get().cast_signed())
            .bind(viewer.get())
            .fetch_all(&self.pool)
            .await?;

        let stubs = records
            .into_iter()
            .map(|record| record.into_stub(kind))
            .collect::<Result<_, _>>()?;
        Ok(stubs)
    }

    /// Full records of the dated posts of `kind` among `ids`.
    pub async fn fetch_posts(&self, kind: PostKind, ids: &[Id<PostMarker>]) -> Result<Vec<Post>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get().cast_signed()).collect();
        let query = format!(
            "
            SELECT
                p.post_id,
                p.creator_id,
                p.date_posted,
                {columns}
            FROM
                {table} p
            WHERE
                p.post_id = ANY($1)
                AND p.date_posted IS NOT NULL
            ",
            columns = content_columns(kind),
            table = post_table(kind),
        );

        debug!(%kind, posts = ids.len(), "Fetching posts");
        let posts = match kind {
            PostKind::Image => self.fetch_records::<ImageRecord>(&query, ids).await?,
            PostKind::Poll => self.fetch_records::<PollRecord>(&query, ids).await?,
            PostKind::Thread => self.fetch_records::<ThreadRecord>(&query, ids).await?,
        };
        Ok(posts)
    }

    async fn fetch_records<R>(&self, query: &str, ids: Vec<i64>) -> Result<Vec<Post>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
        Post: TryFrom<R, Error = ModelValidationError>,
    {
        let records = query_as::<_, R>(query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    /// Adds one exposure of `post` to `viewer` in a single statement. Returns the new amount,
    /// or `None` if no post of `kind` has that id.
    pub async fn increment_exposure(
        &self,
        kind: PostKind,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> Result<Option<u32>> {
        let query = format!(
            "
            INSERT INTO posts.exposures (kind, post_id, viewer_public_id, amount)
            SELECT $1, $2, $3, 1
            WHERE EXISTS (SELECT 1 FROM {table} WHERE post_id = $2)
            ON CONFLICT (kind, post_id, viewer_public_id)
            DO UPDATE SET amount = exposures.amount + 1
            RETURNING exposures.amount
            ",
            table = post_table(kind),
        );

        let amount: Option<i32> = query_scalar(&query)
            .bind(kind.as_str())
            .bind(post.get().cast_signed())
            .bind(viewer.get())
            .fetch_optional(&self.pool)
            .await?;

        let amount = amount
            .map(|amount| {
                u32::try_from(amount)
                    .map_err(|_| ModelValidationError::NegativeCount(i64::from(amount)))
            })
            .transpose()?;
        Ok(amount)
    }

    pub async fn fetch_vote_tally(
        &self,
        kind: PostKind,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> Result<VoteTally> {
        let record = query_as::<_, VoteTallyRecord>(
            "
            SELECT
                COUNT(*) FILTER (WHERE votes.is_upvote) AS upvotes,
                COUNT(*) FILTER (WHERE NOT votes.is_upvote) AS downvotes,
                MAX(votes.vote_id) FILTER (WHERE votes.voter_public_id = $3) AS viewer_vote_id,
                BOOL_OR(votes.is_upvote) FILTER (WHERE votes.voter_public_id = $3) AS viewer_upvoted
            FROM
                engagement.votes
            WHERE
                votes.kind = $1
                AND votes.post_id = $2
            ",
        )
        .bind(kind.as_str())
        .bind(post.get().cast_signed())
        .bind(viewer.get())
        .fetch_one(&self.pool)
        .await?;

        let tally = VoteTally::try_from(record)?;
        Ok(tally)
    }

    pub async fn fetch_poll_tally(
        &self,
        post: Id<PostMarker>,
        viewer: Id<UserMarker>,
        options: usize,
    ) -> Result<PollTally> {
        let records = query_as::<_, PollOptionVotesRecord>(
            "
            SELECT
                poll_votes.option_index,
                COUNT(*) AS votes,
                BOOL_OR(poll_votes.voter_id = $2) AS voted
            FROM
                engagement.poll_votes
            WHERE
                poll_votes.post_id = $1
            GROUP BY
                poll_votes.option_index
            ",
        )
        .bind(post.get().cast_signed())
        .bind(viewer.get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let tally = poll_tally(records, options)?;
        Ok(tally)
    }

    pub async fn fetch_comment_count(&self, kind: PostKind, post: Id<PostMarker>) -> Result<u64> {
        let count: i64 = query_scalar(
            "
            SELECT COUNT(*)
            FROM engagement.comments
            WHERE
                comments.kind = $1
                AND comments.post_id = $2
            ",
        )
        .bind(kind.as_str())
        .bind(post.get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        let count = u64::try_from(count).map_err(|_| ModelValidationError::NegativeCount(count))?;
        Ok(count)
    }

    pub async fn fetch_category(&self, id: Id<CategoryMarker>) -> Result<Option<Category>> {
        let record = query_as::<_, CategoryRecord>(
            "
            SELECT
                categories.category_id,
                categories.title,
                categories.image_key
            FROM
                engagement.categories
            WHERE
                categories.category_id = $1
            ",
        )
        .bind(id.get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Category::from))
    }

    /// The `limit` most recent dated image posts with their engagement figures.
    pub async fn fetch_image_candidates(
        &self,
        viewer: PublicId,
        limit: usize,
    ) -> Result<Vec<RankingCandidate>> {
        let records = query_as::<_, CandidateRecord>(
            "
            SELECT
                p.post_id,
                p.date_posted,
                COALESCE((
                    SELECT SUM(CASE WHEN votes.is_upvote THEN 1 ELSE -1 END)
                    FROM engagement.votes
                    WHERE votes.kind = 'Image' AND votes.post_id = p.post_id
                ), 0)::INT8 AS score,
                COALESCE((
                    SELECT SUM(exposures.amount)
                    FROM posts.exposures
                    WHERE exposures.kind = 'Image' AND exposures.post_id = p.post_id
                ), 0)::INT8 AS total_views,
                COALESCE((
                    SELECT exposures.amount
                    FROM posts.exposures
                    WHERE
                        exposures.kind = 'Image'
                        AND exposures.post_id = p.post_id
                        AND exposures.viewer_public_id = $1
                ), 0) AS viewer_exposure
            FROM
                posts.images p
            WHERE
                p.date_posted IS NOT NULL
            ORDER BY
                p.date_posted DESC
            LIMIT $2
            ",
        )
        .bind(viewer.get())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let candidates = records
            .into_iter()
            .map(RankingCandidate::try_from)
            .collect::<Result<_, _>>()?;
        Ok(candidates)
    }
}
