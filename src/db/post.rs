use super::DBClient;
use crate::dtos::PostDto;
use crate::models::{Post, PostState};
use uuid::Uuid;

const POST_DTO_COLUMNS: &str = r#"
    p.id, u.username AS user_username, p.title, p.content, p.category_id,
    p.world_cup_id, p.state, p.likes_count, p.dislikes_count, p.approved_at,
    p.created_at, p.updated_at
"#;

/// Post database operations trait.
///
/// State transitions are compare-and-set updates: the caller validates the
/// transition against the current state (via `moderation`), then the UPDATE
/// carries `AND state = $from` so a concurrent moderator cannot sneak an
/// invalid edge in between. Zero rows affected means the post moved under
/// the caller's feet.
pub trait PostExt {
    /// Insert a new post in the `pending` state.
    async fn create_post(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<Post, sqlx::Error>;

    /// Raw row, any state, including soft-deleted posts.
    async fn get_post(&self, post_id: i32) -> Result<Option<Post>, sqlx::Error>;

    /// Row joined with the author's username for responses.
    async fn get_post_dto(&self, post_id: i32) -> Result<Option<PostDto>, sqlx::Error>;

    /// Public feed: approved + active posts, newest first, optionally
    /// filtered by category and World Cup edition.
    async fn get_feed(
        &self,
        page: i32,
        limit: i32,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<Vec<PostDto>, sqlx::Error>;

    async fn get_feed_count(
        &self,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<i64, sqlx::Error>;

    /// Moderation queue: active posts in the given state, newest first.
    async fn list_by_state(
        &self,
        state: PostState,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PostDto>, sqlx::Error>;

    async fn count_by_state(&self, state: PostState) -> Result<i64, sqlx::Error>;

    /// `from -> approved`, stamping approval time and moderator.
    /// Returns rows affected (0 = state changed concurrently).
    async fn approve_post(
        &self,
        post_id: i32,
        moderator_id: Uuid,
        from: PostState,
    ) -> Result<u64, sqlx::Error>;

    /// `pending -> rejected`. Returns rows affected.
    async fn reject_post(&self, post_id: i32) -> Result<u64, sqlx::Error>;

    /// Author edit, only valid while the post is in `from` (pending or
    /// rejected). Returns rows affected.
    async fn edit_post(
        &self,
        post_id: i32,
        user_id: Uuid,
        title: &str,
        content: &str,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
        from: PostState,
    ) -> Result<u64, sqlx::Error>;

    /// The author's own posts in any state (pending/rejected included),
    /// newest first.
    async fn list_user_posts(
        &self,
        user_id: Uuid,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PostDto>, sqlx::Error>;

    /// Soft delete; the row stays for audit. Returns rows affected.
    async fn soft_delete_post(&self, post_id: i32) -> Result<u64, sqlx::Error>;

    /// Count of active posts authored by the user.
    async fn get_user_post_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

impl PostExt for DBClient {
    async fn create_post(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<Post, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (user_id, title, content, category_id, world_cup_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(world_cup_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn get_post(&self, post_id: i32) -> Result<Option<Post>, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn get_post_dto(&self, post_id: i32) -> Result<Option<PostDto>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {POST_DTO_COLUMNS}
            FROM post p
            INNER JOIN users u ON p.user_id = u.id
            WHERE p.id = $1
            "#
        );

        let post = sqlx::query_as::<_, PostDto>(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn get_feed(
        &self,
        page: i32,
        limit: i32,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<Vec<PostDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {POST_DTO_COLUMNS}
            FROM post p
            INNER JOIN users u ON p.user_id = u.id
            WHERE p.state = $1 AND p.active
              AND ($2::int IS NULL OR p.category_id = $2)
              AND ($3::int IS NULL OR p.world_cup_id = $3)
            ORDER BY p.created_at DESC
            LIMIT $4 OFFSET $5
            "#
        );

        let posts = sqlx::query_as::<_, PostDto>(&query)
            .bind(PostState::Approved)
            .bind(category_id)
            .bind(world_cup_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn get_feed_count(
        &self,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM post p
            WHERE p.state = $1 AND p.active
              AND ($2::int IS NULL OR p.category_id = $2)
              AND ($3::int IS NULL OR p.world_cup_id = $3)
            "#,
        )
        .bind(PostState::Approved)
        .bind(category_id)
        .bind(world_cup_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_by_state(
        &self,
        state: PostState,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PostDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {POST_DTO_COLUMNS}
            FROM post p
            INNER JOIN users u ON p.user_id = u.id
            WHERE p.state = $1 AND p.active
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let posts = sqlx::query_as::<_, PostDto>(&query)
            .bind(state)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn count_by_state(&self, state: PostState) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post WHERE state = $1 AND active")
                .bind(state)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn approve_post(
        &self,
        post_id: i32,
        moderator_id: Uuid,
        from: PostState,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE post
            SET state = $1, approved_at = NOW(), approved_by = $2, updated_at = NOW()
            WHERE id = $3 AND state = $4 AND active
            "#,
        )
        .bind(PostState::Approved)
        .bind(moderator_id)
        .bind(post_id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn reject_post(&self, post_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE post
            SET state = $1, updated_at = NOW()
            WHERE id = $2 AND state = $3 AND active
            "#,
        )
        .bind(PostState::Rejected)
        .bind(post_id)
        .bind(PostState::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn edit_post(
        &self,
        post_id: i32,
        user_id: Uuid,
        title: &str,
        content: &str,
        category_id: Option<i32>,
        world_cup_id: Option<i32>,
        from: PostState,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE post
            SET title = $1, content = $2, category_id = $3, world_cup_id = $4, updated_at = NOW()
            WHERE id = $5 AND user_id = $6 AND state = $7 AND active
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(world_cup_id)
        .bind(post_id)
        .bind(user_id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_user_posts(
        &self,
        user_id: Uuid,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PostDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {POST_DTO_COLUMNS}
            FROM post p
            INNER JOIN users u ON p.user_id = u.id
            WHERE p.user_id = $1 AND p.active
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let posts = sqlx::query_as::<_, PostDto>(&query)
            .bind(user_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn soft_delete_post(&self, post_id: i32) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE post SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active")
                .bind(post_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn get_user_post_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post WHERE user_id = $1 AND active")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
