use super::DBClient;
use crate::dtos::CommentDto;
use crate::models::Comment;
use uuid::Uuid;

/// Comment database operations trait
pub trait CommentExt {
    /// Get paginated active comments for a post with sorting
    async fn get_comments(
        &self,
        post_id: i32,
        page: i32,
        limit: i32,
        sort: &str,
    ) -> Result<Vec<CommentDto>, sqlx::Error>;

    /// Raw row, including soft-deleted comments.
    async fn get_comment(&self, comment_id: i32) -> Result<Option<Comment>, sqlx::Error>;

    /// Create new comment on a post
    async fn create_comment(
        &self,
        user_id: Uuid,
        post_id: i32,
        content: &str,
    ) -> Result<CommentDto, sqlx::Error>;

    /// Update comment content; marks the row as edited and stamps the edit
    /// time. Ownership is part of the WHERE clause.
    async fn edit_comment(
        &self,
        user_id: Uuid,
        comment_id: i32,
        content: &str,
    ) -> Result<Option<CommentDto>, sqlx::Error>;

    /// Soft delete (author or moderator decides upstream). Returns rows
    /// affected.
    async fn soft_delete_comment(&self, comment_id: i32) -> Result<u64, sqlx::Error>;

    /// Count active comments on a post
    async fn get_post_comment_count(&self, post_id: i32) -> Result<i64, sqlx::Error>;

    /// Count active comments by user
    async fn get_user_comment_count(&self, user_id: &Uuid) -> Result<i64, sqlx::Error>;
}

impl CommentExt for DBClient {
    async fn get_comments(
        &self,
        post_id: i32,
        page: i32,
        limit: i32,
        sort: &str,
    ) -> Result<Vec<CommentDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        // sort = "created_at_asc" for ascending, otherwise descending;
        // validated upstream, the ORDER BY is never user-supplied text.
        let order_by = if sort == "created_at_asc" {
            "c.created_at ASC"
        } else {
            "c.created_at DESC"
        };

        let query = format!(
            r#"
            SELECT c.id, u.username AS user_username, c.post_id, c.content,
                   c.edited, c.edited_at, c.created_at, c.updated_at
            FROM comment c
            INNER JOIN users u ON c.user_id = u.id
            WHERE c.post_id = $1 AND c.active
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by
        );

        let comments = sqlx::query_as(&query)
            .bind(post_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    async fn get_comment(&self, comment_id: i32) -> Result<Option<Comment>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn create_comment(
        &self,
        user_id: Uuid,
        post_id: i32,
        content: &str,
    ) -> Result<CommentDto, sqlx::Error> {
        // CTE to insert and return the comment with the author's username
        let comment = sqlx::query_as::<_, CommentDto>(
            r#"
            WITH new_comment AS (
                INSERT INTO comment (user_id, post_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT
                nc.id,
                u.username AS user_username,
                nc.post_id,
                nc.content,
                nc.edited,
                nc.edited_at,
                nc.created_at,
                nc.updated_at
            FROM new_comment nc
            JOIN users u ON nc.user_id = u.id
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn edit_comment(
        &self,
        user_id: Uuid,
        comment_id: i32,
        content: &str,
    ) -> Result<Option<CommentDto>, sqlx::Error> {
        let comment = sqlx::query_as::<_, CommentDto>(
            r#"
            WITH updated_comment AS (
                UPDATE comment
                SET content = $1, edited = TRUE, edited_at = NOW(), updated_at = NOW()
                WHERE id = $2 AND user_id = $3 AND active
                RETURNING *
            )
            SELECT
                uc.id,
                u.username AS user_username,
                uc.post_id,
                uc.content,
                uc.edited,
                uc.edited_at,
                uc.created_at,
                uc.updated_at
            FROM updated_comment uc
            JOIN users u ON uc.user_id = u.id
            "#,
        )
        .bind(content)
        .bind(comment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn soft_delete_comment(&self, comment_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE comment SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active",
        )
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_post_comment_count(&self, post_id: i32) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(id) FROM comment WHERE post_id = $1 AND active")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn get_user_comment_count(&self, user_id: &Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comment WHERE user_id = $1 AND active")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
