use super::DBClient;
use crate::dtos::InteractionCountsDto;
use crate::models::{Interaction, InteractionKind};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Interaction database operations trait.
///
/// The denormalized `likes_count`/`dislikes_count` columns on `post` are
/// adjusted in the same transaction as every interaction row write, with
/// in-place increments (`likes_count = likes_count + $n`) so concurrent
/// reactions from different users never lose updates. The existing row is
/// locked with `FOR UPDATE` to serialize the upsert per (user, post).
pub trait InteractionExt {
    /// Upsert the caller's reaction: insert if absent, replace the kind if
    /// it differs, no-op if identical. Returns the counts after the write.
    async fn set_interaction(
        &self,
        user_id: Uuid,
        post_id: i32,
        kind: InteractionKind,
    ) -> Result<InteractionCountsDto, sqlx::Error>;

    /// Remove the caller's reaction if present. Absent row is a silent
    /// no-op, not an error. Returns the counts after the write.
    async fn clear_interaction(
        &self,
        user_id: Uuid,
        post_id: i32,
    ) -> Result<InteractionCountsDto, sqlx::Error>;

    /// Current aggregate counts for a post.
    async fn counts_for(&self, post_id: i32) -> Result<Option<InteractionCountsDto>, sqlx::Error>;
}

async fn adjust_counter(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i32,
    kind: InteractionKind,
    delta: i32,
) -> Result<(), sqlx::Error> {
    let sql = match kind {
        InteractionKind::Like => {
            "UPDATE post SET likes_count = likes_count + $1, updated_at = NOW() WHERE id = $2"
        }
        InteractionKind::Dislike => {
            "UPDATE post SET dislikes_count = dislikes_count + $1, updated_at = NOW() WHERE id = $2"
        }
    };

    sqlx::query(sql)
        .bind(delta)
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn counts_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i32,
) -> Result<InteractionCountsDto, sqlx::Error> {
    sqlx::query_as::<_, InteractionCountsDto>(
        "SELECT likes_count AS likes, dislikes_count AS dislikes FROM post WHERE id = $1",
    )
    .bind(post_id)
    .fetch_one(&mut **tx)
    .await
}

impl InteractionExt for DBClient {
    async fn set_interaction(
        &self,
        user_id: Uuid,
        post_id: i32,
        kind: InteractionKind,
    ) -> Result<InteractionCountsDto, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Interaction>(
            "SELECT * FROM interaction WHERE user_id = $1 AND post_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            None => {
                sqlx::query(
                    "INSERT INTO interaction (user_id, post_id, kind) VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(post_id)
                .bind(kind)
                .execute(&mut *tx)
                .await?;

                adjust_counter(&mut tx, post_id, kind, 1).await?;
            }
            Some(row) if row.kind == kind => {
                // Same reaction again: nothing to change.
            }
            Some(row) => {
                sqlx::query("UPDATE interaction SET kind = $1, updated_at = NOW() WHERE id = $2")
                    .bind(kind)
                    .bind(row.id)
                    .execute(&mut *tx)
                    .await?;

                adjust_counter(&mut tx, post_id, row.kind, -1).await?;
                adjust_counter(&mut tx, post_id, kind, 1).await?;
            }
        }

        let counts = counts_in_tx(&mut tx, post_id).await?;
        tx.commit().await?;

        Ok(counts)
    }

    async fn clear_interaction(
        &self,
        user_id: Uuid,
        post_id: i32,
    ) -> Result<InteractionCountsDto, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<InteractionKind> = sqlx::query_scalar(
            "DELETE FROM interaction WHERE user_id = $1 AND post_id = $2 RETURNING kind",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(kind) = removed {
            adjust_counter(&mut tx, post_id, kind, -1).await?;
        }

        let counts = counts_in_tx(&mut tx, post_id).await?;
        tx.commit().await?;

        Ok(counts)
    }

    async fn counts_for(&self, post_id: i32) -> Result<Option<InteractionCountsDto>, sqlx::Error> {
        let counts = sqlx::query_as::<_, InteractionCountsDto>(
            "SELECT likes_count AS likes, dislikes_count AS dislikes FROM post WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(counts)
    }
}
