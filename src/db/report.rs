use super::DBClient;
use crate::dtos::{ModerationStatsDto, ReportDto};
use crate::models::{CommentAction, Report, ReportReason, ReportStatus};
use uuid::Uuid;

const REPORT_DTO_COLUMNS: &str = r#"
    r.id, r.comment_id, c.content AS comment_content, c.active AS comment_active,
    u.username AS reporter_username, r.reason, r.description, r.status,
    r.comment_action, r.resolved_at, r.created_at
"#;

/// Report database operations trait.
///
/// Resolution updates the report row and applies the comment action inside
/// one transaction — a reader can never observe the comment deactivated
/// while the report still says `pending`, or vice versa.
pub trait ReportExt {
    /// File a report. The (comment, reporter) unique constraint surfaces a
    /// duplicate as a database unique violation.
    async fn create_report(
        &self,
        comment_id: i32,
        reporter_id: Uuid,
        reason: ReportReason,
        description: Option<&str>,
    ) -> Result<Report, sqlx::Error>;

    async fn get_report(&self, report_id: i32) -> Result<Option<Report>, sqlx::Error>;

    async fn get_report_dto(&self, report_id: i32) -> Result<Option<ReportDto>, sqlx::Error>;

    /// Report queue, newest first; `status = None` lists all.
    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ReportDto>, sqlx::Error>;

    async fn count_reports(&self, status: Option<ReportStatus>) -> Result<i64, sqlx::Error>;

    /// Compare-and-set resolution: moves the report from `from` to `to`,
    /// stamps the moderator, records the comment action, and flips the
    /// comment's active flag — all in one transaction. Returns false if the
    /// report's status was no longer `from` (concurrent resolution).
    async fn resolve_report(
        &self,
        report_id: i32,
        comment_id: i32,
        moderator_id: Uuid,
        from: ReportStatus,
        to: ReportStatus,
        action: CommentAction,
    ) -> Result<bool, sqlx::Error>;

    /// Dashboard aggregates, computed in a single statement so the numbers
    /// come from one snapshot.
    async fn moderation_stats(&self) -> Result<ModerationStatsDto, sqlx::Error>;
}

impl ReportExt for DBClient {
    async fn create_report(
        &self,
        comment_id: i32,
        reporter_id: Uuid,
        reason: ReportReason,
        description: Option<&str>,
    ) -> Result<Report, sqlx::Error> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO report (comment_id, reporter_id, reason, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(comment_id)
        .bind(reporter_id)
        .bind(reason)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    async fn get_report(&self, report_id: i32) -> Result<Option<Report>, sqlx::Error> {
        let report = sqlx::query_as::<_, Report>("SELECT * FROM report WHERE id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(report)
    }

    async fn get_report_dto(&self, report_id: i32) -> Result<Option<ReportDto>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {REPORT_DTO_COLUMNS}
            FROM report r
            INNER JOIN comment c ON r.comment_id = c.id
            INNER JOIN users u ON r.reporter_id = u.id
            WHERE r.id = $1
            "#
        );

        let report = sqlx::query_as::<_, ReportDto>(&query)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(report)
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ReportDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {REPORT_DTO_COLUMNS}
            FROM report r
            INNER JOIN comment c ON r.comment_id = c.id
            INNER JOIN users u ON r.reporter_id = u.id
            WHERE ($1::report_status IS NULL OR r.status = $1)
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let reports = sqlx::query_as::<_, ReportDto>(&query)
            .bind(status)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    async fn count_reports(&self, status: Option<ReportStatus>) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM report WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn resolve_report(
        &self,
        report_id: i32,
        comment_id: i32,
        moderator_id: Uuid,
        from: ReportStatus,
        to: ReportStatus,
        action: CommentAction,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // A resolution that leaves the report pending does not stamp
        // resolved_at.
        let stamp_resolution = to != ReportStatus::Pending;

        let updated = sqlx::query(
            r#"
            UPDATE report
            SET status = $1,
                moderator_id = $2,
                comment_action = $3,
                resolved_at = CASE WHEN $4 THEN NOW() ELSE resolved_at END,
                updated_at = NOW()
            WHERE id = $5 AND status = $6
            "#,
        )
        .bind(to)
        .bind(moderator_id)
        .bind(action)
        .bind(stamp_resolution)
        .bind(report_id)
        .bind(from)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            // Status moved under us; roll back rather than applying the
            // comment action against a stale decision.
            tx.rollback().await?;
            return Ok(false);
        }

        match action {
            CommentAction::None => {}
            CommentAction::Deactivate => {
                sqlx::query(
                    "UPDATE comment SET active = FALSE, updated_at = NOW() WHERE id = $1",
                )
                .bind(comment_id)
                .execute(&mut *tx)
                .await?;
            }
            CommentAction::Reactivate => {
                sqlx::query(
                    "UPDATE comment SET active = TRUE, updated_at = NOW() WHERE id = $1",
                )
                .bind(comment_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn moderation_stats(&self) -> Result<ModerationStatsDto, sqlx::Error> {
        let stats = sqlx::query_as::<_, ModerationStatsDto>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM comment) AS total_comments,
                (SELECT COUNT(DISTINCT comment_id) FROM report) AS total_reported,
                (SELECT COUNT(*) FROM report WHERE status = 'pending') AS pending_reports,
                (SELECT COUNT(*) FROM comment WHERE active = FALSE) AS total_deactivated
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
