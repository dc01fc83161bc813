use super::DBClient;
use tokio_cron_scheduler::{Job, JobScheduler};

impl DBClient {
    /// Nightly reconciliation of the denormalized like/dislike counters.
    ///
    /// Interaction writes keep the counters in step transactionally; this
    /// job is the backstop that recomputes them from the interaction rows,
    /// so any drift (manual data surgery, restored backups) heals within a
    /// day.
    pub async fn start_reconcile_task(&self) {
        let sched = JobScheduler::new().await.unwrap();
        let pool = self.pool.clone();

        let job = Job::new_async("0 30 3 * * *", move |uuid, _l| {
            let pool = pool.clone();
            Box::pin(async move {
                tracing::info!("Running counter reconciliation job {:?}", uuid);

                let result: Result<(u64, u64), sqlx::Error> = async {
                    let mut tx = pool.begin().await?;

                    let synced = sqlx::query(
                        r#"
                        UPDATE post p
                        SET likes_count = c.likes::int,
                            dislikes_count = c.dislikes::int,
                            updated_at = NOW()
                        FROM (
                            SELECT post_id,
                                   COUNT(*) FILTER (WHERE kind = 'like') AS likes,
                                   COUNT(*) FILTER (WHERE kind = 'dislike') AS dislikes
                            FROM interaction
                            GROUP BY post_id
                        ) c
                        WHERE p.id = c.post_id
                          AND (p.likes_count <> c.likes OR p.dislikes_count <> c.dislikes)
                        "#,
                    )
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                    let zeroed = sqlx::query(
                        r#"
                        UPDATE post
                        SET likes_count = 0, dislikes_count = 0, updated_at = NOW()
                        WHERE (likes_count <> 0 OR dislikes_count <> 0)
                          AND NOT EXISTS (
                              SELECT 1 FROM interaction i WHERE i.post_id = post.id
                          )
                        "#,
                    )
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                    tx.commit().await?;
                    Ok((synced, zeroed))
                }
                .await;

                match result {
                    Ok((synced, zeroed)) => {
                        tracing::info!(
                            "Reconciliation job {:?} finished, {} posts synced, {} zeroed",
                            uuid,
                            synced,
                            zeroed
                        );
                    }
                    Err(e) => {
                        tracing::error!("Reconciliation job {:?} failed: {:?}", uuid, e);
                    }
                }
            })
        })
        .unwrap();

        sched.add(job).await.unwrap();
        //It doesn't block.
        sched.start().await.unwrap();
    }
}
