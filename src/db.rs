use sqlx::{Pool, Postgres};

pub mod scheduler;

mod user;
pub use user::UserExt;

mod post;
pub use post::PostExt;

mod interaction;
pub use interaction::InteractionExt;

mod comment;
pub use comment::CommentExt;

mod report;
pub use report::ReportExt;

mod catalog;
pub use catalog::CatalogExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}
impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
