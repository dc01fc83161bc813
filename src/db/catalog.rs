use super::DBClient;
use crate::models::{Category, WorldCup, WorldCupStatus};
use chrono::NaiveDate;

/// Reference data (Category / WorldCup) operations trait. Admin-managed
/// lookup rows referenced by posts; deactivation hides an entry from the
/// public lists without breaking existing references.
pub trait CatalogExt {
    async fn list_categories(&self, only_active: bool) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category(&self, category_id: i32) -> Result<Option<Category>, sqlx::Error>;

    async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, sqlx::Error>;

    async fn update_category(
        &self,
        category_id: i32,
        name: &str,
        description: &str,
    ) -> Result<Option<Category>, sqlx::Error>;

    async fn deactivate_category(&self, category_id: i32) -> Result<u64, sqlx::Error>;

    async fn list_world_cups(&self, only_active: bool) -> Result<Vec<WorldCup>, sqlx::Error>;

    async fn get_world_cup(&self, world_cup_id: i32) -> Result<Option<WorldCup>, sqlx::Error>;

    async fn create_world_cup(
        &self,
        year: i32,
        host_country: &str,
        team_count: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: WorldCupStatus,
    ) -> Result<WorldCup, sqlx::Error>;

    async fn update_world_cup(
        &self,
        world_cup_id: i32,
        year: i32,
        host_country: &str,
        team_count: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: WorldCupStatus,
    ) -> Result<Option<WorldCup>, sqlx::Error>;

    async fn deactivate_world_cup(&self, world_cup_id: i32) -> Result<u64, sqlx::Error>;
}

impl CatalogExt for DBClient {
    async fn list_categories(&self, only_active: bool) -> Result<Vec<Category>, sqlx::Error> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM category WHERE ($1 = FALSE OR active) ORDER BY name ASC",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_category(&self, category_id: i32) -> Result<Option<Category>, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO category (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn update_category(
        &self,
        category_id: i32,
        name: &str,
        description: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE category
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn deactivate_category(&self, category_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE category SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active",
        )
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_world_cups(&self, only_active: bool) -> Result<Vec<WorldCup>, sqlx::Error> {
        let world_cups = sqlx::query_as::<_, WorldCup>(
            "SELECT * FROM world_cup WHERE ($1 = FALSE OR active) ORDER BY year DESC",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(world_cups)
    }

    async fn get_world_cup(&self, world_cup_id: i32) -> Result<Option<WorldCup>, sqlx::Error> {
        let world_cup = sqlx::query_as::<_, WorldCup>("SELECT * FROM world_cup WHERE id = $1")
            .bind(world_cup_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(world_cup)
    }

    async fn create_world_cup(
        &self,
        year: i32,
        host_country: &str,
        team_count: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: WorldCupStatus,
    ) -> Result<WorldCup, sqlx::Error> {
        let world_cup = sqlx::query_as::<_, WorldCup>(
            r#"
            INSERT INTO world_cup (year, host_country, team_count, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(year)
        .bind(host_country)
        .bind(team_count)
        .bind(start_date)
        .bind(end_date)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(world_cup)
    }

    async fn update_world_cup(
        &self,
        world_cup_id: i32,
        year: i32,
        host_country: &str,
        team_count: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: WorldCupStatus,
    ) -> Result<Option<WorldCup>, sqlx::Error> {
        let world_cup = sqlx::query_as::<_, WorldCup>(
            r#"
            UPDATE world_cup
            SET year = $1, host_country = $2, team_count = $3,
                start_date = $4, end_date = $5, status = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(year)
        .bind(host_country)
        .bind(team_count)
        .bind(start_date)
        .bind(end_date)
        .bind(status)
        .bind(world_cup_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(world_cup)
    }

    async fn deactivate_world_cup(&self, world_cup_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE world_cup SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active",
        )
        .bind(world_cup_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
