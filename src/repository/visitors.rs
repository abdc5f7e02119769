//! Visitors repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::visitor::{NewVisitor, VisitorRecord},
};

use super::VisitorStore;

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitorStore for VisitorsRepository {
    async fn persist(&self, visitor: &NewVisitor) -> AppResult<VisitorRecord> {
        let row = sqlx::query_as::<_, VisitorRecord>(
            r#"
            INSERT INTO visitors (visitor_name, no_of_persons, purpose, contact_number, visit_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, visitor_name, no_of_persons, purpose, contact_number, visit_date, created_at
            "#,
        )
        .bind(&visitor.visitor_name)
        .bind(visitor.no_of_persons)
        .bind(&visitor.purpose)
        .bind(&visitor.contact_number)
        .bind(&visitor.visit_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
