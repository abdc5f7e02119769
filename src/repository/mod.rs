//! Repository layer for database operations

pub mod visitors;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::visitor::{NewVisitor, VisitorRecord},
};

pub use visitors::VisitorsRepository;

/// Backing store for visitor records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Persist a validated submission; the store assigns id and creation time
    async fn persist(&self, visitor: &NewVisitor) -> AppResult<VisitorRecord>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}
