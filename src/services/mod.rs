//! Business logic services

pub mod visitors;

use std::sync::Arc;

use crate::{
    config::DocumentsConfig, error::AppResult, pdf::PassRenderer, repository::VisitorStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorsService,
    pub passes: Arc<PassRenderer>,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(store: Arc<dyn VisitorStore>, documents: &DocumentsConfig) -> AppResult<Self> {
        let passes = Arc::new(PassRenderer::new(documents)?);

        Ok(Self {
            visitors: visitors::VisitorsService::new(store, passes.clone()),
            passes,
        })
    }
}
