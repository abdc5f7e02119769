//! E-Pass Server
//!
//! Visitor registration backend: validates a submitted form, stores the
//! visitor record and renders a one-page PDF pass that can be downloaded
//! afterwards.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pdf;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
