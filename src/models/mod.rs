//! Data models

pub mod visitor;

pub use visitor::{NewVisitor, SubmitResponse, VisitorRecord, VisitorSubmission};
