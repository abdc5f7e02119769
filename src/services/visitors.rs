//! Visitor registration service

use std::sync::Arc;

use serde_json::Value;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::visitor::{NewVisitor, VisitorRecord, VisitorSubmission},
    pdf::{PassRenderer, RenderedPass},
    repository::VisitorStore,
};

pub const MISSING_FIELDS: &str = "All fields are required";
pub const INVALID_PERSONS: &str = "Invalid number of persons. Please enter a positive number.";

/// Outcome of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub record: VisitorRecord,
    pub pass: RenderedPass,
}

#[derive(Clone)]
pub struct VisitorsService {
    store: Arc<dyn VisitorStore>,
    renderer: Arc<PassRenderer>,
}

impl VisitorsService {
    pub fn new(store: Arc<dyn VisitorStore>, renderer: Arc<PassRenderer>) -> Self {
        Self { store, renderer }
    }

    /// Validate, persist and render. A render failure leaves the record in place.
    pub async fn register(&self, submission: &VisitorSubmission) -> AppResult<Registration> {
        let visitor = validate_submission(submission)?;

        let record = self.store.persist(&visitor).await?;
        tracing::info!(id = %record.id, "Visitor registered");

        let renderer = self.renderer.clone();
        let to_render = record.clone();
        let pass = tokio::task::spawn_blocking(move || renderer.render(&to_render))
            .await
            .map_err(|e| AppError::Internal(format!("Render task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!(id = %record.id, "Pass rendering failed: {}", e);
                AppError::from(e)
            })?;

        tracing::info!(id = %record.id, file = %pass.filename, "E-pass generated");
        Ok(Registration { record, pass })
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

/// Check a raw submission and return the fields to persist
pub fn validate_submission(submission: &VisitorSubmission) -> AppResult<NewVisitor> {
    let (Some(visitor_name), Some(purpose), Some(contact_number), Some(visit_date)) = (
        non_blank(&submission.visitor_name),
        non_blank(&submission.purpose),
        non_blank(&submission.contact_number),
        non_blank(&submission.visit_date),
    ) else {
        return Err(AppError::Validation(MISSING_FIELDS.to_string()));
    };
    let no_of_persons = match &submission.no_of_persons {
        None | Some(Value::Null) => return Err(AppError::Validation(MISSING_FIELDS.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()))
        }
        Some(value) => value,
    };

    if let Err(errors) = submission.validate() {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid submission".to_string());
        return Err(AppError::Validation(message));
    }

    let no_of_persons = parse_person_count(no_of_persons)
        .ok_or_else(|| AppError::Validation(INVALID_PERSONS.to_string()))?;

    Ok(NewVisitor {
        visitor_name: visitor_name.to_string(),
        no_of_persons,
        purpose: purpose.to_string(),
        contact_number: contact_number.to_string(),
        visit_date: visit_date.to_string(),
    })
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Positive whole number, given as a JSON number or a numeric string
fn parse_person_count(value: &Value) -> Option<i32> {
    let count = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !count.is_finite() || count.fract() != 0.0 || count <= 0.0 || count > i32::MAX as f64 {
        return None;
    }
    Some(count as i32)
}
