//! Visitor models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub static CONTACT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("contact number pattern is valid"));

/// Raw registration form as posted by the frontend
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSubmission {
    #[serde(default, deserialize_with = "string_or_number")]
    pub visitor_name: Option<String>,
    /// Number or numeric string
    #[schema(value_type = Option<i32>)]
    pub no_of_persons: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub purpose: Option<String>,
    /// Exactly 10 digits
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(regex(
        path = *CONTACT_NUMBER_RE,
        message = "Invalid contact number. Please enter a 10-digit number."
    ))]
    pub contact_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub visit_date: Option<String>,
}

/// Validated submission, ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisitor {
    pub visitor_name: String,
    pub no_of_persons: i32,
    pub purpose: String,
    pub contact_number: String,
    pub visit_date: String,
}

/// Persisted visitor record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub id: Uuid,
    pub visitor_name: String,
    pub no_of_persons: i32,
    pub purpose: String,
    pub contact_number: String,
    pub visit_date: String,
    pub created_at: DateTime<Utc>,
}

impl VisitorRecord {
    /// Name of the pass file rendered for this record
    pub fn pass_filename(&self) -> String {
        pass_filename(self.id)
    }
}

pub fn pass_filename(id: Uuid) -> String {
    format!("{}-epass.pdf", id)
}

/// Successful registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "pdfURL")]
    pub pdf_url: String,
    #[serde(rename = "downloadLink")]
    pub download_link: String,
}

impl SubmitResponse {
    pub fn generated(url: String) -> Self {
        Self {
            success: true,
            message: "E-Pass generated successfully!".to_string(),
            pdf_url: url.clone(),
            download_link: url,
        }
    }
}

/// Text fields take JSON numbers as their decimal text: `"9876543210"` or `9876543210`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
