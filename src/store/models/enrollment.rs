use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrollment level. The two-value set mirrors the junior/senior high school
/// split the registrar works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Junior,
    Senior,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Level> {
        match raw.to_lowercase().as_str() {
            "junior" => Some(Level::Junior),
            "senior" => Some(Level::Senior),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Junior => "junior",
            Level::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Uploaded document filenames attached to an application. Upload transport
/// is handled outside this service; only the names are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documents {
    #[serde(default)]
    pub report_card: Option<String>,
    #[serde(default)]
    pub good_moral: Option<String>,
    #[serde(default)]
    pub birth_certificate: Option<String>,
    #[serde(default)]
    pub others: Vec<String>,
}

/// An enrollment application and its lifecycle state.
///
/// Lifecycle: pending -> approved | rejected; approved records may be
/// archived and restored. Records are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub name: String,
    /// Must be exactly 12 digits; validated at submission.
    pub lrn: String,
    pub level: Level,
    #[serde(default)]
    pub strand: Option<String>,
    /// Display name of the assigned section, set on approval.
    #[serde(default)]
    pub section: Option<String>,
    /// Id of the assigned section, set on approval.
    #[serde(default)]
    pub assigned_section: Option<Uuid>,
    pub school_year: String,
    #[serde(default)]
    pub year_level: Option<u8>,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub documents: Documents,
    #[serde(default)]
    pub graduated: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// LRN format check: exactly 12 ASCII digits.
pub fn is_valid_lrn(lrn: &str) -> bool {
    lrn.len() == 12 && lrn.chars().all(|c| c.is_ascii_digit())
}
