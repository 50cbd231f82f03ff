use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// School-wide announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Target audiences; "All" when unspecified.
    #[serde(default = "default_audience")]
    pub audience: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

fn default_audience() -> Vec<String> {
    vec!["All".to_string()]
}

impl Announcement {
    pub fn new(title: String, content: String, audience: Option<Vec<String>>, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            audience: audience.filter(|a| !a.is_empty()).unwrap_or_else(default_audience),
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// General school event, kept alongside enrollments by school year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    pub school_year: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Record-book metadata: points a section/subject pair at an external
/// grade sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBook {
    pub id: Uuid,
    pub subject: String,
    pub section_id: Uuid,
    pub sheet_id: String,
    /// Partial record books are excluded from student-facing grade reads.
    #[serde(default)]
    pub partial: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
}
