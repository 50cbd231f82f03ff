use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A capacity-bounded class roster for one school year.
///
/// Membership is a set over an insertion-ordered list: the order students
/// joined is preserved, duplicates are never added. Sections are created
/// lazily during enrollment approval or explicitly by the registrar, and
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    /// e.g. "7-STE-A"
    pub name: String,
    #[serde(default)]
    pub grade_level: Option<u8>,
    pub strand: String,
    pub school_year: String,
    pub capacity: usize,
    #[serde(default)]
    pub students: Vec<Uuid>,
    #[serde(default)]
    pub adviser: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    pub fn new(
        name: String,
        grade_level: Option<u8>,
        strand: String,
        school_year: String,
        capacity: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            grade_level,
            strand,
            school_year,
            capacity,
            students: Vec::new(),
            adviser: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_space(&self) -> bool {
        self.students.len() < self.capacity
    }

    /// Add a member, set-like: a user already on the roster is not added
    /// again. Returns whether the list changed.
    pub fn add_member(&mut self, user_id: Uuid) -> bool {
        if self.students.contains(&user_id) {
            return false;
        }
        self.students.push(user_id);
        true
    }
}

/// Default section name synthesized during approval when no section name
/// was supplied: `{LEVEL}-{strand or GEN}-A`.
pub fn default_section_name(level: &str, strand: Option<&str>) -> String {
    format!(
        "{}-{}-A",
        level.to_uppercase(),
        strand.filter(|s| !s.is_empty()).unwrap_or("GEN")
    )
}
