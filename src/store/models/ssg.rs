use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The student-government aggregate: every election, candidate, vote, and
/// SSG event lives in this one document.
///
/// All mutations go through a single writer (the store's aggregate lock) and
/// bump `version`, so a lost update is always detectable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsgDocument {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub elections: Vec<Election>,
    /// Centralized vote records across all elections.
    #[serde(default)]
    pub votes: Vec<VoteRecord>,
    #[serde(default)]
    pub events: Vec<SsgEvent>,
}

impl SsgDocument {
    pub fn election(&self, id: Uuid) -> Option<&Election> {
        self.elections.iter().find(|e| e.id == id)
    }

    pub fn election_mut(&mut self, id: Uuid) -> Option<&mut Election> {
        self.elections.iter_mut().find(|e| e.id == id)
    }

    pub fn has_voted(&self, election_id: Uuid, voter: Uuid) -> bool {
        self.votes
            .iter()
            .any(|v| v.election_id == election_id && v.voter == voter)
    }

    /// Mark a completed mutation. Every committed write bumps the version
    /// exactly once.
    pub fn commit(&mut self) {
        self.version += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub school_year: String,
    /// Candidates in nomination order; tally ties break in this order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Election {
    pub fn candidate(&self, id: Uuid) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn candidate_mut(&mut self, id: Uuid) -> Option<&mut Candidate> {
        self.candidates.iter_mut().find(|c| c.id == id)
    }

    /// Whether votes are currently accepted.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.start_date && now <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub user: Uuid,
    pub full_name: String,
    pub grade_level: u8,
    /// e.g. President, VP
    pub position: String,
    pub votes: u64,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub election_id: Uuid,
    pub candidate_id: Uuid,
    pub voter: Uuid,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsgEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    pub school_year: String,
    pub created_by: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn election(start_offset_h: i64, end_offset_h: i64, active: bool) -> Election {
        let now = Utc::now();
        Election {
            id: Uuid::new_v4(),
            title: "SSG Election 2025".to_string(),
            description: None,
            school_year: "2025-2026".to_string(),
            candidates: Vec::new(),
            is_active: active,
            start_date: now + Duration::hours(start_offset_h),
            end_date: now + Duration::hours(end_offset_h),
        }
    }

    #[test]
    fn open_only_inside_window_and_active() {
        let now = Utc::now();
        assert!(election(-1, 1, true).is_open(now));
        assert!(!election(-1, 1, false).is_open(now));
        assert!(!election(1, 2, true).is_open(now));
        assert!(!election(-2, -1, true).is_open(now));
    }

    #[test]
    fn has_voted_matches_per_election() {
        let mut doc = SsgDocument::default();
        let e1 = Uuid::new_v4();
        let e2 = Uuid::new_v4();
        let voter = Uuid::new_v4();
        doc.votes.push(VoteRecord {
            election_id: e1,
            candidate_id: Uuid::new_v4(),
            voter,
            cast_at: Utc::now(),
        });

        assert!(doc.has_voted(e1, voter));
        assert!(!doc.has_voted(e2, voter));
        assert!(!doc.has_voted(e1, Uuid::new_v4()));
    }
}
