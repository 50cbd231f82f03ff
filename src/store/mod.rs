pub mod models;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::auth::roles::Role;
use models::communication::{Announcement, AttendanceRecord, RecordBook, SchoolEvent};
use models::enrollment::Enrollment;
use models::section::Section;
use models::ssg::SsgDocument;
use models::user::User;

const SNAPSHOT_FILE: &str = "campus.json";

/// Document store backing the whole service.
///
/// Collections are independent and may be touched concurrently; the two
/// multi-entity flows get stronger guarantees:
/// - the SSG aggregate (elections, candidates, votes, SSG events) sits
///   behind one mutex, so all election mutations are serialized and commit
///   as a unit;
/// - enrollment approval, which touches a user, a section, and an
///   enrollment, runs under the admissions lock so concurrent approvals
///   cannot interleave half-applied.
///
/// When a data directory is configured, every committed mutation is
/// followed by a JSON snapshot write.
pub struct Store {
    users: RwLock<HashMap<Uuid, User>>,
    enrollments: RwLock<HashMap<Uuid, Enrollment>>,
    sections: RwLock<HashMap<Uuid, Section>>,
    announcements: RwLock<Vec<Announcement>>,
    events: RwLock<Vec<SchoolEvent>>,
    record_books: RwLock<HashMap<Uuid, RecordBook>>,
    attendance: RwLock<Vec<AttendanceRecord>>,
    ssg: Mutex<SsgDocument>,
    admissions: Mutex<()>,
    data_dir: Option<PathBuf>,
}

/// On-disk shape of a full store snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<User>,
    enrollments: Vec<Enrollment>,
    sections: Vec<Section>,
    #[serde(default)]
    announcements: Vec<Announcement>,
    #[serde(default)]
    events: Vec<SchoolEvent>,
    #[serde(default)]
    record_books: Vec<RecordBook>,
    #[serde(default)]
    attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    ssg: SsgDocument,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            enrollments: RwLock::new(HashMap::new()),
            sections: RwLock::new(HashMap::new()),
            announcements: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            record_books: RwLock::new(HashMap::new()),
            attendance: RwLock::new(Vec::new()),
            ssg: Mutex::new(SsgDocument::default()),
            admissions: Mutex::new(()),
            data_dir: None,
        }
    }

    /// Open the store, loading the snapshot under `data_dir` if one exists.
    pub fn open(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut store = Self::in_memory();
        store.data_dir = data_dir.clone();

        let Some(dir) = data_dir else {
            return Ok(store);
        };

        let path = dir.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Ok(store);
        }

        let raw = std::fs::read(&path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
        store.load_snapshot(snapshot);

        Ok(store)
    }

    fn load_snapshot(&mut self, snapshot: Snapshot) {
        self.users = RwLock::new(snapshot.users.into_iter().map(|u| (u.id, u)).collect());
        self.enrollments = RwLock::new(
            snapshot
                .enrollments
                .into_iter()
                .map(|e| (e.id, e))
                .collect(),
        );
        self.sections = RwLock::new(snapshot.sections.into_iter().map(|s| (s.id, s)).collect());
        self.announcements = RwLock::new(snapshot.announcements);
        self.events = RwLock::new(snapshot.events);
        self.record_books = RwLock::new(
            snapshot
                .record_books
                .into_iter()
                .map(|r| (r.id, r))
                .collect(),
        );
        self.attendance = RwLock::new(snapshot.attendance);
        self.ssg = Mutex::new(snapshot.ssg);
    }

    // ---- users -----------------------------------------------------------

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn user_by_lrn(&self, lrn: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.lrn.as_deref() == Some(lrn))
            .cloned()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn update_user<F>(&self, id: Uuid, mutate: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id)?;
        mutate(user);
        user.updated_at = chrono::Utc::now();
        Some(user.clone())
    }

    pub async fn users_all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    pub async fn users_with_role(&self, role: &Role) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == *role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    // ---- enrollments -----------------------------------------------------

    pub async fn enrollment(&self, id: Uuid) -> Option<Enrollment> {
        self.enrollments.read().await.get(&id).cloned()
    }

    pub async fn insert_enrollment(&self, enrollment: Enrollment) {
        self.enrollments
            .write()
            .await
            .insert(enrollment.id, enrollment);
    }

    pub async fn update_enrollment<F>(&self, id: Uuid, mutate: F) -> Option<Enrollment>
    where
        F: FnOnce(&mut Enrollment),
    {
        let mut enrollments = self.enrollments.write().await;
        let enrollment = enrollments.get_mut(&id)?;
        mutate(enrollment);
        enrollment.updated_at = chrono::Utc::now();
        Some(enrollment.clone())
    }

    pub async fn enrollments_filtered<F>(&self, keep: F) -> Vec<Enrollment>
    where
        F: Fn(&Enrollment) -> bool,
    {
        let mut matches: Vec<Enrollment> = self
            .enrollments
            .read()
            .await
            .values()
            .filter(|e| keep(e))
            .cloned()
            .collect();
        matches.sort_by_key(|e| e.created_at);
        matches
    }

    pub async fn enrollment_for_year(
        &self,
        student_id: Uuid,
        school_year: &str,
    ) -> Option<Enrollment> {
        self.enrollments
            .read()
            .await
            .values()
            .find(|e| e.student_id == student_id && e.school_year == school_year)
            .cloned()
    }

    pub async fn latest_enrollment_for(&self, student_id: Uuid) -> Option<Enrollment> {
        self.enrollments
            .read()
            .await
            .values()
            .filter(|e| e.student_id == student_id)
            .max_by_key(|e| e.created_at)
            .cloned()
    }

    // ---- sections --------------------------------------------------------

    pub async fn section(&self, id: Uuid) -> Option<Section> {
        self.sections.read().await.get(&id).cloned()
    }

    pub async fn section_by_name(&self, name: &str, school_year: &str) -> Option<Section> {
        self.sections
            .read()
            .await
            .values()
            .find(|s| s.name == name && s.school_year == school_year)
            .cloned()
    }

    pub async fn insert_section(&self, section: Section) {
        self.sections.write().await.insert(section.id, section);
    }

    pub async fn update_section<F>(&self, id: Uuid, mutate: F) -> Option<Section>
    where
        F: FnOnce(&mut Section),
    {
        let mut sections = self.sections.write().await;
        let section = sections.get_mut(&id)?;
        mutate(section);
        section.updated_at = chrono::Utc::now();
        Some(section.clone())
    }

    pub async fn sections_all(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = self.sections.read().await.values().cloned().collect();
        sections.sort_by(|a, b| a.name.cmp(&b.name));
        sections
    }

    // ---- communication ---------------------------------------------------

    pub async fn add_announcement(&self, announcement: Announcement) {
        self.announcements.write().await.push(announcement);
    }

    /// Announcements, newest first.
    pub async fn announcements(&self) -> Vec<Announcement> {
        let mut all = self.announcements.read().await.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub async fn add_event(&self, event: SchoolEvent) {
        self.events.write().await.push(event);
    }

    pub async fn events(&self) -> Vec<SchoolEvent> {
        let mut all = self.events.read().await.clone();
        all.sort_by_key(|e| e.date);
        all
    }

    // ---- academics -------------------------------------------------------

    pub async fn insert_record_book(&self, record_book: RecordBook) {
        self.record_books
            .write()
            .await
            .insert(record_book.id, record_book);
    }

    pub async fn record_books_for_section(&self, section_id: Uuid) -> Vec<RecordBook> {
        let mut books: Vec<RecordBook> = self
            .record_books
            .read()
            .await
            .values()
            .filter(|r| r.section_id == section_id)
            .cloned()
            .collect();
        books.sort_by_key(|r| r.created_at);
        books
    }

    pub async fn add_attendance(&self, record: AttendanceRecord) {
        self.attendance.write().await.push(record);
    }

    // ---- aggregates ------------------------------------------------------

    /// Single-writer access to the SSG aggregate. Hold the guard across the
    /// whole check-then-mutate sequence and call `commit()` on the document
    /// before releasing it.
    pub async fn ssg(&self) -> MutexGuard<'_, SsgDocument> {
        self.ssg.lock().await
    }

    /// Serializes enrollment approval (and other admissions flows that
    /// touch users, sections, and enrollments together).
    pub async fn admissions(&self) -> MutexGuard<'_, ()> {
        self.admissions.lock().await
    }

    // ---- persistence -----------------------------------------------------

    /// Write a full snapshot if persistence is configured. Best-effort: a
    /// failed write is logged, not surfaced to the caller.
    ///
    /// Must not be called while holding any store lock.
    pub async fn checkpoint(&self) {
        let Some(dir) = &self.data_dir else {
            return;
        };

        let snapshot = self.snapshot().await;
        if let Err(e) = write_snapshot(dir, &snapshot).await {
            tracing::error!("snapshot write failed: {:#}", e);
        }
    }

    async fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users_all().await,
            enrollments: self.enrollments_filtered(|_| true).await,
            sections: self.sections_all().await,
            announcements: self.announcements.read().await.clone(),
            events: self.events.read().await.clone(),
            record_books: self.record_books.read().await.values().cloned().collect(),
            attendance: self.attendance.read().await.clone(),
            ssg: self.ssg.lock().await.clone(),
        }
    }
}

async fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(SNAPSHOT_FILE);
    let body = serde_json::to_vec_pretty(snapshot).context("failed to serialize snapshot")?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;

    #[tokio::test]
    async fn user_lookup_by_email_and_lrn() {
        let store = Store::in_memory();
        let mut user = User::new(
            "a@campus.local".to_string(),
            "pw".to_string(),
            Role::Student,
        );
        user.lrn = Some("123456789012".to_string());
        let id = user.id;
        store.insert_user(user).await;

        assert_eq!(store.user_by_email("a@campus.local").await.unwrap().id, id);
        assert_eq!(store.user_by_lrn("123456789012").await.unwrap().id, id);
        assert!(store.user_by_lrn("000000000000").await.is_none());
    }

    #[tokio::test]
    async fn ssg_mutations_bump_version() {
        let store = Store::in_memory();
        {
            let mut doc = store.ssg().await;
            doc.commit();
        }
        {
            let mut doc = store.ssg().await;
            doc.commit();
        }
        assert_eq!(store.ssg().await.version, 2);
    }
}
