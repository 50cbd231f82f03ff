use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sheets::SheetStore;
use crate::store::models::communication::{AttendanceRecord, AttendanceStatus, RecordBook};
use crate::store::models::enrollment::EnrollmentStatus;
use crate::store::Store;

/// Sheet range a class record book occupies.
const GRADE_RANGE: &str = "Sheet1!A1:Z50";

#[derive(Debug, thiserror::Error)]
pub enum AcademicsError {
    #[error("Section not found")]
    SectionNotFound,
    #[error("Student not found")]
    StudentNotFound,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordBook {
    pub subject: String,
    pub section_id: Uuid,
    pub sheet_id: String,
    #[serde(default)]
    pub partial: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub student_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
}

/// One row of a student's grade report: the record book's subject plus the
/// sheet row that matched the student.
#[derive(Debug, Serialize)]
pub struct GradeReport {
    pub section: Option<String>,
    pub subject: String,
    pub grades: Vec<String>,
}

pub struct AcademicsService {
    store: Arc<Store>,
    sheets: Arc<dyn SheetStore>,
}

impl AcademicsService {
    pub fn new(store: Arc<Store>, sheets: Arc<dyn SheetStore>) -> Self {
        Self { store, sheets }
    }

    pub async fn create_record_book(
        &self,
        actor: Uuid,
        request: CreateRecordBook,
    ) -> Result<RecordBook, AcademicsError> {
        if self.store.section(request.section_id).await.is_none() {
            return Err(AcademicsError::SectionNotFound);
        }

        let record_book = RecordBook {
            id: Uuid::new_v4(),
            subject: request.subject,
            section_id: request.section_id,
            sheet_id: request.sheet_id,
            partial: request.partial,
            created_by: actor,
            created_at: Utc::now(),
        };
        self.store.insert_record_book(record_book.clone()).await;
        self.store.checkpoint().await;

        Ok(record_book)
    }

    /// Grades for the caller across all approved enrollments. Each complete
    /// record book of the assigned section is read from the sheet store and
    /// matched by LRN or full name; an unmatched student gets an empty row.
    pub async fn my_grades(&self, user_id: Uuid) -> Vec<GradeReport> {
        let Some(user) = self.store.user(user_id).await else {
            return Vec::new();
        };

        let enrollments = self
            .store
            .enrollments_filtered(|e| {
                e.student_id == user_id && e.status == EnrollmentStatus::Approved
            })
            .await;

        let mut reports = Vec::new();
        for enrollment in enrollments {
            let Some(section_id) = enrollment.assigned_section else {
                continue;
            };
            for book in self.store.record_books_for_section(section_id).await {
                if book.partial {
                    continue;
                }
                let rows = self.sheets.values(&book.sheet_id, GRADE_RANGE).await;
                let row = rows
                    .into_iter()
                    .find(|r| {
                        r.first().map(String::as_str) == Some(enrollment.lrn.as_str())
                            || (!user.full_name.is_empty()
                                && r.get(1).map(String::as_str) == Some(user.full_name.as_str()))
                    })
                    .unwrap_or_default();
                reports.push(GradeReport {
                    section: enrollment.section.clone(),
                    subject: book.subject.clone(),
                    grades: row,
                });
            }
        }
        reports
    }

    pub async fn mark_attendance(
        &self,
        actor: Uuid,
        request: MarkAttendance,
    ) -> Result<AttendanceRecord, AcademicsError> {
        if self.store.user(request.student_id).await.is_none() {
            return Err(AcademicsError::StudentNotFound);
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: request.student_id,
            date: request.date,
            status: request.status,
            marked_by: actor,
            created_at: Utc::now(),
        };
        self.store.add_attendance(record.clone()).await;
        self.store.checkpoint().await;

        Ok(record)
    }
}
