use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::auth::roles::Role;
use crate::config;
use crate::store::models::enrollment::{
    is_valid_lrn, Documents, Enrollment, EnrollmentStatus, Level,
};
use crate::store::models::section::{default_section_name, Section};
use crate::store::models::user::User;
use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Enrollment not found")]
    NotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Section not found")]
    SectionNotFound,
    #[error("You already applied for this school year")]
    DuplicateApplication,
    #[error("LRN must be a 12-digit number")]
    InvalidLrn,
    #[error("Level must be either junior or senior")]
    InvalidLevel,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Enrollment has already been rejected")]
    AlreadyRejected,
    #[error("Only pending enrollments can be rejected")]
    NotPending,
    #[error("Section {0} is at capacity")]
    CapacityExceeded(String),
    #[error("Section already exists")]
    DuplicateSection,
}

/// Application payload as submitted by the applicant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEnrollment {
    pub level: String,
    #[serde(default)]
    pub strand: Option<String>,
    pub school_year: String,
    #[serde(default)]
    pub year_level: Option<u8>,
    #[serde(default)]
    pub documents: Documents,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSection {
    pub name: String,
    #[serde(default)]
    pub grade_level: Option<u8>,
    pub strand: String,
    pub school_year: String,
    #[serde(default)]
    pub capacity: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentStats {
    pub enrolled: usize,
    pub pending: usize,
}

pub struct EnrollmentService {
    store: Arc<Store>,
}

impl EnrollmentService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Submit a new application. One application per (user, school year);
    /// the applicant's LRN must already be on file and well-formed.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: SubmitEnrollment,
    ) -> Result<Enrollment, EnrollmentError> {
        let user = self
            .store
            .user(user_id)
            .await
            .ok_or(EnrollmentError::UserNotFound)?;

        let lrn = user
            .lrn
            .clone()
            .filter(|lrn| is_valid_lrn(lrn))
            .ok_or(EnrollmentError::InvalidLrn)?;
        let level =
            Level::parse(&request.level).ok_or(EnrollmentError::InvalidLevel)?;
        if request.school_year.is_empty() {
            return Err(EnrollmentError::MissingField("schoolYear"));
        }

        // Serialized with the other admissions flows so two requests from
        // the same user cannot both pass the duplicate check.
        let _guard = self.store.admissions().await;

        if self
            .store
            .enrollment_for_year(user_id, &request.school_year)
            .await
            .is_some()
        {
            return Err(EnrollmentError::DuplicateApplication);
        }

        let now = chrono::Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id: user_id,
            name: user.display_name().to_string(),
            lrn,
            level,
            strand: request.strand,
            section: None,
            assigned_section: None,
            school_year: request.school_year,
            year_level: request.year_level,
            status: EnrollmentStatus::Pending,
            rejection_reason: None,
            documents: request.documents,
            graduated: false,
            archived: false,
            archive_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_enrollment(enrollment.clone()).await;
        drop(_guard);
        self.store.checkpoint().await;

        tracing::info!(enrollment = %enrollment.id, student = %user_id, "enrollment submitted");
        Ok(enrollment)
    }

    /// The caller's most recent application.
    pub async fn my_enrollment(&self, user_id: Uuid) -> Result<Enrollment, EnrollmentError> {
        self.store
            .latest_enrollment_for(user_id)
            .await
            .ok_or(EnrollmentError::NotFound)
    }

    /// Approve an application: resolve or create the student account,
    /// resolve or create the target section, attach the student, finalize
    /// the enrollment.
    ///
    /// The three entities change together under the admissions lock, with
    /// every failing check done before the first write. Re-approving an
    /// already approved enrollment is a no-op on the roster.
    pub async fn approve(
        &self,
        enrollment_id: Uuid,
        section_name: Option<String>,
    ) -> Result<(Enrollment, Section), EnrollmentError> {
        let _guard = self.store.admissions().await;

        let enrollment = self
            .store
            .enrollment(enrollment_id)
            .await
            .ok_or(EnrollmentError::NotFound)?;
        if enrollment.status == EnrollmentStatus::Rejected {
            return Err(EnrollmentError::AlreadyRejected);
        }

        // Resolve the student by LRN: promote an existing account or stage a
        // new one with a generated credential.
        let existing_user = self.store.user_by_lrn(&enrollment.lrn).await;
        let (user_id, new_user) = match &existing_user {
            Some(user) => (user.id, None),
            None => {
                let mut user = User::new(
                    format!("{}@students.local", enrollment.lrn),
                    auth::obfuscate_credential(&auth::generated_password()),
                    Role::Student,
                );
                user.full_name = enrollment.name.clone();
                user.lrn = Some(enrollment.lrn.clone());
                (user.id, Some(user))
            }
        };

        // Resolve the target section, creating one when nothing matches the
        // requested (or synthesized) name for that school year. Section
        // names are unique per year, so the lookup covers both cases.
        let target_name = section_name.unwrap_or_else(|| {
            default_section_name(enrollment.level.as_str(), enrollment.strand.as_deref())
        });
        let named = self
            .store
            .section_by_name(&target_name, &enrollment.school_year)
            .await;
        let (section_id, new_section) = match &named {
            Some(section) => (section.id, None),
            None => {
                let section = Section::new(
                    target_name,
                    enrollment.year_level,
                    enrollment.strand.clone().unwrap_or_else(|| "N/A".to_string()),
                    enrollment.school_year.clone(),
                    config::config().enrollment.default_section_capacity,
                );
                (section.id, Some(section))
            }
        };

        // Last failing check: capacity. Already-enrolled members always pass
        // so a re-run stays idempotent.
        if config::config().enrollment.enforce_capacity {
            if let Some(section) = &named {
                if !section.students.contains(&user_id) && !section.has_space() {
                    return Err(EnrollmentError::CapacityExceeded(section.name.clone()));
                }
            }
        }

        // All checks passed; apply the three mutations as one unit.
        if let Some(user) = new_user {
            self.store.insert_user(user).await;
        } else {
            self.store
                .update_user(user_id, |u| u.role = Role::Student)
                .await;
        }

        let section = if let Some(mut section) = new_section {
            section.add_member(user_id);
            self.store.insert_section(section.clone()).await;
            section
        } else {
            self.store
                .update_section(section_id, |s| {
                    s.add_member(user_id);
                })
                .await
                .ok_or(EnrollmentError::SectionNotFound)?
        };

        let enrollment = self
            .store
            .update_enrollment(enrollment_id, |e| {
                e.status = EnrollmentStatus::Approved;
                e.section = Some(section.name.clone());
                e.assigned_section = Some(section.id);
                e.student_id = user_id;
            })
            .await
            .ok_or(EnrollmentError::NotFound)?;

        drop(_guard);
        self.store.checkpoint().await;

        tracing::info!(
            enrollment = %enrollment.id,
            section = %section.name,
            student = %user_id,
            "enrollment approved"
        );
        Ok((enrollment, section))
    }

    pub async fn reject(
        &self,
        enrollment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Enrollment, EnrollmentError> {
        let _guard = self.store.admissions().await;

        let enrollment = self
            .store
            .enrollment(enrollment_id)
            .await
            .ok_or(EnrollmentError::NotFound)?;
        if enrollment.status != EnrollmentStatus::Pending {
            return Err(EnrollmentError::NotPending);
        }

        let enrollment = self
            .store
            .update_enrollment(enrollment_id, |e| {
                e.status = EnrollmentStatus::Rejected;
                e.rejection_reason = Some(reason.unwrap_or_else(|| "Not specified".to_string()));
            })
            .await
            .ok_or(EnrollmentError::NotFound)?;

        drop(_guard);
        self.store.checkpoint().await;

        Ok(enrollment)
    }

    /// Archive flag toggles are independent of lifecycle status.
    pub async fn archive(
        &self,
        enrollment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Enrollment, EnrollmentError> {
        let enrollment = self
            .store
            .update_enrollment(enrollment_id, |e| {
                e.archived = true;
                e.archive_reason = Some(reason.unwrap_or_else(|| "Archived".to_string()));
            })
            .await
            .ok_or(EnrollmentError::NotFound)?;
        self.store.checkpoint().await;

        Ok(enrollment)
    }

    pub async fn restore(&self, enrollment_id: Uuid) -> Result<Enrollment, EnrollmentError> {
        let enrollment = self
            .store
            .update_enrollment(enrollment_id, |e| {
                e.archived = false;
                e.archive_reason = None;
            })
            .await
            .ok_or(EnrollmentError::NotFound)?;
        self.store.checkpoint().await;

        Ok(enrollment)
    }

    pub async fn pending(&self) -> Vec<Enrollment> {
        self.store
            .enrollments_filtered(|e| e.status == EnrollmentStatus::Pending && !e.archived)
            .await
    }

    pub async fn approved(&self) -> Vec<Enrollment> {
        self.store
            .enrollments_filtered(|e| e.status == EnrollmentStatus::Approved && !e.archived)
            .await
    }

    pub async fn archived(&self) -> Vec<Enrollment> {
        self.store.enrollments_filtered(|e| e.archived).await
    }

    pub async fn stats(&self) -> EnrollmentStats {
        EnrollmentStats {
            enrolled: self
                .store
                .enrollments_filtered(|e| e.status == EnrollmentStatus::Approved)
                .await
                .len(),
            pending: self
                .store
                .enrollments_filtered(|e| e.status == EnrollmentStatus::Pending)
                .await
                .len(),
        }
    }

    pub async fn create_section(
        &self,
        request: CreateSection,
    ) -> Result<Section, EnrollmentError> {
        if request.name.is_empty() {
            return Err(EnrollmentError::MissingField("name"));
        }
        if self
            .store
            .section_by_name(&request.name, &request.school_year)
            .await
            .is_some()
        {
            return Err(EnrollmentError::DuplicateSection);
        }

        let section = Section::new(
            request.name,
            request.grade_level,
            request.strand,
            request.school_year,
            request
                .capacity
                .unwrap_or(config::config().enrollment.default_section_capacity),
        );
        self.store.insert_section(section.clone()).await;
        self.store.checkpoint().await;

        Ok(section)
    }

    pub async fn sections(&self) -> Vec<Section> {
        self.store.sections_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        store: Arc<Store>,
        service: EnrollmentService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(Store::in_memory());
            Self {
                service: EnrollmentService::new(store.clone()),
                store,
            }
        }

        async fn applicant(&self, email: &str, lrn: &str) -> Uuid {
            let mut user = User::new(email.to_string(), "pw".to_string(), Role::User);
            user.lrn = Some(lrn.to_string());
            user.full_name = format!("Applicant {lrn}");
            let id = user.id;
            self.store.insert_user(user).await;
            id
        }

        fn submission(school_year: &str) -> SubmitEnrollment {
            SubmitEnrollment {
                level: "junior".to_string(),
                strand: Some("STE".to_string()),
                school_year: school_year.to_string(),
                year_level: Some(7),
                documents: Documents::default(),
            }
        }
    }

    #[tokio::test]
    async fn submit_creates_pending_application() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;

        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);
        assert!(enrollment.section.is_none());
        assert!(!enrollment.archived);
        assert_eq!(enrollment.lrn, "123456789012");
    }

    #[tokio::test]
    async fn second_application_same_year_conflicts() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;

        let first = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        assert!(matches!(
            fx.service.submit(user, Fixture::submission("2025-2026")).await,
            Err(EnrollmentError::DuplicateApplication)
        ));

        // the first application is untouched
        let kept = fx.store.enrollment(first.id).await.unwrap();
        assert_eq!(kept.status, EnrollmentStatus::Pending);

        // a different school year is fine
        assert!(fx
            .service
            .submit(user, Fixture::submission("2026-2027"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn submit_requires_valid_lrn_and_level() {
        let fx = Fixture::new();
        let short = fx.applicant("short@campus.local", "12345").await;
        assert!(matches!(
            fx.service.submit(short, Fixture::submission("2025-2026")).await,
            Err(EnrollmentError::InvalidLrn)
        ));

        let no_lrn = {
            let user = User::new("none@campus.local".to_string(), "pw".to_string(), Role::User);
            let id = user.id;
            fx.store.insert_user(user).await;
            id
        };
        assert!(matches!(
            fx.service.submit(no_lrn, Fixture::submission("2025-2026")).await,
            Err(EnrollmentError::InvalidLrn)
        ));

        let ok = fx.applicant("ok@campus.local", "123456789012").await;
        let mut bad_level = Fixture::submission("2025-2026");
        bad_level.level = "college".to_string();
        assert!(matches!(
            fx.service.submit(ok, bad_level).await,
            Err(EnrollmentError::InvalidLevel)
        ));
    }

    #[tokio::test]
    async fn approve_creates_section_and_promotes_student() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();

        let (approved, section) = fx
            .service
            .approve(enrollment.id, Some("7-STE-A".to_string()))
            .await
            .unwrap();

        assert_eq!(approved.status, EnrollmentStatus::Approved);
        assert_eq!(approved.section.as_deref(), Some("7-STE-A"));
        assert_eq!(approved.assigned_section, Some(section.id));
        assert_eq!(section.grade_level, Some(7));
        assert_eq!(section.strand, "STE");
        assert_eq!(section.school_year, "2025-2026");
        assert_eq!(section.students, vec![user]);

        let promoted = fx.store.user(user).await.unwrap();
        assert_eq!(promoted.role, Role::Student);

        // re-running approve never duplicates the roster entry
        let (_, section) = fx
            .service
            .approve(enrollment.id, Some("7-STE-A".to_string()))
            .await
            .unwrap();
        assert_eq!(section.students, vec![user]);
    }

    #[tokio::test]
    async fn approve_synthesizes_default_section_name() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();

        let (_, section) = fx.service.approve(enrollment.id, None).await.unwrap();
        assert_eq!(section.name, "JUNIOR-STE-A");
        assert_eq!(section.capacity, 40);

        // a re-run resolves the same section instead of minting a duplicate
        let (_, again) = fx.service.approve(enrollment.id, None).await.unwrap();
        assert_eq!(again.id, section.id);
        assert_eq!(fx.service.sections().await.len(), 1);
    }

    #[tokio::test]
    async fn approve_creates_student_account_when_lrn_is_unknown() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();

        // the applicant account disappears from the LRN index
        fx.store.update_user(user, |u| u.lrn = None).await;

        let (approved, section) = fx.service.approve(enrollment.id, None).await.unwrap();
        let created = fx.store.user_by_lrn("123456789012").await.unwrap();
        assert_eq!(created.role, Role::Student);
        assert_ne!(created.id, user);
        assert_eq!(approved.student_id, created.id);
        assert_eq!(section.students, vec![created.id]);
    }

    #[tokio::test]
    async fn approve_rejected_enrollment_fails() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        fx.service.reject(enrollment.id, None).await.unwrap();

        assert!(matches!(
            fx.service.approve(enrollment.id, None).await,
            Err(EnrollmentError::AlreadyRejected)
        ));
    }

    #[tokio::test]
    async fn full_section_rejects_new_members() {
        let fx = Fixture::new();
        fx.service
            .create_section(CreateSection {
                name: "7-STE-A".to_string(),
                grade_level: Some(7),
                strand: "STE".to_string(),
                school_year: "2025-2026".to_string(),
                capacity: Some(1),
            })
            .await
            .unwrap();

        let first = fx.applicant("a@campus.local", "111111111111").await;
        let e1 = fx
            .service
            .submit(first, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        fx.service
            .approve(e1.id, Some("7-STE-A".to_string()))
            .await
            .unwrap();

        let second = fx.applicant("b@campus.local", "222222222222").await;
        let e2 = fx
            .service
            .submit(second, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        assert!(matches!(
            fx.service.approve(e2.id, Some("7-STE-A".to_string())).await,
            Err(EnrollmentError::CapacityExceeded(_))
        ));

        // the failed approval left nothing half-applied
        let untouched = fx.store.enrollment(e2.id).await.unwrap();
        assert_eq!(untouched.status, EnrollmentStatus::Pending);
        assert!(untouched.section.is_none());

        // but the member already on the roster may be re-approved
        assert!(fx
            .service
            .approve(e1.id, Some("7-STE-A".to_string()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reject_records_reason_and_is_terminal() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();

        let rejected = fx.service.reject(enrollment.id, None).await.unwrap();
        assert_eq!(rejected.status, EnrollmentStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Not specified"));

        assert!(matches!(
            fx.service.reject(enrollment.id, None).await,
            Err(EnrollmentError::NotPending)
        ));
    }

    #[tokio::test]
    async fn archive_restore_round_trip_keeps_status() {
        let fx = Fixture::new();
        let user = fx.applicant("a@campus.local", "123456789012").await;
        let enrollment = fx
            .service
            .submit(user, Fixture::submission("2025-2026"))
            .await
            .unwrap();
        fx.service.approve(enrollment.id, None).await.unwrap();

        let archived = fx
            .service
            .archive(enrollment.id, Some("Transferred out".to_string()))
            .await
            .unwrap();
        assert!(archived.archived);
        assert_eq!(archived.archive_reason.as_deref(), Some("Transferred out"));
        assert_eq!(archived.status, EnrollmentStatus::Approved);

        let restored = fx.service.restore(enrollment.id).await.unwrap();
        assert!(!restored.archived);
        assert!(restored.archive_reason.is_none());
        assert_eq!(restored.status, EnrollmentStatus::Approved);
    }

    #[tokio::test]
    async fn listings_split_by_status_and_archive_flag() {
        let fx = Fixture::new();
        let a = fx.applicant("a@campus.local", "111111111111").await;
        let b = fx.applicant("b@campus.local", "222222222222").await;
        let c = fx.applicant("c@campus.local", "333333333333").await;

        let ea = fx.service.submit(a, Fixture::submission("2025-2026")).await.unwrap();
        let _eb = fx.service.submit(b, Fixture::submission("2025-2026")).await.unwrap();
        let ec = fx.service.submit(c, Fixture::submission("2025-2026")).await.unwrap();

        fx.service.approve(ea.id, None).await.unwrap();
        fx.service.archive(ec.id, None).await.unwrap();

        assert_eq!(fx.service.pending().await.len(), 1);
        assert_eq!(fx.service.approved().await.len(), 1);
        assert_eq!(fx.service.archived().await.len(), 1);

        let stats = fx.service.stats().await;
        assert_eq!(stats.enrolled, 1);
        assert_eq!(stats.pending, 2); // archived pending still counts as pending
    }

    #[tokio::test]
    async fn duplicate_section_names_conflict_per_year() {
        let fx = Fixture::new();
        let request = || CreateSection {
            name: "7-STE-A".to_string(),
            grade_level: Some(7),
            strand: "STE".to_string(),
            school_year: "2025-2026".to_string(),
            capacity: None,
        };
        fx.service.create_section(request()).await.unwrap();
        assert!(matches!(
            fx.service.create_section(request()).await,
            Err(EnrollmentError::DuplicateSection)
        ));

        let mut other_year = request();
        other_year.school_year = "2026-2027".to_string();
        assert!(fx.service.create_section(other_year).await.is_ok());
    }
}
