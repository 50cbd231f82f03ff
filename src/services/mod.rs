pub mod academics_service;
pub mod election_service;
pub mod enrollment_service;
pub mod user_service;

pub use academics_service::AcademicsService;
pub use election_service::ElectionService;
pub use enrollment_service::EnrollmentService;
pub use user_service::UserService;
