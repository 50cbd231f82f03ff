use serde::{Deserialize, Serialize};

/// Role assigned to a user account.
///
/// The canonical set is closed; anything outside it is carried through
/// verbatim in `Other` so that records written by older deployments keep
/// round-tripping. An `Other` role never satisfies a role requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Student,
    Registrar,
    Admin,
    Moderator,
    Ssg,
    SuperAdmin,
    Other(String),
}

impl Role {
    /// Normalize a raw role string to its canonical form.
    ///
    /// Matching is case-insensitive and accepts the plural aliases the
    /// frontend has historically sent ("admins", "students", ...).
    /// Unrecognized strings are preserved unchanged.
    pub fn normalize(raw: &str) -> Role {
        match raw.to_lowercase().as_str() {
            "user" | "users" => Role::User,
            "student" | "students" => Role::Student,
            "registrar" | "registrars" => Role::Registrar,
            "admin" | "admins" => Role::Admin,
            "moderator" | "moderators" => Role::Moderator,
            "ssg" => Role::Ssg,
            "superadmin" => Role::SuperAdmin,
            _ => Role::Other(raw.to_string()),
        }
    }

    /// Canonical display name. `Other` yields the preserved input.
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "User",
            Role::Student => "Student",
            Role::Registrar => "Registrar",
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::Ssg => "SSG",
            Role::SuperAdmin => "SuperAdmin",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::normalize(&raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pure authorization gate applied in front of every role-restricted
/// operation.
///
/// SuperAdmin satisfies any requirement without being listed. An empty
/// requirement set admits any authenticated caller.
pub fn authorize(required: &[Role], caller: &Role) -> bool {
    if *caller == Role::SuperAdmin {
        return true;
    }
    required.is_empty() || required.contains(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_insensitive_and_accepts_plurals() {
        assert_eq!(Role::normalize("admins"), Role::Admin);
        assert_eq!(Role::normalize("ADMIN"), Role::Admin);
        assert_eq!(Role::normalize("Students"), Role::Student);
        assert_eq!(Role::normalize("ssg"), Role::Ssg);
        assert_eq!(Role::normalize("SuperAdmin"), Role::SuperAdmin);
    }

    #[test]
    fn normalize_preserves_unknown_strings() {
        assert_eq!(
            Role::normalize("Janitor"),
            Role::Other("Janitor".to_string())
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["user", "Users", "REGISTRAR", "moderators", "Janitor"] {
            let once = Role::normalize(raw);
            let twice = Role::normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn serde_round_trips_through_canonical_names() {
        let role: Role = serde_json::from_str("\"admins\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"Admin\"");

        let other: Role = serde_json::from_str("\"Janitor\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"Janitor\"");
    }

    #[test]
    fn superadmin_bypasses_every_requirement() {
        assert!(authorize(&[Role::Registrar], &Role::SuperAdmin));
        assert!(authorize(&[], &Role::SuperAdmin));
        assert!(authorize(
            &[Role::Other("Custodian".to_string())],
            &Role::SuperAdmin
        ));
    }

    #[test]
    fn empty_requirement_admits_any_authenticated_caller() {
        assert!(authorize(&[], &Role::User));
        assert!(authorize(&[], &Role::Other("Janitor".to_string())));
    }

    #[test]
    fn membership_is_required_otherwise() {
        let required = [Role::Registrar, Role::Admin];
        assert!(authorize(&required, &Role::Admin));
        assert!(authorize(&required, &Role::Registrar));
        assert!(!authorize(&required, &Role::Student));
        assert!(!authorize(&required, &Role::User));
        assert!(!authorize(&required, &Role::Other("Registrar ".to_string())));
    }

    #[test]
    fn no_role_implies_another() {
        assert!(!authorize(&[Role::Student], &Role::Admin));
        assert!(!authorize(&[Role::Admin], &Role::Moderator));
    }
}
