//! Roles, capabilities and the login-time role-claim rule.
//!
//! Flow Overview:
//! 1) Login presents credentials plus a role claim.
//! 2) [`reconcile_claim`] checks the claim against the stored role and picks
//!    the landing [`Surface`].
//! 3) Each protected route checks a [`Capability`] against the stored role.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::Error;

/// Account role. Closed set; stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Normal,
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Student, Self::Teacher, Self::Admin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    /// Next role on the admin "toggle role" cycle:
    /// `normal -> student -> teacher -> admin -> normal`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Normal => Self::Student,
            Self::Student => Self::Teacher,
            Self::Teacher => Self::Admin,
            Self::Admin => Self::Normal,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "normal" => Ok(Self::Normal),
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(Error::Validation(format!("Unknown role: {other}"))),
        }
    }
}

/// Permission required by a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, view, edit, delete and list any user. Admin only.
    UserAdmin,
    /// Add, edit and delete questions and topics. Admin or teacher.
    BankAdmin,
    /// Study flashcards and edit one's own profile. Any signed-in role.
    SelfService,
}

impl Capability {
    #[must_use]
    pub const fn allows(self, role: Role) -> bool {
        match self {
            Self::UserAdmin => matches!(role, Role::Admin),
            Self::BankAdmin => matches!(role, Role::Admin | Role::Teacher),
            Self::SelfService => true,
        }
    }
}

/// Dashboard a session lands on after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Study,
    Teacher,
    Admin,
}

impl Surface {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Study => "/normal_dashboard",
            Self::Teacher => "/teacher_dashboard",
            Self::Admin => "/admin_dashboard",
        }
    }

    /// Landing surface follows the claim, not the stored role.
    #[must_use]
    pub const fn for_claim(claim: Role) -> Self {
        match claim {
            Role::Normal | Role::Student => Self::Study,
            Role::Teacher => Self::Teacher,
            Role::Admin => Self::Admin,
        }
    }
}

/// Check a login-time role claim against the stored role.
///
/// - `admin` may present as any role.
/// - `teacher` may present as anything except `admin`.
/// - `normal` and `student` must claim exactly their stored role.
///
/// # Errors
/// `Authentication` when no claim was supplied, `RoleMismatch` naming the
/// stored role when the claim is rejected.
pub fn reconcile_claim(stored: Role, claim: Option<Role>) -> Result<Surface, Error> {
    let Some(claim) = claim else {
        return Err(Error::Authentication("Please select a role".to_string()));
    };

    let accepted = match stored {
        Role::Admin => true,
        Role::Teacher => claim != Role::Admin,
        Role::Normal | Role::Student => claim == stored,
    };

    if accepted {
        Ok(Surface::for_claim(claim))
    } else {
        Err(Error::RoleMismatch { actual: stored })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_and_rejects_others() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
        }
        assert!(matches!("root".parse::<Role>(), Err(Error::Validation(_))));
        assert!(matches!("Admin".parse::<Role>(), Err(Error::Validation(_))));
    }

    #[test]
    fn cycle_has_length_four() {
        let mut role = Role::Normal;
        let mut seen = Vec::new();
        for _ in 0..4 {
            role = role.next();
            seen.push(role);
        }
        assert_eq!(
            seen,
            vec![Role::Student, Role::Teacher, Role::Admin, Role::Normal]
        );
    }

    #[test]
    fn claim_matrix() {
        assert!(matches!(
            reconcile_claim(Role::Normal, Some(Role::Admin)),
            Err(Error::RoleMismatch {
                actual: Role::Normal
            })
        ));
        assert_eq!(
            reconcile_claim(Role::Teacher, Some(Role::Teacher)).ok(),
            Some(Surface::Teacher)
        );
        assert!(matches!(
            reconcile_claim(Role::Teacher, Some(Role::Admin)),
            Err(Error::RoleMismatch {
                actual: Role::Teacher
            })
        ));
        assert_eq!(
            reconcile_claim(Role::Admin, Some(Role::Student)).ok(),
            Some(Surface::Study)
        );
        assert_eq!(
            reconcile_claim(Role::Teacher, Some(Role::Normal)).ok(),
            Some(Surface::Study)
        );
        assert!(matches!(
            reconcile_claim(Role::Student, Some(Role::Normal)),
            Err(Error::RoleMismatch { .. })
        ));
    }

    #[test]
    fn missing_claim_is_an_authentication_failure() {
        assert!(matches!(
            reconcile_claim(Role::Admin, None),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn capabilities() {
        assert!(Capability::UserAdmin.allows(Role::Admin));
        assert!(!Capability::UserAdmin.allows(Role::Teacher));
        assert!(Capability::BankAdmin.allows(Role::Teacher));
        assert!(!Capability::BankAdmin.allows(Role::Student));
        assert!(Role::ALL.iter().all(|r| Capability::SelfService.allows(*r)));
    }
}
