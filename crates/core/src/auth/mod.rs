//! Authentication, roles, and access checks.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - The three system roles and the `Actor` every service call is made as
//! - Profile data shared by the services (display names, inspector lookup)

mod password;

pub use password::{
    MIN_PASSWORD_LENGTH, PasswordError, check_password_policy, hash_password, verify_password,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// System roles. A profile's role is fixed when the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Approves registrations, schedules inspections, decides applications.
    Admin,
    /// Conducts and records inspections assigned to them.
    Inspector,
    /// Registers establishments and submits applications.
    Owner,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Inspector => "inspector",
            Self::Owner => "owner",
        }
    }

    /// Parses a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "inspector" => Some(Self::Inspector),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an actor attempts something their role or ownership forbids.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AccessDenied(pub String);

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Profile ID of the caller.
    pub user_id: Uuid,
    /// Caller's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns true if the actor is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails unless the actor has the given role.
    pub fn require(&self, role: Role) -> Result<(), AccessDenied> {
        if self.role == role {
            Ok(())
        } else {
            Err(AccessDenied(format!("this action requires the {role} role")))
        }
    }

    /// Fails unless the actor is the given owner.
    ///
    /// Admins are not exempt: mutations on an owner's records are the owner's alone.
    pub fn require_owner_of(&self, owner_id: Uuid) -> Result<(), AccessDenied> {
        self.require(Role::Owner)?;
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AccessDenied("you do not own this establishment".to_string()))
        }
    }
}

/// Account profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile ID, shared with the auth identity.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
    /// System role.
    pub role: Role,
    /// Inspector rank code.
    pub position: Option<String>,
    /// Whether the account may log in and be assigned work.
    pub is_active: bool,
}

impl Profile {
    /// Name as shown on assignment lists and checklists: `First M. Last`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self
            .middle_name
            .as_deref()
            .and_then(|m| m.trim().chars().next())
        {
            Some(initial) => format!("{} {initial}. {}", self.first_name, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Returns true if the profile can be assigned inspections.
    #[must_use]
    pub fn is_assignable_inspector(&self) -> bool {
        self.role == Role::Inspector && self.is_active
    }
}

/// Minimal email shape check used at signup.
#[must_use]
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, middle: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "juan@example.com".to_string(),
            first_name: "Juan".to_string(),
            middle_name: middle.map(String::from),
            last_name: "Dela Cruz".to_string(),
            role,
            position: None,
            is_active: true,
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Inspector, Role::Owner] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("INSPECTOR"), Some(Role::Inspector));
        assert_eq!(Role::parse("viewer"), None);
    }

    #[test]
    fn test_actor_require_role() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        assert!(admin.require(Role::Admin).is_ok());
        assert!(admin.require(Role::Owner).is_err());
        assert!(admin.is_admin());
    }

    #[test]
    fn test_require_owner_of() {
        let owner_id = Uuid::new_v4();
        let owner = Actor::new(owner_id, Role::Owner);
        assert!(owner.require_owner_of(owner_id).is_ok());
        assert!(owner.require_owner_of(Uuid::new_v4()).is_err());

        let admin = Actor::new(owner_id, Role::Admin);
        assert!(admin.require_owner_of(owner_id).is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(profile(Role::Owner, None).display_name(), "Juan Dela Cruz");
        assert_eq!(
            profile(Role::Owner, Some("Santos")).display_name(),
            "Juan S. Dela Cruz"
        );
        assert_eq!(profile(Role::Owner, Some("  ")).display_name(), "Juan Dela Cruz");
    }

    #[test]
    fn test_assignable_inspector() {
        assert!(profile(Role::Inspector, None).is_assignable_inspector());
        assert!(!profile(Role::Owner, None).is_assignable_inspector());

        let mut inactive = profile(Role::Inspector, None);
        inactive.is_active = false;
        assert!(!inactive.is_assignable_inspector());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("owner@bakery.ph"));
        assert!(!is_plausible_email("owner.bakery.ph"));
        assert!(!is_plausible_email("@bakery.ph"));
        assert!(!is_plausible_email("owner@bakery"));
        assert!(!is_plausible_email("own er@bakery.ph"));
    }
}
