//! Roles and the editing privilege.
//!
//! The profile backend hands back free-form role strings (`"admin"`,
//! `"customer"`, ...).  They are collapsed into three coarse [`Role`]s, and
//! the editor only ever looks at the resulting [`Privilege`].
//!
//! # Why three privilege states?
//!
//! Role resolution is asynchronous.  Until it finishes the answer is
//! [`Privilege::Unknown`], and every consumer must treat that exactly like
//! [`Privilege::Denied`].  A plain `bool` defaulting to `true` would flash the
//! editor at visitors; defaulting to `false` would hide the difference between
//! "not yet known" and "known to be denied", which the access gate needs when
//! the session switches identity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse privilege classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No session at all.
    Anonymous,
    /// Signed in, without editing rights (including "no profile record").
    Standard,
    /// Signed in with a role from the privileged set.
    Privileged,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Anonymous => write!(f, "anonymous"),
            Role::Standard => write!(f, "standard"),
            Role::Privileged => write!(f, "privileged"),
        }
    }
}

/// Whether the current session may use the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    /// Resolution has not completed yet.
    #[default]
    Unknown,
    Denied,
    Granted,
}

impl Privilege {
    /// `true` only for [`Privilege::Granted`].  `Unknown` fails closed.
    pub fn allows_editing(self) -> bool {
        matches!(self, Privilege::Granted)
    }

    /// `true` once resolution produced an answer.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Privilege::Unknown)
    }
}

impl From<Role> for Privilege {
    fn from(role: Role) -> Self {
        match role {
            Role::Privileged => Privilege::Granted,
            Role::Anonymous | Role::Standard => Privilege::Denied,
        }
    }
}

/// The set of role strings that unlock the editor.
///
/// Matching trims surrounding whitespace and ignores ASCII case, so
/// `" Admin "` and `"admin"` are the same role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    privileged: BTreeSet<String>,
}

impl RolePolicy {
    /// Builds a policy from role names.
    pub fn new<I, S>(privileged: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            privileged: privileged
                .into_iter()
                .map(|r| normalize(r.as_ref()))
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Classifies a profile lookup result for a signed-in session.
    ///
    /// `None` means the identity has no profile record.
    pub fn classify(&self, role: Option<&str>) -> Role {
        match role {
            Some(name) if self.privileged.contains(&normalize(name)) => Role::Privileged,
            _ => Role::Standard,
        }
    }

    /// The normalized privileged role names, sorted.
    pub fn privileged_roles(&self) -> impl Iterator<Item = &str> {
        self.privileged.iter().map(String::as_str)
    }
}

impl Default for RolePolicy {
    /// `admin` and `super_admin`.
    fn default() -> Self {
        Self::new(["admin", "super_admin"])
    }
}

fn normalize(role: &str) -> String {
    role.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_privilege_fails_closed() {
        assert!(!Privilege::Unknown.allows_editing());
        assert!(!Privilege::Denied.allows_editing());
        assert!(Privilege::Granted.allows_editing());
    }

    #[test]
    fn test_default_privilege_is_unknown() {
        assert_eq!(Privilege::default(), Privilege::Unknown);
        assert!(!Privilege::default().is_resolved());
    }

    #[test]
    fn test_role_to_privilege() {
        assert_eq!(Privilege::from(Role::Anonymous), Privilege::Denied);
        assert_eq!(Privilege::from(Role::Standard), Privilege::Denied);
        assert_eq!(Privilege::from(Role::Privileged), Privilege::Granted);
    }

    #[test]
    fn test_default_policy_grants_both_admin_tiers() {
        let policy = RolePolicy::default();
        assert_eq!(policy.classify(Some("admin")), Role::Privileged);
        assert_eq!(policy.classify(Some("super_admin")), Role::Privileged);
    }

    #[test]
    fn test_standard_and_missing_roles_are_not_privileged() {
        let policy = RolePolicy::default();
        assert_eq!(policy.classify(Some("standard")), Role::Standard);
        assert_eq!(policy.classify(Some("")), Role::Standard);
        assert_eq!(policy.classify(None), Role::Standard);
    }

    #[test]
    fn test_role_matching_ignores_case_and_padding() {
        let policy = RolePolicy::new(["Editor"]);
        assert_eq!(policy.classify(Some("  EDITOR ")), Role::Privileged);
        assert_eq!(policy.classify(Some("admin")), Role::Standard);
    }

    #[test]
    fn test_empty_role_names_are_dropped_from_policy() {
        let policy = RolePolicy::new(["", "  ", "owner"]);
        assert_eq!(policy.privileged_roles().collect::<Vec<_>>(), vec!["owner"]);
    }

    #[test]
    fn test_role_display_and_serde_agree() {
        let json = serde_json::to_string(&Role::Privileged).unwrap();
        assert_eq!(json, format!("\"{}\"", Role::Privileged));
    }
}
