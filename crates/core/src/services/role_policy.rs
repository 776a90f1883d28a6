//! Server-side role policy.
//!
//! Role authority lives here, in configuration, instead of being re-derived
//! by clients: allow-listed emails are always provisioned as admins, and the
//! super admin account is pinned to its configured branch.

use campusdesk_common::config::PortalConfig;
use campusdesk_db::entities::user::Role;

/// Decides roles and validates branches for new and updated accounts.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    branches: Vec<String>,
    admin_emails: Vec<String>,
    super_admin_email: String,
    super_admin_branch: String,
}

impl RolePolicy {
    /// Build the policy from portal configuration.
    #[must_use]
    pub fn new(portal: &PortalConfig) -> Self {
        Self {
            branches: portal.branches.clone(),
            admin_emails: portal
                .admin_emails
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            super_admin_email: portal.super_admin_email.to_lowercase(),
            super_admin_branch: portal.super_admin_branch.clone(),
        }
    }

    /// The role an account with this email is provisioned with.
    #[must_use]
    pub fn role_for(&self, email: &str) -> Role {
        let email = email.to_lowercase();
        if email == self.super_admin_email || self.admin_emails.contains(&email) {
            Role::Admin
        } else {
            Role::Student
        }
    }

    /// Branch override for the email, if any. The super admin is always
    /// pinned to its configured branch regardless of what was requested.
    #[must_use]
    pub fn branch_override(&self, email: &str) -> Option<&str> {
        if email.to_lowercase() == self.super_admin_email {
            Some(&self.super_admin_branch)
        } else {
            None
        }
    }

    /// Whether this email is the cross-branch super admin.
    #[must_use]
    pub fn is_super_admin(&self, email: &str) -> bool {
        email.to_lowercase() == self.super_admin_email
    }

    /// The branch reserved for the super admin.
    #[must_use]
    pub fn super_admin_branch(&self) -> &str {
        &self.super_admin_branch
    }

    /// Whether the branch is one of the configured campus branches.
    #[must_use]
    pub fn is_valid_branch(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }

    /// All configured branches.
    #[must_use]
    pub fn branches(&self) -> &[String] {
        &self.branches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_policy() -> RolePolicy {
        RolePolicy::new(&PortalConfig {
            name: "Test Portal".to_string(),
            branches: vec![
                "Bengaluru".to_string(),
                "Kochi".to_string(),
                "Chennai".to_string(),
            ],
            admin_emails: vec![
                "admin.blr@example.com".to_string(),
                "admin.chn@example.com".to_string(),
            ],
            super_admin_email: "admin.kochi@example.com".to_string(),
            super_admin_branch: "Kochi".to_string(),
        })
    }

    #[test]
    fn test_allow_listed_email_is_admin() {
        let policy = test_policy();
        assert_eq!(policy.role_for("admin.blr@example.com"), Role::Admin);
        assert_eq!(policy.role_for("ADMIN.CHN@example.com"), Role::Admin);
    }

    #[test]
    fn test_other_emails_are_students() {
        let policy = test_policy();
        assert_eq!(policy.role_for("student@example.com"), Role::Student);
    }

    #[test]
    fn test_super_admin_pinned_to_branch() {
        let policy = test_policy();
        assert_eq!(policy.role_for("admin.kochi@example.com"), Role::Admin);
        assert_eq!(
            policy.branch_override("admin.kochi@example.com"),
            Some("Kochi")
        );
        assert!(policy.is_super_admin("Admin.Kochi@example.com"));
    }

    #[test]
    fn test_branch_admins_have_no_override() {
        let policy = test_policy();
        assert_eq!(policy.branch_override("admin.blr@example.com"), None);
        assert!(!policy.is_super_admin("admin.blr@example.com"));
    }

    #[test]
    fn test_branch_validation() {
        let policy = test_policy();
        assert!(policy.is_valid_branch("Kochi"));
        assert!(!policy.is_valid_branch("Atlantis"));
    }
}
