//! Declarative security constraints.

/// Rule binding a resource pattern to authentication, confidentiality, and
/// role requirements. Constraints are resolved by the realm; the stage only
/// iterates over the matched set.
#[derive(Clone, Debug)]
pub struct SecurityConstraint {
    pattern: String,
    requires_auth: bool,
    confidential: bool,
    roles: Vec<String>,
}

impl SecurityConstraint {
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            requires_auth: false,
            confidential: false,
            roles: Vec::new(),
        }
    }

    /// Require an authenticated caller.
    #[must_use]
    pub fn with_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Require a confidential transport.
    #[must_use]
    pub fn with_confidentiality(mut self) -> Self {
        self.confidential = true;
        self
    }

    /// Restrict access to callers holding one of the given roles.
    /// Implies an authentication requirement.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.requires_auth = true;
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    #[must_use]
    pub fn confidential(&self) -> bool {
        self.confidential
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Match a decoded request path against the constraint pattern.
    ///
    /// Supports exact matches and trailing-`*` prefix patterns such as
    /// `/secure/*`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if let Some(prefix) = self.pattern.strip_suffix("/*") {
            path == prefix || path.starts_with(&format!("{prefix}/"))
        } else if let Some(prefix) = self.pattern.strip_suffix('*') {
            path.starts_with(prefix)
        } else {
            path == self.pattern
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_matches_only_itself() {
        let constraint = SecurityConstraint::new("/admin");
        assert!(constraint.matches("/admin"));
        assert!(!constraint.matches("/admin/users"));
    }

    #[test]
    fn prefix_pattern_matches_subtree() {
        let constraint = SecurityConstraint::new("/secure/*");
        assert!(constraint.matches("/secure"));
        assert!(constraint.matches("/secure/page"));
        assert!(constraint.matches("/secure/deep/page"));
        assert!(!constraint.matches("/securely/page"));
    }

    #[test]
    fn roles_imply_auth() {
        let constraint = SecurityConstraint::new("/secure/*").with_roles(vec!["user".to_string()]);
        assert!(constraint.requires_auth());
        assert_eq!(constraint.roles(), ["user".to_string()]);
    }
}
