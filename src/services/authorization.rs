//! Authorization checks
//!
//! Components never look permissions up themselves; the shell passes an
//! [`Authorizer`] in and the result of each check is handed to the
//! component on every draw.

use std::collections::HashSet;

/// Capability required to edit slot-filling rules
pub const EDIT_RULES: &str = "stories:w";

pub trait Authorizer {
    /// Whether `capability` is granted within the scope `scope_id`
    fn can(&self, capability: &str, scope_id: &str) -> bool;
}

/// Grants from a static list of capabilities
///
/// An entry `cap` applies to every scope; `cap@scope` applies only to that
/// scope.
#[derive(Debug, Clone, Default)]
pub struct CapabilityAuthorizer {
    granted: HashSet<String>,
}

impl CapabilityAuthorizer {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: capabilities.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for CapabilityAuthorizer {
    fn can(&self, capability: &str, scope_id: &str) -> bool {
        self.granted.contains(capability)
            || self.granted.contains(&format!("{}@{}", capability, scope_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_grant() {
        let auth = CapabilityAuthorizer::new(["stories:w"]);
        assert!(auth.can(EDIT_RULES, "bf"));
        assert!(auth.can(EDIT_RULES, "other"));
        assert!(!auth.can("nlu-data:w", "bf"));
    }

    #[test]
    fn test_scoped_grant() {
        let auth = CapabilityAuthorizer::new(["stories:w@bf", "stories:r"]);
        assert!(auth.can(EDIT_RULES, "bf"));
        assert!(!auth.can(EDIT_RULES, "other"));
        assert!(auth.can("stories:r", "other"));
    }

    #[test]
    fn test_no_grants() {
        let auth = CapabilityAuthorizer::default();
        assert!(!auth.can(EDIT_RULES, "bf"));
    }
}
