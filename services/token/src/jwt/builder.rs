//! Claim set construction.

use crate::jwt::claims::ClaimSet;
use crate::refresh::generator::RefreshTokenGenerator;
use crate::storage::Identity;

/// Maps an identity and its roles onto the claims embedded in access tokens.
pub struct ClaimsBuilder;

impl ClaimsBuilder {
    /// Every call mints a new `jti`. Roles are copied verbatim, duplicates
    /// included.
    pub fn build(identity: &Identity, roles: &[String]) -> ClaimSet {
        ClaimSet {
            sub: identity.display_name.clone(),
            jti: RefreshTokenGenerator::generate_jti(),
            email: identity.email.clone(),
            uid: identity.id.clone(),
            roles: roles.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("user-123", "grace@example.com", "Grace Hopper")
    }

    #[test]
    fn test_builder_basic() {
        let roles = vec!["Admin".to_string(), "Reader".to_string()];
        let claims = ClaimsBuilder::build(&identity(), &roles);

        assert_eq!(claims.sub, "Grace Hopper");
        assert_eq!(claims.email, "grace@example.com");
        assert_eq!(claims.uid, "user-123");
        assert_eq!(claims.roles, roles);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_builder_keeps_duplicate_roles() {
        let roles = vec!["Reader".to_string(), "Reader".to_string()];
        let claims = ClaimsBuilder::build(&identity(), &roles);

        assert_eq!(claims.roles.len(), 2);
    }

    #[test]
    fn test_builder_fresh_jti() {
        let a = ClaimsBuilder::build(&identity(), &[]);
        let b = ClaimsBuilder::build(&identity(), &[]);

        assert_ne!(a.jti, b.jti);
        assert!(a.roles.is_empty());
    }
}
