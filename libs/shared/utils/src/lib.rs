pub mod extractor;
pub mod jwt;
pub mod test_utils;

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::jwt::validate_token;
    use crate::test_utils::{JwtTestUtils, TestAdmin, TestConfig};

    #[test]
    fn valid_token_round_trips_admin_claims() {
        let config = TestConfig::default();
        let admin = TestAdmin::default();
        let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);

        let session = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(session.id, admin.id);
        assert_eq!(session.email.as_deref(), Some(admin.email.as_str()));
        assert_eq!(session.role.as_deref(), Some("admin"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let admin = TestAdmin::default();
        let token = JwtTestUtils::create_expired_token(&admin, &config.jwt_secret);

        assert_matches!(validate_token(&token, &config.jwt_secret), Err(msg) if msg.contains("expired"));
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let config = TestConfig::default();
        let admin = TestAdmin::default();
        let token = JwtTestUtils::create_invalid_signature_token(&admin);

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_malformed_token();

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
