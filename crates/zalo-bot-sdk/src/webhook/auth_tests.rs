//! Tests for webhook secret-token authentication.

use super::*;

fn headers_with_token(name: &str, token: &str) -> HashMap<String, String> {
    HashMap::from([(name.to_string(), token.to_string())])
}

const SECRET: &str = "Abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKL";

mod generation {
    use super::*;

    #[test]
    fn test_generated_token_is_48_alphanumeric_chars() {
        let token = generate_secret_token();

        assert_eq!(token.len(), SECRET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_secret_token(), generate_secret_token());
    }
}

mod authentication {
    use super::*;

    #[test]
    fn test_no_stored_secret_skips_check() {
        assert_eq!(authenticate(&HashMap::new(), None), Ok(()));
    }

    #[test]
    fn test_empty_stored_secret_skips_check() {
        assert_eq!(authenticate(&HashMap::new(), Some("")), Ok(()));

        let headers = headers_with_token(SECRET_TOKEN_HEADER, "anything");
        assert_eq!(authenticate(&headers, Some("")), Ok(()));
    }

    #[test]
    fn test_matching_token_is_accepted() {
        let headers = headers_with_token(SECRET_TOKEN_HEADER, SECRET);

        assert_eq!(authenticate(&headers, Some(SECRET)), Ok(()));
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let headers = headers_with_token("X-Bot-Api-Secret-Token", SECRET);

        assert_eq!(authenticate(&headers, Some(SECRET)), Ok(()));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = headers_with_token("content-type", "application/json");

        assert_eq!(
            authenticate(&headers, Some(SECRET)),
            Err(AuthError::MissingToken)
        );
    }

    /// Same length, one character different.
    #[test]
    fn test_single_character_difference_is_rejected() {
        let mut tampered = SECRET.to_string();
        tampered.replace_range(47..48, "M");
        assert_eq!(tampered.len(), SECRET.len());

        let headers = headers_with_token(SECRET_TOKEN_HEADER, &tampered);

        assert_eq!(
            authenticate(&headers, Some(SECRET)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_prefix_of_secret_is_rejected() {
        let headers = headers_with_token(SECRET_TOKEN_HEADER, &SECRET[..20]);

        assert_eq!(
            authenticate(&headers, Some(SECRET)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_empty_header_is_rejected() {
        let headers = headers_with_token(SECRET_TOKEN_HEADER, "");

        assert_eq!(
            authenticate(&headers, Some(SECRET)),
            Err(AuthError::InvalidToken)
        );
    }
}

#[test]
fn test_tokens_match_requires_equal_length() {
    assert!(tokens_match(b"abc", b"abc"));
    assert!(!tokens_match(b"abc", b"abcd"));
    assert!(!tokens_match(b"abd", b"abc"));
}
