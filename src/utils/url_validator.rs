//! URL and alias validation.
//!
//! URLs are normalized to a canonical form before storage; aliases are
//! checked against the short-code character set.

use std::borrow::Cow;

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Minimum alias length in characters.
pub const ALIAS_MIN_LEN: usize = 3;

/// Maximum alias length in characters.
pub const ALIAS_MAX_LEN: usize = 20;

/// Errors produced while validating user input.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("Invalid URL: missing scheme or host")]
    MissingHost,

    #[error("Alias must be between 3 and 20 characters")]
    AliasLength(usize),

    #[error("Alias can only contain letters, numbers, and hyphens")]
    AliasCharacters,
}

impl From<UrlValidationError> for AppError {
    fn from(e: UrlValidationError) -> Self {
        let details = match &e {
            UrlValidationError::InvalidFormat(reason) => json!({ "reason": reason }),
            UrlValidationError::AliasLength(len) => json!({ "provided_length": len }),
            _ => json!({}),
        };
        AppError::bad_request(e.to_string(), details)
    }
}

/// Validates and normalizes a URL.
///
/// # Normalization Rules
///
/// 1. **Scheme**: `https://` is prepended when the input has none
/// 2. **Protocol**: only HTTP and HTTPS are allowed
/// 3. **Hostname**: converted to lowercase
/// 4. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 5. **Fragments**: removed
/// 6. **Path and query**: preserved as-is
///
/// # Errors
///
/// - [`UrlValidationError::InvalidFormat`] for malformed URLs
/// - [`UrlValidationError::UnsupportedProtocol`] for non-HTTP(S) schemes
/// - [`UrlValidationError::MissingHost`] when no host is present
///
/// # Examples
///
/// ```
/// use seq_shortener::utils::url_validator::validate_url;
///
/// assert_eq!(validate_url("EXAMPLE.com/Path").unwrap(), "https://example.com/Path");
/// assert!(validate_url("ftp://example.com").is_err());
/// ```
pub fn validate_url(input: &str) -> Result<String, UrlValidationError> {
    let input = input.trim();
    let candidate = with_default_scheme(input);

    let mut url =
        Url::parse(&candidate).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlValidationError::MissingHost)?
        .to_ascii_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None)
            .map_err(|_| UrlValidationError::InvalidFormat("cannot drop port".to_string()))?;
    }

    Ok(url.to_string())
}

/// Prepends `https://` unless the input already names a scheme.
///
/// `host:port/path` parses as a scheme named after the host; a path starting
/// with a digit is taken as a port and the input still gets the default scheme.
fn with_default_scheme(input: &str) -> Cow<'_, str> {
    let has_scheme = match Url::parse(input) {
        Ok(url) => {
            input.contains("://")
                || !url.path().chars().next().is_some_and(|c| c.is_ascii_digit())
        }
        Err(_) => false,
    };

    if has_scheme {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("https://{input}"))
    }
}

/// Validates an optional user-supplied alias.
///
/// `None` and the empty string are accepted: a code will be generated instead.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters, digits, hyphens
pub fn validate_alias(alias: Option<&str>) -> Result<(), UrlValidationError> {
    let Some(alias) = alias.filter(|a| !a.is_empty()) else {
        return Ok(());
    };

    let len = alias.chars().count();
    if !(ALIAS_MIN_LEN..=ALIAS_MAX_LEN).contains(&len) {
        return Err(UrlValidationError::AliasLength(len));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(UrlValidationError::AliasCharacters);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_simple_https() {
        assert_eq!(
            validate_url("https://example.com").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_validate_adds_missing_scheme() {
        assert_eq!(
            validate_url("example.com/path").unwrap(),
            "https://example.com/path"
        );
        assert_eq!(
            validate_url("www.google.com").unwrap(),
            "https://www.google.com/"
        );
    }

    #[test]
    fn test_validate_host_with_port_and_no_scheme() {
        assert_eq!(
            validate_url("localhost:3000/test").unwrap(),
            "https://localhost:3000/test"
        );
    }

    #[test]
    fn test_validate_keeps_http() {
        assert_eq!(
            validate_url("http://example.com/a").unwrap(),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_validate_uppercase_host() {
        assert_eq!(
            validate_url("HTTPS://EXAMPLE.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_validate_remove_default_port() {
        assert_eq!(
            validate_url("https://example.com:443/path").unwrap(),
            "https://example.com/path"
        );
        assert_eq!(
            validate_url("http://example.com:80/path").unwrap(),
            "http://example.com/path"
        );
    }

    #[test]
    fn test_validate_keep_custom_port() {
        assert_eq!(
            validate_url("http://example.com:8080/path").unwrap(),
            "http://example.com:8080/path"
        );
    }

    #[test]
    fn test_validate_remove_fragment_keep_query() {
        assert_eq!(
            validate_url("https://example.com/page?key=value#section").unwrap(),
            "https://example.com/page?key=value"
        );
    }

    #[test]
    fn test_validate_trims_whitespace() {
        assert_eq!(
            validate_url("  https://example.com/x  ").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_validate_invalid_url() {
        assert!(matches!(
            validate_url("not a valid url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_empty_string() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_rejects_other_protocols() {
        for input in [
            "ftp://example.com/file.txt",
            "file:///home/user/document.txt",
            "javascript:alert('xss')",
            "data:text/plain,Hello",
            "mailto:test@example.com",
        ] {
            assert!(
                matches!(
                    validate_url(input),
                    Err(UrlValidationError::UnsupportedProtocol)
                ),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_alias_none_and_empty_are_valid() {
        assert!(validate_alias(None).is_ok());
        assert!(validate_alias(Some("")).is_ok());
    }

    #[test]
    fn test_alias_valid() {
        assert!(validate_alias(Some("github")).is_ok());
        assert!(validate_alias(Some("My-Link-2024")).is_ok());
        assert!(validate_alias(Some("abc")).is_ok());
        assert!(validate_alias(Some("a".repeat(20).as_str())).is_ok());
    }

    #[test]
    fn test_alias_length() {
        assert!(matches!(
            validate_alias(Some("ab")),
            Err(UrlValidationError::AliasLength(2))
        ));
        assert!(matches!(
            validate_alias(Some("a".repeat(21).as_str())),
            Err(UrlValidationError::AliasLength(21))
        ));
    }

    #[test]
    fn test_alias_characters() {
        for alias in ["my_alias", "my alias", "alias!", "café1"] {
            assert!(
                matches!(
                    validate_alias(Some(alias)),
                    Err(UrlValidationError::AliasCharacters)
                ),
                "{} should be rejected",
                alias
            );
        }
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let err: AppError = UrlValidationError::AliasLength(2).into();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("between 3 and 20"));
    }
}
