//! URL canonicalization for request identities and origin checks.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("relative URL without a base: {0}")]
    Relative(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string so equal requests share one cache identity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve paths starting with `/` against `base`
/// 3. Lowercase the host (the url crate does this for http(s))
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match (trimmed.starts_with('/') && !trimmed.starts_with("//"), base) {
        (true, Some(base)) => base.join(trimmed),
        (true, None) => return Err(UrlError::Relative(trimmed.to_string())),
        (false, _) => Url::parse(trimmed),
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://blog.example.com").unwrap()
    }

    #[test]
    fn test_canonicalize_absolute() {
        let url = canonicalize("https://example.com", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_path_against_base() {
        let url = canonicalize("/posts/", Some(&origin())).unwrap();
        assert_eq!(url.as_str(), "https://blog.example.com/posts/");
    }

    #[test]
    fn test_canonicalize_path_without_base() {
        let result = canonicalize("/posts/", None);
        assert!(matches!(result, Err(UrlError::Relative(_))));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/About/", None).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/About/");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("/posts/#comments", Some(&origin())).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.as_str(), "https://blog.example.com/posts/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com/index.json?b=2&a=1", None).unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd", None);
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("", None), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   ", None), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("https://blog.example.com/posts/").unwrap();
        let b = Url::parse("https://blog.example.com:443/app.css").unwrap();
        let other_scheme = Url::parse("http://blog.example.com/").unwrap();
        let other_host = Url::parse("https://cdn.example.com/").unwrap();

        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &other_scheme));
        assert!(!same_origin(&a, &other_host));
    }
}
