//! Request origin checks for cookie-authenticated state changes
//!
//! A form on any site can POST to us with the user's session cookie
//! attached. Such requests are only honored when the browser reports an
//! `Origin` (or, failing that, a `Referer`) on the allowed origin list.

use axum::http::{header, HeaderMap};

/// `scheme://host[:port]` of an absolute URL
fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")?;
    let authority_start = scheme_end + 3;
    let authority_len = url[authority_start..]
        .find(['/', '?', '#'])
        .unwrap_or(url.len() - authority_start);

    if authority_len == 0 {
        return None;
    }

    Some(&url[..authority_start + authority_len])
}

fn request_origin(headers: &HeaderMap) -> Option<&str> {
    if let Some(origin) = headers.get(header::ORIGIN) {
        // "null" comes from sandboxed frames and privacy redirects
        return origin
            .to_str()
            .ok()
            .filter(|origin| *origin != "null")
            .and_then(origin_of);
    }

    headers
        .get(header::REFERER)
        .and_then(|referer| referer.to_str().ok())
        .and_then(origin_of)
}

/// Whether the request was sent from one of `allowed_origins`
///
/// Requests reporting neither header are not trusted.
pub fn is_trusted_origin(headers: &HeaderMap, allowed_origins: &[String]) -> bool {
    let Some(origin) = request_origin(headers) else {
        return false;
    };

    allowed_origins
        .iter()
        .any(|allowed| allowed.trim_end_matches('/').eq_ignore_ascii_case(origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn allowed() -> Vec<String> {
        vec![
            "https://app.example.com".to_string(),
            "http://localhost:3000/".to_string(),
        ]
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(name.clone(), HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_origin_of_strips_path() {
        assert_eq!(origin_of("https://app.example.com/pricing?x=1"), Some("https://app.example.com"));
        assert_eq!(origin_of("http://localhost:3000"), Some("http://localhost:3000"));
        assert_eq!(origin_of("https:///pricing"), None);
        assert_eq!(origin_of("/pricing"), None);
    }

    #[test]
    fn test_allowed_origin_is_trusted() {
        let h = headers(&[(header::ORIGIN, "https://app.example.com")]);
        assert!(is_trusted_origin(&h, &allowed()));

        // Trailing slash in config does not matter
        let h = headers(&[(header::ORIGIN, "http://localhost:3000")]);
        assert!(is_trusted_origin(&h, &allowed()));
    }

    #[test]
    fn test_foreign_origin_is_rejected() {
        let h = headers(&[(header::ORIGIN, "https://evil.example.net")]);
        assert!(!is_trusted_origin(&h, &allowed()));

        // Prefix tricks do not match
        let h = headers(&[(header::ORIGIN, "https://app.example.com.evil.net")]);
        assert!(!is_trusted_origin(&h, &allowed()));
    }

    #[test]
    fn test_referer_used_without_origin() {
        let h = headers(&[(header::REFERER, "https://app.example.com/pricing")]);
        assert!(is_trusted_origin(&h, &allowed()));

        let h = headers(&[(header::REFERER, "https://evil.example.net/app.example.com")]);
        assert!(!is_trusted_origin(&h, &allowed()));
    }

    #[test]
    fn test_origin_takes_precedence_over_referer() {
        let h = headers(&[
            (header::ORIGIN, "https://evil.example.net"),
            (header::REFERER, "https://app.example.com/pricing"),
        ]);
        assert!(!is_trusted_origin(&h, &allowed()));
    }

    #[test]
    fn test_missing_or_null_origin_is_rejected() {
        assert!(!is_trusted_origin(&HeaderMap::new(), &allowed()));

        let h = headers(&[(header::ORIGIN, "null")]);
        assert!(!is_trusted_origin(&h, &allowed()));
    }
}
