//! Target selector extraction.
//!
//! # Responsibilities
//! - Read the target name from the path segment after the relay prefix
//! - Fall back to the selector header, then to the configured default
//!
//! # Design Decisions
//! - Path matching is case-sensitive and exact on the prefix segment
//! - Only one extra path segment is accepted

use axum::http::{HeaderMap, HeaderName};

/// Which gateway an inbound request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// Explicitly named target.
    Named(String),
    /// No name given; the configured default applies.
    Default,
}

impl TargetSelector {
    /// Extract a selector from a request path and headers.
    ///
    /// Returns `None` when the path is not a relay path at all.
    pub fn from_request(
        prefix: &str,
        path: &str,
        headers: &HeaderMap,
        selector_header: &HeaderName,
    ) -> Option<Self> {
        let rest = path.strip_prefix(prefix.trim_end_matches('/'))?;

        match rest {
            "" | "/" => {
                let named = headers
                    .get(selector_header)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty());
                Some(match named {
                    Some(name) => TargetSelector::Named(name.to_string()),
                    None => TargetSelector::Default,
                })
            }
            _ => {
                let name = rest.strip_prefix('/')?;
                let name = name.strip_suffix('/').unwrap_or(name);
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(TargetSelector::Named(name.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn header() -> HeaderName {
        HeaderName::from_static("ohttp-gateway")
    }

    #[test]
    fn test_path_selector() {
        let headers = HeaderMap::new();
        assert_eq!(
            TargetSelector::from_request("/gateway", "/gateway/g1", &headers, &header()),
            Some(TargetSelector::Named("g1".into()))
        );
        assert_eq!(
            TargetSelector::from_request("/gateway", "/gateway/g1/", &headers, &header()),
            Some(TargetSelector::Named("g1".into()))
        );
    }

    #[test]
    fn test_header_and_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            TargetSelector::from_request("/gateway", "/gateway", &headers, &header()),
            Some(TargetSelector::Default)
        );

        headers.insert("ohttp-gateway", HeaderValue::from_static("g2"));
        assert_eq!(
            TargetSelector::from_request("/gateway", "/gateway", &headers, &header()),
            Some(TargetSelector::Named("g2".into()))
        );
    }

    #[test]
    fn test_path_takes_precedence_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert("ohttp-gateway", HeaderValue::from_static("g2"));
        assert_eq!(
            TargetSelector::from_request("/gateway", "/gateway/g1", &headers, &header()),
            Some(TargetSelector::Named("g1".into()))
        );
    }

    #[test]
    fn test_root_prefix() {
        let headers = HeaderMap::new();
        assert_eq!(
            TargetSelector::from_request("/", "/g1", &headers, &header()),
            Some(TargetSelector::Named("g1".into()))
        );
        assert_eq!(
            TargetSelector::from_request("/", "/", &headers, &header()),
            Some(TargetSelector::Default)
        );
    }

    #[test]
    fn test_not_a_relay_path() {
        let headers = HeaderMap::new();
        assert_eq!(TargetSelector::from_request("/gateway", "/other", &headers, &header()), None);
        assert_eq!(TargetSelector::from_request("/gateway", "/gatewayx", &headers, &header()), None);
        assert_eq!(TargetSelector::from_request("/gateway", "/gateway/a/b", &headers, &header()), None);
    }
}
