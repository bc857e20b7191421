//! Client identity resolution.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Header set by reverse proxies carrying the original client address.
pub const REAL_IP_HEADER: &str = "x-real-ip";
/// Header carrying the proxy chain; used verbatim, not split into hops.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The string identity requests are grouped and counted by.
///
/// Values are taken as-is: a multi-hop forwarded-for list is one key, and
/// no IP parsing or normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Resolve the client key for a request.
    ///
    /// The first non-empty value wins, in order: the real-IP header, the
    /// forwarded-for header, then the transport peer address. Without any of
    /// these the key is empty, which groups all such callers together.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let from_headers = [REAL_IP_HEADER, FORWARDED_FOR_HEADER]
            .into_iter()
            .find_map(|name| {
                headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .filter(|value| !value.is_empty())
            });

        match from_headers {
            Some(value) => Self(value.to_string()),
            None => Self(peer.map(|addr| addr.to_string()).unwrap_or_default()),
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.1.2.3:54321".parse().unwrap())
    }

    #[test]
    fn test_real_ip_takes_priority() {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static("203.0.113.7"));
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("198.51.100.1"));

        let key = ClientKey::resolve(&headers, peer());
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_used_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR_HEADER,
            HeaderValue::from_static("198.51.100.1, 10.0.0.1"),
        );

        let key = ClientKey::resolve(&headers, peer());
        assert_eq!(key.as_str(), "198.51.100.1, 10.0.0.1");
    }

    #[test]
    fn test_empty_header_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static(""));
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("198.51.100.1"));

        let key = ClientKey::resolve(&headers, peer());
        assert_eq!(key.to_string(), "198.51.100.1");
    }

    #[test]
    fn test_peer_address_fallback() {
        let key = ClientKey::resolve(&HeaderMap::new(), peer());
        assert_eq!(key.as_ref(), "10.1.2.3:54321");
    }

    #[test]
    fn test_no_identity_yields_empty_key() {
        let key = ClientKey::resolve(&HeaderMap::new(), None);
        assert_eq!(key.as_str(), "");
    }

    #[test]
    fn test_non_ascii_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REAL_IP_HEADER,
            HeaderValue::from_bytes(&[0xC3, 0xA9]).unwrap(),
        );

        let key = ClientKey::resolve(&headers, peer());
        assert_eq!(key.as_str(), "10.1.2.3:54321");
    }
}
