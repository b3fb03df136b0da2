//! Client identification utilities
//!
//! Source IP and User-Agent as recorded on sessions and audit entries.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest User-Agent we keep; the rest is cut off before storage
pub const MAX_USER_AGENT_LEN: usize = 512;

/// Request origin as seen by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent header, truncated to [`MAX_USER_AGENT_LEN`] characters
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Build from request headers and the peer address, if known
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent,
        }
    }

    /// IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For first (first hop, for reverse proxy setups), then
/// X-Real-IP, then falls back to the direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip).or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));

        let ctx = ClientContext::from_headers(&headers, None);
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(ctx.ip_string().as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_user_agent_truncated() {
        let long = "a".repeat(MAX_USER_AGENT_LEN * 2);
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let ctx = ClientContext::from_headers(&headers, None);
        assert_eq!(ctx.user_agent.unwrap().len(), MAX_USER_AGENT_LEN);
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_real_ip_then_direct() {
        let direct: IpAddr = "127.0.0.1".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));

        headers.insert("x-real-ip", HeaderValue::from_static("10.1.2.3"));
        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("10.1.2.3".parse().unwrap())
        );
    }
}
