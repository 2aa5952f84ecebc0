//! Caller address used as the rate-limit identity on anonymous routes.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::state::AppState;

/// Header carrying the original client address behind a proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Best-effort caller address.
///
/// The first `X-Forwarded-For` entry is used only when the deployment trusts
/// its proxy to set it. Otherwise the socket peer address is used, then the
/// literal `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    /// Resolve the caller address from request parts.
    ///
    /// With `trust_forwarded` off, `X-Forwarded-For` is ignored: a client
    /// could otherwise pick a fresh identity on every request.
    pub fn from_parts(parts: &Parts, trust_forwarded: bool) -> Self {
        if trust_forwarded {
            let forwarded = parts
                .headers
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            if let Some(addr) = forwarded {
                return Self(addr.to_string());
            }
        }

        match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => Self(addr.ip().to_string()),
            None => Self("unknown".to_string()),
        }
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(
            parts,
            state.config.rate_limit.trust_forwarded_for,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(forwarded: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/login");
        if let Some(value) = forwarded {
            builder = builder.header(FORWARDED_FOR, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn with_peer(mut p: Parts) -> Parts {
        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        p
    }

    #[test]
    fn test_trusted_first_forwarded_entry_wins() {
        let p = with_peer(parts(Some("203.0.113.7, 10.0.0.1")));
        assert_eq!(ClientAddr::from_parts(&p, true).as_str(), "203.0.113.7");
    }

    #[test]
    fn test_untrusted_forwarded_header_is_ignored() {
        let p = with_peer(parts(Some("203.0.113.7")));
        assert_eq!(ClientAddr::from_parts(&p, false).as_str(), "192.0.2.1");
    }

    #[test]
    fn test_connect_info_fallback() {
        let p = with_peer(parts(None));
        assert_eq!(ClientAddr::from_parts(&p, true).as_str(), "192.0.2.1");
    }

    #[test]
    fn test_unknown_without_any_source() {
        assert_eq!(ClientAddr::from_parts(&parts(None), true).as_str(), "unknown");
        assert_eq!(
            ClientAddr::from_parts(&parts(Some("203.0.113.7")), false).as_str(),
            "unknown"
        );
    }
}
