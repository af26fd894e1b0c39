//! Bearer-token authentication for the `/v1` routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::handlers::error_response;

/// The shared secret, held only as its SHA-256 digest.
#[derive(Clone)]
pub struct BearerToken {
    digest: Arc<[u8; 32]>,
}

impl BearerToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Arc::new(Sha256::digest(token.as_bytes()).into()),
        }
    }

    /// Digests are compared in full so timing does not depend on where the
    /// presented token first differs.
    pub fn verify(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        presented
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Route layer: reject requests without a matching bearer token.
pub async fn require_bearer(
    State(token): State<BearerToken>,
    req: Request,
    next: Next,
) -> Response {
    match bearer(&req) {
        Some(presented) if token.verify(presented) => next.run(req).await,
        Some(_) => {
            debug!(path = %req.uri().path(), "rejected invalid token");
            error_response("invalid token", StatusCode::UNAUTHORIZED).into_response()
        }
        None => error_response("missing bearer token", StatusCode::UNAUTHORIZED).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_matches_only_the_same_token() {
        let token = BearerToken::new("s3cret");
        assert!(token.verify("s3cret"));
        assert!(!token.verify("s3cret "));
        assert!(!token.verify(""));
        assert!(!token.verify("other"));
    }

    #[test]
    fn debug_hides_the_digest() {
        assert_eq!(format!("{:?}", BearerToken::new("x")), "BearerToken(<redacted>)");
    }
}
