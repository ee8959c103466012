//! Signed, expiring identity tokens built from primitives.
//!
//! A token is three dot-joined URL-safe base64 segments: header, payload,
//! signature. Header and payload are JSON; the signature is an HMAC-SHA256
//! over the exact string `b64(header) + "." + b64(payload)` using a single
//! process-wide secret. Verification is a pure function of the token and the
//! secret — there is no server-side session or revocation state.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use ember_types::api::Claims;

type HmacSha256 = Hmac<Sha256>;

/// Tokens are valid for 7 days from issuance. Not configurable per call.
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const ISSUER: &str = "ember";

/// Fixed header segment: `{"alg":"HS256","typ":"JWT"}`.
const HEADER_JSON: &[u8] = br#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is not three dot-separated segments")]
    Malformed,
    #[error("invalid signature, content was altered")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// Stateless encode/verify of identity tokens. Owns the process secret,
/// which is injected at construction and never a literal.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a token for `subject` (username) and their row id, expiring
    /// 7 days from now.
    pub fn issue(&self, subject: &str, user_id: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            id: user_id,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        self.encode(&claims)
    }

    /// Verify a token and return its claims.
    ///
    /// The HMAC is recomputed over the received header and payload segments
    /// and compared against the received signature in constant time
    /// (`Mac::verify_slice`); a prefix-by-prefix string comparison would leak
    /// match length over the network. Expiry is checked only on tokens whose
    /// signature verified.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let sig_bytes = B64.decode(signature).map_err(|_| TokenError::InvalidSignature)?;

        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload_bytes = B64.decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn encode(&self, claims: &Claims) -> String {
        let payload = serde_json::to_vec(claims).expect("claims serialize to JSON");
        let signing_input = format!("{}.{}", B64.encode(HEADER_JSON), B64.encode(&payload));

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = B64.encode(mac.finalize().into_bytes());

        format!("{signing_input}.{signature}")
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }
}
