//! Signed token issuance and validation.
//!
//! Tokens are compact HS256 JWTs built with `jsonwebtoken`. Only HS256 is ever accepted. The
//! header algorithm is read before the crate sees the token, so `none` and algorithms the crate
//! cannot even parse are reported as `UnexpectedAlgorithm` rather than a generic decode failure.
//!
//! Validation is a pure local check. It never touches the store; whether the merchant is still
//! active is decided by the auth service.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The only algorithm this manager issues or accepts.
pub const ALGORITHM: &str = "HS256";

/// Just enough of the header to inspect `alg` as an arbitrary string.
#[derive(Debug, Deserialize)]
struct RawHeader {
    #[serde(default)]
    alg: Option<String>,
}

/// Claims carried by a token.
///
/// `email` is a snapshot taken at issuance and is not re-checked against the merchant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub merchant_id: i64,
    pub email: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Not before (seconds since epoch)
    pub nbf: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Issues and validates HS256 tokens.
///
/// Holds only the keys and the expiration, all fixed at construction, so one instance can be
/// shared across tasks without synchronization.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(secret: impl Into<Vec<u8>>, expiration: Duration) -> Self {
        let secret = secret.into();

        // The validity window is checked against the caller's clock in `validate_at`, so the
        // crate only verifies structure, algorithm and signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
            expiration,
        }
    }

    /// Issue a token for a merchant, valid from now for the configured expiration.
    pub fn issue(&self, merchant_id: i64, email: &str) -> Result<String, AuthError> {
        self.issue_at(merchant_id, email, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// `Internal` if `now + expiration` is outside the representable time range, or encoding
    /// fails.
    pub fn issue_at(
        &self,
        merchant_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires = now.checked_add_signed(self.expiration).ok_or_else(|| {
            AuthError::Internal(format!(
                "Token expiration {:?} is out of range",
                self.expiration
            ))
        })?;

        let issued_at = now.timestamp();
        let claims = TokenClaims {
            merchant_id,
            email: email.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AuthError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// # Checks (in order)
    ///
    /// 1. Three segments, header and claims segments decode → else `MalformedToken`
    /// 2. Header `alg` is `HS256` → else `UnexpectedAlgorithm`
    /// 3. Signature matches → else `InvalidSignature`
    /// 4. Claims deserialize → else `MalformedToken`
    /// 5. `nbf <= now < exp` → else `NotYetValid` / `Expired`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        check_header(token)?;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        let now = now.timestamp();
        if now < claims.nbf {
            return Err(AuthError::NotYetValid);
        }
        if now >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Structural and algorithm checks that must run before signature verification.
fn check_header(token: &str) -> Result<(), AuthError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };

    let header_json = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: RawHeader =
        serde_json::from_slice(&header_json).map_err(|_| AuthError::MalformedToken)?;
    URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| AuthError::MalformedToken)?;

    if header.alg.as_deref() != Some(ALGORITHM) {
        tracing::debug!("Rejected token with algorithm {:?}", header.alg);
        return Err(AuthError::UnexpectedAlgorithm);
    }

    Ok(())
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidAlgorithm => AuthError::UnexpectedAlgorithm,
        other => {
            tracing::debug!("Token decode failed: {:?}", other);
            AuthError::MalformedToken
        }
    }
}
