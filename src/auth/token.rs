//! Session token handling. The portal issues a compact JWT; the client only reads
//! its claims (expiry, subject, roles) and never verifies the signature, it has no
//! key. The raw token stays inside a `SecretString` and must never be logged.

use crate::auth::error::AuthError;
use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: Option<String>,
    /// Expiry as unix seconds.
    pub exp: i64,
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    exp: Option<i64>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Clone)]
pub struct SessionToken {
    raw: SecretString,
    claims: TokenClaims,
}

impl SessionToken {
    /// Parses the claims of a compact JWT.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] when the token is not a three-part JWT, the
    /// payload is not base64url JSON, or the `exp` claim is missing.
    pub fn parse(raw: SecretString) -> Result<Self, AuthError> {
        let claims = decode_claims(raw.expose_secret())?;
        Ok(Self { raw, claims })
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.raw
    }

    #[must_use]
    pub const fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    #[must_use]
    pub const fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.claims.roles
    }

    /// A token is valid strictly while its expiry is in the future.
    #[must_use]
    pub const fn is_valid_at(&self, now_unix_seconds: i64) -> bool {
        self.claims.exp > now_unix_seconds
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("raw", &"***")
            .field("claims", &self.claims)
            .finish()
    }
}

fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken("invalid token format".to_string()));
    };

    // tolerate padded payloads from non-conforming issuers
    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| AuthError::InvalidToken("invalid base64url encoding".to_string()))?;
    let raw: RawClaims = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("invalid claims: {e}")))?;

    let exp = raw
        .exp
        .ok_or_else(|| AuthError::InvalidToken("missing exp claim".to_string()))?;

    let mut roles = raw.roles;
    if let Some(joined) = raw.role {
        for role in joined.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            if !roles.iter().any(|existing| existing == role) {
                roles.push(role.to_string());
            }
        }
    }

    Ok(TokenClaims {
        sub: raw.sub,
        exp,
        roles,
    })
}
