//! Client for the `WebAuthn` ceremony endpoints of the portal API.
//!
//! A ceremony is options -> authenticator -> verification. The challenge returned
//! with the options is consumed by the verification call, so the same challenge can
//! never be submitted twice. Nothing is persisted here; storing the resulting
//! session is the provider's job.

use crate::{
    api::{ApiError, HttpClient},
    auth::{
        authenticator::Authenticator,
        error::AuthError,
        permissions::PermissionMap,
        token::SessionToken,
        types::{
            CeremonyKind, LoginVerificationRequest, MessageResponse, OptionsRequest,
            OptionsResponse, RegisterVerificationRequest, VerificationResponse,
            VerifyEmailRequest,
        },
    },
    config::{AuthConfig, Endpoints},
};
use secrecy::SecretString;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Which options endpoint starts the ceremony.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CeremonyMode {
    /// Unified endpoint; the server decides between registration and login.
    #[default]
    Auto,
    Register,
    Login,
}

impl CeremonyMode {
    const fn expected_kind(self) -> Option<CeremonyKind> {
        match self {
            Self::Auto => None,
            Self::Register => Some(CeremonyKind::Register),
            Self::Login => Some(CeremonyKind::Login),
        }
    }
}

/// Ceremony parameters handed to the authenticator.
#[derive(Clone, Debug)]
pub struct CeremonyOptions {
    kind: CeremonyKind,
    public_key: Value,
}

impl CeremonyOptions {
    #[must_use]
    pub const fn kind(&self) -> CeremonyKind {
        self.kind
    }

    /// The `publicKey` parameters (challenge, rp, user, timeout, ...).
    #[must_use]
    pub const fn public_key(&self) -> &Value {
        &self.public_key
    }

    /// Decodes an options response into parameters plus the single-use challenge.
    ///
    /// # Errors
    /// Returns [`AuthError::CeremonyOptions`] when the parameters cannot be decoded,
    /// carry no challenge, lack the user id a registration needs, or announce a
    /// different ceremony than `expected`.
    pub fn from_response(
        response: OptionsResponse,
        expected: Option<CeremonyKind>,
    ) -> Result<(Self, Challenge), AuthError> {
        let decoded = match response.options {
            // some verifiers send the options object JSON-encoded a second time
            Value::String(encoded) => serde_json::from_str::<Value>(&encoded)
                .map_err(|e| AuthError::CeremonyOptions(format!("invalid options JSON: {e}")))?,
            other => other,
        };

        let public_key = match decoded {
            Value::Object(mut map) => match map.remove("publicKey") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            _ => {
                return Err(AuthError::CeremonyOptions(
                    "options are not a JSON object".to_string(),
                ))
            }
        };

        let challenge = public_key["challenge"]
            .as_str()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::CeremonyOptions("missing challenge".to_string()))?
            .to_string();

        let user_id = public_key["user"]["id"].as_str().map(str::to_string);

        let inferred = if public_key.get("user").is_some() {
            CeremonyKind::Register
        } else {
            CeremonyKind::Login
        };

        let kind = match (response.flow, expected) {
            (Some(flow), Some(expected)) if flow != expected => {
                return Err(AuthError::CeremonyOptions(format!(
                    "server started a {flow} ceremony, expected {expected}"
                )))
            }
            (Some(flow), _) => flow,
            (None, Some(expected)) => expected,
            (None, None) => inferred,
        };

        if kind == CeremonyKind::Register && user_id.is_none() {
            return Err(AuthError::CeremonyOptions(
                "registration options carry no user id".to_string(),
            ));
        }

        let ttl = public_key["timeout"].as_u64().map(Duration::from_millis);

        Ok((
            Self { kind, public_key },
            Challenge {
                value: challenge,
                kind,
                user_id,
                issued_at: Instant::now(),
                ttl,
            },
        ))
    }
}

/// Server-issued nonce for one ceremony attempt. Not `Clone`: verification takes it
/// by value, so a challenge is gone after one attempt whatever the outcome.
#[derive(Debug)]
pub struct Challenge {
    value: String,
    kind: CeremonyKind,
    user_id: Option<String>,
    issued_at: Instant,
    ttl: Option<Duration>,
}

impl Challenge {
    #[must_use]
    pub const fn kind(&self) -> CeremonyKind {
        self.kind
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.issued_at.elapsed() > ttl)
    }
}

pub enum CeremonyOutcome {
    Authenticated {
        token: SessionToken,
        permissions: Option<PermissionMap>,
    },
    /// Registration accepted; the user has to confirm the emailed link first.
    PendingVerification,
}

impl std::fmt::Debug for CeremonyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated { token, permissions } => f
                .debug_struct("Authenticated")
                .field("token", token)
                .field("permissions", permissions)
                .finish(),
            Self::PendingVerification => f.write_str("PendingVerification"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CeremonyClient {
    http: HttpClient,
    endpoints: Endpoints,
}

impl CeremonyClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            http: HttpClient::new(config)?,
            endpoints: config.endpoints.clone(),
        })
    }

    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Runs a full ceremony for `email`.
    ///
    /// # Errors
    /// - [`AuthError::EmptyIdentity`] for a blank email,
    /// - [`AuthError::CeremonyOptions`] / [`AuthError::DuplicateIdentity`] when the
    ///   ceremony cannot start,
    /// - [`AuthError::Authenticator`] when the local authenticator fails,
    /// - [`AuthError::Verification`] when the server rejects the response.
    #[instrument(skip(self, email, authenticator))]
    pub async fn authenticate<A>(
        &self,
        email: &str,
        mode: CeremonyMode,
        authenticator: &A,
    ) -> Result<CeremonyOutcome, AuthError>
    where
        A: Authenticator + ?Sized,
    {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::EmptyIdentity);
        }

        let (options, challenge) = self.request_options(email, mode).await?;

        let credential = match options.kind() {
            CeremonyKind::Register => authenticator.create_credential(&options).await?,
            CeremonyKind::Login => authenticator.get_assertion(&options).await?,
        };

        self.submit(email, challenge, &credential).await
    }

    /// Requests ceremony options for `email`.
    ///
    /// # Errors
    /// Returns [`AuthError::DuplicateIdentity`] on `409` and
    /// [`AuthError::CeremonyOptions`] on any other rejection or undecodable body.
    #[instrument(skip(self, email))]
    pub async fn request_options(
        &self,
        email: &str,
        mode: CeremonyMode,
    ) -> Result<(CeremonyOptions, Challenge), AuthError> {
        let path = match mode {
            CeremonyMode::Auto => &self.endpoints.options,
            CeremonyMode::Register => &self.endpoints.register_options,
            CeremonyMode::Login => &self.endpoints.login_options,
        };

        let response: OptionsResponse = self
            .http
            .post_json(path, &OptionsRequest { email }, None)
            .await
            .map_err(|err| match err {
                ApiError::Http { status: 409, .. } => AuthError::DuplicateIdentity,
                ApiError::Http { status, message } => {
                    AuthError::CeremonyOptions(format!("{status}: {message}"))
                }
                ApiError::Parse(message) => AuthError::CeremonyOptions(message),
                other => other.into(),
            })?;

        let (options, challenge) = CeremonyOptions::from_response(response, mode.expected_kind())?;

        debug!(kind = %options.kind(), "ceremony options received");

        Ok((options, challenge))
    }

    /// Submits the authenticator output. Consumes the challenge.
    ///
    /// # Errors
    /// Returns [`AuthError::ChallengeExpired`] when the challenge outlived its timeout,
    /// [`AuthError::DuplicateIdentity`] on a `409` registration, and
    /// [`AuthError::Verification`] on any other rejection.
    #[instrument(skip(self, email, challenge, credential), fields(kind = %challenge.kind()))]
    pub async fn submit(
        &self,
        email: &str,
        challenge: Challenge,
        credential: &Value,
    ) -> Result<CeremonyOutcome, AuthError> {
        if challenge.is_expired() {
            warn!("challenge expired before submission");
            return Err(AuthError::ChallengeExpired);
        }

        let result: Result<VerificationResponse, ApiError> = match challenge.kind {
            CeremonyKind::Register => {
                let user_id = challenge.user_id.as_deref().unwrap_or_default();
                let body = RegisterVerificationRequest {
                    email,
                    att_resp: credential,
                    challenge: &challenge.value,
                    user_id,
                };
                self.http.post_json(&self.endpoints.register, &body, None).await
            }
            CeremonyKind::Login => {
                let body = LoginVerificationRequest {
                    email,
                    auth_resp: credential,
                    challenge: &challenge.value,
                };
                self.http.post_json(&self.endpoints.login, &body, None).await
            }
        };

        let response = result.map_err(|err| match err {
            ApiError::Http { status: 409, .. } if challenge.kind == CeremonyKind::Register => {
                AuthError::DuplicateIdentity
            }
            ApiError::Http { status, message } => {
                AuthError::Verification(format!("{status}: {message}"))
            }
            ApiError::Parse(message) => AuthError::Verification(message),
            other => other.into(),
        })?;

        match response.token.filter(|t| !t.trim().is_empty()) {
            Some(raw) => {
                let token = SessionToken::parse(SecretString::from(raw))?;
                info!(kind = %challenge.kind, "ceremony verified, session issued");
                Ok(CeremonyOutcome::Authenticated {
                    token,
                    permissions: response.permissions,
                })
            }
            None => {
                info!(
                    kind = %challenge.kind,
                    message = response.message.as_deref().unwrap_or_default(),
                    "ceremony verified without a session, email confirmation pending"
                );
                Ok(CeremonyOutcome::PendingVerification)
            }
        }
    }

    /// Consumes an emailed verification token and returns the server message.
    ///
    /// # Errors
    /// Returns [`AuthError::EmailVerification`] when the server rejects the token.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<String, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmailVerification(
                "Not a valid token".to_string(),
            ));
        }

        let response: MessageResponse = self
            .http
            .post_json(&self.endpoints.verify_email, &VerifyEmailRequest { token }, None)
            .await
            .map_err(|err| match err {
                ApiError::Http { message, .. } => AuthError::EmailVerification(message),
                other => other.into(),
            })?;

        Ok(response.message.unwrap_or_else(|| "Success".to_string()))
    }

    /// Asks the server to drop the session behind `token`.
    ///
    /// # Errors
    /// Returns an error on transport failure or rejection; callers treat it as advisory.
    #[instrument(skip(self, token))]
    pub async fn invalidate(&self, token: &SecretString) -> Result<(), AuthError> {
        self.http
            .post_empty(&self.endpoints.logout, Some(token))
            .await
            .map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(value: Value) -> OptionsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn double_encoded_options_are_decoded() {
        let encoded = json!({
            "challenge": "abc",
            "user": {"id": "dXNlcg", "name": "a@x.com"},
            "timeout": 12000
        })
        .to_string();

        let (options, challenge) =
            CeremonyOptions::from_response(response(json!({"options": encoded, "flow": "REGISTER"})), None)
                .unwrap();

        assert_eq!(options.kind(), CeremonyKind::Register);
        assert_eq!(options.public_key()["user"]["id"], "dXNlcg");
        assert_eq!(challenge.value, "abc");
        assert_eq!(challenge.user_id.as_deref(), Some("dXNlcg"));
        assert_eq!(challenge.ttl, Some(Duration::from_millis(12000)));
        assert!(!challenge.is_expired());
    }

    #[test]
    fn public_key_wrapper_is_unwrapped() {
        let (options, challenge) = CeremonyOptions::from_response(
            response(json!({"options": {"publicKey": {"challenge": "xyz", "rpId": "localhost"}}})),
            None,
        )
        .unwrap();

        assert_eq!(options.kind(), CeremonyKind::Login);
        assert_eq!(options.public_key()["rpId"], "localhost");
        assert_eq!(challenge.value, "xyz");
        assert_eq!(challenge.ttl, None);
    }

    #[test]
    fn flow_mismatch_is_rejected() {
        let err = CeremonyOptions::from_response(
            response(json!({"flow": "LOGIN", "options": {"challenge": "c"}})),
            Some(CeremonyKind::Register),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::CeremonyOptions(_)));
    }

    #[test]
    fn missing_challenge_or_user_is_rejected() {
        assert_eq!(
            CeremonyOptions::from_response(response(json!({"options": {}})), None).unwrap_err(),
            AuthError::CeremonyOptions("missing challenge".to_string())
        );
        assert!(CeremonyOptions::from_response(
            response(json!({"flow": "REGISTER", "options": {"challenge": "c"}})),
            None
        )
        .is_err());
        assert!(CeremonyOptions::from_response(
            response(json!({"options": "not json"})),
            None
        )
        .is_err());
        assert!(
            CeremonyOptions::from_response(response(json!({"options": [1, 2]})), None).is_err()
        );
    }

    #[test]
    fn zero_timeout_challenge_expires() {
        let (_, challenge) = CeremonyOptions::from_response(
            response(json!({"options": {"challenge": "c", "timeout": 0}})),
            None,
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(challenge.is_expired());
    }

    #[tokio::test]
    async fn expired_challenge_is_not_submitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = CeremonyClient::new(&AuthConfig::new(&server.uri()).unwrap()).unwrap();
        let (_, challenge) = CeremonyOptions::from_response(
            response(json!({"options": {"challenge": "c", "timeout": 0}})),
            None,
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let err = client
            .submit("a@x.com", challenge, &json!({"id": "cred"}))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ChallengeExpired);
    }

    #[tokio::test]
    async fn verify_email_reports_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-email"))
            .and(body_json(json!({"token": "good"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Email verified"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-email"))
            .and(body_json(json!({"token": "stale"})))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Token expired"})),
            )
            .mount(&server)
            .await;

        let client = CeremonyClient::new(&AuthConfig::new(&server.uri()).unwrap()).unwrap();

        assert_eq!(client.verify_email(" good ").await.unwrap(), "Email verified");
        assert_eq!(
            client.verify_email("stale").await.unwrap_err(),
            AuthError::EmailVerification("Token expired".to_string())
        );
        assert_eq!(
            client.verify_email("  ").await.unwrap_err(),
            AuthError::EmailVerification("Not a valid token".to_string())
        );
    }
}
