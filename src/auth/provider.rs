//! Auth provider facing the portal shell.
//!
//! [`SessionManager`] ties the ceremony client to a [`SessionStore`] and decides the
//! session state: anonymous, authenticated, or waiting for email confirmation. Any
//! authorization failure reported by an API call demotes the session to anonymous.

use crate::auth::{
    authenticator::Authenticator,
    ceremony::{CeremonyClient, CeremonyMode, CeremonyOutcome},
    error::AuthError,
    permissions::{PermissionMap, RolePolicy},
    store::SessionStore,
    token::SessionToken,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
    /// Registered, but the emailed confirmation link has not been used yet.
    PendingVerification,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub mode: CeremonyMode,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            mode: CeremonyMode::Auto,
        }
    }

    pub fn register(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            mode: CeremonyMode::Register,
        }
    }

    pub fn login(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            mode: CeremonyMode::Login,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    /// The UI should stay on the login screen and ask the user to check their inbox.
    PendingVerification { email: String },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Runs a ceremony and stores the issued session.
    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError>;

    /// Best-effort server invalidation followed by an unconditional local clear.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Route guard: succeeds only for a stored, unexpired token.
    fn check_auth(&self) -> Result<(), AuthError>;

    /// Reacts to the status of an API call; `401`/`403` log the user out and reject.
    async fn check_error(&self, status: u16) -> Result<(), AuthError>;

    fn get_permissions(&self) -> Result<PermissionMap, AuthError>;
}

pub type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

pub struct SessionManager<S, A> {
    ceremony: CeremonyClient,
    store: S,
    authenticator: A,
    policy: RolePolicy,
    pending: Mutex<Option<String>>,
    clock: Clock,
}

impl<S, A> SessionManager<S, A>
where
    S: SessionStore,
    A: Authenticator,
{
    pub fn new(ceremony: CeremonyClient, store: S, authenticator: A) -> Self {
        Self {
            ceremony,
            store,
            authenticator,
            policy: RolePolicy::default(),
            pending: Mutex::new(None),
            clock: Box::new(|| Utc::now().timestamp()),
        }
    }

    /// Replaces the role policy used when a login response carries no permissions.
    #[must_use]
    pub fn with_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the unix-seconds clock used for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn ceremony(&self) -> &CeremonyClient {
        &self.ceremony
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        if self.current_session().is_some() {
            AuthState::Authenticated
        } else if self.pending.lock().is_some() {
            AuthState::PendingVerification
        } else {
            AuthState::Anonymous
        }
    }

    /// Email still waiting for confirmation, if any.
    #[must_use]
    pub fn pending_email(&self) -> Option<String> {
        self.pending.lock().clone()
    }

    /// The stored token, if it has not expired.
    #[must_use]
    pub fn current_session(&self) -> Option<SessionToken> {
        self.store
            .current_token()
            .filter(|token| token.is_valid_at(self.now()))
    }

    /// Consumes an emailed verification token. The user still has to log in after.
    ///
    /// # Errors
    /// Returns [`AuthError::EmailVerification`] when the server rejects the token.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<String, AuthError> {
        let message = self.ceremony.verify_email(token).await?;
        *self.pending.lock() = None;
        info!("email verified");
        Ok(message)
    }

    fn clear_local(&self) -> Result<(), AuthError> {
        *self.pending.lock() = None;
        self.store.clear()
    }
}

#[async_trait]
impl<S, A> AuthProvider for SessionManager<S, A>
where
    S: SessionStore,
    A: Authenticator,
{
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let outcome = self
            .ceremony
            .authenticate(&request.email, request.mode, &self.authenticator)
            .await?;

        match outcome {
            CeremonyOutcome::Authenticated { token, permissions } => {
                if !token.is_valid_at(self.now()) {
                    warn!("server issued an already expired session token");
                    return Err(AuthError::ExpiredSession);
                }

                let permissions =
                    permissions.unwrap_or_else(|| self.policy.permissions_for(token.roles()));
                self.store.save(&token, &permissions)?;
                *self.pending.lock() = None;

                info!("login succeeded");

                Ok(LoginOutcome::Authenticated)
            }
            CeremonyOutcome::PendingVerification => {
                let email = request.email.trim().to_string();
                *self.pending.lock() = Some(email.clone());

                info!("registration submitted, waiting for email confirmation");

                Ok(LoginOutcome::PendingVerification { email })
            }
        }
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), AuthError> {
        if let Some(token) = self.store.current_token() {
            if let Err(e) = self.ceremony.invalidate(token.secret()).await {
                warn!("Server-side logout failed, clearing local session anyway: {}", e);
            }
        }

        self.clear_local()?;

        info!("logged out");

        Ok(())
    }

    fn check_auth(&self) -> Result<(), AuthError> {
        let token = self.store.current_token().ok_or(AuthError::NoSession)?;

        if token.is_valid_at(self.now()) {
            return Ok(());
        }

        debug!("stored session expired");
        if let Err(e) = self.clear_local() {
            warn!("Failed to clear expired session: {}", e);
        }

        Err(AuthError::ExpiredSession)
    }

    #[instrument(skip(self))]
    async fn check_error(&self, status: u16) -> Result<(), AuthError> {
        if status != 401 && status != 403 {
            return Ok(());
        }

        warn!("authorization failure reported, ending session");

        if let Err(e) = self.logout().await {
            warn!("Failed to clear session after {}: {}", status, e);
        }

        Err(AuthError::Unauthorized(status))
    }

    fn get_permissions(&self) -> Result<PermissionMap, AuthError> {
        self.check_auth()?;
        Ok(self.store.current_permissions())
    }
}
