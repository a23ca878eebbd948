//! Authenticated API calls. Attaches the session token as a bearer header and
//! feeds every rejection status back into [`AuthProvider::check_error`], so a
//! `401`/`403` from any resource ends the session.

use crate::{
    api::{ApiError, HttpClient},
    auth::{
        authenticator::Authenticator,
        error::AuthError,
        provider::{AuthProvider, SessionManager},
        store::SessionStore,
    },
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::instrument;

pub struct AuthorizedClient<S, A> {
    http: HttpClient,
    session: Arc<SessionManager<S, A>>,
}

impl<S, A> AuthorizedClient<S, A>
where
    S: SessionStore,
    A: Authenticator,
{
    #[must_use]
    pub fn new(session: Arc<SessionManager<S, A>>) -> Self {
        Self {
            http: session.ceremony().http().clone(),
            session,
        }
    }

    /// # Errors
    /// Returns a session error when not logged in, [`AuthError::Unauthorized`] when
    /// the API rejected the token (the session is gone afterwards), or the mapped
    /// transport error otherwise.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        self.session.check_auth()?;
        let token = self.session.current_session().ok_or(AuthError::NoSession)?;

        match self.http.get_json(path, Some(token.secret())).await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.route(err).await),
        }
    }

    /// # Errors
    /// Same as [`AuthorizedClient::get_json`].
    #[instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.session.check_auth()?;
        let token = self.session.current_session().ok_or(AuthError::NoSession)?;

        match self.http.post_json(path, body, Some(token.secret())).await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.route(err).await),
        }
    }

    async fn route(&self, err: ApiError) -> AuthError {
        if let Some(status) = err.status() {
            if let Err(auth_err) = self.session.check_error(status).await {
                return auth_err;
            }
        }
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        authenticator::UnavailableAuthenticator, ceremony::CeremonyClient,
        permissions::PermissionMap, store::MemorySessionStore, token::tests::jwt,
        token::SessionToken,
    };
    use crate::config::AuthConfig;
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 1_700_000_000;

    async fn logged_in(server: &MockServer) -> Arc<SessionManager<MemorySessionStore, UnavailableAuthenticator>> {
        let config = AuthConfig::new(&server.uri()).unwrap();
        let manager = SessionManager::new(
            CeremonyClient::new(&config).unwrap(),
            MemorySessionStore::new(),
            UnavailableAuthenticator,
        )
        .with_clock(|| NOW);

        let token = SessionToken::parse(SecretString::from(jwt(&json!({"exp": NOW + 60})))).unwrap();
        let mut permissions = PermissionMap::new();
        permissions.grant("assets", "list");
        manager.store().save(&token, &permissions).unwrap();

        Arc::new(manager)
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;
        let bearer = format!(
            "Bearer {}",
            jwt(&json!({"exp": NOW + 60}))
        );

        Mock::given(method("GET"))
            .and(path("/assets"))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthorizedClient::new(session.clone());
        let assets: Value = client.get_json("/assets").await.unwrap();
        assert_eq!(assets[0]["id"], 1);
        assert_eq!(session.check_auth(), Ok(()));
    }

    #[tokio::test]
    async fn forbidden_response_logs_out() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthorizedClient::new(session.clone());
        let err = client
            .post_json::<_, Value>("/assets", &json!({"name": "a"}))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::Unauthorized(403));
        assert_eq!(session.check_auth(), Err(AuthError::NoSession));
        assert!(session.store().current_permissions().is_empty());
    }

    #[tokio::test]
    async fn other_failures_keep_the_session() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = AuthorizedClient::new(session.clone());
        let err = client.get_json::<Value>("/assets").await.unwrap_err();

        assert_eq!(
            err,
            AuthError::Rejected {
                status: 500,
                message: "boom".to_string()
            }
        );
        assert_eq!(session.check_auth(), Ok(()));
    }

    #[tokio::test]
    async fn calls_without_session_never_reach_the_server() {
        let server = MockServer::start().await;
        let config = AuthConfig::new(&server.uri()).unwrap();
        let session = Arc::new(SessionManager::new(
            CeremonyClient::new(&config).unwrap(),
            MemorySessionStore::new(),
            UnavailableAuthenticator,
        ));

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = AuthorizedClient::new(session);
        assert_eq!(
            client.get_json::<Value>("/assets").await.unwrap_err(),
            AuthError::NoSession
        );
    }
}
