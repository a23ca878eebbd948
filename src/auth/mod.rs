//! Auth module covering `WebAuthn` ceremonies, session persistence, and the access
//! decision used by the portal. It touches security boundaries and must never log
//! tokens, challenges, or authenticator output.
//!
//! Flow Overview: `login` requests ceremony options, lets the authenticator sign
//! the challenge, and submits the result. A returned token is stored together with
//! its permission map; no token means the registration waits for email
//! confirmation. `logout` and any `401`/`403` clear both token and permissions.

pub mod authenticator;
pub mod ceremony;
pub mod error;
pub mod permissions;
pub mod provider;
pub mod store;
pub mod token;
pub mod transport;
pub mod types;

pub use authenticator::{Authenticator, CommandAuthenticator, UnavailableAuthenticator};
pub use ceremony::{CeremonyClient, CeremonyMode, CeremonyOptions, CeremonyOutcome, Challenge};
pub use error::AuthError;
pub use permissions::{has_access, PermissionMap, RolePolicy, RoleRule, DEFAULT_RESOURCE};
pub use provider::{AuthProvider, AuthState, LoginOutcome, LoginRequest, SessionManager};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use token::{SessionToken, TokenClaims};
pub use transport::AuthorizedClient;
pub use types::CeremonyKind;
