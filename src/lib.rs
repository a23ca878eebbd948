//! # paios-auth (admin portal session client)
//!
//! `paios-auth` owns the client side of the pAI-OS admin portal authentication:
//! passwordless `WebAuthn` ceremonies against the portal API, session token
//! persistence, and the permission checks the portal uses to hide controls.
//!
//! ## Authentication (`WebAuthn`)
//!
//! 1. **Options:** The client posts the email to the options endpoint. The server
//!    answers with the ceremony kind (`REGISTER` or `LOGIN`) and the `publicKey`
//!    parameters, sometimes as a JSON string that has to be decoded twice.
//! 2. **Authenticator:** The local authenticator signs the challenge and returns an
//!    attestation (register) or assertion (login).
//! 3. **Verification:** The response is posted back with the challenge. A login returns
//!    a signed session token and a permission map; a registration may return no token
//!    until the user confirms the emailed link.
//!
//! ## Sessions & Authorization
//!
//! The session token and the permission map are always stored and cleared together.
//! Any `401`/`403` observed on an authenticated call demotes the session to anonymous.
//! Permission lookups fall back to the `DEFAULT` resource and deny when nothing matches.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
