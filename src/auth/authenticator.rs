//! Local authenticator seam. The ceremony client hands the server's `publicKey`
//! parameters to an [`Authenticator`] and posts back whatever credential JSON it
//! produces, in the `webauthn` JSON shape (`id`, `rawId`, `type`, `response`).

use crate::auth::{ceremony::CeremonyOptions, error::AuthError, types::CeremonyKind};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, instrument};

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Produces an attestation for a registration ceremony.
    async fn create_credential(&self, options: &CeremonyOptions) -> Result<Value, AuthError>;

    /// Produces an assertion for a login ceremony.
    async fn get_assertion(&self, options: &CeremonyOptions) -> Result<Value, AuthError>;
}

/// Runs an external helper per ceremony: `<program> [args..] register|login`, with the
/// `publicKey` parameters as JSON on stdin and the credential JSON expected on stdout.
#[derive(Debug, Clone)]
pub struct CommandAuthenticator {
    program: String,
    args: Vec<String>,
}

impl CommandAuthenticator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace, e.g. `"fido-helper --device usb"`.
    /// Quotes are not interpreted, so a program or argument containing spaces
    /// needs [`CommandAuthenticator::new`] or a wrapper script.
    ///
    /// # Errors
    /// Returns an error when the command line is empty.
    pub fn from_command_line(command: &str) -> Result<Self, AuthError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| AuthError::Authenticator("authenticator command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    #[instrument(skip(self, options), fields(program = %self.program))]
    async fn run(&self, kind: CeremonyKind, options: &CeremonyOptions) -> Result<Value, AuthError> {
        let input = serde_json::to_vec(options.public_key())
            .map_err(|e| AuthError::Authenticator(format!("failed to encode options: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(match kind {
                CeremonyKind::Register => "register",
                CeremonyKind::Login => "login",
            })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuthError::Authenticator(format!("failed to start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&input).await {
                Ok(()) => {}
                // helper exited without reading; its exit status tells why
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("authenticator closed stdin early");
                }
                Err(e) => {
                    return Err(AuthError::Authenticator(format!(
                        "failed to send options: {e}"
                    )))
                }
            }
            // closing stdin signals end of input
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AuthError::Authenticator(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.trim();
            return Err(AuthError::Authenticator(if reason.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                reason.chars().take(200).collect()
            }));
        }

        debug!("authenticator produced {} bytes", output.stdout.len());

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AuthError::Authenticator(format!("invalid credential JSON: {e}")))
    }
}

#[async_trait]
impl Authenticator for CommandAuthenticator {
    async fn create_credential(&self, options: &CeremonyOptions) -> Result<Value, AuthError> {
        self.run(CeremonyKind::Register, options).await
    }

    async fn get_assertion(&self, options: &CeremonyOptions) -> Result<Value, AuthError> {
        self.run(CeremonyKind::Login, options).await
    }
}

/// Stand-in for sessions that never run a ceremony, e.g. status checks or logout.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAuthenticator;

#[async_trait]
impl Authenticator for UnavailableAuthenticator {
    async fn create_credential(&self, _options: &CeremonyOptions) -> Result<Value, AuthError> {
        Err(AuthError::Authenticator(
            "no authenticator configured".to_string(),
        ))
    }

    async fn get_assertion(&self, _options: &CeremonyOptions) -> Result<Value, AuthError> {
        Err(AuthError::Authenticator(
            "no authenticator configured".to_string(),
        ))
    }
}
