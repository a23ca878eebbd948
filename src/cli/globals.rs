use crate::{
    auth::FileSessionStore,
    cli::commands::client,
    config::{AuthConfig, ConfigError},
};
use std::{path::PathBuf, time::Duration};

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(options: client::Options) -> Self {
        Self {
            api_url: options.api_url,
            session_file: options.session_file,
            timeout: Duration::from_secs(options.timeout),
        }
    }

    /// # Errors
    /// Returns an error for an invalid API URL or a zero timeout.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        AuthConfig::new(&self.api_url)?.with_timeout(self.timeout)
    }

    #[must_use]
    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(self.session_file.clone())
    }
}
