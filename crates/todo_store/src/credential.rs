//! Credential acquisition for the persistent document store.
//!
//! # Responsibility
//! - Supply an access token to `StoreGateway::configure`.
//! - Report every acquisition failure as `CredentialError::Unavailable` so
//!   startup can tell "no credential" apart from "store down".
//!
//! # Invariants
//! - Token values never appear in `Debug` output or log lines.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use tokio::process::Command;

/// Scope requested when connecting to the document store.
pub const STORE_SCOPE: &str = "todo-store/.default";
/// Variable read by `EnvironmentCredential::default()`.
pub const DEFAULT_TOKEN_VARIABLE: &str = "TODO_STORE_TOKEN";

const ENVIRONMENT_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Bearer token plus its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Returns whether the token is non-empty and not yet expired.
    pub fn is_usable(&self) -> bool {
        !self.token.trim().is_empty() && self.expires_on > Utc::now()
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("{0}")]
    Unavailable(String),
}

/// Source of access tokens for the store.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError>;
}

/// Fixed, caller-supplied token.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: AccessToken,
}

impl StaticCredential {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// Token valid for one hour from now.
    pub fn short_lived(token: impl Into<String>) -> Self {
        Self::new(AccessToken::new(
            token,
            Utc::now() + Duration::minutes(ENVIRONMENT_TOKEN_LIFETIME_MINUTES),
        ))
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvironmentCredential {
    variable: String,
}

impl EnvironmentCredential {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvironmentCredential {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VARIABLE)
    }
}

#[async_trait]
impl CredentialProvider for EnvironmentCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        match std::env::var(&self.variable) {
            Ok(token) if !token.trim().is_empty() => Ok(AccessToken::new(
                token.trim(),
                Utc::now() + Duration::minutes(ENVIRONMENT_TOKEN_LIFETIME_MINUTES),
            )),
            _ => Err(CredentialError::Unavailable(format!(
                "environment variable `{}` is not set",
                self.variable
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    token: String,
    expires_on: DateTime<Utc>,
}

/// Asks a developer CLI for a token:
/// `<program> [prefix args…] get-access-token --output json --scope <scope>…`.
#[derive(Debug, Clone)]
pub struct DeveloperCliCredential {
    program: String,
    prefix_args: Vec<String>,
}

impl DeveloperCliCredential {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Arguments inserted before `get-access-token`, for wrapper launchers.
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn unavailable(&self, detail: impl std::fmt::Display) -> CredentialError {
        CredentialError::Unavailable(format!(
            "failed to call {} get-access-token: {detail}",
            self.program
        ))
    }
}

impl Default for DeveloperCliCredential {
    fn default() -> Self {
        Self::new("azd")
    }
}

#[async_trait]
impl CredentialProvider for DeveloperCliCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .args(["get-access-token", "--output", "json"])
            .current_dir(safe_working_dir()?);
        for scope in scopes {
            command.args(["--scope", *scope]);
        }

        let output = command
            .output()
            .await
            .map_err(|err| self.unavailable(err))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(stderr.trim()));
        }

        let response: CliTokenResponse =
            serde_json::from_slice(&output.stdout).map_err(|err| self.unavailable(err))?;
        Ok(AccessToken::new(response.token, response.expires_on))
    }
}

/// Tries each provider in order; the first token wins.
#[derive(Default)]
pub struct ChainedCredential {
    sources: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl CredentialProvider + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Environment variable first, then the developer CLI.
    pub fn developer_default() -> Self {
        Self::new()
            .with(EnvironmentCredential::default())
            .with(DeveloperCliCredential::default())
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.get_token(scopes).await {
                Ok(token) => return Ok(token),
                Err(CredentialError::Unavailable(reason)) => failures.push(reason),
            }
        }
        if failures.is_empty() {
            failures.push("no credential sources configured".to_string());
        }
        Err(CredentialError::Unavailable(failures.join("; ")))
    }
}

fn safe_working_dir() -> Result<PathBuf, CredentialError> {
    if cfg!(windows) {
        std::env::var_os("SystemRoot")
            .map(PathBuf::from)
            .ok_or_else(|| {
                CredentialError::Unavailable(
                    "developer CLI credential expects a `SystemRoot` environment variable"
                        .to_string(),
                )
            })
    } else {
        Ok(PathBuf::from("/bin"))
    }
}
