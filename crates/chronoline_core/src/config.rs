//! Application configuration resolved once at startup.
//!
//! # Responsibility
//! - Collect database credentials, AI key, tenant id and sandbox mode from
//!   every supported source into one explicit struct.
//!
//! # Invariants
//! - Precedence is: explicit overrides > sandbox-injected config >
//!   environment variables > defaults.
//! - Sandbox mode is on exactly when a sandbox config blob is present.
//! - Malformed JSON in any source is an error, never silently ignored.

use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_SANDBOX_CONFIG: &str = "CHRONOLINE_SANDBOX_CONFIG";
pub const ENV_DB_CONFIG: &str = "CHRONOLINE_DB_CONFIG";
pub const ENV_AI_API_KEY: &str = "CHRONOLINE_AI_API_KEY";
pub const ENV_TENANT_ID: &str = "CHRONOLINE_TENANT_ID";
pub const DEFAULT_TENANT_ID: &str = "default-app-id";

/// Document database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCredentials {
    pub api_key: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
}

/// Configuration blob injected by a hosting sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    pub database: Option<DatabaseCredentials>,
    pub ai_api_key: Option<String>,
    pub tenant_id: Option<String>,
}

/// Raw configuration sources, before precedence is applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Values set programmatically by the embedding app.
    pub overrides: ConfigOverrides,
    /// JSON injected by a sandbox host.
    pub sandbox_json: Option<String>,
    /// JSON credentials from the environment.
    pub env_database_json: Option<String>,
    pub env_ai_api_key: Option<String>,
    pub env_tenant_id: Option<String>,
}

impl ConfigSources {
    /// Reads sources through `lookup`, typically an environment reader.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            overrides: ConfigOverrides::default(),
            sandbox_json: read(ENV_SANDBOX_CONFIG),
            env_database_json: read(ENV_DB_CONFIG),
            env_ai_api_key: read(ENV_AI_API_KEY),
            env_tenant_id: read(ENV_TENANT_ID),
        }
    }
}

/// Explicit values that win over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub database_credentials: Option<DatabaseCredentials>,
    pub ai_api_key: Option<String>,
    pub tenant_id: Option<String>,
}

/// Configuration resolution errors.
#[derive(Debug)]
pub enum ConfigError {
    InvalidJson {
        source_name: &'static str,
        error: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson { source_name, error } => {
                write!(f, "invalid JSON in {source_name}: {error}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson { error, .. } => Some(error),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_credentials: Option<DatabaseCredentials>,
    pub ai_api_key: Option<String>,
    pub tenant_id: String,
    pub is_sandbox_mode: bool,
}

impl AppConfig {
    /// Applies source precedence and returns the single resolved config.
    pub fn resolve(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let sandbox = match &sources.sandbox_json {
            Some(raw) => Some(
                serde_json::from_str::<SandboxConfig>(raw).map_err(|error| {
                    ConfigError::InvalidJson {
                        source_name: ENV_SANDBOX_CONFIG,
                        error,
                    }
                })?,
            ),
            None => None,
        };
        let env_database = match &sources.env_database_json {
            Some(raw) => Some(
                serde_json::from_str::<DatabaseCredentials>(raw).map_err(|error| {
                    ConfigError::InvalidJson {
                        source_name: ENV_DB_CONFIG,
                        error,
                    }
                })?,
            ),
            None => None,
        };

        let overrides = &sources.overrides;
        let sandbox_ref = sandbox.as_ref();

        let database_credentials = overrides
            .database_credentials
            .clone()
            .or_else(|| sandbox_ref.and_then(|config| config.database.clone()))
            .or(env_database);
        let ai_api_key = non_blank(overrides.ai_api_key.clone())
            .or_else(|| non_blank(sandbox_ref.and_then(|config| config.ai_api_key.clone())))
            .or_else(|| non_blank(sources.env_ai_api_key.clone()));
        let tenant_id = non_blank(overrides.tenant_id.clone())
            .or_else(|| non_blank(sandbox_ref.and_then(|config| config.tenant_id.clone())))
            .or_else(|| non_blank(sources.env_tenant_id.clone()))
            .unwrap_or_else(|| DEFAULT_TENANT_ID.to_string());

        let config = Self {
            database_credentials,
            ai_api_key,
            tenant_id,
            is_sandbox_mode: sandbox.is_some(),
        };
        info!(
            "event=config_resolved module=config status=ok sandbox={} tenant={} has_database={} has_ai_key={}",
            config.is_sandbox_mode,
            config.tenant_id,
            config.database_credentials.is_some(),
            config.ai_api_key.is_some()
        );
        Ok(config)
    }

    /// Resolves from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(&ConfigSources::from_lookup(|key| std::env::var(key).ok()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
