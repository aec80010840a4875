//! Provider configuration
//!
//! Each setting is resolved independently: command-line flag first, then
//! the environment, then the optional TOML file at
//! `~/.config/connect-reconciler/config.toml`.

use anyhow::{Context, Result, bail};
use connectkit::{EnvToken, StaticToken, TokenSource};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const API_TOKEN_ENV: &str = "COFIDE_API_TOKEN";
pub const CONNECT_URL_ENV: &str = "COFIDE_CONNECT_URL";
pub const INSECURE_SKIP_VERIFY_ENV: &str = "COFIDE_INSECURE_SKIP_VERIFY";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("connect-reconciler"))
}

// ============================================================================
// Config File
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub connect_url: Option<String>,
    #[serde(default)]
    pub insecure_skip_verify: Option<bool>,
}

impl FileConfig {
    /// Load the config file
    ///
    /// An explicit `path` must exist. The default location is optional and
    /// yields an empty config when missing.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (PathBuf::from(shellexpand::tilde(path).as_ref()), true),
            None => (config_dir()?.join("config.toml"), false),
        };

        if !required && !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Settings supplied on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_token: Option<String>,
    pub connect_url: Option<String>,
    pub insecure_skip_verify: Option<bool>,
}

/// Where the API token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Flag,
    Environment,
    File,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub api_token: String,
    pub connect_url: String,
    pub insecure_skip_verify: bool,
    pub token_origin: TokenOrigin,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"***")
            .field("connect_url", &self.connect_url)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("token_origin", &self.token_origin)
            .finish()
    }
}

/// Parse a boolean the way environment variables are usually written
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Some(true),
        "0" | "f" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ProviderConfig {
    /// Resolve every setting from flags, the process environment and the
    /// config file
    pub fn load(overrides: &Overrides, config_file: Option<&str>) -> Result<Self> {
        let file = FileConfig::load(config_file)?;
        Self::resolve(overrides, &file, |name| std::env::var(name).ok())
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve<E>(overrides: &Overrides, file: &FileConfig, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let (api_token, token_origin) = if let Some(token) = non_empty(overrides.api_token.clone()) {
            (token, TokenOrigin::Flag)
        } else if let Some(token) = non_empty(env(API_TOKEN_ENV)) {
            (token, TokenOrigin::Environment)
        } else if let Some(token) = non_empty(file.api_token.clone()) {
            (token, TokenOrigin::File)
        } else {
            bail!(
                "Missing API Token Configuration: API token must be specified either in provider \
                 configuration or via {API_TOKEN_ENV} environment variable"
            );
        };

        let Some(connect_url) = non_empty(overrides.connect_url.clone())
            .or_else(|| non_empty(env(CONNECT_URL_ENV)))
            .or_else(|| non_empty(file.connect_url.clone()))
        else {
            bail!(
                "Missing Connect URL Configuration: Connect URL must be specified either in \
                 provider configuration or via {CONNECT_URL_ENV} environment variable"
            );
        };

        let insecure_skip_verify = overrides
            .insecure_skip_verify
            .or_else(|| {
                let raw = env(INSECURE_SKIP_VERIFY_ENV)?;
                let parsed = parse_bool(&raw);
                if parsed.is_none() {
                    log::warn!("Ignoring unparseable {INSECURE_SKIP_VERIFY_ENV}={raw:?}");
                }
                parsed
            })
            .or(file.insecure_skip_verify)
            .unwrap_or(false);

        Ok(Self {
            api_token,
            connect_url,
            insecure_skip_verify,
            token_origin,
        })
    }

    /// Token source for the transport
    ///
    /// A token taken from the environment is looked up again on every call.
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        match self.token_origin {
            TokenOrigin::Environment => {
                Arc::new(EnvToken::new(API_TOKEN_ENV).with_fallback(self.api_token.clone()))
            }
            TokenOrigin::Flag | TokenOrigin::File => Arc::new(StaticToken::new(self.api_token.clone())),
        }
    }
}
