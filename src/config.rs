use crate::artifact::ParserOptions;
use crate::patch::PatchOptions;
use crate::stream::SessionOptions;
use crate::util::parse_bool_str;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "CODESTREAM_LOG";
const LOG_PATH_ENV: &str = "CODESTREAM_LOG_PATH";
const FUZZY_PATCH_ENV: &str = "CODESTREAM_FUZZY_PATCH";
const HTML_FALLBACK_ENV: &str = "CODESTREAM_HTML_FALLBACK";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub log_filter: String,
    pub log_path: Option<PathBuf>,
    pub fuzzy_patch: bool,
    pub html_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_path: None,
            fuzzy_patch: true,
            html_fallback: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let log_filter =
            env_value(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let log_path = env_value(LOG_PATH_ENV).map(PathBuf::from);
        let fuzzy_patch = env_flag(FUZZY_PATCH_ENV, true)?;
        let html_fallback = env_flag(HTML_FALLBACK_ENV, true)?;

        Ok(Self {
            log_filter,
            log_path,
            fuzzy_patch,
            html_fallback,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            bail!("{LOG_FILTER_ENV} must not be empty");
        }
        EnvFilter::try_new(&self.log_filter)
            .with_context(|| format!("Invalid {LOG_FILTER_ENV} '{}'", self.log_filter))?;
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            parser: ParserOptions {
                html_fallback: self.html_fallback,
            },
            patch: PatchOptions {
                fuzzy: self.fuzzy_patch,
                ..PatchOptions::default()
            },
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env_value(name) {
        Some(raw) => parse_bool_str(&raw)
            .with_context(|| format!("Invalid {name} '{raw}': expected true/false")),
        None => Ok(default),
    }
}
