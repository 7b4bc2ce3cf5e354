//! # Loader Settings
//!
//! Environment-aware settings for factory discovery. Settings come from
//! `FORGE_`-prefixed environment variables with explicit defaults; there is
//! deliberately no settings file, the surface is two fields.
//!
//! - `FORGE_RESOURCE_ROOTS` — colon-separated list of directories searched
//!   for factory resource files (default: the working directory).
//! - `FORGE_ENVIRONMENT` — deployment environment, used to pick logging
//!   defaults (default: `development`).

use crate::error::{ForgeError, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Settings controlling resource discovery and ambient defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderSettings {
    /// Directories searched for factory resource files, in order.
    pub resource_roots: Vec<PathBuf>,
    /// Deployment environment name.
    pub environment: String,
}

impl LoaderSettings {
    /// Load settings from the environment, falling back to defaults for
    /// anything unset.
    pub fn load() -> Result<LoaderSettings> {
        Config::builder()
            .set_default("resource_roots", vec!["."])
            .map_err(settings_error)?
            .set_default("environment", DEFAULT_ENVIRONMENT)
            .map_err(settings_error)?
            .add_source(
                Environment::with_prefix("FORGE")
                    .try_parsing(true)
                    .list_separator(":")
                    .with_list_parse_key("resource_roots"),
            )
            .build()
            .map_err(settings_error)?
            .try_deserialize()
            .map_err(settings_error)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            resource_roots: vec![PathBuf::from(".")],
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

fn settings_error(error: config::ConfigError) -> ForgeError {
    ForgeError::configuration("settings", error.to_string())
}
