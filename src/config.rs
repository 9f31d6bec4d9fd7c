//! Configuration module for the conversion engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SCIPTRAIL_` and use double
//! underscores to separate nested levels:
//! - `SCIPTRAIL_SYMBOLS__LOCAL_PREFIX="local "` sets `symbols.local_prefix`
//! - `SCIPTRAIL_CALL_GRAPH__TOP_N=25` sets `call_graph.top_n`
//! - `SCIPTRAIL_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use crate::error::ConvertResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_DIR: &str = ".sciptrail";
const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode (per-symbol resolution logging)
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Symbol grammar settings
    #[serde(default)]
    pub symbols: SymbolConfig,

    /// Entity recording settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Call-graph classification settings
    #[serde(default)]
    pub call_graph: CallGraphConfig,

    /// Diagnostics report settings
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SymbolConfig {
    /// Prefix that marks call-site-local symbols
    #[serde(default = "default_local_prefix")]
    pub local_prefix: String,

    /// Case-insensitive substrings that mark a symbol as test-related
    #[serde(default = "default_test_markers")]
    pub test_markers: Vec<String>,

    /// Leading markers of private declarations (`_Foo`)
    #[serde(default = "default_private_prefixes")]
    pub private_prefixes: Vec<String>,

    /// Leading markers of generated declarations (`$Foo`, `_$Foo`)
    #[serde(default = "default_generated_prefixes")]
    pub generated_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionConfig {
    /// Display name of the synthetic scope that collects orphaned test symbols
    #[serde(default = "default_test_scope_name")]
    pub test_scope_name: String,

    /// Display name of the synthetic scope for members with no owner at all
    #[serde(default = "default_fallback_scope_name")]
    pub fallback_scope_name: String,

    /// Name given to anonymous parameters and variables
    #[serde(default = "default_anonymous_name")]
    pub anonymous_name: String,

    /// Attribute target-less references to the innermost enclosing definition
    #[serde(default = "default_true")]
    pub infer_enclosing_callers: bool,

    /// Record symbols declared outside the indexed project so edges into
    /// dependencies have a target
    #[serde(default = "default_true")]
    pub include_external_symbols: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CallGraphConfig {
    /// Method names that register a callback for deferred invocation
    #[serde(default = "default_callback_methods")]
    pub callback_methods: Vec<String>,

    /// Signature substrings that mark a callee as asynchronous
    #[serde(default = "default_async_markers")]
    pub async_markers: Vec<String>,

    /// How many entries the top-called / top-calling lists keep
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    /// Maximum number of unregistered symbols / failed relationships kept
    /// verbatim in the report (counters are never capped)
    #[serde(default = "default_max_reported_errors")]
    pub max_reported_errors: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_local_prefix() -> String {
    "local ".to_string()
}
fn default_test_markers() -> Vec<String> {
    vec!["test".to_string(), "mock".to_string(), "fake".to_string()]
}
fn default_private_prefixes() -> Vec<String> {
    vec!["_".to_string()]
}
fn default_generated_prefixes() -> Vec<String> {
    vec!["$".to_string()]
}
fn default_test_scope_name() -> String {
    "<test scope>".to_string()
}
fn default_fallback_scope_name() -> String {
    "<unresolved scope>".to_string()
}
fn default_anonymous_name() -> String {
    "<anonymous>".to_string()
}
fn default_callback_methods() -> Vec<String> {
    [
        "listen",
        "then",
        "catchError",
        "whenComplete",
        "onError",
        "addListener",
        "addPostFrameCallback",
        "subscribe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_async_markers() -> Vec<String> {
    vec!["async".to_string()]
}
fn default_top_n() -> usize {
    10
}
fn default_max_reported_errors() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            symbols: SymbolConfig::default(),
            conversion: ConversionConfig::default(),
            call_graph: CallGraphConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            local_prefix: default_local_prefix(),
            test_markers: default_test_markers(),
            private_prefixes: default_private_prefixes(),
            generated_prefixes: default_generated_prefixes(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            test_scope_name: default_test_scope_name(),
            fallback_scope_name: default_fallback_scope_name(),
            anonymous_name: default_anonymous_name(),
            infer_enclosing_callers: true,
            include_external_symbols: true,
        }
    }
}

impl Default for CallGraphConfig {
    fn default() -> Self {
        Self {
            callback_methods: default_callback_methods(),
            async_markers: default_async_markers(),
            top_n: default_top_n(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_reported_errors: default_max_reported_errors(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> ConvertResult<Self> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Ok(Self::figment(config_path).extract().map_err(Box::new)?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> ConvertResult<Self> {
        Ok(Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)?)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels, single
            // underscores stay part of the field name
            .merge(Env::prefixed("SCIPTRAIL_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.sciptrail/settings.toml` searching from the current directory up
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
