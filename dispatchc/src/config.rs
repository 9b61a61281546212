//! Resolver configuration.
//!
//! Configuration is read from a TOML file; every section and field has a
//! default, so an empty file (or no file) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or writing a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for dispatch resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tree construction options.
    pub resolve: ResolveConfig,

    /// Host language model.
    pub host: HostConfig,

    /// Dispatcher source rendering.
    pub emit: EmitConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Render this configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Test selection heuristic used by the tree builder.
///
/// The heuristic only affects the shape of a tree, never which leaf a tuple
/// of runtime types reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    /// Lowest undecided position first, most specific type first.
    #[default]
    DeclarationOrder,
    /// The test whose larger branch keeps the fewest candidates.
    Balanced,
}

/// Tree construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Test selection heuristic.
    pub heuristic: Heuristic,

    /// Worker threads for resolving independent dispatch points; 0 uses the
    /// available parallelism.
    pub jobs: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::DeclarationOrder,
            jobs: 0,
        }
    }
}

impl ResolveConfig {
    /// The number of worker threads to use, never zero.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// A method every reference type inherits from the root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootMethod {
    /// Method name.
    pub name: String,
    /// Erased parameter type names.
    #[serde(default)]
    pub params: Vec<String>,
    /// Erased return type name (`void` for none).
    #[serde(default = "void_name")]
    pub returns: String,
}

fn void_name() -> String {
    "void".to_string()
}

impl RootMethod {
    fn new(name: &str, params: &[&str], returns: &str) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            returns: returns.to_string(),
        }
    }
}

/// Host language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name of the root reference type; it erases to the top type.
    pub root_type: String,

    /// Start from the built-in `java.lang`/`java.util` types.
    pub prelude: bool,

    /// Methods inherited by every reference type.
    pub root_methods: Vec<RootMethod>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root_type: "Object".to_string(),
            prelude: true,
            root_methods: vec![
                RootMethod::new("equals", &["Object"], "boolean"),
                RootMethod::new("hashCode", &[], "int"),
                RootMethod::new("toString", &[], "String"),
                RootMethod::new("getClass", &[], "Class"),
                RootMethod::new("notify", &[], "void"),
                RootMethod::new("notifyAll", &[], "void"),
                RootMethod::new("wait", &[], "void"),
                RootMethod::new("wait", &["long"], "void"),
                RootMethod::new("wait", &["long", "int"], "void"),
                RootMethod::new("clone", &[], "Object"),
                RootMethod::new("finalize", &[], "void"),
            ],
        }
    }
}

/// Dispatcher source rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// One level of indentation.
    pub indent: String,

    /// Exception raised when no definition applies.
    pub missing_definition: String,

    /// Exception raised when applicable definitions are ambiguous.
    pub ambiguity: String,

    /// Suffix appended to a module name to form the generated class name.
    pub class_suffix: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            missing_definition: "MissingDefinitionException".to_string(),
            ambiguity: "AmbiguityException".to_string(),
            class_suffix: "Dispatch".to_string(),
        }
    }
}
