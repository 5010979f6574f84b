use anyhow::{Context, Result};
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};


/// Environment variable holding base64-encoded credentials
pub const CREDENTIALS_ENV: &str = "GLCI_CREDENTIALS";

/// Tool settings, read from `glci/config.toml` in the user config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default flavors document
    #[serde(default = "default_flavors_file")]
    pub flavors_file: PathBuf,

    /// Default publishing document
    #[serde(default = "default_publishing_file")]
    pub publishing_file: PathBuf,

    /// Default aliases document
    pub aliases_file: Option<PathBuf>,

    /// Default credentials document
    pub credentials_file: Option<PathBuf>,
}

fn default_flavors_file() -> PathBuf {
    PathBuf::from("flavors.yaml")
}

fn default_publishing_file() -> PathBuf {
    PathBuf::from("publishing.yaml")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flavors_file: default_flavors_file(),
            publishing_file: default_publishing_file(),
            aliases_file: None,
            credentials_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("glci").join("config.toml");
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }
        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Flavors to operate on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlavorsConfig {
    #[serde(default)]
    pub flavors: Vec<FlavorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorConfig {
    /// Canonical flavor name, e.g. `aws-gardener_prod-amd64`
    pub cname: String,
    pub platform: String,
}

/// Where artifacts come from and where they get published
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Id of the source manifests are read from
    pub manifest_source: String,
    /// Id of the source updated manifests are written to; defaults to `manifest_source`
    pub manifest_target: Option<String>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    pub ocm: OcmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcmConfig {
    #[serde(rename = "type")]
    pub ocm_type: String,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

/// Package name to alias names, used for scanning hints
pub type AliasesConfig = HashMap<String, Vec<String>>;

/// Credentials shared by all providers, keyed by credential name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(pub HashMap<String, serde_yaml::Value>);

impl Credentials {
    /// Decode base64-encoded YAML credentials
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .context("Credentials are not valid base64")?;
        serde_yaml::from_slice(&decoded).context("Failed to parse credentials")
    }
}

/// Read and parse a YAML document
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load credentials from a file, falling back to the environment
pub fn load_credentials(path: Option<&Path>) -> Result<Credentials> {
    if let Some(path) = path {
        return load_yaml(path);
    }
    match std::env::var(CREDENTIALS_ENV) {
        Ok(encoded) if !encoded.trim().is_empty() => Credentials::from_base64(&encoded)
            .with_context(|| format!("Invalid credentials in {}", CREDENTIALS_ENV)),
        _ => Ok(Credentials::default()),
    }
}
