//! Release manifests produced by the Garden Linux build system
//!
//! A manifest describes one built flavor: its identity, the files the build
//! produced and, once published, the provider-specific image metadata.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::storage::{MANIFEST_PREFIX, SHORT_COMMIT_LEN};

/// Release manifest for a single flavor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub build_committish: String,
    pub architecture: Architecture,
    pub platform: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub build_timestamp: String,
    #[serde(default)]
    pub paths: Vec<ReleaseFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_uefi: Option<bool>,
    #[serde(rename = "secureboot", skip_serializing_if = "Option::is_none")]
    pub secure_boot: Option<bool>,
    /// Provider output of the last successful publish, `None` when unpublished
    #[serde(default)]
    pub published_image_metadata: Option<serde_yaml::Value>,
    pub s3_bucket: String,
}

/// CPU architecture of a flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file in object storage which is part of a release flavor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFile {
    pub name: String,
    pub suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256sum: Option<String>,
    pub s3_key: String,
    pub s3_bucket_name: String,
}

impl Manifest {
    /// Resolve the first release file with the given suffix
    pub fn path_by_suffix(&self, suffix: &str) -> Result<&ReleaseFile> {
        self.paths
            .iter()
            .find(|path| path.suffix == suffix)
            .ok_or_else(|| {
                anyhow::anyhow!("path for suffix {} missing in release manifest", suffix)
            })
    }

    /// Whether this manifest belongs to the requested release
    ///
    /// The commit may be given in full or as its short form.
    pub fn matches_commit(&self, commit: &str) -> bool {
        self.build_committish == commit || short_commit(&self.build_committish) == commit
    }
}

/// Truncate a commit to the length used in manifest paths
pub fn short_commit(commit: &str) -> &str {
    match commit.char_indices().nth(SHORT_COMMIT_LEN) {
        Some((idx, _)) => &commit[..idx],
        None => commit,
    }
}

/// Storage key of the release manifest for a flavor
pub fn manifest_key(cname: &str, version: &str, commit: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        MANIFEST_PREFIX,
        cname,
        version,
        short_commit(commit)
    )
}
