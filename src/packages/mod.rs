//! Package manifests
//!
//! Every flavor ships a plain-text list of the packages installed in its root
//! filesystem, one `name version` pair per line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::AliasesConfig;


/// A package installed in a flavor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
}

/// A package enriched with its known aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub name: String,
    pub aliases: Vec<String>,
    pub version: String,
}

/// Parse a package manifest
///
/// Blank lines and `#` comments are skipped; every other line must consist of
/// exactly two whitespace-separated tokens. Bytes that are not valid UTF-8 are
/// replaced rather than rejected.
pub async fn parse_packages<R>(reader: R) -> Result<Vec<Package>>
where
    R: AsyncRead + Unpin,
{
    let mut packages = Vec::new();
    let mut lines = BufReader::new(reader).split(b'\n');
    while let Some(raw) = lines
        .next_segment()
        .await
        .context("Failed to read package manifest")?
    {
        let line = String::from_utf8_lossy(&raw);
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            [first, ..] if first.starts_with('#') => continue,
            [name, version] => packages.push(Package {
                name: name.to_string(),
                version: version.to_string(),
            }),
            _ => anyhow::bail!("invalid package-version {}", line),
        }
    }
    Ok(packages)
}

/// Cross-reference packages with the alias table
pub fn package_versions(packages: &[Package], aliases: &AliasesConfig) -> Vec<PackageVersion> {
    packages
        .iter()
        .map(|p| PackageVersion {
            name: p.name.clone(),
            aliases: aliases.get(&p.name).cloned().unwrap_or_default(),
            version: p.version.clone(),
        })
        .collect()
}

/// Render packages as `name version` strings
pub fn package_list(packages: &[Package]) -> Vec<String> {
    packages
        .iter()
        .map(|p| format!("{} {}", p.name, p.version))
        .collect()
}
