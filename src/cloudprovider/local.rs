//! Filesystem-backed artifact source and OCM target

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{ArtifactSource, ObjectReader, OcmTarget};
use crate::config::Credentials;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Deserialize)]
struct LocalSourceConfig {
    root: PathBuf,
}

/// Artifact source reading manifests and objects from a directory tree
///
/// Keys map to paths relative to the configured root.
#[derive(Debug, Default)]
pub struct LocalSource {
    root: Option<PathBuf>,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub(crate) fn resolve(&self, key: &str) -> Result<PathBuf> {
        let root = self
            .root
            .as_ref()
            .context("local artifact source is not configured")?;
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            anyhow::bail!("invalid object key {}", key);
        }
        Ok(root.join(relative))
    }
}

#[async_trait]
impl ArtifactSource for LocalSource {
    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        Ok(())
    }

    fn set_source_config(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: LocalSourceConfig = serde_yaml::from_value(config.clone())
            .context("invalid local artifact source configuration")?;
        self.root = Some(config.root);
        Ok(())
    }

    async fn get_manifest(&self, path: &str) -> Result<Manifest> {
        let file = self.resolve(path)?;
        debug!("Reading manifest from {}", file.display());
        let content = tokio::fs::read(&file)
            .await
            .with_context(|| format!("cannot read {}", file.display()))?;
        serde_yaml::from_slice(&content)
            .with_context(|| format!("invalid manifest {}", file.display()))
    }

    async fn put_manifest(&self, path: &str, manifest: &Manifest) -> Result<()> {
        let file = self.resolve(path)?;
        debug!("Writing manifest to {}", file.display());
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(manifest)?;
        tokio::fs::write(&file, content)
            .await
            .with_context(|| format!("cannot write {}", file.display()))
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader> {
        let file = self.resolve(key)?;
        let reader = tokio::fs::File::open(&file)
            .await
            .with_context(|| format!("cannot open {}", file.display()))?;
        Ok(Box::pin(reader))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LocalOcmConfig {
    repository: String,
    directory: PathBuf,
}

/// OCM target writing component descriptors to `{directory}/{version}.yaml`
#[derive(Debug, Default)]
pub struct LocalOcmTarget {
    repository: String,
    directory: Option<PathBuf>,
}

impl LocalOcmTarget {
    pub fn new(repository: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            directory: Some(directory.into()),
        }
    }
}

#[async_trait]
impl OcmTarget for LocalOcmTarget {
    fn ocm_repository(&self) -> &str {
        &self.repository
    }

    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        Ok(())
    }

    fn set_ocm_config(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: LocalOcmConfig = serde_yaml::from_value(config.clone())
            .context("invalid local OCM target configuration")?;
        self.repository = config.repository;
        self.directory = Some(config.directory);
        Ok(())
    }

    async fn publish_component_descriptor(&self, version: &str, descriptor: &[u8]) -> Result<()> {
        let directory = self
            .directory
            .as_ref()
            .context("local OCM target is not configured")?;
        tokio::fs::create_dir_all(directory)
            .await
            .with_context(|| format!("cannot create {}", directory.display()))?;
        let file = directory.join(format!("{}.yaml", version));
        debug!("Writing component descriptor to {}", file.display());
        tokio::fs::write(&file, descriptor)
            .await
            .with_context(|| format!("cannot write {}", file.display()))
    }
}
