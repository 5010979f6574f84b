//! Publishing target mirroring images into a local directory
//!
//! Useful for staging releases and for exercising the publishing pipeline
//! without a cloud account. The target reports the configured platform, so it
//! can stand in for any provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::{PublishingOutput, PublishingTarget, Sources};
use crate::config::Credentials;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Deserialize)]
struct MirrorConfig {
    platform: String,
    image_suffix: String,
    /// Id of the artifact source images are read from
    source: String,
    destination: PathBuf,
}

/// Published image metadata recorded by the mirror target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorOutput {
    pub path: String,
    pub sha256: String,
    pub published_at: String,
}

#[derive(Debug, Default)]
pub struct MirrorTarget {
    platform: String,
    image_suffix: String,
    source: String,
    destination: PathBuf,
}

impl MirrorTarget {
    fn image_path(&self, cname: &str) -> PathBuf {
        self.destination
            .join(format!("{}{}", cname, self.image_suffix))
    }

    fn metadata_path(&self, cname: &str) -> PathBuf {
        self.destination.join(format!("{}.json", cname))
    }
}

#[async_trait]
impl PublishingTarget for MirrorTarget {
    fn target_type(&self) -> &str {
        &self.platform
    }

    fn image_suffix(&self) -> &str {
        &self.image_suffix
    }

    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        Ok(())
    }

    fn set_target_config(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: MirrorConfig = serde_yaml::from_value(config.clone())
            .context("invalid mirror target configuration")?;
        self.platform = config.platform;
        self.image_suffix = config.image_suffix;
        self.source = config.source;
        self.destination = config.destination;
        Ok(())
    }

    async fn publish(
        &self,
        cname: &str,
        manifest: &Manifest,
        sources: &Sources,
    ) -> Result<PublishingOutput> {
        let image = manifest
            .path_by_suffix(&self.image_suffix)
            .with_context(|| format!("missing image for {}", cname))?;
        let source = sources
            .get(&self.source)
            .with_context(|| format!("unknown artifact source {}", self.source))?;

        debug!("Fetching image {}", image.s3_key);
        let mut reader = source.get_object(&image.s3_key).await?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .with_context(|| format!("cannot read image {}", image.s3_key))?;

        let sha256 = sha256::digest(&data);
        if let Some(expected) = &image.sha256sum {
            if *expected != sha256 {
                anyhow::bail!(
                    "checksum mismatch for {}: expected {}, got {}",
                    image.s3_key,
                    expected,
                    sha256
                );
            }
        }

        tokio::fs::create_dir_all(&self.destination)
            .await
            .with_context(|| format!("cannot create {}", self.destination.display()))?;
        let path = self.image_path(cname);
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;

        let output = MirrorOutput {
            path: path.display().to_string(),
            sha256,
            published_at: chrono::Utc::now().to_rfc3339(),
        };
        let metadata_path = self.metadata_path(cname);
        tokio::fs::write(&metadata_path, serde_json::to_vec_pretty(&output)?)
            .await
            .with_context(|| format!("cannot write {}", metadata_path.display()))?;

        info!("Mirrored {} to {}", cname, output.path);
        Ok(serde_yaml::to_value(output)?)
    }

    async fn remove(&self, cname: &str, manifest: &Manifest, _sources: &Sources) -> Result<()> {
        if manifest.published_image_metadata.is_none() {
            anyhow::bail!("{} has no published image metadata", cname);
        }

        for path in [self.image_path(cname), self.metadata_path(cname)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("{} is already gone", path.display());
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("cannot remove {}", path.display()))
                }
            }
        }
        Ok(())
    }
}
