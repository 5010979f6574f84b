//! In-memory collaborators for unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use super::{ArtifactSource, ObjectReader, PublishingOutput, PublishingTarget, Sources};
use crate::config::Credentials;
use crate::manifest::{Architecture, Manifest, ReleaseFile};

#[derive(Default)]
pub struct MemorySource {
    pub manifests: Mutex<HashMap<String, Manifest>>,
    pub objects: HashMap<String, Vec<u8>>,
    pub puts: Mutex<Vec<String>>,
}

#[async_trait]
impl ArtifactSource for MemorySource {
    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        Ok(())
    }

    fn set_source_config(&mut self, _config: &serde_yaml::Value) -> Result<()> {
        Ok(())
    }

    async fn get_manifest(&self, path: &str) -> Result<Manifest> {
        self.manifests
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no manifest at {}", path))
    }

    async fn put_manifest(&self, path: &str, manifest: &Manifest) -> Result<()> {
        self.puts.lock().unwrap().push(path.to_string());
        self.manifests
            .lock()
            .unwrap()
            .insert(path.to_string(), manifest.clone());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader> {
        let data = self
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no object at {}", key))?;
        Ok(Box::pin(Cursor::new(data)))
    }
}

pub struct StubTarget {
    pub platform: String,
    pub suffix: String,
}

impl StubTarget {
    pub fn new(platform: &str, suffix: &str) -> Self {
        Self {
            platform: platform.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

#[async_trait]
impl PublishingTarget for StubTarget {
    fn target_type(&self) -> &str {
        &self.platform
    }

    fn image_suffix(&self) -> &str {
        &self.suffix
    }

    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        Ok(())
    }

    fn set_target_config(&mut self, _config: &serde_yaml::Value) -> Result<()> {
        Ok(())
    }

    async fn publish(
        &self,
        cname: &str,
        _manifest: &Manifest,
        _sources: &Sources,
    ) -> Result<PublishingOutput> {
        Ok(serde_yaml::Value::String(format!("image-{}", cname)))
    }

    async fn remove(&self, _cname: &str, _manifest: &Manifest, _sources: &Sources) -> Result<()> {
        Ok(())
    }
}

/// A manifest with image, rootfs and package manifest files
pub fn flavor_manifest(cname: &str, platform: &str, image_suffix: &str) -> Manifest {
    let file = |suffix: &str| ReleaseFile {
        name: format!("{}{}", cname, suffix),
        suffix: suffix.to_string(),
        md5sum: None,
        sha256sum: None,
        s3_key: format!("objects/{}{}", cname, suffix),
        s3_bucket_name: "gardenlinux-releases".to_string(),
    };
    Manifest {
        version: "1592.1".to_string(),
        build_committish: "ec945aa995d0f08d64303ff6045b313b40b665fb".to_string(),
        architecture: Architecture::Amd64,
        platform: platform.to_string(),
        modifiers: vec!["_prod".to_string(), "gardener".to_string()],
        build_timestamp: "2024-07-01T12:00:00Z".to_string(),
        paths: vec![file(image_suffix), file(".tar"), file(".manifest")],
        require_uefi: None,
        secure_boot: None,
        published_image_metadata: None,
        s3_bucket: "gardenlinux-releases".to_string(),
    }
}
