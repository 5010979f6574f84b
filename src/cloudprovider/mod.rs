//! Collaborators of the publishing process
//!
//! Artifact sources hold release manifests and objects, publishing targets
//! turn a flavor into an image at a cloud provider, and OCM targets receive the
//! final component descriptor. Implementations are constructed by type name
//! through a [`Registry`].

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::config::Credentials;
use crate::manifest::Manifest;

pub mod local;
pub mod mirror;


#[cfg(test)]
pub(crate) mod testing;

pub use local::{LocalOcmTarget, LocalSource};
pub use mirror::MirrorTarget;

/// Byte stream of an object read from an artifact source
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Opaque, provider-specific result of publishing an image
pub type PublishingOutput = serde_yaml::Value;

/// Configured artifact sources by id
pub type Sources = HashMap<String, Arc<dyn ArtifactSource>>;

/// Store for release manifests and the objects they reference
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    fn set_credentials(&mut self, creds: &Credentials) -> Result<()>;

    fn set_source_config(&mut self, config: &serde_yaml::Value) -> Result<()>;

    async fn get_manifest(&self, path: &str) -> Result<Manifest>;

    async fn put_manifest(&self, path: &str, manifest: &Manifest) -> Result<()>;

    async fn get_object(&self, key: &str) -> Result<ObjectReader>;
}

/// A cloud provider images are published to
#[async_trait]
pub trait PublishingTarget: Send + Sync {
    /// Platform this target publishes, matched against the flavor platform
    fn target_type(&self) -> &str;

    /// Suffix of the release file holding the image for this platform
    fn image_suffix(&self) -> &str;

    fn set_credentials(&mut self, creds: &Credentials) -> Result<()>;

    fn set_target_config(&mut self, config: &serde_yaml::Value) -> Result<()>;

    async fn publish(
        &self,
        cname: &str,
        manifest: &Manifest,
        sources: &Sources,
    ) -> Result<PublishingOutput>;

    async fn remove(&self, cname: &str, manifest: &Manifest, sources: &Sources) -> Result<()>;
}

/// Destination of OCM component descriptors
#[async_trait]
pub trait OcmTarget: Send + Sync {
    /// Repository the descriptor is published to, e.g. `oci://host/sub/path`
    fn ocm_repository(&self) -> &str;

    fn set_credentials(&mut self, creds: &Credentials) -> Result<()>;

    fn set_ocm_config(&mut self, config: &serde_yaml::Value) -> Result<()>;

    async fn publish_component_descriptor(&self, version: &str, descriptor: &[u8]) -> Result<()>;
}

/// A flavor matched to the target it gets published to
pub struct Publication {
    pub cname: String,
    pub manifest: Manifest,
    pub target: Arc<dyn PublishingTarget>,
    /// Set once the target has published the image
    pub output: Option<PublishingOutput>,
}

pub type SourceFactory = Box<dyn Fn() -> Box<dyn ArtifactSource> + Send + Sync>;
pub type TargetFactory = Box<dyn Fn() -> Box<dyn PublishingTarget> + Send + Sync>;
pub type OcmTargetFactory = Box<dyn Fn() -> Box<dyn OcmTarget> + Send + Sync>;

/// Constructors for collaborators, keyed by type name
pub struct Registry {
    sources: HashMap<String, SourceFactory>,
    targets: HashMap<String, TargetFactory>,
    ocm_targets: HashMap<String, OcmTargetFactory>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_source("local", || Box::new(LocalSource::default()));
        registry.register_target("mirror", || Box::new(MirrorTarget::default()));
        registry.register_ocm_target("local", || Box::new(LocalOcmTarget::default()));
        registry
    }
}

impl Registry {
    /// A registry without any implementations
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
            targets: HashMap::new(),
            ocm_targets: HashMap::new(),
        }
    }

    pub fn register_source<F>(&mut self, source_type: &str, factory: F)
    where
        F: Fn() -> Box<dyn ArtifactSource> + Send + Sync + 'static,
    {
        self.sources
            .insert(source_type.to_string(), Box::new(factory));
    }

    pub fn register_target<F>(&mut self, target_type: &str, factory: F)
    where
        F: Fn() -> Box<dyn PublishingTarget> + Send + Sync + 'static,
    {
        self.targets
            .insert(target_type.to_string(), Box::new(factory));
    }

    pub fn register_ocm_target<F>(&mut self, ocm_type: &str, factory: F)
    where
        F: Fn() -> Box<dyn OcmTarget> + Send + Sync + 'static,
    {
        self.ocm_targets
            .insert(ocm_type.to_string(), Box::new(factory));
    }

    pub fn new_artifact_source(&self, source_type: &str) -> Result<Box<dyn ArtifactSource>> {
        let factory = self
            .sources
            .get(source_type)
            .ok_or_else(|| anyhow::anyhow!("unknown artifact source type {}", source_type))?;
        Ok(factory())
    }

    pub fn new_publishing_target(&self, target_type: &str) -> Result<Box<dyn PublishingTarget>> {
        let factory = self
            .targets
            .get(target_type)
            .ok_or_else(|| anyhow::anyhow!("unknown publishing target type {}", target_type))?;
        Ok(factory())
    }

    pub fn new_ocm_target(&self, ocm_type: &str) -> Result<Box<dyn OcmTarget>> {
        let factory = self
            .ocm_targets
            .get(ocm_type)
            .ok_or_else(|| anyhow::anyhow!("unknown OCM target type {}", ocm_type))?;
        Ok(factory())
    }
}
