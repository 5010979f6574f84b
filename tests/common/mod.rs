//! Recording fakes for exercising the publish service

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use glci::cloudprovider::{
    ArtifactSource, ObjectReader, OcmTarget, PublishingOutput, PublishingTarget, Registry, Sources,
};
use glci::config::{
    Credentials, FlavorConfig, FlavorsConfig, OcmConfig, PublishingConfig, SourceConfig,
    TargetConfig,
};
use glci::manifest::{manifest_key, Architecture, Manifest, ReleaseFile};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

pub const VERSION: &str = "1592.1";
pub const COMMIT: &str = "ec945aa995d0f08d64303ff6045b313b40b665fb";
pub const REPOSITORY: &str = "oci://europe-docker.pkg.dev/gardener-project/releases";

/// Everything the fakes saw, shared between all of them
#[derive(Default)]
pub struct State {
    pub manifests: HashMap<String, Manifest>,
    pub objects: HashMap<String, Vec<u8>>,
    /// (source name, path, manifest) of every manifest write
    pub puts: Vec<(String, String, Manifest)>,
    pub gets: Vec<String>,
    /// `platform/cname` of every publish call
    pub published: Vec<String>,
    /// `platform/cname` of every remove call
    pub removed: Vec<String>,
    /// (version, descriptor) of every published component descriptor
    pub descriptors: Vec<(String, Vec<u8>)>,
    pub failing: HashSet<String>,
    pub credentials_seen: usize,
}

pub type Shared = Arc<Mutex<State>>;

#[derive(Deserialize)]
struct FakeSourceConfig {
    name: String,
}

pub struct FakeSource {
    state: Shared,
    name: String,
}

#[async_trait]
impl ArtifactSource for FakeSource {
    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        self.state.lock().unwrap().credentials_seen += 1;
        Ok(())
    }

    fn set_source_config(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: FakeSourceConfig = serde_yaml::from_value(config.clone())?;
        self.name = config.name;
        Ok(())
    }

    async fn get_manifest(&self, path: &str) -> Result<Manifest> {
        let mut state = self.state.lock().unwrap();
        state.gets.push(path.to_string());
        state
            .manifests
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no manifest at {}", path))
    }

    async fn put_manifest(&self, path: &str, manifest: &Manifest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .puts
            .push((self.name.clone(), path.to_string(), manifest.clone()));
        state.manifests.insert(path.to_string(), manifest.clone());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader> {
        let data = self
            .state
            .lock()
            .unwrap()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no object at {}", key))?;
        Ok(Box::pin(Cursor::new(data)))
    }
}

#[derive(Deserialize)]
struct FakeTargetConfig {
    platform: String,
    image_suffix: String,
}

pub struct FakeTarget {
    state: Shared,
    platform: String,
    image_suffix: String,
}

#[async_trait]
impl PublishingTarget for FakeTarget {
    fn target_type(&self) -> &str {
        &self.platform
    }

    fn image_suffix(&self) -> &str {
        &self.image_suffix
    }

    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        self.state.lock().unwrap().credentials_seen += 1;
        Ok(())
    }

    fn set_target_config(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: FakeTargetConfig = serde_yaml::from_value(config.clone())?;
        self.platform = config.platform;
        self.image_suffix = config.image_suffix;
        Ok(())
    }

    async fn publish(
        &self,
        cname: &str,
        _manifest: &Manifest,
        _sources: &Sources,
    ) -> Result<PublishingOutput> {
        let mut state = self.state.lock().unwrap();
        state.published.push(format!("{}/{}", self.platform, cname));
        if state.failing.contains(cname) {
            anyhow::bail!("provider rejected image");
        }
        Ok(serde_yaml::from_str(&format!(
            "image_id: {}-image\nregion: eu-central-1",
            cname
        ))?)
    }

    async fn remove(&self, cname: &str, _manifest: &Manifest, _sources: &Sources) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removed.push(format!("{}/{}", self.platform, cname));
        if state.failing.contains(cname) {
            anyhow::bail!("provider rejected removal");
        }
        Ok(())
    }
}

pub struct FakeOcm {
    state: Shared,
    repository: String,
}

#[async_trait]
impl OcmTarget for FakeOcm {
    fn ocm_repository(&self) -> &str {
        &self.repository
    }

    fn set_credentials(&mut self, _creds: &Credentials) -> Result<()> {
        self.state.lock().unwrap().credentials_seen += 1;
        Ok(())
    }

    fn set_ocm_config(&mut self, _config: &serde_yaml::Value) -> Result<()> {
        self.repository = REPOSITORY.to_string();
        Ok(())
    }

    async fn publish_component_descriptor(&self, version: &str, descriptor: &[u8]) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .descriptors
            .push((version.to_string(), descriptor.to_vec()));
        Ok(())
    }
}

/// Registry constructing fakes which all record into `state`
pub fn registry(state: &Shared) -> Registry {
    let mut registry = Registry::empty();
    let s = Arc::clone(state);
    registry.register_source("fake", move || {
        Box::new(FakeSource {
            state: Arc::clone(&s),
            name: String::new(),
        })
    });
    let s = Arc::clone(state);
    registry.register_target("fake", move || {
        Box::new(FakeTarget {
            state: Arc::clone(&s),
            platform: String::new(),
            image_suffix: String::new(),
        })
    });
    let s = Arc::clone(state);
    registry.register_ocm_target("fake", move || {
        Box::new(FakeOcm {
            state: Arc::clone(&s),
            repository: String::new(),
        })
    });
    registry
}

fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

/// Publishing configuration with one fake target per platform
pub fn publishing_config(platforms: &[(&str, &str)]) -> PublishingConfig {
    PublishingConfig {
        sources: vec![
            SourceConfig {
                id: "releases".to_string(),
                source_type: "fake".to_string(),
                config: yaml("name: releases"),
            },
            SourceConfig {
                id: "staging".to_string(),
                source_type: "fake".to_string(),
                config: yaml("name: staging"),
            },
        ],
        manifest_source: "releases".to_string(),
        manifest_target: None,
        targets: platforms
            .iter()
            .map(|(platform, suffix)| TargetConfig {
                target_type: "fake".to_string(),
                config: yaml(&format!("platform: {}\nimage_suffix: {}", platform, suffix)),
            })
            .collect(),
        ocm: OcmConfig {
            ocm_type: "fake".to_string(),
            config: serde_yaml::Value::Null,
        },
    }
}

pub fn flavors(entries: &[(&str, &str)]) -> FlavorsConfig {
    FlavorsConfig {
        flavors: entries
            .iter()
            .map(|(cname, platform)| FlavorConfig {
                cname: cname.to_string(),
                platform: platform.to_string(),
            })
            .collect(),
    }
}

/// Store a valid manifest and package list for a flavor
pub fn seed_flavor(state: &Shared, cname: &str, platform: &str, image_suffix: &str) -> Manifest {
    let file = |suffix: &str| ReleaseFile {
        name: format!("{}-{}-ec945aa9{}", cname, VERSION, suffix),
        suffix: suffix.to_string(),
        md5sum: None,
        sha256sum: None,
        s3_key: format!("objects/{}{}", cname, suffix),
        s3_bucket_name: "gardenlinux-releases".to_string(),
    };
    let manifest = Manifest {
        version: VERSION.to_string(),
        build_committish: COMMIT.to_string(),
        architecture: Architecture::Amd64,
        platform: platform.to_string(),
        modifiers: vec!["_prod".to_string(), "gardener".to_string(), platform.to_string()],
        build_timestamp: "2024-07-01T12:00:00Z".to_string(),
        paths: vec![file(image_suffix), file(".tar"), file(".manifest")],
        require_uefi: None,
        secure_boot: None,
        published_image_metadata: None,
        s3_bucket: "gardenlinux-releases".to_string(),
    };

    let mut state = state.lock().unwrap();
    state
        .manifests
        .insert(manifest_key(cname, VERSION, COMMIT), manifest.clone());
    state.objects.insert(
        format!("objects/{}.manifest", cname),
        b"curl 7.88.1\nbash 5.2.15\n".to_vec(),
    );
    manifest
}
