//! OCM component descriptors
//!
//! The descriptor lists a virtual machine image and a root filesystem resource
//! for every published flavor. It is built before publishing starts and
//! amended with the provider output once all images are published.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::cloudprovider::{ArtifactSource, OcmTarget, Publication};
use crate::config::AliasesConfig;
use crate::constants::{component, label, repo, resource, suffix};
use crate::manifest::Manifest;
use crate::packages::{self, Package};


/// OCM v2 component descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub meta: Metadata,
    pub component: Component,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "configuredSchemaVersion")]
    pub configured_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    pub version: String,
    pub provider: Provider,
    pub repository_contexts: Vec<RepositoryContext>,
    pub sources: Vec<Source>,
    pub component_references: Vec<serde_yaml::Value>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryContext {
    #[serde(rename = "type")]
    pub context_type: String,
    pub component_name_mapping: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub sub_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(rename = "type")]
    pub source_type: String,
    pub access: GitHubAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: serde_yaml::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubAccess {
    #[serde(rename = "type")]
    pub access_type: String,
    #[serde(rename = "repoUrl")]
    pub repo_url: String,
    pub commit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_identity: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    pub access: S3Access,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    pub hash_algorithm: String,
    pub normalisation_algorithm: String,
    pub value: String,
}

impl Digest {
    /// Marker for resources which are not content-addressed
    pub fn excluded() -> Self {
        Self {
            hash_algorithm: resource::NO_DIGEST.to_string(),
            normalisation_algorithm: resource::EXCLUDE_FROM_SIGNATURE.to_string(),
            value: resource::NO_DIGEST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Access {
    #[serde(rename = "type")]
    pub access_type: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildMetadata<'a> {
    modifiers: &'a [String],
    build_timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    debian_packages: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct Responsible {
    #[serde(rename = "type")]
    contact_type: &'static str,
    email: &'static str,
}

#[derive(Debug, Serialize)]
struct SourceAnalysisHint {
    policy: &'static str,
    comment: &'static str,
}

impl ComponentDescriptor {
    pub fn to_yaml(&self) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_string(self)?.into_bytes())
    }

    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(data).context("invalid component descriptor")
    }
}

/// Build a component descriptor with everything but the publishing output
pub async fn build_component_descriptor(
    source: &dyn ArtifactSource,
    publications: &[Publication],
    ocm_target: &dyn OcmTarget,
    aliases: &AliasesConfig,
    version: &str,
    commit: &str,
) -> Result<ComponentDescriptor> {
    debug!("Building component descriptor");

    let (base_url, sub_path) = base_and_sub(ocm_target.ocm_repository());

    let mut resources = Vec::with_capacity(publications.len() * 2);
    for publication in publications {
        let packages = get_packages(source, &publication.manifest)
            .await
            .with_context(|| format!("cannot list packages for {}", publication.cname))?;
        let (image, rootfs) = flavor_resources(publication, &packages, aliases)?;
        resources.push(image);
        resources.push(rootfs);
    }

    Ok(ComponentDescriptor {
        meta: Metadata {
            configured_version: component::SCHEMA_VERSION.to_string(),
        },
        component: Component {
            name: repo::GARDENLINUX.to_string(),
            version: version.to_string(),
            provider: Provider {
                name: component::PROVIDER.to_string(),
            },
            repository_contexts: vec![RepositoryContext {
                context_type: "OCIRegistry".to_string(),
                component_name_mapping: "urlPath".to_string(),
                base_url,
                sub_path,
            }],
            sources: vec![Source {
                name: component::SOURCE_NAME.to_string(),
                version: version.to_string(),
                labels: vec![Label {
                    name: label::SOURCE_ANALYSIS.to_string(),
                    value: serde_yaml::to_value(SourceAnalysisHint {
                        policy: "skip",
                        comment: "repo only contains build instructions, source in this repo will not get incorporated into the final artifact",
                    })?,
                }],
                source_type: "git".to_string(),
                access: GitHubAccess {
                    access_type: "gitHub".to_string(),
                    repo_url: repo::GARDENLINUX_URL.to_string(),
                    commit: commit.to_string(),
                },
            }],
            component_references: Vec::new(),
            resources,
        },
    })
}

/// Attach the publishing output of every publication to its image resource
pub fn add_publication_output(
    descriptor: &mut ComponentDescriptor,
    publications: &[Publication],
) -> Result<()> {
    let resources = &mut descriptor.component.resources;
    if resources.len() != publications.len() * 2 {
        anyhow::bail!(
            "invalid component descriptor: expected {} resources, got {}",
            publications.len() * 2,
            resources.len()
        );
    }

    for (i, publication) in publications.iter().enumerate() {
        let image = &mut resources[i * 2];
        if image.resource_type != resource::IMAGE_TYPE {
            anyhow::bail!(
                "invalid component descriptor: resource {} has incorrect type {}",
                i * 2,
                image.resource_type
            );
        }
        if image.name != resource::IMAGE_NAME {
            anyhow::bail!(
                "invalid component descriptor: resource {} has incorrect name {}",
                i * 2,
                image.name
            );
        }
        let output = publication
            .output
            .clone()
            .with_context(|| format!("{} has no publishing output", publication.cname))?;

        image.labels.push(Label {
            name: label::PUBLISHED_IMAGE_METADATA.to_string(),
            value: output,
        });
    }

    Ok(())
}

fn flavor_resources(
    publication: &Publication,
    packages: &[Package],
    aliases: &AliasesConfig,
) -> Result<(Resource, Resource)> {
    let manifest = &publication.manifest;
    let image_path = manifest
        .path_by_suffix(publication.target.image_suffix())
        .with_context(|| format!("missing image for {}", publication.cname))?;
    let rootfs_path = manifest
        .path_by_suffix(suffix::ROOTFS)
        .with_context(|| format!("missing rootfs for {}", publication.cname))?;

    let extra_identity = BTreeMap::from([
        ("feature-flags".to_string(), manifest.modifiers.join(",")),
        (
            "architecture".to_string(),
            manifest.architecture.to_string(),
        ),
        ("platform".to_string(), manifest.platform.clone()),
    ]);

    let mut image_labels = vec![Label {
        name: label::BUILD_METADATA.to_string(),
        value: serde_yaml::to_value(BuildMetadata {
            modifiers: &manifest.modifiers,
            build_timestamp: &manifest.build_timestamp,
            debian_packages: None,
        })?,
    }];
    let package_versions = packages::package_versions(packages, aliases);
    if !package_versions.is_empty() {
        image_labels.push(Label {
            name: label::PACKAGE_VERSIONS.to_string(),
            value: serde_yaml::to_value(package_versions)?,
        });
    }

    let responsibles: Vec<Responsible> = component::RESPONSIBLES
        .iter()
        .map(|&email| Responsible {
            contact_type: "emailAddress",
            email,
        })
        .collect();
    let rootfs_labels = vec![
        Label {
            name: label::BUILD_METADATA.to_string(),
            value: serde_yaml::to_value(BuildMetadata {
                modifiers: &manifest.modifiers,
                build_timestamp: &manifest.build_timestamp,
                debian_packages: Some(packages::package_list(packages)),
            })?,
        },
        Label {
            name: label::RESPONSIBLES.to_string(),
            value: serde_yaml::to_value(responsibles)?,
        },
    ];

    let image = Resource {
        name: resource::IMAGE_NAME.to_string(),
        version: manifest.version.clone(),
        extra_identity: extra_identity.clone(),
        labels: image_labels,
        resource_type: resource::IMAGE_TYPE.to_string(),
        digest: Some(Digest::excluded()),
        access: s3_access(manifest, &image_path.s3_key),
    };
    let rootfs = Resource {
        name: resource::ROOTFS_NAME.to_string(),
        version: manifest.version.clone(),
        extra_identity,
        labels: rootfs_labels,
        resource_type: resource::ROOTFS_TYPE.to_string(),
        digest: Some(Digest::excluded()),
        access: s3_access(manifest, &rootfs_path.s3_key),
    };
    Ok((image, rootfs))
}

fn s3_access(manifest: &Manifest, key: &str) -> S3Access {
    S3Access {
        access_type: "s3".to_string(),
        bucket: manifest.s3_bucket.clone(),
        key: key.to_string(),
    }
}

async fn get_packages(source: &dyn ArtifactSource, manifest: &Manifest) -> Result<Vec<Package>> {
    debug!("Getting packages");

    let path = manifest
        .path_by_suffix(suffix::PACKAGE_MANIFEST)
        .context("missing package manifest")?;
    let reader = source
        .get_object(&path.s3_key)
        .await
        .context("cannot get package manifest")?;
    packages::parse_packages(reader).await
}

/// Split an OCM repository into base URL and sub-path
///
/// The scheme, if any, stays part of the base URL.
pub fn base_and_sub(repository: &str) -> (String, String) {
    let (scheme, rest) = match repository.find("://") {
        Some(i) => repository.split_at(i + 3),
        None => ("", repository),
    };
    match rest.split_once('/') {
        Some((host, sub)) => (format!("{}{}", scheme, host), sub.to_string()),
        None => (repository.to_string(), String::new()),
    }
}
