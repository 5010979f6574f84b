//! Publish service for orchestrating releases
//!
//! Resolves which flavors go to which targets, validates their manifests,
//! publishes or removes the images and keeps the release manifests in sync.
//! Nothing is rolled back: a failure leaves every earlier step in place, and
//! the persisted manifests show what has been published so far.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    cloudprovider::{ArtifactSource, OcmTarget, Publication, PublishingTarget, Registry, Sources},
    config::{AliasesConfig, Credentials, FlavorsConfig, PublishingConfig},
    manifest::manifest_key,
    ocm,
};

/// Collaborators resolved from the publishing configuration
pub struct Providers {
    pub manifest_source: Arc<dyn ArtifactSource>,
    pub manifest_target: Arc<dyn ArtifactSource>,
    pub sources: Sources,
    pub targets: Vec<Arc<dyn PublishingTarget>>,
    pub ocm_target: Box<dyn OcmTarget>,
}

/// Service for publishing and removing releases
pub struct PublishService {
    registry: Registry,
}

impl Default for PublishService {
    fn default() -> Self {
        Self::new(Registry::default())
    }
}

impl PublishService {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Publish a release to every target matching a flavor's platform
    #[instrument(
        name = "publish",
        skip_all,
        fields(op = "publish", version = %version, commit = %commit)
    )]
    pub async fn publish(
        &self,
        flavors: &FlavorsConfig,
        publishing: &PublishingConfig,
        aliases: &AliasesConfig,
        creds: &Credentials,
        version: &str,
        commit: &str,
    ) -> Result<()> {
        info!("Publishing release");

        debug!("Loading credentials and configuration");
        let providers = self
            .load_providers(creds, publishing)
            .context("invalid credentials or configuration")?;

        let (mut publications, commit) =
            collect_publications(&providers, flavors, version, commit).await?;

        let mut descriptor = ocm::build_component_descriptor(
            providers.manifest_source.as_ref(),
            &publications,
            providers.ocm_target.as_ref(),
            aliases,
            version,
            &commit,
        )
        .await
        .context("cannot build component descriptor")?;

        info!(count = publications.len(), "Publishing images");
        for publication in &mut publications {
            let platform = publication.target.target_type().to_string();
            info!(cname = %publication.cname, platform = %platform, "Publishing image");
            let output = publication
                .target
                .publish(&publication.cname, &publication.manifest, &providers.sources)
                .await
                .with_context(|| {
                    format!("cannot publish {} to {}", publication.cname, platform)
                })?;
            publication.manifest.published_image_metadata = Some(output.clone());
            publication.output = Some(output);

            info!(cname = %publication.cname, platform = %platform, "Updating manifest");
            providers
                .manifest_target
                .put_manifest(
                    &manifest_key(&publication.cname, version, &commit),
                    &publication.manifest,
                )
                .await
                .with_context(|| format!("cannot put manifest for {}", publication.cname))?;
        }

        debug!("Finalizing component descriptor");
        ocm::add_publication_output(&mut descriptor, &publications)
            .context("cannot add publication output to component descriptor")?;
        let descriptor_yaml = descriptor
            .to_yaml()
            .context("invalid component descriptor")?;

        info!("Publishing component descriptor");
        providers
            .ocm_target
            .publish_component_descriptor(version, &descriptor_yaml)
            .await
            .context("cannot publish component descriptor")?;

        info!("Publishing completed successfully");
        Ok(())
    }

    /// Remove a release from every target matching a flavor's platform
    #[instrument(
        name = "remove",
        skip_all,
        fields(op = "remove", version = %version, commit = %commit)
    )]
    pub async fn remove(
        &self,
        flavors: &FlavorsConfig,
        publishing: &PublishingConfig,
        creds: &Credentials,
        version: &str,
        commit: &str,
    ) -> Result<()> {
        info!("Removing release");

        debug!("Loading credentials and configuration");
        let providers = self
            .load_providers(creds, publishing)
            .context("invalid credentials or configuration")?;

        let (mut publications, commit) =
            collect_publications(&providers, flavors, version, commit).await?;

        info!(count = publications.len(), "Removing images");
        for publication in &mut publications {
            let platform = publication.target.target_type().to_string();
            info!(cname = %publication.cname, platform = %platform, "Removing image");
            publication
                .target
                .remove(&publication.cname, &publication.manifest, &providers.sources)
                .await
                .with_context(|| {
                    format!("cannot remove {} from {}", publication.cname, platform)
                })?;
            publication.manifest.published_image_metadata = None;

            info!(cname = %publication.cname, platform = %platform, "Updating manifest");
            providers
                .manifest_target
                .put_manifest(
                    &manifest_key(&publication.cname, version, &commit),
                    &publication.manifest,
                )
                .await
                .with_context(|| format!("cannot put manifest for {}", publication.cname))?;
        }

        info!("Removing completed successfully");
        Ok(())
    }

    /// Construct and configure every collaborator named in the configuration
    pub fn load_providers(
        &self,
        creds: &Credentials,
        publishing: &PublishingConfig,
    ) -> Result<Providers> {
        let mut sources = Sources::with_capacity(publishing.sources.len());
        for s in &publishing.sources {
            let mut source = self
                .registry
                .new_artifact_source(&s.source_type)
                .with_context(|| format!("invalid artifact source {}", s.id))?;
            source
                .set_credentials(creds)
                .with_context(|| format!("cannot set credentials for {}", s.id))?;
            source
                .set_source_config(&s.config)
                .with_context(|| format!("cannot set source configuration for {}", s.id))?;
            sources.insert(s.id.clone(), Arc::from(source));
        }

        let manifest_source = sources
            .get(&publishing.manifest_source)
            .cloned()
            .with_context(|| {
                format!("unknown manifest source {}", publishing.manifest_source)
            })?;
        let manifest_target = match &publishing.manifest_target {
            Some(id) => sources
                .get(id)
                .cloned()
                .with_context(|| format!("unknown manifest target {}", id))?,
            None => Arc::clone(&manifest_source),
        };

        let mut targets = Vec::with_capacity(publishing.targets.len());
        for t in &publishing.targets {
            let mut target = self
                .registry
                .new_publishing_target(&t.target_type)
                .with_context(|| format!("invalid publishing target {}", t.target_type))?;
            target
                .set_credentials(creds)
                .with_context(|| format!("cannot set credentials for {}", t.target_type))?;
            target
                .set_target_config(&t.config)
                .with_context(|| format!("cannot set target configuration for {}", t.target_type))?;
            targets.push(Arc::from(target));
        }

        let ocm_type = &publishing.ocm.ocm_type;
        let mut ocm_target = self
            .registry
            .new_ocm_target(ocm_type)
            .with_context(|| format!("invalid OCM target {}", ocm_type))?;
        ocm_target
            .set_credentials(creds)
            .with_context(|| format!("cannot set credentials for {}", ocm_type))?;
        ocm_target
            .set_ocm_config(&publishing.ocm.config)
            .with_context(|| format!("cannot set OCM configuration for {}", ocm_type))?;

        Ok(Providers {
            manifest_source,
            manifest_target,
            sources,
            targets,
            ocm_target,
        })
    }
}

/// Match flavors to targets and fetch and validate their manifests
///
/// Returns the publications in flavor order, then target order, together with
/// the full commit taken from the manifests.
pub async fn collect_publications(
    providers: &Providers,
    flavors: &FlavorsConfig,
    version: &str,
    commit: &str,
) -> Result<(Vec<Publication>, String)> {
    let mut commit = commit.to_string();
    let mut publications = Vec::with_capacity(flavors.flavors.len());

    for flavor in &flavors.flavors {
        for target in &providers.targets {
            if target.target_type() != flavor.platform {
                continue;
            }

            info!(cname = %flavor.cname, platform = %flavor.platform, "Retrieving manifest");
            let manifest = providers
                .manifest_source
                .get_manifest(&manifest_key(&flavor.cname, version, &commit))
                .await
                .with_context(|| format!("cannot get manifest for {}", flavor.cname))?;
            if manifest.version != version {
                anyhow::bail!(
                    "manifest for {} has incorrect version {}",
                    flavor.cname,
                    manifest.version
                );
            }
            if !manifest.matches_commit(&commit) {
                anyhow::bail!(
                    "manifest for {} has incorrect commit {}",
                    flavor.cname,
                    manifest.build_committish
                );
            }
            commit = manifest.build_committish.clone();

            publications.push(Publication {
                cname: flavor.cname.clone(),
                manifest,
                target: Arc::clone(target),
                output: None,
            });
        }
    }

    Ok((publications, commit))
}
