use anyhow::Result;
use clap::Parser;
use glci::{
    cli::{Cli, Commands, ReleaseArgs},
    config::{
        load_credentials, load_yaml, AliasesConfig, Config, Credentials, FlavorsConfig,
        PublishingConfig,
    },
    service::PublishService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Publish { release, aliases } => {
            let config = Config::load()?;
            let (flavors, publishing, creds) = load_release_inputs(&config, &release)?;
            let aliases: AliasesConfig = match aliases.or(config.aliases_file) {
                Some(path) => load_yaml(&path)?,
                None => AliasesConfig::new(),
            };

            PublishService::default()
                .publish(
                    &flavors,
                    &publishing,
                    &aliases,
                    &creds,
                    &release.version,
                    &release.commit,
                )
                .await?;
        }
        Commands::Remove { release } => {
            let config = Config::load()?;
            let (flavors, publishing, creds) = load_release_inputs(&config, &release)?;

            PublishService::default()
                .remove(
                    &flavors,
                    &publishing,
                    &creds,
                    &release.version,
                    &release.commit,
                )
                .await?;
        }
        Commands::Version => {
            println!("glci {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_release_inputs(
    config: &Config,
    release: &ReleaseArgs,
) -> Result<(FlavorsConfig, PublishingConfig, Credentials)> {
    let flavors_path = release.flavors.as_ref().unwrap_or(&config.flavors_file);
    let publishing_path = release
        .publishing
        .as_ref()
        .unwrap_or(&config.publishing_file);
    let credentials_path = release
        .credentials
        .as_ref()
        .or(config.credentials_file.as_ref());

    let flavors = load_yaml(flavors_path)?;
    let publishing = load_yaml(publishing_path)?;
    let creds = load_credentials(credentials_path.map(|p| p.as_path()))?;
    Ok((flavors, publishing, creds))
}
