//! bibingest - load publisher metadata exports into a metadata API.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use bibingest::api::MetadataApi;
use bibingest::api::graphql::{GraphQlClient, GraphQlConfig};
use bibingest::api::memory::MemoryApi;
use bibingest::config::Config;
use bibingest::loaders::{self, LoaderKind};
use bibingest::pipeline::{Pipeline, PipelineOptions};
use bibingest::report::RunReport;
use bibingest::resolver::{DoiResolver, HttpResolver, NoResolver};

#[derive(Parser)]
#[command(name = "bibingest")]
#[command(about = "Load publisher metadata exports into a metadata API")]
#[command(version)]
struct Cli {
    /// Input file
    #[arg(long)]
    file: PathBuf,

    /// Publisher layout of the input file
    #[arg(long, value_enum)]
    mode: LoaderKind,

    /// API base URL (default: https://api.thoth.pub)
    #[arg(long)]
    client_url: Option<String>,

    /// Account email for the API
    #[arg(long)]
    email: Option<String>,

    /// Account password for the API
    #[arg(long)]
    password: Option<String>,

    /// Config file path (default: ./bibingest.toml or the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load into an in-memory API and print what would be sent
    #[arg(long)]
    dry_run: bool,

    /// Never resolve DOIs over the network
    #[arg(long)]
    offline: bool,

    /// Stop at the first failed record
    #[arg(long)]
    fail_fast: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bibingest::logging::init_logging(cli.quiet, cli.debug);

    let config = Config::load(cli.config.as_deref())?;
    let mut options = config.pipeline_options();
    options.fail_fast |= cli.fail_fast;

    let report = if cli.dry_run {
        let (report, api) = with_resolver(MemoryApi::new(), &cli, &config, options)?;
        for call in api.mutations() {
            log::info!("{}: {}", call.method, call.payload);
        }
        report
    } else {
        let url = cli.client_url.clone().unwrap_or_else(|| config.api.url.clone());
        let mut client = GraphQlClient::new(GraphQlConfig {
            url,
            ..GraphQlConfig::default()
        })?;
        let email = cli.email.as_ref().or(config.api.email.as_ref());
        let password = cli.password.as_ref().or(config.api.password.as_ref());
        let (Some(email), Some(password)) = (email, password) else {
            bail!("--email and --password are required unless --dry-run is given");
        };
        client.login(email, password).context("failed to log in")?;
        with_resolver(client, &cli, &config, options)?.0
    };

    for id in report.touched_works() {
        println!("{id}");
    }
    print!("{report}");
    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn with_resolver<A: MetadataApi>(
    api: A,
    cli: &Cli,
    config: &Config,
    options: PipelineOptions,
) -> Result<(RunReport, A)> {
    if cli.offline || !config.resolver.enabled {
        return execute(api, NoResolver, cli, options);
    }
    let resolver = HttpResolver::new(
        config.resolver.timeout(),
        config.resolver.max_retries,
        config.resolver.retry_delay(),
    )?;
    execute(api, resolver, cli, options)
}

fn execute<A: MetadataApi, R: DoiResolver>(
    api: A,
    resolver: R,
    cli: &Cli,
    options: PipelineOptions,
) -> Result<(RunReport, A)> {
    let mut pipeline =
        Pipeline::new(api, resolver, options).context("failed to read the API's existing records")?;
    let report = loaders::run(cli.mode, &mut pipeline, &cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    Ok((report, pipeline.into_api()))
}
