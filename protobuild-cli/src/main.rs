mod config;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigSource;
use protobuild_core::CodegenError;
use protobuild_core::adapters::FixedStubProbe;
use protobuild_core::host::{Phase, StepDeps, StepList, register_steps};
use protobuild_core::pipeline::{require_compiler, source_files};
use protobuild_core::settings::CodegenSettings;
use protobuild_locate::SearchPath;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "protobuild",
    version,
    about = "Regenerate protobuf modules whose .proto sources changed.",
    after_help = "Progress lines such as \"creating [...] from a.proto\" are logged to stderr at \
                  info level. Set RUST_LOG=warn to keep only warnings and errors."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Args)]
struct GlobalArgs {
    /// Project root (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Read configuration from this file instead of discovering it.
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Use this compiler executable (overrides $PROTOC, the pinned version and PATH).
    #[arg(long, global = true)]
    protoc: Option<String>,

    /// Download this compiler release instead of the configured one.
    #[arg(long, global = true)]
    protoc_version: Option<String>,

    /// Where downloaded compiler releases are cached.
    #[arg(long, global = true)]
    cache_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the compiler for every schema whose outputs are missing or older.
    Build,
    /// Delete generated modules.
    Clean,
    /// Print the compiler that a build would use.
    Locate,
    /// List configured schema sources.
    Sources(ListArgs),
    /// List generated files declared by the configured schemas.
    Outputs(ListArgs),
}

#[derive(Debug, clap::Args)]
struct ListArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = real_main(cli) {
        error!("{}", e);
        return ExitCode::from(e.exit_code());
    }
    ExitCode::SUCCESS
}

fn real_main(cli: Cli) -> Result<(), CodegenError> {
    let settings = load_settings(&cli.global)?;
    match cli.cmd {
        Command::Build => cmd_build(&settings),
        Command::Clean => cmd_clean(&settings),
        Command::Locate => cmd_locate(&settings),
        Command::Sources(args) => cmd_sources(&settings, args),
        Command::Outputs(args) => cmd_outputs(&settings, args),
    }
}

fn load_settings(args: &GlobalArgs) -> anyhow::Result<CodegenSettings> {
    let project_root = &args.project_root;
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            let (config, source) = config::load_or_default(project_root)?;
            match source {
                ConfigSource::File(path) | ConfigSource::CargoMetadata(path) => {
                    debug!("loaded configuration from {}", path)
                }
                ConfigSource::Default => debug!("no configuration found; nothing to generate"),
            }
            config
        }
    };

    let mut settings = config.into_settings(project_root)?;
    settings.compiler_override = args.protoc.clone();
    if let Some(version) = &args.protoc_version {
        settings.pinned_version = Some(version.clone());
    }
    if let Some(dir) = &args.cache_dir {
        settings.install_root = Some(dir.clone());
    }
    Ok(settings.with_env_override())
}

fn steps() -> StepList {
    let mut host = StepList::new();
    register_steps(&mut host, StepDeps::default());
    host
}

fn cmd_build(settings: &CodegenSettings) -> Result<(), CodegenError> {
    if settings.schemas.is_empty() {
        info!("no schemas configured; nothing to build");
        return Ok(());
    }
    let produced = steps().run_phase(Phase::Build, settings)?;
    if produced.is_empty() {
        info!("all generated files are up to date");
    }
    Ok(())
}

fn cmd_clean(settings: &CodegenSettings) -> Result<(), CodegenError> {
    let removed = steps().run_phase(Phase::Clean, settings)?;
    for path in &removed {
        info!("removed {}", path);
    }
    Ok(())
}

fn cmd_locate(settings: &CodegenSettings) -> Result<(), CodegenError> {
    let locator = settings.locator(SearchPath::Env);
    let resolved = locator.resolve(
        settings.compiler_override.as_deref(),
        settings.pinned_version.as_deref(),
    )?;
    if let Some(found) = &resolved {
        debug!(source = %found.source, "resolved compiler");
    }
    let compiler = require_compiler(
        resolved.as_ref().map(|r| r.path.as_path()),
        locator.compiler_name(),
    )?;
    println!("{}", compiler);
    Ok(())
}

fn cmd_sources(settings: &CodegenSettings, args: ListArgs) -> Result<(), CodegenError> {
    let units = settings.units(&FixedStubProbe(false))?;
    let sources: Vec<String> = source_files(&units)
        .into_iter()
        .map(str::to_string)
        .collect();
    print_list(&sources, args.format)
}

fn cmd_outputs(settings: &CodegenSettings, args: ListArgs) -> Result<(), CodegenError> {
    let units = settings.units(&FixedStubProbe(false))?;
    let outputs: Vec<String> = units
        .iter()
        .flat_map(|u| u.outputs())
        .map(|p| p.to_string())
        .collect();
    print_list(&outputs, args.format)
}

fn print_list(items: &[String], format: OutputFormat) -> Result<(), CodegenError> {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
    }
    Ok(())
}
