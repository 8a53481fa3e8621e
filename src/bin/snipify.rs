use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use snipify::app::{App, Destination, ListResult, PackResult};
use snipify::assemble::{AssembleOptions, MetadataSource};
use snipify::config::ConfigLoader;
use snipify::console::{ConsoleProgress, confirm};
use snipify::error::SnipError;
use snipify::git::SystemGit;
use snipify::metadata::Miscellaneous;
use snipify::output::{JsonOutput, OutputMode};
use snipify::snip::ReplacePolicy;
use snipify::template::QcTemplate;

#[derive(Parser)]
#[command(name = "snipify")]
#[command(about = "Convert instrument data dumps into the snip format")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Package every run in a raw data directory as a snip")]
    Pack(PackArgs),
    #[command(about = "List packaged snips")]
    List(ListArgs),
}

#[derive(Args)]
struct PackArgs {
    raw_data_dir: Utf8PathBuf,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,

    #[arg(long)]
    replace_existing: bool,

    /// Package runs whose .iqs file is empty instead of skipping them.
    #[arg(long)]
    keep_empty: bool,

    /// JSON metadata attached to every snip.
    #[arg(long, conflicts_with = "qc_template")]
    metadata: Option<Utf8PathBuf>,

    /// Component QC template used to validate the directory and derive metadata.
    #[arg(long)]
    qc_template: Option<Utf8PathBuf>,

    /// Package here instead of into the private assets.
    #[arg(long)]
    destination: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    destination: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<SnipError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SnipError) -> u8 {
    match error {
        SnipError::ConflictingMetadataSource
        | SnipError::MissingTemplateMember(_)
        | SnipError::ConfigRead(_)
        | SnipError::ConfigParse(_)
        | SnipError::TemplateRead(_)
        | SnipError::TemplateParse(_)
        | SnipError::InvalidTemplate(_)
        | SnipError::MetadataRead(_)
        | SnipError::MetadataParse(_)
        | SnipError::MissingAssetsUrl => 2,
        SnipError::Git(_) | SnipError::MissingTool(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let app = App::new(config, SystemGit::new());

    match cli.command {
        Commands::Pack(args) => run_pack(args, &app, output_mode),
        Commands::List(args) => run_list(args, &app, output_mode),
    }
}

fn run_pack(args: PackArgs, app: &App<SystemGit>, output_mode: OutputMode) -> miette::Result<()> {
    let metadata = args
        .metadata
        .as_deref()
        .map(Miscellaneous::load)
        .transpose()?;
    let template = args
        .qc_template
        .as_deref()
        .map(QcTemplate::load)
        .transpose()?;
    let source = MetadataSource::from_parts(metadata, template)?;
    let options = AssembleOptions {
        skip_empty: !args.keep_empty,
    };
    let destination = match args.destination {
        Some(dir) => Destination::Root(dir),
        None => Destination::PrivateAssets,
    };
    let policy = ReplacePolicy::from(args.replace_existing);

    match output_mode {
        OutputMode::NonInteractive => {
            let discovery = app.discover(&args.raw_data_dir, &source, options, &JsonOutput)?;
            let result = app.pack(discovery, &destination, policy, &JsonOutput)?;
            JsonOutput::print_pack(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let discovery =
                app.discover(&args.raw_data_dir, &source, options, &ConsoleProgress)?;
            println!("Found {} entries to snipify", discovery.ready.len());
            if !args.yes && !confirm("Continue?")? {
                return Ok(());
            }
            let result = app.pack(discovery, &destination, policy, &ConsoleProgress)?;
            print_pack_summary(&result);
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, app: &App<SystemGit>, output_mode: OutputMode) -> miette::Result<()> {
    let destination = match args.destination {
        Some(dir) => Destination::Root(dir),
        None => Destination::PrivateAssets,
    };
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.list(&destination, &JsonOutput)?;
            JsonOutput::print_list(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let result = app.list(&destination, &ConsoleProgress)?;
            print_list(&result);
        }
    }
    Ok(())
}

fn print_pack_summary(result: &PackResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}snipify summary ({}){reset}", result.destination);
    println!("{green}packaged: {}{reset}", result.packaged.len());
    println!("{yellow}skipped: {}{reset}", result.skipped.len());
    println!("{red}failed: {}{reset}", result.failed.len());

    for item in &result.packaged {
        println!("{green}  + {}{reset}", item.snip_path);
    }
    for item in &result.skipped {
        println!("{yellow}  - {} ({}){reset}", item.file, item.reason);
    }
    for item in &result.failed {
        println!("{red}  ! {}: {}{reset}", item.source, item.error);
    }
}

fn print_list(result: &ListResult) {
    println!("{} snips in {}", result.snips.len(), result.destination);
    for snip in &result.snips {
        let recorded = snip.recorded_at.as_deref().unwrap_or("-");
        let metadata = if snip.has_metadata { "metadata" } else { "no metadata" };
        println!("  {:<40} {recorded:<20} {metadata}", snip.name);
    }
}
