// Command-line entry point for gccxml-dump.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gccxml_dump::application::DumpUsecase;
use gccxml_dump::infrastructure::{DumpConfig, MemoryAst};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// AST document (JSON) produced by the front end
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Qualified name to start from, e.g. `ns::Class` (repeatable, comma separated)
    #[arg(long = "start", value_name = "NAME")]
    start: Vec<String>,

    /// TOML file with default options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also emit CvQualifiedType elements for qualified type references
    #[arg(long)]
    cv_qualified_elements: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DumpConfig::load(path)?,
        None => DumpConfig::default(),
    };
    let options = config.into_options(&cli.start, cli.cv_qualified_elements);

    let ast = MemoryAst::load(&cli.input)?;
    info!(
        decls = ast.decl_count(),
        types = ast.type_count(),
        "Loaded AST from {}",
        cli.input.display()
    );

    let usecase = DumpUsecase {
        provider: &ast,
        options: &options,
    };

    let summary = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file {}", path.display()))?;
            usecase.run(BufWriter::new(file))
        }
        None => usecase.run(BufWriter::new(io::stdout().lock())),
    }
    .context("Failed to write dump")?;

    info!(
        ids = summary.node_ids,
        complete = summary.complete_elements,
        incomplete = summary.incomplete_elements,
        files = summary.files,
        "Dump completed"
    );
    Ok(())
}
