use anyhow::{Context, Result};
use clap::Parser;
use sheetc::backend::BackendKind;
use sheetc::compile::Compilation;
use sheetc::config::{Config, DEFAULT_NAMESPACE, Output, parse_audience};
use sheetc::constraint::Visibility;
use sheetc::sheet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Compile typed spreadsheet sheets into data documents and C# bindings
#[derive(Parser, Debug)]
#[command(name = "sheetc", version, about)]
struct Cli {
    /// Sheet directory or single sheet file (.csv or .json workbook)
    #[arg(short, long, env = "SHEETC_INPUT", default_value = "./sheets")]
    input: PathBuf,

    /// Write JSON data documents to this directory
    #[arg(long, value_name = "DIR")]
    json: Option<PathBuf>,

    /// Write C# bindings to this directory
    #[arg(long, value_name = "DIR")]
    csharp: Option<PathBuf>,

    /// Emit fields for this audience: S (server) or C (client)
    #[arg(short, long, default_value = "S", value_parser = parse_audience)]
    audience: Visibility,

    /// Namespace of generated C# code
    #[arg(long, env = "SHEETC_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Exit with a failure status when any diagnostic was reported
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut outputs = Vec::new();
        if let Some(dir) = self.json {
            outputs.push(Output {
                kind: BackendKind::Json,
                dir,
            });
        }
        if let Some(dir) = self.csharp {
            outputs.push(Output {
                kind: BackendKind::CSharp,
                dir,
            });
        }
        Config {
            input: self.input,
            audience: self.audience,
            outputs,
            namespace: self.namespace,
            strict: self.strict,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sheetc=debug" } else { "sheetc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(config: &Config) -> Result<ExitCode> {
    if config.outputs.is_empty() {
        tracing::warn!("No output selected, pass --json and/or --csharp");
    }

    let loaded = sheet::load_all(&config.input)
        .with_context(|| format!("Failed to read sheets from {}", config.input.display()))?;
    tracing::info!("Loaded {} sheets", loaded.sheets.len());

    let mut compilation = Compilation::from_loaded(loaded);

    for output in &config.outputs {
        fs::create_dir_all(&output.dir)
            .with_context(|| format!("Failed to create {}", output.dir.display()))?;

        let backend = output.kind.backend(config);
        for artifact in compilation.emit(backend.as_ref(), config) {
            let path = output.dir.join(&artifact.file_name);
            fs::write(&path, &artifact.contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
    }

    let count = compilation.diagnostics.len();
    if count == 0 {
        tracing::info!("Done, no problems found");
        return Ok(ExitCode::SUCCESS);
    }

    tracing::warn!("Done with {count} problem(s)");
    if config.strict {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.into_config();

    match run(&config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
