use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use iscsi_conf::{Model, ValidationError, read_document, synthesize_value};

#[derive(Parser, Debug)]
#[command(name = "iscsi-conf")]
#[command(about = "Validate and normalize iSCSI gateway configuration")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print the resulting document
    #[arg(long, global = true)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a persisted configuration document
    Parse {
        /// Path to the JSON document
        file: PathBuf,

        /// Skip the portal/target cross-reference check
        #[arg(long)]
        no_reference_check: bool,
    },
    /// Build a configuration document from saved UI state
    Synthesize {
        /// Path to the JSON array of UI targets
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so the document on stdout stays machine-readable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let result = match &args.command {
        Command::Parse {
            file,
            no_reference_check,
        } => {
            info!("Parsing configuration from {}", file.display());
            let document = read_document(file)?;
            iscsi_conf::Parser::new()
                .with_reference_check(!no_reference_check)
                .parse(&document)
        }
        Command::Synthesize { file } => {
            info!("Synthesizing configuration from {}", file.display());
            let ui_state = read_document(file)?;
            synthesize_value(&ui_state)
        }
    };

    match result {
        Ok(model) => {
            print_model(&model, args.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_model(model: &Model, pretty: bool) -> Result<(), serde_json::Error> {
    let document = model.to_document()?;
    let output = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{}", output);
    Ok(())
}

fn report(e: &ValidationError) {
    for failure in e.failures() {
        error!("{}", failure);
    }
    eprintln!("configuration rejected: {}", e);
}
