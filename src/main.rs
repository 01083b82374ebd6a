//! repotools - serve repository tools over stdin/stdout
//!
//! Each input line is a JSON request `{"tool": "...", "params": {...}}`.
//! Each response is the tool's text output followed by a line holding a
//! single ASCII record separator (0x1E).

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use repotools::config::loader::ConfigLoader;
use repotools::tools::{render_error, ToolRegistry, Toolbox};
use repotools::{Config, Error};

/// Terminates every response
const RECORD_SEPARATOR: &str = "\x1e";

/// Command line options
#[derive(Debug, Default)]
struct CliArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Project root override
    root: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Start the shell before reading requests
    eager_shell: bool,
}

impl CliArgs {
    /// Parse command line arguments
    fn parse() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut cli = CliArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    let path = args.get(i + 1).context("Missing config file path")?;
                    cli.config_path = Some(PathBuf::from(path));
                    i += 1;
                }
                "--root" | "-r" => {
                    let path = args.get(i + 1).context("Missing project root path")?;
                    cli.root = Some(PathBuf::from(path));
                    i += 1;
                }
                "--debug" | "-d" => {
                    cli.debug = true;
                }
                "--eager-shell" => {
                    cli.eager_shell = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("repotools v{}", repotools::VERSION);
                    process::exit(0);
                }
                arg => anyhow::bail!("Unknown option: {}", arg),
            }
            i += 1;
        }

        Ok(cli)
    }
}

/// Print help information
fn print_help() {
    println!("repotools - Safe, structured repository tools for coding agents");
    println!();
    println!("USAGE:");
    println!("    repotools [OPTIONS] < requests.jsonl");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -r, --root <PATH>      Project root (defaults to the current directory)");
    println!("    -d, --debug            Enable debug logging");
    println!("        --eager-shell      Start the shell session before the first request");
    println!("    -h, --help             Print this help message");
    println!("    -V, --version          Print version information");
    println!();
    println!("REQUESTS:");
    println!("    One JSON object per line: {{\"tool\": \"grep\", \"params\": {{\"query\": \"fn main\"}}}}");
    println!("    Tools: bash, grep, ls, tree, text_view, str_replace_edit,");
    println!("           str_replace_editor, str_replace_based_edit_tool");
    println!();
    println!("ENVIRONMENT:");
    println!("    REPOTOOLS_CONFIG      Path to configuration file");
    println!("    RUST_LOG              Set logging level (error, warn, info, debug, trace)");
}

/// One line of input
#[derive(Debug, Deserialize)]
struct Request {
    tool: String,
    #[serde(default)]
    params: serde_json::Value,
}

fn load_configuration(args: &CliArgs) -> anyhow::Result<Config> {
    let config = match &args.config_path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load()?,
    };
    let config = match &args.root {
        Some(root) => config.with_project_root(root),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

async fn serve(registry: &ToolRegistry) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!("Request for tool '{}'", request.tool);
                registry.dispatch(&request.tool, request.params).await
            }
            Err(e) => render_error(&Error::Other(format!("invalid request: {}", e))),
        };

        stdout.write_all(response.as_bytes()).await?;
        stdout
            .write_all(format!("\n{}\n", RECORD_SEPARATOR).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });

    // Logs go to stderr; stdout carries responses only
    let log_level = if args.debug { "repotools=debug" } else { "repotools=info" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    info!("Starting repotools v{}", repotools::VERSION);

    let config = load_configuration(&args).context("Failed to load configuration")?;
    let toolbox = Arc::new(Toolbox::new(&config).context("Failed to open project root")?);

    if args.eager_shell {
        if let Err(e) = toolbox.shell().session().await {
            error!("Shell startup failed: {}", e);
            return Err(e).context("Failed to start shell session");
        }
    }

    let registry = ToolRegistry::with_defaults(Arc::clone(&toolbox));
    let result = serve(&registry).await;

    toolbox.shutdown().await;
    info!("repotools stopped");
    result
}
