//! `typed-hooks`: inspect contracts, build URLs and cache keys from the shell.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

/// Crates whose events the log filter applies to.
const LOG_TARGETS: [&str; 2] = ["typed_hooks", "typed_hooks_contract"];

#[derive(Parser)]
#[command(
    name = "typed-hooks",
    version,
    about = "Typed data-access hooks derived from an OpenAPI contract"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every endpoint and verb declared by a contract
    Endpoints(commands::endpoints::EndpointsArgs),
    /// Substitute path parameters into an endpoint template
    Url(commands::url::UrlArgs),
    /// Print the cache key of a read
    Key(commands::key::KeyArgs),
}

fn main() {
    init_tracing();
    std::process::exit(run_cli(std::env::args_os()));
}

fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Endpoints(args)) => commands::endpoints::run(args),
            Some(Commands::Url(args)) => commands::url::run(args),
            Some(Commands::Key(args)) => commands::key::run(args),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    let filter = log_filter(std::env::var("TYPED_HOOKS_LOG").ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

/// Filter directives for `TYPED_HOOKS_LOG`.
///
/// A plain level ("debug", "warn", ...) applies to this project's crates
/// only; anything else is used as a full filter spec. Unset means `warn`.
fn log_filter(value: Option<&str>) -> String {
    match value {
        Some(level) if is_plain_level(level) => LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(","),
        Some(spec) => spec.to_string(),
        None => log_filter(Some("warn")),
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
