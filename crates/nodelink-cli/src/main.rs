//! NodeLink CLI
//!
//! Operator interface for a NodeLink SQLite store: create, inspect, update
//! and delete documents with their parent/child references kept mirrored.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use nodelink_core::errors::ExError;
use nodelink_core::logging_facility::{self, Profile};
use nodelink_core::nodelink_core_types::{RequestContext, TraceId};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "nodelink")]
#[command(about = "NodeLink - parent/child reference integrity for document collections", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = ".nodelink/store.db")]
    db: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip unresolvable neighbors instead of failing
    #[arg(long, global = true)]
    best_effort: bool,

    /// Trace id to correlate this run with a caller's logs
    #[arg(long, global = true)]
    trace_id: Option<String>,

    /// Log format and level
    #[arg(long, global = true, value_enum, default_value_t = LogProfile::Dev)]
    log: LogProfile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogProfile {
    Dev,
    Prod,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a document and attach it to its neighbors
    Put(commands::put::PutArgs),
    /// Print a document, optionally expanded
    Show(commands::show::ShowArgs),
    /// Patch a document and reconcile changed references
    Update(commands::update::UpdateArgs),
    /// Detach and delete a document, optionally with its subtree
    Delete(commands::delete::DeleteArgs),
    /// Check that every reference of a document resolves
    Validate(commands::validate::ValidateArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Put(_) => "put",
            Commands::Show(_) => "show",
            Commands::Update(_) => "update",
            Commands::Delete(_) => "delete",
            Commands::Validate(_) => "validate",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(match cli.log {
        LogProfile::Dev => Profile::Development,
        LogProfile::Prod => Profile::Production,
    });

    let mut request = RequestContext::new();
    if let Some(trace_id) = cli.trace_id.clone() {
        request = request.with_trace_id(TraceId::from_string(trace_id));
    }
    let op = cli.command.name();
    let span = tracing::info_span!(
        "cli",
        request_id = %request.request_id,
        trace_id = request.trace_id.as_ref().map(TraceId::as_str),
        command = op
    );
    let _entered = span.enter();

    let result = commands::Context::open(&cli.db, cli.config.as_deref(), cli.best_effort)
        .and_then(|ctx| match cli.command {
            Commands::Put(args) => commands::put::execute(&ctx, args),
            Commands::Show(args) => commands::show::execute(&ctx, args),
            Commands::Update(args) => commands::update::execute(&ctx, args),
            Commands::Delete(args) => commands::delete::execute(&ctx, args),
            Commands::Validate(args) => commands::validate::execute(&ctx, args),
        });

    if let Err(e) = result {
        let mut ex: ExError = e.into();
        ex = ex.with_op(op).with_request_id(request.request_id);
        if let Some(trace_id) = request.trace_id {
            ex = ex.with_trace_id(trace_id);
        }
        eprintln!("Error: {}", ex);
        std::process::exit(1);
    }
}
