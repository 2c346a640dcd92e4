//! sgclean: cleaning tools for Visual-Genome-style scene-graph annotations.
//!
//! A dataset is a JSON list of per-image annotations (objects with boxes and
//! labels, relationships between them, and derived label triplets). sgclean
//! normalizes labels and predicates, resolves sport-context conflicts
//! between co-occurring labels, collapses duplicate field objects, removes
//! mislabelled balls, and keeps relationships and triplets consistent after
//! every change.
//!
//! # Modules
//!
//! - [`graph`]: scene-graph model, box geometry and the JSON document adapter
//! - [`rules`]: rule tables, label normalizer and sport-context classifier
//! - [`resolve`]: per-image passes and the change report
//! - [`pipeline`]: runs a tool over a whole document
//! - [`error`]: error types for sgclean operations

pub mod error;
pub mod graph;
pub mod pipeline;
pub mod resolve;
pub mod rules;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::SgcleanError;
use pipeline::Tool;
use resolve::{
    CleanReport, FieldPolicy, ResolveOptions, SoccerDominantStrategy, DEFAULT_IOU_CONFLICT,
    DEFAULT_IOU_DUP,
};
use rules::Ruleset;

/// The sgclean CLI application.
#[derive(Parser)]
#[command(name = "sgclean")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Normalize object labels and predicates; drop implausible relationships.
    Standardize(IoArgs),
    /// Resolve soccer/baseball/tennis field conflicts.
    Harmonize(HarmonizeArgs),
    /// Keep one object per field label.
    DropExtraFields(DropExtraFieldsArgs),
    /// Remove soccer balls from baseball/tennis scenes.
    FilterMislabel(FilterMislabelArgs),
    /// Run standardize and every resolver pass in order.
    Clean(CleanArgs),
    /// Remove images that have no relationships.
    DropEmpty(IoArgs),
}

/// Input/output arguments shared by every subcommand.
#[derive(clap::Args)]
struct IoArgs {
    /// Input JSON (flat list or {"annotations": [...]}).
    #[arg(long)]
    infile: PathBuf,

    /// Output JSON; written only if the run succeeds.
    #[arg(long)]
    outfile: PathBuf,

    /// Rule tables (YAML or JSON) overriding the built-in defaults.
    #[arg(long, env = "SGCLEAN_RULES")]
    rules: Option<PathBuf>,

    /// Summary format printed to stdout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct HarmonizeOpts {
    /// What to do with baseball items in soccer-dominant images.
    #[arg(long, value_enum, default_value_t = StrategyArg::Drop)]
    strategy: StrategyArg,

    /// Also re-derive predicates from the final labels.
    #[arg(long)]
    also_fix_predicates: bool,
}

#[derive(clap::Args)]
struct FieldOpts {
    /// Which duplicate field object survives.
    #[arg(long, value_enum, default_value_t = PolicyArg::LargestArea)]
    policy: PolicyArg,

    /// Comma-separated field labels to collapse (defaults to the rule tables').
    #[arg(long, value_delimiter = ',')]
    field_labels: Option<Vec<String>>,
}

#[derive(clap::Args)]
struct MislabelOpts {
    /// IoU at which two soccer balls are duplicates.
    #[arg(long, default_value_t = DEFAULT_IOU_DUP)]
    iou_dup: f64,

    /// IoU at which a soccer ball conflicts with a baseball ball.
    #[arg(long, default_value_t = DEFAULT_IOU_CONFLICT)]
    iou_conflict: f64,

    /// Only drop soccer balls that overlap a baseball ball.
    #[arg(long)]
    require_overlap: bool,
}

#[derive(clap::Args)]
struct HarmonizeArgs {
    #[command(flatten)]
    io: IoArgs,
    #[command(flatten)]
    harmonize: HarmonizeOpts,
}

#[derive(clap::Args)]
struct DropExtraFieldsArgs {
    #[command(flatten)]
    io: IoArgs,
    #[command(flatten)]
    fields: FieldOpts,
}

#[derive(clap::Args)]
struct FilterMislabelArgs {
    #[command(flatten)]
    io: IoArgs,
    #[command(flatten)]
    mislabel: MislabelOpts,
}

#[derive(clap::Args)]
struct CleanArgs {
    #[command(flatten)]
    io: IoArgs,
    #[command(flatten)]
    harmonize: HarmonizeOpts,
    #[command(flatten)]
    fields: FieldOpts,
    #[command(flatten)]
    mislabel: MislabelOpts,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// CLI mirror of [`SoccerDominantStrategy`].
#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Drop,
    Relabel,
}

/// CLI mirror of [`FieldPolicy`].
#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    LargestArea,
    LowestY,
}

impl From<StrategyArg> for SoccerDominantStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Drop => SoccerDominantStrategy::Drop,
            StrategyArg::Relabel => SoccerDominantStrategy::Relabel,
        }
    }
}

impl From<PolicyArg> for FieldPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LargestArea => FieldPolicy::LargestArea,
            PolicyArg::LowestY => FieldPolicy::LowestY,
        }
    }
}

impl HarmonizeOpts {
    fn apply(self, opts: &mut ResolveOptions) {
        opts.strategy = self.strategy.into();
        opts.fix_predicates = self.also_fix_predicates;
    }
}

impl FieldOpts {
    fn apply(self, opts: &mut ResolveOptions) {
        opts.field_policy = self.policy.into();
        opts.field_labels = self.field_labels;
    }
}

impl MislabelOpts {
    fn apply(self, opts: &mut ResolveOptions) {
        opts.iou_dup = self.iou_dup;
        opts.iou_conflict = self.iou_conflict;
        opts.require_overlap = self.require_overlap;
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Run the sgclean CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SgcleanError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut opts = ResolveOptions::default();
    let (tool, io) = match cli.command {
        Some(Commands::Standardize(io)) => (Tool::Standardize, io),
        Some(Commands::Harmonize(args)) => {
            args.harmonize.apply(&mut opts);
            (Tool::Harmonize, args.io)
        }
        Some(Commands::DropExtraFields(args)) => {
            args.fields.apply(&mut opts);
            (Tool::DropExtraFields, args.io)
        }
        Some(Commands::FilterMislabel(args)) => {
            args.mislabel.apply(&mut opts);
            (Tool::FilterMislabel, args.io)
        }
        Some(Commands::Clean(args)) => {
            args.harmonize.apply(&mut opts);
            args.fields.apply(&mut opts);
            args.mislabel.apply(&mut opts);
            (Tool::Clean, args.io)
        }
        Some(Commands::DropEmpty(io)) => (Tool::DropEmpty, io),
        None => {
            println!("sgclean {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Cleaning tools for scene-graph annotations.");
            println!();
            println!("Run 'sgclean --help' for usage information.");
            return Ok(());
        }
    };

    let rules = Ruleset::load(io.rules.as_deref())?;
    let report = pipeline::run_file(&io.infile, &io.outfile, tool, &rules, &opts)?;
    print_report(&report, io.report, &io.outfile)
}

fn print_report(
    report: &CleanReport,
    format: ReportFormat,
    outfile: &std::path::Path,
) -> Result<(), SgcleanError> {
    match format {
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).map_err(|source| SgcleanError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
            println!("{}", json);
        }
        ReportFormat::Text => {
            print!("{}", report);
            println!("Wrote {}", outfile.display());
        }
    }
    Ok(())
}
