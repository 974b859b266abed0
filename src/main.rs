//! CLI entry point for `apireq`.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use colored::Colorize;
use dotenvy::dotenv;

use apireq::balance::{self, BalanceDisplay};
use apireq::combine::combine_api_requests;
use apireq::config::{self, Config};
use apireq::logging;
use apireq::message::{EntryKind, LogEntry};
use apireq::palette;
use apireq::usage;

mod utils;

#[derive(Parser, Debug)]
#[command(
    name = "apireq",
    author,
    version,
    about = "Combine API request records in chat transcripts",
    after_help = "Examples:\
    \\n   apireq combine transcript.json        # Merge request pairs, print JSON\
    \\n   apireq combine - < transcript.json    # Read from stdin\
    \\n   apireq summary transcript.json        # Total requests and cost\
    \\n   apireq balance openrouter key.json    # Show remaining credit"
)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Config profile name
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Merge api_req_started / api_req_finished pairs and print the result
    Combine(CombineArgs),
    /// Combine, then print request count and total cost
    Summary {
        /// Transcript JSON file (default: stdin)
        input: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a provider balance from saved key info
    Balance {
        /// Provider the key info came from
        #[arg(value_enum)]
        provider: Provider,
        /// Key info JSON file (default: stdin)
        input: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct CombineArgs {
    /// Transcript JSON file holding an array of entries (default: stdin)
    input: Option<PathBuf>,
    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Openrouter,
    Requesty,
}

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    logging::set_verbose(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logging::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.clone() {
        Commands::Combine(args) => {
            let config = load_config_from_cli(&cli)?;
            run_combine(&config, args)
        }
        Commands::Summary { input, json } => {
            let config = load_config_from_cli(&cli)?;
            run_summary(&config, input.as_deref(), json)
        }
        Commands::Balance { provider, input } => run_balance(provider, input.as_deref()),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn load_config_from_cli(cli: &Cli) -> Result<Config> {
    let profile = cli
        .profile
        .clone()
        .or_else(|| std::env::var("APIREQ_PROFILE").ok());
    if let Some(path) = config::resolved_config_path(cli.config.as_deref()) {
        logging::info(format!("Using config {}", path.display()));
    }
    Config::load(cli.config.clone(), profile.as_deref())
}

/// Generate shell completions for the given shell
fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn read_entries(input: Option<&Path>) -> Result<Vec<LogEntry>> {
    let source = input.map_or_else(|| "stdin".to_string(), |path| path.display().to_string());
    let text = utils::read_input(input)?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse transcript from {source}"))
}

fn read_combined(input: Option<&Path>) -> Result<Vec<LogEntry>> {
    let entries = read_entries(input)?;
    let combined = combine_api_requests(&entries)?;

    logging::info(format!(
        "Read {} entries, wrote {}",
        entries.len(),
        combined.len()
    ));
    let orphans = count_orphan_finishes(&entries);
    if orphans > 0 {
        logging::warn(format!(
            "{orphans} api_req_finished entries had no pending start and were dropped"
        ));
    }
    Ok(combined)
}

/// Finish records that arrive while no start is pending.
fn count_orphan_finishes(entries: &[LogEntry]) -> usize {
    let mut pending = 0usize;
    let mut orphans = 0usize;
    for entry in entries {
        match entry.kind() {
            EntryKind::RequestStarted => pending += 1,
            EntryKind::RequestFinished if pending > 0 => pending -= 1,
            EntryKind::RequestFinished => orphans += 1,
            EntryKind::Other => {}
        }
    }
    orphans
}

fn run_combine(config: &Config, args: CombineArgs) -> Result<()> {
    let combined = read_combined(args.input.as_deref())?;
    let rendered = utils::to_json(&combined, args.pretty || config.pretty())?;
    utils::write_output(args.output.as_deref(), &rendered)?;
    if let Some(path) = args.output.as_deref() {
        logging::success(format!("Wrote {}", path.display()));
    }
    Ok(())
}

fn run_summary(config: &Config, input: Option<&Path>, json: bool) -> Result<()> {
    let combined = read_combined(input)?;
    let summary = usage::summarize(&combined)?;

    if json {
        let rendered = utils::to_json(&summary, config.pretty())?;
        return utils::write_output(None, &rendered);
    }

    let (blue_r, blue_g, blue_b) = palette::BLUE_RGB;
    println!("{}", "API usage".truecolor(blue_r, blue_g, blue_b).bold());
    println!("  requests:   {}", summary.requests);
    println!("  completed:  {}", summary.completed);
    println!("  tokens in:  {}", summary.tokens_in);
    println!("  tokens out: {}", summary.tokens_out);
    println!("  cost:       {}", summary.display_cost(config.cost_decimals()));
    Ok(())
}

fn run_balance(provider: Provider, input: Option<&Path>) -> Result<()> {
    let text = utils::read_input(input)?;
    let display = match provider {
        Provider::Openrouter => {
            let info = balance::parse_openrouter_key_info(&text)?;
            balance::openrouter_balance(&info)
        }
        Provider::Requesty => {
            let info = balance::parse_requesty_key_info(&text)?;
            Some(balance::requesty_balance(&info)?)
        }
    };

    match display {
        Some(display) => print_balance(&display),
        None => logging::info("Key has no credit limit; nothing to show"),
    }
    Ok(())
}

fn print_balance(display: &BalanceDisplay) {
    let (muted_r, muted_g, muted_b) = palette::SILVER_RGB;
    println!(
        "{} {}",
        display.to_string().bold(),
        display.href.truecolor(muted_r, muted_g, muted_b)
    );
}
