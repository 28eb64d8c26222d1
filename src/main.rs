//! cyclefeed - interleave files from several directories by repeating cycles.
//!
//! Each source is a directory paired with a cycle such as `2-1-3`. Rounds visit
//! the sources in the order given; in every round a source contributes as many
//! entries as the next number of its cycle says, until a round contributes
//! nothing at all. Entries are printed as they are drawn and can be played
//! back one after another with `--play`.

use clap::{Args, CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use cyclefeed::config::{Config, SETTABLE_KEYS};
use cyclefeed::utils::logging::init_logging;
use owo_colors::OwoColorize;
use std::error::Error;
use std::io;

mod cli;

use cli::run::{RunOptions, SourceOptions};

#[derive(Parser)]
#[command(name = "cyclefeed")]
#[command(about = "Interleave files from several directories by repeating per-source cycles")]
#[command(version)]
struct Cli {
    /// Show info-level log messages on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source directory and its cycle, e.g. --source ~/music/a 2-1-3 (repeatable)
    #[arg(long = "source", value_names = ["PATH", "CYCLE"], num_args = 2)]
    sources: Vec<String>,
    /// Walk sub-directories and draw files from the whole tree
    #[arg(short, long)]
    recursive: bool,
    /// Only draw files with an audio extension
    #[arg(short, long)]
    audio_only: bool,
    /// Ignore entries whose name starts with '.'
    #[arg(long)]
    skip_hidden: bool,
}

impl SourceArgs {
    fn into_options(self) -> SourceOptions {
        SourceOptions {
            sources: self
                .sources
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
            recursive: self.recursive,
            audio_only: self.audio_only,
            skip_hidden: self.skip_hidden,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Draw every source in cyclic round-robin order until all are exhausted
    Run {
        #[command(flatten)]
        sources: SourceArgs,
        /// Play each drawn file before drawing the next
        #[arg(short, long)]
        play: bool,
        /// Print one JSON object per drawn entry and a final summary
        #[arg(long)]
        json: bool,
        /// Log failed entries and continue instead of stopping the run
        #[arg(short, long)]
        keep_going: bool,
    },
    /// Show how many entries each source contributes per round, without drawing
    Plan {
        #[command(flatten)]
        sources: SourceArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default configuration file
    Init,
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(SETTABLE_KEYS.iter().copied()))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn setup_logging(verbose: bool) {
    // A broken config is reported by the command itself
    let log_file = Config::load()
        .map(|c| c.log_file_path())
        .unwrap_or_else(|_| Config::new().log_file_path());

    if let Err(e) = init_logging(&log_file, verbose) {
        eprintln!(
            "{} could not open log file {}: {e}",
            "Warning:".yellow(),
            log_file.display()
        );
    }
}

fn dispatch(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Run {
            sources,
            play,
            json,
            keep_going,
        } => {
            cli::run::handle_run(&RunOptions {
                sources: sources.into_options(),
                play,
                json,
                keep_going,
            })?;
        }
        Commands::Plan { sources, json } => {
            cli::run::handle_plan(&sources.into_options(), json)?;
        }
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Run { .. } | Commands::Plan { .. }) {
        setup_logging(cli.verbose);
    }

    if let Err(e) = dispatch(cli.command) {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
