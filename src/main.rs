use anyhow::{Context, Result};
use attack_report_tools::commands;
use attack_report_tools::config::{ReportConfig, DEFAULT_CONFIG_FILE};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attack-report")]
#[command(about = "Monthly DDoS attack and activation reports", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Directory overrides shared by the report commands.
#[derive(Args)]
struct Directories {
    /// Directory holding the CSV exports and the alert log
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory the workbook is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Directories {
    fn apply(self, config: &mut ReportConfig) {
        if let Some(dir) = self.input_dir {
            config.general.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.general.output_dir = dir;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Attacks per device over the last completed months
    ///
    /// Reads one CSV export per month and writes
    /// attacks_count_pd_mm_yyyy.xlsx with a Total and a Filtered sheet.
    AttacksCount {
        /// Month the report is run in (MM-YYYY); the window ends one month earlier
        #[arg(long)]
        month: Option<String>,

        /// Number of months in the window
        #[arg(long)]
        months: Option<u32>,

        #[command(flatten)]
        dirs: Directories,
    },

    /// Alert-log activations of one month with attack details
    ///
    /// Writes activations_report_mm_yyyy.xlsx with a Detail and a Summary sheet.
    Activations {
        /// Report month (MM-YYYY)
        #[arg(long)]
        month: Option<String>,

        /// Activation text a log line must contain (case-sensitive)
        #[arg(long)]
        activation: Option<String>,

        /// Alert log file (.gz and .zst accepted); defaults to <input-dir>/alert.txt
        #[arg(long)]
        log: Option<PathBuf>,

        #[command(flatten)]
        dirs: Directories,
    },

    /// Generate shell completion script
    ///
    /// Install completions:
    ///   bash: attack-report generate-completion bash > ~/.local/share/bash-completion/completions/attack-report
    ///   zsh:  attack-report generate-completion zsh > ~/.zfunc/_attack-report
    ///   fish: attack-report generate-completion fish > ~/.config/fish/completions/attack-report.fish
    GenerateCompletion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(LevelFilter::Error);
    } else if verbose > 0 {
        let level = if verbose >= 2 {
            LevelFilter::Trace
        } else {
            LevelFilter::Debug
        };
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::GenerateCompletion { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "attack-report", &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet);
    let mut config = ReportConfig::load(&cli.config)?;

    match cli.command {
        Commands::AttacksCount {
            month,
            months,
            dirs,
        } => {
            if month.is_some() {
                config.general.cur_month = month;
            }
            if let Some(months) = months {
                config.general.window_months = months;
            }
            dirs.apply(&mut config);
            commands::attacks_count::run(&config)?;
        }
        Commands::Activations {
            month,
            activation,
            log,
            dirs,
        } => {
            if month.is_some() {
                config.general.cur_month = month;
            }
            if activation.is_some() {
                config.general.activation_str = activation;
            }
            if let Some(log) = log {
                // relative to the working directory, not to input_dir
                config.general.alert_log = std::env::current_dir()
                    .context("Failed to resolve working directory")?
                    .join(log);
            }
            dirs.apply(&mut config);
            commands::activations::run(&config)?;
        }
        Commands::GenerateCompletion { .. } => {}
    }

    Ok(())
}
