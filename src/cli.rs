//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, CsvTriggerListAdapter};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::batch::{self, BatchReport};
use crate::domain::config_validation::{load_run_config, validate_strategy_id, RunConfig};
use crate::domain::error::PullbackError;
use crate::domain::params::{RunParams, TriggerParams};
use crate::ports::data_port::{DataPort, TriggerListPort};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "pullback", about = "MA5-support pullback trade simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan every symbol, simulate trades and write the result tables
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Bar data: one CSV file or a directory of CSV files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Manual trigger list (name, date, theme); switches to manual mode
        #[arg(short, long)]
        manual: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        strategy_id: Option<String>,
    },
    /// Validate a configuration file and show the resolved thresholds
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols in the input data with their date ranges
    ListSymbols {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the `[run]` section.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub manual_triggers: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub strategy_id: Option<String>,
}

impl Overrides {
    pub fn apply(self, mut run: RunConfig) -> Result<RunConfig, PullbackError> {
        if let Some(id) = self.strategy_id {
            validate_strategy_id(&id)?;
            run.strategy_id = id;
        }
        if self.input.is_some() {
            run.input = self.input;
        }
        if self.manual_triggers.is_some() {
            run.manual_triggers = self.manual_triggers;
        }
        if let Some(dir) = self.output_dir {
            run.output_dir = dir;
        }
        Ok(run)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            input,
            manual,
            output,
            strategy_id,
        } => run_simulation(
            config.as_ref(),
            Overrides {
                input,
                manual_triggers: manual,
                output_dir: output,
                strategy_id,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { input, config } => run_list_symbols(input, config.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Read `[run]` and `[trigger]` from `config_path`, or defaults when no file is given.
pub fn resolve_run_config(config_path: Option<&PathBuf>) -> Result<RunConfig, ExitCode> {
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    load_run_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_simulation(config_path: Option<&PathBuf>, overrides: Overrides) -> ExitCode {
    // Stage 1: Load and validate config
    let run_config = match resolve_run_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let run_config = match overrides.apply(run_config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let Some(input) = run_config.input.clone() else {
        eprintln!("error: no input configured (use --input or set [run] input)");
        return ExitCode::from(2);
    };

    // Stage 2: Manual trigger list
    let manual_triggers = match &run_config.manual_triggers {
        Some(path) => {
            eprintln!("Loading manual triggers from {}", path.display());
            match CsvTriggerListAdapter::new(path.clone()).load_triggers() {
                Ok(list) => {
                    eprintln!("  {} manual triggers", list.len());
                    Some(list)
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        }
        None => None,
    };

    let params = RunParams {
        trigger: run_config.trigger.clone(),
        manual_triggers,
        derive_entry_check: run_config.derive_entry_check,
    };

    // Stages 3-5: Scan, summarise, write
    eprintln!("Loading bars from {}", input.display());
    let data_port = CsvAdapter::new(input);
    let report_port = CsvReportAdapter::new(run_config.output_dir.clone());
    run_pipeline(&data_port, &report_port, &params, &run_config.strategy_id)
}

pub fn run_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    params: &RunParams,
    strategy_id: &str,
) -> ExitCode {
    // Stage 3: Run batch
    let mode = if params.manual_triggers.is_some() {
        "manual"
    } else {
        "auto"
    };
    eprintln!("Running {strategy_id} ({mode} mode)");
    let report = match batch::run(data_port, params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Console summary
    print_summary(&report);

    // Stage 5: Write tables
    match report_port.write(&report, strategy_id) {
        Ok(paths) => {
            eprintln!();
            for path in &paths {
                eprintln!("Written: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn print_summary(report: &BatchReport) {
    eprintln!("\n=== Batch Results ===");
    eprintln!("Symbols scanned:  {}", report.symbols_scanned);
    if !report.skipped.is_empty() {
        eprintln!("Symbols skipped:  {}", report.skipped.len());
        for s in &report.skipped {
            eprintln!("  {}: {}", s.code, s.reason);
        }
    }
    if !report.unmatched.is_empty() {
        eprintln!("Unmatched manual: {}", report.unmatched.len());
        for u in &report.unmatched {
            eprintln!("  {} {}: {}", u.name, u.date, u.reason);
        }
    }
    if report.duplicates_removed > 0 {
        eprintln!("Duplicates:       {}", report.duplicates_removed);
    }

    let Some(summaries) = &report.summaries else {
        eprintln!("No trades.");
        return;
    };

    let wins = report.trades.iter().filter(|t| t.is_win()).count();
    let total_return: f64 = report.trades.iter().map(|t| t.return_pct).sum();
    let verified: f64 = report.trades.iter().map(|t| t.verified_return).sum();
    eprintln!("Total Trades:     {}", report.trades.len());
    eprintln!(
        "Win / Loss:       {} / {} ({:.1}% win rate)",
        wins,
        report.trades.len() - wins,
        wins as f64 / report.trades.len() as f64 * 100.0
    );
    eprintln!("Return Sum:       {total_return:.2}%");
    eprintln!("Verified Sum:     {verified:.2}%");
    eprintln!("Max Win Streak:   {}", summaries.streaks.max_win);
    eprintln!("Max Loss Streak:  {}", summaries.streaks.max_loss);
    eprintln!("Max Held:         {}", summaries.max_held);
}

fn fmt_threshold(value: Option<f64>) -> String {
    value.map_or_else(|| "off".to_string(), |v| v.to_string())
}

pub fn describe_thresholds(params: &TriggerParams) -> Vec<(&'static str, String)> {
    vec![
        ("min_rate", fmt_threshold(params.min_rate)),
        ("max_rate", fmt_threshold(params.max_rate)),
        ("min_value", fmt_threshold(params.min_value)),
        ("max_value", fmt_threshold(params.max_value)),
        ("min_foreign", fmt_threshold(params.min_foreign)),
        ("min_institution", fmt_threshold(params.min_institution)),
    ]
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let run_config = match resolve_run_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("\nRun:");
    eprintln!("  strategy_id:        {}", run_config.strategy_id);
    eprintln!(
        "  input:              {}",
        run_config
            .input
            .as_ref()
            .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string())
    );
    if let Some(path) = &run_config.manual_triggers {
        eprintln!("  manual_triggers:    {}", path.display());
    }
    eprintln!("  output_dir:         {}", run_config.output_dir.display());
    eprintln!("  derive_entry_check: {}", run_config.derive_entry_check);

    eprintln!("\nTrigger thresholds:");
    for (key, value) in describe_thresholds(&run_config.trigger) {
        eprintln!("  {key:<16} {value}");
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(input: Option<PathBuf>, config_path: Option<&PathBuf>) -> ExitCode {
    let input = match input {
        Some(p) => p,
        None => match config_path {
            Some(_) => match resolve_run_config(config_path) {
                Ok(RunConfig { input: Some(p), .. }) => p,
                Ok(_) => {
                    eprintln!("error: config has no [run] input");
                    return ExitCode::from(2);
                }
                Err(code) => return code,
            },
            None => {
                eprintln!("error: --input or --config is required for list-symbols");
                return ExitCode::from(1);
            }
        },
    };

    let symbols = match CsvAdapter::new(input).list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for s in &symbols {
            println!(
                "{}\t{}\t{} bars\t{} to {}",
                s.code, s.name, s.bars, s.first_date, s.last_date
            );
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
