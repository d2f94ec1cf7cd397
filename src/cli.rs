//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self, BacktestResult};
use crate::domain::config_validation::{RunSettings, load_settings};
use crate::domain::error::{EvalError, StratError};
use crate::domain::lexer::tokenize;
use crate::domain::ohlcv::{BarSeries, sample_series};
use crate::domain::rule::Strategy;
use crate::domain::rule_eval::{self, Signals};
use crate::domain::rule_parser::{self, ParserOptions};
use crate::domain::rule_struct::{self, RuleSet};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stratlang", about = "Trading rule compiler and signal evaluator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the token stream of a strategy file
    Tokens {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Parse a strategy file and print its AST and canonical form
    Compile {
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Evaluate a strategy and print per-bar entry/exit signals as CSV
    Signals {
        #[arg(short, long)]
        strategy: PathBuf,
        /// Bar data CSV; the built-in demo series when absent
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Evaluate a strategy and simulate long-only trades
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render structured JSON rules as strategy text
    Render {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Validate a run configuration and the strategy it names
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Tokens { strategy } => run_tokens(&strategy),
        Command::Compile {
            strategy,
            max_depth,
        } => run_compile(&strategy, max_depth),
        Command::Signals { strategy, data } => run_signals(&strategy, data.as_ref()),
        Command::Backtest {
            config,
            strategy,
            data,
            json,
        } => run_backtest(config.as_ref(), strategy.as_ref(), data.as_ref(), json),
        Command::Render { input } => run_render(&input),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: StratError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        (&StratError::from(e)).into()
    })
}

/// Compile DSL text, printing errors with a caret under the offending column.
pub fn compile_source(
    source: &str,
    path: &Path,
    options: ParserOptions,
) -> Result<Strategy, ExitCode> {
    rule_parser::parse_with(source, options).map_err(|e| {
        eprintln!("error in {}:", path.display());
        eprintln!("{}", e.display_with_context(source));
        (&StratError::from(e)).into()
    })
}

fn load_series(
    data: Option<&PathBuf>,
    settings: Option<&RunSettings>,
) -> Result<BarSeries, ExitCode> {
    let start = settings.and_then(|s| s.start_date);
    let end = settings.and_then(|s| s.end_date);
    match data {
        Some(path) => {
            eprintln!("Loading data from {}", path.display());
            CsvAdapter::new(path.clone())
                .fetch_series(start, end)
                .map_err(fail)
        }
        None => {
            eprintln!("No data file given, using demo series");
            Ok(sample_series())
        }
    }
}

fn evaluate(strategy: &Strategy, series: &BarSeries) -> Result<Signals, ExitCode> {
    rule_eval::evaluate(strategy, series).map_err(|e| fail(e.into()))
}

fn run_tokens(strategy_path: &Path) -> ExitCode {
    let source = match read_source(strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match tokenize(&source) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{token}");
            }
            eprintln!("{} tokens", tokens.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error in {}:", strategy_path.display());
            eprintln!("{}", e.display_with_context(&source));
            (&StratError::from(e)).into()
        }
    }
}

fn run_compile(strategy_path: &Path, max_depth: Option<usize>) -> ExitCode {
    let source = match read_source(strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut options = ParserOptions::default();
    if let Some(depth) = max_depth {
        options.max_depth = depth;
    }
    let strategy = match compile_source(&source, strategy_path, options) {
        Ok(s) => s,
        Err(code) => return code,
    };

    println!("{strategy:#?}");
    println!();
    print!("{strategy}");
    eprintln!(
        "Compiled {} entry rules, {} exit rules",
        strategy.entry.as_ref().map_or(0, |b| b.rules.len()),
        strategy.exit.as_ref().map_or(0, |b| b.rules.len())
    );
    ExitCode::SUCCESS
}

fn write_signals_csv(series: &BarSeries, signals: &Signals) -> Result<(), StratError> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    let io_err = |e: csv::Error| StratError::Io(std::io::Error::other(e));
    wtr.write_record(["bar", "date", "entry", "exit"])
        .map_err(io_err)?;
    for i in 0..signals.len() {
        let date = series.date(i).map(|d| d.to_string()).unwrap_or_default();
        wtr.write_record([
            i.to_string(),
            date,
            signals.entry[i].to_string(),
            signals.exit[i].to_string(),
        ])
        .map_err(io_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_signals(strategy_path: &Path, data: Option<&PathBuf>) -> ExitCode {
    let source = match read_source(strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let strategy = match compile_source(&source, strategy_path, ParserOptions::default()) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let series = match load_series(data, None) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let signals = match evaluate(&strategy, &series) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match write_signals_csv(&series, &signals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn print_result(result: &BacktestResult) {
    println!(
        "{:>6} {:>6} {:>12} {:>12} {:>12}",
        "entry", "exit", "entry_px", "exit_px", "pnl"
    );
    for t in &result.trades {
        println!(
            "{:>6} {:>6} {:>12.4} {:>12.4} {:>12.4}",
            t.entry_index, t.exit_index, t.entry_price, t.exit_price, t.pnl
        );
    }
    let s = &result.summary;
    println!();
    println!("Total PnL:  {:.4}", s.total_pnl);
    println!("Trades:     {}", s.num_trades);
    println!("Wins:       {}", s.wins);
    println!("Losses:     {}", s.losses);
    println!("Win rate:   {:.2}%", s.win_rate * 100.0);
}

fn run_backtest(
    config_path: Option<&PathBuf>,
    strategy_override: Option<&PathBuf>,
    data_override: Option<&PathBuf>,
    json: bool,
) -> ExitCode {
    // Stage 1: Resolve settings from config, if any
    let settings = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            };
            match load_settings(&adapter) {
                Ok(s) => Some(s),
                Err(e) => return fail(e),
            }
        }
        None => None,
    };

    let Some(strategy_path) = strategy_override
        .cloned()
        .or_else(|| settings.as_ref().map(|s| s.strategy_path.clone()))
    else {
        return fail(StratError::ConfigMissing {
            section: "strategy".to_string(),
            key: "path".to_string(),
        });
    };
    let data_path = data_override
        .cloned()
        .or_else(|| settings.as_ref().and_then(|s| s.data_path.clone()));
    let options = settings.as_ref().map_or_else(ParserOptions::default, |s| s.parser);

    // Stage 2: Compile
    if let Some(name) = settings.as_ref().and_then(|s| s.strategy_name.as_deref()) {
        eprintln!("Loading strategy: {name}");
    }
    let source = match read_source(&strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let strategy = match compile_source(&source, &strategy_path, options) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Stage 3: Data and evaluation
    let series = match load_series(data_path.as_ref(), settings.as_ref()) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let signals = match evaluate(&strategy, &series) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Stage 4: Simulate and report
    eprintln!("Running backtest over {} bars...", series.len());
    let result = backtest::run_backtest(series.close(), &signals);
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => return fail(e.into()),
        }
    } else {
        print_result(&result);
    }
    ExitCode::SUCCESS
}

fn run_render(input: &Path) -> ExitCode {
    let text = match read_source(input) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let rules = match RuleSet::from_json(&text) {
        Ok(r) => r,
        Err(e) => return fail(e.into()),
    };
    match rule_struct::to_dsl(&rules) {
        Ok(dsl) => {
            println!("{dsl}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e.into()),
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let source = match read_source(&settings.strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let strategy = match compile_source(&source, &settings.strategy_path, settings.parser) {
        Ok(s) => s,
        Err(code) => return code,
    };
    for (label, block) in [("Entry", &strategy.entry), ("Exit", &strategy.exit)] {
        if let Some(block) = block {
            eprintln!("\n{label} rules:");
            for rule in &block.rules {
                eprintln!("  {rule}");
            }
        }
    }

    let columns = strategy.referenced_columns();
    let indicators = strategy.indicator_names();
    eprintln!("\nColumns:    {}", join_names(&columns));
    eprintln!("Indicators: {}", join_names(&indicators));

    if let Some(data_path) = &settings.data_path {
        let series = match load_series(Some(data_path), Some(&settings)) {
            Ok(s) => s,
            Err(code) => return code,
        };
        if let Some(name) = columns.iter().find(|c| series.column(c).is_none()) {
            let available: Vec<&str> = series.column_names().collect();
            eprintln!("Data has columns: {}", available.join(", "));
            return fail(EvalError::UnknownColumn { name: name.clone() }.into());
        }
        if let Err(code) = evaluate(&strategy, &series) {
            return code;
        }
        eprintln!("\nEvaluated against {} bars.", series.len());
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
