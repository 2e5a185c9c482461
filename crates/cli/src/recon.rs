//! `odrecon run` / `odrecon validate`: invoice-to-order reconciliation.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use orderdesk_recon::{ReconConfig, ReconError, ReconInput, ReconOptions, ReconciliationResult};

use crate::exit_codes::{
    EXIT_RECON_DISCREPANCIES, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_INVALID_INPUT,
    EXIT_RECON_RUNTIME,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile an invoice document against its order lines
    #[command(after_help = "\
The input is a JSON document with invoiceLines, orderLines and meta.
Exit code 1 means discrepancies were found (changed, new or missing lines,
or anomalies).

Examples:
  odrecon run delivery.json --json
  odrecon run delivery.json --config recon.toml --output result.json
  odrecon run delivery.json --price-tolerance 0.01 --csv matches.csv
  cat delivery.json | odrecon run - --json")]
    Run {
        /// Input document (file path, or - for stdin)
        input: String,

        /// Recon config (.toml) with tolerances and a default landed block
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Quantity tolerance (overrides config)
        #[arg(long)]
        qty_tolerance: Option<f64>,

        /// Unit price tolerance (overrides config)
        #[arg(long)]
        price_tolerance: Option<f64>,

        /// Write the JSON result envelope to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write one CSV row per match to file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  odrecon validate recon.toml")]
    Validate {
        /// Path to the .toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run {
            input,
            config,
            qty_tolerance,
            price_tolerance,
            json,
            output,
            csv,
        } => cmd_recon_run(input, config, qty_tolerance, price_tolerance, json, output, csv),
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

fn config_err(e: ReconError) -> CliError {
    recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())
}

fn io_err(what: String) -> CliError {
    recon_err(EXIT_RECON_RUNTIME, ReconError::Io(what).to_string())
}

/// What `--json` and `--output` carry: the engine result plus when it ran.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultEnvelope<'a> {
    generated_at: String,
    result: &'a ReconciliationResult,
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| io_err(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(config_err)
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| io_err(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }
    std::fs::read_to_string(input)
        .map_err(|e| io_err(format!("cannot read {input}: {e}")))
}

/// Config tolerances, with any command-line flag taking precedence.
fn resolve_options(
    config: &ReconConfig,
    qty_tolerance: Option<f64>,
    price_tolerance: Option<f64>,
) -> Result<ReconOptions, CliError> {
    let base = config.options();
    ReconOptions::new(
        qty_tolerance.unwrap_or(base.qty_tolerance),
        price_tolerance.unwrap_or(base.price_tolerance),
    )
    .map_err(|e| CliError::usage(e.to_string()))
}

fn cmd_recon_run(
    input: String,
    config_path: Option<PathBuf>,
    qty_tolerance: Option<f64>,
    price_tolerance: Option<f64>,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut config = load_config(config_path.as_deref())?;
    let options = resolve_options(&config, qty_tolerance, price_tolerance)?;
    config.set_options(options);
    tracing::debug!(
        qty_tolerance = options.qty_tolerance,
        price_tolerance = options.price_tolerance,
        landed_default = config.landed.is_some(),
        "recon options resolved"
    );

    let input_str = read_input(&input)?;
    let request = ReconInput::from_json(&input_str).map_err(|e| {
        recon_err(EXIT_RECON_INVALID_INPUT, e.to_string())
            .with_hint("expected {\"invoiceLines\": [...], \"orderLines\": [...], \"meta\": {...}}")
    })?;

    // Run engine
    let result = orderdesk_recon::run(&config, &request);

    // Output
    let envelope = ResultEnvelope {
        generated_at: chrono::Utc::now().to_rfc3339(),
        result: &result,
    };
    let json_str = serde_json::to_string_pretty(&envelope)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| io_err(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = csv_file {
        crate::export::write_matches_csv_file(path, &result)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let t = &result.totals;
    let s = &result.summary;
    eprintln!(
        "{}{} lines, {} matched, {} new, {} missing, {} qty changes, {} price changes, {} anomalies",
        result.meta.po_number.as_deref().map(|po| format!("{po}: ")).unwrap_or_default(),
        result.matches.len(),
        t.lines_matched,
        s.new_items,
        s.missing_items,
        s.qty_changed,
        s.price_changed,
        result.anomalies.len(),
    );
    eprintln!(
        "order {:.2}, invoice {:.2}, delta {:+.2}",
        t.order_value, t.invoice_value, t.value_delta
    );

    if result.has_discrepancies() {
        return Err(recon_err(EXIT_RECON_DISCREPANCIES, "discrepancies found"));
    }

    Ok(())
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    let options = config.options();

    eprintln!(
        "config OK: {} (qty tolerance {}, price tolerance {}, landed {})",
        if config.name.is_empty() { "<unnamed>" } else { config.name.as_str() },
        options.qty_tolerance,
        options.price_tolerance,
        if config.landed.is_some() { "default set" } else { "none" },
    );
    Ok(())
}
