//! Data quality command-line tool.
//!
//! This binary runs quality requests against batches of JSON records:
//! rule-based validation, anomaly detection, completeness and format
//! accuracy checks, or a combined report.
//!
//! # Guarantees
//! - Offline operation: records never leave the machine
//! - Responses go to stdout (or `--output`), logs go to stderr
//! - Bad data yields `success: false`, never a crash

mod input;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dataqc_core::{
    DataQcError, ErrorEnvelope, JsonLinesSink, QualityAction, QualityAnalyzer, QualityResponse,
    QualityService, Result, init_logging, initialize_request_validator,
};
use serde_json::{Map, Value};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "dataqc")]
#[command(about = "Data quality checks for JSON record batches")]
#[command(version)]
#[command(long_about = "
DataQC - Offline data quality control for JSON records

Runs quality checks over a batch of records and prints a JSON response:
- validate_quality: rule-based validation with per-record confidence
- detect_anomalies: field distributions, mixed types and outliers
- check_completeness: share of expected fields that are present
- validate_accuracy: email, phone, date and numeric format checks
- generate_qc_report: all of the above plus recommendations
- get_quality_metrics: dimension scores only

EXIT STATUS:
  0  a response was produced (check its success flag)
  1  the request could not be processed at all

EXAMPLES:
  dataqc run request.json
  dataqc check validate_quality --data people.json --rules rules.json
  dataqc check generate_qc_report --data people.json --threshold 0.9 -o report.json
  dataqc --audit-log audit.jsonl check detect_anomalies --data people.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,

    /// Quality configuration file
    #[arg(
        long,
        global = true,
        env = "DATAQC_CONFIG",
        help = "JSON quality configuration file"
    )]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(
        short,
        long,
        global = true,
        help = "Write the response to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    /// Audit log path
    #[arg(
        long,
        global = true,
        help = "Append every response to a JSON-lines audit log"
    )]
    pub audit_log: Option<PathBuf>,

    /// Disable parallel validation
    #[arg(long, global = true, help = "Validate records on a single thread")]
    pub sequential: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process a complete request envelope
    Run(RunArgs),
    /// Run one action over a data file
    Check(CheckArgs),
    /// List supported actions
    Actions,
}

#[derive(Args)]
pub struct RunArgs {
    /// Request envelope file
    #[arg(help = "JSON file with action, data, rules and threshold")]
    pub request: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Action to perform
    #[arg(help = "Action name, see `dataqc actions`")]
    pub action: String,

    /// Record batch file
    #[arg(long, help = "JSON file holding an array of records")]
    pub data: PathBuf,

    /// Rule definitions file
    #[arg(long, help = "JSON file holding an array of rules (default rules otherwise)")]
    pub rules: Option<PathBuf>,

    /// Confidence threshold override
    #[arg(long, help = "Minimum confidence for a valid record (0.0-1.0)")]
    pub threshold: Option<f64>,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all log output except errors"
    )]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    // Initialize JSON Schema validator
    initialize_request_validator().context("Failed to initialize request validator")?;

    if let Command::Actions = cli.command {
        list_actions();
        return Ok(());
    }

    match execute(&cli).await {
        Ok(response) => {
            output::emit(&response, cli.output.as_deref()).await?;
            if !response.success {
                info!("Request rejected: {}", response.error.as_deref().unwrap_or("unknown"));
            }
            Ok(())
        }
        Err(e) => {
            error!("Quality control failed: {}", e);
            output::emit(&ErrorEnvelope::from_error(&e), cli.output.as_deref()).await?;
            std::process::exit(1);
        }
    }
}

/// Loads inputs, builds the service and handles one request.
async fn execute(cli: &Cli) -> Result<QualityResponse> {
    let request = match &cli.command {
        Command::Run(args) => input::load_json(&args.request).await?,
        Command::Check(args) => build_check_request(args).await?,
        Command::Actions => {
            return Err(DataQcError::invalid_input("actions does not take a request"));
        }
    };

    let service = build_service(cli).await?;
    service.handle_value(&request)
}

async fn build_service(cli: &Cli) -> Result<QualityService> {
    let mut config = input::load_config(cli.config.as_deref()).await?;
    if cli.sequential {
        config = config.with_parallel(false);
    }

    let mut service = QualityService::new(QualityAnalyzer::new(config));
    if let Some(path) = &cli.audit_log {
        info!("Auditing responses to {}", path.display());
        service = service.with_sink(Arc::new(JsonLinesSink::new(path)));
    }
    Ok(service)
}

/// Builds a request envelope from `check` arguments.
async fn build_check_request(args: &CheckArgs) -> Result<Value> {
    let data = input::load_json(&args.data).await?;
    let rules = match &args.rules {
        Some(path) => Some(input::load_json(path).await?),
        None => None,
    };
    Ok(check_envelope(&args.action, data, rules, args.threshold))
}

fn check_envelope(action: &str, data: Value, rules: Option<Value>, threshold: Option<f64>) -> Value {
    let mut envelope = Map::new();
    envelope.insert("action".to_string(), Value::from(action));
    envelope.insert("data".to_string(), data);
    if let Some(rules) = rules {
        envelope.insert("rules".to_string(), rules);
    }
    if let Some(threshold) = threshold {
        envelope.insert("threshold".to_string(), Value::from(threshold));
    }
    Value::Object(envelope)
}

fn list_actions() {
    println!("Supported actions:");
    for action in QualityAction::ALL {
        println!("  {}", action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "dataqc",
            "-vv",
            "check",
            "validate_quality",
            "--data",
            "people.json",
            "--threshold",
            "0.9",
            "--sequential",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        assert!(cli.sequential);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.action, "validate_quality");
                assert_eq!(args.data, PathBuf::from("people.json"));
                assert_eq!(args.threshold, Some(0.9));
                assert!(args.rules.is_none());
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_check_envelope_omits_absent_fields() {
        let envelope = check_envelope("detect_anomalies", json!([]), None, None);
        assert_eq!(envelope, json!({"action": "detect_anomalies", "data": []}));

        let envelope = check_envelope("validate_quality", json!([]), Some(json!([])), Some(0.5));
        assert_eq!(envelope["rules"], json!([]));
        assert_eq!(envelope["threshold"], 0.5);
    }

    #[tokio::test]
    async fn test_execute_run_and_audit() {
        let dir = TempDir::new().unwrap();
        let request = dir.path().join("request.json");
        let audit = dir.path().join("audit.jsonl");
        std::fs::write(
            &request,
            r#"{"action": "check_completeness", "data": [{"a": 1, "b": null}]}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "dataqc",
            "--audit-log",
            audit.to_str().unwrap(),
            "run",
            request.to_str().unwrap(),
        ])
        .unwrap();

        let response = execute(&cli).await.unwrap();
        assert!(response.success);
        let completeness = response.completeness.unwrap();
        assert!((completeness.overall_completeness - 50.0).abs() < 0.001);
        assert_eq!(std::fs::read_to_string(&audit).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_action_is_transport_failure() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data.json");
        std::fs::write(&data, "[]").unwrap();

        let cli = Cli::try_parse_from([
            "dataqc",
            "check",
            "reticulate",
            "--data",
            data.to_str().unwrap(),
        ])
        .unwrap();

        let error = execute(&cli).await.unwrap_err();
        let envelope = ErrorEnvelope::from_error(&error);
        assert_eq!(envelope.code, dataqc_core::QUALITY_CONTROL_FAILED);
    }
}
