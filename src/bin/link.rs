//! Tracelink CLI - Command-line interface for Tracelink
//!
//! Commands:
//! - analyze: Correlate two trace files and print the match report
//! - validate: Check one trace file against the input contract
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracelink::adapter::TraceAdapter;
use tracelink::config::AnalysisConfig;
use tracelink::pipeline::TraceAnalyzer;
use tracelink::types::Packet;
use tracelink::{AnalysisError, TRACELINK_VERSION};

/// Tracelink - correlation engine for linking packet traces
#[derive(Parser)]
#[command(name = "tracelink")]
#[command(version = TRACELINK_VERSION)]
#[command(about = "Correlate packet traces across capture points", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate two trace files and print the match report
    Analyze {
        /// User-side trace file (use - for stdin)
        #[arg(short, long)]
        user: PathBuf,

        /// Channel-side trace file (use - for stdin)
        #[arg(short, long)]
        channel: PathBuf,

        /// Configuration file (JSON); threshold flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Burst gap in seconds
        #[arg(long)]
        burst_gap: Option<f64>,

        /// Shape bucket width in seconds
        #[arg(long)]
        bin_width: Option<f64>,

        /// Timing tolerance in seconds
        #[arg(long)]
        time_tolerance: Option<f64>,

        /// Size tolerance in bytes
        #[arg(long)]
        size_tolerance: Option<u64>,

        /// Decision threshold (0-1)
        #[arg(long)]
        threshold: Option<f64>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format (defaults to pretty JSON on a terminal)
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Check one trace file against the input contract
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: TraceFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum TraceFormat {
    /// Detect JSON array vs NDJSON automatically
    Auto,
    /// Newline-delimited JSON (one packet per line)
    Ndjson,
    /// JSON array of packets
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (packet traces)
    Input,
    /// Output schema (match report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TracelinkCliError> {
    match cli.command {
        Commands::Analyze {
            user,
            channel,
            config,
            burst_gap,
            bin_width,
            time_tolerance,
            size_tolerance,
            threshold,
            output,
            output_format,
        } => {
            let overrides = ConfigOverrides {
                burst_gap,
                bin_width,
                time_tolerance,
                size_tolerance,
                threshold,
            };
            cmd_analyze(
                &user,
                &channel,
                config.as_deref(),
                overrides,
                &output,
                output_format,
            )
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

/// Threshold flags that take precedence over the config file
struct ConfigOverrides {
    burst_gap: Option<f64>,
    bin_width: Option<f64>,
    time_tolerance: Option<f64>,
    size_tolerance: Option<u64>,
    threshold: Option<f64>,
}

impl ConfigOverrides {
    fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(value) = self.burst_gap {
            config.burst_gap_sec = value;
        }
        if let Some(value) = self.bin_width {
            config.bin_width_sec = value;
        }
        if let Some(value) = self.time_tolerance {
            config.time_tolerance_sec = value;
        }
        if let Some(value) = self.size_tolerance {
            config.size_tolerance_bytes = value;
        }
        if let Some(value) = self.threshold {
            config.decision_threshold = value;
        }
        config
    }
}

fn cmd_analyze(
    user: &Path,
    channel: &Path,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
    output: &Path,
    output_format: Option<OutputFormat>,
) -> Result<(), TracelinkCliError> {
    if is_stdio(user) && is_stdio(channel) {
        return Err(TracelinkCliError::BothStdin);
    }

    // Resolve configuration: file, then flag overrides
    let base_config = match config_path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let config = overrides.apply(base_config);

    // Parse both traces
    let user_trace = read_trace(user)?;
    let channel_trace = read_trace(channel)?;

    // Run the pipeline and encode the report
    let analyzer = TraceAnalyzer::with_config(config);
    let report = analyzer.analyze(&user_trace, &channel_trace)?;

    let format = output_format.unwrap_or_else(|| default_output_format(output));
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if is_stdio(output) {
        println!("{}", rendered);
    } else {
        fs::write(output, rendered)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: TraceFormat,
    json: bool,
) -> Result<(), TracelinkCliError> {
    let input_data = read_input(input)?;

    let packets = match input_format {
        TraceFormat::Auto => TraceAdapter::parse_document(&input_data)?,
        TraceFormat::Ndjson => TraceAdapter::parse_ndjson(&input_data)?,
        TraceFormat::Json => TraceAdapter::parse_array(&input_data)?,
    };

    let issues = TraceAdapter::validate_packets(&packets);

    let report = ValidationReport {
        total_packets: packets.len(),
        valid_packets: packets.len().saturating_sub(issues.len()),
        issues: &issues,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total packets: {}", report.total_packets);
        println!("Issues found:  {}", issues.len());

        if !issues.is_empty() {
            println!("\nIssues:");
            for issue in &issues {
                println!("  - Packet {}: {}", issue.index, issue.message);
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(TracelinkCliError::ValidationFailed(issues.len()))
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), TracelinkCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: packet trace");
                println!();
                println!("A trace is an ordered sequence of packet observations,");
                println!("timestamps non-decreasing, sizes positive:");
                println!();
                println!("1. Object form - {{\"time\": 0.015, \"size\": 500}}");
                println!("   - time: seconds from the capture origin (>= 0)");
                println!("   - size: bytes on the wire (> 0)");
                println!();
                println!("2. Pair form - [0.015, 500]");
                println!();
                println!("Both forms may appear in a JSON array or as NDJSON");
                println!("(one packet per line).");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: match report");
                println!();
                println!("The match report contains:");
                println!();
                println!("- report_version: Schema version (1.0.0)");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc: When the report was computed");
                println!("- config: Tolerances and thresholds the run used");
                println!("- user / channel: {{ packets, events }} input summaries");
                println!("- scores: {{ event, shape }} correlation scores in [0, 1]");
                println!("- verdict: Final boolean participation decision");
            }
        }
    }

    Ok(())
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(path: &Path) -> Result<String, TracelinkCliError> {
    if is_stdio(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_trace(path: &Path) -> Result<Vec<Packet>, TracelinkCliError> {
    let input = read_input(path)?;
    Ok(TraceAdapter::parse_document(&input)?)
}

fn default_output_format(output: &Path) -> OutputFormat {
    if is_stdio(output) && atty::is(atty::Stream::Stdout) {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Json
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://tracelink.dev/schemas/packet-trace.v1.json",
        "title": "packet-trace.v1",
        "description": "Ordered packet observations for one capture point",
        "type": "array",
        "items": {
            "oneOf": [
                {
                    "type": "object",
                    "required": ["time", "size"],
                    "properties": {
                        "time": { "type": "number", "minimum": 0 },
                        "size": { "type": "integer", "minimum": 1 }
                    }
                },
                {
                    "type": "array",
                    "prefixItems": [
                        { "type": "number", "minimum": 0 },
                        { "type": "integer", "minimum": 1 }
                    ],
                    "minItems": 2,
                    "maxItems": 2
                }
            ]
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://tracelink.dev/schemas/match-report.v1.json",
        "title": "match-report.v1",
        "description": "Tracelink correlation report",
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "config", "user", "channel", "scores", "verdict"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "config": { "type": "object" },
            "user": {
                "type": "object",
                "properties": {
                    "packets": { "type": "integer" },
                    "events": { "type": "integer" }
                }
            },
            "channel": { "$ref": "#/properties/user" },
            "scores": {
                "type": "object",
                "properties": {
                    "event": { "type": "number", "minimum": 0, "maximum": 1 },
                    "shape": { "type": "number", "minimum": 0, "maximum": 1 }
                }
            },
            "verdict": { "type": "boolean" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum TracelinkCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    BothStdin,
    ValidationFailed(usize),
}

impl From<io::Error> for TracelinkCliError {
    fn from(e: io::Error) -> Self {
        TracelinkCliError::Io(e)
    }
}

impl From<AnalysisError> for TracelinkCliError {
    fn from(e: AnalysisError) -> Self {
        TracelinkCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for TracelinkCliError {
    fn from(e: serde_json::Error) -> Self {
        TracelinkCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TracelinkCliError> for CliError {
    fn from(e: TracelinkCliError) -> Self {
        match e {
            TracelinkCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TracelinkCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'tracelink validate' on each trace file".to_string()),
            },
            TracelinkCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TracelinkCliError::BothStdin => CliError {
                code: "BOTH_STDIN".to_string(),
                message: "Only one of --user and --channel may read stdin".to_string(),
                hint: Some("Pass at least one trace as a file path".to_string()),
            },
            TracelinkCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} packets failed validation", count),
                hint: Some("Fix the listed packets and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport<'a> {
    total_packets: usize,
    valid_packets: usize,
    issues: &'a [tracelink::adapter::PacketIssue],
}
