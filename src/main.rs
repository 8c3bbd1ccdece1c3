//! skill-profiler CLI
//!
//! # Commands
//! - `analyze <ARCHIVE>`: profile a chat export and recommend skills
//! - `validate-key`: check an Anthropic API key with a minimal request
//! - `export-sample <OUT>`: write the demo archive to a file
//! - `catalog`: list the skills recommendations are drawn from
//!
//! Results go to stdout; logs go to stderr (`RUST_LOG` overrides the
//! configured level).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use skill_profiler::archive;
use skill_profiler::remote::AnthropicClient;
use skill_profiler::sample;
use skill_profiler::traffic::RequestRecord;
use skill_profiler::{
    backend_from_config, AnalysisMode, AnalysisReport, Analyzer, Config, ProfilerError, Result,
    SkillCatalog, TrafficLog,
};

#[derive(Parser)]
#[command(name = "skill-profiler", version, about = "Recommend skills from your chat history")]
struct Cli {
    /// Config file (JSON); defaults to <config dir>/skill-profiler/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Profile an exported conversations.json and recommend skills
    Analyze {
        /// Path to the export (a JSON object or array of conversations)
        archive: PathBuf,

        /// Use the remote LLM backend instead of local heuristics
        #[arg(long)]
        remote: bool,

        /// API key for the remote backend
        #[arg(long)]
        api_key: Option<String>,

        /// Skill catalog file replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Print every outbound request made during the run
        #[arg(long)]
        show_traffic: bool,
    },

    /// Check that an API key is accepted
    ValidateKey {
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Write the built-in demo archive
    ExportSample { out: PathBuf },

    /// List catalog skills
    Catalog {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match config {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", "error:".red().bold(), e);
            if e.is_remote_error() {
                eprintln!("The analysis did not complete. Check your key and network, then retry.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Analyze {
            archive,
            remote,
            api_key,
            catalog,
            json,
            show_traffic,
        } => {
            if remote {
                config.mode = AnalysisMode::Remote;
            }
            if api_key.is_some() {
                config.remote.api_key = api_key;
            }
            if catalog.is_some() {
                config.catalog_path = catalog;
            }
            analyze(&archive, &config, json, show_traffic).await
        }
        Command::ValidateKey { api_key } => {
            let key = api_key
                .or(config.remote.api_key)
                .ok_or(ProfilerError::MissingApiKey)?;
            let client = AnthropicClient::new(
                key,
                config.remote.api_base,
                config.remote.model,
                TrafficLog::default(),
            );
            client.validate_key().await?;
            println!("{} API key accepted", "✓".green());
            Ok(())
        }
        Command::ExportSample { out } => {
            archive::write_archive(&out, &sample::sample_conversations())?;
            println!("Wrote demo archive to {}", out.display());
            Ok(())
        }
        Command::Catalog { catalog } => {
            let catalog = load_catalog(catalog.as_deref().or(config.catalog_path.as_deref()))?;
            for entry in catalog.entries() {
                println!(
                    "{} [{}] {}",
                    entry.skill_id.bold(),
                    entry.source.as_str(),
                    entry.description
                );
            }
            Ok(())
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<SkillCatalog> {
    match path {
        Some(path) => SkillCatalog::load(path),
        None => SkillCatalog::builtin(),
    }
}

async fn analyze(path: &Path, config: &Config, json: bool, show_traffic: bool) -> Result<()> {
    // Input errors stop here, before any analysis stage
    let raw = archive::read_archive(path)?;
    let catalog = Arc::new(load_catalog(config.catalog_path.as_deref())?);

    let traffic = TrafficLog::default();
    let mut traffic_rx = traffic.subscribe().await;
    let backend = backend_from_config(config, traffic.clone())?;
    let analyzer = Analyzer::new(catalog, backend, traffic);

    let outcome = analyzer.run(&raw).await;

    if show_traffic {
        while let Ok(record) = traffic_rx.try_recv() {
            print_request(&record);
        }
    }

    let report = outcome?;
    debug!("Final state: {:?}", analyzer.state().await);

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{}", out);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn score_colored(score: f64) -> ColoredString {
    let text = format!("{:.2}", score);
    if score >= 0.7 {
        text.green()
    } else if score >= 0.4 {
        text.yellow()
    } else {
        text.red()
    }
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", heading.bold());
    for item in items {
        println!("  - {}", item);
    }
}

fn print_report(report: &AnalysisReport) {
    let profile = &report.profile;

    println!("{}", "Profile".bold().underline());
    println!("{}\n", profile.persona_summary);

    if !profile.usage_breakdown.is_empty() {
        println!("{}", "Usage".bold());
        for share in &profile.usage_breakdown {
            println!("  {:>3}%  {}", share.percentage, share.category);
        }
    }
    print_list("Work patterns", &profile.work_patterns);
    print_list("Artifacts", &profile.artifact_types);
    print_list("Repeated requests", &profile.repeated_requests);
    print_list("Skill gaps", &profile.skill_gaps);

    println!();
    println!(
        "{} ({} backend)",
        "Recommended skills".bold().underline(),
        report.backend
    );
    if report.recommendations.is_empty() {
        println!("  No skills matched this history.");
        return;
    }
    for rec in &report.recommendations {
        println!(
            "  {} {} [{}]",
            score_colored(rec.recommendation.relevance_score),
            rec.skill.name.bold(),
            rec.skill.source.as_str()
        );
        println!("       {}", rec.recommendation.reasoning);
        if let Some(url) = &rec.skill.url {
            println!("       {}", url.dimmed());
        }
    }
}

fn print_request(record: &RequestRecord) {
    let status = match (record.status, &record.error) {
        (Some(code), None) => code.to_string().green(),
        (Some(code), Some(_)) => code.to_string().red(),
        (None, _) => "ERR".red(),
    };
    eprintln!(
        "{} {} {} {} bytes {} ms {}",
        status,
        record.method,
        record.label,
        record.request_bytes,
        record.duration_ms,
        record.error.as_deref().unwrap_or("")
    );
}
