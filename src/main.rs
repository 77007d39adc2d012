//! CLI entry point for grade_bridge.
//!
//! Serves the login/grades API, runs a single login + grade fetch from the
//! command line, or validates a credit table file.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use grade_bridge::config::{DEFAULT_BASE_URL, PortalConfig, SemesterRange, ServerConfig};
use grade_bridge::fetch::BasicClient;
use grade_bridge::grades::{CreditTable, LetterGrades, SubjectKey, aggregate};
use grade_bridge::infra::ims::ImsClient;
use grade_bridge::parser::FormFieldExtractor;
use grade_bridge::server::{AppState, GradesBody, run_server};
use grade_bridge::services::portal_api::PortalApi;
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_bridge")]
#[command(about = "Fetch academic portal grades and compute GPA / CGPA", long_about = None)]
struct Cli {
    #[command(flatten)]
    portal: PortalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PortalArgs {
    /// Base URL of the academic portal
    #[arg(long, env = "PORTAL_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    portal_url: String,

    /// Semesters to fetch, e.g. "1-5" or "3"
    #[arg(long, env = "SEMESTERS", default_value = "1-5", global = true)]
    semesters: SemesterRange,

    /// Record field used to look subjects up in the credit table
    #[arg(long, env = "SUBJECT_KEY", value_enum, default_value = "code", global = true)]
    subject_key: SubjectKey,

    /// JSON credit table to use instead of the built-in one
    #[arg(long, env = "CREDIT_TABLE", global = true)]
    credit_table: Option<PathBuf>,

    /// Timeout for each portal request, in seconds
    #[arg(long, env = "PORTAL_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,
}

impl PortalArgs {
    fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            base_url: self.portal_url.clone(),
            semesters: self.semesters,
            timeout: Duration::from_secs(self.timeout_secs),
            ..PortalConfig::default()
        }
    }

    fn credit_table(&self) -> Result<CreditTable> {
        match (&self.credit_table, self.subject_key) {
            (Some(path), key) => CreditTable::load(path, key),
            (None, SubjectKey::Code) => Ok(CreditTable::builtin()),
            (None, SubjectKey::Name) => {
                bail!("--subject-key name needs a name-keyed --credit-table")
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the login and grades API
    Serve {
        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Origin allowed to call the API with cookies (repeat or comma-separate)
        #[arg(
            long = "allow-origin",
            env = "ALLOWED_ORIGINS",
            value_delimiter = ',',
            default_values_t = ServerConfig::default().allowed_origins
        )]
        allowed_origins: Vec<String>,
    },
    /// Log in once, fetch every semester and print the computed grades
    Grades {
        /// Portal login identifier
        #[arg(long, env = "REGISTER_NUMBER")]
        register_number: String,

        /// Portal password (the registered phone number)
        #[arg(long, env = "PHONE_NUMBER", hide_env_values = true)]
        phone_number: String,

        /// Include per-subject detail in the output
        #[arg(long, default_value_t = false)]
        include_subjects: bool,
    },
    /// Validate a credit table file
    CheckTable {
        /// Path to the JSON credit table
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            allowed_origins,
        } => {
            let credits = cli.portal.credit_table()?;
            info!(subjects = credits.len(), key = ?credits.key(), "Credit table loaded");

            let state = AppState {
                portal: Arc::new(build_portal(cli.portal.portal_config())?),
                credits: Arc::new(credits),
                letters: Arc::new(LetterGrades::default()),
            };
            let config = ServerConfig {
                bind,
                allowed_origins,
            };
            run_server(state, &config).await?;
        }
        Commands::Grades {
            register_number,
            phone_number,
            include_subjects,
        } => {
            let credits = cli.portal.credit_table()?;
            let portal = build_portal(cli.portal.portal_config())?;

            let session = portal.login(&register_number, &phone_number).await?;
            let semesters = portal.fetch_grades(&session).await?;
            let result = aggregate(semesters, &credits, &LetterGrades::default())?;

            let body = GradesBody::new(result, include_subjects);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::CheckTable { path } => {
            let table = CreditTable::load(&path, cli.portal.subject_key)?;
            info!(
                path = %path.display(),
                subjects = table.len(),
                key = ?table.key(),
                "Credit table is valid"
            );
        }
    }

    Ok(())
}

/// Builds the IMS portal client on the real HTTP transport.
fn build_portal(config: PortalConfig) -> Result<ImsClient<BasicClient, FormFieldExtractor>> {
    let http = BasicClient::new(config.timeout, config.connect_timeout)?;
    Ok(ImsClient::new(http, FormFieldExtractor::new()?, config))
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_bridge.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_bridge.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}
