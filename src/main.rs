use admissions_core::application::confirmation::ConfirmationService;
use admissions_core::application::health_monitor::{HealthChecker, HealthMonitor};
use admissions_core::application::payment_orchestrator::PaymentOrchestrator;
use admissions_core::application::payment_verifier::PaymentVerifier;
use admissions_core::application::submission::ApplicationSubmissionService;
use admissions_core::config::{AppConfig, HealthPolicy, RetryPolicy};
use admissions_core::domain::application::{ApplicationId, FinalApplication};
use admissions_core::domain::health::HealthSnapshot;
use admissions_core::domain::identity::{Identity, IdentityGate, Session};
use admissions_core::domain::payment::{Amount, Customer, PaymentDetails, PaymentMetadata};
use admissions_core::domain::ports::{ApplicationStore, HealthProbe};
use admissions_core::domain::recovery::RedirectParams;
use admissions_core::infrastructure::file_recovery::FileRecoveryStore;
use admissions_core::infrastructure::http::gateway::FlutterwaveGateway;
use admissions_core::infrastructure::http::health_probe::HttpHealthProbe;
use admissions_core::infrastructure::http::rest_store::RestApplicationStore;
use admissions_core::interfaces::csv::application_writer::ApplicationWriter;
use admissions_core::interfaces::form::read_sections;
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "admissions", author, version, about, long_about = None)]
struct Cli {
    /// File holding the pending payment between `pay` and `confirm`
    #[arg(long, global = true, default_value = ".admissions-session.json")]
    session_file: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Signed-in identity; commands touching applications require it
    #[arg(long, global = true, env = "ADMISSIONS_IDENTITY")]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the backend is reachable
    Health {
        /// Keep monitoring until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Start a tuition payment and print the checkout link
    Pay {
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        accommodation: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Confirm a payment after the gateway redirected back
    Confirm {
        #[arg(long)]
        tx_ref: String,
        #[arg(long)]
        transaction_id: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    #[command(flatten)]
    Application(ApplicationCommand),
}

#[derive(Subcommand)]
enum ApplicationCommand {
    /// Save an application draft from a JSON form file
    Draft {
        #[arg(long)]
        file: PathBuf,
        /// Existing draft to overwrite
        #[arg(long)]
        id: Option<String>,
    },
    /// Submit a complete application from a JSON form file
    Submit {
        #[arg(long)]
        file: PathBuf,
        /// Promote this draft instead of creating a new record
        #[arg(long)]
        draft_id: Option<String>,
    },
    /// List the signed-in identity's applications
    List {
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
    /// Show one application as JSON
    Show {
        #[arg(long)]
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn parse_amount(raw: &str) -> std::result::Result<Amount, String> {
    let value = Decimal::from_str(raw).map_err(|e| e.to_string())?;
    Amount::new(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let session: Arc<dyn IdentityGate> = Arc::new(match cli.owner.clone() {
        Some(owner) => Session::signed_in(Identity::new(owner)),
        None => Session::anonymous(),
    });

    match cli.command {
        Command::Health { watch } => health(config, watch).await,
        Command::Pay {
            amount,
            name,
            email,
            phone,
            accommodation,
            address,
        } => {
            let details = PaymentDetails {
                amount,
                customer: Customer { name, email, phone },
                metadata: PaymentMetadata {
                    accommodation,
                    address,
                },
            };
            pay(config, cli.session_file, details).await
        }
        Command::Confirm {
            tx_ref,
            transaction_id,
            status,
        } => {
            let redirect = RedirectParams {
                tx_ref,
                transaction_id,
                status,
            };
            confirm(config, cli.session_file, redirect).await
        }
        Command::Application(command) => {
            let store = open_store(cli.db_path, &config)?;
            let service = ApplicationSubmissionService::new(store, session);
            applications(service, command).await
        }
    }
}

fn open_store(db_path: Option<PathBuf>, config: &AppConfig) -> Result<Arc<dyn ApplicationStore>> {
    if let Some(db_path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use admissions_core::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(db_path)?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to the remote application store."
            );
        }
    }
    Ok(Arc::new(RestApplicationStore::new(config.clone())?))
}

async fn health(config: AppConfig, watch: bool) -> Result<()> {
    let policy = HealthPolicy::default();
    let probe: Arc<dyn HealthProbe> =
        Arc::new(HttpHealthProbe::new(config, policy.request_timeout)?);

    if !watch {
        let snapshot = HealthChecker::new(probe, policy).check_status().await;
        println!("{}", serde_json::to_string(&snapshot).into_diagnostic()?);
        if !snapshot.permits_payment() {
            return Err(unavailable("backend is", &snapshot));
        }
        return Ok(());
    }

    let monitor = HealthMonitor::spawn(probe, policy);
    let mut updates = monitor.subscribe();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        println!("{}", serde_json::to_string(&snapshot).into_diagnostic()?);
        if snapshot.fatal {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => if changed.is_err() { break },
        }
    }
    monitor.shutdown().await;
    Ok(())
}

fn unavailable(context: &str, snapshot: &HealthSnapshot) -> miette::Report {
    match &snapshot.last_error {
        Some(cause) => miette!("{} {}: {}", context, snapshot.state, cause),
        None => miette!("{} {}", context, snapshot.state),
    }
}

async fn pay(config: AppConfig, session_file: PathBuf, details: PaymentDetails) -> Result<()> {
    let policy = HealthPolicy::default();
    let probe = Arc::new(HttpHealthProbe::new(config.clone(), policy.request_timeout)?);
    let snapshot = HealthChecker::new(probe, policy).check_status().await;
    if !snapshot.permits_payment() {
        return Err(unavailable(
            "payments are unavailable while the backend is",
            &snapshot,
        ));
    }

    let gateway = Arc::new(FlutterwaveGateway::new(config.clone())?);
    let recovery = Arc::new(FileRecoveryStore::new(session_file));
    let orchestrator = PaymentOrchestrator::new(gateway, recovery, config, RetryPolicy::default());

    let initiation = orchestrator.initialize_payment(&details).await?;
    println!(
        "{}",
        serde_json::json!({
            "tx_ref": initiation.reference.as_str(),
            "link": initiation.link,
            "attempts": initiation.attempts,
        })
    );
    Ok(())
}

async fn confirm(config: AppConfig, session_file: PathBuf, redirect: RedirectParams) -> Result<()> {
    let gateway = Arc::new(FlutterwaveGateway::new(config)?);
    let service = ConfirmationService::new(
        PaymentVerifier::new(gateway),
        Arc::new(FileRecoveryStore::new(session_file)),
        RetryPolicy::default(),
    );

    let confirmation = service.confirm(&redirect).await?;
    if !confirmation.is_confirmed() {
        return Err(miette!("{}", confirmation.state));
    }
    println!("{}", confirmation.state);
    Ok(())
}

async fn applications(
    service: ApplicationSubmissionService,
    command: ApplicationCommand,
) -> Result<()> {
    match command {
        ApplicationCommand::Draft { file, id } => {
            let sections = read_sections(File::open(file).into_diagnostic()?)?;
            let existing = id.as_deref().map(ApplicationId::from_str).transpose()?;
            let id = service.save_draft(sections.into(), existing).await?;
            println!("{}", id);
        }
        ApplicationCommand::Submit { file, draft_id } => {
            let sections = read_sections(File::open(file).into_diagnostic()?)?;
            let application = FinalApplication::validate(sections)?;
            let receipt = match draft_id {
                Some(id) => service.submit_draft(id.parse()?, application).await?,
                None => service.submit(application).await?,
            };
            println!("{}", serde_json::to_string(&receipt).into_diagnostic()?);
        }
        ApplicationCommand::List { format } => {
            let records = service.list().await?;
            match format {
                Format::Csv => {
                    let stdout = io::stdout();
                    ApplicationWriter::new(stdout.lock()).write_applications(&records)?;
                }
                Format::Json => {
                    println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
                }
            }
        }
        ApplicationCommand::Show { id } => {
            let record = service
                .get_by_id(id.parse()?)
                .await?
                .ok_or_else(|| miette!("application {} not found", id))?;
            println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?);
        }
    }
    Ok(())
}
