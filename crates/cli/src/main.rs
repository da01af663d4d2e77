use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hcr_core::constants::MSG_RECORD_ADDED;
use hcr_core::{ConnectionManager, Orchestrator, Role, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hcr")]
#[command(about = "Healthcare records client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the connected account and its role
    Status,
    /// Fetch the records of a patient
    Fetch {
        /// Patient ID (positive integer)
        subject_id: String,
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a record for a patient and wait for confirmation
    Add {
        /// Patient ID (positive integer)
        subject_id: String,
        /// Diagnosis
        diagnosis: String,
        /// Treatment
        treatment: String,
    },
    /// Authorize a provider to add records (contract owner only)
    Authorize {
        /// Provider address (40 hex characters)
        provider: String,
    },
}

fn print_notice(session: &Session) {
    if let Some(notice) = session.snapshot().last_notice {
        println!("{}", notice.message);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hcr=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Arc::new(hcr_core::load_from_env()?);
    let session = Arc::new(Session::new());
    let orchestrator = Orchestrator::new(cfg.clone(), session.clone());
    let manager = ConnectionManager::new(cfg.clone(), hcr_core::detect_agent(&cfg));

    let connection = match orchestrator.connect(&manager).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Error connecting to wallet: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let succeeded = match cli.command {
        Commands::Status => {
            println!("Connected Account: {}", connection.identity());
            if connection.role() == Role::Owner {
                println!("You are the contract owner");
            }
            println!("Records service: {}", cfg.contract_address());
            true
        }
        Commands::Fetch { subject_id, json } => {
            session.set_subject_id(subject_id);
            match orchestrator.fetch_records().await {
                Ok(collection) if json => {
                    println!("{}", serde_json::to_string_pretty(&collection.records)?);
                    true
                }
                Ok(collection) => {
                    if collection.records.is_empty() {
                        println!("No records found.");
                    }
                    for record in &collection.records {
                        println!("{}\n", record);
                    }
                    true
                }
                Err(_) => {
                    print_notice(&session);
                    false
                }
            }
        }
        Commands::Add {
            subject_id,
            diagnosis,
            treatment,
        } => {
            session.set_subject_id(subject_id);
            session.set_diagnosis(diagnosis);
            session.set_treatment(treatment);
            let result = orchestrator.add_record().await;
            // The refresh that follows a successful add may have replaced the notice.
            match result {
                Ok(receipt) => {
                    println!("{}", MSG_RECORD_ADDED);
                    println!("Transaction: {}", receipt.transaction_hash);
                    println!(
                        "Patient now has {} record(s).",
                        session.snapshot().records.records.len()
                    );
                    true
                }
                Err(_) => {
                    print_notice(&session);
                    false
                }
            }
        }
        Commands::Authorize { provider } => {
            session.set_provider_address(provider);
            let result = orchestrator.authorize_provider().await;
            print_notice(&session);
            result.is_ok()
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
