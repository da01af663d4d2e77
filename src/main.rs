use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hcr_core::{ActionHandle, ActionKind, ConnectionManager, Orchestrator, Session};

mod command;
mod render;

use command::Command;

/// Interactive console for the healthcare records service.
///
/// Connects once at start-up, redraws whenever the session changes and runs every
/// action as an independent task so a slow confirmation never blocks input.
///
/// # Environment Variables
/// - `HCR_RPC_URL`: JSON-RPC endpoint of the wallet agent (unset: no agent)
/// - `HCR_CONTRACT_ADDRESS`: records service address
/// - `HCR_SUBJECT_NAME`: name sent with new records (default: "Alice")
/// - `HCR_RECEIPT_POLL_MS`: confirmation poll interval (default: 1000)
/// - `HCR_CONFIRMATION_TIMEOUT_MS`: optional confirmation timeout
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hcr=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Arc::new(hcr_core::load_from_env()?);
    tracing::info!("records service at {}", cfg.contract_address());
    let session = Arc::new(Session::new());
    let orchestrator = Orchestrator::new(cfg.clone(), session.clone());

    let mut changes = session.subscribe();
    let redraw = tokio::spawn(async move {
        let mut last = String::new();
        while changes.changed().await.is_ok() {
            let view = render::render(&changes.borrow_and_update());
            if view != last {
                println!("{view}");
                last = view;
            }
        }
    });

    let manager = ConnectionManager::new(cfg.clone(), hcr_core::detect_agent(&cfg));
    if orchestrator.connect(&manager).await.is_err() {
        eprintln!("Not connected to a wallet; records cannot be loaded this session.");
    }
    println!("{}", render::render(&session.snapshot()));
    println!("{}", command::HELP);

    run_console(BufReader::new(tokio::io::stdin()), &orchestrator).await?;

    redraw.abort();
    Ok(())
}

/// Apply commands from `input` until `quit` or end of input.
///
/// At end of input the actions still in flight are awaited, so a piped script such as
/// `id 42` then `fetch` completes. `quit` cancels them instead.
async fn run_console<R>(input: R, orchestrator: &Orchestrator) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let session = orchestrator.session();
    let mut actions: Vec<ActionHandle> = Vec::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match command::parse(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(word)) => {
                eprintln!("Unknown command '{word}'. Type 'help' for commands.");
                continue;
            }
        };

        actions.retain(|action| !action.is_finished());
        match command {
            Command::SubjectId(value) => session.set_subject_id(value),
            Command::Diagnosis(value) => session.set_diagnosis(value),
            Command::Treatment(value) => session.set_treatment(value),
            Command::ProviderAddress(value) => session.set_provider_address(value),
            Command::Fetch => actions.push(orchestrator.spawn(ActionKind::Fetch)),
            Command::Add => actions.push(orchestrator.spawn(ActionKind::AddRecord)),
            Command::Authorize => actions.push(orchestrator.spawn(ActionKind::AuthorizeProvider)),
            Command::Show => println!("{}", render::render(&session.snapshot())),
            Command::Help => println!("{}", command::HELP),
            Command::Quit => {
                for action in &actions {
                    action.abort();
                }
                return Ok(());
            }
        }
    }

    if !actions.is_empty() {
        tracing::info!("end of input, waiting for {} action(s)", actions.len());
    }
    for action in actions {
        let kind = action.kind();
        if action.join().await.is_none() {
            tracing::warn!("{kind} was cancelled");
        }
    }
    Ok(())
}
