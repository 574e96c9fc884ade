use std::{
    path::Path,
    sync::{mpsc, Arc, Mutex},
};

use crate::{
    domain::events::AppEvent,
    infra::{
        self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError,
        storage_layout::StorageLayout,
    },
    remote::{JournalMessageStore, LocalAuthService},
    ui::CrosstermEventSource,
    usecases::{
        context::AppContext,
        contracts::{AppEventSource, ShellOrchestrator},
        send_coordinator::AckSink,
        session_gate::SessionGate,
        shell::ChatShellOrchestrator,
    },
};

const SHELL_SUBSCRIBE_FAILED: &str = "SHELL_SUBSCRIBE_FAILED";

pub struct ShellComposition {
    pub event_source: Box<dyn AppEventSource>,
    pub orchestrator: Box<dyn ShellOrchestrator>,
}

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    let guard = infra::logging::init(&context.config.logging, &context.layout.log_dir)?;

    tracing::info!(
        data_dir = %context.layout.data_dir.display(),
        collection = %context.config.store.collection,
        "application context ready"
    );

    Ok(context.with_log_guard(guard))
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load()?;

    let layout = StorageLayout::resolve(&config.store)?;
    layout.ensure_dirs()?;

    let store = JournalMessageStore::open(&layout.journal_dir, config.store.poll_interval())?;

    Ok(AppContext::new(config, layout, store))
}

/// Wires the signed-in session to the store and the terminal event source.
///
/// Store callbacks run on store threads; both are forwarded into the event
/// source's channel so the shell applies them on the UI loop.
pub fn compose_shell(
    context: &AppContext,
    gate: SessionGate<LocalAuthService>,
) -> anyhow::Result<ShellComposition> {
    let (tx, rx) = mpsc::channel();

    let ack_tx = Mutex::new(tx.clone());
    let ack: AckSink = Arc::new(move |outcome| {
        if let Ok(tx) = ack_tx.lock() {
            let _ = tx.send(AppEvent::SendAcknowledged(outcome));
        }
    });

    let mut orchestrator = ChatShellOrchestrator::new(
        gate,
        Arc::clone(&context.store),
        &context.config.store.collection,
        ack,
    );

    orchestrator
        .start(Box::new(move |subscription, record| {
            let _ = tx.send(AppEvent::FeedRecord {
                subscription,
                record,
            });
        }))
        .inspect_err(|error| {
            tracing::error!(
                code = SHELL_SUBSCRIBE_FAILED,
                error = %error,
                "feed subscription failed"
            );
        })?;

    Ok(ShellComposition {
        event_source: Box::new(CrosstermEventSource::new(rx)),
        orchestrator: Box::new(orchestrator),
    })
}
