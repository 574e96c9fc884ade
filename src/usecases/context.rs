use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    infra::{config::AppConfig, storage_layout::StorageLayout},
    remote::{JournalMessageStore, LocalAuthService},
    usecases::session_gate::SessionGate,
};

#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub layout: StorageLayout,
    pub store: Arc<JournalMessageStore>,
    _log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig, layout: StorageLayout, store: JournalMessageStore) -> Self {
        Self {
            config,
            layout,
            store: Arc::new(store),
            _log_guard: None,
        }
    }

    pub fn with_log_guard(mut self, guard: WorkerGuard) -> Self {
        self._log_guard = Some(guard);
        self
    }

    /// A fresh gate over the accounts file in this context's data dir.
    pub fn session_gate(&self) -> SessionGate<LocalAuthService> {
        SessionGate::new(LocalAuthService::new(&self.layout.data_dir))
    }
}
