//! Remote collaborators: message store and credential service adapters.

pub mod journal_store;
pub mod local_auth;
#[cfg(test)]
pub mod memory_store;

pub use journal_store::JournalMessageStore;
pub use local_auth::LocalAuthService;

/// Returns the remote module name for smoke checks.
pub fn module_name() -> &'static str {
    "remote"
}
