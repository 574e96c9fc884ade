//! Domain layer: core entities and business rules.

pub mod compose_buffer;
pub mod composition;
pub mod events;
pub mod identity;
pub mod list_projection;
pub mod message;
pub mod message_feed;
pub mod shell_state;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
