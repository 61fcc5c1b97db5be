/// Admin List-Management Screens
///
/// One module per admin entity. Each defines the record, its closed status
/// enumeration, the transition table, dashboard summary, seed data and the
/// create payload.

pub mod audit;
pub mod content;
pub mod invoices;
pub mod kyc;
pub mod notifications;
pub mod payments;
pub mod roles;
pub mod subscriptions;
pub mod templates;

pub use audit::{AuditLog, AuditLogEntry};
pub use content::ContentItem;
pub use invoices::Invoice;
pub use kyc::KycCase;
pub use notifications::Notification;
pub use payments::Payment;
pub use roles::Role;
pub use subscriptions::Subscription;
pub use templates::Template;

/// Currency assumed when a create payload omits one
pub(crate) fn default_currency() -> String {
    "USD".to_string()
}
