//! HTTP API Collaborators
//!
//! The two non-VM backends: a disposable-mailbox API and a lab-credential
//! API. Both are opaque request/response JSON endpoints; both produce the
//! same [`AccountRecord`] the VM flow does.
//!
//! [`AccountRecord`]: crate::models::AccountRecord

pub mod lab;
pub mod mailbox;

// Re-exports for convenience
pub use lab::{LabClient, LabCredential, RecaptchaTokens, LAB_METHOD};
pub use mailbox::{InboxMessage, MailboxClient, MailboxRequest, MAILBOX_METHOD};
