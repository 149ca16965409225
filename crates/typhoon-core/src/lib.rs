pub mod api;
pub mod composer;
pub mod config;
pub mod notification;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use api::{ApiError, ChatBackend, ChatClient};
pub use composer::{Attachment, Composer, SendRequest};
pub use config::Config;
pub use notification::{DismissReason, Notification};
pub use session::{SendStatus, Session, TurnOutcome};
pub use state::{MessageEntry, Sender};
pub use transcript::Transcript;
