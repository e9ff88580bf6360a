//! Client side of the board: session, typed record access, normalized store
//! and the derived board view.
//!
//! Everything here talks to the record API over HTTP. Ownership is enforced
//! only in this layer: records whose `user_id` differs from the session id are
//! filtered out or refused.

pub mod actions;
pub mod api;
pub mod autosave;
pub mod dashboard;
pub mod error;
pub mod services;
pub mod session;
pub mod store;
pub mod validate;
pub mod view;

pub use actions::TaskboardClient;
pub use api::ApiClient;
pub use error::ClientError;
pub use session::{Session, SessionUser};
