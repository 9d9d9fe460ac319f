//! Transport seam for backend reads.
//!
//! The rest of the crate talks to the backend only through the
//! [`Transport`] trait. [`ApiClient`] is the reqwest-backed implementation
//! used by the CLI; tests substitute a scripted transport.
//!
//! The backend wraps every response in a `{success, data, message}`
//! envelope (see [`crate::models::Envelope`]).

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::Transport;
