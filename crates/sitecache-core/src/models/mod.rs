//! Wire types shared with the backend.
//!
//! - `Envelope`: the `{success, data, message}` wrapper every route returns

pub mod envelope;

pub use envelope::Envelope;
