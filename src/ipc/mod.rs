//! Newline-delimited JSON protocol spoken with the front-end.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
