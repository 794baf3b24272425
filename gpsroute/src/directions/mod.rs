//! Chunked, cancellable directions loading.
//!
//! - [`chunk`] - splitting waypoint lists into provider-sized pieces
//! - [`throttle`] - minimum spacing between requests
//! - [`DirectionsFetcher`] - the asynchronous load state machine

pub mod chunk;
mod fetcher;
pub mod throttle;

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::route::Route;
use crate::status::StatusCode;

pub use chunk::{chunk_count, split_into_chunks};
pub use fetcher::{DirectionsFetcher, EndCallback, FetchState};
pub use throttle::RequestThrottle;

#[cfg(test)]
pub(crate) use fetcher::tests::{line, script_echo, EchoProvider};

/// Invokes an end callback, logging instead of propagating a panic.
pub(crate) fn notify_guarded(callback: &EndCallback, status: StatusCode, routes: &[Route]) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(status, routes))) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        warn!(status = %status, panic = %message, "directions callback panicked");
    }
}
