//! Splitting waypoint lists into provider-sized chunks.
//!
//! Consecutive chunks share their boundary waypoint so the concatenated
//! routes form one continuous path. With `max = 3`:
//!
//! ```text
//!   A B C D E      ->  [A B C] [C D E]
//!   A B C D E F    ->  [A B C] [C D E] [E F]
//! ```
//!
//! Each chunk except the last advances the start index by `max - 1`.

use crate::geo::LatLng;

/// Number of chunks needed for `len` waypoints at `max` per request.
///
/// Returns 0 when no chunk can be formed (`len < 2` or `max < 2`).
pub fn chunk_count(len: usize, max: usize) -> usize {
    if len < 2 || max < 2 {
        return 0;
    }
    (len - 2) / (max - 1) + 1
}

/// Splits `waypoints` into overlapping chunks of at most `max` points.
///
/// Returns no chunks when `waypoints.len() < 2` or `max < 2`.
pub fn split_into_chunks(waypoints: &[LatLng], max: usize) -> Vec<Vec<LatLng>> {
    let count = chunk_count(waypoints.len(), max);
    let mut chunks = Vec::with_capacity(count);

    let mut start = 0;
    while chunks.len() < count {
        let end = (start + max).min(waypoints.len());
        chunks.push(waypoints[start..end].to_vec());
        start = end - 1;
    }

    chunks
}
