//! Completion status codes for directions requests.
//!
//! Every request ends with exactly one [`StatusCode`]. Provider-level
//! outcomes (`Ok`, `ZeroResults`, `NotFound`, ...) are reported as named
//! variants; transport failures are reported as [`StatusCode::Http`]
//! carrying the transport code, whose numeric form is offset by
//! [`HTTP_ERROR_BASE`].

use std::fmt;

use crate::transport::TRANSPORT_CANCELLED;

/// Numeric offset added to transport codes in [`StatusCode::code`].
pub const HTTP_ERROR_BASE: u32 = 100;

/// Outcome of a directions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    /// The request succeeded but produced no routes.
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    /// Malformed request or unparseable response.
    InvalidRequest,
    /// No route could be found between the waypoints.
    NotFound,
    MaxWaypointsExceeded,
    UnknownError,
    /// Fewer than two waypoints, or a provider whose step limit is below two.
    BadArguments,
    /// A bounded wait for completion expired.
    Timeout,
    /// Transport-level failure carrying the transport or HTTP status code.
    Http(u32),
}

impl StatusCode {
    /// Stable numeric representation.
    pub fn code(&self) -> u32 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::ZeroResults => 1,
            StatusCode::OverQueryLimit => 2,
            StatusCode::RequestDenied => 3,
            StatusCode::InvalidRequest => 4,
            StatusCode::NotFound => 5,
            StatusCode::MaxWaypointsExceeded => 6,
            StatusCode::UnknownError => 7,
            StatusCode::BadArguments => 8,
            StatusCode::Timeout => 9,
            StatusCode::Http(code) => HTTP_ERROR_BASE + code,
        }
    }

    /// Inverse of [`StatusCode::code`].
    ///
    /// Values in the unassigned range between the named codes and
    /// [`HTTP_ERROR_BASE`] map to `UnknownError`.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => StatusCode::Ok,
            1 => StatusCode::ZeroResults,
            2 => StatusCode::OverQueryLimit,
            3 => StatusCode::RequestDenied,
            4 => StatusCode::InvalidRequest,
            5 => StatusCode::NotFound,
            6 => StatusCode::MaxWaypointsExceeded,
            8 => StatusCode::BadArguments,
            9 => StatusCode::Timeout,
            c if c >= HTTP_ERROR_BASE => StatusCode::Http(c - HTTP_ERROR_BASE),
            _ => StatusCode::UnknownError,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// True when the request was cancelled before completing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StatusCode::Http(code) if *code == TRANSPORT_CANCELLED)
    }

    /// Transport code carried by an `Http` status.
    pub fn transport_code(&self) -> Option<u32> {
        match self {
            StatusCode::Http(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Ok => write!(f, "OK"),
            StatusCode::ZeroResults => write!(f, "ZERO_RESULTS"),
            StatusCode::OverQueryLimit => write!(f, "OVER_QUERY_LIMIT"),
            StatusCode::RequestDenied => write!(f, "REQUEST_DENIED"),
            StatusCode::InvalidRequest => write!(f, "INVALID_REQUEST"),
            StatusCode::NotFound => write!(f, "NOT_FOUND"),
            StatusCode::MaxWaypointsExceeded => write!(f, "MAX_WAYPOINTS_EXCEEDED"),
            StatusCode::UnknownError => write!(f, "UNKNOWN_ERROR"),
            StatusCode::BadArguments => write!(f, "BAD_ARGUMENTS"),
            StatusCode::Timeout => write!(f, "TIMEOUT"),
            StatusCode::Http(code) if *code == TRANSPORT_CANCELLED => {
                write!(f, "HTTP_ERROR({}: cancelled)", code)
            }
            StatusCode::Http(code) => write!(f, "HTTP_ERROR({})", code),
        }
    }
}
