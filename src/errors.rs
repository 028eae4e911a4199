//! Crate-wide error types

use crate::core::{ItemId, LinkId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by graph and editor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GanttError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(#[from] InvalidOperation),

    #[error("Pointer ({x}, {y}) is outside the grid")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Malformed connector descriptor: {0}")]
    MalformedData(#[from] DescriptorError),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

/// Reasons an operation is rejected as a whole
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    #[error("{link} has no free endpoint")]
    NoFreeEndpoint { link: LinkId },

    #[error("lane {lane} is already occupied by {occupant}")]
    LaneOccupied { lane: usize, occupant: ItemId },

    #[error("lane {lane} does not exist (grid has {lane_count} lanes)")]
    LaneOutOfRange { lane: usize, lane_count: usize },

    #[error("duration must be at least one day")]
    ZeroDuration,

    #[error("{duration_days}d from {start} ends past the last supported date")]
    DateOutOfRange { start: NaiveDate, duration_days: u32 },

    #[error("self-referencing {link} on {item} is not allowed")]
    SelfLoop { link: LinkId, item: ItemId },

    #[error("no {0} gesture in progress")]
    NoActiveGesture(&'static str),

    #[error("a {0} gesture is already in progress")]
    GestureInProgress(&'static str),
}

/// Why a connector descriptor failed to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("expected 8 tokens, found {found}")]
    TokenCount { found: usize },

    #[error("token {index} must start with '{expected}'")]
    MissingCommand { index: usize, expected: char },

    #[error("token {index} is not a number: {token:?}")]
    BadNumber { index: usize, token: String },
}

pub type Result<T> = std::result::Result<T, GanttError>;
