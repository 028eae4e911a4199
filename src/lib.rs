//! Ganttline - lane-based Gantt scheduling engine
//!
//! Schedule items sit on lanes of a (lane, day) grid and are connected by
//! directed dependency links. The crate keeps the dependency graph
//! consistent under editing, classifies every item's schedule against its
//! prerequisites, and derives the connector curves a renderer draws.

pub mod config;
pub mod core;
pub mod editor;
pub mod errors;
pub mod session;

// Re-exports
pub use config::EditorConfig;
pub use core::{
    ConflictReport, ConflictStatus, ConnectorCurve, DayUnit, DependencyGraph, Grid, GridCoord,
    ItemId, LinkId, Point, Rect, ScheduleItem,
};
pub use editor::{Editor, ItemView, LinkView};
pub use errors::{GanttError, Result};
pub use session::PlanState;
