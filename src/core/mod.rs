//! Core engine - schedule items, grid mapping, connector geometry,
//! dependency graph and conflict propagation

pub mod conflicts;
pub mod geometry;
pub mod graph;
pub mod grid;
mod item;

pub use conflicts::{scan, ConflictReport, ConflictStatus, ScheduleSource, ScheduleWindow};
pub use geometry::{connector_endpoint, ConnectorCurve, ControlOffset, Point, Rect, Side};
pub use graph::{DependencyGraph, Endpoint, Link, LinkPolicy, Neighbor};
pub use grid::{DayUnit, Grid, GridCoord};
pub use item::{IdCounter, ItemId, LinkId, ScheduleItem};
