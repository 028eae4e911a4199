//! Editor state - the only writer of the grid, the dependency graph and the
//! item collection.
//!
//! Every operation validates completely before touching state, so a rejected
//! request leaves everything as it was. Rejections are also recorded as a
//! status message the UI can show.

use crate::config::EditorConfig;
use crate::core::{
    connector_endpoint, scan, ConflictReport, ConnectorCurve, ControlOffset, DayUnit,
    DependencyGraph, Endpoint, Grid, GridCoord, IdCounter, ItemId, Link, LinkId, Point, Rect,
    ScheduleItem, Side,
};
use crate::errors::{GanttError, InvalidOperation, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// What the UI needs to draw an item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub lane: usize,
    pub rect: Rect,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// What the UI needs to draw a link
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: LinkId,
    pub descriptor: String,
    pub origin_id: Option<ItemId>,
    pub end_id: Option<ItemId>,
}

/// Private copy of an item being dragged. Published only by `end_drag`.
#[derive(Debug, Clone)]
struct DragSnapshot {
    original: ScheduleItem,
    preview: ScheduleItem,
}

/// Owns all mutable scheduling state
#[derive(Debug, Clone)]
pub struct Editor {
    grid: Grid,
    graph: DependencyGraph,
    items: BTreeMap<ItemId, ScheduleItem>,
    /// lane -> occupant
    lanes: BTreeMap<usize, ItemId>,
    ids: IdCounter,
    control_offset: ControlOffset,
    default_duration_days: u32,
    drag: Option<DragSnapshot>,
    pending_link: Option<LinkId>,
    status_message: Option<String>,
}

impl Editor {
    /// Create an empty editor
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_grid(config, config.grid())
    }

    /// Create an empty editor over an explicit grid
    pub fn with_grid(config: &EditorConfig, grid: Grid) -> Self {
        Self {
            grid,
            graph: DependencyGraph::new(config.link_policy),
            items: BTreeMap::new(),
            lanes: BTreeMap::new(),
            ids: IdCounter::default(),
            control_offset: config.control_offset,
            default_duration_days: config.default_duration_days.max(1),
            drag: None,
            pending_link: None,
            status_message: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn item(&self, id: ItemId) -> Option<&ScheduleItem> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ScheduleItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Item occupying `lane`, if any
    pub fn occupant(&self, lane: usize) -> Option<ItemId> {
        self.lanes.get(&lane).copied()
    }

    pub fn id_counter(&self) -> IdCounter {
        self.ids
    }

    /// Message describing the last rejected request
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    // ---- items ----

    /// Create an item in the cell under `pixel` with the default duration
    pub fn create_item_at(&mut self, pixel: Point) -> Result<ItemId> {
        let result = self.try_create_at(pixel);
        self.record(result)
    }

    pub fn create_item(&mut self, lane: usize, start: NaiveDate, duration_days: u32) -> Result<ItemId> {
        let result = self.try_create(lane, start, duration_days);
        self.record(result)
    }

    /// Move an item to another lane and/or start date, keeping its duration
    pub fn move_item(&mut self, id: ItemId, lane: usize, start: NaiveDate) -> Result<()> {
        let result = self.try_move(id, lane, start);
        self.record(result)
    }

    /// Move an item to the cell under `pixel`
    pub fn move_item_to(&mut self, id: ItemId, pixel: Point) -> Result<()> {
        let result = self.try_move_to(id, pixel);
        self.record(result)
    }

    pub fn resize_item(&mut self, id: ItemId, duration_days: u32) -> Result<()> {
        let result = self.try_resize(id, duration_days);
        self.record(result)
    }

    /// Resize so the day column under `pixel` becomes the item's last day
    pub fn resize_item_to(&mut self, id: ItemId, pixel: Point) -> Result<()> {
        let result = self.try_resize_to(id, pixel);
        self.record(result)
    }

    /// Delete an item and every link touching it
    pub fn delete_item(&mut self, id: ItemId) -> Result<Vec<LinkId>> {
        let result = self.try_delete(id);
        self.record(result)
    }

    // ---- drag gesture ----

    /// Start dragging `id`. The committed item stays where it is until
    /// [`end_drag`](Self::end_drag).
    pub fn begin_drag(&mut self, id: ItemId) -> Result<()> {
        let result = if self.drag.is_some() {
            Err(InvalidOperation::GestureInProgress("drag").into())
        } else {
            match self.items.get(&id) {
                Some(item) => {
                    self.drag = Some(DragSnapshot {
                        original: item.clone(),
                        preview: item.clone(),
                    });
                    Ok(())
                }
                None => Err(GanttError::ItemNotFound(id)),
            }
        };
        self.record(result)
    }

    /// Update the drag preview. Off-grid positions keep the previous preview.
    pub fn drag_to(&mut self, pixel: Point) -> Result<GridCoord> {
        let result = match self.drag.as_ref() {
            None => Err(InvalidOperation::NoActiveGesture("drag").into()),
            Some(_) => self.locate(pixel),
        };
        if let (Ok(coord), Some(drag)) = (&result, self.drag.as_mut()) {
            drag.preview.lane = coord.lane;
            drag.preview.start = self.grid.date_of(coord.day);
        }
        self.record(result)
    }

    /// Publish the drag preview as one move
    pub fn end_drag(&mut self) -> Result<()> {
        let result = match self.drag.take() {
            None => Err(InvalidOperation::NoActiveGesture("drag").into()),
            Some(drag) if drag.preview == drag.original => Ok(()),
            Some(drag) => {
                let item = drag.preview;
                self.try_move(item.id, item.lane, item.start)
            }
        };
        self.record(result)
    }

    /// Abandon the drag; nothing was published so nothing is rolled back
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            log::debug!("drag of {} cancelled", drag.original.id);
        }
    }

    /// Where the dragged item would land if the drag ended now
    pub fn drag_preview(&self) -> Option<ItemView> {
        self.drag.as_ref().map(|drag| self.view_of(&drag.preview))
    }

    // ---- links ----

    /// Start drawing a link out of `origin`. The link stays pending until
    /// [`complete_link`](Self::complete_link).
    pub fn begin_link(&mut self, origin: ItemId) -> Result<LinkId> {
        let result = if self.pending_link.is_some() {
            Err(InvalidOperation::GestureInProgress("link").into())
        } else if !self.items.contains_key(&origin) {
            Err(GanttError::ItemNotFound(origin))
        } else {
            let link = self.ids.next_link();
            self.graph.add_link(origin, link).map(|_| {
                self.pending_link = Some(link);
                log::debug!("{} started from {}", link, origin);
                link
            })
        };
        self.record(result)
    }

    /// Attach `end` to the pending link. On rejection the link stays pending.
    pub fn complete_link(&mut self, end: ItemId) -> Result<LinkId> {
        let result = match self.pending_link {
            None => Err(InvalidOperation::NoActiveGesture("link").into()),
            Some(link) => self.try_attach(end, link).map(|_| {
                self.pending_link = None;
                log::info!("{} completed at {}", link, end);
                link
            }),
        };
        self.record(result)
    }

    /// Drop the pending link
    pub fn cancel_link(&mut self) -> Result<()> {
        let result = match self.pending_link.take() {
            None => Err(InvalidOperation::NoActiveGesture("link").into()),
            Some(link) => self.graph.remove_link(link).map(|_| ()),
        };
        self.record(result)
    }

    /// Assign `item` to the next free endpoint of an existing link
    pub fn attach_link(&mut self, item: ItemId, link: LinkId) -> Result<Endpoint> {
        let result = self.try_attach(item, link);
        if matches!(result, Ok(Endpoint::End)) && self.pending_link == Some(link) {
            self.pending_link = None;
        }
        self.record(result)
    }

    pub fn delete_link(&mut self, id: LinkId) -> Result<Link> {
        let result = self.graph.remove_link(id);
        if result.is_ok() && self.pending_link == Some(id) {
            self.pending_link = None;
        }
        self.record(result)
    }

    pub fn pending_link(&self) -> Option<LinkId> {
        self.pending_link
    }

    /// The pending link drawn from its origin to the pointer
    pub fn pending_link_view(&self, pointer: Point) -> Option<LinkView> {
        let link = self.graph.link(self.pending_link?)?;
        let origin = self.items.get(&link.origin?)?;
        let curve = ConnectorCurve::toward(&self.grid.item_rect(origin), pointer, self.control_offset);
        Some(LinkView {
            id: link.id,
            descriptor: curve.to_descriptor(),
            origin_id: link.origin,
            end_id: None,
        })
    }

    // ---- grid ----

    /// Rescale the timeline. Item rectangles are re-projected from dates.
    pub fn set_day_unit(&mut self, unit: DayUnit) {
        log::info!("timeline unit {} -> {}", self.grid.day_unit, unit);
        self.grid.day_unit = unit;
    }

    /// Append a lane; returns its index
    pub fn add_lane(&mut self) -> usize {
        self.grid.lane_count += 1;
        self.grid.lane_count - 1
    }

    /// Remove an empty lane, shifting every item below it up by one
    pub fn remove_lane(&mut self, lane: usize) -> Result<()> {
        let result = self.try_remove_lane(lane);
        self.record(result)
    }

    // ---- views ----

    /// Statuses of every item under the committed schedule
    pub fn conflicts(&self) -> ConflictReport {
        scan(&self.graph, &self.items)
    }

    pub fn item_view(&self, id: ItemId) -> Option<ItemView> {
        self.items.get(&id).map(|item| self.view_of(item))
    }

    pub fn item_views(&self) -> Vec<ItemView> {
        self.items.values().map(|item| self.view_of(item)).collect()
    }

    pub fn link_view(&self, id: LinkId) -> Option<LinkView> {
        let link = self.graph.link(id)?;
        let origin = self.grid.item_rect(self.items.get(&link.origin?)?);
        let curve = match link.end {
            Some(end) => {
                let end = self.grid.item_rect(self.items.get(&end)?);
                ConnectorCurve::between(&origin, &end, self.control_offset)
            }
            None => {
                // still being drawn: collapsed onto the origin's anchor
                let head = connector_endpoint(&origin, Side::Right);
                ConnectorCurve {
                    head,
                    c1: head,
                    c2: head,
                    tail: head,
                }
            }
        };
        Some(LinkView {
            id,
            descriptor: curve.to_descriptor(),
            origin_id: link.origin,
            end_id: link.end,
        })
    }

    pub fn link_views(&self) -> Vec<LinkView> {
        self.graph
            .links()
            .filter_map(|link| self.link_view(link.id))
            .collect()
    }

    // ---- restore ----

    /// Insert a persisted item as-is, keeping its id
    pub(crate) fn restore_item(&mut self, item: ScheduleItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(GanttError::InvalidPlan(format!("duplicate item id {}", item.id)));
        }
        self.check_placement(None, item.lane, item.start, item.duration_days)?;
        self.lanes.insert(item.lane, item.id);
        self.graph.add_item(item.id);
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Insert a persisted link, filling endpoints in order
    pub(crate) fn restore_link(&mut self, link: &Link) -> Result<()> {
        if self.graph.link(link.id).is_some() {
            return Err(GanttError::InvalidPlan(format!("duplicate link id {}", link.id)));
        }
        match (link.origin, link.end) {
            (Some(origin), end) => {
                self.graph.add_link(origin, link.id)?;
                if let Some(end) = end {
                    self.graph.add_link(end, link.id)?;
                }
                Ok(())
            }
            (None, _) => Err(GanttError::InvalidPlan(format!("{} has no origin", link.id))),
        }
    }

    pub(crate) fn restore_id_counter(&mut self, ids: IdCounter) {
        self.ids = ids;
    }

    // ---- internals ----

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            log::warn!("rejected: {}", err);
            self.status_message = Some(err.to_string());
        }
        result
    }

    fn locate(&self, pixel: Point) -> Result<GridCoord> {
        self.grid.to_grid(pixel).ok_or(GanttError::OutOfBounds {
            x: pixel.x,
            y: pixel.y,
        })
    }

    /// `moving` is the item being placed, if it already exists; its own lane
    /// does not count as occupied.
    fn check_placement(
        &self,
        moving: Option<ItemId>,
        lane: usize,
        start: NaiveDate,
        duration_days: u32,
    ) -> Result<()> {
        if !self.grid.contains_lane(lane) {
            return Err(InvalidOperation::LaneOutOfRange {
                lane,
                lane_count: self.grid.lane_count,
            }
            .into());
        }
        if let Some(occupant) = self.occupant(lane).filter(|other| Some(*other) != moving) {
            return Err(InvalidOperation::LaneOccupied { lane, occupant }.into());
        }
        check_span(start, duration_days)
    }

    fn try_create_at(&mut self, pixel: Point) -> Result<ItemId> {
        let coord = self.locate(pixel)?;
        let start = self.grid.date_of(coord.day);
        let duration = self.default_duration_days;
        self.try_create(coord.lane, start, duration)
    }

    fn try_create(&mut self, lane: usize, start: NaiveDate, duration_days: u32) -> Result<ItemId> {
        // The id is drawn only once validation passed.
        self.check_placement(None, lane, start, duration_days)?;

        let id = self.ids.next_item();
        self.items
            .insert(id, ScheduleItem::new(id, lane, start, duration_days));
        self.lanes.insert(lane, id);
        self.graph.add_item(id);

        log::info!("created {} in lane {} at {} for {}d", id, lane, start, duration_days);
        Ok(id)
    }

    fn try_move(&mut self, id: ItemId, lane: usize, start: NaiveDate) -> Result<()> {
        let item = self.items.get(&id).ok_or(GanttError::ItemNotFound(id))?;
        self.check_placement(Some(id), lane, start, item.duration_days)?;

        let previous_lane = item.lane;
        self.lanes.remove(&previous_lane);
        self.lanes.insert(lane, id);
        if let Some(item) = self.items.get_mut(&id) {
            item.lane = lane;
            item.start = start;
        }

        log::info!("moved {} to lane {} at {}", id, lane, start);
        Ok(())
    }

    fn try_move_to(&mut self, id: ItemId, pixel: Point) -> Result<()> {
        let coord = self.locate(pixel)?;
        let start = self.grid.date_of(coord.day);
        self.try_move(id, coord.lane, start)
    }

    fn try_resize(&mut self, id: ItemId, duration_days: u32) -> Result<()> {
        let item = self.items.get_mut(&id).ok_or(GanttError::ItemNotFound(id))?;
        check_span(item.start, duration_days)?;
        item.duration_days = duration_days;

        log::info!("resized {} to {}d", id, duration_days);
        Ok(())
    }

    fn try_resize_to(&mut self, id: ItemId, pixel: Point) -> Result<()> {
        let coord = self.locate(pixel)?;
        let item = self.items.get(&id).ok_or(GanttError::ItemNotFound(id))?;
        let span = (self.grid.date_of(coord.day) - item.start).num_days() + 1;
        let duration = u32::try_from(span)
            .ok()
            .filter(|d| *d > 0)
            .ok_or(InvalidOperation::ZeroDuration)?;
        self.try_resize(id, duration)
    }

    fn try_delete(&mut self, id: ItemId) -> Result<Vec<LinkId>> {
        let item = self.items.get(&id).ok_or(GanttError::ItemNotFound(id))?;
        let lane = item.lane;

        let removed = self.graph.remove_item(id)?;
        self.items.remove(&id);
        self.lanes.remove(&lane);

        if self.pending_link.is_some_and(|link| removed.contains(&link)) {
            self.pending_link = None;
        }
        if self.drag.as_ref().is_some_and(|drag| drag.original.id == id) {
            self.drag = None;
        }

        log::info!("deleted {} and {} links", id, removed.len());
        Ok(removed)
    }

    fn try_attach(&mut self, item: ItemId, link: LinkId) -> Result<Endpoint> {
        if self.graph.link(link).is_none() {
            return Err(GanttError::LinkNotFound(link));
        }
        self.graph.add_link(item, link)
    }

    fn try_remove_lane(&mut self, lane: usize) -> Result<()> {
        if !self.grid.contains_lane(lane) {
            return Err(InvalidOperation::LaneOutOfRange {
                lane,
                lane_count: self.grid.lane_count,
            }
            .into());
        }
        if let Some(occupant) = self.occupant(lane) {
            return Err(InvalidOperation::LaneOccupied { lane, occupant }.into());
        }

        // A preview may point at a lane index that is about to shift.
        self.drag = None;
        self.grid.lane_count -= 1;
        for item in self.items.values_mut() {
            if item.lane > lane {
                item.lane -= 1;
            }
        }
        self.lanes = self.items.values().map(|item| (item.lane, item.id)).collect();

        log::info!("removed lane {}", lane);
        Ok(())
    }

    fn view_of(&self, item: &ScheduleItem) -> ItemView {
        ItemView {
            id: item.id,
            lane: item.lane,
            rect: self.grid.item_rect(item),
            start_date: item.start,
            end_date: item.end(),
        }
    }
}

/// Items span at least one day and end on a representable date
fn check_span(start: NaiveDate, duration_days: u32) -> Result<()> {
    if duration_days == 0 {
        return Err(InvalidOperation::ZeroDuration.into());
    }
    if start
        .checked_add_days(Days::new(u64::from(duration_days)))
        .is_none()
    {
        return Err(InvalidOperation::DateOutOfRange {
            start,
            duration_days,
        }
        .into());
    }
    Ok(())
}
