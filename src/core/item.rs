//! Schedule items and identifiers

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a schedule item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// Identifier of a dependency link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Monotonic id source shared by items and links.
///
/// Items and links draw from the same sequence, so an item id never
/// collides with a link id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdCounter(u64);

impl IdCounter {
    /// Resume from a persisted counter value
    pub fn starting_at(next: u64) -> Self {
        Self(next)
    }

    /// Value the next allocation will return
    pub fn peek(&self) -> u64 {
        self.0
    }

    pub fn next_item(&mut self) -> ItemId {
        ItemId(self.bump())
    }

    pub fn next_link(&mut self) -> LinkId {
        LinkId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// A schedulable block on one lane of the timeline.
///
/// Dates are the only timing authority; the pixel rectangle is projected
/// from them by [`Grid::item_rect`](crate::core::Grid::item_rect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ItemId,
    pub lane: usize,
    pub start: NaiveDate,
    pub duration_days: u32,
}

impl ScheduleItem {
    pub fn new(id: ItemId, lane: usize, start: NaiveDate, duration_days: u32) -> Self {
        Self {
            id,
            lane,
            start,
            duration_days,
        }
    }

    /// Exclusive end date, or `None` past the last representable date
    pub fn checked_end(&self) -> Option<NaiveDate> {
        self.start
            .checked_add_days(Days::new(u64::from(self.duration_days)))
    }

    /// Exclusive end date (`start + duration`), saturating at `NaiveDate::MAX`
    pub fn end(&self) -> NaiveDate {
        self.checked_end().unwrap_or(NaiveDate::MAX)
    }

    /// Last calendar day the item occupies
    pub fn last_day(&self) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(u64::from(self.duration_days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX)
    }
}
