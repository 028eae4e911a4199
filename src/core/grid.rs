//! Grid mapper - pixel <-> (lane, day) transform and the pixel projection
//! of schedule items

use super::geometry::{Point, Rect};
use super::item::ScheduleItem;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative distance under which a cell coordinate counts as sitting exactly
/// on a cell boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Timeline scale. One unit spans `days_per_unit` day columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayUnit {
    Day,
    Week,
    Month,
    Quarter,
}

impl Default for DayUnit {
    fn default() -> Self {
        Self::Day
    }
}

impl DayUnit {
    pub fn days_per_unit(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 91,
        }
    }
}

impl fmt::Display for DayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
        }
    }
}

/// A discrete grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub lane: usize,
    pub day: usize,
}

impl GridCoord {
    pub fn new(lane: usize, day: usize) -> Self {
        Self { lane, day }
    }
}

/// Lane/day grid laid over the canvas.
///
/// Canvas size is derived: `lane_count * lane_height` by
/// `day_count * day_width()`. Changing the day unit only changes
/// `day_width()`; item rectangles are always re-projected from dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub lane_count: usize,
    pub day_count: usize,
    pub day_unit: DayUnit,
    /// Calendar date of day column 0
    pub origin: NaiveDate,
    pub lane_height: f64,
    /// Pixel width of one timeline unit
    pub unit_width: f64,
}

impl Grid {
    /// Pixel width of a single day under the current unit
    pub fn day_width(&self) -> f64 {
        self.unit_width / f64::from(self.day_unit.days_per_unit())
    }

    pub fn canvas_width(&self) -> f64 {
        self.day_count as f64 * self.day_width()
    }

    pub fn canvas_height(&self) -> f64 {
        self.lane_count as f64 * self.lane_height
    }

    /// Cell under `pixel`, or `None` when the pointer is off the grid.
    ///
    /// Callers abort the gesture on `None`; the coordinate is never clamped.
    pub fn to_grid(&self, pixel: Point) -> Option<GridCoord> {
        let lane = cell_index(pixel.y, self.canvas_height(), self.lane_count)?;
        let day = cell_index(pixel.x, self.canvas_width(), self.day_count)?;
        Some(GridCoord { lane, day })
    }

    /// Top-left pixel of `coord`
    pub fn to_pixel(&self, coord: GridCoord) -> Point {
        Point::new(
            coord.day as f64 / self.day_count as f64 * self.canvas_width(),
            coord.lane as f64 / self.lane_count as f64 * self.canvas_height(),
        )
    }

    /// Day column of `date` relative to the origin (negative before it)
    pub fn day_of(&self, date: NaiveDate) -> i64 {
        (date - self.origin).num_days()
    }

    /// Date of day column `day`, saturating at `NaiveDate::MAX`
    pub fn date_of(&self, day: usize) -> NaiveDate {
        self.origin
            .checked_add_days(Days::new(day as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Pixel rectangle of an item, computed from its dates and lane only
    pub fn item_rect(&self, item: &ScheduleItem) -> Rect {
        let day_width = self.day_width();
        Rect::new(
            self.day_of(item.start) as f64 * day_width,
            item.lane as f64 * self.lane_height,
            f64::from(item.duration_days) * day_width,
            self.lane_height,
        )
    }

    pub fn contains_lane(&self, lane: usize) -> bool {
        lane < self.lane_count
    }
}

/// `floor(pos / extent * count)` with boundary snapping, or `None` when the
/// result falls outside `0..count`.
fn cell_index(pos: f64, extent: f64, count: usize) -> Option<usize> {
    if count == 0 || !pos.is_finite() || pos < 0.0 || extent <= 0.0 {
        return None;
    }

    let raw = pos / extent * count as f64;
    let nearest = raw.round();
    let index = if (raw - nearest).abs() < BOUNDARY_EPSILON {
        nearest
    } else {
        raw.floor()
    };

    if index >= count as f64 {
        return None;
    }
    Some(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemId;

    fn grid() -> Grid {
        Grid {
            lane_count: 20,
            day_count: 31,
            day_unit: DayUnit::Day,
            origin: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            lane_height: 36.0,
            unit_width: 1280.0 / 31.0,
        }
    }

    #[test]
    fn test_default_canvas_is_1280_by_720() {
        let grid = grid();
        assert!((grid.canvas_width() - 1280.0).abs() < 1e-9);
        assert_eq!(grid.canvas_height(), 720.0);
    }

    #[test]
    fn test_to_grid_floors_inside_cell() {
        let grid = grid();
        let coord = grid.to_grid(Point::new(100.0, 80.0)).unwrap();
        assert_eq!(coord, GridCoord::new(2, 2));
    }

    #[test]
    fn test_to_grid_rejects_outside() {
        let grid = grid();
        assert_eq!(grid.to_grid(Point::new(10.0, 720.0)), None);
        assert_eq!(grid.to_grid(Point::new(10.0, 9000.0)), None);
        assert_eq!(grid.to_grid(Point::new(1280.0, 10.0)), None);
        assert_eq!(grid.to_grid(Point::new(-1.0, 10.0)), None);
        assert_eq!(grid.to_grid(Point::new(f64::NAN, 10.0)), None);
    }

    #[test]
    fn test_round_trip_every_cell() {
        let grid = grid();
        for lane in 0..grid.lane_count {
            for day in 0..grid.day_count {
                let coord = GridCoord::new(lane, day);
                assert_eq!(grid.to_grid(grid.to_pixel(coord)), Some(coord));
            }
        }
    }

    #[test]
    fn test_item_rect_follows_unit() {
        let mut grid = grid();
        grid.unit_width = 70.0;
        let item = ScheduleItem::new(ItemId(1), 2, grid.date_of(3), 4);

        assert_eq!(grid.item_rect(&item), Rect::new(210.0, 72.0, 280.0, 36.0));

        grid.day_unit = DayUnit::Week;
        assert_eq!(grid.item_rect(&item), Rect::new(30.0, 72.0, 40.0, 36.0));

        grid.day_unit = DayUnit::Day;
        assert_eq!(grid.item_rect(&item), Rect::new(210.0, 72.0, 280.0, 36.0));
    }

    #[test]
    fn test_dates_and_days() {
        let grid = grid();
        let date = grid.date_of(10);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(grid.day_of(date), 10);
        assert_eq!(grid.day_of(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()), -2);
        assert_eq!(grid.date_of(usize::MAX), NaiveDate::MAX);
    }
}
