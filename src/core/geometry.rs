//! Connector geometry - attachment points, Bezier control points and the
//! textual path descriptor exchanged with the renderer.
//!
//! Everything here is a pure function of its inputs.

use crate::errors::DescriptorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Edge of an item a connector can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Bounds applied to the horizontal control-point offset.
///
/// The offset is the item's own width, clamped so that very narrow items
/// still get a visible curve and very wide ones do not overshoot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlOffset {
    pub min: f64,
    pub max: f64,
}

impl Default for ControlOffset {
    fn default() -> Self {
        Self {
            min: 25.0,
            max: 75.0,
        }
    }
}

impl ControlOffset {
    pub fn clamp(&self, width: f64) -> f64 {
        width.max(self.min).min(self.max)
    }
}

/// Midpoint of the requested edge of `rect`
pub fn connector_endpoint(rect: &Rect, side: Side) -> Point {
    match side {
        Side::Right => Point::new(rect.x + rect.width, rect.y + rect.height / 2.0),
        Side::Left => Point::new(rect.x, rect.y + rect.height / 2.0),
        Side::Top => Point::new(rect.x + rect.width / 2.0, rect.y),
        Side::Bottom => Point::new(rect.x + rect.width / 2.0, rect.y + rect.height),
    }
}

/// Cubic Bezier connecting two items: leaves the origin's right edge and
/// enters the end's left edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCurve {
    pub head: Point,
    pub c1: Point,
    pub c2: Point,
    pub tail: Point,
}

impl ConnectorCurve {
    /// Curve between two placed items
    pub fn between(origin: &Rect, end: &Rect, offset: ControlOffset) -> Self {
        Self {
            head: connector_endpoint(origin, Side::Right),
            c1: Point::new(
                origin.x + origin.width + offset.clamp(origin.width),
                origin.center_y(),
            ),
            c2: Point::new(end.x - offset.clamp(end.width), end.center_y()),
            tail: connector_endpoint(end, Side::Left),
        }
    }

    /// Curve of a link still being drawn, ending under the pointer
    pub fn toward(origin: &Rect, pointer: Point, offset: ControlOffset) -> Self {
        Self {
            head: connector_endpoint(origin, Side::Right),
            c1: Point::new(
                origin.x + origin.width + offset.clamp(origin.width),
                origin.center_y(),
            ),
            c2: Point::new(pointer.x - offset.clamp(origin.width), pointer.y),
            tail: pointer,
        }
    }

    /// Serialize as `M<hx> <hy> C<c1x> <c1y> <c2x> <c2y> <tx> <ty>`
    pub fn to_descriptor(&self) -> String {
        self.to_string()
    }

    /// Parse a descriptor produced by [`to_descriptor`](Self::to_descriptor).
    ///
    /// Tokens are separated by exactly one space and coordinates are plain
    /// finite decimals. Any deviation from the grammar is an error; there is
    /// no fallback curve.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let tokens: Vec<&str> = if descriptor.is_empty() {
            Vec::new()
        } else {
            descriptor.split(' ').collect()
        };
        if tokens.len() != 8 {
            return Err(DescriptorError::TokenCount {
                found: tokens.len(),
            });
        }

        let mut values = [0.0_f64; 8];
        for (index, token) in tokens.iter().enumerate() {
            let raw = match index {
                0 => strip_command(token, index, 'M')?,
                2 => strip_command(token, index, 'C')?,
                _ => token,
            };
            values[index] = parse_coordinate(raw).ok_or_else(|| DescriptorError::BadNumber {
                index,
                token: token.to_string(),
            })?;
        }

        Ok(Self {
            head: Point::new(values[0], values[1]),
            c1: Point::new(values[2], values[3]),
            c2: Point::new(values[4], values[5]),
            tail: Point::new(values[6], values[7]),
        })
    }
}

fn strip_command<'a>(token: &'a str, index: usize, expected: char) -> Result<&'a str, DescriptorError> {
    token
        .strip_prefix(expected)
        .ok_or(DescriptorError::MissingCommand { index, expected })
}

/// Optional sign, digits, optional fraction. No exponents, `inf` or `NaN`.
fn parse_coordinate(raw: &str) -> Option<f64> {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let decimal = !unsigned.is_empty()
        && unsigned.bytes().any(|b| b.is_ascii_digit())
        && unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && unsigned.bytes().filter(|b| *b == b'.').count() <= 1;
    if !decimal {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

impl fmt::Display for ConnectorCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M{} {} C{} {} {} {} {} {}",
            self.head.x,
            self.head.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.tail.x,
            self.tail.y
        )
    }
}

impl FromStr for ConnectorCurve {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
