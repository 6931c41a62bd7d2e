//! Geometry carried by renderer-originated URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_RECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*\{\s*\{\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\}\s*,\s*\{\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\}\s*\}\s*$",
    )
    .unwrap()
});

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Parse the `{{x, y}, {width, height}}` form the page script emits.
    pub fn parse(s: &str) -> Option<Rect> {
        let caps = RE_RECT.captures(s)?;
        let value = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
        Some(Rect {
            x: value(1)?,
            y: value(2)?,
            width: value(3)?,
            height: value(4)?,
        })
    }
}

/// Parse a click position suffix such as `/clientX=188&clientY=292`.
///
/// Both coordinates must be integers; anything else yields `None`.
pub fn parse_click_position(s: &str) -> Option<Point> {
    let stripped = s.replace("/clientX=", "").replace("clientY=", "");
    let mut values = stripped.split('&');
    let x = values.next()?.parse::<i32>().ok()?;
    let y = values.next()?.parse::<i32>().ok()?;
    if values.next().is_some() {
        return None;
    }
    Some(Point::new(f64::from(x), f64::from(y)))
}
