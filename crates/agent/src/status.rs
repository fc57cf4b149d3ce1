//! One-line vessel status appended to every alert.
//!
//! Format: `<radius>/<maxRadius> m @ <bearing> deg[, depth <depth> m]`.
//! Live samples (radius, bearing, depth) older than [`STATUS_MAX_AGE`] are
//! treated as unavailable and rendered as `?`. The max radius is a setting
//! rather than a sample and is read without a freshness bound.

use std::time::Duration;

use anchorwatch_core::paths::{
    PATH_ANCHOR_BEARING_TRUE, PATH_ANCHOR_CURRENT_RADIUS, PATH_ANCHOR_MAX_RADIUS,
    PATH_DEPTH_BELOW_SURFACE,
};

use crate::store::{NumericReading, ValueStore};

/// Oldest live sample still shown in the status line.
pub const STATUS_MAX_AGE: Duration = Duration::from_secs(60);

/// Render the status line from the current store contents.
pub fn status_text(store: &ValueStore) -> String {
    let current_radius = number(store, PATH_ANCHOR_CURRENT_RADIUS, Some(STATUS_MAX_AGE));
    let max_radius = number(store, PATH_ANCHOR_MAX_RADIUS, None);
    let bearing_deg =
        number(store, PATH_ANCHOR_BEARING_TRUE, Some(STATUS_MAX_AGE)).map(f64::to_degrees);

    let mut text = format!(
        "{}/{} m @ {} deg",
        fixed(current_radius, 0),
        fixed(max_radius, 0),
        fixed(bearing_deg, 0),
    );

    // The depth clause disappears entirely when there is no depth at all,
    // but a malformed depth still shows up as `?`.
    match store.get_as_number(PATH_DEPTH_BELOW_SURFACE, Some(STATUS_MAX_AGE)) {
        None | Some(NumericReading::Null) => {}
        Some(depth) => text.push_str(&format!(", depth {} m", fixed(depth.as_f64(), 1))),
    }

    text
}

fn number(store: &ValueStore, path: &str, max_age: Option<Duration>) -> Option<f64> {
    store
        .get_as_number(path, max_age)
        .and_then(|reading| reading.as_f64())
}

/// Fixed-point text with ties rounded away from zero (`12.5` -> `13`).
fn fixed(value: Option<f64>, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    value
        .map(|v| format!("{:.decimals$}", (v * scale).round() / scale))
        .unwrap_or_else(|| "?".to_string())
}
