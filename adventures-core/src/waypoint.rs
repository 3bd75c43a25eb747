//! Waypoints and the lenient coordinate parsing used on submission.
//!
//! Clients submit points as text literals like `(52.229937, 21.011380)`.
//! A point is accepted only when both components parse as finite decimals;
//! anything else is dropped without an error and the remaining points keep
//! their relative order.

use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adventure::AdventureId;

/// A (latitude, longitude) pair.
pub type Marker = (f64, f64);

/// Prefix of the flat form fields (`marker_0`, `marker_1`, ...) carrying one
/// point each.
pub const MARKER_FIELD_PREFIX: &str = "marker_";

/// One point of an adventure's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub adventure_id: AdventureId,
    /// Position in the path, contiguous from 0
    pub path_point: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn marker(&self) -> Marker {
        (self.latitude, self.longitude)
    }
}

/// One submitted entry, before validation.
///
/// JSON clients may send a point literal or a numeric `[lat, lon]` pair. Any
/// other value is kept as `Other` so the rest of the list still goes through.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PointInput {
    Literal(String),
    Pair([f64; 2]),
    Other(IgnoredAny),
}

impl PointInput {
    pub fn marker(&self) -> Option<Marker> {
        match self {
            PointInput::Literal(raw) => parse_point(raw),
            PointInput::Pair([latitude, longitude]) => {
                (latitude.is_finite() && longitude.is_finite()).then_some((*latitude, *longitude))
            }
            PointInput::Other(_) => None,
        }
    }
}

/// Raw, unvalidated points as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WaypointSubmission {
    raw: Vec<PointInput>,
}

impl WaypointSubmission {
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WaypointSubmission {
            raw: items
                .into_iter()
                .map(|item| PointInput::Literal(item.into()))
                .collect(),
        }
    }

    /// Read `marker_0`, `marker_1`, ... until the first missing or empty index.
    /// Fields after the gap are ignored.
    pub fn from_indexed_fields(fields: &HashMap<String, String>) -> Self {
        let raw = (0..)
            .map_while(|i| {
                fields
                    .get(&format!("{MARKER_FIELD_PREFIX}{i}"))
                    .filter(|value| !value.is_empty())
                    .map(|value| PointInput::Literal(value.clone()))
            })
            .collect();

        WaypointSubmission { raw }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Valid points in submission order.
    pub fn markers(&self) -> Vec<Marker> {
        self.raw
            .iter()
            .filter_map(|input| {
                let point = input.marker();
                if point.is_none() {
                    debug!(input = ?input, "skipping unparsable waypoint");
                }
                point
            })
            .collect()
    }
}

/// Parse a point literal: two comma separated numbers, optionally wrapped in
/// `(...)` or `[...]`, with an optional trailing comma.
pub fn parse_point(raw: &str) -> Option<Marker> {
    let inner = strip_brackets(raw.trim())?;

    let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() == 3 && parts[2].is_empty() {
        parts.pop();
    }

    let [latitude, longitude] = parts.as_slice() else {
        return None;
    };

    Some((parse_component(latitude)?, parse_component(longitude)?))
}

fn strip_brackets(s: &str) -> Option<&str> {
    match (s.chars().next(), s.chars().last()) {
        (Some('('), Some(')')) | (Some('['), Some(']')) if s.len() >= 2 => {
            Some(&s[1..s.len() - 1])
        }
        (Some('(' | '['), _) | (_, Some(')' | ']')) => None,
        _ => Some(s),
    }
}

fn parse_component(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point_accepts_tuple_and_list_literals() {
        assert_eq!(parse_point("(52.229937, 21.011380)"), Some((52.229937, 21.011380)));
        assert_eq!(parse_point("[1.0,2.0]"), Some((1.0, 2.0)));
        assert_eq!(parse_point("  -3.5 , 4 "), Some((-3.5, 4.0)));
        assert_eq!(parse_point("(1, 2,)"), Some((1.0, 2.0)));
    }

    #[test]
    fn test_parse_point_rejects_malformed_input() {
        assert_eq!(parse_point(""), None);
        assert_eq!(parse_point("()"), None);
        assert_eq!(parse_point("("), None);
        assert_eq!(parse_point("(1.0, 2.0"), None);
        assert_eq!(parse_point("[1.0, 2.0)"), None);
        assert_eq!(parse_point("(1.0)"), None);
        assert_eq!(parse_point("(1.0, 2.0, 3.0)"), None);
        assert_eq!(parse_point("(abc, 2.0)"), None);
        assert_eq!(parse_point("(1.0, 'x')"), None);
    }

    #[test]
    fn test_parse_point_rejects_non_finite_numbers() {
        assert_eq!(parse_point("(inf, 1.0)"), None);
        assert_eq!(parse_point("(1.0, NaN)"), None);
        assert_eq!(parse_point("(1e400, 1.0)"), None);
    }

    #[test]
    fn test_markers_skip_invalid_points_and_keep_order() {
        let submission = WaypointSubmission::from_list(["(1.0, 2.0)", "garbage", "(3.0, 4.0)"]);

        assert_eq!(submission.len(), 3);
        assert_eq!(submission.markers(), vec![(1.0, 2.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_json_list_keeps_good_entries_of_any_shape() {
        let submission: WaypointSubmission =
            serde_json::from_str(r#"["(1, 2)", [3.0, 4.0], 5, null, [1.0, 2.0, 3.0], {"lat": 1}]"#)
                .unwrap();

        assert_eq!(submission.len(), 6);
        assert_eq!(submission.markers(), vec![(1.0, 2.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_indexed_fields_stop_at_first_missing_index() {
        let fields: HashMap<String, String> = [
            ("marker_0", "(1.0, 2.0)"),
            ("marker_1", "(3.0, 4.0)"),
            ("marker_3", "(5.0, 6.0)"),
            ("info", "ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let submission = WaypointSubmission::from_indexed_fields(&fields);
        assert_eq!(submission.markers(), vec![(1.0, 2.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_indexed_fields_stop_at_first_empty_index() {
        let fields: HashMap<String, String> = [
            ("marker_0", "(1.0, 2.0)"),
            ("marker_1", ""),
            ("marker_2", "(5.0, 6.0)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let submission = WaypointSubmission::from_indexed_fields(&fields);
        assert_eq!(submission.len(), 1);
    }

    #[test]
    fn test_indexed_fields_keep_invalid_entries_before_the_gap() {
        let fields: HashMap<String, String> = [("marker_0", "nope"), ("marker_1", "(7, 8)")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let submission = WaypointSubmission::from_indexed_fields(&fields);
        assert_eq!(submission.len(), 2);
        assert_eq!(submission.markers(), vec![(7.0, 8.0)]);
    }
}
