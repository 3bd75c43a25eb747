//! Bounding-box search input.

use serde::Deserialize;

use crate::adventure::Mode;
use crate::error::{AdventureError, AdventureResult};
use crate::waypoint::{Marker, PointInput, parse_point};

/// A map search: two corner literals and the modes to include.
///
/// Omitting `modes` selects every mode; an explicit empty list matches
/// nothing. Corners must be point literals such as `(52.2, 21.0)`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub bl_corner: Option<PointInput>,
    #[serde(default)]
    pub tr_corner: Option<PointInput>,
    #[serde(default = "all_modes")]
    pub modes: Vec<Mode>,
}

fn all_modes() -> Vec<Mode> {
    Mode::ALL.to_vec()
}

impl SearchQuery {
    pub fn new(bl_corner: &str, tr_corner: &str, modes: &[Mode]) -> Self {
        SearchQuery {
            bl_corner: Some(PointInput::Literal(bl_corner.to_string())),
            tr_corner: Some(PointInput::Literal(tr_corner.to_string())),
            modes: modes.to_vec(),
        }
    }

    /// The (bottom-left, top-right) corners, each validated on its own so the
    /// caller learns exactly which field is missing or malformed.
    pub fn bounding_box(&self) -> AdventureResult<(Marker, Marker)> {
        let bottom_left = corner(self.bl_corner.as_ref(), "bl_corner")?;
        let top_right = corner(self.tr_corner.as_ref(), "tr_corner")?;
        Ok((bottom_left, top_right))
    }
}

fn corner(raw: Option<&PointInput>, field: &'static str) -> AdventureResult<Marker> {
    match raw {
        None => Err(AdventureError::MissingField(field)),
        Some(PointInput::Literal(text)) if text.trim().is_empty() => {
            Err(AdventureError::MissingField(field))
        }
        Some(PointInput::Literal(text)) => {
            parse_point(text).ok_or(AdventureError::InvalidField(field))
        }
        Some(_) => Err(AdventureError::InvalidField(field)),
    }
}
