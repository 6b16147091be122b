//! Sorted projection of detection results.
//!
//! DESIGN
//! ======
//! The canonical detection list is never reordered. Views ask for a sorted
//! copy with [`sorted`], driven by the column the user last clicked.
//!
//! Bounding boxes sort by their serialized text (`[10,20,30,40]`), compared
//! byte-wise, not by geometry. A box starting at `100` therefore sorts before
//! one starting at `20`.

#[cfg(test)]
#[path = "results_test.rs"]
mod results_test;

use std::cmp::Ordering;

use crate::net::types::Detection;

/// Sortable result column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    ClassName,
    Confidence,
    BoundingBox,
}

impl SortKey {
    /// Parse a column name as used on the wire or typed by a user.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "class_name" | "class" | "object" | "name" => Some(Self::ClassName),
            "confidence" | "conf" => Some(Self::Confidence),
            "bbox" | "box" | "bounding_box" => Some(Self::BoundingBox),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn ascending(key: SortKey) -> Self {
        Self { key, direction: SortDirection::Ascending }
    }

    #[must_use]
    pub fn descending(key: SortKey) -> Self {
        Self { key, direction: SortDirection::Descending }
    }
}

/// Next sort state after the user selects `key`.
///
/// Same key while ascending flips to descending; anything else starts
/// ascending.
#[must_use]
pub fn toggle(current: Option<SortSpec>, key: SortKey) -> SortSpec {
    match current {
        Some(spec) if spec.key == key && spec.direction == SortDirection::Ascending => SortSpec::descending(key),
        _ => SortSpec::ascending(key),
    }
}

/// Stable sorted copy of `detections`. `None` keeps input order.
#[must_use]
pub fn sorted(detections: &[Detection], spec: Option<SortSpec>) -> Vec<Detection> {
    let mut out = detections.to_vec();
    let Some(spec) = spec else {
        return out;
    };

    match spec.key {
        SortKey::BoundingBox => {
            // Serialize once per element rather than per comparison.
            let mut keyed = out
                .into_iter()
                .map(|d| (bbox_sort_key(&d.bbox), d))
                .collect::<Vec<_>>();
            keyed.sort_by(|(a, _), (b, _)| directed(a.as_bytes().cmp(b.as_bytes()), spec.direction));
            keyed.into_iter().map(|(_, d)| d).collect()
        }
        SortKey::ClassName => {
            out.sort_by(|a, b| directed(a.class_name.cmp(&b.class_name), spec.direction));
            out
        }
        SortKey::Confidence => {
            out.sort_by(|a, b| {
                directed(a.confidence.partial_cmp(&b.confidence).unwrap_or(Ordering::Equal), spec.direction)
            });
            out
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Canonical text form of a bounding box, e.g. `[10,20.5,30,40]`.
///
/// Numbers print the way JSON clients serialize them: integral values
/// without a fractional part, and magnitudes below `1e-6` or from `1e21` up in
/// exponent form (`1e-7`, `1e+21`).
#[must_use]
pub fn bbox_sort_key(bbox: &[f64; 4]) -> String {
    let parts = bbox.iter().map(|v| format_number(*v)).collect::<Vec<_>>();
    format!("[{}]", parts.join(","))
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let magnitude = value.abs();
    if magnitude < 1e-6 || magnitude >= 1e21 {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        };
    }
    format!("{value}")
}
