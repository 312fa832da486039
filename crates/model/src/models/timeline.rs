//! Timeline events and their ordering.
//!
//! Event years are free text ("1200 AD", "Bronze Age"). Ordering uses a
//! best-effort integer parse of the leading number; anything else sorts as 0.

use serde::{Deserialize, Serialize};

use crate::identifiers::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: TimelineEventId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Layers shown while this event is selected. May be empty.
    #[serde(default)]
    pub layer_ids: Vec<LayerId>,
}

impl TimelineEvent {
    pub fn new(
        id: TimelineEventId,
        name: impl Into<String>,
        layer_ids: impl IntoIterator<Item = LayerId>,
    ) -> Self {
        let mut unique: Vec<LayerId> = Vec::new();
        for layer_id in layer_ids {
            if !unique.contains(&layer_id) {
                unique.push(layer_id);
            }
        }

        Self {
            id,
            name: name.into(),
            year: None,
            description: None,
            layer_ids: unique,
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn shows(&self, layer_id: &LayerId) -> bool {
        self.layer_ids.contains(layer_id)
    }

    pub fn sort_key(&self) -> i64 {
        self.year.as_deref().map(parse_year).unwrap_or(0)
    }
}

/// Parse the leading integer of a year label, e.g. `"-50 BC"` -> -50.
///
/// Labels without a leading number yield 0.
pub fn parse_year(label: &str) -> i64 {
    let label = label.trim_start();
    let (sign, digits) = match label.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, label.strip_prefix('+').unwrap_or(label)),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map(|value| sign * value)
        .unwrap_or(0)
}

/// Events in chronological order; ties keep their authoring order.
pub fn sort_timeline(events: &[TimelineEvent]) -> Vec<&TimelineEvent> {
    let mut sorted: Vec<&TimelineEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.sort_key());
    sorted
}
