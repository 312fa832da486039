//! Which layers are visible for the selected timeline event.

use std::collections::HashSet;

use chronoatlas_model::{Layer, LayerId, TimelineEvent, TimelineEventId};
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveLayers(HashSet<LayerId>);

impl ActiveLayers {
    pub fn contains(&self, id: &LayerId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Active layers that still exist, in layer-list order
    pub fn ordered<'a>(&self, layers: &'a [Layer]) -> Vec<&'a Layer> {
        layers.iter().filter(|l| self.contains(&l.id)).collect()
    }

    /// Owner for newly authored geometry: the first active layer in list order
    pub fn first<'a>(&self, layers: &'a [Layer]) -> Option<&'a Layer> {
        layers.iter().find(|l| self.contains(&l.id))
    }
}

impl FromIterator<LayerId> for ActiveLayers {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve the active layer set.
///
/// With no event selected, or a selected id that no longer exists, every layer
/// is active. An existing event activates exactly its own layers, possibly none.
pub fn resolve_active_layers(
    layers: &[Layer],
    events: &[TimelineEvent],
    active_event: Option<&TimelineEventId>,
) -> ActiveLayers {
    let all = || -> ActiveLayers { layers.iter().map(|l| l.id.clone()).collect() };

    let Some(event_id) = active_event else {
        return all();
    };

    match events.iter().find(|e| &e.id == event_id) {
        Some(event) => event.layer_ids.iter().cloned().collect(),
        None => {
            debug!(event = %event_id, "active timeline event not found, showing all layers");
            all()
        }
    }
}
