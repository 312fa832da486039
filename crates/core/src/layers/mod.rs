//! One render group per map layer.

use std::collections::HashMap;

use chronoatlas_model::{Layer, LayerId};
use tracing::debug;

use crate::surface::{GroupHandle, MapSurface};

#[derive(Clone, Copy, Debug)]
struct GroupEntry {
    handle: GroupHandle,
    attached: bool,
}

/// Maps layer ids to their groups on the surface.
///
/// Groups are created when the surface is built and destroyed with it.
#[derive(Debug, Default)]
pub struct LayerGroups {
    groups: HashMap<LayerId, GroupEntry>,
}

impl LayerGroups {
    pub fn build<S: MapSurface + ?Sized>(surface: &mut S, layers: &[Layer]) -> Self {
        let mut groups = Self::default();
        groups.sync_layers(surface, layers);
        groups
    }

    /// Create groups for new layers and destroy groups whose layer is gone
    pub fn sync_layers<S: MapSurface + ?Sized>(&mut self, surface: &mut S, layers: &[Layer]) {
        self.groups.retain(|id, entry| {
            let keep = layers.iter().any(|l| &l.id == id);
            if !keep {
                debug!(layer = %id, "destroying group for removed layer");
                surface.destroy_group(entry.handle);
            }
            keep
        });

        for layer in layers {
            self.groups.entry(layer.id.clone()).or_insert_with(|| GroupEntry {
                handle: surface.create_group(),
                attached: false,
            });
        }
    }

    pub fn handle(&self, id: &LayerId) -> Option<GroupHandle> {
        self.groups.get(id).map(|entry| entry.handle)
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.groups.contains_key(id)
    }

    pub fn is_attached(&self, id: &LayerId) -> bool {
        self.groups.get(id).is_some_and(|entry| entry.attached)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Show the group. Returns `false` if it was already attached or unknown.
    pub fn attach<S: MapSurface + ?Sized>(&mut self, surface: &mut S, id: &LayerId) -> bool {
        match self.groups.get_mut(id) {
            Some(entry) if !entry.attached => {
                surface.attach_group(entry.handle);
                entry.attached = true;
                true
            }
            _ => false,
        }
    }

    pub fn detach<S: MapSurface + ?Sized>(&mut self, surface: &mut S, id: &LayerId) -> bool {
        match self.groups.get_mut(id) {
            Some(entry) if entry.attached => {
                surface.detach_group(entry.handle);
                entry.attached = false;
                true
            }
            _ => false,
        }
    }

    /// Remove the group's primitives without detaching it
    pub fn clear<S: MapSurface + ?Sized>(&self, surface: &mut S, id: &LayerId) {
        if let Some(entry) = self.groups.get(id) {
            surface.clear_group(entry.handle);
        }
    }

    pub fn clear_all<S: MapSurface + ?Sized>(&self, surface: &mut S) {
        for entry in self.groups.values() {
            surface.clear_group(entry.handle);
        }
    }

    pub fn detach_all<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for entry in self.groups.values_mut() {
            // Every group, not only those recorded as attached
            surface.detach_group(entry.handle);
            entry.attached = false;
        }
    }

    /// Detach everything, then attach exactly the given layers
    pub fn attach_only<'a, S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        active: impl IntoIterator<Item = &'a LayerId>,
    ) {
        self.detach_all(surface);
        for id in active {
            self.attach(surface, id);
        }
    }

    pub fn destroy_all<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for (_, entry) in self.groups.drain() {
            surface.destroy_group(entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{
        SurfaceOptions,
        headless::HeadlessSurface,
    };
    use chronoatlas_model::LatLng;

    fn layers(ids: &[&str]) -> Vec<Layer> {
        ids.iter()
            .map(|id| Layer::new(LayerId::new(*id), *id, "#ff0000"))
            .collect()
    }

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(SurfaceOptions {
            center: LatLng::default(),
            zoom: 2,
        })
    }

    #[test]
    fn test_one_group_per_layer() {
        let mut surface = surface();
        let groups = LayerGroups::build(&mut surface, &layers(&["a", "b", "c"]));
        assert_eq!(groups.len(), 3);
        assert_eq!(surface.group_count(), 3);
        assert!(surface.attached_groups().is_empty());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut surface = surface();
        let mut groups = LayerGroups::build(&mut surface, &layers(&["a"]));
        let a = LayerId::new("a");

        assert!(groups.attach(&mut surface, &a));
        assert!(!groups.attach(&mut surface, &a));
        assert_eq!(surface.attached_groups().len(), 1);

        assert!(groups.detach(&mut surface, &a));
        assert!(!groups.detach(&mut surface, &a));
        assert!(!groups.attach(&mut surface, &LayerId::new("missing")));
    }

    #[test]
    fn test_sync_layers_creates_and_destroys() {
        let mut surface = surface();
        let mut groups = LayerGroups::build(&mut surface, &layers(&["a", "b"]));
        let a_handle = groups.handle(&LayerId::new("a")).unwrap();

        groups.sync_layers(&mut surface, &layers(&["a", "c"]));
        assert_eq!(groups.handle(&LayerId::new("a")), Some(a_handle));
        assert!(!groups.contains(&LayerId::new("b")));
        assert!(groups.contains(&LayerId::new("c")));
        assert_eq!(surface.group_count(), 2);

        groups.destroy_all(&mut surface);
        assert!(groups.is_empty());
        assert_eq!(surface.group_count(), 0);
    }

    #[test]
    fn test_attach_only() {
        let mut surface = surface();
        let mut groups = LayerGroups::build(&mut surface, &layers(&["a", "b", "c"]));
        groups.attach(&mut surface, &LayerId::new("a"));

        let active = [LayerId::new("b"), LayerId::new("c")];
        groups.attach_only(&mut surface, active.iter());
        assert!(!groups.is_attached(&LayerId::new("a")));
        assert!(groups.is_attached(&LayerId::new("b")));
        let handle = |id: &str| groups.handle(&LayerId::new(id)).unwrap();
        assert_eq!(surface.attached_groups(), vec![handle("b"), handle("c")]);
    }
}
