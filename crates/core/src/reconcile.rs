//! Full rebuild of rendered primitives from canonical data.
//!
//! Every pass starts from empty, detached groups, so the rendered state can
//! never drift from the data it was built from. Repeating a pass with the same
//! input yields the same primitives.

use chronoatlas_model::{Layer, LayerId, Marker, Polygon};
use tracing::{debug, trace};

use crate::layers::LayerGroups;
use crate::render::{Primitive, marker_primitive, polygon_primitive};
use crate::surface::MapSurface;
use crate::timeline::ActiveLayers;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub markers: usize,
    pub polygons: usize,
    /// Items on layers outside the active set
    pub skipped_inactive: usize,
    /// Items whose layer no longer exists
    pub skipped_dangling: usize,
    /// Polygons with fewer than three vertices
    pub skipped_invalid: usize,
}

impl ReconcileReport {
    pub fn rendered(&self) -> usize {
        self.markers + self.polygons
    }
}

enum Owner<'a> {
    Render(&'a Layer),
    Inactive,
    Dangling,
}

fn owner<'a>(layers: &'a [Layer], active: &ActiveLayers, groups: &LayerGroups, id: &LayerId) -> Owner<'a> {
    match layers.iter().find(|l| &l.id == id) {
        Some(_) if !groups.contains(id) => Owner::Dangling,
        Some(layer) if active.contains(id) => Owner::Render(layer),
        Some(_) => Owner::Inactive,
        None => Owner::Dangling,
    }
}

pub fn reconcile<S: MapSurface + ?Sized>(
    surface: &mut S,
    groups: &mut LayerGroups,
    layers: &[Layer],
    markers: &[Marker],
    polygons: &[Polygon],
    active: &ActiveLayers,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    groups.clear_all(surface);
    // Attach order is stacking order
    groups.attach_only(surface, active.ordered(layers).into_iter().map(|l| &l.id));

    for marker in markers {
        match owner(layers, active, groups, &marker.layer_id) {
            Owner::Render(layer) => {
                if let Some(group) = groups.handle(&layer.id) {
                    surface.add_primitive(group, Primitive::Marker(marker_primitive(marker, layer)));
                    report.markers += 1;
                }
            }
            Owner::Inactive => report.skipped_inactive += 1,
            Owner::Dangling => {
                debug!(marker = %marker.id, layer = %marker.layer_id, "skipping marker on missing layer");
                report.skipped_dangling += 1;
            }
        }
    }

    for polygon in polygons {
        match owner(layers, active, groups, &polygon.layer_id) {
            Owner::Render(layer) => match polygon_primitive(polygon, layer) {
                Some(primitive) => {
                    if let Some(group) = groups.handle(&layer.id) {
                        surface.add_primitive(group, Primitive::Polygon(primitive));
                        report.polygons += 1;
                    }
                }
                None => {
                    debug!(
                        polygon = %polygon.id,
                        vertices = polygon.coordinates.len(),
                        "skipping polygon with too few vertices"
                    );
                    report.skipped_invalid += 1;
                }
            },
            Owner::Inactive => report.skipped_inactive += 1,
            Owner::Dangling => {
                debug!(polygon = %polygon.id, layer = %polygon.layer_id, "skipping polygon on missing layer");
                report.skipped_dangling += 1;
            }
        }
    }

    trace!(?report, "reconciled");
    report
}
