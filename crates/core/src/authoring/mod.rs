//! Turning pointer gestures into canonical data.
//!
//! Modes are single-shot: one placed marker or one finished polygon returns
//! the machine to `Idle`. New geometry is owned by the first active layer in
//! layer-list order; there is no per-gesture layer picker.
// TODO: let the editor pick the owning layer when a marker or polygon is created.

pub mod draw;

use chronoatlas_model::{IdGenerator, LatLng, Layer, Marker, MarkerId, Polygon, PolygonId};
use tracing::{debug, error};

use crate::authoring::draw::DrawnShape;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum AuthoringMode {
    #[default]
    Idle,
    PlacingMarker,
    DrawingPolygon,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthoringError {
    #[error("not drawing a polygon")]
    NotDrawing,

    #[error("no active layer to own the new shape")]
    NoActiveLayer,

    #[error("unsupported shape type {0:?}")]
    UnsupportedShape(String),

    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
}

#[derive(Debug, Default)]
pub struct Authoring {
    mode: AuthoringMode,
}

impl Authoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AuthoringMode {
        self.mode
    }

    /// The draw control is only shown while drawing
    pub fn draw_tool_visible(&self) -> bool {
        self.mode == AuthoringMode::DrawingPolygon
    }

    pub fn toggle_marker_placement(&mut self) -> AuthoringMode {
        self.toggle(AuthoringMode::PlacingMarker)
    }

    pub fn toggle_polygon_drawing(&mut self) -> AuthoringMode {
        self.toggle(AuthoringMode::DrawingPolygon)
    }

    pub fn cancel(&mut self) {
        self.mode = AuthoringMode::Idle;
    }

    fn toggle(&mut self, target: AuthoringMode) -> AuthoringMode {
        self.mode = if self.mode == target {
            AuthoringMode::Idle
        } else {
            target
        };
        debug!(mode = %self.mode, "authoring mode changed");
        self.mode
    }

    /// Handle a map click. Returns the full new marker collection when a marker
    /// was placed.
    ///
    /// `active_layers` must be in layer-list order. Without an active layer the
    /// click does nothing and the mode is kept.
    pub fn place_marker(
        &mut self,
        position: LatLng,
        active_layers: &[&Layer],
        markers: &[Marker],
        ids: &mut IdGenerator,
    ) -> Option<Vec<Marker>> {
        if self.mode != AuthoringMode::PlacingMarker {
            return None;
        }
        let Some(owner) = active_layers.first() else {
            debug!("click ignored, no active layer");
            return None;
        };

        let marker = Marker::new(MarkerId::generate(ids), owner.id.clone(), position)
            .with_icon_color(owner.color.as_str());
        debug!(marker = %marker.id, layer = %owner.id, "placed marker");

        let mut next = markers.to_vec();
        next.push(marker);
        self.mode = AuthoringMode::Idle;
        Some(next)
    }

    /// Handle a finished draw. On success the new polygon is the last element
    /// of the returned collection.
    ///
    /// Any completed draw ends the drawing mode, whether or not it produced a
    /// polygon.
    pub fn complete_drawing(
        &mut self,
        shape: &DrawnShape,
        active_layers: &[&Layer],
        polygons: &[Polygon],
        ids: &mut IdGenerator,
    ) -> Result<Vec<Polygon>, AuthoringError> {
        if self.mode != AuthoringMode::DrawingPolygon {
            return Err(AuthoringError::NotDrawing);
        }
        self.mode = AuthoringMode::Idle;

        let result = build_polygon(shape, active_layers, ids);
        match result {
            Ok(polygon) => {
                debug!(polygon = %polygon.id, layer = %polygon.layer_id, "drew polygon");
                let mut next = polygons.to_vec();
                next.push(polygon);
                Ok(next)
            }
            Err(err) => {
                error!(%err, "discarding drawn shape");
                Err(err)
            }
        }
    }
}

fn build_polygon(
    shape: &DrawnShape,
    active_layers: &[&Layer],
    ids: &mut IdGenerator,
) -> Result<Polygon, AuthoringError> {
    if !shape.kind.is_area() {
        return Err(AuthoringError::UnsupportedShape(format!("{:?}", shape.kind)));
    }

    let ring = shape.ring();
    if ring.len() < Polygon::MIN_VERTICES {
        return Err(AuthoringError::TooFewVertices(ring.len()));
    }

    let owner = active_layers.first().ok_or(AuthoringError::NoActiveLayer)?;
    Polygon::new(PolygonId::generate(ids), owner.id.clone(), ring, &owner.color)
        .map_err(|_| AuthoringError::TooFewVertices(shape.ring().len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoatlas_model::{LayerId, NEW_POLYGON_DESCRIPTION};

    fn layers() -> Vec<Layer> {
        vec![
            Layer::new(LayerId::new("A"), "A", "#aa0000"),
            Layer::new(LayerId::new("B"), "B", "#00bb00"),
        ]
    }

    fn triangle() -> DrawnShape {
        DrawnShape::polygon(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ])
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut authoring = Authoring::new();
        assert_eq!(authoring.toggle_marker_placement(), AuthoringMode::PlacingMarker);
        assert_eq!(authoring.toggle_polygon_drawing(), AuthoringMode::DrawingPolygon);
        assert!(authoring.draw_tool_visible());
        assert_eq!(authoring.toggle_marker_placement(), AuthoringMode::PlacingMarker);
        assert!(!authoring.draw_tool_visible());
        assert_eq!(authoring.toggle_marker_placement(), AuthoringMode::Idle);
    }

    #[test]
    fn test_marker_goes_to_first_active_layer() {
        let layers = layers();
        let active: Vec<&Layer> = layers.iter().collect();
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();
        authoring.toggle_marker_placement();

        let existing = vec![Marker::new(MarkerId::new("old"), LayerId::new("B"), LatLng::default())];
        let next = authoring
            .place_marker(LatLng::new(5.0, 6.0), &active, &existing, &mut ids)
            .unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next[0], existing[0]);
        assert_eq!(next[1].layer_id, LayerId::new("A"));
        assert_eq!(next[1].position, LatLng::new(5.0, 6.0));
        assert_eq!(next[1].icon_color.as_deref(), Some("#aa0000"));
        assert_eq!(authoring.mode(), AuthoringMode::Idle);
    }

    #[test]
    fn test_click_without_active_layer_is_noop() {
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();
        authoring.toggle_marker_placement();

        assert!(authoring.place_marker(LatLng::default(), &[], &[], &mut ids).is_none());
        assert_eq!(authoring.mode(), AuthoringMode::PlacingMarker);
    }

    #[test]
    fn test_click_while_idle_ignored() {
        let layers = layers();
        let active: Vec<&Layer> = layers.iter().collect();
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();

        assert!(authoring.place_marker(LatLng::default(), &active, &[], &mut ids).is_none());
    }

    #[test]
    fn test_drawn_polygon_styled_from_owner() {
        let layers = layers();
        let active: Vec<&Layer> = vec![&layers[1], &layers[0]];
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();
        authoring.toggle_polygon_drawing();

        let next = authoring
            .complete_drawing(&triangle(), &active, &[], &mut ids)
            .unwrap();
        let polygon = next.last().unwrap();
        assert_eq!(polygon.layer_id, LayerId::new("B"));
        assert_eq!(polygon.stroke_color.as_deref(), Some("#00bb00"));
        assert_eq!(polygon.description.as_deref(), Some(NEW_POLYGON_DESCRIPTION));
        assert_eq!(polygon.coordinates, triangle().ring());
        assert_eq!(authoring.mode(), AuthoringMode::Idle);
        assert!(!authoring.draw_tool_visible());
    }

    #[test]
    fn test_short_draw_discarded() {
        let layers = layers();
        let active: Vec<&Layer> = layers.iter().collect();
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();
        authoring.toggle_polygon_drawing();

        let line = DrawnShape::polygon(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]);
        assert_eq!(
            authoring.complete_drawing(&line, &active, &[], &mut ids),
            Err(AuthoringError::TooFewVertices(2))
        );
        assert_eq!(authoring.mode(), AuthoringMode::Idle);
    }

    #[test]
    fn test_draw_requires_drawing_mode_and_owner() {
        let mut ids = IdGenerator::new();
        let mut authoring = Authoring::new();
        assert_eq!(
            authoring.complete_drawing(&triangle(), &[], &[], &mut ids),
            Err(AuthoringError::NotDrawing)
        );

        authoring.toggle_polygon_drawing();
        assert_eq!(
            authoring.complete_drawing(&triangle(), &[], &[], &mut ids),
            Err(AuthoringError::NoActiveLayer)
        );
    }
}
