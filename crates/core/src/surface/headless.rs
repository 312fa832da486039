//! In-memory surface with arena-backed handles.
//!
//! Used by tests and the CLI. It never draws anything; it records what a
//! real widget would be showing so callers can inspect or export it.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chronoatlas_model::{GeoBounds, LatLng};
use geo::{BoundingRect, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use serde_json::json;
use tracing::warn;

use crate::render::{MarkerPrimitive, PolygonPrimitive, Primitive, style::to_hex};
use crate::surface::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub world_wrap: bool,
    pub fitted: Option<GeoBounds>,
}

#[derive(Debug, Default)]
struct GroupSlot {
    children: Vec<PrimitiveHandle>,
}

/// Creation/disposal counts shared between a factory and its surfaces
#[derive(Debug, Default)]
pub struct SurfaceStats {
    created: Cell<usize>,
    disposed: Cell<usize>,
}

impl SurfaceStats {
    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn disposed(&self) -> usize {
        self.disposed.get()
    }

    /// Surfaces created but not yet disposed
    pub fn live(&self) -> usize {
        self.created() - self.disposed()
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    view: Viewport,
    basemaps: BTreeMap<BasemapHandle, Basemap>,
    groups: BTreeMap<GroupHandle, GroupSlot>,
    /// Attached groups, bottom to top
    stack: Vec<GroupHandle>,
    primitives: BTreeMap<PrimitiveHandle, Primitive>,
    listeners: BTreeMap<ListenerHandle, SurfaceEvent>,
    draw_tool: DrawToolState,
    next_index: u64,
    disposed: bool,
    stats: Option<Rc<SurfaceStats>>,
}

impl HeadlessSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            view: Viewport {
                center: options.center,
                zoom: options.zoom,
                min_zoom: 0,
                max_zoom: 18,
                world_wrap: true,
                fitted: None,
            },
            basemaps: BTreeMap::new(),
            groups: BTreeMap::new(),
            stack: Vec::new(),
            primitives: BTreeMap::new(),
            listeners: BTreeMap::new(),
            draw_tool: DrawToolState::default(),
            next_index: 0,
            disposed: false,
            stats: None,
        }
    }

    fn next(&mut self) -> u64 {
        self.next_index += 1;
        self.next_index
    }

    fn live(&self, operation: &str) -> bool {
        if self.disposed {
            warn!(operation, "ignoring call on a disposed surface");
        }
        !self.disposed
    }

    pub fn viewport(&self) -> &Viewport {
        &self.view
    }

    pub fn basemaps(&self) -> Vec<&Basemap> {
        self.basemaps.values().collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Attached groups in stacking order, bottom first
    pub fn attached_groups(&self) -> Vec<GroupHandle> {
        self.stack.clone()
    }

    pub fn is_attached(&self, group: GroupHandle) -> bool {
        self.stack.contains(&group)
    }

    pub fn group_primitives(&self, group: GroupHandle) -> Vec<&Primitive> {
        self.groups
            .get(&group)
            .map(|slot| {
                slot.children
                    .iter()
                    .filter_map(|h| self.primitives.get(h))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every primitive held by any group, attached or not
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn draw_tool(&self) -> DrawToolState {
        self.draw_tool
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// What a user would see: primitives in attached groups, bottom layer first
    pub fn scene(&self) -> RenderedScene {
        let primitives = self
            .stack
            .iter()
            .filter_map(|group| self.groups.get(group))
            .flat_map(|slot| slot.children.iter())
            .filter_map(|h| self.primitives.get(h).cloned())
            .collect();
        RenderedScene { primitives }
    }
}

impl MapSurface for HeadlessSurface {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        if self.live("set_view") {
            self.view.center = center;
            self.view.zoom = zoom.clamp(self.view.min_zoom, self.view.max_zoom);
        }
    }

    fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        if self.live("set_zoom_limits") {
            if min_zoom > max_zoom {
                warn!(min_zoom, max_zoom, "inverted zoom limits, swapping");
            }
            let (min_zoom, max_zoom) = (min_zoom.min(max_zoom), min_zoom.max(max_zoom));
            self.view.min_zoom = min_zoom;
            self.view.max_zoom = max_zoom;
            self.view.zoom = self.view.zoom.clamp(min_zoom, max_zoom);
        }
    }

    fn set_world_wrap(&mut self, enabled: bool) {
        if self.live("set_world_wrap") {
            self.view.world_wrap = enabled;
        }
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        if self.live("fit_bounds") {
            self.view.center = bounds.center();
            self.view.fitted = Some(bounds);
        }
    }

    fn add_basemap(&mut self, basemap: Basemap) -> BasemapHandle {
        let handle = BasemapHandle::new(self.next());
        if self.live("add_basemap") {
            self.basemaps.insert(handle, basemap);
        }
        handle
    }

    fn remove_basemap(&mut self, handle: BasemapHandle) {
        if self.basemaps.remove(&handle).is_none() {
            warn!(?handle, "removing unknown basemap");
        }
    }

    fn create_group(&mut self) -> GroupHandle {
        let handle = GroupHandle::new(self.next());
        if self.live("create_group") {
            self.groups.insert(handle, GroupSlot::default());
        }
        handle
    }

    fn attach_group(&mut self, group: GroupHandle) {
        if !self.groups.contains_key(&group) {
            warn!(?group, "attaching unknown group");
        } else if !self.stack.contains(&group) {
            self.stack.push(group);
        }
    }

    fn detach_group(&mut self, group: GroupHandle) {
        self.stack.retain(|g| *g != group);
    }

    fn clear_group(&mut self, group: GroupHandle) {
        if let Some(slot) = self.groups.get_mut(&group) {
            for child in slot.children.drain(..) {
                self.primitives.remove(&child);
            }
        }
    }

    fn destroy_group(&mut self, group: GroupHandle) {
        self.stack.retain(|g| *g != group);
        if let Some(slot) = self.groups.remove(&group) {
            for child in slot.children {
                self.primitives.remove(&child);
            }
        }
    }

    fn add_primitive(&mut self, group: GroupHandle, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle::new(self.next());
        match self.groups.get_mut(&group) {
            Some(slot) => {
                slot.children.push(handle);
                self.primitives.insert(handle, primitive);
            }
            None => warn!(?group, "adding primitive to unknown group"),
        }
        handle
    }

    fn set_draw_tool(&mut self, state: DrawToolState) {
        if self.live("set_draw_tool") {
            self.draw_tool = state;
        }
    }

    fn listen(&mut self, event: SurfaceEvent) -> ListenerHandle {
        let handle = ListenerHandle::new(self.next());
        if self.live("listen") {
            self.listeners.insert(handle, event);
        }
        handle
    }

    fn unlisten(&mut self, listener: ListenerHandle) {
        self.listeners.remove(&listener);
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.basemaps.clear();
        self.groups.clear();
        self.stack.clear();
        self.primitives.clear();
        self.listeners.clear();
        self.draw_tool = DrawToolState::default();
        if let Some(stats) = &self.stats {
            stats.disposed.set(stats.disposed.get() + 1);
        }
    }
}

/// Hands out [`HeadlessSurface`]s and counts how many are still alive
#[derive(Debug, Default, Clone)]
pub struct HeadlessFactory {
    stats: Rc<SurfaceStats>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Rc<SurfaceStats> {
        Rc::clone(&self.stats)
    }
}

impl SurfaceFactory for HeadlessFactory {
    type Surface = HeadlessSurface;

    fn create(&mut self, options: SurfaceOptions) -> HeadlessSurface {
        self.stats.created.set(self.stats.created.get() + 1);
        HeadlessSurface {
            stats: Some(Rc::clone(&self.stats)),
            ..HeadlessSurface::new(options)
        }
    }
}

/// Snapshot of the visible primitives
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedScene {
    pub primitives: Vec<Primitive>,
}

impl RenderedScene {
    pub fn markers(&self) -> impl Iterator<Item = &MarkerPrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Marker(m) => Some(m),
            Primitive::Polygon(_) => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = &PolygonPrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Polygon(p) => Some(p),
            Primitive::Marker(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Smallest box holding every marker and polygon vertex
    pub fn bounds(&self) -> Option<GeoBounds> {
        let points: MultiPoint = self
            .primitives
            .iter()
            .flat_map(|primitive| match primitive {
                Primitive::Marker(m) => vec![Point::from(m.position)],
                Primitive::Polygon(p) => p.ring.iter().copied().map(Point::from).collect(),
            })
            .collect();
        let rect = points.bounding_rect()?;
        Some(GeoBounds::new(rect.min().into(), rect.max().into()))
    }

    /// Export as GeoJSON, styled with simplestyle property names
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .primitives
            .iter()
            .map(|primitive| match primitive {
                Primitive::Marker(m) => marker_feature(m),
                Primitive::Polygon(p) => polygon_feature(p),
            })
            .collect();

        let bbox = self.bounds().map(|b| {
            vec![
                b.south_west.lng,
                b.south_west.lat,
                b.north_east.lng,
                b.north_east.lat,
            ]
        });

        FeatureCollection {
            bbox,
            features,
            foreign_members: None,
        }
    }
}

fn marker_feature(marker: &MarkerPrimitive) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("marker"));
    properties.insert("layerId".to_string(), json!(marker.layer.as_str()));
    properties.insert("title".to_string(), json!(marker.popup.title));
    properties.insert("marker-color".to_string(), json!(to_hex(marker.icon.color)));
    properties.insert("popup".to_string(), json!(marker.popup.to_html()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            marker.position.lng,
            marker.position.lat,
        ]))),
        id: Some(Id::String(marker.source.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn polygon_feature(polygon: &PolygonPrimitive) -> Feature {
    let mut ring: Vec<Vec<f64>> = polygon.ring.iter().map(|p| vec![p.lng, p.lat]).collect();
    // GeoJSON rings are closed
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("polygon"));
    properties.insert("layerId".to_string(), json!(polygon.layer.as_str()));
    properties.insert("title".to_string(), json!(polygon.popup.title));
    properties.insert("stroke".to_string(), json!(to_hex(polygon.style.border_color)));
    properties.insert("stroke-width".to_string(), json!(polygon.style.border_width));
    if let Some(fill) = polygon.style.fill {
        properties.insert("fill".to_string(), json!(to_hex(fill.color)));
        properties.insert("fill-opacity".to_string(), json!(fill.opacity));
    }
    properties.insert("popup".to_string(), json!(polygon.popup.to_html()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: Some(Id::String(polygon.source.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}
