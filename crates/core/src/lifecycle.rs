//! Owns one map surface from creation to disposal.
//!
//! The controller is driven by props: the full [`MapData`] plus the selected
//! timeline event. Loading a custom basemap image is the only async step. It is
//! modelled as a [`BasemapTicket`] that the caller resolves and hands back to
//! [`MapController::complete_basemap`]. Every mount bumps a generation counter,
//! so results for a surface that no longer exists are dropped.

use chronoatlas_model::{
    IdGenerator, ImageSource, LatLng, MapData, MapId, Marker, Polygon, TimelineEventId,
};
use tracing::{debug, error, info, warn};

use crate::authoring::draw::DrawnShape;
use crate::authoring::{Authoring, AuthoringMode};
use crate::config::EngineConfig;
use crate::layers::LayerGroups;
use crate::map::basemap::{
    BasemapError, BasemapPlan, BasemapSelector, ImageLoader, LoadedImage,
};
use crate::reconcile::{ReconcileReport, reconcile};
use crate::render::{Primitive, polygon_primitive};
use crate::surface::{
    DrawToolState, ListenerHandle, MapSurface, SurfaceEvent, SurfaceFactory, SurfaceOptions,
};
use crate::timeline::{ActiveLayers, resolve_active_layers};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum Phase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    TornDown,
}

/// Everything the host passes down on each render
#[derive(Clone, Debug, PartialEq)]
pub struct MapProps {
    pub map: MapData,
    pub active_event: Option<TimelineEventId>,
}

impl MapProps {
    pub fn new(map: MapData) -> Self {
        Self {
            map,
            active_event: None,
        }
    }

    pub fn with_active_event(self, event: Option<TimelineEventId>) -> Self {
        Self {
            active_event: event,
            ..self
        }
    }
}

/// Mutations flowing back to the host. Collections are always complete
/// replacements.
pub trait MapCallbacks {
    fn on_update_markers(&mut self, markers: Vec<Marker>);
    fn on_update_polygons(&mut self, polygons: Vec<Polygon>);
}

/// Callbacks for read-only hosts
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardUpdates;

impl MapCallbacks for DiscardUpdates {
    fn on_update_markers(&mut self, markers: Vec<Marker>) {
        debug!(count = markers.len(), "discarding marker update");
    }

    fn on_update_polygons(&mut self, polygons: Vec<Polygon>) {
        debug!(count = polygons.len(), "discarding polygon update");
    }
}

/// An outstanding image load for one mount
#[derive(Clone, Debug, PartialEq)]
pub struct BasemapTicket {
    generation: u64,
    seq: u64,
    source: ImageSource,
}

impl BasemapTicket {
    pub fn source(&self) -> &ImageSource {
        &self.source
    }
}

/// What changed between two sets of props for the same map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PropChanges {
    view: bool,
    basemap: bool,
    content: bool,
}

impl PropChanges {
    fn between(old: &MapProps, new: &MapProps) -> Self {
        let (a, b) = (&old.map, &new.map);
        Self {
            view: a.center != b.center || a.zoom != b.zoom,
            basemap: BasemapPlan::for_map(a) != BasemapPlan::for_map(b),
            content: a.layers != b.layers
                || a.markers != b.markers
                || a.polygons != b.polygons
                || a.timeline_events != b.timeline_events
                || old.active_event != new.active_event,
        }
    }
}

/// Per-surface state. Dropped as a whole on teardown.
struct Mounted<S> {
    map_id: MapId,
    surface: S,
    props: MapProps,
    basemap: BasemapSelector,
    /// Created when initialization completes
    groups: Option<LayerGroups>,
    authoring: Authoring,
    listeners: Vec<ListenerHandle>,
    awaiting: Option<u64>,
    loaded: Option<LoadedImage>,
    report: Option<ReconcileReport>,
}

impl<S: MapSurface> Mounted<S> {
    fn active(&self) -> ActiveLayers {
        resolve_active_layers(
            &self.props.map.layers,
            &self.props.map.timeline_events,
            self.props.active_event.as_ref(),
        )
    }

    fn set_view(&mut self) {
        self.surface.set_view(self.props.map.center, self.props.map.zoom);
    }

    /// Attach the basemap the props ask for. Returns a ticket when an image
    /// has to be loaded first.
    fn start_basemap(
        &mut self,
        config: &EngineConfig,
        generation: u64,
        seq: &mut u64,
    ) -> Option<BasemapTicket> {
        let plan = BasemapPlan::for_map(&self.props.map);
        BasemapSelector::apply_view_limits(&mut self.surface, &plan, config);
        self.awaiting = None;

        match plan {
            BasemapPlan::Tiles => {
                self.basemap.attach_tiles(&mut self.surface, config);
                None
            }
            BasemapPlan::MissingImage => {
                warn!(map = %self.map_id, "custom basemap selected but no image stored");
                self.basemap.clear(&mut self.surface);
                None
            }
            BasemapPlan::CustomImage(source) => {
                if self.loaded.as_ref().is_some_and(|img| img.url == source.data_url) {
                    self.attach_loaded(config);
                    return None;
                }
                *seq += 1;
                self.awaiting = Some(*seq);
                debug!(map = %self.map_id, seq = *seq, "waiting for basemap image");
                Some(BasemapTicket {
                    generation,
                    seq: *seq,
                    source,
                })
            }
        }
    }

    /// Re-place the already loaded image at the current view
    fn attach_loaded(&mut self, config: &EngineConfig) {
        let Some(image) = self.loaded.as_ref() else {
            return;
        };
        let (center, zoom) = (self.props.map.center, self.props.map.zoom);
        if let Err(err) = self
            .basemap
            .attach_image(&mut self.surface, image, center, zoom, config)
        {
            error!(map = %self.map_id, %err, "could not place basemap image");
        }
    }

    fn build(&mut self) {
        self.groups = Some(LayerGroups::build(&mut self.surface, &self.props.map.layers));
        self.listeners = vec![
            self.surface.listen(SurfaceEvent::Click),
            self.surface.listen(SurfaceEvent::ShapeCreated),
        ];
        self.reconcile();
        self.push_draw_tool();
    }

    fn reconcile(&mut self) {
        let active = self.active();
        let Some(groups) = self.groups.as_mut() else {
            return;
        };
        let map = &self.props.map;
        groups.sync_layers(&mut self.surface, &map.layers);
        let report = reconcile(
            &mut self.surface,
            groups,
            &map.layers,
            &map.markers,
            &map.polygons,
            &active,
        );
        debug!(
            map = %self.map_id,
            rendered = report.rendered(),
            dangling = report.skipped_dangling,
            "reconciled map content"
        );
        self.report = Some(report);
    }

    fn push_draw_tool(&mut self) {
        let active = self.active();
        let target = active
            .first(&self.props.map.layers)
            .and_then(|layer| self.groups.as_ref()?.handle(&layer.id));
        self.surface.set_draw_tool(DrawToolState {
            visible: self.authoring.draw_tool_visible(),
            target,
        });
    }

    /// Put a freshly drawn polygon into its group without a full pass
    fn render_polygon(&mut self, polygon: &Polygon) {
        let Some(groups) = self.groups.as_mut() else {
            return;
        };
        let Some(layer) = self.props.map.layer(&polygon.layer_id) else {
            return;
        };
        let (Some(group), Some(primitive)) = (
            groups.handle(&layer.id),
            polygon_primitive(polygon, layer),
        ) else {
            return;
        };
        self.surface.add_primitive(group, Primitive::Polygon(primitive));
        groups.attach(&mut self.surface, &layer.id);
    }

    fn release(&mut self) {
        for listener in self.listeners.drain(..) {
            self.surface.unlisten(listener);
        }
        if let Some(mut groups) = self.groups.take() {
            groups.destroy_all(&mut self.surface);
        }
        self.basemap.clear(&mut self.surface);
        self.surface.dispose();
        self.awaiting = None;
        self.loaded = None;
    }
}

/// Drives a [`MapSurface`] from props.
///
/// ```
/// use chronoatlas_core::prelude::*;
///
/// let mut ids = IdGenerator::new();
/// let mut map = MapData::new("Atlas", None, &mut ids);
/// map.layers.push(Layer::new(LayerId::new("l"), "Roads", "#ff0000"));
///
/// let mut controller =
///     MapController::new(HeadlessFactory::new(), EngineConfig::default(), DiscardUpdates);
/// assert!(controller.mount(MapProps::new(map)).is_none());
/// assert_eq!(controller.phase(), Phase::Ready);
/// ```
pub struct MapController<F: SurfaceFactory> {
    config: EngineConfig,
    factory: F,
    callbacks: Box<dyn MapCallbacks>,
    ids: IdGenerator,
    phase: Phase,
    generation: u64,
    seq: u64,
    mounted: Option<Mounted<F::Surface>>,
}

impl<F: SurfaceFactory> MapController<F> {
    pub fn new(factory: F, config: EngineConfig, callbacks: impl MapCallbacks + 'static) -> Self {
        Self {
            config,
            factory,
            callbacks: Box::new(callbacks),
            ids: IdGenerator::new(),
            phase: Phase::Uninitialized,
            generation: 0,
            seq: 0,
            mounted: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn surface(&self) -> Option<&F::Surface> {
        self.mounted.as_ref().map(|m| &m.surface)
    }

    pub fn props(&self) -> Option<&MapProps> {
        self.mounted.as_ref().map(|m| &m.props)
    }

    pub fn authoring_mode(&self) -> Option<AuthoringMode> {
        self.mounted.as_ref().map(|m| m.authoring.mode())
    }

    /// Outcome of the most recent reconciliation pass
    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.mounted.as_ref().and_then(|m| m.report)
    }

    /// Create the surface and start initialization.
    ///
    /// Mounting the map that is already mounted does nothing. Mounting a
    /// different map tears the current one down first.
    pub fn mount(&mut self, props: MapProps) -> Option<BasemapTicket> {
        if let Some(mounted) = &self.mounted {
            if mounted.map_id == props.map.id {
                debug!(map = %props.map.id, phase = %self.phase, "map already mounted");
                return None;
            }
            self.teardown();
        }

        self.generation += 1;
        let map_id = props.map.id.clone();
        let surface = self.factory.create(SurfaceOptions {
            center: props.map.center,
            zoom: props.map.zoom,
        });
        info!(map = %map_id, generation = self.generation, "initializing map");

        self.phase = Phase::Initializing;
        let mounted = self.mounted.insert(Mounted {
            map_id,
            surface,
            props,
            basemap: BasemapSelector::default(),
            groups: None,
            authoring: Authoring::new(),
            listeners: Vec::new(),
            awaiting: None,
            loaded: None,
            report: None,
        });
        let ticket = mounted.start_basemap(&self.config, self.generation, &mut self.seq);
        mounted.set_view();

        if ticket.is_none() {
            self.finish_initialization();
        }
        ticket
    }

    /// Resolve a ticket returned by [`mount`](Self::mount) or
    /// [`update`](Self::update). Stale tickets are ignored.
    pub fn complete_basemap(
        &mut self,
        ticket: BasemapTicket,
        result: Result<LoadedImage, BasemapError>,
    ) {
        let Some(mounted) = self.mounted.as_mut() else {
            debug!(seq = ticket.seq, "discarding basemap for unmounted map");
            return;
        };
        if ticket.generation != self.generation || mounted.awaiting != Some(ticket.seq) {
            debug!(
                seq = ticket.seq,
                generation = ticket.generation,
                "discarding stale basemap result"
            );
            return;
        }
        mounted.awaiting = None;

        match result {
            Ok(image) => {
                mounted.loaded = Some(image);
                mounted.attach_loaded(&self.config);
            }
            Err(err) => {
                error!(map = %mounted.map_id, %err, "basemap image failed to load");
                mounted.basemap.clear(&mut mounted.surface);
            }
        }

        if self.phase == Phase::Initializing {
            self.finish_initialization();
        }
    }

    fn finish_initialization(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        mounted.build();
        self.phase = Phase::Ready;
        info!(map = %mounted.map_id, "map ready");
    }

    /// Apply new props. Returns a ticket when a new basemap image is needed.
    pub fn update(&mut self, props: MapProps) -> Option<BasemapTicket> {
        let same_map = self
            .mounted
            .as_ref()
            .is_some_and(|m| m.map_id == props.map.id);
        if !same_map {
            if self.mounted.is_some() {
                self.teardown();
            }
            return self.mount(props);
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return None;
        };

        let previous = std::mem::replace(&mut mounted.props, props);
        let changes = PropChanges::between(&previous, &mounted.props);
        let custom = mounted.props.map.use_custom_tiles;

        if changes.view {
            mounted.set_view();
        }
        let mut ticket = None;
        if changes.basemap {
            ticket = mounted.start_basemap(&self.config, self.generation, &mut self.seq);
        } else if changes.view && custom && self.phase == Phase::Ready {
            mounted.attach_loaded(&self.config);
        }

        match self.phase {
            Phase::Initializing => {
                if mounted.awaiting.is_none() {
                    self.finish_initialization();
                } else if changes.content {
                    debug!(map = %mounted.map_id, "deferring reconciliation until ready");
                }
            }
            Phase::Ready if changes.content => {
                mounted.reconcile();
                mounted.push_draw_tool();
            }
            _ => {}
        }
        ticket
    }

    /// Force a full reconciliation. Deferred while initializing.
    pub fn request_reconcile(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        match self.phase {
            Phase::Ready => mounted.reconcile(),
            Phase::Initializing => debug!(map = %mounted.map_id, "reconcile deferred"),
            _ => {}
        }
    }

    fn ready_mut(&mut self) -> Option<&mut Mounted<F::Surface>> {
        if self.phase != Phase::Ready {
            debug!(phase = %self.phase, "ignoring authoring input");
            return None;
        }
        self.mounted.as_mut()
    }

    pub fn toggle_marker_placement(&mut self) -> Option<AuthoringMode> {
        let mounted = self.ready_mut()?;
        let mode = mounted.authoring.toggle_marker_placement();
        mounted.push_draw_tool();
        Some(mode)
    }

    pub fn toggle_polygon_drawing(&mut self) -> Option<AuthoringMode> {
        let mounted = self.ready_mut()?;
        let mode = mounted.authoring.toggle_polygon_drawing();
        mounted.push_draw_tool();
        Some(mode)
    }

    /// A click on the map. Returns `true` if a marker was placed.
    pub fn handle_click(&mut self, position: LatLng) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };

        let active = mounted.active();
        let owners = active.ordered(&mounted.props.map.layers);
        let Some(markers) = mounted.authoring.place_marker(
            position,
            &owners,
            &mounted.props.map.markers,
            &mut self.ids,
        ) else {
            return false;
        };

        mounted.props.map = mounted.props.map.with_markers(markers.clone());
        mounted.reconcile();
        mounted.push_draw_tool();
        self.callbacks.on_update_markers(markers);
        true
    }

    /// The draw tool finished a shape. Returns `true` if a polygon was created.
    pub fn handle_shape_created(&mut self, shape: &DrawnShape) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };

        let active = mounted.active();
        let owners = active.ordered(&mounted.props.map.layers);
        let result = mounted.authoring.complete_drawing(
            shape,
            &owners,
            &mounted.props.map.polygons,
            &mut self.ids,
        );
        let created = match result {
            Ok(polygons) => {
                if let Some(polygon) = polygons.last() {
                    mounted.render_polygon(polygon);
                }
                mounted.props.map = mounted.props.map.with_polygons(polygons.clone());
                self.callbacks.on_update_polygons(polygons);
                true
            }
            Err(_) => false,
        };
        mounted.push_draw_tool();
        created
    }

    /// Release the surface and everything created on it
    pub fn teardown(&mut self) {
        if let Some(mut mounted) = self.mounted.take() {
            mounted.release();
            info!(map = %mounted.map_id, "map torn down");
        }
        if self.phase != Phase::Uninitialized {
            self.phase = Phase::TornDown;
        }
        self.generation += 1;
    }

    /// Mount and wait for the basemap image, if any
    pub async fn initialize(&mut self, props: MapProps, loader: &dyn ImageLoader) -> Phase {
        let ticket = self.mount(props);
        self.resolve(ticket, loader).await
    }

    /// Update and wait for a new basemap image, if any
    pub async fn apply(&mut self, props: MapProps, loader: &dyn ImageLoader) -> Phase {
        let ticket = self.update(props);
        self.resolve(ticket, loader).await
    }

    async fn resolve(&mut self, ticket: Option<BasemapTicket>, loader: &dyn ImageLoader) -> Phase {
        if let Some(ticket) = ticket {
            let result = loader.load(ticket.source()).await;
            self.complete_basemap(ticket, result);
        }
        self.phase
    }
}

impl<F: SurfaceFactory> Drop for MapController<F> {
    fn drop(&mut self) {
        if self.mounted.is_some() {
            self.teardown();
        }
    }
}
