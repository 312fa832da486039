use anyhow::{bail, Context, Result};
use chronoatlas_core::prelude::*;
use chronoatlas_core::surface::Basemap;

/// What a headless render produced
pub struct RenderOutcome {
    pub scene: RenderedScene,
    pub basemap: Option<Basemap>,
    pub report: ReconcileReport,
}

/// Mount the map on a headless surface, wait for its basemap, and capture
/// the visible primitives
pub async fn render_map(
    map: MapData,
    event: Option<TimelineEventId>,
    config: EngineConfig,
) -> Result<RenderOutcome> {
    let mut controller = MapController::new(HeadlessFactory::new(), config, DiscardUpdates);
    let props = MapProps::new(map).with_active_event(event);

    let phase = controller.initialize(props, &DataUrlImageLoader).await;
    if phase != Phase::Ready {
        bail!("Map did not finish initializing (phase: {phase})");
    }

    let surface = controller
        .surface()
        .context("Surface missing after initialization")?;
    let outcome = RenderOutcome {
        scene: surface.scene(),
        basemap: surface.basemaps().first().map(|b| (*b).clone()),
        report: controller.last_report().unwrap_or_default(),
    };

    controller.teardown();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> MapData {
        let mut ids = IdGenerator::starting_at(1_700_000_000_000);
        let mut map = MapData::new("Sample", None, &mut ids);
        map.layers = vec![
            Layer::new(LayerId::new("rivers"), "Rivers", "#0000ff"),
            Layer::new(LayerId::new("towns"), "Towns", "#ff0000"),
        ];
        map.markers = vec![Marker::new(
            MarkerId::new("t1"),
            LayerId::new("towns"),
            LatLng::new(4.0, 5.0),
        )];
        map.timeline_events = vec![TimelineEvent::new(
            TimelineEventId::new("flood"),
            "The Flood",
            [LayerId::new("rivers")],
        )];
        map
    }

    #[tokio::test]
    async fn test_render_tile_map() {
        let outcome = render_map(sample_map(), None, EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.scene.markers().count(), 1);
        assert!(matches!(outcome.basemap, Some(Basemap::Tiles(_))));
        assert_eq!(outcome.report.markers, 1);
    }

    #[tokio::test]
    async fn test_render_respects_event() {
        let event = Some(TimelineEventId::new("flood"));
        let outcome = render_map(sample_map(), event, EngineConfig::default())
            .await
            .unwrap();
        assert!(outcome.scene.is_empty());
        assert_eq!(outcome.report.skipped_inactive, 1);
    }
}
