use chronoatlas_core::prelude::*;

/// One-line summary of a stored map
pub fn describe_map(map: &MapData) -> String {
    let basemap = match (map.use_custom_tiles, &map.custom_tile_layer) {
        (false, _) => "tiles".to_string(),
        (true, Some(layer)) => format!("image {}x{}", layer.width, layer.height),
        (true, None) => "image (missing)".to_string(),
    };
    format!(
        "{}  {:<24} layers={} markers={} polygons={} events={} basemap={}",
        map.id,
        map.name,
        map.layers.len(),
        map.markers.len(),
        map.polygons.len(),
        map.timeline_events.len(),
        basemap
    )
}

/// The timeline in display order, each event with the layer names it shows
pub fn timeline_lines(map: &MapData) -> Vec<String> {
    sort_timeline(&map.timeline_events)
        .into_iter()
        .map(|event| {
            let layers: Vec<&str> = map
                .layers
                .iter()
                .filter(|l| event.shows(&l.id))
                .map(|l| l.name.as_str())
                .collect();
            format!(
                "{:>8}  {}  [{}]",
                event.year.as_deref().unwrap_or("-"),
                event.name,
                layers.join(", ")
            )
        })
        .collect()
}

/// Names of the layers that render for `event`, in layer-list order
pub fn active_layer_names<'a>(map: &'a MapData, event: Option<&TimelineEventId>) -> Vec<&'a str> {
    resolve_active_layers(&map.layers, &map.timeline_events, event)
        .ordered(&map.layers)
        .into_iter()
        .map(|l| l.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MapData {
        let mut ids = IdGenerator::starting_at(1);
        let mut map = MapData::new("Ages", None, &mut ids);
        map.layers = vec![
            Layer::new(LayerId::new("a"), "Empires", "#ff0000"),
            Layer::new(LayerId::new("b"), "Trade", "#00ff00"),
        ];
        map.timeline_events = vec![
            TimelineEvent::new(TimelineEventId::new("late"), "Late", [LayerId::new("b")])
                .with_year("1200 AD"),
            TimelineEvent::new(TimelineEventId::new("early"), "Early", [LayerId::new("a")])
                .with_year("-50"),
            TimelineEvent::new(TimelineEventId::new("myth"), "Myth", []).with_year("Bronze Age"),
        ];
        map
    }

    #[test]
    fn test_timeline_sorted_by_year() {
        let lines = timeline_lines(&map());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Early") && lines[0].ends_with("[Empires]"));
        assert!(lines[1].contains("Myth") && lines[1].ends_with("[]"));
        assert!(lines[2].contains("Late"));
    }

    #[test]
    fn test_active_layer_names() {
        let map = map();
        assert_eq!(active_layer_names(&map, None), vec!["Empires", "Trade"]);
        assert_eq!(
            active_layer_names(&map, Some(&TimelineEventId::new("late"))),
            vec!["Trade"]
        );
        assert!(active_layer_names(&map, Some(&TimelineEventId::new("myth"))).is_empty());
        assert_eq!(active_layer_names(&map, Some(&TimelineEventId::new("gone"))).len(), 2);
    }

    #[test]
    fn test_describe_map() {
        let line = describe_map(&map());
        assert!(line.contains("layers=2"));
        assert!(line.ends_with("basemap=tiles"));
    }
}
