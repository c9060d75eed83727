//! Plain-text rendering of a [`DashboardView`].

use crate::view::{confidence_percent, frequency_of, DashboardView};

/// Banner naming each anomalous detection currently in view, if any.
pub fn anomaly_banner(view: &DashboardView) -> Option<String> {
    view.stream.anomaly_banner()
}

/// Render the dashboard as a multi-line report.
pub fn render(view: &DashboardView) -> String {
    let mut lines = Vec::new();

    let stream = &view.stream;
    if stream.is_active() {
        lines.push(format!(
            "stream active: {} inferences, {:.1} fps, {} in view",
            stream.inference_count, stream.inference_fps, stream.num_detections
        ));
    } else {
        lines.push("waiting for stream...".to_string());
    }
    if view.last_fetch_failed {
        lines.push(format!(
            "last fetch failed: {}",
            view.last_error.as_deref().unwrap_or("unknown error")
        ));
    }
    lines.extend(anomaly_banner(view));

    let g = &view.global;
    lines.push(format!(
        "admitted: {} ({} objects, {} anomalies), avg confidence {:.1}%",
        g.total_admitted,
        g.total_objects(),
        g.total_anomalies(),
        confidence_percent(view.average_confidence)
    ));
    if let (Some(max), Some(min)) = (&g.max_detection, &g.min_detection) {
        lines.push(format!(
            "highest: {} {:.1}%  lowest: {} {:.1}%",
            max.class_name.to_uppercase(),
            confidence_percent(max.confidence),
            min.class_name.to_uppercase(),
            confidence_percent(min.confidence)
        ));
    }

    if view.summaries.is_empty() {
        lines.push("no objects detected yet".to_string());
    }
    for summary in &view.summaries {
        let best = summary.best_detection();
        let marker = if summary.is_anomaly() { " !" } else { "" };
        let table = if summary.is_anomaly() {
            &view.frequencies.anomalies_by_anomalies
        } else {
            &view.frequencies.objects_by_objects
        };
        lines.push(format!(
            "  {} x{}  best {:.1}%  share {:.2}%{}",
            best.class_name.to_uppercase(),
            summary.seen_count(),
            confidence_percent(best.confidence),
            frequency_of(summary.class_id(), table),
            marker
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateState;
    use crate::detect::{BoundingBox, Detection, Snapshot, StreamStatus};
    use crate::view::visible_by_class;

    fn det(track_id: u64, name: &str, class_id: u32, confidence: f64, anomaly: bool) -> Detection {
        Detection {
            class_id,
            class_name: name.to_string(),
            confidence,
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            is_anomaly: anomaly,
            track_id: Some(track_id),
        }
    }

    fn view_of(dets: Vec<Detection>, inference_count: u64) -> DashboardView {
        let mut state = AggregateState::new();
        state.ingest(&dets);
        let mut view = DashboardView::build(&state);
        view.visible = visible_by_class(&dets);
        view.stream = StreamStatus::from(Snapshot {
            num_detections: dets.len() as u64,
            detections: dets,
            inference_count,
            ..Snapshot::default()
        });
        view
    }

    #[test]
    fn empty_view_renders_placeholder() {
        let text = render(&DashboardView::default());
        assert!(text.contains("waiting for stream"));
        assert!(text.contains("no objects detected yet"));
        assert_eq!(anomaly_banner(&DashboardView::default()), None);
    }

    #[test]
    fn renders_anomalies_first_with_marker() {
        let view = view_of(
            vec![
                det(1, "person", 0, 0.91, false),
                det(2, "bear", 21, 0.66, true),
            ],
            1,
        );
        let text = render(&view);
        assert!(text.starts_with("stream active: 1 inferences"));
        assert!(text.contains("ANOMALY DETECTED: BEAR\n"));
        let bear = text.find("BEAR x1").unwrap();
        let person = text.find("PERSON x1").unwrap();
        assert!(bear < person);
        assert!(text.contains("best 66.0%  share 100.00% !"));
    }

    #[test]
    fn banner_repeats_each_anomalous_detection() {
        let view = view_of(
            vec![
                det(1, "bear", 21, 0.7, true),
                det(2, "bear", 21, 0.8, true),
                det(3, "person", 0, 0.9, false),
            ],
            3,
        );
        assert_eq!(
            anomaly_banner(&view).as_deref(),
            Some("ANOMALY DETECTED: BEAR, BEAR")
        );
        assert!(render(&view).contains("ANOMALY DETECTED: BEAR, BEAR\n"));
    }

    #[test]
    fn snapshot_before_first_inference_renders_waiting() {
        let view = view_of(vec![det(1, "person", 0, 0.9, false)], 0);
        let text = render(&view);
        assert!(text.starts_with("waiting for stream..."));
        assert!(!text.contains("stream active"));
    }
}
