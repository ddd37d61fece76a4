//! Line drawing
//!
//! Handles: DrawDetailLine, DrawModelLine, DrawModelPolyline

use bimbridge_protocol::{DetailLineArgs, ModelLineArgs, PolylineArgs};
use serde_json::json;
use tracing::debug;

use super::DocumentHost;
use crate::bridge::{OpError, OpResult};
use crate::document::geometry::{Line, Plane, Xyz};
use crate::validation;

impl DocumentHost {
    pub(super) fn handle_draw_detail_line(&mut self, args: &DetailLineArgs) -> OpResult {
        let check = validation::detail_view_check(&self.document);
        if !check.can_draw_detail_line {
            return Err(OpError::input(check.reason.unwrap_or_else(|| {
                "Active view does not support detail lines".to_string()
            })));
        }
        let view_id = self
            .document
            .model()
            .active_view()
            .map(|v| v.id)
            .ok_or_else(|| OpError::input("No active view"))?;

        let line = Line::bound(
            Xyz::new(args.x1, args.y1, args.z1),
            Xyz::new(args.x2, args.y2, args.z2),
        )?;

        let mut tx = self.document.begin("Detail Line");
        let id = tx.model().new_detail_curve(view_id, line)?;
        tx.commit();
        debug!("Detail line {} drawn in view {}", id, view_id);

        Ok(json!({"ok": true, "elementId": id}))
    }

    pub(super) fn handle_draw_model_line(&mut self, args: &ModelLineArgs) -> OpResult {
        let p1 = Xyz::new(args.x1, args.y1, args.z1);
        let p2 = Xyz::new(args.x2, args.y2, args.z2);
        let line = Line::bound(p1, p2)?;
        let plane = Plane::for_line(p1, p2)?;

        let mut tx = self.document.begin("Model Line");
        let sketch_plane = tx.model().new_sketch_plane(plane);
        let id = tx.model().new_model_curve(line, sketch_plane)?;
        tx.commit();

        Ok(json!({"ok": true, "elementId": id}))
    }

    /// All segments share the sketch plane through the first two points
    pub(super) fn handle_draw_model_polyline(&mut self, args: &PolylineArgs) -> OpResult {
        if args.points.len() < 2 {
            return Err(OpError::input("Need at least two points"));
        }
        let points: Vec<Xyz> = args.points.iter().copied().map(Xyz::from_array).collect();
        let plane = Plane::for_line(points[0], points[1])?;
        let segments = points
            .windows(2)
            .map(|pair| Line::bound(pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;

        // only the plane membership of later segments is left to the host
        let mut tx = self.document.begin("Polyline");
        let sketch_plane = tx.model().new_sketch_plane(plane);
        let mut ids = Vec::with_capacity(segments.len());
        for segment in segments {
            ids.push(tx.model().new_model_curve(segment, sketch_plane)?);
        }
        tx.commit();

        Ok(json!({"ok": true, "elementIds": ids}))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::bridge::OpError;
    use crate::document::{Document, DocumentSeed, TransactionOutcome, ViewKind};
    use crate::handlers::DocumentHost;
    use serde_json::json;

    #[test]
    fn test_detail_line() {
        let mut host = host();
        let result = run(
            &mut host,
            "draw_detail_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 5.0, "y2": 5.0}),
        )
        .unwrap();
        assert_eq!(result["ok"], true);
        assert!(result["elementId"].is_i64());
        assert_eq!(host.document().transaction_count(), 1);
    }

    #[test]
    fn test_detail_line_in_3d_view() {
        let mut seed = DocumentSeed::starter();
        seed.active_view = Some("{3D}".into());
        let mut host = DocumentHost::new(Document::from_seed(seed).unwrap());
        assert_eq!(
            host.document().model().active_view().map(|v| v.kind),
            Some(ViewKind::ThreeD)
        );

        let err = run(
            &mut host,
            "draw_detail_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 5.0, "y2": 5.0}),
        )
        .unwrap_err();
        assert_eq!(err, OpError::input("3D views do not support detail lines"));
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_model_line() {
        let mut host = host();
        let result = run(
            &mut host,
            "draw_model_line",
            json!({"x1": 0.0, "y1": 0.0, "z1": 0.0, "x2": 0.0, "y2": 0.0, "z2": 10.0}),
        )
        .unwrap();
        assert_eq!(result["ok"], true);
        // sketch plane + curve
        assert_eq!(host.document().model().element_count(), 2);
    }

    #[test]
    fn test_model_line_zero_length() {
        let mut host = host();
        let err = run(
            &mut host,
            "draw_model_line",
            json!({"x1": 1.0, "y1": 1.0, "z1": 1.0, "x2": 1.0, "y2": 1.0, "z2": 1.0}),
        )
        .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_polyline() {
        let mut host = host();
        let result = run(
            &mut host,
            "draw_model_polyline",
            json!({"points": [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 5.0], [0.0, 0.0, 5.0]]}),
        )
        .unwrap();
        assert_eq!(result["elementIds"].as_array().unwrap().len(), 3);
        assert_eq!(host.document().transaction_count(), 1);
    }

    #[test]
    fn test_polyline_needs_two_points() {
        let mut host = host();
        let err = run(&mut host, "draw_model_polyline", json!({"points": [[0.0, 0.0, 0.0]]}))
            .unwrap_err();
        assert_eq!(err, OpError::input("Need at least two points"));
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_polyline_off_plane_segment_rolls_back() {
        let mut host = host();
        let before = host.document().snapshot();
        // first segment fixes the XZ plane; the last point leaves it
        let err = run(
            &mut host,
            "draw_model_polyline",
            json!({"points": [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 5.0], [10.0, 8.0, 5.0]]}),
        )
        .unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(host.document().snapshot(), before);
        assert_eq!(
            host.document().transactions().last().map(|t| t.outcome),
            Some(TransactionOutcome::RolledBack)
        );
    }

    #[test]
    fn test_polyline_repeated_point_opens_no_transaction() {
        let mut host = host();
        let before = host.document().snapshot();
        let err = run(
            &mut host,
            "draw_model_polyline",
            json!({"points": [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 0.0]]}),
        )
        .unwrap_err();
        assert!(matches!(err, OpError::Input(_)), "{:?}", err);
        assert_eq!(err.status(), 400);
        assert_eq!(host.document().transaction_count(), 0);
        assert_eq!(host.document().snapshot(), before);
    }
}
