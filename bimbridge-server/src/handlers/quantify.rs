//! Wall quantities
//!
//! Handles: QuantifyWalls

use serde_json::{json, Value};

use super::DocumentHost;
use crate::bridge::OpResult;

/// Model areas are in square feet
pub const SQUARE_FEET_TO_SQUARE_METERS: f64 = 0.09290304;

impl DocumentHost {
    /// Wall face areas; paint area counts both faces
    pub(super) fn handle_quantify_walls(&self) -> OpResult {
        let model = self.document.model();
        let mut walls = Vec::new();
        let mut total_paint = 0.0;

        for wall in model.walls() {
            let name = model
                .element_type(wall.type_id)
                .map(|t| t.name.as_str())
                .unwrap_or("Wall");
            let area_m2 = wall.line.length() * wall.height * SQUARE_FEET_TO_SQUARE_METERS;
            let paint_area_m2 = area_m2 * 2.0;
            total_paint += paint_area_m2;

            walls.push(json!({
                "id": wall.id,
                "name": name,
                "area_m2": round2(area_m2),
                "paint_area_m2": round2(paint_area_m2),
            }));
        }

        Ok(json!({
            "total_walls": walls.len(),
            "walls": Value::Array(walls),
            "total_paint_area_m2": round2(total_paint),
            "unit": "m²",
        }))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_no_walls() {
        let mut host = host();
        let result = run(&mut host, "quantify_walls", json!(null)).unwrap();
        assert_eq!(
            result,
            json!({"walls": [], "total_walls": 0, "total_paint_area_m2": 0.0, "unit": "m²"})
        );
    }

    #[test]
    fn test_areas() {
        let mut host = host();
        run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 20.0, "y2": 0.0}),
        )
        .unwrap();
        run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 0.0, "y2": 10.0, "wall_type": "Exterior - Brick on CMU"}),
        )
        .unwrap();

        let result = run(&mut host, "quantify_walls", json!(null)).unwrap();
        assert_eq!(result["total_walls"], 2);

        // 20 ft x 10 ft = 200 ft² = 18.58 m²
        let first = &result["walls"][0];
        assert_eq!(first["name"], "Generic - 200mm");
        assert_eq!(first["area_m2"], 18.58);
        assert_eq!(first["paint_area_m2"], 37.16);

        let second = &result["walls"][1];
        assert_eq!(second["name"], "Exterior - Brick on CMU");
        assert_eq!(second["area_m2"], 9.29);

        // 2 x (200 + 100) ft² in m², rounded once
        assert_eq!(result["total_paint_area_m2"], 55.74);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(18.580608), 18.58);
        assert_eq!(round2(0.0), 0.0);
    }
}
