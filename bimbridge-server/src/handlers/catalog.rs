//! Document queries
//!
//! Handles: Status, Levels, Types

use serde_json::{json, Value};

use super::DocumentHost;
use crate::bridge::OpResult;
use crate::document::{CatalogEntry, Category};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Category listings reported by `types`, in response order
const TYPE_LISTINGS: &[(&str, Category)] = &[
    ("walls", Category::Walls),
    ("columns", Category::StructuralColumns),
    ("beams", Category::StructuralFraming),
    ("doors", Category::Doors),
    ("windows", Category::Windows),
];

impl DocumentHost {
    pub(super) fn handle_status(&self) -> OpResult {
        Ok(json!({
            "status": "active",
            "host_available": true,
            "document_title": self.document.title(),
            "api_name": self.api_name,
            "timestamp": chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }))
    }

    pub(super) fn handle_levels(&self) -> OpResult {
        let levels: Vec<Value> = self
            .document
            .model()
            .levels()
            .iter()
            .map(|l| json!({"id": l.id, "name": l.name, "elev": l.elevation}))
            .collect();
        Ok(json!({ "levels": levels }))
    }

    pub(super) fn handle_types(&self) -> OpResult {
        let model = self.document.model();
        let mut out = serde_json::Map::new();

        for (key, category) in TYPE_LISTINGS {
            let types: Vec<Value> = model
                .types_of(*category)
                .map(|t| json!({"id": t.id, "family": t.family_name, "name": t.name}))
                .collect();
            out.insert((*key).to_string(), Value::Array(types));
        }

        let catalog = model.rebar_catalog();
        out.insert(
            "rebar".into(),
            json!({
                "bar_types": entries(&catalog.bar_types),
                "shapes": entries(&catalog.shapes),
                "hook_types": entries(&catalog.hook_types),
                "cover_types": entries(&catalog.cover_types),
            }),
        );

        Ok(Value::Object(out))
    }
}

fn entries(list: &[CatalogEntry]) -> Vec<Value> {
    list.iter()
        .map(|e| json!({"id": e.id, "name": e.name}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use serde_json::json;

    #[test]
    fn test_status() {
        let mut host = host();
        let status = run(&mut host, "status", json!(null)).unwrap();
        assert_eq!(status["status"], "active");
        assert_eq!(status["host_available"], true);
        assert_eq!(status["document_title"], "Test Project");
        assert_eq!(status["api_name"], "bimbridge");

        // e.g. 2024-01-31 12:34:56.789
        let ts = status["timestamp"].as_str().unwrap();
        assert_eq!(ts.len(), 23);
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_levels() {
        let mut host = host();
        let result = run(&mut host, "levels", json!(null)).unwrap();
        let levels = result["levels"].as_array().unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0]["name"], "Level 1");
        assert_eq!(levels[0]["elev"], 0.0);
        assert_eq!(levels[1]["name"], "Level 2");
        assert_eq!(levels[1]["elev"], 10.0);
        assert!(levels[0]["id"].is_i64());
    }

    #[test]
    fn test_types() {
        let mut host = host();
        let result = run(&mut host, "types", json!(null)).unwrap();
        assert_eq!(result["walls"].as_array().unwrap().len(), 2);
        assert_eq!(result["columns"].as_array().unwrap().len(), 3);
        assert_eq!(result["beams"][0]["family"], "Concrete-Rectangular Beam");
        assert_eq!(result["doors"][0]["name"], "0915 x 2134mm");
        assert_eq!(result["windows"].as_array().unwrap().len(), 1);

        let rebar = &result["rebar"];
        let bar_names: Vec<&str> = rebar["bar_types"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap())
            .collect();
        assert_eq!(bar_names, vec!["10M", "15M", "20M"]);
        assert_eq!(rebar["shapes"][0]["name"], "Stirrup");
        assert_eq!(rebar["hook_types"].as_array().unwrap().len(), 2);
        assert_eq!(rebar["cover_types"].as_array().unwrap().len(), 2);
    }
}
