//! Element creation
//!
//! Handles: CreateWallLine, PlaceColumn

use bimbridge_protocol::{PlaceColumnArgs, WallLineArgs};
use serde_json::json;
use tracing::info;

use super::DocumentHost;
use crate::bridge::{OpError, OpResult};
use crate::document::geometry::{Line, Xyz};
use crate::document::Category;

impl DocumentHost {
    pub(super) fn handle_create_wall_line(&mut self, args: &WallLineArgs) -> OpResult {
        let model = self.document.model();
        let level_name = args.level_name();
        let level_id = model
            .find_level_by_name(level_name)
            .map(|l| l.id)
            .ok_or_else(|| OpError::input(format!("Level not found: {}", level_name)))?;

        let type_id = match args.wall_type.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => model
                .find_type_by_name(Category::Walls, name)
                .map(|t| t.id)
                .ok_or_else(|| OpError::input(format!("Wall type not found: {}", name)))?,
            None => model
                .types_of(Category::Walls)
                .next()
                .map(|t| t.id)
                .ok_or_else(|| OpError::input("No wall types available."))?,
        };

        let line = Line::bound(
            Xyz::new(args.x1, args.y1, args.z),
            Xyz::new(args.x2, args.y2, args.z),
        )?;

        let mut tx = self.document.begin("Create Wall");
        let id = tx.model().create_wall(line, level_id, type_id)?;
        tx.commit();
        info!("Wall {} created on {}", id, level_name);

        Ok(json!({"ok": true, "elementId": id}))
    }

    /// Without a type name the first column type is used; an inactive
    /// type is activated in the same transaction as the placement
    pub(super) fn handle_place_column(&mut self, args: &PlaceColumnArgs) -> OpResult {
        let model = self.document.model();
        let level_name = args.level_name();
        let level_id = model
            .find_level_by_name(level_name)
            .map(|l| l.id)
            .ok_or_else(|| OpError::input(format!("Level not found: {}", level_name)))?;

        let symbol = match args.type_name.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => model
                .find_type_by_name(Category::StructuralColumns, name)
                .ok_or_else(|| OpError::input(format!("Column type not found: {}", name)))?,
            None => model
                .types_of(Category::StructuralColumns)
                .next()
                .ok_or_else(|| OpError::input("No structural column types available."))?,
        };
        let symbol_id = symbol.id;
        let needs_activation = !symbol.is_active;

        let mut tx = self.document.begin("Place Column");
        if needs_activation {
            tx.model().activate_symbol(symbol_id)?;
        }
        let id = tx
            .model()
            .new_family_instance(Xyz::new(args.x, args.y, args.z), symbol_id, level_id)?;
        tx.commit();
        info!("Column {} placed on {}", id, level_name);

        Ok(json!({"ok": true, "elementId": id}))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::bridge::OpError;
    use crate::document::{Category, Document, DocumentSeed, Element};
    use crate::handlers::DocumentHost;
    use serde_json::json;

    #[test]
    fn test_create_wall_default_type() {
        let mut host = host();
        let result = run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 12.0, "y2": 0.0}),
        )
        .unwrap();
        let id = result["elementId"].as_i64().unwrap();

        let model = host.document().model();
        let wall = model.walls().next().unwrap();
        assert_eq!(wall.id.0, id);
        assert_eq!(model.element_type(wall.type_id).unwrap().name, "Generic - 200mm");
        assert_eq!(wall.line.length(), 12.0);
    }

    #[test]
    fn test_create_wall_named_type_on_level_2() {
        let mut host = host();
        run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 0.0, "y2": 8.0, "level": "Level 2", "wall_type": "Exterior - Brick on CMU"}),
        )
        .unwrap();
        let model = host.document().model();
        let wall = model.walls().next().unwrap();
        assert_eq!(model.find_level_by_name("Level 2").unwrap().id, wall.level_id);
    }

    #[test]
    fn test_create_wall_zero_length_opens_no_transaction() {
        let mut host = host();
        let err = run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 0.0, "y2": 0.0}),
        )
        .unwrap_err();
        assert!(matches!(err, OpError::Input(_)));
        assert_eq!(host.document().transaction_count(), 0);
        assert_eq!(host.document().model().element_count(), 0);
    }

    #[test]
    fn test_wall_validation_agrees_with_create() {
        let mut host = host();
        for x2 in [0.0, 0.001, 0.003, 12.0] {
            let args = json!({"x1": 0.0, "y1": 0.0, "x2": x2, "y2": 0.0});
            let verdict = run(&mut host, "validate_create_wall_line", args.clone()).unwrap();
            let created = run(&mut host, "create_wall_line", args);
            assert_eq!(verdict["canCreate"], created.is_ok(), "x2 = {}", x2);
        }
        assert_eq!(host.document().model().walls().count(), 2);
    }

    #[test]
    fn test_create_wall_unknown_references() {
        let mut host = host();
        let err = run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 1.0, "y2": 0.0, "level": "Roof"}),
        )
        .unwrap_err();
        assert_eq!(err, OpError::input("Level not found: Roof"));

        let err = run(
            &mut host,
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 1.0, "y2": 0.0, "wall_type": "Glass"}),
        )
        .unwrap_err();
        assert_eq!(err, OpError::input("Wall type not found: Glass"));
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_place_column_activates_type() {
        let mut host = host();
        let result = run(
            &mut host,
            "place_column",
            json!({"x": 3.0, "y": 4.0, "type": "450 x 450mm"}),
        )
        .unwrap();
        let id = result["elementId"].as_i64().unwrap();

        let model = host.document().model();
        let symbol = model
            .find_type_by_name(Category::StructuralColumns, "450 x 450mm")
            .unwrap();
        assert!(symbol.is_active);
        match model.element(crate::document::ElementId(id)) {
            Some(Element::FamilyInstance(fi)) => {
                assert_eq!(fi.symbol_id, symbol.id);
                assert_eq!(fi.transform.origin.x, 3.0);
                assert_eq!(fi.transform.origin.y, 4.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(host.document().transaction_count(), 1);
    }

    #[test]
    fn test_place_column_falls_back_to_first_type() {
        let mut host = host();
        run(&mut host, "place_column", json!({"x": 0.0, "y": 0.0, "level": "Level 2"})).unwrap();
        let model = host.document().model();
        let fi = match model.elements().next() {
            Some(Element::FamilyInstance(fi)) => fi.clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(model.element_type(fi.symbol_id).unwrap().name, "300 x 300mm");
        // Level 2 is at elevation 10
        assert_eq!(fi.transform.origin.z, 10.0);
    }

    #[test]
    fn test_place_column_without_types() {
        let mut seed = DocumentSeed::starter();
        seed.types.retain(|t| t.category != Category::StructuralColumns);
        let mut host = DocumentHost::new(Document::from_seed(seed).unwrap());
        let err = run(&mut host, "place_column", json!({"x": 0.0, "y": 0.0})).unwrap_err();
        assert_eq!(err, OpError::input("No structural column types available."));
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_place_column_unknown_type() {
        let mut host = host();
        let err = run(&mut host, "place_column", json!({"x": 0.0, "y": 0.0, "type": "HSS"}))
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_string(), "Column type not found: HSS");
    }
}
