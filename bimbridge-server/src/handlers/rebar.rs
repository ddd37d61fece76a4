//! Column reinforcement
//!
//! Handles: PlaceRebarCageColumn
//!
//! The cage is derived from the column's world bounding box inset by the
//! cover: one longitudinal bar at each vertical edge, plus an optional
//! stirrup rectangle laid out at maximum spacing over the inset height.
//! Every line is built before the transaction opens; the bars and the
//! stirrup set are then created in a single transaction.

use bimbridge_protocol::RebarCageArgs;
use serde_json::json;
use tracing::info;

use super::DocumentHost;
use crate::bridge::{OpError, OpResult};
use crate::document::geometry::{Line, Xyz};
use crate::document::{ElementId, RebarLayout};

/// Everything the cage needs, resolved against the document
struct CagePlan {
    host: ElementId,
    bar_type: ElementId,
    normal: Xyz,
    longitudinals: [Line; 4],
    stirrup: Option<StirrupPlan>,
}

struct StirrupPlan {
    shape: ElementId,
    outline: Vec<Line>,
    layout: RebarLayout,
}

impl DocumentHost {
    pub(super) fn handle_place_rebar_cage_column(&mut self, args: &RebarCageArgs) -> OpResult {
        let plan = self.plan_cage(args)?;
        let host = plan.host;
        let ids = self.place_cage(plan)?;
        info!("Rebar cage of {} bars placed in column {}", ids.len(), host);

        Ok(json!({"ok": true, "elementIds": ids}))
    }

    /// Write a resolved cage; any failed write rolls back every bar
    fn place_cage(&mut self, plan: CagePlan) -> Result<Vec<ElementId>, OpError> {
        let mut tx = self.document.begin("Column Rebar (longitudinals + stirrups)");
        let mut ids = Vec::with_capacity(5);
        for bar in plan.longitudinals {
            ids.push(
                tx.model()
                    .new_rebar(plan.host, plan.bar_type, None, plan.normal, vec![bar])?,
            );
        }
        if let Some(stirrup) = plan.stirrup {
            let id = tx.model().new_rebar(
                plan.host,
                plan.bar_type,
                Some(stirrup.shape),
                plan.normal,
                stirrup.outline,
            )?;
            tx.model().set_rebar_layout(id, stirrup.layout)?;
            ids.push(id);
        }
        tx.commit();
        Ok(ids)
    }

    fn plan_cage(&self, args: &RebarCageArgs) -> Result<CagePlan, OpError> {
        let model = self.document.model();
        let column = model
            .family_instance(ElementId(args.column_id))
            .ok_or_else(|| OpError::input("Invalid element"))?;

        let bar_type = args
            .bar_type
            .as_deref()
            .and_then(|name| model.find_rebar_bar_type(name))
            .or_else(|| model.rebar_catalog().bar_types.first())
            .map(|b| b.id)
            .ok_or_else(|| OpError::input("No RebarBarType available."))?;

        // an unknown shape name means no stirrups
        let shape = args
            .stirrup_shape
            .as_deref()
            .and_then(|name| model.find_rebar_shape(name))
            .map(|s| s.id);

        let bounds = model
            .world_bounds(column)
            .ok_or_else(|| OpError::input("Column has no bounding box"))?;

        let cover = args.cover;
        let (x1, x2) = (bounds.min.x + cover, bounds.max.x - cover);
        let (y1, y2) = (bounds.min.y + cover, bounds.max.y - cover);
        let (z1, z2) = (bounds.min.z + cover, bounds.max.z - cover);

        let vertical = |x: f64, y: f64| Line::bound(Xyz::new(x, y, z1), Xyz::new(x, y, z2));
        let longitudinals = [
            vertical(x1, y1)?,
            vertical(x2, y1)?,
            vertical(x2, y2)?,
            vertical(x1, y2)?,
        ];

        let stirrup = match shape {
            Some(shape) => {
                let zbase = z1 + args.stirrup_spacing * 0.5;
                let corners = [
                    Xyz::new(x1, y1, zbase),
                    Xyz::new(x2, y1, zbase),
                    Xyz::new(x2, y2, zbase),
                    Xyz::new(x1, y2, zbase),
                ];
                let outline = (0..4)
                    .map(|i| Line::bound(corners[i], corners[(i + 1) % 4]))
                    .collect::<Result<Vec<_>, _>>()?;
                let layout = RebarLayout::maximum_spacing(args.stirrup_spacing, z2 - z1)
                    .map_err(|e| OpError::input(e.to_string()))?;
                Some(StirrupPlan {
                    shape,
                    outline,
                    layout,
                })
            }
            None => None,
        };

        Ok(CagePlan {
            host: column.id,
            bar_type,
            normal: column.transform.basis_x,
            longitudinals,
            stirrup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::bridge::OpError;
    use crate::document::{
        Category, Document, DocumentSeed, Element, ElementId, InstanceSeed, StructuralMaterial,
        TransactionOutcome, TypeSeed,
    };
    use crate::handlers::DocumentHost;
    use bimbridge_protocol::RebarCageArgs;
    use serde_json::json;

    fn rebars(host: &DocumentHost) -> Vec<crate::document::Rebar> {
        host.document()
            .model()
            .elements()
            .filter_map(|e| match e {
                Element::Rebar(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cage_with_stirrups() {
        let (mut host, column) = host_with_column("300 x 300mm");
        let result = run(
            &mut host,
            "place_rebar_cage_column",
            json!({"columnId": column, "barType": "15M", "stirrupShape": "Stirrup", "stirrupSpacing": 0.5, "cover": 0.1}),
        )
        .unwrap();
        assert_eq!(result["elementIds"].as_array().unwrap().len(), 5);

        let bars = rebars(&host);
        assert_eq!(bars.len(), 5);
        for bar in &bars[..4] {
            assert_eq!(bar.host_id, ElementId(column));
            assert_eq!(bar.curves.len(), 1);
            assert!(bar.shape_id.is_none());
            // column is 10 ft tall, inset by cover at both ends
            assert!((bar.curves[0].length() - 9.8).abs() < 1e-9);
        }

        let stirrup = &bars[4];
        assert_eq!(stirrup.curves.len(), 4);
        assert!(stirrup.shape_id.is_some());
        // 1 ft square column inset by 0.1 on each side
        assert!((stirrup.curves[0].length() - 0.8).abs() < 1e-9);
        assert!((stirrup.curves[0].start().z - 0.35).abs() < 1e-9);
        let layout = stirrup.layout.unwrap();
        assert_eq!(layout.max_spacing, 0.5);
        assert_eq!(layout.count, 20);

        assert_eq!(host.document().transaction_count(), 1);
    }

    #[test]
    fn test_cage_without_shape() {
        let (mut host, column) = host_with_column("300 x 300mm");
        let result = run(
            &mut host,
            "place_rebar_cage_column",
            json!({"columnId": column, "stirrupShape": "NoSuchShape"}),
        )
        .unwrap();
        assert_eq!(result["elementIds"].as_array().unwrap().len(), 4);

        // no bar type named: the first one is used
        let first_bar = host.document().model().rebar_catalog().bar_types[0].id;
        assert!(rebars(&host).iter().all(|r| r.bar_type_id == first_bar));
    }

    #[test]
    fn test_invalid_element() {
        let mut host = host();
        let err = run(&mut host, "place_rebar_cage_column", json!({"columnId": 424242}))
            .unwrap_err();
        assert_eq!(err, OpError::input("Invalid element"));
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_no_bounding_box_opens_no_transaction() {
        let mut seed = DocumentSeed::starter();
        seed.types.push(TypeSeed {
            category: Category::StructuralColumns,
            family: "Generic Column".into(),
            name: "Unsized".into(),
            material: Some(StructuralMaterial::Concrete),
            width: None,
            depth: None,
            active: true,
        });
        seed.instances.push(InstanceSeed {
            type_name: "Unsized".into(),
            category: Category::StructuralColumns,
            level: "Level 1".into(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        let doc = Document::from_seed(seed).unwrap();
        let column = doc.model().elements().next().unwrap().id().0;
        let mut host = DocumentHost::new(doc);
        let before = host.document().snapshot();

        let err = run(&mut host, "place_rebar_cage_column", json!({"columnId": column}))
            .unwrap_err();
        assert_eq!(err, OpError::input("Column has no bounding box"));
        assert_eq!(err.status(), 400);
        assert_eq!(host.document().transaction_count(), 0);
        assert_eq!(host.document().snapshot(), before);
    }

    #[test]
    fn test_bad_spacing_opens_no_transaction() {
        let (mut host, column) = host_with_column("300 x 300mm");
        let before = host.document().snapshot();

        for spacing in [0.0, 1e-12] {
            let err = run(
                &mut host,
                "place_rebar_cage_column",
                json!({"columnId": column, "stirrupShape": "Stirrup", "stirrupSpacing": spacing}),
            )
            .unwrap_err();
            assert!(matches!(err, OpError::Input(_)), "{:?}", err);
            assert_eq!(err.status(), 400);
        }
        assert_eq!(host.document().transaction_count(), 0);
        assert_eq!(host.document().snapshot(), before);
    }

    #[test]
    fn test_inverted_cover_opens_no_transaction() {
        let (mut host, column) = host_with_column("300 x 300mm");
        // covers larger than half the 10 ft height invert the box vertically
        let err = run(
            &mut host,
            "place_rebar_cage_column",
            json!({"columnId": column, "stirrupShape": "Stirrup", "cover": 6.0}),
        )
        .unwrap_err();
        assert!(matches!(err, OpError::Input(_)), "{:?}", err);
        assert_eq!(host.document().transaction_count(), 0);
    }

    #[test]
    fn test_failed_write_rolls_back_every_bar() {
        let (mut host, column) = host_with_column("300 x 300mm");
        let before = host.document().snapshot();

        let args = RebarCageArgs {
            column_id: column,
            bar_type: None,
            stirrup_shape: Some("Stirrup".into()),
            stirrup_spacing: 0.2,
            cover: 0.03,
        };
        let mut plan = host.plan_cage(&args).unwrap();
        // the stirrup is the fifth write, after all four bars exist
        if let Some(stirrup) = plan.stirrup.as_mut() {
            stirrup.shape = ElementId(999_999);
        }

        let err = host.place_cage(plan).unwrap_err();
        assert!(matches!(err, OpError::Execution(_)));
        assert_eq!(err.status(), 500);
        assert_eq!(host.document().snapshot(), before);
        assert!(rebars(&host).is_empty());
        assert_eq!(
            host.document().transactions().last().map(|t| t.outcome),
            Some(TransactionOutcome::RolledBack)
        );
    }
}
