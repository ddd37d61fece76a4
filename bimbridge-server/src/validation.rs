//! Validation layer
//!
//! Read-only precondition checks paired with the mutating operations. Each
//! check takes `&Document`, so it cannot open a transaction or change the
//! model. The first failing check supplies the reason.

use bimbridge_protocol::{PlaceColumnArgs, RebarCageArgs, ValidationResult, WallLineArgs};

use crate::document::geometry::{Line, Xyz};
use crate::document::{
    Category, Document, ElementId, RebarLayout, StructuralMaterial, View, ViewKind,
};

pub fn validate_create_wall_line(doc: &Document, args: &WallLineArgs) -> ValidationResult {
    let model = doc.model();
    let level_name = args.level_name();
    if model.find_level_by_name(level_name).is_none() {
        return ValidationResult::deny(format!("Level not found: {}", level_name));
    }

    if let Some(wall_type) = non_empty(&args.wall_type) {
        if model.find_type_by_name(Category::Walls, wall_type).is_none() {
            return ValidationResult::deny(format!("Wall type not found: {}", wall_type));
        }
    }

    let start = Xyz::new(args.x1, args.y1, args.z);
    let end = Xyz::new(args.x2, args.y2, args.z);
    if Line::bound(start, end).is_err() {
        return ValidationResult::deny("Line has zero length");
    }

    ValidationResult::allow()
}

pub fn validate_place_column(doc: &Document, args: &PlaceColumnArgs) -> ValidationResult {
    let model = doc.model();
    let level_name = args.level_name();
    if model.find_level_by_name(level_name).is_none() {
        return ValidationResult::deny(format!("Level not found: {}", level_name));
    }

    match non_empty(&args.type_name) {
        Some(name) => {
            if model
                .find_type_by_name(Category::StructuralColumns, name)
                .is_none()
            {
                return ValidationResult::deny(format!("Column type not found: {}", name));
            }
        }
        None => {
            if model.types_of(Category::StructuralColumns).next().is_none() {
                return ValidationResult::deny("No structural column types available");
            }
        }
    }

    ValidationResult::allow()
}

pub fn validate_rebar_cage_column(doc: &Document, args: &RebarCageArgs) -> ValidationResult {
    let model = doc.model();
    if args.column_id <= 0 {
        return ValidationResult::deny("columnId missing/invalid");
    }

    let column = match model.family_instance(ElementId(args.column_id)) {
        Some(column) => column,
        None => return ValidationResult::deny("Element is not a FamilyInstance"),
    };
    if column.category != Category::StructuralColumns {
        return ValidationResult::deny("Element is not a structural column");
    }
    if column.material != Some(StructuralMaterial::Concrete) {
        return ValidationResult::deny("Column is not concrete");
    }

    if let Some(bar_type) = non_empty(&args.bar_type) {
        if model.find_rebar_bar_type(bar_type).is_none() {
            return ValidationResult::deny(format!("RebarBarType not found: {}", bar_type));
        }
    }
    if let Some(shape) = non_empty(&args.stirrup_shape) {
        if model.find_rebar_shape(shape).is_none() {
            return ValidationResult::deny(format!("RebarShape not found: {}", shape));
        }
    }

    if args.stirrup_spacing.is_nan() || args.stirrup_spacing <= 0.0 {
        return ValidationResult::deny("stirrupSpacing must be > 0");
    }
    if args.cover.is_nan() || args.cover < 0.0 {
        return ValidationResult::deny("cover must be >= 0");
    }

    let bounds = match model.world_bounds(column) {
        Some(bounds) => bounds,
        None => return ValidationResult::deny("Column has no bounding box"),
    };
    if non_empty(&args.stirrup_shape).is_some() {
        let array_length = (bounds.max.z - args.cover) - (bounds.min.z + args.cover);
        if let Err(e) = RebarLayout::maximum_spacing(args.stirrup_spacing, array_length) {
            return ValidationResult::deny(e.to_string());
        }
    }

    ValidationResult::allow()
}

/// Whether the active view can hold detail lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailViewCheck {
    pub can_draw_detail_line: bool,
    pub reason: Option<String>,
    pub view_type: Option<String>,
}

impl DetailViewCheck {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "canDrawDetailLine": self.can_draw_detail_line,
            "reason": self.reason,
            "viewType": self.view_type,
        })
    }
}

pub fn detail_view_check(doc: &Document) -> DetailViewCheck {
    let view = match doc.model().active_view() {
        Some(view) => view,
        None => {
            return DetailViewCheck {
                can_draw_detail_line: false,
                reason: Some("No active view".into()),
                view_type: None,
            }
        }
    };

    let view_type = Some(view.kind.type_name().to_string());
    match detail_line_rejection(view) {
        Some(reason) => DetailViewCheck {
            can_draw_detail_line: false,
            reason: Some(reason),
            view_type,
        },
        None => DetailViewCheck {
            can_draw_detail_line: true,
            reason: None,
            view_type,
        },
    }
}

fn detail_line_rejection(view: &View) -> Option<String> {
    if view.is_template {
        return Some("Active view is a template".into());
    }
    if view.kind == ViewKind::ThreeD && view.is_perspective {
        return Some("Perspective 3D views do not support detail lines".into());
    }
    let reason = match view.kind {
        ViewKind::DrawingSheet => "Sheets do not support detail lines",
        ViewKind::Schedule => "Schedules do not support detail lines",
        ViewKind::ThreeD => "3D views do not support detail lines",
        ViewKind::Legend => "Legends do not support detail lines",
        ViewKind::ProjectBrowser | ViewKind::Internal => {
            return Some(format!(
                "Active view does not support detail lines (type: {})",
                view.kind.type_name()
            ))
        }
        _ => return None,
    };
    Some(reason.into())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
