//! Typed operations
//!
//! Every request that reaches the host is one `Operation` variant. Arguments
//! arrive as JSON at the ingestion boundary and are parsed exactly once, here,
//! into the typed argument structs; nothing downstream sees raw JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_COVER, DEFAULT_LEVEL, DEFAULT_STIRRUP_SPACING};

/// How an operation may touch the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Reads only, never opens a transaction
    Query,
    /// Precondition check paired with a mutation, never opens a transaction
    Validation,
    /// Changes the document inside a transaction
    Mutation,
}

/// Failure to turn a name and JSON arguments into an `Operation`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperationError {
    #[error("unknown operation")]
    Unknown(String),

    #[error("invalid arguments for {operation}: {message}")]
    InvalidArguments {
        operation: &'static str,
        message: String,
    },
}

/// Arguments for a straight wall along a line on a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallLineArgs {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub wall_type: Option<String>,
}

impl WallLineArgs {
    pub fn level_name(&self) -> &str {
        level_or_default(&self.level)
    }
}

/// Arguments for a structural column at a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceColumnArgs {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
}

impl PlaceColumnArgs {
    pub fn level_name(&self) -> &str {
        level_or_default(&self.level)
    }
}

/// Arguments for a reinforcement cage attached to an existing column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarCageArgs {
    #[serde(rename = "columnId")]
    pub column_id: i64,
    #[serde(default, rename = "barType")]
    pub bar_type: Option<String>,
    #[serde(default, rename = "stirrupShape")]
    pub stirrup_shape: Option<String>,
    #[serde(default = "default_spacing", rename = "stirrupSpacing")]
    pub stirrup_spacing: f64,
    #[serde(default = "default_cover")]
    pub cover: f64,
}

/// Arguments for a view-specific detail line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailLineArgs {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub z1: f64,
    #[serde(default)]
    pub z2: f64,
}

/// Arguments for a model line in 3D space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLineArgs {
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
}

/// Arguments for a chain of model lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineArgs {
    #[serde(default)]
    pub points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFamiliesArgs {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRef {
    #[serde(rename = "familyId")]
    pub family_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    #[serde(rename = "symbolId")]
    pub symbol_id: i64,
}

/// One operation requested of the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Operation {
    Status,
    Levels,
    Types,
    QuantifyWalls,
    ListFamilies,
    FamilySymbols(FamilyRef),
    SearchFamilies(SearchFamiliesArgs),
    ValidateDetailLineView,
    ValidateCreateWallLine(WallLineArgs),
    ValidatePlaceColumn(PlaceColumnArgs),
    ValidateRebarCageColumn(RebarCageArgs),
    DrawDetailLine(DetailLineArgs),
    DrawModelLine(ModelLineArgs),
    DrawModelPolyline(PolylineArgs),
    CreateWallLine(WallLineArgs),
    PlaceColumn(PlaceColumnArgs),
    PlaceRebarCageColumn(RebarCageArgs),
    ActivateFamilySymbol(SymbolRef),
}

/// Every operation name with its kind, in route-table order
pub const OPERATION_NAMES: &[(&str, OperationKind)] = &[
    ("status", OperationKind::Query),
    ("levels", OperationKind::Query),
    ("types", OperationKind::Query),
    ("quantify_walls", OperationKind::Query),
    ("list_families", OperationKind::Query),
    ("family_symbols", OperationKind::Query),
    ("search_families", OperationKind::Query),
    ("validate_detail_line_view", OperationKind::Validation),
    ("validate_create_wall_line", OperationKind::Validation),
    ("validate_place_column", OperationKind::Validation),
    ("validate_rebar_cage_column", OperationKind::Validation),
    ("draw_detail_line", OperationKind::Mutation),
    ("draw_model_line", OperationKind::Mutation),
    ("draw_model_polyline", OperationKind::Mutation),
    ("create_wall_line", OperationKind::Mutation),
    ("place_column", OperationKind::Mutation),
    ("place_rebar_cage_column", OperationKind::Mutation),
    ("activate_family_symbol", OperationKind::Mutation),
];

impl Operation {
    /// Parse an operation from its name and JSON arguments
    ///
    /// `null` arguments are treated as an empty object so that bodiless
    /// requests still pick up field defaults.
    pub fn parse(name: &str, arguments: serde_json::Value) -> Result<Self, OperationError> {
        let arguments = match arguments {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let op = match name {
            "status" => Self::Status,
            "levels" => Self::Levels,
            "types" => Self::Types,
            "quantify_walls" => Self::QuantifyWalls,
            "list_families" => Self::ListFamilies,
            "family_symbols" => Self::FamilySymbols(args("family_symbols", arguments)?),
            "search_families" => Self::SearchFamilies(args("search_families", arguments)?),
            "validate_detail_line_view" => Self::ValidateDetailLineView,
            "validate_create_wall_line" => {
                Self::ValidateCreateWallLine(args("validate_create_wall_line", arguments)?)
            }
            "validate_place_column" => {
                Self::ValidatePlaceColumn(args("validate_place_column", arguments)?)
            }
            "validate_rebar_cage_column" => {
                Self::ValidateRebarCageColumn(args("validate_rebar_cage_column", arguments)?)
            }
            "draw_detail_line" => Self::DrawDetailLine(args("draw_detail_line", arguments)?),
            "draw_model_line" => Self::DrawModelLine(args("draw_model_line", arguments)?),
            "draw_model_polyline" => {
                Self::DrawModelPolyline(args("draw_model_polyline", arguments)?)
            }
            "create_wall_line" => Self::CreateWallLine(args("create_wall_line", arguments)?),
            "place_column" => Self::PlaceColumn(args("place_column", arguments)?),
            "place_rebar_cage_column" => {
                Self::PlaceRebarCageColumn(args("place_rebar_cage_column", arguments)?)
            }
            "activate_family_symbol" => {
                Self::ActivateFamilySymbol(args("activate_family_symbol", arguments)?)
            }
            other => return Err(OperationError::Unknown(other.to_string())),
        };

        Ok(op)
    }

    /// Stable operation name, identical to the tool and route name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Levels => "levels",
            Self::Types => "types",
            Self::QuantifyWalls => "quantify_walls",
            Self::ListFamilies => "list_families",
            Self::FamilySymbols(_) => "family_symbols",
            Self::SearchFamilies(_) => "search_families",
            Self::ValidateDetailLineView => "validate_detail_line_view",
            Self::ValidateCreateWallLine(_) => "validate_create_wall_line",
            Self::ValidatePlaceColumn(_) => "validate_place_column",
            Self::ValidateRebarCageColumn(_) => "validate_rebar_cage_column",
            Self::DrawDetailLine(_) => "draw_detail_line",
            Self::DrawModelLine(_) => "draw_model_line",
            Self::DrawModelPolyline(_) => "draw_model_polyline",
            Self::CreateWallLine(_) => "create_wall_line",
            Self::PlaceColumn(_) => "place_column",
            Self::PlaceRebarCageColumn(_) => "place_rebar_cage_column",
            Self::ActivateFamilySymbol(_) => "activate_family_symbol",
        }
    }

    pub fn kind(&self) -> OperationKind {
        kind_of(self.name()).unwrap_or(OperationKind::Mutation)
    }

    pub fn is_mutation(&self) -> bool {
        self.kind() == OperationKind::Mutation
    }

    /// Arguments as JSON, for logging
    pub fn arguments_json(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("args").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Look up the kind of a named operation
pub fn kind_of(name: &str) -> Option<OperationKind> {
    OPERATION_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}

fn args<T: DeserializeOwned>(
    operation: &'static str,
    arguments: serde_json::Value,
) -> Result<T, OperationError> {
    serde_json::from_value(arguments).map_err(|e| OperationError::InvalidArguments {
        operation,
        message: e.to_string(),
    })
}

fn level_or_default(level: &Option<String>) -> &str {
    match level.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_LEVEL,
    }
}

fn default_spacing() -> f64 {
    DEFAULT_STIRRUP_SPACING
}

fn default_cover() -> f64 {
    DEFAULT_COVER
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wall_line_defaults() {
        let op = Operation::parse(
            "create_wall_line",
            json!({"x1": 0.0, "y1": 0.0, "x2": 10.0, "y2": 0.0}),
        )
        .unwrap();

        match op {
            Operation::CreateWallLine(args) => {
                assert_eq!(args.z, 0.0);
                assert_eq!(args.level_name(), DEFAULT_LEVEL);
                assert!(args.wall_type.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_null_level_falls_back() {
        let op = Operation::parse(
            "place_column",
            json!({"x": 1, "y": 2, "level": null, "type": null}),
        )
        .unwrap();
        let Operation::PlaceColumn(args) = op else {
            panic!("expected PlaceColumn");
        };
        assert_eq!(args.level_name(), "Level 1");
        assert!(args.type_name.is_none());
    }

    #[test]
    fn test_parse_rebar_defaults() {
        let op = Operation::parse("place_rebar_cage_column", json!({"columnId": 42})).unwrap();
        let Operation::PlaceRebarCageColumn(args) = op else {
            panic!("expected PlaceRebarCageColumn");
        };
        assert_eq!(args.column_id, 42);
        assert_eq!(args.stirrup_spacing, DEFAULT_STIRRUP_SPACING);
        assert_eq!(args.cover, DEFAULT_COVER);
    }

    #[test]
    fn test_parse_missing_required_field() {
        let err = Operation::parse("create_wall_line", json!({"x1": 0.0})).unwrap_err();
        match err {
            OperationError::InvalidArguments { operation, message } => {
                assert_eq!(operation, "create_wall_line");
                assert!(message.contains("y1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_wrong_type() {
        let err = Operation::parse("place_column", json!({"x": "abc", "y": 1})).unwrap_err();
        assert!(matches!(err, OperationError::InvalidArguments { .. }));
    }

    #[test]
    fn test_parse_unknown() {
        let err = Operation::parse("explode_building", json!({})).unwrap_err();
        assert_eq!(err, OperationError::Unknown("explode_building".into()));
        assert_eq!(err.to_string(), "unknown operation");
    }

    #[test]
    fn test_parse_bodiless_query() {
        assert_eq!(
            Operation::parse("levels", serde_json::Value::Null).unwrap(),
            Operation::Levels
        );
        let op = Operation::parse("search_families", serde_json::Value::Null).unwrap();
        assert_eq!(
            op,
            Operation::SearchFamilies(SearchFamiliesArgs {
                query: String::new(),
                category: None
            })
        );
    }

    #[test]
    fn test_name_matches_parse_for_every_operation() {
        let samples = [
            ("family_symbols", json!({"familyId": 1})),
            ("validate_create_wall_line", json!({"x1": 0, "y1": 0, "x2": 1, "y2": 0})),
            ("validate_place_column", json!({"x": 0, "y": 0})),
            ("validate_rebar_cage_column", json!({"columnId": 1})),
            ("draw_detail_line", json!({"x1": 0, "y1": 0, "x2": 1, "y2": 0})),
            ("draw_model_line", json!({"x1": 0, "y1": 0, "z1": 0, "x2": 1, "y2": 0, "z2": 0})),
            ("draw_model_polyline", json!({"points": [[0, 0, 0], [1, 0, 0]]})),
            ("activate_family_symbol", json!({"symbolId": 7})),
        ];

        for (name, _) in OPERATION_NAMES {
            let arguments = samples
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, a)| a.clone())
                .unwrap_or_else(|| match *name {
                    "create_wall_line" => json!({"x1": 0, "y1": 0, "x2": 1, "y2": 0}),
                    "place_column" => json!({"x": 0, "y": 0}),
                    "place_rebar_cage_column" => json!({"columnId": 1}),
                    _ => json!({}),
                });
            let op = Operation::parse(name, arguments)
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", name, e));
            assert_eq!(op.name(), *name);
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Operation::Levels.kind(), OperationKind::Query);
        assert_eq!(Operation::ValidateDetailLineView.kind(), OperationKind::Validation);
        assert!(Operation::ActivateFamilySymbol(SymbolRef { symbol_id: 1 }).is_mutation());
        assert_eq!(kind_of("nope"), None);
    }

    #[test]
    fn test_arguments_json() {
        let op = Operation::ActivateFamilySymbol(SymbolRef { symbol_id: 9 });
        assert_eq!(op.arguments_json(), json!({"symbolId": 9}));
        assert_eq!(Operation::Status.arguments_json(), serde_json::Value::Null);
    }
}
