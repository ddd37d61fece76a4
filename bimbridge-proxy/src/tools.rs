//! MCP tool definitions
//!
//! One tool per bridge route, named after the operation. Argument names and
//! defaults are the ones the route's JSON body accepts.

use bimbridge_protocol::{
    route_for, RouteSpec, DEFAULT_COVER, DEFAULT_LEVEL, DEFAULT_STIRRUP_SPACING, ROUTES,
};
use serde_json::{json, Map, Value};

use crate::protocol::Tool;

fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

fn number_default(description: &str, default: f64) -> Value {
    json!({"type": "number", "description": description, "default": default})
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn integer(description: &str) -> Value {
    json!({"type": "integer", "description": description})
}

fn object(properties: &[(&str, Value)], required: &[&str]) -> Value {
    let props: Map<String, Value> = properties
        .iter()
        .map(|(name, schema)| ((*name).to_string(), schema.clone()))
        .collect();
    let mut schema = json!({"type": "object", "properties": props});
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn level() -> Value {
    json!({"type": "string", "description": "Level name", "default": DEFAULT_LEVEL})
}

fn wall_line_schema() -> Value {
    object(
        &[
            ("x1", number("Start X")),
            ("y1", number("Start Y")),
            ("x2", number("End X")),
            ("y2", number("End Y")),
            ("z", number_default("Elevation of the line", 0.0)),
            ("level", level()),
            ("wall_type", string("Wall type name; the first wall type when omitted")),
        ],
        &["x1", "y1", "x2", "y2"],
    )
}

fn place_column_schema() -> Value {
    object(
        &[
            ("x", number("X")),
            ("y", number("Y")),
            ("z", number_default("Z", 0.0)),
            ("level", level()),
            ("type", string("Column type name; the first column type when omitted")),
        ],
        &["x", "y"],
    )
}

fn rebar_cage_schema() -> Value {
    object(
        &[
            ("columnId", integer("Element id of the host column")),
            ("barType", string("Rebar bar type; the first bar type when omitted")),
            ("stirrupShape", string("Rebar shape for stirrups; no stirrups when omitted or unknown")),
            (
                "stirrupSpacing",
                number_default("Maximum stirrup spacing", DEFAULT_STIRRUP_SPACING),
            ),
            ("cover", number_default("Concrete cover", DEFAULT_COVER)),
        ],
        &["columnId"],
    )
}

/// Description and input schema for an operation's tool
fn describe(operation: &str) -> Option<(&'static str, Value)> {
    let empty = || object(&[], &[]);
    let tool = match operation {
        "status" => ("Bridge and document status", empty()),
        "levels" => ("List levels with their elevations", empty()),
        "types" => (
            "List wall, column, beam, door and window types plus the rebar catalog",
            empty(),
        ),
        "quantify_walls" => ("Wall areas and paint areas in square meters", empty()),
        "list_families" => ("List loaded families", empty()),
        "family_symbols" => (
            "List the symbols (types) of a family",
            object(&[("familyId", integer("Family element id"))], &["familyId"]),
        ),
        "search_families" => (
            "Search families by name or category",
            object(
                &[
                    (
                        "query",
                        json!({"type": "string", "description": "Case-insensitive text", "default": ""}),
                    ),
                    ("category", string("Only families whose category contains this text")),
                ],
                &[],
            ),
        ),
        "validate_detail_line_view" => (
            "Check whether the active view accepts detail lines",
            empty(),
        ),
        "validate_create_wall_line" => (
            "Check whether create_wall_line would succeed, without changing the model",
            wall_line_schema(),
        ),
        "validate_place_column" => (
            "Check whether place_column would succeed, without changing the model",
            place_column_schema(),
        ),
        "validate_rebar_cage_column" => (
            "Check whether place_rebar_cage_column would succeed, without changing the model",
            rebar_cage_schema(),
        ),
        "draw_detail_line" => (
            "Draw a detail line in the active view",
            object(
                &[
                    ("x1", number("Start X")),
                    ("y1", number("Start Y")),
                    ("x2", number("End X")),
                    ("y2", number("End Y")),
                    ("z1", number_default("Start Z", 0.0)),
                    ("z2", number_default("End Z", 0.0)),
                ],
                &["x1", "y1", "x2", "y2"],
            ),
        ),
        "draw_model_line" => (
            "Draw a model line on a sketch plane through its endpoints",
            object(
                &[
                    ("x1", number("Start X")),
                    ("y1", number("Start Y")),
                    ("z1", number("Start Z")),
                    ("x2", number("End X")),
                    ("y2", number("End Y")),
                    ("z2", number("End Z")),
                ],
                &["x1", "y1", "z1", "x2", "y2", "z2"],
            ),
        ),
        "draw_model_polyline" => (
            "Draw connected model lines through a list of points",
            object(
                &[(
                    "points",
                    json!({
                        "type": "array",
                        "description": "At least two [x, y, z] points on one plane",
                        "items": {"type": "array", "items": {"type": "number"}, "minItems": 3, "maxItems": 3},
                        "minItems": 2
                    }),
                )],
                &["points"],
            ),
        ),
        "create_wall_line" => ("Create a straight wall along a line", wall_line_schema()),
        "place_column" => ("Place a structural column at a point", place_column_schema()),
        "place_rebar_cage_column" => (
            "Place four corner bars and optional stirrups in a concrete column",
            rebar_cage_schema(),
        ),
        "activate_family_symbol" => (
            "Activate a family symbol so it can be placed",
            object(&[("symbolId", integer("Family symbol element id"))], &["symbolId"]),
        ),
        _ => return None,
    };
    Some(tool)
}

fn tool_for(route: &RouteSpec) -> Option<Tool> {
    let (description, input_schema) = describe(route.operation)?;
    Some(Tool {
        name: route.operation.to_string(),
        description: description.to_string(),
        input_schema,
    })
}

/// Every tool, in route table order
pub fn get_tool_definitions() -> Vec<Tool> {
    ROUTES.iter().filter_map(tool_for).collect()
}

/// The route a tool calls
pub fn route_for_tool(name: &str) -> Option<&'static RouteSpec> {
    route_for(name).filter(|route| describe(route.operation).is_some())
}

/// Names of the arguments a tool cannot be called without
pub fn required_arguments(name: &str) -> Vec<String> {
    describe(name)
        .and_then(|(_, schema)| {
            schema["required"].as_array().map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
        })
        .unwrap_or_default()
}
