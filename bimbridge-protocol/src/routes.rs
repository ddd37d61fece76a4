//! HTTP route table
//!
//! One route per operation. The server matches incoming requests against this
//! table and the proxy renders tool calls from it.

use crate::operation::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single route: operation name, method and path template
///
/// Templates are relative to `/<api_name>` and end with `/`. A segment of
/// the form `{name}` captures an integer path parameter which is merged into
/// the operation arguments under `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub operation: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub kind: OperationKind,
}

pub const ROUTES: &[RouteSpec] = &[
    route("status", HttpMethod::Get, "/status/", OperationKind::Query),
    route("levels", HttpMethod::Get, "/levels/", OperationKind::Query),
    route("types", HttpMethod::Get, "/types/", OperationKind::Query),
    route("quantify_walls", HttpMethod::Get, "/quantify/walls/", OperationKind::Query),
    route("list_families", HttpMethod::Get, "/families/", OperationKind::Query),
    route(
        "family_symbols",
        HttpMethod::Get,
        "/families/{familyId}/symbols/",
        OperationKind::Query,
    ),
    route("search_families", HttpMethod::Post, "/families/search/", OperationKind::Query),
    route(
        "validate_detail_line_view",
        HttpMethod::Get,
        "/validate/detail_line_view/",
        OperationKind::Validation,
    ),
    route(
        "validate_create_wall_line",
        HttpMethod::Post,
        "/validate/create_wall_line/",
        OperationKind::Validation,
    ),
    route(
        "validate_place_column",
        HttpMethod::Post,
        "/validate/place_column/",
        OperationKind::Validation,
    ),
    route(
        "validate_rebar_cage_column",
        HttpMethod::Post,
        "/validate/rebar_cage_column/",
        OperationKind::Validation,
    ),
    route("draw_detail_line", HttpMethod::Post, "/draw_detail_line/", OperationKind::Mutation),
    route("draw_model_line", HttpMethod::Post, "/draw_model_line/", OperationKind::Mutation),
    route(
        "draw_model_polyline",
        HttpMethod::Post,
        "/draw_model_polyline/",
        OperationKind::Mutation,
    ),
    route("create_wall_line", HttpMethod::Post, "/create_wall_line/", OperationKind::Mutation),
    route("place_column", HttpMethod::Post, "/place_column/", OperationKind::Mutation),
    route(
        "place_rebar_cage_column",
        HttpMethod::Post,
        "/place/rebar_cage_column/",
        OperationKind::Mutation,
    ),
    route(
        "activate_family_symbol",
        HttpMethod::Post,
        "/families/symbols/{symbolId}/activate/",
        OperationKind::Mutation,
    ),
];

const fn route(
    operation: &'static str,
    method: HttpMethod,
    path: &'static str,
    kind: OperationKind,
) -> RouteSpec {
    RouteSpec {
        operation,
        method,
        path,
        kind,
    }
}

/// A matched route and the integer parameters captured from its path
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub route: &'static RouteSpec,
    pub params: Vec<(&'static str, i64)>,
}

impl RouteMatch {
    /// Merge captured path parameters into a JSON argument object
    ///
    /// Path parameters win over body fields of the same name.
    pub fn merge_params(&self, arguments: serde_json::Value) -> serde_json::Value {
        if self.params.is_empty() {
            return arguments;
        }
        let mut map = match arguments {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (name, value) in &self.params {
            map.insert((*name).to_string(), serde_json::Value::from(*value));
        }
        serde_json::Value::Object(map)
    }
}

impl RouteSpec {
    /// Path parameter names in template order
    pub fn params(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
    }

    /// Match a path relative to the api prefix; trailing slash optional
    pub fn matches(&'static self, path: &str) -> Option<RouteMatch> {
        let want: Vec<&str> = segments(self.path).collect();
        let got: Vec<&str> = segments(path).collect();
        if want.len() != got.len() {
            return None;
        }

        let mut params = Vec::new();
        for (w, g) in want.iter().zip(got.iter()) {
            match w.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => params.push((name, g.parse::<i64>().ok()?)),
                None if w == g => {}
                None => return None,
            }
        }

        Some(RouteMatch {
            route: self,
            params,
        })
    }

    /// Render the path with parameters substituted from `arguments`
    ///
    /// Returns the name of the first missing or non-integer parameter on
    /// failure.
    pub fn render(&self, arguments: &serde_json::Value) -> Result<String, &'static str> {
        let mut out = String::with_capacity(self.path.len() + 8);
        for seg in segments(self.path) {
            out.push('/');
            match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = arguments
                        .get(name)
                        .and_then(integer_param)
                        .ok_or(name_of(self, name))?;
                    out.push_str(&value.to_string());
                }
                None => out.push_str(seg),
            }
        }
        out.push('/');
        Ok(out)
    }
}

fn name_of(route: &RouteSpec, name: &str) -> &'static str {
    route.params().find(|p| *p == name).unwrap_or("path parameter")
}

fn integer_param(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Find the route for a method and a path relative to the api prefix
pub fn match_route(method: HttpMethod, path: &str) -> Option<RouteMatch> {
    ROUTES
        .iter()
        .filter(|r| r.method == method)
        .find_map(|r| r.matches(path))
}

/// Find the route serving an operation
pub fn route_for(operation: &str) -> Option<&'static RouteSpec> {
    ROUTES.iter().find(|r| r.operation == operation)
}
