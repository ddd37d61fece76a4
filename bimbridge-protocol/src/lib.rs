//! bimbridge-protocol: Shared definitions between the in-host bridge and the tool proxy
//!
//! This crate defines the typed operations a client may ask the host to run,
//! the HTTP route table that exposes them, and the shape of validation
//! results. Both sides of the wire depend on it so that the tool catalog and
//! the route surface cannot drift apart.

pub mod operation;
pub mod routes;
pub mod validation;

// Re-export main types at crate root
pub use operation::{
    kind_of, DetailLineArgs, FamilyRef, ModelLineArgs, Operation, OperationError, OperationKind,
    PlaceColumnArgs, PolylineArgs, RebarCageArgs, SearchFamiliesArgs, SymbolRef, WallLineArgs, OPERATION_NAMES,
};
pub use routes::{match_route, route_for, HttpMethod, RouteMatch, RouteSpec, ROUTES};
pub use validation::ValidationResult;

/// Level used when a request does not name one
pub const DEFAULT_LEVEL: &str = "Level 1";

/// Default maximum stirrup spacing, in model units
pub const DEFAULT_STIRRUP_SPACING: f64 = 0.2;

/// Default concrete cover, in model units
pub const DEFAULT_COVER: f64 = 0.03;

/// Default API name; routes live under `/<api_name>/`
pub const DEFAULT_API_NAME: &str = "bimbridge";
