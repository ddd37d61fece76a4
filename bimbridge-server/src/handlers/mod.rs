//! Dispatch table and operation handlers
//!
//! `DocumentHost` owns the document on the host thread and routes each
//! `Operation` to its handler. Queries and validations only read the
//! document. Each mutation resolves its inputs and derived geometry first,
//! then does all of its writes inside one transaction.

mod catalog;
mod drafting;
mod elements;
mod families;
mod quantify;
mod rebar;

use bimbridge_protocol::{Operation, DEFAULT_API_NAME};

use crate::bridge::{HostApplication, OpResult};
use crate::document::Document;
use crate::validation;

pub use quantify::SQUARE_FEET_TO_SQUARE_METERS;

/// The host application: one document plus the handlers that operate on it
pub struct DocumentHost {
    document: Document,
    api_name: String,
}

impl DocumentHost {
    pub fn new(document: Document) -> Self {
        Self::with_api_name(document, DEFAULT_API_NAME)
    }

    pub fn with_api_name(document: Document, api_name: impl Into<String>) -> Self {
        Self {
            document,
            api_name: api_name.into(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// Route an operation to its handler
    pub fn dispatch(&mut self, operation: &Operation) -> OpResult {
        match operation {
            // Queries
            Operation::Status => self.handle_status(),
            Operation::Levels => self.handle_levels(),
            Operation::Types => self.handle_types(),
            Operation::QuantifyWalls => self.handle_quantify_walls(),
            Operation::ListFamilies => self.handle_list_families(),
            Operation::FamilySymbols(r) => self.handle_family_symbols(r),
            Operation::SearchFamilies(args) => self.handle_search_families(args),

            // Validations
            Operation::ValidateDetailLineView => {
                Ok(validation::detail_view_check(&self.document).to_json())
            }
            Operation::ValidateCreateWallLine(args) => {
                Ok(validation::validate_create_wall_line(&self.document, args).to_json("canCreate"))
            }
            Operation::ValidatePlaceColumn(args) => {
                Ok(validation::validate_place_column(&self.document, args).to_json("canPlace"))
            }
            Operation::ValidateRebarCageColumn(args) => Ok(
                validation::validate_rebar_cage_column(&self.document, args).to_json("canDetail"),
            ),

            // Mutations
            Operation::DrawDetailLine(args) => self.handle_draw_detail_line(args),
            Operation::DrawModelLine(args) => self.handle_draw_model_line(args),
            Operation::DrawModelPolyline(args) => self.handle_draw_model_polyline(args),
            Operation::CreateWallLine(args) => self.handle_create_wall_line(args),
            Operation::PlaceColumn(args) => self.handle_place_column(args),
            Operation::PlaceRebarCageColumn(args) => self.handle_place_rebar_cage_column(args),
            Operation::ActivateFamilySymbol(r) => self.handle_activate_family_symbol(r),
        }
    }
}

impl HostApplication for DocumentHost {
    fn execute(&mut self, operation: &Operation) -> OpResult {
        self.dispatch(operation)
    }
}

impl std::fmt::Debug for DocumentHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHost")
            .field("document", &self.document)
            .field("api_name", &self.api_name)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_operation_dispatches() {
        let mut host = host();
        for (name, _) in bimbridge_protocol::OPERATION_NAMES {
            let args = match *name {
                "family_symbols" => json!({"familyId": 1}),
                "activate_family_symbol" => json!({"symbolId": 1}),
                "validate_rebar_cage_column" | "place_rebar_cage_column" => json!({"columnId": 1}),
                "validate_place_column" | "place_column" => json!({"x": 0.0, "y": 0.0}),
                "draw_model_line" => {
                    json!({"x1": 0.0, "y1": 0.0, "z1": 0.0, "x2": 1.0, "y2": 0.0, "z2": 0.0})
                }
                "draw_detail_line" | "validate_create_wall_line" | "create_wall_line" => {
                    json!({"x1": 0.0, "y1": 0.0, "x2": 1.0, "y2": 0.0})
                }
                _ => json!({}),
            };
            let op = Operation::parse(name, args).unwrap();
            // errors are fine here; the pump must only ever get a result
            let _ = host.execute(&op);
        }
        assert!(host.document().transactions().len() >= 4);
    }

    #[test]
    fn test_queries_open_no_transactions() {
        let mut host = host();
        for name in ["status", "levels", "types", "quantify_walls", "list_families"] {
            run(&mut host, name, json!(null)).unwrap();
        }
        assert_eq!(host.document().transaction_count(), 0);
    }
}
