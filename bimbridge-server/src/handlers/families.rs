//! Family handlers
//!
//! Handles: ListFamilies, FamilySymbols, SearchFamilies, ActivateFamilySymbol

use bimbridge_protocol::{FamilyRef, SearchFamiliesArgs, SymbolRef};
use serde_json::{json, Value};
use tracing::info;

use super::DocumentHost;
use crate::bridge::{OpError, OpResult};
use crate::document::{ElementId, Family};

impl DocumentHost {
    pub(super) fn handle_list_families(&self) -> OpResult {
        let families: Vec<Value> = self
            .document
            .model()
            .families()
            .iter()
            .map(family_row)
            .collect();
        Ok(json!({ "count": families.len(), "families": families }))
    }

    pub(super) fn handle_family_symbols(&self, r: &FamilyRef) -> OpResult {
        let model = self.document.model();
        let family = model
            .family(ElementId(r.family_id))
            .ok_or_else(|| OpError::not_found("Family not found or invalid ID"))?;

        let symbols: Vec<Value> = family
            .symbol_ids
            .iter()
            .filter_map(|id| model.element_type(*id))
            .map(|sym| {
                json!({
                    "id": sym.id,
                    "name": sym.name,
                    "familyName": sym.family_name,
                    "isActive": sym.is_active,
                })
            })
            .collect();

        Ok(json!({
            "familyId": r.family_id,
            "familyName": family.name,
            "symbols": symbols,
        }))
    }

    /// Case-insensitive substring match on family or category name; the
    /// category filter must match the category name exactly
    pub(super) fn handle_search_families(&self, args: &SearchFamiliesArgs) -> OpResult {
        let query = args.query.to_lowercase();
        let category_filter = args.category.as_deref().filter(|c| !c.is_empty());

        let families: Vec<Value> = self
            .document
            .model()
            .families()
            .iter()
            .filter(|fam| {
                let category = fam.category.display_name().to_lowercase();
                if let Some(filter) = category_filter {
                    if category != filter.to_lowercase() {
                        return false;
                    }
                }
                query.is_empty()
                    || fam.name.to_lowercase().contains(&query)
                    || category.contains(&query)
            })
            .map(family_row)
            .collect();

        Ok(json!({
            "count": families.len(),
            "families": families,
            "query": query,
            "categoryFilter": args.category,
        }))
    }

    pub(super) fn handle_activate_family_symbol(&mut self, r: &SymbolRef) -> OpResult {
        let id = ElementId(r.symbol_id);
        let symbol = self
            .document
            .model()
            .element_type(id)
            .filter(|t| t.is_symbol())
            .ok_or_else(|| OpError::not_found("FamilySymbol not found or invalid ID"))?;
        let symbol_name = symbol.name.clone();

        if symbol.is_active {
            return Ok(json!({
                "ok": true,
                "message": "Symbol was already active",
                "symbolId": r.symbol_id,
                "symbolName": symbol_name,
            }));
        }

        let mut tx = self.document.begin("Activate Family Symbol");
        tx.model().activate_symbol(id)?;
        tx.commit();
        info!("Activated family symbol {} ({})", symbol_name, id);

        let is_active = self
            .document
            .model()
            .element_type(id)
            .map(|t| t.is_active)
            .unwrap_or(false);
        Ok(json!({
            "ok": true,
            "symbolId": r.symbol_id,
            "symbolName": symbol_name,
            "isActive": is_active,
        }))
    }
}

fn family_row(fam: &Family) -> Value {
    json!({
        "id": fam.id,
        "name": fam.name,
        "category": fam.category.display_name(),
        "symbolCount": fam.symbol_ids.len(),
    })
}
