//! The host document
//!
//! An in-process stand-in for the single-threaded CAD host. The document is
//! owned by the host thread; nothing else reads or writes it.

pub mod geometry;
mod model;
mod seed;
mod transaction;

use serde::Serialize;

pub use model::{
    CatalogEntry, Category, DetailCurve, Element, ElementId, ElementType, Family,
    FamilyInstance, Level, ModelCurve, ModelError, ModelStore, NameKey, Rebar, RebarCatalog,
    RebarLayout, SketchPlane, StructuralMaterial, View, ViewKind, Wall, DEFAULT_STOREY_HEIGHT,
};
pub use seed::{DocumentSeed, InstanceSeed, LevelSeed, RebarSeed, TypeSeed, ViewSeed};
pub use transaction::{Transaction, TransactionOutcome, TransactionRecord};

/// Comparable image of every observable document property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSnapshot {
    pub title: String,
    pub model: ModelStore,
}

pub struct Document {
    title: String,
    store: ModelStore,
    journal: Vec<TransactionRecord>,
}

impl Document {
    /// An empty document: no levels, no types, no views
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            store: ModelStore::default(),
            journal: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Read access to the model
    pub fn model(&self) -> &ModelStore {
        &self.store
    }

    /// Open a transaction; see [`Transaction`]
    pub fn begin(&mut self, label: impl Into<String>) -> Transaction<'_> {
        Transaction::start(self, label.into())
    }

    /// Every transaction that has ended, oldest first
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.journal
    }

    pub fn transaction_count(&self) -> usize {
        self.journal.len()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            title: self.title.clone(),
            model: self.store.clone(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title)
            .field("elements", &self.store.element_count())
            .field("transactions", &self.journal.len())
            .finish()
    }
}
