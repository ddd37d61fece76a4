//! Transaction guard
//!
//! A `Transaction` captures the model store when it starts. `commit`
//! keeps the changes; dropping it uncommitted restores the captured store,
//! whether the scope was left by `?`, an early return or a panic.

use serde::Serialize;
use tracing::{debug, warn};

use super::model::ModelStore;
use super::Document;
use crate::observability::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOutcome {
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub label: String,
    pub outcome: TransactionOutcome,
}

/// Scoped unit of work over one document
///
/// Holds the document mutably, so a second transaction cannot start while
/// this one is open.
pub struct Transaction<'a> {
    doc: &'a mut Document,
    label: String,
    saved: Option<ModelStore>,
}

impl<'a> Transaction<'a> {
    pub(super) fn start(doc: &'a mut Document, label: String) -> Self {
        debug!(label = %label, "transaction started");
        let saved = Some(doc.store.clone());
        Self { doc, label, saved }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Mutable access to the model while the transaction is open
    pub fn model(&mut self) -> &mut ModelStore {
        &mut self.doc.store
    }

    pub fn commit(mut self) {
        self.saved = None;
        debug!(label = %self.label, "transaction committed");
        Metrics::global().record_transaction_committed();
        self.record(TransactionOutcome::Committed);
    }

    /// Roll back explicitly; same as dropping the guard
    pub fn rollback(self) {}

    fn record(&mut self, outcome: TransactionOutcome) {
        self.doc.journal.push(TransactionRecord {
            label: std::mem::take(&mut self.label),
            outcome,
        });
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.doc.store = saved;
            warn!(label = %self.label, "transaction rolled back");
            Metrics::global().record_transaction_rolled_back();
            self.record(TransactionOutcome::RolledBack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::geometry::{Line, Xyz};

    fn wall_line() -> Line {
        Line::bound(Xyz::ZERO, Xyz::new(10.0, 0.0, 0.0)).unwrap()
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut doc = Document::starter("Test");
        let level = doc.model().levels()[0].id;
        let wall_type = doc.model().types()[0].id;

        let mut tx = doc.begin("create wall");
        tx.model().create_wall(wall_line(), level, wall_type).unwrap();
        tx.commit();

        assert_eq!(doc.model().walls().count(), 1);
        assert_eq!(
            doc.transactions(),
            &[TransactionRecord {
                label: "create wall".into(),
                outcome: TransactionOutcome::Committed
            }]
        );
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut doc = Document::starter("Test");
        let before = doc.snapshot();
        let level = doc.model().levels()[0].id;
        let wall_type = doc.model().types()[0].id;

        {
            let mut tx = doc.begin("abandoned");
            tx.model().create_wall(wall_line(), level, wall_type).unwrap();
            tx.model().create_wall(wall_line(), level, wall_type).unwrap();
        }

        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.transactions()[0].outcome, TransactionOutcome::RolledBack);
    }

    #[test]
    fn test_error_path_rolls_back() {
        fn failing(doc: &mut Document) -> Result<(), crate::document::ModelError> {
            let mut tx = doc.begin("failing");
            let sp = tx.model().new_sketch_plane(
                crate::document::geometry::Plane::for_line(Xyz::ZERO, Xyz::BASIS_X).unwrap(),
            );
            // off-plane curve fails after the sketch plane exists
            let off = Line::bound(Xyz::new(0.0, 5.0, 0.0), Xyz::new(1.0, 5.0, 0.0)).unwrap();
            tx.model().new_model_curve(off, sp)?;
            tx.commit();
            Ok(())
        }

        let mut doc = Document::starter("Test");
        let before = doc.snapshot();
        assert!(failing(&mut doc).is_err());
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.transaction_count(), 1);
    }

    #[test]
    fn test_panic_rolls_back() {
        let mut doc = Document::starter("Test");
        let before = doc.snapshot();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut tx = doc.begin("panicking");
            tx.model().new_sketch_plane(
                crate::document::geometry::Plane::for_line(Xyz::ZERO, Xyz::BASIS_X).unwrap(),
            );
            panic!("handler bug");
        }));
        assert!(result.is_err());
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.transactions()[0].outcome, TransactionOutcome::RolledBack);
    }
}
