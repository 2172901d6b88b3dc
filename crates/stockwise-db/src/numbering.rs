//! # Document Number Generator
//!
//! Issues `PREFIX-NNNNN` numbers that are unique within a table.
//!
//! ## Algorithm
//! ```text
//! lock ──► read every row of the table
//!      ──► stored = highest sequence among `column` values with PREFIX
//!      ──► issued = last sequence this generator handed out for (table, PREFIX)
//!      ──► next   = max(stored, issued) + 1
//!      ──► remember next, unlock
//! ```
//!
//! Remembering what was issued keeps numbers distinct even when the caller
//! has not inserted the previous document yet, or rolled it back. Rolled-back
//! numbers are skipped, not reused. The lock is per generator, so two
//! processes writing the same file can still collide; the UNIQUE constraint
//! on the number column is the backstop there.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::DbResult;
use crate::store::RecordStore;
use stockwise_core::numbering::{format_document_number, highest_sequence};
use stockwise_core::{Table, DEFAULT_NUMBER_WIDTH};

/// Serialized source of document numbers.
#[derive(Debug)]
pub struct DocumentNumberGenerator {
    width: usize,
    issued: Mutex<HashMap<(Table, String), u64>>,
}

impl Default for DocumentNumberGenerator {
    fn default() -> Self {
        DocumentNumberGenerator::new(DEFAULT_NUMBER_WIDTH)
    }
}

impl DocumentNumberGenerator {
    /// `width` is the zero-padding of the sequence part.
    pub fn new(width: usize) -> Self {
        DocumentNumberGenerator {
            width,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Next number for `prefix` among the `column` values of `table`.
    pub async fn next(
        &self,
        store: &dyn RecordStore,
        table: Table,
        column: &str,
        prefix: &str,
    ) -> DbResult<String> {
        let mut issued = self.issued.lock().await;

        let rows = store.find_all_rows(table).await?;
        let stored = highest_sequence(
            prefix,
            rows.iter()
                .filter_map(|row| row.get(column).and_then(Value::as_str)),
        );

        let key = (table, prefix.to_string());
        let last = issued.get(&key).copied().unwrap_or(0);
        let sequence = stored.max(last) + 1;
        issued.insert(key, sequence);

        let number = format_document_number(prefix, sequence, self.width);
        debug!(table = %table, number = %number, "Issued document number");
        Ok(number)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Row};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn numbered(column: &str, number: &str) -> Row {
        let mut row = Row::new();
        row.insert(column.to_string(), json!(number));
        row
    }

    #[tokio::test]
    async fn test_sequential_calls_are_distinct_and_increasing() {
        let store = MemoryStore::new();
        let generator = DocumentNumberGenerator::default();

        let mut numbers = Vec::new();
        for _ in 0..25 {
            numbers.push(
                generator
                    .next(&store, Table::PurchaseOrders, "order_number", "PO")
                    .await
                    .unwrap(),
            );
        }

        assert_eq!(numbers[0], "PO-00001");
        assert_eq!(numbers[24], "PO-00025");
        let unique: HashSet<_> = numbers.iter().collect();
        assert_eq!(unique.len(), numbers.len());
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_continues_after_stored_numbers() {
        let store = MemoryStore::new();
        for number in ["PO-00007", "PO-00003", "LEGACY-1"] {
            store
                .insert_row(Table::PurchaseOrders, numbered("order_number", number))
                .await
                .unwrap();
        }

        let generator = DocumentNumberGenerator::default();
        let number = generator
            .next(&store, Table::PurchaseOrders, "order_number", "PO")
            .await
            .unwrap();
        assert_eq!(number, "PO-00008");
    }

    #[tokio::test]
    async fn test_prefixes_and_tables_are_independent() {
        let store = MemoryStore::new();
        let generator = DocumentNumberGenerator::new(3);

        let po = generator
            .next(&store, Table::PurchaseOrders, "order_number", "PO")
            .await
            .unwrap();
        let grn = generator
            .next(&store, Table::GoodsReceivedNotes, "grn_number", "GRN")
            .await
            .unwrap();

        assert_eq!(po, "PO-001");
        assert_eq!(grn, "GRN-001");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_distinct() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let generator = Arc::new(DocumentNumberGenerator::default());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let generator = generator.clone();
                tokio::spawn(async move {
                    generator
                        .next(store.as_ref(), Table::GoodsReceivedNotes, "grn_number", "GRN")
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap());
        }
        assert_eq!(numbers.len(), 16);
    }
}
