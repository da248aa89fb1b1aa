//! Deduplicating entity store.
//!
//! Joined result sets repeat the "one" side of every one-to-many join. The
//! store keys each slice by `"<table>:<pk>"` and decodes it exactly once;
//! later occurrences are skipped without re-validation, so a decode hook
//! runs once per distinct entity, not once per row. Slices without a usable
//! primary key get a synthetic per-row key and never participate in
//! deduplication or linking.

use std::collections::{HashMap, HashSet};

use crate::core::schema::TableSchema;
use crate::error::Result;

use super::decode::{decode_slice, pk_from_slice, slice_is_empty, slice_row};
use super::{Entity, EntityKey, RawRow};

#[derive(Debug, Default)]
pub(crate) struct EntityStore {
    pub entities: HashMap<EntityKey, Entity>,
    /// Per-table first-appearance ordering of entity keys.
    pub order: HashMap<String, Vec<EntityKey>>,
    /// Keys that do not identify a real entity and must not be linked.
    pub synthetic: HashSet<EntityKey>,
    warned_no_pk: HashSet<String>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one raw row: slice it per table, skip outer-join misses and
    /// already-seen entities, decode the rest.
    pub fn absorb_row(
        &mut self,
        row: &RawRow,
        row_idx: usize,
        tables: &[&TableSchema],
    ) -> Result<()> {
        for table in tables {
            let slice = slice_row(row, &table.name);
            if slice_is_empty(&slice) {
                continue;
            }

            let (key, synthetic) = match pk_from_slice(table, &slice) {
                Some(pk) => (EntityKey::new(&table.name, &pk), false),
                None => {
                    if !table.has_primary_key() && self.warned_no_pk.insert(table.name.clone()) {
                        tracing::warn!(
                            table = %table.name,
                            "table has no primary key; its rows are not deduplicated or linked"
                        );
                    }
                    (EntityKey::synthetic(&table.name, row_idx), true)
                }
            };

            if self.entities.contains_key(&key) {
                continue;
            }

            let fields = decode_slice(table, &slice)?;
            self.order
                .entry(table.name.clone())
                .or_default()
                .push(key.clone());
            if synthetic {
                self.synthetic.insert(key.clone());
            }
            self.entities.insert(
                key.clone(),
                Entity {
                    table: table.name.clone(),
                    key,
                    fields,
                },
            );
        }
        Ok(())
    }
}
