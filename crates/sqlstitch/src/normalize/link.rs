//! Forward and reverse reference linking over a populated store.
//!
//! Forward links resolve each entity's foreign-key field to the target
//! entity key. Reverse links are built by indexing source entities by
//! foreign-key value in one scan, then attaching each bucket to its target,
//! so linking stays linear in the number of entities rather than quadratic.
//! Dangling references (target row never appeared in the result set) are
//! simply left unlinked.

use std::collections::{BTreeMap, HashMap};

use crate::core::schema::TableSchema;
use crate::core::value::SqlValue;

use super::store::EntityStore;
use super::EntityKey;

#[derive(Debug, Default)]
pub(crate) struct LinkIndex {
    /// entity key -> forward alias -> target entity key
    pub forward: HashMap<EntityKey, BTreeMap<String, EntityKey>>,
    /// target entity key -> reverse alias -> source keys in first-appearance order
    pub reverse: HashMap<EntityKey, BTreeMap<String, Vec<EntityKey>>>,
}

pub(crate) fn link(tables: &[&TableSchema], store: &EntityStore) -> LinkIndex {
    let mut links = LinkIndex::default();

    let resolvable = |key: &EntityKey| {
        store.entities.contains_key(key) && !store.synthetic.contains(key)
    };

    for table in tables {
        if table.references.is_empty() {
            continue;
        }
        let Some(keys) = store.order.get(&table.name) else {
            continue;
        };

        for reference in &table.references {
            // Forward pass over this table's entities.
            for key in keys {
                if store.synthetic.contains(key) {
                    continue;
                }
                let Some(entity) = store.entities.get(key) else {
                    continue;
                };
                let target = entity
                    .get(&reference.field)
                    .and_then(SqlValue::key_string)
                    .map(|fk| EntityKey::new(&reference.target_table, &fk))
                    .filter(resolvable);
                if let Some(target) = target {
                    links
                        .forward
                        .entry(key.clone())
                        .or_default()
                        .insert(reference.forward_alias.clone(), target);
                }
            }

            // Reverse pass: bucket sources by foreign-key value, then attach.
            let Some(reverse_alias) = &reference.reverse_alias else {
                continue;
            };
            let mut by_fk: HashMap<String, Vec<EntityKey>> = HashMap::new();
            for key in keys {
                if store.synthetic.contains(key) {
                    continue;
                }
                let fk = store
                    .entities
                    .get(key)
                    .and_then(|e| e.get(&reference.field))
                    .and_then(SqlValue::key_string);
                if let Some(fk) = fk {
                    by_fk.entry(fk).or_default().push(key.clone());
                }
            }
            for (fk, sources) in by_fk {
                let target = EntityKey::new(&reference.target_table, &fk);
                if resolvable(&target) {
                    links
                        .reverse
                        .entry(target)
                        .or_default()
                        .insert(reverse_alias.clone(), sources);
                }
            }
        }
    }

    links
}
