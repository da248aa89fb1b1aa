//! Normalization of joined result sets into linked entities.
//!
//! The pipeline runs in three passes over the raw rows:
//!
//! 1. validate every column alias against the registered tables,
//! 2. slice, deduplicate and decode each row into entities
//!    ([`store::EntityStore`]),
//! 3. resolve forward and reverse references between the decoded
//!    entities ([`link`]).
//!
//! The result is an [`EntitySet`]: a flat entity map plus a separate
//! relation index. Entities themselves are plain serializable field maps;
//! relations are reached through named accessors ([`EntitySet::forward`],
//! [`EntitySet::referencing`]) instead of being stored inside the entity.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::core::schema::TableSchema;
use crate::core::value::SqlValue;
use crate::error::{Result, StitchError};

mod decode;
mod link;
mod store;

use link::link;
use store::EntityStore;

/// One raw result row: column alias `"<table>.<field>"` to cell value.
pub type RawRow = HashMap<String, SqlValue>;

/// Canonical entity identity, `"<table>:<pk>"`.
///
/// Synthetic keys (for rows without a usable primary key) use a `#` marker
/// that cannot collide with real primary-key strings produced by
/// [`SqlValue::key_string`] prefixed with the table name and a colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Key for a real entity identified by its primary-key string.
    pub fn new(table: &str, pk: &str) -> Self {
        EntityKey(format!("{table}:{pk}"))
    }

    /// Per-row key for a slice that cannot be identified.
    pub(crate) fn synthetic(table: &str, row_idx: usize) -> Self {
        EntityKey(format!("{table}:#row{row_idx}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded entity: its table, identity and flat field map.
///
/// Relations are deliberately not part of this struct; serializing an
/// entity on its own can never drag a whole object graph along. Related
/// entities are reached through the owning [`EntitySet`].
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    table: String,
    key: EntityKey,
    fields: BTreeMap<String, SqlValue>,
}

impl Entity {
    /// The table this entity was decoded from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The entity's canonical key.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// A decoded field value, if present.
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.get(field)
    }

    /// All decoded fields, sorted by name.
    pub fn fields(&self) -> &BTreeMap<String, SqlValue> {
        &self.fields
    }

    /// Serialize the flat field map, without any related entities.
    pub fn to_flat_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

/// The result of [`normalize`]: deduplicated entities plus the relation
/// index connecting them.
#[derive(Debug, Default)]
pub struct EntitySet {
    entities: HashMap<EntityKey, Entity>,
    order: HashMap<String, Vec<EntityKey>>,
    main_table: String,
    forward: HashMap<EntityKey, BTreeMap<String, EntityKey>>,
    reverse: HashMap<EntityKey, BTreeMap<String, Vec<EntityKey>>>,
}

impl EntitySet {
    /// Main-table entities in first-appearance order.
    pub fn entities(&self) -> Vec<&Entity> {
        self.table_entities(&self.main_table)
    }

    /// Entities of one table in first-appearance order.
    pub fn table_entities(&self, table: &str) -> Vec<&Entity> {
        self.order
            .get(table)
            .map(|keys| keys.iter().filter_map(|k| self.entities.get(k)).collect())
            .unwrap_or_default()
    }

    /// Look up an entity by key.
    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Number of main-table entities.
    pub fn len(&self) -> usize {
        self.order.get(&self.main_table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of decoded entities across all tables.
    pub fn total_len(&self) -> usize {
        self.entities.len()
    }

    /// The single related entity behind a forward reference alias.
    ///
    /// Returns the same `&Entity` for every entity that references it,
    /// so identity comparisons hold across the set.
    pub fn forward(&self, key: &EntityKey, alias: &str) -> Option<&Entity> {
        let target = self.forward.get(key)?.get(alias)?;
        self.entities.get(target)
    }

    /// The entities referencing this one under a reverse alias, in
    /// first-appearance order. Empty when none do.
    pub fn referencing(&self, key: &EntityKey, alias: &str) -> Vec<&Entity> {
        self.reverse
            .get(key)
            .and_then(|aliases| aliases.get(alias))
            .map(|keys| keys.iter().filter_map(|k| self.entities.get(k)).collect())
            .unwrap_or_default()
    }

    /// Serialize an entity with its forward-referenced entities embedded
    /// under their aliases. Reverse collections are excluded, and an entity
    /// already on the embedding path is embedded flat, so reference cycles
    /// terminate.
    pub fn to_json(&self, key: &EntityKey) -> Option<serde_json::Value> {
        let entity = self.entities.get(key)?;
        let mut visiting = Vec::new();
        Some(self.embed(entity, &mut visiting))
    }

    fn embed(&self, entity: &Entity, visiting: &mut Vec<EntityKey>) -> serde_json::Value {
        let mut object: serde_json::Map<String, serde_json::Value> = entity
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        if let Some(aliases) = self.forward.get(&entity.key) {
            visiting.push(entity.key.clone());
            for (alias, target_key) in aliases {
                if let Some(target) = self.entities.get(target_key) {
                    let embedded = if visiting.contains(target_key) {
                        target.to_flat_json()
                    } else {
                        self.embed(target, visiting)
                    };
                    object.insert(alias.clone(), embedded);
                }
            }
            visiting.pop();
        }

        serde_json::Value::Object(object)
    }
}

/// Normalize raw result rows against the registered tables.
///
/// The first table in `tables` is the main table: [`EntitySet::entities`]
/// returns its entities in first-appearance order. Alias validation runs
/// over every row before any cell is decoded, so an unregistered table
/// prefix or a key without the `"<table>.<field>"` separator fails the
/// whole call without side effects from decode hooks.
pub fn normalize(rows: &[RawRow], tables: &[&TableSchema]) -> Result<EntitySet> {
    let registered: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    for row in rows {
        for column in row.keys() {
            let Some((prefix, _)) = column.split_once('.') else {
                return Err(StitchError::MalformedRowKey(column.clone()));
            };
            if !registered.contains(prefix) {
                return Err(StitchError::UnregisteredTable {
                    prefix: prefix.to_string(),
                    column: column.clone(),
                });
            }
        }
    }

    let mut store = EntityStore::new();
    for (row_idx, row) in rows.iter().enumerate() {
        store.absorb_row(row, row_idx, tables)?;
    }

    let links = link(tables, &store);

    let main_table = tables.first().map(|t| t.name.clone()).unwrap_or_default();
    tracing::debug!(
        rows = rows.len(),
        entities = store.entities.len(),
        main_table = %main_table,
        "normalized result set"
    );

    Ok(EntitySet {
        entities: store.entities,
        order: store.order,
        main_table,
        forward: links.forward,
        reverse: links.reverse,
    })
}
