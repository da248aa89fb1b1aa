//! End-to-end normalization scenarios over joined result sets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sqlstitch::{
    normalize, DecodeHook, EntityKey, FieldShape, FieldType, RawRow, SqlValue, StitchError,
    TableSchema,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn row(pairs: &[(&str, SqlValue)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn user_table() -> TableSchema {
    TableSchema::builder("user")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("name", "TEXT", FieldShape::core(FieldType::Text))
        .build()
}

fn post_table() -> TableSchema {
    TableSchema::builder("post")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("title", "TEXT", FieldShape::core(FieldType::Text))
        .field("authorId", "TEXT", FieldShape::core(FieldType::Text))
        .references_back("authorId", "user", "id", "author", "posts")
        .build()
}

/// Two posts by the same author: the shared author decodes to one entity
/// and both forward links resolve to the very same allocation.
#[test]
fn test_shared_author_is_one_entity() {
    init_tracing();
    let post = post_table();
    let user = user_table();
    let rows = vec![
        row(&[
            ("post.id", text("p1")),
            ("post.title", text("first")),
            ("post.authorId", text("u1")),
            ("user.id", text("u1")),
            ("user.name", text("Ann")),
        ]),
        row(&[
            ("post.id", text("p2")),
            ("post.title", text("second")),
            ("post.authorId", text("u1")),
            ("user.id", text("u1")),
            ("user.name", text("Ann")),
        ]),
    ];

    let set = normalize(&rows, &[&post, &user]).unwrap();
    let posts = set.entities();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].get("title"), Some(&text("first")));

    let author1 = set.forward(posts[0].key(), "author").unwrap();
    let author2 = set.forward(posts[1].key(), "author").unwrap();
    assert!(std::ptr::eq(author1, author2));
    assert_eq!(author1.get("name"), Some(&text("Ann")));
}

/// The reverse collection on the target holds referencing entities in
/// first-appearance row order.
#[test]
fn test_reverse_collection_in_row_order() {
    let post = post_table();
    let user = user_table();
    let rows = vec![
        row(&[
            ("post.id", text("p2")),
            ("post.title", text("b")),
            ("post.authorId", text("u1")),
            ("user.id", text("u1")),
            ("user.name", text("Ann")),
        ]),
        row(&[
            ("post.id", text("p1")),
            ("post.title", text("a")),
            ("post.authorId", text("u1")),
            ("user.id", text("u1")),
            ("user.name", text("Ann")),
        ]),
    ];

    let set = normalize(&rows, &[&post, &user]).unwrap();
    let u1 = EntityKey::new("user", "u1");
    let back: Vec<&str> = set
        .referencing(&u1, "posts")
        .iter()
        .map(|e| e.key().as_str())
        .collect();
    assert_eq!(back, vec!["post:p2", "post:p1"]);

    // unknown alias yields an empty collection, not a panic
    assert!(set.referencing(&u1, "nothing").is_empty());
}

/// A decode hook runs once per distinct entity, not once per row.
#[test]
fn test_hook_runs_once_per_entity() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let user = TableSchema::builder("user")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field_decoded(
            "name",
            "TEXT",
            FieldShape::core(FieldType::Text),
            DecodeHook::new(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(v.clone())
            }),
        )
        .build();

    let rows: Vec<RawRow> = (0..5)
        .map(|i| {
            row(&[
                ("user.id", text(if i < 3 { "u1" } else { "u2" })),
                ("user.name", text("n")),
            ])
        })
        .collect();

    let set = normalize(&rows, &[&user]).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// An unregistered alias prefix anywhere in the rows fails the call before
/// any decode hook has run.
#[test]
fn test_unregistered_table_precedes_decoding() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let user = TableSchema::builder("user")
        .field_decoded(
            "id",
            "TEXT",
            FieldShape::core(FieldType::Text),
            DecodeHook::new(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(v.clone())
            }),
        )
        .primary_key("id")
        .build();

    let rows = vec![
        row(&[("user.id", text("u1"))]),
        row(&[("user.id", text("u2")), ("comment.id", text("c1"))]),
    ];

    let err = normalize(&rows, &[&user]).unwrap_err();
    assert!(matches!(err, StitchError::UnregisteredTable { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Outer-join misses on the joined side produce no entity and no link.
#[test]
fn test_outer_join_miss() {
    let post = post_table();
    let user = user_table();
    let rows = vec![row(&[
        ("post.id", text("p1")),
        ("post.title", text("orphan")),
        ("post.authorId", text("u9")),
        ("user.id", SqlValue::Null),
        ("user.name", SqlValue::Null),
    ])];

    let set = normalize(&rows, &[&post, &user]).unwrap();
    assert_eq!(set.total_len(), 1);
    let p1 = EntityKey::new("post", "p1");
    assert!(set.forward(&p1, "author").is_none());
}

/// Serialization embeds forward references and excludes reverse
/// collections; a reference cycle falls back to a flat embed.
#[test]
fn test_to_json_embeds_forward_and_breaks_cycles() {
    // user.bestPostId -> post, post.authorId -> user
    let user = TableSchema::builder("user")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("bestPostId", "TEXT", FieldShape::core(FieldType::Text).nullable())
        .references("bestPostId", "post", "id", "bestPost")
        .build();
    let post = TableSchema::builder("post")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("authorId", "TEXT", FieldShape::core(FieldType::Text))
        .references_back("authorId", "user", "id", "author", "posts")
        .build();

    let rows = vec![row(&[
        ("post.id", text("p1")),
        ("post.authorId", text("u1")),
        ("user.id", text("u1")),
        ("user.bestPostId", text("p1")),
    ])];

    let set = normalize(&rows, &[&post, &user]).unwrap();
    let json = set.to_json(&EntityKey::new("post", "p1")).unwrap();

    assert_eq!(json["id"], "p1");
    assert_eq!(json["author"]["id"], "u1");
    // the cycle back to p1 is embedded flat, without its author
    assert_eq!(json["author"]["bestPost"]["id"], "p1");
    assert!(json["author"]["bestPost"].get("author").is_none());
    // reverse collections never serialize
    assert!(json["author"].get("posts").is_none());
}

/// A table without a primary key still yields per-row entities, but they
/// are excluded from deduplication and linking.
#[test]
fn test_table_without_primary_key() {
    let log = TableSchema::builder("log")
        .field("message", "TEXT", FieldShape::core(FieldType::Text))
        .build();

    let rows = vec![
        row(&[("log.message", text("same"))]),
        row(&[("log.message", text("same"))]),
    ];

    let set = normalize(&rows, &[&log]).unwrap();
    assert_eq!(set.len(), 2);
}

/// Field shape semantics applied through the full pipeline: defaults,
/// optional absence and nullable NULLs.
#[test]
fn test_shapes_through_pipeline() {
    let post = TableSchema::builder("post")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("views", "BIGINT", FieldShape::core(FieldType::Int).with_default(0))
        .field("draft", "BOOLEAN", FieldShape::core(FieldType::Bool).optional())
        .field("subtitle", "TEXT", FieldShape::core(FieldType::Text).nullable())
        .build();

    let rows = vec![row(&[
        ("post.id", text("p1")),
        ("post.subtitle", SqlValue::Null),
    ])];

    let set = normalize(&rows, &[&post]).unwrap();
    let p1 = set.entities()[0];
    assert_eq!(p1.get("views"), Some(&SqlValue::Int(0)));
    assert_eq!(p1.get("draft"), None);
    assert_eq!(p1.get("subtitle"), Some(&SqlValue::Null));

    let flat = p1.to_flat_json();
    assert_eq!(flat["views"], 0);
    assert_eq!(flat["subtitle"], serde_json::Value::Null);
}

/// Integer primary keys and text primary keys never collide because the
/// key string is canonical per value.
#[test]
fn test_int_primary_keys() {
    let user = TableSchema::builder("user")
        .field("id", "BIGINT", FieldShape::core(FieldType::Int))
        .primary_key("id")
        .build();

    let rows = vec![
        row(&[("user.id", SqlValue::Int(1))]),
        row(&[("user.id", SqlValue::Int(1))]),
        row(&[("user.id", SqlValue::Int(2))]),
    ];

    let set = normalize(&rows, &[&user]).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.get(&EntityKey::new("user", "1")).is_some());
}

/// A decode failure anywhere aborts the whole call with table/field
/// context.
#[test]
fn test_decode_failure_aborts() {
    let post = TableSchema::builder("post")
        .field("id", "TEXT", FieldShape::core(FieldType::Text))
        .primary_key("id")
        .field("meta", "TEXT", FieldShape::core(FieldType::Json).nullable())
        .build();

    let rows = vec![
        row(&[("post.id", text("p1")), ("post.meta", text("{\"ok\":true}"))]),
        row(&[("post.id", text("p2")), ("post.meta", text("{broken"))]),
    ];

    let err = normalize(&rows, &[&post]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("post.meta"), "got: {msg}");
}

/// Raw rows can also be built from driver-shaped maps.
#[test]
fn test_rawrow_is_plain_hashmap() {
    let mut r: RawRow = HashMap::new();
    r.insert("user.id".to_string(), text("u1"));
    r.insert("user.name".to_string(), text("Ann"));
    let user = user_table();
    let set = normalize(&[r], &[&user]).unwrap();
    assert_eq!(set.len(), 1);
}
