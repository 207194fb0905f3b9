//! Shared fixtures and behavior-contract suites.
//!
//! Each suite exercises one slice of the storage contract (sessions,
//! transactions, datatypes, queries, foreign keys) against a
//! backend-factory function; backend-specific test files compose the
//! suites they apply to. Every factory call must yield a connection onto a
//! fresh, empty backend with the fixture tables created.

use stratum::{Connection, Datatype, Record, Select, Table, Value, field};

/// Factory handed to every suite: a fresh connection per call.
pub type Factory = dyn Fn() -> Connection;

/// The fixture tables, one per mapped demo class.
pub fn tables() -> Vec<Table> {
    vec![
        Table::builder("demo.Document", "document")
            .column("name", Datatype::Text)
            .column("flag", Datatype::Boolean)
            .column("kind", Datatype::enumeration(["draft", "final", "archived"]))
            .column("note", Datatype::Text)
            .column("body", Datatype::LongText)
            .column("count", Datatype::Integer)
            .column(
                "ratio",
                Datatype::Number {
                    length: 10,
                    decimals: 2,
                },
            )
            .column("stamp", Datatype::Timestamp)
            .column("payload", Datatype::Opaque)
            .primary_key(["name"])
            .build(),
        Table::builder("demo.Author", "author")
            .column("name", Datatype::Text)
            .column("born", Datatype::Integer)
            .column("books", Datatype::many("demo.Book"))
            .primary_key(["name"])
            .build(),
        Table::builder("demo.Book", "book")
            .column("title", Datatype::Text)
            .column("author", Datatype::one("demo.Author"))
            .primary_key(["title"])
            .build(),
    ]
}

/// A document with every scalar defaulted.
pub fn document(name: &str) -> Record {
    Record::new("demo.Document")
        .with("name", name)
        .with("flag", false)
        .with("kind", Value::Enum(0))
        .with("note", "short")
        .with("body", "x".repeat(1000))
        .with("count", 1_i64)
        .with("ratio", 1.1_f64)
        .with("stamp", Value::Timestamp(1_200_000_000_000_000))
        .with("payload", Value::Opaque(serde_json::json!({"tag": "default"})))
}

pub fn author(name: &str) -> Record {
    Record::new("demo.Author").with("name", name)
}

pub fn book(title: &str, by: Option<Record>) -> Record {
    Record::new("demo.Book")
        .with("title", title)
        .with("author", Value::from(by))
}

/// Ten documents named "0" through "9".
fn fill_for_query(connection: &Connection) {
    connection
        .with_session(|session| {
            for n in 0..10 {
                session.append(document(&n.to_string()))?;
            }
            Ok(())
        })
        .unwrap();
}

// ============================================================================
// Session suite
// ============================================================================

pub fn suite_session(factory: &Factory) {
    session_starts_empty(&factory());
    append_registers_member(&factory());
    same_identity_single_entry(&factory());
    remove_unregistered_twin(&factory());
    unmapped_record_never_member(&factory());
}

fn session_starts_empty(connection: &Connection) {
    let session = connection.session();
    assert_eq!(session.len(), 0);
    assert!(session.is_empty());
}

fn append_registers_member(connection: &Connection) {
    let mut session = connection.session();
    let handle = session.append(document("a")).unwrap();
    assert!(session.contains(&handle));
    assert_eq!(session.len(), 1);
}

fn same_identity_single_entry(connection: &Connection) {
    let mut session = connection.session();
    let first = session.append(document("a")).unwrap();
    let second = session.append(document("a")).unwrap();

    // one identity, one live entry; both handles are members
    assert_eq!(session.len(), 1);
    assert!(session.contains(&first));
    assert!(session.contains(&second));
}

fn remove_unregistered_twin(connection: &Connection) {
    let mut session = connection.session();
    let registered = session.append(document("a")).unwrap();

    // deleting a twin with the same identity evicts the registered one
    let twin = document("a").into_ref();
    session.remove(&twin).unwrap();
    assert!(!session.contains(&registered));
    assert_eq!(session.len(), 0);
}

fn unmapped_record_never_member(connection: &Connection) {
    let session = connection.session();
    let stray = Record::new("demo.Stray").into_ref();
    assert!(!session.contains(&stray));
}

// ============================================================================
// Transactions suite
// ============================================================================

pub fn suite_transactions(factory: &Factory) {
    add_delete_commit(&factory());
    rollback_restores_deletes(&factory());
    rollback_drops_uncommitted_appends(&factory());
    commit_is_not_undone_by_rollback(&factory());
}

fn add_delete_commit(connection: &Connection) {
    connection
        .with_session(|session| {
            session.append(document("a"))?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Document"))?
                .expect("committed document");
            assert!(session.contains(&found));
            session.remove(&found)?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            assert!(session.query_one(&Select::new("demo.Document"))?.is_none());
            Ok(())
        })
        .unwrap();
}

fn rollback_restores_deletes(connection: &Connection) {
    connection
        .with_session(|session| {
            session.append(document("a"))?;
            Ok(())
        })
        .unwrap();

    let mut session = connection.session();
    let found = session
        .query_one(&Select::new("demo.Document"))
        .unwrap()
        .expect("committed document");

    session.remove(&found).unwrap();
    assert!(!session.contains(&found));

    session.rollback().unwrap();
    assert!(session.contains(&found));

    session.remove(&found).unwrap();
    session.commit().unwrap();
    session.close().unwrap();

    connection
        .with_session(|session| {
            assert!(session.query_one(&Select::new("demo.Document"))?.is_none());
            Ok(())
        })
        .unwrap();
}

fn rollback_drops_uncommitted_appends(connection: &Connection) {
    let mut session = connection.session();
    let handle = session.append(document("a")).unwrap();
    session.rollback().unwrap();
    assert!(!session.contains(&handle));
}

fn commit_is_not_undone_by_rollback(connection: &Connection) {
    let mut session = connection.session();
    let handle = session.append(document("a")).unwrap();
    session.commit().unwrap();

    session.rollback().unwrap();
    assert!(session.contains(&handle));
    session.close().unwrap();

    connection
        .with_session(|session| {
            assert!(session.query_one(&Select::new("demo.Document"))?.is_some());
            Ok(())
        })
        .unwrap();
}

// ============================================================================
// Datatypes suite
// ============================================================================

pub fn suite_datatypes(factory: &Factory) {
    datatype_round_trip(&factory(), "flag", Value::Bool(true), Value::Bool(false));
    datatype_round_trip(&factory(), "kind", Value::Enum(0), Value::Enum(1));
    datatype_round_trip(
        &factory(),
        "note",
        Value::from("text_1"),
        Value::from("text_2"),
    );
    datatype_round_trip(
        &factory(),
        "body",
        Value::from("y".repeat(1000)),
        Value::from("z".repeat(1000)),
    );
    datatype_round_trip(&factory(), "count", Value::Int(12345), Value::Int(-67890));
    datatype_round_trip(
        &factory(),
        "ratio",
        Value::Float(1.1),
        Value::Float(std::f64::consts::PI),
    );
    datatype_round_trip(
        &factory(),
        "stamp",
        Value::Timestamp(415_324_800_000_000),
        Value::Timestamp(-61_825_420_800_000_000),
    );
    datatype_round_trip(
        &factory(),
        "payload",
        Value::Opaque(serde_json::json!({"pinned": true})),
        Value::Opaque(serde_json::json!([1, 2, 3])),
    );
    defaults_survive_round_trip(&factory());
}

/// Write `value1`, read it back, overwrite with `value2` through the
/// queried handle, read that back too.
fn datatype_round_trip(connection: &Connection, attr: &str, value1: Value, value2: Value) {
    connection
        .with_session(|session| {
            let mut record = document("a");
            record.set(attr, value1.clone());
            session.append(record)?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Document"))?
                .expect("committed document");
            {
                let guard = found.read().unwrap();
                assert_eq!(guard.field_value(attr), value1, "attribute {attr}");
                assert_ne!(guard.field_value(attr), value2, "attribute {attr}");
            }
            found.write().unwrap().set(attr, value2.clone());
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Document"))?
                .expect("committed document");
            let guard = found.read().unwrap();
            assert_eq!(guard.field_value(attr), value2, "attribute {attr}");
            Ok(())
        })
        .unwrap();
}

fn defaults_survive_round_trip(connection: &Connection) {
    let original = document("a");
    connection
        .with_session(|session| {
            session.append(original.clone())?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Document"))?
                .expect("committed document");
            let guard = found.read().unwrap();
            for attr in [
                "name", "flag", "kind", "note", "body", "count", "ratio", "stamp", "payload",
            ] {
                assert_eq!(
                    guard.field_value(attr),
                    original.field_value(attr),
                    "attribute {attr}"
                );
            }
            Ok(())
        })
        .unwrap();
}

// ============================================================================
// Queries suite
// ============================================================================

pub fn suite_queries(factory: &Factory) {
    get_by_hashkey(&factory());
    query_full_scan(&factory());
    query_field_comparisons(&factory());
    query_and_or(&factory());
    query_slice(&factory());
    query_orderby(&factory());
    query_twice_is_idempotent(&factory());
    missing_table_surfaces(&factory());
}

fn get_by_hashkey(connection: &Connection) {
    let key = connection
        .with_session(|session| {
            let handle = session.append(document("a"))?;
            session.hash_key(&stratum::snapshot(&handle))
        })
        .unwrap();

    connection
        .with_session(|session| {
            assert!(session.get("demo.Document", key)?.is_some());
            Ok(())
        })
        .unwrap();
}

fn query_full_scan(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            assert_eq!(session.query(&Select::new("demo.Document"))?.len(), 10);
            Ok(())
        })
        .unwrap();
}

fn query_field_comparisons(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            let hits = session.query(&Select::new("demo.Document").where_(field("name").eq("5")))?;
            assert_eq!(hits.len(), 1);

            // literal on the left commutes
            let hits = session.query(
                &Select::new("demo.Document")
                    .where_(stratum::Predicate::compare("5", stratum::Comparator::Eq, field("name"))),
            )?;
            assert_eq!(hits.len(), 1);

            let hits = session
                .query(&Select::new("demo.Document").where_(field("name").eq(field("name"))))?;
            assert_eq!(hits.len(), 10);

            let hits =
                session.query(&Select::new("demo.Document").where_cmp(1_i64, "=", 2_i64)?)?;
            assert_eq!(hits.len(), 0);
            Ok(())
        })
        .unwrap();
}

fn query_and_or(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            let where_ = field("name").ne("7").and(field("name").gt("5"));
            let hits = session.query(&Select::new("demo.Document").where_(where_))?;
            assert_eq!(hits.len(), 3); // 6, 8, 9

            let where_ = field("name").eq("7").and(field("name").gt("5"));
            let hits = session.query(&Select::new("demo.Document").where_(where_))?;
            assert_eq!(hits.len(), 1);

            let where_ = field("name").eq("1").or(field("name").eq("2"));
            let hits = session.query(&Select::new("demo.Document").where_(where_))?;
            assert_eq!(hits.len(), 2);
            Ok(())
        })
        .unwrap();
}

fn query_slice(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            let hits = session.query(&Select::new("demo.Document").slice(2, Some(5)))?;
            assert_eq!(hits.len(), 3);
            Ok(())
        })
        .unwrap();
}

fn query_orderby(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            let hits = session.query(&Select::new("demo.Document").orderby("name"))?;
            assert_eq!(hits.len(), 10);
            for (n, handle) in hits.iter().enumerate() {
                assert_eq!(
                    handle.read().unwrap().field_value("name"),
                    Value::from(n.to_string())
                );
            }

            let hits = session.query(&Select::new("demo.Document").orderby_desc("name"))?;
            assert_eq!(hits[0].read().unwrap().field_value("name"), Value::from("9"));
            Ok(())
        })
        .unwrap();
}

fn query_twice_is_idempotent(connection: &Connection) {
    fill_for_query(connection);
    connection
        .with_session(|session| {
            let select = Select::new("demo.Document").where_(field("name").gt("5"));
            let first_handles = session.query(&select.clone())?;
            let second_handles = session.query(&select)?;

            let mut first: Vec<_> = first_handles
                .iter()
                .map(|h| session.hash_key(&stratum::snapshot(h)).unwrap())
                .collect();
            let mut second: Vec<_> = second_handles
                .iter()
                .map(|h| session.hash_key(&stratum::snapshot(h)).unwrap())
                .collect();

            first.sort_unstable();
            second.sort_unstable();
            assert_eq!(first, second);
            Ok(())
        })
        .unwrap();
}

/// A class mapped in the catalog but whose table was created on a
/// different backend instance must fail with the missing-table error.
fn missing_table_surfaces(connection: &Connection) {
    let foreign = Connection::new(stratum::MemoryBackend::new());
    for table in tables() {
        foreign.catalog().register(table);
    }

    let mut session = foreign.session();
    let result = session.query(&Select::new("demo.Document"));
    assert!(matches!(result, Err(stratum::Error::TableDoesNotExist { .. })));

    // while the connection that created the tables keeps working
    connection
        .with_session(|session| {
            session.query(&Select::new("demo.Document"))?;
            Ok(())
        })
        .unwrap();
}

// ============================================================================
// Foreign-keys suite
// ============================================================================

pub fn suite_foreign_keys(factory: &Factory) {
    reference_none_round_trip(&factory());
    referrer_delete_leaves_referee(&factory());
    referenced_identity_is_stable(&factory());
    collection_membership_by_query(&factory());
}

fn reference_none_round_trip(connection: &Connection) {
    connection
        .with_session(|session| {
            session.append(book("dune", None))?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Book"))?
                .expect("committed book");
            assert!(found.read().unwrap().field_value("author").is_null());
            assert_eq!(session.len(), 1);

            assert!(session.query_one(&Select::new("demo.Author"))?.is_none());
            Ok(())
        })
        .unwrap();
}

fn referrer_delete_leaves_referee(connection: &Connection) {
    connection
        .with_session(|session| {
            let by = author("herbert");
            session.append(by.clone())?;
            session.append(book("dune", Some(by)))?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let found = session
                .query_one(&Select::new("demo.Book"))?
                .expect("committed book");
            session.remove(&found)?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            assert!(session.query_one(&Select::new("demo.Book"))?.is_none());
            assert!(session.query_one(&Select::new("demo.Author"))?.is_some());
            Ok(())
        })
        .unwrap();
}

/// Changing a non-key field of the referenced record leaves the
/// referrer's content hash alone: references hash by the referee's own
/// key, not its full state.
fn referenced_identity_is_stable(connection: &Connection) {
    let with_plain = book("dune", Some(author("herbert")));
    let with_decorated = book("dune", Some(author("herbert").with("born", 1920_i64)));

    let hash_a = stratum::full_hash_key(connection.catalog(), &with_plain).unwrap();
    let hash_b = stratum::full_hash_key(connection.catalog(), &with_decorated).unwrap();
    assert_eq!(hash_a, hash_b);

    // a different referee identity does change it
    let with_other = book("dune", Some(author("asimov")));
    let hash_c = stratum::full_hash_key(connection.catalog(), &with_other).unwrap();
    assert_ne!(hash_a, hash_c);
}

fn collection_membership_by_query(connection: &Connection) {
    connection
        .with_session(|session| {
            let by = author("herbert");
            session.append(by.clone())?;
            session.append(book("dune", Some(by.clone())))?;
            session.append(book("messiah", Some(by)))?;
            Ok(())
        })
        .unwrap();

    connection
        .with_session(|session| {
            let hits = session.query(&Select::new("demo.Book"))?;
            assert_eq!(hits.len(), 2);
            Ok(())
        })
        .unwrap();
}
