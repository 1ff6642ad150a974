use crate::run;
use oxibind::{
    AnonymousRecord, Attribute, Case, ConnectionExt, FetchStyle, FetchedRow, NativeConnection,
    Nulls, Value,
};

pub fn policies<C: NativeConnection>(connection: &C) {
    // Setup
    run(connection, "DROP TABLE IF EXISTS people");
    run(connection, "CREATE TABLE people (id INTEGER, name TEXT, note TEXT)");
    run(
        connection,
        "INSERT INTO people (id, name, note) VALUES (1, 'Ann', NULL), (2, 'Bob', '')",
    );
    let mut select = connection
        .prepare("SELECT id, name AS Name, note AS NOTE FROM people ORDER BY id")
        .expect("Could not prepare the select");
    let empty = Value::Varchar(Some("".into()));

    // Case folding
    select.set_attribute(Attribute::Case, Case::Lower);
    select.execute().expect("Could not execute");
    let rows = select
        .fetch_all_with(FetchStyle::Associative, vec![])
        .expect("Could not fetch");
    let labeled = rows[0].labeled().expect("Expected a labeled row");
    assert_eq!(labeled.names(), ["id", "name", "note"]);
    select.set_attribute(Attribute::Case, Case::Upper);
    select.execute().expect("Could not execute");
    let object = select
        .fetch_object(None, vec![])
        .expect("Could not fetch")
        .expect("Expected an object");
    let object = object
        .downcast_ref::<AnonymousRecord<C::Statement>>()
        .expect("Expected an anonymous record");
    assert_eq!(object.names().collect::<Vec<_>>(), ["ID", "NAME", "NOTE"]);
    select.set_attribute(Attribute::Case, Case::Natural);
    select.execute().expect("Could not execute");
    let rows = select
        .fetch_all_with(FetchStyle::Associative, vec![])
        .expect("Could not fetch");
    let labeled = rows[0].labeled().expect("Expected a labeled row");
    assert_eq!(labeled.names(), ["id", "Name", "NOTE"]);

    // NULL to empty text, only applied to objects
    select.set_attribute(Attribute::Nulls, Nulls::NullToString);
    select.execute().expect("Could not execute");
    let object = select
        .fetch_object(None, vec![])
        .expect("Could not fetch")
        .expect("Expected an object");
    let object = object
        .downcast_ref::<AnonymousRecord<C::Statement>>()
        .expect("Expected an anonymous record");
    assert!(object.get("NOTE").is_some_and(|v| *v == empty));
    select.execute().expect("Could not execute");
    let row = select
        .fetch_all_with(FetchStyle::Numeric, vec![])
        .expect("Could not fetch")
        .remove(0);
    assert!(row.get(2).is_some_and(|v| v.is_null()));
    select.set_attribute(Attribute::UniformNulls, true);
    select.execute().expect("Could not execute");
    let row = select
        .fetch_all_with(FetchStyle::Numeric, vec![])
        .expect("Could not fetch")
        .remove(0);
    assert!(row.get(2).is_some_and(|v| *v == empty));
    select.set_attribute(Attribute::UniformNulls, false);

    // Empty text to NULL, only applied to objects
    select.set_attribute(Attribute::Nulls, Nulls::EmptyToNull);
    select.execute().expect("Could not execute");
    let objects = select
        .fetch_all_with(FetchStyle::Object, vec![])
        .expect("Could not fetch");
    let FetchedRow::Object(bob) = &objects[1] else {
        panic!("Expected an object, got {:?}", objects[1]);
    };
    let bob = bob
        .downcast_ref::<AnonymousRecord<C::Statement>>()
        .expect("Expected an anonymous record");
    assert!(bob.get("NOTE").is_some_and(|v| v.is_null()));
    select.execute().expect("Could not execute");
    let rows = select
        .fetch_all_with(FetchStyle::Associative, vec![])
        .expect("Could not fetch");
    assert!(
        rows[1]
            .labeled()
            .and_then(|v| v.get_column("NOTE"))
            .is_some_and(|v| *v == empty)
    );
}
