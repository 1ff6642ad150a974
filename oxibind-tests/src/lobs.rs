use crate::{get, run};
use oxibind::{Attribute, BindType, ConnectionExt, FetchStyle, NativeConnection, Value, Variable};

pub fn lobs<C: NativeConnection>(connection: &C) {
    // Setup
    run(connection, "DROP TABLE IF EXISTS documents");
    run(connection, "CREATE TABLE documents (id INTEGER, body TEXT, content BLOB)");
    let body = "Lorem ipsum dolor sit amet. ".repeat(200);
    let content: Vec<u8> = (0..=255).cycle().take(4096).collect();
    let mut insert = connection
        .prepare("INSERT INTO documents (id, body, content) VALUES (?, ?, ?)")
        .expect("Could not prepare the insert");
    insert
        .bind(1, 1)
        .and_then(|v| v.bind_value(2, body.as_str(), BindType::LargeObject))
        .and_then(|v| v.bind_value(3, content.clone(), BindType::LargeObject))
        .expect("Could not bind the large objects");
    insert.execute().expect("Could not insert");

    // The large object variable can be bound by reference too
    let variable = Variable::new(Value::Blob(Some(vec![1, 2, 3].into())));
    insert
        .bind(1, 2)
        .and_then(|v| v.bind(2, "short"))
        .and_then(|v| v.bind_param(3, &variable, BindType::LargeObject, 0))
        .expect("Could not bind the large objects");
    insert.execute().expect("Could not insert");
    assert_eq!(
        variable.value().expect("Could not read the variable"),
        Value::Blob(Some(vec![1, 2, 3].into()))
    );

    // Loaded while fetching
    let mut select = connection
        .prepare("SELECT id, body, content FROM documents ORDER BY id")
        .expect("Could not prepare the select");
    select.execute().expect("Could not execute");
    let rows = select
        .fetch_all_with(FetchStyle::Numeric, vec![])
        .expect("Could not fetch");
    assert_eq!(rows.len(), 2);
    assert_eq!(get::<String, _>(&rows[0], 1), body);
    assert_eq!(get::<Vec<u8>, _>(&rows[0], 2), content);
    assert_eq!(get::<Vec<u8>, _>(&rows[1], 2), [1, 2, 3]);

    // Left to the caller
    select.set_attribute(Attribute::ReturnLobs, false);
    select.execute().expect("Could not execute");
    let row = select
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a row");
    assert!(row.get(2).is_some_and(|v| v.is_lob()));
    assert_eq!(
        select.fetch_column(2).expect("Could not fetch a column"),
        Some(Value::Blob(Some(vec![1, 2, 3].into())))
    );
}
