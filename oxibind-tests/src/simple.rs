use crate::{get, run};
use oxibind::{AsValue, ConnectionExt, FetchStyle, FetchedRow, NativeConnection, Value};

pub fn simple<C: NativeConnection>(connection: &C) {
    let version = connection
        .server_version()
        .expect("Could not read the server version");
    assert!(version.major() > 0, "Unexpected version {version}");

    // Setup
    run(connection, "DROP TABLE IF EXISTS simple");
    run(
        connection,
        "CREATE TABLE simple (id INTEGER PRIMARY KEY, name TEXT, score REAL, note TEXT)",
    );
    let mut insert = connection
        .prepare("INSERT INTO simple (id, name, score, note) VALUES (?, ?, ?, ?)")
        .expect("Could not prepare the insert");
    assert_eq!(
        insert.native_query(),
        "INSERT INTO simple (id, name, score, note) VALUES (:param1, :param2, :param3, :param4)"
    );
    assert_eq!(insert.param_map().len(), 4);
    for row in [
        [1_i64.as_value(), "alpha".into(), 1.5_f64.as_value(), "first".into()],
        [2_i64.as_value(), "bravo".into(), 2.5_f64.as_value(), Value::Varchar(None)],
        [3_i64.as_value(), "charlie".into(), 3.5_f64.as_value(), "".into()],
    ] {
        insert.execute_with(row).expect("Could not insert");
        assert_eq!(insert.row_count(), 1);
    }

    // Both (default)
    let mut select = connection
        .prepare("SELECT id, name, score, note FROM simple ORDER BY id")
        .expect("Could not prepare the select");
    select.execute().expect("Could not execute the select");
    assert_eq!(select.column_count().expect("Could not count the columns"), 4);
    let row = select
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a first row");
    assert!(matches!(row, FetchedRow::Both(..)));
    let labeled = row.labeled().expect("Expected a labeled row");
    assert_eq!(labeled.names(), ["id", "name", "score", "note"]);
    assert_eq!(
        labeled.get_column("name").and_then(|v| v.as_value()),
        Some(&Value::Varchar(Some("alpha".into())))
    );
    assert_eq!(get::<i64, _>(&row, 0), 1);
    assert_eq!(get::<String, _>(&row, 1), "alpha");
    assert_eq!(get::<f64, _>(&row, 2), 1.5);

    // Associative, after a previous row
    select
        .set_fetch_mode(FetchStyle::Associative, vec![])
        .expect("Could not set the associative mode");
    let row = select
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a second row");
    assert!(matches!(row, FetchedRow::Associative(..)));
    assert_eq!(get::<String, _>(&row, 1), "bravo");
    assert!(row.get(3).is_some_and(|v| v.is_null()));
    let rest = select.fetch_all().expect("Could not fetch the remaining rows");
    assert_eq!(rest.len(), 1);
    assert_eq!(get::<i64, _>(&rest[0], 0), 3);
    assert!(select.fetch().expect("Could not fetch").is_none());

    // Numeric and positional
    select.execute().expect("Could not execute the select");
    let rows = select
        .fetch_all_with("num", vec![])
        .expect("Could not fetch numeric rows");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|v| matches!(v, FetchedRow::Numeric(..))));
    assert!(rows[0].labeled().is_none());
    assert_eq!(
        rows.iter()
            .map(|v| get::<String, _>(v, 1))
            .collect::<Vec<_>>(),
        ["alpha", "bravo", "charlie"]
    );
    select.execute().expect("Could not execute the select");
    let rows = select
        .fetch_all_with(FetchStyle::Positional, vec![])
        .expect("Could not fetch positional rows");
    assert_eq!(get::<f64, _>(&rows[2], 2), 3.5);

    // Column
    select.execute().expect("Could not execute the select");
    let rows = select
        .fetch_all_with(FetchStyle::Column, vec![1_i32.into()])
        .expect("Could not fetch the column");
    assert_eq!(
        rows.iter()
            .map(|v| match v {
                FetchedRow::Column(v) => v.as_value().cloned(),
                _ => None,
            })
            .collect::<Vec<_>>(),
        [
            Some(Value::Varchar(Some("alpha".into()))),
            Some(Value::Varchar(Some("bravo".into()))),
            Some(Value::Varchar(Some("charlie".into()))),
        ]
    );

    // Single column fetch
    select.execute().expect("Could not execute the select");
    assert_eq!(
        select.fetch_column(1).expect("Could not fetch a column"),
        Some(Value::Varchar(Some("alpha".into())))
    );
    assert_eq!(
        select.fetch_column(5).expect("Could not fetch a missing column"),
        Some(Value::Null)
    );
    assert!(
        select
            .fetch_column(3)
            .expect("Could not fetch a column")
            .is_some_and(|v| v == Value::Varchar(Some("".into())))
    );
    assert_eq!(select.fetch_column(0).expect("Could not fetch at the end"), None);

    // Closing the cursor drops the pending rows
    select.execute().expect("Could not execute the select");
    select.close_cursor().expect("Could not close the cursor");
    assert!(select.fetch().expect("Could not fetch").is_none());
    let meta = select
        .column_meta(1)
        .expect("Could not describe the column")
        .expect("Expected the second column");
    assert_eq!(meta.name, "name");
    assert!(
        select
            .column_meta(10)
            .expect("Could not describe a missing column")
            .is_none()
    );
}
