use crate::{get, run, silent_logs};
use oxibind::{BindType, ConnectionExt, NativeConnection, StatementError, Value, Variable};

pub fn binding<C: NativeConnection>(connection: &C) {
    // Setup
    run(connection, "DROP TABLE IF EXISTS binding");
    run(connection, "CREATE TABLE binding (id INTEGER, name TEXT)");
    let mut insert = connection
        .prepare("INSERT INTO binding (id, name) VALUES (:id, :name)")
        .expect("Could not prepare the insert");
    assert!(insert.param_map().is_empty());
    for (id, name) in [(1, "one"), (2, "two"), (3, "three")] {
        insert
            .bind(":id", id)
            .and_then(|v| v.bind("name", name))
            .expect("Could not bind the named parameters");
        insert.execute().expect("Could not insert");
    }

    // Rebinding the same ordinal keeps the last value
    let mut select = connection
        .prepare("SELECT name FROM binding WHERE id = ?")
        .expect("Could not prepare the select");
    select
        .bind(1, 1)
        .and_then(|v| v.bind(1, 3))
        .expect("Could not bind");
    select.execute().expect("Could not execute");
    let row = select
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a row");
    assert_eq!(get::<String, _>(&row, 0), "three");
    assert!(select.fetch().expect("Could not fetch").is_none());

    // A variable is read again at every execution
    let variable = Variable::new(1);
    select
        .bind_param(1, &variable, BindType::Scalar, 0)
        .expect("Could not bind the variable");
    select.execute().expect("Could not execute");
    assert_eq!(
        select.fetch_column(0).expect("Could not fetch"),
        Some(Value::Varchar(Some("one".into())))
    );
    variable.set(2);
    select.execute().expect("Could not execute");
    assert_eq!(
        select.fetch_column(0).expect("Could not fetch"),
        Some(Value::Varchar(Some("two".into())))
    );

    // Values bound at execution
    select.execute_with([3]).expect("Could not execute");
    assert_eq!(
        select.fetch_column(0).expect("Could not fetch"),
        Some(Value::Varchar(Some("three".into())))
    );

    // Placeholders inside literals are kept
    let mut literal = connection
        .prepare("SELECT '?' AS mark, ? AS value")
        .expect("Could not prepare the literal select");
    assert_eq!(literal.native_query(), "SELECT '?' AS mark, :param1 AS value");
    literal.execute_with([7]).expect("Could not execute");
    let row = literal
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a row");
    assert_eq!(get::<String, _>(&row, 0), "?");
    assert_eq!(get::<i64, _>(&row, 1), 7);

    // Parameters description
    let dump = literal.debug_dump_params();
    assert!(dump.starts_with("SQL: [30] SELECT '?' AS mark, ? AS value\n"));
    assert!(dump.contains("Sent SQL: [36] SELECT '?' AS mark, :param1 AS value\n"));
    assert!(dump.contains("Params: 1 {1: :param1}\n"));
    assert!(dump.contains("Key: 1 name=[7] :param1 type=scalar"));

    // Unknown name
    silent_logs! {
        let error = select
            .bind(":missing", 1)
            .map(|_| ())
            .expect_err("Binding an unknown name should fail");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::ExecutionFailure(..))
        ));
    }
    assert!(select.error_code().is_some());
}
