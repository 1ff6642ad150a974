use crate::{run, silent_logs};
use oxibind::{ConnectionExt, NativeConnection, StatementError};

pub fn failures<C: NativeConnection>(connection: &C) {
    // Setup
    run(connection, "DROP TABLE IF EXISTS failures");
    run(connection, "CREATE TABLE failures (id INTEGER PRIMARY KEY)");

    silent_logs! {
        // Malformed statement
        let result = connection
            .prepare("SELEC * FROM failures")
            .and_then(|mut v| v.execute());
        assert!(result.is_err(), "A malformed statement should not run");

        // Missing table
        let result = connection
            .prepare("SELECT * FROM missing_table")
            .and_then(|mut v| v.execute());
        assert!(result.is_err(), "A missing table should not be queried");

        // Constraint violation, the statement keeps the native error
        let mut insert = connection
            .prepare("INSERT INTO failures (id) VALUES (?)")
            .expect("Could not prepare the insert");
        insert.execute_with([1]).expect("Could not insert the first row");
        assert_eq!(insert.error_code(), None);
        let error = insert
            .execute_with([1])
            .expect_err("A duplicate key should fail");
        let native = error
            .downcast_ref::<StatementError>()
            .and_then(StatementError::native)
            .expect("Expected a native error");
        assert_eq!(insert.error_code(), Some(native.code));
        assert_eq!(insert.error_info(), Some(native));
        assert_eq!(insert.row_count(), 0);

        // A later success clears it
        insert.execute_with([2]).expect("Could not insert the second row");
        assert_eq!(insert.error_code(), None);
        assert!(insert.error_info().is_none());
    }
}
