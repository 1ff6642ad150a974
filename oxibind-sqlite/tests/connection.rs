#[cfg(test)]
mod tests {
    use oxibind::{
        Attribute, AttributeValue, BindType, Case, ConnectionExt, FetchStyle, NativeConnection,
        StatementError, Value, Variable,
    };
    use oxibind_sqlite::SqliteConnection;
    use oxibind_tests::{init_logs, run, silent_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    fn count(connection: &SqliteConnection) -> Option<Value> {
        let mut statement = connection
            .prepare("SELECT COUNT(*) FROM counter")
            .unwrap();
        statement.execute().unwrap();
        statement.fetch_column(0).unwrap()
    }

    #[test]
    fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH)).is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("memory://some_value").is_err());
            assert!(SqliteConnection::connect("sqlite://:memory:?case=sideways").is_err());
        };
    }

    #[test]
    fn busy_timeout() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/busy.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let writer = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        run(&writer, "CREATE TABLE counter (id INTEGER PRIMARY KEY, value INTEGER)");
        let waiting = SqliteConnection::connect(&format!("sqlite://{}?busy_timeout=50", DB_PATH))
            .expect("Could not open the database");
        writer.execute_batch("BEGIN IMMEDIATE").unwrap();
        assert!(writer.in_transaction());
        let mut insert = waiting
            .prepare("INSERT INTO counter VALUES (?, ?)")
            .unwrap();
        silent_logs! {
            let error = insert.execute_with([1, 10]).unwrap_err();
            let native = error
                .downcast_ref::<StatementError>()
                .and_then(StatementError::native)
                .expect("Expected a native error");
            assert_eq!(native.code & 0xff, libsqlite3_sys::SQLITE_BUSY);
        }
        writer.commit().unwrap();
        insert.execute_with([1, 10]).unwrap();
        assert_eq!(count(&waiting), Some(Value::Int64(Some(1))));
        drop(insert);
        drop(waiting);
        drop(writer);
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());

        silent_logs! {
            assert!(SqliteConnection::connect("sqlite://:memory:?busy_timeout=soon").is_err());
            assert!(SqliteConnection::connect("sqlite://:memory:?busy_timeout=-1").is_err());
        }
    }

    #[test]
    fn url_attributes() {
        init_logs();
        let connection =
            SqliteConnection::connect("sqlite://:memory:?case=lower&fetch=numeric").unwrap();
        assert_eq!(
            connection.attribute(Attribute::Case),
            Some(AttributeValue::Case(Case::Lower))
        );
        let statement = connection.prepare("SELECT 1 AS One").unwrap();
        assert_eq!(statement.fetch_mode().style(), FetchStyle::Numeric);
        let version = connection.server_version().unwrap();
        assert_eq!(version.major(), 3);
        assert!(
            connection
                .version_string()
                .unwrap()
                .starts_with("SQLite 3.")
        );
    }

    #[test]
    fn manual_transaction() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        run(
            &connection,
            "CREATE TABLE counter (id INTEGER PRIMARY KEY, value INTEGER)",
        );
        assert!(!connection.in_transaction());
        connection
            .set_attribute(Attribute::Autocommit, false.into())
            .unwrap();
        connection
            .prepare("INSERT INTO counter VALUES (?, ?)")
            .unwrap()
            .execute_with([1, 10])
            .unwrap();
        assert!(connection.in_transaction());
        connection.rollback().unwrap();
        assert!(!connection.in_transaction());
        connection
            .prepare("INSERT INTO counter VALUES (?, ?)")
            .unwrap()
            .execute_with([2, 20])
            .unwrap();
        connection.commit().unwrap();
        assert!(!connection.in_transaction());
        connection
            .set_attribute(Attribute::Autocommit, true.into())
            .unwrap();
        {
            let mut statement = connection
                .prepare("INSERT INTO counter VALUES (?, ?)")
                .unwrap();
            statement.execute_with([3, 30]).unwrap();
            assert_eq!(statement.row_count(), 1);
        }
        assert!(!connection.in_transaction());
        assert_eq!(count(&connection), Some(Value::Int64(Some(2))));
    }

    #[test]
    fn cursor_parameters_unsupported() {
        init_logs();
        let connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        let mut statement = connection.prepare("SELECT :rows").unwrap();
        let rows = Variable::new(Value::Null);
        silent_logs! {
            let error = statement
                .bind_param(":rows", &rows, BindType::OutputCursor, 0)
                .unwrap_err();
            assert!(matches!(
                error.downcast_ref::<StatementError>(),
                Some(StatementError::ExecutionFailure(..))
            ));
        }
        assert!(!rows.is_cursor());
    }

    #[test]
    fn multiple_statements_rejected() {
        init_logs();
        let connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        silent_logs! {
            assert!(connection.prepare("SELECT 1; SELECT 2").is_err());
        }
        connection.execute_batch("CREATE TABLE a (x); CREATE TABLE b (y);").unwrap();
        assert!(connection.prepare("SELECT x FROM a; ").is_ok());
    }
}
