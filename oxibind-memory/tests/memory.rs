#[cfg(test)]
mod tests {
    use oxibind::{
        BindType, Bound, ConnectionExt, ExecuteMode, FetchFlags, LobKind, NativeConnection, NativeLob,
        NativeStatement, StatementError, Value, Variable,
    };
    use oxibind_memory::{Cell, MemoryConnection, MemoryLob, ResultSet};
    use oxibind_tests::{init_logs, silent_logs};

    fn code(error: &oxibind::Error) -> Option<i32> {
        error
            .downcast_ref::<StatementError>()
            .and_then(StatementError::native)
            .map(|v| v.code)
    }

    #[test]
    fn result_set_rows() {
        let rows = ResultSet::new(["A", "B"])
            .row([1, 2, 3])
            .row([Value::Int32(Some(4))])
            .row(Vec::<Cell>::new());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.rows[0], [Cell::from(1), Cell::from(2)]);
        assert_eq!(rows.rows[1], [Cell::from(4), Cell::Value(Value::Null)]);
        assert!(rows.rows[2].iter().all(Cell::is_null));
        assert_eq!(Cell::lob("text").lob_kind(), Some(LobKind::Character));
        assert_eq!(Cell::lob(vec![1_u8]).lob_kind(), Some(LobKind::Binary));
        assert_eq!(Cell::from("text").lob_kind(), None);
    }

    #[test]
    fn invocation_failures() {
        init_logs();
        let connection = MemoryConnection::new();
        connection
            .register("SELECT * FROM t WHERE a = :a", |call| {
                call.get("missing")?;
                Ok(())
            })
            .register("SELECT * FROM t WHERE b = :b", |call| {
                call.get_as::<i64>("b")?;
                Ok(())
            })
            .register("SELECT * FROM t WHERE c = :c", |call| {
                call.open_cursor("c", ResultSet::new(["X"]))
            });
        let cases = [
            ("SELECT * FROM t WHERE a = :a", 1008),
            ("SELECT * FROM t WHERE b = :b", 1722),
            ("SELECT * FROM t WHERE c = :c", 932),
        ];
        for (sql, expected) in cases {
            let mut statement = connection.prepare(sql).unwrap();
            statement
                .bind(sql.rsplit_once(' ').unwrap().1, "not a number")
                .unwrap();
            silent_logs! {
                let error = statement.execute().unwrap_err();
                assert_eq!(code(&error), Some(expected), "{sql}");
            }
            assert_eq!(statement.error_code(), Some(expected));
            assert_eq!(connection.last_error().map(|v| v.code), Some(expected));
        }
        assert!(connection.executions().is_empty());
    }

    #[test]
    fn invocation_reads_binds() {
        let connection = MemoryConnection::new();
        connection.register("CALL audit(:who, :what)", |call| {
            assert!(call.is_bound(":WHO"));
            assert!(!call.is_bound("when"));
            assert_eq!(call.mode(), ExecuteMode::AutoCommit);
            let who = call.get_as::<String>("who")?;
            let what = call.get("what")?;
            assert_eq!(who, "admin");
            assert_eq!(what, Value::Blob(Some(b"payload".to_vec().into())));
            call.affected(1);
            Ok(())
        });
        let mut statement = connection.prepare("CALL audit(:who, :what)").unwrap();
        statement
            .bind(":who", "admin")
            .unwrap()
            .bind_value(":what", b"payload".to_vec(), BindType::LargeObject)
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(statement.row_count(), 1);
        let executions = connection.executions();
        assert_eq!(executions[0].sql, "CALL audit(:who, :what)");
        assert_eq!(executions[0].params.len(), 2);
    }

    #[test]
    fn unloadable_lob_left_out() {
        init_logs();
        let connection = MemoryConnection::new();
        connection.register("CALL store(:id, :data)", |call| {
            assert!(call.get("data").is_err());
            Ok(())
        });
        let mut statement = connection.prepare("CALL store(:id, :data)").unwrap();
        let data = Variable::from_bound(Bound::Lob(MemoryLob::new(LobKind::Binary)));
        statement
            .bind(":id", 1)
            .unwrap()
            .bind_param(":data", &data, BindType::Scalar, 0)
            .unwrap();
        silent_logs! {
            statement.execute().unwrap();
        }
        let execution = connection.executions().pop().unwrap();
        assert_eq!(execution.params.len(), 1);
        assert_eq!(execution.params["id"], Value::Int32(Some(1)));
        assert!(!execution.params.contains_key("data"));
    }

    #[test]
    fn procedure_lookup_normalized() {
        let connection = MemoryConnection::new();
        connection.register_rows(
            "SELECT  name\n  FROM planet WHERE id = ?",
            ResultSet::new(["NAME"]).row(["Earth"]),
        );
        let mut statement = connection
            .prepare("SELECT name FROM planet WHERE id = :param1")
            .unwrap();
        statement.bind(":param1", 3).unwrap();
        statement.execute().unwrap();
        assert_eq!(
            statement.fetch_column(0).unwrap(),
            Some(Value::Varchar(Some("Earth".into())))
        );
        assert_eq!(
            connection.executions()[0].params["param1"],
            Value::Int32(Some(3))
        );
    }

    #[test]
    fn native_rows() {
        let connection = MemoryConnection::new();
        connection.register_rows(
            "SELECT * FROM mixed",
            ResultSet::new(["ID", "NOTE", "BODY", "CHILDREN"])
                .row([
                    Cell::from(1),
                    Cell::Value(Value::Null),
                    Cell::lob("body"),
                    ResultSet::new(["X"]).row([1]).into(),
                ])
                .row([Cell::from(2), Cell::from("note")]),
        );
        let mut statement = connection.parse("SELECT * FROM mixed").unwrap();
        statement.execute(ExecuteMode::AutoCommit).unwrap();
        assert_eq!(statement.column_count().unwrap(), 4);

        let row = statement
            .fetch_row(FetchFlags {
                nulls: false,
                lobs: false,
            })
            .unwrap()
            .unwrap();
        assert_eq!(&*row.labels, ["ID", "BODY", "CHILDREN"]);
        assert!(row.fields[1].is_lob());
        assert!(row.fields[2].is_cursor());

        let row = statement.fetch_row(FetchFlags::RAW).unwrap().unwrap();
        assert_eq!(row.labels.len(), 4);
        assert!(row.fields[2].is_null());
        assert!(row.fields[3].is_null());
        assert!(statement.fetch_row(FetchFlags::RAW).unwrap().is_none());

        let meta = statement.column_meta(1).unwrap().unwrap();
        assert_eq!(meta.name, "NOTE");
        assert_eq!(meta.native_type, "VARCHAR");
        assert_eq!(meta.len, Some(4));
        assert!(meta.nullable);
        let meta = statement.column_meta(0).unwrap().unwrap();
        assert_eq!(meta.native_type, "INTEGER");
        assert!(!meta.nullable);
        assert_eq!(
            statement.column_meta(3).unwrap().unwrap().native_type,
            "REF CURSOR"
        );
        assert_eq!(statement.column_meta(4).unwrap(), None);

        statement.free_result().unwrap();
        assert!(statement.fetch_row(FetchFlags::RAW).unwrap().is_none());
        assert_eq!(statement.column_count().unwrap(), 0);
    }

    #[test]
    fn lob_descriptors() {
        init_logs();
        let connection = MemoryConnection::new();
        let mut lob = connection.new_lob(LobKind::Binary).unwrap();
        silent_logs! {
            assert!(lob.load().is_err());
        }
        lob.write_temporary(&"bytes".into()).unwrap();
        assert!(lob.is_temporary());
        assert_eq!(lob.load().unwrap(), Value::Blob(Some(b"bytes".to_vec().into())));
        assert_eq!(lob.len().unwrap(), 5);

        let mut lob = MemoryLob::new(LobKind::Character);
        silent_logs! {
            let error = lob.write_temporary(&Value::Int32(Some(1))).unwrap_err();
            assert_eq!(code(&error), Some(932));
        }
        lob.write_temporary(&Value::Varchar(None)).unwrap();
        assert_eq!(lob.len().unwrap(), 0);

        let stored = MemoryLob::stored("fetched".into());
        assert_eq!(stored.kind(), LobKind::Character);
        assert!(!stored.is_temporary());
    }

    #[test]
    fn cursor_outside_procedures() {
        init_logs();
        let connection = MemoryConnection::new();
        connection.register("BEGIN :out := 1; END;", |call| {
            call.open_cursor("out", ResultSet::new(["X"]))
        });
        let mut statement = connection.prepare("BEGIN :out := 1; END;").unwrap();
        let out = Variable::new(Value::Null);
        statement.bind_param(":out", &out, BindType::Scalar, 0).unwrap();
        silent_logs! {
            let error = statement.execute().unwrap_err();
            assert_eq!(code(&error), Some(932));
        }
        let mut cursor = connection.new_cursor().unwrap();
        cursor.execute(ExecuteMode::AutoCommit).unwrap();
        assert!(cursor.fetch_row(FetchFlags::RAW).unwrap().is_none());
        silent_logs! {
            let variable = Variable::new(Value::Null);
            let error = cursor.bind_by_name(":x", &variable, None).unwrap_err();
            assert_eq!(code(&error), Some(1036));
        }
    }
}
