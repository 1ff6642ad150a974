#[cfg(test)]
mod tests {
    use indoc::indoc;
    use oxibind::{
        Attribute, BindKey, BindType, ConnectionExt, ExecuteMode, StatementError, Value, Variable,
    };
    use oxibind_memory::{MemoryConnection, MemoryStatement, ResultSet};
    use rust_decimal::Decimal;
    use time::macros::date;
    use uuid::Uuid;

    fn memory() -> MemoryConnection {
        let connection = MemoryConnection::new();
        connection.register("UPDATE account SET balance = ? WHERE id = ?", |call| {
            call.affected(if call.get_as::<i64>("param2")? == 404 { 0 } else { 1 });
            Ok(())
        });
        connection.register(
            "UPDATE account SET balance = :balance WHERE id = :id",
            |call| {
                call.affected(if call.get_as::<i64>("id")? == 404 { 0 } else { 1 });
                Ok(())
            },
        );
        connection
    }

    #[test]
    fn prepare_translates() {
        let connection = memory();
        let statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        assert_eq!(
            statement.query_string(),
            "UPDATE account SET balance = ? WHERE id = ?"
        );
        assert_eq!(
            statement.native_query(),
            "UPDATE account SET balance = :param1 WHERE id = :param2"
        );
        assert_eq!(statement.param_map().get(2), Some(":param2"));
        assert_eq!(statement.resolve_key(&BindKey::Ordinal(1)), ":param1");
        assert_eq!(statement.resolve_key(&BindKey::Ordinal(7)), ":7");
        assert_eq!(statement.resolve_key(&BindKey::from(":id")), ":id");
    }

    #[test]
    fn rebind_last_wins() {
        let connection = memory();
        let mut statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        statement
            .bind(1, 100)
            .unwrap()
            .bind(2, 7)
            .unwrap()
            .bind(1, 250)
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(statement.row_count(), 1);
        let executions = connection.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].params["param1"], Value::Int32(Some(250)));
        assert_eq!(executions[0].params["param2"], Value::Int32(Some(7)));
        assert_eq!(executions[0].mode, ExecuteMode::AutoCommit);
    }

    #[test]
    fn bind_by_reference() {
        let connection = memory();
        let mut statement = connection
            .prepare("UPDATE account SET balance = :balance WHERE id = :id")
            .unwrap();
        let balance = Variable::<MemoryStatement>::new(10);
        statement
            .bind_param(":balance", &balance, BindType::Scalar, 0)
            .unwrap()
            .bind(":id", 404)
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(statement.row_count(), 0);
        balance.set(20);
        statement.bind(":id", 1).unwrap();
        statement.execute().unwrap();
        assert_eq!(statement.row_count(), 1);
        let params = connection
            .executions()
            .into_iter()
            .map(|v| (v.params["balance"].clone(), v.params["id"].clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            params,
            [
                (Value::Int32(Some(10)), Value::Int32(Some(404))),
                (Value::Int32(Some(20)), Value::Int32(Some(1))),
            ]
        );
    }

    #[test]
    fn execute_with_values() {
        let connection = memory();
        let mut statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        statement
            .execute_with([Value::from("1e3"), Value::Int64(Some(3))])
            .unwrap();
        let execution = connection.executions().pop().unwrap();
        assert_eq!(
            execution.params["param1"],
            Value::Varchar(Some("1e3".into()))
        );
        assert_eq!(execution.params["param2"], Value::Int64(Some(3)));
    }

    #[test]
    fn output_scalar() {
        let connection = MemoryConnection::new();
        connection.register("BEGIN :total := :a + :b; END;", |call| {
            let total = call.get_as::<i64>("a")? + call.get_as::<i64>(":B")?;
            call.set("total", total)
        });
        let mut statement = connection
            .prepare("BEGIN :total := :a + :b; END;")
            .unwrap();
        let total = Variable::new(Value::Int64(None));
        statement
            .bind_param(":total", &total, BindType::Scalar, 0)
            .unwrap()
            .bind(":a", 40)
            .unwrap()
            .bind(":b", 2)
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(total.value().unwrap(), Value::Int64(Some(42)));
    }

    #[test]
    fn output_max_length() {
        let connection = MemoryConnection::new();
        connection.register("BEGIN :name := 'overflowing'; END;", |call| {
            call.set("name", "overflowing")
        });
        let mut statement = connection
            .prepare("BEGIN :name := 'overflowing'; END;")
            .unwrap();
        let name = Variable::new(Value::Varchar(None));
        statement
            .bind_param(":name", &name, BindType::Scalar, 4)
            .unwrap();
        let error = statement.execute().unwrap_err();
        assert_eq!(statement.error_code(), Some(6502));
        assert!(format!("{error:#}").contains("character string buffer too small"));
        assert_eq!(statement.row_count(), 0);
        assert_eq!(name.value().unwrap(), Value::Varchar(None));
    }

    #[test]
    fn output_cursor() {
        let connection = MemoryConnection::new();
        connection.register("BEGIN OPEN :rows FOR SELECT * FROM planet; END;", |call| {
            call.open_cursor(
                "rows",
                ResultSet::new(["NAME", "MOONS"])
                    .row(["Earth".into(), Value::Int64(Some(1))])
                    .row(["Mars".into(), Value::Int64(Some(2))]),
            )
        });
        let mut statement = connection
            .prepare("BEGIN OPEN :rows FOR SELECT * FROM planet; END;")
            .unwrap();
        let rows = Variable::new(Value::Null);
        statement
            .set_attribute(Attribute::Case, oxibind::Case::Lower)
            .bind_param(":rows", &rows, BindType::OutputCursor, 0)
            .unwrap();
        assert!(rows.is_cursor());
        statement.execute().unwrap();
        let mut cursor = statement.open_cursor(&rows).unwrap();
        assert!(rows.is_cursor());
        assert_eq!(cursor.query_string(), "<cursor>");
        let fetched = cursor.fetch_all().unwrap();
        assert_eq!(fetched.len(), 2);
        let labeled = fetched[1].labeled().unwrap();
        assert_eq!(labeled.names(), ["name", "moons"]);
        assert_eq!(
            labeled.get_column("moons").unwrap().as_value(),
            Some(&Value::Int64(Some(2)))
        );
        let scalar = Variable::new(Value::Null);
        let error = statement.open_cursor(&scalar).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
    }

    #[test]
    fn output_cursor_reexecuted() {
        const SQL: &str = "BEGIN OPEN :rows FOR SELECT name FROM moon WHERE planet = :planet; END;";
        let connection = MemoryConnection::new();
        connection.register(SQL, |call| {
            let moons = match call.get_as::<String>("planet")?.as_str() {
                "Earth" => ResultSet::new(["NAME"]).row(["Moon"]),
                _ => ResultSet::new(["NAME"]).row(["Phobos"]).row(["Deimos"]),
            };
            call.open_cursor("rows", moons)
        });
        let mut statement = connection.prepare(SQL).unwrap();
        let rows = Variable::new(Value::Null);
        let planet = Variable::new("Earth");
        statement
            .bind_param(":rows", &rows, BindType::OutputCursor, 0)
            .unwrap()
            .bind_param(":planet", &planet, BindType::Scalar, 0)
            .unwrap();
        statement.execute().unwrap();
        let mut earth = statement.open_cursor(&rows).unwrap();
        assert_eq!(earth.fetch_all().unwrap().len(), 1);

        planet.set("Mars");
        statement.execute().unwrap();
        let mut mars = statement.open_cursor(&rows).unwrap();
        let moons = mars.fetch_all().unwrap();
        assert_eq!(moons.len(), 2);
        assert!(moons[0].get(0).is_some_and(|v| *v == Value::from("Phobos")));
        assert!(moons[1].get(0).is_some_and(|v| *v == Value::from("Deimos")));
        assert!(earth.fetch().unwrap().is_none());
        assert_eq!(connection.executions().len(), 2);
    }

    #[test]
    fn large_object_binding() {
        let connection = MemoryConnection::new();
        connection.register("INSERT INTO document VALUES (:body, :data)", |_| Ok(()));
        let mut statement = connection
            .prepare("INSERT INTO document VALUES (:body, :data)")
            .unwrap();
        let body = "x".repeat(10_000);
        statement
            .bind_value(":body", body.as_str(), BindType::LargeObject)
            .unwrap()
            .bind_value(":data", vec![0_u8, 1, 2], BindType::LargeObject)
            .unwrap();
        statement.execute().unwrap();
        let execution = connection.executions().pop().unwrap();
        assert_eq!(execution.params["body"], Value::Varchar(Some(body)));
        assert_eq!(
            execution.params["data"],
            Value::Blob(Some(vec![0, 1, 2].into()))
        );
    }

    #[test]
    fn manual_commit() {
        let mut connection = memory();
        {
            let mut statement = connection
                .prepare("UPDATE account SET balance = ? WHERE id = ?")
                .unwrap();
            statement.set_attribute(Attribute::Autocommit, false);
            statement.execute_with([1, 2]).unwrap();
        }
        oxibind::NativeConnection::set_attribute(
            &mut connection,
            Attribute::Autocommit,
            false.into(),
        )
        .unwrap();
        connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap()
            .execute_with([3, 4])
            .unwrap();
        let modes = connection
            .executions()
            .into_iter()
            .map(|v| v.mode)
            .collect::<Vec<_>>();
        assert_eq!(modes, [ExecuteMode::NoAutoCommit, ExecuteMode::NoAutoCommit]);
    }

    #[test]
    fn native_failures() {
        let connection = memory();
        let mut statement = connection.prepare("SELECT * FROM nowhere").unwrap();
        let error = statement.execute().unwrap_err();
        assert_eq!(statement.error_code(), Some(942));
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::ExecutionFailure(e)) if e.code == 942
        ));
        let mut statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        statement.bind(1, 1).unwrap();
        statement.execute().unwrap_err();
        assert_eq!(statement.error_code(), Some(1008));
        assert!(statement.bind(":nope", 1).is_err());
        assert_eq!(statement.error_code(), Some(1036));
        assert_eq!(
            statement.error_info().map(|v| v.message.as_str()),
            Some("illegal variable name/number: :nope")
        );
        statement.bind(2, 1).unwrap().execute().unwrap();
        assert_eq!(statement.error_code(), None);
    }

    #[test]
    fn negative_position_rejected() {
        let connection = memory();
        let mut statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        let error = statement.bind(-1, 100).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
        assert!(BindKey::try_from(-3_i32).is_err());
        assert_eq!(BindKey::try_from(2_i32).unwrap(), BindKey::Ordinal(2));
        assert!(statement.debug_dump_params().contains("Params: 2"));
        statement.execute_with([100, 7]).unwrap();
        assert_eq!(connection.executions().len(), 1);
    }

    #[test]
    fn typed_values() {
        let connection = MemoryConnection::new();
        connection.register("BEGIN :due := due_date(:amount, :id); END;", |call| {
            assert_eq!(call.get_as::<Decimal>("amount")?, Decimal::new(1250, 2));
            assert_eq!(call.get_as::<Uuid>("id")?, Uuid::nil());
            call.set("due", date!(2025 - 01 - 31))
        });
        let mut statement = connection
            .prepare("BEGIN :due := due_date(:amount, :id); END;")
            .unwrap();
        let due = Variable::new(Value::Date(None));
        statement
            .bind_param(":due", &due, BindType::Scalar, 0)
            .unwrap()
            .bind(":amount", Decimal::new(1250, 2))
            .unwrap()
            .bind(":id", "00000000-0000-0000-0000-000000000000")
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(
            due.value().unwrap(),
            Value::Date(Some(date!(2025 - 01 - 31)))
        );
        let execution = connection.executions().pop().unwrap();
        assert_eq!(
            execution.params["amount"],
            Value::Decimal(Some(Decimal::new(1250, 2)))
        );
    }

    #[test]
    fn dump_params() {
        let connection = memory();
        let mut statement = connection
            .prepare("UPDATE account SET balance = ? WHERE id = ?")
            .unwrap();
        statement
            .bind(1, 100)
            .unwrap()
            .bind_value(2, "7", BindType::Scalar)
            .unwrap();
        assert_eq!(
            statement.debug_dump_params(),
            indoc! {r#"
                SQL: [43] UPDATE account SET balance = ? WHERE id = ?
                Sent SQL: [55] UPDATE account SET balance = :param1 WHERE id = :param2
                Params: 2 {1: :param1, 2: :param2}
                Key: 1 name=[7] :param1 type=scalar value=Int32(Some(100))
                Key: 2 name=[7] :param2 type=scalar value=Varchar(Some("7"))
            "#}
        );
    }
}
