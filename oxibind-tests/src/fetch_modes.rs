use crate::{run, silent_logs};
use oxibind::{
    AnonymousRecord, AsValue, ClassDescriptor, ConnectionExt, FetchArg, FetchStyle, FetchedRow,
    Field, NativeConnection, NativeStatement, Record, Result, StatementError, Value,
};
use std::sync::{Arc, Mutex};

#[derive(Default, Debug)]
struct Planet {
    name: String,
    moons: i64,
    greeting: String,
}

impl<S: NativeStatement> Record<S> for Planet {
    fn assign(&mut self, name: &str, field: Field<S>) -> Result<()> {
        match name {
            "name" => self.name = field.get()?,
            "moons" => self.moons = field.get()?,
            _ => {}
        }
        Ok(())
    }
}

pub fn fetch_modes<C: NativeConnection>(connection: &C) {
    // Setup
    run(connection, "DROP TABLE IF EXISTS planet");
    run(connection, "CREATE TABLE planet (name TEXT, moons INTEGER)");
    let mut insert = connection
        .prepare("INSERT INTO planet (name, moons) VALUES (?, ?)")
        .expect("Could not prepare the insert");
    for (name, moons) in [("Mercury", 0_i64), ("Earth", 1), ("Mars", 2)] {
        insert
            .execute_with([Value::from(name), moons.as_value()])
            .expect("Could not insert");
    }
    let mut select = connection
        .prepare("SELECT name, moons FROM planet ORDER BY moons")
        .expect("Could not prepare the select");

    // Rejected selections leave the mode untouched
    select
        .set_fetch_mode(FetchStyle::Column, vec![1_i32.into()])
        .expect("Could not set the column mode");
    silent_logs! {
        let error = select
            .set_fetch_mode(99_u32, vec![])
            .expect_err("99 is not a fetch mode");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::UnsupportedMode(..))
        ));
        let error = select
            .set_fetch_mode("sideways", vec![])
            .expect_err("sideways is not a fetch mode");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::UnsupportedMode(..))
        ));
        let error = select
            .set_fetch_mode(FetchStyle::Into, vec![])
            .expect_err("The into mode requires a target");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
        let error = select
            .set_fetch_mode(FetchStyle::Column, vec!["first".into()])
            .expect_err("The column index must be an integer");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
        let error = select
            .set_fetch_mode(FetchStyle::Column, vec![(-1_i32).into()])
            .expect_err("The column index must not be negative");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
        assert!(
            select
                .set_fetch_mode(FetchStyle::Associative, vec![0_i32.into()])
                .is_err()
        );
    }
    assert_eq!(select.fetch_mode().style(), FetchStyle::Column);
    assert_eq!(select.fetch_mode().column(), Some(1));

    // Numeric codes
    select
        .set_fetch_mode(4_u32, vec![0_i32.into()])
        .expect("Could not set the column mode by code");
    select.execute().expect("Could not execute");
    let rows = select.fetch_all().expect("Could not fetch the names");
    assert_eq!(rows.len(), 3);
    assert!(matches!(
        &rows[0],
        FetchedRow::Column(v) if v.as_value() == Some(&"Mercury".into())
    ));

    // Anonymous objects
    select.execute().expect("Could not execute");
    let object = select
        .fetch_object(None, vec![])
        .expect("Could not fetch an object")
        .expect("Expected an object");
    let object = object
        .downcast_ref::<AnonymousRecord<C::Statement>>()
        .expect("Expected an anonymous record");
    assert_eq!(object.names().collect::<Vec<_>>(), ["name", "moons"]);
    assert!(
        object
            .get("name")
            .is_some_and(|v| *v == Value::Varchar(Some("Mercury".into())))
    );
    assert_eq!(select.fetch_mode().style(), FetchStyle::Column);

    // Objects of a class, with constructor arguments
    let class = ClassDescriptor::new("Planet", |args: &[Value]| {
        Ok(Planet {
            greeting: String::try_from_value(args.first().cloned().unwrap_or_default())?,
            ..Default::default()
        })
    });
    assert_eq!(class.name(), "Planet");
    select
        .set_fetch_mode(FetchStyle::Object, vec![class.into(), "hello".into()])
        .expect("Could not set the object mode");
    select.execute().expect("Could not execute");
    let planets = select
        .fetch_all()
        .expect("Could not fetch the planets")
        .into_iter()
        .map(|v| {
            let record = v.into_record().expect("Expected an object");
            let planet = record
                .downcast_ref::<Planet>()
                .expect("Expected a planet");
            (planet.name.clone(), planet.moons, planet.greeting.clone())
        })
        .collect::<Vec<_>>();
    assert_eq!(
        planets,
        [
            ("Mercury".to_string(), 0, "hello".to_string()),
            ("Earth".to_string(), 1, "hello".to_string()),
            ("Mars".to_string(), 2, "hello".to_string()),
        ]
    );
    select.execute().expect("Could not execute");
    silent_logs! {
        assert!(
            select
                .fetch_object(
                    Some(ClassDescriptor::of::<Planet>()),
                    vec!["unexpected".into()]
                )
                .is_err()
        );
    }

    // Into an existing object
    let target = Arc::new(Mutex::new(Planet::default()));
    select
        .set_fetch_mode(FetchStyle::Into, vec![FetchArg::target(&target)])
        .expect("Could not set the into mode");
    select.execute().expect("Could not execute");
    let row = select
        .fetch()
        .expect("Could not fetch")
        .expect("Expected a row");
    assert!(matches!(row, FetchedRow::Into(..)));
    assert_eq!(target.lock().unwrap().name, "Mercury");
    select.fetch().expect("Could not fetch");
    assert_eq!(target.lock().unwrap().name, "Earth");
    assert_eq!(target.lock().unwrap().moons, 1);
    select.fetch().expect("Could not fetch");
    assert!(select.fetch().expect("Could not fetch").is_none());
    assert_eq!(target.lock().unwrap().name, "Mars");
}
