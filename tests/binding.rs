use dbal::{BoundValue, DbalError, Executor, ParamType, Params, Value};

fn fresh() -> Executor {
    let mut db = Executor::open("sqlite::memory:").unwrap();
    db.exec("CREATE TABLE vals (i INTEGER, r REAL, t TEXT, b BLOB, flag TEXT)")
        .unwrap();
    db
}

#[test]
fn test_round_trip_scalars() {
    let mut db = fresh();
    db.fetch_affected(
        "INSERT INTO vals (i, r, t, b) VALUES (?, ?, ?, ?)",
        Params::positional([
            BoundValue::new(42i64),
            BoundValue::new(2.5f64),
            BoundValue::new("hello"),
            BoundValue::new(vec![0xDEu8, 0xAD, 0xBE, 0xEF]),
        ]),
    )
    .unwrap();

    let row = db.fetch_one("SELECT i, r, t, b FROM vals", ()).unwrap();
    assert_eq!(row.get("i"), Some(&Value::Integer(42)));
    assert_eq!(row.get("r"), Some(&Value::Real(2.5)));
    assert_eq!(row.get("t"), Some(&Value::Text("hello".to_string())));
    assert_eq!(
        row.get("b"),
        Some(&Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF]))
    );
}

#[test]
fn test_round_trip_null() {
    let mut db = fresh();
    db.fetch_affected(
        "INSERT INTO vals (i) VALUES (?)",
        Params::positional([Value::Null]),
    )
    .unwrap();
    let value = db.fetch_value("SELECT i FROM vals", ()).unwrap();
    assert_eq!(value, Value::Null);
}

#[test]
fn test_untagged_bool_binds_as_integer() {
    let mut db = fresh();
    db.fetch_affected(
        "INSERT INTO vals (i) VALUES (?)",
        Params::positional([Value::Bool(true)]),
    )
    .unwrap();
    let value = db.fetch_value("SELECT i FROM vals", ()).unwrap();
    assert_eq!(value, Value::Integer(1));
}

#[test]
fn test_tagged_bool_coerces_to_text_one_zero() {
    let mut db = fresh();
    db.fetch_affected(
        "INSERT INTO vals (flag) VALUES (?)",
        Params::Positional(vec![BoundValue::typed(true, ParamType::Bool)]),
    )
    .unwrap();
    db.fetch_affected(
        "INSERT INTO vals (flag) VALUES (?)",
        Params::Positional(vec![BoundValue::typed(false, ParamType::Bool)]),
    )
    .unwrap();

    let flags = db.fetch_column("SELECT flag FROM vals", (), 0).unwrap();
    assert_eq!(
        flags,
        vec![
            Value::Text("1".to_string()),
            Value::Text("0".to_string()),
        ]
    );
}

#[test]
fn test_positional_input_is_zero_based() {
    let mut db = fresh();
    // First caller value lands in the first placeholder.
    let row = db
        .fetch_one(
            "SELECT ?1 AS first, ?2 AS second",
            vec![Value::from("one"), Value::from("two")],
        )
        .unwrap();
    assert_eq!(row.get("first"), Some(&Value::Text("one".to_string())));
    assert_eq!(row.get("second"), Some(&Value::Text("two".to_string())));
}

#[test]
fn test_named_parameters_pass_through() {
    let mut db = fresh();
    db.fetch_affected(
        "INSERT INTO vals (i, t) VALUES (:num, :word)",
        Params::named([("num", Value::Integer(5)), ("word", Value::from("five"))]),
    )
    .unwrap();

    let row = db
        .fetch_one(
            "SELECT t FROM vals WHERE i = :num",
            Params::named([(":num", Value::Integer(5))]),
        )
        .unwrap();
    assert_eq!(row.get("t"), Some(&Value::Text("five".to_string())));
}

#[test]
fn test_unmatched_named_parameter_errors() {
    let mut db = fresh();
    let err = db
        .fetch_one(
            "SELECT * FROM vals WHERE i = :num",
            Params::named([("wrong", Value::Integer(1))]),
        )
        .err()
        .unwrap();
    assert!(matches!(err, DbalError::UnknownParameter(_)));
}
