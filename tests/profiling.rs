use std::sync::Arc;

use dbal::{Executor, MemoryProfiler, Params, Value};

fn profiled() -> (Executor, Arc<MemoryProfiler>) {
    let profiler = Arc::new(MemoryProfiler::new());
    let db = Executor::builder()
        .dsn("sqlite::memory:")
        .profiler(profiler.clone())
        .build()
        .unwrap();
    (db, profiler)
}

#[test]
fn test_connect_is_idempotent() {
    let (mut db, profiler) = profiled();

    db.connect().unwrap();
    db.connect().unwrap();
    db.connect().unwrap();

    let connects = profiler
        .entries()
        .iter()
        .filter(|e| e.function == "connect")
        .count();
    assert_eq!(connects, 1);
}

#[test]
fn test_perform_entry_carries_statement_and_values() {
    let (mut db, profiler) = profiled();
    db.exec("CREATE TABLE t (id INTEGER)").unwrap();
    db.fetch_affected("INSERT INTO t (id) VALUES (?)", vec![5i64])
        .unwrap();

    let entries = profiler.entries();
    let perform = entries
        .iter()
        .find(|e| e.function == "perform")
        .expect("perform entry");
    assert_eq!(
        perform.statement.as_deref(),
        Some("INSERT INTO t (id) VALUES (?)")
    );
    let values = perform.values.as_ref().expect("bound values recorded");
    assert_eq!(
        *values,
        Params::positional([Value::Integer(5)])
    );
    assert!(perform.finished_at >= perform.started_at);
}

#[test]
fn test_each_operation_profiles_under_its_own_name() {
    let (mut db, profiler) = profiled();
    db.exec("CREATE TABLE t (id INTEGER)").unwrap();
    db.begin_transaction().unwrap();
    db.exec("INSERT INTO t (id) VALUES (1)").unwrap();
    db.commit().unwrap();
    db.in_transaction().unwrap();

    let names: Vec<String> = profiler.entries().iter().map(|e| e.function.clone()).collect();
    assert_eq!(
        names,
        vec![
            "connect",
            "exec",
            "beginTransaction",
            "exec",
            "commit",
            "inTransaction",
        ]
    );
}

#[test]
fn test_disabled_profiler_records_nothing_but_operations_still_run() {
    let (mut db, profiler) = profiled();
    profiler.set_active(false);

    db.exec("CREATE TABLE t (id INTEGER)").unwrap();
    db.fetch_affected("INSERT INTO t (id) VALUES (?)", vec![1i64])
        .unwrap();

    assert!(profiler.is_empty());
    let count = db.fetch_value("SELECT COUNT(*) FROM t", ()).unwrap();
    assert_eq!(count, Value::Integer(1));
}

#[test]
fn test_profile_log_exports_as_json() {
    let (mut db, profiler) = profiled();
    db.exec("CREATE TABLE t (id INTEGER)").unwrap();

    let json = serde_json::to_string(&profiler.entries()).unwrap();
    assert!(json.contains("CREATE TABLE t"));
    assert!(json.contains("\"function\":\"exec\""));
}

#[test]
fn test_default_executor_has_noop_profiling() {
    // No profiler configured: operations run, nothing is recorded
    // anywhere, nothing panics.
    let mut db = Executor::open("sqlite::memory:").unwrap();
    db.exec("CREATE TABLE t (id INTEGER)").unwrap();
    assert_eq!(db.fetch_value("SELECT 1", ()).unwrap(), Value::Integer(1));
}
