//! Query builder and cursor behavior against a real SQLite database.

mod common;

use basalt_orm::{Cond, Direction, Engine, Op, Query, Value};
use basalt_sql_core::ListSeed;
use common::RecordingEngine;

fn seed_users(engine: &RecordingEngine) {
    Query::insert("users")
        .columns(["name", "age"])
        .values_many([
            [Value::from("John"), Value::Int(30)],
            [Value::from("Jane"), Value::Int(25)],
            [Value::from("Bob"), Value::Int(61)],
        ])
        .execute(engine)
        .unwrap();
    engine.clear_statements();
}

#[test]
fn like_count_end_to_end() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);

    let count = Query::select()
        .from("users")
        .filter(Cond::like("name", "%oh"))
        .count(&engine)
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn count_then_all_returns_full_rows() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);

    let query = Query::select()
        .columns(["id", "name"])
        .from("users")
        .order_by("name", Direction::Asc);
    assert_eq!(query.count(&engine).unwrap(), 3);

    // The same builder still selects its own column list, not count rows.
    let rows = query.all(&engine).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Bob")));
    assert!(rows[0].contains("id"));
}

#[test]
fn one_on_zero_rows_is_none() {
    let engine = RecordingEngine::with_users_table();
    let row = Query::select()
        .from("users")
        .filter(Cond::eq("name", "Nobody"))
        .one(&engine)
        .unwrap();
    assert!(row.is_none());
}

#[test]
fn index_by_duplicate_keys_keeps_the_last_row() {
    let engine = RecordingEngine::with_users_table();
    Query::insert("users")
        .columns(["name", "age"])
        .values_many([
            [Value::from("dup"), Value::Int(1)],
            [Value::from("solo"), Value::Int(2)],
            [Value::from("dup"), Value::Int(3)],
        ])
        .execute(&engine)
        .unwrap();

    let map = Query::select()
        .from("users")
        .order_by("id", Direction::Asc)
        .index_by("name")
        .all_indexed(&engine)
        .unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["dup"].get("age"), Some(&Value::Int(3)));
}

#[test]
fn quoting_survives_hostile_strings() {
    let engine = RecordingEngine::with_users_table();
    let hostile = "Rob'); DROP TABLE users; -- \\ \"quoted\" \n\tO'Brien";

    let id = Query::insert("users")
        .values_map([("name", hostile)])
        .execute(&engine)
        .unwrap();

    let row = Query::select()
        .from("users")
        .filter(Cond::eq("id", id))
        .one(&engine)
        .unwrap()
        .unwrap();
    assert_eq!(row.get("name"), Some(&Value::from(hostile)));

    // The table is intact: the hostile text stayed data, not SQL.
    assert_eq!(Query::select().from("users").count(&engine).unwrap(), 1);
}

#[test]
fn predicate_grouping_and_or() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);

    // name = 'John' OR (age > 20 AND age < 28)
    let count = Query::select()
        .from("users")
        .filter(Cond::eq("name", "John").or(Cond::all([
            Cond::gt("age", 20),
            Cond::lt("age", 28),
        ])))
        .count(&engine)
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn in_list_and_subquery_predicates() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);
    engine
        .execute("CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER)")
        .unwrap();
    engine
        .execute("INSERT INTO orders (user_id) VALUES (1), (1), (3)")
        .unwrap();

    let by_names = Query::select()
        .from("users")
        .filter(Cond::in_list("name", ["John", "Bob"]))
        .count(&engine)
        .unwrap();
    assert_eq!(by_names, 2);

    let with_orders = Query::select()
        .from("users")
        .filter(Cond::compare(
            "id",
            Op::In,
            Query::select().columns(["user_id"]).from("orders"),
        ))
        .count(&engine)
        .unwrap();
    assert_eq!(with_orders, 2);
}

#[test]
fn ordering_limit_offset() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);

    let rows = Query::select()
        .columns(["name"])
        .from("users")
        .order_by("age", Direction::Desc)
        .limit(2)
        .offset(1)
        .all(&engine)
        .unwrap();
    let names: Vec<&Value> = rows.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(names, vec![&Value::from("John"), &Value::from("Jane")]);
}

#[test]
fn cursor_column_and_seek() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);
    engine.execute("UPDATE users SET age = NULL WHERE name = 'Bob'").unwrap();

    let mut cursor = Query::select()
        .from("users")
        .order_by("id", Direction::Asc)
        .get(&engine)
        .unwrap();
    assert_eq!(cursor.row_count(), 3);

    cursor.seek(2).unwrap();
    cursor.next_row().unwrap().unwrap();
    assert_eq!(cursor.column("name", None).unwrap(), Value::from("Bob"));
    // NULL age falls back to the default.
    assert_eq!(
        cursor.column("age", Some(Value::Int(-1))).unwrap(),
        Value::Int(-1)
    );

    cursor.rewind().unwrap();
    let hydrated: Vec<_> = cursor.all_as::<basalt_orm::Row>().unwrap();
    assert_eq!(hydrated.len(), 3);
}

#[test]
fn to_list_builds_selection_data() {
    let engine = RecordingEngine::with_users_table();
    seed_users(&engine);

    let mut cursor = Query::select()
        .columns(["id", "name"])
        .from("users")
        .order_by("id", Direction::Asc)
        .get(&engine)
        .unwrap();
    let list = cursor
        .to_list("id", "name", Some(ListSeed::Prompt(Value::from("pick a user"))))
        .unwrap();
    assert_eq!(list[0], (String::new(), Value::from("pick a user")));
    assert_eq!(list[1], (String::from("1"), Value::from("John")));
    assert_eq!(list.len(), 4);
}

#[test]
fn to_array_exports_json() {
    let engine = RecordingEngine::with_users_table();
    Query::insert("users")
        .values_map([("name", Value::from("Ann")), ("age", Value::Int(40))])
        .execute(&engine)
        .unwrap();

    let mut cursor = Query::select()
        .columns(["name", "age"])
        .from("users")
        .get(&engine)
        .unwrap();
    assert_eq!(
        cursor.to_array().unwrap(),
        serde_json::json!([{"name": "Ann", "age": 40}])
    );
}

#[test]
fn group_by_and_having() {
    let engine = RecordingEngine::with_users_table();
    Query::insert("users")
        .columns(["name", "age"])
        .values_many([
            [Value::from("a"), Value::Int(30)],
            [Value::from("b"), Value::Int(30)],
            [Value::from("c"), Value::Int(61)],
        ])
        .execute(&engine)
        .unwrap();

    let rows = Query::select()
        .columns([
            basalt_sql_core::SqlRef::from("age"),
            basalt_sql_core::SqlRef::from(basalt_orm::Expr::new("COUNT(*) AS n")),
        ])
        .from("users")
        .group_by(["age"])
        .having(Cond::gt("n", 1))
        .all(&engine)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("age"), Some(&Value::Int(30)));
    assert_eq!(rows[0].get("n"), Some(&Value::Int(2)));
}
