//! Active-record lifecycle against a real SQLite database.

mod common;

use basalt_orm::{Cond, Entity, OrmError, Query, Record, RecordState, Value};
use common::RecordingEngine;

struct User;

impl Entity for User {
    const TABLE: &'static str = "users";
    const SERIALIZED: &'static [&'static str] = &["profile"];
}

/// The typed accessor surface an entity declares over the attribute map.
trait UserFields {
    fn name(&self) -> Option<&str>;
    fn set_name(&mut self, name: &str);
    fn set_age(&mut self, age: i64);
}

impl UserFields for Record<User> {
    fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    fn set_name(&mut self, name: &str) {
        self.set("name", name);
    }

    fn set_age(&mut self, age: i64) {
        self.set("age", age);
    }
}

#[test]
fn insert_then_find_by_id() {
    let engine = RecordingEngine::with_users_table();

    let id = Query::insert("users")
        .values_map([("name", "Ann")])
        .execute(&engine)
        .unwrap();
    assert_eq!(id, 1);

    let record = Record::<User>::find().by_id(&engine, id).unwrap().unwrap();
    assert_eq!(record.state(), RecordState::Persisted);
    assert_eq!(record.name(), Some("Ann"));
    assert!(!record.has_changes());
}

#[test]
fn by_id_miss_is_none_and_or_fail_errors() {
    let engine = RecordingEngine::with_users_table();

    assert!(Record::<User>::find().by_id(&engine, 99).unwrap().is_none());
    let err = Record::<User>::find()
        .by_id_or_fail(&engine, 99)
        .unwrap_err();
    assert!(matches!(err, OrmError::RecordNotFound { table: "users", .. }));
}

#[test]
fn create_assigns_id_and_persists() {
    let engine = RecordingEngine::with_users_table();

    let mut user = Record::<User>::new();
    user.set_name("Ann");
    user.set_age(40);
    let id = user.create(&engine).unwrap();

    assert!(user.is_persisted());
    assert_eq!(user.id(), Some(&Value::Int(id)));
    assert!(!user.has_changes());

    let found = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    assert_eq!(found.name(), Some("Ann"));
    assert_eq!(found.get("age"), Some(&Value::Int(40)));
}

#[test]
fn update_touches_only_the_changed_field() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_name("John");
    user.set_age(30);
    let id = user.create(&engine).unwrap();

    let mut loaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    // Writing the already-stored value is not a change.
    loaded.set_name("John");
    assert!(!loaded.has_changes());

    loaded.set_name("Jane");
    assert_eq!(loaded.changed_fields().collect::<Vec<_>>(), vec!["name"]);

    engine.clear_statements();
    let affected = loaded.update(&engine).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        engine.statements(),
        vec![format!("UPDATE `users` SET `name` = 'Jane' WHERE `id` = {id}")]
    );

    let reloaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    assert_eq!(reloaded.name(), Some("Jane"));
    assert_eq!(reloaded.get("age"), Some(&Value::Int(30)));
}

#[test]
fn create_then_update_without_changes_issues_no_sql() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_name("Ann");
    user.create(&engine).unwrap();

    engine.clear_statements();
    assert_eq!(user.update(&engine).unwrap(), 0);
    assert!(engine.statements().is_empty());
}

#[test]
fn delete_detaches_the_record() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_name("Ann");
    let id = user.create(&engine).unwrap();

    assert_eq!(user.delete(&engine).unwrap(), 1);
    assert!(!user.is_persisted());
    // Detached but still inspectable.
    assert_eq!(user.name(), Some("Ann"));
    assert!(Record::<User>::find().by_id(&engine, id).unwrap().is_none());

    // A second delete finds no loaded record to delete.
    assert!(matches!(user.delete(&engine), Err(OrmError::NotLoaded)));
}

#[test]
fn save_dispatches_on_state() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_name("Ann");
    user.save(&engine).unwrap();
    assert!(user.is_persisted());

    user.set_name("Jane");
    user.save(&engine).unwrap();

    let reloaded = Record::<User>::find()
        .by_id_or_fail(&engine, user.id().unwrap().clone())
        .unwrap();
    assert_eq!(reloaded.name(), Some("Jane"));
}

#[test]
fn serialized_field_round_trips_through_storage() {
    let engine = RecordingEngine::with_users_table();
    let profile = serde_json::json!({"city": "Besançon", "tags": ["a", "b"]});

    let mut user = Record::<User>::new();
    user.set_name("Ann");
    user.set_serialized("profile", profile.clone());
    // Readable before any save, decoded, without a premature encode.
    assert_eq!(user.get_serialized("profile").unwrap(), &profile);
    let id = user.create(&engine).unwrap();

    let mut loaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    assert_eq!(loaded.get_serialized("profile").unwrap(), &profile);
}

#[test]
fn unchanged_serialized_field_does_not_dirty_the_record() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_serialized("profile", serde_json::json!({"city": "Nantes"}));
    let id = user.create(&engine).unwrap();

    let mut loaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    let decoded = loaded.get_serialized("profile").unwrap().clone();
    loaded.set_serialized("profile", decoded);

    engine.clear_statements();
    assert_eq!(loaded.update(&engine).unwrap(), 0);
    assert!(engine.statements().is_empty());
}

#[test]
fn changed_serialized_field_updates_storage() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_serialized("profile", serde_json::json!({"city": "Nantes"}));
    let id = user.create(&engine).unwrap();

    let mut loaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    loaded.set_serialized("profile", serde_json::json!({"city": "Brest"}));
    assert_eq!(loaded.update(&engine).unwrap(), 1);

    let mut reloaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    assert_eq!(
        reloaded.get_serialized("profile").unwrap(),
        &serde_json::json!({"city": "Brest"})
    );
}

#[test]
fn finder_filters_and_counts() {
    let engine = RecordingEngine::with_users_table();
    for (name, age) in [("John", 30_i64), ("Jane", 25), ("Bob", 61)] {
        let mut user = Record::<User>::new();
        user.set_name(name);
        user.set_age(age);
        user.create(&engine).unwrap();
    }

    let finder = Record::<User>::find();
    assert_eq!(finder.count(&engine, None).unwrap(), 3);
    assert_eq!(
        finder.count(&engine, Some(Cond::gt("age", 28))).unwrap(),
        2
    );
    assert!(finder.exists(&engine, Cond::eq("name", "Bob")).unwrap());

    let seniors = finder.all(&engine, Some(Cond::gte("age", 60))).unwrap();
    assert_eq!(seniors.len(), 1);
    assert_eq!(seniors[0].name(), Some("Bob"));

    assert!(finder
        .first(&engine, Cond::eq("name", "Nobody"))
        .unwrap()
        .is_none());
}

#[test]
fn two_copies_of_one_row_are_independent() {
    let engine = RecordingEngine::with_users_table();
    let mut user = Record::<User>::new();
    user.set_name("Ann");
    user.set_age(40);
    let id = user.create(&engine).unwrap();

    let mut left = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    let mut right = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();

    left.set_name("Lena");
    left.update(&engine).unwrap();
    right.set_age(41);
    right.update(&engine).unwrap();

    // No identity map: each copy pushed only its own change.
    let reloaded = Record::<User>::find().by_id_or_fail(&engine, id).unwrap();
    assert_eq!(reloaded.name(), Some("Lena"));
    assert_eq!(reloaded.get("age"), Some(&Value::Int(41)));
}
