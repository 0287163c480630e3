//! Notebook - Active-Record Walkthrough
//!
//! A small note-taking schema showing the full record lifecycle:
//! - creating records and getting the engine-issued id back
//! - dirty tracking (updates touch only what changed)
//! - a serialize-designated field holding structured JSON
//! - finder lookups and builder queries over the same table
//!
//! Run with: cargo run --example notebook

use basalt_orm::{Cond, Direction, Engine, Entity, Query, Record, Value};
use basalt_sqlite::SqliteEngine;

/// A note with free-form JSON metadata.
struct Note;

impl Entity for Note {
    const TABLE: &'static str = "notes";
    const SERIALIZED: &'static [&'static str] = &["meta"];
}

trait NoteFields {
    fn title(&self) -> Option<&str>;
    fn set_title(&mut self, title: &str);
    fn set_body(&mut self, body: &str);
}

impl NoteFields for Record<Note> {
    fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    fn set_title(&mut self, title: &str) {
        self.set("title", title);
    }

    fn set_body(&mut self, body: &str) {
        self.set("body", body);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let engine = SqliteEngine::open_in_memory()?;
    engine.execute(
        "CREATE TABLE notes (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             title TEXT,
             body TEXT,
             meta TEXT
         )",
    )?;

    // Create a couple of notes.
    let mut groceries = Record::<Note>::new();
    groceries.set_title("Groceries");
    groceries.set_body("bread, coffee");
    groceries.set_serialized("meta", serde_json::json!({"pinned": true}));
    let id = groceries.create(&engine)?;
    println!("created note #{id}");

    let mut ideas = Record::<Note>::new();
    ideas.set_title("Ideas");
    ideas.create(&engine)?;

    // Load, mutate one field, save. The UPDATE touches only `title`.
    let mut note = Record::<Note>::find().by_id_or_fail(&engine, id)?;
    note.set_title("Groceries (weekend)");
    let affected = note.update(&engine)?;
    println!("updated {affected} row(s), title is now {:?}", note.title());

    // The serialized field comes back decoded.
    println!("meta: {}", note.get_serialized("meta")?);

    // Builder queries work over the same table.
    let titles = Query::select()
        .columns(["id", "title"])
        .from("notes")
        .order_by("title", Direction::Asc)
        .all(&engine)?;
    for row in &titles {
        println!("{:?} -> {:?}", row.get("id"), row.get("title"));
    }

    let pinned = Query::select()
        .from("notes")
        .filter(Cond::like("meta", "%\"pinned\":true%"))
        .count(&engine)?;
    println!("{pinned} pinned note(s)");

    // Done with the first note.
    note.delete(&engine)?;
    println!("remaining: {}", Record::<Note>::find().count(&engine, None)?);

    Ok(())
}
