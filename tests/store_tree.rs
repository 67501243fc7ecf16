use maestro::model::{Priority, Task, TaskStatus};
use maestro::render::{GlyphStyle, TreeRenderer};
use maestro::{db, ops, output, tree};
use rusqlite::Connection;
use tempfile::TempDir;

fn open_store() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open(dir.path().join("maestro.db")).unwrap();
    db::init(&conn).unwrap();
    (dir, conn)
}

fn snapshot() -> Vec<Task> {
    serde_json::from_str(
        r#"[
            {"id": "A"},
            {"id": "B", "parentId": "A"},
            {"id": "C", "parentId": "A", "status": "completed"},
            {"id": "D", "parentId": "Z", "status": "blocked"}
        ]"#,
    )
    .unwrap()
}

#[test]
fn imported_snapshot_renders_with_dangling_parent_promoted() {
    let (_dir, conn) = open_store();
    assert_eq!(ops::import_tasks(&conn, &snapshot()).unwrap(), 4);

    let tasks = ops::list_tasks(&conn, None, None).unwrap();
    let text = output::format_task_tree(&tasks, &TreeRenderer::new(GlyphStyle::Unicode));
    assert_eq!(
        text,
        ". A [medium]\n├── . B [medium]\n└── x C [medium]\n! D [medium]\n"
    );
}

#[test]
fn moves_and_reparents_persist_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maestro.db");
    {
        let conn = db::open(&path).unwrap();
        db::init(&conn).unwrap();
        ops::add_task(&conn, "root", None, "Root", TaskStatus::Todo, Priority::High).unwrap();
        for id in ["a", "b", "c"] {
            ops::add_task(&conn, id, Some("root"), "", TaskStatus::Todo, Priority::Medium)
                .unwrap();
        }
        assert_eq!(ops::move_task(&conn, "c", 0).unwrap(), 0);
        ops::reparent_task(&conn, "b", Some("a")).unwrap();
    }

    let conn = db::open(&path).unwrap();
    db::init(&conn).unwrap();
    let tasks = ops::list_tasks(&conn, None, None).unwrap();
    let text = output::format_task_tree(&tasks, &TreeRenderer::new(GlyphStyle::Ascii));
    assert_eq!(
        text,
        ". root  Root [high]\n|-- . c [medium]\n`-- . a [medium]\n    `-- . b [medium]\n"
    );
}

#[test]
fn reparent_into_own_subtree_is_rejected() {
    let (_dir, conn) = open_store();
    ops::add_task(&conn, "p", None, "", TaskStatus::Todo, Priority::Medium).unwrap();
    ops::add_task(&conn, "c", Some("p"), "", TaskStatus::Todo, Priority::Medium).unwrap();
    assert!(ops::reparent_task(&conn, "p", Some("c")).is_err());
}

#[test]
fn forest_covers_every_stored_task_once() {
    let (_dir, conn) = open_store();
    ops::import_tasks(&conn, &snapshot()).unwrap();
    ops::add_task(&conn, "E", Some("D"), "", TaskStatus::Todo, Priority::Low).unwrap();

    let tasks = ops::list_tasks(&conn, None, None).unwrap();
    let forest = tree::build_tree(&tasks);
    assert_eq!(tree::count_nodes(&forest), tasks.len());

    let json = serde_json::to_value(&forest).unwrap();
    assert_eq!(json[1]["id"], "D");
    assert_eq!(json[1]["children"][0]["id"], "E");
}

#[test]
fn root_filter_limits_listing_to_subtree() {
    let (_dir, conn) = open_store();
    ops::import_tasks(&conn, &snapshot()).unwrap();
    let tasks = ops::list_tasks(&conn, None, Some("A")).unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}
