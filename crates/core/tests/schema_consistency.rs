use std::env;
use std::fs;
use std::path::PathBuf;

use schemars::schema::RootSchema;
use visual_novel_ir::{IrGraph, StoryGraph, VisualGraph};

fn verify_schema(name: &str, schema: RootSchema) {
    let schema_json = serde_json::to_string_pretty(&schema).unwrap();

    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(format!("schema_{}.json", name));

    if env::var("UPDATE_SCHEMA").is_ok() || !path.exists() {
        fs::write(&path, schema_json).expect("failed to write schema");
        return;
    }

    let existing_json = fs::read_to_string(&path).expect("failed to read existing schema");

    // Normalize newlines
    let schema_json = schema_json.replace("\r\n", "\n");
    let existing_json = existing_json.replace("\r\n", "\n");

    if schema_json != existing_json {
        panic!(
            "Schema mismatch for {}. Run with UPDATE_SCHEMA=1 to update.\nExpected:\n{}\nActual:\n{}",
            name, existing_json, schema_json
        );
    }
}

#[test]
fn test_ir_graph_schema_snapshot() {
    verify_schema("ir_graph", IrGraph::json_schema());
}

#[test]
fn test_visual_graph_schema_snapshot() {
    verify_schema("visual_graph", VisualGraph::json_schema());
}

#[test]
fn test_story_graph_schema_snapshot() {
    verify_schema("story_graph", StoryGraph::json_schema());
}

#[test]
fn test_documents_declare_schema_version() {
    for schema in [
        IrGraph::json_schema(),
        VisualGraph::json_schema(),
        StoryGraph::json_schema(),
    ] {
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("schemaVersion"));
    }
}
