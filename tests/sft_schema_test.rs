use clinical_notes::pipeline::to_example;
use clinical_notes::{convert, JoinStyle, NoteRecord};
use jsonschema::JSONSchema;
use serde_json::json;
use tempfile::tempdir;

fn compiled_schema() -> JSONSchema {
    let schema = include_str!("../schemas/sft_example.v1.json");
    let schema_json: serde_json::Value = serde_json::from_str(schema).unwrap();
    let schema_static: &'static serde_json::Value = Box::leak(Box::new(schema_json));
    JSONSchema::options().compile(schema_static).unwrap()
}

#[test]
fn converter_output_is_valid_in_both_styles() {
    let compiled = compiled_schema();
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("x.csv");
    std::fs::write(
        &csv_path,
        "note_id,input,target\nn1,\"Chief Complaint:\nfever\",\"Admitted, treated.\"\nn2,hello,world\n",
    )
    .unwrap();

    for style in [JoinStyle::Plain, JoinStyle::ChatMl] {
        let out_path = dir.path().join(format!("{style}.jsonl"));
        convert(&csv_path, &out_path, None, style).unwrap();
        for line in std::fs::read_to_string(&out_path).unwrap().lines() {
            let instance: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(compiled.is_valid(&instance), "{style}: {line}");
        }
    }
}

#[test]
fn serialized_example_is_valid() {
    let compiled = compiled_schema();
    let note = NoteRecord::new("10000032-DS-21", "Chief Complaint:\nascites", "Paracentesis done.");
    let example = to_example(&note, JoinStyle::Plain, "physionet/mimic-iv-bhc");
    let instance = serde_json::to_value(&example).unwrap();
    assert!(compiled.is_valid(&instance));
}

#[test]
fn missing_meta_source_is_rejected() {
    let compiled = compiled_schema();
    let instance = json!({
        "id": "n1",
        "text": "Instruction:\nhello\n\nResponse:\nworld\n",
        "meta": {}
    });
    assert!(!compiled.is_valid(&instance), "meta.source is required");
}

#[test]
fn unframed_text_is_rejected() {
    let compiled = compiled_schema();
    let instance = json!({
        "id": "n1",
        "text": "hello world",
        "meta": { "source": "physionet/mimic-iv-bhc" }
    });
    assert!(!compiled.is_valid(&instance));
}
