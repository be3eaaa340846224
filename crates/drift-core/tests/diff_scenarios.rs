//! End-to-end diff scenarios over hand-built live column lists.

use drift_core::{
    compute_changes, ColumnSnapshot, DriftError, Field, ModelSchema, SchemaChange, SqlValue,
};

fn giraffe(name_field: &str) -> ModelSchema {
    let mut schema = ModelSchema::new("Giraffe", None).unwrap();
    schema
        .add_field("id", Field::integer().primary_key())
        .unwrap()
        .add_field(name_field, Field::string().min_length(0).max_length(10))
        .unwrap()
        .add_field("date", Field::date())
        .unwrap();
    schema
}

/// Applies a plan to a list of live columns the way a store would.
fn apply(schema: &ModelSchema, live: &[ColumnSnapshot]) -> Vec<ColumnSnapshot> {
    let plan = compute_changes(schema, live).unwrap();
    if plan.is_create() {
        return plan
            .create
            .iter()
            .map(|f| f.to_column_schema(f.name()))
            .collect();
    }

    let mut columns = live.to_vec();
    for change in &plan.alter {
        match change {
            SchemaChange::Drop { name } => columns.retain(|c| &c.name != name),
            SchemaChange::Rename { old_name, new_name } => {
                for column in columns.iter_mut().filter(|c| &c.name == old_name) {
                    column.name.clone_from(new_name);
                }
            }
            SchemaChange::Alter(changes) => {
                let field = schema.field(&changes.name).unwrap();
                for column in columns.iter_mut().filter(|c| c.name == changes.name) {
                    *column = field.to_column_schema(&changes.name);
                }
            }
            SchemaChange::Add(field) => columns.push(field.to_column_schema(field.name())),
            SchemaChange::Create { .. } => unreachable!("alter list never holds a create"),
        }
    }
    columns
}

#[test]
fn test_new_table_is_created_with_declared_fields() {
    let plan = compute_changes(&giraffe("name"), &[]).unwrap();

    let names: Vec<&str> = plan.create.iter().map(Field::name).collect();
    assert_eq!(names, ["id", "name", "date"]);
    assert!(plan.alter.is_empty());

    let json = serde_json::to_value(plan.changes()).unwrap();
    assert_eq!(json[0]["mode"], "create");
    assert_eq!(json[0]["fields"][1]["type"], "VARCHAR(10)");
}

#[test]
fn test_undeclared_live_column_is_dropped() {
    let schema = giraffe("name");
    let mut live = schema.column_snapshots();
    live.push(ColumnSnapshot {
        ordinal: 3,
        name: "legacy".to_string(),
        sql_type: "VARCHAR(5)".to_string(),
        not_null: false,
        default_value: None,
        primary_key: false,
    });

    let plan = compute_changes(&schema, &live).unwrap();
    let json = serde_json::to_value(&plan.alter).unwrap();
    assert_eq!(json, serde_json::json!([{"mode": "drop", "name": "legacy"}]));
}

#[test]
fn test_renamed_field_is_detected() {
    let live = giraffe("name").column_snapshots();
    let plan = compute_changes(&giraffe("nickname"), &live).unwrap();

    let json = serde_json::to_value(&plan.alter).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{"mode": "rename", "old_name": "name", "new_name": "nickname"}])
    );
}

#[test]
fn test_two_primary_keys_fail_validation() {
    let mut schema = ModelSchema::new("Broken", None).unwrap();
    schema
        .add_field("a", Field::integer().primary_key())
        .unwrap()
        .add_field("b", Field::integer().primary_key())
        .unwrap();

    assert!(matches!(schema.create_plan(), Err(DriftError::Validation(_))));
}

#[test]
fn test_migrated_table_diffs_empty() {
    let before = giraffe("name");

    let mut after = ModelSchema::new("Giraffe", None).unwrap();
    after
        .add_field("id", Field::integer().primary_key())
        .unwrap()
        .add_field("nickname", Field::string().min_length(0).max_length(10))
        .unwrap()
        .add_field("height", Field::float().not_null().default(4.5))
        .unwrap()
        .add_field("date", Field::date().not_null())
        .unwrap();

    let mut live = apply(&before, &[]);
    live.push(ColumnSnapshot {
        ordinal: 3,
        name: "spots".to_string(),
        sql_type: "INTEGER".to_string(),
        not_null: true,
        default_value: Some("0".to_string()),
        primary_key: false,
    });

    let live = apply(&after, &live);
    let plan = compute_changes(&after, &live).unwrap();
    assert!(plan.is_empty(), "expected empty plan, got {plan:?}");

    let names: Vec<&str> = live.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "nickname", "date", "height"]);
}

#[test]
fn test_field_validation_bounds() {
    let field = Field::string().min_length(2).max_length(4).build().unwrap();
    for len in 2..=4 {
        assert_eq!(field.validate(&SqlValue::Text("x".repeat(len))), Ok(()));
    }
    assert!(field.validate(&SqlValue::Text("x".repeat(5))).is_err());
    assert!(field.validate(&SqlValue::Text("x".to_string())).is_err());
}
