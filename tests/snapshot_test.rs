use serde_json::json;
use stepwise::debugger::{DebuggerConfig, ScopeSnapshot, ScriptDebugger, SnapshotLimits};
use stepwise::interpreter::DisplayValue;

/// Runs `source` until its last line and snapshots the scope there.
fn snapshot_before_last_line(source: &str, limits: SnapshotLimits) -> ScopeSnapshot {
    let last_line = source.lines().count() as u32;
    let mut debugger =
        ScriptDebugger::new(DebuggerConfig::default().with_snapshot_limits(limits));
    debugger
        .toggle_breakpoint(last_line)
        .expect("lines start at 1");
    let state = debugger.start(source).expect("valid program");
    assert_eq!(state.active_line, last_line as i64);
    state.scope.expect("paused sessions have a scope")
}

fn placeholder(text: &str) -> DisplayValue {
    DisplayValue::Placeholder(text.into())
}

fn number(value: f64) -> DisplayValue {
    DisplayValue::Number(value)
}

#[test]
fn test_depth_limit() {
    let source = "let deep = [[[[1]]]];\nlet record = { a: { b: { c: 1 } } };\nconsole.log(0);";
    let limits = SnapshotLimits {
        max_depth: 2,
        ..SnapshotLimits::default()
    };
    let scope = snapshot_before_last_line(source, limits);
    assert_eq!(
        scope.get("deep"),
        Some(&DisplayValue::Array(vec![DisplayValue::Array(vec![
            placeholder("[Array]")
        ])]))
    );
    assert_eq!(
        scope.get("record"),
        Some(&DisplayValue::Object(vec![(
            "a".into(),
            DisplayValue::Object(vec![("b".into(), placeholder("[Object]"))])
        )]))
    );
}

#[test]
fn test_default_depth_shows_four_levels() {
    let source = "let deep = [[[[[1]]]]];\nconsole.log(0);";
    let scope = snapshot_before_last_line(source, SnapshotLimits::default());
    let json = serde_json::to_value(&scope).expect("snapshot serializes");
    assert_eq!(json, json!({ "deep": [[[["[Array]"]]]] }));
}

#[test]
fn test_item_limit() {
    let source = "let list = [1, 2, 3, 4, 5];\nlet record = { a: 1, b: 2, c: 3, d: 4 };\nconsole.log(0);";
    let limits = SnapshotLimits {
        max_items: 3,
        ..SnapshotLimits::default()
    };
    let scope = snapshot_before_last_line(source, limits);
    assert_eq!(
        scope.get("list"),
        Some(&DisplayValue::Array(vec![
            number(1.0),
            number(2.0),
            number(3.0),
            placeholder("... 2 more items"),
        ]))
    );
    assert_eq!(
        scope.get("record"),
        Some(&DisplayValue::Object(vec![
            ("a".into(), number(1.0)),
            ("b".into(), number(2.0)),
            ("c".into(), number(3.0)),
            ("...".into(), placeholder("... 1 more items")),
        ]))
    );
}

#[test]
fn test_node_limit() {
    let source = "let list = [1, 2, 3, 4, 5];\nlet after = 6;\nconsole.log(0);";
    let limits = SnapshotLimits {
        max_nodes: 4,
        ..SnapshotLimits::default()
    };
    let scope = snapshot_before_last_line(source, limits);
    assert_eq!(
        scope.get("list"),
        Some(&DisplayValue::Array(vec![
            number(1.0),
            number(2.0),
            number(3.0),
            placeholder("[...]"),
            placeholder("[...]"),
        ]))
    );
    assert_eq!(scope.get("after"), Some(&placeholder("[...]")));
}

#[test]
fn test_shared_values_are_not_circular() {
    let source = "let shared = [1];\nlet pair = [shared, shared];\nconsole.log(0);";
    let scope = snapshot_before_last_line(source, SnapshotLimits::default());
    let shared = DisplayValue::Array(vec![number(1.0)]);
    assert_eq!(
        scope.get("pair"),
        Some(&DisplayValue::Array(vec![shared.clone(), shared]))
    );
}

#[test]
fn test_function_placeholders() {
    let source = "\
function named() {}
let anonymous = function () {};
let log = console.log;
console.log(0);";
    let scope = snapshot_before_last_line(source, SnapshotLimits::default());
    assert_eq!(scope.get("named"), Some(&placeholder("[Function: named]")));
    assert_eq!(
        scope.get("anonymous"),
        Some(&placeholder("[Function (anonymous)]"))
    );
    assert_eq!(scope.get("log"), Some(&placeholder("[Function: log]")));
}

#[test]
fn test_json_rendering() {
    let source = "\
let nothing = undefined;
let empty = null;
let ratio = 1.5;
let odd = 0 / 0;
let text = \"quoted \\\"text\\\"\";
let flags = [true, false];
console.log(0);";
    let scope = snapshot_before_last_line(source, SnapshotLimits::default());
    assert_eq!(scope.names().collect::<Vec<_>>().len(), 6);
    let json = serde_json::to_string(&scope).expect("snapshot serializes");
    assert_eq!(
        json,
        r#"{"nothing":null,"empty":null,"ratio":1.5,"odd":null,"text":"quoted \"text\"","flags":[true,false]}"#
    );
}

#[test]
fn test_display_value_formatting() {
    let value = DisplayValue::Object(vec![
        ("name".into(), DisplayValue::String("ada".into())),
        (
            "scores".into(),
            DisplayValue::Array(vec![number(1.0), number(f64::NAN), number(2.5)]),
        ),
        ("next".into(), placeholder("[Circular]")),
    ]);
    assert_eq!(
        value.to_string(),
        r#"{ name: "ada", scores: [1, NaN, 2.5], next: [Circular] }"#
    );
}
