use serde_json::json;
use stepwise::debugger::{
    ControllerState, DebuggerConfig, DebuggerError, ObservableState, ScriptDebugger,
};
use stepwise::interpreter::DisplayValue;

const SCENARIO: &str = "let a=1;\nlet b=2;\nconsole.log(a+b);";

const COUNTING_LOOP: &str = "\
let total = 0;
for (let i = 0; i < 2; i = i + 1) {
  total = total + i;
}
console.log(total);";

fn debugger_with_breakpoints(lines: &[u32]) -> ScriptDebugger {
    let mut debugger = ScriptDebugger::default();
    for line in lines {
        assert!(debugger.toggle_breakpoint(*line).expect("lines start at 1"));
    }
    debugger
}

fn number(value: f64) -> DisplayValue {
    DisplayValue::Number(value)
}

fn string(value: &str) -> DisplayValue {
    DisplayValue::String(value.into())
}

fn scope_names(state: &ObservableState) -> Vec<&str> {
    state
        .scope
        .as_ref()
        .map(|scope| scope.names().collect())
        .unwrap_or_default()
}

#[test]
fn test_scenario() {
    let mut debugger = debugger_with_breakpoints(&[3]);

    let state = debugger.start(SCENARIO).expect("valid program");
    assert!(state.is_paused);
    assert!(!state.is_finished);
    assert_eq!(state.active_line, 3);
    let scope = state.scope.expect("paused sessions have a scope");
    assert_eq!(scope.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(scope.get("a"), Some(&number(1.0)));
    assert_eq!(scope.get("b"), Some(&number(2.0)));
    assert!(state.console_output.is_empty());
    assert_eq!(debugger.state(), ControllerState::Paused);

    let state = debugger.step().expect("paused");
    assert_eq!(state.console_output, vec!["3"]);
    assert!(!state.is_finished);

    let state = debugger.step().expect("paused");
    assert!(state.is_finished);
    assert!(state.is_paused);
    assert_eq!(state.active_line, -1);
    assert_eq!(state.console_output, vec!["3"]);
    assert_eq!(debugger.state(), ControllerState::Finished);
}

#[test]
fn test_scenario_as_json() {
    let mut debugger = debugger_with_breakpoints(&[3]);
    let state = debugger.start(SCENARIO).expect("valid program");
    let value = serde_json::to_value(&state).expect("state serializes");
    assert_eq!(
        value,
        json!({
            "isPaused": true,
            "isFinished": false,
            "activeLine": 3,
            "scope": { "a": 1, "b": 2 },
            "consoleOutput": [],
        })
    );
    assert_eq!(
        serde_json::to_value(debugger.stop()).expect("state serializes"),
        json!({
            "isPaused": false,
            "isFinished": false,
            "activeLine": -1,
            "scope": null,
            "consoleOutput": [],
        })
    );
}

#[test]
fn test_sequential_statements_finish_after_one_transition_each() {
    let source = "let a = 1;\nlet b = a + 1;\nlet c = b + 1;\nconsole.log(c);\nc = 0;";
    for _ in 0..3 {
        let mut debugger = ScriptDebugger::default();
        let state = debugger.start(source).expect("valid program");
        assert!(state.is_finished);
        assert_eq!(state.active_line, -1);
        assert_eq!(state.console_output, vec!["3"]);
        assert_eq!(debugger.line_transitions(), Some(5));
    }
}

#[test]
fn test_breakpoint_scope_excludes_later_bindings() {
    let source = "let a = 1;\nlet b = a + 1;\nlet c = b + 1;\nconsole.log(c);";
    let mut debugger = debugger_with_breakpoints(&[3]);
    let state = debugger.start(source).expect("valid program");
    assert_eq!(state.active_line, 3);
    assert_eq!(scope_names(&state), vec!["a", "b"]);
}

#[test]
fn test_breakpoint_on_first_line() {
    let mut debugger = debugger_with_breakpoints(&[1]);
    let state = debugger.start(SCENARIO).expect("valid program");
    assert!(state.is_paused);
    assert_eq!(state.active_line, 1);
    assert!(scope_names(&state).is_empty());
}

#[test]
fn test_step_advances_one_line_at_a_time() {
    let mut debugger = debugger_with_breakpoints(&[1]);
    let mut lines = vec![debugger.start(COUNTING_LOOP).expect("valid program").active_line];
    loop {
        let state = debugger.step().expect("paused");
        if state.is_finished {
            break;
        }
        lines.push(state.active_line);
    }
    assert_eq!(lines, vec![1, 2, 3, 2, 3, 2, 5, -1]);
    assert_eq!(debugger.observable().console_output, vec!["1"]);
}

#[test]
fn test_step_ignores_breakpoints() {
    let mut debugger = debugger_with_breakpoints(&[1, 3]);
    debugger.start(COUNTING_LOOP).expect("valid program");
    assert_eq!(debugger.step().expect("paused").active_line, 2);
    assert_eq!(debugger.step().expect("paused").active_line, 3);
    assert_eq!(debugger.step().expect("paused").active_line, 2);
}

#[test]
fn test_breakpoint_in_loop_pauses_every_iteration() {
    let mut debugger = debugger_with_breakpoints(&[3]);

    let state = debugger.start(COUNTING_LOOP).expect("valid program");
    assert_eq!(state.active_line, 3);
    let scope = state.scope.expect("paused");
    assert_eq!(scope.get("i"), Some(&number(0.0)));
    assert_eq!(scope.get("total"), Some(&number(0.0)));

    let state = debugger.continue_execution().expect("paused");
    assert_eq!(state.active_line, 3);
    assert_eq!(state.scope.expect("paused").get("i"), Some(&number(1.0)));

    let state = debugger.continue_execution().expect("paused");
    assert!(state.is_finished);
    assert_eq!(state.console_output, vec!["1"]);
}

#[test]
fn test_breakpoint_inside_function() {
    let source = "\
let x = \"global\";
function show(x) {
  let y = x;
  return y;
}
show(\"param\");";
    let mut debugger = debugger_with_breakpoints(&[4]);
    let state = debugger.start(source).expect("valid program");
    assert_eq!(state.active_line, 4);
    let scope = state.scope.expect("paused");
    assert_eq!(scope.names().collect::<Vec<_>>(), vec!["x", "y", "show"]);
    assert_eq!(scope.get("x"), Some(&string("param")));
    assert_eq!(scope.get("y"), Some(&string("param")));
    assert_eq!(
        scope.get("show"),
        Some(&DisplayValue::Placeholder("[Function: show]".into()))
    );
}

#[test]
fn test_breakpoint_toggled_while_paused() {
    let mut debugger = debugger_with_breakpoints(&[1]);
    debugger.start(SCENARIO).expect("valid program");
    assert!(debugger.toggle_breakpoint(3).expect("valid line"));
    let state = debugger.continue_execution().expect("paused");
    assert_eq!(state.active_line, 3);

    assert!(!debugger.toggle_breakpoint(3).expect("valid line"));
    assert!(!debugger.has_breakpoint(3));
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let source = "let n = 0;\nwhile (true) {\n  n = n + 1;\n}";
    let mut debugger = ScriptDebugger::default();
    let state = debugger.start(source).expect("valid program");
    assert!(state.is_finished);
    assert!(state.is_paused);
    assert_eq!(
        state.console_output.last().map(String::as_str),
        Some("WARNING: execution halted after 50000 steps (possible infinite loop)")
    );
    assert!(matches!(
        state.scope.expect("finished").get("n"),
        Some(DisplayValue::Number(n)) if *n > 0.0
    ));
    assert_eq!(debugger.total_steps(), Some(50_001));
    assert_eq!(debugger.fault(), None);
}

#[test]
fn test_step_limit_is_configurable() {
    let source = "let n = 0;\nwhile (n < 100) {\n  n = n + 1;\n}\nconsole.log(n);";
    let config = DebuggerConfig::default().with_step_limit(200);

    let mut debugger = ScriptDebugger::new(config);
    assert_eq!(debugger.config().step_limit, 200);
    let state = debugger.start(source).expect("valid program");
    assert!(state.is_finished);
    assert_eq!(
        state.console_output,
        vec!["WARNING: execution halted after 200 steps (possible infinite loop)"]
    );
    assert_eq!(debugger.total_steps(), Some(201));
}

#[test]
fn test_step_limit_counts_across_pauses() {
    let source = "let n = 0;\nwhile (n < 100) {\n  n = n + 1;\n}\nconsole.log(n);";
    let config = DebuggerConfig::default().with_step_limit(200);
    let mut debugger = ScriptDebugger::new(config);
    debugger.toggle_breakpoint(3).expect("valid line");

    let mut state = debugger.start(source).expect("valid program");
    let mut pauses = 0;
    while !state.is_finished {
        pauses += 1;
        state = debugger.continue_execution().expect("paused");
    }
    assert!(pauses > 1);
    assert_eq!(
        state.console_output,
        vec!["WARNING: execution halted after 200 steps (possible infinite loop)"]
    );
    assert_eq!(debugger.total_steps(), Some(201));
    assert!(matches!(
        state.scope.expect("finished").get("n"),
        Some(DisplayValue::Number(n)) if *n < 100.0
    ));
}

#[test]
fn test_breakpoint_in_infinite_loop_still_finishes() {
    let source = "let n = 0;\nwhile (true) {\n  n = n + 1;\n}";
    let config = DebuggerConfig::default().with_step_limit(200);
    let mut debugger = ScriptDebugger::new(config);
    debugger.toggle_breakpoint(3).expect("valid line");

    let mut state = debugger.start(source).expect("valid program");
    for _ in 0..1_000 {
        if state.is_finished {
            break;
        }
        state = debugger.continue_execution().expect("paused");
    }
    assert!(state.is_finished);
    assert_eq!(debugger.state(), ControllerState::Finished);
    assert_eq!(
        state.console_output.last().map(String::as_str),
        Some("WARNING: execution halted after 200 steps (possible infinite loop)")
    );
}

#[test]
fn test_program_may_use_its_whole_step_limit() {
    let source = "let a = 1;\nlet b = a + 1;\nconsole.log(b);";
    let mut debugger = ScriptDebugger::default();
    debugger.start(source).expect("valid program");
    let needed = debugger.total_steps().expect("session");

    // The final unit only halts the machine, so the program fits in one less.
    let config = DebuggerConfig::default().with_step_limit(needed - 1);
    let state = ScriptDebugger::new(config)
        .start(source)
        .expect("valid program");
    assert_eq!(state.console_output, vec!["2"]);

    let limit = needed - 2;
    let config = DebuggerConfig::default().with_step_limit(limit);
    let state = ScriptDebugger::new(config)
        .start(source)
        .expect("valid program");
    assert!(state.is_finished);
    let warning = format!("WARNING: execution halted after {limit} steps (possible infinite loop)");
    assert_eq!(state.console_output.last(), Some(&warning));
}

#[test]
fn test_restart_uses_edited_source_and_keeps_breakpoints() {
    let mut debugger = debugger_with_breakpoints(&[2]);
    let state = debugger
        .start("console.log(1);\nconsole.log(2);")
        .expect("valid program");
    assert_eq!(state.console_output, vec!["1"]);

    debugger.set_source("let x = 5;\nconsole.log(x);");
    // The live session keeps its own source.
    let state = debugger.step().expect("paused");
    assert_eq!(state.console_output, vec!["1", "2"]);

    let state = debugger.restart().expect("valid program");
    assert!(debugger.has_breakpoint(2));
    assert_eq!(state.active_line, 2);
    assert!(state.console_output.is_empty());
    let scope = state.scope.expect("paused");
    assert_eq!(scope.names().collect::<Vec<_>>(), vec!["x"]);
    assert_eq!(debugger.source(), Some("let x = 5;\nconsole.log(x);"));
}

#[test]
fn test_restart_after_finish() {
    let mut debugger = ScriptDebugger::default();
    let state = debugger.start(SCENARIO).expect("valid program");
    assert!(state.is_finished);
    let state = debugger.restart().expect("valid program");
    assert!(state.is_finished);
    assert_eq!(state.console_output, vec!["3"]);
}

#[test]
fn test_stop_resets_from_any_state() {
    let mut debugger = debugger_with_breakpoints(&[2]);
    debugger.start(SCENARIO).expect("valid program");
    assert_eq!(debugger.state(), ControllerState::Paused);
    assert_eq!(debugger.stop(), ObservableState::default());
    assert_eq!(debugger.observable(), ObservableState::default());
    assert_eq!(debugger.state(), ControllerState::Idle);

    let mut debugger = ScriptDebugger::default();
    debugger.start(SCENARIO).expect("valid program");
    assert_eq!(debugger.state(), ControllerState::Finished);
    assert_eq!(debugger.stop(), ObservableState::default());

    // Also fine with nothing running.
    assert_eq!(debugger.stop(), ObservableState::default());
    assert_eq!(debugger.total_steps(), None);
}

#[test]
fn test_invalid_operations_leave_state_untouched() {
    let mut debugger = ScriptDebugger::default();
    assert_eq!(
        debugger.step(),
        Err(DebuggerError::InvalidOperation {
            operation: "step",
            state: ControllerState::Idle,
        })
    );
    assert_eq!(
        debugger.restart(),
        Err(DebuggerError::InvalidOperation {
            operation: "restart",
            state: ControllerState::Idle,
        })
    );
    assert_eq!(
        debugger.toggle_breakpoint(0),
        Err(DebuggerError::InvalidBreakpointLine(0))
    );

    let finished = debugger.start(SCENARIO).expect("valid program");
    assert_eq!(
        debugger.continue_execution(),
        Err(DebuggerError::InvalidOperation {
            operation: "continue",
            state: ControllerState::Finished,
        })
    );
    assert_eq!(debugger.observable(), finished);
}

#[test]
fn test_runtime_fault_finishes_session() {
    let source = "let a = 1;\nnull.x;\nlet b = 2;";
    let mut debugger = ScriptDebugger::default();
    let state = debugger.start(source).expect("valid program");
    assert!(state.is_finished);
    assert!(state.is_paused);
    assert_eq!(state.active_line, 2);
    assert_eq!(
        state.console_output,
        vec!["ERROR: TypeError: Cannot read properties of null (reading 'x')"]
    );
    assert_eq!(scope_names(&state), vec!["a"]);
    assert_eq!(debugger.state(), ControllerState::Finished);
    assert!(debugger.fault().is_some());
    assert!(debugger.step().is_err());
}

#[test]
fn test_runtime_fault_while_stepping() {
    let source = "let f = 1;\nf();";
    let mut debugger = debugger_with_breakpoints(&[2]);
    debugger.start(source).expect("valid program");
    let state = debugger.step().expect("paused");
    assert!(state.is_finished);
    assert_eq!(state.active_line, 2);
    assert_eq!(
        state.console_output,
        vec!["ERROR: TypeError: 1 is not a function"]
    );
}

#[test]
fn test_initialization_error_keeps_controller_idle() {
    let mut debugger = debugger_with_breakpoints(&[1]);
    let error = debugger.start("let = 1;").expect_err("malformed program");
    let DebuggerError::Initialization(error) = error else {
        panic!("expected an initialization error, got {error:?}");
    };
    assert_eq!(error.line, 1);
    assert_eq!(error.code, "SE001");
    assert_eq!(
        error.to_string(),
        "[line 1] SyntaxError: Unexpected token `=`, expected identifier"
    );
    assert_eq!(debugger.state(), ControllerState::Idle);
    assert_eq!(debugger.observable(), ObservableState::default());
    assert!(debugger.interpreter().is_none());
    assert!(debugger.has_breakpoint(1));
}

#[test]
fn test_start_replaces_running_session() {
    let mut debugger = debugger_with_breakpoints(&[2]);
    debugger
        .start("console.log(\"first\");\nconsole.log(1);")
        .expect("valid program");
    let state = debugger
        .start("let only = true;\nconsole.log(only);")
        .expect("valid program");
    assert!(state.console_output.is_empty());
    assert_eq!(scope_names(&state), vec!["only"]);
}

#[test]
fn test_cyclic_values_in_scope() {
    let source = "\
let a = [];
a.push(a);
let o = { name: \"node\" };
o.self = o;
console.log(\"done\");";
    let mut debugger = debugger_with_breakpoints(&[5]);
    let state = debugger.start(source).expect("valid program");
    let scope = state.scope.expect("paused");
    assert_eq!(
        scope.get("a"),
        Some(&DisplayValue::Array(vec![DisplayValue::Placeholder(
            "[Circular]".into()
        )]))
    );
    assert_eq!(
        scope.get("o"),
        Some(&DisplayValue::Object(vec![
            ("name".into(), string("node")),
            ("self".into(), DisplayValue::Placeholder("[Circular]".into())),
        ]))
    );
}

#[test]
fn test_snapshot_is_detached_from_interpreter() {
    let source = "let list = [1];\nlist.push(2);\nconsole.log(list);";
    let mut debugger = debugger_with_breakpoints(&[2]);
    let paused = debugger.start(source).expect("valid program");
    let before = paused.scope.expect("paused");
    let state = debugger.step().expect("paused");

    assert_eq!(before.get("list"), Some(&DisplayValue::Array(vec![number(1.0)])));
    assert_eq!(
        state.scope.expect("paused").get("list"),
        Some(&DisplayValue::Array(vec![number(1.0), number(2.0)]))
    );
}
