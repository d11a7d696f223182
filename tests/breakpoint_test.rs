use proptest::prelude::*;
use std::collections::HashMap;
use stepwise::debugger::{BreakpointStore, ScriptDebugger};

#[test]
fn test_toggle_twice_cancels_out() {
    let mut store = BreakpointStore::new();
    assert!(store.toggle(4));
    assert!(store.contains(4));
    assert!(!store.toggle(4));
    assert!(!store.contains(4));
    assert!(store.is_empty());
}

#[test]
fn test_lines_are_sorted() {
    let store: BreakpointStore = [9, 2, 5].into_iter().collect();
    assert_eq!(store.lines().collect::<Vec<_>>(), vec![2, 5, 9]);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_breakpoints_survive_stop_and_restart() {
    let mut debugger = ScriptDebugger::default();
    debugger.toggle_breakpoint(2).expect("valid line");
    debugger.start("let a = 1;\nlet b = 2;").expect("valid program");
    debugger.stop();
    assert!(debugger.has_breakpoint(2));
    let state = debugger.restart().expect("valid program");
    assert_eq!(state.active_line, 2);
    assert!(debugger.has_breakpoint(2));
}

proptest! {
    #[test]
    fn breakpoint_set_iff_toggled_odd_times(lines in prop::collection::vec(1u32..20, 0..64)) {
        let mut debugger = ScriptDebugger::default();
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for line in lines.iter().copied() {
            let is_set = debugger.toggle_breakpoint(line).expect("lines start at 1");
            let count = counts.entry(line).or_default();
            *count += 1;
            prop_assert_eq!(is_set, *count % 2 == 1);
        }
        for line in 1u32..20 {
            let count = counts.get(&line).copied().unwrap_or(0);
            prop_assert_eq!(debugger.has_breakpoint(line), count % 2 == 1);
        }
        prop_assert_eq!(
            debugger.breakpoints().len(),
            counts.values().filter(|count| *count % 2 == 1).count()
        );
    }

    #[test]
    fn toggles_do_not_disturb_a_paused_session(lines in prop::collection::vec(1u32..6, 0..16)) {
        let mut debugger = ScriptDebugger::default();
        debugger.toggle_breakpoint(3).expect("valid line");
        let source = "let a = 1;\nlet b = 2;\nlet c = 3;\nlet d = 4;\nlet e = 5;";
        let paused = debugger.start(source).expect("valid program");
        for line in lines {
            debugger.toggle_breakpoint(line).expect("valid line");
        }
        prop_assert_eq!(debugger.observable(), paused);
    }
}
