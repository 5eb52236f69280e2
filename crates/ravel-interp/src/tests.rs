//! End-to-end interpreter scenarios.

use crate::logger::{LogEvent, LogMode};
use crate::typing::GeneralObject;
use crate::Interpreter;

fn run(lines: &[&str]) -> Interpreter {
    let mut interpreter = Interpreter::new(LogMode::All);
    for (i, line) in lines.iter().enumerate() {
        interpreter
            .run_line(line, i + 1)
            .unwrap_or_else(|e| panic!("{}", e));
    }
    interpreter
}

fn last_predicate_message(interpreter: &Interpreter) -> String {
    interpreter
        .logger()
        .history()
        .iter()
        .rev()
        .find_map(|(_, event)| match event {
            LogEvent::Message(text) => Some(text.clone()),
            _ => None,
        })
        .expect("a predicate message")
}

#[test]
fn s1_thompson_vs_determinized_thompson() {
    let mut interpreter = run(&["A = Thompson a|b", "B = Determinize.Thompson a|b"]);
    interpreter.run_line("Equiv A B", 3).unwrap();
    assert_eq!(last_predicate_message(&interpreter), "Equiv: true");
    interpreter.run_line("Equal A B", 4).unwrap();
    assert_eq!(last_predicate_message(&interpreter), "Equal: false");
}

#[test]
fn s2_minimized_glushkov_has_four_states() {
    let mut interpreter = run(&["C = Minimize.Glushkov (a|b)*abb", "N = States C"]);
    let Some(GeneralObject::Int(states)) = interpreter.object("N") else {
        panic!("N must be an Int");
    };
    assert_eq!(*states, 4);
    interpreter.run_line("Minimal C", 3).unwrap();
    assert_eq!(last_predicate_message(&interpreter), "Minimal: true");
}

#[test]
fn s3_antimirov_membership() {
    let interpreter = run(&["D = Antimirov a*b"]);
    let Some(GeneralObject::Nfa(fa)) = interpreter.object("D") else {
        panic!("D must be an NFA");
    };
    let verdicts: Vec<bool> = ["b", "ab", "aab", "ba"]
        .iter()
        .map(|w| fa.accepts(w))
        .collect();
    assert_eq!(verdicts, vec![true, true, true, false]);
}

#[test]
fn s4_pump_lengths() {
    let interpreter = run(&["P = PumpLength (a|b)*", "Q = PumpLength a*b"]);
    let Some(GeneralObject::Int(p)) = interpreter.object("P") else {
        panic!("P must be an Int");
    };
    let Some(GeneralObject::Int(q)) = interpreter.object("Q") else {
        panic!("Q must be an Int");
    };
    assert_eq!((*p, *q), (1, 2));
}

#[test]
fn s5_deannote_undoes_annote() {
    let mut interpreter = run(&[
        "N = Glushkov (a|b)*ab",
        "M = DeAnnote.Annote N",
    ]);
    interpreter.run_line("Equal M N", 3).unwrap();
    assert_eq!(last_predicate_message(&interpreter), "Equal: true");
}

#[test]
fn s6_ambiguity_classification() {
    let interpreter = run(&[
        "X = Ambiguity.Thompson (a|a)*",
        "Y = Ambiguity.Thompson a*",
    ]);
    let Some(GeneralObject::Value(x)) = interpreter.object("X") else {
        panic!("X must be a Value");
    };
    let Some(GeneralObject::Value(y)) = interpreter.object("Y") else {
        panic!("Y must be a Value");
    };
    assert_eq!(x, "exponentially ambiguous");
    assert_eq!(y, "unambiguous");
}

#[test]
fn reassignment_replaces_the_binding() {
    let interpreter = run(&["A = Thompson ab", "A = PumpLength ab"]);
    assert!(matches!(
        interpreter.object("A"),
        Some(GeneralObject::Int(_))
    ));
}

#[test]
fn failed_lines_do_not_stop_the_run() {
    let mut interpreter = Interpreter::new(LogMode::Nothing);
    assert!(interpreter.run_line("A = Determinize a|b", 1).is_err());
    assert!(interpreter.run_line("B = Thompson a|b", 2).is_ok());
    assert!(interpreter.had_error());
    assert!(interpreter.object("A").is_none());
    assert!(interpreter.object("B").is_some());
}

#[test]
fn test_operation_reports_membership() {
    let mut interpreter = run(&["L = Glushkov a*b"]);
    interpreter.run_line("Test L a*b 3", 2).unwrap();
    let report = interpreter
        .logger()
        .history()
        .iter()
        .find_map(|(_, event)| match event {
            LogEvent::TestReport { accepted, rejected } => Some((*accepted, *rejected)),
            _ => None,
        })
        .expect("a test report");
    assert_eq!(report, (3, 0));
}

#[test]
fn verbose_flag_unlocks_detail_events() {
    let quiet = run(&["A = Minimize.Glushkov (a|b)*abb"]);
    assert!(!quiet
        .logger()
        .history()
        .iter()
        .any(|(_, e)| matches!(e, LogEvent::Table { .. })));

    let verbose = run(&["A = Minimize.Glushkov (a|b)*abb !!"]);
    assert!(verbose
        .logger()
        .history()
        .iter()
        .any(|(_, e)| matches!(e, LogEvent::Table { .. })));
}

#[test]
fn normalize_reads_a_rule_file() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.txt");
    std::fs::write(&rules, "# collapse\nab => c\n").unwrap();
    let mut interpreter = Interpreter::new(LogMode::Nothing);
    let line = format!("R = Normalize ab|d {}", rules.display());
    interpreter.run_line(&line, 1).unwrap();
    let Some(GeneralObject::Regex(r)) = interpreter.object("R") else {
        panic!("R must be a regex");
    };
    assert_eq!(r.to_string(), "c|d");
}
