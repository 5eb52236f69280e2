//! Word generation from iteration templates and containment checks.
//!
//! The test set is a star-only template: for each unroll count `i` from 1 to
//! the requested bound, every Kleene star in the template is expanded
//! exactly `i` times and the resulting word is checked against the language.

use ravel_objects::{AlgExpression, FiniteAutomaton, Node, Regex};

use crate::error::{InterpError, Result};

pub enum TestLanguage {
    Regex(Regex),
    Automaton(FiniteAutomaton),
}

#[derive(Debug, Clone)]
pub struct TestReport {
    pub results: Vec<(String, bool)>,
    pub accepted: usize,
    pub rejected: usize,
}

fn has_alternation(tree: &AlgExpression) -> bool {
    match tree.node() {
        Node::Alt(_, _) => true,
        Node::Conc(l, r) => has_alternation(l) || has_alternation(r),
        Node::Star(x) | Node::Negation(x) | Node::MemoryWriter(_, x) => has_alternation(x),
        Node::Eps | Node::Symb(_) | Node::Ref(_) => false,
    }
}

pub fn run_test(
    language: &TestLanguage,
    template: &Regex,
    iterations: u32,
) -> Result<TestReport> {
    if has_alternation(template.tree()) {
        return Err(InterpError::Parse(
            "the test template must be alternation-free".into(),
        ));
    }
    let machine = match language {
        TestLanguage::Regex(r) => r.to_glushkov(),
        TestLanguage::Automaton(fa) => fa.clone(),
    };
    let mut results = Vec::with_capacity(iterations as usize);
    let mut accepted = 0;
    let mut rejected = 0;
    for i in 1..=iterations {
        let word = template.tree().iterated_word(i as usize);
        let ok = machine.accepts(&word);
        if ok {
            accepted += 1;
        } else {
            rejected += 1;
        }
        results.push((word, ok));
    }
    Ok(TestReport {
        results,
        accepted,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_words_are_checked_against_the_language() {
        let language = TestLanguage::Regex(Regex::from_string("a*b").unwrap());
        let template = Regex::from_string("a*b").unwrap();
        let report = run_test(&language, &template, 4).unwrap();
        assert_eq!(report.accepted, 4);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.results[2].0, "aaab");
    }

    #[test]
    fn rejected_words_are_counted() {
        let language = TestLanguage::Regex(Regex::from_string("(ab)*").unwrap());
        let template = Regex::from_string("a*").unwrap();
        let report = run_test(&language, &template, 3).unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 3);
    }

    #[test]
    fn automata_languages_work_too() {
        let fa = Regex::from_string("a*b").unwrap().to_thompson();
        let report = run_test(
            &TestLanguage::Automaton(fa),
            &Regex::from_string("a*b").unwrap(),
            2,
        )
        .unwrap();
        assert_eq!(report.accepted, 2);
    }

    #[test]
    fn alternation_in_the_template_is_rejected() {
        let language = TestLanguage::Regex(Regex::from_string("a*").unwrap());
        let template = Regex::from_string("a|b").unwrap();
        assert!(run_test(&language, &template, 1).is_err());
    }
}
