//! The transformation monoid of an automaton.
//!
//! Words are explored in shortlex order starting from the empty word (the
//! identity transformation). A term keeps its state-image vector over the
//! totalized deterministic automaton; two terms are equivalent iff the
//! vectors agree on every state. A word whose vector duplicates an earlier
//! term is not extended further and instead records a rewriting rule mapping
//! it to the shorter canonical representative.

use indexmap::IndexMap;

use crate::error::{ObjectError, Result, MONOID_TERM_LIMIT};
use crate::fa::FiniteAutomaton;
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub word: Vec<Symbol>,
    /// `image[s]` is the state reached from `s` by reading the word.
    pub image: Vec<usize>,
    /// whether the word itself belongs to the language
    pub is_final: bool,
}

/// The language-level facts of a monoid, cacheable independently of any
/// particular automaton instance.
#[derive(Clone, Debug)]
pub struct MonoidFacts {
    pub terms: Vec<Term>,
    /// rewriting rules: longer word → canonical representative
    pub rules: Vec<(Vec<Symbol>, Vec<Symbol>)>,
}

pub struct TransformationMonoid {
    dfa: FiniteAutomaton,
    facts: MonoidFacts,
}

fn render_word(word: &[Symbol]) -> String {
    if word.is_empty() {
        "ε".to_string()
    } else {
        word.iter().map(|s| s.to_string()).collect()
    }
}

impl TransformationMonoid {
    /// Monoid of the automaton as given (totalized and determinized first).
    pub fn new(fa: &FiniteAutomaton) -> Result<Self> {
        let dfa = fa.determinize(false)?;
        let facts = build_facts(&dfa)?;
        Ok(TransformationMonoid { dfa, facts })
    }

    /// The syntactic monoid of the language: built over the totalized
    /// minimal DFA and cached in the language.
    pub fn for_language(fa: &FiniteAutomaton) -> Result<Self> {
        let dfa = fa.minimize()?.add_trap_state();
        if let Some(facts) = fa.language().syntactic_monoid() {
            return Ok(TransformationMonoid {
                dfa,
                facts: facts.clone(),
            });
        }
        let facts = build_facts(&dfa)?;
        fa.language().set_syntactic_monoid(facts.clone());
        Ok(TransformationMonoid { dfa, facts })
    }

    pub fn terms(&self) -> &[Term] {
        &self.facts.terms
    }

    pub fn rewriting_rules(&self) -> &[(Vec<Symbol>, Vec<Symbol>)] {
        &self.facts.rules
    }

    /// Number of equivalence classes (distinct transformations, identity
    /// included).
    pub fn class_card(&self) -> usize {
        self.facts.terms.len()
    }

    /// Length of the longest canonical representative.
    pub fn class_length(&self) -> usize {
        self.facts
            .terms
            .iter()
            .map(|t| t.word.len())
            .max()
            .unwrap_or(0)
    }

    /// The state every term image collapses to, when it collapses.
    pub fn is_synchronized(term: &Term) -> Option<usize> {
        let first = *term.image.first()?;
        term.image.iter().all(|&s| s == first).then_some(first)
    }

    /// Myhill-Nerode class count: distinct landing states from the initial
    /// state, over all terms.
    pub fn classes_number_myhill_nerode(&self) -> usize {
        let initial = self.dfa.initial();
        let mut landings: Vec<usize> = self
            .facts
            .terms
            .iter()
            .map(|t| t.image[initial])
            .collect();
        landings.sort_unstable();
        landings.dedup();
        landings.len()
    }

    /// The automaton is minimal iff its state count matches the
    /// Myhill-Nerode class count.
    pub fn is_minimal(&self) -> bool {
        self.classes_number_myhill_nerode() == self.dfa.states_number()
    }

    /// The Myhill-Nerode table: one row per term (representative word),
    /// one column per state, cells holding the landing state.
    pub fn myhill_nerode_table(&self) -> (Vec<String>, Vec<Vec<usize>>) {
        let rows = self
            .facts
            .terms
            .iter()
            .map(|t| render_word(&t.word))
            .collect();
        let cells = self.facts.terms.iter().map(|t| t.image.clone()).collect();
        (rows, cells)
    }

    /// Text dump of classes and rules for the log sinks.
    pub fn to_table_text(&self) -> String {
        let mut out = String::new();
        for term in &self.facts.terms {
            out.push_str(&format!(
                "{}: [{}]{}\n",
                render_word(&term.word),
                term.image
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
                if term.is_final { " ∈ L" } else { "" }
            ));
        }
        for (from, to) in &self.facts.rules {
            out.push_str(&format!(
                "{} -> {}\n",
                render_word(from),
                render_word(to)
            ));
        }
        out
    }
}

fn build_facts(dfa: &FiniteAutomaton) -> Result<MonoidFacts> {
    let n = dfa.states_number();
    let alphabet: Vec<Symbol> = dfa.alphabet().iter().copied().collect();
    let accepting: Vec<bool> = dfa.states().iter().map(|s| s.is_terminal).collect();

    let identity: Vec<usize> = (0..n).collect();
    let mut by_image: IndexMap<Vec<usize>, usize> = IndexMap::new();
    let mut terms = vec![Term {
        word: Vec::new(),
        image: identity.clone(),
        is_final: accepting[dfa.initial()],
    }];
    by_image.insert(identity, 0);
    let mut rules = Vec::new();

    let mut cursor = 0;
    while cursor < terms.len() {
        let base = terms[cursor].clone();
        for symbol in &alphabet {
            let mut word = base.word.clone();
            word.push(*symbol);
            let image: Vec<usize> = base
                .image
                .iter()
                .map(|&s| dfa.sole_target(s, symbol))
                .collect();
            match by_image.get(&image) {
                Some(&existing) => {
                    rules.push((word, terms[existing].word.clone()));
                }
                None => {
                    if terms.len() >= MONOID_TERM_LIMIT {
                        return Err(ObjectError::MonoidLimit {
                            limit: MONOID_TERM_LIMIT,
                        });
                    }
                    by_image.insert(image.clone(), terms.len());
                    terms.push(Term {
                        is_final: accepting[image[dfa.initial()]],
                        word,
                        image,
                    });
                }
            }
        }
        cursor += 1;
    }
    Ok(MonoidFacts { terms, rules })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;

    fn monoid(input: &str) -> TransformationMonoid {
        let fa = Regex::from_string(input).unwrap().to_glushkov();
        TransformationMonoid::for_language(&fa).unwrap()
    }

    #[test]
    fn identity_is_the_first_term() {
        let m = monoid("a*b");
        let first = &m.terms()[0];
        assert!(first.word.is_empty());
        assert_eq!(first.image, (0..m.dfa.states_number()).collect::<Vec<_>>());
    }

    #[test]
    fn syntactic_monoid_of_a_star_b() {
        // totalized minimal DFA has 3 states; the transformations are
        // ε, a, b and the constant map of ba
        let m = monoid("a*b");
        assert_eq!(m.class_card(), 4);
        assert_eq!(m.classes_number_myhill_nerode(), 3);
        assert!(m.is_minimal());
    }

    #[test]
    fn mn_class_count_matches_the_minimal_dfa() {
        for input in ["(a|b)*abb", "(a|b)*", "a|b"] {
            let fa = Regex::from_string(input).unwrap().to_glushkov();
            let total_min = fa.minimize().unwrap().add_trap_state();
            let m = TransformationMonoid::for_language(&fa).unwrap();
            assert_eq!(
                m.classes_number_myhill_nerode(),
                total_min.states_number(),
                "for {}",
                input
            );
        }
    }

    #[test]
    fn rewriting_rules_point_at_shorter_words() {
        let m = monoid("a*b");
        assert!(!m.rewriting_rules().is_empty());
        for (from, to) in m.rewriting_rules() {
            assert!(to.len() <= from.len());
        }
    }

    #[test]
    fn synchronization_detects_constant_maps() {
        let m = monoid("a*b");
        let constant = m
            .terms()
            .iter()
            .find(|t| TransformationMonoid::is_synchronized(t).is_some());
        assert!(constant.is_some(), "ba maps every state to the trap");
    }

    #[test]
    fn facts_are_cached_per_language() {
        let fa = Regex::from_string("a*b").unwrap().to_glushkov();
        assert!(fa.language().syntactic_monoid().is_none());
        TransformationMonoid::for_language(&fa).unwrap();
        assert!(fa.language().syntactic_monoid().is_some());
    }
}
