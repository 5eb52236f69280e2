//! Regular expressions over the plain algebra (no negation, no memory).
//!
//! A `Regex` owns its syntax tree and a shared handle to its language.
//! Automata built from it keep the same handle, so facts computed through
//! any of them land in one cache.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::alg_expression::{AlgExpression, Node, ParseFeatures};
use crate::error::{ObjectError, Result};
use crate::fa::{FiniteAutomaton, State};
use crate::language::Language;
use crate::symbol::Symbol;

const REWRITE_PASS_LIMIT: usize = 64;

#[derive(Clone, Debug)]
pub struct Regex {
    tree: AlgExpression,
    language: Rc<Language>,
}

/// One `lhs => rhs` line of a normalization rule file.
#[derive(Clone, Debug)]
pub struct RewriteRule {
    pub from: AlgExpression,
    pub to: AlgExpression,
}

/// Loads normalization rules: one rule per line, `lhs => rhs`, both sides
/// plain regexes; empty lines and `#` comments are skipped.
pub fn load_rewrite_rules(path: &Path) -> Result<Vec<RewriteRule>> {
    let text = std::fs::read_to_string(path).map_err(|source| ObjectError::RuleFile {
        path: path.display().to_string(),
        source,
    })?;
    let mut rules = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (lhs, rhs) = line
            .split_once("=>")
            .ok_or(ObjectError::RuleSyntax { line: i + 1 })?;
        let from = AlgExpression::parse(lhs.trim(), ParseFeatures::default())
            .map_err(|_| ObjectError::RuleSyntax { line: i + 1 })?;
        let to = AlgExpression::parse(rhs.trim(), ParseFeatures::default())
            .map_err(|_| ObjectError::RuleSyntax { line: i + 1 })?;
        rules.push(RewriteRule { from, to });
    }
    Ok(rules)
}

impl Regex {
    pub fn from_string(input: &str) -> Result<Regex> {
        let tree = AlgExpression::parse(input, ParseFeatures::default())?;
        Ok(Regex::from_tree(tree))
    }

    pub fn from_tree(tree: AlgExpression) -> Regex {
        let language = Language::new(tree.alphabet().clone());
        Regex { tree, language }
    }

    pub(crate) fn with_language(tree: AlgExpression, language: Rc<Language>) -> Regex {
        Regex { tree, language }
    }

    pub fn tree(&self) -> &AlgExpression {
        &self.tree
    }

    pub fn language(&self) -> &Rc<Language> {
        &self.language
    }

    pub fn contains_eps(&self) -> bool {
        self.tree.contains_eps()
    }

    pub fn linearize(&self) -> Regex {
        Regex::from_tree(self.tree.linearize())
    }

    pub fn delinearize(&self) -> Regex {
        Regex::from_tree(self.tree.delinearize())
    }

    pub fn deannote(&self) -> Regex {
        Regex::from_tree(self.tree.deannote())
    }

    pub fn simplify(&self) -> Regex {
        Regex::from_tree(self.tree.simplified())
    }

    /// Brzozowski derivative with respect to one symbol. `None` is the empty
    /// language.
    pub fn derivative(&self, symbol: &Symbol) -> Option<Regex> {
        derive(&self.tree, symbol).map(Regex::from_tree)
    }

    /// Derivative with respect to a prefix of plain letters.
    pub fn prefix_derivative(&self, prefix: &str) -> Option<Regex> {
        let mut tree = self.tree.clone();
        for c in prefix.chars() {
            tree = derive(&tree, &Symbol::sym(c))?;
        }
        Some(Regex::from_tree(tree))
    }

    /// Thompson construction: an ε-NFA mirroring the tree structure.
    pub fn to_thompson(&self) -> FiniteAutomaton {
        let mut states: Vec<State> = Vec::new();
        let (start, end) = thompson_fragment(&self.tree, &mut states);
        states[end].is_terminal = true;
        FiniteAutomaton::new(start, states, self.language.clone())
    }

    /// Glushkov position automaton: one state per linearized position plus
    /// an initial state.
    pub fn to_glushkov(&self) -> FiniteAutomaton {
        let lin = self.tree.linearize();
        let leaves = lin.leaves();
        let first: Vec<u32> = lin.first_symbols().iter().filter_map(|s| s.lin()).collect();
        let last: Vec<u32> = lin.last_symbols().iter().filter_map(|s| s.lin()).collect();
        let pairs = lin.pairs();

        let mut states = Vec::with_capacity(leaves.len() + 1);
        states.push(State::new(0, "S".to_string(), self.tree.contains_eps()));
        for (i, leaf) in leaves.iter().enumerate() {
            states.push(State::new(
                i + 1,
                leaf.to_string(),
                last.contains(&((i + 1) as u32)),
            ));
        }
        for &j in &first {
            let symbol = leaves[j as usize - 1].delinearize();
            states[0].set_transition(j as usize, symbol);
        }
        for (&i, targets) in &pairs {
            for &j in targets {
                let symbol = leaves[j as usize - 1].delinearize();
                states[i as usize].set_transition(j as usize, symbol);
            }
        }
        FiniteAutomaton::new(0, states, self.language.clone())
    }

    /// Ilie-Yu follow automaton: the Glushkov automaton quotiented by
    /// follow-set equality (positions with the same follow set and the same
    /// finality are merged; the initial state takes `first` as its follow
    /// set).
    pub fn to_ilieyu(&self) -> FiniteAutomaton {
        let lin = self.tree.linearize();
        let leaves = lin.leaves();
        let n = leaves.len();
        let first: std::collections::BTreeSet<u32> =
            lin.first_symbols().iter().filter_map(|s| s.lin()).collect();
        let last: std::collections::BTreeSet<u32> =
            lin.last_symbols().iter().filter_map(|s| s.lin()).collect();
        let pairs = lin.pairs();

        // follow set and finality per position (position 0 is the initial)
        let mut keys = Vec::with_capacity(n + 1);
        keys.push((first.clone(), self.tree.contains_eps()));
        for i in 1..=n {
            let follow: std::collections::BTreeSet<u32> = pairs
                .get(&(i as u32))
                .map(|v| v.iter().copied().collect())
                .unwrap_or_default();
            keys.push((follow, last.contains(&(i as u32))));
        }

        let mut class_of = vec![0usize; n + 1];
        let mut seen: FxHashMap<(std::collections::BTreeSet<u32>, bool), usize> =
            FxHashMap::default();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let next = members.len();
            let class = *seen.entry(key.clone()).or_insert(next);
            if class == members.len() {
                members.push(Vec::new());
            }
            members[class].push(i);
            class_of[i] = class;
        }

        let mut states: Vec<State> = members
            .iter()
            .enumerate()
            .map(|(c, positions)| {
                let identifier = positions
                    .iter()
                    .map(|&p| {
                        if p == 0 {
                            "S".to_string()
                        } else {
                            leaves[p - 1].to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let is_terminal = keys[positions[0]].1;
                let mut state = State::new(c, identifier, is_terminal);
                state.label = positions.iter().copied().collect();
                state
            })
            .collect();

        for &j in &first {
            let symbol = leaves[j as usize - 1].delinearize();
            states[class_of[0]].set_transition(class_of[j as usize], symbol);
        }
        for (&i, targets) in &pairs {
            for &j in targets {
                let symbol = leaves[j as usize - 1].delinearize();
                states[class_of[i as usize]].set_transition(class_of[j as usize], symbol);
            }
        }
        FiniteAutomaton::new(class_of[0], states, self.language.clone())
    }

    /// Antimirov partial-derivative automaton: states are the reachable
    /// partial-derivative classes of the root expression.
    pub fn to_antimirov(&self) -> FiniteAutomaton {
        let alphabet: Vec<Symbol> = self.language.alphabet().iter().copied().collect();
        let mut trees: Vec<AlgExpression> = vec![self.tree.clone()];
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        index.insert(render(&self.tree), 0);
        let mut states = vec![State::new(0, render(&self.tree), self.tree.contains_eps())];

        let mut cursor = 0;
        while cursor < trees.len() {
            let current = trees[cursor].clone();
            for symbol in &alphabet {
                for derivative in partial_derivatives(&current, symbol) {
                    let key = render(&derivative);
                    let target = match index.get(&key) {
                        Some(&t) => t,
                        None => {
                            let t = trees.len();
                            index.insert(key.clone(), t);
                            states.push(State::new(t, key, derivative.contains_eps()));
                            trees.push(derivative);
                            t
                        }
                    };
                    states[cursor].set_transition(target, *symbol);
                }
            }
            cursor += 1;
        }
        FiniteAutomaton::new(0, states, self.language.clone())
    }

    /// The pumping-lemma constant: the state count of the minimal DFA.
    pub fn pump_length(&self) -> Result<usize> {
        if let Some(p) = self.language.pump_length() {
            return Ok(p);
        }
        let min = self.to_glushkov().minimize()?;
        let p = min.states_number();
        self.language.set_pump_length(p);
        Ok(p)
    }

    /// Language equivalence via minimal DFAs.
    pub fn equivalent(a: &Regex, b: &Regex) -> Result<bool> {
        FiniteAutomaton::equivalent(&a.to_glushkov(), &b.to_glushkov())
    }

    /// Literal tree equality (tolerant of swapped alternation operands).
    pub fn equal(a: &Regex, b: &Regex) -> bool {
        a.tree.equals(&b.tree)
    }

    pub fn subset(&self, other: &Regex) -> Result<bool> {
        self.to_glushkov().subset(&other.to_glushkov())
    }

    /// Applies the rewrite rules to fixpoint (bounded number of passes).
    pub fn normalize(&self, rules: &[RewriteRule]) -> Regex {
        let mut current = self.tree.clone();
        for _ in 0..REWRITE_PASS_LIMIT {
            let next = rewrite_once(&current, rules);
            if next.equals(&current) {
                break;
            }
            current = next;
        }
        Regex::from_tree(current)
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

fn render(tree: &AlgExpression) -> String {
    let text = tree.to_string();
    if text.is_empty() {
        "ε".to_string()
    } else {
        text
    }
}

fn derive(tree: &AlgExpression, symbol: &Symbol) -> Option<AlgExpression> {
    match tree.node() {
        Node::Eps | Node::Ref(_) => None,
        Node::Symb(s) => (s == symbol).then(AlgExpression::eps),
        Node::Alt(l, r) => match (derive(l, symbol), derive(r, symbol)) {
            (Some(a), Some(b)) => Some(AlgExpression::alt_simplified(a, b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        },
        Node::Conc(l, r) => {
            let left = derive(l, symbol)
                .map(|d| AlgExpression::conc_simplified(d, r.as_ref().clone()));
            let right = if l.contains_eps() {
                derive(r, symbol)
            } else {
                None
            };
            match (left, right) {
                (Some(a), Some(b)) => Some(AlgExpression::alt_simplified(a, b)),
                (Some(a), None) | (None, Some(a)) => Some(a),
                (None, None) => None,
            }
        }
        Node::Star(x) => derive(x, symbol).map(|d| {
            AlgExpression::conc_simplified(d, AlgExpression::star(x.as_ref().clone()))
        }),
        Node::Negation(_) | Node::MemoryWriter(_, _) => None,
    }
}

fn partial_derivatives(tree: &AlgExpression, symbol: &Symbol) -> Vec<AlgExpression> {
    let mut out: Vec<AlgExpression> = Vec::new();
    let push = |candidate: AlgExpression, out: &mut Vec<AlgExpression>| {
        if !out.iter().any(|seen| seen.equals(&candidate)) {
            out.push(candidate);
        }
    };
    match tree.node() {
        Node::Symb(s) if s == symbol => push(AlgExpression::eps(), &mut out),
        Node::Alt(l, r) => {
            for d in partial_derivatives(l, symbol) {
                push(d, &mut out);
            }
            for d in partial_derivatives(r, symbol) {
                push(d, &mut out);
            }
        }
        Node::Conc(l, r) => {
            for d in partial_derivatives(l, symbol) {
                push(
                    AlgExpression::conc_simplified(d, r.as_ref().clone()),
                    &mut out,
                );
            }
            if l.contains_eps() {
                for d in partial_derivatives(r, symbol) {
                    push(d, &mut out);
                }
            }
        }
        Node::Star(x) => {
            for d in partial_derivatives(x, symbol) {
                push(
                    AlgExpression::conc_simplified(
                        d,
                        AlgExpression::star(x.as_ref().clone()),
                    ),
                    &mut out,
                );
            }
        }
        _ => {}
    }
    out
}

fn thompson_fragment(tree: &AlgExpression, states: &mut Vec<State>) -> (usize, usize) {
    let mut fresh = |states: &mut Vec<State>| {
        let index = states.len();
        states.push(State::new(index, index.to_string(), false));
        index
    };
    match tree.node() {
        Node::Eps | Node::Ref(_) | Node::Negation(_) => {
            let s = fresh(states);
            let e = fresh(states);
            states[s].set_transition(e, Symbol::Epsilon);
            (s, e)
        }
        Node::Symb(symbol) => {
            let s = fresh(states);
            let e = fresh(states);
            states[s].set_transition(e, *symbol);
            (s, e)
        }
        Node::Alt(l, r) => {
            let s = fresh(states);
            let e = fresh(states);
            let (ls, le) = thompson_fragment(l, states);
            let (rs, re) = thompson_fragment(r, states);
            states[s].set_transition(ls, Symbol::Epsilon);
            states[s].set_transition(rs, Symbol::Epsilon);
            states[le].set_transition(e, Symbol::Epsilon);
            states[re].set_transition(e, Symbol::Epsilon);
            (s, e)
        }
        Node::Conc(l, r) => {
            let (ls, le) = thompson_fragment(l, states);
            let (rs, re) = thompson_fragment(r, states);
            states[le].set_transition(rs, Symbol::Epsilon);
            (ls, re)
        }
        Node::Star(x) | Node::MemoryWriter(_, x) => {
            let s = fresh(states);
            let e = fresh(states);
            let (xs, xe) = thompson_fragment(x, states);
            states[s].set_transition(xs, Symbol::Epsilon);
            states[s].set_transition(e, Symbol::Epsilon);
            states[xe].set_transition(xs, Symbol::Epsilon);
            states[xe].set_transition(e, Symbol::Epsilon);
            (s, e)
        }
    }
}

fn rewrite_once(tree: &AlgExpression, rules: &[RewriteRule]) -> AlgExpression {
    for rule in rules {
        if rule.from.equals(tree) {
            return rule.to.clone();
        }
    }
    match tree.node() {
        Node::Eps => AlgExpression::eps(),
        Node::Symb(s) => AlgExpression::symb(*s),
        Node::Ref(c) => AlgExpression::backref(*c),
        Node::Alt(l, r) => AlgExpression::alt(rewrite_once(l, rules), rewrite_once(r, rules)),
        Node::Conc(l, r) => AlgExpression::conc(rewrite_once(l, rules), rewrite_once(r, rules)),
        Node::Star(x) => AlgExpression::star(rewrite_once(x, rules)),
        Node::Negation(x) => AlgExpression::negation(rewrite_once(x, rules)),
        Node::MemoryWriter(c, x) => AlgExpression::memory_writer(*c, rewrite_once(x, rules)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(input: &str) -> Regex {
        Regex::from_string(input).expect(input)
    }

    #[test]
    fn derivative_follows_brzozowski() {
        let r = regex("a*b");
        let by_a = r.derivative(&Symbol::sym('a')).expect("nonempty");
        assert_eq!(by_a.to_string(), "a*b");
        let by_b = r.derivative(&Symbol::sym('b')).expect("nonempty");
        assert!(by_b.contains_eps());
        assert!(regex("ab").derivative(&Symbol::sym('b')).is_none());
    }

    #[test]
    fn prefix_derivative_iterates() {
        let r = regex("a*b");
        assert!(r.prefix_derivative("aab").expect("in language").contains_eps());
        assert!(r.prefix_derivative("ba").is_none());
    }

    #[test]
    fn glushkov_state_count_is_positions_plus_one() {
        let fa = regex("(a|b)*abb").to_glushkov();
        assert_eq!(fa.states_number(), 6);
        assert!(fa.accepts("abb"));
        assert!(fa.accepts("babb"));
        assert!(!fa.accepts("ab"));
    }

    #[test]
    fn thompson_accepts_the_language() {
        let fa = regex("a|b").to_thompson();
        assert!(fa.accepts("a"));
        assert!(fa.accepts("b"));
        assert!(!fa.accepts("ab"));
        assert!(!fa.accepts(""));
    }

    #[test]
    fn ilieyu_is_a_quotient_of_glushkov() {
        let r = regex("(a|b)*");
        let glushkov = r.to_glushkov();
        let ilieyu = r.to_ilieyu();
        assert!(ilieyu.states_number() <= glushkov.states_number());
        assert!(ilieyu.accepts("abba"));
        assert!(ilieyu.accepts(""));
    }

    #[test]
    fn antimirov_accepts_a_star_b() {
        let fa = regex("a*b").to_antimirov();
        assert!(fa.accepts("b"));
        assert!(fa.accepts("ab"));
        assert!(fa.accepts("aab"));
        assert!(!fa.accepts("ba"));
        assert!(!fa.accepts(""));
    }

    #[test]
    fn pump_lengths_of_the_reference_examples() {
        assert_eq!(regex("(a|b)*").pump_length().unwrap(), 1);
        assert_eq!(regex("a*b").pump_length().unwrap(), 2);
    }

    #[test]
    fn pump_length_is_cached_in_the_language() {
        let r = regex("(a|b)*");
        assert!(r.language().pump_length().is_none());
        r.pump_length().unwrap();
        assert_eq!(r.language().pump_length(), Some(1));
    }

    #[test]
    fn equivalence_ignores_syntax() {
        assert!(Regex::equivalent(&regex("(a|b)*"), &regex("(a*b*)*")).unwrap());
        assert!(!Regex::equivalent(&regex("a*"), &regex("a")).unwrap());
        assert!(Regex::equal(&regex("a|b"), &regex("b|a")));
        assert!(!Regex::equal(&regex("(a|b)*"), &regex("(a*b*)*")));
    }

    #[test]
    fn subset_on_regexes() {
        assert!(regex("ab").subset(&regex("a*b*")).unwrap());
        assert!(!regex("a*b*").subset(&regex("ab")).unwrap());
    }

    #[test]
    fn normalization_rewrites_subtrees() {
        let rules = vec![RewriteRule {
            from: AlgExpression::parse("ab", ParseFeatures::default()).unwrap(),
            to: AlgExpression::parse("c", ParseFeatures::default()).unwrap(),
        }];
        let normalized = regex("ab|d").normalize(&rules);
        assert_eq!(normalized.to_string(), "c|d");
    }
}
