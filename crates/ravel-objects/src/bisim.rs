//! Bisimulation over right-linear grammars.
//!
//! Each automaton is read as a grammar keyed on states: a transition
//! `s --a--> t` is the production `s → a t`, an accepting state gets `s → ε`.
//! Class refinement then compares, for every state, the set of right-hand
//! sides expressed through current class numbers, until the partition
//! stabilizes. Epsilon edges are observable actions here, which makes this
//! strictly finer than language equivalence.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::fa::FiniteAutomaton;
use crate::symbol::Symbol;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum GrammarTerm {
    Accept,
    Init,
    Sym(Symbol),
    Class(usize),
}

type Production = (GrammarTerm, Option<usize>);

fn grammar_of(fa: &FiniteAutomaton, offset: usize, with_init: bool) -> Vec<Vec<Production>> {
    let mut prods: Vec<Vec<Production>> = vec![Vec::new(); fa.states().len()];
    for state in fa.states() {
        for (symbol, targets) in &state.transitions {
            for &t in targets {
                prods[state.index].push((GrammarTerm::Sym(*symbol), Some(t + offset)));
            }
        }
        if state.is_terminal {
            prods[state.index].push((GrammarTerm::Accept, None));
        }
        if with_init && state.index == fa.initial() {
            prods[state.index].push((GrammarTerm::Init, None));
        }
    }
    prods
}

/// The grammar of the mirrored automaton: edges flipped, the accept and
/// initial markers swapped.
fn reverse_grammar_of(fa: &FiniteAutomaton, offset: usize) -> Vec<Vec<Production>> {
    let mut prods: Vec<Vec<Production>> = vec![Vec::new(); fa.states().len()];
    for state in fa.states() {
        for (symbol, targets) in &state.transitions {
            for &t in targets {
                prods[t].push((GrammarTerm::Sym(*symbol), Some(state.index + offset)));
            }
        }
        if state.is_terminal {
            prods[state.index].push((GrammarTerm::Init, None));
        }
        if state.index == fa.initial() {
            prods[state.index].push((GrammarTerm::Accept, None));
        }
    }
    prods
}

/// Partition refinement to a fixpoint. Class identifiers are assigned from
/// the sorted production fingerprints, so the outcome does not depend on
/// state order.
fn refine(prods: &[Vec<Production>]) -> Vec<usize> {
    let mut classes = vec![0usize; prods.len()];
    let mut distinct = 1usize.min(prods.len());
    loop {
        let mut fingerprint_ids: std::collections::BTreeMap<
            BTreeSet<(GrammarTerm, Option<usize>)>,
            usize,
        > = std::collections::BTreeMap::new();
        let fingerprints: Vec<BTreeSet<(GrammarTerm, Option<usize>)>> = prods
            .iter()
            .map(|rules| {
                rules
                    .iter()
                    .map(|(term, next)| (*term, next.map(|n| classes[n])))
                    .collect()
            })
            .collect();
        for fp in &fingerprints {
            let next = fingerprint_ids.len();
            fingerprint_ids.entry(fp.clone()).or_insert(next);
        }
        // renumber in fingerprint order for determinism
        let ordered: std::collections::BTreeMap<_, usize> = fingerprint_ids
            .keys()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let next_classes: Vec<usize> = fingerprints.iter().map(|fp| ordered[fp]).collect();
        let next_distinct = ordered.len();
        if next_distinct == distinct {
            return next_classes;
        }
        distinct = next_distinct;
        classes = next_classes;
    }
}

/// Class counts must balance between the two machines for every class.
fn balanced(classes: &[usize], split: usize) -> bool {
    let max = classes.iter().copied().max().map_or(0, |m| m + 1);
    let mut counts = vec![0i64; max];
    for (i, &class) in classes.iter().enumerate() {
        counts[class] += if i < split { 1 } else { -1 };
    }
    counts.iter().all(|&c| c == 0)
}

impl FiniteAutomaton {
    /// Joint class refinement; the machines are bisimilar iff their initial
    /// states land in the same class.
    pub fn bisimilar(a: &FiniteAutomaton, b: &FiniteAutomaton) -> bool {
        if a.alphabet() != b.alphabet() {
            return false;
        }
        let na = a.states().len();
        let mut prods = grammar_of(a, 0, false);
        prods.extend(grammar_of(b, na, false));
        let classes = refine(&prods);
        classes[a.initial()] == classes[na + b.initial()]
    }

    /// Quotient by the bisimulation classes of this automaton.
    pub fn merge_bisimilar(&self) -> FiniteAutomaton {
        let classes = refine(&grammar_of(self, 0, false));
        self.merge_equivalent_classes(&classes)
    }

    /// Literal equality up to state renaming: state and transition counts
    /// coincide, and the forward, backward, and transition-level joint
    /// refinements all balance classes pointwise between the two machines.
    pub fn equal(a: &FiniteAutomaton, b: &FiniteAutomaton) -> bool {
        if a.states().len() != b.states().len() || a.alphabet() != b.alphabet() {
            return false;
        }
        let edges_a = edge_list(a);
        let edges_b = edge_list(b);
        if edges_a.len() != edges_b.len() {
            return false;
        }
        let na = a.states().len();

        let mut forward = grammar_of(a, 0, true);
        forward.extend(grammar_of(b, na, true));
        let fwd = refine(&forward);
        if !balanced(&fwd, na) {
            return false;
        }

        let mut backward = reverse_grammar_of(a, 0);
        backward.extend(reverse_grammar_of(b, na));
        let rev = refine(&backward);
        if !balanced(&rev, na) {
            return false;
        }

        // pointwise combination of both refinements
        let mut combined_ids: std::collections::BTreeMap<(usize, usize), usize> =
            std::collections::BTreeMap::new();
        let combined: Vec<usize> = fwd
            .iter()
            .zip(rev.iter())
            .map(|(&f, &r)| {
                let next = combined_ids.len();
                *combined_ids.entry((f, r)).or_insert(next)
            })
            .collect();
        if !balanced(&combined, na) {
            return false;
        }

        // transition-level grammar: one nonterminal per edge, productions
        // carry the combined class of the edge target
        let mut edge_prods: Vec<Vec<Production>> = Vec::new();
        let mut build_edges = |fa: &FiniteAutomaton,
                               edges: &[(usize, Symbol, usize)],
                               state_offset: usize,
                               edge_offset: usize,
                               edge_prods: &mut Vec<Vec<Production>>| {
            let mut first_edge_of: Vec<Vec<usize>> = vec![Vec::new(); fa.states().len()];
            for (k, (from, _, _)) in edges.iter().enumerate() {
                first_edge_of[*from].push(edge_offset + k);
            }
            for (_, _, to) in edges.iter() {
                let mut rules: Vec<Production> = Vec::new();
                for &e in &first_edge_of[*to] {
                    rules.push((GrammarTerm::Class(combined[state_offset + to]), Some(e)));
                }
                if fa.states()[*to].is_terminal {
                    rules.push((GrammarTerm::Class(combined[state_offset + to]), None));
                }
                edge_prods.push(rules);
            }
        };
        build_edges(a, &edges_a, 0, 0, &mut edge_prods);
        build_edges(b, &edges_b, na, edges_a.len(), &mut edge_prods);
        let edge_classes = refine(&edge_prods);
        balanced(&edge_classes, edges_a.len())
    }

    /// Language equivalence: literal equality of the minimal DFAs.
    pub fn equivalent(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Result<bool> {
        Ok(FiniteAutomaton::equal(&a.minimize()?, &b.minimize()?))
    }

    /// `self ⊆ other` iff the intersection is equivalent to `self`.
    pub fn subset(&self, other: &FiniteAutomaton) -> Result<bool> {
        let inter = FiniteAutomaton::intersection(self, other)?;
        FiniteAutomaton::equivalent(&inter, self)
    }
}

fn edge_list(fa: &FiniteAutomaton) -> Vec<(usize, Symbol, usize)> {
    let mut edges = Vec::new();
    for state in fa.states() {
        for (symbol, targets) in &state.transitions {
            for &t in targets {
                edges.push((state.index, *symbol, t));
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::State;
    use crate::language::Language;
    use crate::regex::Regex;
    use crate::symbol::Symbol;
    use std::collections::BTreeSet;

    fn glushkov(input: &str) -> FiniteAutomaton {
        Regex::from_string(input).unwrap().to_glushkov()
    }

    #[test]
    fn equivalent_regexes_have_equivalent_automata() {
        let a = glushkov("(a|b)*");
        let b = glushkov("(a*b*)*");
        assert!(FiniteAutomaton::equivalent(&a, &b).unwrap());
        assert!(!FiniteAutomaton::equivalent(&a, &glushkov("a*")).unwrap());
    }

    #[test]
    fn bisimilar_is_reflexive_on_structure() {
        let a = glushkov("(a|b)*abb");
        assert!(FiniteAutomaton::bisimilar(&a, &a));
    }

    /// The classic witness pair: both accept {ab, ac}, but one decides the
    /// branch on the first letter. They are equivalent, not bisimilar.
    #[test]
    fn equivalent_but_not_bisimilar_witness() {
        let alphabet: BTreeSet<Symbol> =
            ['a', 'b', 'c'].into_iter().map(Symbol::sym).collect();

        let mut n1 = vec![
            State::new(0, "0".into(), false),
            State::new(1, "1".into(), false),
            State::new(2, "2".into(), true),
        ];
        n1[0].set_transition(1, Symbol::sym('a'));
        n1[1].set_transition(2, Symbol::sym('b'));
        n1[1].set_transition(2, Symbol::sym('c'));
        let n1 = FiniteAutomaton::new(0, n1, Language::new(alphabet.clone()));

        let mut n2 = vec![
            State::new(0, "0".into(), false),
            State::new(1, "1".into(), false),
            State::new(2, "2".into(), false),
            State::new(3, "3".into(), true),
        ];
        n2[0].set_transition(1, Symbol::sym('a'));
        n2[0].set_transition(2, Symbol::sym('a'));
        n2[1].set_transition(3, Symbol::sym('b'));
        n2[2].set_transition(3, Symbol::sym('c'));
        let n2 = FiniteAutomaton::new(0, n2, Language::new(alphabet));

        assert!(FiniteAutomaton::equivalent(&n1, &n2).unwrap());
        assert!(!FiniteAutomaton::bisimilar(&n1, &n2));
    }

    #[test]
    fn merge_bisimilar_collapses_duplicate_branches() {
        let nfa = glushkov("a|a");
        let merged = nfa.merge_bisimilar();
        assert!(merged.states_number() < nfa.states_number());
        assert!(merged.accepts("a"));
        assert!(!merged.accepts("aa"));
    }

    #[test]
    fn equal_distinguishes_structure_from_language() {
        let thompson = Regex::from_string("a|b").unwrap().to_thompson();
        let dfa = thompson.determinize(true).unwrap();
        assert!(FiniteAutomaton::equivalent(&thompson, &dfa).unwrap());
        assert!(!FiniteAutomaton::equal(&thompson, &dfa));
        assert!(FiniteAutomaton::equal(&dfa, &dfa.clone()));
    }

    #[test]
    fn subset_through_the_product() {
        assert!(glushkov("ab").subset(&glushkov("a*b*")).unwrap());
        assert!(!glushkov("ba").subset(&glushkov("a*b*")).unwrap());
        assert!(glushkov("(ab)*").subset(&glushkov("(a|b)*")).unwrap());
    }
}
