//! Ambiguity classification and semantic determinism.
//!
//! Both questions are about *accepting runs*, not languages, so epsilon
//! edges matter: a run is the full path through the automaton, epsilon
//! segments included. Every run decomposes uniquely as
//! `ε-walk (symbol ε-walk)*`, which turns the automaton into a weighted
//! step relation over "pre-symbol" positions: the weight of a step counts
//! the distinct `symbol + ε-walk` segments between two positions. Counts are
//! saturated at 2 — the classification only ever needs "none, one, many".
//!
//! On that relation the classification is structural:
//! an epsilon cycle through useful states means some word has infinitely
//! many runs (exponential); a diverging pair loop at one state is the EDA
//! criterion (exponential); the `(p,p,q) →+ (p,q,q)` triple reachability is
//! the IDA criterion (polynomial); otherwise an ambiguous automaton has
//! bounded ambiguity (almost unambiguous).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::{ObjectError, Result};
use crate::fa::FiniteAutomaton;
use crate::symbol::Symbol;

/// Pair and triple products are cubic in the state count; beyond this the
/// classification aborts instead of grinding.
const AMBIGUITY_STATE_CAP: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmbiguityValue {
    Unambiguous,
    AlmostUnambiguous,
    PolynomiallyAmbiguous,
    ExponentiallyAmbiguous,
}

impl fmt::Display for AmbiguityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AmbiguityValue::Unambiguous => "unambiguous",
            AmbiguityValue::AlmostUnambiguous => "almost unambiguous",
            AmbiguityValue::PolynomiallyAmbiguous => "polynomially ambiguous",
            AmbiguityValue::ExponentiallyAmbiguous => "exponentially ambiguous",
        };
        write!(f, "{}", text)
    }
}

/// The weighted step relation over pre-symbol positions.
struct StepRelation {
    n: usize,
    /// `alpha[r]`: number of ε-walks from the initial state to `r`, sat. 2.
    alpha: Vec<u8>,
    acc: Vec<bool>,
    /// per symbol, `step[r][r']`: number of `symbol + ε-walk` segments.
    steps: BTreeMap<Symbol, Vec<Vec<u8>>>,
}

fn sat_add(a: u8, b: u8) -> u8 {
    (a + b).min(2)
}

impl FiniteAutomaton {
    /// Semantic determinism: every accepted word has exactly one accepting
    /// run.
    pub fn semdet(&self) -> Result<bool> {
        let trimmed = self.remove_trap_states();
        match trimmed.step_relation()? {
            None => Ok(false),
            Some(relation) => Ok(!relation.is_ambiguous()),
        }
    }

    pub fn ambiguity(&self) -> Result<AmbiguityValue> {
        Ok(self.ambiguity_with_witness()?.0)
    }

    /// Classification plus the length of a shortest word witnessing
    /// ambiguity, when there is one.
    pub fn ambiguity_with_witness(&self) -> Result<(AmbiguityValue, Option<usize>)> {
        let trimmed = self.remove_trap_states();
        let Some(relation) = trimmed.step_relation()? else {
            // an epsilon cycle on a useful path: infinitely many runs
            return Ok((AmbiguityValue::ExponentiallyAmbiguous, None));
        };
        let witness = relation.ambiguity_witness();
        if witness.is_none() {
            return Ok((AmbiguityValue::Unambiguous, None));
        }
        let value = if relation.has_eda() {
            AmbiguityValue::ExponentiallyAmbiguous
        } else if relation.has_ida() {
            AmbiguityValue::PolynomiallyAmbiguous
        } else {
            AmbiguityValue::AlmostUnambiguous
        };
        Ok((value, witness))
    }

    /// Builds the weighted step relation, or `None` when the epsilon graph
    /// has a cycle.
    fn step_relation(&self) -> Result<Option<StepRelation>> {
        let n = self.states().len();
        if n > AMBIGUITY_STATE_CAP {
            return Err(ObjectError::StateLimit {
                limit: AMBIGUITY_STATE_CAP,
            });
        }

        // ε-path counts by DP over a topological order; a back edge means an
        // ε-cycle
        let eps_out: Vec<Vec<usize>> = self
            .states()
            .iter()
            .map(|s| {
                s.targets(&Symbol::Epsilon)
                    .map(|t| t.iter().copied().collect())
                    .unwrap_or_default()
            })
            .collect();
        let Some(topo) = topological_order(&eps_out) else {
            return Ok(None);
        };
        let mut eps_counts = vec![vec![0u8; n]; n];
        for &p in topo.iter().rev() {
            eps_counts[p][p] = 1;
            for &r in &eps_out[p] {
                for q in 0..n {
                    if eps_counts[r][q] > 0 {
                        eps_counts[p][q] = sat_add(eps_counts[p][q], eps_counts[r][q]);
                    }
                }
            }
        }

        let alpha = eps_counts[self.initial()].clone();
        let acc: Vec<bool> = self.states().iter().map(|s| s.is_terminal).collect();
        let mut steps: BTreeMap<Symbol, Vec<Vec<u8>>> = BTreeMap::new();
        for symbol in self.alphabet() {
            let mut matrix = vec![vec![0u8; n]; n];
            for (r, row) in matrix.iter_mut().enumerate() {
                if let Some(targets) = self.states()[r].targets(symbol) {
                    for &s in targets {
                        for (q, cell) in row.iter_mut().enumerate() {
                            if eps_counts[s][q] > 0 {
                                *cell = sat_add(*cell, eps_counts[s][q]);
                            }
                        }
                    }
                }
            }
            steps.insert(*symbol, matrix);
        }
        Ok(Some(StepRelation {
            n,
            alpha,
            acc,
            steps,
        }))
    }
}

fn topological_order(out: &[Vec<usize>]) -> Option<Vec<usize>> {
    let n = out.len();
    let mut indegree = vec![0usize; n];
    for targets in out {
        for &t in targets {
            indegree[t] += 1;
        }
    }
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &t in &out[i] {
            indegree[t] -= 1;
            if indegree[t] == 0 {
                queue.push_back(t);
            }
        }
    }
    (order.len() == n).then_some(order)
}

impl StepRelation {
    fn is_ambiguous(&self) -> bool {
        self.ambiguity_witness().is_some()
    }

    /// BFS over position pairs with a divergence flag; returns the length of
    /// a shortest word with two distinct accepting runs.
    fn ambiguity_witness(&self) -> Option<usize> {
        let mut seen: FxHashSet<(usize, usize, bool)> = FxHashSet::default();
        let mut queue: VecDeque<(usize, usize, bool, usize)> = VecDeque::new();
        for r in 0..self.n {
            if self.alpha[r] == 0 {
                continue;
            }
            for t in r..self.n {
                if self.alpha[t] == 0 {
                    continue;
                }
                let diverged = r != t || self.alpha[r] >= 2;
                if seen.insert((r, t, diverged)) {
                    queue.push_back((r, t, diverged, 0));
                }
            }
        }
        while let Some((r, t, diverged, depth)) = queue.pop_front() {
            if diverged && self.acc[r] && self.acc[t] {
                return Some(depth);
            }
            for matrix in self.steps.values() {
                for (rn, tn, dn) in self.pair_moves(&matrix[r], &matrix[t], r == t, diverged) {
                    if seen.insert((rn, tn, dn)) {
                        queue.push_back((rn, tn, dn, depth + 1));
                    }
                }
            }
        }
        None
    }

    fn pair_moves(
        &self,
        row_r: &[u8],
        row_t: &[u8],
        on_diagonal: bool,
        diverged: bool,
    ) -> Vec<(usize, usize, bool)> {
        let mut moves = Vec::new();
        for (rn, &wr) in row_r.iter().enumerate() {
            if wr == 0 {
                continue;
            }
            for (tn, &wt) in row_t.iter().enumerate() {
                if wt == 0 {
                    continue;
                }
                let split = rn != tn || (on_diagonal && rn == tn && wr >= 2);
                let (a, b) = if rn <= tn { (rn, tn) } else { (tn, rn) };
                moves.push((a, b, diverged || split));
            }
        }
        moves
    }

    /// EDA: some position can come back to itself along a diverged pair
    /// path.
    fn has_eda(&self) -> bool {
        for p in 0..self.n {
            let mut seen: FxHashSet<(usize, usize, bool)> = FxHashSet::default();
            let mut queue: VecDeque<(usize, usize, bool)> = VecDeque::from([(p, p, false)]);
            seen.insert((p, p, false));
            while let Some((r, t, diverged)) = queue.pop_front() {
                if r == p && t == p && diverged {
                    return true;
                }
                for matrix in self.steps.values() {
                    for state in self.pair_moves(&matrix[r], &matrix[t], r == t, diverged) {
                        if seen.insert(state) {
                            queue.push_back(state);
                        }
                    }
                }
            }
        }
        false
    }

    /// IDA: `(p,p,q) →+ (p,q,q)` for some `p ≠ q` in the synchronized
    /// triple product over the step supports.
    fn has_ida(&self) -> bool {
        let support: Vec<Vec<BTreeSet<usize>>> = self
            .steps
            .values()
            .map(|matrix| {
                matrix
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|(_, &w)| w > 0)
                            .map(|(i, _)| i)
                            .collect()
                    })
                    .collect()
            })
            .collect();
        for p in 0..self.n {
            for q in 0..self.n {
                if p == q {
                    continue;
                }
                let mut seen: FxHashSet<(usize, usize, usize)> = FxHashSet::default();
                let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::from([(p, p, q)]);
                seen.insert((p, p, q));
                let mut moved = false;
                while let Some((a, b, c)) = queue.pop_front() {
                    if moved && a == p && b == q && c == q {
                        return true;
                    }
                    for rows in &support {
                        for &an in &rows[a] {
                            for &bn in &rows[b] {
                                for &cn in &rows[c] {
                                    if seen.insert((an, bn, cn)) {
                                        queue.push_back((an, bn, cn));
                                    }
                                }
                            }
                        }
                    }
                    moved = true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;

    fn thompson(input: &str) -> FiniteAutomaton {
        Regex::from_string(input).unwrap().to_thompson()
    }

    #[test]
    fn thompson_star_is_unambiguous() {
        assert_eq!(
            thompson("a*").ambiguity().unwrap(),
            AmbiguityValue::Unambiguous
        );
        assert!(thompson("a*").semdet().unwrap());
    }

    #[test]
    fn duplicated_branch_under_star_is_exponential() {
        assert_eq!(
            thompson("(a|a)*").ambiguity().unwrap(),
            AmbiguityValue::ExponentiallyAmbiguous
        );
        assert!(!thompson("(a|a)*").semdet().unwrap());
    }

    #[test]
    fn duplicated_branch_without_iteration_is_almost_unambiguous() {
        assert_eq!(
            thompson("a|a").ambiguity().unwrap(),
            AmbiguityValue::AlmostUnambiguous
        );
    }

    #[test]
    fn deterministic_machines_are_unambiguous() {
        let dfa = thompson("(a|b)*abb").determinize(true).unwrap();
        assert_eq!(dfa.ambiguity().unwrap(), AmbiguityValue::Unambiguous);
        assert!(dfa.semdet().unwrap());
    }

    #[test]
    fn witness_length_points_at_a_doubly_accepted_word() {
        let (value, witness) = thompson("a|a").ambiguity_with_witness().unwrap();
        assert_eq!(value, AmbiguityValue::AlmostUnambiguous);
        assert_eq!(witness, Some(1));
    }

    #[test]
    fn polynomial_ambiguity_through_a_bridge() {
        // a* (a a*)? : two chained a-loops joined by an a-bridge
        let nfa = thompson("a*aa*|a*");
        let value = nfa.ambiguity().unwrap();
        assert!(
            matches!(
                value,
                AmbiguityValue::PolynomiallyAmbiguous | AmbiguityValue::ExponentiallyAmbiguous
            ),
            "chained loops must not classify as bounded, got {}",
            value
        );
    }
}
