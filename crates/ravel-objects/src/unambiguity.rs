//! 1-unambiguity through the Brüggemann-Klein/Wood orbit method.
//!
//! A language is 1-unambiguous when some regex denoting it is deterministic
//! in the marked sense. The decision runs on the minimal DFA: compute the
//! orbits (strongly connected components), check that all gates of an orbit
//! agree on finality and on their out-of-orbit transitions, and recurse into
//! the orbit automata. A single all-covering orbit is handled by cutting the
//! consistent symbols away from the final states; each cut removes at least
//! one edge, which bounds the recursion.

use std::collections::BTreeMap;

use crate::error::{ObjectError, Result, DEPTH_LIMIT};
use crate::fa::FiniteAutomaton;
use crate::language::OneUnambiguousFact;
use crate::symbol::Symbol;

#[derive(Clone)]
struct OrbitDfa {
    trans: Vec<BTreeMap<Symbol, usize>>,
    finals: Vec<bool>,
}

impl FiniteAutomaton {
    /// Whether this automaton's language is 1-unambiguous. The verdict (and
    /// a witness regex when positive) is cached in the language.
    pub fn is_one_unambiguous(&self) -> Result<bool> {
        if let Some(fact) = self.language().one_unambiguous() {
            return Ok(fact.flag);
        }
        let min = self.minimize()?;
        let dfa = OrbitDfa {
            trans: min
                .states()
                .iter()
                .map(|s| {
                    s.transitions
                        .iter()
                        .filter_map(|(symbol, targets)| {
                            targets.iter().next().map(|&t| (*symbol, t))
                        })
                        .collect()
                })
                .collect(),
            finals: min.states().iter().map(|s| s.is_terminal).collect(),
        };
        let flag = orbit_check(&dfa, 0)?;
        let witness = if flag {
            min.to_regex().ok().map(|r| r.to_string())
        } else {
            None
        };
        self.language()
            .set_one_unambiguous(OneUnambiguousFact { flag, witness });
        Ok(flag)
    }
}

fn orbit_check(dfa: &OrbitDfa, depth: usize) -> Result<bool> {
    if depth > DEPTH_LIMIT {
        return Err(ObjectError::TooDeep { limit: DEPTH_LIMIT });
    }
    let n = dfa.trans.len();
    if n <= 1 && dfa.trans.iter().all(|t| t.is_empty()) {
        return Ok(true);
    }

    let orbit_of = strongly_connected(&dfa.trans);
    let orbit_count = orbit_of.iter().copied().max().map_or(0, |m| m + 1);

    if orbit_count == 1 {
        // one orbit covering everything: cut the consistent symbols away
        // from the final states and retry
        let final_states: Vec<usize> = (0..n).filter(|&i| dfa.finals[i]).collect();
        if final_states.is_empty() {
            return Ok(true);
        }
        let mut consistent: Vec<Symbol> = Vec::new();
        for (symbol, &target) in &dfa.trans[final_states[0]] {
            if final_states
                .iter()
                .all(|&f| dfa.trans[f].get(symbol) == Some(&target))
            {
                consistent.push(*symbol);
            }
        }
        if consistent.is_empty() {
            return Ok(false);
        }
        let mut cut = dfa.clone();
        let mut removed = false;
        for &f in &final_states {
            for symbol in &consistent {
                removed |= cut.trans[f].remove(symbol).is_some();
            }
        }
        if !removed {
            return Ok(false);
        }
        return orbit_check(&cut, depth + 1);
    }

    // gates: states that are final or leave their orbit
    let mut gates_of: Vec<Vec<usize>> = vec![Vec::new(); orbit_count];
    for i in 0..n {
        let leaves = dfa.trans[i]
            .values()
            .any(|&t| orbit_of[t] != orbit_of[i]);
        if dfa.finals[i] || leaves {
            gates_of[orbit_of[i]].push(i);
        }
    }

    // orbit property: all gates of an orbit agree on finality and on their
    // out-of-orbit transitions
    for gates in &gates_of {
        let Some(&first) = gates.first() else { continue };
        let outside = |i: usize| -> BTreeMap<Symbol, usize> {
            dfa.trans[i]
                .iter()
                .filter(|(_, &t)| orbit_of[t] != orbit_of[i])
                .map(|(s, &t)| (*s, t))
                .collect()
        };
        let reference = outside(first);
        for &gate in &gates[1..] {
            if dfa.finals[gate] != dfa.finals[first] || outside(gate) != reference {
                return Ok(false);
            }
        }
    }

    // recurse into the orbit automata: inner edges only, gates as finals
    for orbit in 0..orbit_count {
        let members: Vec<usize> = (0..n).filter(|&i| orbit_of[i] == orbit).collect();
        let index_of: BTreeMap<usize, usize> = members
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();
        let sub = OrbitDfa {
            trans: members
                .iter()
                .map(|&i| {
                    dfa.trans[i]
                        .iter()
                        .filter(|(_, &t)| orbit_of[t] == orbit)
                        .map(|(s, &t)| (*s, index_of[&t]))
                        .collect()
                })
                .collect(),
            finals: members
                .iter()
                .map(|&i| gates_of[orbit].contains(&i))
                .collect(),
        };
        if !orbit_check(&sub, depth + 1)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Kosaraju over the transition graph; returns the orbit id per state.
fn strongly_connected(trans: &[BTreeMap<Symbol, usize>]) -> Vec<usize> {
    let n = trans.len();
    let mut order = Vec::with_capacity(n);
    let mut seen = vec![false; n];
    fn post_order(
        node: usize,
        trans: &[BTreeMap<Symbol, usize>],
        seen: &mut [bool],
        order: &mut Vec<usize>,
    ) {
        seen[node] = true;
        for &t in trans[node].values() {
            if !seen[t] {
                post_order(t, trans, seen, order);
            }
        }
        order.push(node);
    }
    for start in 0..n {
        if !seen[start] {
            post_order(start, trans, &mut seen, &mut order);
        }
    }

    let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, row) in trans.iter().enumerate() {
        for &t in row.values() {
            reverse[t].push(i);
        }
    }
    let mut orbit = vec![usize::MAX; n];
    let mut count = 0;
    for &start in order.iter().rev() {
        if orbit[start] != usize::MAX {
            continue;
        }
        let mut stack = vec![start];
        orbit[start] = count;
        while let Some(node) = stack.pop() {
            for &prev in &reverse[node] {
                if orbit[prev] == usize::MAX {
                    orbit[prev] = count;
                    stack.push(prev);
                }
            }
        }
        count += 1;
    }
    orbit
}
