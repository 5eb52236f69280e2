//! NFA → regex through Arden's lemma.
//!
//! The automaton is read as the linear system `x_i = Σ_j r_ij · x_j + ε?`
//! over regex coefficients (after epsilon removal, so no coefficient is
//! nullable and Arden's identity applies). States are eliminated in
//! descending index order, the initial state last; each elimination rewrites
//! the row with `x = Ax + B  ⇒  x = A*B` and substitutes it into the rows
//! that remain.

use crate::alg_expression::AlgExpression;
use crate::error::{ObjectError, Result};
use crate::fa::FiniteAutomaton;
use crate::regex::Regex;

fn join(slot: Option<AlgExpression>, term: AlgExpression) -> Option<AlgExpression> {
    Some(match slot {
        None => term,
        Some(existing) => AlgExpression::alt_simplified(existing, term),
    })
}

impl FiniteAutomaton {
    /// Solves the language equations of this automaton. The empty language
    /// has no term in this algebra and is reported as an error.
    pub fn to_regex(&self) -> Result<Regex> {
        let base = self.remove_eps();
        let n = base.states().len();
        let initial = base.initial();

        let mut coef: Vec<Vec<Option<AlgExpression>>> = vec![vec![None; n]; n];
        let mut free: Vec<Option<AlgExpression>> = vec![None; n];
        for state in base.states() {
            for (symbol, targets) in &state.transitions {
                for &t in targets {
                    coef[state.index][t] =
                        join(coef[state.index][t].take(), AlgExpression::symb(*symbol));
                }
            }
            if state.is_terminal {
                free[state.index] = Some(AlgExpression::eps());
            }
        }

        let order: Vec<usize> = (0..n)
            .rev()
            .filter(|&i| i != initial)
            .chain(std::iter::once(initial))
            .collect();

        for (pos, &j) in order.iter().enumerate() {
            if let Some(a) = coef[j][j].take() {
                let a_star = AlgExpression::star_simplified(a);
                for k in 0..n {
                    if let Some(c) = coef[j][k].take() {
                        coef[j][k] = Some(AlgExpression::conc_simplified(a_star.clone(), c));
                    }
                }
                if let Some(b) = free[j].take() {
                    free[j] = Some(AlgExpression::conc_simplified(a_star, b));
                }
            }
            if j == initial {
                break;
            }
            let row_coef = coef[j].clone();
            let row_free = free[j].clone();
            for &i in &order[pos + 1..] {
                let Some(c) = coef[i][j].take() else { continue };
                for (k, rk) in row_coef.iter().enumerate() {
                    if let Some(rk) = rk {
                        coef[i][k] = join(
                            coef[i][k].take(),
                            AlgExpression::conc_simplified(c.clone(), rk.clone()),
                        );
                    }
                }
                if let Some(rf) = &row_free {
                    free[i] = join(
                        free[i].take(),
                        AlgExpression::conc_simplified(c.clone(), rf.clone()),
                    );
                }
            }
        }

        free[initial]
            .take()
            .map(|tree| Regex::from_tree(tree.simplified()))
            .ok_or(ObjectError::EmptyLanguage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::State;
    use crate::language::Language;
    use crate::symbol::Symbol;
    use std::collections::BTreeSet;

    fn round_trip(input: &str) {
        let r = Regex::from_string(input).unwrap();
        let back = r.to_thompson().to_regex().unwrap();
        assert!(
            Regex::equivalent(&r, &back).unwrap(),
            "{} round-tripped to {}",
            input,
            back
        );
    }

    #[test]
    fn arden_round_trips_through_thompson() {
        for input in ["a", "a|b", "a*b", "(a|b)*abb", "(ab)*", "a*b*"] {
            round_trip(input);
        }
    }

    #[test]
    fn empty_language_has_no_regex() {
        let states = vec![State::new(0, "0".into(), false)];
        let fa = FiniteAutomaton::new(
            0,
            states,
            Language::new(BTreeSet::from([Symbol::sym('a')])),
        );
        assert!(matches!(fa.to_regex(), Err(ObjectError::EmptyLanguage)));
    }
}
