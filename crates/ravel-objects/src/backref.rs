//! Regexes with memory writers and back-references.
//!
//! A `BackRefRegex` admits the `[ r ]:k` writer, the `&k` reference and the
//! `^` negation prefix on top of the plain algebra. The only operational
//! semantics attached to it here is the structural construction of a memory
//! automaton.

use std::fmt;
use std::rc::Rc;

use crate::alg_expression::{AlgExpression, Node, ParseFeatures};
use crate::error::Result;
use crate::language::Language;
use crate::mfa::{MemoryFiniteAutomaton, MfaState, MfaTransition};
use crate::symbol::Symbol;

#[derive(Clone, Debug)]
pub struct BackRefRegex {
    tree: AlgExpression,
    language: Rc<Language>,
}

impl BackRefRegex {
    pub fn from_string(input: &str) -> Result<BackRefRegex> {
        let tree = AlgExpression::parse(
            input,
            ParseFeatures {
                allow_ref: true,
                allow_negation: true,
            },
        )?;
        let language = Language::new(tree.alphabet().clone());
        Ok(BackRefRegex { tree, language })
    }

    pub fn tree(&self) -> &AlgExpression {
        &self.tree
    }

    pub fn language(&self) -> &Rc<Language> {
        &self.language
    }

    /// Thompson-style structural construction. A writer `[r]:k` opens cell
    /// `k` on its entry edge and closes it on its exit edge; `&k` becomes a
    /// back-reference transition.
    pub fn to_mfa(&self) -> MemoryFiniteAutomaton {
        let mut states: Vec<MfaState> = Vec::new();
        let (start, end) = fragment(&self.tree, &mut states);
        states[end].is_terminal = true;
        MemoryFiniteAutomaton::new(start, states, self.language.clone())
    }
}

fn fresh(states: &mut Vec<MfaState>) -> usize {
    let index = states.len();
    states.push(MfaState::new(index, index.to_string(), false));
    index
}

fn fragment(tree: &AlgExpression, states: &mut Vec<MfaState>) -> (usize, usize) {
    match tree.node() {
        Node::Eps => {
            let s = fresh(states);
            let e = fresh(states);
            states[s].add_transition(Symbol::Epsilon, MfaTransition::plain(e));
            (s, e)
        }
        Node::Symb(symbol) => {
            let s = fresh(states);
            let e = fresh(states);
            states[s].add_transition(*symbol, MfaTransition::plain(e));
            (s, e)
        }
        Node::Ref(cell) => {
            let s = fresh(states);
            let e = fresh(states);
            states[s].add_transition(Symbol::Ref(*cell), MfaTransition::plain(e));
            (s, e)
        }
        Node::Alt(l, r) => {
            let s = fresh(states);
            let e = fresh(states);
            let (ls, le) = fragment(l, states);
            let (rs, re) = fragment(r, states);
            states[s].add_transition(Symbol::Epsilon, MfaTransition::plain(ls));
            states[s].add_transition(Symbol::Epsilon, MfaTransition::plain(rs));
            states[le].add_transition(Symbol::Epsilon, MfaTransition::plain(e));
            states[re].add_transition(Symbol::Epsilon, MfaTransition::plain(e));
            (s, e)
        }
        Node::Conc(l, r) => {
            let (ls, le) = fragment(l, states);
            let (rs, re) = fragment(r, states);
            states[le].add_transition(Symbol::Epsilon, MfaTransition::plain(rs));
            (ls, re)
        }
        Node::Star(x) | Node::Negation(x) => {
            let s = fresh(states);
            let e = fresh(states);
            let (xs, xe) = fragment(x, states);
            states[s].add_transition(Symbol::Epsilon, MfaTransition::plain(xs));
            states[s].add_transition(Symbol::Epsilon, MfaTransition::plain(e));
            states[xe].add_transition(Symbol::Epsilon, MfaTransition::plain(xs));
            states[xe].add_transition(Symbol::Epsilon, MfaTransition::plain(e));
            (s, e)
        }
        Node::MemoryWriter(cell, x) => {
            let s = fresh(states);
            let e = fresh(states);
            let (xs, xe) = fragment(x, states);
            let mut entry = MfaTransition::plain(xs);
            entry.open.insert(*cell);
            states[s].add_transition(Symbol::Epsilon, entry);
            let mut exit = MfaTransition::plain(e);
            exit.close.insert(*cell);
            states[xe].add_transition(Symbol::Epsilon, exit);
            (s, e)
        }
    }
}

impl fmt::Display for BackRefRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}
