//! Memory-augmented finite automata.
//!
//! An MFA transition extends a plain one with the sets of memory cells it
//! opens and closes. The structure is built from a `BackRefRegex` or by the
//! random generator; running words through it is out of scope.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::language::Language;
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MfaTransition {
    pub to: usize,
    pub open: BTreeSet<u32>,
    pub close: BTreeSet<u32>,
}

impl MfaTransition {
    pub fn plain(to: usize) -> Self {
        MfaTransition {
            to,
            open: BTreeSet::new(),
            close: BTreeSet::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MfaState {
    pub index: usize,
    pub identifier: String,
    pub is_terminal: bool,
    pub transitions: BTreeMap<Symbol, Vec<MfaTransition>>,
}

impl MfaState {
    pub fn new(index: usize, identifier: String, is_terminal: bool) -> Self {
        MfaState {
            index,
            identifier,
            is_terminal,
            transitions: BTreeMap::new(),
        }
    }

    pub fn add_transition(&mut self, symbol: Symbol, transition: MfaTransition) {
        self.transitions.entry(symbol).or_default().push(transition);
    }
}

#[derive(Clone, Debug)]
pub struct MemoryFiniteAutomaton {
    initial_state: usize,
    states: Vec<MfaState>,
    language: Rc<Language>,
}

impl MemoryFiniteAutomaton {
    pub fn new(initial_state: usize, states: Vec<MfaState>, language: Rc<Language>) -> Self {
        MemoryFiniteAutomaton {
            initial_state,
            states,
            language,
        }
    }

    pub fn initial(&self) -> usize {
        self.initial_state
    }

    pub fn states(&self) -> &[MfaState] {
        &self.states
    }

    pub fn states_number(&self) -> usize {
        self.states.len()
    }

    pub fn language(&self) -> &Rc<Language> {
        &self.language
    }

    /// Every memory cell mentioned by some transition.
    pub fn memory_cells(&self) -> BTreeSet<u32> {
        let mut cells = BTreeSet::new();
        for state in &self.states {
            for (symbol, transitions) in &state.transitions {
                if let Symbol::Ref(cell) = symbol {
                    cells.insert(*cell);
                }
                for t in transitions {
                    cells.extend(t.open.iter().copied());
                    cells.extend(t.close.iter().copied());
                }
            }
        }
        cells
    }
}

impl fmt::Display for MemoryFiniteAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn cells(set: &BTreeSet<u32>) -> String {
            set.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",")
        }
        writeln!(f, "digraph {{")?;
        writeln!(f, "\trankdir = LR")?;
        writeln!(f, "\tdummy [label = \"\", shape = none]")?;
        for state in &self.states {
            writeln!(
                f,
                "\t{} [label = \"{}\", shape = {}]",
                state.index,
                state.identifier,
                if state.is_terminal {
                    "doublecircle"
                } else {
                    "circle"
                }
            )?;
        }
        writeln!(f, "\tdummy -> {}", self.initial_state)?;
        for state in &self.states {
            for (symbol, transitions) in &state.transitions {
                for t in transitions {
                    let mut decorations = String::new();
                    if !t.open.is_empty() {
                        decorations.push_str(&format!(" o:{}", cells(&t.open)));
                    }
                    if !t.close.is_empty() {
                        decorations.push_str(&format!(" c:{}", cells(&t.close)));
                    }
                    writeln!(
                        f,
                        "\t{} -> {} [label = \"{}{}\"]",
                        state.index, t.to, symbol, decorations
                    )?;
                }
            }
        }
        write!(f, "}}")
    }
}
