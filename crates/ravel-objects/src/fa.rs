//! The finite-automaton engine: state graph and the basic transforms.
//!
//! States are stored densely; `states[i].index == i` always holds and every
//! transition points at an existing index. The `label` set remembers where a
//! state came from across merges and determinizations. Transition tables are
//! ordered maps, which together with FIFO subset exploration makes every
//! construction here canonical: the same input produces the same output,
//! state for state.
//!
//! Deep operations never mutate their input; each returns a new automaton.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{ObjectError, Result, STATE_LIMIT};
use crate::language::Language;
use crate::symbol::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub index: usize,
    pub identifier: String,
    pub is_terminal: bool,
    pub label: BTreeSet<usize>,
    pub transitions: BTreeMap<Symbol, BTreeSet<usize>>,
}

impl State {
    pub fn new(index: usize, identifier: String, is_terminal: bool) -> Self {
        State {
            index,
            identifier,
            is_terminal,
            label: BTreeSet::new(),
            transitions: BTreeMap::new(),
        }
    }

    pub fn set_transition(&mut self, to: usize, symbol: Symbol) {
        self.transitions.entry(symbol).or_default().insert(to);
    }

    pub fn targets(&self, symbol: &Symbol) -> Option<&BTreeSet<usize>> {
        self.transitions.get(symbol)
    }
}

#[derive(Clone, Debug)]
pub struct FiniteAutomaton {
    pub(crate) initial_state: usize,
    pub(crate) states: Vec<State>,
    pub(crate) language: Rc<Language>,
}

impl FiniteAutomaton {
    pub fn new(initial_state: usize, states: Vec<State>, language: Rc<Language>) -> Self {
        FiniteAutomaton {
            initial_state,
            states,
            language,
        }
    }

    pub fn from_alphabet(
        initial_state: usize,
        states: Vec<State>,
        alphabet: BTreeSet<Symbol>,
    ) -> Self {
        FiniteAutomaton::new(initial_state, states, Language::new(alphabet))
    }

    pub fn initial(&self) -> usize {
        self.initial_state
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn states_number(&self) -> usize {
        self.states.len()
    }

    pub fn language(&self) -> &Rc<Language> {
        &self.language
    }

    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        self.language.alphabet()
    }

    /// States reachable from `from` along epsilon edges (or along every edge
    /// when `eps_only` is false). The result always contains `from`.
    pub fn closure(&self, from: &BTreeSet<usize>, eps_only: bool) -> BTreeSet<usize> {
        let mut reachable: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = from.iter().copied().collect();
        while let Some(index) = stack.pop() {
            if !reachable.insert(index) {
                continue;
            }
            for (symbol, targets) in &self.states[index].transitions {
                if eps_only && !symbol.is_epsilon() {
                    continue;
                }
                stack.extend(targets.iter().copied());
            }
        }
        reachable
    }

    pub fn is_deterministic(&self) -> bool {
        self.states.iter().all(|state| {
            state.transitions.iter().all(|(symbol, targets)| {
                !symbol.is_epsilon() && targets.len() <= 1
            })
        })
    }

    /// Runs the word over the surface alphabet (tags ignored).
    pub fn accepts(&self, word: &str) -> bool {
        let mut current = self.closure(&BTreeSet::from([self.initial_state]), true);
        for c in word.chars() {
            let mut next = BTreeSet::new();
            for &state in &current {
                for (symbol, targets) in &self.states[state].transitions {
                    if symbol.delinearize().deannote() == Symbol::sym(c) {
                        next.extend(targets.iter().copied());
                    }
                }
            }
            current = self.closure(&next, true);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|&s| self.states[s].is_terminal)
    }

    /// Subset construction over epsilon closures.
    ///
    /// With `is_trim` the empty subset is never materialized, so the result
    /// may be partial; without it the empty subset becomes the absorbing trap
    /// and the transition function is total over the alphabet.
    pub fn determinize(&self, is_trim: bool) -> Result<FiniteAutomaton> {
        let alphabet: Vec<Symbol> = self.alphabet().iter().copied().collect();
        let start = self.closure(&BTreeSet::from([self.initial_state]), true);

        let mut subset_index: FxHashMap<BTreeSet<usize>, usize> = FxHashMap::default();
        let mut states: Vec<State> = Vec::new();
        let mut subsets: Vec<BTreeSet<usize>> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();

        let mut intern = |subset: BTreeSet<usize>,
                          states: &mut Vec<State>,
                          subsets: &mut Vec<BTreeSet<usize>>,
                          queue: &mut VecDeque<usize>|
         -> Result<usize> {
            if let Some(&index) = subset_index.get(&subset) {
                return Ok(index);
            }
            let index = states.len();
            if index >= STATE_LIMIT {
                return Err(ObjectError::StateLimit { limit: STATE_LIMIT });
            }
            let identifier = subset
                .iter()
                .map(|&i| self.states[i].identifier.clone())
                .collect::<Vec<_>>()
                .join(", ");
            let mut state = State::new(index, identifier, false);
            state.is_terminal = subset.iter().any(|&i| self.states[i].is_terminal);
            state.label = subset.clone();
            subset_index.insert(subset.clone(), index);
            states.push(state);
            subsets.push(subset);
            queue.push_back(index);
            Ok(index)
        };

        intern(start, &mut states, &mut subsets, &mut queue)?;
        while let Some(index) = queue.pop_front() {
            let subset = subsets[index].clone();
            for symbol in &alphabet {
                let mut moved = BTreeSet::new();
                for &i in &subset {
                    if let Some(targets) = self.states[i].targets(symbol) {
                        moved.extend(targets.iter().copied());
                    }
                }
                let next = self.closure(&moved, true);
                if next.is_empty() && is_trim {
                    continue;
                }
                let target = intern(next, &mut states, &mut subsets, &mut queue)?;
                states[index].set_transition(target, *symbol);
            }
        }

        Ok(FiniteAutomaton::new(0, states, self.language.clone()))
    }

    /// Removes epsilon edges: every state gets, on symbol `a`, the closure of
    /// the `a`-image of its closure; it accepts iff its closure contained an
    /// accepting state.
    pub fn remove_eps(&self) -> FiniteAutomaton {
        let alphabet: Vec<Symbol> = self.alphabet().iter().copied().collect();
        let mut states: Vec<State> = self
            .states
            .iter()
            .map(|s| {
                let mut copy = State::new(s.index, s.identifier.clone(), s.is_terminal);
                copy.label = s.label.clone();
                copy
            })
            .collect();

        for i in 0..self.states.len() {
            let around = self.closure(&BTreeSet::from([i]), true);
            states[i].is_terminal = around.iter().any(|&t| self.states[t].is_terminal);
            for symbol in &alphabet {
                let mut moved = BTreeSet::new();
                for &t in &around {
                    if let Some(targets) = self.states[t].targets(symbol) {
                        moved.extend(targets.iter().copied());
                    }
                }
                for target in self.closure(&moved, true) {
                    states[i].set_transition(target, *symbol);
                }
            }
        }
        FiniteAutomaton::new(self.initial_state, states, self.language.clone())
    }

    /// Myhill-Nerode minimization. The canonical result is cached in the
    /// language; a second call on any automaton of the same language returns
    /// the cached machine.
    pub fn minimize(&self) -> Result<FiniteAutomaton> {
        if let Some(min) = self.language.min_dfa() {
            return Ok(min);
        }
        let dfa = self.determinize(false)?;
        let n = dfa.states.len();
        let alphabet: Vec<Symbol> = dfa.alphabet().iter().copied().collect();

        // distinguishability table, seeded by the accepting flag
        let mut marked = vec![false; n * n];
        for i in 0..n {
            for j in 0..i {
                if dfa.states[i].is_terminal != dfa.states[j].is_terminal {
                    marked[i * n + j] = true;
                }
            }
        }
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..n {
                for j in 0..i {
                    if marked[i * n + j] {
                        continue;
                    }
                    for symbol in &alphabet {
                        let ti = dfa.sole_target(i, symbol);
                        let tj = dfa.sole_target(j, symbol);
                        let (hi, lo) = if ti >= tj { (ti, tj) } else { (tj, ti) };
                        if hi != lo && marked[hi * n + lo] {
                            marked[i * n + j] = true;
                            changed = true;
                            break;
                        }
                    }
                }
            }
        }

        // merge unmarked pairs with a union-find
        let mut parent: Vec<usize> = (0..n).collect();
        fn find(parent: &mut Vec<usize>, mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for i in 0..n {
            for j in 0..i {
                if !marked[i * n + j] {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        let (hi, lo) = if ri >= rj { (ri, rj) } else { (rj, ri) };
                        parent[hi] = lo;
                    }
                }
            }
        }
        let mut class_of = vec![0usize; n];
        let mut class_ids: FxHashMap<usize, usize> = FxHashMap::default();
        for i in 0..n {
            let root = find(&mut parent, i);
            let next = class_ids.len();
            class_of[i] = *class_ids.entry(root).or_insert(next);
        }

        let merged = dfa.merge_equivalent_classes(&class_of);
        let mut trimmed = merged.remove_trap_states();
        for (i, state) in trimmed.states.iter_mut().enumerate() {
            state.identifier = i.to_string();
        }
        self.language
            .set_min_dfa(trimmed.initial_state, &trimmed.states);
        Ok(trimmed)
    }

    /// Quotient by a state partition: `classes[i]` is the class of state `i`.
    pub fn merge_equivalent_classes(&self, classes: &[usize]) -> FiniteAutomaton {
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &class) in classes.iter().enumerate() {
            members.entry(class).or_default().push(i);
        }
        let index_of: BTreeMap<usize, usize> = members
            .keys()
            .enumerate()
            .map(|(new, &class)| (class, new))
            .collect();

        let mut states: Vec<State> = members
            .iter()
            .map(|(&class, group)| {
                let identifier = group
                    .iter()
                    .map(|&i| self.states[i].identifier.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut state = State::new(
                    index_of[&class],
                    identifier,
                    group.iter().any(|&i| self.states[i].is_terminal),
                );
                state.label = group.iter().copied().collect();
                state
            })
            .collect();

        for (i, state) in self.states.iter().enumerate() {
            let from = index_of[&classes[i]];
            for (symbol, targets) in &state.transitions {
                for &t in targets {
                    states[from].set_transition(index_of[&classes[t]], *symbol);
                }
            }
        }
        FiniteAutomaton::new(
            index_of[&classes[self.initial_state]],
            states,
            self.language.clone(),
        )
    }

    /// Intersection: accepts `L(a) ∩ L(b)`.
    pub fn intersection(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Result<FiniteAutomaton> {
        FiniteAutomaton::product(a, b, |t1, t2| t1 && t2)
    }

    /// Union: accepts `L(a) ∪ L(b)`.
    pub fn union_fa(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Result<FiniteAutomaton> {
        FiniteAutomaton::product(a, b, |t1, t2| t1 || t2)
    }

    /// Difference: accepts `L(a) \ L(b)`.
    pub fn difference(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Result<FiniteAutomaton> {
        FiniteAutomaton::product(a, b, |t1, t2| t1 && !t2)
    }

    fn product(
        a: &FiniteAutomaton,
        b: &FiniteAutomaton,
        accept: fn(bool, bool) -> bool,
    ) -> Result<FiniteAutomaton> {
        let mut alphabet = a.alphabet().clone();
        alphabet.extend(b.alphabet().iter().copied());

        let da = FiniteAutomaton::new(
            a.initial_state,
            a.states.clone(),
            Language::new(alphabet.clone()),
        )
        .determinize(false)?;
        let db = FiniteAutomaton::new(
            b.initial_state,
            b.states.clone(),
            Language::new(alphabet.clone()),
        )
        .determinize(false)?;

        let nb = db.states.len();
        if da.states.len().saturating_mul(nb) > STATE_LIMIT {
            return Err(ObjectError::StateLimit { limit: STATE_LIMIT });
        }
        let mut states = Vec::with_capacity(da.states.len() * nb);
        for (i, s1) in da.states.iter().enumerate() {
            for (j, s2) in db.states.iter().enumerate() {
                let index = i * nb + j;
                let mut state = State::new(
                    index,
                    format!("{}, {}", s1.identifier, s2.identifier),
                    accept(s1.is_terminal, s2.is_terminal),
                );
                state.label = BTreeSet::from([i, j]);
                for symbol in &alphabet {
                    let target = da.sole_target(i, symbol) * nb + db.sole_target(j, symbol);
                    state.set_transition(target, *symbol);
                }
                states.push(state);
            }
        }
        let product = FiniteAutomaton::new(
            da.initial_state * nb + db.initial_state,
            states,
            Language::new(alphabet),
        );
        Ok(product.determinize(true)?.remove_trap_states())
    }

    /// Complement of a DFA: totalize, then flip every accepting flag. The
    /// result denotes a different language and gets a fresh cache.
    pub fn complement(&self) -> FiniteAutomaton {
        let total = self.add_trap_state();
        let mut states = total.states;
        for state in &mut states {
            state.is_terminal = !state.is_terminal;
        }
        FiniteAutomaton::new(
            total.initial_state,
            states,
            Language::new(self.alphabet().clone()),
        )
    }

    /// Mirror language: a fresh initial state is epsilon-linked to the old
    /// accepting states, every edge is flipped, and the old initial state
    /// becomes the only accepting one.
    pub fn reverse(&self) -> FiniteAutomaton {
        let mut states = Vec::with_capacity(self.states.len() + 1);
        states.push(State::new(0, "S".to_string(), false));
        for old in &self.states {
            let mut state = State::new(old.index + 1, old.identifier.clone(), false);
            state.label = old.label.clone();
            states.push(state);
        }
        for old in &self.states {
            if old.is_terminal {
                states[0].set_transition(old.index + 1, Symbol::Epsilon);
            }
            for (symbol, targets) in &old.transitions {
                for &t in targets {
                    states[t + 1].set_transition(old.index + 1, *symbol);
                }
            }
        }
        states[self.initial_state + 1].is_terminal = true;
        FiniteAutomaton::new(0, states, Language::new(self.alphabet().clone()))
    }

    /// Adds the absorbing non-accepting state wherever the transition
    /// function is partial. Already-total automata are returned unchanged.
    pub fn add_trap_state(&self) -> FiniteAutomaton {
        let alphabet: Vec<Symbol> = self.alphabet().iter().copied().collect();
        let needs_trap = self.states.iter().any(|s| {
            alphabet
                .iter()
                .any(|sym| s.targets(sym).map_or(true, |t| t.is_empty()))
        });
        if !needs_trap {
            return self.clone();
        }
        let mut states = self.states.clone();
        let trap = states.len();
        let mut trap_state = State::new(trap, "trap".to_string(), false);
        for symbol in &alphabet {
            trap_state.set_transition(trap, *symbol);
        }
        for state in &mut states {
            for symbol in &alphabet {
                if state.targets(symbol).map_or(true, |t| t.is_empty()) {
                    state.set_transition(trap, *symbol);
                }
            }
        }
        states.push(trap_state);
        FiniteAutomaton::new(self.initial_state, states, self.language.clone())
    }

    /// Drops states that are unreachable from the initial state or cannot
    /// reach an accepting state. The initial state itself is always kept.
    pub fn remove_trap_states(&self) -> FiniteAutomaton {
        let reachable = self.closure(&BTreeSet::from([self.initial_state]), false);

        // reverse reachability from the accepting states
        let mut coreachable: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = self
            .states
            .iter()
            .filter(|s| s.is_terminal)
            .map(|s| s.index)
            .collect();
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        for state in &self.states {
            for targets in state.transitions.values() {
                for &t in targets {
                    incoming[t].push(state.index);
                }
            }
        }
        while let Some(index) = stack.pop() {
            if !coreachable.insert(index) {
                continue;
            }
            stack.extend(incoming[index].iter().copied());
        }

        let kept: Vec<usize> = (0..self.states.len())
            .filter(|&i| {
                reachable.contains(&i) && (coreachable.contains(&i) || i == self.initial_state)
            })
            .collect();
        let index_of: FxHashMap<usize, usize> =
            kept.iter().enumerate().map(|(new, &old)| (old, new)).collect();

        let states: Vec<State> = kept
            .iter()
            .enumerate()
            .map(|(new, &old)| {
                let source = &self.states[old];
                let mut state = State::new(new, source.identifier.clone(), source.is_terminal);
                state.label = source.label.clone();
                for (symbol, targets) in &source.transitions {
                    for t in targets {
                        if let Some(&mapped) = index_of.get(t) {
                            state.set_transition(mapped, *symbol);
                        }
                    }
                }
                state
            })
            .collect();
        FiniteAutomaton::new(index_of[&self.initial_state], states, self.language.clone())
    }

    /// Tags the symbols on non-deterministic branches with distinct
    /// annotation indices; epsilon edges become annotated letters. The result
    /// is deterministic over the annotated alphabet.
    pub fn annote(&self) -> FiniteAutomaton {
        let mut states: Vec<State> = self
            .states
            .iter()
            .map(|s| {
                let mut copy = State::new(s.index, s.identifier.clone(), s.is_terminal);
                copy.label = s.label.clone();
                copy
            })
            .collect();
        for (i, state) in self.states.iter().enumerate() {
            for (symbol, targets) in &state.transitions {
                if targets.len() > 1 || symbol.is_epsilon() {
                    for (k, &t) in targets.iter().enumerate() {
                        states[i].set_transition(t, symbol.annote(k as u32 + 1));
                    }
                } else {
                    for &t in targets {
                        states[i].set_transition(t, *symbol);
                    }
                }
            }
        }
        let alphabet = collect_alphabet(&states);
        FiniteAutomaton::new(self.initial_state, states, Language::new(alphabet))
    }

    /// Strips annotation tags and merges the edges back together.
    pub fn deannote(&self) -> FiniteAutomaton {
        self.map_symbols(|s| s.deannote())
    }

    /// Strips linearization tags and merges the edges back together.
    pub fn delinearize(&self) -> FiniteAutomaton {
        self.map_symbols(|s| s.delinearize())
    }

    fn map_symbols(&self, f: impl Fn(&Symbol) -> Symbol) -> FiniteAutomaton {
        let states: Vec<State> = self
            .states
            .iter()
            .map(|s| {
                let mut state = State::new(s.index, s.identifier.clone(), s.is_terminal);
                state.label = s.label.clone();
                for (symbol, targets) in &s.transitions {
                    for &t in targets {
                        state.set_transition(t, f(symbol));
                    }
                }
                state
            })
            .collect();
        let alphabet = collect_alphabet(&states);
        FiniteAutomaton::new(self.initial_state, states, Language::new(alphabet))
    }

    pub fn is_empty(&self) -> bool {
        let reachable = self.closure(&BTreeSet::from([self.initial_state]), false);
        !reachable.iter().any(|&i| self.states[i].is_terminal)
    }

    pub fn is_dfa_minimal(&self) -> Result<bool> {
        Ok(self.minimize()?.states_number() == self.states_number())
    }

    /// NFA minimality through the Glaister-Shallit lower bound: conclusive
    /// only when the bound is attained.
    pub fn is_nfa_minimal(&self) -> Result<Option<bool>> {
        let bound = self.classes_number_glaister_shallit()?;
        if self.states_number() == bound {
            Ok(Some(true))
        } else {
            Ok(None)
        }
    }

    /// The Glaister-Shallit bound: the size of a largest fooling set built
    /// from shortest prefixes and suffixes of the minimal DFA states. Cached
    /// in the language as the minimum NFA size.
    pub fn classes_number_glaister_shallit(&self) -> Result<usize> {
        if let Some(size) = self.language.nfa_minimum_size() {
            return Ok(size);
        }
        let min = self.minimize()?;
        let n = min.states_number();
        if n > 64 {
            return Err(ObjectError::StateLimit { limit: 64 });
        }
        let prefixes = min.shortest_words_from_initial();
        let suffixes = min.shortest_words_to_accepting();

        let mut compatible = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (Some(pi), Some(sj)) = (&prefixes[i], &suffixes[j]) else {
                    continue;
                };
                let (Some(pj), Some(si)) = (&prefixes[j], &suffixes[i]) else {
                    continue;
                };
                let cross_a = min.accepts(&format!("{}{}", pi, sj));
                let cross_b = min.accepts(&format!("{}{}", pj, si));
                if !cross_a || !cross_b {
                    compatible[i] |= 1 << j;
                }
            }
        }
        let usable: Vec<usize> = (0..n)
            .filter(|&i| prefixes[i].is_some() && suffixes[i].is_some())
            .collect();
        let mut best = 0usize;
        let mut chosen = Vec::new();
        max_fooling_set(&usable, 0, &mut chosen, &compatible, &mut best);
        self.language.set_nfa_minimum_size(best);
        Ok(best)
    }

    /// Shortest word reaching each state from the initial one, over the
    /// surface alphabet.
    fn shortest_words_from_initial(&self) -> Vec<Option<String>> {
        let mut words: Vec<Option<String>> = vec![None; self.states.len()];
        let mut queue = VecDeque::from([self.initial_state]);
        words[self.initial_state] = Some(String::new());
        while let Some(i) = queue.pop_front() {
            let prefix = words[i].clone().unwrap_or_default();
            for (symbol, targets) in &self.states[i].transitions {
                let Some(base) = symbol.base() else { continue };
                for &t in targets {
                    if words[t].is_none() {
                        words[t] = Some(format!("{}{}", prefix, base));
                        queue.push_back(t);
                    }
                }
            }
        }
        words
    }

    /// Shortest accepted word from each state, over the surface alphabet.
    fn shortest_words_to_accepting(&self) -> Vec<Option<String>> {
        let mut words: Vec<Option<String>> = vec![None; self.states.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for state in &self.states {
            if state.is_terminal {
                words[state.index] = Some(String::new());
                queue.push_back(state.index);
            }
        }
        while let Some(t) = queue.pop_front() {
            let suffix = words[t].clone().unwrap_or_default();
            for state in &self.states {
                for (symbol, targets) in &state.transitions {
                    let Some(base) = symbol.base() else { continue };
                    if targets.contains(&t) && words[state.index].is_none() {
                        words[state.index] = Some(format!("{}{}", base, suffix));
                        queue.push_back(state.index);
                    }
                }
            }
        }
        words
    }

    /// The unique target of a symbol in a total deterministic automaton.
    pub(crate) fn sole_target(&self, state: usize, symbol: &Symbol) -> usize {
        self.states[state]
            .targets(symbol)
            .and_then(|t| t.iter().next())
            .copied()
            .unwrap_or(state)
    }
}

fn collect_alphabet(states: &[State]) -> BTreeSet<Symbol> {
    states
        .iter()
        .flat_map(|s| s.transitions.keys().copied())
        .filter(|s| !s.is_epsilon())
        .collect()
}

fn max_fooling_set(
    candidates: &[usize],
    from: usize,
    chosen: &mut Vec<usize>,
    compatible: &[u64],
    best: &mut usize,
) {
    *best = (*best).max(chosen.len());
    for k in from..candidates.len() {
        let candidate = candidates[k];
        if chosen
            .iter()
            .all(|&c| compatible[c] & (1 << candidate) != 0)
        {
            chosen.push(candidate);
            max_fooling_set(candidates, k + 1, chosen, compatible, best);
            chosen.pop();
        }
    }
}

impl fmt::Display for FiniteAutomaton {
    /// Graphviz rendering, used by the log sinks.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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
            for (symbol, targets) in &state.transitions {
                for t in targets {
                    writeln!(f, "\t{} -> {} [label = \"{}\"]", state.index, t, symbol)?;
                }
            }
        }
        write!(f, "}}")
    }
}
