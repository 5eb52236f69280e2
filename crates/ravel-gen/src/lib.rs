//! ravel-gen - Random Automaton Construction
//!
//! Builds random NFAs, DFAs and memory automata. The construction goes
//! skeleton first: an edge count is drawn, connectivity is forced by
//! steering each next edge towards a still-unused state, then accepting
//! states are seeded until every state can reach one, memory cells are
//! colored onto edges (MFA only) and finally symbols are drawn. The caller
//! supplies the random source, so generation is reproducible from a seed.

use std::collections::BTreeSet;

use rand::Rng;
use thiserror::Error;

use ravel_objects::{
    FiniteAutomaton, Language, MemoryFiniteAutomaton, MfaState, MfaTransition, State, Symbol,
};

mod emit;

pub use emit::render_text;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Nfa,
    Dfa,
    Mfa,
}

#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// Either of the two machine families the generator can produce.
#[derive(Clone, Debug)]
pub enum Generated {
    Automaton(FiniteAutomaton),
    Memory(MemoryFiniteAutomaton),
}

/// One raw edge of the skeleton, before conversion to a machine.
#[derive(Clone, Debug)]
struct RawTransition {
    end: usize,
    symbol: Symbol,
    open: BTreeSet<u32>,
    close: BTreeSet<u32>,
}

/// Cell status per state during coloring: 0 white, 1 red, 2 yellow.
type Coloring = Vec<Vec<u8>>;

#[derive(Clone, Debug)]
pub struct AutomatonGeneratorBuilder {
    kind: TargetKind,
    states_number: usize,
    final_probability: u32,
    epsilon_probability: u32,
    ref_probability: u32,
    colors: usize,
    colors_tries: usize,
    max_alphabet_size: usize,
}

impl AutomatonGeneratorBuilder {
    pub fn new(kind: TargetKind, states_number: usize) -> Self {
        AutomatonGeneratorBuilder {
            kind,
            states_number,
            final_probability: 20,
            epsilon_probability: 10,
            ref_probability: 20,
            colors: 2,
            colors_tries: 8,
            max_alphabet_size: 4,
        }
    }

    pub fn final_probability(mut self, percent: u32) -> Self {
        self.final_probability = percent;
        self
    }

    pub fn epsilon_probability(mut self, percent: u32) -> Self {
        self.epsilon_probability = percent;
        self
    }

    pub fn ref_probability(mut self, percent: u32) -> Self {
        self.ref_probability = percent;
        self
    }

    pub fn colors(mut self, colors: usize) -> Self {
        self.colors = colors;
        self
    }

    pub fn colors_tries(mut self, tries: usize) -> Self {
        self.colors_tries = tries;
        self
    }

    pub fn max_alphabet_size(mut self, size: usize) -> Self {
        self.max_alphabet_size = size;
        self
    }

    pub fn build<R: Rng>(&self, rng: &mut R) -> Result<Generated, GenError> {
        if self.states_number == 0 {
            return Err(GenError::InvalidConfig("at least one state".into()));
        }
        if self.max_alphabet_size == 0 {
            return Err(GenError::InvalidConfig("empty alphabet".into()));
        }
        // per-kind presets: plain automata carry no memory, a DFA no epsilon
        let (colors, colors_tries, epsilon_probability, ref_probability) = match self.kind {
            TargetKind::Mfa => (
                self.colors,
                self.colors_tries,
                self.epsilon_probability,
                self.ref_probability,
            ),
            TargetKind::Nfa => (0, 0, self.epsilon_probability, 0),
            TargetKind::Dfa => (0, 0, 0, 0),
        };

        let alphabet = generate_alphabet(rng, self.max_alphabet_size);
        let mut graph = self.generate_skeleton(rng, &alphabet)?;
        let finals = self.assign_finality(rng, &graph);

        let mut coloring: Coloring = vec![vec![0; self.states_number]; colors];
        for _ in 0..colors_tries {
            if colors == 0 {
                break;
            }
            let color = rng.gen_range(0..colors);
            let candidates: Vec<usize> = (0..self.states_number)
                .filter(|&s| !graph[s].is_empty())
                .collect();
            if candidates.is_empty() {
                break;
            }
            let beg = candidates[rng.gen_range(0..candidates.len())];
            let edge = rng.gen_range(0..graph[beg].len());
            color_transition(&mut coloring, &mut graph, beg, edge, color);
        }

        self.draw_symbols(
            rng,
            &mut graph,
            &coloring,
            &alphabet,
            epsilon_probability,
            ref_probability,
        );

        Ok(self.assemble(graph, finals, alphabet))
    }

    /// Draws an edge count in `[n-1, n(n-1)/2 + 3]` and keeps the graph
    /// connected by steering edges at still-unused states. In DFA mode a
    /// state never gets more outgoing edges than the alphabet has symbols.
    fn generate_skeleton<R: Rng>(
        &self,
        rng: &mut R,
        alphabet: &[Symbol],
    ) -> Result<Vec<Vec<RawTransition>>, GenError> {
        let n = self.states_number;
        let max_edges = n * n.saturating_sub(1) / 2 + 3;
        let mut edges_number = rng.gen_range(n.saturating_sub(1)..=max_edges);
        if self.kind == TargetKind::Dfa {
            let capacity = n * alphabet.len();
            if capacity < n.saturating_sub(1) {
                return Err(GenError::InvalidConfig(
                    "alphabet too small to connect a DFA".into(),
                ));
            }
            edges_number = edges_number.min(capacity);
        }

        let mut graph: Vec<Vec<RawTransition>> = vec![Vec::new(); n];
        let mut included = vec![0usize];
        let mut excluded: Vec<usize> = (1..n).collect();
        let out_cap = if self.kind == TargetKind::Dfa {
            alphabet.len()
        } else {
            usize::MAX
        };

        for _ in 0..edges_number {
            let open_sources: Vec<usize> = included
                .iter()
                .copied()
                .filter(|&s| graph[s].len() < out_cap)
                .collect();
            if open_sources.is_empty() {
                break;
            }
            let beg = open_sources[rng.gen_range(0..open_sources.len())];
            let end = if excluded.is_empty() {
                included[rng.gen_range(0..included.len())]
            } else {
                let pick = rng.gen_range(0..excluded.len());
                let end = excluded.remove(pick);
                included.push(end);
                end
            };
            graph[beg].push(RawTransition {
                end,
                symbol: Symbol::Epsilon,
                open: BTreeSet::new(),
                close: BTreeSet::new(),
            });
        }
        if !excluded.is_empty() {
            return Err(GenError::InvalidConfig(
                "could not connect every state".into(),
            ));
        }
        Ok(graph)
    }

    /// Seeds accepting states by reverse reachability until every state can
    /// reach one, then sprinkles extras by independent trials.
    fn assign_finality<R: Rng>(&self, rng: &mut R, graph: &[Vec<RawTransition>]) -> Vec<bool> {
        let n = self.states_number;
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (beg, edges) in graph.iter().enumerate() {
            for edge in edges {
                predecessors[edge.end].push(beg);
            }
        }

        let mut finals = vec![false; n];
        let mut covered = vec![false; n];
        loop {
            let uncovered: Vec<usize> = (0..n).filter(|&s| !covered[s]).collect();
            if uncovered.is_empty() {
                break;
            }
            let seed = uncovered[rng.gen_range(0..uncovered.len())];
            finals[seed] = true;
            let mut stack = vec![seed];
            covered[seed] = true;
            while let Some(s) = stack.pop() {
                for &p in &predecessors[s] {
                    if !covered[p] {
                        covered[p] = true;
                        stack.push(p);
                    }
                }
            }
        }
        for state in finals.iter_mut() {
            if !*state && dice(rng, self.final_probability) {
                *state = true;
            }
        }
        finals
    }

    fn draw_symbols<R: Rng>(
        &self,
        rng: &mut R,
        graph: &mut [Vec<RawTransition>],
        coloring: &Coloring,
        alphabet: &[Symbol],
        epsilon_probability: u32,
        ref_probability: u32,
    ) {
        for beg in 0..graph.len() {
            for edge in 0..graph[beg].len() {
                let possible_colors: Vec<usize> = (0..coloring.len())
                    .filter(|&color| {
                        !graph[beg][edge].open.contains(&(color as u32))
                            && coloring[color][beg] != 2
                    })
                    .collect();
                let symbol = if !possible_colors.is_empty() && dice(rng, ref_probability) {
                    Symbol::Ref(possible_colors[rng.gen_range(0..possible_colors.len())] as u32)
                } else if dice(rng, epsilon_probability) {
                    Symbol::Epsilon
                } else if self.kind == TargetKind::Dfa {
                    let used: BTreeSet<Symbol> = graph[beg]
                        .iter()
                        .take(edge)
                        .map(|t| t.symbol)
                        .collect();
                    let free: Vec<Symbol> = alphabet
                        .iter()
                        .copied()
                        .filter(|s| !used.contains(s))
                        .collect();
                    free[rng.gen_range(0..free.len())]
                } else {
                    alphabet[rng.gen_range(0..alphabet.len())]
                };
                graph[beg][edge].symbol = symbol;
            }
        }
    }

    fn assemble(
        &self,
        graph: Vec<Vec<RawTransition>>,
        finals: Vec<bool>,
        alphabet: Vec<Symbol>,
    ) -> Generated {
        let language = Language::new(alphabet.into_iter().collect());
        match self.kind {
            TargetKind::Mfa => {
                let mut states: Vec<MfaState> = finals
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| MfaState::new(i, i.to_string(), f))
                    .collect();
                for (beg, edges) in graph.into_iter().enumerate() {
                    for edge in edges {
                        states[beg].add_transition(
                            edge.symbol,
                            MfaTransition {
                                to: edge.end,
                                open: edge.open,
                                close: edge.close,
                            },
                        );
                    }
                }
                Generated::Memory(MemoryFiniteAutomaton::new(0, states, language))
            }
            TargetKind::Nfa | TargetKind::Dfa => {
                let mut states: Vec<State> = finals
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| State::new(i, i.to_string(), f))
                    .collect();
                for (beg, edges) in graph.into_iter().enumerate() {
                    for edge in edges {
                        states[beg].set_transition(edge.end, edge.symbol);
                    }
                }
                Generated::Automaton(FiniteAutomaton::new(0, states, language))
            }
        }
    }
}

fn dice<R: Rng>(rng: &mut R, percentage: u32) -> bool {
    rng.gen_range(0..100) < percentage
}

fn generate_alphabet<R: Rng>(rng: &mut R, max_size: usize) -> Vec<Symbol> {
    let bound = max_size.min(26);
    let size = rng.gen_range(1..=bound);
    ('a'..).take(size).map(Symbol::sym).collect()
}

/// Colors one edge with a memory cell, keeping the white/red/yellow
/// invariants: a self loop on a white state stays uncolored, a red target is
/// never re-entered, entering a non-yellow target closes the cell on all of
/// its outgoing edges.
fn color_transition(
    coloring: &mut Coloring,
    graph: &mut [Vec<RawTransition>],
    beg: usize,
    edge: usize,
    color: usize,
) -> bool {
    let end = graph[beg][edge].end;
    if end == beg && coloring[color][end] == 0 {
        return false;
    }
    if coloring[color][end] == 1 {
        return false;
    }
    graph[beg][edge].close.remove(&(color as u32));
    if coloring[color][beg] != 2 {
        coloring[color][beg] = 1;
        graph[beg][edge].open.insert(color as u32);
    }
    if coloring[color][end] != 2 {
        for transition in graph[end].iter_mut() {
            transition.close.insert(color as u32);
        }
    }
    coloring[color][end] = 2;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn generated_nfa_is_connected() {
        for seed in 0..20 {
            let built = AutomatonGeneratorBuilder::new(TargetKind::Nfa, 6)
                .build(&mut rng(seed))
                .unwrap();
            let Generated::Automaton(fa) = built else {
                panic!("NFA expected");
            };
            assert_eq!(fa.states_number(), 6);
            let reachable = fa.closure(&BTreeSet::from([fa.initial()]), false);
            assert_eq!(reachable.len(), 6, "seed {}", seed);
        }
    }

    #[test]
    fn every_state_reaches_an_accepting_one() {
        for seed in 0..20 {
            let built = AutomatonGeneratorBuilder::new(TargetKind::Nfa, 5)
                .final_probability(0)
                .build(&mut rng(seed))
                .unwrap();
            let Generated::Automaton(fa) = built else {
                panic!("NFA expected");
            };
            let trimmed = fa.remove_trap_states();
            assert_eq!(trimmed.states_number(), 5, "seed {}", seed);
        }
    }

    #[test]
    fn generated_dfa_is_deterministic() {
        for seed in 0..20 {
            let built = AutomatonGeneratorBuilder::new(TargetKind::Dfa, 5)
                .max_alphabet_size(6)
                .build(&mut rng(seed))
                .unwrap();
            let Generated::Automaton(fa) = built else {
                panic!("DFA expected");
            };
            assert!(fa.is_deterministic(), "seed {}", seed);
        }
    }

    #[test]
    fn mfa_cells_stay_in_range() {
        for seed in 0..20 {
            let built = AutomatonGeneratorBuilder::new(TargetKind::Mfa, 6)
                .colors(3)
                .colors_tries(12)
                .build(&mut rng(seed))
                .unwrap();
            let Generated::Memory(mfa) = built else {
                panic!("MFA expected");
            };
            assert!(mfa.memory_cells().iter().all(|&c| c < 3), "seed {}", seed);
        }
    }

    #[test]
    fn generation_is_reproducible_from_the_seed() {
        let a = AutomatonGeneratorBuilder::new(TargetKind::Nfa, 5)
            .build(&mut rng(7))
            .unwrap();
        let b = AutomatonGeneratorBuilder::new(TargetKind::Nfa, 5)
            .build(&mut rng(7))
            .unwrap();
        assert_eq!(render_text(&a), render_text(&b));
    }
}
