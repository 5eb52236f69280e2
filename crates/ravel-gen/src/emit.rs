//! Plain text serialization of generated machines.
//!
//! The surface format is a simple state and edge listing; the grammar-driven
//! emitter that renders course hand-outs consumes this and lives outside
//! this crate.

use std::fmt::Write as _;

use crate::Generated;

pub fn render_text(generated: &Generated) -> String {
    let mut out = String::new();
    match generated {
        Generated::Automaton(fa) => {
            let kind = if fa.is_deterministic() { "DFA" } else { "NFA" };
            let _ = writeln!(out, "{} {}", kind, fa.states_number());
            let _ = writeln!(out, "initial {}", fa.initial());
            let finals: Vec<String> = fa
                .states()
                .iter()
                .filter(|s| s.is_terminal)
                .map(|s| s.index.to_string())
                .collect();
            let _ = writeln!(out, "final {}", finals.join(" "));
            for state in fa.states() {
                for (symbol, targets) in &state.transitions {
                    for t in targets {
                        let _ = writeln!(out, "{} {} {}", state.index, symbol, t);
                    }
                }
            }
        }
        Generated::Memory(mfa) => {
            let _ = writeln!(out, "MFA {}", mfa.states_number());
            let _ = writeln!(out, "initial {}", mfa.initial());
            let finals: Vec<String> = mfa
                .states()
                .iter()
                .filter(|s| s.is_terminal)
                .map(|s| s.index.to_string())
                .collect();
            let _ = writeln!(out, "final {}", finals.join(" "));
            for state in mfa.states() {
                for (symbol, transitions) in &state.transitions {
                    for t in transitions {
                        let opens: Vec<String> =
                            t.open.iter().map(|c| c.to_string()).collect();
                        let closes: Vec<String> =
                            t.close.iter().map(|c| c.to_string()).collect();
                        let _ = writeln!(
                            out,
                            "{} {} {} o[{}] c[{}]",
                            state.index,
                            symbol,
                            t.to,
                            opens.join(","),
                            closes.join(",")
                        );
                    }
                }
            }
        }
    }
    out
}
