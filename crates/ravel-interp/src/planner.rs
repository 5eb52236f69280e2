//! The typed function-sequence planner.
//!
//! Input: function names in application order plus the actual argument
//! types. The planner resolves each name to a concrete overload (allowing
//! the DFA → NFA widening), then prunes idempotent adjacent pairs until a
//! fixpoint. It is pure: it never evaluates anything.

use crate::error::{InterpError, Result};
use crate::typing::{ObjectType, OpCode, Signature, SignatureTable};

/// Which side of an idempotent pair is redundant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drop {
    Producer,
    Consumer,
}

/// The fixed no-op table over adjacent (producer, consumer) pairs.
fn prune_rule(producer: OpCode, consumer: OpCode) -> Option<Drop> {
    use OpCode::*;
    match (producer, consumer) {
        (Determinize | Annote, Determinize | Minimize | Annote) => Some(Drop::Producer),
        (Minimize, Minimize) => Some(Drop::Producer),
        // the output of Minimize is already deterministic
        (Minimize, Determinize) => Some(Drop::Consumer),
        (Linearize, Glushkov | IlieYu) => Some(Drop::Producer),
        (p, c) if p == c && !matches!(p, Reverse | Complement) => Some(Drop::Producer),
        _ => None,
    }
}

/// Builds the concrete signature list for a chain of function names applied
/// to arguments of the given types.
pub fn build_function_sequence(
    names: &[String],
    arg_types: &[ObjectType],
    table: &SignatureTable,
) -> Result<Vec<Signature>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let resolve = |name: &str, inputs: &[ObjectType]| -> Result<Signature> {
        let overloads = table
            .get(name)
            .ok_or_else(|| InterpError::Type(format!("unknown function `{}`", name)))?;
        overloads
            .iter()
            .find(|sig| {
                sig.input.len() == inputs.len()
                    && sig
                        .input
                        .iter()
                        .zip(inputs)
                        .all(|(expected, &actual)| expected.accepts(actual))
            })
            .cloned()
            .ok_or_else(|| {
                InterpError::Type(format!(
                    "`{}` does not accept ({})",
                    name,
                    inputs
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    };

    let mut sequence = Vec::with_capacity(names.len());
    let first = resolve(&names[0], arg_types)?;
    let mut current = first.output;
    sequence.push(first);
    for name in &names[1..] {
        let sig = resolve(name, &[current]).map_err(|e| match e {
            InterpError::Type(text) => {
                InterpError::Plan(format!("chain breaks at `{}`: {}", name, text))
            }
            other => other,
        })?;
        current = sig.output;
        sequence.push(sig);
    }

    // idempotence pruning to fixpoint
    let mut pruned = true;
    while pruned {
        pruned = false;
        for i in 0..sequence.len().saturating_sub(1) {
            match prune_rule(sequence[i].code, sequence[i + 1].code) {
                Some(Drop::Producer) => {
                    sequence.remove(i);
                    pruned = true;
                    break;
                }
                Some(Drop::Consumer) => {
                    sequence.remove(i + 1);
                    pruned = true;
                    break;
                }
                None => {}
            }
        }
    }

    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::signature_table;

    fn plan(names: &[&str], args: &[ObjectType]) -> Result<Vec<OpCode>> {
        let table = signature_table();
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        build_function_sequence(&names, args, &table)
            .map(|sigs| sigs.iter().map(|s| s.code).collect())
    }

    #[test]
    fn chains_resolve_left_to_right() {
        let codes = plan(&["Thompson", "Determinize"], &[ObjectType::Regex]).unwrap();
        assert_eq!(codes, vec![OpCode::Thompson, OpCode::Determinize]);
    }

    #[test]
    fn determinize_minimize_determinize_plans_to_minimize() {
        let codes = plan(
            &["Determinize", "Minimize", "Determinize"],
            &[ObjectType::Nfa],
        )
        .unwrap();
        assert_eq!(codes, vec![OpCode::Minimize]);
    }

    #[test]
    fn duplicate_functions_collapse_unless_involutive() {
        let codes = plan(&["Minimize", "Minimize"], &[ObjectType::Nfa]).unwrap();
        assert_eq!(codes, vec![OpCode::Minimize]);
        let codes = plan(&["Reverse", "Reverse"], &[ObjectType::Nfa]).unwrap();
        assert_eq!(codes, vec![OpCode::Reverse, OpCode::Reverse]);
    }

    #[test]
    fn linearize_is_absorbed_by_position_constructions() {
        let codes = plan(&["Linearize", "Glushkov"], &[ObjectType::Regex]).unwrap();
        assert_eq!(codes, vec![OpCode::Glushkov]);
        let codes = plan(&["Linearize", "Thompson"], &[ObjectType::Regex]).unwrap();
        assert_eq!(codes, vec![OpCode::Linearize, OpCode::Thompson]);
    }

    #[test]
    fn overloads_pick_the_matching_input_kind() {
        let on_regex = plan(&["DeLinearize"], &[ObjectType::Regex]).unwrap();
        let table = signature_table();
        let sig = build_function_sequence(
            &["DeLinearize".to_string()],
            &[ObjectType::Nfa],
            &table,
        )
        .unwrap();
        assert_eq!(on_regex, vec![OpCode::Delinearize]);
        assert_eq!(sig[0].output, ObjectType::Nfa);
    }

    #[test]
    fn widening_lets_dfa_flow_into_nfa_inputs() {
        let codes = plan(&["RemEps"], &[ObjectType::Dfa]).unwrap();
        assert_eq!(codes, vec![OpCode::RemEps]);
    }

    #[test]
    fn type_mismatches_are_rejected() {
        assert!(matches!(
            plan(&["Determinize"], &[ObjectType::Regex]),
            Err(InterpError::Type(_))
        ));
        assert!(matches!(
            plan(&["Thompson", "PumpLength"], &[ObjectType::Regex]),
            Err(InterpError::Plan(_))
        ));
        assert!(matches!(
            plan(&["Complement"], &[ObjectType::Nfa]),
            Err(InterpError::Type(_))
        ));
    }

    #[test]
    fn planner_output_type_matches_last_signature() {
        let table = signature_table();
        let sigs = build_function_sequence(
            &["Glushkov".to_string(), "Minimize".to_string()],
            &[ObjectType::Regex],
            &table,
        )
        .unwrap();
        assert_eq!(sigs.last().unwrap().output, ObjectType::Dfa);
    }
}
