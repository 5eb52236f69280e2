//! Object types, runtime values and the closed operation table.
//!
//! DFA and NFA are distinct types for static planning although both are
//! carried by `FiniteAutomaton` at runtime; a DFA is accepted wherever an
//! NFA is expected. Operations are a closed enumeration with a static
//! signature table, so the planner is total and the evaluator exhaustive.

use std::fmt;

use indexmap::IndexMap;
use ravel_objects::{FiniteAutomaton, Regex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectType {
    Regex,
    Nfa,
    Dfa,
    Int,
    Bool,
    Value,
    FileName,
}

impl ObjectType {
    /// Input unification with the DFA → NFA widening.
    pub fn accepts(self, actual: ObjectType) -> bool {
        self == actual || (self == ObjectType::Nfa && actual == ObjectType::Dfa)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Regex => "Regex",
            ObjectType::Nfa => "NFA",
            ObjectType::Dfa => "DFA",
            ObjectType::Int => "Int",
            ObjectType::Bool => "Bool",
            ObjectType::Value => "Value",
            ObjectType::FileName => "FileName",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug)]
pub enum GeneralObject {
    Regex(Regex),
    Nfa(FiniteAutomaton),
    Dfa(FiniteAutomaton),
    Int(i64),
    Bool(bool),
    Value(String),
    FileName(String),
}

impl GeneralObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            GeneralObject::Regex(_) => ObjectType::Regex,
            GeneralObject::Nfa(_) => ObjectType::Nfa,
            GeneralObject::Dfa(_) => ObjectType::Dfa,
            GeneralObject::Int(_) => ObjectType::Int,
            GeneralObject::Bool(_) => ObjectType::Bool,
            GeneralObject::Value(_) => ObjectType::Value,
            GeneralObject::FileName(_) => ObjectType::FileName,
        }
    }

    pub fn automaton(&self) -> Option<&FiniteAutomaton> {
        match self {
            GeneralObject::Nfa(fa) | GeneralObject::Dfa(fa) => Some(fa),
            _ => None,
        }
    }

    /// Short rendering for log events.
    pub fn render(&self) -> String {
        match self {
            GeneralObject::Regex(r) => {
                let text = r.to_string();
                if text.is_empty() {
                    "ε".to_string()
                } else {
                    text
                }
            }
            GeneralObject::Nfa(fa) => format!("NFA({} states)", fa.states_number()),
            GeneralObject::Dfa(fa) => format!("DFA({} states)", fa.states_number()),
            GeneralObject::Int(n) => n.to_string(),
            GeneralObject::Bool(b) => b.to_string(),
            GeneralObject::Value(v) => v.clone(),
            GeneralObject::FileName(name) => name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    Thompson,
    Glushkov,
    IlieYu,
    Antimirov,
    Arden,
    Determinize,
    Minimize,
    Annote,
    RemEps,
    Reverse,
    MergeBisim,
    Complement,
    Linearize,
    Delinearize,
    DeAnnote,
    Simplify,
    Normalize,
    PumpLength,
    States,
    ClassCard,
    ClassLength,
    MyhillNerode,
    GlaisterShallit,
    Ambiguity,
    Bisimilar,
    Equiv,
    Equal,
    Subset,
    Minimal,
    SemDet,
    OneUnambiguous,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Thompson => "Thompson",
            OpCode::Glushkov => "Glushkov",
            OpCode::IlieYu => "IlieYu",
            OpCode::Antimirov => "Antimirov",
            OpCode::Arden => "Arden",
            OpCode::Determinize => "Determinize",
            OpCode::Minimize => "Minimize",
            OpCode::Annote => "Annote",
            OpCode::RemEps => "RemEps",
            OpCode::Reverse => "Reverse",
            OpCode::MergeBisim => "MergeBisim",
            OpCode::Complement => "Complement",
            OpCode::Linearize => "Linearize",
            OpCode::Delinearize => "DeLinearize",
            OpCode::DeAnnote => "DeAnnote",
            OpCode::Simplify => "Simplify",
            OpCode::Normalize => "Normalize",
            OpCode::PumpLength => "PumpLength",
            OpCode::States => "States",
            OpCode::ClassCard => "ClassCard",
            OpCode::ClassLength => "ClassLength",
            OpCode::MyhillNerode => "MyhillNerode",
            OpCode::GlaisterShallit => "GlaisterShallit",
            OpCode::Ambiguity => "Ambiguity",
            OpCode::Bisimilar => "Bisimilar",
            OpCode::Equiv => "Equiv",
            OpCode::Equal => "Equal",
            OpCode::Subset => "Subset",
            OpCode::Minimal => "Minimal",
            OpCode::SemDet => "SemDet",
            OpCode::OneUnambiguous => "OneUnambiguous",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub code: OpCode,
    pub input: Vec<ObjectType>,
    pub output: ObjectType,
}

impl Signature {
    fn new(code: OpCode, input: Vec<ObjectType>, output: ObjectType) -> Self {
        Signature {
            code,
            input,
            output,
        }
    }

    pub fn is_predicate(&self) -> bool {
        self.output == ObjectType::Bool
    }
}

pub type SignatureTable = IndexMap<&'static str, Vec<Signature>>;

/// The complete operation table, name → overloads. Ambiguous names
/// (`DeLinearize`, `DeAnnote`, the two-argument predicates) list two
/// overloads; the planner disambiguates, never the evaluator.
pub fn signature_table() -> SignatureTable {
    use ObjectType::{Bool, Dfa, FileName, Int, Nfa, Regex, Value};

    let mut table = SignatureTable::new();
    let mut add = |name: &'static str, sigs: Vec<Signature>| {
        table.insert(name, sigs);
    };

    add(
        "Thompson",
        vec![Signature::new(OpCode::Thompson, vec![Regex], Nfa)],
    );
    add(
        "Glushkov",
        vec![Signature::new(OpCode::Glushkov, vec![Regex], Nfa)],
    );
    add(
        "IlieYu",
        vec![Signature::new(OpCode::IlieYu, vec![Regex], Nfa)],
    );
    add(
        "Antimirov",
        vec![Signature::new(OpCode::Antimirov, vec![Regex], Nfa)],
    );
    add("Arden", vec![Signature::new(OpCode::Arden, vec![Nfa], Regex)]);
    add(
        "Determinize",
        vec![Signature::new(OpCode::Determinize, vec![Nfa], Dfa)],
    );
    add(
        "Minimize",
        vec![Signature::new(OpCode::Minimize, vec![Nfa], Dfa)],
    );
    add("Annote", vec![Signature::new(OpCode::Annote, vec![Nfa], Dfa)]);
    add("RemEps", vec![Signature::new(OpCode::RemEps, vec![Nfa], Nfa)]);
    add(
        "Reverse",
        vec![Signature::new(OpCode::Reverse, vec![Nfa], Nfa)],
    );
    add(
        "MergeBisim",
        vec![Signature::new(OpCode::MergeBisim, vec![Nfa], Nfa)],
    );
    add(
        "Complement",
        vec![Signature::new(OpCode::Complement, vec![Dfa], Dfa)],
    );
    add(
        "Linearize",
        vec![Signature::new(OpCode::Linearize, vec![Regex], Regex)],
    );
    add(
        "DeLinearize",
        vec![
            Signature::new(OpCode::Delinearize, vec![Regex], Regex),
            Signature::new(OpCode::Delinearize, vec![Nfa], Nfa),
        ],
    );
    add(
        "DeAnnote",
        vec![
            Signature::new(OpCode::DeAnnote, vec![Regex], Regex),
            Signature::new(OpCode::DeAnnote, vec![Nfa], Nfa),
        ],
    );
    add(
        "Simplify",
        vec![Signature::new(OpCode::Simplify, vec![Regex], Regex)],
    );
    add(
        "Normalize",
        vec![Signature::new(
            OpCode::Normalize,
            vec![Regex, FileName],
            Regex,
        )],
    );
    add(
        "PumpLength",
        vec![Signature::new(OpCode::PumpLength, vec![Regex], Int)],
    );
    add("States", vec![Signature::new(OpCode::States, vec![Nfa], Int)]);
    add(
        "ClassCard",
        vec![Signature::new(OpCode::ClassCard, vec![Dfa], Int)],
    );
    add(
        "ClassLength",
        vec![Signature::new(OpCode::ClassLength, vec![Dfa], Int)],
    );
    add(
        "MyhillNerode",
        vec![Signature::new(OpCode::MyhillNerode, vec![Dfa], Int)],
    );
    add(
        "GlaisterShallit",
        vec![Signature::new(OpCode::GlaisterShallit, vec![Dfa], Int)],
    );
    add(
        "Ambiguity",
        vec![Signature::new(OpCode::Ambiguity, vec![Nfa], Value)],
    );
    add(
        "Bisimilar",
        vec![Signature::new(OpCode::Bisimilar, vec![Nfa, Nfa], Bool)],
    );
    add(
        "Equiv",
        vec![
            Signature::new(OpCode::Equiv, vec![Nfa, Nfa], Bool),
            Signature::new(OpCode::Equiv, vec![Regex, Regex], Bool),
        ],
    );
    add(
        "Equal",
        vec![
            Signature::new(OpCode::Equal, vec![Nfa, Nfa], Bool),
            Signature::new(OpCode::Equal, vec![Regex, Regex], Bool),
        ],
    );
    add(
        "Subset",
        vec![
            Signature::new(OpCode::Subset, vec![Nfa, Nfa], Bool),
            Signature::new(OpCode::Subset, vec![Regex, Regex], Bool),
        ],
    );
    add(
        "Minimal",
        vec![Signature::new(OpCode::Minimal, vec![Nfa], Bool)],
    );
    add("SemDet", vec![Signature::new(OpCode::SemDet, vec![Nfa], Bool)]);
    add(
        "OneUnambiguous",
        vec![
            Signature::new(OpCode::OneUnambiguous, vec![Regex], Bool),
            Signature::new(OpCode::OneUnambiguous, vec![Nfa], Bool),
        ],
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_accepts_dfa_for_nfa() {
        assert!(ObjectType::Nfa.accepts(ObjectType::Dfa));
        assert!(!ObjectType::Dfa.accepts(ObjectType::Nfa));
        assert!(ObjectType::Regex.accepts(ObjectType::Regex));
    }

    #[test]
    fn ambiguous_names_carry_two_overloads() {
        let table = signature_table();
        assert_eq!(table["DeLinearize"].len(), 2);
        assert_eq!(table["DeAnnote"].len(), 2);
        assert_eq!(table["Equiv"].len(), 2);
        assert_eq!(table["Determinize"].len(), 1);
    }
}
