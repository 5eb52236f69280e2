//! Operation parsing.
//!
//! Three shapes: declarations, the reserved `Test` form, and bare
//! predicates. The parser types identifiers statically (each declaration
//! records its result type) and hands function chains to the planner, so a
//! parsed operation is already executable.

use rustc_hash::FxHashMap;

use ravel_objects::Regex;

use crate::ast::{Argument, Declaration, Operation, PredicateOp, TestOp};
use crate::error::{InterpError, Result};
use crate::lexer::Token;
use crate::planner::build_function_sequence;
use crate::typing::{ObjectType, SignatureTable};

pub struct Parser<'a> {
    table: &'a SignatureTable,
    id_types: &'a mut FxHashMap<String, ObjectType>,
}

impl<'a> Parser<'a> {
    pub fn new(
        table: &'a SignatureTable,
        id_types: &'a mut FxHashMap<String, ObjectType>,
    ) -> Self {
        Parser { table, id_types }
    }

    pub fn parse_operation(&mut self, tokens: &[Token]) -> Result<Operation> {
        match tokens.first() {
            Some(Token::Name(name)) if name == "Test" => self.parse_test(tokens),
            Some(Token::Name(name))
                if self
                    .table
                    .get(name.as_str())
                    .is_some_and(|sigs| sigs[0].is_predicate()) =>
            {
                self.parse_predicate(tokens)
            }
            Some(Token::Name(_)) => self.parse_declaration(tokens),
            _ => Err(InterpError::Parse(
                "an operation starts with an identifier, a predicate or `Test`".into(),
            )),
        }
    }

    /// `Id = (Fn.)* Fn? arg+ (!!)?`
    fn parse_declaration(&mut self, tokens: &[Token]) -> Result<Operation> {
        let Some(Token::Name(id)) = tokens.first() else {
            return Err(InterpError::Parse("missing identifier".into()));
        };
        if tokens.get(1) != Some(&Token::Equals) {
            return Err(InterpError::Parse(format!("expected `=` after `{}`", id)));
        }

        // function chain: known function names separated by dots
        let mut names: Vec<String> = Vec::new();
        let mut cursor = 2;
        while let Some(Token::Name(name)) = tokens.get(cursor) {
            if !self.table.contains_key(name.as_str()) {
                break;
            }
            names.push(name.clone());
            cursor += 1;
            if tokens.get(cursor) == Some(&Token::Dot) {
                cursor += 1;
            } else {
                break;
            }
        }
        // written outermost-first; applied rightmost-first
        names.reverse();

        let (args, arg_types, after_args) = self.parse_arguments(tokens, cursor)?;
        if args.is_empty() {
            return Err(InterpError::Parse("no arguments given".into()));
        }

        let verbose = match tokens.get(after_args) {
            None => false,
            Some(Token::DoubleBang) if after_args + 1 == tokens.len() => true,
            Some(unexpected) => {
                return Err(InterpError::Parse(format!(
                    "unexpected token {:?}",
                    unexpected
                )))
            }
        };

        let functions = build_function_sequence(&names, &arg_types, self.table)?;
        let result_type = functions
            .last()
            .map(|sig| sig.output)
            .unwrap_or(arg_types[0]);
        self.id_types.insert(id.clone(), result_type);

        Ok(Operation::Declaration(Declaration {
            id: id.clone(),
            functions,
            args,
            verbose,
        }))
    }

    /// `Test language test_set iterations`
    fn parse_test(&mut self, tokens: &[Token]) -> Result<Operation> {
        if tokens.len() != 4 {
            return Err(InterpError::Parse(
                "Test takes a language, a test set and an iteration count".into(),
            ));
        }
        let language = self.language_argument(&tokens[1], "language")?;
        let test_set = self.regex_argument(&tokens[2], "test set")?;
        let Token::Number(iterations) = tokens[3] else {
            return Err(InterpError::Parse("iteration count must be a number".into()));
        };
        if iterations < 1 {
            return Err(InterpError::Parse(
                "iteration count must be positive".into(),
            ));
        }
        Ok(Operation::Test(TestOp {
            language,
            test_set,
            iterations: iterations as u32,
        }))
    }

    /// `Pred arg+`
    fn parse_predicate(&mut self, tokens: &[Token]) -> Result<Operation> {
        let Some(Token::Name(name)) = tokens.first() else {
            return Err(InterpError::Parse("missing predicate name".into()));
        };
        let (args, arg_types, after_args) = self.parse_arguments(tokens, 1)?;
        if after_args != tokens.len() {
            return Err(InterpError::Parse(format!(
                "unexpected token after the arguments of `{}`",
                name
            )));
        }
        let sequence = build_function_sequence(
            std::slice::from_ref(name),
            &arg_types,
            self.table,
        )?;
        let signature = sequence
            .into_iter()
            .next()
            .ok_or_else(|| InterpError::Parse("empty predicate".into()))?;
        Ok(Operation::Predicate(PredicateOp {
            signature,
            args,
        }))
    }

    /// Reads arguments from `start`; returns them with their static types
    /// and the index of the first unconsumed token.
    fn parse_arguments(
        &mut self,
        tokens: &[Token],
        start: usize,
    ) -> Result<(Vec<Argument>, Vec<ObjectType>, usize)> {
        let mut args = Vec::new();
        let mut types = Vec::new();
        let mut cursor = start;
        while let Some(token) = tokens.get(cursor) {
            match token {
                Token::Name(name) => {
                    if let Some(&ty) = self.id_types.get(name) {
                        args.push(Argument::Id(name.clone()));
                        types.push(ty);
                    } else if name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
                        // a plain lowercase word in argument position reads
                        // as a regex literal
                        let regex = Regex::from_string(name)
                            .map_err(|e| InterpError::Parse(e.to_string()))?;
                        args.push(Argument::Regex(regex));
                        types.push(ObjectType::Regex);
                    } else {
                        return Err(InterpError::Ref(name.clone()));
                    }
                }
                Token::RegexLit(text) => {
                    let regex = Regex::from_string(text)
                        .map_err(|e| InterpError::Parse(e.to_string()))?;
                    args.push(Argument::Regex(regex));
                    types.push(ObjectType::Regex);
                }
                Token::Number(n) => {
                    args.push(Argument::Int(*n));
                    types.push(ObjectType::Int);
                }
                Token::StringLit(text) => {
                    args.push(Argument::FileName(text.clone()));
                    types.push(ObjectType::FileName);
                }
                _ => break,
            }
            cursor += 1;
        }
        Ok((args, types, cursor))
    }

    fn language_argument(&mut self, token: &Token, what: &str) -> Result<Argument> {
        match token {
            Token::Name(name) => match self.id_types.get(name) {
                Some(ObjectType::Regex | ObjectType::Nfa | ObjectType::Dfa) => {
                    Ok(Argument::Id(name.clone()))
                }
                Some(other) => Err(InterpError::Type(format!(
                    "{} must be a regex or an automaton, `{}` is {}",
                    what, name, other
                ))),
                None if name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) => {
                    Ok(Argument::Regex(
                    Regex::from_string(name)
                        .map_err(|e| InterpError::Parse(e.to_string()))?,
                ))
                }
                None => Err(InterpError::Ref(name.clone())),
            },
            Token::RegexLit(text) => Ok(Argument::Regex(
                Regex::from_string(text).map_err(|e| InterpError::Parse(e.to_string()))?,
            )),
            _ => Err(InterpError::Parse(format!(
                "{} must be a regex or an identifier",
                what
            ))),
        }
    }

    fn regex_argument(&mut self, token: &Token, what: &str) -> Result<Argument> {
        match token {
            Token::Name(name) => match self.id_types.get(name) {
                Some(ObjectType::Regex) => Ok(Argument::Id(name.clone())),
                Some(other) => Err(InterpError::Type(format!(
                    "{} must be a regex, `{}` is {}",
                    what, name, other
                ))),
                None if name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) => {
                    Ok(Argument::Regex(
                    Regex::from_string(name)
                        .map_err(|e| InterpError::Parse(e.to_string()))?,
                ))
                }
                None => Err(InterpError::Ref(name.clone())),
            },
            Token::RegexLit(text) => Ok(Argument::Regex(
                Regex::from_string(text).map_err(|e| InterpError::Parse(e.to_string()))?,
            )),
            _ => Err(InterpError::Parse(format!("{} must be a regex", what))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_line;
    use crate::typing::signature_table;

    fn parse(lines: &[&str]) -> Result<Vec<Operation>> {
        let table = signature_table();
        let mut id_types = FxHashMap::default();
        let mut parser = Parser::new(&table, &mut id_types);
        lines
            .iter()
            .map(|line| parser.parse_operation(&lex_line(line)?))
            .collect()
    }

    #[test]
    fn declaration_with_chain_and_literal() {
        let ops = parse(&["A = Determinize.Thompson a|b"]).unwrap();
        let Operation::Declaration(decl) = &ops[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.id, "A");
        assert_eq!(decl.functions.len(), 2);
        assert_eq!(decl.functions[0].code, crate::typing::OpCode::Thompson);
        assert!(!decl.verbose);
    }

    #[test]
    fn identifiers_gain_static_types() {
        let ops = parse(&["A = Glushkov a|b", "B = Minimize A"]).unwrap();
        let Operation::Declaration(decl) = &ops[1] else {
            panic!("expected declaration");
        };
        assert!(matches!(decl.args[0], Argument::Id(_)));
    }

    #[test]
    fn unknown_identifier_is_a_ref_error() {
        assert!(matches!(
            parse(&["B = Minimize Azerty"]),
            Err(InterpError::Ref(_))
        ));
    }

    #[test]
    fn bare_assignment_keeps_the_argument_type() {
        let ops = parse(&["A = a*b", "P = PumpLength A"]).unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_shape_is_fixed_arity() {
        assert!(parse(&["Test a*b a* 3"]).is_ok());
        assert!(parse(&["Test a*b a*"]).is_err());
        assert!(parse(&["Test a*b a* 0"]).is_err());
    }

    #[test]
    fn predicates_parse_with_overloads() {
        let ops = parse(&["Equiv a|b b|a"]).unwrap();
        let Operation::Predicate(pred) = &ops[0] else {
            panic!("expected predicate");
        };
        assert_eq!(pred.signature.input, vec![ObjectType::Regex, ObjectType::Regex]);
    }

    #[test]
    fn verbose_flag_must_be_trailing() {
        let ops = parse(&["A = Thompson ab !!"]).unwrap();
        let Operation::Declaration(decl) = &ops[0] else {
            panic!("expected declaration");
        };
        assert!(decl.verbose);
        assert!(parse(&["A = Thompson !! ab"]).is_err());
    }

    #[test]
    fn missing_equals_is_a_parse_error() {
        assert!(matches!(
            parse(&["A Thompson ab"]),
            Err(InterpError::Parse(_))
        ));
    }
}
