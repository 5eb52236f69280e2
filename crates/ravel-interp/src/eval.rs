//! The interpreter: object store, evaluation, error recovery.
//!
//! Lines are lexed, parsed (which includes planning) and evaluated one at a
//! time. A failed line is logged and skipped; the interpreter remembers that
//! something went wrong so the process can exit non-zero at the end.
//! Evaluation never leaves partial results behind: the environment binding
//! and the language caches are only touched after an operation fully
//! succeeds.

use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use ravel_objects::{
    load_rewrite_rules, FiniteAutomaton, Regex, TransformationMonoid,
};

use crate::ast::{Argument, Declaration, Operation, PredicateOp, TestOp};
use crate::error::{InterpError, LineError, Result};
use crate::lexer::lex_line;
use crate::logger::{LogEvent, LogMode, LogSink, Logger};
use crate::parser::Parser;
use crate::tester::{run_test, TestLanguage};
use crate::typing::{signature_table, GeneralObject, ObjectType, OpCode, Signature, SignatureTable};

pub struct Interpreter {
    table: SignatureTable,
    id_types: FxHashMap<String, ObjectType>,
    objects: IndexMap<String, GeneralObject>,
    logger: Logger,
    had_error: bool,
}

impl Interpreter {
    pub fn new(mode: LogMode) -> Self {
        Interpreter {
            table: signature_table(),
            id_types: FxHashMap::default(),
            objects: IndexMap::new(),
            logger: Logger::new(mode),
            had_error: false,
        }
    }

    pub fn with_sink(mode: LogMode, sink: Box<dyn LogSink>) -> Self {
        let mut interpreter = Interpreter::new(mode);
        interpreter.logger = Logger::with_sink(mode, sink);
        interpreter
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn object(&self, id: &str) -> Option<&GeneralObject> {
        self.objects.get(id)
    }

    /// Interprets one line. Blank lines and `#` comments are no-ops.
    pub fn run_line(&mut self, line: &str, line_number: usize) -> std::result::Result<(), LineError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }
        let outcome = self.run_trimmed(trimmed);
        if let Err(error) = outcome {
            self.had_error = true;
            self.logger
                .log(LogEvent::Error(format!("line {}: {}", line_number, error)));
            return Err(LineError {
                line: line_number,
                error,
            });
        }
        Ok(())
    }

    fn run_trimmed(&mut self, line: &str) -> Result<()> {
        let tokens = lex_line(line)?;
        let operation = {
            let mut parser = Parser::new(&self.table, &mut self.id_types);
            parser.parse_operation(&tokens)?
        };
        self.run_operation(&operation)
    }

    /// Interprets a whole script; returns whether every line succeeded.
    pub fn run_file(&mut self, path: &Path) -> std::io::Result<bool> {
        let text = std::fs::read_to_string(path)?;
        self.logger.log(LogEvent::Message(format!(
            "loading {}",
            path.display()
        )));
        for (i, line) in text.lines().enumerate() {
            let _ = self.run_line(line, i + 1);
        }
        Ok(!self.had_error)
    }

    pub fn run_operation(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::Declaration(decl) => self.run_declaration(decl),
            Operation::Predicate(pred) => self.run_predicate(pred),
            Operation::Test(test) => self.run_test(test),
        }
    }

    fn run_declaration(&mut self, decl: &Declaration) -> Result<()> {
        let _activation = self.logger.activation(decl.verbose);
        let _scope = self.logger.scope();
        let mut value = self.resolve_arguments(&decl.args)?;
        for signature in &decl.functions {
            let result = self.apply_function(signature, &value)?;
            value = vec![result];
        }
        let result = value.into_iter().next().ok_or_else(|| {
            InterpError::Plan("declaration produced no value".into())
        })?;
        self.logger.log(LogEvent::Assigned {
            id: decl.id.clone(),
            value: result.render(),
        });
        self.objects.insert(decl.id.clone(), result);
        Ok(())
    }

    fn run_predicate(&mut self, pred: &PredicateOp) -> Result<()> {
        let _activation = self.logger.activation(true);
        let _scope = self.logger.scope();
        let args = self.resolve_arguments(&pred.args)?;
        let result = self.apply_function(&pred.signature, &args)?;
        self.logger.log(LogEvent::Message(format!(
            "{}: {}",
            pred.signature.code.name(),
            result.render()
        )));
        Ok(())
    }

    fn run_test(&mut self, test: &TestOp) -> Result<()> {
        let _activation = self.logger.activation(true);
        let _scope = self.logger.scope();
        let language = self.resolve_arguments(std::slice::from_ref(&test.language))?;
        let template = self.resolve_arguments(std::slice::from_ref(&test.test_set))?;
        let language = match &language[0] {
            GeneralObject::Regex(r) => TestLanguage::Regex(r.clone()),
            GeneralObject::Nfa(fa) | GeneralObject::Dfa(fa) => {
                TestLanguage::Automaton(fa.clone())
            }
            other => {
                return Err(InterpError::Type(format!(
                    "Test cannot run on {}",
                    other.object_type()
                )))
            }
        };
        let GeneralObject::Regex(template) = &template[0] else {
            return Err(InterpError::Type("the test set must be a regex".into()));
        };
        let report = run_test(&language, template, test.iterations)?;
        self.logger.log(LogEvent::TestReport {
            accepted: report.accepted,
            rejected: report.rejected,
        });
        for (word, accepted) in &report.results {
            self.logger.log(LogEvent::Table {
                title: format!("word {:?}", word),
                body: if *accepted { "accepted" } else { "rejected" }.to_string(),
            });
        }
        Ok(())
    }

    fn resolve_arguments(&self, args: &[Argument]) -> Result<Vec<GeneralObject>> {
        args.iter()
            .map(|arg| match arg {
                Argument::Id(id) => self
                    .objects
                    .get(id)
                    .cloned()
                    .ok_or_else(|| InterpError::Ref(id.clone())),
                Argument::Regex(r) => Ok(GeneralObject::Regex(r.clone())),
                Argument::Int(n) => Ok(GeneralObject::Int(*n)),
                Argument::FileName(name) => Ok(GeneralObject::FileName(name.clone())),
            })
            .collect()
    }

    fn argument<'a>(
        &self,
        args: &'a [GeneralObject],
        index: usize,
    ) -> Result<&'a GeneralObject> {
        args.get(index).ok_or_else(|| {
            InterpError::Type(format!("missing argument #{}", index + 1))
        })
    }

    fn automaton<'a>(&self, args: &'a [GeneralObject], index: usize) -> Result<&'a FiniteAutomaton> {
        self.argument(args, index)?.automaton().ok_or_else(|| {
            InterpError::Type("expected an automaton argument".into())
        })
    }

    fn regex<'a>(&self, args: &'a [GeneralObject], index: usize) -> Result<&'a Regex> {
        match self.argument(args, index)? {
            GeneralObject::Regex(r) => Ok(r),
            other => Err(InterpError::Type(format!(
                "expected a regex argument, got {}",
                other.object_type()
            ))),
        }
    }

    /// One kernel call per opcode. Emits a warning event when an operation
    /// expected to change its object returned a structurally equal one.
    fn apply_function(
        &mut self,
        signature: &Signature,
        args: &[GeneralObject],
    ) -> Result<GeneralObject> {
        let _scope = self.logger.scope();
        self.logger.log(LogEvent::OperationStarted {
            name: signature.code.name().to_string(),
            inputs: args.iter().map(|a| a.render()).collect(),
        });

        let wants_regex = signature.input.first() == Some(&ObjectType::Regex);
        let result = match signature.code {
            OpCode::Thompson => GeneralObject::Nfa(self.regex(args, 0)?.to_thompson()),
            OpCode::Glushkov => GeneralObject::Nfa(self.regex(args, 0)?.to_glushkov()),
            OpCode::IlieYu => GeneralObject::Nfa(self.regex(args, 0)?.to_ilieyu()),
            OpCode::Antimirov => GeneralObject::Nfa(self.regex(args, 0)?.to_antimirov()),
            OpCode::Arden => GeneralObject::Regex(self.automaton(args, 0)?.to_regex()?),
            OpCode::Determinize => {
                GeneralObject::Dfa(self.automaton(args, 0)?.determinize(true)?)
            }
            OpCode::Minimize => {
                let fa = self.automaton(args, 0)?;
                let min = fa.minimize()?;
                self.logger.log(LogEvent::Table {
                    title: "minimal DFA".to_string(),
                    body: min.to_string(),
                });
                GeneralObject::Dfa(min)
            }
            OpCode::Annote => GeneralObject::Dfa(self.automaton(args, 0)?.annote()),
            OpCode::RemEps => GeneralObject::Nfa(self.automaton(args, 0)?.remove_eps()),
            OpCode::Reverse => GeneralObject::Nfa(self.automaton(args, 0)?.reverse()),
            OpCode::MergeBisim => {
                GeneralObject::Nfa(self.automaton(args, 0)?.merge_bisimilar())
            }
            OpCode::Complement => {
                GeneralObject::Dfa(self.automaton(args, 0)?.complement())
            }
            OpCode::Linearize => GeneralObject::Regex(self.regex(args, 0)?.linearize()),
            OpCode::Delinearize => {
                if wants_regex {
                    GeneralObject::Regex(self.regex(args, 0)?.delinearize())
                } else {
                    GeneralObject::Nfa(self.automaton(args, 0)?.delinearize())
                }
            }
            OpCode::DeAnnote => {
                if wants_regex {
                    GeneralObject::Regex(self.regex(args, 0)?.deannote())
                } else {
                    GeneralObject::Nfa(self.automaton(args, 0)?.deannote())
                }
            }
            OpCode::Simplify => GeneralObject::Regex(self.regex(args, 0)?.simplify()),
            OpCode::Normalize => {
                let regex = self.regex(args, 0)?;
                let GeneralObject::FileName(path) = self.argument(args, 1)? else {
                    return Err(InterpError::Type(
                        "Normalize needs a rule file name".into(),
                    ));
                };
                let rules = load_rewrite_rules(Path::new(path))?;
                GeneralObject::Regex(regex.normalize(&rules))
            }
            OpCode::PumpLength => {
                GeneralObject::Int(self.regex(args, 0)?.pump_length()? as i64)
            }
            OpCode::States => {
                GeneralObject::Int(self.automaton(args, 0)?.states_number() as i64)
            }
            OpCode::ClassCard => {
                let monoid = TransformationMonoid::for_language(self.automaton(args, 0)?)?;
                self.log_monoid(&monoid);
                GeneralObject::Int(monoid.class_card() as i64)
            }
            OpCode::ClassLength => {
                let monoid = TransformationMonoid::for_language(self.automaton(args, 0)?)?;
                self.log_monoid(&monoid);
                GeneralObject::Int(monoid.class_length() as i64)
            }
            OpCode::MyhillNerode => {
                let monoid = TransformationMonoid::for_language(self.automaton(args, 0)?)?;
                self.log_monoid(&monoid);
                GeneralObject::Int(monoid.classes_number_myhill_nerode() as i64)
            }
            OpCode::GlaisterShallit => GeneralObject::Int(
                self.automaton(args, 0)?.classes_number_glaister_shallit()? as i64,
            ),
            OpCode::Ambiguity => {
                let (value, witness) = self.automaton(args, 0)?.ambiguity_with_witness()?;
                if let Some(length) = witness {
                    self.logger.log(LogEvent::Table {
                        title: "ambiguity witness".to_string(),
                        body: format!("a word of length {} has two accepting runs", length),
                    });
                }
                GeneralObject::Value(value.to_string())
            }
            OpCode::Bisimilar => GeneralObject::Bool(FiniteAutomaton::bisimilar(
                self.automaton(args, 0)?,
                self.automaton(args, 1)?,
            )),
            OpCode::Equiv => {
                if wants_regex {
                    GeneralObject::Bool(Regex::equivalent(
                        self.regex(args, 0)?,
                        self.regex(args, 1)?,
                    )?)
                } else {
                    GeneralObject::Bool(FiniteAutomaton::equivalent(
                        self.automaton(args, 0)?,
                        self.automaton(args, 1)?,
                    )?)
                }
            }
            OpCode::Equal => {
                if wants_regex {
                    GeneralObject::Bool(Regex::equal(
                        self.regex(args, 0)?,
                        self.regex(args, 1)?,
                    ))
                } else {
                    GeneralObject::Bool(FiniteAutomaton::equal(
                        self.automaton(args, 0)?,
                        self.automaton(args, 1)?,
                    ))
                }
            }
            OpCode::Subset => {
                if wants_regex {
                    GeneralObject::Bool(
                        self.regex(args, 0)?.subset(self.regex(args, 1)?)?,
                    )
                } else {
                    GeneralObject::Bool(
                        self.automaton(args, 0)?.subset(self.automaton(args, 1)?)?,
                    )
                }
            }
            OpCode::Minimal => {
                let fa = self.automaton(args, 0)?;
                if fa.is_deterministic() {
                    GeneralObject::Bool(fa.is_dfa_minimal()?)
                } else {
                    match fa.is_nfa_minimal()? {
                        Some(minimal) => GeneralObject::Bool(minimal),
                        None => {
                            self.logger.log(LogEvent::Warning(
                                "NFA minimality is inconclusive at the Glaister-Shallit bound"
                                    .to_string(),
                            ));
                            GeneralObject::Bool(false)
                        }
                    }
                }
            }
            OpCode::SemDet => GeneralObject::Bool(self.automaton(args, 0)?.semdet()?),
            OpCode::OneUnambiguous => {
                if wants_regex {
                    GeneralObject::Bool(
                        self.regex(args, 0)?.to_glushkov().is_one_unambiguous()?,
                    )
                } else {
                    GeneralObject::Bool(self.automaton(args, 0)?.is_one_unambiguous()?)
                }
            }
        };

        self.warn_when_unchanged(signature, args, &result);
        self.logger.log(LogEvent::OperationFinished {
            name: signature.code.name().to_string(),
            output: result.render(),
        });
        Ok(result)
    }

    fn log_monoid(&self, monoid: &TransformationMonoid) {
        self.logger.log(LogEvent::Table {
            title: "transformation monoid".to_string(),
            body: monoid.to_table_text(),
        });
    }

    /// Soft diagnostic: the operation was expected to change the object but
    /// produced a structural copy.
    fn warn_when_unchanged(
        &self,
        signature: &Signature,
        args: &[GeneralObject],
        result: &GeneralObject,
    ) {
        let unchanged = match (args.first(), result) {
            (Some(GeneralObject::Regex(before)), GeneralObject::Regex(after)) => {
                Regex::equal(before, after)
            }
            (Some(before), after) => match (before.automaton(), after.automaton()) {
                (Some(b), Some(a)) => FiniteAutomaton::equal(b, a),
                _ => false,
            },
            _ => false,
        };
        if unchanged {
            self.logger.log(LogEvent::Warning(format!(
                "{} did not change its argument",
                signature.code.name()
            )));
        }
    }
}
