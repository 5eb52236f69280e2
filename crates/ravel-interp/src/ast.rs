//! Parsed operation shapes.

use ravel_objects::Regex;

use crate::typing::Signature;

/// One actual argument of a declaration or predicate.
#[derive(Clone, Debug)]
pub enum Argument {
    /// A bound identifier, resolved from the environment at run time.
    Id(String),
    /// An inline regex literal.
    Regex(Regex),
    Int(i64),
    FileName(String),
}

/// `Id = (Fn.)* Fn? arg+ (!!)?` with the function chain already planned.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub id: String,
    /// resolved signatures in application order (rightmost written function
    /// first)
    pub functions: Vec<Signature>,
    pub args: Vec<Argument>,
    pub verbose: bool,
}

/// `Test language test_set iterations`.
#[derive(Clone, Debug)]
pub struct TestOp {
    pub language: Argument,
    pub test_set: Argument,
    pub iterations: u32,
}

/// `Pred arg+` where the predicate returns Bool.
#[derive(Clone, Debug)]
pub struct PredicateOp {
    pub signature: Signature,
    pub args: Vec<Argument>,
}

#[derive(Clone, Debug)]
pub enum Operation {
    Declaration(Declaration),
    Test(TestOp),
    Predicate(PredicateOp),
}
