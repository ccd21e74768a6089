//! Evaluation core of a tree-walking Lox interpreter.
//!
//! The crate consumes an already-built, already-lowered [`ast::Program`]
//! (lexing, parsing and `for` desugaring are external collaborators), checks
//! it with [`analyzer::analyze`], and executes it with
//! [`interpreter::Interpreter`].

pub mod analyzer;
pub mod ast;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod runtime;
pub mod value;

/// Checks and runs a program end to end: the analyzer rejects ill-formed
/// trees before any evaluation begins.
pub fn run_program(program: &ast::Program) -> error::Result<()> {
    analyzer::analyze(program)?;
    interpreter::Interpreter::new().run(program)?;
    Ok(())
}
