//! Shared AST construction helpers for the integration tests.
//!
//! The crate consumes an already-built tree, so tests assemble programs
//! directly from nodes the way the parsing collaborator would.

#![allow(dead_code)]

use lox_core::analyzer::analyze;
use lox_core::ast::{BinaryOp, Expr, FunctionDecl, Literal, LogicalOp, Program, Stmt, UnaryOp};
use lox_core::error::RuntimeError;
use lox_core::interpreter::Interpreter;
use lox_core::value::Value;

// ── expressions ──────────────────────────────────────────────────────────

pub fn num(n: f64) -> Expr {
    Expr::Literal(Literal::Number(n))
}

pub fn string(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.to_string()))
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn nil() -> Expr {
    Expr::Literal(Literal::Nil)
}

pub fn var(name: &str) -> Expr {
    Expr::Variable(name.to_string())
}

pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

pub fn unary(op: UnaryOp, right: Expr) -> Expr {
    Expr::Unary {
        op,
        right: Box::new(right),
    }
}

pub fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    Expr::Logical {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

pub fn assign(name: &str, value: Expr) -> Expr {
    Expr::Assign {
        name: name.to_string(),
        value: Box::new(value),
    }
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        arguments,
    }
}

pub fn get(object: Expr, name: &str) -> Expr {
    Expr::Get {
        object: Box::new(object),
        name: name.to_string(),
    }
}

pub fn set(object: Expr, name: &str, value: Expr) -> Expr {
    Expr::Set {
        object: Box::new(object),
        name: name.to_string(),
        value: Box::new(value),
    }
}

pub fn this() -> Expr {
    Expr::This
}

pub fn super_method(method: &str) -> Expr {
    Expr::Super {
        method: method.to_string(),
    }
}

// ── statements ───────────────────────────────────────────────────────────

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expression(expr)
}

pub fn var_stmt(name: &str, initializer: Option<Expr>) -> Stmt {
    Stmt::Var {
        name: name.to_string(),
        initializer,
    }
}

pub fn block(statements: Vec<Stmt>) -> Stmt {
    Stmt::Block(statements)
}

pub fn if_stmt(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
    Stmt::If {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
    }
}

pub fn while_stmt(condition: Expr, body: Stmt) -> Stmt {
    Stmt::While {
        condition,
        body: Box::new(body),
    }
}

pub fn fun_decl(name: &str, params: &[&str], body: Vec<Stmt>) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
    }
}

pub fn fun_stmt(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::Function(fun_decl(name, params, body))
}

pub fn class_stmt(name: &str, superclass: Option<&str>, methods: Vec<FunctionDecl>) -> Stmt {
    Stmt::Class {
        name: name.to_string(),
        superclass: superclass.map(|s| s.to_string()),
        methods,
    }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return { value }
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program { statements }
}

// ── execution helpers ────────────────────────────────────────────────────

/// Tests share one process; initialize the logger at most once.
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Analyzes and runs a program, returning the interpreter so the test can
/// inspect globals afterwards.
pub fn run(statements: Vec<Stmt>) -> Interpreter {
    init_logging();
    let program = program(statements);
    analyze(&program).expect("program should pass analysis");
    let mut interpreter = Interpreter::new();
    interpreter
        .run(&program)
        .expect("program should run without errors");
    interpreter
}

/// Analyzes and runs a program that is expected to fail at runtime,
/// returning the error.
pub fn run_err(statements: Vec<Stmt>) -> RuntimeError {
    init_logging();
    let program = program(statements);
    analyze(&program).expect("program should pass analysis");
    let mut interpreter = Interpreter::new();
    interpreter
        .run(&program)
        .expect_err("program should fail at runtime")
}

/// Reads a global after a run.
pub fn global(interpreter: &Interpreter, name: &str) -> Value {
    interpreter
        .globals()
        .borrow()
        .get(name)
        .expect("global should be defined")
}

/// Convenience for numeric globals.
pub fn global_num(interpreter: &Interpreter, name: &str) -> f64 {
    match global(interpreter, name) {
        Value::Number(n) => n,
        other => panic!("expected number in '{}', got {}", name, other),
    }
}
