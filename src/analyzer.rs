//! Static semantic-analysis pass.
//!
//! A pre-execution, read-only walk over the AST that rejects structurally
//! invalid programs before any evaluation: reserved-word misuse, duplicate
//! declarations, parameter shadowing, self-referential initializers, illegal
//! `this`/`super`/`return` placement, and self-inheriting classes.
//!
//! The walk carries two pieces of per-run state and nothing else:
//! 1. An ancestor stack describing the chain of enclosing class / method /
//!    function nodes, queried by predicate ("is any ancestor a method, and
//!    of which class").
//! 2. A scope stack tracking names declared per block, used for the
//!    duplicate and shadowing checks.
//!
//! Analysis is fail-fast: the first error halts the walk, with no recovery
//! or continuation.  The analyzer is safe to re-invoke per program.

use std::collections::HashSet;

use log::{debug, info};
use phf::phf_set;

use crate::ast::{Expr, FunctionDecl, Program, Stmt};
use crate::error::SemanticError;

/// Words that may never be used as a declared name (variable, parameter,
/// function, class or method).
static RESERVED_WORDS: phf::Set<&'static str> = phf_set! {
    "and", "class", "else", "false", "for", "fun", "if", "nil", "or",
    "print", "return", "super", "this", "true", "var", "while",
};

/// Checks a whole program, raising the first semantic error found.
pub fn analyze(program: &Program) -> Result<(), SemanticError> {
    Analyzer::new().check_program(program)
}

/// One enclosing node on the path from the program root to the node under
/// analysis.
#[derive(Debug)]
enum Ancestor<'a> {
    Class { has_superclass: bool },
    Method { name: &'a str },
    Function,
}

/// Names visible in one lexical scope.
struct Scope {
    declared: HashSet<String>,

    /// Set for function-body frames: the frame's parameter names, which
    /// locals of that same function may not shadow.
    params: Option<HashSet<String>>,

    /// The top-level program scope tolerates re-declaration; blocks and
    /// function bodies do not.
    check_duplicates: bool,
}

impl Scope {
    fn block() -> Self {
        Scope {
            declared: HashSet::new(),
            params: None,
            check_duplicates: true,
        }
    }

    fn program() -> Self {
        Scope {
            declared: HashSet::new(),
            params: None,
            check_duplicates: false,
        }
    }

    fn frame(params: HashSet<String>) -> Self {
        Scope {
            declared: params.clone(),
            params: Some(params),
            check_duplicates: true,
        }
    }
}

pub struct Analyzer<'a> {
    ancestors: Vec<Ancestor<'a>>,
    scopes: Vec<Scope>,
}

impl<'a> Analyzer<'a> {
    pub fn new() -> Self {
        Analyzer {
            ancestors: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Walk all top-level statements.
    pub fn check_program(&mut self, program: &'a Program) -> Result<(), SemanticError> {
        info!(
            "Beginning analysis pass over {} statement(s)",
            program.statements.len()
        );
        self.scopes.push(Scope::program());
        let outcome = program
            .statements
            .iter()
            .try_for_each(|stmt| self.check_stmt(stmt));
        self.scopes.pop();
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn check_stmt(&mut self, stmt: &'a Stmt) -> Result<(), SemanticError> {
        debug!("Checking stmt: {:?}", stmt);
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.check_expr(expr),

            Stmt::Var { name, initializer } => {
                self.check_declared_name(name)?;

                if let Some(init) = initializer {
                    // Sub-walk scoped to the initializer subtree only: a
                    // reference to the declared name is an error unless an
                    // enclosing scope already binds it (the outer binding is
                    // what the initializer sees).
                    if self.scopes.len() > 1
                        && references_name(init, name)
                        && !self.name_visible(name)
                    {
                        return Err(SemanticError::SelfReferentialInitializer {
                            name: name.clone(),
                        });
                    }
                    self.check_expr(init)?;
                }

                self.declare(name);
                Ok(())
            }

            Stmt::Block(statements) => {
                self.scopes.push(Scope::block());
                let outcome = statements.iter().try_for_each(|s| self.check_stmt(s));
                self.scopes.pop();
                outcome
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition)?;
                self.check_stmt(then_branch)?;
                if let Some(else_stmt) = else_branch {
                    self.check_stmt(else_stmt)?;
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                self.check_expr(condition)?;
                self.check_stmt(body)
            }

            Stmt::Function(decl) => {
                self.check_declared_name(&decl.name)?;
                self.declare(&decl.name);

                self.ancestors.push(Ancestor::Function);
                let outcome = self.check_function(decl);
                self.ancestors.pop();
                outcome
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.check_declared_name(name)?;
                if superclass.as_deref() == Some(name.as_str()) {
                    return Err(SemanticError::SelfInheritance { name: name.clone() });
                }
                self.declare(name);

                self.ancestors.push(Ancestor::Class {
                    has_superclass: superclass.is_some(),
                });
                let outcome = self.check_methods(methods);
                self.ancestors.pop();
                outcome
            }

            Stmt::Return { value } => {
                // Nearest function-or-method ancestor decides legality.
                let nearest = self.ancestors.iter().rev().find_map(|a| match a {
                    Ancestor::Method { name } => Some(Some(*name)),
                    Ancestor::Function => Some(None),
                    Ancestor::Class { .. } => None,
                });
                match nearest {
                    None => return Err(SemanticError::ReturnOutsideFunction),
                    Some(Some("init")) if value.is_some() => {
                        return Err(SemanticError::ReturnValueFromInitializer)
                    }
                    _ => {}
                }
                if let Some(expr) = value {
                    self.check_expr(expr)?;
                }
                Ok(())
            }
        }
    }

    fn check_methods(&mut self, methods: &'a [FunctionDecl]) -> Result<(), SemanticError> {
        for method in methods {
            // Method names live in the class's method table, not the scope
            // chain: only the reserved-word rule applies to them.
            if RESERVED_WORDS.contains(method.name.as_str()) {
                return Err(SemanticError::ReservedWord {
                    name: method.name.clone(),
                });
            }
            self.ancestors.push(Ancestor::Method { name: &method.name });
            let outcome = self.check_function(method);
            self.ancestors.pop();
            outcome?;
        }
        Ok(())
    }

    /// Validates a function's parameter list, then walks its body in a
    /// fresh frame scope.
    fn check_function(&mut self, decl: &'a FunctionDecl) -> Result<(), SemanticError> {
        let mut params: HashSet<String> = HashSet::with_capacity(decl.params.len());
        for param in &decl.params {
            if RESERVED_WORDS.contains(param.as_str()) {
                return Err(SemanticError::ReservedWord { name: param.clone() });
            }
            if !params.insert(param.clone()) {
                return Err(SemanticError::DuplicateParameter {
                    name: param.clone(),
                });
            }
        }

        self.scopes.push(Scope::frame(params));
        let outcome = decl.body.iter().try_for_each(|s| self.check_stmt(s));
        self.scopes.pop();
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &'a Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Literal(_) | Expr::Variable(_) => Ok(()),

            Expr::This => {
                if self.inside_method() {
                    Ok(())
                } else {
                    Err(SemanticError::ThisOutsideClass)
                }
            }

            Expr::Super { .. } => match self.enclosing_class_has_superclass() {
                None => Err(SemanticError::SuperOutsideClass),
                Some(false) => Err(SemanticError::SuperWithoutSuperclass),
                Some(true) => Ok(()),
            },

            Expr::Unary { right, .. } => self.check_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }

            Expr::Assign { value, .. } => self.check_expr(value),

            Expr::Call { callee, arguments } => {
                self.check_expr(callee)?;
                arguments.iter().try_for_each(|arg| self.check_expr(arg))
            }

            Expr::Get { object, .. } => self.check_expr(object),

            Expr::Set { object, value, .. } => {
                self.check_expr(object)?;
                self.check_expr(value)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ancestor queries
    // ─────────────────────────────────────────────────────────────────────

    /// Is the node under analysis lexically inside a method body of the
    /// nearest enclosing class?
    fn inside_method(&self) -> bool {
        self.nearest_class_index()
            .map(|class_idx| {
                self.ancestors[class_idx..]
                    .iter()
                    .any(|a| matches!(a, Ancestor::Method { .. }))
            })
            .unwrap_or(false)
    }

    /// `Some(has_superclass)` when inside a method of the nearest enclosing
    /// class, `None` otherwise.
    fn enclosing_class_has_superclass(&self) -> Option<bool> {
        let class_idx = self.nearest_class_index()?;
        let in_method = self.ancestors[class_idx..]
            .iter()
            .any(|a| matches!(a, Ancestor::Method { .. }));
        if !in_method {
            return None;
        }
        match self.ancestors[class_idx] {
            Ancestor::Class { has_superclass } => Some(has_superclass),
            _ => unreachable!("index points at a class ancestor"),
        }
    }

    fn nearest_class_index(&self) -> Option<usize> {
        self.ancestors
            .iter()
            .rposition(|a| matches!(a, Ancestor::Class { .. }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope queries
    // ─────────────────────────────────────────────────────────────────────

    /// Reserved-word and duplicate/shadowing checks shared by every
    /// declared name.
    fn check_declared_name(&self, name: &str) -> Result<(), SemanticError> {
        if RESERVED_WORDS.contains(name) {
            return Err(SemanticError::ReservedWord {
                name: name.to_string(),
            });
        }

        // A local may not shadow a parameter of its own function: scan
        // outward up to (and including) the nearest function frame.
        for scope in self.scopes.iter().rev() {
            if let Some(params) = &scope.params {
                if params.contains(name) {
                    return Err(SemanticError::ShadowsParameter {
                        name: name.to_string(),
                    });
                }
                break;
            }
        }

        if let Some(scope) = self.scopes.last() {
            if scope.check_duplicates && scope.declared.contains(name) {
                return Err(SemanticError::DuplicateVariable {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declared.insert(name.to_string());
        }
    }

    /// Is `name` already bound by any enclosing scope (the one being
    /// declared into excluded)?
    fn name_visible(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.declared.contains(name))
    }
}

impl<'a> Default for Analyzer<'a> {
    fn default() -> Self {
        Analyzer::new()
    }
}

/// Does `expr` mention `name` as a variable read or assignment target?
/// Scoped strictly to the initializer subtree; statements cannot nest here.
fn references_name(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Variable(n) => n == name,
        Expr::Assign { name: n, value } => n == name || references_name(value, name),
        Expr::Literal(_) | Expr::This | Expr::Super { .. } => false,
        Expr::Unary { right, .. } => references_name(right, name),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            references_name(left, name) || references_name(right, name)
        }
        Expr::Call { callee, arguments } => {
            references_name(callee, name)
                || arguments.iter().any(|arg| references_name(arg, name))
        }
        Expr::Get { object, .. } => references_name(object, name),
        Expr::Set { object, value, .. } => {
            references_name(object, name) || references_name(value, name)
        }
    }
}
