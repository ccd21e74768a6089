//! Centralised error hierarchy for the **Lox evaluation core**.
//!
//! All subsystems (analyzer, runtime, object model) convert their internal
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate while still preserving rich
//! diagnostic detail for the embedder.
//!
//! The module **does not** print diagnostics itself.
//!
//! There are two disjoint families:
//!
//! * [`SemanticError`] — raised by the analyzer before any evaluation begins.
//!   Always fatal to that program, never retried.
//! * [`RuntimeError`] — raised during evaluation and propagated upward,
//!   unwinding to whatever boundary the embedder establishes.

use thiserror::Error;

/// Static-analysis failure.  One variant per analyzer check; the first error
/// halts analysis (no recovery or continuation).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SemanticError {
    /// A reserved word was used as a declared name (variable, parameter,
    /// function, class or method).
    #[error("Error at '{name}': Expect a name, found reserved word.")]
    ReservedWord { name: String },

    /// Two variable declarations in the same block share a name.
    #[error("Error at '{name}': Already a variable with this name in this scope.")]
    DuplicateVariable { name: String },

    /// Two parameters of the same function or method share a name.
    #[error("Error at '{name}': Duplicate parameter name.")]
    DuplicateParameter { name: String },

    /// A local variable shadows a parameter of its own enclosing function.
    #[error("Error at '{name}': Local variable shadows a parameter.")]
    ShadowsParameter { name: String },

    /// A variable's initializer reads the variable being declared.
    #[error("Error at '{name}': Can't read local variable in its own initializer.")]
    SelfReferentialInitializer { name: String },

    /// `this` used outside of any class method body.
    #[error("Error at 'this': Can't use 'this' outside of a class.")]
    ThisOutsideClass,

    /// `super` used outside of any class method body.
    #[error("Error at 'super': Can't use 'super' outside of a class.")]
    SuperOutsideClass,

    /// `super` used in a method of a class with no superclass.
    #[error("Error at 'super': Can't use 'super' in a class with no superclass.")]
    SuperWithoutSuperclass,

    /// `return` used outside of any function or method body.
    #[error("Error at 'return': Can't return from top-level code.")]
    ReturnOutsideFunction,

    /// `return <value>` used inside an `init` method.
    #[error("Error at 'return': Can't return a value from an initializer.")]
    ReturnValueFromInitializer,

    /// A class names itself as its own superclass.
    #[error("Error at '{name}': A class can't inherit from itself.")]
    SelfInheritance { name: String },
}

/// Runtime evaluation failure.  Unrecoverable at the point it is raised;
/// propagation is strictly upward and unwinding.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Read or assignment of a name unbound anywhere in the scope chain.
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String },

    /// Operator applied to incompatible operand kinds, or a non-class value
    /// used as a superclass.
    #[error("{message}")]
    TypeMismatch { message: String },

    /// Call of a value that is neither a function, a class nor a native.
    #[error("Can only call functions and classes.")]
    NotCallable,

    /// Wrong argument count for a callable.
    #[error("'{callee}' expected {expected} arguments but got {got}.")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
    },

    /// Read of an attribute or method missing from an instance and from its
    /// whole class chain.
    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String },

    /// Field write onto a value that is not an instance.
    #[error("Only instances have fields; can't set '{name}'.")]
    IllegalFieldTarget { name: String },

    /// Failure inside a host-provided native function.
    #[error("Native function error: {0}")]
    Native(String),
}

impl RuntimeError {
    /// Helper constructor for operand-kind failures.
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        RuntimeError::TypeMismatch {
            message: msg.into(),
        }
    }
}

/// Canonical error type surfaced to the embedder.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Static-analysis failure; raised before any evaluation begins.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// Runtime evaluation failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
