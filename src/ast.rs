//! Abstract syntax tree node model.
//!
//! The evaluation core does not accept raw text or token streams: the parsing
//! collaborator hands it a fully constructed [`Program`] whose operator tokens
//! have already been resolved to [`BinaryOp`]/[`UnaryOp`]/[`LogicalOp`] and
//! whose `for` loops have already been lowered to `while` plus an optional
//! init/increment block.  There is deliberately no `For` variant here.
//!
//! Every node owns its children exclusively; the tree is acyclic and
//! immutable after construction.  The analyzer and the interpreter only read
//! it, never rewrite it.

use serde::Serialize;

/// A complete program: a list of top-level statements, executed in order.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A literal constant appearing in source: number, string, `true`, `false`,
/// or `nil`.
#[derive(Debug, Clone, Serialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
}

/// Infix arithmetic, comparison and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// Arithmetic negation `-`.
    Neg,
    /// Logical negation `!` (truthiness based).
    Not,
}

/// Short-circuiting logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expression nodes.  Each evaluates to exactly one runtime value.
#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    /// A literal constant.
    Literal(Literal),

    /// Variable access - resolves to the identifier's current value at
    /// runtime by walking the scope chain.
    Variable(String),

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary { op: UnaryOp, right: Box<Expr> },

    /// Short-circuiting logical operators `and` / `or`.  The right operand
    /// is not evaluated when the left alone decides the outcome.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// Assignment expression: `identifier "=" expression`.  Never creates a
    /// binding; the name must already exist somewhere in the scope chain.
    Assign { name: String, value: Box<Expr> },

    /// Function-, method- or class-call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// Argument list (may be empty), evaluated left to right.
        arguments: Vec<Expr>,
    },

    /// Attribute read: `object.property`
    Get { object: Box<Expr>, name: String },

    /// Attribute write: `object.property = value`
    Set {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },

    /// The receiver of the enclosing method: `this`.
    This,

    /// Superclass method access: `super.method`.
    Super { method: String },
}

/// A function or method declaration: name, parameters and body.  Shared by
/// [`Stmt::Function`] and the method list of [`Stmt::Class`].
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,

    /// Parameter names, in call order.
    pub params: Vec<String>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

/// Statement nodes.  Each performs a side effect and yields no value.
#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    /// A missing initializer binds `nil`.
    Var {
        name: String,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    /// Entering it pushes a fresh child environment, so declarations inside
    /// never leak outward.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops arrive here already lowered.
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration - becomes a first-class closure value.
    Function(FunctionDecl),

    /// Class declaration with an optional superclass name and a method list.
    Class {
        name: String,
        superclass: Option<String>,
        methods: Vec<FunctionDecl>,
    },

    /// `return` with an optional value; unwinds to the enclosing call frame.
    Return { value: Option<Expr> },
}
