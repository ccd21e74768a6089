//! Recursive tree-walking evaluator.
//!
//! Each expression node evaluates to exactly one [`Value`] against an
//! environment; each statement performs a side effect.  `return` is not an
//! error: statement evaluation yields a [`Flow`] that every statement
//! sequence checks and propagates, and that only the call-frame boundary
//! consumes.  It can therefore unwind through arbitrarily nested blocks and
//! loops without ever leaking through a function boundary.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{BinaryOp, Expr, FunctionDecl, Literal, LogicalOp, Program, Stmt, UnaryOp};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::{Attribute, LoxClass, LoxFunction, LoxInstance};
use crate::value::Value;

/// How a statement finished: fell through normally, or is unwinding a
/// `return` toward the enclosing call frame.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Convenient alias for evaluator results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    environment: Rc<RefCell<Environment>>,
}

impl Interpreter {
    /// Creates a new interpreter whose root environment defines the native
    /// functions (currently just `clock`).
    pub fn new() -> Self {
        info!("Initializing interpreter");

        let environment = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        environment.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            },
        );

        Self { environment }
    }

    /// The root environment.  Embedders and tests use this to pre-define
    /// bindings or inspect globals after a run.
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        self.environment.clone()
    }

    /// Runs a complete program, statement by statement.
    pub fn run(&mut self, program: &Program) -> IResult<()> {
        debug!("Running program with {} statements", program.statements.len());
        for stmt in &program.statements {
            let flow = self.execute(stmt)?;
            // The analyzer rejects top-level `return` statically.
            debug_assert!(
                matches!(flow, Flow::Normal),
                "return unwound past the top level"
            );
        }
        info!("Program completed");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let _ = self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name, value);
                self.environment.borrow_mut().define(name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let block_env = Environment::push(self.environment.clone(), []);
                self.execute_block(statements, block_env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name);
                let function = self.make_function(decl, self.environment.clone());
                self.environment
                    .borrow_mut()
                    .define(&decl.name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.declare_class(name, superclass.as_deref(), methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Executes `statements` inside `env`, restoring the previous
    /// environment afterwards even on error.  Serves both block entry and
    /// call frames.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> IResult<Flow> {
        let saved = std::mem::replace(&mut self.environment, env);

        let mut flow = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => continue,
                other => {
                    flow = other;
                    break;
                }
            }
        }

        self.environment = saved;
        flow
    }

    /// Evaluates an expression to a value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Variable(name) => self.environment.borrow().get(name),

            // `this` is an ordinary binding installed by method binding.
            Expr::This => self.environment.borrow().get("this"),

            Expr::Super { method } => self.evaluate_super(method),

            Expr::Binary { left, op, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                apply_binary(*op, left_val, right_val)
            }

            Expr::Unary { op, right } => {
                let value = self.evaluate(right)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::type_mismatch("Operand must be a number.")),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Logical { left, op, right } => {
                // The deciding operand is returned as-is, never coerced to a
                // boolean.
                let left_val = self.evaluate(left)?;
                match op {
                    LogicalOp::And if !left_val.is_truthy() => Ok(left_val),
                    LogicalOp::Or if left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }

            Expr::Call { callee, arguments } => {
                let callee_val = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }
                self.invoke_callable(callee_val, args)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        match LoxInstance::lookup(&instance, name) {
                            Some(Attribute::Field(value)) => Ok(value),
                            Some(Attribute::Method(method)) => Ok(Value::Function(method)),
                            None => Err(RuntimeError::UndefinedProperty {
                                name: name.clone(),
                            }),
                        }
                    }
                    other => Err(RuntimeError::type_mismatch(format!(
                        "Only instances have properties, not a {}.",
                        other.kind()
                    ))),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.set_field(name, value.clone());
                        Ok(value)
                    }
                    // Classes and closures never acquire fields.
                    _ => Err(RuntimeError::IllegalFieldTarget { name: name.clone() }),
                }
            }
        }
    }

    /// `super.method`: looks the method up on the bound superclass, then
    /// binds it to the *current* `this` (never to the superclass).
    fn evaluate_super(&mut self, method: &str) -> IResult<Value> {
        let superclass = match self.environment.borrow().get("super")? {
            Value::Class(class) => class,
            other => {
                return Err(RuntimeError::type_mismatch(format!(
                    "'super' must refer to a class, not a {}.",
                    other.kind()
                )))
            }
        };
        let this = self.environment.borrow().get("this")?;

        match superclass.find_method(method) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(this)))),
            None => Err(RuntimeError::UndefinedProperty {
                name: method.to_string(),
            }),
        }
    }

    /// Builds a closure from a declaration, capturing `closure` as its
    /// scope chain.
    fn make_function(&self, decl: &FunctionDecl, closure: Rc<RefCell<Environment>>) -> LoxFunction {
        LoxFunction {
            name: Some(decl.name.clone()),
            params: decl.params.clone(),
            body: Rc::new(decl.body.clone()),
            closure,
        }
    }

    /// Evaluates a class declaration: resolves the optional superclass,
    /// builds each method's closure against an environment that defines
    /// `super` only when a superclass exists, and registers the class value
    /// in the declaring environment.
    fn declare_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        methods: &[FunctionDecl],
    ) -> IResult<()> {
        debug!("Declaring class '{}'", name);

        let base = match superclass {
            Some(super_name) => {
                let value = self.environment.borrow().get(super_name)?;
                match value {
                    Value::Class(class) => Some(class),
                    other => {
                        return Err(RuntimeError::type_mismatch(format!(
                            "Superclass must be a class, not a {}.",
                            other.kind()
                        )))
                    }
                }
            }
            None => None,
        };

        let method_env = match &base {
            Some(class) => Environment::push(
                self.environment.clone(),
                [("super".to_string(), Value::Class(class.clone()))],
            ),
            None => self.environment.clone(),
        };

        let mut table: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for method in methods {
            let function = self.make_function(method, method_env.clone());
            table.insert(method.name.clone(), Rc::new(function));
        }

        let class = LoxClass {
            name: name.to_string(),
            methods: table,
            base,
        };
        self.environment
            .borrow_mut()
            .define(name, Value::Class(Rc::new(class)));
        info!("Class '{}' declared with {} methods", name, methods.len());
        Ok(())
    }

    /// Invokes a callable value: a native, a closure, or a class (which
    /// constructs an instance).
    fn invoke_callable(&mut self, callee: Value, args: Vec<Value>) -> IResult<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                if args.len() != arity {
                    return Err(RuntimeError::ArityMismatch {
                        callee: name,
                        expected: arity,
                        got: args.len(),
                    });
                }
                func(&args).map_err(RuntimeError::Native)
            }

            Value::Function(function) => self.call_function(&function, args),

            Value::Class(class) => self.construct(class, args),

            _ => Err(RuntimeError::NotCallable),
        }
    }

    /// Calls a closure: arity check, fresh call frame over the captured
    /// environment, parameters bound left to right.  This is the one place
    /// that consumes [`Flow::Return`].
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> IResult<Value> {
        debug!("Calling function '{}'", function.describe());
        if args.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                callee: function.describe().to_string(),
                expected: function.arity(),
                got: args.len(),
            });
        }

        let frame = Environment::push(
            function.closure.clone(),
            function.params.iter().cloned().zip(args),
        );

        match self.execute_block(&function.body, frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    /// Calls a class: constructs an instance and, if an `init` method exists
    /// anywhere in the inheritance chain, invokes it bound to the instance.
    /// An absent `init` with arguments present is an arity error.
    fn construct(&mut self, class: Rc<LoxClass>, args: Vec<Value>) -> IResult<Value> {
        debug!("Constructing instance of '{}'", class.name);
        let instance = Rc::new(LoxInstance::new(class.clone()));

        match class.find_method("init") {
            Some(init) => {
                let bound = init.bind(Value::Instance(instance.clone()));
                // The constructor's own return value is discarded; calling a
                // class always yields the instance.
                self.call_function(&bound, args)?;
            }
            None => {
                if !args.is_empty() {
                    return Err(RuntimeError::ArityMismatch {
                        callee: class.name.clone(),
                        expected: 0,
                        got: args.len(),
                    });
                }
            }
        }

        Ok(Value::Instance(instance))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

/// Applies a (non-short-circuiting) binary operator to two values.
fn apply_binary(op: BinaryOp, left: Value, right: Value) -> IResult<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(RuntimeError::type_mismatch(
                "Operands must be two numbers or two strings.",
            )),
        },

        BinaryOp::Sub => numeric(left, right).map(|(a, b)| Value::Number(a - b)),
        BinaryOp::Mul => numeric(left, right).map(|(a, b)| Value::Number(a * b)),
        BinaryOp::Div => numeric(left, right).map(|(a, b)| Value::Number(divide(a, b))),

        BinaryOp::Equal => Ok(Value::Bool(left.lox_eq(&right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.lox_eq(&right))),

        BinaryOp::Less => numeric(left, right).map(|(a, b)| Value::Bool(a < b)),
        BinaryOp::LessEqual => numeric(left, right).map(|(a, b)| Value::Bool(a <= b)),
        BinaryOp::Greater => numeric(left, right).map(|(a, b)| Value::Bool(a > b)),
        BinaryOp::GreaterEqual => numeric(left, right).map(|(a, b)| Value::Bool(a >= b)),
    }
}

fn numeric(left: Value, right: Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        _ => Err(RuntimeError::type_mismatch("Operands must be numbers.")),
    }
}

/// Division never raises: `0/0` is NaN, anything else over zero is a signed
/// infinity matching the dividend's sign (regardless of the zero's sign).
fn divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        if a == 0.0 {
            f64::NAN
        } else if a > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    } else {
        a / b
    }
}
