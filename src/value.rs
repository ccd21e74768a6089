//! Runtime values and their fixed textual form.
//!
//! Scalars (numbers, strings, booleans, nil) carry value-copy semantics;
//! objects (closures, classes, instances) are shared by reference and
//! compare by identity.

use std::rc::Rc;

use crate::runtime::{LoxClass, LoxFunction, LoxInstance};

#[derive(Debug, Clone)]
pub enum Value {
    /// Host-provided callable, e.g. `clock`.
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    /// Lox truthiness: only `nil` and `false` are false.  `0` and `""` are
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Lox equality.  Values of different runtime kinds are never equal,
    /// NaN is never equal to anything (itself included), objects compare by
    /// reference identity, scalars by value.
    pub fn lox_eq(&self, other: &Value) -> bool {
        match (self, other) {
            // `f64 ==` already yields false for NaN on either side.
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (
                Value::NativeFunction {
                    name: a, func: f, ..
                },
                Value::NativeFunction {
                    name: b, func: g, ..
                },
            ) => a == b && *f as usize == *g as usize,
            _ => false,
        }
    }

    /// Human-readable kind name used in operand-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::NativeFunction { .. } => "native function",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::NativeFunction { .. } => write!(f, "<native fn>"),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),

            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}
