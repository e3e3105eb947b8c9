use crate::environment::Environment;
use crate::evaluator;
use derive_more::{Deref, DerefMut, Display};
use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

#[derive(Deref, DerefMut, Debug, Clone, Default)]
pub struct LispList(pub Vec<LispObject>);

/// Integers grow as needed; exact arithmetic never overflows.
pub type LispInt = BigInt;

#[derive(Deref, Display, Debug, PartialEq, Eq, Hash, Clone)]
pub struct LispSymbol(pub String);

impl AsRef<str> for LispSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LispSymbol {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadArgCount {
    pub name: String,
    pub expected: Arity,
    pub got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name: name.into(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[LispObject]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

/// A procedure created by `lambda`. Never mutated once built; calling it binds the
/// parameters in a fresh child of `parent`.
pub struct Closure {
    pub parameters: Vec<LispSymbol>,
    pub body: LispObject,
    pub parent: Rc<Environment>,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        Arity::exactly(self.parameters.len())
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}}}",
            self.parameters, self.body
        )
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#<procedure ({})>", self.parameters.iter().join(" "))
    }
}

/// Both the syntax tree produced by the reader and the values produced by the evaluator.
#[derive(Debug, Clone)]
pub enum LispObject {
    /// The result of `define` and `set!`: nothing worth printing.
    Nil,
    Integer(LispInt),
    Float(f64),
    Bool(bool),
    Symbol(LispSymbol),
    List(Rc<LispList>),
    Primitive(&'static PrimitiveFn),
    Closure(Rc<Closure>),
}

pub(crate) fn truthy(obj: &LispObject) -> bool {
    use LispObject::*;
    match obj {
        Nil => false,
        Bool(t) => *t,
        Integer(x) => !x.is_zero(),
        Float(x) => *x != 0.0,
        List(elements) => !elements.is_empty(),
        Symbol(_) | Primitive(_) | Closure(_) => true,
    }
}

pub(crate) fn callable(obj: &LispObject) -> bool {
    match obj {
        LispObject::Primitive(_) | LispObject::Closure(_) => true,
        _ => false,
    }
}

/// `eq`: atoms compare by value, lists and procedures by shared instance.
pub(crate) fn identical(x: &LispObject, y: &LispObject) -> bool {
    use LispObject::*;
    match (x, y) {
        (List(x), List(y)) => Rc::ptr_eq(x, y),
        (Closure(x), Closure(y)) => Rc::ptr_eq(x, y),
        (Primitive(x), Primitive(y)) => x.name == y.name,
        (Integer(x), Integer(y)) => x == y,
        (Float(x), Float(y)) => x == y,
        (Bool(x), Bool(y)) => x == y,
        (Symbol(x), Symbol(y)) => x == y,
        (Nil, Nil) => true,
        _ => false,
    }
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    #[display(fmt = "nil")]
    Nil,
    #[display(fmt = "integer")]
    Integer,
    #[display(fmt = "float")]
    Float,
    #[display(fmt = "number")]
    Number,
    #[display(fmt = "boolean")]
    Bool,
    #[display(fmt = "symbol")]
    Symbol,
    #[display(fmt = "list")]
    List,
    #[display(fmt = "procedure")]
    Procedure,
}

#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display(fmt = "expected {}, got {}", expected, got)]
pub struct TypeMismatch {
    pub expected: Kind,
    pub got: Kind,
}

impl LispObject {
    pub fn kind(&self) -> Kind {
        use LispObject::*;
        match self {
            Nil => Kind::Nil,
            Integer(_) => Kind::Integer,
            Float(_) => Kind::Float,
            Bool(_) => Kind::Bool,
            Symbol(_) => Kind::Symbol,
            List(_) => Kind::List,
            Primitive(_) | Closure(_) => Kind::Procedure,
        }
    }

    fn mismatch(&self, expected: Kind) -> TypeMismatch {
        TypeMismatch {
            expected,
            got: self.kind(),
        }
    }

    pub(crate) fn as_int(&self) -> Result<&LispInt, TypeMismatch> {
        match self {
            LispObject::Integer(x) => Ok(x),
            _ => Err(self.mismatch(Kind::Integer)),
        }
    }

    pub(crate) fn as_list(&self) -> Result<&LispList, TypeMismatch> {
        match self {
            LispObject::List(x) => Ok(x),
            _ => Err(self.mismatch(Kind::List)),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<&LispSymbol, TypeMismatch> {
        match self {
            LispObject::Symbol(s) => Ok(s),
            _ => Err(self.mismatch(Kind::Symbol)),
        }
    }

    pub(crate) fn as_callable(&self) -> Result<&Self, TypeMismatch> {
        match callable(self) {
            true => Ok(self),
            false => Err(self.mismatch(Kind::Procedure)),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, LispObject::List(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, LispObject::Symbol(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, LispObject::Integer(_) | LispObject::Float(_))
    }
}

impl LispObject {
    pub fn new_list() -> Self {
        Self::List(Rc::new(LispList(Vec::new())))
    }
    pub fn wrap_list(elements: Vec<LispObject>) -> Self {
        Self::List(Rc::new(LispList(elements)))
    }
    pub fn new_symbol(name: &str) -> Self {
        Self::Symbol(LispSymbol(name.into()))
    }
}

impl From<i64> for LispObject {
    fn from(x: i64) -> Self {
        LispObject::Integer(x.into())
    }
}

/// Structural equality, as used by `=` and `equal?`. Numbers compare by value across
/// integer and float.
impl PartialEq for LispObject {
    fn eq(&self, other: &Self) -> bool {
        use LispObject::*;
        if let (Ok(x), Ok(y)) = (self.as_number(), other.as_number()) {
            return x == y;
        }
        match (self, other) {
            (List(x), List(y)) => equal_sequences(x, y),
            (Bool(x), Bool(y)) => x == y,
            (Symbol(x), Symbol(y)) => x == y,
            (Nil, Nil) => true,
            (Primitive(_), Primitive(_)) | (Closure(_), Closure(_)) => identical(self, other),
            _ => false,
        }
    }
}

fn equal_sequences(xs: &[LispObject], ys: &[LispObject]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x == y)
}
