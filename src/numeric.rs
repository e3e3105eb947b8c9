//! Integer and float arithmetic. Mixed operands promote to float; integers are
//! arbitrary precision so exact results never wrap or overflow.

use crate::evaluator::Error;
use crate::types::{Kind, LispInt, LispObject, TypeMismatch};
use num_integer::Integer;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum Number {
    Int(LispInt),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(x) => int_to_f64(x),
            Number::Float(x) => *x,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(x) => x.is_zero(),
            Number::Float(x) => *x == 0.0,
        }
    }
}

// Integers beyond the f64 range saturate to an infinity of the same sign.
pub(crate) fn int_to_f64(x: &LispInt) -> f64 {
    match x.to_f64() {
        Some(value) => value,
        None if x.is_negative() => f64::NEG_INFINITY,
        None => f64::INFINITY,
    }
}

impl From<Number> for LispObject {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(x) => LispObject::Integer(x),
            Number::Float(x) => LispObject::Float(x),
        }
    }
}

impl LispObject {
    pub(crate) fn as_number(&self) -> Result<Number, TypeMismatch> {
        match self {
            LispObject::Integer(x) => Ok(Number::Int(x.clone())),
            LispObject::Float(x) => Ok(Number::Float(*x)),
            _ => Err(TypeMismatch {
                expected: Kind::Number,
                got: self.kind(),
            }),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(x), Number::Int(y)) => x == y,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(x), Number::Int(y)) => x.partial_cmp(y),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

fn integer_or_float(
    x: Number,
    y: Number,
    int_op: fn(LispInt, LispInt) -> LispInt,
    float_op: fn(f64, f64) -> f64,
) -> Number {
    match (x, y) {
        (Number::Int(x), Number::Int(y)) => Number::Int(int_op(x, y)),
        (x, y) => Number::Float(float_op(x.as_f64(), y.as_f64())),
    }
}

pub fn add(x: Number, y: Number) -> Result<Number, Error> {
    Ok(integer_or_float(x, y, |x, y| x + y, |x, y| x + y))
}

pub fn sub(x: Number, y: Number) -> Result<Number, Error> {
    Ok(integer_or_float(x, y, |x, y| x - y, |x, y| x - y))
}

pub fn mul(x: Number, y: Number) -> Result<Number, Error> {
    Ok(integer_or_float(x, y, |x, y| x * y, |x, y| x * y))
}

pub fn neg(x: Number) -> Number {
    match x {
        Number::Int(x) => Number::Int(-x),
        Number::Float(x) => Number::Float(-x),
    }
}

pub fn abs(x: Number) -> Number {
    match x {
        Number::Int(x) => Number::Int(x.abs()),
        Number::Float(x) => Number::Float(x.abs()),
    }
}

/// `/` always produces a float, even for two integers that divide exactly.
pub fn true_div(x: Number, y: Number) -> Result<Number, Error> {
    if y.is_zero() {
        return Err(Error::DivideByZero);
    }
    Ok(Number::Float(x.as_f64() / y.as_f64()))
}

/// `//` rounds towards negative infinity.
pub fn floor_div(x: Number, y: Number) -> Result<Number, Error> {
    if y.is_zero() {
        return Err(Error::DivideByZero);
    }
    Ok(integer_or_float(
        x,
        y,
        |x, y| x.div_floor(&y),
        |x, y| (x / y).floor(),
    ))
}

/// Converts an integral-valued float to an integer. NaN has no integer value and an
/// infinity has no finite one.
pub fn float_to_int(x: f64, name: &'static str) -> Result<LispInt, Error> {
    if x.is_nan() {
        return Err(Error::MathDomain(name));
    }
    LispInt::from_f64(x).ok_or(Error::IntegerOverflow(name))
}
