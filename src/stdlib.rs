use crate::numeric::{self, Number};
use crate::types::{callable, identical, truthy, Arity, Kind, LispInt, LispObject, PrimitiveFn, TypeMismatch};
use crate::evaluator;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::HashMap;

fn grab_numbers(args: &[LispObject]) -> evaluator::Result<Vec<Number>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(|o| o.as_number()).collect();
    type_check.map_err(evaluator::Error::TypeMismatch)
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::AtLeast(0..),
};

fn sum_(args: &[LispObject]) -> evaluator::Result {
    let value = grab_numbers(args)?
        .into_iter()
        .try_fold(Number::Int(LispInt::zero()), numeric::add)?;
    Ok(value.into())
}

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: sub_,
    arity: Arity::at_least(1),
};

fn sub_(args: &[LispObject]) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let value = match numbers.split_first() {
        Some((only, [])) => numeric::neg(only.clone()),
        Some((first, rest)) => rest.iter().cloned().try_fold(first.clone(), numeric::sub)?,
        None => unreachable!("arity checked by call_primitive"),
    };
    Ok(value.into())
}

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: mul_,
    arity: Arity::AtLeast(0..),
};

fn mul_(args: &[LispObject]) -> evaluator::Result {
    let value = grab_numbers(args)?
        .into_iter()
        .try_fold(Number::Int(LispInt::one()), numeric::mul)?;
    Ok(value.into())
}

fn binary_(
    args: &[LispObject],
    op: fn(Number, Number) -> evaluator::Result<Number>,
) -> evaluator::Result {
    match grab_numbers(args)?.as_slice() {
        [x, y] => op(x.clone(), y.clone()).map(LispObject::from),
        _ => unreachable!("arity checked by call_primitive"),
    }
}

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: |args| binary_(args, numeric::true_div),
    arity: Arity::exactly(2),
};

const FLOOR_DIV: PrimitiveFn = PrimitiveFn {
    name: "//",
    fn_ptr: |args| binary_(args, numeric::floor_div),
    arity: Arity::exactly(2),
};

fn comparison_(args: &[LispObject], comp: fn(&Number, &Number) -> bool) -> evaluator::Result {
    match grab_numbers(args)?.as_slice() {
        [x, y] => Ok(LispObject::Bool(comp(x, y))),
        _ => unreachable!("arity checked by call_primitive"),
    }
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |args: &[LispObject]| comparison_(args, Number:: [<$NAME:lower>]),
                arity: Arity::exactly(2),
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: equal_,
    arity: Arity::exactly(2),
};

fn equal_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(args[0] == args[1]))
}

const EQUAL_TEST: PrimitiveFn = PrimitiveFn {
    name: "equal?",
    fn_ptr: equal_,
    arity: Arity::exactly(2),
};

const EQ: PrimitiveFn = PrimitiveFn {
    name: "eq",
    fn_ptr: eq_,
    arity: Arity::exactly(2),
};

fn eq_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(identical(&args[0], &args[1])))
}

const ABS: PrimitiveFn = PrimitiveFn {
    name: "abs",
    fn_ptr: abs_,
    arity: Arity::exactly(1),
};

fn abs_(args: &[LispObject]) -> evaluator::Result {
    Ok(numeric::abs(args[0].as_number()?).into())
}

/// `max` and `min` take either several numbers or a single list of them.
fn extremum_(
    args: &[LispObject],
    name: &'static str,
    better: fn(&Number, &Number) -> bool,
) -> evaluator::Result {
    let candidates = match args {
        [LispObject::List(list)] => list.as_slice(),
        _ => args,
    };
    let mut best: Option<(&LispObject, Number)> = None;
    for candidate in candidates {
        let value = candidate.as_number()?;
        let replace = match &best {
            Some((_, current)) => better(&value, current),
            None => true,
        };
        if replace {
            best = Some((candidate, value));
        }
    }
    best.map(|(obj, _)| obj.clone())
        .ok_or(evaluator::Error::EmptyListAccess(name))
}

const MAX: PrimitiveFn = PrimitiveFn {
    name: "max",
    fn_ptr: |args| extremum_(args, "max", Number::gt),
    arity: Arity::at_least(1),
};

const MIN: PrimitiveFn = PrimitiveFn {
    name: "min",
    fn_ptr: |args| extremum_(args, "min", Number::lt),
    arity: Arity::at_least(1),
};

const ROUND: PrimitiveFn = PrimitiveFn {
    name: "round",
    fn_ptr: round_,
    arity: Arity::Between(1..=2),
};

// Halves go to the nearest even digit.
fn round_(args: &[LispObject]) -> evaluator::Result {
    let x = args[0].as_number()?;
    let ndigits = match args.get(1) {
        Some(n) => Some(n.as_int()?),
        None => None,
    };
    match (x, ndigits) {
        (Number::Int(x), None) => Ok(LispObject::Integer(x)),
        (Number::Float(x), None) => {
            numeric::float_to_int(x.round_ties_even(), "round").map(LispObject::Integer)
        }
        (Number::Float(x), Some(n)) => Ok(LispObject::Float(round_float_to(x, n))),
        (Number::Int(x), Some(n)) => Ok(LispObject::Integer(round_int_to(x, n))),
    }
}

fn round_float_to(x: f64, ndigits: &LispInt) -> f64 {
    // Beyond 15 digits an f64 has nothing left to round away; below -308 everything
    // rounds to zero.
    let ndigits = match ndigits.to_i32() {
        _ if !x.is_finite() => return x,
        Some(n) if n > 15 => return x,
        Some(n) if n >= -308 => n,
        _ if ndigits.is_negative() => return 0.0 * x.signum(),
        _ => return x,
    };
    let scale = 10f64.powi(ndigits);
    (x * scale).round_ties_even() / scale
}

fn round_int_to(x: LispInt, ndigits: &LispInt) -> LispInt {
    if !ndigits.is_negative() {
        return x;
    }
    // Once 10^places passes 2^(bits + 1) it is more than twice |x|.
    let places = match (-ndigits).to_usize() {
        Some(places) if (places as u64) <= x.bits() + 1 => places,
        _ => return LispInt::zero(),
    };
    let scale = num_traits::pow(LispInt::from(10), places);
    let (quotient, remainder) = x.div_mod_floor(&scale);
    let twice = &remainder + &remainder;
    let quotient = if twice > scale || (twice == scale && quotient.is_odd()) {
        quotient + LispInt::one()
    } else {
        quotient
    };
    quotient * scale
}

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: not_,
    arity: Arity::exactly(1),
};

fn not_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(!truthy(&args[0])))
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: list_,
    arity: Arity::at_least(0),
};

fn list_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::wrap_list(args.to_vec()))
}

const LIST_TEST: PrimitiveFn = PrimitiveFn {
    name: "list?",
    fn_ptr: list_test_,
    arity: Arity::exactly(1),
};

fn list_test_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(args[0].is_list()))
}

const NULL_TEST: PrimitiveFn = PrimitiveFn {
    name: "null?",
    fn_ptr: null_test_,
    arity: Arity::exactly(1),
};

fn null_test_(args: &[LispObject]) -> evaluator::Result {
    let empty = match &args[0] {
        LispObject::List(list) => list.is_empty(),
        _ => false,
    };
    Ok(LispObject::Bool(empty))
}

const LENGTH: PrimitiveFn = PrimitiveFn {
    name: "length",
    fn_ptr: length_,
    arity: Arity::exactly(1),
};

fn length_(args: &[LispObject]) -> evaluator::Result {
    let length = match &args[0] {
        LispObject::List(list) => list.len(),
        LispObject::Symbol(name) => name.chars().count(),
        other => {
            return Err(evaluator::Error::TypeMismatch(TypeMismatch {
                expected: Kind::List,
                got: other.kind(),
            }))
        }
    };
    Ok(LispObject::Integer(length.into()))
}

const CAR: PrimitiveFn = PrimitiveFn {
    name: "car",
    fn_ptr: car_,
    arity: Arity::exactly(1),
};

fn car_(args: &[LispObject]) -> evaluator::Result {
    args[0]
        .as_list()?
        .first()
        .cloned()
        .ok_or(evaluator::Error::EmptyListAccess("car"))
}

const CDR: PrimitiveFn = PrimitiveFn {
    name: "cdr",
    fn_ptr: cdr_,
    arity: Arity::exactly(1),
};

fn cdr_(args: &[LispObject]) -> evaluator::Result {
    match args[0].as_list()?.split_first() {
        Some((_, rest)) => Ok(LispObject::wrap_list(rest.to_vec())),
        None => Err(evaluator::Error::EmptyListAccess("cdr")),
    }
}

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};

fn cons_(args: &[LispObject]) -> evaluator::Result {
    let head = &args[0];
    let tail = args[1].as_list()?;

    let mut elements = Vec::with_capacity(tail.len() + 1);
    elements.push(head.clone());
    elements.extend(tail.iter().cloned());
    Ok(LispObject::wrap_list(elements))
}

const APPEND: PrimitiveFn = PrimitiveFn {
    name: "append",
    fn_ptr: append_,
    arity: Arity::at_least(0),
};

fn append_(args: &[LispObject]) -> evaluator::Result {
    let mut output = Vec::new();
    for arg in args {
        output.extend(arg.as_list()?.iter().cloned());
    }
    Ok(LispObject::wrap_list(output))
}

const MAP: PrimitiveFn = PrimitiveFn {
    name: "map",
    fn_ptr: map_,
    arity: Arity::at_least(2),
};

// Walks the lists in lockstep and stops at the end of the shortest.
fn map_(args: &[LispObject]) -> evaluator::Result {
    let (func, lists) = match args.split_first() {
        Some((func, lists)) => (func.as_callable()?, lists),
        None => unreachable!("arity checked by call_primitive"),
    };
    let lists = lists
        .iter()
        .map(LispObject::as_list)
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = lists.iter().map(|list| list.len()).min().unwrap_or(0);

    let result: Result<Vec<_>, _> = (0..shortest)
        .map(|i| {
            let row: Vec<LispObject> = lists.iter().map(|list| list[i].clone()).collect();
            evaluator::apply(func, &row)
        })
        .collect();
    Ok(LispObject::wrap_list(result?))
}

const BEGIN: PrimitiveFn = PrimitiveFn {
    name: "begin",
    fn_ptr: begin_,
    arity: Arity::at_least(1),
};

// The arguments were already evaluated in order by the caller.
fn begin_(args: &[LispObject]) -> evaluator::Result {
    Ok(args.last().cloned().unwrap_or(LispObject::Nil))
}

const NUMBER_TEST: PrimitiveFn = PrimitiveFn {
    name: "number?",
    fn_ptr: number_test_,
    arity: Arity::exactly(1),
};

fn number_test_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(args[0].is_number()))
}

const SYMBOL_TEST: PrimitiveFn = PrimitiveFn {
    name: "symbol",
    fn_ptr: symbol_test_,
    arity: Arity::exactly(1),
};

fn symbol_test_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(args[0].is_symbol()))
}

const PROCEDURE_TEST: PrimitiveFn = PrimitiveFn {
    name: "procedure?",
    fn_ptr: procedure_test_,
    arity: Arity::exactly(1),
};

fn procedure_test_(args: &[LispObject]) -> evaluator::Result {
    Ok(LispObject::Bool(callable(&args[0])))
}

// Math library. Domain checks reject inputs that have no real result instead of
// quietly producing NaN.

fn float_function_(
    args: &[LispObject],
    name: &'static str,
    op: fn(f64) -> f64,
    outside_domain: fn(f64) -> bool,
) -> evaluator::Result {
    let x = args[0].as_number()?.as_f64();
    if outside_domain(x) {
        return Err(evaluator::Error::MathDomain(name));
    }
    Ok(LispObject::Float(op(x)))
}

macro_rules! float_primitive {
    ($name:ident, $op:expr) => {
        float_primitive!($name, $op, |_| false);
    };
    ($name:ident, $op:expr, $outside_domain:expr) => {
        paste::item! {
            const [<$name:upper>]: PrimitiveFn = PrimitiveFn {
                name: stringify!($name),
                fn_ptr: |args: &[LispObject]| {
                    float_function_(args, stringify!($name), $op, $outside_domain)
                },
                arity: Arity::exactly(1),
            };
        }
    };
}

float_primitive!(sqrt, f64::sqrt, |x| x < 0.0);
float_primitive!(exp, f64::exp);
float_primitive!(expm1, f64::exp_m1);
float_primitive!(log10, f64::log10, |x| x <= 0.0);
float_primitive!(log2, f64::log2, |x| x <= 0.0);
float_primitive!(log1p, f64::ln_1p, |x| x <= -1.0);
float_primitive!(sin, f64::sin, f64::is_infinite);
float_primitive!(cos, f64::cos, f64::is_infinite);
float_primitive!(tan, f64::tan, f64::is_infinite);
float_primitive!(asin, f64::asin, |x| x.abs() > 1.0);
float_primitive!(acos, f64::acos, |x| x.abs() > 1.0);
float_primitive!(atan, f64::atan);
float_primitive!(sinh, f64::sinh);
float_primitive!(cosh, f64::cosh);
float_primitive!(tanh, f64::tanh);
float_primitive!(asinh, f64::asinh);
float_primitive!(acosh, f64::acosh, |x| x < 1.0);
float_primitive!(atanh, f64::atanh, |x| x.abs() >= 1.0);
float_primitive!(fabs, f64::abs);
float_primitive!(degrees, f64::to_degrees);
float_primitive!(radians, f64::to_radians);
float_primitive!(cbrt, f64::cbrt);
float_primitive!(exp2, f64::exp2);
float_primitive!(gamma, libm::tgamma, |x| {
    x == f64::NEG_INFINITY || (x <= 0.0 && x.fract() == 0.0)
});
float_primitive!(lgamma, libm::lgamma, |x| x <= 0.0 && x.fract() == 0.0);
float_primitive!(erf, libm::erf);
float_primitive!(erfc, libm::erfc);

const LOG: PrimitiveFn = PrimitiveFn {
    name: "log",
    fn_ptr: log_,
    arity: Arity::Between(1..=2),
};

fn log_(args: &[LispObject]) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let x = numbers[0].as_f64();
    let base = numbers.get(1).map(|b| b.as_f64());
    if x <= 0.0 {
        return Err(evaluator::Error::MathDomain("log"));
    }
    match base {
        None => Ok(LispObject::Float(x.ln())),
        Some(b) if b <= 0.0 || b == 1.0 => Err(evaluator::Error::MathDomain("log")),
        Some(b) => Ok(LispObject::Float(x.ln() / b.ln())),
    }
}

fn float_binary_(
    args: &[LispObject],
    name: &'static str,
    op: fn(f64, f64) -> f64,
    outside_domain: fn(f64, f64) -> bool,
) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let (x, y) = (numbers[0].as_f64(), numbers[1].as_f64());
    if outside_domain(x, y) {
        return Err(evaluator::Error::MathDomain(name));
    }
    Ok(LispObject::Float(op(x, y)))
}

macro_rules! float_binary_primitive {
    ($name:ident, $op:expr) => {
        float_binary_primitive!($name, $op, |_, _| false);
    };
    ($name:ident, $op:expr, $outside_domain:expr) => {
        paste::item! {
            const [<$name:upper>]: PrimitiveFn = PrimitiveFn {
                name: stringify!($name),
                fn_ptr: |args: &[LispObject]| {
                    float_binary_(args, stringify!($name), $op, $outside_domain)
                },
                arity: Arity::exactly(2),
            };
        }
    };
}

float_binary_primitive!(pow, f64::powf, |x, y| {
    (x == 0.0 && y < 0.0) || (x < 0.0 && x.is_finite() && y.is_finite() && y.fract() != 0.0)
});
float_binary_primitive!(atan2, f64::atan2);
float_binary_primitive!(hypot, f64::hypot);
float_binary_primitive!(copysign, f64::copysign);
float_binary_primitive!(fmod, |x, y| x % y, |x: f64, y: f64| y == 0.0 || x.is_infinite());
float_binary_primitive!(remainder, libm::remainder, |x: f64, y: f64| {
    y == 0.0 || x.is_infinite()
});

const LDEXP: PrimitiveFn = PrimitiveFn {
    name: "ldexp",
    fn_ptr: ldexp_,
    arity: Arity::exactly(2),
};

// x * 2^i. Exponents past a few thousand already take every finite x to zero or infinity.
fn ldexp_(args: &[LispObject]) -> evaluator::Result {
    const LIMIT: i32 = 2200;
    let x = args[0].as_number()?.as_f64();
    let i = args[1].as_int()?;
    let i = match i.to_i32() {
        Some(i) => i.max(-LIMIT).min(LIMIT),
        None if i.is_negative() => -LIMIT,
        None => LIMIT,
    };
    Ok(LispObject::Float(libm::ldexp(x, i)))
}

const FREXP: PrimitiveFn = PrimitiveFn {
    name: "frexp",
    fn_ptr: frexp_,
    arity: Arity::exactly(1),
};

/// `(mantissa exponent)` with `x = mantissa * 2^exponent` and `0.5 <= |mantissa| < 1`.
fn frexp_(args: &[LispObject]) -> evaluator::Result {
    let (mantissa, exponent) = libm::frexp(args[0].as_number()?.as_f64());
    Ok(LispObject::wrap_list(vec![
        LispObject::Float(mantissa),
        LispObject::from(i64::from(exponent)),
    ]))
}

const MODF: PrimitiveFn = PrimitiveFn {
    name: "modf",
    fn_ptr: modf_,
    arity: Arity::exactly(1),
};

/// `(fractional integral)`, both carrying the sign of `x`.
fn modf_(args: &[LispObject]) -> evaluator::Result {
    let x = args[0].as_number()?.as_f64();
    let (fractional, integral) = if x.is_infinite() {
        (0.0f64.copysign(x), x)
    } else {
        (x.fract(), x.trunc())
    };
    Ok(LispObject::wrap_list(vec![
        LispObject::Float(fractional),
        LispObject::Float(integral),
    ]))
}

const ISCLOSE: PrimitiveFn = PrimitiveFn {
    name: "isclose",
    fn_ptr: isclose_,
    arity: Arity::exactly(2),
};

fn isclose_(args: &[LispObject]) -> evaluator::Result {
    const RELATIVE_TOLERANCE: f64 = 1e-9;
    let (a, b) = (args[0].as_number()?.as_f64(), args[1].as_number()?.as_f64());
    let close = a == b
        || (a.is_finite()
            && b.is_finite()
            && (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs()));
    Ok(LispObject::Bool(close))
}

const DIST: PrimitiveFn = PrimitiveFn {
    name: "dist",
    fn_ptr: dist_,
    arity: Arity::exactly(2),
};

// Euclidean distance between two points given as equally long lists of coordinates.
fn dist_(args: &[LispObject]) -> evaluator::Result {
    let p = grab_numbers(args[0].as_list()?)?;
    let q = grab_numbers(args[1].as_list()?)?;
    if p.len() != q.len() {
        return Err(evaluator::Error::MathDomain("dist"));
    }
    let squares: f64 = p
        .iter()
        .zip(&q)
        .map(|(a, b)| (a.as_f64() - b.as_f64()).powi(2))
        .sum();
    Ok(LispObject::Float(squares.sqrt()))
}

fn integral_(args: &[LispObject], name: &'static str, op: fn(f64) -> f64) -> evaluator::Result {
    match args[0].as_number()? {
        Number::Int(x) => Ok(LispObject::Integer(x)),
        Number::Float(x) => numeric::float_to_int(op(x), name).map(LispObject::Integer),
    }
}

const FLOOR: PrimitiveFn = PrimitiveFn {
    name: "floor",
    fn_ptr: |args| integral_(args, "floor", f64::floor),
    arity: Arity::exactly(1),
};

const CEIL: PrimitiveFn = PrimitiveFn {
    name: "ceil",
    fn_ptr: |args| integral_(args, "ceil", f64::ceil),
    arity: Arity::exactly(1),
};

const TRUNC: PrimitiveFn = PrimitiveFn {
    name: "trunc",
    fn_ptr: |args| integral_(args, "trunc", f64::trunc),
    arity: Arity::exactly(1),
};

const FACTORIAL: PrimitiveFn = PrimitiveFn {
    name: "factorial",
    fn_ptr: factorial_,
    arity: Arity::exactly(1),
};

fn factorial_(args: &[LispObject]) -> evaluator::Result {
    let n = args[0].as_int()?;
    if n.is_negative() {
        return Err(evaluator::Error::MathDomain("factorial"));
    }
    let n = n
        .to_u64()
        .ok_or(evaluator::Error::IntegerOverflow("factorial"))?;
    let product = (1..=n).fold(LispInt::one(), |acc, k| acc * LispInt::from(k));
    Ok(LispObject::Integer(product))
}

const GCD: PrimitiveFn = PrimitiveFn {
    name: "gcd",
    fn_ptr: gcd_,
    arity: Arity::at_least(0),
};

fn gcd_(args: &[LispObject]) -> evaluator::Result {
    let mut result = LispInt::zero();
    for arg in args {
        result = result.gcd(arg.as_int()?);
    }
    Ok(LispObject::Integer(result))
}

const LCM: PrimitiveFn = PrimitiveFn {
    name: "lcm",
    fn_ptr: lcm_,
    arity: Arity::at_least(0),
};

fn lcm_(args: &[LispObject]) -> evaluator::Result {
    let mut result = LispInt::one();
    for arg in args {
        result = result.lcm(arg.as_int()?);
    }
    Ok(LispObject::Integer(result))
}

const ISQRT: PrimitiveFn = PrimitiveFn {
    name: "isqrt",
    fn_ptr: isqrt_,
    arity: Arity::exactly(1),
};

fn isqrt_(args: &[LispObject]) -> evaluator::Result {
    let n = args[0].as_int()?;
    if n.is_negative() {
        return Err(evaluator::Error::MathDomain("isqrt"));
    }
    Ok(LispObject::Integer(n.sqrt()))
}

// Both operands of `comb` and `perm` must be non-negative; choosing more than there is
// gives zero.
fn selection_size(
    n: &LispInt,
    k: &LispInt,
    name: &'static str,
) -> evaluator::Result<Option<u64>> {
    if n.is_negative() || k.is_negative() {
        return Err(evaluator::Error::MathDomain(name));
    }
    if k > n {
        return Ok(None);
    }
    k.to_u64()
        .map(Some)
        .ok_or(evaluator::Error::IntegerOverflow(name))
}

const COMB: PrimitiveFn = PrimitiveFn {
    name: "comb",
    fn_ptr: comb_,
    arity: Arity::exactly(2),
};

fn comb_(args: &[LispObject]) -> evaluator::Result {
    let (n, k) = (args[0].as_int()?, args[1].as_int()?);
    let k = match selection_size(n, k, "comb")? {
        Some(k) => k,
        None => return Ok(LispObject::Integer(LispInt::zero())),
    };
    // C(n, k) == C(n, n - k), so walk the shorter side.
    let k = match (n - LispInt::from(k)).to_u64() {
        Some(rest) => k.min(rest),
        None => k,
    };
    // After step i the running value is C(n - k + i, i), so each division is exact.
    let base = n - LispInt::from(k);
    let result = (1..=k).fold(LispInt::one(), |acc, i| {
        acc * (&base + LispInt::from(i)) / LispInt::from(i)
    });
    Ok(LispObject::Integer(result))
}

const PERM: PrimitiveFn = PrimitiveFn {
    name: "perm",
    fn_ptr: perm_,
    arity: Arity::Between(1..=2),
};

fn perm_(args: &[LispObject]) -> evaluator::Result {
    let n = args[0].as_int()?;
    let k = match args.get(1) {
        Some(k) => k.as_int()?,
        None => n,
    };
    let k = match selection_size(n, k, "perm")? {
        Some(k) => k,
        None => return Ok(LispObject::Integer(LispInt::zero())),
    };
    let result = (0..k).fold(LispInt::one(), |acc, i| acc * (n - LispInt::from(i)));
    Ok(LispObject::Integer(result))
}

const PROD: PrimitiveFn = PrimitiveFn {
    name: "prod",
    fn_ptr: prod_,
    arity: Arity::exactly(1),
};

fn prod_(args: &[LispObject]) -> evaluator::Result {
    let value = grab_numbers(args[0].as_list()?)?
        .into_iter()
        .try_fold(Number::Int(LispInt::one()), numeric::mul)?;
    Ok(value.into())
}

const FSUM: PrimitiveFn = PrimitiveFn {
    name: "fsum",
    fn_ptr: fsum_,
    arity: Arity::exactly(1),
};

fn fsum_(args: &[LispObject]) -> evaluator::Result {
    let values: Vec<f64> = grab_numbers(args[0].as_list()?)?
        .iter()
        .map(Number::as_f64)
        .collect();
    Ok(LispObject::Float(exact_sum(&values)))
}

/// Shewchuk's summation: keeps a list of non-overlapping partial sums so no low-order
/// bits are lost along the way.
fn exact_sum(values: &[f64]) -> f64 {
    if values.iter().any(|x| !x.is_finite()) {
        return values.iter().sum();
    }
    let mut partials: Vec<f64> = Vec::new();
    for &value in values {
        let mut x = value;
        let mut kept = 0;
        for j in 0..partials.len() {
            let mut y = partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let high = x + y;
            let low = y - (high - x);
            if low != 0.0 {
                partials[kept] = low;
                kept += 1;
            }
            x = high;
        }
        partials.truncate(kept);
        partials.push(x);
    }
    partials.iter().sum()
}

fn float_test_(args: &[LispObject], test: fn(f64) -> bool) -> evaluator::Result {
    Ok(LispObject::Bool(test(args[0].as_number()?.as_f64())))
}

const ISNAN: PrimitiveFn = PrimitiveFn {
    name: "isnan",
    fn_ptr: |args| float_test_(args, f64::is_nan),
    arity: Arity::exactly(1),
};

const ISINF: PrimitiveFn = PrimitiveFn {
    name: "isinf",
    fn_ptr: |args| float_test_(args, f64::is_infinite),
    arity: Arity::exactly(1),
};

const ISFINITE: PrimitiveFn = PrimitiveFn {
    name: "isfinite",
    fn_ptr: |args| float_test_(args, f64::is_finite),
    arity: Arity::exactly(1),
};

/// Named values bound alongside the primitives in a standard environment.
pub(crate) fn constants() -> Vec<(&'static str, LispObject)> {
    use std::f64::consts;
    vec![
        ("pi", LispObject::Float(consts::PI)),
        ("e", LispObject::Float(consts::E)),
        ("tau", LispObject::Float(2.0 * consts::PI)),
        ("inf", LispObject::Float(f64::INFINITY)),
        ("nan", LispObject::Float(f64::NAN)),
        ("true", LispObject::Bool(true)),
        ("false", LispObject::Bool(false)),
    ]
}

static FUNCTIONS: &[&PrimitiveFn] = &[
    // Arithmetic
    &SUM,
    &SUB,
    &MUL,
    &DIV,
    &FLOOR_DIV,
    &ABS,
    &MAX,
    &MIN,
    &ROUND,
    // Comparisons
    &GT,
    &GE,
    &LT,
    &LE,
    &EQUAL,
    // Working with lists
    &CAR,
    &CDR,
    &CONS,
    &APPEND,
    &LIST,
    &LENGTH,
    &MAP,
    &BEGIN,
    // Casting and testing
    &NULL_TEST,
    &LIST_TEST,
    &NUMBER_TEST,
    &SYMBOL_TEST,
    &PROCEDURE_TEST,
    &EQ,
    &EQUAL_TEST,
    &NOT,
    // Math library
    &SQRT,
    &EXP,
    &EXPM1,
    &LOG,
    &LOG10,
    &LOG2,
    &LOG1P,
    &SIN,
    &COS,
    &TAN,
    &ASIN,
    &ACOS,
    &ATAN,
    &SINH,
    &COSH,
    &TANH,
    &ASINH,
    &ACOSH,
    &ATANH,
    &FABS,
    &DEGREES,
    &RADIANS,
    &CBRT,
    &EXP2,
    &GAMMA,
    &LGAMMA,
    &ERF,
    &ERFC,
    &POW,
    &ATAN2,
    &HYPOT,
    &COPYSIGN,
    &FMOD,
    &REMAINDER,
    &LDEXP,
    &FREXP,
    &MODF,
    &ISCLOSE,
    &DIST,
    &FLOOR,
    &CEIL,
    &TRUNC,
    &FACTORIAL,
    &GCD,
    &LCM,
    &ISQRT,
    &COMB,
    &PERM,
    &PROD,
    &FSUM,
    &ISNAN,
    &ISINF,
    &ISFINITE,
];

type Namespace = HashMap<&'static str, &'static PrimitiveFn>;
lazy_static! {
    pub static ref CORE: Namespace = FUNCTIONS.iter().map(|&func| (func.name, func)).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Error;

    fn call(name: &str, args: &[LispObject]) -> evaluator::Result {
        let func = CORE.get(name).expect("primitive is registered");
        evaluator::call_primitive(func, args)
    }

    fn int(x: i64) -> LispObject {
        LispObject::from(x)
    }

    fn big(digits: &str) -> LispObject {
        LispObject::Integer(digits.parse().expect("decimal digits"))
    }

    // Also checks that the result kept its integer kind.
    fn is_int(result: evaluator::Result, expected: i64) -> bool {
        matches!(result, Ok(LispObject::Integer(x)) if x == LispInt::from(expected))
    }

    fn is_float(result: evaluator::Result, expected: f64) -> bool {
        matches!(result, Ok(LispObject::Float(x)) if (x - expected).abs() < 1e-12)
    }

    fn float(x: f64) -> LispObject {
        LispObject::Float(x)
    }

    fn list(xs: Vec<LispObject>) -> LispObject {
        LispObject::wrap_list(xs)
    }

    #[test]
    fn every_primitive_is_registered_once() {
        assert_eq!(CORE.len(), FUNCTIONS.len());
    }

    #[test]
    fn arithmetic_keeps_integers_exact() {
        assert!(is_int(call("+", &[int(1), int(2), int(3)]), 6));
        assert!(is_int(call("+", &[]), 0));
        assert!(matches!(call("*", &[int(4), float(0.5)]), Ok(LispObject::Float(x)) if x == 2.0));
        assert!(is_int(call("-", &[int(5)]), -5));
        assert!(is_int(call("-", &[int(10), int(3), int(2)]), 5));
        assert!(matches!(call("/", &[int(7), int(2)]), Ok(LispObject::Float(x)) if x == 3.5));
        assert!(is_int(call("//", &[int(7), int(2)]), 3));
    }

    #[test]
    fn arithmetic_rejects_non_numbers() {
        assert_eq!(
            call("+", &[int(1), LispObject::new_symbol("a")]),
            Err(Error::TypeMismatch(TypeMismatch {
                expected: Kind::Number,
                got: Kind::Symbol,
            }))
        );
    }

    #[test]
    fn arity_is_checked_before_the_call() {
        assert!(matches!(call("cons", &[int(1)]), Err(Error::ArityMismatch(e)) if e.got == 1));
        assert!(matches!(call("begin", &[]), Err(Error::ArityMismatch(_))));
        assert!(matches!(call("<", &[int(1), int(2), int(3)]), Err(Error::ArityMismatch(_))));
    }

    #[test]
    fn comparisons_mix_integers_and_floats() {
        assert!(matches!(call("<", &[int(1), float(1.5)]), Ok(LispObject::Bool(true))));
        assert!(matches!(call(">=", &[int(2), int(2)]), Ok(LispObject::Bool(true))));
        assert!(matches!(call(">", &[int(2), int(2)]), Ok(LispObject::Bool(false))));
        assert!(matches!(call("=", &[int(2), float(2.0)]), Ok(LispObject::Bool(true))));
    }

    #[test]
    fn car_and_cdr() {
        let xs = list(vec![int(1), int(2), int(3)]);
        assert!(is_int(call("car", &[xs.clone()]), 1));
        assert_eq!(call("cdr", &[xs]), Ok(list(vec![int(2), int(3)])));
        assert_eq!(call("cdr", &[list(vec![int(1)])]), Ok(LispObject::new_list()));
        assert_eq!(call("car", &[LispObject::new_list()]), Err(Error::EmptyListAccess("car")));
        assert_eq!(call("cdr", &[LispObject::new_list()]), Err(Error::EmptyListAccess("cdr")));
        assert!(matches!(call("car", &[int(1)]), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn building_lists() {
        assert_eq!(
            call("cons", &[int(0), list(vec![int(1)])]),
            Ok(list(vec![int(0), int(1)]))
        );
        assert!(matches!(call("cons", &[int(0), int(1)]), Err(Error::TypeMismatch(_))));
        assert_eq!(
            call("append", &[list(vec![int(1)]), LispObject::new_list(), list(vec![int(2)])]),
            Ok(list(vec![int(1), int(2)]))
        );
        assert!(is_int(call("length", &[list(vec![int(1), int(2)])]), 2));
        assert!(is_int(call("length", &[LispObject::new_symbol("abc")]), 3));
    }

    #[test]
    fn predicates() {
        assert!(matches!(call("null?", &[LispObject::new_list()]), Ok(LispObject::Bool(true))));
        assert!(matches!(call("null?", &[int(0)]), Ok(LispObject::Bool(false))));
        assert!(matches!(call("list?", &[LispObject::new_list()]), Ok(LispObject::Bool(true))));
        assert!(matches!(call("number?", &[float(1.0)]), Ok(LispObject::Bool(true))));
        assert!(matches!(call("number?", &[LispObject::Bool(true)]), Ok(LispObject::Bool(false))));
        assert!(matches!(call("symbol", &[LispObject::new_symbol("x")]), Ok(LispObject::Bool(true))));
        assert!(matches!(
            call("procedure?", &[LispObject::Primitive(CORE["car"])]),
            Ok(LispObject::Bool(true))
        ));
        assert!(matches!(call("not", &[int(0)]), Ok(LispObject::Bool(true))));
    }

    #[test]
    fn eq_is_identity_for_lists() {
        let xs = list(vec![int(1)]);
        assert!(matches!(call("eq", &[xs.clone(), xs.clone()]), Ok(LispObject::Bool(true))));
        assert!(matches!(call("eq", &[xs.clone(), list(vec![int(1)])]), Ok(LispObject::Bool(false))));
        assert!(matches!(call("equal?", &[xs, list(vec![int(1)])]), Ok(LispObject::Bool(true))));
    }

    #[test]
    fn max_and_min_accept_a_list() {
        assert!(matches!(call("max", &[int(1), float(2.5), int(2)]), Ok(LispObject::Float(x)) if x == 2.5));
        assert!(is_int(call("min", &[list(vec![int(4), int(-1)])]), -1));
        assert_eq!(call("max", &[LispObject::new_list()]), Err(Error::EmptyListAccess("max")));
    }

    #[test]
    fn rounding_goes_to_even() {
        assert!(is_int(call("round", &[float(2.5)]), 2));
        assert!(is_int(call("round", &[float(3.5)]), 4));
        assert!(matches!(call("round", &[float(1.234), int(2)]), Ok(LispObject::Float(x)) if (x - 1.23).abs() < 1e-12));
        assert!(is_int(call("round", &[int(1250), int(-2)]), 1200));
        assert!(is_int(call("round", &[int(1350), int(-2)]), 1400));
        assert!(is_int(call("round", &[int(7)]), 7));
    }

    #[test]
    fn math_functions() {
        assert!(matches!(call("sqrt", &[int(16)]), Ok(LispObject::Float(x)) if x == 4.0));
        assert_eq!(call("sqrt", &[int(-1)]), Err(Error::MathDomain("sqrt")));
        assert!(matches!(call("log", &[int(8), int(2)]), Ok(LispObject::Float(x)) if (x - 3.0).abs() < 1e-12));
        assert_eq!(call("log", &[int(0)]), Err(Error::MathDomain("log")));
        assert!(matches!(call("pow", &[int(2), int(10)]), Ok(LispObject::Float(x)) if x == 1024.0));
        assert!(is_int(call("floor", &[float(-1.5)]), -2));
        assert!(is_int(call("ceil", &[float(1.2)]), 2));
        assert!(is_int(call("factorial", &[int(5)]), 120));
        assert_eq!(call("factorial", &[int(25)]), Ok(big("15511210043330985984000000")));
        assert_eq!(call("factorial", &[int(-1)]), Err(Error::MathDomain("factorial")));
        assert!(is_int(call("gcd", &[int(12), int(-18)]), 6));
        assert!(matches!(call("isnan", &[float(f64::NAN)]), Ok(LispObject::Bool(true))));
        assert_eq!(call("fmod", &[int(1), int(0)]), Err(Error::MathDomain("fmod")));
    }

    #[test]
    fn special_functions() {
        assert!(is_float(call("gamma", &[int(5)]), 24.0));
        assert!(is_float(call("gamma", &[float(0.5)]), std::f64::consts::PI.sqrt()));
        assert_eq!(call("gamma", &[int(0)]), Err(Error::MathDomain("gamma")));
        assert_eq!(call("gamma", &[int(-2)]), Err(Error::MathDomain("gamma")));
        assert!(is_float(call("lgamma", &[int(3)]), 2f64.ln()));
        assert_eq!(call("lgamma", &[int(0)]), Err(Error::MathDomain("lgamma")));
        assert!(is_float(call("erf", &[int(0)]), 0.0));
        assert!(is_float(call("erfc", &[int(0)]), 1.0));
        assert!(is_float(call("cbrt", &[int(27)]), 3.0));
        assert!(is_float(call("cbrt", &[int(-8)]), -2.0));
        assert!(is_float(call("exp2", &[int(10)]), 1024.0));
    }

    #[test]
    fn integer_functions() {
        assert!(is_int(call("isqrt", &[int(17)]), 4));
        assert!(is_int(call("isqrt", &[int(16)]), 4));
        assert_eq!(call("isqrt", &[big("100000000000000000000")]), Ok(int(10_000_000_000)));
        assert_eq!(call("isqrt", &[int(-1)]), Err(Error::MathDomain("isqrt")));
        assert!(matches!(call("isqrt", &[float(4.0)]), Err(Error::TypeMismatch(_))));
        assert!(is_int(call("lcm", &[int(4), int(6)]), 12));
        assert!(is_int(call("lcm", &[int(-4), int(6)]), 12));
        assert!(is_int(call("lcm", &[int(4), int(0)]), 0));
        assert!(is_int(call("lcm", &[]), 1));
        assert!(is_int(call("comb", &[int(5), int(2)]), 10));
        assert!(is_int(call("comb", &[int(5), int(0)]), 1));
        assert!(is_int(call("comb", &[int(3), int(5)]), 0));
        assert_eq!(call("comb", &[int(100), int(50)]), Ok(big("100891344545564193334812497256")));
        assert_eq!(call("comb", &[int(-1), int(1)]), Err(Error::MathDomain("comb")));
        assert!(is_int(call("perm", &[int(5), int(2)]), 20));
        assert!(is_int(call("perm", &[int(4)]), 24));
        assert!(is_int(call("perm", &[int(2), int(3)]), 0));
        assert!(is_int(call("gcd", &[big("1000000000000000000000"), int(75)]), 25));
    }

    #[test]
    fn sums_and_products_over_lists() {
        assert!(is_int(call("prod", &[list(vec![int(2), int(3), int(4)])]), 24));
        assert!(is_int(call("prod", &[LispObject::new_list()]), 1));
        assert!(is_float(call("prod", &[list(vec![int(2), float(0.5)])]), 1.0));
        let tenths = list(vec![float(0.1); 10]);
        assert!(matches!(call("fsum", &[tenths]), Ok(LispObject::Float(x)) if x == 1.0));
        let cancelling = list(vec![float(1e100), float(1.0), float(-1e100)]);
        assert!(matches!(call("fsum", &[cancelling]), Ok(LispObject::Float(x)) if x == 1.0));
        assert!(matches!(call("fsum", &[int(1)]), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn float_decomposition() {
        assert_eq!(call("frexp", &[float(8.0)]), Ok(list(vec![float(0.5), int(4)])));
        assert_eq!(call("modf", &[float(-2.5)]), Ok(list(vec![float(-0.5), float(-2.0)])));
        assert!(is_float(call("ldexp", &[float(0.75), int(4)]), 12.0));
        assert!(matches!(call("ldexp", &[float(1.0), big("100000000000000000000")]), Ok(LispObject::Float(x)) if x.is_infinite()));
        assert!(is_float(call("remainder", &[int(7), int(2)]), -1.0));
        assert_eq!(call("remainder", &[int(1), int(0)]), Err(Error::MathDomain("remainder")));
    }

    #[test]
    fn closeness_and_distance() {
        assert!(matches!(call("isclose", &[float(1.0), float(1.0 + 1e-12)]), Ok(LispObject::Bool(true))));
        assert!(matches!(call("isclose", &[float(1.0), float(1.001)]), Ok(LispObject::Bool(false))));
        assert!(is_float(call("dist", &[list(vec![int(0), int(0)]), list(vec![int(3), int(4)])]), 5.0));
        assert_eq!(
            call("dist", &[list(vec![int(0)]), list(vec![int(3), int(4)])]),
            Err(Error::MathDomain("dist"))
        );
    }

    #[test]
    fn exact_arithmetic_on_large_integers() {
        assert_eq!(
            call("*", &[int(99_999_999_999), int(99_999_999_999)]),
            Ok(big("9999999999800000000001"))
        );
        assert_eq!(call("-", &[big("-9223372036854775808")]), Ok(big("9223372036854775808")));
        assert_eq!(call("abs", &[big("-100000000000000000000")]), Ok(big("100000000000000000000")));
        assert_eq!(
            call("//", &[big("100000000000000000001"), int(10)]),
            Ok(big("10000000000000000000"))
        );
        assert_eq!(call("floor", &[float(1e20)]), Ok(big("100000000000000000000")));
        assert_eq!(call("round", &[big("123456789012345678901"), int(-20)]), Ok(big("100000000000000000000")));
        assert_eq!(call("round", &[int(5), int(-4000000000)]), Ok(int(0)));
        assert_eq!(call("floor", &[float(f64::INFINITY)]), Err(Error::IntegerOverflow("floor")));
    }

    #[test]
    fn map_applies_across_lists() {
        let add = LispObject::Primitive(CORE["+"]);
        assert_eq!(
            call("map", &[add, list(vec![int(1), int(2), int(3)]), list(vec![int(10), int(20)])]),
            Ok(list(vec![int(11), int(22)]))
        );
        assert!(matches!(call("map", &[int(1), LispObject::new_list()]), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn begin_returns_its_last_argument() {
        assert!(is_int(call("begin", &[int(1), int(2)]), 2));
    }
}
