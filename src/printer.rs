use crate::types::LispObject;
use itertools::Itertools;
use std::fmt;

pub fn pr_str(object: &LispObject) -> String {
    match object {
        LispObject::List(elements) => format!("({})", elements.iter().map(pr_str).join(" ")),
        LispObject::Integer(value) => value.to_string(),
        LispObject::Float(value) => float_repr(*value),
        LispObject::Bool(true) => String::from("true"),
        LispObject::Bool(false) => String::from("false"),
        LispObject::Symbol(name) => name.to_string(),
        LispObject::Nil => String::new(),
        LispObject::Primitive(func) => format!("#<primitive {}>", func.name),
        LispObject::Closure(closure) => closure.to_string(),
    }
}

// Debug formatting keeps a trailing ".0" on integral floats so they can't be mistaken for
// integers, and switches to exponent form (`1e16`, `1e-7`) outside 1e-4..1e16.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        String::from("nan")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        format!("{:?}", value)
    }
}

/// The text a REPL should show for `object`, or `None` when there is nothing to show.
pub fn print(object: &LispObject) -> Option<String> {
    match object {
        LispObject::Nil => None,
        _ => Some(pr_str(object)),
    }
}

impl fmt::Display for LispObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    #[test]
    fn lists_print_like_they_read() {
        let obj = read_str("(define  (f x)   (g 1 2.5 (quote ())))").unwrap();
        assert_eq!(pr_str(&obj), "(define (f x) (g 1 2.5 (quote ())))");
    }

    #[test]
    fn floats_keep_their_point() {
        assert_eq!(pr_str(&LispObject::Float(2.0)), "2.0");
        assert_eq!(pr_str(&LispObject::Float(0.1)), "0.1");
        assert_eq!(pr_str(&LispObject::Float(f64::INFINITY)), "inf");
        assert_eq!(pr_str(&LispObject::Float(f64::NEG_INFINITY)), "-inf");
        assert_eq!(pr_str(&LispObject::Float(f64::NAN)), "nan");
    }

    #[test]
    fn large_and_small_floats_use_exponents() {
        assert_eq!(pr_str(&LispObject::Float(1e16)), "1e16");
        assert_eq!(pr_str(&LispObject::Float(1e-7)), "1e-7");
        assert_eq!(pr_str(&LispObject::Float(-2.5e-10)), "-2.5e-10");
        assert_eq!(pr_str(&LispObject::Float(1e15)), "1000000000000000.0");
        assert_eq!(pr_str(&LispObject::Float(0.0001)), "0.0001");
    }

    #[test]
    fn integers_print_every_digit() {
        let big = read_str("-123456789012345678901234567890").unwrap();
        assert_eq!(pr_str(&big), "-123456789012345678901234567890");
    }

    #[test]
    fn booleans_print_by_name() {
        assert_eq!(pr_str(&LispObject::Bool(true)), "true");
        assert_eq!(pr_str(&LispObject::Bool(false)), "false");
    }

    #[test]
    fn nothing_to_print_for_nil() {
        assert_eq!(print(&LispObject::Nil), None);
        assert_eq!(print(&LispObject::new_list()), Some(String::from("()")));
    }
}
