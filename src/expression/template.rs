//! Mixed literal/expression templates: `"hp=$(self.hp) str"` compiles to a
//! literal segment, a compiled expression segment, and another literal
//! segment. Three entry forms nest inside a template:
//!
//! - `$(<expr>)` - evaluate, no cast or format.
//! - `$[<fmt>](<expr>)` - evaluate with an explicit `[0][width][.precision][i|f]`
//!   format: an optional zero-pad flag, optional field width, optional
//!   decimal precision, and an optional trailing cast (`i` truncates to an
//!   integer, `f` forces double formatting).
//! - `{<path>}` - a direct document lookup, not run through the arithmetic
//!   evaluator; reads the value in its native shape (string or number).
//!
//! A template that is a single bare `$(...)` block with no surrounding
//! text and no format compiles to one unformatted `Eval` segment, which is
//! what `returnable_as_double` looks for: only then is it safe to read the
//! result straight as a double instead of going through string formatting.

use super::eval::{self, VariableResolver};
use super::instr::Program;
use super::parser;

/// `[0][width][.precision][i|f]`. The all-default `Format` (no pad, no
/// width, no precision, no cast) is what makes a bare `$(...)` entry
/// equivalent to `returnable_as_double`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Format {
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
    cast: Cast,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Cast {
    #[default]
    None,
    Int,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Eval(Program, Format),
    Variable(String, Format),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Template, String> {
        let mut segments = Vec::new();
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;
        let mut literal = String::new();

        while i < chars.len() {
            if chars[i] == '$' && chars.get(i + 1) == Some(&'(') {
                flush_literal(&mut segments, &mut literal);
                let (expr_src, next) = extract_balanced(&chars, i + 2, '(', ')')?;
                segments.push(Segment::Eval(parser::compile(&expr_src)?, Format::default()));
                i = next;
            } else if chars[i] == '$' && chars.get(i + 1) == Some(&'[') {
                flush_literal(&mut segments, &mut literal);
                let (fmt_src, after_fmt) = extract_until(&chars, i + 2, ']')?;
                if chars.get(after_fmt) != Some(&'(') {
                    return Err(format!(
                        "expected '(' after format spec '$[{}]'",
                        fmt_src
                    ));
                }
                let (expr_src, next) = extract_balanced(&chars, after_fmt + 1, '(', ')')?;
                let format = parse_format(&fmt_src)?;
                segments.push(Segment::Eval(parser::compile(&expr_src)?, format));
                i = next;
            } else if chars[i] == '{' {
                flush_literal(&mut segments, &mut literal);
                let (path, next) = extract_until(&chars, i + 1, '}')?;
                segments.push(Segment::Variable(path, Format::default()));
                i = next;
            } else {
                literal.push(chars[i]);
                i += 1;
            }
        }
        flush_literal(&mut segments, &mut literal);
        Ok(Template { segments })
    }

    /// `true` when the whole template is exactly one unformatted `$(...)`
    /// entry with no literal text, no cast, and no width/precision, so it
    /// can be returned as a double rather than a formatted string.
    pub fn returnable_as_double(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Eval(_, format)] if *format == Format::default())
    }

    pub fn eval_to_f64(
        &self,
        resolver: &mut dyn VariableResolver,
        stack: &mut Vec<f64>,
    ) -> Result<f64, String> {
        match self.segments.as_slice() {
            [Segment::Eval(program, format)] if *format == Format::default() => {
                eval::eval(program, resolver, stack)
            }
            [] => Ok(0.0),
            _ => Err("template is not a pure expression".to_string()),
        }
    }

    pub fn eval_to_string(
        &self,
        resolver: &mut dyn VariableResolver,
        stack: &mut Vec<f64>,
    ) -> Result<String, String> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Eval(program, format) => {
                    let v = eval::eval(program, resolver, stack)?;
                    out.push_str(&apply_format(v, format));
                }
                Segment::Variable(path, format) => {
                    if *format == Format::default() {
                        out.push_str(&resolver.resolve_string(path));
                    } else {
                        let v = resolver.resolve(path);
                        out.push_str(&apply_format(v, format));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        v.to_string()
    }
}

fn apply_format(value: f64, format: &Format) -> String {
    let body = match format.cast {
        Cast::Int => format!("{}", value.trunc() as i64),
        Cast::Double | Cast::None => match format.precision {
            Some(p) => format!("{:.*}", p, value),
            None => format_number(value),
        },
    };
    match format.width {
        Some(w) if format.zero_pad => format!("{:0>width$}", body, width = w),
        Some(w) => format!("{:>width$}", body, width = w),
        None => body,
    }
}

/// Parses `[0][width][.precision][i|f]`.
fn parse_format(spec: &str) -> Result<Format, String> {
    let mut chars = spec.chars().peekable();
    let mut zero_pad = false;
    if chars.peek() == Some(&'0') {
        zero_pad = true;
        chars.next();
    }

    let mut width_digits = String::new();
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        width_digits.push(chars.next().unwrap());
    }
    let width = if width_digits.is_empty() {
        None
    } else {
        Some(
            width_digits
                .parse()
                .map_err(|_| format!("bad width in format spec '{}'", spec))?,
        )
    };

    let mut precision = None;
    if chars.peek() == Some(&'.') {
        chars.next();
        let mut precision_digits = String::new();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            precision_digits.push(chars.next().unwrap());
        }
        precision = Some(
            precision_digits
                .parse()
                .map_err(|_| format!("bad precision in format spec '{}'", spec))?,
        );
    }

    let cast = match chars.next() {
        Some('i') => Cast::Int,
        Some('f') => Cast::Double,
        Some(other) => return Err(format!("unknown format cast flag '{}'", other)),
        None => Cast::None,
    };
    if chars.next().is_some() {
        return Err(format!("trailing characters in format spec '{}'", spec));
    }

    Ok(Format { zero_pad, width, precision, cast })
}

fn extract_balanced(
    chars: &[char],
    start: usize,
    open: char,
    close: char,
) -> Result<(String, usize), String> {
    let mut depth = 1;
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == open {
            depth += 1;
            out.push(c);
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok((out, i + 1));
            }
            out.push(c);
        } else {
            out.push(c);
        }
        i += 1;
    }
    Err(format!("unbalanced '{}' block", open))
}

fn extract_until(chars: &[char], start: usize, close: char) -> Result<(String, usize), String> {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() {
        if chars[i] == close {
            return Ok((out, i + 1));
        }
        out.push(chars[i]);
        i += 1;
    }
    Err(format!("missing closing '{}'", close))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::eval::NullResolver;

    #[test]
    fn pure_expression_is_returnable_as_double() {
        let t = Template::compile("$(1+2)").unwrap();
        assert!(t.returnable_as_double());
        let mut stack = Vec::new();
        assert_eq!(t.eval_to_f64(&mut NullResolver, &mut stack).unwrap(), 3.0);
    }

    #[test]
    fn mixed_template_is_not_returnable_as_double() {
        let t = Template::compile("hp=$(1+2)!").unwrap();
        assert!(!t.returnable_as_double());
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut NullResolver, &mut stack).unwrap(),
            "hp=3!"
        );
    }

    #[test]
    fn nested_parens_inside_block() {
        let t = Template::compile("$((1+2)*3)").unwrap();
        let mut stack = Vec::new();
        assert_eq!(t.eval_to_f64(&mut NullResolver, &mut stack).unwrap(), 9.0);
    }

    #[test]
    fn plain_literal_has_no_expressions() {
        let t = Template::compile("just text").unwrap();
        assert!(!t.returnable_as_double());
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut NullResolver, &mut stack).unwrap(),
            "just text"
        );
    }

    #[test]
    fn formatted_entry_applies_width_and_zero_pad() {
        let t = Template::compile("$[05](3+4)").unwrap();
        assert!(!t.returnable_as_double());
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut NullResolver, &mut stack).unwrap(),
            "00007"
        );
    }

    #[test]
    fn formatted_entry_applies_precision_and_double_cast() {
        let t = Template::compile("$[.2f](1/3)").unwrap();
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut NullResolver, &mut stack).unwrap(),
            "0.33"
        );
    }

    #[test]
    fn formatted_entry_applies_int_cast() {
        let t = Template::compile("$[i](7.9)").unwrap();
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut NullResolver, &mut stack).unwrap(),
            "7"
        );
    }

    #[test]
    fn variable_entry_reads_document_value_directly() {
        struct FixedStringResolver;
        impl VariableResolver for FixedStringResolver {
            fn resolve(&mut self, _name: &str) -> f64 {
                0.0
            }
            fn resolve_string(&mut self, name: &str) -> String {
                format!("value-of-{}", name)
            }
        }

        let t = Template::compile("tag={self.tag}").unwrap();
        assert!(!t.returnable_as_double());
        let mut stack = Vec::new();
        assert_eq!(
            t.eval_to_string(&mut FixedStringResolver, &mut stack).unwrap(),
            "tag=value-of-self.tag"
        );
    }

    #[test]
    fn unbalanced_block_is_a_compile_error() {
        assert!(Template::compile("$(1+2").is_err());
        assert!(Template::compile("{self.tag").is_err());
        assert!(Template::compile("$[1(1+2)").is_err());
    }
}
