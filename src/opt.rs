//! Declarative typed `key=value` option parsing for pipeline stages.
//!
//! Stages declare their options locally in `main` and hand them to
//! [`parse`] in two groups: positional options, which bare argument tokens
//! fill in declaration order, and keyword-only options. Every option also
//! matches `key=value` tokens by key. Values understand C-style integer
//! literals with fixed point and SI suffixes, SI-suffixed floats, complex
//! literals, brace-wrapped vectors and sets, and case-insensitive enum
//! names.
//!
//! ```
//! use pipesdr::opt::{self, Opt};
//!
//! let mut freq = Opt::<f32>::required("freq", 0.0).placeholder("FREQ");
//! let mut id = Opt::<u64>::new("stream", 0).placeholder("ID");
//! let args = vec!["1.5k".to_string(), "stream=7".to_string()];
//! assert!(opt::parse(&mut [&mut freq, &mut id], &mut [], &args));
//! assert_eq!(*freq.get(), 1500.0);
//! assert_eq!(*id.get(), 7);
//! ```

use std::collections::BTreeSet;

/// Why an option value failed to parse.
///
/// The rendered messages are fixed; [`Opt`] prints them prefixed with
/// `error: <key>: `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Not `true`, `1`, `false` or `0`.
    #[error("boolean value expected")]
    Bool,
    /// Malformed signed integer.
    #[error("integer value expected")]
    Int,
    /// Malformed unsigned integer.
    #[error("unsigned integer value expected")]
    Uint,
    /// Malformed float.
    #[error("floating-point value expected")]
    Float,
    /// A fixed point with nothing after it.
    #[error("digits expected after point")]
    Point,
    /// Trailing characters that are not a known SI unit.
    #[error("invalid unit '{0}'")]
    Unit(String),
    /// The value does not fit the option's type.
    #[error("option value out of range")]
    Range,
    /// Malformed complex literal.
    #[error("complex value expected (valid format is [REAL][(+|-)(j|J|i|I)IMAG])")]
    Complex,
    /// A fixed-size vector without its braces.
    #[error("vector values should be wrapped in curly braces")]
    Braces,
    /// Wrong number of elements for a fixed-size vector.
    #[error("vector of {0} elements expected")]
    Arity(usize),
    /// No such enum name.
    #[error("invalid value '{0}'")]
    Enum(String),
}

/// A value an [`Opt`] can parse from an argument token.
pub trait Value: Sized {
    /// True only for booleans: a bare key token sets them.
    const IS_FLAG: bool = false;

    /// Placeholder shown by [`usage`].
    fn placeholder() -> String;

    /// Parse the (non-empty, trimmed) argument text.
    fn parse(s: &str) -> Result<Self, ParseError>;
}

/// Implement [`Value`] for a unit enum from a name table.
///
/// Names must be lowercase; matching is case-insensitive. Stages use this
/// for their local mode enums the same way the library declares
/// [`Content`](crate::packet::Content) and the unit enums.
#[macro_export]
macro_rules! enum_option {
    ($ty:ty { $($name:literal => $value:expr),+ $(,)? }) => {
        impl $crate::opt::Value for $ty {
            fn placeholder() -> String {
                let names: &[&str] = &[$($name),+];
                let mut out = String::from("(");
                for (i, n) in names.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    out.push_str(n);
                }
                out.push(')');
                out
            }

            fn parse(s: &str) -> Result<Self, $crate::opt::ParseError> {
                let lc = s.to_lowercase();
                $(
                    if lc == $name {
                        return Ok($value);
                    }
                )+
                Err($crate::opt::ParseError::Enum(s.to_string()))
            }
        }
    };
}

impl Value for bool {
    const IS_FLAG: bool = true;
    fn placeholder() -> String {
        "(true|1|false|0)".into()
    }
    fn parse(s: &str) -> Result<bool, ParseError> {
        match s {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ParseError::Bool),
        }
    }
}

impl Value for String {
    fn placeholder() -> String {
        "STRING".into()
    }
    fn parse(s: &str) -> Result<String, ParseError> {
        Ok(s.to_string())
    }
}

const POW10: [u64; 19] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
];

// Integer SI units scale by powers of 1000.
fn int_unit_exp(unit: &str) -> Option<usize> {
    let mut chars = unit.chars();
    let exp = match chars.next()? {
        'k' | 'K' => 3,
        'M' => 6,
        'G' => 9,
        'T' => 12,
        'P' => 15,
        'E' => 18,
        _ => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(exp)
}

// C-style integer literal with optional fixed point and SI unit suffix.
// Fixed point and units only combine with plain decimal literals.
fn parse_uint_si(s: &str) -> Result<u64, ParseError> {
    if s.starts_with('-') {
        // Should be unsigned.
        return Err(ParseError::Uint);
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return Err(ParseError::Uint);
    }

    let bytes = s.as_bytes();
    let (base, digits_start) = if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => (16u32, 2),
            b'o' | b'O' => (8, 2),
            _ => (8, 1),
        }
    } else {
        (10, 0)
    };

    let body = &s[digits_start..];
    let digits_len = body
        .bytes()
        .take_while(|b| (*b as char).is_digit(base))
        .count();
    if digits_len == 0 {
        return Err(ParseError::Uint);
    }

    let mut value = u64::from_str_radix(&body[..digits_len], base).map_err(|_| ParseError::Range)?;

    let mut rest = &body[digits_len..];
    if rest.is_empty() {
        return Ok(value);
    }
    if base != 10 || digits_start != 0 {
        // No fixed point or units for octal and hexadecimal values.
        return Err(ParseError::Uint);
    }

    let mut frac = 0u64;
    let mut frac_digits = 0usize;
    if let Some(r) = rest.strip_prefix('.') {
        let n = r.bytes().take_while(u8::is_ascii_digit).count();
        if n == 0 {
            return Err(ParseError::Point);
        }
        if n == r.len() {
            // Digits to the end: a fixed point needs a unit to scale by.
            return Err(ParseError::Uint);
        }
        frac = r[..n].parse().map_err(|_| ParseError::Range)?;
        frac_digits = n;
        rest = &r[n..];
    }

    let exp = int_unit_exp(rest).ok_or_else(|| ParseError::Unit(rest.to_string()))?;
    if frac_digits > exp {
        return Err(ParseError::Uint);
    }

    value = value
        .checked_mul(POW10[exp])
        .and_then(|v| frac.checked_mul(POW10[exp - frac_digits]).and_then(|f| v.checked_add(f)))
        .ok_or(ParseError::Range)?;

    Ok(value)
}

fn parse_int_si(s: &str) -> Result<i64, ParseError> {
    let (neg, mag_str) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let mag = parse_uint_si(mag_str).map_err(|e| match e {
        ParseError::Uint => ParseError::Int,
        other => other,
    })?;
    if neg {
        0i64.checked_sub_unsigned(mag).ok_or(ParseError::Range)
    } else {
        i64::try_from(mag).map_err(|_| ParseError::Range)
    }
}

// Float SI units scale by powers of 10.
fn float_unit_factor(c: char) -> Option<f64> {
    Some(match c {
        'z' => 1e-21,
        'a' => 1e-18,
        'f' => 1e-15,
        'p' => 1e-12,
        'n' => 1e-9,
        'u' => 1e-6,
        'm' => 1e-3,
        'k' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        'T' => 1e12,
        'P' => 1e15,
        'E' => 1e18,
        _ => return None,
    })
}

fn parse_float_si(s: &str) -> Result<f64, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Float);
    }
    if let Ok(v) = s.parse::<f64>() {
        return Ok(v);
    }

    // strtod semantics: the longest numeric prefix, then a unit suffix.
    for cut in (1..s.len()).rev() {
        if !s.is_char_boundary(cut) {
            continue;
        }
        if let Ok(v) = s[..cut].parse::<f64>() {
            let suffix = &s[cut..];
            let mut it = suffix.chars();
            if let Some(c) = it.next() {
                if it.next().is_none() {
                    if let Some(factor) = float_unit_factor(c) {
                        return Ok(v * factor);
                    }
                }
            }
            return Err(ParseError::Unit(suffix.to_string()));
        }
    }

    Err(ParseError::Float)
}

impl Value for i64 {
    fn placeholder() -> String {
        "INT".into()
    }
    fn parse(s: &str) -> Result<i64, ParseError> {
        parse_int_si(s)
    }
}

impl Value for u64 {
    fn placeholder() -> String {
        "UINT".into()
    }
    fn parse(s: &str) -> Result<u64, ParseError> {
        parse_uint_si(s)
    }
}

impl Value for f32 {
    fn placeholder() -> String {
        "REAL".into()
    }
    fn parse(s: &str) -> Result<f32, ParseError> {
        parse_float_si(s).map(|v| v as f32)
    }
}

impl Value for f64 {
    fn placeholder() -> String {
        "REAL".into()
    }
    fn parse(s: &str) -> Result<f64, ParseError> {
        parse_float_si(s)
    }
}

// [REAL][(+|-)(j|J|i|I)IMAG]. Either part may be empty; an empty IMAG after
// the marker means 1, so `j` and `-j` are the unit imaginaries.
fn parse_complex(s: &str) -> Result<(f64, f64), ParseError> {
    if s.chars().any(char::is_whitespace) {
        return Err(ParseError::Complex);
    }

    let bytes = s.as_bytes();
    let is_marker = |b: u8| matches!(b, b'j' | b'J' | b'i' | b'I');

    let mut sep = None;
    for i in 0..bytes.len().saturating_sub(1) {
        if (bytes[i] == b'+' || bytes[i] == b'-') && is_marker(bytes[i + 1]) {
            sep = Some((i, i + 2, bytes[i] == b'-'));
            break;
        }
    }
    if sep.is_none() && bytes.first().copied().is_some_and(is_marker) {
        sep = Some((0, 1, false));
    }

    let (real_str, imag_str, neg) = match sep {
        Some((at, after, neg)) => (&s[..at], &s[after..], neg),
        None => (s, "", false),
    };

    if imag_str.starts_with(['+', '-']) {
        return Err(ParseError::Complex);
    }

    let real = if real_str.is_empty() {
        0.0
    } else {
        parse_float_si(real_str)?
    };
    let imag = match sep {
        None => 0.0,
        Some(_) => {
            let mag = if imag_str.is_empty() {
                1.0
            } else {
                parse_float_si(imag_str)?
            };
            if neg { -mag } else { mag }
        }
    };

    Ok((real, imag))
}

impl Value for num_complex::Complex<f32> {
    fn placeholder() -> String {
        "[REAL][[(+|-)](j|J|i|I)IMAG]".into()
    }
    fn parse(s: &str) -> Result<Self, ParseError> {
        let (re, im) = parse_complex(s)?;
        Ok(Self::new(re as f32, im as f32))
    }
}

impl Value for num_complex::Complex<f64> {
    fn placeholder() -> String {
        "[REAL][[(+|-)](j|J|i|I)IMAG]".into()
    }
    fn parse(s: &str) -> Result<Self, ParseError> {
        let (re, im) = parse_complex(s)?;
        Ok(Self::new(re, im))
    }
}

// Elements of a brace-wrapped list, trimmed, one trailing separator
// tolerated. Interior empty elements are kept and mean "default".
fn split_elements(inner: &str) -> Vec<&str> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Vec::new();
    }
    let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if inner.ends_with(',') {
        parts.pop();
    }
    parts
}

fn strip_braces(s: &str) -> Option<&str> {
    s.strip_prefix('{').and_then(|r| r.strip_suffix('}'))
}

impl<T: Value + Default> Value for Vec<T> {
    fn placeholder() -> String {
        format!("{{{}, ... }}", T::placeholder())
    }
    fn parse(s: &str) -> Result<Vec<T>, ParseError> {
        let inner = match strip_braces(s) {
            Some(inner) => inner,
            // A single bare value is a one-element list.
            None => return Ok(vec![T::parse(s)?]),
        };
        let mut out = Vec::new();
        for part in split_elements(inner) {
            if part.is_empty() {
                out.push(T::default());
            } else {
                out.push(T::parse(part)?);
            }
        }
        Ok(out)
    }
}

impl<T: Value + Ord> Value for BTreeSet<T> {
    fn placeholder() -> String {
        format!("{{{}, ... }}", T::placeholder())
    }
    fn parse(s: &str) -> Result<BTreeSet<T>, ParseError> {
        let mut out = BTreeSet::new();
        match strip_braces(s) {
            Some(inner) => {
                for part in split_elements(inner) {
                    if !part.is_empty() {
                        out.insert(T::parse(part)?);
                    }
                }
            }
            None => {
                out.insert(T::parse(s)?);
            }
        }
        Ok(out)
    }
}

impl<T: Value + Default, const N: usize> Value for [T; N] {
    fn placeholder() -> String {
        format!("{{{}x{}}}", N, T::placeholder())
    }
    fn parse(s: &str) -> Result<[T; N], ParseError> {
        let inner = strip_braces(s).ok_or(ParseError::Braces)?;
        let parts = split_elements(inner);
        if parts.len() != N {
            return Err(ParseError::Arity(N));
        }
        let mut out: [T; N] = std::array::from_fn(|_| T::default());
        for (slot, part) in out.iter_mut().zip(parts) {
            if !part.is_empty() {
                *slot = T::parse(part)?;
            }
        }
        Ok(out)
    }
}

/// One declared option: a key, a usage placeholder, a requiredness marker
/// and a typed value. Construction is declarative and local to `main`;
/// after [`parse`] the value is read in place.
pub struct Opt<T: Value> {
    key: &'static str,
    placeholder: Option<&'static str>,
    required: bool,
    set: bool,
    value: T,
}

impl<T: Value> Opt<T> {
    /// Declare an option with a default value.
    pub fn new(key: &'static str, default: T) -> Self {
        Self {
            key,
            placeholder: None,
            required: false,
            set: false,
            value: default,
        }
    }

    /// Declare a required option. Requiredness only affects [`usage`]
    /// rendering; stages check [`is_set`](Opt::is_set) themselves so they
    /// control the error message.
    pub fn required(key: &'static str, default: T) -> Self {
        Self {
            required: true,
            ..Self::new(key, default)
        }
    }

    /// Override the placeholder shown by [`usage`].
    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// The current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// True when an argument assigned this option.
    pub fn is_set(&self) -> bool {
        self.set
    }
}

/// Object-safe view of an [`Opt`], what [`parse`] and [`usage`] work with.
pub trait OptArg {
    /// The option key.
    fn key(&self) -> &str;
    /// The usage placeholder.
    fn placeholder_text(&self) -> String;
    /// Declared required.
    fn is_required(&self) -> bool;
    /// A value has been assigned.
    fn is_set(&self) -> bool;
    /// Boolean option: a bare key token sets it.
    fn is_flag(&self) -> bool;
    /// Parse an argument into the option. An empty value resets the option
    /// to unset; a malformed one prints `error: <key>: <message>` and
    /// returns false.
    fn parse_arg(&mut self, arg: &str) -> bool;
}

impl<T: Value> OptArg for Opt<T> {
    fn key(&self) -> &str {
        self.key
    }
    fn placeholder_text(&self) -> String {
        match self.placeholder {
            Some(p) => p.to_string(),
            None => T::placeholder(),
        }
    }
    fn is_required(&self) -> bool {
        self.required
    }
    fn is_set(&self) -> bool {
        self.set
    }
    fn is_flag(&self) -> bool {
        T::IS_FLAG
    }
    fn parse_arg(&mut self, arg: &str) -> bool {
        self.set = false;
        let arg = arg.trim();
        if arg.is_empty() {
            return true;
        }
        match T::parse(arg) {
            Ok(v) => {
                self.value = v;
                self.set = true;
                true
            }
            Err(e) => {
                eprintln!("error: {}: {}", self.key, e);
                false
            }
        }
    }
}

fn lookup<'s, 'e>(
    positional: &'s mut [&'e mut dyn OptArg],
    keyword: &'s mut [&'e mut dyn OptArg],
    key: &str,
) -> Option<&'s mut dyn OptArg>
where
    'e: 's,
{
    positional
        .iter_mut()
        .chain(keyword.iter_mut())
        .find(|o| o.key() == key)
        .map(|o: &'s mut &'e mut dyn OptArg| -> &'s mut dyn OptArg { &mut **o })
}

/// Apply argument tokens to the declared options, collecting tokens no
/// option claimed into `ignored`. Returns false once a value fails to
/// parse. Used directly by stages that forward unclaimed arguments to a
/// sub-tool.
pub fn parse_partial<'e>(
    positional: &mut [&'e mut dyn OptArg],
    keyword: &mut [&'e mut dyn OptArg],
    args: &[String],
    ignored: &mut Vec<String>,
) -> bool {
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            match lookup(positional, keyword, key) {
                Some(o) => {
                    if !o.parse_arg(value) {
                        return false;
                    }
                }
                None => ignored.push(arg.clone()),
            }
            continue;
        }

        // A bare token naming a boolean option turns it on.
        if let Some(o) = lookup(positional, keyword, arg) {
            if o.is_flag() {
                o.parse_arg("true");
                continue;
            }
        }

        // Everything else fills positional options in declaration order.
        match positional.iter_mut().find(|o| !o.is_set()) {
            Some(o) => {
                if !o.parse_arg(arg) {
                    return false;
                }
            }
            None => ignored.push(arg.clone()),
        }
    }

    true
}

/// Apply argument tokens to the declared options. Unknown tokens are
/// reported and fail the parse, as do malformed values.
pub fn parse<'e>(
    positional: &mut [&'e mut dyn OptArg],
    keyword: &mut [&'e mut dyn OptArg],
    args: &[String],
) -> bool {
    let mut ignored = Vec::new();
    if !parse_partial(positional, keyword, args, &mut ignored) {
        return false;
    }
    for tok in &ignored {
        eprintln!("error: {tok}: unknown option");
    }
    ignored.is_empty()
}

/// Print the one-line usage summary for a stage on stderr. Required options
/// render bare, optional ones bracketed.
pub fn usage(program: &str, positional: &[&dyn OptArg], keyword: &[&dyn OptArg]) {
    let mut line = format!("usage: {program}");
    for o in positional.iter().chain(keyword.iter()) {
        let entry = format!("{}={}", o.key(), o.placeholder_text());
        if o.is_required() {
            line.push(' ');
            line.push_str(&entry);
        } else {
            line.push_str(&format!(" [{entry}]"));
        }
    }
    eprintln!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Complex;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn uint_si_suffixes() {
        assert_eq!(parse_uint_si("1500"), Ok(1500));
        assert_eq!(parse_uint_si("1.5k"), Ok(1500));
        assert_eq!(parse_uint_si("2.5M"), Ok(2_500_000));
        assert_eq!(parse_uint_si("1K"), Ok(1000));
        assert_eq!(parse_uint_si("3G"), Ok(3_000_000_000));
        assert_eq!(parse_uint_si("1T"), Ok(1_000_000_000_000));
        assert_eq!(parse_uint_si("2P"), Ok(2_000_000_000_000_000));
        assert_eq!(parse_uint_si("4E"), Ok(4_000_000_000_000_000_000));
        assert_eq!(parse_uint_si("1.024k"), Ok(1024));
    }

    #[test]
    fn uint_bases() {
        assert_eq!(parse_uint_si("0"), Ok(0));
        assert_eq!(parse_uint_si("0x10"), Ok(16));
        assert_eq!(parse_uint_si("0X1f"), Ok(31));
        assert_eq!(parse_uint_si("0o17"), Ok(15));
        assert_eq!(parse_uint_si("017"), Ok(15));
        assert_eq!(parse_uint_si("+42"), Ok(42));
    }

    #[test]
    fn uint_rejects() {
        assert_eq!(parse_uint_si("-1"), Err(ParseError::Uint));
        // No fixed point or units on non-decimal bases.
        assert_eq!(parse_uint_si("0x10k"), Err(ParseError::Uint));
        assert_eq!(parse_uint_si("017k"), Err(ParseError::Uint));
        // Fractional digits must not exceed the suffix magnitude.
        assert_eq!(parse_uint_si("1.0001k"), Err(ParseError::Uint));
        // A fixed point needs a suffix.
        assert_eq!(parse_uint_si("1.5"), Err(ParseError::Uint));
        assert_eq!(parse_uint_si("1.k"), Err(ParseError::Point));
        assert_eq!(
            parse_uint_si("1.5q"),
            Err(ParseError::Unit("q".to_string()))
        );
        assert_eq!(
            parse_uint_si("1kHz"),
            Err(ParseError::Unit("kHz".to_string()))
        );
        assert_eq!(parse_uint_si(""), Err(ParseError::Uint));
        assert_eq!(parse_uint_si("abc"), Err(ParseError::Uint));
        // 2^64 overflows.
        assert_eq!(parse_uint_si("18446744073709551616"), Err(ParseError::Range));
        assert_eq!(parse_uint_si("20E"), Err(ParseError::Range));
    }

    #[test]
    fn int_signs() {
        assert_eq!(parse_int_si("-1500"), Ok(-1500));
        assert_eq!(parse_int_si("-1.5k"), Ok(-1500));
        assert_eq!(parse_int_si("1.5k"), Ok(1500));
        assert_eq!(parse_int_si("-0x10"), Ok(-16));
        assert_eq!(parse_int_si("-9223372036854775808"), Ok(i64::MIN));
        assert_eq!(parse_int_si("9223372036854775808"), Err(ParseError::Range));
        assert_eq!(parse_int_si("x"), Err(ParseError::Int));
    }

    #[test]
    fn float_si_suffixes() {
        assert_eq!(parse_float_si("1.5"), Ok(1.5));
        assert_eq!(parse_float_si("1.5k"), Ok(1500.0));
        assert_eq!(parse_float_si("2M"), Ok(2e6));
        assert_eq!(parse_float_si("3n"), Ok(3.0 * 1e-9));
        assert_eq!(parse_float_si("250m"), Ok(250.0 * 1e-3));
        assert_eq!(parse_float_si("1u"), Ok(1.0 * 1e-6));
        assert_eq!(parse_float_si("-2.5G"), Ok(-2.5e9));
        assert_eq!(parse_float_si("1e3"), Ok(1000.0));
        assert_eq!(parse_float_si("1e3k"), Ok(1e6));
        assert_eq!(
            parse_float_si("1.5kHz"),
            Err(ParseError::Unit("kHz".to_string()))
        );
        assert_eq!(parse_float_si("zzz"), Err(ParseError::Float));
    }

    #[test]
    fn complex_forms() {
        let c = |re: f32, im: f32| Complex::new(re, im);
        assert_eq!(Complex::parse("3+j4"), Ok(c(3.0, 4.0)));
        assert_eq!(Complex::parse("3-j4"), Ok(c(3.0, -4.0)));
        assert_eq!(Complex::parse("-j"), Ok(c(0.0, -1.0)));
        assert_eq!(Complex::parse("j"), Ok(c(0.0, 1.0)));
        assert_eq!(Complex::parse("5"), Ok(c(5.0, 0.0)));
        assert_eq!(Complex::parse("j2"), Ok(c(0.0, 2.0)));
        assert_eq!(Complex::parse("1.5+I2.5"), Ok(c(1.5, 2.5)));
        assert_eq!(Complex::parse("-5-J2"), Ok(c(-5.0, -2.0)));
        assert_eq!(Complex::parse("1k+j2k"), Ok(c(1000.0, 2000.0)));
        assert_eq!(Complex::parse("1 +j2"), Err(ParseError::Complex));
        assert_eq!(Complex::parse("1+j-2"), Err(ParseError::Complex));
    }

    #[test]
    fn bool_values() {
        assert_eq!(bool::parse("true"), Ok(true));
        assert_eq!(bool::parse("1"), Ok(true));
        assert_eq!(bool::parse("false"), Ok(false));
        assert_eq!(bool::parse("0"), Ok(false));
        assert_eq!(bool::parse("yes"), Err(ParseError::Bool));
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Color {
        #[default]
        Red,
        Green,
        Blue,
    }

    crate::enum_option!(Color {
        "red" => Color::Red,
        "green" => Color::Green,
        "blue" => Color::Blue,
    });

    #[test]
    fn enum_values() {
        assert_eq!(Color::parse("green"), Ok(Color::Green));
        assert_eq!(Color::parse("GREEN"), Ok(Color::Green));
        assert_eq!(Color::parse("Blue"), Ok(Color::Blue));
        assert_eq!(
            Color::parse("mauve"),
            Err(ParseError::Enum("mauve".to_string()))
        );
        assert_eq!(Color::placeholder(), "(red|green|blue)");
    }

    #[test]
    fn vectors() {
        assert_eq!(Vec::<u64>::parse("{1, 2, 3}"), Ok(vec![1, 2, 3]));
        assert_eq!(Vec::<u64>::parse("{1,2,3,}"), Ok(vec![1, 2, 3]));
        assert_eq!(Vec::<u64>::parse("7"), Ok(vec![7]));
        assert_eq!(Vec::<u64>::parse("{}"), Ok(vec![]));
        assert_eq!(Vec::<u64>::parse("{1,,3}"), Ok(vec![1, 0, 3]));
        assert_eq!(Vec::<u64>::parse("{1k, 2k}"), Ok(vec![1000, 2000]));
        assert!(Vec::<u64>::parse("{1,x}").is_err());
    }

    #[test]
    fn sets_collapse_duplicates() {
        let got = BTreeSet::<u64>::parse("{3, 1, 3, 2}").unwrap();
        assert_eq!(got.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        let single = BTreeSet::<u64>::parse("9").unwrap();
        assert_eq!(single.into_iter().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn fixed_arrays() {
        assert_eq!(<[u64; 3]>::parse("{1,2,3}"), Ok([1, 2, 3]));
        assert_eq!(<[u64; 3]>::parse("{1,,3}"), Ok([1, 0, 3]));
        assert_eq!(<[u64; 3]>::parse("{1,2}"), Err(ParseError::Arity(3)));
        assert_eq!(<[u64; 3]>::parse("{1,2,3,4}"), Err(ParseError::Arity(3)));
        assert_eq!(<[u64; 3]>::parse("1,2,3"), Err(ParseError::Braces));
        assert_eq!(<[u64; 3]>::placeholder(), "{3xUINT}");
    }

    #[test]
    fn keyword_and_positional_matching() {
        let mut freq = Opt::<f32>::new("freq", 0.0);
        let mut unit = Opt::<Color>::new("unit", Color::Red);
        let mut rate = Opt::<u64>::new("sample_rate", 0);

        assert!(parse(
            &mut [&mut freq, &mut unit],
            &mut [&mut rate],
            &args(&["sample_rate=1M", "100k", "blue"]),
        ));
        assert_eq!(*rate.get(), 1_000_000);
        assert_eq!(*freq.get(), 100_000.0);
        assert_eq!(*unit.get(), Color::Blue);
        assert!(freq.is_set() && unit.is_set() && rate.is_set());
    }

    #[test]
    fn positional_by_key_skips_slot() {
        let mut a = Opt::<u64>::new("a", 0);
        let mut b = Opt::<u64>::new("b", 0);

        // First bare token fills the first *unset* positional.
        assert!(parse(&mut [&mut a, &mut b], &mut [], &args(&["a=1", "2"])));
        assert_eq!(*a.get(), 1);
        assert_eq!(*b.get(), 2);
    }

    #[test]
    fn bare_bool_key() {
        let mut verbose = Opt::<bool>::new("pass", false);
        assert!(parse(&mut [], &mut [&mut verbose], &args(&["pass"])));
        assert!(*verbose.get());
    }

    #[test]
    fn empty_value_leaves_unset() {
        let mut id = Opt::<u64>::new("stream", 42);
        assert!(parse(&mut [&mut id], &mut [], &args(&["stream="])));
        assert!(!id.is_set());
        assert_eq!(*id.get(), 42);
    }

    #[test]
    fn unknown_tokens_fail_strict_parse() {
        let mut id = Opt::<u64>::new("stream", 0);
        assert!(!parse(&mut [], &mut [&mut id], &args(&["bogus=1"])));
        assert!(!parse(&mut [], &mut [&mut id], &args(&["floating"])));
    }

    #[test]
    fn partial_collects_unknown_tokens() {
        let mut id = Opt::<u64>::new("stream", 0);
        let mut ignored = Vec::new();
        assert!(parse_partial(
            &mut [],
            &mut [&mut id],
            &args(&["stream=5", "bogus=1", "extra"]),
            &mut ignored,
        ));
        assert_eq!(*id.get(), 5);
        assert_eq!(ignored, vec!["bogus=1".to_string(), "extra".to_string()]);
    }

    #[test]
    fn malformed_value_fails() {
        let mut id = Opt::<u64>::new("stream", 0);
        assert!(!parse(&mut [&mut id], &mut [], &args(&["stream=x"])));
    }

    #[test]
    fn placeholders() {
        let id = Opt::<u64>::new("stream", 0).placeholder("ID");
        assert_eq!(OptArg::placeholder_text(&id), "ID");
        let plain = Opt::<u64>::new("count", 0);
        assert_eq!(OptArg::placeholder_text(&plain), "UINT");
        assert_eq!(Vec::<f32>::placeholder(), "{REAL, ... }");
    }
}
