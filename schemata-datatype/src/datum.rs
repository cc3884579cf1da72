//! Column values and the conversion rules the store applies when a
//! column is retyped.
//!
//! Two layers decide whether a retype succeeds:
//! 1. `castable()` tells whether the store knows how to convert between
//!    two types at all. This is independent of any data.
//! 2. `cast()` converts a single value and may still fail, e.g. text
//!    that is not a number, or a number exceeding the declared precision.
use crate::error::CastError;
use crate::options::{OPT_LENGTH, OPT_PRECISION, OPT_SCALE, TypeOptions};
use crate::{TypeCategory, TypeKind};
use std::fmt;

/// Single value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Numeric),
    Text(String),
    Interval(Interval),
}

impl Datum {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    #[inline]
    pub fn text(s: impl Into<String>) -> Self {
        Datum::Text(s.into())
    }
}

impl From<i64> for Datum {
    #[inline]
    fn from(src: i64) -> Self {
        Datum::Int(src)
    }
}

impl From<&str> for Datum {
    #[inline]
    fn from(src: &str) -> Self {
        Datum::Text(src.to_string())
    }
}

impl From<bool> for Datum {
    #[inline]
    fn from(src: bool) -> Self {
        Datum::Bool(src)
    }
}

impl fmt::Display for Datum {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::Float(v) => write!(f, "{}", v),
            Datum::Numeric(n) => write!(f, "{}", n),
            Datum::Text(s) => f.write_str(s),
            Datum::Interval(iv) => write!(f, "{}", iv),
        }
    }
}

/// Exact decimal number stored as an unscaled integer and a scale.
/// Supports up to 38 significant digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Numeric {
    unscaled: i128,
    scale: u32,
}

const MAX_DIGITS: usize = 38;

#[inline]
fn pow10(n: u32) -> Option<i128> {
    10i128.checked_pow(n)
}

impl Numeric {
    #[inline]
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Numeric { unscaled, scale }
    }

    #[inline]
    pub fn from_i64(v: i64) -> Self {
        Numeric::new(v as i128, 0)
    }

    #[inline]
    pub fn from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        Numeric::parse(&v.to_string())
    }

    #[inline]
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Parse plain decimal notation, e.g. `-12.340`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (neg, digits) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return None;
        }
        // trailing fractional zeros beyond the representable width carry no value.
        let frac_part = if int_part.len() + frac_part.len() > MAX_DIGITS {
            frac_part.trim_end_matches('0')
        } else {
            frac_part
        };
        let mut unscaled: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            unscaled = unscaled
                .checked_mul(10)?
                .checked_add((b - b'0') as i128)?;
        }
        if neg {
            unscaled = -unscaled;
        }
        Some(Numeric::new(unscaled, frac_part.len() as u32))
    }

    /// Change the scale, rounding half away from zero.
    /// Returns None if the result does not fit.
    pub fn rescale(self, scale: u32) -> Option<Self> {
        if scale >= self.scale {
            let factor = pow10(scale - self.scale)?;
            let unscaled = self.unscaled.checked_mul(factor)?;
            return Some(Numeric::new(unscaled, scale));
        }
        let divisor = match pow10(self.scale - scale) {
            Some(d) => d,
            // every i128 is below half of the divisor.
            None => return Some(Numeric::new(0, scale)),
        };
        let mut q = self.unscaled / divisor;
        let r = (self.unscaled % divisor).unsigned_abs();
        if r >= divisor.unsigned_abs() - r {
            q += self.unscaled.signum();
        }
        Some(Numeric::new(q, scale))
    }

    /// Same value with trailing fractional zeros removed, so that equal
    /// numbers compare and hash equal.
    #[inline]
    pub fn normalize(self) -> Self {
        let mut n = self;
        while n.scale > 0 && n.unscaled % 10 == 0 {
            n = Numeric::new(n.unscaled / 10, n.scale - 1);
        }
        n
    }

    /// Number of digits before the decimal point, zero for |v| < 1.
    #[inline]
    pub fn int_digits(&self) -> u32 {
        let int_part = match pow10(self.scale) {
            Some(d) => (self.unscaled / d).unsigned_abs(),
            None => 0,
        };
        if int_part == 0 {
            0
        } else {
            int_part.ilog10() + 1
        }
    }

    #[inline]
    pub fn to_i64(&self) -> Option<i64> {
        let rounded = self.rescale(0)?;
        i64::try_from(rounded.unscaled).ok()
    }

    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let digits = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// Time span split into months, days and microseconds, the same way
/// calendar arithmetic needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl Interval {
    #[inline]
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Interval {
            months,
            days,
            micros,
        }
    }

    /// Parse verbose interval input such as `1 year 2 mons 3 days 04:05:06`,
    /// optionally followed by `ago`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut iv = Interval::default();
        let mut tokens = s.split_whitespace().peekable();
        let mut seen = false;
        while let Some(token) = tokens.next() {
            if token.eq_ignore_ascii_case("ago") {
                if tokens.peek().is_some() || !seen {
                    return None;
                }
                iv = Interval::new(-iv.months, -iv.days, -iv.micros);
                break;
            }
            if token.contains(':') {
                iv.micros = iv.micros.checked_add(parse_clock(token)?)?;
                seen = true;
                continue;
            }
            let unit = tokens.next()?.to_ascii_lowercase();
            match unit.as_str() {
                "second" | "seconds" | "sec" | "secs" | "s" => {
                    let secs = token.parse::<f64>().ok().filter(|v| v.is_finite())?;
                    let micros = (secs * MICROS_PER_SECOND as f64).round() as i64;
                    iv.micros = iv.micros.checked_add(micros)?;
                }
                _ => {
                    let n = token.parse::<i64>().ok()?;
                    match unit.as_str() {
                        "year" | "years" | "yr" | "yrs" | "y" => {
                            iv.months = iv.months.checked_add(i32::try_from(n.checked_mul(12)?).ok()?)?
                        }
                        "month" | "months" | "mon" | "mons" => {
                            iv.months = iv.months.checked_add(i32::try_from(n).ok()?)?
                        }
                        "week" | "weeks" | "w" => {
                            iv.days = iv.days.checked_add(i32::try_from(n.checked_mul(7)?).ok()?)?
                        }
                        "day" | "days" | "d" => {
                            iv.days = iv.days.checked_add(i32::try_from(n).ok()?)?
                        }
                        "hour" | "hours" | "hr" | "hrs" | "h" => {
                            iv.micros = iv.micros.checked_add(n.checked_mul(MICROS_PER_HOUR)?)?
                        }
                        "minute" | "minutes" | "min" | "mins" | "m" => {
                            iv.micros = iv.micros.checked_add(n.checked_mul(MICROS_PER_MINUTE)?)?
                        }
                        _ => return None,
                    }
                }
            }
            seen = true;
        }
        if seen { Some(iv) } else { None }
    }

    /// Round the sub-second part to given fractional digits.
    #[inline]
    pub fn round_micros(self, precision: u32) -> Self {
        if precision >= 6 {
            return self;
        }
        let unit = 10i64.pow(6 - precision);
        let rem = self.micros % unit;
        let mut micros = self.micros - rem;
        if rem.abs() * 2 >= unit {
            micros += unit * self.micros.signum();
        }
        Interval { micros, ..self }
    }
}

#[inline]
fn parse_clock(token: &str) -> Option<i64> {
    let (neg, token) = match token.strip_prefix('-') {
        Some(t) => (true, t),
        None => (false, token),
    };
    let mut parts = token.split(':');
    let hours = parts.next()?.parse::<i64>().ok()?;
    let minutes = parts.next()?.parse::<i64>().ok()?;
    let seconds = match parts.next() {
        Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)?,
        None => 0.0,
    };
    if parts.next().is_some() || !(0..60).contains(&minutes) || seconds >= 60.0 {
        return None;
    }
    let micros = hours
        .checked_mul(MICROS_PER_HOUR)?
        .checked_add(minutes * MICROS_PER_MINUTE)?
        .checked_add((seconds * MICROS_PER_SECOND as f64).round() as i64)?;
    Some(if neg { -micros } else { micros })
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = vec![];
        let years = self.months / 12;
        let mons = self.months % 12;
        let plural = |n: i64, unit: &str, units: &str| {
            format!("{} {}", n, if n.abs() == 1 { unit } else { units })
        };
        if years != 0 {
            parts.push(plural(years as i64, "year", "years"));
        }
        if mons != 0 {
            parts.push(plural(mons as i64, "mon", "mons"));
        }
        if self.days != 0 {
            parts.push(plural(self.days as i64, "day", "days"));
        }
        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            let total = self.micros.unsigned_abs();
            let hours = total / MICROS_PER_HOUR as u64;
            let minutes = (total % MICROS_PER_HOUR as u64) / MICROS_PER_MINUTE as u64;
            let secs = (total % MICROS_PER_MINUTE as u64) / MICROS_PER_SECOND as u64;
            let frac = total % MICROS_PER_SECOND as u64;
            let mut clock = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, secs);
            if frac != 0 {
                let s = format!("{:06}", frac);
                clock.push('.');
                clock.push_str(s.trim_end_matches('0'));
            }
            parts.push(clock);
        }
        f.write_str(&parts.join(" "))
    }
}

/// Whether the store can convert values of `source` into `target` at all.
/// This is the authority on retyping, the cast graph only advertises.
#[inline]
pub fn castable(source: TypeKind, target: TypeKind) -> bool {
    use TypeCategory as C;
    if source == target {
        return true;
    }
    match (source.category(), target.category()) {
        (_, C::String) | (C::String, _) => true,
        (
            C::Integer | C::ExactNumeric | C::ApproxNumeric,
            C::Integer | C::ExactNumeric | C::ApproxNumeric,
        ) => true,
        // only the default integer width converts to and from boolean.
        (C::Integer, C::Boolean) => source == TypeKind::Integer,
        (C::Boolean, C::Integer) => target == TypeKind::Integer,
        _ => false,
    }
}

/// Convert a value of a column typed `source` into `target` under
/// the target's options.
pub fn cast(
    value: &Datum,
    source: TypeKind,
    target: TypeKind,
    options: &TypeOptions,
) -> Result<Datum, CastError> {
    if !castable(source, target) {
        return Err(CastError::Unsupported {
            from: source.name(),
            to: target.name(),
        });
    }
    if value.is_null() {
        return Ok(Datum::Null);
    }
    match target.category() {
        TypeCategory::Integer => to_integer(value, source, target).map(Datum::Int),
        TypeCategory::ExactNumeric => {
            to_numeric(value, source, target, options).map(Datum::Numeric)
        }
        TypeCategory::ApproxNumeric => {
            to_float(value, source, target, options).map(Datum::Float)
        }
        TypeCategory::Boolean => to_bool(value, source, target).map(Datum::Bool),
        TypeCategory::String => to_text(value, source, target, options).map(Datum::Text),
        TypeCategory::Interval => {
            to_interval(value, source, target, options).map(Datum::Interval)
        }
        TypeCategory::Email => to_email(value, source, target).map(Datum::Text),
    }
}

#[inline]
fn invalid(value: &Datum, source: TypeKind, target: TypeKind) -> CastError {
    CastError::InvalidValue {
        value: value.to_string(),
        from: source.name(),
        target: target.name(),
    }
}

#[inline]
fn out_of_range(value: &Datum, source: TypeKind, target: TypeKind) -> CastError {
    CastError::OutOfRange {
        value: value.to_string(),
        from: source.name(),
        target: target.name(),
    }
}

fn to_integer(value: &Datum, source: TypeKind, target: TypeKind) -> Result<i64, CastError> {
    let v = match value {
        Datum::Int(i) => *i,
        Datum::Bool(b) => *b as i64,
        Datum::Numeric(n) => n.to_i64().ok_or_else(|| out_of_range(value, source, target))?,
        Datum::Float(f) => {
            let r = f.round();
            if !r.is_finite() || r < i64::MIN as f64 || r >= i64::MAX as f64 {
                return Err(out_of_range(value, source, target));
            }
            r as i64
        }
        Datum::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(value, source, target))?,
        Datum::Null | Datum::Interval(_) => return Err(invalid(value, source, target)),
    };
    let (min, max) = match target {
        TypeKind::SmallInt => (i16::MIN as i64, i16::MAX as i64),
        TypeKind::Integer => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    };
    if v < min || v > max {
        return Err(out_of_range(value, source, target));
    }
    Ok(v)
}

fn to_numeric(
    value: &Datum,
    source: TypeKind,
    target: TypeKind,
    options: &TypeOptions,
) -> Result<Numeric, CastError> {
    let n = match value {
        Datum::Int(i) => Numeric::from_i64(*i),
        Datum::Numeric(n) => *n,
        Datum::Float(f) => Numeric::from_f64(*f).ok_or_else(|| invalid(value, source, target))?,
        Datum::Text(s) => Numeric::parse(s).ok_or_else(|| invalid(value, source, target))?,
        _ => return Err(invalid(value, source, target)),
    };
    let precision = match options.get_int(OPT_PRECISION) {
        None => return Ok(n),
        Some(p) => p as u32,
    };
    let scale = options.get_int(OPT_SCALE).unwrap_or(0) as u32;
    let n = n.rescale(scale).ok_or_else(|| out_of_range(value, source, target))?;
    if n.int_digits() > precision - scale {
        return Err(out_of_range(value, source, target));
    }
    Ok(n)
}

fn to_float(
    value: &Datum,
    source: TypeKind,
    target: TypeKind,
    options: &TypeOptions,
) -> Result<f64, CastError> {
    let v = match value {
        Datum::Int(i) => *i as f64,
        Datum::Float(f) => *f,
        Datum::Numeric(n) => n.to_f64(),
        Datum::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(value, source, target))?,
        _ => return Err(invalid(value, source, target)),
    };
    let single = match target {
        TypeKind::Real => true,
        TypeKind::Float => options.get_int(OPT_PRECISION).is_some_and(|p| p <= 24),
        _ => false,
    };
    if single {
        let narrowed = v as f32;
        if v.is_finite() && narrowed.is_infinite() {
            return Err(out_of_range(value, source, target));
        }
        return Ok(narrowed as f64);
    }
    Ok(v)
}

fn to_bool(value: &Datum, source: TypeKind, target: TypeKind) -> Result<bool, CastError> {
    match value {
        Datum::Bool(b) => Ok(*b),
        Datum::Int(i) => Ok(*i != 0),
        Datum::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
            "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(value, source, target)),
        },
        _ => Err(invalid(value, source, target)),
    }
}

fn to_text(
    value: &Datum,
    source: TypeKind,
    target: TypeKind,
    options: &TypeOptions,
) -> Result<String, CastError> {
    let mut s = value.to_string();
    if source == TypeKind::Char {
        s.truncate(s.trim_end_matches(' ').len());
    }
    let length = match (target, options.get_int(OPT_LENGTH)) {
        (TypeKind::Char, None) => Some(1),
        (_, length) => length,
    };
    let length = match length {
        None => return Ok(s),
        Some(l) => l as usize,
    };
    let chars = s.chars().count();
    if chars > length {
        // excess characters are accepted only when they are all spaces.
        let cut = s
            .char_indices()
            .nth(length)
            .map(|(idx, _)| idx)
            .unwrap_or(s.len());
        if s[cut..].chars().any(|c| c != ' ') {
            return Err(out_of_range(value, source, target));
        }
        s.truncate(cut);
    } else if target == TypeKind::Char {
        s.extend(std::iter::repeat_n(' ', length - chars));
    }
    Ok(s)
}

fn to_interval(
    value: &Datum,
    source: TypeKind,
    target: TypeKind,
    options: &TypeOptions,
) -> Result<Interval, CastError> {
    let iv = match value {
        Datum::Interval(iv) => *iv,
        Datum::Text(s) => Interval::parse(s).ok_or_else(|| invalid(value, source, target))?,
        _ => return Err(invalid(value, source, target)),
    };
    Ok(match options.get_int(OPT_PRECISION) {
        Some(p) => iv.round_micros(p as u32),
        None => iv,
    })
}

fn to_email(value: &Datum, source: TypeKind, target: TypeKind) -> Result<String, CastError> {
    let s = match value {
        Datum::Text(s) => s.trim(),
        _ => return Err(invalid(value, source, target)),
    };
    if is_email(s) {
        Ok(s.to_string())
    } else {
        Err(invalid(value, source, target))
    }
}

#[inline]
fn is_email(s: &str) -> bool {
    let (local, domain) = match s.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(|c| c.is_whitespace())
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
