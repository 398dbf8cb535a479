// printf-style templates over a typed argument list.
//
// Directives: %[flags][width][.precision][length]conversion
//   flags       - + space # 0
//   width/prec  decimal or '*' (taken from the next argument)
//   length      hh h l ll j z t L (sized for 32-bit int/long targets)
//   conversion  d i u o x X c s p f F e E g G a A %
//
// Nothing here can fail a log call. Unknown conversions are copied
// through, missing arguments render as nothing, extra ones are ignored,
// and mismatched kinds are coerced the way a C cast would. Field width
// and precision are capped at MAX_FIELD so rendering cost stays bounded.
//
// expected_args is const so printf! can reject a wrong argument count
// at compile time.

use core::fmt::{self, Write};

use super::format::FormatRequest;

pub const MAX_FIELD: usize = 512;

const SPACES: &str = "                                ";
const ZEROS: &str = "00000000000000000000000000000000";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Char(char),
    Str(&'a str),
    Ptr(usize),
    Float(f64),
}

impl Arg<'_> {
    fn as_i64(self) -> i64 {
        match self {
            Arg::Int(v) => v,
            Arg::Uint(v) => v as i64,
            Arg::Char(c) => c as i64,
            Arg::Ptr(p) => p as i64,
            Arg::Float(f) => f as i64,
            Arg::Str(_) => 0,
        }
    }

    fn as_u64(self) -> u64 {
        match self {
            Arg::Int(v) => v as u64,
            Arg::Uint(v) => v,
            Arg::Char(c) => c as u64,
            Arg::Ptr(p) => p as u64,
            Arg::Float(f) => f as u64,
            Arg::Str(_) => 0,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Arg::Float(f) => f,
            Arg::Int(v) => v as f64,
            Arg::Uint(v) => v as f64,
            _ => 0.0,
        }
    }

    fn as_char(self) -> Option<char> {
        match self {
            Arg::Char(c) => Some(c),
            Arg::Str(_) | Arg::Float(_) => None,
            // C passes %c through unsigned char
            other => Some(char::from(other.as_u64() as u8)),
        }
    }
}

macro_rules! arg_from {
    ($variant:ident as $wide:ty: $($t:ty),+) => {
        $(
            impl From<$t> for Arg<'_> {
                #[inline]
                fn from(v: $t) -> Self {
                    Arg::$variant(v as $wide)
                }
            }
        )+
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(Uint as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f32, f64);

impl From<bool> for Arg<'_> {
    fn from(v: bool) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<char> for Arg<'_> {
    fn from(c: char) -> Self {
        Arg::Char(c)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(p: *mut T) -> Self {
        Arg::Ptr(p as usize)
    }
}

/// A template plus its arguments. Build with `printf!` to get the
/// argument count checked at compile time.
#[derive(Debug, Clone, Copy)]
pub struct Printf<'a> {
    template: &'a str,
    args: &'a [Arg<'a>],
}

impl<'a> Printf<'a> {
    pub const fn new(template: &'a str, args: &'a [Arg<'a>]) -> Self {
        Self { template, args }
    }

    pub const fn template(&self) -> &'a str {
        self.template
    }
}

// ---- directive parsing (shared by expected_args and rendering) ----

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    Omitted,
    Star,
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Length {
    Char,
    Short,
    Int,
    Wide,
}

impl Length {
    fn signed(self, v: i64) -> i64 {
        match self {
            Length::Char => v as i8 as i64,
            Length::Short => v as i16 as i64,
            Length::Int => v as i32 as i64,
            Length::Wide => v,
        }
    }

    fn unsigned(self, v: u64) -> u64 {
        match self {
            Length::Char => v as u8 as u64,
            Length::Short => v as u16 as u64,
            Length::Int => v as u32 as u64,
            Length::Wide => v,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Directive {
    flags: Flags,
    width: Count,
    prec: Count,
    len: Length,
    // conversion byte, 0 when the template ends first or holds a NUL
    conv: u8,
    conv_at: usize,
    end: usize,
}

impl Directive {
    const fn takes_value(&self) -> bool {
        matches!(
            self.conv,
            b'd' | b'i' | b'u' | b'o' | b'x' | b'X' | b'c' | b's' | b'p'
        ) || self.is_float()
    }

    const fn is_float(&self) -> bool {
        matches!(
            self.conv,
            b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A'
        )
    }

    const fn arg_count(&self) -> usize {
        if !self.takes_value() {
            return 0;
        }
        let mut n = 1;
        if matches!(self.width, Count::Star) {
            n += 1;
        }
        if matches!(self.prec, Count::Star) {
            n += 1;
        }
        n
    }

    // where scanning resumes; a non-ASCII byte is left to the literal run
    const fn resume_at(&self) -> usize {
        if self.conv >= 0x80 { self.conv_at } else { self.end }
    }
}

const fn parse_number(t: &[u8], mut i: usize) -> (Option<usize>, usize) {
    let mut n: usize = 0;
    let mut seen = false;
    while i < t.len() && t[i].is_ascii_digit() {
        n = n.saturating_mul(10).saturating_add((t[i] - b'0') as usize);
        seen = true;
        i += 1;
    }
    (if seen { Some(n) } else { None }, i)
}

// `i` points just past the '%'
const fn parse_directive(t: &[u8], mut i: usize) -> Directive {
    let mut flags = Flags {
        left: false,
        plus: false,
        space: false,
        alt: false,
        zero: false,
    };
    while i < t.len() {
        match t[i] {
            b'-' => flags.left = true,
            b'+' => flags.plus = true,
            b' ' => flags.space = true,
            b'#' => flags.alt = true,
            b'0' => flags.zero = true,
            _ => break,
        }
        i += 1;
    }

    let width = if i < t.len() && t[i] == b'*' {
        i += 1;
        Count::Star
    } else {
        let (n, next) = parse_number(t, i);
        i = next;
        match n {
            Some(n) => Count::Fixed(n),
            None => Count::Omitted,
        }
    };

    let mut prec = Count::Omitted;
    if i < t.len() && t[i] == b'.' {
        i += 1;
        if i < t.len() && t[i] == b'*' {
            i += 1;
            prec = Count::Star;
        } else {
            let (n, next) = parse_number(t, i);
            i = next;
            prec = match n {
                Some(n) => Count::Fixed(n),
                None => Count::Fixed(0),
            };
        }
    }

    let mut len = Length::Int;
    if i < t.len() {
        match t[i] {
            b'h' => {
                i += 1;
                if i < t.len() && t[i] == b'h' {
                    i += 1;
                    len = Length::Char;
                } else {
                    len = Length::Short;
                }
            }
            b'l' => {
                i += 1;
                if i < t.len() && t[i] == b'l' {
                    i += 1;
                    len = Length::Wide;
                }
            }
            b'j' => {
                i += 1;
                len = Length::Wide;
            }
            b'z' | b't' | b'L' => i += 1,
            _ => {}
        }
    }

    let (conv, end) = if i < t.len() { (t[i], i + 1) } else { (0, i) };
    Directive {
        flags,
        width,
        prec,
        len,
        conv,
        conv_at: i,
        end,
    }
}

/// Number of arguments `template` consumes, counting `*` fields.
pub const fn expected_args(template: &str) -> usize {
    let t = template.as_bytes();
    let mut i = 0;
    let mut n = 0;
    while i < t.len() {
        if t[i] != b'%' {
            i += 1;
            continue;
        }
        let d = parse_directive(t, i + 1);
        if d.conv == 0 {
            break;
        }
        n += d.arg_count();
        i = d.resume_at();
    }
    n
}

// ---- rendering ----

struct Counter(usize);

impl Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

fn repeat<W: Write>(w: &mut W, fill: &str, mut n: usize) -> fmt::Result {
    while n > 0 {
        let k = n.min(fill.len());
        w.write_str(&fill[..k])?;
        n -= k;
    }
    Ok(())
}

// longest prefix of `s` that fits in `max` bytes without splitting a char
fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn digits(mut v: u64, radix: u64, upper: bool, out: &mut [u8; 24]) -> &str {
    let table: &[u8; 16] = if upper {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    let mut i = out.len();
    loop {
        i -= 1;
        out[i] = table[(v % radix) as usize];
        v /= radix;
        if v == 0 {
            break;
        }
    }
    core::str::from_utf8(&out[i..]).unwrap_or("")
}

#[derive(Debug, Clone, Copy)]
struct Field {
    flags: Flags,
    width: usize,
    prec: Option<usize>,
}

impl Field {
    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        }
    }

    fn integer<W: Write>(
        &self,
        w: &mut W,
        sign: &str,
        prefix: &str,
        digits: &str,
    ) -> fmt::Result {
        let (digits, zeros) = match self.prec {
            Some(0) if digits == "0" => ("", 0),
            Some(p) => (digits, p.saturating_sub(digits.len())),
            None => (digits, 0),
        };
        let body = sign.len() + prefix.len() + zeros + digits.len();
        let pad = self.width.saturating_sub(body);

        if self.flags.left {
            w.write_str(sign)?;
            w.write_str(prefix)?;
            repeat(w, ZEROS, zeros)?;
            w.write_str(digits)?;
            repeat(w, SPACES, pad)
        } else if self.flags.zero && self.prec.is_none() {
            w.write_str(sign)?;
            w.write_str(prefix)?;
            repeat(w, ZEROS, zeros + pad)?;
            w.write_str(digits)
        } else {
            repeat(w, SPACES, pad)?;
            w.write_str(sign)?;
            w.write_str(prefix)?;
            repeat(w, ZEROS, zeros)?;
            w.write_str(digits)
        }
    }

    fn signed<W: Write>(&self, w: &mut W, v: i64) -> fmt::Result {
        let mut buf = [0u8; 24];
        let d = digits(v.unsigned_abs(), 10, false, &mut buf);
        self.integer(w, self.sign(v < 0), "", d)
    }

    fn unsigned<W: Write>(&self, w: &mut W, v: u64, conv: u8) -> fmt::Result {
        let mut buf = [0u8; 24];
        match conv {
            b'o' => {
                let d = digits(v, 8, false, &mut buf);
                // "%.0o" of 0 prints no digits, so '#' still owes the leading zero
                let dropped = self.prec == Some(0) && v == 0;
                let shown = if dropped { "" } else { d };
                let zeros = self.prec.map_or(0, |p| p.saturating_sub(shown.len()));
                let prefix = if self.flags.alt && zeros == 0 && !shown.starts_with('0') {
                    "0"
                } else {
                    ""
                };
                self.integer(w, "", prefix, d)
            }
            b'x' | b'X' => {
                let upper = conv == b'X';
                let d = digits(v, 16, upper, &mut buf);
                let prefix = match (self.flags.alt && v != 0, upper) {
                    (true, false) => "0x",
                    (true, true) => "0X",
                    (false, _) => "",
                };
                self.integer(w, "", prefix, d)
            }
            b'p' => {
                let d = digits(v, 16, false, &mut buf);
                self.integer(w, "", "0x", d)
            }
            _ => {
                let d = digits(v, 10, false, &mut buf);
                self.integer(w, "", "", d)
            }
        }
    }

    fn text<W: Write>(&self, w: &mut W, s: &str) -> fmt::Result {
        let pad = self.width.saturating_sub(s.len());
        if self.flags.left {
            w.write_str(s)?;
            repeat(w, SPACES, pad)
        } else {
            repeat(w, SPACES, pad)?;
            w.write_str(s)
        }
    }

    fn float<W: Write>(&self, w: &mut W, v: f64, conv: u8) -> fmt::Result {
        let upper = conv.is_ascii_uppercase();
        let sign = self.sign(v.is_sign_negative() && !v.is_nan());
        let v = v.abs();

        if !v.is_finite() {
            let s = match (v.is_nan(), upper) {
                (true, false) => "nan",
                (true, true) => "NAN",
                (false, false) => "inf",
                (false, true) => "INF",
            };
            let pad = self.width.saturating_sub(sign.len() + s.len());
            if self.flags.left {
                w.write_str(sign)?;
                w.write_str(s)?;
                return repeat(w, SPACES, pad);
            }
            repeat(w, SPACES, pad)?;
            w.write_str(sign)?;
            return w.write_str(s);
        }

        // zero padding goes between "0x" and the digits
        let prefix = match conv {
            b'a' => "0x",
            b'A' => "0X",
            _ => "",
        };
        let alt = self.flags.alt;
        let mut count = Counter(0);
        let _ = float_body(&mut count, v, conv, self.prec, alt);
        let pad = self.width.saturating_sub(sign.len() + prefix.len() + count.0);

        if self.flags.left {
            w.write_str(sign)?;
            w.write_str(prefix)?;
            float_body(w, v, conv, self.prec, alt)?;
            repeat(w, SPACES, pad)
        } else if self.flags.zero {
            w.write_str(sign)?;
            w.write_str(prefix)?;
            repeat(w, ZEROS, pad)?;
            float_body(w, v, conv, self.prec, alt)
        } else {
            repeat(w, SPACES, pad)?;
            w.write_str(sign)?;
            w.write_str(prefix)?;
            float_body(w, v, conv, self.prec, alt)
        }
    }
}

// Digits of a finite, non-negative value; sign and "0x" are the caller's.
fn float_body<W: Write>(
    w: &mut W,
    v: f64,
    conv: u8,
    prec: Option<usize>,
    alt: bool,
) -> fmt::Result {
    let upper = conv.is_ascii_uppercase();
    match conv {
        b'e' | b'E' => exponent_form(w, v, prec.unwrap_or(6), upper, alt, false),
        b'g' | b'G' => {
            let p = prec.unwrap_or(6).max(1);
            let x = decimal_exponent(v, p - 1);
            if (-4..p as i32).contains(&x) {
                let frac = (p as i32 - 1 - x) as usize;
                if alt {
                    write!(w, "{v:.frac$}")?;
                    if frac == 0 {
                        w.write_char('.')?;
                    }
                    Ok(())
                } else {
                    write!(TrimZeros::new(w), "{v:.frac$}")
                }
            } else {
                exponent_form(w, v, p - 1, upper, alt, !alt)
            }
        }
        b'a' | b'A' => hex_form(w, v, prec, upper, alt),
        _ => {
            let prec = prec.unwrap_or(6);
            write!(w, "{v:.prec$}")?;
            if alt && prec == 0 {
                w.write_char('.')?;
            }
            Ok(())
        }
    }
}

// d.ddde+XX with at least two exponent digits
fn exponent_form<W: Write>(
    w: &mut W,
    v: f64,
    prec: usize,
    upper: bool,
    alt: bool,
    trim: bool,
) -> fmt::Result {
    let exp = if trim {
        mantissa(&mut TrimZeros::new(&mut *w), v, prec)?
    } else {
        mantissa(w, v, prec)?
    };
    if alt && prec == 0 {
        w.write_char('.')?;
    }
    w.write_char(if upper { 'E' } else { 'e' })?;
    w.write_char(if exp < 0 { '-' } else { '+' })?;
    let exp = exp.unsigned_abs();
    if exp < 10 {
        w.write_char('0')?;
    }
    write!(w, "{exp}")
}

// Writes the mantissa of `v` rounded to `prec` fraction digits and
// returns its decimal exponent.
fn mantissa<W: Write>(w: &mut W, v: f64, prec: usize) -> Result<i32, fmt::Error> {
    let mut split = SplitExp {
        out: w,
        in_exp: false,
        negative: false,
        exp: 0,
    };
    write!(split, "{v:.prec$e}")?;
    let exp = split.exp;
    Ok(if split.negative { -exp } else { exp })
}

fn decimal_exponent(v: f64, prec: usize) -> i32 {
    mantissa(&mut Counter(0), v, prec).unwrap_or(0)
}

// Splits Rust's "1.5e-7" at the 'e': the mantissa goes through, the
// exponent is parsed.
struct SplitExp<'a, W> {
    out: &'a mut W,
    in_exp: bool,
    negative: bool,
    exp: i32,
}

impl<W: Write> Write for SplitExp<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let rest = if self.in_exp {
            s
        } else if let Some(at) = s.find('e') {
            self.in_exp = true;
            self.out.write_str(&s[..at])?;
            &s[at + 1..]
        } else {
            return self.out.write_str(s);
        };
        for b in rest.bytes() {
            match b {
                b'-' => self.negative = true,
                b'0'..=b'9' => {
                    self.exp = self.exp.saturating_mul(10).saturating_add(i32::from(b - b'0'))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// Drops trailing fraction zeros, and the '.' if nothing follows it.
// Zeros are held back until a non-zero digit proves they are not trailing.
struct TrimZeros<'a, W> {
    out: &'a mut W,
    in_frac: bool,
    dot: bool,
    zeros: usize,
}

impl<'a, W: Write> TrimZeros<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self {
            out,
            in_frac: false,
            dot: false,
            zeros: 0,
        }
    }
}

impl<W: Write> Write for TrimZeros<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if !self.in_frac {
                if c == '.' {
                    self.in_frac = true;
                    self.dot = true;
                } else {
                    self.out.write_char(c)?;
                }
            } else if c == '0' {
                self.zeros += 1;
            } else {
                if self.dot {
                    self.out.write_char('.')?;
                    self.dot = false;
                }
                repeat(&mut *self.out, ZEROS, self.zeros)?;
                self.zeros = 0;
                self.out.write_char(c)?;
            }
        }
        Ok(())
    }
}

const FRAC_BITS: u32 = 52;
const FRAC_DIGITS: usize = 13;

// h.hhhp+d, the "0x" is written by the caller
fn hex_form<W: Write>(
    w: &mut W,
    v: f64,
    prec: Option<usize>,
    upper: bool,
    alt: bool,
) -> fmt::Result {
    let bits = v.to_bits();
    let biased = ((bits >> FRAC_BITS) & 0x7ff) as i32;
    let frac_mask = (1u64 << FRAC_BITS) - 1;
    let (lead, exp) = match (biased, bits & frac_mask) {
        (0, 0) => (0u64, 0),
        (0, _) => (0, -1022),
        _ => (1, biased - 1023),
    };
    let mut frac = bits & frac_mask;
    let mut lead = lead;
    let mut ndig = FRAC_DIGITS;
    let mut extra = 0;

    match prec {
        Some(p) if p < FRAC_DIGITS => {
            // round half to even at the last kept nibble
            let shift = (FRAC_DIGITS - p) as u32 * 4;
            let full = (lead << FRAC_BITS) | frac;
            let rem = full & ((1u64 << shift) - 1);
            let half = 1u64 << (shift - 1);
            let mut q = full >> shift;
            if rem > half || (rem == half && q & 1 == 1) {
                q += 1;
            }
            let kept = p as u32 * 4;
            lead = q >> kept;
            frac = q & ((1u64 << kept) - 1);
            ndig = p;
        }
        Some(p) => extra = p - FRAC_DIGITS,
        None => {
            while ndig > 0 && frac & 0xf == 0 {
                frac >>= 4;
                ndig -= 1;
            }
        }
    }

    let table: &[u8; 16] = if upper {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    write!(w, "{lead:x}")?;
    if ndig > 0 || extra > 0 || alt {
        w.write_char('.')?;
    }
    for i in (0..ndig).rev() {
        w.write_char(char::from(table[((frac >> (i * 4)) & 0xf) as usize]))?;
    }
    repeat(w, ZEROS, extra)?;
    w.write_char(if upper { 'P' } else { 'p' })?;
    write!(w, "{exp:+}")
}

fn clamp_field(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX).min(MAX_FIELD)
}

fn render_directive<'a, W, I>(w: &mut W, d: &Directive, args: &mut I) -> fmt::Result
where
    W: Write,
    I: Iterator<Item = Arg<'a>>,
{
    let mut flags = d.flags;
    let width = match d.width {
        Count::Fixed(n) => n.min(MAX_FIELD),
        Count::Star => {
            let v = args.next().map_or(0, |a| a.as_i64() as i32 as i64);
            if v < 0 {
                flags.left = true;
            }
            clamp_field(v.unsigned_abs())
        }
        Count::Omitted => 0,
    };
    let prec = match d.prec {
        Count::Fixed(n) => Some(n.min(MAX_FIELD)),
        Count::Star => match args.next().map(|a| a.as_i64() as i32 as i64) {
            Some(v) if v >= 0 => Some(clamp_field(v as u64)),
            _ => None,
        },
        Count::Omitted => None,
    };

    let Some(arg) = args.next() else {
        return Ok(());
    };
    let field = Field { flags, width, prec };

    match d.conv {
        b'd' | b'i' => field.signed(w, d.len.signed(arg.as_i64())),
        b'u' | b'o' | b'x' | b'X' => field.unsigned(w, d.len.unsigned(arg.as_u64()), d.conv),
        b'p' => field.unsigned(w, arg.as_u64(), b'p'),
        b'c' => match arg.as_char() {
            Some(c) => {
                let mut utf8 = [0u8; 4];
                field.text(w, c.encode_utf8(&mut utf8))
            }
            None => Ok(()),
        },
        b's' => match arg {
            Arg::Str(s) => field.text(w, prec.map_or(s, |p| clip(s, p))),
            _ => Ok(()),
        },
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A' => {
            field.float(w, arg.as_f64(), d.conv)
        }
        _ => Ok(()),
    }
}

impl FormatRequest for Printf<'_> {
    fn render<W: Write>(&self, w: &mut W) -> fmt::Result {
        let t = self.template.as_bytes();
        let mut args = self.args.iter().copied();
        let mut lit = 0;
        let mut i = 0;

        while i < t.len() {
            if t[i] != b'%' {
                i += 1;
                continue;
            }
            w.write_str(&self.template[lit..i])?;

            let d = parse_directive(t, i + 1);
            let mut next = d.resume_at();
            match d.conv {
                // cut-off, NUL or non-ASCII directive: copy it through untouched
                0 => {
                    w.write_str(&self.template[i..])?;
                    next = t.len();
                }
                c if c >= 0x80 => w.write_str(&self.template[i..next])?,
                b'%' => w.write_char('%')?,
                _ if d.takes_value() => render_directive(w, &d, &mut args)?,
                _ => w.write_str(&self.template[i..next])?,
            }
            lit = next;
            i = next;
        }
        w.write_str(&self.template[lit..])
    }
}
