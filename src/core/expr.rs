/// Successor expansion: placeholder substitution and arithmetic folding.
use serde::{Deserialize, Serialize};

/// How arithmetic inside an expanded successor is reduced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionMode {
    /// One left-to-right pass folding `<number> <op> <number>` pairs for
    /// `+`, `-` and `*`. Chains such as `1*2*3` only fold their first pair.
    #[default]
    Legacy,
    /// Every argument of a `Letter(...)` list is evaluated as a full
    /// expression (`+ - * /`, unary sign, parentheses).
    Full,
}

/// Expand a successor pattern against the parameters captured from its
/// predecessor occurrence.
pub fn expand(template: &str, params: &[f64], mode: ExpressionMode) -> String {
    let substituted = substitute(template, params);
    match mode {
        ExpressionMode::Legacy => fold_arithmetic(&substituted),
        ExpressionMode::Full => evaluate_parameter_lists(&substituted),
    }
}

/// Replace every `${i}` with `params[i]`. Placeholders past the end of
/// `params` are left as written.
pub fn substitute(template: &str, params: &[f64]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();

        if digits > 0 && after.as_bytes().get(digits) == Some(&b'}') {
            let placeholder = &rest[start..start + digits + 3];
            match after[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|idx| params.get(idx))
            {
                Some(value) => out.push_str(&format_number(*value)),
                None => out.push_str(placeholder),
            }
            rest = &rest[start + digits + 3..];
        } else {
            out.push_str("${");
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

/// Single-pass fold of `<number> <op> <number>` where numbers are
/// `\d+(\.\d+)?` and `op` is one of `+ - *`.
///
/// Matches do not overlap and the folded result is never re-scanned, so
/// only adjacent literal pairs are combined.
pub fn fold_arithmetic(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < text.len() {
        match match_binary(text, i) {
            Some((end, value)) => {
                out.push_str(&text[copied..i]);
                out.push_str(&format_number(value));
                i = end;
                copied = end;
            }
            None => i += 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

fn match_binary(text: &str, start: usize) -> Option<(usize, f64)> {
    let bytes = text.as_bytes();
    let lhs_end = scan_decimal(bytes, start)?;
    let op_pos = skip_whitespace(text, lhs_end);
    let op = *bytes.get(op_pos)?;
    if !matches!(op, b'+' | b'-' | b'*') {
        return None;
    }
    let rhs_start = skip_whitespace(text, op_pos + 1);
    let rhs_end = scan_decimal(bytes, rhs_start)?;

    let lhs: f64 = text[start..lhs_end].parse().ok()?;
    let rhs: f64 = text[rhs_start..rhs_end].parse().ok()?;
    let value = match op {
        b'+' => lhs + rhs,
        b'-' => lhs - rhs,
        _ => lhs * rhs,
    };
    Some((rhs_end, value))
}

/// End offset of a `\d+(\.\d+)?` run starting at `start`.
fn scan_decimal(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == start {
        return None;
    }
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()) {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    Some(end)
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(offset, _)| from + offset)
        .unwrap_or(text.len())
}

/// Evaluate each comma-separated argument of every `Letter(...)` list.
/// Arguments that are not valid expressions are kept verbatim.
pub fn evaluate_parameter_lists(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'(' && i > 0 && bytes[i - 1].is_ascii_alphabetic() {
            if let Some(close) = matching_paren(bytes, i) {
                out.push_str(&text[copied..=i]);
                let args: Vec<String> = split_top_level(&text[i + 1..close])
                    .into_iter()
                    .map(|arg| match evaluate(arg) {
                        Some(value) => format_number(value),
                        None => arg.to_string(),
                    })
                    .collect();
                out.push_str(&args.join(","));
                out.push(')');
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, b) in bytes[open..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in list.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// Nesting limit for parenthesised or signed sub-expressions.
const MAX_DEPTH: usize = 64;

/// Evaluate an arithmetic expression. Returns `None` unless the whole input
/// is a well-formed expression.
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('+' | '-') unary | primary
/// primary := number | '(' expr ')'
/// ```
pub fn evaluate(expr: &str) -> Option<f64> {
    let mut parser = ExprParser {
        src: expr.as_bytes(),
        pos: 0,
    };
    let value = parser.expr(0)?;
    parser.skip_ws();
    (parser.pos == parser.src.len()).then_some(value)
}

struct ExprParser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expr(&mut self, depth: usize) -> Option<f64> {
        let mut value = self.term(depth)?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.term(depth)?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.term(depth)?;
                }
                _ => return Some(value),
            }
        }
    }

    fn term(&mut self, depth: usize) -> Option<f64> {
        let mut value = self.unary(depth)?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.unary(depth)?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    value /= self.unary(depth)?;
                }
                _ => return Some(value),
            }
        }
    }

    fn unary(&mut self, depth: usize) -> Option<f64> {
        if depth > MAX_DEPTH {
            return None;
        }
        self.skip_ws();
        match self.peek()? {
            b'-' => {
                self.pos += 1;
                Some(-self.unary(depth + 1)?)
            }
            b'+' => {
                self.pos += 1;
                self.unary(depth + 1)
            }
            _ => self.primary(depth),
        }
    }

    fn primary(&mut self, depth: usize) -> Option<f64> {
        self.skip_ws();
        if self.peek()? == b'(' {
            self.pos += 1;
            let value = self.expr(depth + 1)?;
            self.skip_ws();
            if self.peek()? != b')' {
                return None;
            }
            self.pos += 1;
            return Some(value);
        }
        self.number()
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut mantissa_digits = 0;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            mantissa_digits += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
                mantissa_digits += 1;
            }
        }
        if mantissa_digits == 0 {
            self.pos = start;
            return None;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

/// Format a number the way JavaScript's `Number#toString` does, so
/// expanded strings match those produced by existing grammar templates.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", value);
    }

    let exponential = format!("{:e}", value);
    match exponential.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponential,
    }
}
