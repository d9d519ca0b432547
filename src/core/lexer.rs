/// Tokenizer for rewrite states and generated output.
use crate::schema::symbol::Symbol;

/// A slice of a rewrite state, as seen by one rewrite pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'a> {
    /// Run of characters with no production; copied through.
    Literal(&'a str),
    /// A rule-bearing character without a parameter list.
    Bare(char),
    /// A rule-bearing character followed by `(`, spanning up to the first `)`.
    Module(Module<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Module<'a> {
    /// The occurrence exactly as written, for verbatim copies.
    pub raw: &'a str,
    /// Symbol and parameters, when the occurrence parses.
    pub parsed: Option<(char, Vec<f64>)>,
}

/// Split `input` into segments. Only characters for which `has_rules`
/// holds start a `Bare` or `Module` segment.
///
/// A parameter list ends at the first `)` after its `(`; nesting is not
/// tracked. A `(` with no `)` anywhere after it leaves the symbol bare.
pub(crate) fn scan<F>(input: &str, has_rules: F) -> Vec<Segment<'_>>
where
    F: Fn(char) -> bool,
{
    let mut segments = Vec::new();
    let mut literal_start: Option<usize> = None;
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        let next = pos + c.len_utf8();

        if !has_rules(c) {
            literal_start.get_or_insert(pos);
            pos = next;
            continue;
        }

        if let Some(start) = literal_start.take() {
            segments.push(Segment::Literal(&input[start..pos]));
        }

        if input[next..].starts_with('(') {
            if let Some(offset) = input[next..].find(')') {
                let end = next + offset + 1;
                let raw = &input[pos..end];
                segments.push(Segment::Module(Module {
                    raw,
                    parsed: parse_parameters(raw),
                }));
                pos = end;
                continue;
            }
        }

        segments.push(Segment::Bare(c));
        pos = next;
    }

    if let Some(start) = literal_start {
        segments.push(Segment::Literal(&input[start..]));
    }

    segments
}

/// Extract `(letter, params)` from an occurrence like `A(1, 0.5)`.
///
/// Matches the first ASCII letter directly followed by `(` and a non-empty
/// argument list closed by `)`. Arguments are read with [`parse_float`].
pub fn parse_parameters(occurrence: &str) -> Option<(char, Vec<f64>)> {
    let bytes = occurrence.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if !(bytes[i].is_ascii_alphabetic() && bytes[i + 1] == b'(') {
            continue;
        }
        let body_start = i + 2;
        let close = body_start + occurrence[body_start..].find(')')?;
        if close > body_start {
            let params = occurrence[body_start..close]
                .split(',')
                .map(parse_float)
                .collect();
            return Some((char::from(bytes[i]), params));
        }
    }
    None
}

/// Lenient float parsing: leading whitespace is skipped and the longest
/// numeric prefix is used, so `" 2.5px"` reads as `2.5`. Input without a
/// numeric prefix yields `NaN`.
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    rest[..end]
        .parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

/// Parse a generated string into its symbol stream.
///
/// Every ASCII letter followed by a parameter list becomes one
/// parameterized [`Symbol`]; every other character is a bare symbol.
pub fn parse_symbols(input: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for segment in scan(input, |c| c.is_ascii_alphabetic()) {
        match segment {
            Segment::Literal(text) => symbols.extend(text.chars().map(Symbol::new)),
            Segment::Bare(c) => symbols.push(Symbol::new(c)),
            Segment::Module(Module {
                parsed: Some((name, params)),
                ..
            }) => symbols.push(Symbol::with_params(name, params)),
            Segment::Module(Module { raw, parsed: None }) => {
                symbols.extend(raw.chars().map(Symbol::new))
            }
        }
    }
    symbols
}
