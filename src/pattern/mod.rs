//! Path pattern parser
//!
//! パスパターンをバリアント列に展開するパーサ
//!
//! A pattern is literal text mixed with named placeholders (`{id}`,
//! `{ id : \d+ }`) and trailing bracketed optional groups
//! (`/index[/{page:\d+}]`). Parsing expands the optional groups into an
//! ordered list of variants, least specific first.

use crate::error::RouterError;

/// プレースホルダの既定の制約
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

/// One token of a pattern variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// そのまま出力されるリテラル
    Literal(String),
    /// 名前付きパラメータと正規表現制約
    Param { name: String, constraint: String },
}

impl Token {
    /// パラメータ名を取得する（リテラルはNone）
    #[inline]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Token::Literal(_) => None,
            Token::Param { name, .. } => Some(name),
        }
    }
}

/// One concrete expansion of a pattern's optional groups.
pub type Variant = Vec<Token>;

/// Parse a path pattern into its ordered variants.
///
/// Optional groups may only sit at the end of the pattern; every
/// additional group extends the previous variant, so the returned list
/// runs from the bare mandatory prefix to the fullest expansion.
pub fn parse(pattern: &str) -> Result<Vec<Variant>, RouterError> {
    let without_closing = pattern.trim_end_matches(']');
    let num_optionals = pattern.len() - without_closing.len();

    let segments = split_optionals(without_closing);
    if segments.len() != num_optionals + 1 {
        return Err(RouterError::InvalidPattern(
            "Number of opening '[' and closing ']' does not match".to_string(),
        ));
    }

    let mut variants = Vec::with_capacity(segments.len());
    let mut current = String::new();
    for (n, segment) in segments.iter().enumerate() {
        if segment.is_empty() && n != 0 {
            return Err(RouterError::InvalidPattern("Empty optional part".to_string()));
        }
        current.push_str(segment);
        variants.push(parse_placeholders(&current));
    }
    Ok(variants)
}

/// トップレベルの `[` で分割する（`{...}` 内は対象外）
fn split_optionals(pattern: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let bytes = pattern.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => match matching_brace(&pattern[i..]) {
                Some(len) => i += len,
                None => i += 1,
            },
            b'[' => {
                segments.push(&pattern[start..i]);
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    segments.push(&pattern[start..]);
    segments
}

/// `{` から対応する `}` までの長さを返す
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Tokenize one variant string, leaving malformed placeholders literal.
fn parse_placeholders(route: &str) -> Variant {
    let mut tokens: Variant = Vec::new();
    let mut literal = String::new();
    let mut rest = route;
    while let Some(pos) = rest.find('{') {
        match parse_placeholder(&rest[pos..]) {
            Some((name, constraint, len)) => {
                literal.push_str(&rest[..pos]);
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Param { name, constraint });
                rest = &rest[pos + len..];
            }
            None => {
                literal.push_str(&rest[..pos + 1]);
                rest = &rest[pos + 1..];
            }
        }
    }
    literal.push_str(rest);
    if tokens.is_empty() {
        // プレースホルダなし: 空文字列もそのまま1リテラル
        tokens.push(Token::Literal(literal));
    } else if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// `{ name : constraint }` を読み取る。形式外ならNone
fn parse_placeholder(s: &str) -> Option<(String, String, usize)> {
    let len = matching_brace(s)?;
    let inner = &s[1..len - 1];
    let (name, constraint) = match inner.find(':') {
        Some(colon) => (inner[..colon].trim(), inner[colon + 1..].trim()),
        None => (inner.trim(), DEFAULT_CONSTRAINT),
    };
    if !valid_param_name(name) {
        return None;
    }
    Some((name.to_string(), constraint.to_string(), len))
}

fn valid_param_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b'a'..=b'z') | Some(b'A'..=b'Z') | Some(b'_') => {}
        _ => return false,
    }
    bytes.all(|b| matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-'))
}
