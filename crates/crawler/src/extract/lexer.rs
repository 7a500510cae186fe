//! A forgiving tokenizer for Solidity-like source text.
//!
//! It never fails. Comment and string bodies are tokenized as well but their
//! tokens are marked as not being code, so address scans can look into them
//! while declaration scans skip them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// `0x` followed only by hex digits
    Hex,
    Number,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// false inside comments and string literals
    pub code: bool,
}

impl<'a> Token<'a> {
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }
}

const TWO_CHAR_PUNCT: [&str; 6] = ["==", "!=", "=>", "<=", ">=", "::"];

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    lex(text, 0, text.len(), true, &mut tokens);
    tokens
}

/// Position of `needle` in `text[from..]`, or `text.len()`.
fn find_from(text: &str, from: usize, needle: &str) -> usize {
    text[from..]
        .find(needle)
        .map(|i| from + i)
        .unwrap_or(text.len())
}

fn lex<'a>(text: &'a str, start: usize, end: usize, code: bool, out: &mut Vec<Token<'a>>) {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < end {
        let b = bytes[i];
        if b.is_ascii_whitespace() || !b.is_ascii() {
            i += 1;
            continue;
        }
        let next = if i + 1 < end { bytes[i + 1] } else { 0 };

        if code && b == b'/' && next == b'/' {
            let stop = find_from(text, i, "\n").min(end);
            lex(text, i + 2, stop, false, out);
            i = stop;
            continue;
        }
        if code && b == b'/' && next == b'*' {
            let close = find_from(text, i + 2, "*/");
            let stop = close.min(end);
            lex(text, i + 2, stop, false, out);
            i = (close + 2).min(end);
            continue;
        }
        if code && (b == b'"' || b == b'\'') {
            let mut j = i + 1;
            while j < end && bytes[j] != b && bytes[j] != b'\n' {
                j += if bytes[j] == b'\\' { 2 } else { 1 };
            }
            let stop = j.min(end);
            lex(text, i + 1, stop, false, out);
            i = (stop + 1).min(end);
            continue;
        }

        let begin = i;
        let kind = if is_ident_start(b) {
            while i < end && is_ident_continue(bytes[i]) {
                i += 1;
            }
            TokenKind::Ident
        } else if b.is_ascii_digit() {
            let hex = b == b'0' && (next == b'x' || next == b'X');
            if hex {
                i += 2;
                while i < end && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
            }
            // anything glued on makes it something other than a hex literal
            let glued = i < end && (is_ident_continue(bytes[i]) || bytes[i] == b'.');
            while i < end && (is_ident_continue(bytes[i]) || bytes[i] == b'.') {
                i += 1;
            }
            if hex && !glued && i - begin > 2 {
                TokenKind::Hex
            } else {
                TokenKind::Number
            }
        } else {
            let two = if i + 2 <= end { text.get(i..i + 2) } else { None };
            i += match two {
                Some(op) if TWO_CHAR_PUNCT.contains(&op) => 2,
                _ => 1,
            };
            TokenKind::Punct
        };
        out.push(Token {
            kind,
            text: &text[begin..i],
            code,
        });
    }
}
