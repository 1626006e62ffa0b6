use crate::filter::FilterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Name(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column of the first character.
    pub column: usize,
}

fn syntax(column: usize, message: impl Into<String>) -> FilterError {
    FilterError::Syntax {
        column,
        message: message.into(),
    }
}

/// Splits an expression into tokens, ending with [`TokenKind::End`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, FilterError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let raw = (c == 'r' || c == 'R') && matches!(chars.get(i + 1), Some('"' | '\''));
        if raw || c == '"' || c == '\'' {
            let start = if raw { i + 1 } else { i };
            let (text, next) = read_string(&chars, start, raw)?;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                column,
            });
            i = next;
            continue;
        }

        if c.is_ascii_digit() {
            let end = (i..chars.len())
                .find(|&j| !chars[j].is_ascii_digit())
                .unwrap_or(chars.len());
            let digits: String = chars[i..end].iter().collect();
            let value = digits
                .parse()
                .map_err(|_| syntax(column, format!("integer too large: {digits}")))?;
            tokens.push(Token {
                kind: TokenKind::Int(value),
                column,
            });
            i = end;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let end = (i..chars.len())
                .find(|&j| !(chars[j].is_alphanumeric() || chars[j] == '_'))
                .unwrap_or(chars.len());
            tokens.push(Token {
                kind: TokenKind::Name(chars[i..end].iter().collect()),
                column,
            });
            i = end;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (kind, width) = match (c, next) {
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::Ne, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            _ => return Err(syntax(column, format!("unexpected character '{c}'"))),
        };
        tokens.push(Token { kind, column });
        i += width;
    }

    tokens.push(Token {
        kind: TokenKind::End,
        column: chars.len() + 1,
    });
    Ok(tokens)
}

/// Reads a quoted string starting at the opening quote. Returns the decoded
/// text and the index just past the closing quote.
fn read_string(chars: &[char], start: usize, raw: bool) -> Result<(String, usize), FilterError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;
    while let Some(&c) = chars.get(i) {
        if c == quote {
            return Ok((text, i + 1));
        }
        if c == '\\' {
            let Some(&escaped) = chars.get(i + 1) else {
                break;
            };
            if raw {
                text.push('\\');
                text.push(escaped);
            } else {
                match escaped {
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    '\\' | '\'' | '"' => text.push(escaped),
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
            }
            i += 2;
            continue;
        }
        text.push(c);
        i += 1;
    }
    let opening = if raw { start } else { start + 1 };
    Err(syntax(opening, "unterminated string"))
}
