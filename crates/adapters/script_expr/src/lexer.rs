//! Tokenizer.

use formgate_app::ports::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Question,
    Colon,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ScriptError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let number = text
                .parse()
                .map_err(|_| syntax(&format!("invalid number '{text}'")))?;
            tokens.push(Token::Number(number));
            continue;
        }
        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c == '"' || c == '\'' {
            let (text, next) = string_literal(&chars, i)?;
            tokens.push(Token::Str(text));
            i = next;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let after = chars.get(i + 2).copied();
        let (token, len) = match (c, next, after) {
            ('=', Some('='), Some('=')) => (Token::StrictEq, 3),
            ('!', Some('='), Some('=')) => (Token::StrictNotEq, 3),
            ('=', Some('='), _) => (Token::Eq, 2),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('<', ..) => (Token::Lt, 1),
            ('>', ..) => (Token::Gt, 1),
            ('!', ..) => (Token::Bang, 1),
            ('(', ..) => (Token::LParen, 1),
            (')', ..) => (Token::RParen, 1),
            ('[', ..) => (Token::LBracket, 1),
            (']', ..) => (Token::RBracket, 1),
            ('.', ..) => (Token::Dot, 1),
            (',', ..) => (Token::Comma, 1),
            ('?', ..) => (Token::Question, 1),
            (':', ..) => (Token::Colon, 1),
            ('+', ..) => (Token::Plus, 1),
            ('-', ..) => (Token::Minus, 1),
            ('*', ..) => (Token::Star, 1),
            ('/', ..) => (Token::Slash, 1),
            ('%', ..) => (Token::Percent, 1),
            _ => return Err(syntax(&format!("unexpected character '{c}'"))),
        };
        tokens.push(token);
        i += len;
    }
    Ok(tokens)
}

/// Read a quoted literal starting at `start`; returns the text and the index after it.
fn string_literal(chars: &[char], start: usize) -> Result<(String, usize), ScriptError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((text, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| syntax("unterminated string"))?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(syntax("unterminated string"))
}

fn syntax(message: &str) -> ScriptError {
    ScriptError::Syntax(message.to_string())
}
