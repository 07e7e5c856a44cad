//! Tokenization of story expressions using logos.
//!
//! Keywords such as `true` and `null` are lexed as identifiers and given
//! meaning by the parser, so `trueish` stays an ordinary name.

use std::fmt;
use std::ops::Range;

use gamebook_core::EvalError;
use logos::Logos;

/// Expression token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unescape(lex.slice()))]
    Text(String),

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_owned())]
    Ident(String),

    // Comparison
    #[token("===")]
    StrictEq,
    #[token("!==")]
    StrictNotEq,
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Logic
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Bang,

    // Assignment
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,

    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Punctuation
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Number(value) => return write!(f, "{value}"),
            Self::Text(text) => return write!(f, "{text:?}"),
            Self::Ident(name) => return f.write_str(name),
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::And => "&&",
            Self::Or => "||",
            Self::Bang => "!",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
        };
        f.write_str(text)
    }
}

/// Strips the quotes off a string literal and resolves backslash escapes.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lexes `source` into tokens with their byte spans.
///
/// # Errors
///
/// Returns `EvalError::Syntax` at the first character no token matches.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, EvalError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(EvalError::Syntax {
                    position: lexer.span().start,
                    message: format!("unexpected input {:?}", lexer.slice()),
                });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_variable_reference() {
        assert_eq!(
            lex("Variables.gold >= 10"),
            vec![
                Token::Ident("Variables".into()),
                Token::Dot,
                Token::Ident("gold".into()),
                Token::GtEq,
                Token::Number(10.0),
            ]
        );
    }

    #[test]
    fn test_strings_with_both_quotes() {
        assert_eq!(
            lex(r#"'it\'s' "say \"hi\"""#),
            vec![Token::Text("it's".into()), Token::Text("say \"hi\"".into())]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            lex("a === b !== c ++ +="),
            vec![
                Token::Ident("a".into()),
                Token::StrictEq,
                Token::Ident("b".into()),
                Token::StrictNotEq,
                Token::Ident("c".into()),
                Token::Increment,
                Token::PlusAssign,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 2.5 1e3"),
            vec![Token::Number(42.0), Token::Number(2.5), Token::Number(1000.0)]
        );
    }

    #[test]
    fn test_unknown_character_reports_position() {
        let result = tokenize("1 + @");
        assert!(matches!(result, Err(EvalError::Syntax { position: 4, .. })));
    }
}
