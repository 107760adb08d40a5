//! Lexical analysis: one file's text to a stream of located tokens.
//!
//! Comments are consumed here and never surface as tokens. A lex error
//! abandons the rest of the file; the compiler records it and moves on to
//! the next input, so one bad file cannot suppress diagnostics elsewhere.

use crate::ast::SourceLoc;
use crate::errors::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dollar,
    Colon,
    Asterisk,
    Comma,
    Caret,
    Ampersand,
    /// `=>`
    Arrow,
    /// `...`
    Ellipsis,
    Ident,
    /// A string literal; `text` holds the unescaped value.
    Str,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: SourceLoc,
}

/// Scans `content` into tokens, attributing every token to `file`.
pub fn lex(file: &str, content: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = content.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;

    while index < chars.len() {
        let ch = chars[index];
        let loc = SourceLoc::new(file, line, col);

        if ch == '\n' {
            index += 1;
            line += 1;
            col = 1;
            continue;
        }

        if ch == ' ' || ch == '\t' || ch == '\r' {
            index += 1;
            col += 1;
            continue;
        }

        // Comments run from `#` to end of line and are discarded.
        if ch == '#' {
            while index < chars.len() && chars[index] != '\n' {
                index += 1;
                col += 1;
            }
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = index;
            while index < chars.len()
                && (chars[index].is_ascii_alphanumeric() || chars[index] == '_')
            {
                index += 1;
                col += 1;
            }
            let text: String = chars[start..index].iter().collect();
            tokens.push(Token {
                kind: TokenKind::Ident,
                text,
                loc,
            });
            continue;
        }

        if ch == '"' {
            index += 1;
            col += 1;
            let mut value = String::new();
            loop {
                match chars.get(index) {
                    None | Some('\n') => {
                        return Err(CompileError::at(loc, "unterminated string literal"));
                    }
                    Some('"') => {
                        index += 1;
                        col += 1;
                        break;
                    }
                    Some('\\') => {
                        index += 1;
                        col += 1;
                        match chars.get(index) {
                            Some('"') => value.push('"'),
                            Some('\\') => value.push('\\'),
                            Some(other) => {
                                let bad = SourceLoc::new(file, line, col);
                                return Err(CompileError::at(
                                    bad,
                                    format!("invalid escape sequence '\\{other}'"),
                                ));
                            }
                            None => {
                                return Err(CompileError::at(loc, "unterminated string literal"));
                            }
                        }
                        index += 1;
                        col += 1;
                    }
                    Some(other) => {
                        value.push(*other);
                        index += 1;
                        col += 1;
                    }
                }
            }
            tokens.push(Token {
                kind: TokenKind::Str,
                text: value,
                loc,
            });
            continue;
        }

        if ch == '=' {
            if chars.get(index + 1) == Some(&'>') {
                tokens.push(Token {
                    kind: TokenKind::Arrow,
                    text: "=>".to_string(),
                    loc,
                });
                index += 2;
                col += 2;
                continue;
            }
            return Err(CompileError::at(loc, "expected '=>'"));
        }

        if ch == '.' {
            if chars.get(index + 1) == Some(&'.') && chars.get(index + 2) == Some(&'.') {
                tokens.push(Token {
                    kind: TokenKind::Ellipsis,
                    text: "...".to_string(),
                    loc,
                });
                index += 3;
                col += 3;
                continue;
            }
            return Err(CompileError::at(loc, "expected '...'"));
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '$' => TokenKind::Dollar,
            ':' => TokenKind::Colon,
            '*' => TokenKind::Asterisk,
            ',' => TokenKind::Comma,
            '^' => TokenKind::Caret,
            '&' => TokenKind::Ampersand,
            other => {
                return Err(CompileError::at(
                    loc,
                    format!("unrecognized character '{other}'"),
                ));
            }
        };
        tokens.push(Token {
            kind,
            text: ch.to_string(),
            loc,
        });
        index += 1;
        col += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex("test.opt", source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_define_declaration() {
        let tokens = lex("test.opt", "define Select {\n    Input Expr\n}\n").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["define", "Select", "{", "Input", "Expr", "}"]);
        assert_eq!(tokens[0].loc, SourceLoc::new("test.opt", 1, 1));
        assert_eq!(tokens[3].loc, SourceLoc::new("test.opt", 2, 5));
        assert_eq!(tokens[5].loc, SourceLoc::new("test.opt", 3, 1));
    }

    #[test]
    fn lexes_rule_sigils() {
        assert_eq!(
            kinds("($x:* => [ ... ]) & ^,"),
            vec![
                TokenKind::LParen,
                TokenKind::Dollar,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Asterisk,
                TokenKind::Arrow,
                TokenKind::LBracket,
                TokenKind::Ellipsis,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::Ampersand,
                TokenKind::Caret,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn comments_are_discarded() {
        assert_eq!(
            kinds("# a comment\ndefine # trailing\n"),
            vec![TokenKind::Ident]
        );
    }

    #[test]
    fn string_literal_unescapes() {
        let tokens = lex("test.opt", r#""a\"b\\c""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "a\"b\\c");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("test.opt", "define X\n\"abc").unwrap_err();
        assert_eq!(err.loc(), Some(&SourceLoc::new("test.opt", 2, 1)));
        assert_eq!(err.message(), "unterminated string literal");
    }

    #[test]
    fn newline_inside_string_is_an_error() {
        let err = lex("test.opt", "\"abc\ndef\"").unwrap_err();
        assert_eq!(err.message(), "unterminated string literal");
    }

    #[test]
    fn unrecognized_character_reports_exact_position() {
        let err = lex("test.opt", "define X %").unwrap_err();
        assert_eq!(err.loc(), Some(&SourceLoc::new("test.opt", 1, 10)));
        assert_eq!(err.message(), "unrecognized character '%'");
    }

    #[test]
    fn lone_equals_and_short_ellipsis_are_errors() {
        assert_eq!(lex("t.opt", "=").unwrap_err().message(), "expected '=>'");
        assert_eq!(lex("t.opt", "..").unwrap_err().message(), "expected '...'");
    }
}
