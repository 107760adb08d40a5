//! Recursive-descent parser for the optgen language.
//!
//! The parser never gives up on a file: on a syntax error it records one
//! diagnostic, discards tokens up to the next top-level declaration
//! boundary (a `define` keyword or a `[` tag bracket), and resumes. One
//! malformed declaration therefore suppresses neither the rest of its
//! file nor any later file.

use crate::ast::{
    DefineExpr, FieldExpr, ListPattern, MatchExpr, ReplaceExpr, RuleExpr, SourceLoc,
};
use crate::errors::CompileError;
use crate::lexer::{Token, TokenKind};

/// One file's parsed declarations plus every diagnostic recorded on the way.
/// Declarations that parsed cleanly are kept even when others failed.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub defines: Vec<DefineExpr>,
    pub rules: Vec<RuleExpr>,
    pub errors: Vec<CompileError>,
}

/// Parses one file's token stream.
pub fn parse(file: &str, tokens: &[Token]) -> ParsedFile {
    let eof_loc = match tokens.last() {
        Some(token) => token.loc.clone(),
        None => SourceLoc::new(file, 1, 1),
    };
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof_loc,
        parsed: ParsedFile::default(),
    };
    parser.parse_root();
    parser.parsed
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof_loc: SourceLoc,
    parsed: ParsedFile,
}

impl<'a> Parser<'a> {
    fn parse_root(&mut self) {
        while self.peek().is_some() {
            if self.parse_decl().is_none() {
                self.recover();
            }
        }
    }

    /// Parses one top-level declaration. Returns `None` after recording a
    /// diagnostic; the caller then resynchronizes.
    fn parse_decl(&mut self) -> Option<()> {
        let (tags, tags_loc) = if self.at(TokenKind::LBracket) {
            let (tags, loc) = self.parse_tags()?;
            (tags, Some(loc))
        } else {
            (Vec::new(), None)
        };

        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident && token.text == "define" => {
                self.parse_define(tags)
            }
            Some(token) if token.kind == TokenKind::LParen => {
                let paren_loc = token.loc.clone();
                self.parse_rule(tags, tags_loc, paren_loc)
            }
            Some(token) => {
                let message = format!("expected define statement or rule, found '{}'", token.text);
                let loc = token.loc.clone();
                self.error(loc, message);
                None
            }
            None => {
                if tags.is_empty() {
                    Some(())
                } else {
                    self.eof_error("define statement or rule");
                    None
                }
            }
        }
    }

    fn parse_tags(&mut self) -> Option<(Vec<String>, SourceLoc)> {
        let open = self.advance()?;
        let open_loc = open.loc.clone();
        let mut tags = Vec::new();
        loop {
            let (tag, _) = self.expect_ident("tag name")?;
            tags.push(tag);
            match self.peek() {
                Some(token) if token.kind == TokenKind::Comma => {
                    self.advance();
                }
                Some(token) if token.kind == TokenKind::RBracket => {
                    self.advance();
                    return Some((tags, open_loc));
                }
                Some(token) => {
                    let message = format!("expected ',' or ']', found '{}'", token.text);
                    let loc = token.loc.clone();
                    self.error(loc, message);
                    return None;
                }
                None => {
                    self.eof_error("',' or ']'");
                    return None;
                }
            }
        }
    }

    fn parse_define(&mut self, tags: Vec<String>) -> Option<()> {
        let keyword = self.advance()?;
        let loc = keyword.loc.clone();
        let (name, _) = self.expect_ident("define name")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token.kind == TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                Some(token) if token.kind == TokenKind::Ident => {
                    let field_loc = token.loc.clone();
                    let (field_name, _) = self.expect_ident("field name")?;
                    let (ty, _) = self.expect_ident("field type")?;
                    fields.push(FieldExpr {
                        name: field_name,
                        ty,
                        loc: field_loc,
                    });
                }
                Some(token) => {
                    let message = format!("expected field name or '}}', found '{}'", token.text);
                    let loc = token.loc.clone();
                    self.error(loc, message);
                    return None;
                }
                None => {
                    self.eof_error("field name or '}'");
                    return None;
                }
            }
        }

        self.parsed.defines.push(DefineExpr {
            name,
            tags,
            fields,
            loc,
        });
        Some(())
    }

    fn parse_rule(
        &mut self,
        tags: Vec<String>,
        tags_loc: Option<SourceLoc>,
        paren_loc: SourceLoc,
    ) -> Option<()> {
        if tags.is_empty() {
            self.error(paren_loc, "rule is missing its name tag");
            return None;
        }
        let pattern = self.parse_match()?;
        self.expect(TokenKind::Arrow, "'=>'")?;
        let replace = self.parse_replace()?;

        let mut tags = tags.into_iter();
        if let Some(name) = tags.next() {
            self.parsed.rules.push(RuleExpr {
                name,
                tags: tags.collect(),
                pattern,
                replace,
                loc: tags_loc.unwrap_or(paren_loc),
            });
        }
        Some(())
    }

    /// Parses a parenthesized match form. An uppercase head is an operator
    /// match, a lowercase head a custom predicate, `*` a wildcard head.
    fn parse_match(&mut self) -> Option<MatchExpr> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let loc = open.loc.clone();

        let head = match self.peek() {
            Some(token) if token.kind == TokenKind::Asterisk => {
                self.advance();
                None
            }
            Some(token) if token.kind == TokenKind::Ident => {
                let text = token.text.clone();
                self.advance();
                Some(text)
            }
            Some(token) => {
                let message = format!("expected operator name or '*', found '{}'", token.text);
                let loc = token.loc.clone();
                self.error(loc, message);
                return None;
            }
            None => {
                self.eof_error("operator name or '*'");
                return None;
            }
        };

        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token.kind == TokenKind::RParen => {
                    self.advance();
                    break;
                }
                Some(_) => args.push(self.parse_pattern()?),
                None => {
                    self.eof_error("')'");
                    return None;
                }
            }
        }

        Some(match head {
            Some(name) if is_op_name(&name) => MatchExpr::Op {
                name: Some(name),
                args,
                loc,
            },
            Some(func) => MatchExpr::Invoke { func, args, loc },
            None => MatchExpr::Op {
                name: None,
                args,
                loc,
            },
        })
    }

    fn parse_pattern(&mut self) -> Option<MatchExpr> {
        let mut left = self.parse_conjunct()?;
        while self.at(TokenKind::Ampersand) {
            let amp = self.advance()?;
            let loc = amp.loc.clone();
            let right = self.parse_conjunct()?;
            left = MatchExpr::And {
                left: Box::new(left),
                right: Box::new(right),
                loc,
            };
        }
        Some(left)
    }

    fn parse_conjunct(&mut self) -> Option<MatchExpr> {
        if self.at(TokenKind::Caret) {
            let caret = self.advance()?;
            let loc = caret.loc.clone();
            let target = self.parse_conjunct()?;
            return Some(MatchExpr::Not {
                target: Box::new(target),
                loc,
            });
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Option<MatchExpr> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::LParen => self.parse_match(),
            Some(token) if token.kind == TokenKind::LBracket => self.parse_list(),
            Some(token) if token.kind == TokenKind::Asterisk => {
                let loc = token.loc.clone();
                self.advance();
                Some(MatchExpr::Wildcard { loc })
            }
            Some(token) if token.kind == TokenKind::Dollar => {
                let loc = token.loc.clone();
                self.advance();
                let (name, _) = self.expect_ident("binding name")?;
                if self.at(TokenKind::Colon) {
                    self.advance();
                    let target = self.parse_pattern()?;
                    Some(MatchExpr::Bind {
                        name,
                        target: Box::new(target),
                        loc,
                    })
                } else {
                    Some(MatchExpr::Ref { name, loc })
                }
            }
            Some(token) if token.kind == TokenKind::Str => {
                let value = token.text.clone();
                let loc = token.loc.clone();
                self.advance();
                Some(MatchExpr::Str { value, loc })
            }
            Some(token) => {
                let message = format!("expected match pattern, found '{}'", token.text);
                let loc = token.loc.clone();
                self.error(loc, message);
                None
            }
            None => {
                self.eof_error("match pattern");
                None
            }
        }
    }

    fn parse_list(&mut self) -> Option<MatchExpr> {
        let open = self.advance()?;
        let loc = open.loc.clone();

        let kind = match self.peek() {
            Some(token) if token.kind == TokenKind::RBracket => {
                self.advance();
                ListPattern::Empty
            }
            Some(token) if token.kind == TokenKind::Ellipsis => {
                self.advance();
                if self.at(TokenKind::RBracket) {
                    self.advance();
                    ListPattern::Any
                } else {
                    let pattern = self.parse_pattern()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    ListPattern::Last(Box::new(pattern))
                }
            }
            Some(_) => {
                let pattern = self.parse_pattern()?;
                match self.peek() {
                    Some(token) if token.kind == TokenKind::Ellipsis => {
                        self.advance();
                        self.expect(TokenKind::RBracket, "']'")?;
                        ListPattern::First(Box::new(pattern))
                    }
                    Some(token) if token.kind == TokenKind::RBracket => {
                        self.advance();
                        ListPattern::Single(Box::new(pattern))
                    }
                    Some(token) => {
                        let message = format!("expected '...' or ']', found '{}'", token.text);
                        let loc = token.loc.clone();
                        self.error(loc, message);
                        return None;
                    }
                    None => {
                        self.eof_error("'...' or ']'");
                        return None;
                    }
                }
            }
            None => {
                self.eof_error("list pattern");
                return None;
            }
        };

        Some(MatchExpr::List { kind, loc })
    }

    fn parse_replace(&mut self) -> Option<ReplaceExpr> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::LParen => {
                let loc = token.loc.clone();
                self.advance();
                let (head, _) = self.expect_ident("operator or function name")?;
                let mut args = Vec::new();
                loop {
                    match self.peek() {
                        Some(token) if token.kind == TokenKind::RParen => {
                            self.advance();
                            break;
                        }
                        Some(_) => args.push(self.parse_replace()?),
                        None => {
                            self.eof_error("')'");
                            return None;
                        }
                    }
                }
                if is_op_name(&head) {
                    Some(ReplaceExpr::Construct {
                        name: head,
                        args,
                        loc,
                    })
                } else {
                    Some(ReplaceExpr::Invoke {
                        func: head,
                        args,
                        loc,
                    })
                }
            }
            Some(token) if token.kind == TokenKind::Dollar => {
                let loc = token.loc.clone();
                self.advance();
                let (name, _) = self.expect_ident("binding name")?;
                Some(ReplaceExpr::Ref { name, loc })
            }
            Some(token) if token.kind == TokenKind::Str => {
                let value = token.text.clone();
                let loc = token.loc.clone();
                self.advance();
                Some(ReplaceExpr::Str { value, loc })
            }
            Some(token) => {
                let message = format!("expected replace expression, found '{}'", token.text);
                let loc = token.loc.clone();
                self.error(loc, message);
                None
            }
            None => {
                self.eof_error("replace expression");
                None
            }
        }
    }

    /// Discards tokens up to the next plausible declaration start.
    fn recover(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::LBracket
                || (token.kind == TokenKind::Ident && token.text == "define")
            {
                return;
            }
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind) == Some(kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<&Token> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Some(token)
            }
            Some(token) => {
                let message = format!("expected {what}, found '{}'", token.text);
                let loc = token.loc.clone();
                self.parsed.errors.push(CompileError::at(loc, message));
                None
            }
            None => {
                self.eof_error(what);
                None
            }
        }
    }

    fn expect_ident(&mut self, what: &str) -> Option<(String, SourceLoc)> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                Some((token.text.clone(), token.loc.clone()))
            }
            Some(token) => {
                let message = format!("expected {what}, found '{}'", token.text);
                let loc = token.loc.clone();
                self.parsed.errors.push(CompileError::at(loc, message));
                None
            }
            None => {
                self.eof_error(what);
                None
            }
        }
    }

    fn error(&mut self, loc: SourceLoc, message: impl Into<String>) {
        self.parsed.errors.push(CompileError::at(loc, message));
    }

    fn eof_error(&mut self, what: &str) {
        let loc = self.eof_loc.clone();
        self.error(loc, format!("unexpected end of file, expected {what}"));
    }
}

/// Heads beginning with an uppercase letter name operators; anything else
/// names a custom function external to the compiled unit.
fn is_op_name(name: &str) -> bool {
    name.chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
}
