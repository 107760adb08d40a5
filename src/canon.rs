//! Canonicalization of generated code.
//!
//! The driver hands every generated artifact through a [`Canonicalizer`]
//! before writing it. The default implementation re-indents by delimiter
//! depth and normalizes blank lines; it refuses text whose delimiters do
//! not balance, and the driver then writes the raw text anyway so the
//! broken artifact can be inspected.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    #[error("unbalanced delimiter: unexpected '{0}'")]
    Unexpected(char),
    #[error("unbalanced delimiter: unclosed '{0}'")]
    Unclosed(char),
    #[error("unterminated string literal in generated code")]
    UnterminatedString,
}

pub trait Canonicalizer {
    fn canonicalize(&self, text: &str) -> Result<String, CanonError>;
}

/// The default style normalizer for generated Rust code: 4-space
/// indentation derived from delimiter depth, trailing whitespace trimmed,
/// blank-line runs collapsed, exactly one trailing newline. Double-quoted
/// strings and `//` comments are honored when tracking delimiters.
#[derive(Debug, Default)]
pub struct CodeStyle;

impl Canonicalizer for CodeStyle {
    fn canonicalize(&self, text: &str) -> Result<String, CanonError> {
        let mut out = String::with_capacity(text.len());
        let mut stack: Vec<char> = Vec::new();
        let mut blank_run = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                blank_run += 1;
                if blank_run == 1 && !out.is_empty() {
                    out.push('\n');
                }
                continue;
            }
            blank_run = 0;

            let closers = trimmed
                .chars()
                .take_while(|ch| matches!(ch, ')' | ']' | '}'))
                .count();
            let indent = stack.len().saturating_sub(closers);
            for _ in 0..indent {
                out.push_str("    ");
            }
            out.push_str(trimmed);
            out.push('\n');

            scan_delimiters(trimmed, &mut stack)?;
        }

        if let Some(open) = stack.pop() {
            return Err(CanonError::Unclosed(open));
        }

        // A trailing blank line would have been emitted above; canonical
        // output ends with exactly one newline.
        while out.ends_with("\n\n") {
            out.pop();
        }
        Ok(out)
    }
}

fn scan_delimiters(line: &str, stack: &mut Vec<char>) -> Result<(), CanonError> {
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '/' if chars.peek() == Some(&'/') => return Ok(()),
            '"' => loop {
                match chars.next() {
                    None => return Err(CanonError::UnterminatedString),
                    Some('"') => break,
                    Some('\\') => {
                        chars.next();
                    }
                    Some(_) => {}
                }
            },
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(CanonError::Unexpected(ch));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
