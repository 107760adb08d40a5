//! The optgen driver.
//!
//! This is the only layer that distinguishes "stop immediately" from
//! "collect and report": argument, resolution, and write failures abort
//! at once, while compile and validation diagnostics are accumulated by
//! the lower layers and only turned into a failed run here.

pub mod args;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use globset::GlobBuilder;
use walkdir::WalkDir;

use crate::canon::{Canonicalizer, CodeStyle};
use crate::compiler::{Compiler, FileResolver};
use crate::errors::CompileError;
use crate::gen::{self, Command};
use crate::validate;

/// Maps one source argument to the set of matching file names.
/// Swappable so tests can avoid listing real directories.
pub type GlobResolver = Box<dyn Fn(&str) -> Result<Vec<String>, CompileError>>;

/// One invocation's policy and collaborators. All compiler state is scoped
/// here, so a single process can run the pipeline any number of times.
pub struct Optgen {
    canonical: bool,
    max_errors: usize,
    out: Option<PathBuf>,
    glob_resolver: GlobResolver,
    file_resolver: Option<FileResolver>,
    canonicalizer: Box<dyn Canonicalizer>,
}

impl Default for Optgen {
    fn default() -> Self {
        Self::new()
    }
}

impl Optgen {
    pub fn new() -> Self {
        Optgen {
            canonical: true,
            max_errors: 10,
            out: None,
            glob_resolver: Box::new(resolve_glob),
            file_resolver: None,
            canonicalizer: Box::new(CodeStyle),
        }
    }

    /// Output file; when unset, output goes to the diagnostic stream.
    pub fn set_out(&mut self, out: PathBuf) {
        self.out = Some(out);
    }

    /// Max diagnostics printed before the "too many errors" summary.
    pub fn set_max_errors(&mut self, max_errors: usize) {
        self.max_errors = max_errors;
    }

    /// Disables canonicalization of generated artifacts.
    pub fn set_canonical(&mut self, canonical: bool) {
        self.canonical = canonical;
    }

    pub fn set_glob_resolver(&mut self, resolver: GlobResolver) {
        self.glob_resolver = resolver;
    }

    pub fn set_file_resolver(&mut self, resolver: FileResolver) {
        self.file_resolver = Some(resolver);
    }

    pub fn set_canonicalizer(&mut self, canonicalizer: Box<dyn Canonicalizer>) {
        self.canonicalizer = canonicalizer;
    }

    /// Runs one batch compilation. Returns `true` on success; every
    /// failure path has already been reported to `stderr`.
    pub fn run(&mut self, command: Command, sources: &[String], stderr: &mut dyn Write) -> bool {
        // Union the matches of every source argument, then deduplicate
        // and sort so the compiled unit is independent of argument order
        // and filesystem enumeration order.
        let mut files = BTreeSet::new();
        for source in sources {
            match (self.glob_resolver)(source) {
                Ok(matches) => files.extend(matches),
                Err(err) => {
                    report_error(stderr, &err);
                    return false;
                }
            }
        }

        let mut compiler = Compiler::new(files);
        if let Some(resolver) = &self.file_resolver {
            compiler.set_file_resolver(Rc::clone(resolver));
        }

        let compiled = match compiler.compile() {
            Some(compiled) => {
                let errors = validate::check_field_order(&compiled);
                if !errors.is_empty() {
                    self.print_errors(stderr, &errors);
                    return false;
                }
                compiled
            }
            None => {
                self.print_errors(stderr, &compiler.errors());
                return false;
            }
        };

        match gen::generator(command) {
            None => {
                // Identity mode: canonical text, no banner, no
                // canonicalization pass.
                let text = compiled.to_string();
                if let Err(err) = self.write_output(stderr, text.as_bytes()) {
                    report_error(stderr, &err);
                    return false;
                }
            }
            Some(generate) => {
                let mut text = String::from(gen::GENERATED_BANNER);
                generate(&compiled, &mut text);

                if self.canonical {
                    match self.canonicalizer.canonicalize(&text) {
                        Ok(canonical) => text = canonical,
                        Err(err) => {
                            // Still write the raw text so the broken
                            // artifact can be inspected; a write error on
                            // this path is secondary.
                            let _ = self.write_output(stderr, text.as_bytes());
                            report_error(
                                stderr,
                                &format!("code canonicalization failed: {err}"),
                            );
                            return false;
                        }
                    }
                }

                if let Err(err) = self.write_output(stderr, text.as_bytes()) {
                    report_error(stderr, &err);
                    return false;
                }
            }
        }

        true
    }

    /// Prints diagnostics in order, stopping at the configured cap with a
    /// single summary line counting the unprinted remainder.
    fn print_errors(&self, stderr: &mut dyn Write, errors: &[CompileError]) {
        for (i, err) in errors.iter().enumerate() {
            if i + 1 >= self.max_errors {
                let remaining = errors.len() + 1 - self.max_errors;
                if remaining > 1 {
                    let _ = writeln!(stderr, "... too many errors ({remaining} more)");
                    break;
                }
            }
            let _ = writeln!(stderr, "{err}");
        }
    }

    fn write_output(&self, stderr: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
        match &self.out {
            Some(path) => {
                let mut file = fs::File::create(path)?;
                file.write_all(bytes)
            }
            None => stderr.write_all(bytes),
        }
    }
}

fn report_error(stderr: &mut dyn Write, err: &dyn fmt::Display) {
    let _ = writeln!(stderr, "ERROR: {err}");
}

/// The default glob resolver. A plain path passes through verbatim, so a
/// missing literal file surfaces later as an unreadable-file error; a
/// pattern with glob metacharacters is matched against a walk of its
/// deepest literal prefix directory. Zero matches is not an error.
fn resolve_glob(pattern: &str) -> Result<Vec<String>, CompileError> {
    if !has_meta(pattern) {
        return Ok(vec![pattern.to_string()]);
    }

    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| CompileError::new(format!("invalid source pattern '{pattern}': {err}")))?;
    let matcher = glob.compile_matcher();

    let mut matches = Vec::new();
    for entry in WalkDir::new(literal_prefix(pattern)) {
        let entry = entry
            .map_err(|err| CompileError::new(format!("failed to resolve '{pattern}': {err}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let path = path.strip_prefix(".").unwrap_or(path);
        if matcher.is_match(path) {
            matches.push(path.display().to_string());
        }
    }
    Ok(matches)
}

fn has_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// The deepest directory prefix of `pattern` with no glob metacharacters.
fn literal_prefix(pattern: &str) -> String {
    let mut parts = Vec::new();
    for part in pattern.split('/') {
        if has_meta(part) {
            break;
        }
        parts.push(part);
    }
    let root = parts.join("/");
    if root.is_empty() {
        if pattern.starts_with('/') {
            "/".to_string()
        } else {
            ".".to_string()
        }
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through_unmatched() {
        assert_eq!(
            resolve_glob("defs/scan.opt").unwrap(),
            vec!["defs/scan.opt".to_string()]
        );
    }

    #[test]
    fn malformed_pattern_is_a_resolution_error() {
        let err = resolve_glob("defs/[.opt").unwrap_err();
        assert!(err.message().contains("invalid source pattern"));
    }

    #[test]
    fn literal_prefix_stops_at_first_meta_component() {
        assert_eq!(literal_prefix("defs/norm/*.opt"), "defs/norm");
        assert_eq!(literal_prefix("*.opt"), ".");
        assert_eq!(literal_prefix("/abs/*.opt"), "/abs");
    }
}
