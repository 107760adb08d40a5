//! The compiler: merges every input file into one unit, binds names and
//! field kinds, and produces the IR.
//!
//! The contract is strict: `compile` returns the fully bound
//! [`CompiledExpr`] only when every file lexed, parsed, and bound without
//! a single diagnostic. Otherwise it returns `None` and the caller must
//! rely on [`Compiler::errors`]. There is no partial IR.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::rc::Rc;

use crate::ast::{DefineExpr, MatchExpr, ReplaceExpr, RuleExpr};
use crate::errors::{sort_errors, CompileError};
use crate::lexer;
use crate::parser;

/// Opens an input file by name. Swappable so tests can compile from
/// in-memory sources without touching the filesystem.
pub type FileResolver = Rc<dyn Fn(&str) -> io::Result<String>>;

/// The fully bound intermediate representation of one compiled unit.
///
/// Declaration order is inherited from the input file list, which the
/// driver sorts and deduplicates before construction — identical inputs
/// therefore always produce an identical IR, and identical generated
/// output, regardless of how the sources were enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    pub defines: Vec<DefineExpr>,
    pub rules: Vec<RuleExpr>,
}

impl CompiledExpr {
    pub fn lookup_define(&self, name: &str) -> Option<&DefineExpr> {
        self.defines.iter().find(|d| d.name == name)
    }

    /// Rules whose match pattern is rooted at the named operator, in
    /// declaration order.
    pub fn rules_for<'a>(&'a self, op: &'a str) -> impl Iterator<Item = &'a RuleExpr> {
        self.rules.iter().filter(move |r| r.root_op() == Some(op))
    }
}

impl fmt::Display for CompiledExpr {
    /// Renders the canonical textual form, itself valid source: all
    /// defines, then all rules, separated by blank lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for define in &self.defines {
            if !first {
                writeln!(f)?;
            }
            writeln!(f, "{define}")?;
            first = false;
        }
        for rule in &self.rules {
            if !first {
                writeln!(f)?;
            }
            writeln!(f, "{rule}")?;
            first = false;
        }
        Ok(())
    }
}

/// Compiles a fixed set of input files into one [`CompiledExpr`].
pub struct Compiler {
    files: Vec<String>,
    resolver: FileResolver,
    errors: Vec<CompileError>,
}

impl Compiler {
    /// `files` is compiled in the order given; the driver passes it
    /// sorted and deduplicated.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Compiler {
            files: files.into_iter().map(Into::into).collect(),
            resolver: Rc::new(|name: &str| fs::read_to_string(name)),
            errors: Vec::new(),
        }
    }

    pub fn set_file_resolver(&mut self, resolver: FileResolver) {
        self.resolver = resolver;
    }

    /// Runs the full pipeline. Returns the IR only if no diagnostics
    /// accumulated across lexing, parsing, and binding.
    pub fn compile(&mut self) -> Option<CompiledExpr> {
        let mut defines = Vec::new();
        let mut rules = Vec::new();

        let files = self.files.clone();
        for file in &files {
            let content = match (self.resolver)(file) {
                Ok(content) => content,
                Err(err) => {
                    // An unreadable input is a structural precondition
                    // failure, not a recoverable diagnostic.
                    self.errors
                        .push(CompileError::new(format!("failed to read {file}: {err}")));
                    return None;
                }
            };

            let tokens = match lexer::lex(file, &content) {
                Ok(tokens) => tokens,
                Err(err) => {
                    self.errors.push(err);
                    continue;
                }
            };

            let parsed = parser::parse(file, &tokens);
            self.errors.extend(parsed.errors);
            defines.extend(parsed.defines);
            rules.extend(parsed.rules);
        }

        let unit = CompiledExpr { defines, rules };
        self.bind(&unit);

        if self.errors.is_empty() {
            Some(unit)
        } else {
            None
        }
    }

    /// Every diagnostic accumulated so far, ordered by (file, line,
    /// column) with detection order preserved within a position.
    pub fn errors(&self) -> Vec<CompileError> {
        let mut errors = self.errors.clone();
        sort_errors(&mut errors);
        errors
    }

    fn bind(&mut self, unit: &CompiledExpr) {
        let mut known: HashMap<&str, &DefineExpr> = HashMap::new();

        for define in &unit.defines {
            match known.get(define.name.as_str()) {
                Some(first) => {
                    self.errors.push(CompileError::at(
                        define.loc.clone(),
                        format!(
                            "duplicate define name '{}' (first defined at {})",
                            define.name, first.loc
                        ),
                    ));
                }
                None => {
                    known.insert(&define.name, define);
                }
            }

            let mut seen = HashSet::new();
            for field in &define.fields {
                if !seen.insert(field.name.as_str()) {
                    self.errors.push(CompileError::at(
                        field.loc.clone(),
                        format!(
                            "duplicate field name '{}' in define '{}'",
                            field.name, define.name
                        ),
                    ));
                }
                if !is_field_type(&field.ty) {
                    self.errors.push(CompileError::at(
                        field.loc.clone(),
                        format!(
                            "unrecognized field type '{}' for field '{}' in define '{}'",
                            field.ty, field.name, define.name
                        ),
                    ));
                }
            }
        }

        let mut rule_locs = HashMap::new();
        for rule in &unit.rules {
            match rule_locs.get(rule.name.as_str()) {
                Some(first) => {
                    self.errors.push(CompileError::at(
                        rule.loc.clone(),
                        format!(
                            "duplicate rule name '{}' (first defined at {})",
                            rule.name, first
                        ),
                    ));
                }
                None => {
                    rule_locs.insert(rule.name.as_str(), rule.loc.clone());
                }
            }

            let mut bound = Vec::new();
            self.bind_match(&rule.pattern, &known, &mut bound);
            self.bind_replace(&rule.replace, &known, &bound);
        }
    }

    fn bind_match(
        &mut self,
        pattern: &MatchExpr,
        known: &HashMap<&str, &DefineExpr>,
        bound: &mut Vec<String>,
    ) {
        match pattern {
            MatchExpr::Op { name, args, loc } => {
                if let Some(name) = name {
                    match known.get(name.as_str()) {
                        None => {
                            self.errors.push(CompileError::at(
                                loc.clone(),
                                format!("unrecognized operator name '{name}'"),
                            ));
                        }
                        Some(define) => {
                            if args.len() > define.fields.len() {
                                self.errors.push(CompileError::at(
                                    loc.clone(),
                                    format!(
                                        "match pattern for '{}' has {} operands, but '{}' has {} fields",
                                        name,
                                        args.len(),
                                        name,
                                        define.fields.len()
                                    ),
                                ));
                            }
                        }
                    }
                }
                for arg in args {
                    self.bind_match(arg, known, bound);
                }
            }
            MatchExpr::Wildcard { .. } | MatchExpr::Str { .. } => {}
            MatchExpr::Bind { name, target, loc } => {
                if bound.iter().any(|b| b == name) {
                    self.errors.push(CompileError::at(
                        loc.clone(),
                        format!("duplicate binding name '${name}'"),
                    ));
                } else {
                    // Visible from here on, including the rest of its own
                    // conjunction and the replace expression.
                    bound.push(name.clone());
                }
                self.bind_match(target, known, bound);
            }
            MatchExpr::Ref { name, loc } => {
                if !bound.iter().any(|b| b == name) {
                    self.errors.push(CompileError::at(
                        loc.clone(),
                        format!("unrecognized binding name '${name}'"),
                    ));
                }
            }
            MatchExpr::List { kind, .. } => {
                if let Some(element) = kind.element() {
                    self.bind_match(element, known, bound);
                }
            }
            MatchExpr::And { left, right, .. } => {
                self.bind_match(left, known, bound);
                self.bind_match(right, known, bound);
            }
            MatchExpr::Not { target, .. } => {
                self.bind_match(target, known, bound);
            }
            MatchExpr::Invoke { args, .. } => {
                for arg in args {
                    self.bind_match(arg, known, bound);
                }
            }
        }
    }

    fn bind_replace(
        &mut self,
        replace: &ReplaceExpr,
        known: &HashMap<&str, &DefineExpr>,
        bound: &[String],
    ) {
        match replace {
            ReplaceExpr::Construct { name, args, loc } => {
                match known.get(name.as_str()) {
                    None => {
                        self.errors.push(CompileError::at(
                            loc.clone(),
                            format!("unrecognized operator name '{name}'"),
                        ));
                    }
                    Some(define) => {
                        if args.len() != define.fields.len() {
                            self.errors.push(CompileError::at(
                                loc.clone(),
                                format!(
                                    "construction of '{}' has {} operands, but '{}' has {} fields",
                                    name,
                                    args.len(),
                                    name,
                                    define.fields.len()
                                ),
                            ));
                        }
                    }
                }
                for arg in args {
                    self.bind_replace(arg, known, bound);
                }
            }
            ReplaceExpr::Invoke { args, .. } => {
                for arg in args {
                    self.bind_replace(arg, known, bound);
                }
            }
            ReplaceExpr::Ref { name, loc } => {
                if !bound.iter().any(|b| b == name) {
                    self.errors.push(CompileError::at(
                        loc.clone(),
                        format!("unrecognized binding name '${name}'"),
                    ));
                }
            }
            ReplaceExpr::Str { .. } => {}
        }
    }
}

/// Field types are the built-in kinds or any capitalized concrete type
/// name; anything else is a bind error.
fn is_field_type(ty: &str) -> bool {
    ty.chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_one(source: &str) -> (Option<CompiledExpr>, Vec<CompileError>) {
        let source = source.to_string();
        let mut compiler = Compiler::new(["test.opt"]);
        compiler.set_file_resolver(Rc::new(move |_: &str| Ok(source.clone())));
        let compiled = compiler.compile();
        (compiled, compiler.errors())
    }

    #[test]
    fn canonical_form_separates_declarations_with_blank_lines() {
        let (compiled, errors) = compile_one(
            "define True {}\ndefine Select {\n    Input Expr\n    Filter Expr\n}\n\
             [EliminateSelect]\n(Select $input:* (True)) => $input\n",
        );
        assert!(errors.is_empty(), "errors: {errors:?}");
        assert_eq!(
            compiled.unwrap().to_string(),
            "define True {\n}\n\n\
             define Select {\n    Input Expr\n    Filter Expr\n}\n\n\
             [EliminateSelect]\n(Select $input:* (True)) => $input\n"
        );
    }

    #[test]
    fn unreadable_file_aborts_without_accumulating() {
        let mut compiler = Compiler::new(["missing.opt", "other.opt"]);
        compiler.set_file_resolver(Rc::new(|name: &str| {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{name} not found"),
            ))
        }));
        assert!(compiler.compile().is_none());
        let errors = compiler.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("failed to read missing.opt"));
    }

    #[test]
    fn lex_error_skips_file_but_continues_with_next() {
        let sources: HashMap<&str, &str> = HashMap::from([
            ("a.opt", "define Bad { % }"),
            ("b.opt", "define Good {\n    Input Expr\n}\n"),
        ]);
        let sources: HashMap<String, String> = sources
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut compiler = Compiler::new(["a.opt", "b.opt"]);
        compiler.set_file_resolver(Rc::new(move |name: &str| {
            sources
                .get(name)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }));
        assert!(compiler.compile().is_none());
        let errors = compiler.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("unrecognized character '%'"));
        // b.opt still parsed cleanly; the only diagnostic is the lex error.
    }
}
