//! Syntax tree for the optgen language.
//!
//! Every node carries the source location it was parsed from, so later
//! passes can attach precise positions to diagnostics. The `Display`
//! implementations render the canonical textual form of a compiled unit,
//! which is itself valid optgen source (the `compile` command relies on
//! this to round-trip).

use std::fmt;

/// A position in an input file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLoc {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The kind vocabulary a define field's type name maps onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A single sub-expression operand.
    Expr,
    /// An ordered list of sub-expression operands.
    ExprList,
    /// Opaque auxiliary data attached to the operator.
    Private,
    /// A concrete scalar type, referenced by name.
    Named(String),
}

/// One field of a define: `Input Expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    pub name: String,
    pub ty: String,
    pub loc: SourceLoc,
}

impl FieldExpr {
    pub fn kind(&self) -> FieldKind {
        match self.ty.as_str() {
            "Expr" => FieldKind::Expr,
            "ExprList" => FieldKind::ExprList,
            "Private" => FieldKind::Private,
            other => FieldKind::Named(other.to_string()),
        }
    }

    pub fn is_list(&self) -> bool {
        self.ty == "ExprList"
    }

    pub fn is_private(&self) -> bool {
        self.ty == "Private"
    }
}

/// One operator type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineExpr {
    pub name: String,
    pub tags: Vec<String>,
    pub fields: Vec<FieldExpr>,
    pub loc: SourceLoc,
}

impl DefineExpr {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The define's private field, if it declares one.
    pub fn private_field(&self) -> Option<&FieldExpr> {
        self.fields.iter().find(|f| f.is_private())
    }
}

impl fmt::Display for DefineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            writeln!(f, "[{}]", self.tags.join(", "))?;
        }
        writeln!(f, "define {} {{", self.name)?;
        for field in &self.fields {
            writeln!(f, "    {} {}", field.name, field.ty)?;
        }
        write!(f, "}}")
    }
}

/// One rewrite rule. The rule's name is its first tag in source form; the
/// remaining tags are kept in `tags`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleExpr {
    pub name: String,
    pub tags: Vec<String>,
    pub pattern: MatchExpr,
    pub replace: ReplaceExpr,
    pub loc: SourceLoc,
}

impl RuleExpr {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The operator name the rule's pattern is rooted at, when it names one.
    pub fn root_op(&self) -> Option<&str> {
        match &self.pattern {
            MatchExpr::Op {
                name: Some(name), ..
            } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for RuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.name)?;
        for tag in &self.tags {
            write!(f, ", {tag}")?;
        }
        writeln!(f, "]")?;
        write!(f, "{} => {}", self.pattern, self.replace)
    }
}

/// Variants a list pattern `[...]` can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPattern {
    /// `[]` — the list is empty.
    Empty,
    /// `[ ... ]` — any list.
    Any,
    /// `[ p ... ]` — the first element matches `p`.
    First(Box<MatchExpr>),
    /// `[ ... p ]` — the last element matches `p`.
    Last(Box<MatchExpr>),
    /// `[ p ]` — exactly one element, matching `p`.
    Single(Box<MatchExpr>),
}

impl ListPattern {
    /// The element sub-pattern, for the variants that carry one.
    pub fn element(&self) -> Option<&MatchExpr> {
        match self {
            ListPattern::Empty | ListPattern::Any => None,
            ListPattern::First(p) | ListPattern::Last(p) | ListPattern::Single(p) => Some(p),
        }
    }
}

/// A match pattern. The variant set is closed; dispatch over it is always
/// an exhaustive `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchExpr {
    /// `(Name args...)` or `(* args...)`; `name` is `None` for a wildcard
    /// head. Each argument constrains one field of the matched operator.
    Op {
        name: Option<String>,
        args: Vec<MatchExpr>,
        loc: SourceLoc,
    },
    /// `*` in an operand position.
    Wildcard { loc: SourceLoc },
    /// `$name:pattern` — match `pattern` and bind the matched operand.
    Bind {
        name: String,
        target: Box<MatchExpr>,
        loc: SourceLoc,
    },
    /// `$name` — the operand equals an earlier binding.
    Ref { name: String, loc: SourceLoc },
    /// A list pattern.
    List { kind: ListPattern, loc: SourceLoc },
    /// `left & right` — both sides must match.
    And {
        left: Box<MatchExpr>,
        right: Box<MatchExpr>,
        loc: SourceLoc,
    },
    /// `^target` — the operand must not match.
    Not {
        target: Box<MatchExpr>,
        loc: SourceLoc,
    },
    /// `(func args...)` — a custom predicate, external to the compiled unit.
    Invoke {
        func: String,
        args: Vec<MatchExpr>,
        loc: SourceLoc,
    },
    /// A string literal operand.
    Str { value: String, loc: SourceLoc },
}

impl MatchExpr {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            MatchExpr::Op { loc, .. }
            | MatchExpr::Wildcard { loc }
            | MatchExpr::Bind { loc, .. }
            | MatchExpr::Ref { loc, .. }
            | MatchExpr::List { loc, .. }
            | MatchExpr::And { loc, .. }
            | MatchExpr::Not { loc, .. }
            | MatchExpr::Invoke { loc, .. }
            | MatchExpr::Str { loc, .. } => loc,
        }
    }
}

impl fmt::Display for MatchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchExpr::Op { name, args, .. } => {
                write!(f, "({}", name.as_deref().unwrap_or("*"))?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            MatchExpr::Wildcard { .. } => write!(f, "*"),
            MatchExpr::Bind { name, target, .. } => write!(f, "${name}:{target}"),
            MatchExpr::Ref { name, .. } => write!(f, "${name}"),
            MatchExpr::List { kind, .. } => match kind {
                ListPattern::Empty => write!(f, "[]"),
                ListPattern::Any => write!(f, "[ ... ]"),
                ListPattern::First(p) => write!(f, "[ {p} ... ]"),
                ListPattern::Last(p) => write!(f, "[ ... {p} ]"),
                ListPattern::Single(p) => write!(f, "[ {p} ]"),
            },
            MatchExpr::And { left, right, .. } => write!(f, "{left} & {right}"),
            MatchExpr::Not { target, .. } => write!(f, "^{target}"),
            MatchExpr::Invoke { func, args, .. } => {
                write!(f, "({func}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            MatchExpr::Str { value, .. } => write!(f, "\"{}\"", escape_str(value)),
        }
    }
}

/// A replacement expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceExpr {
    /// `(Name args...)` — construct a new instance of a declared operator.
    Construct {
        name: String,
        args: Vec<ReplaceExpr>,
        loc: SourceLoc,
    },
    /// `(func args...)` — a custom replace function.
    Invoke {
        func: String,
        args: Vec<ReplaceExpr>,
        loc: SourceLoc,
    },
    /// `$name` — an operand bound by the rule's match pattern.
    Ref { name: String, loc: SourceLoc },
    /// A string literal.
    Str { value: String, loc: SourceLoc },
}

impl ReplaceExpr {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            ReplaceExpr::Construct { loc, .. }
            | ReplaceExpr::Invoke { loc, .. }
            | ReplaceExpr::Ref { loc, .. }
            | ReplaceExpr::Str { loc, .. } => loc,
        }
    }
}

impl fmt::Display for ReplaceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceExpr::Construct { name, args, .. } => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            ReplaceExpr::Invoke { func, args, .. } => {
                write!(f, "({func}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            ReplaceExpr::Ref { name, .. } => write!(f, "${name}"),
            ReplaceExpr::Str { value, .. } => write!(f, "\"{}\"", escape_str(value)),
        }
    }
}

fn escape_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLoc {
        SourceLoc::new("test.opt", 1, 1)
    }

    #[test]
    fn source_loc_displays_file_line_column() {
        assert_eq!(SourceLoc::new("a.opt", 3, 14).to_string(), "a.opt:3:14");
    }

    #[test]
    fn field_kinds_map_from_type_names() {
        let field = |ty: &str| FieldExpr {
            name: "F".to_string(),
            ty: ty.to_string(),
            loc: loc(),
        };
        assert_eq!(field("Expr").kind(), FieldKind::Expr);
        assert_eq!(field("ExprList").kind(), FieldKind::ExprList);
        assert_eq!(field("Private").kind(), FieldKind::Private);
        assert_eq!(
            field("ColumnID").kind(),
            FieldKind::Named("ColumnID".to_string())
        );
    }

    #[test]
    fn define_renders_canonical_form() {
        let define = DefineExpr {
            name: "Select".to_string(),
            tags: vec!["Relational".to_string()],
            fields: vec![
                FieldExpr {
                    name: "Input".to_string(),
                    ty: "Expr".to_string(),
                    loc: loc(),
                },
                FieldExpr {
                    name: "Filter".to_string(),
                    ty: "Expr".to_string(),
                    loc: loc(),
                },
            ],
            loc: loc(),
        };
        assert_eq!(
            define.to_string(),
            "[Relational]\ndefine Select {\n    Input Expr\n    Filter Expr\n}"
        );
    }

    #[test]
    fn match_renders_nested_patterns() {
        let pattern = MatchExpr::Op {
            name: Some("Select".to_string()),
            args: vec![
                MatchExpr::Bind {
                    name: "input".to_string(),
                    target: Box::new(MatchExpr::Wildcard { loc: loc() }),
                    loc: loc(),
                },
                MatchExpr::Op {
                    name: Some("True".to_string()),
                    args: vec![],
                    loc: loc(),
                },
            ],
            loc: loc(),
        };
        assert_eq!(pattern.to_string(), "(Select $input:* (True))");
    }

    #[test]
    fn list_patterns_render_all_variants() {
        let wild = || Box::new(MatchExpr::Wildcard { loc: loc() });
        let list = |kind| MatchExpr::List { kind, loc: loc() };
        assert_eq!(list(ListPattern::Empty).to_string(), "[]");
        assert_eq!(list(ListPattern::Any).to_string(), "[ ... ]");
        assert_eq!(list(ListPattern::First(wild())).to_string(), "[ * ... ]");
        assert_eq!(list(ListPattern::Last(wild())).to_string(), "[ ... * ]");
        assert_eq!(list(ListPattern::Single(wild())).to_string(), "[ * ]");
    }

    #[test]
    fn string_literals_escape_on_render() {
        let lit = MatchExpr::Str {
            value: "a\"b\\c".to_string(),
            loc: loc(),
        };
        assert_eq!(lit.to_string(), "\"a\\\"b\\\\c\"");
    }
}
