//! Generator dispatch: the closed set of artifacts optgen can produce,
//! and the lookup table from command to generator function.

pub mod exprs;
pub mod factory;
pub mod ifactory;
pub mod ops;

use std::collections::BTreeMap;

use clap::ValueEnum;
use once_cell::sync::Lazy;

use crate::ast::{FieldExpr, FieldKind};
use crate::compiler::CompiledExpr;

/// The commands optgen accepts. All but `Compile` select a generator;
/// `Compile` is identity mode and emits the IR's own canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Command {
    /// Generate the optgen compiled format
    Compile,
    /// Generate expression definitions and functions
    Exprs,
    /// Generate expression tree creation and normalization functions
    Factory,
    /// Generate the interface for factory construct methods
    Ifactory,
    /// Generate operator definitions and functions
    Ops,
}

/// A generator renders one artifact's text over the IR. Pure and
/// deterministic: the same IR always yields the same bytes.
pub type GenFn = fn(&CompiledExpr, &mut String);

/// The banner every generated artifact starts with.
pub const GENERATED_BANNER: &str = "// Code generated by optgen; DO NOT EDIT.\n\n";

static GENERATORS: Lazy<BTreeMap<Command, GenFn>> = Lazy::new(|| {
    BTreeMap::from([
        (Command::Exprs, exprs::generate as GenFn),
        (Command::Factory, factory::generate as GenFn),
        (Command::Ifactory, ifactory::generate as GenFn),
        (Command::Ops, ops::generate as GenFn),
    ])
});

/// The generator for a command, or `None` for identity mode.
pub fn generator(command: Command) -> Option<GenFn> {
    GENERATORS.get(&command).copied()
}

/// The Rust type a field surfaces as in generated code. Expression
/// operands are memo handles; named types keep their declared name.
pub(crate) fn rust_type(field: &FieldExpr) -> String {
    match field.kind() {
        FieldKind::Expr => "GroupId".to_string(),
        FieldKind::ExprList => "ListId".to_string(),
        FieldKind::Private => "PrivateId".to_string(),
        FieldKind::Named(name) => name,
    }
}

/// Converts a declared name to the snake_case used for generated
/// functions and fields: `InnerJoin` -> `inner_join`, `TableID` ->
/// `table_id`.
pub(crate) fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(*ch);
        }
    }
    out
}

/// The comma-separated parameter list for a define's construct function.
pub(crate) fn param_list(fields: &[FieldExpr]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", snake_case(&f.name), rust_type(f)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The comma-separated argument list matching [`param_list`].
pub(crate) fn arg_list(fields: &[FieldExpr]) -> String {
    fields
        .iter()
        .map(|f| snake_case(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}
