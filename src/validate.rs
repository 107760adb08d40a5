//! Structural validation that runs after a successful compile.
//!
//! The language itself allows fields in any order; the generators rely on
//! the convention
//!
//! ```text
//!   Expr*  ExprList?  Private?
//! ```
//!
//! so the check lives here, as a separate pass, instead of in the grammar.

use crate::compiler::CompiledExpr;
use crate::errors::CompileError;

/// Checks every define's field ordering. Unlike the compiler, this pass
/// never stops early: each offending define contributes one error (its
/// first offense), and all defines are scanned.
pub fn check_field_order(compiled: &CompiledExpr) -> Vec<CompileError> {
    let mut errors = Vec::new();

    for define in &compiled.defines {
        for (i, field) in define.fields.iter().enumerate() {
            if field.is_private() && i != define.fields.len() - 1 {
                errors.push(CompileError::at(
                    field.loc.clone(),
                    format!(
                        "private field '{}' is not the last field in '{}'",
                        field.name, define.name
                    ),
                ));
                break;
            }

            if field.is_list() {
                let mut last = define.fields.len() - 1;
                if define.private_field().is_some() {
                    last -= 1;
                }
                if i != last {
                    errors.push(CompileError::at(
                        field.loc.clone(),
                        format!(
                            "list field '{}' is not the last non-private field in '{}'",
                            field.name, define.name
                        ),
                    ));
                    break;
                }
            }
        }
    }

    errors
}
