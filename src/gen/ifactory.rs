//! Generates the abstract construction interface the factory implements.

use crate::compiler::CompiledExpr;
use crate::gen::{param_list, snake_case};

pub fn generate(compiled: &CompiledExpr, out: &mut String) {
    out.push_str("/// Factory is implemented by any type able to build normalized\n");
    out.push_str("/// expression trees, one construct method per defined operator.\n");
    out.push_str("pub trait Factory {\n");
    for (i, define) in compiled.defines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "    /// Constructs a {} operator expression.\n",
            define.name
        ));
        if define.fields.is_empty() {
            out.push_str(&format!(
                "    fn construct_{}(&mut self) -> GroupId;\n",
                snake_case(&define.name)
            ));
        } else {
            out.push_str(&format!(
                "    fn construct_{}(&mut self, {}) -> GroupId;\n",
                snake_case(&define.name),
                param_list(&define.fields)
            ));
        }
    }
    out.push_str("}\n");
}
