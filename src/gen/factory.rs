//! Generates the concrete construction-and-normalization functions.
//!
//! Each construct function tries, in declaration order, every rule rooted
//! at its operator before falling through to plain memoization. The match
//! and apply hooks are implemented by the handwritten factory core.

use crate::compiler::CompiledExpr;
use crate::gen::{arg_list, param_list, snake_case};

pub fn generate(compiled: &CompiledExpr, out: &mut String) {
    out.push_str("impl Factory {\n");
    for (i, define) in compiled.defines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let name = snake_case(&define.name);
        let params = param_list(&define.fields);
        let args = arg_list(&define.fields);

        out.push_str(&format!(
            "    /// Builds a normalized {} expression.\n",
            define.name
        ));
        if params.is_empty() {
            out.push_str(&format!(
                "    pub fn construct_{name}(&mut self) -> GroupId {{\n"
            ));
        } else {
            out.push_str(&format!(
                "    pub fn construct_{name}(&mut self, {params}) -> GroupId {{\n"
            ));
        }

        for rule in compiled.rules_for(&define.name) {
            let rule_fn = snake_case(&rule.name);
            out.push_str(&format!("        // [{}]\n", rule.name));
            out.push_str(&format!("        // {} => {}\n", rule.pattern, rule.replace));
            out.push_str(&format!(
                "        if self.match_{rule_fn}({args}) {{\n"
            ));
            out.push_str(&format!(
                "            return self.apply_{rule_fn}({args});\n"
            ));
            out.push_str("        }\n\n");
        }

        out.push_str(&format!("        self.memoize_{name}({args})\n"));
        out.push_str("    }\n");
    }
    out.push_str("}\n");
}
