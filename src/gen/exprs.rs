//! Generates the strongly typed expression structs and field accessors.

use crate::compiler::CompiledExpr;
use crate::gen::{arg_list, param_list, rust_type, snake_case};

pub fn generate(compiled: &CompiledExpr, out: &mut String) {
    for (i, define) in compiled.defines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }

        out.push_str(&format!(
            "/// {}Expr is the typed form of the {} operator.\n",
            define.name, define.name
        ));
        if define.fields.is_empty() {
            out.push_str(&format!("pub struct {}Expr;\n\n", define.name));
        } else {
            out.push_str(&format!("pub struct {}Expr {{\n", define.name));
            for field in &define.fields {
                out.push_str(&format!(
                    "    {}: {},\n",
                    snake_case(&field.name),
                    rust_type(field)
                ));
            }
            out.push_str("}\n\n");
        }

        out.push_str(&format!("impl {}Expr {{\n", define.name));
        out.push_str(&format!(
            "    pub fn new({}) -> {}Expr {{\n",
            param_list(&define.fields),
            define.name
        ));
        if define.fields.is_empty() {
            out.push_str(&format!("        {}Expr\n", define.name));
        } else {
            out.push_str(&format!(
                "        {}Expr {{ {} }}\n",
                define.name,
                arg_list(&define.fields)
            ));
        }
        out.push_str("    }\n\n");

        out.push_str("    pub fn op(&self) -> Operator {\n");
        out.push_str(&format!("        Operator::{}\n", define.name));
        out.push_str("    }\n");

        for field in &define.fields {
            out.push_str(&format!(
                "\n    pub fn {}(&self) -> {} {{\n",
                snake_case(&field.name),
                rust_type(field)
            ));
            out.push_str(&format!("        self.{}\n", snake_case(&field.name)));
            out.push_str("    }\n");
        }

        out.push_str("}\n");
    }
}
