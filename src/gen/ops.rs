//! Generates the operator enumeration and its metadata tables.

use crate::compiler::CompiledExpr;
use crate::gen::snake_case;

pub fn generate(compiled: &CompiledExpr, out: &mut String) {
    out.push_str("/// Operator enumerates every defined operator type.\n");
    out.push_str("#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]\n");
    out.push_str("pub enum Operator {\n");
    out.push_str("    Unknown,\n");
    for define in &compiled.defines {
        out.push_str(&format!("    {},\n", define.name));
    }
    out.push_str("}\n\n");

    out.push_str("pub const ALL_OPERATORS: &[Operator] = &[\n");
    for define in &compiled.defines {
        out.push_str(&format!("    Operator::{},\n", define.name));
    }
    out.push_str("];\n\n");

    out.push_str("impl Operator {\n");
    out.push_str("    pub fn name(&self) -> &'static str {\n");
    out.push_str("        match self {\n");
    out.push_str("            Operator::Unknown => \"unknown\",\n");
    for define in &compiled.defines {
        out.push_str(&format!(
            "            Operator::{} => \"{}\",\n",
            define.name,
            snake_case(&define.name)
        ));
    }
    out.push_str("        }\n");
    out.push_str("    }\n\n");

    out.push_str("    pub fn from_name(name: &str) -> Operator {\n");
    out.push_str("        match name {\n");
    for define in &compiled.defines {
        out.push_str(&format!(
            "            \"{}\" => Operator::{},\n",
            snake_case(&define.name),
            define.name
        ));
    }
    out.push_str("            _ => Operator::Unknown,\n");
    out.push_str("        }\n");
    out.push_str("    }\n");

    for tag in collect_tags(compiled) {
        let members: Vec<String> = compiled
            .defines
            .iter()
            .filter(|d| d.has_tag(&tag))
            .map(|d| format!("Operator::{}", d.name))
            .collect();
        out.push_str(&format!(
            "\n    pub fn is_{}(&self) -> bool {{\n",
            snake_case(&tag)
        ));
        out.push_str(&format!("        matches!(self, {})\n", members.join(" | ")));
        out.push_str("    }\n");
    }

    out.push_str("}\n");
}

/// Define tags in first-appearance order, deduplicated.
fn collect_tags(compiled: &CompiledExpr) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for define in &compiled.defines {
        for tag in &define.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags
}
