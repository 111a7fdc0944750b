//! Serialization of the generated module: header followed by the four sections.

use std::io::{self, Write};

use crate::assemble::Sections;

/// Identifies the generated file and declares what it pulls into scope.
#[derive(Debug, Clone)]
pub struct Header {
    /// Arguments the generator was invoked with.
    pub invocation: Vec<String>,
    pub contract: String,
    /// Display form of the file the trait was declared in.
    pub source: String,
    /// Module name to declare the generated file under, when written to a file.
    pub module_name: Option<String>,
    /// Foreign modules referenced by the sections, spelled from the generated module.
    pub imports: Vec<String>,
}

impl Header {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let invocation = std::iter::once("middlewarer")
            .chain(self.invocation.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "// Code generated by \"{invocation}\"; DO NOT EDIT.\n"
        ));
        out.push_str(&format!(
            "// Middleware wrapper for trait `{}` declared in {}.\n",
            self.contract, self.source
        ));
        if let Some(module_name) = &self.module_name {
            out.push_str(&format!(
                "// Declare it next to the trait with `mod {module_name};`.\n"
            ));
        }
        out.push_str("#![allow(clippy::type_complexity)]\n\n");
        out.push_str("use super::*;\n");
        for import in &self.imports {
            out.push_str(&format!("use {import};\n"));
        }
        out
    }
}

/// Writes the header and the sections in their fixed order, separated by blank lines.
pub fn emit(w: &mut dyn Write, header: &Header, sections: &Sections) -> io::Result<()> {
    w.write_all(emit_to_string(header, sections).as_bytes())
}

/// The text [`emit`] writes.
pub fn emit_to_string(header: &Header, sections: &Sections) -> String {
    let mut out = header.render();
    for section in sections.ordered() {
        out.push('\n');
        out.push_str(section);
    }
    out
}
