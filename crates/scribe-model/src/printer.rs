//! Canonical printer: [`SourceUnit`] → PHP text
//!
//! Layout is fixed: `<?php`, optional strict-types declare, namespace line,
//! sorted imports, then type declarations with Allman braces. Printing a
//! freshly parsed unit reaches a fixed point after one pass.

use crate::model::{Constant, Method, Namespace, Property, SourceUnit, TraitUse, TypeDecl};
use crate::name::Scope;
use crate::verbatim::{self, LineMark};

/// Wrappers that make a member fragment parse as a script
const BODY_PREFIX: &str = "<?php\n";
const VALUE_PREFIX: &str = "<?php\n$_ = ";

/// Default indentation width
pub const DEFAULT_INDENT: usize = 4;

/// Serializer for source units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printer {
    indent: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create printer with default indentation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }

    /// Set indentation width in spaces
    #[inline]
    #[must_use]
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    /// Indentation width
    #[inline]
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Print unit as source text
    #[must_use]
    pub fn print(&self, unit: &SourceUnit) -> String {
        let mut blocks = vec!["<?php".to_string()];
        if unit.strict_types {
            blocks.push("declare(strict_types=1);".to_string());
        }

        let braced = unit.namespaces.len() > 1 && unit.namespaces.contains_key("");
        for namespace in unit.namespaces.values() {
            let body = self.namespace_blocks(namespace);
            if braced {
                let header = if namespace.is_global() {
                    "namespace {".to_string()
                } else {
                    format!("namespace {} {{", namespace.name)
                };
                let mut block = header;
                for part in &body {
                    block.push_str("\n\n");
                    block.push_str(part);
                }
                block.push_str("\n\n}");
                blocks.push(block);
            } else {
                if !namespace.is_global() {
                    blocks.push(format!("namespace {};", namespace.name));
                }
                blocks.extend(body);
            }
        }

        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }

    fn namespace_blocks(&self, namespace: &Namespace) -> Vec<String> {
        let mut blocks = Vec::new();

        let mut imports: Vec<_> = namespace.all_imports().collect();
        imports.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.to_ascii_lowercase().cmp(&b.name.to_ascii_lowercase()))
        });
        if !imports.is_empty() {
            let lines: Vec<String> = imports
                .iter()
                .map(|import| {
                    let keyword = import.kind.keyword().map(|k| format!("{k} ")).unwrap_or_default();
                    if import.is_aliased() {
                        format!("use {keyword}{} as {};", import.name, import.alias)
                    } else {
                        format!("use {keyword}{};", import.name)
                    }
                })
                .collect();
            blocks.push(lines.join("\n"));
        }

        let scope = namespace.scope();
        blocks.extend(namespace.types.values().map(|decl| self.type_decl(&scope, decl)));
        blocks
    }

    fn type_decl(&self, scope: &Scope<'_>, decl: &TypeDecl) -> String {
        let mut out = doc_block(&decl.doc, "");

        let mut header: Vec<String> = decl.modifiers.clone();
        header.push(decl.kind.keyword().to_string());
        header.push(decl.name.clone());
        if !decl.extends.is_empty() {
            header.push(format!("extends {}", shorten_list(scope, &decl.extends)));
        }
        if !decl.implements.is_empty() {
            header.push(format!("implements {}", shorten_list(scope, &decl.implements)));
        }
        out.push_str(&header.join(" "));
        out.push_str("\n{\n");

        let pad = " ".repeat(self.indent);
        let mut members = Vec::new();
        if !decl.traits.is_empty() {
            let uses: Vec<String> = decl
                .traits
                .values()
                .map(|t| self.trait_use(scope, t, &pad))
                .collect();
            members.push(uses.join("\n"));
        }
        members.extend(decl.constants.values().map(|c| self.constant(c, &pad)));
        members.extend(decl.properties.values().map(|p| self.property(scope, p, &pad)));
        members.extend(decl.methods.values().map(|m| self.method(scope, m, &pad)));

        if !members.is_empty() {
            out.push_str(&members.join("\n\n"));
            out.push('\n');
        }
        out.push('}');
        out
    }

    fn trait_use(&self, scope: &Scope<'_>, trait_use: &TraitUse, pad: &str) -> String {
        let name = scope.shorten(&trait_use.name);
        match &trait_use.adaptations {
            Some(block) => {
                let inner = indent_lines(block, &pad.repeat(2), &[]);
                if inner.is_empty() {
                    format!("{pad}use {name} {{\n{pad}}}")
                } else {
                    format!("{pad}use {name} {{\n{inner}\n{pad}}}")
                }
            }
            None => format!("{pad}use {name};"),
        }
    }

    fn constant(&self, constant: &Constant, pad: &str) -> String {
        let mut out = doc_block(&constant.doc, pad);
        out.push_str(pad);
        if constant.is_final {
            out.push_str("final ");
        }
        if let Some(visibility) = constant.visibility {
            out.push_str(visibility.as_str());
            out.push(' ');
        }
        out.push_str("const ");
        if let Some(hint) = &constant.type_hint {
            out.push_str(hint);
            out.push(' ');
        }
        out.push_str(&constant.name);
        out.push_str(" = ");
        out.push_str(&continue_lines(&constant.value, pad));
        out.push(';');
        out
    }

    fn property(&self, scope: &Scope<'_>, property: &Property, pad: &str) -> String {
        let mut out = doc_block(&property.doc, pad);
        out.push_str(pad);
        out.push_str(property.visibility.as_str());
        if property.is_static {
            out.push_str(" static");
        }
        if property.readonly {
            out.push_str(" readonly");
        }
        if let Some(hint) = &property.type_hint {
            out.push(' ');
            out.push_str(&scope.shorten_type(hint));
        }
        out.push_str(" $");
        out.push_str(&property.name);
        if let Some(value) = &property.value {
            out.push_str(" = ");
            out.push_str(&continue_lines(value, pad));
        }
        out.push(';');
        out
    }

    fn method(&self, scope: &Scope<'_>, method: &Method, pad: &str) -> String {
        let mut out = doc_block(&method.doc, pad);
        out.push_str(pad);
        if method.is_final {
            out.push_str("final ");
        }
        if method.is_abstract {
            out.push_str("abstract ");
        }
        out.push_str(method.visibility.as_str());
        if method.is_static {
            out.push_str(" static");
        }
        out.push_str(" function ");
        out.push_str(&method.name);
        out.push('(');
        out.push_str(&method.parameters);
        out.push(')');
        if let Some(ret) = &method.return_type {
            out.push_str(": ");
            out.push_str(&scope.shorten_type(ret));
        }

        match &method.body {
            None => out.push(';'),
            Some(body) => {
                out.push('\n');
                out.push_str(pad);
                out.push_str("{\n");
                let body = body.trim_matches('\n');
                let marks = verbatim::fragment_marks(BODY_PREFIX, body, "\n");
                let inner = indent_lines(body, &pad.repeat(2), &marks);
                if !inner.is_empty() {
                    out.push_str(&inner);
                    out.push('\n');
                }
                out.push_str(pad);
                out.push('}');
            }
        }
        out
    }
}

fn shorten_list(scope: &Scope<'_>, names: &[String]) -> String {
    names
        .iter()
        .map(|n| scope.shorten(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `/** ... */` block followed by a newline, empty for no doc
fn doc_block(doc: &[String], pad: &str) -> String {
    if doc.is_empty() {
        return String::new();
    }
    let mut out = format!("{pad}/**\n");
    for line in doc {
        if line.is_empty() {
            out.push_str(&format!("{pad} *\n"));
        } else {
            out.push_str(&format!("{pad} * {line}\n"));
        }
    }
    out.push_str(&format!("{pad} */\n"));
    out
}

/// Prefix every non-empty line outside string literals
fn indent_lines(text: &str, pad: &str, marks: &[LineMark]) -> String {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let mark = marks.get(i).copied().unwrap_or_default();
            let line = verbatim::line_end(line, mark);
            if mark.opens_inside || line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the first line in place, indent continuation lines
fn continue_lines(value: &str, pad: &str) -> String {
    let marks = verbatim::fragment_marks(VALUE_PREFIX, value, ";\n");
    let mut lines = value.split('\n');
    let mut out = lines.next().unwrap_or("").to_string();
    for (i, line) in lines.enumerate() {
        let mark = marks.get(i + 1).copied().unwrap_or_default();
        let line = verbatim::line_end(line, mark);
        out.push('\n');
        if mark.opens_inside {
            out.push_str(line);
        } else if !line.trim().is_empty() {
            out.push_str(pad);
            out.push_str(line);
        }
    }
    out
}

/// Print with the default printer
#[must_use]
pub fn print_source(unit: &SourceUnit) -> String {
    Printer::new().print(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Import, TypeKind, Visibility};
    use pretty_assertions::assert_eq;

    fn sample() -> SourceUnit {
        let mut unit = SourceUnit::new();
        unit.strict_types = true;
        let ns = unit.namespace_mut("App\\Models");
        ns.insert_import(Import::new("Vendor\\Traitable"));
        ns.insert_import(Import::new("Illuminate\\Database\\Eloquent\\Model"));

        let mut decl = TypeDecl::class("User");
        decl.doc.push("Class User".into());
        decl.extends.push("Illuminate\\Database\\Eloquent\\Model".into());
        decl.traits
            .insert("Vendor\\Traitable".into(), TraitUse::new("Vendor\\Traitable"));
        decl.properties.insert(
            "table".into(),
            Property::new("table")
                .with_visibility(Visibility::Protected)
                .with_value("'users'"),
        );
        decl.methods.insert(
            "posts".into(),
            Method::new("posts")
                .with_return_type("App\\Models\\HasMany")
                .with_body("return $this->hasMany(Post::class);"),
        );
        ns.types.insert("User".into(), decl);
        unit
    }

    #[test]
    fn print_layout() {
        let expected = "<?php

declare(strict_types=1);

namespace App\\Models;

use Illuminate\\Database\\Eloquent\\Model;
use Vendor\\Traitable;

/**
 * Class User
 */
class User extends Model
{
    use Traitable;

    protected $table = 'users';

    public function posts(): HasMany
    {
        return $this->hasMany(Post::class);
    }
}
";
        assert_eq!(Printer::new().print(&sample()), expected);
    }

    #[test]
    fn print_indent_width() {
        let out = Printer::new().with_indent(2).print(&sample());
        assert!(out.contains("\n  use Traitable;\n"));
        assert!(out.contains("\n    return $this->hasMany(Post::class);\n"));
        assert!(!out.contains('\t'));
    }

    #[test]
    fn print_abstract_and_empty() {
        let mut unit = SourceUnit::new();
        let mut decl = TypeDecl::new(TypeKind::Interface, "Shape");
        decl.methods
            .insert("area".into(), Method::new("area").with_return_type("float").without_body());
        unit.namespace_mut("").types.insert("Shape".into(), decl);
        unit.namespace_mut("")
            .types
            .insert("Empty".into(), TypeDecl::class("Empty"));

        let out = print_source(&unit);
        assert!(out.contains("interface Shape\n{\n    public function area(): float;\n}"));
        assert!(out.contains("class Empty\n{\n}"));
    }

    #[test]
    fn print_multiline_value() {
        let mut unit = SourceUnit::new();
        let mut decl = TypeDecl::class("T");
        decl.properties.insert(
            "casts".into(),
            Property::new("casts").with_value("[\n    'id' => 'int',\n]"),
        );
        unit.namespace_mut("").types.insert("T".into(), decl);

        let out = print_source(&unit);
        assert!(out.contains("    public $casts = [\n        'id' => 'int',\n    ];"));
    }

    #[test]
    fn print_braced_with_global() {
        let mut unit = SourceUnit::new();
        unit.namespace_mut("").types.insert("A".into(), TypeDecl::class("A"));
        unit.namespace_mut("Lib").types.insert("B".into(), TypeDecl::class("B"));

        let out = print_source(&unit);
        assert!(out.contains("namespace {\n\nclass A\n{\n}\n\n}"));
        assert!(out.contains("namespace Lib {\n\nclass B\n{\n}\n\n}"));
    }

    #[test]
    fn print_aliased_import() {
        let mut unit = SourceUnit::new();
        unit.namespace_mut("App")
            .insert_import(Import::aliased("Other\\User", "Member"));
        assert!(print_source(&unit).contains("use Other\\User as Member;"));
    }

    #[test]
    fn print_keeps_multiline_strings() {
        let mut unit = SourceUnit::new();
        let mut decl = TypeDecl::class("Q");
        decl.properties.insert(
            "q".into(),
            Property::new("q").with_value("'line1\nline2'"),
        );
        decl.methods.insert(
            "sql".into(),
            Method::new("sql").with_body("$q = <<<SQL\n  SELECT *\n  SQL;\nreturn $q;"),
        );
        unit.namespace_mut("").types.insert("Q".into(), decl);

        let out = print_source(&unit);
        assert!(out.contains("    public $q = 'line1\nline2';\n"));
        assert!(out.contains("        $q = <<<SQL\n  SELECT *\n  SQL;\n        return $q;\n"));
    }
}
