//! Source loader: PHP text → [`SourceUnit`]
//!
//! Parses with the tree-sitter PHP grammar and walks the syntax tree.
//! Declaration structure comes from the tree; member details (modifiers,
//! aliases, default values) are read from the node text between well-known
//! child nodes.

use crate::error::{ModelError, ModelResult};
use crate::model::{
    Constant, Import, ImportKind, Method, Property, SourceUnit, TraitUse, TypeDecl, TypeKind,
    Visibility,
};
use crate::name::{self, Scope};
use crate::verbatim::{self, LineMark};
use std::ops::Range;
use tree_sitter::Node;

/// Parse PHP source text into a structural model
///
/// Tabs outside string literals are expanded to four spaces before parsing.
/// References to classes (base types, interfaces, traits, return and
/// property types) are stored fully qualified.
///
/// # Errors
/// Returns [`ModelError::Syntax`] for invalid input and
/// [`ModelError::Unsupported`] for constructs outside the model (free
/// functions, top-level statements, enums, attributes, inline HTML).
pub fn parse_source(source: &str) -> ModelResult<SourceUnit> {
    let mut parser = php_parser()?;
    let mut tree = parser.parse(source, None).ok_or(ModelError::ParseFailed)?;
    let mut literals = verbatim::literal_ranges(tree.root_node());

    let expanded = verbatim::expand_tabs(source, &literals);
    if let Some(expanded) = &expanded {
        tree = parser.parse(expanded, None).ok_or(ModelError::ParseFailed)?;
        literals = verbatim::literal_ranges(tree.root_node());
    }
    let text = expanded.as_deref().unwrap_or(source);

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root).map_or((1, 1), position);
        return Err(ModelError::Syntax { line, column });
    }

    let mut loader = Loader::new(text, literals);
    for node in named_children(root) {
        loader.statement(node)?;
    }
    Ok(loader.finish())
}

/// Parser loaded with the PHP grammar
pub(crate) fn php_parser() -> ModelResult<tree_sitter::Parser> {
    let language: tree_sitter::Language = tree_sitter_php::LANGUAGE_PHP.into();
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ModelError::ParserInit(e.to_string()))?;
    Ok(parser)
}

/// Tree walker accumulating the unit
struct Loader<'s> {
    source: &'s str,
    /// Byte ranges of string literals in `source`
    literals: Vec<Range<usize>>,
    unit: SourceUnit,
    /// Namespace receiving declarations
    namespace: String,
    /// Pending doc comment for the next declaration
    doc: Vec<String>,
}

impl<'s> Loader<'s> {
    fn new(source: &'s str, literals: Vec<Range<usize>>) -> Self {
        Self {
            source,
            literals,
            unit: SourceUnit::new(),
            namespace: String::new(),
            doc: Vec::new(),
        }
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn between(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Name and normalized value of a `name = value` element
    fn value_of(&self, element: Node<'_>) -> Option<(&'s str, String)> {
        let text = self.text(element);
        let (name, value) = text.split_once('=')?;
        let offset = element.start_byte() + name.len() + 1;
        Some((name, self.normalize_value(value, offset)))
    }

    /// Trim the first line, dedent continuation lines
    fn normalize_value(&self, text: &str, offset: usize) -> String {
        let leading = text.len() - text.trim_start().len();
        let text = text.trim();
        let marks = verbatim::line_marks(text, offset + leading, &self.literals);
        dedent_continuation(text, &marks)
    }

    /// Block text between the braces, dedented
    fn block_body(&self, block: Node<'_>) -> String {
        let (start, end) = (block.start_byte(), block.end_byte());
        let text = self.text(block);
        let (offset, inner) = if text.starts_with('{') && text.ends_with('}') && end > start + 1 {
            (start + 1, self.between(start + 1, end - 1))
        } else {
            (start, text)
        };
        dedent_block(inner, &verbatim::line_marks(inner, offset, &self.literals))
    }

    fn statement(&mut self, node: Node<'_>) -> ModelResult<()> {
        match node.kind() {
            "php_tag" | "empty_statement" => {}
            "comment" => {
                if let Some(doc) = doc_lines(self.text(node)) {
                    self.doc = doc;
                }
            }
            "declare_statement" => self.declare(node)?,
            "namespace_definition" => self.namespace(node)?,
            "namespace_use_declaration" => {
                self.doc.clear();
                let imports = parse_imports(self.text(node));
                let namespace = self.unit.namespace_mut(&self.namespace);
                for import in imports {
                    namespace.insert_import(import);
                }
            }
            "class_declaration" | "interface_declaration" | "trait_declaration" => {
                self.type_decl(node)?;
            }
            "text_interpolation" if self.text(node).trim() == "?>" => {}
            _ => return Err(unsupported(node)),
        }
        Ok(())
    }

    fn declare(&mut self, node: Node<'_>) -> ModelResult<()> {
        let compact: String = self
            .text(node)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if !compact.contains("strict_types=") {
            return Err(unsupported(node));
        }
        self.unit.strict_types = compact.contains("strict_types=1");
        Ok(())
    }

    fn namespace(&mut self, node: Node<'_>) -> ModelResult<()> {
        self.doc.clear();
        let name = node
            .child_by_field_name("name")
            .map(|n| name::normalize(self.text(n)).to_string())
            .unwrap_or_default();
        self.unit.namespace_mut(&name);

        match node.child_by_field_name("body") {
            Some(body) => {
                let outer = std::mem::replace(&mut self.namespace, name);
                for child in named_children(body) {
                    self.statement(child)?;
                }
                self.namespace = outer;
            }
            None => self.namespace = name,
        }
        Ok(())
    }

    fn type_decl(&mut self, node: Node<'_>) -> ModelResult<()> {
        reject_attributes(node)?;
        let kind = match node.kind() {
            "class_declaration" => TypeKind::Class,
            "interface_declaration" => TypeKind::Interface,
            _ => TypeKind::Trait,
        };
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| unsupported(node))?;
        let header = self.between(node.start_byte(), body.start_byte());
        let mut decl = parse_header(kind, header).ok_or_else(|| unsupported(node))?;
        decl.doc = std::mem::take(&mut self.doc);

        self.members(&mut decl, body)?;
        self.unit
            .namespace_mut(&self.namespace)
            .types
            .insert(decl.name.clone(), decl);
        Ok(())
    }

    fn members(&self, decl: &mut TypeDecl, body: Node<'_>) -> ModelResult<()> {
        let mut doc = Vec::new();
        for member in named_children(body) {
            match member.kind() {
                "comment" => {
                    if let Some(lines) = doc_lines(self.text(member)) {
                        doc = lines;
                    }
                }
                "use_declaration" => {
                    doc.clear();
                    for trait_use in parse_trait_use(self.text(member)) {
                        decl.traits.insert(trait_use.name.clone(), trait_use);
                    }
                }
                "const_declaration" => self.constants(decl, member, std::mem::take(&mut doc))?,
                "property_declaration" => {
                    self.properties(decl, member, std::mem::take(&mut doc))?;
                }
                "method_declaration" => self.method(decl, member, std::mem::take(&mut doc))?,
                _ => return Err(unsupported(member)),
            }
        }
        Ok(())
    }

    fn constants(&self, decl: &mut TypeDecl, node: Node<'_>, mut doc: Vec<String>) -> ModelResult<()> {
        reject_attributes(node)?;
        let elements: Vec<Node<'_>> = named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "const_element")
            .collect();
        let first = elements.first().ok_or_else(|| unsupported(node))?;

        let mut visibility = None;
        let mut is_final = false;
        let mut hint = Vec::new();
        for token in self.between(node.start_byte(), first.start_byte()).split_whitespace() {
            if token.eq_ignore_ascii_case("const") {
                continue;
            }
            if token.eq_ignore_ascii_case("final") {
                is_final = true;
            } else if let Some(v) = Visibility::from_keyword(token) {
                visibility = Some(v);
            } else {
                hint.push(token);
            }
        }

        for &element in &elements {
            let (name, value) = self.value_of(element).ok_or_else(|| unsupported(element))?;
            let mut constant = Constant::new(name, value);
            constant.visibility = visibility;
            constant.is_final = is_final;
            constant.type_hint = (!hint.is_empty()).then(|| hint.concat());
            constant.doc = std::mem::take(&mut doc);
            decl.constants.insert(constant.name.clone(), constant);
        }
        Ok(())
    }

    fn properties(&self, decl: &mut TypeDecl, node: Node<'_>, mut doc: Vec<String>) -> ModelResult<()> {
        reject_attributes(node)?;
        let elements: Vec<Node<'_>> = named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "property_element")
            .collect();
        let first = elements.first().ok_or_else(|| unsupported(node))?;

        let mut template = Property::new("");
        let mut hint = Vec::new();
        for token in self.between(node.start_byte(), first.start_byte()).split_whitespace() {
            if let Some(v) = Visibility::from_keyword(token) {
                template.visibility = v;
            } else if token.eq_ignore_ascii_case("static") {
                template.is_static = true;
            } else if token.eq_ignore_ascii_case("readonly") {
                template.readonly = true;
            } else {
                hint.push(token);
            }
        }
        template.type_hint = (!hint.is_empty()).then(|| hint.concat());

        for &element in &elements {
            let (name, value) = match self.value_of(element) {
                Some((name, value)) => (name, Some(value)),
                None => (self.text(element), None),
            };
            let mut property = Property::new(name);
            property.value = value;
            property.visibility = template.visibility;
            property.is_static = template.is_static;
            property.readonly = template.readonly;
            property.type_hint.clone_from(&template.type_hint);
            property.doc = std::mem::take(&mut doc);
            decl.properties.insert(property.name.clone(), property);
        }
        Ok(())
    }

    fn method(&self, decl: &mut TypeDecl, node: Node<'_>, doc: Vec<String>) -> ModelResult<()> {
        reject_attributes(node)?;
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| unsupported(node))?;
        let params = node
            .child_by_field_name("parameters")
            .ok_or_else(|| unsupported(node))?;
        let body = node.child_by_field_name("body");

        let mut method = Method::new(self.text(name_node)).without_body();
        for token in self.between(node.start_byte(), name_node.start_byte()).split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "function" => {}
                "static" => method.is_static = true,
                "abstract" => method.is_abstract = true,
                "final" => method.is_final = true,
                "&" => {
                    return Err(ModelError::unsupported("by-reference method", position(node).0));
                }
                keyword => {
                    method.visibility =
                        Visibility::from_keyword(keyword).ok_or_else(|| unsupported(node))?;
                }
            }
        }

        method.parameters =
            normalize_parameters(self.text(params), params.start_byte(), &self.literals);
        let tail_end = body.map_or(node.end_byte(), |b| b.start_byte());
        let tail = self
            .between(params.end_byte(), tail_end)
            .trim()
            .trim_end_matches(';')
            .trim();
        method.return_type = tail
            .strip_prefix(':')
            .map(|ret| ret.trim().to_string())
            .filter(|ret| !ret.is_empty());
        method.body = body.map(|b| self.block_body(b));
        method.doc = doc;

        decl.methods.insert(method.name.clone(), method);
        Ok(())
    }

    fn finish(mut self) -> SourceUnit {
        for namespace in self.unit.namespaces.values_mut() {
            let scope = Scope::new(&namespace.name, &namespace.imports);
            for decl in namespace.types.values_mut() {
                decl.resolve_references(&scope);
            }
        }
        self.unit
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// First ERROR or MISSING node in document order
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// 1-based (line, column)
fn position(node: Node<'_>) -> (usize, usize) {
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}

fn unsupported(node: Node<'_>) -> ModelError {
    let construct = match node.kind() {
        "function_definition" => "free function",
        "enum_declaration" => "enum",
        "attribute_list" => "attribute",
        "text" | "text_interpolation" => "inline HTML",
        "declare_statement" => "declare directive",
        other => other,
    };
    ModelError::unsupported(construct, position(node).0)
}

fn reject_attributes(node: Node<'_>) -> ModelResult<()> {
    match named_children(node)
        .into_iter()
        .find(|child| child.kind() == "attribute_list")
    {
        Some(attribute) => Err(unsupported(attribute)),
        None => Ok(()),
    }
}

/// Type header: modifiers, keyword, name, `extends`, `implements`
fn parse_header(kind: TypeKind, header: &str) -> Option<TypeDecl> {
    #[derive(Clone, Copy)]
    enum Clause {
        None,
        Extends,
        Implements,
    }

    let spaced = header.replace(',', " , ");
    let mut tokens = spaced.split_whitespace();
    let mut modifiers = Vec::new();
    loop {
        let token = tokens.next()?;
        if token.eq_ignore_ascii_case(kind.keyword()) {
            break;
        }
        modifiers.push(token.to_ascii_lowercase());
    }

    let mut decl = TypeDecl::new(kind, tokens.next()?);
    decl.modifiers = modifiers;

    let mut clause = Clause::None;
    for token in tokens {
        if token.eq_ignore_ascii_case("extends") {
            clause = Clause::Extends;
        } else if token.eq_ignore_ascii_case("implements") {
            clause = Clause::Implements;
        } else if token != "," {
            match clause {
                Clause::Extends => decl.extends.push(token.to_string()),
                Clause::Implements => decl.implements.push(token.to_string()),
                Clause::None => return None,
            }
        }
    }
    Some(decl)
}

/// `use A\B;`, `use A\B as C, D;`, `use function f;`, `use A\{B, C as D};`
fn parse_imports(text: &str) -> Vec<Import> {
    let body = text.trim();
    let body = body
        .strip_prefix("use")
        .unwrap_or(body)
        .trim()
        .trim_end_matches(';')
        .trim();
    let (kind, body) = split_kind(body, ImportKind::Type);

    match body.find('{') {
        Some(open) => {
            let prefix = body[..open].trim().trim_end_matches(name::SEPARATOR);
            strip_braces(&body[open..])
                .split(',')
                .filter_map(|clause| {
                    let (kind, clause) = split_kind(clause.trim(), kind);
                    import_clause(kind, Some(prefix), clause)
                })
                .collect()
        }
        None => body
            .split(',')
            .filter_map(|clause| import_clause(kind, None, clause))
            .collect(),
    }
}

fn split_kind(text: &str, default: ImportKind) -> (ImportKind, &str) {
    let mut parts = text.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some(word), Some(rest)) if word.eq_ignore_ascii_case("function") => {
            (ImportKind::Function, rest.trim())
        }
        (Some(word), Some(rest)) if word.eq_ignore_ascii_case("const") => {
            (ImportKind::Constant, rest.trim())
        }
        _ => (default, text),
    }
}

fn import_clause(kind: ImportKind, prefix: Option<&str>, clause: &str) -> Option<Import> {
    let mut tokens = clause.split_whitespace();
    let target = tokens.next()?;
    let alias = match (tokens.next(), tokens.next()) {
        (Some(keyword), Some(alias)) if keyword.eq_ignore_ascii_case("as") => Some(alias),
        _ => None,
    };

    let fqn = prefix.map_or_else(
        || name::normalize(target).to_string(),
        |prefix| name::join(prefix, target),
    );
    let alias = alias.unwrap_or_else(|| name::short_name(&fqn));
    Some(Import::aliased(&fqn, alias).with_kind(kind))
}

/// `use A, B;` or `use A, B { A::x insteadof B; }` inside a type body
fn parse_trait_use(text: &str) -> Vec<TraitUse> {
    let body = text.trim();
    let body = body.strip_prefix("use").unwrap_or(body);
    let (names, block) = match body.find('{') {
        Some(open) => (&body[..open], Some(&body[open..])),
        None => (body.trim_end().trim_end_matches(';'), None),
    };

    // Names stay raw here; resolution happens once all imports are known
    let mut uses: Vec<TraitUse> = names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| TraitUse {
            name: n.to_string(),
            adaptations: None,
        })
        .collect();
    if let (Some(block), Some(last)) = (block, uses.last_mut()) {
        last.adaptations = Some(dedent_block(strip_braces(block), &[]));
    }
    uses
}

/// Lines of a `/** ... */` comment, `None` for other comments
fn doc_lines(comment: &str) -> Option<Vec<String>> {
    let inner = comment.trim().strip_prefix("/**")?.strip_suffix("*/")?;
    let mut lines: Vec<String> = inner
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
        })
        .collect();
    while lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    Some(lines)
}

fn strip_braces(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Drop blank edge lines and the common indentation
///
/// Lines opening inside a string literal are kept byte for byte.
fn dedent_block(text: &str, marks: &[LineMark]) -> String {
    let mut lines = marked_lines(text, marks);
    while lines.first().is_some_and(|(l, m)| l.is_empty() && !m.opens_inside) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|(l, m)| l.is_empty() && !m.opens_inside) {
        lines.pop();
    }
    join_dedented(&lines, common_indent(&lines))
}

/// Dedent every line but the first, which is kept as is
fn dedent_continuation(text: &str, marks: &[LineMark]) -> String {
    let lines = marked_lines(text, marks);
    let Some(((first, _), rest)) = lines.split_first() else {
        return String::new();
    };
    let mut out = (*first).to_string();
    if !rest.is_empty() {
        out.push('\n');
        out.push_str(&join_dedented(rest, common_indent(rest)));
    }
    out
}

fn marked_lines<'t>(text: &'t str, marks: &[LineMark]) -> Vec<(&'t str, LineMark)> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let mark = marks.get(i).copied().unwrap_or_default();
            (verbatim::line_end(line, mark), mark)
        })
        .collect()
}

/// Smallest indentation over lines that may move
fn common_indent(lines: &[(&str, LineMark)]) -> usize {
    lines
        .iter()
        .filter(|(l, m)| !l.is_empty() && !m.opens_inside)
        .map(|(l, _)| leading_spaces(l))
        .min()
        .unwrap_or(0)
}

fn join_dedented(lines: &[(&str, LineMark)], indent: usize) -> String {
    lines
        .iter()
        .map(|(line, mark)| verbatim::strip_indent(line, *mark, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse whitespace outside literals and drop a trailing comma
fn normalize_parameters(text: &str, offset: usize, literals: &[Range<usize>]) -> String {
    let (offset, inner) = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (offset + 1, inner),
        None => (offset, text),
    };
    let mut out = String::with_capacity(inner.len());
    let mut gap = false;
    for (i, ch) in inner.char_indices() {
        if ch.is_whitespace() && !verbatim::in_literal(literals, offset + i) {
            gap = true;
            continue;
        }
        if gap && !out.is_empty() && !out.ends_with('(') && ch != ')' {
            out.push(' ');
        }
        gap = false;
        out.push(ch);
    }
    out.trim_end_matches(',').trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Model;
use Illuminate\Database\Eloquent\SoftDeletes as Deletes;

/**
 * Class User
 */
class User extends Model implements \JsonSerializable
{
    use Deletes;

    const TABLE = 'users';

    /**
     * @var array
     */
    protected $casts = [
            'id' => 'int',
        ];

    public $timestamps = false;

    public function posts(): HasMany
    {
        return $this->hasMany(Post::class);
    }
}
";

    #[test]
    fn parse_namespace_and_imports() {
        let unit = parse_source(MODEL).expect("parse");
        let ns = unit.namespace("App\\Models").expect("namespace");

        assert_eq!(ns.imports.len(), 2);
        assert_eq!(ns.imports["Deletes"].name, "Illuminate\\Database\\Eloquent\\SoftDeletes");
        assert!(ns.imports_name("Illuminate\\Database\\Eloquent\\Model"));
    }

    #[test]
    fn parse_class_references_resolved() {
        let unit = parse_source(MODEL).expect("parse");
        let user = unit.find_type("App\\Models\\User").expect("class");

        assert_eq!(user.doc, vec!["Class User".to_string()]);
        assert_eq!(user.base_type(), Some("Illuminate\\Database\\Eloquent\\Model"));
        assert_eq!(user.implements, vec!["JsonSerializable".to_string()]);
        assert!(user.traits.contains_key("Illuminate\\Database\\Eloquent\\SoftDeletes"));
        assert_eq!(
            user.methods["posts"].return_type.as_deref(),
            Some("App\\Models\\HasMany")
        );
    }

    #[test]
    fn parse_members() {
        let unit = parse_source(MODEL).expect("parse");
        let user = unit.find_type("App\\Models\\User").expect("class");

        assert_eq!(user.constants["TABLE"].value, "'users'");
        let casts = &user.properties["casts"];
        assert_eq!(casts.visibility, Visibility::Protected);
        assert_eq!(casts.value.as_deref(), Some("[\n    'id' => 'int',\n]"));
        assert!(casts.is_array());
        assert_eq!(casts.doc, vec!["@var array".to_string()]);
        assert_eq!(user.properties["timestamps"].value.as_deref(), Some("false"));
        assert_eq!(
            user.methods["posts"].body.as_deref(),
            Some("return $this->hasMany(Post::class);")
        );
    }

    #[test]
    fn parse_strict_types_global() {
        let unit = parse_source("<?php\ndeclare(strict_types=1);\n\ninterface Shape\n{\n    public function area(): float;\n}\n")
            .expect("parse");

        assert!(unit.strict_types);
        let shape = unit.find_type("Shape").expect("interface");
        assert_eq!(shape.kind, TypeKind::Interface);
        assert!(shape.methods["area"].body.is_none());
        assert_eq!(shape.methods["area"].return_type.as_deref(), Some("float"));
    }

    #[test]
    fn parse_group_import() {
        let imports = parse_imports("use Vendor\\Pkg\\{Alpha, Beta as B, function helper};");

        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].name, "Vendor\\Pkg\\Alpha");
        assert_eq!(imports[1].alias, "B");
        assert_eq!(imports[2].kind, ImportKind::Function);
        assert_eq!(imports[2].name, "Vendor\\Pkg\\helper");
    }

    #[test]
    fn trait_adaptations_kept() {
        let uses = parse_trait_use("use A, B {\n        A::hello insteadof B;\n    }");

        assert_eq!(uses.len(), 2);
        assert!(uses[0].adaptations.is_none());
        assert_eq!(uses[1].adaptations.as_deref(), Some("A::hello insteadof B;"));
    }

    #[test]
    fn syntax_error_position() {
        let err = parse_source("<?php\nclass Broken\n{\n    public function x( {\n}\n").unwrap_err();
        assert!(matches!(err, ModelError::Syntax { .. }));
    }

    #[test]
    fn free_function_rejected() {
        let err = parse_source("<?php\nfunction helper() {}\n").unwrap_err();
        assert_eq!(err, ModelError::unsupported("free function", 2));
    }

    #[test]
    fn parameters_normalized() {
        assert_eq!(
            normalize_parameters("(\n    int $a,\n    string $b,\n)", 0, &[]),
            "int $a, string $b"
        );
        assert_eq!(normalize_parameters("()", 0, &[]), "");
        assert_eq!(normalize_parameters("( array $x = array( 1 ) )", 0, &[]), "array $x = array(1)");
    }

    #[test]
    fn tabs_expanded() {
        let unit = parse_source("<?php\nclass T\n{\n\tpublic function f()\n\t{\n\t\treturn 1;\n\t}\n}\n")
            .expect("parse");
        let t = unit.find_type("T").expect("class");
        assert_eq!(t.methods["f"].body.as_deref(), Some("return 1;"));
    }

    #[test]
    fn multiline_string_in_body_kept() {
        let unit = parse_source(
            "<?php\nclass Q\n{\n    public function sql()\n    {\n        return 'SELECT *\nFROM users';\n    }\n}\n",
        )
        .expect("parse");
        let q = unit.find_type("Q").expect("class");

        assert_eq!(q.methods["sql"].body.as_deref(), Some("return 'SELECT *\nFROM users';"));
    }

    #[test]
    fn multiline_string_value_kept() {
        let unit = parse_source("<?php\nclass Q\n{\n    public $q = 'line1  \n    line2';\n}\n")
            .expect("parse");
        let q = unit.find_type("Q").expect("class");

        assert_eq!(q.properties["q"].value.as_deref(), Some("'line1  \n    line2'"));
    }

    #[test]
    fn string_whitespace_in_parameters_kept() {
        let unit = parse_source("<?php\nclass Q\n{\n    public function f($sep = 'a  b',\n        $tab = \"\t\")\n    {\n    }\n}\n")
            .expect("parse");
        let q = unit.find_type("Q").expect("class");

        assert_eq!(q.methods["f"].parameters, "$sep = 'a  b', $tab = \"\t\"");
    }

    #[test]
    fn function_and_class_imports_coexist() {
        let unit = parse_source("<?php\nnamespace App;\n\nuse function Util\\helper;\nuse Lib\\helper;\n")
            .expect("parse");
        let ns = unit.namespace("App").expect("namespace");

        assert_eq!(ns.imports["helper"].name, "Lib\\helper");
        assert_eq!(ns.function_imports["helper"].name, "Util\\helper");
    }
}
