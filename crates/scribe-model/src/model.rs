//! Structural model of a PHP source unit
//!
//! Strict ownership tree: [`SourceUnit`] → [`Namespace`] → [`TypeDecl`] →
//! element maps. Every map is keyed by the element's own name and keeps
//! insertion order, so printing a freshly loaded unit preserves member order.

use crate::name::{self, Scope};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One loaded source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// `declare(strict_types=1);` present
    pub strict_types: bool,
    /// Namespaces keyed by name (`""` is the global namespace)
    pub namespaces: IndexMap<String, Namespace>,
}

impl SourceUnit {
    /// Create empty unit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get namespace, creating it if absent
    pub fn namespace_mut(&mut self, name: &str) -> &mut Namespace {
        let name = name::normalize(name);
        self.namespaces
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name))
    }

    /// Get namespace by name
    #[inline]
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name::normalize(name))
    }

    /// All type declarations across namespaces
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.namespaces.values().flat_map(|ns| ns.types.values())
    }

    /// Find a type declaration by fully-qualified name
    #[must_use]
    pub fn find_type(&self, fqn: &str) -> Option<&TypeDecl> {
        let fqn = name::normalize(fqn);
        self.namespace(name::namespace_of(fqn))?
            .types
            .get(name::short_name(fqn))
    }

    /// Number of type declarations
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.types.len()).sum()
    }
}

/// Kind of a `use` import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImportKind {
    /// Class, interface or trait
    Type,
    /// `use function`
    Function,
    /// `use const`
    Constant,
}

impl ImportKind {
    /// Keyword printed after `use`, if any
    #[inline]
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Type => None,
            Self::Function => Some("function"),
            Self::Constant => Some("const"),
        }
    }
}

/// A `use` import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Imported FQN
    pub name: String,
    /// Local alias
    pub alias: String,
    /// Import kind
    pub kind: ImportKind,
}

impl Import {
    /// Type import under its short name
    #[must_use]
    pub fn new(fqn: &str) -> Self {
        let fqn = name::normalize(fqn);
        Self::aliased(fqn, name::short_name(fqn))
    }

    /// Type import under an explicit alias
    #[must_use]
    pub fn aliased(fqn: &str, alias: &str) -> Self {
        Self {
            name: name::normalize(fqn).to_string(),
            alias: alias.trim().to_string(),
            kind: ImportKind::Type,
        }
    }

    /// Set import kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: ImportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Alias differs from the short name
    #[inline]
    #[must_use]
    pub fn is_aliased(&self) -> bool {
        name::short_name(&self.name) != self.alias
    }
}

/// Namespace with its imports and type declarations
///
/// Class, function and constant imports live in separate tables, so one
/// alias can name a class and a function at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace name (`""` for global)
    pub name: String,
    /// Class imports keyed by local alias
    pub imports: IndexMap<String, Import>,
    /// `use function` imports keyed by local alias
    #[serde(default)]
    pub function_imports: IndexMap<String, Import>,
    /// `use const` imports keyed by local alias
    #[serde(default)]
    pub constant_imports: IndexMap<String, Import>,
    /// Type declarations keyed by short name
    pub types: IndexMap<String, TypeDecl>,
}

impl Namespace {
    /// Create empty namespace
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name::normalize(name).to_string(),
            ..Self::default()
        }
    }

    /// Check if this is the global namespace
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.name.is_empty()
    }

    /// Name-resolution view
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.name, &self.imports)
    }

    /// Resolve a reference to its FQN
    #[inline]
    #[must_use]
    pub fn resolve(&self, raw: &str) -> String {
        self.scope().resolve(raw)
    }

    /// Shorten an FQN for printing
    #[inline]
    #[must_use]
    pub fn shorten(&self, fqn: &str) -> String {
        self.scope().shorten(fqn)
    }

    /// Check whether `fqn` is imported under any alias
    #[inline]
    #[must_use]
    pub fn imports_name(&self, fqn: &str) -> bool {
        self.scope().imported_as(fqn).is_some()
    }

    /// Imports of one kind keyed by alias
    #[inline]
    #[must_use]
    pub fn imports_of(&self, kind: ImportKind) -> &IndexMap<String, Import> {
        match kind {
            ImportKind::Type => &self.imports,
            ImportKind::Function => &self.function_imports,
            ImportKind::Constant => &self.constant_imports,
        }
    }

    /// Every import, class imports first
    pub fn all_imports(&self) -> impl Iterator<Item = &Import> {
        self.imports
            .values()
            .chain(self.function_imports.values())
            .chain(self.constant_imports.values())
    }

    /// Insert import keyed by its alias within its kind's table
    pub fn insert_import(&mut self, import: Import) {
        let table = match import.kind {
            ImportKind::Type => &mut self.imports,
            ImportKind::Function => &mut self.function_imports,
            ImportKind::Constant => &mut self.constant_imports,
        };
        table.insert(import.alias.clone(), import);
    }
}

/// Kind of type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `trait`
    Trait,
}

impl TypeKind {
    /// Declaration keyword
    #[inline]
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
        }
    }
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// `public`
    #[default]
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

impl Visibility {
    /// Parse visibility keyword (`var` counts as public)
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "public" | "var" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    /// Keyword text
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }
}

/// Class, interface or trait declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Declaration kind
    pub kind: TypeKind,
    /// Short name
    pub name: String,
    /// `abstract`, `final`, `readonly`
    pub modifiers: Vec<String>,
    /// Doc comment lines
    pub doc: Vec<String>,
    /// Base types (classes: at most one)
    pub extends: Vec<String>,
    /// Implemented interfaces
    pub implements: Vec<String>,
    /// Trait uses keyed by FQN
    pub traits: IndexMap<String, TraitUse>,
    /// Constants keyed by name
    pub constants: IndexMap<String, Constant>,
    /// Properties keyed by name
    pub properties: IndexMap<String, Property>,
    /// Methods keyed by name
    pub methods: IndexMap<String, Method>,
}

impl TypeDecl {
    /// Create empty declaration
    #[must_use]
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Vec::new(),
            doc: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            traits: IndexMap::new(),
            constants: IndexMap::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    /// Create class declaration
    #[inline]
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, name)
    }

    /// Base class of a class declaration
    #[inline]
    #[must_use]
    pub fn base_type(&self) -> Option<&str> {
        match self.kind {
            TypeKind::Class => self.extends.first().map(String::as_str),
            _ => None,
        }
    }

    /// Check for a modifier keyword
    #[inline]
    #[must_use]
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(modifier))
    }

    /// Re-key every element map by the element's current name
    ///
    /// Needed after an in-place rename so map keys stay unique per name.
    pub fn rekey(&mut self) {
        self.traits = std::mem::take(&mut self.traits)
            .into_values()
            .map(|t| (t.name.clone(), t))
            .collect();
        self.constants = std::mem::take(&mut self.constants)
            .into_values()
            .map(|c| (c.name.clone(), c))
            .collect();
        self.properties = std::mem::take(&mut self.properties)
            .into_values()
            .map(|p| (p.name.clone(), p))
            .collect();
        self.methods = std::mem::take(&mut self.methods)
            .into_values()
            .map(|m| (m.name.clone(), m))
            .collect();
    }

    /// Resolve every class reference against `scope`
    pub fn resolve_references(&mut self, scope: &Scope<'_>) {
        for base in &mut self.extends {
            *base = scope.resolve(base);
        }
        for interface in &mut self.implements {
            *interface = scope.resolve(interface);
        }
        for trait_use in self.traits.values_mut() {
            trait_use.name = scope.resolve(&trait_use.name);
        }
        for property in self.properties.values_mut() {
            if let Some(hint) = &property.type_hint {
                property.type_hint = Some(scope.resolve_type(hint));
            }
        }
        for method in self.methods.values_mut() {
            if let Some(ret) = &method.return_type {
                method.return_type = Some(scope.resolve_type(ret));
            }
        }
        self.traits = std::mem::take(&mut self.traits)
            .into_values()
            .map(|t| (t.name.clone(), t))
            .collect();
    }
}

/// Trait use inside a class or trait body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitUse {
    /// Trait FQN
    pub name: String,
    /// Conflict-resolution statements (`A::x insteadof B;`), kept verbatim
    pub adaptations: Option<String>,
}

impl TraitUse {
    /// Create plain trait use
    #[inline]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name::normalize(name).to_string(),
            adaptations: None,
        }
    }
}

/// Class or trait property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Name without `$`
    pub name: String,
    /// Default value source text
    pub value: Option<String>,
    /// Visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `readonly`
    pub readonly: bool,
    /// Type hint
    pub type_hint: Option<String>,
    /// Doc comment lines
    pub doc: Vec<String>,
}

impl Property {
    /// Create public property without value
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().trim_start_matches('$').to_string(),
            value: None,
            visibility: Visibility::Public,
            is_static: false,
            readonly: false,
            type_hint: None,
            doc: Vec::new(),
        }
    }

    /// Set default value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set visibility
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark static
    #[inline]
    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set type hint
    #[inline]
    #[must_use]
    pub fn with_type(mut self, hint: impl Into<String>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    /// Append doc line
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Value laid out as a multi-line array literal
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.value.as_deref().is_some_and(is_array_layout)
    }
}

/// Class, interface or trait constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    /// Name
    pub name: String,
    /// Value source text
    pub value: String,
    /// Explicit visibility
    pub visibility: Option<Visibility>,
    /// `final`
    pub is_final: bool,
    /// Typed constant hint
    pub type_hint: Option<String>,
    /// Doc comment lines
    pub doc: Vec<String>,
}

impl Constant {
    /// Create constant
    #[must_use]
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            value: value.into(),
            visibility: None,
            is_final: false,
            type_hint: None,
            doc: Vec::new(),
        }
    }

    /// Set visibility
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Append doc line
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Value laid out as a multi-line array literal
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        is_array_layout(&self.value)
    }
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Name
    pub name: String,
    /// Visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `abstract`
    pub is_abstract: bool,
    /// `final`
    pub is_final: bool,
    /// Parameter list text without parentheses
    pub parameters: String,
    /// Return type (class names fully qualified)
    pub return_type: Option<String>,
    /// Body text without braces; `None` for abstract and interface methods
    pub body: Option<String>,
    /// Doc comment lines
    pub doc: Vec<String>,
}

impl Method {
    /// Create public method with an empty body
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            parameters: String::new(),
            return_type: None,
            body: Some(String::new()),
            doc: Vec::new(),
        }
    }

    /// Set visibility
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark static
    #[inline]
    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set parameter list text
    #[inline]
    #[must_use]
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Set return type
    #[inline]
    #[must_use]
    pub fn with_return_type(mut self, ret: &str) -> Self {
        self.return_type = Some(name::map_type(ret, |n| name::normalize(n).to_string()));
        self
    }

    /// Set body text
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Declare without body
    #[inline]
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Mark abstract (drops the body)
    #[inline]
    #[must_use]
    pub fn with_abstract(mut self) -> Self {
        self.is_abstract = true;
        self.body = None;
        self
    }

    /// Append doc line
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }
}

/// First line is `[` and last line is `]`
#[must_use]
pub fn is_array_layout(value: &str) -> bool {
    let mut lines = value.lines();
    let first = lines.next().map(str::trim);
    let last = lines.last().map(str::trim);
    matches!((first, last), (Some("["), Some("]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_find_type() {
        let mut unit = SourceUnit::new();
        unit.namespace_mut("App\\Models")
            .types
            .insert("User".into(), TypeDecl::class("User"));

        assert!(unit.find_type("\\App\\Models\\User").is_some());
        assert!(unit.find_type("App\\User").is_none());
        assert_eq!(unit.type_count(), 1);
    }

    #[test]
    fn import_alias() {
        let import = Import::new("\\Vendor\\Thing");
        assert_eq!(import.name, "Vendor\\Thing");
        assert_eq!(import.alias, "Thing");
        assert!(!import.is_aliased());
        assert!(Import::aliased("Vendor\\Thing", "Other").is_aliased());
    }

    #[test]
    fn array_layout() {
        assert!(is_array_layout("[\n    'a',\n]"));
        assert!(!is_array_layout("['a']"));
        assert!(!is_array_layout("[]"));
        assert!(Property::new("casts").with_value("[\n]").is_array());
        assert!(!Constant::new("A", "1").is_array());
    }

    #[test]
    fn visibility_keywords() {
        assert_eq!(Visibility::from_keyword("var"), Some(Visibility::Public));
        assert_eq!(Visibility::from_keyword("PRIVATE"), Some(Visibility::Private));
        assert_eq!(Visibility::from_keyword("static"), None);
    }

    #[test]
    fn rekey_after_rename() {
        let mut decl = TypeDecl::class("User");
        decl.properties.insert("old".into(), Property::new("old"));
        if let Some(property) = decl.properties.get_mut("old") {
            property.name = "new".into();
        }
        decl.rekey();

        assert!(decl.properties.contains_key("new"));
        assert!(!decl.properties.contains_key("old"));
    }

    #[test]
    fn method_builder() {
        let method = Method::new("user")
            .with_return_type("\\Illuminate\\Database\\Eloquent\\Relations\\BelongsTo")
            .with_body("return $this->belongsTo(User::class);");

        assert_eq!(
            method.return_type.as_deref(),
            Some("Illuminate\\Database\\Eloquent\\Relations\\BelongsTo")
        );
        assert!(method.body.is_some());
        assert!(Method::new("x").with_abstract().body.is_none());
    }

    #[test]
    fn import_kinds_do_not_share_aliases() {
        let mut ns = Namespace::new("App");
        ns.insert_import(Import::new("Util\\helper").with_kind(ImportKind::Function));
        ns.insert_import(Import::new("Lib\\helper"));

        assert_eq!(ns.imports_of(ImportKind::Type)["helper"].name, "Lib\\helper");
        assert_eq!(ns.imports_of(ImportKind::Function)["helper"].name, "Util\\helper");
        assert_eq!(ns.all_imports().count(), 2);
        assert!(ns.imports_name("Lib\\helper"));
        assert!(!ns.imports_name("Util\\helper"));
    }
}
