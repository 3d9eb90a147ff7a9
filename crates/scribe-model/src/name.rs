//! Qualified names for addressing PHP symbols
//!
//! Names are stored fully qualified and without the leading separator:
//! `Illuminate\Database\Eloquent\Model`. [`Scope`] resolves source-level
//! references into that form and shortens them again for printing.

use crate::model::{Import, ImportKind};
use indexmap::IndexMap;

/// Namespace separator
pub const SEPARATOR: char = '\\';

/// Type keywords that never resolve against a namespace
const BUILTIN_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "parent", "self", "static", "string", "true", "void",
];

/// Strip surrounding whitespace and the leading separator
#[inline]
#[must_use]
pub fn normalize(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix(SEPARATOR).unwrap_or(name)
}

/// Last segment of a qualified name
///
/// # Examples
/// - `Vendor\Pkg\Thing` → `Thing`
/// - `Thing` → `Thing`
#[inline]
#[must_use]
pub fn short_name(name: &str) -> &str {
    let name = normalize(name);
    name.rsplit_once(SEPARATOR).map_or(name, |(_, short)| short)
}

/// Namespace part of a qualified name (empty for global names)
#[inline]
#[must_use]
pub fn namespace_of(name: &str) -> &str {
    normalize(name)
        .rsplit_once(SEPARATOR)
        .map_or("", |(namespace, _)| namespace)
}

/// Join a namespace and a relative name
#[must_use]
pub fn join(namespace: &str, name: &str) -> String {
    let namespace = normalize(namespace);
    let name = normalize(name);
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{SEPARATOR}{name}")
    }
}

/// Check whether a name is a builtin type keyword
#[inline]
#[must_use]
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES
        .iter()
        .any(|builtin| builtin.eq_ignore_ascii_case(name.trim()))
}

/// Apply `f` to every name inside a type expression
///
/// Nullable markers, unions, intersections and parentheses are kept;
/// whitespace is dropped. `?Foo` with `f = upper` becomes `?FOO`.
pub fn map_type(expr: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut current = String::new();

    for ch in expr.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == SEPARATOR {
            current.push(ch);
            continue;
        }
        if !current.is_empty() {
            out.push_str(&f(&current));
            current.clear();
        }
        if !ch.is_whitespace() {
            out.push(ch);
        }
    }
    if !current.is_empty() {
        out.push_str(&f(&current));
    }
    out
}

/// Name-resolution view over one namespace
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    namespace: &'a str,
    imports: &'a IndexMap<String, Import>,
}

impl<'a> Scope<'a> {
    /// Create scope over a namespace name and its imports
    #[inline]
    #[must_use]
    pub fn new(namespace: &'a str, imports: &'a IndexMap<String, Import>) -> Self {
        Self { namespace, imports }
    }

    /// Resolve a class reference written in this namespace to its FQN
    #[must_use]
    pub fn resolve(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(absolute) = raw.strip_prefix(SEPARATOR) {
            return absolute.to_string();
        }
        if is_builtin_type(raw) {
            return raw.to_string();
        }
        let relative = raw
            .get(..10)
            .filter(|prefix| prefix.eq_ignore_ascii_case("namespace\\"))
            .and_then(|_| raw.get(10..));
        if let Some(relative) = relative {
            return join(self.namespace, relative);
        }

        let (first, rest) = match raw.split_once(SEPARATOR) {
            Some((first, rest)) => (first, Some(rest)),
            None => (raw, None),
        };
        match self.type_import(first) {
            Some(import) => match rest {
                Some(rest) => join(&import.name, rest),
                None => import.name.clone(),
            },
            None => join(self.namespace, raw),
        }
    }

    /// Shortest reference to `fqn` that resolves back to it in this namespace
    #[must_use]
    pub fn shorten(&self, fqn: &str) -> String {
        let fqn = normalize(fqn);
        if is_builtin_type(fqn) {
            return fqn.to_string();
        }
        if let Some(import) = self.imported_as(fqn) {
            return import.alias.clone();
        }

        let short = short_name(fqn);
        if namespace_of(fqn) == self.namespace && self.type_import(short).is_none() {
            return short.to_string();
        }

        // Reference through an imported parent namespace
        let via_prefix = self.imports.values().find_map(|import| {
            let rest = fqn.strip_prefix(import.name.as_str())?.strip_prefix(SEPARATOR)?;
            (import.kind == ImportKind::Type).then(|| format!("{}{SEPARATOR}{rest}", import.alias))
        });
        via_prefix.unwrap_or_else(|| format!("{SEPARATOR}{fqn}"))
    }

    /// Resolve every name in a type expression
    #[must_use]
    pub fn resolve_type(&self, expr: &str) -> String {
        map_type(expr, |name| self.resolve(name))
    }

    /// Shorten every name in a type expression
    #[must_use]
    pub fn shorten_type(&self, expr: &str) -> String {
        map_type(expr, |name| self.shorten(name))
    }

    /// Type import registered under `alias`
    #[inline]
    #[must_use]
    pub fn type_import(&self, alias: &str) -> Option<&'a Import> {
        self.imports
            .get(alias)
            .filter(|import| import.kind == ImportKind::Type)
    }

    /// Type import whose target is `fqn` (class names ignore case)
    #[inline]
    #[must_use]
    pub fn imported_as(&self, fqn: &str) -> Option<&'a Import> {
        let fqn = normalize(fqn);
        self.imports
            .values()
            .find(|import| import.kind == ImportKind::Type && import.name.eq_ignore_ascii_case(fqn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(entries: &[(&str, &str)]) -> IndexMap<String, Import> {
        entries
            .iter()
            .map(|(name, alias)| ((*alias).to_string(), Import::aliased(*name, *alias)))
            .collect()
    }

    #[test]
    fn short_and_namespace() {
        assert_eq!(short_name("\\Vendor\\Pkg\\Thing"), "Thing");
        assert_eq!(short_name("Thing"), "Thing");
        assert_eq!(namespace_of("Vendor\\Pkg\\Thing"), "Vendor\\Pkg");
        assert_eq!(namespace_of("Thing"), "");
    }

    #[test]
    fn join_global() {
        assert_eq!(join("", "Thing"), "Thing");
        assert_eq!(join("App", "\\Thing"), "App\\Thing");
    }

    #[test]
    fn builtin_case_insensitive() {
        assert!(is_builtin_type("array"));
        assert!(is_builtin_type("Self"));
        assert!(!is_builtin_type("Model"));
    }

    #[test]
    fn resolve_forms() {
        let imports = imports(&[
            ("Illuminate\\Database\\Eloquent\\Model", "Model"),
            ("Illuminate\\Database\\Eloquent\\Relations", "Relations"),
        ]);
        let scope = Scope::new("App\\Models", &imports);

        assert_eq!(scope.resolve("Model"), "Illuminate\\Database\\Eloquent\\Model");
        assert_eq!(
            scope.resolve("Relations\\BelongsTo"),
            "Illuminate\\Database\\Eloquent\\Relations\\BelongsTo"
        );
        assert_eq!(scope.resolve("\\JsonSerializable"), "JsonSerializable");
        assert_eq!(scope.resolve("User"), "App\\Models\\User");
        assert_eq!(scope.resolve("namespace\\Sub\\Post"), "App\\Models\\Sub\\Post");
        assert_eq!(scope.resolve("static"), "static");
    }

    #[test]
    fn shorten_forms() {
        let imports = imports(&[
            ("Illuminate\\Database\\Eloquent\\Model", "Model"),
            ("Other\\User", "Member"),
            ("Illuminate\\Database\\Eloquent\\Relations", "Relations"),
        ]);
        let scope = Scope::new("App\\Models", &imports);

        assert_eq!(scope.shorten("Illuminate\\Database\\Eloquent\\Model"), "Model");
        assert_eq!(scope.shorten("Other\\User"), "Member");
        assert_eq!(scope.shorten("App\\Models\\Post"), "Post");
        assert_eq!(scope.shorten("JsonSerializable"), "\\JsonSerializable");
        assert_eq!(
            scope.shorten("Illuminate\\Database\\Eloquent\\Relations\\HasMany"),
            "Relations\\HasMany"
        );
    }

    #[test]
    fn shorten_shadowed_by_alias() {
        let imports = imports(&[("Other\\Post", "Post")]);
        let scope = Scope::new("App", &imports);

        assert_eq!(scope.shorten("App\\Post"), "\\App\\Post");
    }

    #[test]
    fn type_expressions() {
        let imports = imports(&[("Carbon\\Carbon", "Carbon")]);
        let scope = Scope::new("App", &imports);

        assert_eq!(scope.resolve_type("?Carbon"), "?Carbon\\Carbon");
        assert_eq!(scope.resolve_type("int | Carbon"), "int|Carbon\\Carbon");
        assert_eq!(scope.shorten_type("?Carbon\\Carbon"), "?Carbon");
        assert_eq!(scope.shorten_type("App\\User|null"), "User|null");
    }

    #[test]
    fn imported_name_ignores_case() {
        let imports = imports(&[("Vendor\\Traitable", "Traitable")]);
        let scope = Scope::new("App", &imports);

        assert!(scope.imported_as("vendor\\traitable").is_some());
        assert_eq!(scope.shorten("VENDOR\\Traitable"), "Traitable");
    }
}
