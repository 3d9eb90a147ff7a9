//! Declarative, idempotent edits over a source unit
//!
//! Every [`Mutation`] has two phases. [`Mutation::check`] inspects the unit
//! and reports conflicts without touching it; [`Mutation::apply`] runs the
//! check and then edits in place. A session checks all of its units before
//! applying to any of them.
//!
//! References that an edit introduces (base types, capabilities,
//! implemented interfaces) are imported into the owning namespace unless
//! they already live there.

use crate::error::{EngineError, EngineResult};
use scribe_model::name;
use scribe_model::{
    Constant, Import, ImportKind, Method, Namespace, Property, SourceUnit, TraitUse, TypeKind,
};
use std::fmt::{self, Display, Formatter};

/// One declarative edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `use <fqn>;` in every namespace
    Import(String),
    /// Trait use in every class and trait
    Capability(String),
    /// Base class for classes, parent interface for interfaces
    BaseType(String),
    /// Implemented interface for classes
    Implement(String),
    /// Property for classes and traits
    Property(Property),
    /// Constant for every type
    Constant(Constant),
    /// Method for every type (bodiless in interfaces)
    Method(Method),
    /// Doc line appended to every type
    Doc(String),
    /// `declare(strict_types=1);` on or off
    StrictTypes(bool),
}

impl Mutation {
    /// Import mutation
    #[inline]
    #[must_use]
    pub fn import(fqn: &str) -> Self {
        Self::Import(name::normalize(fqn).to_string())
    }

    /// Capability (trait use) mutation
    #[inline]
    #[must_use]
    pub fn capability(fqn: &str) -> Self {
        Self::Capability(name::normalize(fqn).to_string())
    }

    /// Base type mutation
    #[inline]
    #[must_use]
    pub fn base_type(fqn: &str) -> Self {
        Self::BaseType(name::normalize(fqn).to_string())
    }

    /// Implemented capability (interface) mutation
    #[inline]
    #[must_use]
    pub fn implement(fqn: &str) -> Self {
        Self::Implement(name::normalize(fqn).to_string())
    }

    /// Check the mutation against `unit` without editing it
    ///
    /// # Errors
    /// - [`EngineError::AmbiguousImport`] when an implied import collides
    /// - [`EngineError::MultipleInheritance`] when a class has another base
    pub fn check(&self, unit: &SourceUnit) -> EngineResult<()> {
        match self {
            Self::Import(fqn) => check_imports(unit, fqn, Reach::All),
            Self::Capability(fqn) => check_imports(unit, fqn, Reach::Kinds(uses_traits)),
            Self::Implement(fqn) => check_imports(unit, fqn, Reach::Kinds(is_class)),
            Self::BaseType(fqn) => {
                check_imports(unit, fqn, Reach::Kinds(has_bases))?;
                check_single_inheritance(unit, fqn)
            }
            Self::Property(_)
            | Self::Constant(_)
            | Self::Method(_)
            | Self::Doc(_)
            | Self::StrictTypes(_) => Ok(()),
        }
    }

    /// Check, then apply the mutation to `unit`
    ///
    /// Returns the number of edits made; `0` means the unit already
    /// satisfied the mutation.
    ///
    /// # Errors
    /// Same as [`Mutation::check`]. The unit is untouched on error.
    pub fn apply(&self, unit: &mut SourceUnit) -> EngineResult<usize> {
        self.check(unit)?;
        let changes = match self {
            Self::Import(fqn) => import_where(unit, fqn, Reach::All),
            Self::Capability(fqn) => add_capability(unit, fqn),
            Self::BaseType(fqn) => set_base_type(unit, fqn),
            Self::Implement(fqn) => add_implemented(unit, fqn),
            Self::Property(property) => add_property(unit, property),
            Self::Constant(constant) => add_constant(unit, constant),
            Self::Method(method) => add_method(unit, method),
            Self::Doc(line) => add_doc(unit, line),
            Self::StrictTypes(on) => {
                let changed = unit.strict_types != *on;
                unit.strict_types = *on;
                usize::from(changed)
            }
        };
        tracing::debug!(mutation = %self, changes, "applied mutation");
        Ok(changes)
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(fqn) => write!(f, "import {fqn}"),
            Self::Capability(fqn) => write!(f, "use {fqn}"),
            Self::BaseType(fqn) => write!(f, "extend {fqn}"),
            Self::Implement(fqn) => write!(f, "implement {fqn}"),
            Self::Property(p) => write!(f, "property ${}", p.name),
            Self::Constant(c) => write!(f, "constant {}", c.name),
            Self::Method(m) => write!(f, "method {}()", m.name),
            Self::Doc(_) => f.write_str("doc line"),
            Self::StrictTypes(on) => write!(f, "strict_types={}", u8::from(*on)),
        }
    }
}

fn uses_traits(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Class | TypeKind::Trait)
}

fn is_class(kind: TypeKind) -> bool {
    kind == TypeKind::Class
}

fn has_bases(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Class | TypeKind::Interface)
}

/// Which namespaces receive an import
#[derive(Clone, Copy)]
enum Reach {
    /// Every namespace
    All,
    /// Namespaces declaring at least one type of a matching kind
    Kinds(fn(TypeKind) -> bool),
}

fn targets(namespace: &Namespace, reach: Reach) -> bool {
    match reach {
        Reach::All => true,
        Reach::Kinds(wants) => namespace.types.values().any(|decl| wants(decl.kind)),
    }
}

fn check_imports(unit: &SourceUnit, fqn: &str, reach: Reach) -> EngineResult<()> {
    unit.namespaces
        .values()
        .filter(|ns| targets(ns, reach))
        .try_for_each(|ns| import_conflict(ns, fqn).map_or(Ok(()), Err))
}

/// Collision that would make importing `fqn` into `namespace` ambiguous
fn import_conflict(namespace: &Namespace, fqn: &str) -> Option<EngineError> {
    if needs_no_import(namespace, fqn) {
        return None;
    }
    let alias = name::short_name(fqn);
    let conflict = |existing: String| {
        EngineError::ambiguous_import(fqn, existing, alias, namespace.name.clone())
    };

    if let Some(import) = namespace
        .imports
        .values()
        .find(|import| import.kind == ImportKind::Type && import.alias.eq_ignore_ascii_case(alias))
    {
        return Some(conflict(import.name.clone()));
    }
    namespace
        .types
        .keys()
        .find(|local| local.eq_ignore_ascii_case(alias))
        .map(|local| conflict(name::join(&namespace.name, local)))
}

fn needs_no_import(namespace: &Namespace, fqn: &str) -> bool {
    name::is_builtin_type(fqn)
        || name::namespace_of(fqn).eq_ignore_ascii_case(&namespace.name)
        || namespace.imports_name(fqn)
}

/// Class names compare without case
fn same_class(a: &str, b: &str) -> bool {
    name::normalize(a).eq_ignore_ascii_case(name::normalize(b))
}

/// Add `use <fqn>;` to target namespaces, returning how many changed
fn import_where(unit: &mut SourceUnit, fqn: &str, reach: Reach) -> usize {
    let mut added = 0;
    for namespace in unit.namespaces.values_mut().filter(|ns| targets(ns, reach)) {
        if needs_no_import(namespace, fqn) {
            tracing::debug!(import = fqn, namespace = %namespace.name, "import not needed");
            continue;
        }
        namespace.insert_import(Import::new(fqn));
        added += 1;
    }
    added
}

fn check_single_inheritance(unit: &SourceUnit, fqn: &str) -> EngineResult<()> {
    for namespace in unit.namespaces.values() {
        for decl in namespace.types.values() {
            let Some(existing) = decl.base_type() else {
                continue;
            };
            if !is_self(&namespace.name, &decl.name, fqn) && !same_class(existing, fqn) {
                return Err(EngineError::multiple_inheritance(
                    name::join(&namespace.name, &decl.name),
                    existing,
                    fqn,
                ));
            }
        }
    }
    Ok(())
}

/// True when the type declared as `type_name` in `namespace` is `fqn`
fn is_self(namespace: &str, type_name: &str, fqn: &str) -> bool {
    name::join(namespace, type_name).eq_ignore_ascii_case(fqn)
}

fn add_capability(unit: &mut SourceUnit, fqn: &str) -> usize {
    let mut changes = import_where(unit, fqn, Reach::Kinds(uses_traits));
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut().filter(|d| uses_traits(d.kind)) {
            if is_self(&namespace.name, &decl.name, fqn)
                || decl.traits.keys().any(|used| same_class(used, fqn))
            {
                continue;
            }
            decl.traits.insert(fqn.to_string(), TraitUse::new(fqn));
            changes += 1;
        }
    }
    changes
}

fn set_base_type(unit: &mut SourceUnit, fqn: &str) -> usize {
    let mut changes = import_where(unit, fqn, Reach::Kinds(has_bases));
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut() {
            if is_self(&namespace.name, &decl.name, fqn) {
                continue;
            }
            let add = match decl.kind {
                TypeKind::Class => decl.extends.is_empty(),
                TypeKind::Interface => !decl.extends.iter().any(|b| same_class(b, fqn)),
                TypeKind::Trait => false,
            };
            if add {
                decl.extends.push(fqn.to_string());
                changes += 1;
            }
        }
    }
    changes
}

fn add_implemented(unit: &mut SourceUnit, fqn: &str) -> usize {
    let mut changes = import_where(unit, fqn, Reach::Kinds(is_class));
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut().filter(|d| is_class(d.kind)) {
            if !decl.implements.iter().any(|i| same_class(i, fqn)) {
                decl.implements.push(fqn.to_string());
                changes += 1;
            }
        }
    }
    changes
}

fn add_property(unit: &mut SourceUnit, property: &Property) -> usize {
    let mut changes = 0;
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut() {
            if decl.kind == TypeKind::Interface || decl.properties.contains_key(&property.name) {
                continue;
            }
            decl.properties.insert(property.name.clone(), property.clone());
            changes += 1;
        }
    }
    changes
}

fn add_constant(unit: &mut SourceUnit, constant: &Constant) -> usize {
    let mut changes = 0;
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut() {
            if decl.constants.contains_key(&constant.name) {
                continue;
            }
            decl.constants.insert(constant.name.clone(), constant.clone());
            changes += 1;
        }
    }
    changes
}

fn add_method(unit: &mut SourceUnit, method: &Method) -> usize {
    let mut changes = 0;
    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut() {
            if decl.methods.contains_key(&method.name) {
                continue;
            }
            let mut added = method.clone();
            if decl.kind == TypeKind::Interface {
                added.body = None;
                added.is_abstract = false;
            }
            decl.methods.insert(added.name.clone(), added);
            changes += 1;
        }
    }
    changes
}

fn add_doc(unit: &mut SourceUnit, line: &str) -> usize {
    let mut changes = 0;
    for decl in unit.namespaces.values_mut().flat_map(|ns| ns.types.values_mut()) {
        decl.doc.push(line.to_string());
        changes += 1;
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_model::{parse_source, print_source, TypeDecl};

    fn unit(source: &str) -> SourceUnit {
        parse_source(source).expect("parse")
    }

    const MODEL: &str = "<?php\n\nnamespace App;\n\nuse Baz\\Bar;\n\nclass User\n{\n}\n";

    #[test]
    fn import_idempotent() {
        let mut unit = unit(MODEL);
        assert_eq!(Mutation::import("Foo\\Thing").apply(&mut unit).expect("first"), 1);
        assert_eq!(Mutation::import("\\Foo\\Thing").apply(&mut unit).expect("second"), 0);
        assert_eq!(unit.namespace("App").map(|ns| ns.imports.len()), Some(2));
    }

    #[test]
    fn import_same_namespace_skipped() {
        let mut unit = unit(MODEL);
        assert_eq!(Mutation::import("App\\Post").apply(&mut unit).expect("apply"), 0);
    }

    #[test]
    fn import_ambiguous_alias() {
        let mut unit = unit(MODEL);
        let err = Mutation::import("Foo\\Bar").apply(&mut unit).unwrap_err();

        match err {
            EngineError::AmbiguousImport { existing, alias, namespace, .. } => {
                assert_eq!(existing, "Baz\\Bar");
                assert_eq!(alias, "Bar");
                assert_eq!(namespace, "App");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(unit.namespace("App").map(|ns| ns.imports.len()), Some(1));
    }

    #[test]
    fn import_collides_with_local_type() {
        let mut unit = unit(MODEL);
        let err = Mutation::import("Other\\User").apply(&mut unit).unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousImport { existing, .. } if existing == "App\\User"));
    }

    #[test]
    fn capability_imports_and_uses() {
        let mut unit = unit(MODEL);
        let mutation = Mutation::capability("Vendor\\Traitable");
        assert_eq!(mutation.apply(&mut unit).expect("apply"), 2);
        assert_eq!(mutation.apply(&mut unit).expect("again"), 0);

        let printed = print_source(&unit);
        assert!(printed.contains("use Vendor\\Traitable;\n"));
        assert!(printed.contains("    use Traitable;\n"));
    }

    #[test]
    fn capability_skips_interfaces() {
        let mut unit = unit("<?php\n\nnamespace App;\n\ninterface Shape\n{\n}\n");
        assert_eq!(Mutation::capability("Vendor\\Traitable").apply(&mut unit).expect("apply"), 0);
        assert!(unit.namespace("App").is_some_and(|ns| ns.imports.is_empty()));
    }

    #[test]
    fn base_type_single_inheritance() {
        let mut unit = unit(MODEL);
        assert_eq!(Mutation::base_type("Vendor\\A").apply(&mut unit).expect("first"), 2);
        assert_eq!(Mutation::base_type("Vendor\\A").apply(&mut unit).expect("again"), 0);

        let err = Mutation::base_type("Vendor\\B").apply(&mut unit).unwrap_err();
        match err {
            EngineError::MultipleInheritance { type_name, existing, requested } => {
                assert_eq!(type_name, "App\\User");
                assert_eq!(existing, "Vendor\\A");
                assert_eq!(requested, "Vendor\\B");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!unit.namespace("App").is_some_and(|ns| ns.imports.contains_key("B")));
    }

    #[test]
    fn interfaces_extend_many() {
        let mut unit = unit("<?php\n\nnamespace App;\n\ninterface Shape extends \\Countable\n{\n}\n");
        Mutation::base_type("Vendor\\Drawable").apply(&mut unit).expect("apply");

        let decl = unit.find_type("App\\Shape").expect("type");
        assert_eq!(decl.extends, vec!["Countable", "Vendor\\Drawable"]);
    }

    #[test]
    fn implement_classes_only() {
        let mut unit = unit(MODEL);
        unit.namespace_mut("App")
            .types
            .insert("Shape".into(), TypeDecl::new(TypeKind::Interface, "Shape"));

        Mutation::implement("\\JsonSerializable").apply(&mut unit).expect("apply");
        Mutation::implement("JsonSerializable").apply(&mut unit).expect("again");

        assert_eq!(
            unit.find_type("App\\User").map(|d| d.implements.clone()),
            Some(vec!["JsonSerializable".to_string()])
        );
        assert!(unit.find_type("App\\Shape").is_some_and(|d| d.implements.is_empty()));
    }

    #[test]
    fn members_insert_if_absent() {
        let mut unit = unit(MODEL);
        let property = Property::new("$table").with_value("'users'");
        assert_eq!(Mutation::Property(property.clone()).apply(&mut unit).expect("apply"), 1);

        let changed = Property::new("table").with_value("'people'");
        assert_eq!(Mutation::Property(changed).apply(&mut unit).expect("again"), 0);
        assert_eq!(
            unit.find_type("App\\User").and_then(|d| d.properties.get("table")),
            Some(&property)
        );
    }

    #[test]
    fn interface_methods_have_no_body() {
        let mut unit = unit("<?php\n\nnamespace App;\n\ninterface Shape\n{\n}\n");
        let method = Method::new("area").with_return_type("float").with_body("return 0.0;");
        Mutation::Method(method).apply(&mut unit).expect("apply");

        let printed = print_source(&unit);
        assert!(printed.contains("    public function area(): float;\n"));
    }

    #[test]
    fn strict_types_and_doc() {
        let mut unit = unit(MODEL);
        assert_eq!(Mutation::StrictTypes(true).apply(&mut unit).expect("apply"), 1);
        assert_eq!(Mutation::StrictTypes(true).apply(&mut unit).expect("again"), 0);
        Mutation::Doc("@property int $id".into()).apply(&mut unit).expect("doc");

        let printed = print_source(&unit);
        assert!(printed.contains("declare(strict_types=1);"));
        assert!(printed.contains(" * @property int $id\n"));
    }

    #[test]
    fn import_case_variant_is_same_class() {
        let mut unit = unit("<?php\n\nnamespace App;\n\nuse Vendor\\Traitable;\n\nclass User\n{\n    use Traitable;\n}\n");

        assert_eq!(Mutation::capability("vendor\\traitable").apply(&mut unit).expect("apply"), 0);
        assert_eq!(Mutation::import("VENDOR\\TRAITABLE").apply(&mut unit).expect("import"), 0);
        assert_eq!(Mutation::implement("\\app\\contract").apply(&mut unit).expect("implement"), 1);
        assert_eq!(Mutation::implement("App\\Contract").apply(&mut unit).expect("again"), 0);

        let ns = unit.namespace("App").expect("namespace");
        assert_eq!(ns.imports.len(), 1);
        assert_eq!(ns.types["User"].traits.len(), 1);
        assert_eq!(ns.types["User"].implements, ["app\\contract"]);
    }

    #[test]
    fn class_import_leaves_function_import() {
        let mut unit = unit("<?php\n\nnamespace App;\n\nuse function Util\\helper;\n\nclass User\n{\n}\n");

        assert_eq!(Mutation::import("Lib\\helper").apply(&mut unit).expect("apply"), 1);

        let ns = unit.namespace("App").expect("namespace");
        assert_eq!(ns.function_imports["helper"].name, "Util\\helper");
        assert_eq!(ns.imports["helper"].name, "Lib\\helper");
        let printed = print_source(&unit);
        assert!(printed.contains("use Lib\\helper;\nuse function Util\\helper;\n"));
    }
}
