//! Generic locate-and-transform over construct kinds
//!
//! [`find`] walks every type declaration of a unit and hands out exclusive
//! references to matching elements. [`modify`] runs a transform over them
//! and restores the model invariants afterwards: element maps are re-keyed
//! by the new names and renamed class references are imported. A rename
//! onto a sibling's name is rejected and the unit is left as it was.

use crate::error::{EngineError, EngineResult};
use scribe_model::name::{self, SEPARATOR};
use scribe_model::{Constant, Import, Method, Namespace, Property, SourceUnit, TraitUse, TypeDecl};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Kind of element addressed by find/modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    /// Property
    Property,
    /// Constant
    Constant,
    /// Trait use
    CapabilityUse,
    /// `extends` entry
    BaseType,
    /// `implements` entry
    ImplementedCapability,
    /// Method
    Method,
}

impl ConstructKind {
    /// Canonical name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Constant => "constant",
            Self::CapabilityUse => "capability_use",
            Self::BaseType => "base_type",
            Self::ImplementedCapability => "implemented_capability",
            Self::Method => "method",
        }
    }

    /// Element is a class reference rather than a member
    #[inline]
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::CapabilityUse | Self::BaseType | Self::ImplementedCapability
        )
    }
}

impl FromStr for ConstructKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "property" | "properties" => Ok(Self::Property),
            "constant" | "const" => Ok(Self::Constant),
            "capability_use" | "capability" | "trait" | "use" | "mixin" => Ok(Self::CapabilityUse),
            "base_type" | "base" | "extend" | "extends" | "parent" => Ok(Self::BaseType),
            "implemented_capability" | "implement" | "implements" | "interface" => {
                Ok(Self::ImplementedCapability)
            }
            "method" | "function" => Ok(Self::Method),
            _ => Err(EngineError::UnsupportedConstruct(s.trim().to_string())),
        }
    }
}

impl Display for ConstructKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive reference to one located element
#[derive(Debug)]
pub enum ElementMut<'a> {
    /// Property
    Property(&'a mut Property),
    /// Constant
    Constant(&'a mut Constant),
    /// Trait use
    CapabilityUse(&'a mut TraitUse),
    /// `extends` entry (FQN)
    BaseType(&'a mut String),
    /// `implements` entry (FQN)
    ImplementedCapability(&'a mut String),
    /// Method
    Method(&'a mut Method),
}

impl ElementMut<'_> {
    /// Kind of the element
    #[must_use]
    pub fn kind(&self) -> ConstructKind {
        match self {
            Self::Property(_) => ConstructKind::Property,
            Self::Constant(_) => ConstructKind::Constant,
            Self::CapabilityUse(_) => ConstructKind::CapabilityUse,
            Self::BaseType(_) => ConstructKind::BaseType,
            Self::ImplementedCapability(_) => ConstructKind::ImplementedCapability,
            Self::Method(_) => ConstructKind::Method,
        }
    }

    /// Current element name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Property(p) => &p.name,
            Self::Constant(c) => &c.name,
            Self::CapabilityUse(t) => &t.name,
            Self::BaseType(n) | Self::ImplementedCapability(n) => n,
            Self::Method(m) => &m.name,
        }
    }
}

/// A matching element and where it lives
#[derive(Debug)]
pub struct Located<'a> {
    /// Owning namespace
    pub namespace: &'a str,
    /// Owning type's short name
    pub type_name: &'a str,
    /// The element
    pub element: ElementMut<'a>,
}

/// Does `candidate` answer to `query` for this kind
fn answers_to(kind: ConstructKind, candidate: &str, query: &str) -> bool {
    let query = query.trim();
    match kind {
        ConstructKind::Property => candidate == query.trim_start_matches('$'),
        ConstructKind::Constant => candidate == query,
        ConstructKind::Method => candidate.eq_ignore_ascii_case(query),
        ConstructKind::CapabilityUse | ConstructKind::BaseType | ConstructKind::ImplementedCapability => {
            if query.contains(SEPARATOR) {
                name::normalize(candidate).eq_ignore_ascii_case(name::normalize(query))
            } else {
                name::short_name(candidate).eq_ignore_ascii_case(query)
            }
        }
    }
}

/// Names of every element of `kind` in `decl`
fn element_names(decl: &TypeDecl, kind: ConstructKind) -> Vec<&str> {
    match kind {
        ConstructKind::Property => decl.properties.values().map(|p| p.name.as_str()).collect(),
        ConstructKind::Constant => decl.constants.values().map(|c| c.name.as_str()).collect(),
        ConstructKind::CapabilityUse => decl.traits.values().map(|t| t.name.as_str()).collect(),
        ConstructKind::BaseType => decl.extends.iter().map(String::as_str).collect(),
        ConstructKind::ImplementedCapability => {
            decl.implements.iter().map(String::as_str).collect()
        }
        ConstructKind::Method => decl.methods.values().map(|m| m.name.as_str()).collect(),
    }
}

/// Two element names denote the same element
///
/// Property and constant names are case-sensitive; method and class names
/// are not.
fn same_name(kind: ConstructKind, a: &str, b: &str) -> bool {
    match kind {
        ConstructKind::Property | ConstructKind::Constant => a == b,
        ConstructKind::Method => a.eq_ignore_ascii_case(b),
        ConstructKind::CapabilityUse | ConstructKind::BaseType | ConstructKind::ImplementedCapability => {
            name::normalize(a).eq_ignore_ascii_case(name::normalize(b))
        }
    }
}

/// First name of `kind` that occurs twice in `decl`
fn duplicate_name(decl: &TypeDecl, kind: ConstructKind) -> Option<&str> {
    let names = element_names(decl, kind);
    names
        .iter()
        .enumerate()
        .find(|(at, candidate)| names[..*at].iter().any(|seen| same_name(kind, seen, candidate)))
        .map(|(_, candidate)| *candidate)
}

/// Number of elements matching `query`
#[must_use]
pub fn count(unit: &SourceUnit, kind: ConstructKind, query: &str) -> usize {
    unit.types()
        .map(|decl| {
            element_names(decl, kind)
                .into_iter()
                .filter(|candidate| answers_to(kind, candidate, query))
                .count()
        })
        .sum()
}

/// Every element matching `query`, in declaration order
pub fn find<'u>(unit: &'u mut SourceUnit, kind: ConstructKind, query: &str) -> Vec<Located<'u>> {
    let mut found = Vec::new();
    for namespace in unit.namespaces.values_mut() {
        let Namespace { name: namespace_name, types, .. } = namespace;
        let namespace_name: &'u String = namespace_name;

        for decl in types.values_mut() {
            let TypeDecl {
                name: type_name,
                extends,
                implements,
                traits,
                constants,
                properties,
                methods,
                ..
            } = decl;
            let type_name: &'u String = type_name;
            let mut push = |element: ElementMut<'u>| {
                if answers_to(kind, element.name(), query) {
                    found.push(Located {
                        namespace: namespace_name,
                        type_name,
                        element,
                    });
                }
            };

            match kind {
                ConstructKind::Property => {
                    properties.values_mut().map(ElementMut::Property).for_each(&mut push);
                }
                ConstructKind::Constant => {
                    constants.values_mut().map(ElementMut::Constant).for_each(&mut push);
                }
                ConstructKind::CapabilityUse => {
                    traits.values_mut().map(ElementMut::CapabilityUse).for_each(&mut push);
                }
                ConstructKind::BaseType => {
                    extends.iter_mut().map(ElementMut::BaseType).for_each(&mut push);
                }
                ConstructKind::ImplementedCapability => {
                    implements
                        .iter_mut()
                        .map(ElementMut::ImplementedCapability)
                        .for_each(&mut push);
                }
                ConstructKind::Method => {
                    methods.values_mut().map(ElementMut::Method).for_each(&mut push);
                }
            }
        }
    }
    found
}

/// Transform every element matching `query`, returning how many were visited
///
/// Renamed class references are imported into their namespace when that
/// does not collide with an existing alias; otherwise they stay fully
/// qualified.
///
/// # Errors
/// [`EngineError::DuplicateElement`] when a transform gives an element the
/// name of another element of the same type. The unit is restored first.
pub fn modify<F>(
    unit: &mut SourceUnit,
    kind: ConstructKind,
    query: &str,
    mut transform: F,
) -> EngineResult<usize>
where
    F: FnMut(&mut Located<'_>),
{
    let snapshot = unit.clone();
    let mut references: Vec<(String, String)> = Vec::new();
    let visited = {
        let mut found = find(unit, kind, query);
        for located in &mut found {
            transform(located);
            if kind.is_reference() {
                references.push((
                    located.namespace.to_string(),
                    name::normalize(located.element.name()).to_string(),
                ));
            }
        }
        found.len()
    };
    if visited == 0 {
        return Ok(0);
    }

    for namespace in unit.namespaces.values_mut() {
        for decl in namespace.types.values_mut() {
            normalize_names(decl);
        }
    }
    if let Some(err) = collision(unit, kind) {
        *unit = snapshot;
        return Err(err);
    }
    for decl in unit.namespaces.values_mut().flat_map(|ns| ns.types.values_mut()) {
        decl.rekey();
    }
    for (namespace_name, fqn) in references {
        let namespace = unit.namespace_mut(&namespace_name);
        import_reference(namespace, &fqn);
    }

    tracing::debug!(kind = %kind, query, visited, "modified elements");
    Ok(visited)
}

fn collision(unit: &SourceUnit, kind: ConstructKind) -> Option<EngineError> {
    unit.namespaces.values().find_map(|namespace| {
        namespace.types.values().find_map(|decl| {
            duplicate_name(decl, kind).map(|taken| {
                tracing::warn!(kind = %kind, element = taken, type_name = %decl.name, "rename collides");
                EngineError::duplicate_element(name::join(&namespace.name, &decl.name), kind, taken)
            })
        })
    })
}

fn normalize_names(decl: &mut TypeDecl) {
    for property in decl.properties.values_mut() {
        if property.name.starts_with('$') {
            property.name = property.name.trim_start_matches('$').to_string();
        }
    }
    for reference in decl.extends.iter_mut().chain(decl.implements.iter_mut()) {
        *reference = name::normalize(reference).to_string();
    }
    for trait_use in decl.traits.values_mut() {
        trait_use.name = name::normalize(&trait_use.name).to_string();
    }
}

fn import_reference(namespace: &mut Namespace, fqn: &str) {
    if name::is_builtin_type(fqn)
        || name::namespace_of(fqn).eq_ignore_ascii_case(&namespace.name)
        || namespace.imports_name(fqn)
    {
        return;
    }
    let alias = name::short_name(fqn);
    let taken = namespace.imports.keys().any(|a| a.eq_ignore_ascii_case(alias))
        || namespace.types.keys().any(|t| t.eq_ignore_ascii_case(alias));
    if taken {
        tracing::debug!(reference = fqn, namespace = %namespace.name, "alias taken, left fully qualified");
        return;
    }
    namespace.insert_import(Import::new(fqn));
}

/// Transform properties named `query`
///
/// # Errors
/// Same as [`modify`].
pub fn modify_property<F>(unit: &mut SourceUnit, query: &str, mut transform: F) -> EngineResult<usize>
where
    F: FnMut(&mut Property),
{
    modify(unit, ConstructKind::Property, query, |located| {
        if let ElementMut::Property(property) = &mut located.element {
            transform(property);
        }
    })
}

/// Transform constants named `query`
///
/// # Errors
/// Same as [`modify`].
pub fn modify_constant<F>(unit: &mut SourceUnit, query: &str, mut transform: F) -> EngineResult<usize>
where
    F: FnMut(&mut Constant),
{
    modify(unit, ConstructKind::Constant, query, |located| {
        if let ElementMut::Constant(constant) = &mut located.element {
            transform(constant);
        }
    })
}

/// Transform methods named `query`
///
/// # Errors
/// Same as [`modify`].
pub fn modify_method<F>(unit: &mut SourceUnit, query: &str, mut transform: F) -> EngineResult<usize>
where
    F: FnMut(&mut Method),
{
    modify(unit, ConstructKind::Method, query, |located| {
        if let ElementMut::Method(method) = &mut located.element {
            transform(method);
        }
    })
}
