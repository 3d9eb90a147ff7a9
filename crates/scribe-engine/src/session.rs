//! Load → mutate → emit over a set of source units

use crate::checker::SyntaxChecker;
use crate::construct::{self, ConstructKind, Located};
use crate::error::{EngineError, EngineResult};
use crate::mutation::Mutation;
use crate::sink::{EmitMode, Emission, Sink};
use crate::source::{LoadedUnit, SourceRef};
use crate::validator::Validator;
use scribe_manifest::{Manifest, Resolver};
use scribe_model::{Constant, Method, Printer, Property, SourceUnit};

/// Mutation session over loaded units
///
/// Mutations run against every unit. Conflicts are checked across all units
/// before any unit is edited, so a failed mutation leaves the session as it
/// was.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = CodeSession::load(["App\\Models\\Post"], &manifest, validator, Printer::new())?;
/// session
///     .use_trait("Illuminate\\Database\\Eloquent\\SoftDeletes")?
///     .extend("Illuminate\\Database\\Eloquent\\Model")?;
/// let emission = session.emit(EmitMode::Both)?;
/// ```
#[derive(Debug)]
pub struct CodeSession<'m, C> {
    units: Vec<LoadedUnit>,
    resolver: Resolver<'m>,
    validator: Validator<C>,
    printer: Printer,
}

impl<'m, C: SyntaxChecker> CodeSession<'m, C> {
    /// Load every source into a new session
    ///
    /// # Errors
    /// Fails on the first source that cannot be resolved, read or parsed.
    pub fn load<I, S>(
        sources: I,
        manifest: &'m Manifest,
        validator: Validator<C>,
        printer: Printer,
    ) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceRef>,
    {
        let resolver = Resolver::new(manifest);
        let units = sources
            .into_iter()
            .map(|source| LoadedUnit::load(source.into(), &resolver))
            .collect::<EngineResult<Vec<_>>>()?;

        tracing::info!(units = units.len(), "session loaded");
        Ok(Self::from_units(units, manifest, validator, printer))
    }

    /// Session over already loaded units
    #[must_use]
    pub fn from_units(
        units: Vec<LoadedUnit>,
        manifest: &'m Manifest,
        validator: Validator<C>,
        printer: Printer,
    ) -> Self {
        Self {
            units,
            resolver: Resolver::new(manifest),
            validator,
            printer,
        }
    }

    /// Apply one mutation to every unit
    ///
    /// # Errors
    /// Returns the first conflict found in any unit; nothing is edited then.
    pub fn apply(&mut self, mutation: &Mutation) -> EngineResult<&mut Self> {
        for loaded in &self.units {
            mutation.check(&loaded.unit)?;
        }
        let mut changes = 0;
        for loaded in &mut self.units {
            changes += mutation.apply(&mut loaded.unit)?;
        }
        if changes == 0 {
            tracing::debug!(%mutation, "already satisfied");
        }
        Ok(self)
    }

    /// Import a class into every namespace
    ///
    /// # Errors
    /// [`crate::EngineError::AmbiguousImport`] on an alias collision.
    pub fn import(&mut self, fqn: &str) -> EngineResult<&mut Self> {
        self.apply(&Mutation::import(fqn))
    }

    /// Use a trait in every class and trait
    ///
    /// # Errors
    /// [`crate::EngineError::AmbiguousImport`] on an alias collision.
    pub fn use_trait(&mut self, fqn: &str) -> EngineResult<&mut Self> {
        self.apply(&Mutation::capability(fqn))
    }

    /// Set the base type of every class (parent of every interface)
    ///
    /// # Errors
    /// [`crate::EngineError::MultipleInheritance`] when a class already
    /// extends something else.
    pub fn extend(&mut self, fqn: &str) -> EngineResult<&mut Self> {
        self.apply(&Mutation::base_type(fqn))
    }

    /// Implement an interface in every class
    ///
    /// # Errors
    /// [`crate::EngineError::AmbiguousImport`] on an alias collision.
    pub fn implement(&mut self, fqn: &str) -> EngineResult<&mut Self> {
        self.apply(&Mutation::implement(fqn))
    }

    /// Add a property where absent
    ///
    /// # Errors
    /// Never fails today; kept fallible for chaining.
    pub fn add_property(&mut self, property: Property) -> EngineResult<&mut Self> {
        self.apply(&Mutation::Property(property))
    }

    /// Add a constant where absent
    ///
    /// # Errors
    /// Never fails today; kept fallible for chaining.
    pub fn add_constant(&mut self, constant: Constant) -> EngineResult<&mut Self> {
        self.apply(&Mutation::Constant(constant))
    }

    /// Add a method where absent
    ///
    /// # Errors
    /// Never fails today; kept fallible for chaining.
    pub fn add_method(&mut self, method: Method) -> EngineResult<&mut Self> {
        self.apply(&Mutation::Method(method))
    }

    /// Append a doc line to every type
    ///
    /// # Errors
    /// Never fails today; kept fallible for chaining.
    pub fn document(&mut self, line: impl Into<String>) -> EngineResult<&mut Self> {
        self.apply(&Mutation::Doc(line.into()))
    }

    /// Toggle `declare(strict_types=1);`
    ///
    /// # Errors
    /// Never fails today; kept fallible for chaining.
    pub fn strict_types(&mut self, on: bool) -> EngineResult<&mut Self> {
        self.apply(&Mutation::StrictTypes(on))
    }

    /// Transform matching elements of `kind` across all units
    ///
    /// # Errors
    /// [`crate::EngineError::DuplicateElement`] when a rename collides with
    /// a sibling in any unit; every unit is left as it was.
    pub fn modify<F>(&mut self, kind: ConstructKind, query: &str, mut transform: F) -> EngineResult<usize>
    where
        F: FnMut(&mut Located<'_>),
    {
        self.modify_each(|unit| construct::modify(unit, kind, query, &mut transform))
    }

    /// Like [`CodeSession::modify`] with the kind given by name
    ///
    /// # Errors
    /// [`crate::EngineError::UnsupportedConstruct`] for an unknown kind, or
    /// any error of [`CodeSession::modify`].
    pub fn modify_kind<F>(&mut self, kind: &str, query: &str, transform: F) -> EngineResult<usize>
    where
        F: FnMut(&mut Located<'_>),
    {
        let kind: ConstructKind = kind.parse()?;
        self.modify(kind, query, transform)
    }

    /// Transform matching properties
    ///
    /// # Errors
    /// Same as [`CodeSession::modify`].
    pub fn modify_property<F>(&mut self, query: &str, mut transform: F) -> EngineResult<usize>
    where
        F: FnMut(&mut Property),
    {
        self.modify_each(|unit| construct::modify_property(unit, query, &mut transform))
    }

    /// Transform matching constants
    ///
    /// # Errors
    /// Same as [`CodeSession::modify`].
    pub fn modify_constant<F>(&mut self, query: &str, mut transform: F) -> EngineResult<usize>
    where
        F: FnMut(&mut Constant),
    {
        self.modify_each(|unit| construct::modify_constant(unit, query, &mut transform))
    }

    /// Transform matching methods
    ///
    /// # Errors
    /// Same as [`CodeSession::modify`].
    pub fn modify_method<F>(&mut self, query: &str, mut transform: F) -> EngineResult<usize>
    where
        F: FnMut(&mut Method),
    {
        self.modify_each(|unit| construct::modify_method(unit, query, &mut transform))
    }

    /// Run `edit` over every unit, restoring all of them if one fails
    fn modify_each<F>(&mut self, mut edit: F) -> EngineResult<usize>
    where
        F: FnMut(&mut SourceUnit) -> EngineResult<usize>,
    {
        let snapshot: Vec<SourceUnit> = self.units.iter().map(|loaded| loaded.unit.clone()).collect();
        let outcome = self
            .units
            .iter_mut()
            .try_fold(0, |visited, loaded| Ok::<_, EngineError>(visited + edit(&mut loaded.unit)?));
        if outcome.is_err() {
            for (loaded, unit) in self.units.iter_mut().zip(snapshot) {
                loaded.unit = unit;
            }
        }
        outcome
    }

    /// Count matching elements across all units
    #[must_use]
    pub fn find_count(&self, kind: ConstructKind, query: &str) -> usize {
        self.units
            .iter()
            .map(|loaded| construct::count(&loaded.unit, kind, query))
            .sum()
    }

    /// Loaded units
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[LoadedUnit] {
        &self.units
    }

    /// Validator in use
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Validator<C> {
        &self.validator
    }

    /// Serialize every unit without validation
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        self.units
            .iter()
            .map(|loaded| self.printer.print(&loaded.unit))
            .collect()
    }

    /// Serialize, validate and deliver every unit
    ///
    /// Units are validated before any is written. A stale write target is
    /// skipped, not an error.
    ///
    /// # Errors
    /// The first validation failure, or an IO error while writing.
    pub fn emit(&mut self, mode: EmitMode) -> EngineResult<Emission> {
        let validated = self
            .render()
            .into_iter()
            .map(|text| self.validator.validate(&text))
            .collect::<EngineResult<Vec<_>>>()?;

        let sink = Sink::new(self.resolver);
        let emission = self
            .units
            .iter_mut()
            .zip(validated)
            .map(|(loaded, text)| sink.deliver(loaded, text, mode))
            .collect::<EngineResult<Emission>>()?;

        tracing::info!(units = emission.len(), written = emission.written(), ?mode, "emitted");
        Ok(emission)
    }
}
