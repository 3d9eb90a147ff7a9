//! Scribe mutation engine
//!
//! Loads PHP sources into the structural model, applies declarative
//! mutations, and emits text that passed an external syntax check.
//!
//! # Pipeline
//!
//! 1. **Load**: [`LoadedUnit::load`] resolves a [`SourceRef`] and parses it
//! 2. **Mutate**: [`Mutation`]s and [`construct::modify`] edit the model
//! 3. **Print**: [`scribe_model::Printer`] serializes canonically
//! 4. **Validate**: [`Validator`] runs a [`SyntaxChecker`] on a temp copy
//! 5. **Emit**: [`Sink`] returns text and/or writes it back
//!
//! [`CodeSession`] drives the whole pipeline over several units.

#![warn(unreachable_pub)]

mod checker;
mod config;
pub mod construct;
mod error;
mod mutation;
mod session;
mod sink;
mod source;
mod validator;

pub use checker::{CheckReport, ProcessChecker, SyntaxChecker, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
pub use config::{CheckerConfig, ManifestConfig, PrinterConfig, ScribeConfig, ValidatorConfig};
pub use construct::{ConstructKind, ElementMut, Located};
pub use error::{CheckError, EngineError, EngineResult};
pub use mutation::Mutation;
pub use session::CodeSession;
pub use sink::{Disposition, EmitMode, Emission, EmittedUnit, Sink};
pub use source::{LoadedUnit, SourceRef};
pub use validator::{Validator, DEFAULT_BOOTSTRAP, DEFAULT_FATAL_MARKERS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
