//! Scribe source model
//!
//! Structural, round-trippable model of PHP source files.
//!
//! # Core Concepts
//!
//! - [`SourceUnit`]: one file, owning its [`Namespace`]s
//! - [`TypeDecl`]: class, interface or trait with keyed element maps
//! - [`parse_source`]: tree-sitter loader from text to model
//! - [`Printer`]: canonical serializer back to text
//! - [`Scope`]: name resolution against a namespace's imports
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe_model::{parse_source, Printer};
//!
//! let unit = parse_source(source)?;
//! let text = Printer::new().print(&unit);
//! ```

#![warn(unreachable_pub)]

mod error;
mod literal;
mod model;
pub mod name;
mod parser;
mod printer;
mod verbatim;

pub use error::{ModelError, ModelResult};
pub use literal::Literal;
pub use model::{
    is_array_layout, Constant, Import, ImportKind, Method, Namespace, Property, SourceUnit,
    TraitUse, TypeDecl, TypeKind, Visibility,
};
pub use name::Scope;
pub use parser::parse_source;
pub use printer::{print_source, Printer, DEFAULT_INDENT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
