//! Scribe class manifest
//!
//! Read-only mapping from fully-qualified class names to source files.
//!
//! - [`Manifest`]: radix-tree index with prefix enumeration
//! - [`Resolver`]: name lookup used by the engine's loader and sink
//! - Composer loaders: [`Manifest::load_classmap`], [`Manifest::scan_psr4`],
//!   [`Manifest::from_project`]

#![warn(unreachable_pub)]

mod composer;
mod error;
mod manifest;
mod resolver;

pub use composer::CLASSMAP_PATH;
pub use error::{ManifestError, ManifestResult};
pub use manifest::Manifest;
pub use resolver::Resolver;
