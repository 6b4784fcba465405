//! High-level operations.
//!
//! This module contains the implementation of Quay commands.

pub mod options;
pub mod pipeline;
pub mod quay_create;
pub mod quay_new;
pub mod requirements;
pub mod validate;

pub use options::resolve_options;
pub use pipeline::{Configuration, PipelineSettings, PipelineState, RecipePipeline};
pub use quay_create::{create, descriptor, validate, CreateOptions, Session};
pub use quay_new::{new_recipe, NewOptions};
pub use requirements::declare_requirements;
pub use validate::validate_platform;
