//! Quay - a recipe engine for packaging C and C++ libraries
//!
//! This crate provides the core library functionality for Quay: resolving
//! a component's identity, validating the target platform, pruning options,
//! declaring dependencies, synthesizing a CMake build descriptor and driving
//! the configure, build and install pipeline.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for Quay unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording toolchain, an in-memory resolver and recipe
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    errors::RecipeError, identity::ComponentIdentity, options::OptionSet, recipe::Recipe,
    settings::PlatformSpec,
};

pub use ops::pipeline::{PipelineSettings, PipelineState, RecipePipeline};
pub use util::context::GlobalContext;
