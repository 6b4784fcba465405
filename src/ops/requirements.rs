//! Dependency requirement declaration.

use crate::core::dependency::DependencyRequirement;
use crate::core::recipe::Recipe;

/// The recipe's dependency requirements, in declaration order.
///
/// Requirements are declared, not fetched. Each carries the options it
/// forces on the dependency; resolving them is left to a
/// [`DependencyResolver`](crate::resolver::DependencyResolver).
pub fn declare_requirements(recipe: &Recipe) -> Vec<DependencyRequirement> {
    recipe
        .requires
        .iter()
        .inspect(|req| tracing::debug!("requires {}", req))
        .cloned()
        .collect()
}
