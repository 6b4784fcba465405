//! Option resolution.
//!
//! Pruning is a pure function from the requested options to the final
//! set. Rules are applied in recipe order, repeatedly, until none fires, so
//! resolving an already resolved set changes nothing.

use crate::core::options::OptionSet;
use crate::core::rules::PruneRule;
use crate::core::settings::PlatformSpec;

/// Apply `rules` to `requested` and return the resolved option set.
///
/// Options are only ever removed; the result is always a subset of
/// `requested`.
pub fn resolve_options(
    requested: &OptionSet,
    platform: &PlatformSpec,
    rules: &[PruneRule],
) -> OptionSet {
    let mut resolved = requested.clone();
    loop {
        let mut changed = false;
        for rule in rules {
            if resolved.contains(&rule.remove) && rule.when.matches(platform, &resolved) {
                resolved.remove(&rule.remove);
                tracing::debug!("pruned option `{}` ({})", rule.remove, rule.when.describe());
                changed = true;
            }
        }
        if !changed {
            return resolved;
        }
    }
}
