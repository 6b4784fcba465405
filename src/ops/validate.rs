//! Platform validation.
//!
//! Checks run in a fixed order and stop at the first violation: operating
//! system membership, then architecture membership, then the recipe's
//! conflict rules. Later checks assume the earlier ones passed.

use crate::core::errors::{PlatformDimension, RecipeError};
use crate::core::options::OptionSet;
use crate::core::recipe::CompatibilityMatrix;
use crate::core::settings::PlatformSpec;

/// Validate a platform and requested options against a compatibility matrix.
pub fn validate_platform(
    package: &str,
    matrix: &CompatibilityMatrix,
    platform: &PlatformSpec,
    options: &OptionSet,
) -> Result<(), RecipeError> {
    if !matrix.allows_os(platform.os) {
        return Err(RecipeError::UnsupportedPlatform {
            package: package.to_string(),
            dimension: PlatformDimension::Os,
            value: platform.os.to_string(),
            valid: matrix.valid_os.iter().map(|os| os.to_string()).collect(),
            reason: None,
        });
    }

    if !matrix.allows_arch(platform.arch) {
        return Err(RecipeError::UnsupportedPlatform {
            package: package.to_string(),
            dimension: PlatformDimension::Arch,
            value: platform.arch.to_string(),
            valid: matrix.valid_arch.iter().map(|a| a.to_string()).collect(),
            reason: None,
        });
    }

    if let Some(rule) = matrix.conflict_for(platform, options) {
        tracing::debug!("conflict rule matched: {}", rule.when.describe());
        return Err(RecipeError::UnsupportedPlatform {
            package: package.to_string(),
            dimension: PlatformDimension::OptionCombination,
            value: rule.when.describe(),
            valid: Vec::new(),
            reason: Some(rule.reason.clone()),
        });
    }

    tracing::debug!("{} accepts {}", package, platform);
    Ok(())
}
