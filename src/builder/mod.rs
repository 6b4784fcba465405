//! Build descriptor synthesis and toolchain drivers.

pub mod cmake;
pub mod descriptor;
pub mod toolchain;

pub use cmake::CMakeToolchain;
pub use descriptor::{synthesize, BuildDescriptor, SynthesisOutcome};
pub use toolchain::{BuildLayout, Toolchain};
