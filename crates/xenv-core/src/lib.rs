//! Core library for xenv.
//!
//! Given a target triple and a set of native library dependencies, xenv
//! decides which packages the host package manager must install and which
//! environment variables the cross toolchain must see. The decision is a
//! pure function of the inputs and an explicit [`Registry`]; installing
//! packages and exporting variables belong to the collaborators that
//! consume the rendered [`BuildPlan`].

/// Rendering plans for package managers, shells and image builders.
pub mod emit;
pub mod manifest;
/// Registry discovery on disk.
pub mod paths;
pub mod plan;
pub mod registry;
/// The pure resolution step.
pub mod resolver;

pub use emit::{Format, render};
pub use manifest::Settings;
pub use paths::RegistrySource;
pub use plan::BuildPlan;
pub use registry::{PackageMapping, Registry, RegistryBuilder, RegistryError, TargetEntry};
pub use resolver::{Resolution, ResolveError, check, resolve};
