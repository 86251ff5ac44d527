//! Target triples.
//!
//! A [`TargetTriple`] identifies a cross-compilation target by architecture,
//! operating system and ABI. The vendor component that appears in Rust
//! target names (`unknown`, `apple`, `pc`) is kept as written for display
//! but is not part of the triple's identity. When the input omits it, the
//! vendor is filled in only where Rust's own target name has one, so
//! `armv7-linux-gnueabihf` displays as `armv7-unknown-linux-gnueabihf` while
//! `aarch64-linux-android` and `thumbv7em-none-eabihf` stay vendor-less.
//!
//! # Example
//!
//! ```
//! use xenv_schema::TargetTriple;
//!
//! let short: TargetTriple = "armv7-linux-gnueabihf".parse().unwrap();
//! let long: TargetTriple = "armv7-unknown-linux-gnueabihf".parse().unwrap();
//! assert_eq!(short, long);
//! assert_eq!(long.env_key(), "armv7_unknown_linux_gnueabihf");
//!
//! let android: TargetTriple = "aarch64-linux-android".parse().unwrap();
//! assert_eq!(android.env_key(), "aarch64_linux_android");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Vendors recognised in the three-component `arch-vendor-os` form.
const KNOWN_VENDORS: &[&str] = &["unknown", "pc", "apple"];

/// Errors produced while parsing a [`TargetTriple`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TripleError {
    /// The input was empty or only whitespace.
    #[error("Empty target triple")]
    Empty,

    /// The input did not have two to four `-`-separated components.
    #[error("Malformed target triple '{0}': expected arch-os-abi or arch-vendor-os-abi")]
    Malformed(String),

    /// A component was empty or contained characters outside `[a-z0-9_.]`.
    #[error("Invalid component '{component}' in target triple '{triple}'")]
    InvalidComponent {
        /// The full triple as given.
        triple: String,
        /// The offending component.
        component: String,
    },
}

/// A cross-compilation target: architecture, operating system and ABI.
///
/// Two triples are equal iff architecture, OS and ABI match exactly; the
/// vendor is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetTriple {
    arch: String,
    vendor: Option<String>,
    os: String,
    /// Empty when the target has no ABI component (e.g. `aarch64-apple-darwin`).
    abi: String,
}

impl TargetTriple {
    /// Build a triple from its components, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`TripleError::InvalidComponent`] if a component is empty or
    /// contains characters outside `[a-z0-9_.]`.
    pub fn new(arch: &str, os: &str, abi: Option<&str>) -> Result<Self, TripleError> {
        let display = match abi {
            Some(abi) => format!("{arch}-{os}-{abi}"),
            None => format!("{arch}-{os}"),
        };
        Self::from_parts(&display, arch, None, os, abi.unwrap_or_default(), abi.is_some())
    }

    fn from_parts(
        input: &str,
        arch: &str,
        vendor: Option<&str>,
        os: &str,
        abi: &str,
        abi_required: bool,
    ) -> Result<Self, TripleError> {
        let invalid = |component: &str| TripleError::InvalidComponent {
            triple: input.to_string(),
            component: component.to_string(),
        };

        if !is_valid_component(arch) {
            return Err(invalid(arch));
        }
        if !is_valid_component(os) {
            return Err(invalid(os));
        }
        if (abi_required || !abi.is_empty()) && !is_valid_component(abi) {
            return Err(invalid(abi));
        }

        let vendor = match vendor {
            Some(vendor) if is_valid_component(vendor) => Some(vendor.to_string()),
            Some(vendor) => return Err(invalid(vendor)),
            None => implied_vendor(os, abi).map(str::to_string),
        };

        Ok(Self {
            arch: arch.to_string(),
            vendor,
            os: os.to_string(),
            abi: abi.to_string(),
        })
    }

    /// CPU architecture (`armv7`, `aarch64`, `x86_64`, ...).
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Operating system (`linux`, `darwin`, `windows`, ...).
    pub fn os(&self) -> &str {
        &self.os
    }

    /// ABI / libc variant (`gnueabihf`, `musl`, ...), if the target has one.
    pub fn abi(&self) -> Option<&str> {
        if self.abi.is_empty() {
            None
        } else {
            Some(&self.abi)
        }
    }

    /// Vendor component rendered in the canonical form, if the target name
    /// has one.
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    fn identity(&self) -> (&str, &str, &str) {
        (&self.arch, &self.os, &self.abi)
    }

    /// Normalized name for environment variable keys.
    ///
    /// This is the canonical form with `-` replaced by `_`, the convention
    /// `pkg-config` and `cc` use for per-target variables
    /// (`PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf`).
    pub fn env_key(&self) -> String {
        self.to_string().replace('-', "_")
    }
}

/// Vendor Rust uses for a target given without one.
fn implied_vendor(os: &str, abi: &str) -> Option<&'static str> {
    match os {
        "darwin" | "ios" | "tvos" | "watchos" | "visionos" => Some("apple"),
        "windows" => Some("pc"),
        "none" | "wasi" | "emscripten" | "cuda" => None,
        _ if abi.starts_with("android") => None,
        _ => Some("unknown"),
    }
}

fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-", self.arch)?;
        if let Some(vendor) = &self.vendor {
            write!(f, "{vendor}-")?;
        }
        write!(f, "{}", self.os)?;
        if !self.abi.is_empty() {
            write!(f, "-{}", self.abi)?;
        }
        Ok(())
    }
}

impl FromStr for TargetTriple {
    type Err = TripleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        if input.is_empty() {
            return Err(TripleError::Empty);
        }

        let parts: Vec<&str> = input.split('-').collect();
        if let Some(empty) = parts.iter().find(|p| p.is_empty()) {
            return Err(TripleError::InvalidComponent {
                triple: input.clone(),
                component: (*empty).to_string(),
            });
        }

        let (arch, vendor, os, abi) = match parts.as_slice() {
            [arch, os] => (*arch, None, *os, ""),
            [arch, vendor, os] if KNOWN_VENDORS.contains(vendor) => {
                (*arch, Some(*vendor), *os, "")
            }
            [arch, os, abi] => (*arch, None, *os, *abi),
            [arch, vendor, os, abi] => (*arch, Some(*vendor), *os, *abi),
            _ => return Err(TripleError::Malformed(s.trim().to_string())),
        };

        Self::from_parts(&input, arch, vendor, os, abi, false)
    }
}

impl PartialEq for TargetTriple {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for TargetTriple {}

impl Hash for TargetTriple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for TargetTriple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TargetTriple {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = TripleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetTriple> for String {
    fn from(triple: TargetTriple) -> Self {
        triple.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_forms_are_equal() {
        let short: TargetTriple = "armv7-linux-gnueabihf".parse().unwrap();
        let long: TargetTriple = "armv7-unknown-linux-gnueabihf".parse().unwrap();
        assert_eq!(short, long);
        assert_eq!(short.arch(), "armv7");
        assert_eq!(short.os(), "linux");
        assert_eq!(short.abi(), Some("gnueabihf"));
    }

    #[test]
    fn test_canonical_display() {
        let triple: TargetTriple = "armv7-linux-gnueabihf".parse().unwrap();
        assert_eq!(triple.to_string(), "armv7-unknown-linux-gnueabihf");

        let mac: TargetTriple = "aarch64-apple-darwin".parse().unwrap();
        assert_eq!(mac.abi(), None);
        assert_eq!(mac.to_string(), "aarch64-apple-darwin");

        let win: TargetTriple = "x86_64-pc-windows-msvc".parse().unwrap();
        assert_eq!(win.to_string(), "x86_64-pc-windows-msvc");
    }

    #[test]
    fn test_vendorless_targets_stay_vendorless() {
        let android: TargetTriple = "aarch64-linux-android".parse().unwrap();
        assert_eq!(android.vendor(), None);
        assert_eq!(android.to_string(), "aarch64-linux-android");
        assert_eq!(android.env_key(), "aarch64_linux_android");

        let bare: TargetTriple = "thumbv7em-none-eabihf".parse().unwrap();
        assert_eq!(bare.to_string(), "thumbv7em-none-eabihf");
        assert_eq!(bare.env_key(), "thumbv7em_none_eabihf");

        let armv7a: TargetTriple = "armv7-linux-androideabi".parse().unwrap();
        assert_eq!(armv7a.to_string(), "armv7-linux-androideabi");
    }

    #[test]
    fn test_written_vendor_is_kept() {
        let pc: TargetTriple = "x86_64-pc-linux-gnu".parse().unwrap();
        let unknown: TargetTriple = "x86_64-unknown-linux-gnu".parse().unwrap();
        assert_eq!(pc.to_string(), "x86_64-pc-linux-gnu");
        assert_eq!(pc, unknown);

        let bare: TargetTriple = "riscv32imac-unknown-none-elf".parse().unwrap();
        assert_eq!(bare.vendor(), Some("unknown"));
        assert_eq!(bare.env_key(), "riscv32imac_unknown_none_elf");
    }

    #[test]
    fn test_env_key() {
        let triple: TargetTriple = "armv7-unknown-linux-gnueabihf".parse().unwrap();
        assert_eq!(triple.env_key(), "armv7_unknown_linux_gnueabihf");
    }

    #[test]
    fn test_fields_must_all_match() {
        let gnu: TargetTriple = "x86_64-linux-gnu".parse().unwrap();
        let musl: TargetTriple = "x86_64-linux-musl".parse().unwrap();
        let arm: TargetTriple = "aarch64-linux-gnu".parse().unwrap();
        assert_ne!(gnu, musl);
        assert_ne!(gnu, arm);
    }

    #[test]
    fn test_input_is_normalized() {
        let triple: TargetTriple = "  ARMv7-Unknown-Linux-GNUEABIHF ".parse().unwrap();
        assert_eq!(triple.to_string(), "armv7-unknown-linux-gnueabihf");
    }

    #[test]
    fn test_malformed_triples() {
        assert_eq!("".parse::<TargetTriple>(), Err(TripleError::Empty));
        assert!(matches!(
            "x86_64".parse::<TargetTriple>(),
            Err(TripleError::Malformed(_))
        ));
        assert!(matches!(
            "a-b-c-d-e".parse::<TargetTriple>(),
            Err(TripleError::Malformed(_))
        ));
        assert!(matches!(
            "armv7--gnueabihf".parse::<TargetTriple>(),
            Err(TripleError::InvalidComponent { .. })
        ));
        assert!(matches!(
            "arm$-linux-gnu".parse::<TargetTriple>(),
            Err(TripleError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_new_validates_components() {
        assert!(TargetTriple::new("armv7", "linux", Some("gnueabihf")).is_ok());
        assert!(TargetTriple::new("armv7", "linux", Some("")).is_err());
        assert!(TargetTriple::new("", "linux", None).is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let triple: TargetTriple = "aarch64-linux-gnu".parse().unwrap();
        let json = serde_json::to_string(&triple).unwrap();
        assert_eq!(json, "\"aarch64-unknown-linux-gnu\"");

        let back: TargetTriple = serde_json::from_str(&json).unwrap();
        assert_eq!(back, triple);
        assert!(serde_json::from_str::<TargetTriple>("\"nope\"").is_err());
    }
}
