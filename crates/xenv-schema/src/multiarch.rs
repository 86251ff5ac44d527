/// Debian multi-arch naming for a target.
///
/// The `qualifier` is what the host package manager appends to a package
/// name to install it for a foreign architecture (`libssl-dev:armhf`). The
/// `triplet` is the GNU multiarch directory name used under `/usr/lib`
/// (`/usr/lib/arm-linux-gnueabihf/pkgconfig`).
///
/// # Example
///
/// ```
/// use xenv_schema::{Multiarch, TargetTriple};
///
/// let triple: TargetTriple = "armv7-unknown-linux-gnueabihf".parse().unwrap();
/// let multiarch = Multiarch::for_triple(&triple).unwrap();
/// assert_eq!(multiarch.qualifier(), "armhf");
/// assert_eq!(multiarch.triplet(), "arm-linux-gnueabihf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Multiarch {
    qualifier: String,
    triplet: String,
}

impl Multiarch {
    /// Create an explicit multiarch naming.
    pub fn new(qualifier: impl Into<String>, triplet: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            triplet: triplet.into(),
        }
    }

    /// Derive the Debian naming for a Linux GNU target.
    ///
    /// Returns `None` for targets Debian does not ship as a multi-arch port
    /// (musl, bare metal, non-Linux); those must be declared explicitly.
    pub fn for_triple(triple: &crate::TargetTriple) -> Option<Self> {
        if triple.os() != "linux" {
            return None;
        }
        let (qualifier, triplet) = debian_names(triple.arch(), triple.abi()?)?;
        Some(Self::new(qualifier, triplet))
    }

    /// Package-manager architecture qualifier (`armhf`, `arm64`, ...).
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// GNU multiarch triplet (`arm-linux-gnueabihf`, ...).
    pub fn triplet(&self) -> &str {
        &self.triplet
    }
}

fn debian_names(arch: &str, abi: &str) -> Option<(&'static str, &'static str)> {
    let names = match (arch, abi) {
        ("x86_64", "gnu") => ("amd64", "x86_64-linux-gnu"),
        ("x86_64", "gnux32") => ("x32", "x86_64-linux-gnux32"),
        ("aarch64", "gnu") => ("arm64", "aarch64-linux-gnu"),
        ("armv7" | "thumbv7neon" | "arm", "gnueabihf") => ("armhf", "arm-linux-gnueabihf"),
        ("arm" | "armv5te" | "armv4t", "gnueabi") => ("armel", "arm-linux-gnueabi"),
        ("i686" | "i586" | "i386", "gnu") => ("i386", "i386-linux-gnu"),
        ("powerpc", "gnu") => ("powerpc", "powerpc-linux-gnu"),
        ("powerpc64le", "gnu") => ("ppc64el", "powerpc64le-linux-gnu"),
        ("riscv64gc" | "riscv64", "gnu") => ("riscv64", "riscv64-linux-gnu"),
        ("s390x", "gnu") => ("s390x", "s390x-linux-gnu"),
        ("mips64el", "gnuabi64") => ("mips64el", "mips64el-linux-gnuabi64"),
        ("loongarch64", "gnu") => ("loong64", "loongarch64-linux-gnu"),
        _ => return None,
    };
    Some(names)
}

impl std::fmt::Display for Multiarch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualifier)
    }
}
