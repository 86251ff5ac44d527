//! Nothing here installs or exports anything; each renderer turns a
//! [`BuildPlan`] into text that a package manager, a shell or an image
//! builder can act on.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::plan::BuildPlan;

const APT_INSTALL: &str = "apt-get install --assume-yes --no-install-recommends";

/// Output format for a rendered plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Two plain sections: `[packages]` and `[environment]`.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
    /// POSIX shell script that installs and exports.
    Shell,
    /// Dockerfile `RUN` / `ENV` instructions.
    Dockerfile,
}

impl Format {
    /// Lowercase name as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Shell => "shell",
            Self::Dockerfile => "dockerfile",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "shell" | "sh" => Ok(Self::Shell),
            "dockerfile" | "docker" => Ok(Self::Dockerfile),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

/// Render `plan` in the requested format.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render(plan: &BuildPlan, format: Format) -> serde_json::Result<String> {
    match format {
        Format::Text => Ok(render_text(plan)),
        Format::Json => serde_json::to_string_pretty(plan).map(|mut json| {
            json.push('\n');
            json
        }),
        Format::Shell => Ok(render_shell(plan)),
        Format::Dockerfile => Ok(render_dockerfile(plan)),
    }
}

/// Two sections, one entry per line.
pub fn render_text(plan: &BuildPlan) -> String {
    let mut out = String::from("[packages]\n");
    for package in &plan.packages {
        let _ = writeln!(out, "{package}");
    }
    out.push_str("\n[environment]\n");
    for (name, value) in &plan.environment {
        let _ = writeln!(out, "{name}={value}");
    }
    out
}

/// A shell script that enables the architectures, installs the packages and
/// exports the variables.
pub fn render_shell(plan: &BuildPlan) -> String {
    let mut out = String::from("#!/bin/sh\nset -e\n");
    if !plan.packages.is_empty() {
        for arch in &plan.architectures {
            let _ = writeln!(out, "dpkg --add-architecture {arch}");
        }
        out.push_str("apt-get update\n");
        out.push_str(APT_INSTALL);
        for package in &plan.packages {
            let _ = write!(out, " \\\n    {package}");
        }
        out.push('\n');
    }
    for (name, value) in &plan.environment {
        let _ = writeln!(out, "export {name}={}", shell_quote(value));
    }
    out
}

/// Dockerfile instructions: one `RUN` for the package manager, one `ENV`
/// per variable.
pub fn render_dockerfile(plan: &BuildPlan) -> String {
    let mut out = String::new();
    if !plan.packages.is_empty() {
        out.push_str("RUN ");
        for arch in &plan.architectures {
            let _ = write!(out, "dpkg --add-architecture {arch} && \\\n    ");
        }
        out.push_str("apt-get update && \\\n    ");
        out.push_str(APT_INSTALL);
        for package in &plan.packages {
            let _ = write!(out, " \\\n        {package}");
        }
        out.push_str(" && \\\n    rm -rf /var/lib/apt/lists/*\n");
    }
    for (name, value) in &plan.environment {
        let _ = writeln!(out, "ENV {name}={}", docker_quote(value));
    }
    out
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn docker_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use xenv_schema::{Multiarch, PackageName, QualifiedPackage};

    fn plan() -> BuildPlan {
        let arch = Multiarch::new("armhf", "arm-linux-gnueabihf");
        let packages = ["libasound2-dev", "libdbus-1-dev", "libssl-dev"]
            .iter()
            .map(|p| QualifiedPackage::foreign(PackageName::parse(p).unwrap(), &arch))
            .collect();
        BuildPlan {
            targets: vec!["armv7-linux-gnueabihf".parse().unwrap()],
            architectures: vec!["armhf".into()],
            packages,
            environment: [(
                "PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf".to_string(),
                "/usr/lib/arm-linux-gnueabihf/pkgconfig".to_string(),
            )]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_text_sections() {
        let text = render(&plan(), Format::Text).unwrap();
        assert_eq!(
            text,
            "[packages]\n\
             libasound2-dev:armhf\n\
             libdbus-1-dev:armhf\n\
             libssl-dev:armhf\n\
             \n\
             [environment]\n\
             PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf=/usr/lib/arm-linux-gnueabihf/pkgconfig\n"
        );
    }

    #[test]
    fn test_json_document() {
        let json = render(&plan(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["targets"][0], "armv7-unknown-linux-gnueabihf");
        assert_eq!(value["architectures"][0], "armhf");
        assert_eq!(value["packages"][2], "libssl-dev:armhf");
        assert_eq!(
            value["environment"]["PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf"],
            "/usr/lib/arm-linux-gnueabihf/pkgconfig"
        );
    }

    #[test]
    fn test_shell_script() {
        let script = render_shell(&plan());
        assert!(script.starts_with("#!/bin/sh\nset -e\n"));
        assert!(script.contains("dpkg --add-architecture armhf\n"));
        assert!(script.contains("    libssl-dev:armhf\n"));
        assert!(script.contains(
            "export PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf='/usr/lib/arm-linux-gnueabihf/pkgconfig'"
        ));
    }

    #[test]
    fn test_dockerfile() {
        let dockerfile = render_dockerfile(&plan());
        assert!(dockerfile.starts_with("RUN dpkg --add-architecture armhf && \\\n"));
        assert!(dockerfile.contains("libasound2-dev:armhf \\\n"));
        assert!(dockerfile.contains("rm -rf /var/lib/apt/lists/*\n"));
        assert!(dockerfile.contains(
            "ENV PKG_CONFIG_LIBDIR_armv7_unknown_linux_gnueabihf=\"/usr/lib/arm-linux-gnueabihf/pkgconfig\""
        ));
    }

    #[test]
    fn test_empty_plan_skips_install() {
        let empty = BuildPlan::default();
        assert_eq!(render_text(&empty), "[packages]\n\n[environment]\n");
        assert!(!render_shell(&empty).contains("apt-get"));
        assert!(render_dockerfile(&empty).is_empty());
    }

    #[test]
    fn test_quoting() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(docker_quote(r#"a"$b\"#), r#""a\"\$b\\""#);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert_eq!("docker".parse::<Format>(), Ok(Format::Dockerfile));
        assert!("yaml".parse::<Format>().is_err());
        assert_eq!(Format::Shell.to_string(), "shell");
    }
}
