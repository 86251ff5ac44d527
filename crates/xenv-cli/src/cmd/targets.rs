//! Targets command

use comfy_table::Table;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use xenv_core::Registry;

/// Print the targets the registry supports.
pub fn targets(registry: &Registry) {
    if registry.is_empty() {
        println!("No targets registered");
        return;
    }
    println!("{}", targets_table(registry));
}

/// One row per target: triple, package architecture, GNU triplet, libraries.
pub fn targets_table(registry: &Registry) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_header(vec!["target", "arch", "triplet", "libraries"]);

    for entry in registry.targets() {
        let libraries = entry
            .mappings()
            .map(|m| m.library().as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            entry.triple().to_string(),
            entry.multiarch().qualifier().to_string(),
            entry.multiarch().triplet().to_string(),
            libraries,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rows() {
        let registry = Registry::builtin().unwrap();
        let rendered = targets_table(&registry).to_string();
        assert!(rendered.contains("armv7-unknown-linux-gnueabihf"));
        assert!(rendered.contains("armhf"));
        assert!(rendered.contains("arm-linux-gnueabihf"));
        for entry in registry.targets() {
            assert!(rendered.contains(&entry.triple().to_string()));
        }
    }
}
