use crate::config_loader::config_path;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigRow};
use anyhow::Result;
use spotmap_core::config::{ConfigSource, LayeredConfig};
use std::path::Path;

fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "env",
        ConfigSource::Cli => "cli",
    }
}

fn entries(config: &LayeredConfig) -> Vec<ConfigEntry> {
    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry {
            key,
            value,
            source: source_label(source).to_string(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

pub fn execute(
    config: &LayeredConfig,
    explicit: Option<&Path>,
    output: &OutputWriter,
) -> Result<()> {
    let entries = entries(config);

    if output.is_json() {
        return output.result(entries);
    }

    output.section("Effective configuration");
    match config_path(explicit) {
        Some(path) => output.kv("Config file", path.display()),
        None => output.kv("Config file", "(none)"),
    }
    output.table(
        entries
            .into_iter()
            .map(|e| ConfigRow { key: e.key, value: e.value, source: e.source })
            .collect(),
    );
    output.info("Precedence: cli > env > file > default");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_report_sources() {
        let mut config = LayeredConfig::with_defaults();
        config.page_size.update(50, ConfigSource::Cli);

        let entries = entries(&config);
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys.first(), Some(&"debounce_ms"));

        let page_size =
            entries.iter().find(|e| e.key == "page_size").map(|e| (&*e.value, &*e.source));
        assert_eq!(page_size, Some(("50", "cli")));
    }
}
