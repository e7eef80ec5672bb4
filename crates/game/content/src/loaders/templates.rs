//! Agent template catalog loader.

use std::path::Path;

use arena_core::AgentConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for agent templates from RON files.
pub struct TemplateLoader;

impl TemplateLoader {
    /// Load the template catalog from a RON file.
    ///
    /// RON format: `Vec<(String, AgentConfig)>`. Omitted `AgentConfig`
    /// fields take their defaults. Every template is validated, and keys must
    /// be unique.
    pub fn load(path: &Path) -> LoadResult<Vec<(String, AgentConfig)>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<(String, AgentConfig)>> {
        let templates: Vec<(String, AgentConfig)> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse agent templates RON: {}", e))?;

        for (index, (key, config)) in templates.iter().enumerate() {
            if templates[..index].iter().any(|(other, _)| other == key) {
                anyhow::bail!("Duplicate agent template '{}'", key);
            }
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid agent template '{}': {}", key, e))?;
        }

        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_take_defaults() {
        let templates = TemplateLoader::parse(
            r#"[
                ("runner", (display_name: "Runner", move_speed: 5.0)),
            ]"#,
        )
        .unwrap();

        let (key, config) = &templates[0];
        assert_eq!(key, "runner");
        assert_eq!(config.move_speed, 5.0);
        assert_eq!(config.max_health, AgentConfig::default().max_health);
    }

    #[test]
    fn invalid_ranges_are_reported_with_the_key() {
        let err = TemplateLoader::parse(
            r#"[("broken", (min_roam_distance: 9.0, max_roam_distance: 1.0))]"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = TemplateLoader::parse(r#"[("a", (display_name: "A")), ("a", (display_name: "B"))]"#).unwrap_err();

        assert!(err.to_string().contains("Duplicate"));
    }
}
