//! Arena layout loader.

use std::path::Path;

use crate::layout::ArenaLayout;
use crate::loaders::{LoadResult, read_file};

/// Loader for arena layouts from RON files.
pub struct ArenaLoader;

impl ArenaLoader {
    /// Load and validate an arena layout from a RON file.
    pub fn load(path: &Path) -> LoadResult<ArenaLayout> {
        let content = read_file(path)?;
        let layout: ArenaLayout = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse arena RON: {}", e))?;

        layout
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid arena '{}': {}", layout.name, e))?;

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn loads_a_layout_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r####"(
                name: "pit",
                cell_size: 1.0,
                rows: ["###", "#.#", "###"],
                spawn_points: [(1.5, 1.5)],
            )"####
        )
        .unwrap();

        let layout = ArenaLoader::load(file.path()).unwrap();

        assert_eq!(layout.name, "pit");
        assert!(layout.player_starts.is_empty());
        assert_eq!(layout.blocked_cells().count(), 8);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = ArenaLoader::load(&dir.path().join("nope.ron")).unwrap_err();

        assert!(err.to_string().contains("Failed to read file"));
    }
}
