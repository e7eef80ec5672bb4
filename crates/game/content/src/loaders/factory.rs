//! Content factory for loading a whole session's content from a data
//! directory.

use std::path::{Path, PathBuf};

use arena_core::AgentConfig;

use crate::layout::ArenaLayout;
use crate::loaders::{ArenaLoader, ConfigLoader, LoadResult, TemplateLoader};
use crate::session::SessionConfig;

/// Everything a session needs, loaded and validated.
#[derive(Clone, Debug)]
pub struct ContentBundle {
    pub session: SessionConfig,
    pub templates: Vec<(String, AgentConfig)>,
    pub arena: ArenaLayout,
}

/// Content factory that loads all arena content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── session.toml
/// ├── agents.ron
/// └── arenas/
///     └── courtyard.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load session configuration from `session.toml`.
    pub fn load_session(&self) -> LoadResult<SessionConfig> {
        ConfigLoader::load(&self.data_dir.join("session.toml"))
    }

    /// Load agent templates from `agents.ron`.
    pub fn load_templates(&self) -> LoadResult<Vec<(String, AgentConfig)>> {
        TemplateLoader::load(&self.data_dir.join("agents.ron"))
    }

    /// Load an arena from `arenas/{name}.ron`.
    pub fn load_arena(&self, name: &str) -> LoadResult<ArenaLayout> {
        let path = self.data_dir.join("arenas").join(format!("{}.ron", name));
        ArenaLoader::load(&path)
    }

    /// Load the session config, then the templates and the arena it names.
    ///
    /// Spawner template keys are checked against the loaded catalog.
    pub fn load_bundle(&self) -> LoadResult<ContentBundle> {
        let session = self.load_session()?;
        let templates = self.load_templates()?;
        let arena = self.load_arena(&session.session.arena)?;

        if let Some(missing) = session
            .spawner
            .templates
            .iter()
            .find(|key| !templates.iter().any(|(known, _)| known == *key))
        {
            anyhow::bail!("Spawner references unknown agent template '{}'", missing);
        }

        Ok(ContentBundle {
            session,
            templates,
            arena,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
