//! Game discovery and entry-point lookup.
//!
//! A game is any sub-directory of the games root containing a `game.toml`
//! manifest. Discovery runs once at startup; entry points are resolved
//! against a fixed table of built-in games, never loaded dynamically.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::games::{self, EntryPoint};
use crate::paths;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("game not found: {0}")]
    NotFound(String),
    #[error("failed to load game '{id}': {reason}")]
    LoadFailure { id: String, reason: String },
}

/// One discovered game. Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDescriptor {
    /// Directory name, e.g. `car_racing`.
    pub id: String,
    /// Title-cased directory name, e.g. `Car Racing`.
    pub display_name: String,
    pub source_path: PathBuf,
    /// Name of the built-in entry point this game runs.
    pub entry_point: String,
    pub description: Option<String>,
    pub thumbnail: Option<PathBuf>,
}

/// Contents of `game.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default)]
struct Manifest {
    entry: Option<String>,
    description: Option<String>,
}

pub struct GameRegistry {
    games: Vec<GameDescriptor>,
    entry_points: HashMap<&'static str, EntryPoint>,
    diagnostic: Option<String>,
}

impl GameRegistry {
    /// Scans `root` and binds the discovered games to the built-in entry points.
    pub fn discover(root: &Path) -> Self {
        let (games, diagnostic) = discover(root);
        Self::from_parts(games, games::builtin_entry_points(), diagnostic)
    }

    pub fn from_parts(
        games: Vec<GameDescriptor>,
        entry_points: Vec<(&'static str, EntryPoint)>,
        diagnostic: Option<String>,
    ) -> Self {
        Self {
            games,
            entry_points: entry_points.into_iter().collect(),
            diagnostic,
        }
    }

    pub fn games(&self) -> &[GameDescriptor] {
        &self.games
    }

    pub fn get(&self, id: &str) -> Option<&GameDescriptor> {
        self.games.iter().find(|g| g.id == id)
    }

    /// Why discovery came back empty, if it failed outright.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Looks up the entry point of the game with `id`.
    pub fn resolve_entry_point(&self, id: &str) -> Result<EntryPoint, RegistryError> {
        let game = self
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.entry_points
            .get(game.entry_point.as_str())
            .copied()
            .ok_or_else(|| RegistryError::LoadFailure {
                id: id.to_string(),
                reason: format!("no built-in entry point named '{}'", game.entry_point),
            })
    }
}

/// Lists the immediate sub-directories of `root` that contain a manifest,
/// sorted by id. A missing or unreadable root yields no games and a
/// diagnostic message instead of an error.
pub fn discover(root: &Path) -> (Vec<GameDescriptor>, Option<String>) {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            let msg = format!("Games directory not found: {} ({e})", root.display());
            warn!(target: "registry", "{msg}");
            return (Vec::new(), Some(msg));
        }
    };

    let mut games = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(target: "registry", "Skipping unreadable entry in {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() || !paths::manifest_path(&path).is_file() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();
        let manifest = read_manifest(&path);
        games.push(GameDescriptor {
            display_name: display_name(&id),
            entry_point: manifest.entry.unwrap_or_else(|| id.clone()),
            description: manifest.description,
            thumbnail: paths::find_thumbnail(&path),
            source_path: path,
            id,
        });
    }
    games.sort_by(|a, b| a.id.cmp(&b.id));

    info!(target: "registry", "Discovered {} game(s) in {}", games.len(), root.display());
    (games, None)
}

/// A manifest that cannot be read or parsed still marks the directory as a
/// game; its keys fall back to their defaults.
fn read_manifest(game_dir: &Path) -> Manifest {
    let path = paths::manifest_path(game_dir);
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str::<Manifest>(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(target: "registry", "Ignoring bad manifest {}: {e}", path.display());
            Manifest::default()
        }
    }
}

/// `car_racing` -> `Car Racing`. Splits on `_`, `-` and spaces and capitalizes
/// each part (first letter upper, rest lower).
pub fn display_name(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
