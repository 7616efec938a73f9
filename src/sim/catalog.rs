/// Entity pool supplier.
///
/// ## Sources (priority order):
///   1. `catalog.toml` (path from config)
///   2. Built-in embedded catalog
///
/// A missing catalog file falls back to the built-in entries. A catalog file
/// that exists but lists nothing for the active category yields an empty
/// pool: the game then reports "no content" instead of starting.
///
/// ## Catalog format:
///   ```toml
///   [[constellations]]
///   id = "orion"
///   title = "Orion"
///   description = "The Hunter"      # optional
///
///   [[galaxies]]
///   id = "andromeda"
///   title = "Andromeda Galaxy"
///   ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::sky::{Category, Entity};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate {category} id '{id}'")]
    DuplicateId { category: &'static str, id: String },

    #[error("{category} entry #{index} has an empty id")]
    EmptyId { category: &'static str, index: usize },
}

/// Anything that can list catalog entities for a category.
pub trait EntitySource {
    fn list_entities(&self, category: Category) -> Result<Vec<Entity>, CatalogError>;

    /// Look up one entity by id. `Ok(None)` when absent.
    fn find_entity(&self, category: Category, id: &str) -> Result<Option<Entity>, CatalogError> {
        Ok(self.list_entities(category)?.into_iter().find(|e| e.id == id))
    }

    /// Short label for the title screen.
    fn label(&self) -> String;
}

// ══════════════════════════════════════════════════════════════
// TOML catalog file
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug, Default)]
struct TomlCatalog {
    #[serde(default)]
    stars: Vec<TomlEntry>,
    #[serde(default)]
    constellations: Vec<TomlEntry>,
    #[serde(default)]
    galaxies: Vec<TomlEntry>,
}

#[derive(Deserialize, Debug)]
struct TomlEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
}

pub struct CatalogFile {
    path: PathBuf,
}

impl CatalogFile {
    pub fn new(path: &Path) -> Self {
        CatalogFile { path: path.to_path_buf() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl EntitySource for CatalogFile {
    fn list_entities(&self, category: Category) -> Result<Vec<Entity>, CatalogError> {
        if !self.exists() {
            return Ok(vec![]);
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_catalog(&text, category)
    }

    fn label(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Parse catalog text and return the entries for one category.
pub fn parse_catalog(text: &str, category: Category) -> Result<Vec<Entity>, CatalogError> {
    let cat: TomlCatalog = toml::from_str(text)?;
    let entries = match category {
        Category::Stars => cat.stars,
        Category::Constellations => cat.constellations,
        Category::Galaxies => cat.galaxies,
    };

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry.id.trim().to_string();
        if id.is_empty() {
            return Err(CatalogError::EmptyId { category: category.plural(), index });
        }
        if !seen.insert(id.clone()) {
            return Err(CatalogError::DuplicateId { category: category.plural(), id });
        }
        let title = entry.title.trim();
        // Untitled entries show their id.
        let name = if title.is_empty() { id.clone() } else { title.to_string() };
        out.push(Entity {
            id,
            name,
            category,
            description: entry.description.filter(|d| !d.trim().is_empty()),
        });
    }
    Ok(out)
}

// ══════════════════════════════════════════════════════════════
// Built-in catalog
// ══════════════════════════════════════════════════════════════

pub struct BuiltinCatalog;

const BUILTIN_CONSTELLATIONS: &[(&str, &str, &str)] = &[
    ("orion", "Orion", "The Hunter"),
    ("ursa-major", "Ursa Major", "The Great Bear"),
    ("cassiopeia", "Cassiopeia", "The Seated Queen"),
    ("cygnus", "Cygnus", "The Swan"),
    ("scorpius", "Scorpius", "The Scorpion"),
    ("lyra", "Lyra", "The Lyre"),
    ("leo", "Leo", "The Lion"),
    ("crux", "Crux", "The Southern Cross"),
    ("andromeda", "Andromeda", "The Chained Princess"),
    ("perseus", "Perseus", "The Hero"),
    ("taurus", "Taurus", "The Bull"),
    ("gemini", "Gemini", "The Twins"),
];

const BUILTIN_STARS: &[(&str, &str, &str)] = &[
    ("sirius", "Sirius", "Alpha Canis Majoris"),
    ("betelgeuse", "Betelgeuse", "Alpha Orionis"),
    ("vega", "Vega", "Alpha Lyrae"),
    ("polaris", "Polaris", "Alpha Ursae Minoris"),
    ("rigel", "Rigel", "Beta Orionis"),
    ("antares", "Antares", "Alpha Scorpii"),
];

const BUILTIN_GALAXIES: &[(&str, &str, &str)] = &[
    ("milky-way", "Milky Way", "Barred spiral"),
    ("andromeda-galaxy", "Andromeda Galaxy", "Spiral, M31"),
    ("triangulum", "Triangulum Galaxy", "Spiral, M33"),
    ("whirlpool", "Whirlpool Galaxy", "Spiral, M51"),
    ("sombrero", "Sombrero Galaxy", "Lenticular, M104"),
    ("large-magellanic-cloud", "Large Magellanic Cloud", "Irregular"),
];

impl EntitySource for BuiltinCatalog {
    fn list_entities(&self, category: Category) -> Result<Vec<Entity>, CatalogError> {
        let table = match category {
            Category::Stars => BUILTIN_STARS,
            Category::Constellations => BUILTIN_CONSTELLATIONS,
            Category::Galaxies => BUILTIN_GALAXIES,
        };
        Ok(table
            .iter()
            .map(|&(id, name, desc)| Entity {
                id: id.to_string(),
                name: name.to_string(),
                category,
                description: Some(desc.to_string()),
            })
            .collect())
    }

    fn label(&self) -> String {
        "built-in catalog".to_string()
    }
}

// ══════════════════════════════════════════════════════════════
// Pool loading
// ══════════════════════════════════════════════════════════════

/// A loaded pool plus where it came from.
pub struct LoadedPool {
    pub entities: Vec<Entity>,
    pub source: String,
}

/// Load the entity pool for `category`, falling back to the built-in
/// catalog when the file is missing or unreadable. A non-empty `playlist`
/// narrows the pool to those ids.
pub fn load_pool(catalog_path: &Path, category: Category, playlist: &[String]) -> LoadedPool {
    let file = CatalogFile::new(catalog_path);
    if file.exists() {
        match pool_from(&file, category, playlist) {
            Ok(entities) => {
                debug!(count = entities.len(), source = %file.label(), "catalog loaded");
                return LoadedPool { entities, source: file.label() };
            }
            Err(e) => warn!(error = %e, "catalog unusable, using built-in entries"),
        }
    }
    let builtin = BuiltinCatalog;
    let entities = pool_from(&builtin, category, playlist).unwrap_or_default();
    LoadedPool { entities, source: builtin.label() }
}

/// Playlist ids in order, skipping unknown and repeated ones. The whole
/// category is used when the playlist is empty or nothing in it matches.
fn pool_from(source: &dyn EntitySource, category: Category, playlist: &[String]) -> Result<Vec<Entity>, CatalogError> {
    if playlist.is_empty() {
        return source.list_entities(category);
    }
    let mut picked: Vec<Entity> = Vec::with_capacity(playlist.len());
    for id in playlist {
        match source.find_entity(category, id.trim())? {
            Some(e) if !picked.iter().any(|p| p.id == e.id) => picked.push(e),
            Some(_) => {}
            None => warn!(id = %id, source = %source.label(), "playlist entry not in catalog"),
        }
    }
    if picked.is_empty() {
        warn!(category = category.plural(), "no playlist entry matched, using the whole category");
        return source.list_entities(category);
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[constellations]]
id = "orion"
title = "Orion"
description = "The Hunter"

[[constellations]]
id = "lyra"

[[galaxies]]
id = "m31"
title = "Andromeda"
"#;

    #[test]
    fn parses_one_category() {
        let list = parse_catalog(SAMPLE, Category::Constellations).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Orion");
        assert_eq!(list[0].description.as_deref(), Some("The Hunter"));
        // Missing title falls back to id
        assert_eq!(list[1].name, "lyra");
        assert_eq!(list[1].category, Category::Constellations);
    }

    #[test]
    fn empty_category_is_not_an_error() {
        let list = parse_catalog(SAMPLE, Category::Stars).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = "[[stars]]\nid = \"vega\"\n[[stars]]\nid = \"vega\"\n";
        match parse_catalog(text, Category::Stars) {
            Err(CatalogError::DuplicateId { id, .. }) => assert_eq!(id, "vega"),
            other => panic!("expected duplicate id, got {other:?}"),
        }
    }

    #[test]
    fn blank_id_is_rejected() {
        let text = "[[galaxies]]\nid = \"  \"\n";
        assert!(matches!(
            parse_catalog(text, Category::Galaxies),
            Err(CatalogError::EmptyId { index: 0, .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            parse_catalog("[[stars]\nid=", Category::Stars),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn builtin_lookup() {
        let b = BuiltinCatalog;
        for cat in [Category::Stars, Category::Constellations, Category::Galaxies] {
            assert!(!b.list_entities(cat).unwrap().is_empty());
        }
        let orion = b.find_entity(Category::Constellations, "orion").unwrap();
        assert_eq!(orion.map(|e| e.name), Some("Orion".to_string()));
        assert!(b.find_entity(Category::Constellations, "nope").unwrap().is_none());
    }

    #[test]
    fn missing_file_uses_builtin() {
        let pool = load_pool(Path::new("/nonexistent/catalog.toml"), Category::Galaxies, &[]);
        assert_eq!(pool.source, "built-in catalog");
        assert!(!pool.entities.is_empty());
    }

    #[test]
    fn playlist_narrows_pool_in_order() {
        let playlist: Vec<String> = ["lyra", "nope", "orion", "lyra"].iter().map(|s| s.to_string()).collect();
        let pool = load_pool(Path::new("/nonexistent/catalog.toml"), Category::Constellations, &playlist);
        let ids: Vec<&str> = pool.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["lyra", "orion"]);
    }

    #[test]
    fn unmatched_playlist_keeps_whole_category() {
        let playlist = vec!["andromeda-galaxy".to_string()];
        let list = pool_from(&BuiltinCatalog, Category::Stars, &playlist).unwrap();
        assert_eq!(list.len(), BUILTIN_STARS.len());
    }
}
