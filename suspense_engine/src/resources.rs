use std::collections::BTreeSet;

use crate::error::{EngineError, EngineResult};

/// Opaque handle to a loaded image; the engine never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle(pub u64);

/// Opaque handle to a loaded font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontHandle(pub u64);

/// Boundary to the asset subsystem. An unknown resource is a content bug
/// the engine does not try to recover from; the error propagates to the
/// top level.
pub trait ResourceLoader {
    fn get_image(&self, folder: &str, name: &str) -> EngineResult<ImageHandle>;
    fn get_font(&self, name: &str, size: u32) -> EngineResult<FontHandle>;
}

/// Loader backed by a static manifest of known asset names. Used by content
/// validation tests so missing-asset errors surface during development, not
/// in a shipped build.
#[derive(Debug, Default)]
pub struct ManifestLoader {
    images: BTreeSet<(String, String)>,
    fonts: BTreeSet<String>,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images<'a, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (folder, name) in entries {
            self.images.insert((folder.to_string(), name.to_string()));
        }
        self
    }

    pub fn with_fonts<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.fonts.insert(name.to_string());
        }
        self
    }
}

impl ResourceLoader for ManifestLoader {
    fn get_image(&self, folder: &str, name: &str) -> EngineResult<ImageHandle> {
        let key = (folder.to_string(), name.to_string());
        if !self.images.contains(&key) {
            return Err(EngineError::MissingResource {
                folder: folder.to_string(),
                name: name.to_string(),
            });
        }
        // handles are positional within the manifest
        let index = self.images.iter().position(|entry| *entry == key);
        Ok(ImageHandle(index.unwrap_or(0) as u64))
    }

    fn get_font(&self, name: &str, _size: u32) -> EngineResult<FontHandle> {
        let index = self
            .fonts
            .iter()
            .position(|entry| entry == name)
            .ok_or_else(|| EngineError::MissingResource {
                folder: "fonts".to_string(),
                name: name.to_string(),
            })?;
        Ok(FontHandle(index as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_loader_resolves_known_assets() {
        let loader = ManifestLoader::new()
            .with_images([("cryo", "door_closed.png")])
            .with_fonts(["DejaVuSans.ttf"]);
        assert!(loader.get_image("cryo", "door_closed.png").is_ok());
        assert!(loader.get_font("DejaVuSans.ttf", 18).is_ok());
    }

    #[test]
    fn unknown_assets_are_errors() {
        let loader = ManifestLoader::new();
        assert!(matches!(
            loader.get_image("cryo", "door_closed.png"),
            Err(EngineError::MissingResource { .. })
        ));
        assert!(loader.get_font("DejaVuSans.ttf", 18).is_err());
    }
}
