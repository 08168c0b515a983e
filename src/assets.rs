//! Texture cache handed to levels at construction
//!
//! The graphics layer owns actual texture objects; this crate only sees
//! opaque handles obtained through a `TextureLoader`. The cache is created
//! once with `AssetCache::init` and released with `AssetCache::teardown`.

use std::collections::HashMap;
use thiserror::Error;
use crate::game::monster::MONSTER_FRAMES;
use crate::game::medkit::MEDKIT_TEXTURE;

/// Wall/floor/ceiling atlas
pub const LEVEL_ATLAS: &str = "WolfCollection.png";
/// Held pistol sprite
pub const GUN_TEXTURE: &str = "PISGB0.png";

/// Opaque handle issued by the graphics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Texture plus RGBA tint, attached to every render item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub texture: TextureHandle,
    pub tint: [f32; 4],
}

impl Material {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    pub fn new(texture: TextureHandle) -> Self {
        Self { texture, tint: Self::WHITE }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load texture {name}: {reason}")]
    Load { name: String, reason: String },
}

/// Implemented by the graphics layer
pub trait TextureLoader {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, String>;
    fn release_texture(&mut self, handle: TextureHandle);
}

/// Every texture the runtime draws with
#[derive(Debug)]
pub struct AssetCache {
    pub level_atlas: Material,
    /// Indexed like `MONSTER_FRAMES`
    pub monster_frames: Vec<Material>,
    pub medkit: Material,
    pub gun: Material,
}

fn load(loader: &mut dyn TextureLoader, name: &str) -> Result<Material, AssetError> {
    let handle = loader.load_texture(name).map_err(|reason| AssetError::Load {
        name: name.to_string(),
        reason,
    })?;
    log::debug!("loaded texture {} as {:?}", name, handle);
    Ok(Material::new(handle))
}

impl AssetCache {
    pub fn init(loader: &mut dyn TextureLoader) -> Result<Self, AssetError> {
        let level_atlas = load(loader, LEVEL_ATLAS)?;
        let monster_frames = MONSTER_FRAMES
            .iter()
            .map(|name| load(loader, name))
            .collect::<Result<Vec<_>, _>>()?;
        let medkit = load(loader, MEDKIT_TEXTURE)?;
        let gun = load(loader, GUN_TEXTURE)?;

        log::info!("asset cache ready ({} textures)", monster_frames.len() + 3);
        Ok(Self { level_atlas, monster_frames, medkit, gun })
    }

    /// Material for a monster animation frame, clamped to the last frame
    pub fn monster_frame(&self, frame: usize) -> Material {
        let last = self.monster_frames.len().saturating_sub(1);
        self.monster_frames
            .get(frame.min(last))
            .copied()
            .unwrap_or(self.level_atlas)
    }

    fn handles(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        std::iter::once(self.level_atlas.texture)
            .chain(self.monster_frames.iter().map(|m| m.texture))
            .chain([self.medkit.texture, self.gun.texture])
    }

    pub fn teardown(self, loader: &mut dyn TextureLoader) {
        for handle in self.handles() {
            loader.release_texture(handle);
        }
        log::info!("asset cache released");
    }
}

/// Loader for running without a graphics layer: hands out sequential
/// handles by name and never fails.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    handles: HashMap<String, TextureHandle>,
    next: u32,
}

impl HeadlessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> usize {
        self.handles.len()
    }
}

impl TextureLoader for HeadlessLoader {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, String> {
        if let Some(handle) = self.handles.get(name) {
            return Ok(*handle);
        }
        let handle = TextureHandle(self.next);
        self.next += 1;
        self.handles.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.handles.retain(|_, h| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MissingGun;

    impl TextureLoader for MissingGun {
        fn load_texture(&mut self, name: &str) -> Result<TextureHandle, String> {
            if name == GUN_TEXTURE {
                Err("no such file".to_string())
            } else {
                Ok(TextureHandle(1))
            }
        }

        fn release_texture(&mut self, _handle: TextureHandle) {}
    }

    #[test]
    fn test_init_and_teardown() {
        let mut loader = HeadlessLoader::new();
        let cache = AssetCache::init(&mut loader).unwrap();
        assert_eq!(cache.monster_frames.len(), 13);
        assert_eq!(loader.loaded(), 16);

        cache.teardown(&mut loader);
        assert_eq!(loader.loaded(), 0);
    }

    #[test]
    fn test_missing_texture_names_file() {
        let err = AssetCache::init(&mut MissingGun).unwrap_err();
        assert!(err.to_string().contains(GUN_TEXTURE));
    }

    #[test]
    fn test_monster_frame_clamps() {
        let mut loader = HeadlessLoader::new();
        let cache = AssetCache::init(&mut loader).unwrap();
        assert_eq!(cache.monster_frame(99), cache.monster_frames[12]);
    }
}
