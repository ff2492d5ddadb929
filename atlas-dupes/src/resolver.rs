//! GUID resolution capability.
//!
//! The analyzer does not know where assets live. It asks an [`AssetResolver`]
//! to turn a GUID into a path and a kind, and drops anything that comes back
//! empty or is not an image. [`crate::MetaIndex`] resolves against `.meta`
//! files on disk; tests and embedders can pass a map or a closure.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::path::Path;
use std::str::FromStr;

use asset_guid::AssetGuid;
use indexmap::IndexMap;
use serde::Serialize;

/// What a resolved GUID points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// An image imported as a plain texture.
    Texture,
    /// An image imported as a sprite.
    Sprite,
    /// A sprite atlas asset.
    SpriteAtlas,
    /// A folder.
    Folder,
    /// Anything else.
    Other,
}

impl AssetKind {
    /// Stable lowercase name used in CLI flags and output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Texture => "texture",
            Self::Sprite => "sprite",
            Self::SpriteAtlas => "sprite-atlas",
            Self::Folder => "folder",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "texture" => Ok(Self::Texture),
            "sprite" => Ok(Self::Sprite),
            "sprite-atlas" | "spriteatlas" => Ok(Self::SpriteAtlas),
            "folder" => Ok(Self::Folder),
            "other" => Ok(Self::Other),
            _ => Err(format!(
                "unknown asset kind '{s}' (expected texture, sprite, sprite-atlas, folder or other)"
            )),
        }
    }
}

/// Where a GUID points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAsset {
    /// Project-relative, `/`-separated asset path.
    pub path: String,
    /// Asset kind.
    pub kind: AssetKind,
}

impl ResolvedAsset {
    /// Create a resolved asset.
    #[must_use]
    pub fn new(path: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// File name without extension, used as the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.path)
    }
}

/// Resolves GUIDs to assets.
pub trait AssetResolver {
    /// Look up a GUID. `None` means not found.
    fn resolve(&self, guid: &AssetGuid) -> Option<ResolvedAsset>;
}

impl<F> AssetResolver for F
where
    F: Fn(&AssetGuid) -> Option<ResolvedAsset>,
{
    fn resolve(&self, guid: &AssetGuid) -> Option<ResolvedAsset> {
        self(guid)
    }
}

impl<S: BuildHasher> AssetResolver for HashMap<AssetGuid, ResolvedAsset, S> {
    fn resolve(&self, guid: &AssetGuid) -> Option<ResolvedAsset> {
        self.get(guid).cloned()
    }
}

impl<S: BuildHasher> AssetResolver for IndexMap<AssetGuid, ResolvedAsset, S> {
    fn resolve(&self, guid: &AssetGuid) -> Option<ResolvedAsset> {
        self.get(guid).cloned()
    }
}
