//! Tool type to product image lookup

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps a normalized tool type (trimmed, lowercase) to an image URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ImageMapRepr")]
pub struct TypeImageMap {
    images: BTreeMap<String, String>,
    /// Used when a tool type has no entry; may be empty
    default_image: String,
}

#[derive(Deserialize)]
struct ImageMapRepr {
    #[serde(default)]
    images: BTreeMap<String, String>,
    #[serde(default)]
    default_image: String,
}

impl From<ImageMapRepr> for TypeImageMap {
    fn from(repr: ImageMapRepr) -> Self {
        let mut map = TypeImageMap::new(repr.default_image);
        for (tool_type, url) in repr.images {
            map.insert(&tool_type, url);
        }
        map
    }
}

fn normalize(tool_type: &str) -> String {
    tool_type.trim().to_lowercase()
}

impl TypeImageMap {
    /// Create an empty map with the given fallback image
    pub fn new(default_image: impl Into<String>) -> Self {
        Self {
            images: BTreeMap::new(),
            default_image: default_image.into(),
        }
    }

    /// Product images for the common Fusion tool types (MSC Direct catalog)
    pub fn builtin() -> Self {
        const MSC: &str = "https://cdn.mscdirect.com/global/images/ProductImages/";
        let mut map = Self::new(
            "https://www.fictiv.com/wp-content/uploads/2021/05/image2-1-1536x864.jpg",
        );
        for (tool_type, image) in [
            ("flat end mill", "6085135AA-24.jpg"),
            ("ball end mill", "2976776-24.jpg"),
            ("chamfer mill", "4805697-24.jpg"),
            ("drill", "7851792-21.jpg"),
            ("tap right hand", "4122844-24.jpg"),
            ("spot drill", "4540303-24.jpg"),
            ("bull nose end mill", "8695501-21.jpg"),
            ("thread mill", "7604790-24.jpg"),
            ("slot mill", "7306018-24.jpg"),
            ("dovetail mill", "0182832-24.jpg"),
        ] {
            map.insert(tool_type, format!("{MSC}{image}"));
        }
        map
    }

    /// Add or replace an entry; the key is normalized
    pub fn insert(&mut self, tool_type: &str, url: impl Into<String>) {
        self.images.insert(normalize(tool_type), url.into());
    }

    pub fn with(mut self, tool_type: &str, url: impl Into<String>) -> Self {
        self.insert(tool_type, url);
        self
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    pub fn set_default_image(&mut self, url: impl Into<String>) {
        self.default_image = url.into();
    }

    /// Image URL for a raw tool type value, or the default image
    pub fn lookup(&self, tool_type: &str) -> &str {
        self.images
            .get(&normalize(tool_type))
            .map(String::as_str)
            .unwrap_or(&self.default_image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
