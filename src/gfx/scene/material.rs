use std::sync::Arc;

use crate::math::Vec3;

/// How texture coordinates outside `[0, 1]` are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

/// Decoded RGBA8 pixels ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
}

/// Surface description consumed by the renderer and reported by picking.
///
/// Textured materials sample their base colour through the mesh's UVs.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Color {
        color: Vec3,
        specular_color: Vec3,
        shininess: f32,
    },
    Texture {
        texture: Arc<TextureData>,
        shininess: f32,
    },
}

impl Material {
    pub fn color(color: Vec3, specular_color: Vec3, shininess: f32) -> Self {
        Material::Color {
            color,
            specular_color,
            shininess,
        }
    }

    /// Flat base colour, `None` for textured materials
    pub fn flat_color(&self) -> Option<Vec3> {
        match self {
            Material::Color { color, .. } => Some(*color),
            Material::Texture { .. } => None,
        }
    }

    pub fn shininess(&self) -> f32 {
        match self {
            Material::Color { shininess, .. } | Material::Texture { shininess, .. } => *shininess,
        }
    }

    /// Textured materials use a neutral grey highlight
    pub fn specular_color(&self) -> Vec3 {
        match self {
            Material::Color { specular_color, .. } => *specular_color,
            Material::Texture { .. } => Vec3::new(0.2, 0.2, 0.2),
        }
    }

    pub fn texture(&self) -> Option<&Arc<TextureData>> {
        match self {
            Material::Color { .. } => None,
            Material::Texture { texture, .. } => Some(texture),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::color(Vec3::new(0.8, 0.8, 0.8), Vec3::new(0.2, 0.2, 0.2), 0.9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_both_variants() {
        let flat = Material::color(Vec3::new(0.1, 0.7, 0.1), Vec3::new(0.2, 0.2, 0.2), 0.5);
        assert_eq!(flat.flat_color(), Some(Vec3::new(0.1, 0.7, 0.1)));
        assert_eq!(flat.shininess(), 0.5);
        assert!(flat.texture().is_none());

        let textured = Material::Texture {
            texture: Arc::new(TextureData {
                name: None,
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0, 255],
                wrap_u: WrapMode::Repeat,
                wrap_v: WrapMode::ClampToEdge,
            }),
            shininess: 32.0,
        };
        assert_eq!(textured.flat_color(), None);
        assert_eq!(textured.shininess(), 32.0);
        assert_eq!(textured.texture().map(|t| t.width), Some(1));
    }
}
