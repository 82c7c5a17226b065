//! Materials: a shader plus typed parameters.
//!
//! `.mat` files are JSON. The shader and any texture parameters are asset
//! keys and are resolved as dependencies, so editing them re-imports the
//! material.
//!
//! ```json
//! {
//!   "shader": "surface.shader",
//!   "properties": {
//!     "albedo": { "color": [1.0, 0.9, 0.8, 1.0] },
//!     "roughness": { "float": 0.4 },
//!     "albedo_map": { "texture": "textures.bricks.png" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use lumen_core::math::{Color, Vec2, Vec3, Vec4};
use serde::Deserialize;

use crate::error::AssetResult;
use crate::handle::AssetRef;
use crate::importer::{AssetImporter, ImportContext};
use crate::key::AssetKey;
use crate::kinds::{Shader, Texture};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialDesc {
    shader: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertyDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PropertyDesc {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Color([f32; 4]),
    Texture(String),
}

/// A resolved material parameter.
#[derive(Debug, Clone)]
pub enum MaterialProperty {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Color),
    /// `None` when the texture key could not be resolved.
    Texture(Option<AssetRef<Texture>>),
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    shader_key: Option<AssetKey>,
    shader: Option<AssetRef<Shader>>,
    properties: BTreeMap<String, MaterialProperty>,
}

impl Material {
    /// Key of the shader named by the source, resolved or not.
    pub fn shader_key(&self) -> Option<&AssetKey> {
        self.shader_key.as_ref()
    }

    /// The resolved shader, shared with the cache.
    pub fn shader(&self) -> Option<&AssetRef<Shader>> {
        self.shader.as_ref()
    }

    pub fn property(&self, name: &str) -> Option<&MaterialProperty> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &MaterialProperty)> {
        self.properties.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.properties.get(name)? {
            MaterialProperty::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        match self.properties.get(name)? {
            MaterialProperty::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&AssetRef<Texture>> {
        match self.properties.get(name)? {
            MaterialProperty::Texture(v) => v.as_ref(),
            _ => None,
        }
    }
}

pub struct MaterialImporter;

impl AssetImporter for MaterialImporter {
    type Asset = Material;

    fn extensions(&self) -> &[&str] {
        &["mat"]
    }

    fn read_asset_data(&self, asset: &mut Material, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        let desc: MaterialDesc = serde_json::from_slice(ctx.bytes())
            .map_err(|e| ctx.malformed(format!("Invalid material: {}", e)))?;

        let shader_key = AssetKey::new(&desc.shader);
        let shader = ctx.dependency::<Shader>(shader_key.clone());

        let mut properties = BTreeMap::new();
        for (name, desc) in desc.properties {
            let value = match desc {
                PropertyDesc::Float(v) => MaterialProperty::Float(v),
                PropertyDesc::Int(v) => MaterialProperty::Int(v),
                PropertyDesc::Vec2(v) => MaterialProperty::Vec2(Vec2::from_array(v)),
                PropertyDesc::Vec3(v) => MaterialProperty::Vec3(Vec3::from_array(v)),
                PropertyDesc::Vec4(v) => MaterialProperty::Vec4(Vec4::from_array(v)),
                PropertyDesc::Color(v) => MaterialProperty::Color(Color::from_array(v)),
                PropertyDesc::Texture(key) => MaterialProperty::Texture(ctx.dependency::<Texture>(key)),
            };
            properties.insert(name, value);
        }

        *asset = Material {
            shader_key: Some(shader_key),
            shader,
            properties,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_parses_typed_properties() {
        let json = r#"{
            "shader": "surface.shader",
            "properties": {
                "roughness": { "float": 0.5 },
                "layers": { "int": 2 },
                "tint": { "color": [1, 0, 0, 1] },
                "albedo_map": { "texture": "bricks.png" }
            }
        }"#;
        let desc: MaterialDesc = serde_json::from_str(json).unwrap();
        assert_eq!(desc.shader, "surface.shader");
        assert_eq!(desc.properties.len(), 4);
        assert!(matches!(desc.properties["layers"], PropertyDesc::Int(2)));
        assert!(matches!(&desc.properties["albedo_map"], PropertyDesc::Texture(k) if k == "bricks.png"));
    }

    #[test]
    fn test_desc_requires_shader() {
        assert!(serde_json::from_str::<MaterialDesc>(r#"{ "properties": {} }"#).is_err());
    }

    #[test]
    fn test_desc_rejects_unknown_property_type() {
        let json = r#"{ "shader": "a.shader", "properties": { "x": { "mat3": [] } } }"#;
        assert!(serde_json::from_str::<MaterialDesc>(json).is_err());
    }
}
