//! Built-in asset kinds and their importers.

mod font;
mod material;
mod mesh;
mod script;
mod shader;
mod texture;

pub use font::{Font, FontImporter};
pub use material::{Material, MaterialImporter, MaterialProperty};
pub use mesh::{Mesh, MeshImporter, Vertex};
pub use script::{Script, ScriptImporter};
pub use shader::{Shader, ShaderImporter, ShaderModule, ShaderStage};
pub use texture::{Texture, TextureImporter};

use crate::importer::ImporterRegistry;

/// Register the importer of every built-in kind.
pub fn register_defaults(registry: &mut ImporterRegistry) {
    registry.register(MeshImporter);
    registry.register(ShaderImporter);
    registry.register(MaterialImporter);
    registry.register(TextureImporter);
    registry.register(FontImporter);
    registry.register(ScriptImporter);
}
