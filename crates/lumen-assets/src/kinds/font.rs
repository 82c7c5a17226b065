use crate::error::AssetResult;
use crate::importer::{AssetImporter, ImportContext};

/// Raw font file contents. Glyph rasterization happens in the text system.
#[derive(Debug, Clone, Default)]
pub struct Font {
    data: Vec<u8>,
}

impl Font {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub struct FontImporter;

impl AssetImporter for FontImporter {
    type Asset = Font;

    fn extensions(&self) -> &[&str] {
        &["ttf", "otf"]
    }

    fn read_asset_data(&self, asset: &mut Font, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        if ctx.bytes().is_empty() {
            return Err(ctx.malformed("Font file is empty"));
        }
        *asset = Font::new(ctx.bytes().to_vec());
        Ok(())
    }
}
