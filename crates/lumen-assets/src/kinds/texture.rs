use crate::error::AssetResult;
use crate::importer::{AssetImporter, ImportContext};

/// A decoded 2D texture in tightly packed RGBA8.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Bytes per pixel of the stored format.
    pub const BYTES_PER_PIXEL: usize = 4;

    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * Self::BYTES_PER_PIXEL);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`, `None` outside the texture.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + Self::BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Decodes PNG, JPEG and BMP images to RGBA8.
pub struct TextureImporter;

impl AssetImporter for TextureImporter {
    type Asset = Texture;

    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "bmp"]
    }

    fn read_asset_data(&self, asset: &mut Texture, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        let image = image::load_from_memory(ctx.bytes())
            .map_err(|e| ctx.malformed(format!("Failed to decode image: {}", e)))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        *asset = Texture::from_rgba8(width, height, rgba.into_raw());
        Ok(())
    }
}
