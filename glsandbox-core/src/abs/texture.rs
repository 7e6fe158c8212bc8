//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::error::{EngineError, Result};
use crate::gpu::{Gpu, TextureWrap};

/// Represents a 2-D RGBA texture stored on the GPU side.
pub struct Texture<G: Gpu> {
    gpu: Arc<G>,
    id: G::Texture,
    width: u32,
    height: u32,
}

impl<G: Gpu> Texture<G> {
    /// Loads an image file and uploads it. Any 8-bit image the `image` crate can decode is
    /// accepted and expanded to RGBA.
    pub fn from_file(gpu: &Arc<G>, path: impl AsRef<Path>, wrap: TextureWrap) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| EngineError::TextureLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let texture = Self::new(gpu, &image, wrap)?;
        log::debug!(
            "Loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Creates a new texture from the given [`image::DynamicImage`].
    ///
    /// Rows are flipped so that texture coordinate `(0, 0)` is the bottom-left pixel.
    pub fn new(gpu: &Arc<G>, image: &DynamicImage, wrap: TextureWrap) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = image.flipv().to_rgba8().into_raw();
        Self::new_from_data(gpu, width, height, &data, wrap)
    }

    /// Creates a new texture from the given raw RGBA data.
    pub fn new_from_data(
        gpu: &Arc<G>,
        width: u32,
        height: u32,
        data: &[u8],
        wrap: TextureWrap,
    ) -> Result<Self> {
        let id = gpu.create_texture().map_err(EngineError::GpuAllocation)?;
        gpu.bind_texture(Some(id));
        gpu.tex_sampling(wrap);
        gpu.tex_image_2d_rgba8(width, height, data);
        gpu.bind_texture(None);

        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            width,
            height,
        })
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        self.gpu.active_texture(unit);
        self.gpu.bind_texture(Some(self.id));
    }

    /// Unbinds whatever texture is bound to `unit`.
    pub fn unbind(&self, unit: u32) {
        self.gpu.active_texture(unit);
        self.gpu.bind_texture(None);
    }

    pub fn id(&self) -> G::Texture {
        self.id
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl<G: Gpu> Drop for Texture<G> {
    fn drop(&mut self) {
        self.gpu.delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessGpu;

    #[test]
    fn uploads_any_component_count_as_rgba() {
        let gpu = Arc::new(HeadlessGpu::new());
        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(3, 2));
        let texture = Texture::new(&gpu, &gray, TextureWrap::default()).unwrap();

        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(
            gpu.texture_info(texture.id()),
            Some((3, 2, Some(TextureWrap::ClampToEdge)))
        );
        assert_eq!(gpu.get_error(), None);
    }

    #[test]
    fn border_color_is_kept() {
        let gpu = Arc::new(HeadlessGpu::new());
        let wrap = TextureWrap::ClampToBorder([1.0, 0.0, 1.0, 1.0]);
        let texture = Texture::new_from_data(&gpu, 1, 1, &[0, 0, 0, 255], wrap).unwrap();
        assert_eq!(gpu.texture_info(texture.id()).unwrap().2, Some(wrap));
    }

    #[test]
    fn missing_file_is_an_error() {
        let gpu = Arc::new(HeadlessGpu::new());
        let result = Texture::from_file(&gpu, "no/such/texture.png", TextureWrap::default());
        assert!(matches!(result, Err(EngineError::TextureLoad { .. })));
        assert_eq!(gpu.live_objects().textures, 0);
    }

    #[test]
    fn bind_and_drop() {
        let gpu = Arc::new(HeadlessGpu::new());
        let texture = Texture::new_from_data(&gpu, 1, 1, &[255; 4], TextureWrap::Repeat).unwrap();
        texture.bind(0);
        assert_eq!(gpu.live_objects().textures, 1);
        drop(texture);
        assert_eq!(gpu.live_objects().textures, 0);
    }
}
