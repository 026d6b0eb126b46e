use crate::error::MapError;
use anyhow::Context;
use macroquad::prelude::*;
use std::path::Path;

/// Turns a resolved image path into a texture handle.
pub type TextureProvider<T> = Box<dyn Fn(&Path) -> anyhow::Result<T>>;
/// Reads a resolved map or tileset path into text.
pub type TextProvider = Box<dyn Fn(&Path) -> anyhow::Result<String>>;

/// Host hooks used while loading: where textures and tileset files come
/// from.
///
/// Build one at startup and pass it to every load.
pub struct LoaderContext<T> {
    texture_provider: TextureProvider<T>,
    text_provider: TextProvider,
}

impl<T> LoaderContext<T> {
    /// Uses `texture_provider` for images and the file system for text.
    pub fn new(texture_provider: impl Fn(&Path) -> anyhow::Result<T> + 'static) -> Self {
        LoaderContext {
            texture_provider: Box::new(texture_provider),
            text_provider: Box::new(read_text_file),
        }
    }

    /// Replaces the texture provider.
    pub fn with_texture_provider(
        mut self,
        provider: impl Fn(&Path) -> anyhow::Result<T> + 'static,
    ) -> Self {
        self.texture_provider = Box::new(provider);
        self
    }

    /// Replaces the text provider, e.g. to read from an archive.
    pub fn with_text_provider(
        mut self,
        provider: impl Fn(&Path) -> anyhow::Result<String> + 'static,
    ) -> Self {
        self.text_provider = Box::new(provider);
        self
    }

    pub(crate) fn load_texture(&self, path: &Path) -> Result<T, MapError> {
        (self.texture_provider)(path).map_err(|source| MapError::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn load_text(&self, path: &Path) -> Result<String, MapError> {
        (self.text_provider)(path).map_err(|source| MapError::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for LoaderContext<Texture2D> {
    /// File system text and macroquad textures with nearest filtering.
    fn default() -> Self {
        LoaderContext::new(load_texture_file)
    }
}

fn read_text_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
}

fn load_texture_file(path: &Path) -> anyhow::Result<Texture2D> {
    let bytes = std::fs::read(path).with_context(|| format!("Reading texture {}", path.display()))?;
    let image = Image::from_file_with_format(&bytes, None)
        .map_err(|e| anyhow::anyhow!("Decoding texture {}: {e:?}", path.display()))?;
    let tex = Texture2D::from_image(&image);
    tex.set_filter(FilterMode::Nearest);
    Ok(tex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_become_resource_errors() {
        let ctx: LoaderContext<u32> = LoaderContext::new(|_| anyhow::bail!("no gpu here"))
            .with_text_provider(|p| Ok(format!("text of {}", p.display())));

        let err = ctx.load_texture(Path::new("a/b.png")).unwrap_err();
        match err {
            MapError::ResourceNotFound { path, source } => {
                assert_eq!(path, Path::new("a/b.png"));
                assert_eq!(source.to_string(), "no gpu here");
            }
            other => panic!("expected ResourceNotFound, got {other:?}"),
        }

        assert_eq!(ctx.load_text(Path::new("x.tsx")).unwrap(), "text of x.tsx");
    }

    #[test]
    fn default_text_provider_reports_missing_files() {
        let ctx: LoaderContext<u32> = LoaderContext::new(|_| Ok(0));
        let err = ctx.load_text(Path::new("definitely/not/here.tsx")).unwrap_err();
        assert!(matches!(err, MapError::ResourceNotFound { .. }));
    }
}
