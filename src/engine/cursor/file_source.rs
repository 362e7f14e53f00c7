use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use super::{CursorIcon, CursorSource};

/// ### English
/// Cursor source backed by image files (PNG), decoded on demand.
///
/// ### 中文
/// 基于图像文件（PNG）的光标源，按需解码。
#[derive(Clone, Debug, Default)]
pub struct FileCursorSource {
    paths: BTreeMap<CursorIcon, PathBuf>,
}

impl FileCursorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Registers (or replaces) the image file for `icon`.
    ///
    /// ### 中文
    /// 注册（或替换）`icon` 对应的图像文件。
    pub fn register(&mut self, icon: CursorIcon, path: impl Into<PathBuf>) {
        self.paths.insert(icon, path.into());
    }

    pub fn with_icon(mut self, icon: CursorIcon, path: impl Into<PathBuf>) -> Self {
        self.register(icon, path);
        self
    }

    fn decode(path: &Path) -> Option<RgbaImage> {
        let reader = match image::ImageReader::open(path) {
            Ok(reader) => reader,
            Err(err) => {
                log::warn!("failed to open cursor image {}: {err}", path.display());
                return None;
            }
        };
        match reader.decode() {
            Ok(decoded) => Some(decoded.to_rgba8()),
            Err(err) => {
                log::warn!("failed to decode cursor image {}: {err}", path.display());
                None
            }
        }
    }
}

impl CursorSource for FileCursorSource {
    fn registered_icons(&self) -> Vec<CursorIcon> {
        self.paths.keys().copied().collect()
    }

    fn icon_image(&self, icon: CursorIcon) -> Option<RgbaImage> {
        self.paths.get(&icon).and_then(|path| Self::decode(path))
    }
}
