//! Cartridge composition: the prebuilt base program followed by a resource
//! image.

use std::path::PathBuf;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use log::{info, warn};

use crate::error::Result;
use crate::vfs::PAGE_SIZE;

/// Somewhere the base program can be fetched from.
pub trait BaseImageSource {
    fn fetch(&self) -> BoxFuture<'_, std::io::Result<Vec<u8>>>;
}

/// A base program on disk.
#[derive(Debug, Clone)]
pub struct FileBaseImage {
    pub path: PathBuf,
}

impl FileBaseImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BaseImageSource for FileBaseImage {
    fn fetch(&self) -> BoxFuture<'_, std::io::Result<Vec<u8>>> {
        future::ready(std::fs::read(&self.path)).boxed()
    }
}

/// A base program already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBaseImage(pub Vec<u8>);

impl BaseImageSource for MemoryBaseImage {
    fn fetch(&self) -> BoxFuture<'_, std::io::Result<Vec<u8>>> {
        future::ready(Ok(self.0.clone())).boxed()
    }
}

/// Appends `resource` to the base program. The base image is not inspected
/// beyond a warning when its length does not put the resource at
/// `base_page`.
pub async fn compose_rom<S>(source: &S, resource: &[u8], base_page: u16) -> Result<Vec<u8>>
where
    S: BaseImageSource + ?Sized,
{
    let base = source.fetch().await?;

    let expected = base_page as usize * PAGE_SIZE;
    if base.len() != expected {
        warn!(
            "base image is {} bytes, the resource expects to start at {} (page {})",
            base.len(),
            expected,
            base_page
        );
    }

    let mut rom = Vec::with_capacity(base.len() + resource.len());
    rom.extend_from_slice(&base);
    rom.extend_from_slice(resource);

    info!(
        "rom image: {} bytes base + {} bytes resource, crc32 {:08X}",
        base.len(),
        resource.len(),
        crc32fast::hash(&rom)
    );
    Ok(rom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn rom_is_base_then_resource() {
        let base = MemoryBaseImage(vec![1, 2, 3]);
        let rom = pollster::block_on(compose_rom(&base, &[4, 5], 2)).unwrap();
        assert_eq!(rom, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_base_image_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = FileBaseImage::new(dir.path().join("missing.sms"));
        let err = pollster::block_on(compose_rom(&base, &[4, 5], 2)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
