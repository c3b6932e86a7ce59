use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Render surface for animation frames
///
/// The player calls `render` once per frame in playback order and `blank`
/// when the surface is cleared.
pub trait FrameSink: Send + Sync {
    fn render(&self, index: usize, jpeg: &[u8]) -> Result<()>;

    /// Clear the surface
    fn blank(&self) -> Result<()>;
}

/// Sink that writes frames as numbered JPEG files into a directory
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create frame directory {:?}", dir))?;

        info!("Writing animation frames to {:?}", dir);
        Ok(Self { dir })
    }

    fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:04}.jpg", index))
    }
}

impl FrameSink for DirSink {
    fn render(&self, index: usize, jpeg: &[u8]) -> Result<()> {
        let path = self.frame_path(index);
        fs::write(&path, jpeg).with_context(|| format!("Failed to write frame {:?}", path))
    }

    fn blank(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir).context("Failed to list frame directory")? {
            let path = entry?.path();
            let is_frame = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("frame_") && n.ends_with(".jpg"))
                .unwrap_or(false);
            if is_frame {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove frame {:?}", path))?;
            }
        }
        Ok(())
    }
}
