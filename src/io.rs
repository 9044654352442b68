use image::{ColorType, DynamicImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ScrambleError};
use crate::types::Frame;

const SEQUENCE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Supplies frames one at a time; `Ok(None)` marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Restarts the stream from its first frame.
    fn rewind(&mut self) -> Result<()>;
}

/// Receives frames for display or persistence.
pub trait FrameSink {
    fn accept(&mut self, index: usize, frame: &Frame) -> Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn accept(&mut self, _index: usize, frame: &Frame) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Sink that drops every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn accept(&mut self, _index: usize, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// In-memory frame source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: Vec<Frame>,
    position: usize,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            position: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// The image files of a directory, in file name order, played as a video.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    position: usize,
}

impl ImageSequence {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_sequence_extension(path))
            .collect();
        paths.sort();

        info!(dir = %dir.display(), frames = paths.len(), "Opened image sequence");
        Ok(Self { paths, position: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_sequence_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SEQUENCE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let frame = load_frame(path)?;
        self.position += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// Writes each frame as `frame_NNNNNN.png` into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for DirectorySink {
    fn accept(&mut self, index: usize, frame: &Frame) -> Result<()> {
        save_frame(self.frame_path(index), frame)
    }
}

/// Decodes an image file: grayscale stays 1 channel, RGBA stays 4, anything
/// else is converted to 3-channel RGB.
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame> {
    let path = path.as_ref();
    let (width, height, channels, data) = match image::open(path)? {
        DynamicImage::ImageLuma8(buf) => (buf.width(), buf.height(), 1, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (buf.width(), buf.height(), 4, buf.into_raw()),
        other => {
            let buf = other.to_rgb8();
            (buf.width(), buf.height(), 3, buf.into_raw())
        }
    };
    debug!(path = %path.display(), width, height, channels, "Loaded frame");
    Frame::from_raw(height as usize, width as usize, channels, data)
}

/// Encodes a frame; the format follows the file extension.
pub fn save_frame(path: impl AsRef<Path>, frame: &Frame) -> Result<()> {
    let path = path.as_ref();
    let color = match frame.channels() {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        n => return Err(ScrambleError::UnsupportedChannels(n)),
    };
    image::save_buffer(
        path,
        frame.as_bytes(),
        frame.width() as u32,
        frame.height() as u32,
        color,
    )?;
    debug!(path = %path.display(), "Saved frame");
    Ok(())
}
