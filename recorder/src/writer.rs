//! Writes each capture to a `{N}.jpeg` + `{N}.bin` pair, monotonically
//! numbered (SPEC_FULL.md §4.7). Grounded on
//! `original_source/src/aci/recorder.py` (`_write_capture_to_file`) and
//! `aci/utils/save.py` (`save_bgr0_as_jpeg`, `save_bytes`,
//! `maybe_create_folders`).

use crate::error::{Error, Result};
use harness_types::{ImageShape, PixelLayout};
use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Recorder {
    save_path: PathBuf,
    frame_count: u64,
}

impl Recorder {
    pub fn new(save_path: impl Into<PathBuf>) -> Result<Self> {
        let save_path = save_path.into();
        if !save_path.exists() {
            fs::create_dir_all(&save_path).map_err(|source| Error::CreateDir {
                path: save_path.clone(),
                source,
            })?;
        }
        Ok(Self {
            save_path,
            frame_count: 0,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Writes one `(image, state)` pair under the next sequential index and
    /// advances the counter. `state` is written unmodified.
    pub fn write(&mut self, shape: ImageShape, image: &[u8], state: &[u8]) -> Result<()> {
        let n = self.frame_count;
        let jpeg_path = self.save_path.join(format!("{n}.jpeg"));
        let bin_path = self.save_path.join(format!("{n}.bin"));

        write_jpeg(&jpeg_path, shape, image, n)?;
        fs::write(&bin_path, state).map_err(|source| Error::Write {
            path: bin_path,
            source,
        })?;

        self.frame_count += 1;
        Ok(())
    }
}

fn write_jpeg(path: &Path, shape: ImageShape, data: &[u8], frame_index: u64) -> Result<()> {
    let rgb = to_rgb8(shape, data);
    let image = RgbImage::from_raw(shape.width, shape.height, rgb)
        .expect("rgb buffer length matches width*height*3 by construction");
    image
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|source| Error::Encode(source, frame_index))
}

fn to_rgb8(shape: ImageShape, data: &[u8]) -> Vec<u8> {
    let channels = shape.layout.channel_count();
    let pixel_count = shape.width as usize * shape.height as usize;
    let mut out = Vec::with_capacity(pixel_count * 3);
    for i in 0..pixel_count {
        let px = &data[i * channels..i * channels + channels];
        match shape.layout {
            PixelLayout::Rgb => out.extend_from_slice(&[px[0], px[1], px[2]]),
            PixelLayout::Bgr | PixelLayout::Bgrx => out.extend_from_slice(&[px[2], px[1], px[0]]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> ImageShape {
        ImageShape {
            width: 2,
            height: 2,
            layout: PixelLayout::Bgrx,
        }
    }

    #[test]
    fn writes_sequentially_numbered_pairs_and_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("nested").join("recordings");
        let mut recorder = Recorder::new(&save_path).unwrap();
        assert!(save_path.exists());

        let image_data = vec![10u8; shape().width as usize * shape().height as usize * 4];
        recorder.write(shape(), &image_data, b"state-0").unwrap();
        recorder.write(shape(), &image_data, b"state-1").unwrap();

        assert!(save_path.join("0.jpeg").exists());
        assert!(save_path.join("0.bin").exists());
        assert!(save_path.join("1.jpeg").exists());
        assert!(save_path.join("1.bin").exists());
        assert_eq!(fs::read(save_path.join("1.bin")).unwrap(), b"state-1");
        assert_eq!(recorder.frame_count(), 2);
    }

    #[test]
    fn reuses_an_already_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("recordings")).unwrap();
        let recorder = Recorder::new(dir.path().join("recordings"));
        assert!(recorder.is_ok());
    }

    #[test]
    fn bgrx_to_rgb8_drops_the_padding_byte_and_swaps_channels() {
        let data = vec![10, 20, 30, 255]; // one BGRX pixel
        let rgb = to_rgb8(
            ImageShape {
                width: 1,
                height: 1,
                layout: PixelLayout::Bgrx,
            },
            &data,
        );
        assert_eq!(rgb, vec![30, 20, 10]);
    }
}
