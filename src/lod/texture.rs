//! Texture pyramids as PNG files.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use super::{LodSeries, LodStep};
use crate::archive::ArchiveSink;
use crate::util::Result;

/// PNG bytes of `img`.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Halves a texture until its encoding fits under `base_size`.
#[derive(Clone, Debug)]
pub struct TextureLodGenerator {
    base_size: usize,
}

impl TextureLodGenerator {
    pub fn new(base_size: usize) -> Self {
        Self { base_size }
    }

    pub fn base_size(&self) -> usize {
        self.base_size
    }

    /// Write `<base>_<n>-<w>x<h>.png` steps for `image`.
    ///
    /// Stops once a step fits the floor or the image is 1×1. A step that does
    /// not encode smaller than its predecessor ends the series unwritten.
    pub fn generate(&self, image: &RgbaImage, base_name: &str, sink: &mut dyn ArchiveSink) -> Result<LodSeries> {
        let mut series = LodSeries::new();
        let mut current = image.clone();
        let mut previous: Option<usize> = None;

        for n in 0.. {
            let (w, h) = current.dimensions();
            let bytes = encode_png(&current)?;
            if previous.is_some_and(|p| bytes.len() >= p) {
                debug!(step = n, size = bytes.len(), "texture step did not shrink, series ends");
                break;
            }

            let name = format!("{base_name}_{n}-{w}x{h}.png");
            sink.insert(&name, &bytes)?;
            series.push(LodStep {
                name,
                size: bytes.len(),
                footprint: current.as_raw().len(),
            });
            previous = Some(bytes.len());

            if bytes.len() <= self.base_size || (w == 1 && h == 1) {
                break;
            }
            current = imageops::resize(&current, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
        }

        debug!(base = base_name, steps = series.len(), "texture LOD series");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PartitionedArchive;
    use crate::dataset::sources;

    fn noisy(w: u32, h: u32) -> RgbaImage {
        let mut state = 0x2545_f491_u32;
        RgbaImage::from_fn(w, h, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            image::Rgba([r, g, b, 255])
        })
    }

    #[test]
    fn test_series_shrinks_and_names() -> Result<()> {
        let mut sink = PartitionedArchive::new();
        let series = TextureLodGenerator::new(0).generate(&noisy(64, 32), "tex", &mut sink)?;

        assert!(series.len() >= 2);
        assert_eq!(series.steps()[0].name, "tex_0-64x32.png");
        assert_eq!(series.steps()[1].name, "tex_1-32x16.png");
        for pair in series.steps().windows(2) {
            assert!(pair[1].size < pair[0].size);
        }
        for step in series.steps() {
            assert!(sink.contains(&step.name));
        }
        Ok(())
    }

    #[test]
    fn test_floor_stops_at_first_step() -> Result<()> {
        let mut sink = PartitionedArchive::new();
        let series = TextureLodGenerator::new(usize::MAX).generate(&noisy(16, 16), "t", &mut sink)?;
        assert_eq!(series.len(), 1);
        Ok(())
    }

    #[test]
    fn test_terminates_at_one_pixel() -> Result<()> {
        let mut sink = PartitionedArchive::new();
        let series = TextureLodGenerator::new(0).generate(&noisy(8, 2), "t", &mut sink)?;
        assert!(series.len() <= 4);
        let last = &series.steps()[series.len() - 1];
        assert!(last.footprint >= 4);
        Ok(())
    }

    #[test]
    fn test_png_decodes() -> Result<()> {
        let img = sources::checkerboard(8, 4, 2).to_rgba_image().unwrap();
        let bytes = encode_png(&img)?;
        let back = image::load_from_memory(&bytes)?.to_rgba8();
        assert_eq!(back, img);
        Ok(())
    }
}
