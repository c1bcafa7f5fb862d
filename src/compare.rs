//! Image comparison for visual-regression steps.
//!
//! Captures a live screenshot, diffs it pixel-by-pixel against a reference
//! image, finds the connected regions that differ, and writes an annotated
//! copy of the capture: dimmed to half brightness with a one-pixel rectangle
//! around every differing region.
//!
//! Completing the pipeline counts as success even when differing regions were
//! found; the artifact carries the regions so callers can apply a stricter
//! policy.

use image::{Rgb, RgbImage};
use log::info;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::browser::{BrowserSession, SessionError};
use crate::step::normalize_image_name;

/// Rectangle color for highlighted regions
const HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// Compares screenshots against reference images
#[derive(Debug, Clone)]
pub struct ImageComparator {
    /// Directory where captured screenshots are persisted
    screenshot_dir: PathBuf,
}

/// Axis-aligned bounding box of one differing region, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Whether this region overlaps the given rectangle
    pub fn overlaps(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        self.x < x + width
            && x < self.x + self.width
            && self.y < y + height
            && y < self.y + self.height
    }
}

/// The outcome of one comparison
#[derive(Debug, Clone)]
pub struct ComparisonArtifact {
    /// Where the live capture was persisted
    pub captured_path: PathBuf,
    /// Where the annotated image was written
    pub output_path: PathBuf,
    /// Bounding boxes of differing regions (empty when images match)
    pub regions: Vec<Region>,
    /// Total number of differing pixels
    pub differing_pixels: usize,
}

impl ImageComparator {
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// Capture a screenshot from the session, diff it against the reference
    /// image, and write the annotated result to `output_path`.
    pub fn compare(
        &self,
        session: &mut BrowserSession,
        reference_path: &Path,
        test_file_name: &str,
        output_path: &Path,
    ) -> Result<ComparisonArtifact, CompareError> {
        let png = session.screenshot_png().map_err(CompareError::Capture)?;
        let captured_path = self.screenshot_dir.join(normalize_image_name(test_file_name));
        fs::write(&captured_path, &png)?;

        let reference = load_rgb(reference_path)?;
        let captured = image::load_from_memory(&png)
            .map_err(|e| CompareError::ImageLoad(format!("captured screenshot: {}", e)))?
            .to_rgb8();

        let artifact = self.compare_images(&reference, &captured, output_path)?;
        Ok(ComparisonArtifact {
            captured_path,
            ..artifact
        })
    }

    /// Diff two already-loaded images and write the annotated result.
    ///
    /// The offline `compare` CLI subcommand uses this directly.
    pub fn compare_images(
        &self,
        reference: &RgbImage,
        captured: &RgbImage,
        output_path: &Path,
    ) -> Result<ComparisonArtifact, CompareError> {
        let (regions, differing_pixels) = diff_regions(reference, captured)?;
        let annotated = annotate(captured, &regions);
        annotated
            .save(output_path)
            .map_err(|e| CompareError::ImageLoad(format!("{}: {}", output_path.display(), e)))?;

        info!(
            "Image comparison wrote {} ({} differing regions, {} pixels)",
            output_path.display(),
            regions.len(),
            differing_pixels
        );
        Ok(ComparisonArtifact {
            captured_path: PathBuf::new(),
            output_path: output_path.to_path_buf(),
            regions,
            differing_pixels,
        })
    }
}

/// Load an image file as RGB
pub fn load_rgb(path: &Path) -> Result<RgbImage, CompareError> {
    let img = image::open(path)
        .map_err(|e| CompareError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    Ok(img.to_rgb8())
}

/// Compute the bounding boxes of connected differing regions.
///
/// The difference mask marks a pixel when any channel differs; connectivity
/// is 8-way, so diagonally touching pixels join one region.
pub fn diff_regions(
    reference: &RgbImage,
    captured: &RgbImage,
) -> Result<(Vec<Region>, usize), CompareError> {
    if reference.dimensions() != captured.dimensions() {
        return Err(CompareError::SizeMismatch {
            reference: reference.dimensions(),
            captured: captured.dimensions(),
        });
    }

    let (width, height) = reference.dimensions();
    let mut mask = vec![false; (width * height) as usize];
    let mut differing = 0usize;
    for (x, y, a) in reference.enumerate_pixels() {
        let b = captured.get_pixel(x, y);
        if a != b {
            mask[(y * width + x) as usize] = true;
            differing += 1;
        }
    }

    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();
    for start_y in 0..height {
        for start_x in 0..width {
            let start = (start_y * width + start_x) as usize;
            if !mask[start] || visited[start] {
                continue;
            }

            // Flood-fill one connected component, tracking its bounds
            let (mut min_x, mut max_x) = (start_x, start_x);
            let (mut min_y, mut max_y) = (start_y, start_y);
            let mut queue = VecDeque::from([(start_x, start_y)]);
            visited[start] = true;
            while let Some((x, y)) = queue.pop_front() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        let idx = (ny as u32 * width + nx as u32) as usize;
                        if mask[idx] && !visited[idx] {
                            visited[idx] = true;
                            queue.push_back((nx as u32, ny as u32));
                        }
                    }
                }
            }

            regions.push(Region {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            });
        }
    }

    Ok((regions, differing))
}

/// Produce the annotated copy: the capture at half brightness with a 1-px
/// rectangle around every region
pub fn annotate(captured: &RgbImage, regions: &[Region]) -> RgbImage {
    let mut out = RgbImage::new(captured.width(), captured.height());
    for (x, y, pixel) in captured.enumerate_pixels() {
        let Rgb([r, g, b]) = *pixel;
        out.put_pixel(x, y, Rgb([r / 2, g / 2, b / 2]));
    }
    for region in regions {
        draw_rect_border(&mut out, region);
    }
    out
}

fn draw_rect_border(img: &mut RgbImage, region: &Region) {
    let x1 = (region.x + region.width - 1).min(img.width() - 1);
    let y1 = (region.y + region.height - 1).min(img.height() - 1);
    for x in region.x..=x1 {
        img.put_pixel(x, region.y, HIGHLIGHT);
        img.put_pixel(x, y1, HIGHLIGHT);
    }
    for y in region.y..=y1 {
        img.put_pixel(region.x, y, HIGHLIGHT);
        img.put_pixel(x1, y, HIGHLIGHT);
    }
}

/// Error types for image comparison
#[derive(Debug)]
pub enum CompareError {
    /// Screenshot capture failed
    Capture(SessionError),

    /// An image could not be read or decoded
    ImageLoad(String),

    /// Reference and capture dimensions differ
    SizeMismatch {
        reference: (u32, u32),
        captured: (u32, u32),
    },

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::Capture(err) => write!(f, "Capture error: {}", err),
            CompareError::ImageLoad(msg) => write!(f, "Image load error: {}", msg),
            CompareError::SizeMismatch {
                reference,
                captured,
            } => write!(
                f,
                "Size mismatch: reference {}x{}, captured {}x{}",
                reference.0, reference.1, captured.0, captured.1
            ),
            CompareError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompareError::Capture(err) => Some(err),
            CompareError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CompareError {
    fn from(err: std::io::Error) -> Self {
        CompareError::Io(err)
    }
}
