//! Crop session state and operations
//!
//! This module contains the GUI-free core of the application: one loaded
//! image, its downscaled preview, and the crop rectangles drawn against
//! that preview. The UI layer only translates toolkit events into the
//! operations defined here.

use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{debug, info, warn};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    /// An operation that needs a loaded image was called before any load
    NoImageLoaded,
    /// Export was requested with no image or no committed rectangles
    NothingToExport,
    /// A rectangle's source-resolution box is inverted, degenerate, or
    /// outside the image bounds
    InvalidCropRegion {
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    },
    ImageLoad(image::ImageError),
    ImageSave(image::ImageError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoImageLoaded => write!(f, "no image is loaded"),
            SessionError::NothingToExport => {
                write!(f, "nothing to export: load an image and draw a rectangle first")
            }
            SessionError::InvalidCropRegion {
                left,
                top,
                right,
                bottom,
            } => write!(
                f,
                "invalid crop region ({}, {})-({}, {})",
                left, top, right, bottom
            ),
            SessionError::ImageLoad(e) => write!(f, "failed to load image: {}", e),
            SessionError::ImageSave(e) => write!(f, "failed to save crop: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::ImageLoad(e) | SessionError::ImageSave(e) => Some(e),
            _ => None,
        }
    }
}

/// A committed crop rectangle in preview (display) coordinates.
///
/// Corners are stored exactly as captured at press and release; x1 may
/// exceed x2. Validation happens against the rescaled box at export time.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CropRect {
    /// Map the rectangle back to source-resolution coordinates,
    /// truncating toward zero.
    pub fn scaled(&self, scale: f64) -> (i64, i64, i64, i64) {
        (
            (self.x1 * scale).trunc() as i64,
            (self.y1 * scale).trunc() as i64,
            (self.x2 * scale).trunc() as i64,
            (self.y2 * scale).trunc() as i64,
        )
    }
}

/// The rectangle being dragged right now. At most one exists; every drag
/// update replaces the end corner so only the latest outline is visible.
#[derive(Clone, Copy, Debug)]
pub struct PendingRect {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl PendingRect {
    fn new(start_x: f64, start_y: f64) -> Self {
        Self {
            start_x,
            start_y,
            end_x: start_x,
            end_y: start_y,
        }
    }
}

/// Everything derived from one successful image load.
struct LoadedImage {
    /// Full-resolution source, immutable for the life of the session
    original: DynamicImage,
    /// Downscaled copy fitted to the viewport at load time
    preview: DynamicImage,
    /// original width / preview width, uniform in both axes
    scale: f64,
    file_name: String,
    stem: String,
    extension: String,
}

/// Result of an export run: which files were written and which
/// rectangles were skipped, with the error that disqualified them.
/// Indices are 1-based to match the output file numbering.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<(usize, SessionError)>,
}

/// One crop session: a loaded image plus the rectangles drawn against it.
///
/// Loading a new image discards every committed and pending rectangle
/// from the previous one.
#[derive(Default)]
pub struct CropSession {
    image: Option<LoadedImage>,
    pending: Option<PendingRect>,
    committed: Vec<CropRect>,
}

impl CropSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the image at `path` and fit a preview inside the given
    /// viewport, preserving aspect ratio and never upscaling. Resets all
    /// rectangle state from any previous load.
    pub fn load_image(
        &mut self,
        path: &Path,
        viewport_width: u32,
        viewport_height: u32,
    ) -> SessionResult<()> {
        let original = image::open(path).map_err(SessionError::ImageLoad)?;
        let (orig_w, orig_h) = original.dimensions();

        let max_w = viewport_width.max(1);
        let max_h = viewport_height.max(1);

        let preview = if orig_w <= max_w && orig_h <= max_h {
            original.clone()
        } else {
            original.resize(max_w, max_h, FilterType::Lanczos3)
        };

        let scale = orig_w as f64 / preview.width() as f64;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("image"));
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("image"));
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("png"));

        debug!(
            "Loaded {}x{} image, preview {}x{}, scale {:.3}",
            orig_w,
            orig_h,
            preview.width(),
            preview.height(),
            scale
        );

        self.image = Some(LoadedImage {
            original,
            preview,
            scale,
            file_name,
            stem,
            extension,
        });
        self.pending = None;
        self.committed.clear();

        Ok(())
    }

    /// Record the start corner of a new rectangle.
    pub fn begin_rect(&mut self, x: f64, y: f64) -> SessionResult<()> {
        if self.image.is_none() {
            return Err(SessionError::NoImageLoaded);
        }
        self.pending = Some(PendingRect::new(x, y));
        Ok(())
    }

    /// Move the end corner of the in-progress rectangle. A no-op when no
    /// drag is in flight (a release can arrive without a press after a
    /// load swapped the session out underneath it).
    pub fn update_rect(&mut self, x: f64, y: f64) -> SessionResult<()> {
        if self.image.is_none() {
            return Err(SessionError::NoImageLoaded);
        }
        if let Some(ref mut pending) = self.pending {
            pending.end_x = x;
            pending.end_y = y;
        }
        Ok(())
    }

    /// Finalize the in-progress rectangle onto the committed list.
    ///
    /// No minimum-size filter: a zero-area rectangle is committed and
    /// will be rejected later at export.
    pub fn commit_rect(&mut self, x: f64, y: f64) -> SessionResult<()> {
        if self.image.is_none() {
            return Err(SessionError::NoImageLoaded);
        }
        if let Some(pending) = self.pending.take() {
            self.committed.push(CropRect {
                x1: pending.start_x,
                y1: pending.start_y,
                x2: x,
                y2: y,
            });
        }
        Ok(())
    }

    /// Crop the original image once per committed rectangle, in commit
    /// order, writing `stem-{i}.ext` files into `dir` (1-based, existing
    /// files overwritten). A rectangle whose rescaled box is invalid is
    /// skipped with a diagnostic; the rest of the batch still runs.
    pub fn export_crops(&self, dir: &Path) -> SessionResult<ExportReport> {
        let image = self.image.as_ref().ok_or(SessionError::NothingToExport)?;
        if self.committed.is_empty() {
            return Err(SessionError::NothingToExport);
        }

        let mut report = ExportReport::default();
        for (i, rect) in self.committed.iter().enumerate() {
            let index = i + 1;
            let path = dir.join(format!("{}-{}.{}", image.stem, index, image.extension));
            match crop_to_file(image, rect, &path) {
                Ok(()) => {
                    info!("Saved {}", path.display());
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("Skipping crop {}: {}", index, e);
                    report.skipped.push((index, e));
                }
            }
        }
        Ok(report)
    }

    /// The downscaled preview the rectangles are drawn against.
    pub fn preview(&self) -> Option<&DynamicImage> {
        self.image.as_ref().map(|img| &img.preview)
    }

    pub fn scale(&self) -> Option<f64> {
        self.image.as_ref().map(|img| img.scale)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.image.as_ref().map(|img| img.file_name.as_str())
    }

    pub fn committed(&self) -> &[CropRect] {
        &self.committed
    }

    pub fn pending(&self) -> Option<PendingRect> {
        self.pending
    }

    pub fn rect_count(&self) -> usize {
        self.committed.len()
    }
}

fn crop_to_file(image: &LoadedImage, rect: &CropRect, path: &Path) -> SessionResult<()> {
    let (left, top, right, bottom) = rect.scaled(image.scale);
    let (width, height) = image.original.dimensions();

    let ordered = right > left && bottom > top;
    let in_bounds = left >= 0 && top >= 0 && right <= width as i64 && bottom <= height as i64;
    if !ordered || !in_bounds {
        return Err(SessionError::InvalidCropRegion {
            left,
            top,
            right,
            bottom,
        });
    }

    let cropped = image.original.crop_imm(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    );
    cropped.save(path).map_err(SessionError::ImageSave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([220, 40, 40, 255])
            } else {
                Rgba([40, 40, 220, 255])
            }
        }))
    }

    fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        checker(width, height).save(&path).unwrap();
        path
    }

    /// Session with a 400x200 source fitted into a 100x100 viewport,
    /// giving a 100x50 preview and a scale factor of 4.
    fn loaded_session(dir: &Path) -> CropSession {
        let path = write_test_png(dir, "photo.png", 400, 200);
        let mut session = CropSession::new();
        session.load_image(&path, 100, 100).unwrap();
        session
    }

    #[test]
    fn scale_factor_from_preview_width() {
        let dir = tempfile::tempdir().unwrap();
        let session = loaded_session(dir.path());

        let preview = session.preview().unwrap();
        assert_eq!(preview.dimensions(), (100, 50));
        assert_eq!(session.scale(), Some(4.0));
    }

    #[test]
    fn small_image_is_never_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), "small.png", 50, 40);

        let mut session = CropSession::new();
        session.load_image(&path, 800, 600).unwrap();

        assert_eq!(session.preview().unwrap().dimensions(), (50, 40));
        assert_eq!(session.scale(), Some(1.0));
    }

    #[test]
    fn begin_without_image_fails() {
        let mut session = CropSession::new();
        assert!(matches!(
            session.begin_rect(5.0, 5.0),
            Err(SessionError::NoImageLoaded)
        ));
    }

    #[test]
    fn loading_new_image_clears_rectangles() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(10.0, 10.0).unwrap();
        session.commit_rect(30.0, 30.0).unwrap();
        assert_eq!(session.rect_count(), 1);

        let other = write_test_png(dir.path(), "other.png", 300, 300);
        session.load_image(&other, 100, 100).unwrap();

        assert_eq!(session.rect_count(), 0);
        assert!(session.pending().is_none());
    }

    #[test]
    fn drag_updates_replace_the_pending_end_corner() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(10.0, 20.0).unwrap();
        session.update_rect(40.0, 50.0).unwrap();
        session.update_rect(15.0, 25.0).unwrap();

        let pending = session.pending().unwrap();
        assert_eq!((pending.start_x, pending.start_y), (10.0, 20.0));
        assert_eq!((pending.end_x, pending.end_y), (15.0, 25.0));
    }

    #[test]
    fn commit_stores_corners_unnormalized() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(80.0, 40.0).unwrap();
        session.commit_rect(20.0, 10.0).unwrap();

        let rect = session.committed()[0];
        assert_eq!(rect, CropRect {
            x1: 80.0,
            y1: 40.0,
            x2: 20.0,
            y2: 10.0,
        });
        assert!(session.pending().is_none());
    }

    #[test]
    fn zero_area_rectangle_is_committed() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(30.0, 30.0).unwrap();
        session.commit_rect(30.0, 30.0).unwrap();

        assert_eq!(session.rect_count(), 1);
    }

    #[test]
    fn export_without_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let session = CropSession::new();
        assert!(matches!(
            session.export_crops(dir.path()),
            Err(SessionError::NothingToExport)
        ));
    }

    #[test]
    fn export_without_rectangles_fails() {
        let dir = tempfile::tempdir().unwrap();
        let session = loaded_session(dir.path());
        assert!(matches!(
            session.export_crops(dir.path()),
            Err(SessionError::NothingToExport)
        ));
    }

    #[test]
    fn export_writes_one_file_per_rectangle_in_commit_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(0.0, 0.0).unwrap();
        session.commit_rect(50.0, 25.0).unwrap();
        session.begin_rect(10.0, 10.0).unwrap();
        session.commit_rect(20.0, 20.0).unwrap();

        let report = session.export_crops(out.path()).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(
            report.written,
            vec![
                out.path().join("photo-1.png"),
                out.path().join("photo-2.png"),
            ]
        );
        // Scale 4: (0,0)-(50,25) becomes a 200x100 source crop
        assert_eq!(
            image::image_dimensions(out.path().join("photo-1.png")).unwrap(),
            (200, 100)
        );
        assert_eq!(
            image::image_dimensions(out.path().join("photo-2.png")).unwrap(),
            (40, 40)
        );
    }

    #[test]
    fn export_truncates_scaled_coordinates_toward_zero() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(0.9, 0.9).unwrap();
        session.commit_rect(10.6, 10.2).unwrap();

        let rect = session.committed()[0];
        assert_eq!(rect.scaled(4.0), (3, 3, 42, 40));

        let report = session.export_crops(out.path()).unwrap();
        assert_eq!(
            image::image_dimensions(&report.written[0]).unwrap(),
            (39, 37)
        );
    }

    #[test]
    fn invalid_rectangles_are_skipped_and_the_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        // Inverted corners, never normalized
        session.begin_rect(60.0, 40.0).unwrap();
        session.commit_rect(10.0, 5.0).unwrap();
        // Valid
        session.begin_rect(0.0, 0.0).unwrap();
        session.commit_rect(25.0, 25.0).unwrap();
        // Exceeds the source extent (preview is 100x50, scale 4)
        session.begin_rect(0.0, 0.0).unwrap();
        session.commit_rect(120.0, 60.0).unwrap();

        let report = session.export_crops(out.path()).unwrap();

        assert_eq!(report.written, vec![out.path().join("photo-2.png")]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].0, 1);
        assert_eq!(report.skipped[1].0, 3);
        assert!(matches!(
            report.skipped[0].1,
            SessionError::InvalidCropRegion { .. }
        ));
        assert!(!out.path().join("photo-1.png").exists());
        assert!(!out.path().join("photo-3.png").exists());
    }

    #[test]
    fn zero_area_rectangle_is_rejected_at_export() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut session = loaded_session(dir.path());

        session.begin_rect(30.0, 30.0).unwrap();
        session.commit_rect(30.0, 30.0).unwrap();

        let report = session.export_crops(out.path()).unwrap();
        assert!(report.written.is_empty());
        assert!(matches!(
            report.skipped[0].1,
            SessionError::InvalidCropRegion { .. }
        ));
    }

    #[test]
    fn output_names_follow_the_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), "holiday-scan.png", 120, 80);

        let mut session = CropSession::new();
        session.load_image(&path, 500, 500).unwrap();
        assert_eq!(session.file_name(), Some("holiday-scan.png"));

        session.begin_rect(5.0, 5.0).unwrap();
        session.commit_rect(60.0, 40.0).unwrap();

        let report = session.export_crops(out.path()).unwrap();
        assert_eq!(report.written, vec![out.path().join("holiday-scan-1.png")]);
    }
}
