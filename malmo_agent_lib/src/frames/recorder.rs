use super::{PixelBuffer, PixelLayout};
use crate::{SyncResult, VideoFrame};
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes received frames into one directory per run.
///
/// Files are named by a zero-padded frame index and the run label; index 0 is
/// the baseline frame captured before the first command.
#[derive(Debug)]
pub struct FrameRecorder {
    run_dir: PathBuf,
    label: String,
    frame_index: u32,
    files_written: u64,
}

impl FrameRecorder {
    /// Human-readable run label, filesystem safe: `2026-10-18_14-03-27.512034`.
    pub fn run_label(now: DateTime<Local>) -> String {
        now.format("%Y-%m-%d %H:%M:%S%.6f")
            .to_string()
            .replace(' ', "_")
            .replace(':', "-")
    }

    /// Create `<output_root>/<label>`. Fails if the run directory already exists.
    pub fn create(output_root: &Path, label: &str) -> io::Result<Self> {
        fs::create_dir_all(output_root)?;
        let run_dir = output_root.join(label);
        fs::create_dir(&run_dir)?;

        debug!("Writing frames to {}", run_dir.display());
        Ok(Self {
            run_dir,
            label: label.to_string(),
            frame_index: 0,
            files_written: 0,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    /// Save the frame seen before any command was sent, as index 0.
    pub fn write_baseline(&mut self, frame: &VideoFrame) -> SyncResult<PathBuf> {
        self.frame_index = 0;
        let path = self
            .run_dir
            .join(format!("~frame_{:04}_{}.png", self.frame_index, self.label));
        PixelBuffer::from_frame(frame)?.save_png(&path)?;
        self.files_written += 1;
        Ok(path)
    }

    /// Advance the frame index and save the BGR rendition, plus HSV if asked.
    pub fn write_step(&mut self, frame: &VideoFrame, write_hsv: bool) -> SyncResult<Vec<PathBuf>> {
        self.frame_index += 1;
        let bgr = PixelBuffer::from_frame(frame)?.convert(PixelLayout::Bgr)?;

        let mut written = Vec::with_capacity(2);
        let path = self.step_path("1");
        bgr.save_png(&path)?;
        written.push(path);

        if write_hsv {
            let path = self.step_path("6_hsv_img");
            bgr.convert(PixelLayout::Hsv)?.save_png(&path)?;
            written.push(path);
        }

        self.files_written += written.len() as u64;
        Ok(written)
    }

    fn step_path(&self, suffix: &str) -> PathBuf {
        self.run_dir.join(format!(
            "frame_{:04}_{}_{}.png",
            self.frame_index, self.label, suffix
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame() -> VideoFrame {
        VideoFrame::rgb(2, 1, vec![255, 0, 0, 0, 0, 255])
    }

    #[test]
    fn test_run_label_is_sanitised() {
        let now = Local.with_ymd_and_hms(2026, 10, 18, 14, 3, 27).unwrap();
        assert_eq!(FrameRecorder::run_label(now), "2026-10-18_14-03-27.000000");
    }

    #[test]
    fn test_existing_run_directory_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        FrameRecorder::create(root.path(), "run").unwrap();
        let err = FrameRecorder::create(root.path(), "run").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_frame_file_names() {
        let root = tempfile::tempdir().unwrap();
        let mut recorder = FrameRecorder::create(&root.path().join("img"), "run").unwrap();

        let baseline = recorder.write_baseline(&frame()).unwrap();
        assert_eq!(baseline.file_name().unwrap(), "~frame_0000_run.png");

        let step = recorder.write_step(&frame(), true).unwrap();
        let names: Vec<_> = step
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame_0001_run_1.png", "frame_0001_run_6_hsv_img.png"]);

        let step = recorder.write_step(&frame(), false).unwrap();
        assert_eq!(step.len(), 1);
        assert!(step[0].ends_with("frame_0002_run_1.png"));

        assert_eq!(recorder.frame_index(), 2);
        assert_eq!(recorder.files_written(), 4);
        assert!(step.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_step_image_keeps_true_colour() {
        let root = tempfile::tempdir().unwrap();
        let mut recorder = FrameRecorder::create(root.path(), "run").unwrap();
        let paths = recorder.write_step(&frame(), false).unwrap();

        let image = image::open(&paths[0]).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_hsv_image_stores_value_saturation_hue() {
        let root = tempfile::tempdir().unwrap();
        let mut recorder = FrameRecorder::create(root.path(), "run").unwrap();
        let red = VideoFrame::rgb(1, 1, vec![255, 0, 0]);
        let paths = recorder.write_step(&red, true).unwrap();

        // Red is H 0, S 255, V 255; hue sits in the blue channel
        let image = image::open(&paths[1]).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 0]);
    }
}
