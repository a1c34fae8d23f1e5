use std::path::PathBuf;

use crate::models::CapturedImage;

/// One-shot frame supplier. The analysis core never retries a read:
/// a failed read simply means "no picture available".
pub trait CameraSource: Send {
    fn read_frame(&mut self) -> Option<CapturedImage>;
    fn release(&mut self);
}

/// The upload flow: the "camera" is a picture file the user picked.
pub struct FileCamera {
    path: PathBuf,
    released: bool,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }
}

impl CameraSource for FileCamera {
    fn read_frame(&mut self) -> Option<CapturedImage> {
        if self.released {
            return None;
        }

        match image::open(&self.path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                log::info!(
                    "📷 Loaded picture {} ({}x{})",
                    self.path.display(),
                    rgb.width(),
                    rgb.height()
                );
                Some(CapturedImage {
                    width: rgb.width(),
                    height: rgb.height(),
                    pixels: rgb.into_raw(),
                })
            }
            Err(e) => {
                log::error!("❌ Could not read picture {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_no_frame() {
        let mut camera = FileCamera::new("/definitely/not/here.jpg");
        assert!(camera.read_frame().is_none());
    }

    #[test]
    fn released_camera_stops_supplying_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ulam.png");
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]));
        img.save(&path).unwrap();

        let mut camera = FileCamera::new(&path);
        let frame = camera.read_frame().expect("frame");
        assert_eq!((frame.width, frame.height), (4, 4));
        assert_eq!(frame.pixels.len(), 4 * 4 * 3);

        camera.release();
        assert!(camera.read_frame().is_none());
    }
}
