use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::ImageReader;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub const COLLISION_LAYER_NAME: &str = "Collision";

#[derive(Debug, Error)]
pub enum MaskLoadError {
    #[error("failed to read scene metadata at {path}: {source}")]
    ReadMetadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open mask image at {path}: {source}")]
    OpenImage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode mask image at {path}: {source}")]
    DecodeImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("mask image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("failed to start mask loader thread: {0}")]
    SpawnWorker(#[source] io::Error),
}

/// Decoded RGBA8 mask at scene resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl MaskImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneMetadata {
    pub meta: MetadataBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataBody {
    #[serde(default)]
    pub layers: Vec<MetadataLayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataLayer {
    pub name: String,
}

impl SceneMetadata {
    pub fn has_layer(&self, name: &str) -> bool {
        self.meta.layers.iter().any(|layer| layer.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum MetadataReadState {
    Missing,
    Unreadable(String),
    Present(SceneMetadata),
}

pub fn read_scene_metadata(path: &Path) -> Result<MetadataReadState, MaskLoadError> {
    if !path.exists() {
        return Ok(MetadataReadState::Missing);
    }

    let raw = fs::read_to_string(path).map_err(|source| MaskLoadError::ReadMetadata {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str::<SceneMetadata>(&raw) {
        Ok(parsed) => Ok(MetadataReadState::Present(parsed)),
        Err(error) => Ok(MetadataReadState::Unreadable(error.to_string())),
    }
}

/// Decodes the mask and scales it (nearest neighbor) to `target_size` when they differ.
pub fn decode_mask_image(path: &Path, target_size: (u32, u32)) -> Result<MaskImage, MaskLoadError> {
    let reader = ImageReader::open(path).map_err(|source| MaskLoadError::OpenImage {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| MaskLoadError::DecodeImage {
        path: path.to_path_buf(),
        source,
    })?;
    let mut image = decoded.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(MaskLoadError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }

    let (target_w, target_h) = target_size;
    if target_w > 0 && target_h > 0 && (image.width(), image.height()) != (target_w, target_h) {
        info!(
            source_width = image.width(),
            source_height = image.height(),
            target_width = target_w,
            target_height = target_h,
            "mask_resized_to_scene"
        );
        image = imageops::resize(&image, target_w, target_h, FilterType::Nearest);
    }

    Ok(MaskImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskLoadRequest {
    pub scene: &'static str,
    pub mask_path: PathBuf,
    /// Sidecar that must declare `collision_layer`. Without one the mask is used directly.
    pub metadata_path: Option<PathBuf>,
    pub scene_size: (u32, u32),
    pub collision_layer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    MetadataMissing,
    MetadataUnreadable(String),
    CollisionLayerMissing,
    MaskUnavailable(String),
    /// The mask decoded but classifies no pixel as walkable.
    NoWalkableArea,
    LoaderLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionLoadOutcome {
    Mask(MaskImage),
    Fallback(FallbackReason),
}

/// Resolves a scene's collision source. Every failure degrades to a fallback reason.
pub fn load_collision_source(request: &MaskLoadRequest) -> CollisionLoadOutcome {
    if let Some(metadata_path) = &request.metadata_path {
        let state = match read_scene_metadata(metadata_path) {
            Ok(state) => state,
            Err(error) => MetadataReadState::Unreadable(error.to_string()),
        };
        let reason = match state {
            MetadataReadState::Present(metadata) if metadata.has_layer(&request.collision_layer) => {
                None
            }
            MetadataReadState::Present(_) => Some(FallbackReason::CollisionLayerMissing),
            MetadataReadState::Missing => Some(FallbackReason::MetadataMissing),
            MetadataReadState::Unreadable(message) => {
                Some(FallbackReason::MetadataUnreadable(message))
            }
        };
        if let Some(reason) = reason {
            warn!(
                scene = request.scene,
                path = %metadata_path.display(),
                reason = ?reason,
                "collision_metadata_rejected"
            );
            return CollisionLoadOutcome::Fallback(reason);
        }
    }

    match decode_mask_image(&request.mask_path, request.scene_size) {
        Ok(mask) => CollisionLoadOutcome::Mask(mask),
        Err(error) => {
            warn!(scene = request.scene, error = %error, "mask_load_failed");
            CollisionLoadOutcome::Fallback(FallbackReason::MaskUnavailable(error.to_string()))
        }
    }
}

/// Collision source resolution running off the tick thread.
///
/// The scene polls once per tick. Dropping the job abandons the result; the worker's
/// late delivery then goes nowhere.
#[derive(Debug)]
pub struct MaskLoadJob {
    receiver: Receiver<CollisionLoadOutcome>,
    finished: bool,
}

impl MaskLoadJob {
    pub fn spawn(request: MaskLoadRequest) -> Result<Self, MaskLoadError> {
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name(format!("mask-{}", request.scene))
            .spawn(move || {
                let outcome = load_collision_source(&request);
                // A closed channel means the scene was torn down first.
                let _ = sender.send(outcome);
            })
            .map_err(MaskLoadError::SpawnWorker)?;
        Ok(Self {
            receiver,
            finished: false,
        })
    }

    pub fn poll(&mut self) -> Option<CollisionLoadOutcome> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.finished = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(CollisionLoadOutcome::Fallback(FallbackReason::LoaderLost))
            }
        }
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<CollisionLoadOutcome> {
        if self.finished {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.finished = true;
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.finished = true;
                Some(CollisionLoadOutcome::Fallback(FallbackReason::LoaderLost))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_mask(dir: &TempDir, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join("mask.png");
        let image = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([10, 10, 10, 255])
            }
        });
        image.save(&path).expect("save mask");
        path
    }

    fn write_metadata(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("scene.json");
        fs::write(&path, body).expect("write metadata");
        path
    }

    fn request(mask_path: PathBuf, metadata_path: Option<PathBuf>) -> MaskLoadRequest {
        MaskLoadRequest {
            scene: "test",
            mask_path,
            metadata_path,
            scene_size: (64, 32),
            collision_layer: COLLISION_LAYER_NAME.to_string(),
        }
    }

    #[test]
    fn metadata_layer_lookup_matches_exact_name() {
        let parsed: SceneMetadata = serde_json::from_str(
            r#"{"meta":{"layers":[{"name":"Ground","opacity":1},{"name":"Collision"}]}}"#,
        )
        .expect("metadata");
        assert!(parsed.has_layer("Collision"));
        assert!(!parsed.has_layer("collision"));
    }

    #[test]
    fn missing_metadata_file_is_reported_as_missing() {
        let dir = TempDir::new().expect("tempdir");
        let state = read_scene_metadata(&dir.path().join("absent.json")).expect("state");
        assert!(matches!(state, MetadataReadState::Missing));
    }

    #[test]
    fn mask_with_collision_layer_decodes_at_scene_size() {
        let dir = TempDir::new().expect("tempdir");
        let mask = write_mask(&dir, 32, 16);
        let metadata = write_metadata(&dir, r#"{"meta":{"layers":[{"name":"Collision"}]}}"#);

        let outcome = load_collision_source(&request(mask, Some(metadata)));

        let image = match outcome {
            CollisionLoadOutcome::Mask(image) => image,
            other => panic!("expected mask, got {other:?}"),
        };
        assert_eq!((image.width(), image.height()), (64, 32));
        assert_eq!(image.rgba().len(), 64 * 32 * 4);
        assert_eq!(&image.rgba()[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn metadata_without_collision_layer_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let mask = write_mask(&dir, 64, 32);
        let metadata = write_metadata(&dir, r#"{"meta":{"layers":[{"name":"Ground"}]}}"#);

        assert_eq!(
            load_collision_source(&request(mask, Some(metadata))),
            CollisionLoadOutcome::Fallback(FallbackReason::CollisionLayerMissing)
        );
    }

    #[test]
    fn malformed_or_absent_metadata_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let mask = write_mask(&dir, 64, 32);
        let broken = write_metadata(&dir, "{ not json");

        assert!(matches!(
            load_collision_source(&request(mask.clone(), Some(broken))),
            CollisionLoadOutcome::Fallback(FallbackReason::MetadataUnreadable(_))
        ));
        assert_eq!(
            load_collision_source(&request(mask, Some(dir.path().join("absent.json")))),
            CollisionLoadOutcome::Fallback(FallbackReason::MetadataMissing)
        );
    }

    #[test]
    fn undecodable_mask_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let bogus = dir.path().join("mask.png");
        fs::write(&bogus, b"definitely not a png").expect("write");

        assert!(matches!(
            load_collision_source(&request(bogus, None)),
            CollisionLoadOutcome::Fallback(FallbackReason::MaskUnavailable(_))
        ));
    }

    #[test]
    fn job_delivers_fallback_for_missing_mask() {
        let dir = TempDir::new().expect("tempdir");
        let mut job = MaskLoadJob::spawn(request(dir.path().join("nope.png"), None)).expect("job");

        let outcome = job.wait(Duration::from_secs(5)).expect("outcome");

        assert!(matches!(
            outcome,
            CollisionLoadOutcome::Fallback(FallbackReason::MaskUnavailable(_))
        ));
        assert!(job.is_finished());
        assert_eq!(job.poll(), None);
    }

    #[test]
    fn dropping_job_before_delivery_is_harmless() {
        let dir = TempDir::new().expect("tempdir");
        let mask = write_mask(&dir, 64, 32);
        let job = MaskLoadJob::spawn(request(mask, None)).expect("job");
        drop(job);
    }
}
