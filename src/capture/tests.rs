use super::*;
use crate::{
    camera::{noise_frame, Frame, ScriptedCamera, ScriptedOutcome},
    config::CameraConfig,
    error::CameraError,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_camera_config() -> CameraConfig {
    CameraConfig {
        index: 0,
        resolution: (160, 120),
        jpeg_quality: 95,
        warmup_seconds: 2,
        min_file_bytes: 1000,
    }
}

#[tokio::test(start_paused = true)]
async fn test_successful_capture_writes_file_at_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("20240307_090530.jpg");
    let camera = ScriptedCamera::noise(160, 120);
    let station = CaptureStation::new(create_test_camera_config(), Arc::new(camera.clone()));

    let image = station.capture(&path).await.unwrap();

    assert_eq!(image.path, path);
    assert!(image.size_bytes > 1000);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), image.size_bytes);
    assert_eq!((image.width, image.height), (160, 120));
    // JPEG SOI marker
    assert_eq!(&std::fs::read(&path).unwrap()[..2], &[0xFF, 0xD8]);
    assert_eq!(camera.open_count(), 1);
    assert_eq!(camera.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_capture_across_quality_levels() {
    let temp_dir = TempDir::new().unwrap();

    for quality in [10u8, 50, 75, 95, 100] {
        let mut config = create_test_camera_config();
        config.jpeg_quality = quality;
        config.resolution = (320, 240);
        let station = CaptureStation::new(config, Arc::new(ScriptedCamera::noise(320, 240)));
        let path = temp_dir.path().join(format!("q{}.jpg", quality));

        let image = station.capture(&path).await.unwrap();
        assert!(image.size_bytes >= 1000, "quality {} too small", quality);
        assert!(path.exists());
    }
}

#[tokio::test(start_paused = true)]
async fn test_capture_waits_for_warmup() {
    let temp_dir = TempDir::new().unwrap();
    let station = CaptureStation::new(
        create_test_camera_config(),
        Arc::new(ScriptedCamera::noise(160, 120)),
    );

    let started = tokio::time::Instant::now();
    station
        .capture(&temp_dir.path().join("warm.jpg"))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_device_open_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.jpg");
    let camera = ScriptedCamera::missing();
    let station = CaptureStation::new(create_test_camera_config(), Arc::new(camera.clone()));

    let started = tokio::time::Instant::now();
    let result = station.capture(&path).await;

    assert!(matches!(result, Err(CameraError::DeviceOpen { .. })));
    assert!(!path.exists());
    // Fails fast, no warmup wait
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(camera.release_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_frame_releases_device() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("noframe.jpg");
    let camera = ScriptedCamera::new([ScriptedOutcome::NoFrame]);
    let station = CaptureStation::new(create_test_camera_config(), Arc::new(camera.clone()));

    let result = station.capture(&path).await;

    assert!(matches!(result, Err(CameraError::NoFrame { .. })));
    assert!(!path.exists());
    assert_eq!(camera.open_count(), 1);
    assert_eq!(camera.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_frame_is_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.jpg");
    let camera = ScriptedCamera::new([ScriptedOutcome::EmptyFrame]);
    let station = CaptureStation::new(create_test_camera_config(), Arc::new(camera.clone()));

    assert!(station.capture(&path).await.is_err());
    assert!(!path.exists());
    assert_eq!(camera.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_undersized_file_is_removed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tiny.jpg");
    let mut config = create_test_camera_config();
    config.min_file_bytes = 50_000_000;
    let station = CaptureStation::new(config, Arc::new(ScriptedCamera::noise(160, 120)));

    let result = station.capture(&path).await;

    assert!(matches!(result, Err(CameraError::TooSmall { .. })));
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn test_write_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no_such_day").join("x.jpg");
    let station = CaptureStation::new(
        create_test_camera_config(),
        Arc::new(ScriptedCamera::noise(160, 120)),
    );

    assert!(matches!(
        station.capture(&path).await,
        Err(CameraError::Write { .. })
    ));
}

#[test]
fn test_encode_rejects_mismatched_buffer() {
    let frame = Frame::new(10, 10, vec![0u8; 12]);
    assert!(matches!(
        encode_jpeg(&frame, 90),
        Err(CameraError::Encode { .. })
    ));
}

#[test]
fn test_higher_quality_is_larger() {
    let frame = noise_frame(64, 64);
    let low = encode_jpeg(&frame, 20).unwrap();
    let high = encode_jpeg(&frame, 95).unwrap();
    assert!(high.len() > low.len());
}
