//! End-to-end behaviour of the dual session controller with mock devices.

use dual_capture::auth::{AuthorizationStatus, StaticAuthorization};
use dual_capture::capture::{
    CameraError, CameraPosition, FileConfig, FlashMode, MockCamera, MockDiscovery,
};
use dual_capture::compositor::PipPosition;
use dual_capture::controller::DualSessionController;
use std::time::Duration;

const FRONT: (u32, u32) = (60, 80);
const BACK: (u32, u32) = (320, 240);

type Controller = DualSessionController<MockDiscovery, StaticAuthorization>;

fn controller_with(discovery: MockDiscovery, auth: StaticAuthorization) -> Controller {
    DualSessionController::new(discovery, auth, &FileConfig::default()).unwrap()
}

async fn running(discovery: MockDiscovery) -> Controller {
    let mut controller = controller_with(discovery, StaticAuthorization::granted());
    assert!(controller.check_authorization().await);
    controller.start_sessions().await.unwrap();
    controller
}

fn delayed_pair(front_delay: Duration, back_delay: Duration) -> MockDiscovery {
    MockDiscovery::new(
        Some(MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1).with_capture_delay(front_delay)),
        Some(MockCamera::new(CameraPosition::Back, BACK.0, BACK.1).with_capture_delay(back_delay)),
    )
}

#[tokio::test]
async fn test_single_capture_produces_one_composite() {
    let mut controller = running(MockDiscovery::pair(FRONT, BACK)).await;
    assert!(controller.is_session_running());

    controller.capture_dual_photo().await.unwrap();

    let result = controller.result();
    assert!(result.front_image().is_some());
    assert!(result.back_image().is_some());
    assert_eq!(result.composite_image().unwrap().dimensions(), BACK);

    let snapshot = controller.snapshot();
    assert!(snapshot.has_composite);
    assert!(!snapshot.is_capturing);
    assert!(snapshot.error.is_none());
    assert_eq!(controller.metrics_snapshot().composites_total, 1);

    controller.clear_captures();
    let result = controller.result();
    assert!(result.front_image().is_none());
    assert!(result.back_image().is_none());
    assert!(result.composite_image().is_none());
    assert!(!controller.snapshot().has_composite);
}

#[tokio::test]
async fn test_completion_order_does_not_matter() {
    // Front settles last
    let mut front_last = running(delayed_pair(Duration::from_millis(60), Duration::ZERO)).await;
    front_last.capture_dual_photo().await.unwrap();

    // Back settles last
    let mut back_last = running(delayed_pair(Duration::ZERO, Duration::from_millis(60))).await;
    back_last.capture_dual_photo().await.unwrap();

    let a = front_last.result().composite_image().unwrap();
    let b = back_last.result().composite_image().unwrap();
    assert_eq!(a, b);
    assert_eq!(front_last.metrics_snapshot().composites_total, 1);
    assert_eq!(back_last.metrics_snapshot().composites_total, 1);
}

#[tokio::test]
async fn test_side_failure_resolves_without_composite() {
    let discovery = MockDiscovery::new(
        Some(MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1)),
        Some(
            MockCamera::new(CameraPosition::Back, BACK.0, BACK.1)
                .with_capture_failure("shutter jammed")
                .with_capture_delay(Duration::from_millis(20)),
        ),
    );
    let mut controller = running(discovery).await;

    let outcome = controller.capture_dual_photo().await;
    assert_eq!(
        outcome,
        Err(CameraError::CaptureError("shutter jammed".into()))
    );

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_capturing);
    assert!(!snapshot.has_composite);
    assert_eq!(
        snapshot.error,
        Some(CameraError::CaptureError("shutter jammed".into()))
    );
    assert!(controller.result().composite_image().is_none());
    assert!(controller.result().front_image().is_none());
    assert_eq!(controller.metrics_snapshot().capture_failures_total, 1);
}

#[tokio::test]
async fn test_side_failure_does_not_wait_for_partner() {
    let discovery = MockDiscovery::new(
        Some(MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1).with_capture_failure("sensor fault")),
        Some(
            MockCamera::new(CameraPosition::Back, BACK.0, BACK.1)
                .with_capture_delay(Duration::from_secs(2)),
        ),
    );
    let mut controller = running(discovery).await;

    let outcome = tokio::time::timeout(Duration::from_millis(500), controller.capture_dual_photo())
        .await
        .expect("first error resolves the capture");
    assert_eq!(outcome, Err(CameraError::CaptureError("sensor fault".into())));

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_capturing);
    assert!(!snapshot.has_composite);
    assert!(controller.result().is_empty());
}

#[tokio::test]
async fn test_dropped_completion_does_not_hang() {
    let discovery = MockDiscovery::new(
        Some(MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1).dropping_completions()),
        Some(MockCamera::new(CameraPosition::Back, BACK.0, BACK.1)),
    );
    let mut controller = running(discovery).await;

    let outcome = tokio::time::timeout(Duration::from_secs(5), controller.capture_dual_photo())
        .await
        .expect("capture must resolve");
    assert!(matches!(outcome, Err(CameraError::CaptureError(_))));
    assert!(controller.result().composite_image().is_none());
}

#[tokio::test]
async fn test_capture_error_is_retryable() {
    let mut controller = running(MockDiscovery::pair(FRONT, BACK)).await;

    controller.stop_sessions().await.unwrap();
    assert!(matches!(
        controller.capture_dual_photo().await,
        Err(CameraError::CaptureError(_))
    ));

    controller.start_sessions().await.unwrap();
    controller.capture_dual_photo().await.unwrap();
    assert!(controller.snapshot().error.is_none());
    assert!(controller.result().composite_image().is_some());
}

#[tokio::test]
async fn test_authorization_denied_blocks_capture() {
    let front = MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1);
    let back = MockCamera::new(CameraPosition::Back, BACK.0, BACK.1);
    let (front_probe, back_probe) = (front.probe(), back.probe());
    let mut controller = controller_with(
        MockDiscovery::new(Some(front), Some(back)),
        StaticAuthorization::denied(),
    );

    assert!(!controller.check_authorization().await);
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_authorized);
    assert_eq!(snapshot.error, Some(CameraError::NotAuthorized));
    assert!(!snapshot.front_ready && !snapshot.back_ready);

    assert_eq!(
        controller.capture_dual_photo().await,
        Err(CameraError::NotAuthorized)
    );
    assert_eq!(front_probe.captures(), 0);
    assert_eq!(back_probe.captures(), 0);
    assert_eq!(front_probe.begins(), 0);
}

#[tokio::test]
async fn test_denied_controller_cannot_configure_or_start() {
    let front = MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1);
    let front_probe = front.probe();
    let mut controller = controller_with(
        MockDiscovery::new(Some(front), Some(MockCamera::new(CameraPosition::Back, BACK.0, BACK.1))),
        StaticAuthorization::denied(),
    );
    assert!(!controller.check_authorization().await);

    let report = controller.configure_sessions().await;
    assert_eq!(report.first_error(), Some(&CameraError::NotAuthorized));
    assert!(!report.is_complete());

    let snapshot = controller.snapshot();
    assert!(!snapshot.front_ready && !snapshot.back_ready);
    assert_eq!(snapshot.error, Some(CameraError::NotAuthorized));
    assert_eq!(front_probe.begins(), 0);

    assert_eq!(
        controller.start_sessions().await,
        Err(CameraError::NotAuthorized)
    );
    assert!(!controller.is_session_running());
    assert!(controller.front_preview().latest().is_none());
    assert_eq!(front_probe.starts(), 0);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let mut config = FileConfig::default();
    config.composite.inset_width_ratio = 1e6;

    let built = DualSessionController::new(
        MockDiscovery::pair(FRONT, BACK),
        StaticAuthorization::granted(),
        &config,
    );
    assert!(matches!(built, Err(CameraError::ConfigurationFailed)));
}

#[tokio::test]
async fn test_authorization_prompt_then_configure() {
    let auth = StaticAuthorization::new(AuthorizationStatus::NotDetermined, true);
    let mut controller = controller_with(MockDiscovery::pair(FRONT, BACK), auth);

    assert!(controller.check_authorization().await);
    assert!(controller.check_authorization().await);
    assert_eq!(controller.authorization().requests(), 1);

    let snapshot = controller.snapshot();
    assert!(snapshot.is_authorized);
    assert!(snapshot.front_ready && snapshot.back_ready);
    assert!(!snapshot.is_session_running);
}

#[tokio::test]
async fn test_toggle_pip_recomposites_in_place() {
    let discovery = MockDiscovery::pair(FRONT, BACK);
    let front_probe = discovery_probe(&discovery, CameraPosition::Front);
    let mut controller = running(discovery).await;
    let start = controller.snapshot().pip_position;
    assert_eq!(start, PipPosition::TopLeft);

    controller.capture_dual_photo().await.unwrap();
    let original = controller.result().composite_image().unwrap().clone();

    assert_eq!(controller.toggle_pip_position(), PipPosition::TopRight);
    let moved = controller.result().composite_image().unwrap().clone();
    assert_ne!(moved, original);
    assert_eq!(moved.dimensions(), BACK);
    assert!(controller.snapshot().has_composite);

    controller.toggle_pip_position();
    controller.toggle_pip_position();
    assert_eq!(controller.toggle_pip_position(), start);
    assert_eq!(controller.result().composite_image().unwrap(), &original);

    // Recomposition never recaptures
    assert_eq!(front_probe.captures(), 1);
}

#[tokio::test]
async fn test_toggle_pip_without_capture() {
    let mut controller = running(MockDiscovery::pair(FRONT, BACK)).await;

    assert_eq!(controller.toggle_pip_position(), PipPosition::TopRight);
    assert!(controller.result().composite_image().is_none());
    assert!(!controller.snapshot().has_composite);
}

#[tokio::test]
async fn test_flash_cycle_applies_to_back_only() {
    let discovery = MockDiscovery::pair(FRONT, BACK);
    let front_probe = discovery_probe(&discovery, CameraPosition::Front);
    let back_probe = discovery_probe(&discovery, CameraPosition::Back);
    let mut controller = running(discovery).await;

    assert_eq!(controller.snapshot().flash_mode, FlashMode::Auto);
    assert_eq!(controller.toggle_flash(), FlashMode::Off);
    assert_eq!(controller.toggle_flash(), FlashMode::On);

    controller.capture_dual_photo().await.unwrap();
    assert_eq!(back_probe.last_flash(), Some(FlashMode::On));
    assert_eq!(front_probe.last_flash(), Some(FlashMode::Off));

    assert_eq!(controller.toggle_flash(), FlashMode::Auto);
}

#[tokio::test]
async fn test_missing_back_camera_degrades() {
    let discovery = MockDiscovery::new(
        Some(MockCamera::new(CameraPosition::Front, FRONT.0, FRONT.1)),
        None,
    );
    let mut controller = running(discovery).await;

    let snapshot = controller.snapshot();
    assert!(snapshot.is_authorized);
    assert!(snapshot.front_ready);
    assert!(!snapshot.back_ready);
    assert!(snapshot.is_session_running);
    assert_eq!(snapshot.error, Some(CameraError::DeviceNotAvailable));

    assert_eq!(
        controller.capture_dual_photo().await,
        Err(CameraError::DeviceNotAvailable)
    );
    assert!(controller.result().composite_image().is_none());
}

#[tokio::test]
async fn test_multi_cam_unsupported() {
    let mut controller = controller_with(
        MockDiscovery::pair(FRONT, BACK).without_multi_cam(),
        StaticAuthorization::granted(),
    );

    assert!(controller.check_authorization().await);
    assert_eq!(
        controller.snapshot().error,
        Some(CameraError::MultiCamNotSupported)
    );
    let status = controller.start_sessions().await.unwrap();
    assert!(!status.is_running());
}

#[tokio::test]
async fn test_previews_follow_running_state() {
    let mut controller = controller_with(MockDiscovery::pair(FRONT, BACK), StaticAuthorization::granted());
    let front = controller.front_preview();
    let back = controller.back_preview();
    assert!(front.latest().is_none());

    controller.check_authorization().await;
    assert!(front.latest().is_none());

    controller.start_sessions().await.unwrap();
    assert_eq!(front.latest().unwrap().position(), CameraPosition::Front);
    assert_eq!(back.latest().unwrap().position(), CameraPosition::Back);

    controller.stop_sessions().await.unwrap();
    assert!(front.latest().is_none());
    assert!(!controller.is_session_running());
}

#[tokio::test]
async fn test_snapshot_subscription_sees_running() {
    let mut controller = controller_with(MockDiscovery::pair(FRONT, BACK), StaticAuthorization::granted());
    let mut updates = controller.subscribe();
    controller.check_authorization().await;

    // Fire-and-forget start; the published state catches up
    let _ = controller.start_sessions();
    tokio::time::timeout(Duration::from_secs(5), updates.wait_for(|s| s.is_session_running))
        .await
        .expect("sessions must start")
        .unwrap();
}

#[tokio::test]
async fn test_upload_handoff() {
    let mut controller = running(MockDiscovery::pair(FRONT, BACK)).await;
    assert!(controller.result().upload(None).is_none());

    controller.capture_dual_photo().await.unwrap();
    let upload = controller.result().upload(Some("night out".into())).unwrap();
    assert_eq!(upload.caption.as_deref(), Some("night out"));
    assert_eq!(upload.image.dimensions(), BACK);
}

fn discovery_probe(
    discovery: &MockDiscovery,
    position: CameraPosition,
) -> std::sync::Arc<dual_capture::capture::MockProbe> {
    use dual_capture::capture::DeviceDiscovery;
    discovery
        .clone()
        .default_device(position)
        .expect("mock device present")
        .probe()
}
