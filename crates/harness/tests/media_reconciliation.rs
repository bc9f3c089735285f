use sitesurvey_core::{LocalBlob, MediaPart, SlotAction, SlotState};
use sitesurvey_harness::TestSite;

// ============================================================================
// Media diff through submit/reload round-trips
// ============================================================================

#[tokio::test]
async fn unchanged_remote_images_are_never_resent() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("antennas").await?;
    let mut screen = session.lock().await;
    let mut backend = site.backend.lock().await;

    screen.set_value(0, "vendor", "Nokia")?;
    screen.attach("antenna_1_photo", LocalBlob::new("a1.jpg", vec![0xFF, 0xD8, 0x01]));
    screen.submit(&mut *backend)?;

    assert!(matches!(
        screen.media().state("antenna_1_photo"),
        Some(SlotState::Remote(_))
    ));

    // Second save touches only a field.
    screen.set_value(0, "vendor", "Nokia AirScale")?;
    screen.submit(&mut *backend)?;

    let last = backend.last_request().ok_or("no request recorded")?;
    assert!(last.media.is_empty());
    assert_eq!(backend.store().images(screen.key())?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn removing_a_remote_image_sends_an_empty_marker() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("generators").await?;
    let mut screen = session.lock().await;
    let mut backend = site.backend.lock().await;

    screen.attach("generator_nameplate", LocalBlob::new("plate.jpg", vec![1; 16]));
    screen.attach("fuel_tank_photo", LocalBlob::new("tank.jpg", vec![2; 16]));
    screen.submit(&mut *backend)?;

    assert!(screen.remove_media("fuel_tank_photo"));
    assert_eq!(
        screen.media().diff_for_submission().get("fuel_tank_photo"),
        Some(SlotAction::SendEmptyMarker)
    );
    screen.submit(&mut *backend)?;

    let last = backend.last_request().ok_or("no request recorded")?;
    assert_eq!(last.media.len(), 1);
    assert_eq!(last.media.get("fuel_tank_photo"), Some(&MediaPart::EmptyMarker));
    assert_eq!(screen.media().state("fuel_tank_photo"), Some(&SlotState::Empty));
    assert!(matches!(
        screen.media().state("generator_nameplate"),
        Some(SlotState::Remote(image)) if image.filename == "plate.jpg"
    ));

    Ok(())
}

#[tokio::test]
async fn removing_an_empty_slot_leaves_screen_clean() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("site_info").await?;
    let mut screen = session.lock().await;

    assert!(!screen.remove_media("site_overview"));
    assert!(!screen.is_dirty());
    assert!(screen.build_request().media.is_empty());

    Ok(())
}

#[tokio::test]
async fn replacing_an_image_uploads_new_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("site_info").await?;
    let mut screen = session.lock().await;
    let mut backend = site.backend.lock().await;

    screen.attach("site_overview", LocalBlob::new("v1.jpg", vec![1, 1, 1]));
    screen.submit(&mut *backend)?;
    let first_id = match screen.media().state("site_overview") {
        Some(SlotState::Remote(image)) => image.id,
        other => return Err(format!("expected remote image, got {other:?}").into()),
    };

    screen.attach("site_overview", LocalBlob::new("v2.jpg", vec![2, 2, 2]));
    screen.submit(&mut *backend)?;
    let image = match screen.media().state("site_overview") {
        Some(SlotState::Remote(image)) => image.clone(),
        other => return Err(format!("expected remote image, got {other:?}").into()),
    };

    assert_ne!(image.id, first_id);
    assert_eq!(image.filename, "v2.jpg");
    assert_eq!(backend.store().image_bytes(image.id)?, vec![2, 2, 2]);

    Ok(())
}

#[tokio::test]
async fn failed_save_keeps_staged_media_for_retry() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("site_info").await?;
    let mut screen = session.lock().await;
    let mut backend = site.backend.lock().await;

    screen.attach("site_overview", LocalBlob::new("overview.jpg", vec![9; 4]));
    backend.fail_next_saves(1);

    assert!(screen.submit(&mut *backend).is_err());
    assert!(screen.is_dirty());
    assert!(matches!(
        screen.media().state("site_overview"),
        Some(SlotState::StagedLocal(_))
    ));
    assert!(backend.received().is_empty());

    screen.submit(&mut *backend)?;
    assert!(!screen.is_dirty());
    assert_eq!(backend.received().len(), 1);

    Ok(())
}
