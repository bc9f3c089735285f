use sitesurvey_core::{FieldValue, Provenance, Row};
use sitesurvey_harness::{init_test_logging, TestSite};

// ============================================================================
// Propagation through an open screen
// ============================================================================

#[tokio::test]
async fn azimuth_walkthrough() -> Result<(), Box<dyn std::error::Error>> {
    init_test_logging();
    let site = TestSite::new()?;
    let session = site.open_screen("antennas").await?;
    let mut screen = session.lock().await;
    screen.set_entity_count(3);

    screen.set_value(0, "azimuth", 120i64)?;
    for i in [1, 2] {
        assert_eq!(screen.grid().value(i, "azimuth"), &FieldValue::Integer(120));
        assert_eq!(screen.grid().provenance(i, "azimuth"), Some(Provenance::Inherited));
    }

    screen.set_value(1, "azimuth", 90i64)?;
    assert_eq!(screen.grid().value(1, "azimuth"), &FieldValue::Integer(90));
    assert_eq!(screen.grid().provenance(1, "azimuth"), Some(Provenance::Authored));
    assert_eq!(screen.grid().value(2, "azimuth"), &FieldValue::Integer(120));

    screen.set_value(0, "azimuth", 45i64)?;
    assert_eq!(screen.grid().value(0, "azimuth"), &FieldValue::Integer(45));
    assert_eq!(screen.grid().value(1, "azimuth"), &FieldValue::Integer(90));
    assert_eq!(screen.grid().value(2, "azimuth"), &FieldValue::Integer(45));
    assert_eq!(screen.grid().provenance(2, "azimuth"), Some(Provenance::Inherited));

    Ok(())
}

#[tokio::test]
async fn every_edit_marks_the_screen_dirty() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("generators").await?;
    let mut screen = session.lock().await;
    assert!(!screen.is_dirty());

    screen.set_entity_count(2);
    assert!(screen.is_dirty());

    let mut backend = site.backend.lock().await;
    screen.submit(&mut *backend)?;
    assert!(!screen.is_dirty());

    screen.toggle_member(1, "fuel", "diesel", true)?;
    assert!(screen.is_dirty());

    Ok(())
}

#[tokio::test]
async fn shrinking_then_growing_yields_blank_columns() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("antennas").await?;
    let mut screen = session.lock().await;

    screen.set_entity_count(5);
    screen.set_value(0, "vendor", "Nokia")?;
    screen.set_value(4, "vendor", "Huawei")?;
    screen.set_value(3, "height_m", 28.5)?;

    screen.set_entity_count(3);
    assert_eq!(screen.grid().active_entities().len(), 3);
    assert_eq!(screen.build_request().entities.len(), 3);

    screen.set_entity_count(5);
    for i in 3..5 {
        assert!(screen.grid().entity(i).is_some_and(|e| e.cells().next().is_none()));
    }
    Ok(())
}

#[tokio::test]
async fn saved_grid_reloads_with_mirroring_intact() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    {
        let session = site.open_screen("antennas").await?;
        let mut screen = session.lock().await;
        screen.set_entity_count(3);
        screen.set_value(0, "vendor", "Nokia")?;
        screen.set_value(2, "vendor", "Ericsson")?;
        screen.set_value(0, "tilt", 4i64)?;

        let mut backend = site.backend.lock().await;
        screen.submit(&mut *backend)?;
    }

    let session = site.open_screen("antennas").await?;
    let mut screen = session.lock().await;
    assert_eq!(screen.grid().entity_count(), 3);
    assert!(!screen.is_dirty());

    screen.set_value(0, "vendor", "Samsung")?;
    assert_eq!(screen.grid().value(1, "vendor"), &FieldValue::from("Samsung"));
    assert_eq!(screen.grid().value(2, "vendor"), &FieldValue::from("Ericsson"));
    assert!(screen.grid().is_inherited(2, "tilt"));

    Ok(())
}

#[tokio::test]
async fn feeder_table_copies_to_mirroring_columns() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("antennas").await?;
    let mut screen = session.lock().await;
    screen.set_entity_count(2);

    let mut row = Row::new();
    row.insert("cable".into(), "7/8in".into());
    screen.push_row(0, "feeders", row)?;
    screen.set_row_cell(0, "feeders", 0, "length_m", 40.0)?;

    let rows = screen.grid().value(1, "feeders").as_rows().map(<[Row]>::to_vec);
    let rows = rows.ok_or("column 1 has no feeder table")?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["length_m"], FieldValue::Number(40.0));

    let removed = screen.remove_row(0, "feeders", 0)?;
    assert_eq!(removed["cable"], FieldValue::from("7/8in"));
    assert_eq!(screen.grid().value(1, "feeders"), &FieldValue::Rows(vec![]));

    Ok(())
}

#[tokio::test]
async fn out_of_range_column_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let site = TestSite::new()?;
    let session = site.open_screen("site_info").await?;
    let mut screen = session.lock().await;

    screen.set_entity_count(4);
    assert_eq!(screen.grid().entity_count(), 1);
    assert!(screen.set_value(1, "address", "Hilltop").is_err());
    assert!(!screen.is_dirty());

    Ok(())
}
