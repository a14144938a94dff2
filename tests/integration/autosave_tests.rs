/*!
 * Integration tests for autosave persistence and restore
 */

use anyhow::Result;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;

use subedit::app_config::AutosaveConfig;
use subedit::autosave::{self, Autosaver, SnapshotStore, SqliteSnapshotStore, AUTOSAVE_KEY};
use subedit::cue::Cue;
use crate::common;

/// Test that the background saver persists the latest contents to disk
#[tokio::test]
async fn test_autosaveRun_withFileStore_shouldRestoreLatestState() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("autosave.db");

    let store = SqliteSnapshotStore::new(&db_path)?;
    let (contents, receiver) = watch::channel(Vec::<Cue>::new());
    let saver = tokio::spawn(Autosaver::new(store).run(Duration::from_millis(20), receiver));

    contents.send(common::sample_cues())?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut edited = common::sample_cues();
    edited[0].text = "changed before exit".to_string();
    contents.send(edited.clone())?;
    drop(contents);
    saver.await?;

    let reopened = Autosaver::new(SqliteSnapshotStore::new(&db_path)?);
    let snapshot = reopened.restore_candidate(Utc::now())?.expect("no autosave found");
    assert_eq!(snapshot.items, edited);
    assert_eq!(reopened.store().count()?, 1);
    Ok(())
}

/// Test that the configured restore window is honoured
#[test]
fn test_restoreCandidate_withZeroMaxAge_shouldOfferNothing() -> Result<()> {
    let config = AutosaveConfig { max_age_hours: 0, ..AutosaveConfig::default() };
    let mut autosaver = Autosaver::from_config(SqliteSnapshotStore::new_in_memory()?, &config);

    assert!(autosaver.save(&common::sample_cues(), Utc::now())?);
    assert!(autosaver.restore_candidate(Utc::now())?.is_none());
    Ok(())
}

/// Test discarding removes the stored snapshot and allows re-saving the same content
#[test]
fn test_discard_shouldRemoveSnapshot() -> Result<()> {
    let mut autosaver = Autosaver::new(SqliteSnapshotStore::new_in_memory()?);
    let cues = common::sample_cues();

    autosaver.save(&cues, Utc::now())?;
    assert!(autosaver.store().get(AUTOSAVE_KEY)?.is_some());

    assert!(autosaver.discard()?);
    assert!(autosaver.store().get(AUTOSAVE_KEY)?.is_none());
    assert!(autosaver.save(&cues, Utc::now())?);
    Ok(())
}

/// Test that the configured saver writes to the configured database
#[tokio::test]
async fn test_spawn_withEnabledConfig_shouldSaveToConfiguredPath() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("nested").join("autosave.db");
    let config = AutosaveConfig {
        interval_secs: 1,
        database_path: Some(db_path.clone()),
        ..AutosaveConfig::default()
    };

    let (contents, receiver) = watch::channel(Vec::<Cue>::new());
    let saver = autosave::spawn(&config, receiver)?.expect("autosave should be enabled");
    contents.send(common::sample_cues())?;
    drop(contents);
    saver.await?;

    let reopened = Autosaver::from_config(SqliteSnapshotStore::from_config(&config)?, &config);
    let snapshot = reopened.restore_candidate(Utc::now())?.expect("no autosave found");
    assert_eq!(snapshot.items, common::sample_cues());
    Ok(())
}

/// Test that a disabled config starts nothing and opens no database
#[test]
fn test_spawn_withDisabledConfig_shouldDoNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("autosave.db");
    let config = AutosaveConfig {
        enabled: false,
        database_path: Some(db_path.clone()),
        ..AutosaveConfig::default()
    };
    let (_contents, receiver) = watch::channel(Vec::<Cue>::new());

    assert!(autosave::spawn(&config, receiver)?.is_none());
    assert!(!db_path.exists());
    Ok(())
}
