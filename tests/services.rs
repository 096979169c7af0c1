use mblog_store::domain::content::{ContentKind, NewContent};
use mblog_store::domain::types::ContentId;
use mblog_store::repository::{ContentReader, ContentWriter};
use mblog_store::services::ServiceError;
use mblog_store::services::import_export::{export_collection, import_collection};
use mblog_store::services::maintenance::{
    cleanup_backups, create_backup, health_check, reset_stats, restore_backup, validate_integrity,
};

mod common;

#[test]
fn export_import_round_trip_between_databases() {
    let source_db = common::TestDb::new();
    let source = common::sqlite_repository(&source_db);
    for title in ["Ownership", "Borrowing", "Lifetimes"] {
        source
            .create_content(ContentKind::Tutorial, &NewContent::new(title, "Tech"))
            .unwrap();
    }
    source
        .record_view(ContentKind::Tutorial, ContentId::new(2).unwrap())
        .unwrap();
    let original = source.list_content(ContentKind::Tutorial).unwrap();

    let file = export_collection(&source, ContentKind::Tutorial, "1.0").unwrap();
    assert_eq!(file.content_type, "application/json");

    let target_db = common::TestDb::new();
    let target = common::sqlite_repository(&target_db);
    let json = String::from_utf8(file.bytes).unwrap();
    let report = import_collection(&target, ContentKind::Tutorial, &json).unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(target.list_content(ContentKind::Tutorial).unwrap(), original);
}

#[test]
fn backup_restore_cycle_is_reported_healthy() {
    let test_db = common::TestDb::new();
    let repo = common::sqlite_repository(&test_db);
    repo.create_content(ContentKind::Resource, &NewContent::new("Guide", "Tech"))
        .unwrap();

    assert!(create_backup(&repo, ContentKind::Resource).unwrap() > 0);
    repo.delete_content(ContentKind::Resource, ContentId::new(1).unwrap())
        .unwrap();
    assert_eq!(restore_backup(&repo, ContentKind::Resource).unwrap(), 1);

    let health = health_check(&repo, ContentKind::Resource).unwrap();
    assert!(health.healthy, "{:?}", health.issues);
    assert_eq!(health.record_count, 1);
    assert!(health.has_manual_backup);
    assert!(validate_integrity(&repo, ContentKind::Resource).unwrap().valid);

    // Manual and restored copies go; the automatic snapshot stays.
    assert_eq!(cleanup_backups(&repo, ContentKind::Resource).unwrap(), 2);
    assert!(health_check(&repo, ContentKind::Resource).unwrap().has_backup);
}

#[test]
fn reset_stats_needs_confirmation() {
    let test_db = common::TestDb::new();
    let repo = common::sqlite_repository(&test_db);
    repo.create_content(ContentKind::Favorite, &NewContent::new("Pick", "Tech"))
        .unwrap();
    repo.toggle_like(ContentKind::Favorite, ContentId::new(1).unwrap())
        .unwrap();

    assert_eq!(
        reset_stats(&repo, ContentKind::Favorite, false),
        Err(ServiceError::Confirmation)
    );
    assert_eq!(reset_stats(&repo, ContentKind::Favorite, true), Ok(1));
    assert_eq!(
        repo.list_content(ContentKind::Favorite).unwrap()[0].likes,
        0
    );
}
