use std::io::{Cursor, Read};
use std::sync::Arc;

use common::MediaKind;
use gallery::config::LimitsConfig;

use crate::common::{FailingCompressor, TestApp, TestFile, routes};

fn entry_names(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test]
async fn export_with_no_records() {
    let app = TestApp::spawn().await;
    app.login().await;

    let res = app.get(&routes::download("photos")).await;

    assert_eq!(res.status, 303);
    assert_eq!(res.location().as_deref(), Some(routes::ADMIN));
    assert_eq!(res.error().as_deref(), Some("No files to download."));
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn export_streams_sequenced_archive() {
    let app = TestApp::spawn().await;
    app.upload("photos", "Alice", vec![TestFile::photo("beach.jpg")])
        .await;
    app.upload("photos", "Bob", vec![TestFile::photo("cake.jpg")])
        .await;
    app.login().await;

    let (status, headers, bytes) = app.get_bytes(&routes::download("photos")).await;

    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "application/zip");
    let disposition = headers["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"photos-"));
    assert!(disposition.contains(".zip"));
    assert_eq!(headers["x-skipped-files"], "0");

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let mut contents = String::new();
    archive
        .by_name("0001_cake.jpg")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "jpeg bytes of cake.jpg");

    let mut names = entry_names(bytes);
    names.sort();
    assert_eq!(names, ["0001_cake.jpg", "0002_beach.jpg"]);

    assert!(app.wait_for_empty_scratch().await);
}

#[tokio::test]
async fn export_skips_missing_files() {
    let app = TestApp::spawn().await;
    app.upload(
        "videos",
        "Alice",
        vec![TestFile::video("one.mp4"), TestFile::video("two.mp4")],
    )
    .await;
    app.login().await;
    let records = app.media(MediaKind::Video).await;
    app.remove_stored_file(MediaKind::Video, &records[0]);

    let (status, headers, bytes) = app.get_bytes(&routes::download("videos")).await;

    assert_eq!(status, 200);
    assert_eq!(headers["x-skipped-files"], "1");
    let names = entry_names(bytes);
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("_two.mp4"));
    assert!(app.wait_for_empty_scratch().await);
}

#[tokio::test]
async fn export_with_every_file_missing() {
    let app = TestApp::spawn().await;
    app.upload("photos", "Alice", vec![TestFile::photo("a.jpg")])
        .await;
    app.login().await;
    let record = app.media(MediaKind::Photo).await.remove(0);
    app.remove_stored_file(MediaKind::Photo, &record);

    let res = app.get(&routes::download("photos")).await;

    assert_eq!(res.error().as_deref(), Some("Files missing on disk."));
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn compression_failure_cleans_up() {
    let app = TestApp::spawn_with(LimitsConfig::default(), Arc::new(FailingCompressor)).await;
    app.upload("photos", "Alice", vec![TestFile::photo("a.jpg")])
        .await;
    app.login().await;

    let res = app.get(&routes::download("photos")).await;

    assert_eq!(res.error().as_deref(), Some("Could not create archive."));
    assert_eq!(app.scratch_entries(), 0);
    // The originals are untouched.
    assert_eq!(app.files_on_disk(MediaKind::Photo), 1);
}

#[tokio::test]
async fn export_requires_login() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::download("photos")).await;

    assert_eq!(res.location().as_deref(), Some(routes::LOGIN));
}
