use common::MediaKind;
use gallery::config::LimitsConfig;
use sea_orm::ConnectionTrait;

use crate::common::{TestApp, TestFile, kind_limits, test_limits};

/// Photos: 2 per person, 3 in total, 4 per request.
fn tight_limits() -> LimitsConfig {
    test_limits(kind_limits(2, 3, 1, 4), LimitsConfig::default().videos)
}

mod admission {
    use super::*;

    #[tokio::test]
    async fn per_person_and_global_limits() {
        let app = TestApp::spawn_with_limits(tight_limits()).await;

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![TestFile::photo("a1.jpg"), TestFile::photo("a2.jpg")],
            )
            .await;
        assert_eq!(res.status, 303);
        assert_eq!(res.location().as_deref(), Some("/"));
        assert_eq!(res.message().as_deref(), Some("Uploaded 2 photos."));

        let res = app
            .upload("photos", "Alice", vec![TestFile::photo("a3.jpg")])
            .await;
        assert_eq!(
            res.error().as_deref(),
            Some("You've reached the maximum of 2 photos per person.")
        );

        let res = app
            .upload(
                "photos",
                "Bob",
                vec![TestFile::photo("b1.jpg"), TestFile::photo("b2.jpg")],
            )
            .await;
        assert_eq!(
            res.message().as_deref(),
            Some("Uploaded 1 photo. 1 photo was skipped due to upload limits.")
        );

        let res = app
            .upload("photos", "Carol", vec![TestFile::photo("c1.jpg")])
            .await;
        assert_eq!(
            res.error().as_deref(),
            Some("The photo gallery is full. No more photos can be uploaded.")
        );

        let records = app.media(MediaKind::Photo).await;
        assert_eq!(records.len(), 3);
        assert_eq!(app.files_on_disk(MediaKind::Photo), 3);
        let names: Vec<_> = records.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, ["a1.jpg", "a2.jpg", "b1.jpg"]);
    }

    #[tokio::test]
    async fn batch_over_per_person_limit_is_truncated() {
        let app = TestApp::spawn_with_limits(tight_limits()).await;

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![
                    TestFile::photo("a1.jpg"),
                    TestFile::photo("a2.jpg"),
                    TestFile::photo("a3.jpg"),
                ],
            )
            .await;

        assert_eq!(
            res.message().as_deref(),
            Some("Uploaded 2 photos. 1 photo was skipped due to upload limits.")
        );
        let records = app.media(MediaKind::Photo).await;
        let names: Vec<_> = records.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, ["a1.jpg", "a2.jpg"]);
        assert_eq!(app.files_on_disk(MediaKind::Photo), 2);
    }

    #[tokio::test]
    async fn kinds_have_independent_quotas() {
        let app = TestApp::spawn_with_limits(tight_limits()).await;

        app.upload(
            "photos",
            "Alice",
            vec![TestFile::photo("a1.jpg"), TestFile::photo("a2.jpg")],
        )
        .await;
        let res = app
            .upload("videos", "Alice", vec![TestFile::video("clip.mp4")])
            .await;

        assert_eq!(res.message().as_deref(), Some("Uploaded 1 video."));
        assert_eq!(app.files_on_disk(MediaKind::Video), 1);
    }

    #[tokio::test]
    async fn names_are_normalized_and_kept_as_typed() {
        let app = TestApp::spawn().await;

        app.upload("photos", "Alice ", vec![TestFile::photo("one.jpg")])
            .await;
        app.upload("photos", "alice", vec![TestFile::photo("two.jpg")])
            .await;

        let uploaders = app.uploaders().await;
        assert_eq!(uploaders.len(), 1);
        assert_eq!(uploaders[0].display_name, "Alice ");
        assert_eq!(uploaders[0].normalized_name, "alice");

        let records = app.media(MediaKind::Photo).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.uploader_id == uploaders[0].id));
    }

    #[tokio::test]
    async fn stored_names_do_not_leak_original_names() {
        let app = TestApp::spawn().await;

        app.upload("photos", "Alice", vec![TestFile::photo("../../evil.jpg")])
            .await;

        let records = app.media(MediaKind::Photo).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].original_name.contains("evil"));
        assert!(!records[0].stored_name.contains("evil"));
        assert!(records[0].stored_name.ends_with(".jpg"));
        assert!(app.kind_dir(MediaKind::Photo).join(&records[0].stored_name).is_file());
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn empty_name_is_rejected_and_files_removed() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("photos", "   ", vec![TestFile::photo("a.jpg")])
            .await;

        assert_eq!(res.error().as_deref(), Some("Please enter your name."));
        assert_eq!(app.files_on_disk(MediaKind::Photo), 0);
        assert_eq!(app.uploader_count().await, 0);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload("videos", "Alice", vec![]).await;

        assert_eq!(
            res.error().as_deref(),
            Some("Please choose at least one video to upload.")
        );
        assert_eq!(app.uploader_count().await, 0);
    }

    #[tokio::test]
    async fn wrong_type_files_are_never_written() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![
                    TestFile::video("clip.mp4"),
                    TestFile::new("notes.txt", "text/plain", "hello"),
                ],
            )
            .await;

        assert_eq!(
            res.error().as_deref(),
            Some("Please choose at least one photo to upload.")
        );
        assert_eq!(app.files_on_disk(MediaKind::Photo), 0);
        assert_eq!(app.files_on_disk(MediaKind::Video), 0);
    }

    #[tokio::test]
    async fn mixed_batch_keeps_only_matching_files() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![TestFile::photo("a.jpg"), TestFile::video("clip.mp4")],
            )
            .await;

        assert_eq!(res.message().as_deref(), Some("Uploaded 1 photo."));
        assert_eq!(app.files_on_disk(MediaKind::Photo), 1);
        assert_eq!(app.files_on_disk(MediaKind::Video), 0);
    }
}

mod upload_limits {
    use super::*;

    #[tokio::test]
    async fn oversized_file_is_rejected_and_batch_removed() {
        let app = TestApp::spawn_with_limits(tight_limits()).await;
        let big = vec![0u8; 1024 * 1024 + 512 * 1024];

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![
                    TestFile::photo("small.jpg"),
                    TestFile::new("big.jpg", "image/jpeg", big),
                ],
            )
            .await;

        assert_eq!(
            res.error().as_deref(),
            Some("A photo is too large. The maximum size is 1 MB per photo.")
        );
        assert_eq!(app.files_on_disk(MediaKind::Photo), 0);
        assert!(app.media(MediaKind::Photo).await.is_empty());
    }

    #[tokio::test]
    async fn too_many_files_in_one_request() {
        let app = TestApp::spawn_with_limits(tight_limits()).await;

        let res = app
            .upload(
                "photos",
                "Alice",
                (1..=5)
                    .map(|n| TestFile::photo(&format!("{n}.jpg")))
                    .collect(),
            )
            .await;

        assert_eq!(
            res.error().as_deref(),
            Some("Too many photos at once. You can upload up to 4 photos per request.")
        );
        assert_eq!(app.files_on_disk(MediaKind::Photo), 0);
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn failed_insert_rolls_back_and_removes_files() {
        let app = TestApp::spawn().await;
        app.db
            .execute_unprepared(
                "CREATE TRIGGER reject_media BEFORE INSERT ON media \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .await
            .unwrap();

        let res = app
            .upload(
                "photos",
                "Alice",
                vec![TestFile::photo("a.jpg"), TestFile::photo("b.jpg")],
            )
            .await;

        let error = res.error().expect("expected an error flash");
        assert!(error.starts_with("Upload failed: "), "{error}");
        assert_eq!(app.files_on_disk(MediaKind::Photo), 0);
        assert!(app.media(MediaKind::Photo).await.is_empty());
    }
}
