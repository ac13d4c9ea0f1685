//! Download engine against a loopback server: idempotence, cleanup, retry.

mod common;

use clipharvest::downloader::{DownloadConfig, DownloadEngine, FetchOutcome, MediaFetcher};
use clipharvest::ScraperError;
use common::{
    head_only, ok, ok_without_length, spawn_paced_server, spawn_server, status_with_body, truncated,
};
use reqwest::Client;
use std::time::Duration;
use tempfile::tempdir;

fn engine(retry_attempts: usize) -> DownloadEngine {
    DownloadEngine::new(
        Client::new(),
        DownloadConfig {
            retry_attempts,
            retry_delay: Duration::from_millis(10),
            read_timeout: Duration::from_secs(10),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn second_fetch_of_same_destination_transfers_nothing() {
    let server = spawn_server(|_, _| ok(b"0123456789")).await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("sunset").join("clip.mp4");
    let engine = engine(3);

    let first = engine.fetch(&server.url("/clip.mp4"), &dest).await.unwrap();
    let second = engine.fetch(&server.url("/clip.mp4"), &dest).await.unwrap();

    assert_eq!(first, FetchOutcome::Downloaded { bytes: 10 });
    assert_eq!(second, FetchOutcome::Skipped);
    assert_eq!(server.hits(), 1);
    assert_eq!(std::fs::read(&dest).unwrap(), b"0123456789");
}

#[tokio::test]
async fn truncated_body_leaves_no_file() {
    let server = spawn_server(|_, _| truncated(1000, b"0123456789")).await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("clip.mp4");

    let result = engine(2).fetch(&server.url("/clip.mp4"), &dest).await;

    assert!(result.is_err());
    assert!(!dest.exists());
    assert_eq!(server.hits(), 2, "every attempt is made before giving up");
}

#[tokio::test]
async fn http_error_status_fails_without_file() {
    let server = spawn_server(|_, _| status_with_body(404, "Not Found", b"missing")).await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("clip.mp4");

    let result = engine(1).fetch(&server.url("/gone.mp4"), &dest).await;

    match result {
        Err(ScraperError::HttpStatus(status)) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected an HTTP status error, got {:?}", other),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn unknown_length_body_is_accepted() {
    let server = spawn_server(|_, _| ok_without_length(b"streamed until close")).await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("clip.mp4");

    let outcome = engine(1).fetch(&server.url("/clip.mp4"), &dest).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 20 });
    assert_eq!(std::fs::read(&dest).unwrap(), b"streamed until close");
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let server = spawn_server(|index, _| {
        if index == 0 {
            status_with_body(503, "Service Unavailable", b"busy")
        } else {
            ok(b"payload")
        }
    })
    .await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("clip.mp4");

    let outcome = engine(3).fetch(&server.url("/clip.mp4"), &dest).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 7 });
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn empty_body_is_a_valid_download() {
    let server = spawn_server(|_, _| ok(b"")).await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("empty.jpg");

    let outcome = engine(1).fetch(&server.url("/empty.jpg"), &dest).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 0 });
    assert!(dest.exists());
}

#[tokio::test]
async fn slow_steady_transfer_outlasts_the_read_timeout() {
    // Four pieces 150ms apart: the transfer takes longer than the timeout,
    // but no single wait does
    let server = spawn_paced_server(
        |_, _| vec![head_only(12), b"abc".to_vec(), b"def".to_vec(), b"ghi".to_vec(), b"jkl".to_vec()],
        Duration::from_millis(150),
    )
    .await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("slow.mp4");
    let engine = DownloadEngine::new(
        Client::new(),
        DownloadConfig {
            retry_attempts: 1,
            read_timeout: Duration::from_millis(400),
            ..Default::default()
        },
    );

    let outcome = engine.fetch(&server.url("/slow.mp4"), &dest).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 12 });
    assert_eq!(std::fs::read(&dest).unwrap(), b"abcdefghijkl");
}

#[tokio::test]
async fn stalled_transfer_times_out_and_cleans_up() {
    let server = spawn_paced_server(
        |_, _| vec![head_only(100), b"0123456789".to_vec()],
        Duration::from_secs(3),
    )
    .await;
    let temp = tempdir().unwrap();
    let dest = temp.path().join("stalled.mp4");
    let engine = DownloadEngine::new(
        Client::new(),
        DownloadConfig {
            retry_attempts: 1,
            read_timeout: Duration::from_millis(200),
            ..Default::default()
        },
    );

    let started = std::time::Instant::now();
    let result = engine.fetch(&server.url("/stalled.mp4"), &dest).await;

    assert!(matches!(result, Err(ScraperError::DownloadError(_))), "{:?}", result);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!dest.exists());
}
