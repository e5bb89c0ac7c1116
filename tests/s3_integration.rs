//! Integration tests against MinIO via testcontainers
//!
//! These tests require Docker to be running and use the testcontainers crate
//! to spin up a MinIO instance for realistic S3 testing.
//!
//! Run with: cargo test --test s3_integration
//!
//! Note: Tests are conditionally skipped if Docker is not available.

use aws_sdk_s3::config::{BehaviorVersion, Credentials as AwsCredentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use s3_dashboard::dashboard::{FileView, Session, Status, ViewId};
use s3_dashboard::s3::{list_files, ConnectOptions, Credentials, S3Client, S3Connector};
use s3_dashboard::settings::Settings;
use s3_dashboard::viewers::{load_object, LoadError};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

/// MinIO default credentials
const MINIO_ACCESS_KEY: &str = "minioadmin";
const MINIO_SECRET_KEY: &str = "minioadmin";

const BUCKET: &str = "azimuth-venue-analysis";
const ANALYSIS: &str = "Azimuth_Delivery/Azimuth_venue_analysis/";
const UNTREATED: &str = "Azimuth_Delivery/Untreated data/";

/// Test helper to check if Docker is available
fn docker_available() -> bool {
    std::process::Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Helper to get MinIO endpoint URL from container
async fn get_minio_endpoint(container: &ContainerAsync<MinIO>) -> String {
    let host = container.get_host().await.expect("Failed to get container host");
    let port = container.get_host_port_ipv4(9000).await.expect("Failed to get MinIO port");
    format!("http://{}:{}", host, port)
}

async fn start_minio() -> (ContainerAsync<MinIO>, String) {
    let container = MinIO::default()
        .with_env_var("MINIO_ROOT_USER", MINIO_ACCESS_KEY)
        .with_env_var("MINIO_ROOT_PASSWORD", MINIO_SECRET_KEY)
        .start()
        .await
        .expect("Failed to start MinIO container");

    let endpoint = get_minio_endpoint(&container).await;

    // Wait for MinIO to be ready
    tokio::time::sleep(Duration::from_secs(2)).await;

    (container, endpoint)
}

/// Plain SDK client used only to seed the bucket
fn seed_client(endpoint: &str) -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(AwsCredentials::new(MINIO_ACCESS_KEY, MINIO_SECRET_KEY, None, None, "test"))
        .endpoint_url(endpoint)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

async fn seed(endpoint: &str) {
    let client = seed_client(endpoint);
    client
        .create_bucket()
        .bucket(BUCKET)
        .send()
        .await
        .expect("Failed to create bucket");

    let objects = [
        (ANALYSIS.to_string(), String::new()),
        (format!("{}venues.csv", ANALYSIS), "venue,capacity\nHall A,300\nClub B,120\n".to_string()),
        (format!("{}events.json", ANALYSIS), r#"{"event": "Opening", "guests": 80}"#.to_string()),
        (format!("{}readme.txt", ANALYSIS), "not a table".to_string()),
        (UNTREATED.to_string(), String::new()),
    ];

    for (key, body) in objects {
        client
            .put_object()
            .bucket(BUCKET)
            .key(&key)
            .body(ByteStream::from(body.into_bytes()))
            .send()
            .await
            .expect("Failed to put object");
    }
}

fn options(endpoint: &str) -> ConnectOptions {
    ConnectOptions {
        endpoint_url: Some(endpoint.to_string()),
        force_path_style: true,
    }
}

fn minio_credentials() -> Credentials {
    Credentials::new(MINIO_ACCESS_KEY, MINIO_SECRET_KEY, "us-east-1")
}

#[tokio::test]
async fn test_list_files_skips_directory_markers() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    seed(&endpoint).await;

    let client = S3Client::connect(&minio_credentials(), &options(&endpoint))
        .await
        .expect("Failed to create MinIO client");

    let files = list_files(&client, BUCKET, ANALYSIS).await.expect("Failed to list");
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|k| k.starts_with(ANALYSIS) && !k.ends_with('/')));

    let empty = list_files(&client, BUCKET, UNTREATED).await.expect("Failed to list");
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_load_objects() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    seed(&endpoint).await;

    let client = S3Client::connect(&minio_credentials(), &options(&endpoint))
        .await
        .expect("Failed to create MinIO client");

    let csv = load_object(&client, BUCKET, &format!("{}venues.csv", ANALYSIS))
        .await
        .expect("Failed to load CSV");
    assert_eq!(csv.num_rows(), 2);
    assert_eq!(csv.column_names(), vec!["venue", "capacity"]);

    let json = load_object(&client, BUCKET, &format!("{}events.json", ANALYSIS))
        .await
        .expect("Failed to load JSON");
    assert_eq!(json.num_rows(), 1);

    let missing = load_object(&client, BUCKET, &format!("{}missing.csv", ANALYSIS)).await;
    assert!(matches!(missing, Err(LoadError::Fetch { .. })));
}

#[tokio::test]
async fn test_session_renders_against_minio() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    seed(&endpoint).await;

    let settings = Settings {
        endpoint_url: Some(endpoint.clone()),
        force_path_style: true,
        ..Settings::default()
    };
    let connector = Arc::new(S3Connector::new(settings.connect_options()));
    let mut session = Session::new(settings, connector);
    session.set_credentials(minio_credentials()).expect("Region should be known");

    let page = session.render().await;
    assert_eq!(page.status, Status::Connected);

    let analysis = page.views.iter().find(|v| v.id == ViewId::Analysis).unwrap();
    assert_eq!(analysis.files.len(), 3);
    assert!(analysis.content.is_some());

    let explorer = page.views.iter().find(|v| v.id == ViewId::Explorer).unwrap();
    assert_eq!(explorer.files, analysis.files);

    session.select(ViewId::Analysis, format!("{}venues.csv", ANALYSIS));
    let export = session
        .export(ViewId::Analysis)
        .await
        .expect("Export failed")
        .expect("Nothing to export");
    assert_eq!(export.file_name, "venues.csv.csv");
    assert!(export.body.starts_with("venue,capacity\n"));

    session.select(ViewId::Explorer, format!("{}venues.csv", ANALYSIS));
    let page = session.render().await;
    let explorer = page.views.iter().find(|v| v.id == ViewId::Explorer).unwrap();
    match &explorer.content {
        Some(FileView::Explorer(view)) => assert_eq!(view.numeric_columns, vec!["capacity"]),
        other => panic!("unexpected explorer content: {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_secret_surfaces_listing_error() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    seed(&endpoint).await;

    let settings = Settings {
        endpoint_url: Some(endpoint.clone()),
        force_path_style: true,
        ..Settings::default()
    };
    let connector = Arc::new(S3Connector::new(settings.connect_options()));
    let mut session = Session::new(settings, connector);
    session
        .set_credentials(Credentials::new(MINIO_ACCESS_KEY, "wrong-secret", "us-east-1"))
        .expect("Region should be known");

    let page = session.render().await;
    assert_eq!(page.status, Status::Connected);

    let analysis = page.views.iter().find(|v| v.id == ViewId::Analysis).unwrap();
    assert!(analysis.files.is_empty());
    assert!(analysis
        .notices
        .iter()
        .any(|n| n.text.starts_with("Error listing files:")));
}
