use fsds_spider::sec::run::RunResult;
use fsds_spider::sec::statements::{Fetcher, Period};
use fsds_spider::Config;
use httpmock::prelude::*;
use serde_json::Value;
use std::io::Write;
use tempfile::TempDir;

const USER_AGENT: &str = "Jane Doe jane@example.com";

fn build_archive(members: &[&str]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for name in members {
        writer.start_file(*name, options).unwrap();
        writer
            .write_all(format!("adsh\tcik\n{name}\t1\n").as_bytes())
            .unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn config(root: &TempDir, server: &MockServer) -> Config {
    Config::from_root(root.path(), USER_AGENT).with_base_url(server.url("/files/"))
}

#[tokio::test]
async fn fetch_downloads_and_extracts_a_quarter() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let members = ["sub.txt", "num.txt", "tag.txt", "pre.txt", "readme.htm"];
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/files/2025q2.zip")
                .header("user-agent", USER_AGENT);
            then.status(200)
                .header("content-type", "application/zip")
                .body(build_archive(&members));
        })
        .await;

    let config = config(&root, &server);
    let fetcher = Fetcher::new(&config, false).unwrap();
    let output_dir = root.path().join("raw");
    let extract_dir = root.path().join("bronze");
    let result = fetcher
        .fetch(Period::new(2025, 2), &output_dir, &extract_dir)
        .await;

    mock.assert_async().await;
    assert_eq!(result.status(), "success");
    let RunResult::Success(success) = result else {
        panic!("expected a successful fetch");
    };
    assert_eq!(success.url, server.url("/files/2025q2.zip"));
    assert_eq!(success.http_status, 200);
    assert!(success.file_size_mb > 0.0);
    assert_eq!(success.zip_path, output_dir.join("2025q2.zip"));
    assert!(success.zip_path.is_file());
    assert_eq!(success.extract_path, extract_dir.join("2025q2"));
    assert_eq!(success.extracted_files, members.map(String::from).to_vec());
    assert!(success.missing_files.is_empty());
    assert!(extract_dir.join("2025q2").join("sub.txt").is_file());
}

#[tokio::test]
async fn missing_members_are_reported_but_still_succeed() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2024q4.zip");
            then.status(200).body(build_archive(&["SUB.TXT", "Num.txt"]));
        })
        .await;

    let fetcher = Fetcher::new(&config(&root, &server), false).unwrap();
    let result = fetcher.fetch_default(Period::new(2024, 4)).await;

    let RunResult::Success(success) = result else {
        panic!("expected a successful fetch");
    };
    assert_eq!(success.extracted_files, vec!["SUB.TXT", "Num.txt"]);
    assert_eq!(success.missing_files, vec!["tag.txt", "pre.txt"]);
}

#[tokio::test]
async fn fetch_default_uses_configured_directories() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q1.zip");
            then.status(200)
                .body(build_archive(&["sub.txt", "num.txt", "tag.txt", "pre.txt"]));
        })
        .await;

    let config = config(&root, &server);
    let fetcher = Fetcher::new(&config, false).unwrap();
    let result = fetcher.fetch_default(Period::new(2025, 1)).await;

    assert!(result.is_success());
    assert!(config.raw_dir.join("2025q1.zip").is_file());
    assert!(config.bronze_dir.join("2025q1").join("pre.txt").is_file());
}

#[tokio::test]
async fn rejected_period_fails_without_writing_the_archive() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q9.zip");
            then.status(404).body("Not Found");
        })
        .await;

    let config = config(&root, &server);
    let fetcher = Fetcher::new(&config, false).unwrap();
    let result = fetcher.fetch_default(Period::new(2025, 9)).await;

    let RunResult::Failed(failure) = &result else {
        panic!("expected a failed fetch");
    };
    assert_eq!(failure.error.kind(), "rejected");
    assert_eq!(failure.error.http_status(), Some(404));
    assert_eq!(failure.year, 2025);
    assert_eq!(failure.quarter, 9);
    assert!(!config.raw_dir.join("2025q9.zip").exists());

    let record = result.to_record();
    assert_eq!(record["status"], Value::from("failed"));
    assert_eq!(record["error_kind"], Value::from("rejected"));
    assert_eq!(record["http_status"], Value::from(404));
    assert!(record["error"].as_str().unwrap().contains("404"));
    assert_eq!(record["url"], Value::from(server.url("/files/2025q9.zip")));
}

#[tokio::test]
async fn unreachable_source_is_a_network_failure() {
    let root = TempDir::new().unwrap();
    let config =
        Config::from_root(root.path(), USER_AGENT).with_base_url("http://127.0.0.1:1/files");
    let fetcher = Fetcher::new(&config, false).unwrap();

    let result = fetcher.fetch_default(Period::new(2025, 2)).await;

    let RunResult::Failed(failure) = &result else {
        panic!("expected a failed fetch");
    };
    assert_eq!(failure.error.kind(), "network");
    assert_eq!(failure.url, "http://127.0.0.1:1/files/2025q2.zip");
    assert!(!result.to_record().contains_key("http_status"));
}

#[tokio::test]
async fn corrupt_archive_is_an_archive_failure_and_is_left_in_place() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2023q3.zip");
            then.status(200).body("this is not a zip file");
        })
        .await;

    let config = config(&root, &server);
    let fetcher = Fetcher::new(&config, false).unwrap();
    let result = fetcher.fetch_default(Period::new(2023, 3)).await;

    let RunResult::Failed(failure) = &result else {
        panic!("expected a failed fetch");
    };
    assert_eq!(failure.error.kind(), "archive");
    assert!(config.raw_dir.join("2023q3.zip").is_file());
}

#[tokio::test]
async fn success_record_keeps_field_order() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q2.zip");
            then.status(200).body(build_archive(&["sub.txt", "pre.txt"]));
        })
        .await;

    let fetcher = Fetcher::new(&config(&root, &server), false).unwrap();
    let record = fetcher.fetch_default(Period::new(2025, 2)).await.to_record();

    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "status",
            "year",
            "quarter",
            "url",
            "zip_path",
            "extract_path",
            "file_size_mb",
            "download_start",
            "download_time",
            "extract_start",
            "extract_time",
            "extracted_files",
            "missing_files",
            "http_status",
        ]
    );
    assert_eq!(record["extracted_files"], serde_json::json!(["sub.txt", "pre.txt"]));
    assert_eq!(record["missing_files"], serde_json::json!(["num.txt", "tag.txt"]));
}

#[tokio::test]
async fn failed_then_successful_runs_share_one_log() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q2.zip");
            then.status(200)
                .body(build_archive(&["sub.txt", "num.txt", "tag.txt", "pre.txt"]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q5.zip");
            then.status(403);
        })
        .await;

    let config = config(&root, &server);
    let fetcher = Fetcher::new(&config, false).unwrap();
    for period in [Period::new(2025, 5), Period::new(2025, 2)] {
        let record = fetcher.fetch_default(period).await.to_record();
        fsds_spider::run_log::append_record(&record, &config.log_path).unwrap();
    }

    let mut reader = csv::Reader::from_path(&config.log_path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        header,
        vec!["status", "error_kind", "error", "year", "quarter", "url", "http_status"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "failed");
    assert_eq!(&rows[0][6], "403");
    assert_eq!(&rows[1][0], "success");
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][6], "200");
}

#[tokio::test]
async fn configured_member_list_drives_verification() {
    let root = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/2025q3.zip");
            then.status(200).body(build_archive(&["Sub.txt", "num.txt"]));
        })
        .await;

    let config = config(&root, &server).with_expected_files(["sub.txt", "README.htm"]);
    let fetcher = Fetcher::new(&config, false).unwrap();
    let result = fetcher.fetch_default(Period::new(2025, 3)).await;

    let RunResult::Success(success) = result else {
        panic!("expected a successful fetch");
    };
    assert_eq!(success.missing_files, vec!["readme.htm"]);
}
