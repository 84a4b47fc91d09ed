//! End-to-end tests of `fwgate_cli::run` for the non-interactive commands

use clap::Parser;
use fwgate_cli::cli::Cli;
use fwgate_cli::exit::{exit_code, EXIT_NOT_FOUND};
use fwgate_cli::signal::Interrupts;
use fwgate_core::{Device, Firmware};
use fwgate_index::testing::{FakeIndex, TestServer};
use fwgate_traits::DeviceRecord;
use pretty_assertions::assert_eq;

fn cli(config: &std::path::Path, args: &[&str]) -> Cli {
    let config = config.to_str().unwrap();
    Cli::try_parse_from(
        ["fwgate", "--quiet", "--config", config]
            .iter()
            .chain(args.iter())
            .copied(),
    )
    .unwrap()
}

fn empty_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();
    path
}

fn catalog() -> Vec<Device> {
    vec![Device {
        name: "iPhone X (Global)".into(),
        identifier: "iPhone10,3".into(),
        firmwares: vec![Firmware {
            identifier: "iPhone10,3".into(),
            version: "16.5".into(),
            build_id: "20F66".into(),
            ..Default::default()
        }],
        ..Default::default()
    }]
}

#[test]
fn test_parse_subcommands() {
    assert!(Cli::try_parse_from(["fwgate", "device", "get", "iPhone10,3"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "ipsw", "get", "iPhone10,3", "20F66"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "ipsw", "version", "16.5"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "resolve", "build", "16.5", "iPhone10,3"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "traits", "list", "--sorted"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "-f", "json", "dev", "--more"]).is_ok());
    assert!(Cli::try_parse_from(["fwgate", "dev", "--pretty"]).is_err());
    assert!(Cli::try_parse_from(["fwgate", "ipsw", "get", "iPhone10,3"]).is_err());
}

#[tokio::test]
async fn test_traits_export_writes_sorted_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(&dir);
    let out = dir.path().join("traits.json");

    fwgate_cli::run(
        cli(&config, &["traits", "export", out.to_str().unwrap(), "--sorted"]),
        Interrupts::new(),
    )
    .await
    .unwrap();

    let records: Vec<DeviceRecord> =
        serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert!(!records.is_empty());
    assert!(records.iter().any(|r| r.product_type == "iPhone10,3"));
}

#[tokio::test]
async fn test_traits_unknown_product_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(&dir);

    let err = fwgate_cli::run(
        cli(&config, &["traits", "prod", "iPhone99,9"]),
        Interrupts::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(exit_code(&err), EXIT_NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_against_index() {
    let index = FakeIndex::new(catalog());
    let server = TestServer::start(index.router()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(&dir);
    let base = server.base_url();

    fwgate_cli::run(
        cli(&config, &["--index-url", &base, "resolve", "version", "20F66"]),
        Interrupts::new(),
    )
    .await
    .unwrap();
    assert!(index.requests().contains(&"/device/iPhone10,3".to_string()));

    let err = fwgate_cli::run(
        cli(&config, &["--index-url", &base, "resolve", "version", "1A1"]),
        Interrupts::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(exit_code(&err), EXIT_NOT_FOUND);
}

#[tokio::test]
async fn test_index_url_from_config_file() {
    let index = FakeIndex::new(catalog());
    let server = TestServer::start(index.router()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, format!("index_url = \"{}\"\n", server.base_url())).unwrap();

    fwgate_cli::run(cli(&config, &["device", "list"]), Interrupts::new()).await.unwrap();
    assert_eq!(index.requests(), vec!["/devices"]);
}
