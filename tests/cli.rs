use assert_cmd::prelude::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const DEMO_TSV: &str = "freq,unit,geo\\TIME_PERIOD\t2023 \t2022 \n\
                        A,NR,BE\t11742796 p\t11617623 \n\
                        A,NR,LU\t660809 \t: \n";

const TOC_TSV: &str = "\"title\"\t\"code\"\t\"type\"\t\"last update of data\"\t\"last table structure change\"\t\"data start\"\t\"data end\"\n\
                       \"Population on 1 January\"\t\"demo_pjan\"\t\"dataset\"\t\"01.03.2024\"\t\"01.03.2024\"\t\"1960\"\t\"2023\"\n\
                       \"GDP and main components\"\t\"nama_10_gdp\"\t\"dataset\"\t\"20.09.2024\"\t\"20.09.2024\"\t\"1975\"\t\"2023\"\n";

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Command with config isolated in `home` and endpoints pointed at `server`
fn estat(home: &Path, server: &mockito::Server) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("estat"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env("ESTAT_BASE_URL", format!("{}/data", server.url()))
        .env("ESTAT_CATALOG_URL", format!("{}/toc", server.url()))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn fetch_caches_dataset_between_runs() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/data/demo_pjan")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(gzip(DEMO_TSV))
        .expect(1)
        .create();

    let temp = tempdir()?;
    let cache_dir = temp.path().join("estat-cache");

    for _ in 0..2 {
        estat(temp.path(), &server)
            .args(["fetch", "demo_pjan", "--cache-dir"])
            .arg(&cache_dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("Dataset: demo_pjan"))
            .stdout(predicate::str::contains("1 x 2 x 2"));
    }

    mock.assert();
    assert!(cache_dir.join("eurostat/data/demo_pjan.json").exists());
    Ok(())
}

#[test]
fn fetch_without_cache_always_downloads() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/data/demo_pjan")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(gzip(DEMO_TSV))
        .expect(2)
        .create();

    let temp = tempdir()?;
    for _ in 0..2 {
        estat(temp.path(), &server)
            .args(["fetch", "demo_pjan", "--no-cache"])
            .assert()
            .success();
    }

    mock.assert();
    Ok(())
}

#[test]
fn fetch_json_output_contains_axes() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/data/demo_pjan")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(gzip(DEMO_TSV))
        .create();

    let temp = tempdir()?;
    let assert = estat(temp.path(), &server)
        .args(["fetch", "demo_pjan", "--no-cache", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout)?;
    let axes = &value["demo_pjan"]["axes"];
    assert_eq!(axes[0]["name"], "unit");
    assert_eq!(axes[2]["name"], "time");
    assert_eq!(axes[2]["labels"][0], "2022");
    Ok(())
}

#[test]
fn fetch_unknown_dataset_reports_url() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/data/nonexistent")
        .match_query(mockito::Matcher::Any)
        .with_status(404)
        .create();

    let temp = tempdir()?;
    estat(temp.path(), &server)
        .args(["fetch", "nonexistent", "--no-cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404 Not Found"))
        .stderr(predicate::str::contains(format!(
            "{}/data/nonexistent",
            server.url()
        )));
    Ok(())
}

#[test]
fn catalog_search_filters_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/toc")
        .with_status(200)
        .with_body(TOC_TSV)
        .create();

    let temp = tempdir()?;
    estat(temp.path(), &server)
        .args(["catalog", "--search", "population"])
        .arg("--cache-dir")
        .arg(temp.path().join("estat-cache"))
        .assert()
        .success()
        .stdout(predicate::str::contains("demo_pjan"))
        .stdout(predicate::str::contains("nama_10_gdp").not());

    assert!(temp
        .path()
        .join("estat-cache/eurostat/table_of_contents.json")
        .exists());
    Ok(())
}

#[test]
fn config_set_then_show() -> Result<(), Box<dyn std::error::Error>> {
    let server = mockito::Server::new();
    let temp = tempdir()?;

    estat(temp.path(), &server)
        .args(["config", "set", "--max-age", "12h"])
        .assert()
        .success();

    assert!(temp.path().join("config/estat/config.toml").exists());

    estat(temp.path(), &server)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max age: 12h"));
    Ok(())
}

#[test]
fn config_set_rejects_bad_max_age() -> Result<(), Box<dyn std::error::Error>> {
    let server = mockito::Server::new();
    let temp = tempdir()?;

    estat(temp.path(), &server)
        .args(["config", "set", "--max-age", "whenever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid max age"));
    Ok(())
}
