use std::env::args;
use std::process::Command;

use anyhow::{anyhow, ensure, Result};

fn main() -> Result<()> {
    match args().nth(1).as_deref() {
        None => default(),
        Some("backend") => backend(),
        Some("ui") => ui(),
        Some(name) => Err(anyhow!("Unknown task {}", name)),
    }
}

fn default() -> Result<()> {
    let status = Command::new("cargo").arg("fmt").status()?;

    ensure!(status.success(), "Rustfmt failed with status {:?}", status);

    let status = Command::new("cargo")
        .args(["clippy", "--all-targets"])
        .status()?;

    ensure!(status.success(), "Clippy failed with status {:?}", status);

    let status = Command::new("cargo").arg("test").status()?;

    ensure!(status.success(), "Tests failed with status {:?}", status);

    Ok(())
}

fn backend() -> Result<()> {
    let status = Command::new("cargo")
        .args(["run", "--bin", "backend"])
        .envs([
            ("BIND_ADDR", "127.0.0.1:8081"),
            ("RUST_LOG", "info,phonebook=debug,backend=debug,tower_http=debug"),
        ])
        .status()?;

    ensure!(status.success(), "Backend failed with status {:?}", status);

    Ok(())
}

fn ui() -> Result<()> {
    let status = Command::new("cargo")
        .args(["run", "--bin", "phonebook"])
        .envs([
            ("API_URL", "http://127.0.0.1:8081"),
            ("RUST_LOG", "info,phonebook=debug"),
        ])
        .status()?;

    ensure!(status.success(), "Phonebook failed with status {:?}", status);

    Ok(())
}
