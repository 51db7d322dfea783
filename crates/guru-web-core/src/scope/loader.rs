use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::ScopeIndex;

/// A package that took part in loading the scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub import_path: String,
    /// Part of the Go standard library.
    pub standard: bool,
}

/// Everything the loader learned about the requested scope.
#[derive(Debug, Clone, Default)]
pub struct LoadedScope {
    pub files: ScopeIndex,
    /// Sorted by import path.
    pub packages: Vec<PackageInfo>,
}

/// Resolves package arguments to source files with `go list -deps -json`.
#[derive(Clone, Debug)]
pub struct GoListLoader {
    program: String,
    tags: Option<String>,
}

impl GoListLoader {
    pub fn new(program: impl Into<String>, tags: Option<String>) -> Self {
        Self {
            program: program.into(),
            tags: tags.filter(|t| !t.trim().is_empty()),
        }
    }

    pub async fn load(&self, args: &[String]) -> Result<LoadedScope> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("list").arg("-deps").arg("-json");
        if let Some(tags) = &self.tags {
            cmd.arg(format!("-tags={tags}"));
        }
        cmd.args(args);
        cmd.stdin(std::process::Stdio::null());
        cmd.kill_on_drop(true);

        tracing::debug!(program = %self.program, ?args, "loading scope");
        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to spawn {}; is it installed and on PATH?", self.program))?;
        if !output.status.success() {
            bail!(
                "{} list exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_go_list(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackage {
    import_path: String,
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    cgo_files: Vec<String>,
    #[serde(default)]
    test_go_files: Vec<String>,
    #[serde(default)]
    x_test_go_files: Vec<String>,
    #[serde(default)]
    standard: bool,
    #[serde(default)]
    dep_only: bool,
    #[serde(default)]
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
struct GoListError {
    #[serde(rename = "Err")]
    err: String,
}

/// Parse the stream of concatenated JSON objects `go list -json` prints.
///
/// Test files are only taken from the packages named on the command line,
/// dependencies contribute their build files.
pub fn parse_go_list(stdout: &[u8]) -> Result<LoadedScope> {
    let mut files = Vec::new();
    let mut packages = Vec::new();

    for package in serde_json::Deserializer::from_slice(stdout).into_iter::<GoPackage>() {
        let package = package.context("failed to decode go list output")?;
        if let Some(error) = &package.error {
            bail!("package {}: {}", package.import_path, error.err);
        }
        if let Some(dir) = &package.dir {
            let dir = Path::new(dir);
            let mut names: Vec<&String> =
                package.go_files.iter().chain(&package.cgo_files).collect();
            if !package.dep_only {
                names.extend(package.test_go_files.iter().chain(&package.x_test_go_files));
            }
            files.extend(
                names
                    .into_iter()
                    .map(|name| dir.join(name).to_string_lossy().into_owned()),
            );
        }
        packages.push(PackageInfo {
            import_path: package.import_path,
            standard: package.standard,
        });
    }

    packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    packages.dedup_by(|a, b| a.import_path == b.import_path);

    Ok(LoadedScope {
        files: ScopeIndex::new(files),
        packages,
    })
}
