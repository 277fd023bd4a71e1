//! [`ContentStore`] backed by the `git` and `git-annex` executables.

use super::{AnnexFile, Author, ContentStore, Replica};
use crate::config::InventoryConfig;
use crate::error::{DdrError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Runs git/git-annex subcommands inside a repository.
#[derive(Debug, Clone)]
pub struct GitAnnex {
    git: PathBuf,
}

/// One line of `git annex whereis --json`.
#[derive(Debug, Deserialize)]
struct WhereisLine {
    file: String,
    #[serde(default)]
    whereis: Vec<WhereisRemote>,
}

#[derive(Debug, Deserialize)]
struct WhereisRemote {
    uuid: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    here: bool,
}

/// Parse the line-delimited JSON written by `git annex whereis --json`.
pub(crate) fn parse_whereis(output: &str) -> Result<Vec<AnnexFile>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let parsed: WhereisLine = serde_json::from_str(line)?;
            Ok(AnnexFile {
                path: parsed.file,
                replicas: parsed
                    .whereis
                    .into_iter()
                    .map(|r| Replica {
                        uuid: r.uuid,
                        description: r.description,
                        here: r.here,
                    })
                    .collect(),
            })
        })
        .collect()
}

impl GitAnnex {
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_git(git: impl Into<PathBuf>) -> Self {
        Self { git: git.into() }
    }

    /// Check that git and git-annex are installed.
    pub async fn detect() -> Result<Self> {
        let backend = Self::new();
        let cwd = std::env::temp_dir();
        backend
            .run(&cwd, &["--version"])
            .await
            .map_err(|_| DdrError::ConfigurationMissing {
                key: "git".to_string(),
            })?;
        backend
            .run(&cwd, &["annex", "version"])
            .await
            .map_err(|_| DdrError::ConfigurationMissing {
                key: "git-annex".to_string(),
            })?;
        Ok(backend)
    }

    async fn output(&self, repo: &Path, args: &[&str]) -> Result<std::process::Output> {
        debug!("git {} (in {})", args.join(" "), repo.display());
        Command::new(&self.git)
            .args(args)
            .current_dir(repo)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DdrError::backend(args.join(" "), format!("failed to execute git: {}", e)))
    }

    /// Run and return stdout, failing on a non-zero exit.
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<String> {
        let output = self.output(repo, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DdrError::backend(
                args.join(" "),
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for GitAnnex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for GitAnnex {
    async fn whereis(&self, repo: &Path) -> Result<Vec<AnnexFile>> {
        let stdout = self.run(repo, &["annex", "whereis", "--json"]).await?;
        parse_whereis(&stdout)
    }

    async fn find_present(&self, repo: &Path) -> Result<Vec<String>> {
        let stdout = self.run(repo, &["annex", "find"]).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn fetch(&self, repo: &Path, file: &str) -> Result<String> {
        self.run(repo, &["annex", "get", file]).await
    }

    async fn release(&self, repo: &Path, file: &str) -> Result<String> {
        self.run(repo, &["annex", "drop", file]).await
    }

    async fn uuid(&self, repo: &Path) -> Result<Option<String>> {
        let output = self
            .output(repo, &["config", InventoryConfig::ANNEX_UUID_KEY])
            .await?;
        // `git config` exits 1 when the key is unset
        if !output.status.success() {
            return Ok(None);
        }
        let uuid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!uuid.is_empty()).then_some(uuid))
    }

    async fn add(&self, repo: &Path, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let paths: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(repo, &args).await.map(|_| ())
    }

    async fn remove(&self, repo: &Path, path: &Path) -> Result<()> {
        let path = path.to_string_lossy().to_string();
        self.run(repo, &["rm", "--", path.as_str()]).await.map(|_| ())
    }

    async fn commit(&self, repo: &Path, author: &Author, message: &str) -> Result<String> {
        let author = format!("--author={}", author);
        self.run(repo, &["commit", author.as_str(), "-m", message]).await
    }
}
