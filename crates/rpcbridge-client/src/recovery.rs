//! Append-only recovery log.
//!
//! Every service key that was newly registered on demand is appended here as
//! one `group/interface:version` line, so a restarted process can rebuild its
//! proxies without waiting for the first call to each service. The file is
//! never compacted; duplicate suppression is the registry's job.
//!
//! Layout: `<base-dir>/<product>/SNAPSHOT/<action>`.

use rpcbridge_common::protocol::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Default directory under which recovery logs are kept.
pub const DEFAULT_BASE_DIR: &str = "/dapr/logs";

/// Product scope of the registry's recovery log.
pub const PRODUCT: &str = "dapr";
/// Action scope of the registry's recovery log.
pub const ACTION: &str = "dubbo-subscribe";

const SNAPSHOT_DIR: &str = "SNAPSHOT";

/// A line-oriented, append-only log scoped by `(product, action)`.
///
/// Appends are not synchronized here; callers serialize them (the registry
/// appends only while holding its registration lock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLog {
    base_dir: PathBuf,
    product: String,
    action: String,
}

impl RecoveryLog {
    /// A log for the subscription scope under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_scope(base_dir, PRODUCT, ACTION)
    }

    pub fn with_scope(
        base_dir: impl Into<PathBuf>,
        product: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        RecoveryLog {
            base_dir: base_dir.into(),
            product: product.into(),
            action: action.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn dir(&self) -> PathBuf {
        self.base_dir.join(&self.product).join(SNAPSHOT_DIR)
    }

    /// Full path of the log file.
    pub fn path(&self) -> PathBuf {
        self.dir().join(&self.action)
    }

    /// Reads every entry in append order.
    ///
    /// Each record loses exactly one line terminator (`\n` or `\r\n`). Empty
    /// records are dropped. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Io`](rpcbridge_common::BridgeError::Io) if the
    /// file exists but cannot be read.
    pub fn load(&self) -> Result<Vec<String>> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No recovery log found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .split_inclusive('\n')
            .map(strip_terminator)
            .filter(|record| !record.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Appends one entry, creating the directory if needed.
    ///
    /// The entry and its newline go out in a single write.
    pub fn append(&self, item: &str) -> Result<()> {
        fs::create_dir_all(self.dir())?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        file.write_all(format!("{}\n", item).as_bytes())?;

        Ok(())
    }
}

impl Default for RecoveryLog {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

fn strip_terminator(record: &str) -> &str {
    match record.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => record,
    }
}
