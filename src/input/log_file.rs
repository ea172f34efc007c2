//! Log file loading
//!
//! Reads a whole sshd log into memory and checks it is UTF-8 before it is
//! handed to the parser.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parser::{ScanResult, SshdParser};

/// Errors that can occur while loading a log file
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path:?} is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
    InvalidUtf8 { path: PathBuf, valid_up_to: usize },
}

/// An sshd log loaded into memory
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    data: Vec<u8>,
}

impl LogFile {
    /// Read and validate a log file
    pub fn read(path: &Path) -> Result<Self, InputError> {
        let data = std::fs::read(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, data)
    }

    /// Wrap an in-memory buffer, rejecting invalid UTF-8
    pub fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self, InputError> {
        if let Err(e) = std::str::from_utf8(&data) {
            log::warn!(
                "Rejecting {:?}: not valid UTF-8 (first invalid byte at offset {})",
                path,
                e.valid_up_to()
            );
            return Err(InputError::InvalidUtf8 {
                path: path.to_path_buf(),
                valid_up_to: e.valid_up_to(),
            });
        }

        log::debug!("Loaded {} byte(s) from {:?}", data.len(), path);
        Ok(LogFile {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Classify every sshd line in the file
    pub fn scan(&self, parser: &SshdParser) -> ScanResult {
        parser.parse_file(&self.data)
    }
}
