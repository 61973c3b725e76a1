//! Remote file stores.
//!
//! [`RemoteStore`] is the seam between batch logic and the wire; the
//! production implementation is plain FTP, which is what the host's
//! zFS accepts everywhere.

use crate::error::TransferError;
use std::fs::File;
use std::path::Path;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::{debug, info};

/// Destination for uploaded deliverables.
pub trait RemoteStore {
    /// Create a directory (and any missing parents). Existing
    /// directories are fine.
    fn ensure_dir(&mut self, path: &str) -> Result<(), TransferError>;

    /// Upload one local file to a remote path.
    fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError>;
}

/// FTP-backed store.
pub struct FtpStore {
    stream: FtpStream,
}

impl FtpStore {
    /// Connect and log in, leaving the session in binary mode at the
    /// root directory.
    pub fn connect(host: &str, user: &str, pass: &str) -> Result<Self, TransferError> {
        info!(host, "connecting to FTP");
        let mut stream = FtpStream::connect(format!("{host}:21"))?;
        stream.login(user, pass)?;
        stream.transfer_type(FileType::Binary)?;
        stream.cwd("/")?;
        Ok(Self { stream })
    }

    /// Close the session. Errors on quit are ignored; the transfers
    /// already completed.
    pub fn disconnect(mut self) {
        let _ = self.stream.quit();
    }
}

impl RemoteStore for FtpStore {
    fn ensure_dir(&mut self, path: &str) -> Result<(), TransferError> {
        // Create component by component; mkdir of an existing
        // directory answers 550, which is fine.
        let mut built = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            built.push('/');
            built.push_str(component);
            if self.stream.mkdir(&built).is_ok() {
                debug!(dir = %built, "created remote directory");
            }
        }
        Ok(())
    }

    fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError> {
        let mut file = File::open(local).map_err(|source| TransferError::Io {
            path: local.display().to_string(),
            source,
        })?;
        self.stream.put_file(remote, &mut file)?;
        debug!(local = %local.display(), remote, "uploaded");
        Ok(())
    }
}
