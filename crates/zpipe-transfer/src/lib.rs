//! FTP deliverable transfer for the pipeline.
//!
//! OSGi bundles, WAR files and server configuration reach the host's
//! zFS over plain FTP. Transfers are sequential over one session and a
//! batch stops at its first failure.

pub mod batch;
pub mod error;
pub mod store;

pub use batch::{directory_items, upload_batch, upload_file, TransferItem};
pub use error::TransferError;
pub use store::{FtpStore, RemoteStore};
