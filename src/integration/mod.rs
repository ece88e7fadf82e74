//! AppMap server integration: finding status, app id resolution and upload.

mod app_id;
mod client;
mod error;
mod normalize;
mod upload;

pub use app_id::resolve_app_id;
pub use client::{
    AppLandClient, DEFAULT_RETRIES, DEFAULT_URL, FindingStatus, FindingStatusSource, Settings,
    UploadReceipt, retry,
};
pub use error::RemoteError;
pub use normalize::normalize_summary;
pub use upload::{UploadPayload, normalized_file_name};
