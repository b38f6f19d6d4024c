//! Tool service module
//!
//! The typed operation surface consumed by the transport layer: request and
//! response schemas plus the service that executes them.

mod ops;
mod outcome;

pub use ops::{
    DownloadImageArgs, ImageService, SaveImagesArgs, SearchImagesArgs, ToolRequest, ToolResponse,
    UploadImageArgs,
};
pub use outcome::{DownloadOutcome, UploadOutcome};
