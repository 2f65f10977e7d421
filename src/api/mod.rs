//! API module
//!
//! HTTP handlers for the chat feature. The handlers stay thin: ownership
//! checks and validation here, everything else in `ChatDb` and `Assistant`.

pub mod sessions;
pub mod utils;
