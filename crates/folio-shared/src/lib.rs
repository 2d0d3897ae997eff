//! # Folio Shared
//!
//! Wire types shared between the Matrix server and its clients.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
