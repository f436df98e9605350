//! HTTP transport and response interpretation.

mod client;
pub mod response;

pub use client::{HttpClient, HttpClientBuilder};
pub use response::{NotFound, Remote};
