//! Historical-data API client.

mod client;

pub use client::HistoryClient;
