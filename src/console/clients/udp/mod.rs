//! UDP tracker console client.
pub mod app;
