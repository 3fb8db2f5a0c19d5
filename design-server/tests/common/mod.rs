//! Shared integration test helpers.

mod server;

#[allow(unused_imports)]
pub use server::{FailingStore, TestServer};
