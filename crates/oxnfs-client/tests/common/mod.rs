//! Common test utilities for client integration tests.

#![allow(dead_code)]

pub mod harness;

pub use harness::{EXPORT, FakeServer, TEST_GID, TEST_UID};

use rand::RngCore;

/// Deterministic-length random content.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

/// Install a test subscriber once so `RUST_LOG` works under `cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
