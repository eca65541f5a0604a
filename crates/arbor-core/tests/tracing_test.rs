//! Tests for the arbor tracing setup.

use std::sync::Mutex;

use arbor_core::tracing::init_tracing;

static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_arbor_log_debug() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("ARBOR_LOG", "arbor_mining=debug");
    init_tracing();
    std::env::remove_var("ARBOR_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_arbor_log_fallback() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("ARBOR_LOG", "this_is_garbage_not_a_valid_filter=[");
    init_tracing();
    std::env::remove_var("ARBOR_LOG");
}
