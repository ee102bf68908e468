//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Website addressed by web job scenarios.
pub const WEBSITE_NAME: &str = "website1";

/// Hosted service seeded by the `test-backdoors` fake backend.
pub const SERVICE_NAME: &str = "svc";

/// Storage account seeded by the `test-backdoors` fake backend.
pub const STORAGE_ACCOUNT: &str = "diagstore";
