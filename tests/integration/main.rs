//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one slice of the controller against the
//! mock adapters in [`mock_hw`].  Everything runs on the host with a
//! hand-driven clock; only `worker_tests` starts a real thread.

mod mock_hw;
mod override_tests;
mod worker_tests;
