//! Test suites spanning the whole dispatcher.
