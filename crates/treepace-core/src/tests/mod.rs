//! Unit tests for `treepace_core`.
