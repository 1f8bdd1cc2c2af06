//! Unit tests for principal resolution.
