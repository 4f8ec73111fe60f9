//! Unit tests for reconfiguration batches.
