//! Unit tests for the task module.
//!
//! Tests are organised by concern: the aggregate and its state machine, date
//! derivation, configuration from rules, the in-memory lock protocol and the
//! lifecycle service.
