//! System-level integration tests

mod lifecycle;
mod recovery;
mod scenarios;
