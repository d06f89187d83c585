//! Core self-healing subsystem
//!
//! Data flows leaves-first: the monitor polls the registry, metrics feed
//! the issue tracker, qualifying issues are diagnosed and planned, and the
//! executor reports outcomes back into the tracker, closing the loop.

pub mod diagnosis;
pub mod issues;
pub mod monitor;
pub mod recovery;
pub mod registry;
pub mod system;
pub mod types;
