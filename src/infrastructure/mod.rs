//! External interfaces: event bus and the two platform clients

pub mod events;
pub mod tracking;
pub mod transfer;
