//! Servers. Services that can be started and stopped.
pub mod signals;
pub mod udp;
