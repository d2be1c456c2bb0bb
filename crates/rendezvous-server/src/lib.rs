//! rendezvous-server
//!
//! Multi-client async TCP server for the rendezvous service.

pub mod config;
pub mod types;
pub mod server;
pub mod service_task;
pub mod console;

// internal: per-connection request/response handling
mod connection;
