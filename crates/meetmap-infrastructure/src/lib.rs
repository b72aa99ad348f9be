//! Infrastructure backends for the meetmap core.

pub mod config_service;
pub mod memory_gateway;

pub use crate::config_service::ConfigService;
pub use crate::memory_gateway::InMemoryGateway;
