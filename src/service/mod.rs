//! Service layer: room operations paired with their broadcasts.

pub mod frames;
pub mod relay_service;

pub use relay_service::RelayService;
