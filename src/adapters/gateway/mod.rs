//! Outbound messaging adapters.

mod http_gateway;
mod logging_gateway;

pub use http_gateway::HttpMessagingGateway;
pub use logging_gateway::LoggingGateway;
