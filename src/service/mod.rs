//! Upload gateways

mod blok;

pub use blok::HttpGateway;

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::protocol::Payload;

/// Performs exactly one outbound request per call and resolves once,
/// either with success or with the error detail for logging.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    async fn send(&self, payload: &Payload, config: &SessionConfig) -> Result<()>;
}
