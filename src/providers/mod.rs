/*!
 * Provider implementations for the translation service.
 *
 * The translation collaborator is any chat-completion endpoint speaking the
 * OpenAI wire format (the hosted API or a compatible self-hosted server).
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for translation providers
///
/// This trait defines the interface a provider implementation must follow,
/// allowing providers to be swapped in the translation service and mocked
/// in tests.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod openai;
