use std::pin::Pin;

use futures::{future, Stream, StreamExt};
use log::{debug, error, info};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::{HttpGateway, InvocationGateway};
use crate::providers::Adapter;
use crate::request::{PromptRequest, PromptResult};
use crate::{ACCEPT, CONTENT_TYPE};

/// Text deltas from a streaming invocation
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Public client interface.
///
/// Holds one gateway for its whole life and no per-call state, so a
/// shared reference can serve concurrent calls.
pub struct BedrockClient<G: InvocationGateway = HttpGateway>
{   gateway: G
}

impl BedrockClient<HttpGateway>
{   /// Create a client talking to the Bedrock runtime over HTTPS
    pub fn from_config(config: &GatewayConfig) -> Result<Self>
    {   Ok(BedrockClient::new(HttpGateway::new(config)?))
    }
}

impl<G: InvocationGateway> BedrockClient<G>
{   pub fn new(gateway: G) -> Self
    {   debug!("Creating BedrockClient");
        BedrockClient { gateway }
    }

    pub fn gateway(&self) -> &G
    {   &self.gateway
    }

    /// Serialize, invoke and deserialize one prompt
    pub async fn send(
      &self
    , model_id: &str
    , request: &PromptRequest
    ) -> Result<PromptResult>
    {   debug!("send for model: {}", model_id);
        let adapter = Adapter::for_model(model_id).map_err(|e| {
          error!("Dispatch failed for {}: {}", model_id, e);
          e
        })?;
        let body = adapter.serialize(request).map_err(|e| {
          error!("Serialize failed for {}: {}", model_id, e);
          e
        })?;

        let raw = self.gateway
          .invoke(model_id, CONTENT_TYPE, ACCEPT, body)
          .await
          .map_err(|e| {
            error!("Invoke failed for {}: {}", model_id, e);
            e
          })?;

        let result = adapter.deserialize(&raw)?;
        info!("{} answered {}", model_id, match &result
        {   PromptResult::Text(t) => format!("{} chars of text", t.len())
          , PromptResult::Image(_) => "an image".to_string()
        });
        Ok(result)
    }

    /// Send a prompt and return the generated text
    pub async fn send_text(
      &self
    , model_id: &str
    , request: &PromptRequest
    ) -> Result<String>
    {   let adapter = Adapter::for_model(model_id)?;
        let result = self.send(model_id, request).await?;
        adapter.extract_text(&result)
    }

    /// Send a prompt and return the decoded image bytes
    pub async fn send_image(
      &self
    , model_id: &str
    , request: &PromptRequest
    ) -> Result<Vec<u8>>
    {   let adapter = Adapter::for_model(model_id)?;
        let result = self.send(model_id, request).await?;
        adapter.extract_image(&result).map_err(|e| {
          error!("Extract image failed for {}: {}", model_id, e);
          e
        })
    }

    /// Invoke with a streamed response; yields text as it arrives.
    /// Fails before any network call if the model cannot stream.
    pub async fn send_streaming(
      &self
    , model_id: &str
    , request: &PromptRequest
    ) -> Result<TextStream>
    {   debug!("send_streaming for model: {}", model_id);
        let adapter = Adapter::for_model(model_id)?;
        if !adapter.supports_streaming()
        {   error!("{} does not support streaming", model_id);
            return Err(Error::streaming_unsupported());
        }

        let request = request.clone().with_stream(true);
        let body = adapter.serialize(&request)?;
        let chunks = self.gateway
          .invoke_streaming(model_id, CONTENT_TYPE, ACCEPT, body)
          .await
          .map_err(|e| {
            error!("Invoke streaming failed for {}: {}", model_id, e);
            e
          })?;

        // Like the chunk stream, the text stream ends after its first error
        let text = chunks
          .map(move |chunk| chunk.and_then(|raw| adapter.decode_chunk(&raw)))
          .scan(false, |failed, delta| {
            if *failed
            {   return future::ready(None);
            }
            *failed = delta.is_err();
            future::ready(Some(delta))
          })
          .filter_map(|delta| future::ready(delta.transpose()));
        Ok(Box::pin(text))
    }
}
