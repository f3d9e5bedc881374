//! Provider adapters: one wire shape per vendor

pub mod anthropic;
pub mod ai21;
pub mod cohere;
pub mod meta;
pub mod mistral;
pub mod stability;
pub mod amazon;

use log::{debug, error, trace};
use serde::{Serialize, Serializer};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::request::{PromptRequest, PromptResult};
use crate::Provider;

/// Every request/response shape this crate can speak.
/// Picked from a model identifier with [`Adapter::for_model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapter
{   /// Claude messages API (claude-3 and later)
    AnthropicMessages
  , /// Claude text completion API (claude-v1, v2, instant)
    AnthropicLegacy
  , Ai21
  , Cohere
  , Meta
  , Mistral
  , Stability
  , TitanText
  , TitanImage
}

impl Adapter
{   /// Select the adapter for a model identifier
    pub fn for_model(model_id: &str) -> Result<Self>
    {   let provider = Provider::from_model_id(model_id)?;
        // from_model_id guarantees the separator exists
        let model = model_id.split_once('.')
          .map(|(_, m)| m)
          .unwrap_or_default();

        let adapter = match provider
        {   Provider::Anthropic => {
              if anthropic::is_legacy_model(model)
              {   Adapter::AnthropicLegacy
              } else
              {   Adapter::AnthropicMessages
              }
            }
          , Provider::Ai21 => Adapter::Ai21
          , Provider::Cohere => Adapter::Cohere
          , Provider::Meta => Adapter::Meta
          , Provider::Mistral => Adapter::Mistral
          , Provider::Stability => Adapter::Stability
          , Provider::Amazon => {
              if model.starts_with("titan-image")
              {   Adapter::TitanImage
              } else
              {   Adapter::TitanText
              }
            }
        };
        debug!("Model {} uses adapter {:?}", model_id, adapter);
        Ok(adapter)
    }

    pub fn provider(&self) -> Provider
    {   match self
        {   Adapter::AnthropicMessages
          | Adapter::AnthropicLegacy => Provider::Anthropic
          , Adapter::Ai21 => Provider::Ai21
          , Adapter::Cohere => Provider::Cohere
          , Adapter::Meta => Provider::Meta
          , Adapter::Mistral => Provider::Mistral
          , Adapter::Stability => Provider::Stability
          , Adapter::TitanText
          | Adapter::TitanImage => Provider::Amazon
        }
    }

    pub fn name(&self) -> &'static str
    {   match self
        {   Adapter::AnthropicMessages => "AnthropicClaudeMessages"
          , Adapter::AnthropicLegacy => "AnthropicClaude"
          , Adapter::Ai21 => "AI21LabsJurassic"
          , Adapter::Cohere => "CohereCommand"
          , Adapter::Meta => "MetaLlama"
          , Adapter::Mistral => "MistralInstruct"
          , Adapter::Stability => "StabilityAISD"
          , Adapter::TitanText => "AmazonTitanText"
          , Adapter::TitanImage => "AmazonTitanImage"
        }
    }

    /// Build the JSON request body for this vendor.
    /// A streaming request is rejected by adapters that cannot stream.
    /// The prompt must be non-empty once the vendor's prefix is applied;
    /// only the legacy Claude wrapping adds one.
    pub fn serialize(&self, req: &PromptRequest) -> Result<Vec<u8>>
    {   trace!("{} serializing request: {:?}", self.name(), req);
        if req.stream && !self.supports_streaming()
        {   return Err(Error::streaming_unsupported());
        }
        if *self != Adapter::AnthropicLegacy && req.full_prompt().is_empty()
        {   error!("{} refused an empty prompt", self.name());
            return Err(Error::Serialization(
              "prompt must not be empty".to_string()
            ));
        }
        match self
        {   Adapter::AnthropicMessages => anthropic::serialize_messages(req)
          , Adapter::AnthropicLegacy => anthropic::serialize_legacy(req)
          , Adapter::Ai21 => ai21::serialize(req)
          , Adapter::Cohere => cohere::serialize(req)
          , Adapter::Meta => meta::serialize(req)
          , Adapter::Mistral => mistral::serialize(req)
          , Adapter::Stability => stability::serialize(req)
          , Adapter::TitanText => amazon::serialize_text(req)
          , Adapter::TitanImage => amazon::serialize_image(req)
        }
    }

    /// Parse a complete (non-streamed) response body
    pub fn deserialize(&self, body: &[u8]) -> Result<PromptResult>
    {   let result = match self
        {   Adapter::AnthropicMessages => anthropic::deserialize_messages(body)
          , Adapter::AnthropicLegacy => anthropic::deserialize_legacy(body)
          , Adapter::Ai21 => ai21::deserialize(body)
          , Adapter::Cohere => cohere::deserialize(body)
          , Adapter::Meta => meta::deserialize(body)
          , Adapter::Mistral => mistral::deserialize(body)
          , Adapter::Stability => stability::deserialize(body)
          , Adapter::TitanText => amazon::deserialize_text(body)
          , Adapter::TitanImage => amazon::deserialize_image(body)
        };
        if let Err(e) = &result
        {   error!("{} response rejected: {}", self.name(), e);
        }
        result
    }

    /// Text delta carried by one streamed chunk, if any
    pub fn decode_chunk(&self, chunk: &[u8]) -> Result<Option<String>>
    {   match self
        {   Adapter::AnthropicMessages => anthropic::decode_messages_chunk(chunk)
          , Adapter::AnthropicLegacy => anthropic::decode_legacy_chunk(chunk)
          , Adapter::Cohere => cohere::decode_chunk(chunk)
          , Adapter::Meta => meta::decode_chunk(chunk)
          , Adapter::Mistral => mistral::decode_chunk(chunk)
          , Adapter::TitanText => amazon::decode_text_chunk(chunk)
          , Adapter::Ai21
          | Adapter::Stability
          | Adapter::TitanImage => Err(Error::streaming_unsupported())
        }
    }

    pub fn supports_streaming(&self) -> bool
    {   !matches!(
          self,
          Adapter::Ai21 | Adapter::Stability | Adapter::TitanImage
        )
    }

    pub fn supports_text(&self) -> bool
    {   !matches!(self, Adapter::Stability | Adapter::TitanImage)
    }

    pub fn supports_image(&self) -> bool
    {   matches!(
          self,
          Adapter::Stability
          | Adapter::TitanImage
          | Adapter::AnthropicMessages
        )
    }

    pub fn extract_text(&self, result: &PromptResult) -> Result<String>
    {   if !self.supports_text()
        {   return Err(Error::UnsupportedOperation(format!(
              "{} does not produce text", self.name()
            )));
        }
        match result
        {   PromptResult::Text(text) => Ok(text.clone())
          , PromptResult::Image(_) => Err(Error::UnsupportedOperation(
              format!("{} result holds an image, not text", self.name())
            ))
        }
    }

    pub fn extract_image(&self, result: &PromptResult) -> Result<Vec<u8>>
    {   if !self.supports_image()
        {   return Err(Error::UnsupportedOperation(format!(
              "{} does not produce images", self.name()
            )));
        }
        match result
        {   PromptResult::Image(image) => image.decode()
          , PromptResult::Text(_) => Err(Error::UnsupportedOperation(
              format!("{} result holds text, not an image", self.name())
            ))
        }
    }
}

pub(crate) fn to_body<T: Serialize>(body: &T) -> Result<Vec<u8>>
{   serde_json::to_vec(body)
      .map_err(|e| Error::Serialization(e.to_string()))
}

/// Write a whole-number knob as a JSON integer (`250`, not `250.0`)
pub(crate) fn whole_number<S: Serializer>(
  value: &f64
, serializer: S
) -> std::result::Result<S::Ok, S::Error>
{   if value.fract() == 0.0 && value.abs() < i64::MAX as f64
    {   serializer.serialize_i64(*value as i64)
    } else
    {   serializer.serialize_f64(*value)
    }
}

pub(crate) fn from_body<T: DeserializeOwned>(
  provider: &str
, body: &[u8]
) -> Result<T>
{   serde_json::from_slice(body)
      .map_err(|e| Error::deserialization(provider, e))
}
