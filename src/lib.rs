pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod eventstream;
pub mod gateway;
pub mod client;
use serde::{Deserialize, Serialize};

/*

bedrock-invoke: one request syntax for every model family hosted on
Amazon Bedrock. Each vendor expects its own JSON body and answers with
its own JSON shape; the adapters in `providers/` translate both ways.

bedrock-invoke/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and provider identity
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Gateway configuration
│   ├── request.rs      # Unified request/result types
│   ├── providers/      # One wire shape per vendor
│   ├── gateway.rs      # InvocationGateway trait + HTTP implementation
│   ├── eventstream.rs  # AWS event-stream frame decoder
│   ├── client.rs       # BedrockClient facade
│   └── bin/            # bedrock-prompt demo driver
└── tests/

*/

pub use client::{BedrockClient, TextStream};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use gateway::{ChunkStream, HttpGateway, InvocationGateway};
pub use providers::Adapter;
pub use request::{EncodedImage, ImageOptions, PromptRequest, PromptResult};

/// Content type of every request body
pub const CONTENT_TYPE: &str = "application/json";
/// Accept header sent with every request
pub const ACCEPT: &str = "*/*";

/// Model vendors reachable through Bedrock.
/// The variant is chosen by the namespace of a model identifier,
/// e.g. `anthropic` in `anthropic.claude-v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum Provider
{
  /// Anthropic (Claude models)
  Anthropic
  ,
  /// AI21 Labs (Jurassic models)
  Ai21
  ,
  /// Cohere (Command models)
  Cohere
  ,
  /// Meta (Llama models)
  Meta
  ,
  /// Mistral AI (Mistral, Mixtral models)
  Mistral
  ,
  /// Stability AI (Stable Diffusion)
  Stability
  ,
  /// Amazon (Titan text and image models)
  Amazon
}

impl Provider
{   /// Resolve the vendor from the text before the first `.`
    pub fn from_model_id(model_id: &str) -> Result<Self>
    {   let Some((prefix, _)) = model_id.split_once('.')
        else
        {   return Err(Error::UnknownProvider(model_id.to_string()));
        };

        match prefix
        {   "anthropic" => Ok(Provider::Anthropic)
          , "ai21" => Ok(Provider::Ai21)
          , "cohere" => Ok(Provider::Cohere)
          , "meta" => Ok(Provider::Meta)
          , "mistral" => Ok(Provider::Mistral)
          , "stability" => Ok(Provider::Stability)
          , "amazon" => Ok(Provider::Amazon)
          , _ => Err(Error::UnknownProvider(model_id.to_string()))
        }
    }

    /// Vendor tag as it appears in model identifiers
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::Anthropic => "anthropic"
          , Provider::Ai21 => "ai21"
          , Provider::Cohere => "cohere"
          , Provider::Meta => "meta"
          , Provider::Mistral => "mistral"
          , Provider::Stability => "stability"
          , Provider::Amazon => "amazon"
        }
    }
}

impl std::fmt::Display for Provider
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}
