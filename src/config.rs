//! Configuration for the Bedrock runtime gateway

use serde::{Deserialize, Serialize};
use log::debug;

const DEFAULT_REGION: &str = "us-east-1";

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig
{   /// AWS region hosting the models
    pub region: String
  , /// Runtime endpoint override (if custom)
    pub endpoint: Option<String>
  , /// Bedrock API key sent as a bearer token
    pub api_key: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig
        {   region: DEFAULT_REGION.to_string()
          , endpoint: None
          , api_key: None
          , timeout_secs: None
        }
    }
}

impl GatewayConfig
{   /// Build from `AWS_REGION`/`AWS_DEFAULT_REGION`, `BEDROCK_ENDPOINT`
    /// and `AWS_BEARER_TOKEN_BEDROCK`
    pub fn from_env() -> Self
    {   let region = std::env::var("AWS_REGION")
          .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
          .unwrap_or_else(|_| DEFAULT_REGION.to_string());
        debug!("Loading gateway config for region: {}", region);
        GatewayConfig
        {   region
          , endpoint: std::env::var("BEDROCK_ENDPOINT").ok()
          , api_key: std::env::var("AWS_BEARER_TOKEN_BEDROCK").ok()
          , timeout_secs: None
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self
    {   self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self
    {   self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    /// Runtime base URL, without a trailing slash
    pub fn endpoint_url(&self) -> String
    {   match &self.endpoint
        {   Some(url) => url.trim_end_matches('/').to_string()
          , None => format!(
              "https://bedrock-runtime.{}.amazonaws.com",
              self.region
            )
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_default_endpoint_uses_region()
    {   let cfg = GatewayConfig::default().with_region("eu-west-1");
        assert_eq!(
          cfg.endpoint_url(),
          "https://bedrock-runtime.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_endpoint_override_trims_slash()
    {   let cfg = GatewayConfig::default()
          .with_endpoint("http://localhost:8080/");
        assert_eq!(cfg.endpoint_url(), "http://localhost:8080");
    }
}
