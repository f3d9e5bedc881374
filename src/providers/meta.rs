//! Meta Llama

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::{PromptRequest, PromptResult};
use super::{from_body, to_body};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlamaRequest
{   pub prompt: String
  , pub temperature: f64
  , pub top_p: f64
  , pub max_gen_len: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlamaResponse
{   pub generation: String
  , #[serde(default)]
    pub stop_reason: Option<String>
}

pub fn serialize(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = LlamaRequest
    {   prompt: req.full_prompt()
      , temperature: req.temperature
      , top_p: req.top_p
      , max_gen_len: req.max_tokens
    };
    to_body(&body)
}

pub fn deserialize(body: &[u8]) -> Result<PromptResult>
{   let out: LlamaResponse = from_body("meta", body)?;
    Ok(PromptResult::Text(out.generation))
}

pub fn decode_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let out: LlamaResponse = from_body("meta", chunk)?;
    Ok(Some(out.generation).filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::Value;

    #[test]
    fn test_request_shape()
    {   let req = PromptRequest::new("Tell me a joke").with_max_tokens(64);
        let json: Value = serde_json::from_slice(&serialize(&req).unwrap())
          .unwrap();
        assert_eq!(json["prompt"], "Tell me a joke");
        assert_eq!(json["max_gen_len"], 64);
        assert_eq!(json["top_p"], 0.999);
        assert!(json.get("stop_sequences").is_none());
        assert!(json.get("top_k").is_none());
    }

    #[test]
    fn test_response()
    {   let body = br#"{"generation": "Why did the chicken...",
          "prompt_token_count": 5, "stop_reason": "stop"}"#;
        assert_eq!(
          deserialize(body).unwrap(),
          PromptResult::Text("Why did the chicken...".to_string())
        );
    }

    #[test]
    fn test_chunk()
    {   assert_eq!(
          decode_chunk(br#"{"generation": " cross"}"#).unwrap(),
          Some(" cross".to_string())
        );
        assert_eq!(decode_chunk(br#"{"generation": ""}"#).unwrap(), None);
    }
}
