use serde::{Deserialize, Serialize};
use log::trace;

use crate::error::{Error, Result};
use crate::request::{PromptRequest, PromptResult};
use super::{from_body, to_body, whole_number};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistralInstructRequest
{   pub prompt: String
  , pub temperature: f64
  , pub top_p: f64
  , #[serde(serialize_with = "whole_number")]
    pub top_k: f64
  , pub max_tokens: u32
  , pub stop: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct MistralInstructResponse
{   pub outputs: Vec<Output>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Output
{   pub text: String
  , #[serde(default)]
    pub stop_reason: Option<String>
}

// ===== Adapter =====

pub fn serialize(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = MistralInstructRequest
    {   prompt: req.full_prompt()
      , temperature: req.temperature
      , top_p: req.top_p
      , top_k: req.top_k
      , max_tokens: req.max_tokens
      , stop: req.stop_sequences.clone()
    };
    trace!("Mistral request: {:?}", body);
    to_body(&body)
}

pub fn deserialize(body: &[u8]) -> Result<PromptResult>
{   let out: MistralInstructResponse = from_body("mistral", body)?;
    out.outputs.into_iter()
      .next()
      .map(|o| {
        trace!("Mistral stop reason: {:?}", o.stop_reason);
        PromptResult::Text(o.text)
      })
      .ok_or_else(|| Error::EmptyResult("mistral".to_string()))
}

/// Streamed chunks reuse the `outputs` envelope; an empty list is no text
pub fn decode_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let out: MistralInstructResponse = from_body("mistral", chunk)?;
    Ok(out.outputs.into_iter()
      .next()
      .map(|o| o.text)
      .filter(|t| !t.is_empty()))
}
