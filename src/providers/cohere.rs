//! Cohere Command

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::{PromptRequest, PromptResult};
use super::{from_body, to_body, whole_number};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest
{   pub prompt: String
  , pub temperature: f64
  , pub p: f64
  , #[serde(serialize_with = "whole_number")]
    pub k: f64
  , pub max_tokens: u32
  , pub stop_sequences: Vec<String>
  , pub return_likelihoods: String
  , pub stream: bool
  , pub num_generations: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandResponse
{   pub generations: Vec<CommandGeneration>
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandGeneration
{   #[serde(default)]
    pub id: String
  , pub text: String
}

/// Streamed chunks carry either a bare `text` or a `generations` list
#[derive(Debug, Clone, Deserialize)]
struct CommandChunk
{   #[serde(default)]
    text: Option<String>
  , #[serde(default)]
    generations: Vec<CommandGeneration>
}

pub fn serialize(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = CommandRequest
    {   prompt: req.full_prompt()
      , temperature: req.temperature
      , p: req.top_p
      , k: req.top_k
      , max_tokens: req.max_tokens
      , stop_sequences: req.stop_sequences.clone()
      , return_likelihoods: req.return_likelihoods.clone()
          .unwrap_or_else(|| "NONE".to_string())
      , stream: req.stream
      , num_generations: req.num_generations.unwrap_or(1)
    };
    to_body(&body)
}

pub fn deserialize(body: &[u8]) -> Result<PromptResult>
{   let out: CommandResponse = from_body("cohere", body)?;
    out.generations.into_iter()
      .next()
      .map(|g| PromptResult::Text(g.text))
      .ok_or_else(|| Error::EmptyResult("cohere".to_string()))
}

pub fn decode_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let out: CommandChunk = from_body("cohere", chunk)?;
    let text = out.text
      .or_else(|| out.generations.into_iter().next().map(|g| g.text));
    Ok(text.filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::Value;

    #[test]
    fn test_request_shape()
    {   let req = PromptRequest::new("Write a haiku")
          .with_top_p(0.75)
          .with_top_k(0.0)
          .with_return_likelihoods("GENERATION")
          .with_num_generations(2)
          .with_stream(true);
        let json: Value = serde_json::from_slice(&serialize(&req).unwrap())
          .unwrap();
        assert_eq!(json["prompt"], "Write a haiku");
        assert_eq!(json["p"], 0.75);
        assert!(json["k"].is_i64());
        assert_eq!(json["k"], 0);
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["return_likelihoods"], "GENERATION");
        assert_eq!(json["stream"], true);
        assert_eq!(json["num_generations"], 2);
        assert!(json["stop_sequences"].is_array());
    }

    #[test]
    fn test_request_defaults()
    {   let json: Value = serde_json::from_slice(
          &serialize(&PromptRequest::new("x")).unwrap()
        ).unwrap();
        assert_eq!(json["return_likelihoods"], "NONE");
        assert_eq!(json["num_generations"], 1);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_k_is_written_as_integer()
    {   let body = String::from_utf8(
          serialize(&PromptRequest::new("x")).unwrap()
        ).unwrap();
        assert!(body.contains(r#""k":250,"#), "{}", body);

        let body = String::from_utf8(
          serialize(&PromptRequest::new("x").with_top_k(2.5)).unwrap()
        ).unwrap();
        assert!(body.contains(r#""k":2.5,"#), "{}", body);
    }

    #[test]
    fn test_response()
    {   let body = br#"{"id": "r1", "prompt": "Write a haiku",
          "generations": [{"id": "g1", "text": "Leaves fall"}]}"#;
        assert_eq!(
          deserialize(body).unwrap(),
          PromptResult::Text("Leaves fall".to_string())
        );
    }

    #[test]
    fn test_empty_generations()
    {   assert_eq!(
          deserialize(br#"{"generations": []}"#),
          Err(Error::EmptyResult("cohere".to_string()))
        );
    }

    #[test]
    fn test_chunks()
    {   assert_eq!(
          decode_chunk(br#"{"is_finished": false, "text": "Leaves"}"#)
            .unwrap(),
          Some("Leaves".to_string())
        );
        assert_eq!(
          decode_chunk(br#"{"generations": [{"text": " fall"}]}"#).unwrap(),
          Some(" fall".to_string())
        );
        assert_eq!(
          decode_chunk(br#"{"is_finished": true,
            "finish_reason": "COMPLETE"}"#).unwrap(),
          None
        );
    }
}
