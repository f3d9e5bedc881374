//! AI21 Labs Jurassic

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::{PromptRequest, PromptResult};
use super::{from_body, to_body};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurassicRequest
{   pub prompt: String
  , pub temperature: f64
  , pub top_p: f64
  , pub max_tokens: u32
  , pub stop_sequences: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct JurassicResponse
{   pub completions: Vec<JurassicCompletion>
}

#[derive(Debug, Clone, Deserialize)]
pub struct JurassicCompletion
{   pub data: JurassicData
}

#[derive(Debug, Clone, Deserialize)]
pub struct JurassicData
{   pub text: String
}

pub fn serialize(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = JurassicRequest
    {   prompt: req.full_prompt()
      , temperature: req.temperature
      , top_p: req.top_p
      , max_tokens: req.max_tokens
      , stop_sequences: req.stop_sequences.clone()
    };
    to_body(&body)
}

pub fn deserialize(body: &[u8]) -> Result<PromptResult>
{   let out: JurassicResponse = from_body("ai21", body)?;
    out.completions.into_iter()
      .next()
      .map(|c| PromptResult::Text(c.data.text))
      .ok_or_else(|| Error::EmptyResult("ai21".to_string()))
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::Value;

    #[test]
    fn test_request_shape()
    {   let req = PromptRequest::new("Hello")
          .with_temperature(0.5)
          .with_max_tokens(200)
          .with_stop_sequences(vec!["##".to_string()]);
        let json: Value = serde_json::from_slice(&serialize(&req).unwrap())
          .unwrap();
        assert_eq!(json["prompt"], "Hello");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["topP"], 0.999);
        assert_eq!(json["maxTokens"], 200);
        assert_eq!(json["stopSequences"][0], "##");
        assert!(json.get("top_k").is_none());
    }

    #[test]
    fn test_response()
    {   let body = br#"{"id": 1234, "completions": [
          {"data": {"text": "Hi there", "tokens": []},
           "finishReason": {"reason": "endoftext"}}
        ]}"#;
        assert_eq!(
          deserialize(body).unwrap(),
          PromptResult::Text("Hi there".to_string())
        );
    }

    #[test]
    fn test_empty_completions()
    {   assert_eq!(
          deserialize(br#"{"completions": []}"#),
          Err(Error::EmptyResult("ai21".to_string()))
        );
    }
}
