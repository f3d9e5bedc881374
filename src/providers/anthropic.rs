//! Anthropic Claude: text completion API and messages API

use serde::{Deserialize, Serialize};
use log::trace;

use crate::error::{Error, Result};
use crate::request::{EncodedImage, PromptRequest, PromptResult};
use super::{from_body, to_body};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Models that only speak the text completion API
pub fn is_legacy_model(model: &str) -> bool
{   model.starts_with("claude-v1")
      || model.starts_with("claude-v2")
      || model.starts_with("claude-instant")
}

/// Prompt framing required by the completion API
pub fn legacy_prompt(prompt: &str) -> String
{   format!("Human: \n\nHuman: {}\n\nAssistant:", prompt)
}

// ===== Text Completion API =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeCompletionRequest
{   pub prompt: String
  , pub max_tokens_to_sample: u32
  , pub temperature: f64
  , pub top_k: u32
  , pub top_p: f64
  , pub stop_sequences: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeCompletionResponse
{   pub completion: String
  , #[serde(default)]
    pub stop_reason: Option<String>
}

pub fn serialize_legacy(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = ClaudeCompletionRequest
    {   prompt: legacy_prompt(&req.full_prompt())
      , max_tokens_to_sample: req.max_tokens
      , temperature: req.temperature
      , top_k: req.top_k as u32
      , top_p: req.top_p
      , stop_sequences: req.stop_sequences.clone()
    };
    to_body(&body)
}

pub fn deserialize_legacy(body: &[u8]) -> Result<PromptResult>
{   let out: ClaudeCompletionResponse = from_body("anthropic", body)?;
    trace!("Claude stop reason: {:?}", out.stop_reason);
    Ok(PromptResult::Text(out.completion))
}

/// Streamed completion chunks have the same shape as the full response
pub fn decode_legacy_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let out: ClaudeCompletionResponse = from_body("anthropic", chunk)?;
    Ok(Some(out.completion).filter(|t| !t.is_empty()))
}

// ===== Messages API =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource
{   #[serde(rename = "type")]
    pub kind: String
  , pub media_type: String
  , pub data: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock
{   Text
    {   text: String
    }
  , Image
    {   source: ImageSource
    }
  , #[serde(other)]
    Other
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessage
{   pub role: String
  , pub content: Vec<ContentBlock>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessagesRequest
{   pub anthropic_version: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>
  , pub messages: Vec<ClaudeMessage>
  , pub max_tokens: u32
  , pub temperature: f64
  , pub top_k: u32
  , pub top_p: f64
  , pub stop_sequences: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessagesResponse
{   pub content: Vec<ContentBlock>
  , #[serde(default)]
    pub stop_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct StreamDelta
{   #[serde(default)]
    text: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct StreamEvent
{   #[serde(rename = "type")]
    kind: String
  , #[serde(default)]
    delta: Option<StreamDelta>
}

pub fn serialize_messages(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = ClaudeMessagesRequest
    {   anthropic_version: ANTHROPIC_VERSION.to_string()
      , system: req.system.clone()
      , messages: vec![
          ClaudeMessage
          {   role: "user".to_string()
            , content: vec![
                ContentBlock::Text { text: req.full_prompt() }
              ]
          }
        ]
      , max_tokens: req.max_tokens
      , temperature: req.temperature
      , top_k: req.top_k as u32
      , top_p: req.top_p
      , stop_sequences: req.stop_sequences.clone()
    };
    to_body(&body)
}

/// Text blocks are joined; a reply with only an image block yields the image
pub fn deserialize_messages(body: &[u8]) -> Result<PromptResult>
{   let out: ClaudeMessagesResponse = from_body("anthropic", body)?;
    trace!("Claude stop reason: {:?}", out.stop_reason);

    let mut text: Option<String> = None;
    let mut image: Option<EncodedImage> = None;
    for block in out.content
    {   match block
        {   ContentBlock::Text { text: t } => {
              text.get_or_insert_with(String::new).push_str(&t);
            }
          , ContentBlock::Image { source } => {
              if image.is_none()
              {   image = Some(EncodedImage(source.data));
              }
            }
          , ContentBlock::Other => {}
        }
    }

    match (text, image)
    {   (Some(t), _) => Ok(PromptResult::Text(t))
      , (None, Some(img)) => Ok(PromptResult::Image(img))
      , (None, None) => Err(Error::EmptyResult("anthropic".to_string()))
    }
}

pub fn decode_messages_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let event: StreamEvent = from_body("anthropic", chunk)?;
    if event.kind != "content_block_delta"
    {   trace!("Skipping Claude stream event: {}", event.kind);
        return Ok(None);
    }
    Ok(event.delta.and_then(|d| d.text))
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::Value;

    const POEM: &str = "Please write me a short poem about a chicken";

    #[test]
    fn test_legacy_prompt_wrapping()
    {   let body = serialize_legacy(&PromptRequest::new(POEM)).unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
          json["prompt"],
          "Human: \n\nHuman: Please write me a short poem about a chicken\n\nAssistant:"
        );
        assert_eq!(json["max_tokens_to_sample"], 500);
        assert_eq!(json["top_k"], 250);
        assert!(json["stop_sequences"].is_array());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_legacy_wraps_document_and_prompt()
    {   let req = PromptRequest::new("Summarise.").with_document("Doc. ");
        let body = serialize_legacy(&req).unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
          json["prompt"],
          "Human: \n\nHuman: Doc. Summarise.\n\nAssistant:"
        );
    }

    #[test]
    fn test_messages_request_shape()
    {   let req = PromptRequest::new(POEM)
          .with_system("Respond with just the poem, nothing else.")
          .with_stop_sequences(vec!["\n\nHuman:".to_string()]);
        let body = serialize_messages(&req).unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(
          json["system"],
          "Respond with just the poem, nothing else."
        );
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], POEM);
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["stop_sequences"][0], "\n\nHuman:");
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn test_messages_omits_absent_system()
    {   let body = serialize_messages(&PromptRequest::new(POEM)).unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_messages_response_joins_text()
    {   let body = br#"{
          "id": "msg_1",
          "type": "message",
          "role": "assistant",
          "content": [
            {"type": "text", "text": "Cluck, "},
            {"type": "text", "text": "cluck."}
          ],
          "stop_reason": "end_turn"
        }"#;
        assert_eq!(
          deserialize_messages(body).unwrap(),
          PromptResult::Text("Cluck, cluck.".to_string())
        );
    }

    #[test]
    fn test_messages_response_image_block()
    {   let body = br#"{"content": [{"type": "image", "source":
          {"type": "base64", "media_type": "image/png", "data": "aGk="}}]}"#;
        assert_eq!(
          deserialize_messages(body).unwrap(),
          PromptResult::Image(EncodedImage("aGk=".to_string()))
        );
    }

    #[test]
    fn test_messages_empty_content()
    {   let body = br#"{"content": [], "stop_reason": "end_turn"}"#;
        assert_eq!(
          deserialize_messages(body),
          Err(Error::EmptyResult("anthropic".to_string()))
        );
    }

    #[test]
    fn test_legacy_response()
    {   let body = br#"{"completion": " A hen.", "stop_reason": "stop_sequence"}"#;
        assert_eq!(
          deserialize_legacy(body).unwrap(),
          PromptResult::Text(" A hen.".to_string())
        );
    }

    #[test]
    fn test_messages_stream_chunks()
    {   let start = br#"{"type":"message_start","message":{"id":"m"}}"#;
        let delta = br#"{"type":"content_block_delta","index":0,
          "delta":{"type":"text_delta","text":"Cluck"}}"#;
        assert_eq!(decode_messages_chunk(start).unwrap(), None);
        assert_eq!(
          decode_messages_chunk(delta).unwrap(),
          Some("Cluck".to_string())
        );
    }

    #[test]
    fn test_bad_json_is_deserialization_error()
    {   assert!(matches!(
          deserialize_legacy(b"not json"),
          Err(Error::Deserialization { .. })
        ));
    }
}
