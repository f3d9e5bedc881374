//! Amazon Titan text and image models

use serde::{Deserialize, Serialize};
use log::debug;

use crate::error::{Error, Result};
use crate::request::{EncodedImage, PromptRequest, PromptResult};
use super::{from_body, to_body};

// ===== Titan Text =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGenerationConfig
{   pub temperature: f64
  , pub top_p: f64
  , pub max_token_count: u32
  , pub stop_sequences: Vec<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanTextRequest
{   pub input_text: String
  , pub text_generation_config: TextGenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanTextResponse
{   #[serde(default)]
    pub input_text_token_count: u32
  , pub results: Vec<TitanTextResult>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanTextResult
{   #[serde(default)]
    pub token_count: u32
  , pub output_text: String
  , #[serde(default)]
    pub completion_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanTextChunk
{   #[serde(default)]
    output_text: Option<String>
}

pub fn serialize_text(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = TitanTextRequest
    {   input_text: req.full_prompt()
      , text_generation_config: TextGenerationConfig
        {   temperature: req.temperature
          , top_p: req.top_p
          , max_token_count: req.max_tokens
          , stop_sequences: req.stop_sequences.clone()
        }
    };
    to_body(&body)
}

pub fn deserialize_text(body: &[u8]) -> Result<PromptResult>
{   let out: TitanTextResponse = from_body("amazon", body)?;
    debug!("Titan input token count: {}", out.input_text_token_count);
    let result = out.results.into_iter()
      .next()
      .ok_or_else(|| Error::EmptyResult("amazon".to_string()))?;
    debug!(
      "Titan produced {} tokens, reason: {:?}",
      result.token_count, result.completion_reason
    );
    Ok(PromptResult::Text(result.output_text))
}

pub fn decode_text_chunk(chunk: &[u8]) -> Result<Option<String>>
{   let out: TitanTextChunk = from_body("amazon", chunk)?;
    Ok(out.output_text.filter(|t| !t.is_empty()))
}

// ===== Titan Image =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextToImageParams
{   pub text: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationConfig
{   pub number_of_images: u32
  , pub height: u32
  , pub width: u32
  , pub cfg_scale: f64
  , pub seed: u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanImageRequest
{   pub task_type: String
  , pub text_to_image_params: TextToImageParams
  , pub image_generation_config: ImageGenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitanImageResponse
{   #[serde(default)]
    pub images: Vec<String>
  , #[serde(default)]
    pub error: Option<String>
}

pub fn serialize_image(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = TitanImageRequest
    {   task_type: "TEXT_IMAGE".to_string()
      , text_to_image_params: TextToImageParams
        {   text: req.full_prompt()
          , negative_text: req.image.negative_text.clone()
        }
      , image_generation_config: ImageGenerationConfig
        {   number_of_images: req.image.number_of_images
          , height: req.image.height
          , width: req.image.width
          , cfg_scale: req.scale
          , seed: req.seed
        }
    };
    to_body(&body)
}

pub fn deserialize_image(body: &[u8]) -> Result<PromptResult>
{   let out: TitanImageResponse = from_body("amazon", body)?;
    if let Some(err) = out.error.filter(|e| !e.is_empty())
    {   return Err(Error::Model(err));
    }
    out.images.into_iter()
      .next()
      .map(|b64| PromptResult::Image(EncodedImage(b64)))
      .ok_or_else(|| Error::EmptyResult("amazon".to_string()))
}
