//! Stability AI Stable Diffusion

use serde::{Deserialize, Serialize};
use log::debug;

use crate::error::{Error, Result};
use crate::request::{EncodedImage, PromptRequest, PromptResult};
use super::{from_body, to_body};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPrompt
{   pub text: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableDiffusionRequest
{   pub text_prompts: Vec<TextPrompt>
  , pub cfg_scale: f64
  , pub steps: u32
  , pub seed: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct StableDiffusionResponse
{   #[serde(default)]
    pub result: String
  , pub artifacts: Vec<Artifact>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact
{   pub base64: String
  , #[serde(default)]
    pub finish_reason: Option<String>
}

pub fn serialize(req: &PromptRequest) -> Result<Vec<u8>>
{   let body = StableDiffusionRequest
    {   text_prompts: vec![TextPrompt { text: req.full_prompt() }]
      , cfg_scale: req.scale
      , steps: req.steps
      , seed: req.seed
    };
    to_body(&body)
}

pub fn deserialize(body: &[u8]) -> Result<PromptResult>
{   let out: StableDiffusionResponse = from_body("stability", body)?;
    if !out.result.is_empty() && out.result != "success"
    {   return Err(Error::Model(format!("stability result: {}", out.result)));
    }

    let artifact = out.artifacts.into_iter()
      .next()
      .ok_or_else(|| Error::EmptyResult("stability".to_string()))?;
    debug!("Stability finish reason: {:?}", artifact.finish_reason);
    Ok(PromptResult::Image(EncodedImage(artifact.base64)))
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::Value;

    #[test]
    fn test_request_shape_defaults()
    {   let json: Value = serde_json::from_slice(
          &serialize(&PromptRequest::new("a red chicken")).unwrap()
        ).unwrap();
        assert_eq!(json["text_prompts"][0]["text"], "a red chicken");
        assert_eq!(json["cfg_scale"], 10.0);
        assert_eq!(json["steps"], 50);
        assert_eq!(json["seed"], 0);
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn test_request_image_options()
    {   let req = PromptRequest::new("x")
          .with_scale(7.5)
          .with_seed(42)
          .with_steps(30);
        let json: Value = serde_json::from_slice(&serialize(&req).unwrap())
          .unwrap();
        assert_eq!(json["cfg_scale"], 7.5);
        assert_eq!(json["seed"], 42);
        assert_eq!(json["steps"], 30);
    }

    #[test]
    fn test_response_image()
    {   let body = br#"{"result": "success", "artifacts": [
          {"seed": 42, "base64": "iVBORw0KGgo=", "finishReason": "SUCCESS"}
        ]}"#;
        let result = deserialize(body).unwrap();
        assert_eq!(
          result,
          PromptResult::Image(EncodedImage("iVBORw0KGgo=".to_string()))
        );
        let png = super::super::Adapter::Stability
          .extract_image(&result)
          .unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_corrupted_artifact_is_decode_error()
    {   let body = br#"{"result": "success", "artifacts": [
          {"base64": "iVBORw0K!!Ggo", "finishReason": "SUCCESS"}
        ]}"#;
        let result = deserialize(body).unwrap();
        assert!(matches!(
          super::super::Adapter::Stability.extract_image(&result),
          Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_empty_artifacts()
    {   assert_eq!(
          deserialize(br#"{"result": "success", "artifacts": []}"#),
          Err(Error::EmptyResult("stability".to_string()))
        );
    }

    #[test]
    fn test_failed_result()
    {   assert!(matches!(
          deserialize(br#"{"result": "error", "artifacts": []}"#),
          Err(Error::Model(_))
        ));
    }
}
