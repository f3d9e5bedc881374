//! Unified request and result types shared by every provider adapter

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Titan image generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions
{   /// What the image should not contain
    pub negative_text: Option<String>
  , pub number_of_images: u32
  , pub height: u32
  , pub width: u32
}

impl Default for ImageOptions
{   fn default() -> Self
    {   ImageOptions
        {   negative_text: None
          , number_of_images: 1
          , height: 512
          , width: 512
        }
    }
}

/// Provider-agnostic prompt and generation options.
///
/// Adapters read only the fields their vendor understands. Builder
/// methods consume the request, so a built value is never mutated
/// underneath an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest
{   /// The prompt text
    pub prompt: String
  , /// Context prepended verbatim to the prompt
    pub document: Option<String>
  , /// System instruction (Anthropic messages API)
    pub system: Option<String>
  , /// Max tokens to generate
    pub max_tokens: u32
  , pub temperature: f64
  , pub top_p: f64
  , pub top_k: f64
  , pub stop_sequences: Vec<String>
  , /// Cohere: GENERATION, ALL or NONE
    pub return_likelihoods: Option<String>
  , /// Cohere: number of generations to return
    pub num_generations: Option<u32>
  , /// Ask for the streaming invocation path
    pub stream: bool
  , /// Prompt strength for image models
    pub scale: f64
  , pub seed: u32
  , pub steps: u32
  , pub image: ImageOptions
}

impl PromptRequest
{   pub fn new(prompt: impl Into<String>) -> Self
    {   PromptRequest
        {   prompt: prompt.into()
          , document: None
          , system: None
          , max_tokens: 500
          , temperature: 1.0
          , top_p: 0.999
          , top_k: 250.0
          , stop_sequences: vec![]
          , return_likelihoods: None
          , num_generations: None
          , stream: false
          , scale: 10.0
          , seed: 0
          , steps: 50
          , image: ImageOptions::default()
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self
    {   self.document = Some(document.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self
    {   self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self
    {   self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self
    {   self.top_p = top_p;
        self
    }

    pub fn with_top_k(mut self, top_k: f64) -> Self
    {   self.top_k = top_k;
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self
    {   self.stop_sequences = stop;
        self
    }

    pub fn with_return_likelihoods(
      mut self
    , likelihoods: impl Into<String>
    ) -> Self
    {   self.return_likelihoods = Some(likelihoods.into());
        self
    }

    pub fn with_num_generations(mut self, n: u32) -> Self
    {   self.num_generations = Some(n);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self
    {   self.stream = stream;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self
    {   self.scale = scale;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self
    {   self.seed = seed;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self
    {   self.steps = steps;
        self
    }

    pub fn with_image_options(mut self, image: ImageOptions) -> Self
    {   self.image = image;
        self
    }

    /// Prompt text with the document, if any, in front of it
    pub fn full_prompt(&self) -> String
    {   match &self.document
        {   Some(doc) => format!("{}{}", doc, self.prompt)
          , None => self.prompt.clone()
        }
    }
}

/// Base64 image payload as returned by an image model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage(pub String);

impl EncodedImage
{   pub fn decode(&self) -> crate::error::Result<Vec<u8>>
    {   Ok(STANDARD.decode(self.0.as_bytes())?)
    }
}

/// Unified result of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptResult
{   /// Generated text
    Text(String)
  , /// Generated image, still base64-encoded
    Image(EncodedImage)
}
