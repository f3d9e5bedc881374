use thiserror::Error;

/// Error type for every stage of a Bedrock invocation.
/// Implements Clone so stream items and test fixtures can share it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error
{   /// Request could not be encoded as JSON
    #[error("unable to marshal payload body, {0}")]
    Serialization(String)
  , /// Response bytes did not match the provider's shape
    #[error("unable to unmarshal {provider} response, {message}")]
    Deserialization
    {   provider: String
      , message: String
    }
  , /// Parsed response held no element where one was expected
    #[error("{0} response contained no results")]
    EmptyResult(String)
  , /// Base64 image or chunk payload was malformed
    #[error("unable to decode base64 payload, {0}")]
    Decode(String)
  , /// Capability not offered by the selected provider
    #[error("{0}")]
    UnsupportedOperation(String)
  , /// Model identifier prefix unrecognized or malformed
    #[error("invalid model, {0}")]
    UnknownProvider(String)
  , /// Transport, auth or service failure
    #[error("error from inference gateway: {0}")]
    Gateway(String)
  , /// The model reported a failure inside a successful response
    #[error("model reported an error: {0}")]
    Model(String)
  , /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String)
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error
{   pub(crate) fn deserialization(
      provider: &str
    , err: serde_json::Error
    ) -> Self
    {   Error::Deserialization
        {   provider: provider.to_string()
          , message: err.to_string()
        }
    }

    /// Raised by `send_streaming` for adapters without a chunked shape.
    pub(crate) fn streaming_unsupported() -> Self
    {   Error::UnsupportedOperation(
          "this model does not support streaming".to_string()
        )
    }
}

impl From<base64::DecodeError> for Error
{   fn from(err: base64::DecodeError) -> Self
    {   Error::Decode(err.to_string())
    }
}
