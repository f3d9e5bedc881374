//! The remote invoke-model call, behind a trait so callers can inject it

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error, trace};
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::eventstream::{self, Decoder};

/// Raw model chunks from a streaming invocation, in arrival order
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// The managed inference service.
///
/// Implementations report every transport, auth or service failure as
/// [`Error::Gateway`]; adapters never look inside those errors.
#[async_trait]
pub trait InvocationGateway: Send + Sync
{   async fn invoke(
      &self
    , model_id: &str
    , content_type: &str
    , accept: &str
    , body: Vec<u8>
    ) -> Result<Vec<u8>>;

    async fn invoke_streaming(
      &self
    , model_id: &str
    , content_type: &str
    , accept: &str
    , body: Vec<u8>
    ) -> Result<ChunkStream>;
}

#[derive(Debug, Deserialize)]
struct ServiceError
{   #[serde(default, alias = "Message")]
    message: Option<String>
}

/// Bedrock runtime over HTTPS with API-key (bearer) auth
#[derive(Debug, Clone)]
pub struct HttpGateway
{   endpoint: String
  , api_key: Option<String>
  , http_client: reqwest::Client
}

impl HttpGateway
{   pub fn new(config: &GatewayConfig) -> Result<Self>
    {   if config.api_key.is_none() && config.endpoint.is_none()
        {   return Err(Error::InvalidConfiguration(
              "no Bedrock API key configured".to_string()
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        let endpoint = config.endpoint_url();
        debug!("Creating HttpGateway for {}", endpoint);
        Ok(HttpGateway
        {   endpoint
          , api_key: config.api_key.clone()
          , http_client
        })
    }

    fn url(&self, model_id: &str, action: &str) -> String
    {   format!(
          "{}/model/{}/{}",
          self.endpoint,
          urlencoding::encode(model_id),
          action
        )
    }

    async fn post(
      &self
    , url: String
    , content_type: &str
    , accept: &str
    , body: Vec<u8>
    ) -> Result<reqwest::Response>
    {   trace!("POST {}", url);
        let mut request = self.http_client
          .post(url.as_str())
          .header("Content-Type", content_type)
          .header("Accept", accept)
          .body(body);
        if let Some(key) = &self.api_key
        {   request = request
              .header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
          error!("HTTP error: {}", e);
          Error::Gateway(e.to_string())
        })?;

        let status = response.status();
        trace!("Bedrock response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ServiceError>(&error_text)
              .ok()
              .and_then(|e| e.message)
              .unwrap_or(error_text);
            error!("Bedrock error {}: {}", status.as_u16(), message);
            return Err(Error::Gateway(
              format!("{}: {}", status.as_u16(), message)
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl InvocationGateway for HttpGateway
{   async fn invoke(
      &self
    , model_id: &str
    , content_type: &str
    , accept: &str
    , body: Vec<u8>
    ) -> Result<Vec<u8>>
    {   let response = self
          .post(self.url(model_id, "invoke"), content_type, accept, body)
          .await?;
        let bytes = response.bytes().await
          .map_err(|e| Error::Gateway(e.to_string()))?;
        debug!("Received {} bytes from {}", bytes.len(), model_id);
        Ok(bytes.to_vec())
    }

    async fn invoke_streaming(
      &self
    , model_id: &str
    , content_type: &str
    , accept: &str
    , body: Vec<u8>
    ) -> Result<ChunkStream>
    {   let response = self
          .post(
            self.url(model_id, "invoke-with-response-stream"),
            content_type,
            accept,
            body
          )
          .await?;
        debug!("Streaming response opened for {}", model_id);
        let bytes = response.bytes_stream()
          .map(|r| r.map_err(|e| Error::Gateway(e.to_string())));
        Ok(decode_event_stream(bytes))
    }
}

/// Turn an event-stream byte stream into raw model chunks.
/// The stream ends after the first error.
pub fn decode_event_stream<S>(bytes: S) -> ChunkStream
where
  S: Stream<Item = Result<Bytes>> + Send + 'static
{   let state = (Box::pin(bytes), Decoder::new(), false);
    let chunks = futures::stream::unfold(
      state,
      |(mut bytes, mut decoder, done)| async move {
        if done
        {   return None;
        }
        loop
        {   match decoder.next_frame()
            {   Ok(Some(frame)) => match eventstream::chunk_bytes(&frame)
                {   Ok(Some(chunk)) => {
                      return Some((Ok(chunk), (bytes, decoder, false)));
                    }
                  , Ok(None) => continue
                  , Err(e) => return Some((Err(e), (bytes, decoder, true)))
                }
              , Ok(None) => {}
              , Err(e) => return Some((Err(e), (bytes, decoder, true)))
            }

            match bytes.next().await
            {   Some(Ok(data)) => decoder.push(&data)
              , Some(Err(e)) => {
                  return Some((Err(e), (bytes, decoder, true)));
                }
              , None => {
                  if decoder.pending() > 0
                  {   let e = Error::Gateway(format!(
                        "stream ended inside a frame ({} bytes pending)",
                        decoder.pending()
                      ));
                      return Some((Err(e), (bytes, decoder, true)));
                  }
                  trace!("Event stream finished");
                  return None;
                }
            }
        }
      }
    );
    Box::pin(chunks)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::eventstream::encode_chunk;

    #[test]
    fn test_new_requires_credentials()
    {   assert!(matches!(
          HttpGateway::new(&GatewayConfig::default()),
          Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_url_encodes_model_id()
    {   let gateway = HttpGateway::new(
          &GatewayConfig::default().with_api_key("k")
        ).unwrap();
        assert_eq!(
          gateway.url("mistral.mistral-7b-instruct-v0:2", "invoke"),
          "https://bedrock-runtime.us-east-1.amazonaws.com/model/mistral.mistral-7b-instruct-v0%3A2/invoke"
        );
    }

    #[tokio::test]
    async fn test_decode_event_stream_across_pieces()
    {   let mut wire = encode_chunk(br#"{"generation":"a"}"#);
        wire.extend(encode_chunk(br#"{"generation":"b"}"#));
        let pieces: Vec<Result<Bytes>> = wire
          .chunks(5)
          .map(|c| Ok(Bytes::copy_from_slice(c)))
          .collect();

        let chunks: Vec<Result<Vec<u8>>> =
          decode_event_stream(futures::stream::iter(pieces))
            .collect()
            .await;
        assert_eq!(
          chunks,
          vec![
            Ok(br#"{"generation":"a"}"#.to_vec()),
            Ok(br#"{"generation":"b"}"#.to_vec()),
          ]
        );
    }

    #[tokio::test]
    async fn test_decode_event_stream_truncated()
    {   let wire = encode_chunk(br#"{"generation":"a"}"#);
        let cut = Bytes::copy_from_slice(&wire[..wire.len() - 3]);
        let pieces: Vec<Result<Bytes>> = vec![Ok(cut)];

        let chunks: Vec<Result<Vec<u8>>> =
          decode_event_stream(futures::stream::iter(pieces))
            .collect()
            .await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(Error::Gateway(_))));
    }
}
