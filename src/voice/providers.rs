//! HTTP speech providers

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures::{Stream, StreamExt, stream};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::tts::{ChunkStream, SpeechChunk, SpeechProvider};
use crate::{Error, Result};

/// `OpenAI` speech endpoint
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Upper bound on one synthesis call, streamed body included
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::Http)
}

/// Incremental decoder for newline-delimited JSON chunk events
///
/// Lines may be split across network reads; partial lines are buffered
/// until their newline arrives or the stream ends.
#[derive(Debug, Default)]
struct LineDecoder {
    buf: Vec<u8>,
}

#[derive(Deserialize)]
struct ChunkEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl LineDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<SpeechChunk>> {
        self.buf.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            chunks.extend(decode_line(&line));
        }
        chunks
    }

    fn finish(&mut self) -> Vec<Result<SpeechChunk>> {
        let rest = std::mem::take(&mut self.buf);
        decode_line(&rest).into_iter().collect()
    }
}

/// Decode one event line; blank lines yield nothing
fn decode_line(line: &[u8]) -> Option<Result<SpeechChunk>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let event: ChunkEvent = match serde_json::from_slice(line) {
        Ok(event) => event,
        Err(e) => return Some(Err(Error::Synthesis(format!("malformed chunk: {e}")))),
    };

    let chunk = match event.kind.to_ascii_lowercase().as_str() {
        "audio" => base64::engine::general_purpose::STANDARD
            .decode(event.data.unwrap_or_default())
            .map(SpeechChunk::audio)
            .map_err(|e| Error::Synthesis(format!("invalid audio chunk: {e}"))),
        "error" => Err(Error::Synthesis(
            event.message.unwrap_or_else(|| "provider reported an error".to_string()),
        )),
        _ => Ok(SpeechChunk::metadata(event.kind, line.to_vec())),
    };
    Some(chunk)
}

/// Turn a raw NDJSON byte stream into a chunk stream
fn decode_ndjson<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .map(Some)
        .chain(stream::once(async { None }))
        .scan(LineDecoder::default(), |decoder, item| {
            let chunks = match item {
                Some(Ok(b)) => decoder.push(b.as_ref()),
                Some(Err(e)) => vec![Err(Error::Synthesis(format!("stream interrupted: {e}")))],
                None => decoder.finish(),
            };
            futures::future::ready(Some(stream::iter(chunks)))
        })
        .flatten()
        .boxed()
}

/// Turn a raw audio byte stream into a chunk stream
fn raw_audio<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .map(|item| match item {
            Ok(b) => Ok(SpeechChunk::audio(b.as_ref().to_vec())),
            Err(e) => Err(Error::Synthesis(format!("stream interrupted: {e}"))),
        })
        .boxed()
}

async fn check_status(response: reqwest::Response, provider: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = %status, body = %body, provider, "TTS API error");
    Err(Error::Synthesis(format!("{provider} TTS error {status}: {body}")))
}

/// Synthesis service that streams tagged NDJSON events
///
/// Request: `POST {endpoint}` with `{"text", "voice"}`.
/// Response lines: `{"type": "audio", "data": "<base64>"}` for audio, any
/// other `type` (e.g. `WordBoundary`) for metadata, `{"type": "error"}` to abort.
pub struct NdjsonSpeechProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl NdjsonSpeechProvider {
    /// Create a provider for `endpoint`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is empty
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(Error::Config("TTS endpoint required".to_string()));
        }

        Ok(Self {
            client: http_client(DEFAULT_SYNTHESIS_TIMEOUT)?,
            endpoint,
            api_key: api_key.filter(|k| !k.is_empty()).map(SecretString::from),
        })
    }

    /// Fail calls that run longer than `timeout`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }
}

#[async_trait]
impl SpeechProvider for NdjsonSpeechProvider {
    async fn stream(&self, text: &str, voice_id: &str) -> Result<ChunkStream> {
        #[derive(Serialize)]
        struct StreamRequest<'a> {
            text: &'a str,
            voice: &'a str,
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&StreamRequest { text, voice: voice_id });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "TTS request failed");
            Error::Synthesis(format!("TTS request failed: {e}"))
        })?;
        let response = check_status(response, "ndjson").await?;

        Ok(decode_ndjson(response.bytes_stream()))
    }
}

/// `OpenAI` speech API; every body chunk is audio
pub struct OpenAiSpeechProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    url: String,
}

impl OpenAiSpeechProvider {
    /// Create a provider using `model` (e.g. "tts-1")
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_url(api_key, model, OPENAI_SPEECH_URL.to_string())
    }

    /// Create a provider against a custom compatible endpoint
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn with_url(api_key: String, model: String, url: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: http_client(DEFAULT_SYNTHESIS_TIMEOUT)?,
            api_key: SecretString::from(api_key),
            model,
            url,
        })
    }

    /// Fail calls that run longer than `timeout`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn stream(&self, text: &str, voice_id: &str) -> Result<ChunkStream> {
        #[derive(Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: voice_id,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("TTS request failed: {e}")))?;
        let response = check_status(response, "OpenAI").await?;

        Ok(raw_audio(response.bytes_stream()))
    }
}
