//! Text-to-speech (TTS) synthesis from streamed provider chunks

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, TryStreamExt};

use super::VoiceProfile;
use crate::{Error, Result};

/// Kind of a streamed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// Encoded audio payload
    Audio,
    /// Anything else (word boundaries, timing, session info)
    Metadata(String),
}

/// One unit of a streamed synthesis response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechChunk {
    pub kind: ChunkKind,
    pub data: Vec<u8>,
}

impl SpeechChunk {
    #[must_use]
    pub fn audio(data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ChunkKind::Audio,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn metadata(kind: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ChunkKind::Metadata(kind.into()),
            data: data.into(),
        }
    }

    #[must_use]
    pub const fn is_audio(&self) -> bool {
        matches!(self.kind, ChunkKind::Audio)
    }
}

/// Ordered, finite stream of chunks from a provider
pub type ChunkStream = BoxStream<'static, Result<SpeechChunk>>;

/// A streaming voice-synthesis backend
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Open a synthesis stream for `text` spoken by `voice_id`
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be opened
    async fn stream(&self, text: &str, voice_id: &str) -> Result<ChunkStream>;
}

/// Concatenate the audio chunks of a stream, in delivery order
///
/// Non-audio chunks contribute nothing.
///
/// # Errors
///
/// Returns the first error yielded by the stream
pub async fn collect_audio<S>(chunks: S) -> Result<Vec<u8>>
where
    S: Stream<Item = Result<SpeechChunk>>,
{
    chunks
        .try_fold(Vec::new(), |mut audio, chunk| async move {
            if chunk.is_audio() {
                audio.extend_from_slice(&chunk.data);
            }
            Ok(audio)
        })
        .await
}

/// Produces one audio buffer per reply
#[derive(Clone)]
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
}

impl SpeechSynthesizer {
    #[must_use]
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self { provider }
    }

    /// Synthesize `text` with the given voice
    ///
    /// # Returns
    ///
    /// Raw audio bytes (MP3); encoding for transport is the caller's job
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if the stream fails or carries no audio
    pub async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<Vec<u8>> {
        tracing::debug!(voice = %voice.voice_id, chars = text.chars().count(), "starting synthesis");

        let chunks = self
            .provider
            .stream(text, &voice.voice_id)
            .await
            .map_err(into_synthesis_error)?;

        let audio = collect_audio(chunks).await.map_err(into_synthesis_error)?;

        if audio.is_empty() {
            return Err(Error::Synthesis("stream contained no audio".to_string()));
        }

        tracing::info!(voice = %voice.voice_id, audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }
}

impl std::fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer").finish_non_exhaustive()
    }
}

fn into_synthesis_error(e: Error) -> Error {
    match e {
        Error::Synthesis(_) => e,
        other => Error::Synthesis(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use futures::stream;

    use super::*;

    struct Scripted(Vec<Result<SpeechChunk>>);

    #[async_trait]
    impl SpeechProvider for Scripted {
        async fn stream(&self, _text: &str, _voice_id: &str) -> Result<ChunkStream> {
            let items: Vec<Result<SpeechChunk>> = self
                .0
                .iter()
                .map(|r| match r {
                    Ok(c) => Ok(c.clone()),
                    Err(e) => Err(Error::Synthesis(e.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn voice() -> VoiceProfile {
        VoiceProfile::new("en", "en-US-AriaNeural")
    }

    #[tokio::test]
    async fn metadata_chunks_contribute_nothing() {
        let chunks = stream::iter(vec![
            Ok(SpeechChunk::audio(vec![1, 2])),
            Ok(SpeechChunk::metadata("WordBoundary", b"{\"offset\":0}".to_vec())),
            Ok(SpeechChunk::audio(vec![3])),
        ]);

        assert_eq!(collect_audio(chunks).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn audio_grows_with_each_chunk() {
        let all = vec![
            SpeechChunk::audio(vec![9]),
            SpeechChunk::metadata("SessionEnd", Vec::new()),
            SpeechChunk::audio(vec![8, 7]),
        ];

        let mut previous = 0;
        for n in 0..=all.len() {
            let prefix = stream::iter(all[..n].iter().cloned().map(Ok));
            let len = collect_audio(prefix).await.unwrap().len();
            assert!(len >= previous);
            previous = len;
        }
        assert_eq!(previous, 3);
    }

    #[tokio::test]
    async fn stream_error_fails_synthesis() {
        let synthesizer = SpeechSynthesizer::new(Arc::new(Scripted(vec![
            Ok(SpeechChunk::audio(vec![1])),
            Err(Error::Config("connection reset".to_string())),
        ])));

        let err = synthesizer.synthesize("hi", &voice()).await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn metadata_only_stream_is_an_error() {
        let synthesizer = SpeechSynthesizer::new(Arc::new(Scripted(vec![Ok(
            SpeechChunk::metadata("WordBoundary", Vec::new()),
        )])));

        assert!(matches!(
            synthesizer.synthesize("hi", &voice()).await,
            Err(Error::Synthesis(_))
        ));
    }

    #[tokio::test]
    async fn synthesize_returns_concatenated_audio() {
        let synthesizer = SpeechSynthesizer::new(Arc::new(Scripted(vec![
            Ok(SpeechChunk::audio(vec![0x01])),
            Ok(SpeechChunk::audio(vec![0x02])),
        ])));

        assert_eq!(
            synthesizer.synthesize("hi", &voice()).await.unwrap(),
            vec![0x01, 0x02]
        );
    }
}
