//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use soulmate_gateway::voice::{ChunkStream, Detection, LanguageIdentifier};
use soulmate_gateway::{
    ChatOrchestrator, CompletionProvider, CompletionRequest, Error, LanguageDetector, Persona,
    ReplyGenerator, Result, SamplingConfig, SessionStore, SpeechChunk, SpeechProvider,
    SpeechSynthesizer, VoicePipeline, VoiceSelector,
};

/// Completion provider that replays scripted replies and counts calls
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Option<String>>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    /// `None` entries make the corresponding call fail
    pub fn new(replies: impl IntoIterator<Item = Option<&'static str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
            ..Default::default()
        })
    }

    /// Provider with nothing scripted; any call fails
    pub fn idle() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(Error::Provider("401 invalid api key".to_string())),
            None => Err(Error::Provider("no scripted reply left".to_string())),
        }
    }
}

/// Speech provider that replays a fixed chunk sequence
pub struct ScriptedSpeech {
    chunks: Vec<SpeechChunk>,
    fail: bool,
    pub calls: AtomicUsize,
    pub voices: Mutex<Vec<String>>,
}

impl ScriptedSpeech {
    pub fn new(chunks: Vec<SpeechChunk>) -> Arc<Self> {
        Arc::new(Self {
            chunks,
            fail: false,
            calls: AtomicUsize::new(0),
            voices: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            chunks: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            voices: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for ScriptedSpeech {
    async fn stream(&self, _text: &str, voice_id: &str) -> Result<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().unwrap().push(voice_id.to_string());

        if self.fail {
            return Err(Error::Synthesis("voice service unavailable".to_string()));
        }
        Ok(stream::iter(self.chunks.clone().into_iter().map(Ok)).boxed())
    }
}

/// Identifier that always answers with one tag
pub struct FixedLanguage(pub &'static str);

impl LanguageIdentifier for FixedLanguage {
    fn identify(&self, _text: &str) -> Option<Detection> {
        Some(Detection {
            language: self.0.to_string(),
            confidence: 1.0,
        })
    }
}

/// Orchestrator over scripted collaborators, without voice
pub fn text_only(completion: &Arc<ScriptedCompletion>, sessions: SessionStore) -> ChatOrchestrator {
    let persona = Persona::soulmate();
    let provider: Arc<dyn CompletionProvider> = completion.clone();
    let generator = ReplyGenerator::new(
        Some(provider),
        persona.system_prompt.as_str(),
        SamplingConfig::default(),
    );
    ChatOrchestrator::new(&persona, generator, sessions)
}

/// Voice pipeline over a scripted speech provider
pub fn pipeline(detector: LanguageDetector, speech: &Arc<ScriptedSpeech>) -> VoicePipeline {
    let provider: Arc<dyn SpeechProvider> = speech.clone();
    VoicePipeline::new(
        detector,
        VoiceSelector::default(),
        SpeechSynthesizer::new(provider),
    )
}

/// Orchestrator over scripted collaborators, with voice
pub fn with_voice(
    completion: &Arc<ScriptedCompletion>,
    detector: LanguageDetector,
    speech: &Arc<ScriptedSpeech>,
) -> ChatOrchestrator {
    text_only(completion, SessionStore::default()).with_voice(pipeline(detector, speech))
}

/// Detector that always reports `tag`
pub fn fixed_detector(tag: &'static str) -> LanguageDetector {
    LanguageDetector::new(Arc::new(FixedLanguage(tag)), "zh-TW", 0.5)
}
