//! Segment speech synthesis with cleaning and retry.

use super::SpeechSynthesizer;
use crate::config::SpeechSettings;
use crate::error::{Result, StudycastError};
use crate::script::pronunciation::strip_phoneme_markup;
use crate::script::{dialogue_lines, Speaker, Speakers};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice};
use async_openai::Client;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Payload returned for segments with no dialogue: two zero bytes of PCM.
pub const SILENT_PAYLOAD: &str = "AAA=";

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay after a failed `attempt` (1-based), or `None` after the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.base_delay * attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

fn mark_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<mark[^>]*>").expect("Invalid regex"))
}

/// Strip sync markers and asterisks, trim lines, drop blank lines.
pub fn clean_for_speech(segment: &str) -> String {
    segment
        .split('\n')
        .map(|line| mark_regex().replace_all(line, "").trim().replace('*', ""))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clean a segment and synthesize it, retrying on failure.
///
/// A segment with no speaker tag yields [`SILENT_PAYLOAD`] without calling
/// the synthesizer.
#[instrument(skip(synthesizer, segment, speakers), fields(chars = segment.len()))]
pub async fn synthesize_segment(
    synthesizer: &dyn SpeechSynthesizer,
    segment: &str,
    speakers: &Speakers,
    policy: RetryPolicy,
) -> Result<String> {
    let cleaned = clean_for_speech(segment);
    if !speakers.mentions_any(&cleaned) {
        debug!("Segment has no dialogue, using silent payload");
        return Ok(SILENT_PAYLOAD.to_string());
    }

    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match synthesizer.synthesize(&cleaned, speakers).await {
            Ok(payload) if !payload.is_empty() => return Ok(payload),
            Ok(_) => {
                last_error = "audio data not found in response".to_string();
                warn!(attempt, "Speech synthesis returned no audio");
            }
            Err(e) => {
                last_error = e.to_string();
                warn!(attempt, error = %e, "Speech synthesis attempt failed");
            }
        }

        if let Some(delay) = policy.delay_after(attempt) {
            info!("Waiting {}ms before retrying", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }

    Err(StudycastError::AudioSynthesis(format!(
        "gave up after {} attempts: {}",
        max_attempts, last_error
    )))
}

/// OpenAI text-to-speech, one request per dialogue turn.
///
/// Turns are rendered with the voice of their speaker as raw 24 kHz 16-bit
/// mono PCM and concatenated. The endpoint reads its input literally, so
/// `<phoneme>` elements are reduced to the word they wrap; stress accents
/// reach it unchanged.
pub struct OpenAISpeech {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    first_voice: Voice,
    second_voice: Voice,
}

impl OpenAISpeech {
    pub fn new(client: Client<OpenAIConfig>, settings: &SpeechSettings) -> Result<Self> {
        Ok(Self {
            client,
            model: parse_setting(&settings.model, "speech model")?,
            first_voice: parse_setting(&settings.first_voice, "voice")?,
            second_voice: parse_setting(&settings.second_voice, "voice")?,
        })
    }

    fn voice_for(&self, speaker: Speaker) -> Voice {
        match speaker {
            Speaker::First => self.first_voice.clone(),
            Speaker::Second => self.second_voice.clone(),
        }
    }
}

fn parse_setting<T: serde::de::DeserializeOwned>(name: &str, what: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| StudycastError::Config(format!("Unknown {}: {}", what, name)))
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeech {
    async fn synthesize(&self, segment: &str, speakers: &Speakers) -> Result<String> {
        let mut pcm: Vec<u8> = Vec::new();

        for turn in dialogue_lines(segment, speakers) {
            let request = CreateSpeechRequest {
                model: self.model.clone(),
                input: strip_phoneme_markup(&turn.text),
                voice: self.voice_for(turn.speaker),
                response_format: Some(SpeechResponseFormat::Pcm),
                ..Default::default()
            };

            let response = self
                .client
                .audio()
                .speech(request)
                .await
                .map_err(|e| StudycastError::OpenAI(format!("Speech API error: {}", e)))?;
            pcm.extend_from_slice(&response.bytes);
        }

        debug!(bytes = pcm.len(), "Synthesized segment");
        Ok(STANDARD.encode(pcm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySynth {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SpeechSynthesizer for FlakySynth {
        async fn synthesize(&self, segment: &str, _speakers: &Speakers) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(StudycastError::OpenAI(format!("boom {}", call)))
            } else {
                Ok(STANDARD.encode(segment.as_bytes()))
            }
        }
    }

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_clean_for_speech() {
        let segment = "<mark node=\"1.1\">\n  Voce 1: **Hello** there  \n\n   \nVoce 2: Hi <mark node=\"1.2\">";
        assert_eq!(clean_for_speech(segment), "Voce 1: Hello there\nVoce 2: Hi");
    }

    #[test]
    fn test_delay_is_linear_with_no_wait_after_last() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_after(3), None);
    }

    #[tokio::test]
    async fn test_no_dialogue_short_circuits() {
        let synth = FlakySynth { failures: 0, calls: AtomicU32::new(0) };
        let payload = synthesize_segment(&synth, "<mark node=\"1\">\nnarration", &Speakers::default(), no_wait(3))
            .await
            .unwrap();
        assert_eq!(payload, SILENT_PAYLOAD);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
        assert_eq!(STANDARD.decode(SILENT_PAYLOAD).unwrap(), vec![0u8, 0u8]);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let synth = FlakySynth { failures: 2, calls: AtomicU32::new(0) };
        let payload = synthesize_segment(&synth, "Voce 1: *ciao*", &Speakers::default(), no_wait(3))
            .await
            .unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), b"Voce 1: ciao".to_vec());
        assert_eq!(synth.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let synth = FlakySynth { failures: 10, calls: AtomicU32::new(0) };
        let err = synthesize_segment(&synth, "Voce 2: ciao", &Speakers::default(), no_wait(3))
            .await
            .unwrap_err();
        assert!(matches!(err, StudycastError::AudioSynthesis(_)));
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("boom 3"));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_speech_settings_parse() {
        let speech = OpenAISpeech::new(Client::new(), &SpeechSettings::default()).unwrap();
        let voice = |s| serde_json::to_value(speech.voice_for(s)).unwrap();
        assert_eq!(voice(Speaker::First), "nova");
        assert_eq!(voice(Speaker::Second), "onyx");
    }
}
