//! Синтез речи через OpenAI API
//!
//! Каждый клип синтезируется отдельным запросом к `/audio/speech`; ответ в
//! формате WAV сохраняется в папку результатов, длительность определяется
//! по заголовку файла.

use std::path::PathBuf;
use async_trait::async_trait;
use reqwest::Client;
use crate::config::{OpenAiSettings, TtsModel};
use crate::error::{Result, StudioError};
use crate::media::audio::probe_duration_bytes;
use crate::services::{SpeechSynthesizer, SynthesisOutput, SynthesisRequest};

/// Голоса OpenAI, принимаемые как есть
const OPENAI_VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Сопоставить идентификатор голоса студии голосу OpenAI.
/// `F*` - женские голоса, `M*` - мужские.
pub fn openai_voice(voice: &str) -> &'static str {
    let lower = voice.trim().to_lowercase();
    if let Some(known) = OPENAI_VOICES.iter().find(|name| **name == lower) {
        return *known;
    }
    match lower.as_str() {
        "f1" => "nova",
        "f2" => "shimmer",
        "m1" => "onyx",
        "m2" => "echo",
        _ => {
            log::warn!("Unknown voice '{}', falling back to alloy", voice);
            "alloy"
        }
    }
}

/// Движок синтеза на базе OpenAI TTS
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    client: Client,
    settings: OpenAiSettings,
    /// Папка по умолчанию, если запрос её не указал
    default_folder: PathBuf,
}

impl OpenAiSynthesizer {
    pub fn new(settings: OpenAiSettings, default_folder: impl Into<PathBuf>) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            log::error!("OpenAI API key is empty");
            return Err(StudioError::Configuration(
                "OpenAI API key is required for speech synthesis".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            settings,
            default_folder: default_folder.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput> {
        let folder = request
            .output_folder
            .clone()
            .unwrap_or_else(|| self.default_folder.clone());
        tokio::fs::create_dir_all(&folder).await?;
        let path = folder.join(format!("{}.wav", request.output_name));

        let model = TtsModel::for_quality(request.quality);
        log::debug!(
            "Sending TTS request: model={}, voice={}, speed={}, lang={}",
            model.as_str(),
            request.voice,
            request.speed,
            request.language.as_str()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&serde_json::json!({
                "model": model.as_str(),
                "voice": openai_voice(&request.voice),
                "input": request.text,
                "response_format": "wav",
                "speed": request.speed.clamp(0.25, 4.0),
            }))
            .send()
            .await
            .map_err(|e| StudioError::collaborator("synthesize", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            log::error!("OpenAI API error (status {}): {}", status, error_text);
            return Err(StudioError::collaborator(
                "synthesize",
                format!("status {}: {}", status, error_text),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::collaborator("synthesize", e.to_string()))?;
        if bytes.is_empty() {
            return Err(StudioError::collaborator("synthesize", "received empty audio"));
        }

        tokio::fs::write(&path, &bytes).await?;
        let duration = match probe_duration_bytes(&bytes, Some("wav")) {
            Ok(duration) => duration,
            Err(e) => {
                log::warn!("Could not read duration of {}: {}", path.display(), e);
                None
            }
        };

        log::info!("Saved synthesized audio to {}", path.display());
        Ok(SynthesisOutput { path, duration })
    }
}
