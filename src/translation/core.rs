/*!
 * Core translation service implementation.
 *
 * Translates a rendered SRT file as a single document so the model sees the
 * full dialogue context, runs a reflect-then-improve editing pass over the
 * draft, and verifies that the final file keeps the original line count and
 * timeline before accepting it.
 */

use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::providers::Provider;
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::subtitle_processor::timelines_match;

/// Minimal chat surface the translation loop needs from a provider
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a system and user prompt, returning the model's reply text
    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
impl ChatClient for OpenAI {
    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = OpenAIRequest::new(model)
            .temperature(temperature)
            .add_message("system", system_prompt)
            .add_message("user", user_prompt);

        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }
}

/// Service for translating whole subtitle files
pub struct TranslationService {
    /// The provider client used for requests
    client: Box<dyn ChatClient>,

    /// Translation configuration
    config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service from configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let client = OpenAI::new(&config.api_key, &config.endpoint)
            .map_err(|e| anyhow!("Failed to create translation client: {}", e))?;

        Ok(Self {
            client: Box::new(client),
            config,
        })
    }

    /// Create a service backed by an arbitrary client, for testing
    pub fn with_client(client: Box<dyn ChatClient>, config: TranslationConfig) -> Self {
        Self { client, config }
    }

    /// Build the system prompt for the initial translation pass
    fn system_prompt(&self, source_name: &str, target_name: &str) -> String {
        format!(
            "You are translating the subtitles of a video from {} to {}. \
             The input is a complete SRT file. Translate only the dialogue text. \
             Keep every index line and every timestamp line exactly as given, \
             keep the same number of subtitle blocks, and reply with the full \
             SRT file and nothing else.",
            source_name, target_name
        )
    }

    /// Ask the model to critique a draft translation.
    ///
    /// Returns (system prompt, user prompt) for the reflection call.
    fn reflection_prompts(
        &self,
        source_name: &str,
        target_name: &str,
        source_text: &str,
        draft: &str,
    ) -> (String, String) {
        let system = format!(
            "You are an expert linguist specializing in translation from {} to {}. \
             You will be given a source text and its translation, and your goal \
             is to improve the translation.",
            source_name, target_name
        );
        let user = format!(
            "Read the source SRT file and its {} to {} translation, then write a \
             list of specific, helpful suggestions for improving the translation's \
             accuracy, fluency, style, and terminology. Never suggest changes to \
             index or timestamp lines. Output only the suggestions and nothing else.\n\n\
             <SOURCE_TEXT>\n{}\n</SOURCE_TEXT>\n\n<TRANSLATION>\n{}\n</TRANSLATION>",
            source_name, target_name, source_text, draft
        );
        (system, user)
    }

    /// Ask the model to edit the draft using the critique.
    ///
    /// Returns (system prompt, user prompt) for the improvement call.
    fn improvement_prompts(
        &self,
        source_name: &str,
        target_name: &str,
        source_text: &str,
        draft: &str,
        suggestions: &str,
    ) -> (String, String) {
        let system = format!(
            "You are an expert linguist, specializing in translation editing from {} to {}.",
            source_name, target_name
        );
        let user = format!(
            "Edit the translated SRT file, taking the expert suggestions into \
             account. Keep every index line and every timestamp line exactly as \
             given, keep the same number of lines, and reply with the full SRT \
             file and nothing else.\n\n\
             <SOURCE_TEXT>\n{}\n</SOURCE_TEXT>\n\n<TRANSLATION>\n{}\n</TRANSLATION>\n\n\
             <EXPERT_SUGGESTIONS>\n{}\n</EXPERT_SUGGESTIONS>",
            source_text, draft, suggestions
        );
        (system, user)
    }

    /// Run the reflect-then-improve pass over a draft translation
    async fn refine(
        &self,
        source_name: &str,
        target_name: &str,
        source_text: &str,
        draft: &str,
    ) -> Result<String, ProviderError> {
        let (system, user) = self.reflection_prompts(source_name, target_name, source_text, draft);
        let suggestions = self
            .client
            .chat(&self.config.model, self.config.temperature, &system, &user)
            .await?;

        let (system, user) =
            self.improvement_prompts(source_name, target_name, source_text, draft, &suggestions);
        self.client
            .chat(&self.config.model, self.config.temperature, &system, &user)
            .await
    }

    /// Translate an SRT document, keeping its shape intact.
    ///
    /// Each attempt is a draft translation followed by a reflect-then-improve
    /// editing pass; a failed editing pass keeps the draft. The final reply
    /// is checked against the original line count and timeline. A reply that
    /// drops, adds, or merges lines, or rewrites timestamps, is rejected and
    /// the attempt is retried up to the configured bound, with a backoff
    /// sleep between attempts. Returns an error once all attempts are
    /// exhausted so the caller can fall back to the untranslated file.
    pub async fn translate_srt(
        &self,
        srt_content: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let source_name = get_language_name(source_language)?;
        let target_name = get_language_name(target_language)?;
        let system_prompt = self.system_prompt(&source_name, &target_name);
        let expected_lines = srt_content.trim().lines().count();
        let attempts = self.config.retry_count.max(1);

        let mut last_error = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                let backoff = Duration::from_millis(self.config.retry_backoff_ms * (attempt as u64 - 1));
                debug!("Retrying translation in {:?} (attempt {}/{})", backoff, attempt, attempts);
                tokio::time::sleep(backoff).await;
            }

            let reply = match self
                .client
                .chat(
                    &self.config.model,
                    self.config.temperature,
                    &system_prompt,
                    srt_content,
                )
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Translation request failed on attempt {}: {}", attempt, e);
                    last_error = Some(anyhow!("{}", e));
                    continue;
                }
            };

            let mut candidate = strip_code_fences(&reply);
            if candidate.trim().is_empty() {
                warn!("Translation attempt {} returned an empty reply", attempt);
                last_error = Some(anyhow!("empty translation reply"));
                continue;
            }

            match self
                .refine(&source_name, &target_name, srt_content, &candidate)
                .await
            {
                Ok(improved) => {
                    let improved = strip_code_fences(&improved);
                    if improved.trim().is_empty() {
                        warn!("Editing pass returned an empty reply, keeping the draft");
                    } else {
                        candidate = improved;
                    }
                }
                Err(e) => {
                    warn!("Editing pass failed, keeping the draft translation: {}", e);
                }
            }

            if candidate.trim().lines().count() != expected_lines {
                warn!("Translation attempt {} altered the line count", attempt);
                last_error = Some(anyhow!("translated file does not match the original line count"));
                continue;
            }

            if !timelines_match(srt_content, &candidate) {
                warn!("Translation attempt {} altered the subtitle timeline", attempt);
                last_error = Some(anyhow!("translated file does not match the original timeline"));
                continue;
            }

            return Ok(candidate);
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Translation failed with no attempts made")))
    }
}

/// Strip a Markdown code fence if the model wrapped its reply in one
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop an optional language tag on the opening fence line
        let body = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        return body.trim_end_matches('`').trim().to_string();
    }
    trimmed.to_string()
}
