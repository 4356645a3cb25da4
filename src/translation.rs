use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::warn;

/// How the first letter of a translation is adjusted relative to the source text.
///
/// Game text is often extracted from the middle of a sentence, and some
/// providers capitalize every fragment they return. The policy is chosen per
/// provider rather than applied universally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CasingPolicy {
    /// Return the provider output unchanged
    #[default]
    Preserve,
    /// If the source starts with a lowercase letter and the translation starts
    /// with a letter, lowercase the translation's first letter
    LowercaseContinuation,
}

impl CasingPolicy {
    pub fn apply(self, original: &str, translated: String) -> String {
        if self == CasingPolicy::Preserve {
            return translated;
        }

        let starts_lowercase = original
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() && c.is_lowercase());
        if !starts_lowercase {
            return translated;
        }

        let mut chars = translated.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() => first.to_lowercase().chain(chars).collect(),
            _ => translated,
        }
    }
}

/// A single external "translate this string" call.
pub trait TranslationProvider: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>>;

    /// Casing adjustment this provider's output needs
    fn casing_policy(&self) -> CasingPolicy {
        CasingPolicy::Preserve
    }
}

/// Client for the public Google Translate web endpoint (`client=gtx`).
pub struct GoogleWebProvider {
    client: reqwest::Client,
    api_url: String,
}

impl GoogleWebProvider {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("Failed to send translation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Translation API error ({}): {}", status, body);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse translation response")?;

        join_segments(&body)
    }
}

impl TranslationProvider for GoogleWebProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.request(text, source, target))
    }

    fn casing_policy(&self) -> CasingPolicy {
        CasingPolicy::LowercaseContinuation
    }
}

/// The web endpoint answers with `[[["segment", "source", ...], ...], ...]`;
/// the translation is the concatenation of every segment's first element.
fn join_segments(body: &serde_json::Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(|s| s.as_array())
        .context("Translation response contained no segments")?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
        .collect();

    if translated.is_empty() {
        anyhow::bail!("Translation response contained an empty translation");
    }

    Ok(translated)
}

/// Outcome of translating one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Translated text, or the original text when `succeeded` is false
    pub text: String,
    pub succeeded: bool,
}

/// Retrying, casing-aware wrapper around a [`TranslationProvider`].
#[derive(Clone)]
pub struct TextTranslator {
    provider: Arc<dyn TranslationProvider>,
    retry: RetryConfig,
    casing: CasingPolicy,
}

impl TextTranslator {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        let casing = provider.casing_policy();
        Self {
            provider,
            retry: RetryConfig::translation(),
            casing,
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_casing_policy(mut self, casing: CasingPolicy) -> Self {
        self.casing = casing;
        self
    }

    /// Translate one string. Never fails: after the last attempt the original
    /// text is returned with `succeeded = false`.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Translation {
        if text.trim().is_empty() {
            return Translation {
                text: text.to_string(),
                succeeded: true,
            };
        }

        let result = with_retry(&self.retry, "Translate string", || {
            self.provider.translate(text, source, target)
        })
        .await;

        match result {
            Ok(translated) => Translation {
                text: self.casing.apply(text, translated),
                succeeded: true,
            },
            Err(e) => {
                warn!(
                    "Translation {} -> {} gave up for {:?}: {:#}",
                    source, target, text, e
                );
                Translation {
                    text: text.to_string(),
                    succeeded: false,
                }
            }
        }
    }
}
