//! 翻译客户端
//!
//! [`Translator`] 是翻译服务的抽象：输入一批字符串，返回等长、同序的译文。
//! [`GoogleTranslateClient`] 对接 Google Translate v2（`q` / `target` / `format=text`）。
//! 客户端本身不重试，一个批次对应一次外部请求。

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::config::ApiConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译服务抽象
#[async_trait]
pub trait Translator: Send + Sync {
    /// 翻译一批文本，返回结果必须与输入等长且同序
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>>;

    /// 服务名称（用于日志）
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct GoogleRequest<'a> {
    q: &'a [String],
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Deserialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Google Translate v2 客户端
#[derive(Clone)]
pub struct GoogleTranslateClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GoogleTranslateClient {
    /// 使用显式凭据创建客户端
    pub fn new(api_key: impl Into<String>, config: &ApiConfig) -> TranslationResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TranslationError::MissingCredential);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    /// 从配置创建，未配置凭据时返回 `MissingCredential`
    pub fn from_config(config: &ApiConfig) -> TranslationResult<Self> {
        let api_key = config
            .credential()
            .ok_or(TranslationError::MissingCredential)?;
        Self::new(api_key, config)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for GoogleTranslateClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTranslateClient")
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = GoogleRequest {
            q: texts,
            target: target_lang,
            format: "text",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TranslationError::TranslationServiceError(format!(
                "HTTP {}: {}",
                status,
                truncate(&detail, 200)
            )));
        }

        let parsed: GoogleResponse = response.json().await?;
        let translations: Vec<String> = parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect();

        if translations.len() != texts.len() {
            return Err(TranslationError::ResultCountMismatch {
                expected: texts.len(),
                actual: translations.len(),
            });
        }

        Ok(translations)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
