//! 请求网关与缓存协调
//!
//! 每个请求按固定顺序走一遍状态机：
//!
//! ```text
//! 方法检查 → 语言检查 → HTML 请求检查 → 查缓存 ─命中→ 原样返回
//!                                          └未命中→ 请求源站 → 源站是 2xx HTML？
//!                                                    ├否→ 原样返回（不缓存）
//!                                                    └是→ 翻译 → 写缓存 → 返回译文
//! ```
//!
//! 翻译链路上的任何失败（无凭据、文档错误、批次失败）都回退为源站原文；
//! 只有源站自身不可用时才返回 502。缓存写入失败只记日志，本次响应照常返回。

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{
    HeaderValue, CACHE_CONTROL, CONTENT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, ETAG, SET_COOKIE,
};
use reqwest::{header::HeaderMap, Method, StatusCode};

use crate::gateway::cache_key::canonical_cache_key;
use crate::gateway::language::{LanguageResolver, LanguageSelection};
use crate::network::origin::{Origin, ProxyRequest, ProxyResponse};
use crate::translation::config::TranslationConfig;
use crate::translation::core::{TranslatedDocument, TranslationService};
use crate::translation::error::{helpers::log_error, TranslationError, TranslationResult};
use crate::translation::storage::{CacheStats, CachedResponse, EdgeCache};

/// 不做翻译、直接透传的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassReason {
    /// 非 GET 请求
    Method(Method),
    /// 请求的是源站语言
    DefaultLanguage,
    /// 请求的语言未配置
    UnsupportedLanguage(String),
    /// 请求的不像 HTML 页面
    NotHtmlRequest,
}

/// 源站响应未经修改返回的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmodifiedReason {
    /// 源站返回非 2xx
    Status(StatusCode),
    /// 源站返回的不是 HTML
    NotHtml,
    /// 未配置翻译凭据
    MissingCredential,
    /// 翻译流程失败
    PipelineFailed(TranslationError),
}

/// 网关处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    PassThrough(PassReason),
    CacheHit,
    OriginUnmodified(UnmodifiedReason),
    Transformed { cache_written: bool },
    OriginUnavailable,
}

impl GatewayOutcome {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            GatewayOutcome::PassThrough(_) => "pass_through",
            GatewayOutcome::CacheHit => "cache_hit",
            GatewayOutcome::OriginUnmodified(UnmodifiedReason::PipelineFailed(_)) => "fail_open",
            GatewayOutcome::OriginUnmodified(UnmodifiedReason::MissingCredential) => {
                "missing_credential"
            }
            GatewayOutcome::OriginUnmodified(_) => "origin_unmodified",
            GatewayOutcome::Transformed { .. } => "transformed",
            GatewayOutcome::OriginUnavailable => "origin_unavailable",
        }
    }
}

/// 网关响应
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub response: ProxyResponse,
    pub outcome: GatewayOutcome,
}

impl GatewayResponse {
    fn new(response: ProxyResponse, outcome: GatewayOutcome) -> Self {
        Self { response, outcome }
    }
}

impl From<CachedResponse> for ProxyResponse {
    fn from(cached: CachedResponse) -> Self {
        ProxyResponse::new(cached.status, cached.headers, cached.body)
    }
}

impl From<ProxyResponse> for CachedResponse {
    fn from(response: ProxyResponse) -> Self {
        CachedResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

/// 写入共享缓存的副本，去掉只属于当前访客的 `Set-Cookie`
fn shared_copy(response: &ProxyResponse) -> CachedResponse {
    let mut cached: CachedResponse = response.clone().into();
    cached.headers.remove(SET_COOKIE);
    cached
}

/// 请求是否像是在请求 HTML 页面
pub fn wants_html(request: &ProxyRequest) -> bool {
    let accepts_html = request
        .header_str(&reqwest::header::ACCEPT)
        .map(|accept| accept.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);
    if accepts_html {
        return true;
    }

    let path = request.path();
    if path.ends_with('/') {
        return true;
    }
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    !last_segment.contains('.')
}

/// 请求网关
pub struct Gateway {
    origin: Arc<dyn Origin>,
    cache: Arc<dyn EdgeCache>,
    service: Option<Arc<TranslationService>>,
    languages: LanguageResolver,
    max_age: Duration,
}

impl Gateway {
    /// 组装网关；`service` 为 `None` 表示未配置翻译凭据
    pub fn new(
        config: &TranslationConfig,
        origin: Arc<dyn Origin>,
        cache: Arc<dyn EdgeCache>,
        service: Option<Arc<TranslationService>>,
    ) -> Self {
        Self {
            origin,
            cache,
            service,
            languages: LanguageResolver::new(&config.languages),
            max_age: config.cache.max_age(),
        }
    }

    /// 按配置创建 Google 翻译服务；凭据缺失时记录一次警告，网关照常透传
    pub fn from_config(
        config: &TranslationConfig,
        origin: Arc<dyn Origin>,
        cache: Arc<dyn EdgeCache>,
    ) -> TranslationResult<Self> {
        let service = match TranslationService::from_config(config) {
            Ok(service) => Some(Arc::new(service)),
            Err(TranslationError::MissingCredential) => {
                tracing::warn!("未配置翻译凭据，所有页面将以原文返回");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self::new(config, origin, cache, service))
    }

    pub fn has_translator(&self) -> bool {
        self.service.is_some()
    }

    pub fn translation_service(&self) -> Option<&Arc<TranslationService>> {
        self.service.as_ref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }

    /// 处理一个请求
    pub async fn handle(&self, request: ProxyRequest) -> GatewayResponse {
        let result = self.process(&request).await;

        metrics::counter!("edge_translate_requests_total", "outcome" => result.outcome.label())
            .increment(1);
        tracing::debug!(
            "{} {} -> {:?}",
            request.method,
            request.path_and_query,
            result.outcome
        );

        result
    }

    async fn process(&self, request: &ProxyRequest) -> GatewayResponse {
        if request.method != Method::GET {
            return self
                .pass_through(request, PassReason::Method(request.method.clone()))
                .await;
        }

        let target = match self.languages.resolve(request) {
            LanguageSelection::Target(lang) => lang,
            LanguageSelection::Default => {
                return self.pass_through(request, PassReason::DefaultLanguage).await;
            }
            LanguageSelection::Unsupported(lang) => {
                return self
                    .pass_through(request, PassReason::UnsupportedLanguage(lang))
                    .await;
            }
        };

        if !wants_html(request) {
            return self.pass_through(request, PassReason::NotHtmlRequest).await;
        }

        let cache_key = canonical_cache_key(request, self.languages.query_param(), &target);
        if let Some(cached) = self.cache.lookup(&cache_key).await {
            tracing::debug!("边缘缓存命中: {}", cache_key);
            return GatewayResponse::new(cached.into(), GatewayOutcome::CacheHit);
        }

        let origin_response = match self.origin.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("源站请求失败: {} ({})", request.path_and_query, e);
                return origin_unavailable();
            }
        };

        if !origin_response.status.is_success() {
            let status = origin_response.status;
            return GatewayResponse::new(
                origin_response,
                GatewayOutcome::OriginUnmodified(UnmodifiedReason::Status(status)),
            );
        }

        if !origin_response.is_html() {
            return GatewayResponse::new(
                origin_response,
                GatewayOutcome::OriginUnmodified(UnmodifiedReason::NotHtml),
            );
        }

        let Some(service) = self.service.clone() else {
            tracing::warn!("未配置翻译凭据，返回原文: {}", request.path_and_query);
            return GatewayResponse::new(
                origin_response,
                GatewayOutcome::OriginUnmodified(UnmodifiedReason::MissingCredential),
            );
        };

        let translated = run_pipeline(
            service,
            origin_response.body.clone(),
            origin_response.charset(),
            target.clone(),
        )
        .await;

        let document = match translated {
            Ok(document) => document,
            Err(e) => {
                log_error(&e);
                tracing::warn!("翻译失败，返回原文: {}", request.path_and_query);
                return GatewayResponse::new(
                    origin_response,
                    GatewayOutcome::OriginUnmodified(UnmodifiedReason::PipelineFailed(e)),
                );
            }
        };

        let response = self.transformed_response(origin_response, document, &target);

        let cache_written = match self.cache.put(&cache_key, shared_copy(&response)).await {
            Ok(()) => {
                tracing::info!("译文已写入边缘缓存: {}", cache_key);
                true
            }
            Err(e) => {
                tracing::warn!("边缘缓存写入失败（本次响应不受影响）: {}", e);
                false
            }
        };

        GatewayResponse::new(response, GatewayOutcome::Transformed { cache_written })
    }

    async fn pass_through(&self, request: &ProxyRequest, reason: PassReason) -> GatewayResponse {
        match self.origin.fetch(request).await {
            Ok(response) => GatewayResponse::new(response, GatewayOutcome::PassThrough(reason)),
            Err(e) => {
                tracing::error!("源站请求失败: {} ({})", request.path_and_query, e);
                origin_unavailable()
            }
        }
    }

    fn transformed_response(
        &self,
        origin: ProxyResponse,
        document: TranslatedDocument,
        target: &str,
    ) -> ProxyResponse {
        let mut headers = origin.headers;
        headers.remove(CONTENT_LENGTH);
        headers.remove(ETAG);

        if let Ok(value) = HeaderValue::from_str(target) {
            headers.insert(CONTENT_LANGUAGE, value);
        }
        if let Ok(value) =
            HeaderValue::from_str(&format!("public, max-age={}", self.max_age.as_secs()))
        {
            headers.insert(CACHE_CONTROL, value);
        }

        ProxyResponse::new(origin.status, headers, document.body)
    }
}

/// 在阻塞线程上跑 DOM 流程（`RcDom` 不是 `Send`），批次请求仍由运行时驱动
async fn run_pipeline(
    service: Arc<TranslationService>,
    body: Vec<u8>,
    charset: String,
    target: String,
) -> TranslationResult<TranslatedDocument> {
    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || {
        handle.block_on(service.translate_document(&body, &charset, &target))
    })
    .await
    .map_err(|e| TranslationError::TranslationServiceError(format!("翻译任务异常终止: {}", e)))?
}

fn origin_unavailable() -> GatewayResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    GatewayResponse::new(
        ProxyResponse::new(
            StatusCode::BAD_GATEWAY,
            headers,
            "Bad Gateway: origin unavailable".as_bytes().to_vec(),
        ),
        GatewayOutcome::OriginUnavailable,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_html() {
        let html = |path: &str| wants_html(&ProxyRequest::get(path));

        assert!(html("/"));
        assert!(html("/docs/"));
        assert!(html("/about"));
        assert!(html("/about?x=a.b"));
        assert!(!html("/logo.png"));
        assert!(!html("/assets/app.js?v=1"));

        let with_accept = ProxyRequest::get("/index.html")
            .with_header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml");
        assert!(wants_html(&with_accept));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(GatewayOutcome::CacheHit.label(), "cache_hit");
        assert_eq!(
            GatewayOutcome::OriginUnmodified(UnmodifiedReason::PipelineFailed(
                TranslationError::MissingCredential
            ))
            .label(),
            "fail_open"
        );
        assert_eq!(
            GatewayOutcome::OriginUnmodified(UnmodifiedReason::NotHtml).label(),
            "origin_unmodified"
        );
        assert_eq!(
            GatewayOutcome::Transformed {
                cache_written: false
            }
            .label(),
            "transformed"
        );
    }

    #[test]
    fn test_origin_unavailable_is_502() {
        let response = origin_unavailable();
        assert_eq!(response.response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.outcome, GatewayOutcome::OriginUnavailable);
    }

    #[test]
    fn test_response_conversions_preserve_fields() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LANGUAGE, HeaderValue::from_static("en"));
        let response = ProxyResponse::new(StatusCode::OK, headers, b"<p>x</p>".to_vec());

        let cached: CachedResponse = response.clone().into();
        let back: ProxyResponse = cached.into();
        assert_eq!(back, response);
    }
}
