// 集成测试公共模块
//
// 提供测试替身（翻译服务、源站、缓存）和 HTML 辅助函数

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use edge_translator::gateway::Gateway;
use edge_translator::network::{Origin, OriginError, ProxyRequest, ProxyResponse};
use edge_translator::translation::error::{TranslationError, TranslationResult};
use edge_translator::translation::{
    CachedResponse, EdgeCache, MemoryEdgeCache, TranslationConfig, TranslationService, Translator,
};

/// 翻译替身的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    /// 正常返回
    Normal,
    /// 少返回一条
    ShortResult,
    /// 直接报错
    Fail,
}

/// 翻译替身：优先查映射表，否则在文本前加 `[lang] `
pub struct StubTranslator {
    dictionary: HashMap<String, String>,
    mode: StubMode,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl StubTranslator {
    pub fn new() -> Self {
        Self::with_mode(StubMode::Normal)
    }

    pub fn with_mode(mode: StubMode) -> Self {
        Self {
            dictionary: HashMap::new(),
            mode,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dictionary(pairs: &[(&str, &str)]) -> Self {
        let mut stub = Self::new();
        stub.dictionary = pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        stub
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn translate_one(&self, text: &str, target_lang: &str) -> String {
        self.dictionary
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_lang, text))
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(texts.to_vec());

        match self.mode {
            StubMode::Fail => Err(TranslationError::TranslationServiceError(
                "HTTP 503 Service Unavailable".to_string(),
            )),
            StubMode::ShortResult => Ok(texts
                .iter()
                .skip(1)
                .map(|text| self.translate_one(text, target_lang))
                .collect()),
            StubMode::Normal => Ok(texts
                .iter()
                .map(|text| self.translate_one(text, target_lang))
                .collect()),
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

/// 源站替身：对任何路径返回固定响应
pub struct StubOrigin {
    response: Option<ProxyResponse>,
    fetches: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl StubOrigin {
    pub fn html(body: &str) -> Self {
        Self::with_response(html_response(body))
    }

    pub fn with_response(response: ProxyResponse) -> Self {
        Self {
            response: Some(response),
            fetches: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// 始终不可达
    pub fn unreachable() -> Self {
        Self {
            response: None,
            fetches: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Origin for StubOrigin {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, OriginError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.paths
            .lock()
            .unwrap()
            .push(request.path_and_query.clone());

        self.response
            .clone()
            .ok_or_else(|| OriginError::Unreachable("connection refused".to_string()))
    }
}

/// 查询永远未命中、写入永远失败的缓存
#[derive(Default)]
pub struct FailingCache {
    pub writes: AtomicUsize,
}

#[async_trait]
impl EdgeCache for FailingCache {
    async fn lookup(&self, _key: &str) -> Option<CachedResponse> {
        None
    }

    async fn put(&self, _key: &str, _response: CachedResponse) -> TranslationResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(TranslationError::CacheWriteFailed("storage full".to_string()))
    }
}

/// 默认语言 zh，可翻译 en
pub fn test_config() -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.languages.default = "zh".to_string();
    config.languages.alternates = vec!["en".to_string()];
    config
}

pub fn html_response(body: &str) -> ProxyResponse {
    response_with_type(StatusCode::OK, "text/html; charset=utf-8", body)
}

pub fn response_with_type(status: StatusCode, content_type: &str, body: &str) -> ProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
    ProxyResponse::new(status, headers, body.as_bytes().to_vec())
}

/// 组装好的网关及其替身
pub struct TestGateway {
    pub gateway: Gateway,
    pub translator: Arc<StubTranslator>,
    pub origin: Arc<StubOrigin>,
    pub cache: Arc<MemoryEdgeCache>,
}

impl TestGateway {
    pub fn new(origin: StubOrigin, translator: StubTranslator) -> Self {
        Self::with_config(origin, translator, test_config())
    }

    pub fn with_config(
        origin: StubOrigin,
        translator: StubTranslator,
        config: TranslationConfig,
    ) -> Self {
        let translator = Arc::new(translator);
        let origin = Arc::new(origin);
        let cache = Arc::new(MemoryEdgeCache::new(&config.cache));
        let service = TranslationService::new(translator.clone(), &config);

        let gateway = Gateway::new(
            &config,
            origin.clone(),
            cache.clone(),
            Some(Arc::new(service)),
        );

        Self {
            gateway,
            translator,
            origin,
            cache,
        }
    }
}

pub fn body_text(response: &ProxyResponse) -> String {
    String::from_utf8_lossy(&response.body).into_owned()
}

/// 最小的合法 HTML 文档
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"zh\"><head><title>Test Page</title></head><body>{}</body></html>",
        body
    )
}
