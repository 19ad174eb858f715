//! 源站访问
//!
//! [`Origin`] 抽象“把请求转发给源站并拿回完整响应”。[`HttpOrigin`] 用 reqwest
//! 转发到配置的上游地址：不跟随重定向，剥离逐跳头部，响应体完整读入内存。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::parsers::html::{charset_from_content_type, is_html_content_type};

/// 逐跳头部，不能跨代理转发
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// 源站错误
#[derive(Error, Debug)]
pub enum OriginError {
    #[error("源站地址无效: {0}")]
    InvalidBaseUrl(String),

    #[error("请求路径无效: {0}")]
    InvalidPath(String),

    #[error("源站不可达: {0}")]
    Unreachable(String),

    #[error("读取源站响应失败: {0}")]
    Body(String),
}

impl From<reqwest::Error> for OriginError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_body() || error.is_decode() {
            OriginError::Body(error.to_string())
        } else {
            OriginError::Unreachable(error.to_string())
        }
    }
}

/// 转发给源站的请求
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// 路径与查询串，如 `/about?lang=en`
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProxyRequest {
    /// 无请求体的 GET 请求
    pub fn get(path_and_query: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// 去掉查询串后的路径
    pub fn path(&self) -> &str {
        let without_fragment = self
            .path_and_query
            .split_once('#')
            .map_or(self.path_and_query.as_str(), |(head, _)| head);
        without_fragment
            .split_once('?')
            .map_or(without_fragment, |(path, _)| path)
    }

    /// 查询串（不含 `?`）
    pub fn query(&self) -> Option<&str> {
        let without_fragment = self
            .path_and_query
            .split_once('#')
            .map_or(self.path_and_query.as_str(), |(head, _)| head);
        without_fragment.split_once('?').map(|(_, query)| query)
    }
}

/// 源站响应
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn is_html(&self) -> bool {
        self.content_type().map(is_html_content_type).unwrap_or(false)
    }

    /// 声明的字符集，缺省为 UTF-8
    pub fn charset(&self) -> String {
        self.content_type()
            .and_then(charset_from_content_type)
            .unwrap_or_else(|| "utf-8".to_string())
    }
}

/// 源站抽象
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, OriginError>;
}

/// 剥离逐跳头部以及 `Connection` 中点名的头部
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let connection_tokens: Vec<String> = headers
        .get_all(reqwest::header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let lower = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&lower) || connection_tokens.iter().any(|t| t == lower) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// 基于 reqwest 的 HTTP 源站
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    base: Url,
    client: reqwest::Client,
}

impl HttpOrigin {
    /// 创建源站客户端，`base_url` 必须是 http(s) 地址
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OriginError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| OriginError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(OriginError::InvalidBaseUrl(format!(
                "{}: 仅支持 http/https",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| OriginError::InvalidBaseUrl(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// 把请求路径拼接到上游地址
    pub fn upstream_url(&self, path_and_query: &str) -> Result<Url, OriginError> {
        if !path_and_query.starts_with('/') {
            return Err(OriginError::InvalidPath(path_and_query.to_string()));
        }
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path_and_query))
            .map_err(|e| OriginError::InvalidPath(format!("{}: {}", path_and_query, e)))
    }

    fn forward_headers(request: &ProxyRequest) -> HeaderMap {
        let mut headers = strip_hop_by_hop(&request.headers);
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);
        // 源站返回的压缩体由客户端自动解压，这里不透传客户端的编码偏好
        headers.remove(reqwest::header::ACCEPT_ENCODING);

        if let Some(host) = request.header_str(&HOST) {
            if let Ok(value) = HeaderValue::from_str(host) {
                headers.insert(HeaderName::from_static("x-forwarded-host"), value);
            }
        }
        headers
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, OriginError> {
        let url = self.upstream_url(&request.path_and_query)?;
        tracing::debug!("转发到源站: {} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(Self::forward_headers(request));
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let mut headers = strip_hop_by_hop(response.headers());
        headers.remove(CONTENT_LENGTH);
        let body = response.bytes().await?.to_vec();

        Ok(ProxyResponse::new(status, headers, body))
    }
}
