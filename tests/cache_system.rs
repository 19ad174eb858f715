//! 边缘缓存集成测试
//!
//! 网关与内存缓存协同：命中、规范键、过期与并发冷启动

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_LANGUAGE, ETAG, HOST, SET_COOKIE};
use reqwest::Method;

use edge_translator::gateway::{GatewayOutcome, PassReason};
use edge_translator::network::ProxyRequest;
use edge_translator::translation::EdgeCache;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{body_text, html_response, page, test_config, StubOrigin, StubTranslator, TestGateway};

fn request(path_and_query: &str) -> ProxyRequest {
    ProxyRequest::get(path_and_query).with_header(HOST, "site.example")
}

fn gateway_for(body: &str) -> TestGateway {
    TestGateway::new(StubOrigin::html(body), StubTranslator::new())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_request_is_served_from_cache() {
    let t = gateway_for(&page("<p>Welcome</p>"));

    let first = t.gateway.handle(request("/about?lang=en")).await;
    assert_eq!(
        first.outcome,
        GatewayOutcome::Transformed {
            cache_written: true
        }
    );
    assert!(body_text(&first.response).contains("[en] Welcome"));

    let second = t.gateway.handle(request("/about?lang=en")).await;
    assert_eq!(second.outcome, GatewayOutcome::CacheHit);
    assert_eq!(second.response, first.response, "cache hit returns the stored response verbatim");

    assert_eq!(t.origin.fetches(), 1);
    assert_eq!(t.translator.calls(), 1);
    assert_eq!(t.cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_equivalent_urls_share_an_entry() {
    let t = gateway_for(&page("<p>Listing</p>"));

    t.gateway.handle(request("/list?b=2&a=1&lang=en")).await;
    let again = t.gateway.handle(request("/list?a=1&LANG=EN&b=2#top")).await;

    assert_eq!(again.outcome, GatewayOutcome::CacheHit);
    assert_eq!(t.origin.fetches(), 1);

    let other = t.gateway.handle(request("/list?a=1&b=3&lang=en")).await;
    assert!(matches!(other.outcome, GatewayOutcome::Transformed { .. }));
    assert_eq!(t.cache.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cache_hit_never_replays_set_cookie() {
    let mut origin = html_response(&page("<p>Your account</p>"));
    origin
        .headers
        .insert(SET_COOKIE, "session=user-a-secret; HttpOnly".parse().unwrap());
    let t = TestGateway::new(StubOrigin::with_response(origin), StubTranslator::new());

    let first = t.gateway.handle(request("/account?lang=en")).await;
    assert!(matches!(first.outcome, GatewayOutcome::Transformed { .. }));
    assert_eq!(
        first.response.headers[SET_COOKIE], "session=user-a-secret; HttpOnly",
        "the visitor who triggered the fetch still gets their cookie"
    );

    let second = t.gateway.handle(request("/account?lang=en")).await;
    assert_eq!(second.outcome, GatewayOutcome::CacheHit);
    assert!(
        second.response.headers.get(SET_COOKIE).is_none(),
        "cached responses must not carry another visitor's cookie"
    );
    assert_eq!(second.response.body, first.response.body);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transformed_response_headers() {
    let mut origin = html_response(&page("<p>Hello</p>"));
    origin
        .headers
        .insert(ETAG, "\"abc\"".parse().unwrap());
    origin
        .headers
        .insert(CACHE_CONTROL, "no-cache".parse().unwrap());
    let t = TestGateway::new(StubOrigin::with_response(origin), StubTranslator::new());

    let response = t.gateway.handle(request("/?lang=en")).await.response;

    assert_eq!(response.headers[CONTENT_LANGUAGE], "en");
    assert_eq!(response.headers[CACHE_CONTROL], "public, max-age=3600");
    assert!(response.headers.get(ETAG).is_none());
    assert!(response.is_html());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_untranslated_requests_are_not_cached() {
    let html = page("<p>你好</p>");
    let t = gateway_for(&html);

    let default = t.gateway.handle(request("/about")).await;
    assert_eq!(
        default.outcome,
        GatewayOutcome::PassThrough(PassReason::DefaultLanguage)
    );
    assert_eq!(body_text(&default.response), html);

    let unsupported = t.gateway.handle(request("/about?lang=fr")).await;
    assert_eq!(
        unsupported.outcome,
        GatewayOutcome::PassThrough(PassReason::UnsupportedLanguage("fr".to_string()))
    );

    let mut post = request("/about?lang=en");
    post.method = Method::POST;
    let post = t.gateway.handle(post).await;
    assert_eq!(
        post.outcome,
        GatewayOutcome::PassThrough(PassReason::Method(Method::POST))
    );

    let asset = t.gateway.handle(request("/logo.png?lang=en")).await;
    assert_eq!(asset.outcome, GatewayOutcome::PassThrough(PassReason::NotHtmlRequest));

    assert!(t.cache.is_empty());
    assert_eq!(t.translator.calls(), 0);
    assert_eq!(t.origin.fetches(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_path_prefix_selects_language() {
    let t = gateway_for(&page("<p>Welcome</p>"));

    let response = t.gateway.handle(request("/en/about")).await;
    assert!(matches!(response.outcome, GatewayOutcome::Transformed { .. }));
    assert_eq!(t.origin.paths(), vec!["/en/about".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entries_expire() {
    let mut config = test_config();
    config.cache.max_age_secs = 1;
    let t = TestGateway::with_config(
        StubOrigin::html(&page("<p>Welcome</p>")),
        StubTranslator::new(),
        config,
    );

    t.gateway.handle(request("/?lang=en")).await;
    assert_eq!(t.gateway.handle(request("/?lang=en")).await.outcome, GatewayOutcome::CacheHit);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let after = t.gateway.handle(request("/?lang=en")).await;
    assert!(matches!(after.outcome, GatewayOutcome::Transformed { .. }));
    assert_eq!(t.origin.fetches(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_cold_requests_agree() {
    let t = gateway_for(&page("<h1>Title</h1><p>Body</p>"));

    let (a, b) = tokio::join!(
        t.gateway.handle(request("/news?lang=en")),
        t.gateway.handle(request("/news?lang=en"))
    );

    assert_eq!(a.response.body, b.response.body);
    assert_eq!(t.cache.len(), 1);

    let cached = t
        .cache
        .lookup("http://site.example/news?lang=en")
        .await
        .expect("entry stored under the canonical key");
    assert_eq!(cached.body, a.response.body);
}
