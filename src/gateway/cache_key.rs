//! 规范缓存键
//!
//! 同一页面、同一目标语言的请求必须落到同一个缓存条目上：
//! 去掉片段，删除所有语言参数（参数名不区分大小写），其余参数按 (名, 值) 排序，
//! 最后追加 `<param>=<target>`。主机名大小写由 URL 解析统一。

use reqwest::header::HOST;
use url::Url;

use crate::network::origin::ProxyRequest;

const FALLBACK_HOST: &str = "localhost";

/// 生成规范缓存键
pub fn canonical_cache_key(request: &ProxyRequest, lang_param: &str, target_lang: &str) -> String {
    let scheme = match request.header_str(&reqwest::header::HeaderName::from_static("x-forwarded-proto")) {
        Some(proto) if proto.trim().eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    let host = request
        .header_str(&HOST)
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or(FALLBACK_HOST);

    let parsed = Url::parse(&format!("{}://{}{}", scheme, host, request.path_and_query))
        .or_else(|_| {
            Url::parse(&format!(
                "{}://{}{}",
                scheme, FALLBACK_HOST, request.path_and_query
            ))
        });
    let Ok(mut url) = parsed else {
        return format!(
            "{}://{}{}?{}={}",
            scheme,
            FALLBACK_HOST,
            request.path(),
            lang_param,
            target_lang
        );
    };

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(lang_param))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    pairs.sort();

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in &pairs {
            query.append_pair(name, value);
        }
        query.append_pair(lang_param, target_lang);
    }

    url.to_string()
}
