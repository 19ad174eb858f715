/// HTML 文档的 MIME 类型
pub const HTML_MIME_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// 检查 Content-Type 是否为 HTML
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_MIME_TYPES.contains(&mime.as_str())
}

/// 从 Content-Type 中提取 charset 参数
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if value.is_empty() {
                None
            } else {
                Some(value.to_ascii_lowercase())
            }
        } else {
            None
        }
    })
}
