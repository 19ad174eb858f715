//! 翻译服务核心实现
//!
//! 串起整条管道：解析 → 收集 → 去重分批 → 并发翻译各批次 → 回写 → 序列化。
//! 同一请求内各阶段严格顺序执行；批次之间可以并发，结果按批次序号重新拼接。
//!
//! 文档流程持有 `RcDom`（非 `Send`），因此 [`TranslationService::translate_document`]
//! 返回的 future 也不是 `Send`，调用方需要在阻塞线程上 `block_on` 它。

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::parsers::html::html_to_dom;
use crate::translation::config::TranslationConfig;
use crate::translation::core::client::{GoogleTranslateClient, Translator};
use crate::translation::error::{helpers::validation_error, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    rewrite_document, Batch, BatchPlan, RewriteStats, TextCollector, TextFilter,
};

/// 一次文档翻译的结果
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    /// 重新序列化后的文档（按原字符集编码）
    pub body: Vec<u8>,
    /// 可翻译文本项数量
    pub units: usize,
    /// 去重后的文本数量
    pub unique_texts: usize,
    /// 外部请求次数
    pub batches: usize,
    pub rewrite: RewriteStats,
}

/// 服务运行统计信息
#[derive(Debug, Default)]
pub struct ServiceStats {
    documents_translated: AtomicUsize,
    texts_collected: AtomicUsize,
    batches_sent: AtomicUsize,
    batch_failures: AtomicUsize,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatsSnapshot {
    pub documents_translated: usize,
    pub texts_collected: usize,
    pub batches_sent: usize,
    pub batch_failures: usize,
}

impl ServiceStats {
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            documents_translated: self.documents_translated.load(Ordering::Relaxed),
            texts_collected: self.texts_collected.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
        }
    }
}

/// 统一的翻译服务
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    filter: TextFilter,
    max_batch_size: usize,
    max_concurrent_batches: usize,
    stats: ServiceStats,
}

impl TranslationService {
    /// 使用给定的翻译客户端创建服务
    pub fn new(translator: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        Self {
            translator,
            filter: TextFilter::new(&config.filter),
            max_batch_size: config.translation.max_batch_size,
            max_concurrent_batches: config.translation.max_concurrent_batches.max(1),
            stats: ServiceStats::default(),
        }
    }

    /// 使用 Google Translate 客户端创建服务，未配置凭据时返回 `MissingCredential`
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = GoogleTranslateClient::from_config(&config.translation)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.stats.snapshot()
    }

    /// 翻译一份 HTML 文档
    ///
    /// 任一批次失败即整体失败，不会产出半翻译的文档。
    pub async fn translate_document(
        &self,
        html: &[u8],
        document_encoding: &str,
        target_lang: &str,
    ) -> TranslationResult<TranslatedDocument> {
        let start_time = Instant::now();

        let dom = html_to_dom(html, document_encoding)?;
        let mut collector = TextCollector::new(self.filter.clone());
        let collected = collector.collect(&dom.document);
        tracing::debug!("文本收集: {:?}", collector.stats());
        self.stats
            .texts_collected
            .fetch_add(collected.len(), Ordering::Relaxed);

        let plan = BatchPlan::from_units(collected.units(), self.max_batch_size);
        let translations = self.translate_plan(&plan, target_lang).await?;

        let (body, rewrite) = rewrite_document(
            &dom,
            &collected,
            &plan,
            &translations,
            target_lang,
            document_encoding,
        )?;

        self.stats
            .documents_translated
            .fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            "文档翻译完成: {} 个文本项, {} 条唯一文本, {} 个批次, 耗时 {:?}",
            collected.len(),
            plan.unique_texts().len(),
            plan.batch_count(),
            start_time.elapsed()
        );

        Ok(TranslatedDocument {
            body,
            units: collected.len(),
            unique_texts: plan.unique_texts().len(),
            batches: plan.batch_count(),
            rewrite,
        })
    }

    /// 翻译计划中的全部唯一文本
    ///
    /// 返回值与 `plan.unique_texts()` 按位置对齐；空译文记为 `None`。
    pub async fn translate_plan(
        &self,
        plan: &BatchPlan,
        target_lang: &str,
    ) -> TranslationResult<Vec<Option<String>>> {
        if target_lang.trim().is_empty() {
            return Err(validation_error("目标语言不能为空"));
        }
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let batch_futures: Vec<_> = plan
            .batches()
            .map(|batch| self.translate_one(batch, target_lang))
            .collect();
        let per_batch: Vec<Vec<String>> = stream::iter(batch_futures)
            .buffered(self.max_concurrent_batches)
            .try_collect()
            .await?;

        Ok(per_batch
            .into_iter()
            .flatten()
            .map(|text| if text.is_empty() { None } else { Some(text) })
            .collect())
    }

    /// 发送单个批次并校验返回条数
    async fn translate_one(
        &self,
        batch: Batch<'_>,
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        self.stats.batches_sent.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("edge_translate_batches_total").increment(1);

        let translated = self
            .translator
            .translate_batch(batch.texts, target_lang)
            .await
            .and_then(|translated| {
                if translated.len() == batch.len() {
                    Ok(translated)
                } else {
                    Err(TranslationError::ResultCountMismatch {
                        expected: batch.len(),
                        actual: translated.len(),
                    })
                }
            })
            .map_err(|e| {
                self.stats.batch_failures.fetch_add(1, Ordering::Relaxed);
                e.into_batch_failure(batch.index)
            })?;

        tracing::debug!("第 {} 批翻译完成: {} 条", batch.index, batch.len());
        Ok(translated)
    }

    /// 翻译独立文本列表（JSON 接口使用）
    ///
    /// 输入先去除首尾空白；空文本原样返回空串且不发送，重复文本只翻译一次。
    pub async fn translate_texts(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        let trimmed: Vec<&str> = texts.iter().map(|text| text.trim()).collect();
        let plan = BatchPlan::new(
            trimmed.iter().copied().filter(|text| !text.is_empty()),
            self.max_batch_size,
        );
        let translations = self.translate_plan(&plan, target_lang).await?;

        let mut keys = plan.unit_keys().iter();
        let mut output = Vec::with_capacity(trimmed.len());
        for text in trimmed {
            if text.is_empty() {
                output.push(String::new());
                continue;
            }
            let translated = keys
                .next()
                .and_then(|&key| translations.get(key))
                .and_then(|t| t.clone())
                .unwrap_or_else(|| text.to_string());
            output.push(translated);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 把文本转成大写并记录每次调用的批次
    #[derive(Default)]
    struct UppercaseTranslator {
        calls: Mutex<Vec<Vec<String>>>,
        drop_last: bool,
    }

    #[async_trait]
    impl Translator for UppercaseTranslator {
        async fn translate_batch(
            &self,
            texts: &[String],
            _target_lang: &str,
        ) -> TranslationResult<Vec<String>> {
            self.calls.lock().unwrap().push(texts.to_vec());
            let mut out: Vec<String> = texts.iter().map(|t| t.to_uppercase()).collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }

        fn provider_name(&self) -> &str {
            "uppercase"
        }
    }

    fn service_with(translator: Arc<UppercaseTranslator>, batch_size: usize) -> TranslationService {
        let mut config = TranslationConfig::default();
        config.translation.max_batch_size = batch_size;
        TranslationService::new(translator, &config)
    }

    #[tokio::test]
    async fn test_translate_texts_dedups_and_skips_empty() {
        let translator = Arc::new(UppercaseTranslator::default());
        let service = service_with(translator.clone(), 80);

        let input = vec![
            " hello ".to_string(),
            "".to_string(),
            "world".to_string(),
            "hello".to_string(),
            "   ".to_string(),
        ];
        let output = service.translate_texts(&input, "en").await.unwrap();

        assert_eq!(output, vec!["HELLO", "", "WORLD", "HELLO", ""]);
        let calls = translator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["hello".to_string(), "world".to_string()]);
    }

    #[tokio::test]
    async fn test_translate_plan_splits_batches_in_order() {
        let translator = Arc::new(UppercaseTranslator::default());
        let service = service_with(translator.clone(), 2);

        let plan = BatchPlan::new(["a", "b", "c", "a", "d", "e"], 2);
        let translations = service.translate_plan(&plan, "en").await.unwrap();

        let expected: Vec<Option<String>> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        assert_eq!(translations, expected);
        assert_eq!(translator.calls.lock().unwrap().len(), 3);
        assert_eq!(service.stats().batches_sent, 3);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_text_translation_future_is_send() {
        let service = service_with(Arc::new(UppercaseTranslator::default()), 2);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let future = service.translate_texts(&texts, "en");
        assert_send(&future);
    }

    #[tokio::test]
    async fn test_blank_target_is_rejected() {
        let translator = Arc::new(UppercaseTranslator::default());
        let service = service_with(translator.clone(), 80);

        let err = service
            .translate_texts(&["hello".to_string()], "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::InvalidInput(_)));
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_result_is_batch_failure() {
        let translator = Arc::new(UppercaseTranslator {
            drop_last: true,
            ..Default::default()
        });
        let service = service_with(translator, 80);

        let plan = BatchPlan::new(["one", "two", "three"], 80);
        let err = service.translate_plan(&plan, "en").await.unwrap_err();

        assert!(matches!(
            err,
            TranslationError::TranslationBatchFailed { batch_index: 0, .. }
        ));
        assert_eq!(service.stats().batch_failures, 1);
    }

    #[tokio::test]
    async fn test_translate_document_end_to_end() {
        let translator = Arc::new(UppercaseTranslator::default());
        let service = service_with(translator, 80);

        let html = b"<html><body><p>Hello <b>world</b></p><pre>keep</pre></body></html>";
        let doc = service.translate_document(html, "utf-8", "en").await.unwrap();
        let out = String::from_utf8(doc.body).unwrap();

        assert!(out.contains("<p>HELLO <b>WORLD</b></p>"), "{}", out);
        assert!(out.contains("<pre>keep</pre>"), "{}", out);
        assert!(out.contains(r#"<html lang="en">"#), "{}", out);
        assert_eq!(doc.units, 2);
        assert_eq!(doc.batches, 1);
        assert_eq!(service.stats().documents_translated, 1);
    }

    #[tokio::test]
    async fn test_document_without_text_makes_no_calls() {
        let translator = Arc::new(UppercaseTranslator::default());
        let service = service_with(translator.clone(), 80);

        let doc = service
            .translate_document(b"<p>123</p>", "utf-8", "en")
            .await
            .unwrap();

        assert_eq!(doc.batches, 0);
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_config_without_credential() {
        assert!(matches!(
            TranslationService::from_config(&TranslationConfig::default()),
            Err(TranslationError::MissingCredential)
        ));
    }
}
