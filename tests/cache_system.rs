//! 缓存系统集成测试
//!
//! 验证批次缓存只对完全相同的 (文本, 目标语言) 生效

use page_translator::translation::TranslationClient;
use wiremock::MockServer;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{test_config, MockApi, TEST_API_KEY};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 相同批次只请求一次
#[tokio::test]
async fn test_identical_batch_issues_one_request() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "Hola|||Mundo", 1).await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();
    let batch = texts(&["Hello", "World"]);

    let first = client.translate_batch(TEST_API_KEY, &batch, "Spanish").await.unwrap();
    let second = client.translate_batch(TEST_API_KEY, &batch, "Spanish").await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.translations, second.translations);
    assert_eq!(client.cache().get_stats().cache_hits, 1);

    println!("✅ Identical batch served from cache");
}

/// 目标语言或文本不同都不会命中
#[tokio::test]
async fn test_cache_key_covers_language_and_texts() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "Hola|||Mundo", 3).await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();

    client
        .translate_batch(TEST_API_KEY, &texts(&["Hello", "World"]), "Spanish")
        .await
        .unwrap();
    client
        .translate_batch(TEST_API_KEY, &texts(&["Hello", "World"]), "Catalan")
        .await
        .unwrap();
    client
        .translate_batch(TEST_API_KEY, &texts(&["Hello", "Earth"]), "Spanish")
        .await
        .unwrap();

    assert_eq!(client.get_stats().cache_hits(), 0);
    assert_eq!(client.cache().len(), 3);

    println!("✅ Cache key isolation passed");
}

/// 单条文本里含有分隔符时不会命中多条批次的缓存
#[tokio::test]
async fn test_delimiter_in_text_misses_multi_item_entry() {
    let server = MockServer::start().await;
    MockApi::mount_reply_for(&server, "Hello", "Hola|||Mundo").await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();
    client
        .translate_batch(TEST_API_KEY, &texts(&["Hello", "World"]), "Spanish")
        .await
        .unwrap();

    let single = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello|||World"]), "Spanish")
        .await
        .unwrap();

    assert!(!single.from_cache);
    assert_eq!(single.translations.len(), 1);
    assert_eq!(client.get_stats().cache_hits(), 0);

    println!("✅ Delimiter-bearing text kept apart in the cache");
}

/// 对齐失败的结果不缓存
#[tokio::test]
async fn test_fallback_results_are_not_cached() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "Hola y Mundo", 2).await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();
    let batch = texts(&["Hello", "World"]);

    let first = client.translate_batch(TEST_API_KEY, &batch, "Spanish").await.unwrap();
    assert!(first.method.is_fallback());
    assert_eq!(first.translations, batch);

    client.translate_batch(TEST_API_KEY, &batch, "Spanish").await.unwrap();
    assert!(client.cache().is_empty());
    assert_eq!(client.get_stats().fallbacks(), 2);

    println!("✅ Fallbacks bypass the cache");
}

/// 关闭缓存后每次都请求
#[tokio::test]
async fn test_disabled_cache_always_requests() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "Hola", 2).await;

    let mut config = test_config(&server);
    config.cache_enabled = false;
    let client = TranslationClient::from_config(&config).unwrap();

    for _ in 0..2 {
        let result = client
            .translate_text(TEST_API_KEY, " Hello ", "Spanish")
            .await
            .unwrap();
        assert_eq!(result, "Hola");
    }

    println!("✅ Disabled cache passed");
}

/// 容量满后淘汰最久未用的批次
#[tokio::test]
async fn test_bounded_cache_evicts_oldest_batch() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "Hola", 4).await;

    let mut config = test_config(&server);
    config.cache_capacity = 2;
    let client = TranslationClient::from_config(&config).unwrap();

    for word in ["one", "two", "three"] {
        client.translate_text(TEST_API_KEY, word, "Spanish").await.unwrap();
    }
    // "one" 已被淘汰，需要重新请求
    client.translate_text(TEST_API_KEY, "one", "Spanish").await.unwrap();

    let stats = client.cache().get_stats();
    assert_eq!(client.cache().len(), 2);
    assert!(stats.evictions >= 1);

    println!("✅ LRU eviction passed");
}
