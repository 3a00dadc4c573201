//! 错误处理集成测试
//!
//! 验证传输错误、接口错误信封和运行级致命错误的处理

use page_translator::translation::config::BatchMode;
use page_translator::translation::{
    RunOutcome, RunPhase, TranslationClient, TranslationError, TranslationEvent, TranslationService,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{drain_events, test_config, HtmlTestHelper, MockApi, API_PATH, TEST_API_KEY};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 2xx 响应里的错误信封按失败处理并重试
#[tokio::test]
async fn test_error_envelope_on_success_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": {"message": "You exceeded your current quota"}})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();
    let err = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello"]), "Spanish")
        .await
        .unwrap_err();

    match err {
        TranslationError::ApiError { status, message } => {
            assert_eq!(status, 200);
            assert!(message.contains("quota"), "{}", message);
            assert!(message.contains("3 attempts"), "{}", message);
        }
        other => panic!("expected an API error, got {:?}", other),
    }

    println!("✅ Error envelope handling passed");
}

/// 非 2xx 时从错误信封中取出消息
#[tokio::test]
async fn test_http_error_message_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Incorrect API key provided"}})),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.max_retries = 0;
    let client = TranslationClient::from_config(&config).unwrap();

    let err = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello"]), "Spanish")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API error (401): Incorrect API key provided");
    assert_eq!(client.get_stats().requests_sent(), 1);

    println!("✅ HTTP error extraction passed");
}

/// 响应信封无法解析属于传输错误，会重试
#[tokio::test]
async fn test_malformed_envelope_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let client = TranslationClient::from_config(&test_config(&server)).unwrap();
    let err = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello"]), "Spanish")
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::ParseError(_)), "{:?}", err);
    assert_eq!(client.get_stats().retries(), 2);

    println!("✅ Malformed envelope handling passed");
}

/// 空的 choices 也是解析错误
#[tokio::test]
async fn test_empty_choices_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.max_retries = 0;
    let client = TranslationClient::from_config(&config).unwrap();

    let err = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello"]), "Spanish")
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::ParseError(_)));

    println!("✅ Empty choices handling passed");
}

/// 分批失败是运行级致命错误，运行标志被释放
#[tokio::test]
async fn test_batching_failure_fails_the_run() {
    let server = MockServer::start().await;
    MockApi::mount_reply(&server, "unused", 0).await;

    let dom = HtmlTestHelper::create_test_dom(&HtmlTestHelper::create_paragraph_page(&["Hello"]));
    let mut config = test_config(&server);
    config.batch_mode = BatchMode::Items;
    config.batch_max_items = 0;

    // 配置校验会拒绝 0，这里绕过校验直接构造
    let client = TranslationClient::from_config(&config).unwrap();
    let service = TranslationService::with_client(config, dom.document.clone(), client);
    let mut events = service.subscribe();

    let outcome = service.translate_page(TEST_API_KEY, "Spanish").await;

    let RunOutcome::Failed(message) = outcome else {
        panic!("expected a failed run");
    };
    assert!(message.contains("batching failed"), "{}", message);
    assert!(!service.is_translating());
    assert_eq!(service.status().phase, RunPhase::Failed);

    let events = drain_events(&mut events);
    assert_eq!(
        events.last(),
        Some(&TranslationEvent::TranslationError { error: message })
    );

    // 失败之后可以再次启动
    let again = service.translate_page(TEST_API_KEY, "Spanish").await;
    assert!(matches!(again, RunOutcome::Failed(_)));

    println!("✅ Run-fatal error handling passed");
}

/// 无效配置在创建服务时被拒绝
#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let server = MockServer::start().await;
    let dom = HtmlTestHelper::create_test_dom("<html><body></body></html>");

    let mut config = test_config(&server);
    config.api_url = "not a url".to_string();
    let result = TranslationService::new(config, dom.document.clone());

    assert!(matches!(result, Err(TranslationError::ConfigError(_))));

    println!("✅ Config validation passed");
}

/// 接口不可达时返回网络错误
#[tokio::test]
async fn test_unreachable_endpoint_is_a_network_error() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.api_url = "http://127.0.0.1:1/v1/chat/completions".to_string();
    config.max_retries = 0;

    let client = TranslationClient::from_config(&config).unwrap();
    let err = client
        .translate_batch(TEST_API_KEY, &texts(&["Hello"]), "Spanish")
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::NetworkError(_)), "{:?}", err);
    assert!(err.is_retryable());

    println!("✅ Network error handling passed");
}
