// 集成测试公共模块
//
// 提供 HTML 夹具、DOM 辅助函数和模拟 chat-completion 接口

use std::rc::Rc;
use std::cell::RefCell;

use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use page_translator::parsers::html::{find_nodes, get_node_attr, get_text_content, html_to_dom};
use page_translator::translation::config::{BatchMode, TranslationConfig};
use page_translator::translation::events::TranslationEvent;
use serde_json::json;
use tokio::sync::broadcast;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PATH: &str = "/v1/chat/completions";
pub const TEST_API_KEY: &str = "sk-test";

/// HTML 测试辅助
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").expect("test HTML should parse")
    }

    /// 两段可翻译文本，外加不应被翻译的脚本、样式和输入框
    pub fn create_simple_english_page() -> String {
        r#"<html>
<head><title>Test Page</title><style>p { color: red; }</style></head>
<body>
<p>  Hello world </p>
<p>Good bye</p>
<script>var greeting = "hello";</script>
<textarea>draft notes</textarea>
<div id="dynamic"></div>
</body>
</html>"#
            .to_string()
    }

    /// 每段一个文本节点
    pub fn create_paragraph_page(paragraphs: &[&str]) -> String {
        let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
        format!("<html><head></head><body>{}<div id=\"dynamic\"></div></body></html>", body)
    }

    /// `<p>` 内的文本，按文档顺序
    pub fn paragraph_texts(dom: &RcDom) -> Vec<String> {
        find_nodes(&dom.document, &["p"])
            .iter()
            .map(|p| {
                p.children
                    .borrow()
                    .iter()
                    .filter_map(get_text_content)
                    .collect::<String>()
            })
            .collect()
    }

    pub fn html_attr(dom: &RcDom, attr: &str) -> Option<String> {
        find_nodes(&dom.document, &["html"])
            .first()
            .and_then(|html| get_node_attr(html, attr))
    }

    pub fn dynamic_container(dom: &RcDom) -> Handle {
        find_nodes(&dom.document, &["div"])
            .into_iter()
            .find(|div| get_node_attr(div, "id").as_deref() == Some("dynamic"))
            .expect("page should contain #dynamic")
    }

    /// 模拟页面脚本向容器追加一个文本节点
    pub fn append_text(parent: &Handle, text: &str) -> Handle {
        let node = Node::new(NodeData::Text {
            contents: RefCell::new(text.into()),
        });
        node.parent.set(Some(Rc::downgrade(parent)));
        parent.children.borrow_mut().push(node.clone());
        node
    }
}

/// 模拟 OpenAI 兼容接口
pub struct MockApi;

impl MockApi {
    pub fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    pub fn ok(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(Self::completion(content))
    }

    /// 任意请求都返回 `content`
    pub async fn mount_reply(server: &MockServer, content: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(API_PATH))
            .respond_with(Self::ok(content))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    /// 请求体包含 `needle` 时返回 `content`
    pub async fn mount_reply_for(server: &MockServer, needle: &str, content: &str) {
        Mock::given(method("POST"))
            .and(path(API_PATH))
            .and(body_string_contains(needle))
            .respond_with(Self::ok(content))
            .mount(server)
            .await;
    }
}

/// 指向模拟服务器、去掉等待时间的测试配置
pub fn test_config(server: &MockServer) -> TranslationConfig {
    TranslationConfig {
        api_url: format!("{}{}", server.uri(), API_PATH),
        target_lang: "Spanish".to_string(),
        retry_delay_ms: 10,
        batch_delay_ms: 0,
        request_timeout_secs: 5,
        ..TranslationConfig::default()
    }
}

/// 每批一条文本
pub fn one_item_batches(mut config: TranslationConfig) -> TranslationConfig {
    config.batch_mode = BatchMode::Items;
    config.batch_max_items = 1;
    config
}

/// 取出已缓冲的全部事件
pub fn drain_events(rx: &mut broadcast::Receiver<TranslationEvent>) -> Vec<TranslationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_values(events: &[TranslationEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            TranslationEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect()
}
