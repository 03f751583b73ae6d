use classnotes::summary::{OpenAiSummarizer, Summarizer};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1741000000,
        "model": "o3-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 80, "completion_tokens": 12, "total_tokens": 92}
    })
}

#[tokio::test]
async fn test_summarize_sends_prompt_and_returns_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "o3-mini"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("  Past simple, irregular verbs, travel vocabulary \n")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();

    // The summarizer drives its own runtime, so keep it off the test runtime
    let result = tokio::task::spawn_blocking(move || {
        let summarizer = OpenAiSummarizer::new("sk-test", Some(uri), None).unwrap();
        summarizer.summarize("Practiced past simple with irregular verbs")
    })
    .await
    .unwrap();

    assert_eq!(
        result.unwrap(),
        "Past simple, irregular verbs, travel vocabulary"
    );

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert!(messages[1]["content"]
        .as_str()
        .unwrap()
        .ends_with("Notes: Practiced past simple with irregular verbs"));
}

#[tokio::test]
async fn test_summarize_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid model",
                "type": "invalid_request_error",
                "param": "model",
                "code": null
            }
        })))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();

    let result = tokio::task::spawn_blocking(move || {
        let summarizer =
            OpenAiSummarizer::new("sk-test", Some(uri), Some("not-a-model".into())).unwrap();
        summarizer.summarize("Some notes that are long enough")
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(classnotes::Error::Summarization(_))));
}

#[tokio::test]
async fn test_summarize_empty_choices() {
    let mock_server = MockServer::start().await;

    let mut body = completion("unused");
    body["choices"] = json!([]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();

    let result = tokio::task::spawn_blocking(move || {
        let summarizer = OpenAiSummarizer::new("sk-test", Some(uri), None).unwrap();
        summarizer.summarize("Practiced past simple with irregular verbs")
    })
    .await
    .unwrap();

    match result {
        Err(classnotes::Error::Summarization(message)) => {
            assert_eq!(message, "No response from OpenAI")
        }
        other => panic!("expected a summarization error, got {:?}", other),
    }
}
