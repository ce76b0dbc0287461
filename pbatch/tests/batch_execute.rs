use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pbatch::{BatchErrorKind, Prompt, Template};
use pchat::{ChatErrorKind, Client};
use pcommon::ContextError;
use pprovider::{
    BoxedEventStream, ChatRequest, Content, ModelProvider, ModelResponse, Part, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, TokenCount, VecEventStream,
};

/// Echoes the last input line of each prompt after a short delay.
#[derive(Default)]
struct EchoProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl EchoProvider {
    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn last_input_line(prompt: &str) -> String {
    prompt
        .lines()
        .rev()
        .find(|line| !line.starts_with("Output:") && !line.starts_with("\"\"\""))
        .unwrap_or_default()
        .to_string()
}

impl ModelProvider for EchoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn default_model(&self) -> &str {
        "echo"
    }

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let prompt = request
                .parts
                .first()
                .and_then(Part::as_text)
                .unwrap_or_default()
                .to_string();
            self.prompts.lock().expect("prompts lock").push(prompt.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if prompt.contains("hang") {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt.contains("fail") {
                return Err(ProviderError::unavailable("echo refused"));
            }

            let line = last_input_line(&prompt);
            Ok(ModelResponse::new(
                ProviderId::Gemini,
                "echo",
                vec![Content::assistant(vec![Part::text(line)])],
            )
            .with_token_count(TokenCount::new(4, 1)))
        })
    }

    fn stream<'a>(
        &'a self,
        _request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async { Ok(Box::pin(VecEventStream::new(Vec::new())) as BoxedEventStream<'a>) })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async { Ok(vec!["echo".to_string()]) })
    }
}

#[tokio::test(start_paused = true)]
async fn results_come_back_in_prompt_order() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::new(provider.clone());

    let input = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let results = Prompt::new("Echo the input")
        .with_input_chunk(1)
        .execute(&client, &input, "%d: ")
        .await
        .expect("batch should run");

    assert_eq!(results.len(), 5);
    for (position, result) in results.iter().enumerate() {
        assert_eq!(result.index, position);
        assert!(result.is_ok(), "prompt {position} failed: {:?}", result.error);
        assert_eq!(
            result.results,
            vec![format!("{}: {}", position + 1, input[position])]
        );
        assert_eq!(result.tokens, 5);
    }
    assert_eq!(provider.peak(), 5);
}

#[tokio::test(start_paused = true)]
async fn limited_client_bounds_concurrency() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::builder(provider.clone()).limit(Some(2)).build();

    let input = ["a", "b", "c", "d"];
    let results = Prompt::new("Echo")
        .with_input_chunk(1)
        .execute(&client, &input, "")
        .await
        .expect("batch should run");

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|result| result.is_ok()));
    assert!(provider.peak() <= 2, "peak {}", provider.peak());
}

#[tokio::test(start_paused = true)]
async fn failed_prompt_keeps_its_slot() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::new(provider);

    let results = Prompt::new("Echo")
        .with_input_chunk(1)
        .execute(&client, &["ok", "fail", "ok again"], "")
        .await
        .expect("batch should run");

    assert!(results[0].is_ok());
    let error = results[1].error.as_ref().expect("second prompt should fail");
    assert_eq!(error.kind, ChatErrorKind::Transport);
    assert_eq!(
        error.provider_error().map(|err| err.kind),
        Some(ProviderErrorKind::Unavailable)
    );
    assert!(results[1].results.is_empty());
    assert_eq!(results[1].tokens, 0);
    assert!(results[2].is_ok());
}

#[tokio::test(start_paused = true)]
async fn each_prompt_gets_its_own_deadline() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::new(provider);

    let results = Prompt::new("Echo")
        .with_input_chunk(1)
        .with_timeout(Duration::from_secs(2))
        .execute(&client, &["hang", "fine"], "")
        .await
        .expect("batch should run");

    let error = results[0].error.as_ref().expect("hung prompt should time out");
    assert_eq!(error.kind, ChatErrorKind::Canceled);
    assert_eq!(error.context_error(), Some(ContextError::DeadlineExceeded));
    assert!(results[1].is_ok());
}

#[tokio::test]
async fn closed_client_rejects_the_batch() {
    let client = Client::new(Arc::new(EchoProvider::default()));
    client.close().expect("close should succeed");

    let err = Prompt::new("Echo")
        .execute(&client, &["a"], "")
        .await
        .expect_err("closed client should fail");
    assert_eq!(err.kind, BatchErrorKind::ClientClosed);
}

#[tokio::test]
async fn empty_input_sends_nothing() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::new(provider.clone());

    let results = Prompt::new("Echo")
        .execute::<&str>(&client, &[], "")
        .await
        .expect("empty batch should succeed");

    assert!(results.is_empty());
    assert!(provider.prompts.lock().expect("prompts lock").is_empty());
}

#[tokio::test(start_paused = true)]
async fn streamed_results_arrive_as_they_complete() {
    let client = Client::new(Arc::new(EchoProvider::default()));

    let (mut results, total) = Prompt::new("Echo")
        .with_input_chunk(1)
        .with_timeout(Duration::from_secs(2))
        .execute_stream(&client, &["hang", "quick"], "")
        .expect("batch should start");
    assert_eq!(total, 2);

    let first = results.recv().await.expect("quick prompt reports first");
    assert_eq!(first.index, 1);
    assert_eq!(first.results, vec!["quick".to_string()]);

    let second = results.recv().await.expect("hung prompt reports after its deadline");
    assert_eq!(second.index, 0);
    assert_eq!(
        second.error.as_ref().map(|err| err.kind),
        Some(ChatErrorKind::Canceled)
    );

    assert!(results.recv().await.is_none());
}

#[tokio::test]
async fn streamed_batch_rejects_a_closed_client() {
    let client = Client::new(Arc::new(EchoProvider::default()));
    client.close().expect("close should succeed");

    let err = Prompt::new("Echo")
        .execute_stream(&client, &["a"], "")
        .err()
        .expect("closed client should fail");
    assert_eq!(err.kind, BatchErrorKind::ClientClosed);
}

#[tokio::test(start_paused = true)]
async fn custom_template_shapes_what_is_sent() {
    let provider = Arc::new(EchoProvider::default());
    let client = Client::new(provider.clone());

    let results = Prompt::new("Shout")
        .with_input_chunk(1)
        .with_template(Template::new(|parts| {
            format!("{} #{}\n{}", parts.request, parts.start, parts.input_lines())
        }))
        .execute(&client, &["hey", "you"], "> ")
        .await
        .expect("batch should run");

    assert_eq!(results.len(), 2);
    let mut sent = provider.prompts.lock().expect("prompts lock").clone();
    sent.sort();
    assert_eq!(sent, vec!["Shout #0\n> hey\n".to_string(), "Shout #1\n> you\n".to_string()]);
    assert_eq!(results[1].results, vec!["> you".to_string()]);
}
