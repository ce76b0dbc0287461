//! `metrics` counters and histograms for chat dispatch.

use std::time::Duration;

use pchat::{ChatError, ChatHooks};
use pprovider::{ProviderId, TokenCount};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsChatHooks;

impl ChatHooks for MetricsChatHooks {
    fn on_admitted(&self, provider: ProviderId, operation: &str, waited: Duration) {
        metrics::histogram!(
            "parley_limiter_wait_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(waited.as_secs_f64());
    }

    fn on_dispatch(&self, provider: ProviderId, operation: &str, model: &str) {
        metrics::counter!(
            "parley_dispatch_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderId, operation: &str, token_count: TokenCount) {
        metrics::counter!(
            "parley_dispatch_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);

        if !token_count.is_unknown() {
            metrics::counter!(
                "parley_prompt_tokens_total",
                "provider" => provider.to_string()
            )
            .increment(token_count.prompt);
            metrics::counter!(
                "parley_result_tokens_total",
                "provider" => provider.to_string()
            )
            .increment(token_count.result);
        }
    }

    fn on_failure(&self, provider: ProviderId, operation: &str, error: &ChatError) {
        metrics::counter!(
            "parley_dispatch_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}
