use std::sync::Arc;

use pchat::{ChatError, Client};
use pcommon::Context;
use pprovider::{ChatResponse, Part};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::{BatchError, Prompt};

/// Outcome of one prompt. `index` is the prompt's position in
/// [`Prompt::prompts`] output.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub index: usize,
    pub prompt: String,
    pub results: Vec<String>,
    pub tokens: u64,
    pub error: Option<ChatError>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Prompt {
    /// Sends every rendered prompt through [`Client::chat`] and returns the
    /// outcomes ordered by index. Concurrency follows the client's
    /// requests-per-minute limit; an unbounded client runs everything at once.
    pub async fn execute<S: AsRef<str>>(
        &self,
        client: &Client,
        input: &[S],
        prefix: &str,
    ) -> Result<Vec<BatchResult>, BatchError> {
        let mut join_set = self.spawn_batch(client, input, prefix)?;

        let mut results = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|result| result.index);
        Ok(results)
    }

    /// Like [`Prompt::execute`], but hands each outcome over as soon as it
    /// completes, in completion order. Also returns the number of prompts.
    ///
    /// The channel closes once every prompt has reported. Dropping the
    /// receiver aborts the prompts still running. Must be called within a
    /// tokio runtime.
    pub fn execute_stream<S: AsRef<str>>(
        &self,
        client: &Client,
        input: &[S],
        prefix: &str,
    ) -> Result<(mpsc::Receiver<BatchResult>, usize), BatchError> {
        let mut join_set = self.spawn_batch(client, input, prefix)?;
        let total = join_set.len();
        let (sender, receiver) = mpsc::channel(total.max(1));

        tokio::spawn(async move {
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        if sender.send(result).await.is_err() {
                            tracing::debug!("batch receiver dropped, aborting remaining prompts");
                            return;
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "batch prompt task failed"),
                }
            }
        });

        Ok((receiver, total))
    }

    fn spawn_batch<S: AsRef<str>>(
        &self,
        client: &Client,
        input: &[S],
        prefix: &str,
    ) -> Result<JoinSet<BatchResult>, BatchError> {
        if client.is_closed() {
            return Err(BatchError::client_closed());
        }

        let mut join_set = JoinSet::new();
        let prompts = self.prompts(input, prefix);
        if prompts.is_empty() {
            return Ok(join_set);
        }

        let workers = match client.limit() {
            Some(rpm) => (rpm as usize).clamp(1, prompts.len()),
            None => prompts.len(),
        };
        tracing::debug!(
            provider = %client.provider_id(),
            prompts = prompts.len(),
            workers,
            "executing batch"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        for (index, prompt) in prompts.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let client = client.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return failed(index, prompt, ChatError::client_closed());
                };

                let ctx = if timeout.is_zero() {
                    Context::background()
                } else {
                    Context::background().with_timeout(timeout)
                };

                match client.chat(&ctx, vec![Part::text(prompt.clone())]).await {
                    Ok(response) => BatchResult {
                        index,
                        prompt,
                        results: response.results(),
                        tokens: response.token_count().total,
                        error: None,
                    },
                    Err(err) => {
                        tracing::warn!(index, error = %err, "batch prompt failed");
                        failed(index, prompt, err)
                    }
                }
            });
        }

        Ok(join_set)
    }
}

fn failed(index: usize, prompt: String, error: ChatError) -> BatchResult {
    BatchResult {
        index,
        prompt,
        results: Vec::new(),
        tokens: 0,
        error: Some(error),
    }
}
