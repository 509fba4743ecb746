// crates/engine/src/notify.rs
use common::*;

/// SNS caps subjects at 100 characters
const MAX_SUBJECT_LEN: usize = 100;

/// Reports the final outcome of a run
pub struct RunNotifier {
    sns_client: Option<aws_sdk_sns::Client>,
    topic_arn: Option<String>,
}

impl RunNotifier {
    pub fn new(sns_client: Option<aws_sdk_sns::Client>, topic_arn: Option<String>) -> Self {
        Self {
            sns_client,
            topic_arn: topic_arn.filter(|arn| !arn.trim().is_empty()),
        }
    }

    /// Log-only notifier
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.sns_client.is_some() && self.topic_arn.is_some()
    }

    /// Publish the outcome. Failures here never change the run result.
    pub async fn publish(&self, summary: &RunSummary) {
        match summary.state {
            RunState::Committed => tracing::info!(
                "[{}] run {} committed: {} records to {}",
                summary.job_name,
                summary.run_id,
                summary.records_written,
                summary.sink_uri.as_deref().unwrap_or("-")
            ),
            _ => tracing::error!(
                "[{}] run {} {}: {}",
                summary.job_name,
                summary.run_id,
                summary.state,
                summary.error.as_deref().unwrap_or("no error recorded")
            ),
        }

        if let (Some(client), Some(arn)) = (&self.sns_client, &self.topic_arn) {
            if let Err(e) = self.send_sns(client, arn, summary).await {
                tracing::error!("Failed to send SNS run notification: {}", e);
            }
        }
    }

    async fn send_sns(
        &self,
        client: &aws_sdk_sns::Client,
        topic_arn: &str,
        summary: &RunSummary,
    ) -> Result<()> {
        let message = serde_json::to_string_pretty(summary)?;

        client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject(summary))
            .message(message)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("SNS publish failed: {}", e)))?;

        Ok(())
    }
}

fn subject(summary: &RunSummary) -> String {
    format!("[relay {}] {}", summary.state, summary.job_name)
        .chars()
        .take(MAX_SUBJECT_LEN)
        .collect()
}
