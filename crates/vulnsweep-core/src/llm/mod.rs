mod chat;
mod settings;

use anyhow::Result;
use async_trait::async_trait;

pub use chat::ChatCompletionsClient;
pub use settings::{ClassifierSettings, ProviderKind, DEFAULT_TIMEOUT_SECS};

/// Instruction sent as the system message of every classification request.
pub const SYSTEM_PROMPT: &str = "You are a security researcher specialized in detecting security vulnerabilities.\n\
Provide the answer only in the following format:\n\n\
vulnerability: <YES or NO> | vulnerability type: <type or N/A> | vulnerability name: <name or N/A> | explanation: <explanation for the prediction>.\n\
Do not include anything else in the response.";

/// Wrap normalized code in the fixed question template.
pub fn user_prompt(code: &str) -> String {
    format!(
        "User: Is this code snippet subject to any security vulnerability?\n\n{code}\n\nAnswer:"
    )
}

/// Remote service that returns a vulnerability verdict for a code snippet.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify normalized `code` with the given model, returning the trimmed completion text.
    async fn classify(&self, code: &str, model: &str) -> Result<String>;
}

/// Offline classifier used for dry runs; never touches the network.
#[derive(Debug, Default, Clone)]
pub struct NoopClassifier;

#[async_trait]
impl Classifier for NoopClassifier {
    async fn classify(&self, _code: &str, _model: &str) -> Result<String> {
        Ok("vulnerability: N/A | vulnerability type: N/A | vulnerability name: N/A | explanation: classifier not configured (noop provider).".into())
    }
}

/// Construct the classifier selected by `settings.provider`.
pub fn build_classifier(settings: &ClassifierSettings) -> Result<Box<dyn Classifier>> {
    match settings.provider {
        ProviderKind::Noop => Ok(Box::new(NoopClassifier)),
        ProviderKind::Groq | ProviderKind::OpenAi => {
            Ok(Box::new(ChatCompletionsClient::new(settings)?))
        }
    }
}
