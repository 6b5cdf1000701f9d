//! Fixed/scripted provider for tests and the `demos/` runnable examples.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// Returns canned responses in order, one per `invoke` call; repeats the last
/// one once the queue is drained so a loop that overruns the fixture doesn't
/// panic, it just stops making progress (caught by the iteration cap instead).
pub struct MockProvider {
    model_id: String,
    responses: Mutex<Vec<ProviderResponse>>,
}

impl MockProvider {
    pub fn new(model_id: impl Into<String>, responses: Vec<ProviderResponse>) -> Self {
        Self {
            model_id: model_id.into(),
            responses: Mutex::new(responses),
        }
    }

    /// A provider that always answers with the same plain-text content and no
    /// tool calls.
    pub fn fixed(content: impl Into<String>) -> Self {
        Self::new(
            "mock-model",
            vec![ProviderResponse {
                content: content.into(),
                ..Default::default()
            }],
        )
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else if let Some(last) = responses.first() {
            Ok(last.clone())
        } else {
            Ok(ProviderResponse::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_provider_always_returns_same_content() {
        let provider = MockProvider::fixed("hi there");
        let r1 = provider.invoke(ProviderRequest::new(vec![])).await.unwrap();
        let r2 = provider.invoke(ProviderRequest::new(vec![])).await.unwrap();
        assert_eq!(r1.content, "hi there");
        assert_eq!(r2.content, "hi there");
    }

    #[tokio::test]
    async fn scripted_provider_consumes_responses_in_order() {
        let provider = MockProvider::new(
            "script",
            vec![
                ProviderResponse {
                    content: "first".into(),
                    ..Default::default()
                },
                ProviderResponse {
                    content: "second".into(),
                    ..Default::default()
                },
            ],
        );
        let r1 = provider.invoke(ProviderRequest::new(vec![])).await.unwrap();
        let r2 = provider.invoke(ProviderRequest::new(vec![])).await.unwrap();
        let r3 = provider.invoke(ProviderRequest::new(vec![])).await.unwrap();
        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
        assert_eq!(r3.content, "second");
    }
}
