//! Chat client for the noLimit LLM endpoints

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::NoLimitError;
use crate::x402::{Paid, X402Client};

/// Paid chat endpoint
const CHAT_ENDPOINT: &str = "/noLimitLLM";

/// Enterprise chat endpoint used with API keys
const CHAT_API_ENDPOINT: &str = "/api/agent";

/// Chat price per message in USDC, for display
pub const CHAT_PRICE_USDC: f64 = 0.05;

/// Model responses can take a while
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// The server reads at most this much trailing context
const MAX_HISTORY_MESSAGES: usize = 10;

/// Simulated stream pacing
const STREAM_CHUNK_CHARS: usize = 48;
const STREAM_CHUNK_DELAY_MS: u64 = 15;

/// One turn of conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Client-side bookkeeping, never sent to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Optional knobs for a chat call
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Previous messages for context; only the last 10 are sent
    pub history: Vec<ChatMessage>,
    /// Per-call timeout override
    pub timeout: Option<Duration>,
    /// System prompt override
    pub system_prompt: Option<String>,
    /// Max tokens in the response
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0-1)
    pub temperature: Option<f32>,
}

/// Token usage reported by the model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Answer from the model plus payment bookkeeping
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: String,
    /// Settlement reference when the call went through the payment flow
    pub payment_tx: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// One piece of a simulated streaming response
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
    pub index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: String,
    user_address: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conversation_history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: String,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

/// Client for the pay-per-message LLM
pub struct ChatClient {
    base_url: String,
    transport: Arc<X402Client>,
    default_timeout: Option<Duration>,
}

impl ChatClient {
    pub(crate) fn new(
        base_url: &str,
        transport: Arc<X402Client>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            default_timeout,
        }
    }

    /// Send a message with default options
    pub async fn send(&self, message: &str) -> Result<ChatResponse, NoLimitError> {
        self.send_with(message, ChatOptions::default()).await
    }

    /// Send a message with history and model options
    pub async fn send_with(
        &self,
        message: &str,
        options: ChatOptions,
    ) -> Result<ChatResponse, NoLimitError> {
        if message.trim().is_empty() {
            return Err(NoLimitError::validation("message must not be empty"));
        }

        let body = ChatRequest {
            message: message.to_string(),
            user_address: self
                .transport
                .wallet_address()
                .unwrap_or("0x0")
                .to_string(),
            conversation_history: self.format_history(&options.history),
            system_prompt: options.system_prompt,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        // API keys route to the enterprise endpoint, wallets to the paid one
        let endpoint = if self.transport.has_api_key() {
            CHAT_API_ENDPOINT
        } else {
            CHAT_ENDPOINT
        };
        let url = format!("{}{}", self.base_url, endpoint);
        let timeout = options
            .timeout
            .or(self.default_timeout)
            .unwrap_or(CHAT_TIMEOUT);

        let result: Paid<ChatResponseBody> = self.transport.post_json(&url, &body, timeout).await?;

        Ok(ChatResponse {
            message: result.data.response,
            payment_tx: result.payment_tx,
            usage: result.data.usage,
        })
    }

    /// Send a message and feed the answer back through `on_chunk` in
    /// pieces. The endpoint itself does not stream; this paces out the
    /// finished answer so UIs can render it incrementally.
    pub async fn stream<F>(
        &self,
        message: &str,
        options: ChatOptions,
        mut on_chunk: F,
    ) -> Result<ChatResponse, NoLimitError>
    where
        F: FnMut(StreamChunk),
    {
        let response = self.send_with(message, options).await?;

        let chunks = chunk_text(&response.message, STREAM_CHUNK_CHARS);
        let last = chunks.len() - 1;
        for (index, content) in chunks.into_iter().enumerate() {
            on_chunk(StreamChunk {
                content,
                done: index == last,
                index,
            });
            if index != last {
                tokio::time::sleep(Duration::from_millis(STREAM_CHUNK_DELAY_MS)).await;
            }
        }

        Ok(response)
    }

    /// Trim history to the trailing window the server accepts, dropping
    /// client-side fields from what goes on the wire
    pub fn format_history(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        history[start..]
            .iter()
            .map(|m| ChatMessage {
                role: m.role.clone(),
                content: m.content.clone(),
                timestamp: None,
            })
            .collect()
    }
}

/// Split text into word-aligned chunks of roughly `width` characters.
/// Concatenating the chunks reproduces the input exactly.
fn chunk_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_inclusive(' ') {
        if !current.is_empty() && current.len() + word.len() > width {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn unauthenticated_chat(base_url: &str) -> ChatClient {
        ChatClient::new(base_url, Arc::new(X402Client::new(None, None)), None)
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let chat = unauthenticated_chat("http://localhost:1");

        let err = chat.send("").await.unwrap_err();
        assert!(matches!(err, NoLimitError::Validation(_)));

        let err = chat.send("   ").await.unwrap_err();
        assert!(matches!(err, NoLimitError::Validation(_)));
    }

    #[test]
    fn test_format_history_passes_through_short_history() {
        let chat = unauthenticated_chat("http://localhost:1");
        let history = vec![
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi there!"),
        ];

        let formatted = chat.format_history(&history);
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0].role, "user");
        assert_eq!(formatted[0].content, "Hello");
    }

    #[test]
    fn test_format_history_caps_at_last_ten() {
        let chat = unauthenticated_chat("http://localhost:1");
        let history: Vec<ChatMessage> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("Message {}", i))
                } else {
                    ChatMessage::assistant(format!("Message {}", i))
                }
            })
            .collect();

        let formatted = chat.format_history(&history);
        assert_eq!(formatted.len(), 10);
        assert_eq!(formatted[0].content, "Message 10");
    }

    #[test]
    fn test_format_history_strips_client_side_timestamp() {
        let chat = unauthenticated_chat("http://localhost:1");
        let mut message = ChatMessage::user("Hello");
        message.timestamp = Some(1700000000000);

        let formatted = chat.format_history(&[message]);
        let wire = serde_json::to_value(&formatted[0]).unwrap();
        assert_eq!(wire, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_chunk_text_reassembles_exactly() {
        let text = "The quick brown fox jumps over the lazy dog, then naps in the afternoon sun.";
        let chunks = chunk_text(text, 20);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_text_empty_input_gives_single_chunk() {
        assert_eq!(chunk_text("", 20), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_send_posts_to_paid_endpoint() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/noLimitLLM")
            .match_body(Matcher::PartialJson(json!({
                "message": "What is DeFi?",
                "userAddress": "0x0"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "response": "Decentralized finance.",
                    "usage": {"promptTokens": 12, "completionTokens": 4, "totalTokens": 16}
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let chat = unauthenticated_chat(&server.url());
        let response = chat.send("What is DeFi?").await.unwrap();

        assert_eq!(response.message, "Decentralized finance.");
        assert!(response.payment_tx.is_none());
        assert_eq!(response.usage.unwrap().total_tokens, 16);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_key_routes_to_enterprise_endpoint() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/api/agent")
            .match_header("x-api-key", "corp_key_123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"response": "enterprise answer"}).to_string())
            .expect(1)
            .create_async()
            .await;

        let transport = Arc::new(X402Client::new(None, Some("corp_key_123".to_string())));
        let chat = ChatClient::new(&server.url(), transport, None);
        let response = chat.send("Explain smart contracts").await.unwrap();

        assert_eq!(response.message, "enterprise answer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stream_paces_out_full_answer() {
        let mut server = mockito::Server::new_async().await;

        let answer = "Once upon a time a rollup batched a thousand transfers and nobody noticed the gas.";
        server
            .mock("POST", "/noLimitLLM")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"response": answer}).to_string())
            .create_async()
            .await;

        let chat = unauthenticated_chat(&server.url());
        let mut chunks: Vec<StreamChunk> = Vec::new();
        let response = chat
            .stream("Tell me a short story", ChatOptions::default(), |chunk| {
                chunks.push(chunk)
            })
            .await
            .unwrap();

        assert_eq!(response.message, answer);
        assert!(chunks.len() > 1);
        let text: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(text, answer);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.done, i == chunks.len() - 1);
        }
    }
}
