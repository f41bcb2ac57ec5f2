//! The chat-completions call: send one [`ExtractionRequest`], get one
//! [`ExtractionResult`].
//!
//! This is the only stage with network I/O. It targets any OpenAI-compatible
//! endpoint and makes exactly one request per extraction: no retries, no
//! streaming. Failures are classified so the caller can tell a bad key from a
//! network blip from a model that ignored the JSON directive:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | no / blank key (checked before any I/O) | [`RfpError::Authentication`] |
//! | HTTP 401 / 403 | [`RfpError::Authentication`] |
//! | connect failure, timeout, unreadable body | [`RfpError::Transport`] |
//! | any other non-2xx | [`RfpError::Upstream`] |
//! | 2xx without a JSON-object message | [`RfpError::MalformedResponse`] |

use crate::config::{Credential, ExtractionConfig};
use crate::error::RfpError;
use crate::output::ExtractionResult;
use crate::pipeline::request::ExtractionRequest;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormatBody<'a>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct ResponseFormatBody<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    // Decoded on its own so a malformed usage block cannot fail the reply.
    usage: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// Token accounting reported by the service. Either count may be missing.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
}

impl<'a> ChatCompletionBody<'a> {
    fn from_request(request: &'a ExtractionRequest) -> Self {
        Self {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: ResponseFormatBody {
                kind: request.response_format.as_api_str(),
            },
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// A successful extraction plus the service's token accounting.
#[derive(Debug, Clone)]
pub struct ExtractionReply {
    pub result: ExtractionResult,
    pub usage: Option<Usage>,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl ExtractionClient {
    /// Build a client from the config's base URL and timeout.
    pub fn new(config: &ExtractionConfig) -> Result<Self, RfpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| RfpError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.completions_url(),
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Send `request` and parse the reply into a field map.
    ///
    /// The credential is checked before anything touches the network.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
        credential: Option<&Credential>,
    ) -> Result<ExtractionReply, RfpError> {
        let credential = match credential {
            Some(c) if !c.is_blank() => c,
            _ => {
                return Err(RfpError::Authentication {
                    detail: "no API key supplied".to_string(),
                })
            }
        };

        let body = ChatCompletionBody::from_request(request);
        let start = Instant::now();
        info!(model = %request.model, url = %self.url, "Sending extraction request");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(status = status.as_u16(), bytes = text.len(), elapsed_ms, "Model service replied");

        if !status.is_success() {
            let detail = error_detail(&text, status);
            warn!(status = status.as_u16(), "Model service error: {}", detail);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    RfpError::Authentication { detail }
                }
                _ => RfpError::Upstream {
                    status: status.as_u16(),
                    detail,
                },
            });
        }

        let reply = parse_reply(&text)?;
        if let Some(usage) = reply.usage {
            info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                elapsed_ms,
                fields = reply.result.len(),
                "Extraction reply parsed"
            );
        }
        Ok(reply)
    }

    fn transport_error(&self, e: reqwest::Error) -> RfpError {
        let detail = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else {
            e.to_string()
        };
        RfpError::Transport { detail }
    }
}

/// Parse a 2xx chat-completions envelope into a field map.
///
/// The message content must itself be a single JSON object. Anything else
/// (prose, an array, a fenced code block) is rejected without repair.
pub(crate) fn parse_reply(body: &str) -> Result<ExtractionReply, RfpError> {
    let envelope: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| RfpError::MalformedResponse {
            detail: format!("response envelope is not valid JSON: {}", e),
        })?;

    let choice = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RfpError::MalformedResponse {
            detail: "response contained no choices".to_string(),
        })?;

    if choice.finish_reason.as_deref() == Some("length") {
        warn!("Model stopped at the token ceiling; reply may be cut short");
    }

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| RfpError::MalformedResponse {
            detail: "response message has no content".to_string(),
        })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| RfpError::MalformedResponse {
        detail: format!("{} (reply began: {:?})", e, preview(&content)),
    })?;

    let usage = envelope.usage.and_then(|raw| match serde_json::from_value::<Usage>(raw) {
        Ok(usage) => Some(usage),
        Err(e) => {
            debug!("Ignoring unreadable usage block: {}", e);
            None
        }
    });

    match value {
        Value::Object(map) => Ok(ExtractionReply {
            result: ExtractionResult::from_map(map),
            usage,
        }),
        other => Err(RfpError::MalformedResponse {
            detail: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

/// Pull the service's error message out of an OpenAI-style error body, or
/// fall back to the raw body / status reason.
fn error_detail(body: &str, status: StatusCode) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_owned)
    });

    match from_json {
        Some(msg) => msg,
        None if !body.trim().is_empty() => preview(body),
        None => status
            .canonical_reason()
            .unwrap_or("no detail provided")
            .to_string(),
    }
}

fn preview(s: &str) -> String {
    const MAX: usize = 120;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(MAX).collect::<String>())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;
    use crate::pipeline::request::build_request;
    use crate::schema::FieldSchema;
    use serde_json::json;

    fn envelope(content: &str) -> String {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 64, "total_tokens": 876}
        })
        .to_string()
    }

    #[test]
    fn body_carries_call_parameters() {
        let config = ExtractionConfig::default();
        let req = build_request(&normalize("doc", 100), FieldSchema::rfp(), &config);
        let body = serde_json::to_value(ChatCompletionBody::from_request(&req)).unwrap();

        assert_eq!(body["model"], config.model.as_str());
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"].as_str().unwrap().contains("doc"));
    }

    #[test]
    fn parse_reply_object() {
        let reply = parse_reply(&envelope(r#"{"Bid Number": "RFP-7", "Extra": 3}"#)).unwrap();
        assert_eq!(reply.result.get("Bid Number").as_text(), Some("RFP-7"));
        assert_eq!(reply.result.len(), 2);
        assert_eq!(
            reply.usage,
            Some(Usage {
                prompt_tokens: Some(812),
                completion_tokens: Some(64)
            })
        );
    }

    #[test]
    fn partial_usage_does_not_reject_reply() {
        let body = r#"{"choices":[{"message":{"content":"{\"Bid Number\":\"RFP-1\"}"}}],"usage":{"prompt_tokens":12,"total_tokens":12}}"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.result.get("Bid Number").as_text(), Some("RFP-1"));
        assert_eq!(
            reply.usage,
            Some(Usage {
                prompt_tokens: Some(12),
                completion_tokens: None
            })
        );

        let body = r#"{"choices":[{"message":{"content":"{}"}}],"usage":{"prompt_tokens":null,"completion_tokens":3}}"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.usage.and_then(|u| u.prompt_tokens), None);
        assert_eq!(reply.usage.and_then(|u| u.completion_tokens), Some(3));
    }

    #[test]
    fn unreadable_usage_is_dropped() {
        let body = r#"{"choices":[{"message":{"content":"{}"}}],"usage":{"prompt_tokens":"many"}}"#;
        let reply = parse_reply(body).unwrap();
        assert!(reply.result.is_empty());
        assert_eq!(reply.usage, None);
    }

    #[test]
    fn parse_reply_rejects_prose() {
        let err = parse_reply(&envelope("Sorry, I cannot process this.")).unwrap_err();
        assert!(matches!(err, RfpError::MalformedResponse { .. }), "got {err:?}");
    }

    #[test]
    fn parse_reply_rejects_non_object_json() {
        let err = parse_reply(&envelope(r#"["Bid Number"]"#)).unwrap_err();
        assert!(err.to_string().contains("an array"), "got {err}");
    }

    #[test]
    fn parse_reply_rejects_fenced_json() {
        let err = parse_reply(&envelope("```json\n{\"a\": 1}\n```")).unwrap_err();
        assert!(matches!(err, RfpError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_reply_rejects_empty_choices_and_null_content() {
        let err = parse_reply(r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));

        let err = parse_reply(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap_err();
        assert!(err.to_string().contains("no content"));

        let err = parse_reply("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, RfpError::MalformedResponse { .. }));
    }

    #[test]
    fn error_detail_prefers_openai_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            error_detail(body, StatusCode::UNAUTHORIZED),
            "Incorrect API key provided"
        );
        assert_eq!(error_detail("", StatusCode::BAD_GATEWAY), "Bad Gateway");
        assert_eq!(error_detail("upstream down", StatusCode::BAD_GATEWAY), "upstream down");
    }

    #[tokio::test]
    async fn missing_credential_fails_before_io() {
        // Unroutable URL: if a request were attempted this would be Transport.
        let config = ExtractionConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = ExtractionClient::new(&config).unwrap();
        let req = build_request(&normalize("doc", 100), FieldSchema::rfp(), &config);

        let err = client.extract(&req, None).await.unwrap_err();
        assert!(matches!(err, RfpError::Authentication { .. }), "got {err:?}");

        let blank = Credential::new("  ");
        let err = client.extract(&req, Some(&blank)).await.unwrap_err();
        assert!(matches!(err, RfpError::Authentication { .. }), "got {err:?}");
    }
}
