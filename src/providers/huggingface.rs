use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use super::{GatewayFuture, ModelGateway};
use crate::error::ProviderError;
use crate::settings::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct HuggingFace {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HuggingFace {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model.trim_start_matches('/'))
    }

    fn post(&self, model: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(self.model_url(model));
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        model: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        debug!("provider: POST {}", self.model_url(model));
        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::Transport {
                model: model.to_string(),
                message: err.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Status {
            model: model.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl ModelGateway for HuggingFace {
    fn call_json<'a>(&'a self, model: &'a str, body: &'a Value) -> GatewayFuture<'a, Value> {
        Box::pin(async move {
            let response = self.send(model, self.post(model).json(body)).await?;
            response
                .json::<Value>()
                .await
                .map_err(|err| ProviderError::Decode {
                    model: model.to_string(),
                    message: err.to_string(),
                })
        })
    }

    fn call_binary<'a>(
        &'a self,
        model: &'a str,
        payload: &'a [u8],
        content_type: Option<&'a str>,
    ) -> GatewayFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let mut request = self.post(model).body(payload.to_vec());
            if let Some(content_type) = content_type {
                request = request.header(CONTENT_TYPE, content_type);
            }
            let response = self.send(model, request).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|err| ProviderError::Transport {
                    model: model.to_string(),
                    message: err.to_string(),
                })?;
            Ok(bytes.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::json;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/models/good/model",
                post(|headers: HeaderMap, body: Bytes| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let parsed: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    axum::Json(json!([{
                        "translation_text": format!("{}|{}", parsed["inputs"].as_str().unwrap_or(""), auth)
                    }]))
                }),
            )
            .route(
                "/models/bad/model",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model is loading") }),
            )
            .route(
                "/models/echo/audio",
                post(|headers: HeaderMap, body: Bytes| async move {
                    let mut out = headers
                        .get("content-type")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("none")
                        .as_bytes()
                        .to_vec();
                    out.push(b':');
                    out.extend_from_slice(&body);
                    out
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn call_json_sends_bearer_token_and_body() {
        let base = spawn_upstream().await;
        let gateway = HuggingFace::new(Some("tok".to_string())).with_base_url(base);
        let body = json!({ "inputs": "hello" });
        let value = gateway.call_json("good/model", &body).await.expect("json");
        assert_eq!(value[0]["translation_text"], "hello|Bearer tok");
    }

    #[tokio::test]
    async fn non_success_status_carries_upstream_body() {
        let base = spawn_upstream().await;
        let gateway = HuggingFace::new(None).with_base_url(base);
        let err = gateway
            .call_json("bad/model", &json!({}))
            .await
            .expect_err("should fail");
        match err {
            ProviderError::Status {
                model,
                status,
                body,
            } => {
                assert_eq!(model, "bad/model");
                assert_eq!(status, 503);
                assert_eq!(body, "model is loading");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn call_binary_forwards_content_type() {
        let base = spawn_upstream().await;
        let gateway = HuggingFace::new(None).with_base_url(base);
        let out = gateway
            .call_binary("echo/audio", b"RIFF", Some("audio/wav"))
            .await
            .expect("binary");
        assert_eq!(out, b"audio/wav:RIFF".to_vec());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let gateway = HuggingFace::new(None).with_base_url("http://127.0.0.1:9");
        let err = gateway
            .call_json("any/model", &json!({}))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
