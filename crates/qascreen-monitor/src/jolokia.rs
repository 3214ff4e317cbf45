//! Metric source backed by a Jolokia agent (JMX over HTTP).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{SourceError, SourceResult};
use crate::source::MetricSource;

/// Connection settings for a Jolokia agent.
#[derive(Debug, Clone)]
pub struct JolokiaConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
    pub timeout: Duration,
}

impl JolokiaConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jolokia/", self.host, self.port)
    }
}

/// Reply envelope returned by Jolokia for every request.
#[derive(Debug, Deserialize)]
struct JolokiaResponse {
    status: u16,
    #[serde(default)]
    value: Value,
    error: Option<String>,
    error_type: Option<String>,
}

/// Reads MBean attributes through a Jolokia agent on the target node.
pub struct JolokiaSource {
    client: reqwest::Client,
    config: JolokiaConfig,
}

impl JolokiaSource {
    /// Builds the client and verifies the agent answers.
    pub async fn connect(config: JolokiaConfig) -> SourceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        let source = Self { client, config };
        let agent = source.agent_version().await?;
        tracing::info!(
            endpoint = %source.config.endpoint(),
            agent = %agent,
            "Connected to metric source"
        );

        Ok(source)
    }

    async fn agent_version(&self) -> SourceResult<String> {
        let response = self.request(json!({ "type": "version" })).await?;
        if response.status != 200 {
            return Err(SourceError::Remote(
                response.error.unwrap_or_else(|| format!("status {}", response.status)),
            ));
        }
        Ok(response
            .value
            .get("agent")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    async fn request(&self, body: Value) -> SourceResult<JolokiaResponse> {
        let mut request = self.client.post(self.config.endpoint()).json(&body);
        if let Some((user, password)) = &self.config.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<JolokiaResponse>().await?)
    }
}

#[async_trait]
impl MetricSource for JolokiaSource {
    async fn get_attribute(&self, object_name: &str, attribute: &str) -> SourceResult<f64> {
        let response = self
            .request(json!({
                "type": "read",
                "mbean": object_name,
                "attribute": attribute,
            }))
            .await?;

        interpret(response, object_name, attribute)
    }
}

fn interpret(response: JolokiaResponse, object_name: &str, attribute: &str) -> SourceResult<f64> {
    match response.status {
        200 => numeric_value(&response.value).ok_or_else(|| SourceError::InvalidValue {
            object_name: object_name.to_string(),
            attribute: attribute.to_string(),
            value: response.value.to_string(),
        }),
        404 => Err(SourceError::not_found(object_name, attribute)),
        status => Err(SourceError::Remote(format!(
            "{} ({}): {}",
            response.error_type.as_deref().unwrap_or("error"),
            status,
            response.error.as_deref().unwrap_or("no details")
        ))),
    }
}

/// Gauges arrive as JSON numbers; some agents serialize longs as strings.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MBEAN: &str = "org.apache.cassandra.metrics:type=ClientRequest,scope=Read,name=Latency";

    fn response(raw: &str) -> JolokiaResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_numeric_value_reply() {
        let reply = response(r#"{"request":{},"value":1234.5,"timestamp":1,"status":200}"#);
        assert_eq!(interpret(reply, MBEAN, "95thPercentile").unwrap(), 1234.5);
    }

    #[test]
    fn test_long_serialized_as_string() {
        let reply = response(r#"{"value":"9007199254740993","status":200}"#);
        assert!(interpret(reply, MBEAN, "Value").unwrap() > 9.0e15);
    }

    #[test]
    fn test_missing_mbean_maps_to_not_found() {
        let reply = response(
            r#"{"error_type":"javax.management.InstanceNotFoundException","error":"no such mbean","status":404}"#,
        );
        let err = interpret(reply, MBEAN, "Value").unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let reply = response(r#"{"value":{"count":3},"status":200}"#);
        let err = interpret(reply, MBEAN, "Value").unwrap_err();
        assert!(matches!(err, SourceError::InvalidValue { .. }));
    }

    #[test]
    fn test_other_status_is_remote_error() {
        let reply = response(
            r#"{"error_type":"java.lang.SecurityException","error":"denied","status":403}"#,
        );
        let err = interpret(reply, MBEAN, "Value").unwrap_err();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_endpoint_format() {
        let config = JolokiaConfig::new("10.0.0.7", 8778);
        assert_eq!(config.endpoint(), "http://10.0.0.7:8778/jolokia/");
    }
}
