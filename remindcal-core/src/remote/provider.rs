//! Provider subprocess protocol.
//!
//! Each external calendar is served by a provider binary
//! (`remindcal-provider-<name>`) that speaks JSON over stdin/stdout. Providers
//! manage their own credentials; remindcal only passes along the remote config.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{RemindError, RemindResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
/// Connecting may wait on the user (browser sign-in).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("remindcal-provider-{}", self.0)
    }

    fn binary_path(&self) -> RemindResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| RemindError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> RemindResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| RemindError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    /// Like [`call`](Self::call) with the longer interactive timeout.
    pub async fn call_interactive<C: ProviderCommand>(&self, cmd: C) -> RemindResult<C::Response> {
        timeout(CONNECT_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| RemindError::ProviderTimeout(CONNECT_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> RemindResult<R> {
        let params =
            serde_json::to_value(params).map_err(|e| RemindError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json =
            serde_json::to_string(&request).map_err(|e| RemindError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.0, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                RemindError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RemindError::Provider("Provider stdin unavailable".into()))?;
        stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RemindError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_response<R: serde::de::DeserializeOwned>(raw: &str) -> RemindResult<R> {
    if raw.trim().is_empty() {
        return Err(RemindError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(raw)
        .map_err(|e| RemindError::Provider(format!("Failed to parse response: {e}")))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(RemindError::Provider(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_name() {
        assert_eq!(Provider::from_name("google").binary_name(), "remindcal-provider-google");
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(matches!(
            parse_response::<()>("  \n"),
            Err(RemindError::Provider(_))
        ));
        assert!(matches!(
            parse_response::<()>("not json"),
            Err(RemindError::Provider(_))
        ));
        match parse_response::<()>(r#"{"status":"error","error":"revoked"}"#) {
            Err(RemindError::Provider(message)) => assert_eq!(message, "revoked"),
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_reported() {
        let provider = Provider::from_name("definitely-not-installed-xyz");
        let result = provider
            .call(crate::remote::protocol::Disconnect {
                remote_config: serde_json::Map::new(),
            })
            .await;
        assert!(matches!(result, Err(RemindError::ProviderNotInstalled(_))));
    }
}
