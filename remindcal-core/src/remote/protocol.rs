//! Defines the JSON protocol used between remindcal and external calendar
//! provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::external::ForeignEvent;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Connect,
    Disconnect,
    SignOut,
    ListEvents,
}

/// Request sent to the provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent back by the provider.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// Connect the account described by the remote config. The provider answers
/// with the account identifier (e.g. an email address).
#[derive(Debug, Serialize, Deserialize)]
pub struct Connect {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for Connect {
    type Response = String;
    fn command() -> Command {
        Command::Connect
    }
}

/// Stop syncing the account; credentials are kept.
#[derive(Debug, Serialize, Deserialize)]
pub struct Disconnect {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for Disconnect {
    type Response = ();
    fn command() -> Command {
        Command::Disconnect
    }
}

/// Forget the account's credentials.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignOut {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for SignOut {
    type Response = ();
    fn command() -> Command {
        Command::SignOut
    }
}

/// List events between two dates (`YYYY-MM-DD`, inclusive), each already
/// resolved to a single date.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<ForeignEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let mut remote_config = serde_json::Map::new();
        remote_config.insert("google_account".into(), "me@example.com".into());
        let params = serde_json::to_value(ListEvents {
            remote_config,
            from: "2024-03-01".into(),
            to: "2024-03-31".into(),
        })
        .unwrap();

        let request = serde_json::to_value(Request {
            command: ListEvents::command(),
            params,
        })
        .unwrap();
        assert_eq!(request["command"], "list_events");
        assert_eq!(request["params"]["google_account"], "me@example.com");
        assert_eq!(request["params"]["from"], "2024-03-01");
    }

    #[test]
    fn test_response_parsing() {
        let ok = r#"{"status":"success","data":[{"id":"e1","title":"Standup",
            "date":{"year":2024,"month":2,"day":4},"editable":true}]}"#;
        match serde_json::from_str::<Response<Vec<ForeignEvent>>>(ok).unwrap() {
            Response::Success { data } => {
                assert_eq!(data.len(), 1);
                assert!(data[0].editable);
                assert!(!data[0].deletable);
            }
            Response::Error { error } => panic!("unexpected error {error}"),
        }

        let err = r#"{"status":"error","error":"token expired"}"#;
        assert!(matches!(
            serde_json::from_str::<Response<()>>(err).unwrap(),
            Response::Error { .. }
        ));
    }
}
