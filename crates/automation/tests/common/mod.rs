#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use queue_pilot_automation::{AccountSnapshot, SharedSettings, StatusEvent, StatusKind, StatusSink};
use queue_pilot_client::{
    ClientConnection, Credential, CredentialProvider, Method, Payload, ProcessInspector,
    ServiceClient, ServiceError,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

pub struct StaticInspector {
    pub running: bool,
}

#[async_trait]
impl ProcessInspector for StaticInspector {
    async fn command_lines(&self, _executable: &str) -> Vec<Vec<String>> {
        if !self.running {
            return Vec::new();
        }
        vec![vec![
            "LeagueClientUx.exe".to_string(),
            "--app-port=51234".to_string(),
            "--remoting-auth-token=secret-token".to_string(),
        ]]
    }
}

/// Reply for one route: a JSON body or an error status.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Status(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Service double keyed by "METHOD path". Queued replies are consumed in
/// order and the last one repeats; unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedService {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: Method, path: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .insert(format!("{method} {path}"), replies.into_iter().collect());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path == path)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl ServiceClient for ScriptedService {
    async fn call(
        &self,
        _credential: &Credential,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ServiceError> {
        self.calls.lock().push(Call {
            method: method.clone(),
            path: path.to_string(),
            body,
        });

        let reply = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&format!("{method} {path}")) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Ok(Value::Null)) => Ok(Payload::Empty),
            Some(Reply::Ok(value)) => Ok(Payload::Json(value)),
            Some(Reply::Status(status)) => Err(ServiceError::Status {
                method,
                path: path.to_string(),
                status,
                body: Value::Null,
            }),
            None => Err(ServiceError::Status {
                method,
                path: path.to_string(),
                status: 404,
                body: Value::Null,
            }),
        }
    }
}

pub fn connection(service: Arc<ScriptedService>, running: bool) -> ClientConnection {
    let provider = Arc::new(CredentialProvider::new(Arc::new(StaticInspector { running })));
    ClientConnection::new(provider, service)
}

pub fn settings() -> SharedSettings {
    let settings = SharedSettings::new();
    settings.set_client_path(Some(PathBuf::from(
        "/games/Riot Games/Riot Client/RiotClientServices.exe",
    )));
    settings
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusEvent>>,
    accounts: Mutex<Vec<AccountSnapshot>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().clone()
    }

    pub fn steps(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.step).collect()
    }

    pub fn count(&self, kind: StatusKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.accounts.lock().clone()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, event: StatusEvent) {
        self.events.lock().push(event);
    }

    fn account_changed(&self, snapshot: AccountSnapshot) {
        self.accounts.lock().push(snapshot);
    }
}
