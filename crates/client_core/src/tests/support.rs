use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api::BlogClient, dispatcher::Dispatcher, session::SessionContext, transport::CommandInvoker,
    types::Environment,
};

/// Records every invocation and answers from a per-command script.
#[derive(Default)]
pub struct ScriptedInvoker {
    calls: Mutex<Vec<(String, Value)>>,
    responses: Mutex<HashMap<String, Result<Value, String>>>,
}

impl ScriptedInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn respond(&self, command: &str, result: Result<Value, String>) {
        self.responses
            .lock()
            .await
            .insert(command.to_string(), result);
    }

    pub async fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CommandInvoker for ScriptedInvoker {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, String> {
        self.calls.lock().await.push((command.to_string(), args));
        self.responses
            .lock()
            .await
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(format!("unexpected command {command}")))
    }
}

pub fn local_client(invoker: Arc<ScriptedInvoker>) -> BlogClient {
    let session = SessionContext::in_memory(Environment::LocalBridge);
    let dispatcher = Dispatcher::connect(session, "", Some(invoker)).expect("dispatcher");
    BlogClient::new(dispatcher)
}

pub async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}
