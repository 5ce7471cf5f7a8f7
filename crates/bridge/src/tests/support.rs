use axum::Router;
use server_api::{ApiContext, AuthConfig};
use storage::Storage;
use tokio::net::TcpListener;

use crate::{host::CommandHost, passthrough::Passthrough};

pub async fn host(backend_url: Option<&str>) -> CommandHost {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext::new(
        storage,
        AuthConfig {
            jwt_secret: "bridge-test".into(),
            token_ttl_seconds: 60,
        },
    );
    CommandHost::new(api, Passthrough::new(backend_url).expect("passthrough"))
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
