//! Shared setup for integration tests.
//!
//! Every test builds its own dispatcher around the demo service with a
//! fixed secret, so chains and sessions can be forged or checked directly.
#![allow(dead_code)]

use std::sync::Arc;

use rodcall::demo::{self, DemoSession};
use rodcall::transport::{HttpTransport, LocalTransport};
use rodcall::{Dispatcher, DispatcherConfig, RemoteClient, Secret};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const SECRET: &str = "integration-test-secret";

pub fn secret() -> Secret {
    Secret::from(SECRET)
}

pub fn demo_dispatcher() -> Arc<Dispatcher<DemoSession>> {
    let registry = Arc::new(demo::registry().expect("demo registry"));
    Arc::new(Dispatcher::new(DispatcherConfig::new(secret()), registry, demo::root))
}

pub fn local_client(
    dispatcher: &Arc<Dispatcher<DemoSession>>,
) -> RemoteClient<LocalTransport<DemoSession>> {
    RemoteClient::new(LocalTransport::new(Arc::clone(dispatcher)))
}

/// A demo server on an ephemeral port.
pub struct TestServer {
    pub url: String,
    pub dispatcher: Arc<Dispatcher<DemoSession>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let dispatcher = demo_dispatcher();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}/", listener.local_addr().expect("local addr"));
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(rodcall_server::http::serve(
            listener,
            Arc::clone(&dispatcher),
            async move {
                let _ = rx.await;
            },
        ));
        Self {
            url,
            dispatcher,
            shutdown: Some(tx),
            task,
        }
    }

    pub fn client(&self) -> RemoteClient<HttpTransport> {
        let timeout = std::time::Duration::from_secs(5);
        let transport = HttpTransport::new(self.url.clone(), timeout).expect("client");
        RemoteClient::new(transport)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.expect("server task").expect("server io");
    }
}
