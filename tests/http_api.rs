//! HTTP API tests against a real listener

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use students_api::http::{self, AppState};
use students_api::storage::{SimConfig, SimStorageBackend, SqliteBackend, StorageBackend};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    base: String,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(storage: Arc<dyn StorageBackend>, expose_errors: bool) -> Self {
        Self::start_with_grace(storage, expose_errors, Duration::from_secs(2)).await
    }

    async fn start_with_grace(
        storage: Arc<dyn StorageBackend>,
        expose_errors: bool,
        grace: Duration,
    ) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let state = AppState::new(storage, expose_errors);
        let handle = tokio::spawn(http::serve(
            listener,
            state,
            grace,
            async move {
                let _ = rx.await;
            },
        ));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            handle,
        }
    }

    async fn sqlite() -> Self {
        let storage = SqliteBackend::in_memory().await.unwrap();
        Self::start(Arc::new(storage), true).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (u16, Value) {
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap();
        (status, body)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, body: Value) -> (u16, Value) {
        self.send(self.client.post(self.url("/api/students")).json(&body))
            .await
    }

    async fn put(&self, body: Value) -> (u16, Value) {
        self.send(self.client.put(self.url("/api/students")).json(&body))
            .await
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        self.send(self.client.delete(self.url(path))).await
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

fn ana() -> Value {
    json!({"name": "Ana", "email": "ana@example.com", "age": 22})
}

#[tokio::test]
async fn test_crud_round_trip() {
    let server = TestServer::sqlite().await;

    let (status, body) = server.post(ana()).await;
    assert_eq!(status, 201);
    assert_eq!(body, json!({"status": "Ok", "data": {"id": 1}}));

    let (status, body) = server.get("/api/students/1").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"],
        json!({"id": 1, "name": "Ana", "email": "ana@example.com", "age": 22})
    );
    assert!(body.get("error").is_none());

    let (status, body) = server
        .put(json!({"id": 1, "name": "Ana B.", "email": "ana@example.com", "age": 23}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["age"], 23);
    assert_eq!(body["data"]["name"], "Ana B.");

    let (status, body) = server.get("/api/students").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = server.delete("/api/students/1").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!({"id": 1}));

    let (status, body) = server.get("/api/students/1").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"status": "Error", "error": "student 1 not found"}));

    server.stop().await;
}

#[tokio::test]
async fn test_list_empty_and_ordered() {
    let server = TestServer::sqlite().await;

    let (status, body) = server.get("/api/students").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));

    for name in ["Ana", "Bo", "Cy"] {
        let email = format!("{}@example.com", name.to_lowercase());
        server
            .post(json!({"name": name, "email": email, "age": 30}))
            .await;
    }

    let (_, body) = server.get("/api/students").await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana", "Bo", "Cy"]);

    server.stop().await;
}

#[tokio::test]
async fn test_validation_messages() {
    let server = TestServer::sqlite().await;

    let (status, body) = server.post(json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "field 'name' is required, field 'email' is required, \
         field 'age' must be greater than or equal to 18"
    );

    let (status, body) = server
        .post(json!({"name": "Ana", "email": "not-an-email", "age": 101}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "field 'email' must be a valid email address, \
         field 'age' must be less than or equal to 100"
    );

    // Nothing was persisted
    let (_, body) = server.get("/api/students").await;
    assert_eq!(body["data"], json!([]));

    server.stop().await;
}

#[tokio::test]
async fn test_bad_bodies_and_ids() {
    let server = TestServer::sqlite().await;

    let (status, body) = server
        .send(server.client.post(server.url("/api/students")).body(""))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "empty body");

    let (status, body) = server
        .send(server.client.post(server.url("/api/students")).body("{not json"))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["status"], "Error");

    let (status, body) = server.get("/api/students/abc").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid id");

    let (status, body) = server.delete("/api/students/abc").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid id");

    server.stop().await;
}

#[tokio::test]
async fn test_update_requires_existing_id() {
    let server = TestServer::sqlite().await;

    let (status, body) = server.put(ana()).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "please pass the id to update this student");

    let mut missing = ana();
    missing["id"] = json!(42);
    let (status, body) = server.put(missing).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "student 42 not found");

    let (_, body) = server.post(ana()).await;
    let id = body["data"]["id"].clone();
    let (status, body) = server
        .put(json!({"id": id, "name": "", "email": "ana@example.com", "age": 17}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "field 'name' is required, field 'age' must be greater than or equal to 18"
    );
    let (_, body) = server.get("/api/students/1").await;
    assert_eq!(body["data"]["name"], "Ana");

    server.stop().await;
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let server = TestServer::sqlite().await;

    let (status, body) = server.delete("/api/students/7").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "student 7 not found");

    server.stop().await;
}

#[tokio::test]
async fn test_storage_faults_are_500() {
    let faulty = || {
        Arc::new(SimStorageBackend::new(
            SimConfig::with_seed(3).with_fault_probability(1.0),
        ))
    };

    let hidden = TestServer::start(faulty(), false).await;
    let (status, body) = hidden.get("/api/students").await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"status": "Error", "error": "internal storage error"}));
    hidden.stop().await;

    let exposed = TestServer::start(faulty(), true).await;
    let (status, body) = exposed.post(ana()).await;
    assert_eq!(status, 500);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("create_student failed"), "{message}");
    exposed.stop().await;
}

#[tokio::test]
async fn test_health_reports_backend() {
    let server = TestServer::start(Arc::new(SimStorageBackend::default()), true).await;

    let (status, body) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["backend"], "sim");

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_storage() {
    let storage: Arc<dyn StorageBackend> = Arc::new(SimStorageBackend::default());
    let server = TestServer::start(Arc::clone(&storage), true).await;

    let (status, _) = server.post(ana()).await;
    assert_eq!(status, 201);

    server.stop().await;

    assert!(storage.get_students().await.is_err(), "storage must be closed");
}

#[tokio::test]
async fn test_zero_grace_still_closes_storage() {
    let storage: Arc<dyn StorageBackend> = Arc::new(SimStorageBackend::default());
    let server =
        TestServer::start_with_grace(Arc::clone(&storage), true, Duration::ZERO).await;

    let (status, _) = server.get("/api/students").await;
    assert_eq!(status, 200);

    server.stop().await;

    assert!(storage.get_students().await.is_err(), "storage must be closed");
}
