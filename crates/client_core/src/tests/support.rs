use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use shared::{
    domain::{Lesson, LessonId},
    protocol::{Order, SearchQuery, SpaceUpdate},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api::LessonsApi,
    error::{ShopError, ShopResult},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    ListLessons,
    Search(String),
    CreateOrder(Order),
    UpdateSpace(LessonId, u32),
}

/// In-memory backend double that records every call.
#[derive(Default)]
pub(crate) struct FakeApi {
    lessons: Vec<Lesson>,
    search_results: HashMap<String, Vec<Lesson>>,
    search_delays: HashMap<String, Duration>,
    order_delay: Option<Duration>,
    fail_list: bool,
    fail_order: bool,
    fail_update_for: Option<LessonId>,
    calls: StdMutex<Vec<ApiCall>>,
}

impl FakeApi {
    pub(crate) fn with_lessons(lessons: Vec<Lesson>) -> Self {
        Self {
            lessons,
            ..Self::default()
        }
    }

    pub(crate) fn search_result(mut self, query: &str, lessons: Vec<Lesson>) -> Self {
        self.search_results.insert(query.to_string(), lessons);
        self
    }

    pub(crate) fn search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    pub(crate) fn order_delay(mut self, delay: Duration) -> Self {
        self.order_delay = Some(delay);
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub(crate) fn failing_order(mut self) -> Self {
        self.fail_order = true;
        self
    }

    pub(crate) fn failing_update_for(mut self, lesson_id: &str) -> Self {
        self.fail_update_for = Some(LessonId::new(lesson_id));
        self
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn order_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::CreateOrder(_)))
            .count()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

fn server_error(operation: &'static str) -> ShopError {
    ShopError::Server {
        operation,
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        message: "backend unavailable".to_string(),
    }
}

#[async_trait]
impl LessonsApi for FakeApi {
    async fn list_lessons(&self) -> ShopResult<Vec<Lesson>> {
        self.record(ApiCall::ListLessons);
        if self.fail_list {
            return Err(server_error("fetch lessons"));
        }
        Ok(self.lessons.clone())
    }

    async fn search_lessons(&self, query: &str) -> ShopResult<Vec<Lesson>> {
        self.record(ApiCall::Search(query.to_string()));
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn create_order(&self, order: &Order) -> ShopResult<()> {
        self.record(ApiCall::CreateOrder(order.clone()));
        if let Some(delay) = self.order_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_order {
            return Err(server_error("place order"));
        }
        Ok(())
    }

    async fn update_space(&self, lesson_id: &LessonId, space: u32) -> ShopResult<()> {
        self.record(ApiCall::UpdateSpace(lesson_id.clone(), space));
        if self.fail_update_for.as_ref() == Some(lesson_id) {
            return Err(server_error("update lesson space"));
        }
        Ok(())
    }
}

pub(crate) fn lesson(id: &str, topic: &str, location: &str, price: f64, space: u32) -> Lesson {
    Lesson::new(id, topic, location, price, space)
}

pub(crate) fn catalogue() -> Vec<Lesson> {
    vec![
        lesson("L1", "Math", "Hendon", 20.0, 4),
        lesson("L2", "English", "Colindale", 15.0, 1),
        lesson("L3", "Music", "Brent Cross", 30.0, 0),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Search(String),
    Order(serde_json::Value),
    Space(String, serde_json::Value),
}

#[derive(Clone)]
struct BackendState {
    lessons: Vec<Lesson>,
    fail_orders: bool,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

async fn handle_list(State(state): State<BackendState>) -> Json<Vec<Lesson>> {
    Json(state.lessons.clone())
}

async fn handle_search(
    State(state): State<BackendState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Lesson>> {
    let needle = query.q.to_ascii_lowercase();
    state.recorded.lock().await.push(Recorded::Search(query.q));
    Json(
        state
            .lessons
            .iter()
            .filter(|lesson| lesson.topic.to_ascii_lowercase().contains(&needle))
            .cloned()
            .collect(),
    )
}

async fn handle_order(
    State(state): State<BackendState>,
    Json(order): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.recorded.lock().await.push(Recorded::Order(order.clone()));
    if state.fail_orders {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": "order store offline" })),
        );
    }
    (StatusCode::CREATED, Json(order))
}

async fn handle_space(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    Json(update): Json<serde_json::Value>,
) -> StatusCode {
    let known = state.lessons.iter().any(|lesson| lesson.id.as_str() == id);
    let valid = serde_json::from_value::<SpaceUpdate>(update.clone()).is_ok();
    state.recorded.lock().await.push(Recorded::Space(id, update));
    match (known, valid) {
        (true, true) => StatusCode::OK,
        (false, _) => StatusCode::NOT_FOUND,
        (_, false) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Serves the four lesson routes on an ephemeral port.
pub(crate) async fn spawn_backend(
    lessons: Vec<Lesson>,
    fail_orders: bool,
) -> std::io::Result<(String, Arc<Mutex<Vec<Recorded>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        lessons,
        fail_orders,
        recorded: Arc::clone(&recorded),
    };
    let app = Router::new()
        .route("/lessons", get(handle_list))
        .route("/lessons/:id", put(handle_space))
        .route("/search", get(handle_search))
        .route("/orders", post(handle_order))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), recorded))
}
