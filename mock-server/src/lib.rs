use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::AppendHeaders,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(rename = "_limit")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Store {
    todos: BTreeMap<u64, Todo>,
    posts: BTreeMap<u64, Post>,
}

impl Store {
    /// A store holding `count` todos and `count` posts with ids `1..=count`.
    pub fn seeded(count: u64) -> Self {
        let mut store = Store::default();
        for id in 1..=count {
            store.todos.insert(
                id,
                Todo {
                    id,
                    title: format!("todo {id}"),
                    completed: id % 2 == 0,
                },
            );
            store.posts.insert(
                id,
                Post {
                    id,
                    title: format!("post {id}"),
                    body: format!("body of post {id}"),
                },
            );
        }
        store
    }

    fn next_todo_id(&self) -> u64 {
        self.todos.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_post_id(&self) -> u64 {
        self.posts.keys().next_back().map_or(1, |id| id + 1)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Store::default())
}

pub fn app_with_seed(count: u64) -> Router {
    router(Store::seeded(count))
}

fn router(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(replace_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .route("/posts", get(list_posts).post(create_post))
        .route("/delay/{ms}", get(delay))
        .route("/headers", get(echo_headers))
        .route("/cookies", get(set_cookies))
        .with_state(db)
}

pub async fn run(listener: TcpListener, seed: u64) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_seed(seed)).await
}

async fn list_todos(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    let limit = params.limit.unwrap_or(usize::MAX);
    Json(store.todos.values().take(limit).cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let mut store = db.write().await;
    let todo = Todo {
        id: store.next_todo_id(),
        title: input.title,
        completed: input.completed,
    };
    debug!(id = todo.id, "todo created");
    store.todos.insert(todo.id, todo.clone());
    (StatusCode::CREATED, Json(todo))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Todo>, StatusCode> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<CreateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    todo.title = input.title;
    todo.completed = input.completed;
    Ok(Json(todo.clone()))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .todos
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_posts(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Post>> {
    let store = db.read().await;
    let limit = params.limit.unwrap_or(usize::MAX);
    Json(store.posts.values().take(limit).cloned().collect())
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<CreatePost>,
) -> (StatusCode, Json<Post>) {
    let mut store = db.write().await;
    let post = Post {
        id: store.next_post_id(),
        title: input.title,
        body: input.body,
    };
    store.posts.insert(post.id, post.clone());
    (StatusCode::CREATED, Json(post))
}

/// Replies after sleeping `ms` milliseconds.
async fn delay(Path(ms): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(serde_json::json!({ "delayed_ms": ms }))
}

/// Echoes the request headers as a JSON object with lowercase names.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    )
}

/// Replies with repeated `Set-Cookie` and `Vary` response headers.
async fn set_cookies() -> impl axum::response::IntoResponse {
    (
        AppendHeaders([
            (header::SET_COOKIE, "session=abc"),
            (header::SET_COOKIE, "theme=dark"),
            (header::VARY, "Origin"),
            (header::VARY, "Accept"),
        ]),
        Json(serde_json::json!({ "cookies": 2 })),
    )
}
