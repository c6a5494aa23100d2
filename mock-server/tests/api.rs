use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_seed, Post, Todo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app().oneshot(get_request("/todos")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn list_todos_honours_limit() {
    let resp = app_with_seed(20)
        .oneshot(get_request("/todos?_limit=5"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 5);
    assert_eq!(todos[0].id, 1);
}

#[tokio::test]
async fn list_posts_honours_limit() {
    let resp = app_with_seed(8)
        .oneshot(get_request("/posts?_limit=3"))
        .await
        .unwrap();

    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts.len(), 3);
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201_with_next_id() {
    let resp = app_with_seed(200)
        .oneshot(json_request(
            "POST",
            "/todos",
            r#"{"title":"New Todo","completed":false}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.id, 201);
    assert_eq!(todo.title, "New Todo");
    assert!(!todo.completed);
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", r#"{"not_title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = app().oneshot(get_request("/todos/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let resp = app().oneshot(get_request("/todos/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_collection_returns_404() {
    let resp = app_with_seed(5).oneshot(get_request("/todoss?_limit=5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update ---

#[tokio::test]
async fn replace_todo_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/todos/1", r#"{"title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replace_todo_overwrites_every_field() {
    let resp = app_with_seed(2)
        .oneshot(json_request("PUT", "/todos/2", r#"{"title":"Updated Todo"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.title, "Updated Todo");
    // seeded todo 2 was completed; PUT without the field resets it
    assert!(!todo.completed);
}

// --- delete ---

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/todos/1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- diagnostics ---

#[tokio::test]
async fn headers_are_echoed() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/headers")
                .header("X-Auth-Token", "secret")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers: std::collections::BTreeMap<String, String> = body_json(resp).await;
    assert_eq!(headers.get("x-auth-token").map(String::as_str), Some("secret"));
}

#[tokio::test]
async fn delay_replies_after_sleeping() {
    let resp = app().oneshot(get_request("/delay/10")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["delayed_ms"], 10);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/todos", r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Todo = body_json(resp).await;
    assert_eq!(created.title, "Walk dog");
    assert!(!created.completed);
    let id = created.id;

    // list — should contain the one todo
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/todos"))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, id);

    // patch — only completed
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/todos/{id}"),
            r#"{"completed":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog"); // unchanged
    assert!(updated.completed);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/todos/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/todos/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- response headers ---

#[tokio::test]
async fn cookies_route_repeats_set_cookie() {
    let resp = app().oneshot(get_request("/cookies")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies: Vec<_> = resp
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, vec!["session=abc", "theme=dark"]);
}
