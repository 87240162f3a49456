// tests/api_tests.rs

use std::sync::Arc;

use photos_api::{
    blob::MemoryBlobStore,
    config::Config,
    routes,
    state::AppState,
    store::{ContainerName, MemoryDocumentStore},
};
use serde_json::{Value, json};

const CREATOR_KEY: &str = "test_creator_key";

struct TestApp {
    address: String,
    documents: Arc<MemoryDocumentStore>,
    blobs: Arc<MemoryBlobStore>,
}

/// Helper function to spawn the app on a random port for testing.
/// Uses the in-memory stores, so no external services are needed.
async fn spawn_app() -> TestApp {
    let documents = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(MemoryBlobStore::new("http://blobs.test/images"));

    let config = Config::for_memory(CREATOR_KEY);
    let state = AppState::new(config, documents.clone(), blobs.clone());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        documents,
        blobs,
    }
}

async fn create_post(client: &reqwest::Client, app: &TestApp, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/posts", app.address))
        .header("x-creator-key", CREATOR_KEY)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

fn assert_newest_first(items: &[Value]) {
    for pair in items.windows(2) {
        let (a, b) = (pair[0]["createdAt"].as_str().unwrap(), pair[1]["createdAt"].as_str().unwrap());
        assert!(a >= b, "{} should not be older than {}", a, b);
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_post_fills_defaults() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = create_post(
        &client,
        &app,
        json!({ "title": "Sunset", "imageUrl": "http://x/1.jpg" }),
    )
    .await;

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let post: Value = response.json().await.unwrap();
    assert!(!post["id"].as_str().unwrap().is_empty());
    assert_eq!(post["title"], "Sunset");
    assert_eq!(post["caption"], "");
    assert_eq!(post["location"], "");
    assert_eq!(post["people"], "");
    assert_eq!(post["imageUrl"], "http://x/1.jpg");
    assert!(post["createdAt"].as_str().unwrap().ends_with('Z'));

    let fetched: Value = client
        .get(format!("{}/api/posts/{}", app.address, post["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, post);
}

#[tokio::test]
async fn create_post_requires_creator_key() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let body = json!({ "title": "Sunset", "imageUrl": "http://x/1.jpg" });

    let missing = client
        .post(format!("{}/api/posts", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let wrong = client
        .post(format!("{}/api/posts", app.address))
        .header("x-creator-key", "not-the-key")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    // A bad key is reported even when the body is also invalid.
    let wrong_and_malformed = client
        .post(format!("{}/api/posts", app.address))
        .header("x-creator-key", "not-the-key")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_and_malformed.status().as_u16(), 401);

    assert_eq!(app.documents.document_count(ContainerName::Posts).await, 0);
}

#[tokio::test]
async fn create_post_requires_title_and_image_url() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "imageUrl": "http://x/1.jpg" }),
        json!({ "title": "", "imageUrl": "http://x/1.jpg" }),
        json!({ "title": "Sunset" }),
        json!({ "title": "Sunset", "imageUrl": "" }),
    ] {
        let response = create_post(&client, &app, body).await;
        assert_eq!(response.status().as_u16(), 400);
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }

    let malformed = client
        .post(format!("{}/api/posts", app.address))
        .header("x-creator-key", CREATOR_KEY)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 400);

    assert_eq!(app.documents.document_count(ContainerName::Posts).await, 0);
}

#[tokio::test]
async fn get_unknown_post_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/posts/does-not-exist", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error"], "Post not found");
}

#[tokio::test]
async fn list_posts_newest_first() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for title in ["first", "second", "third"] {
        let response = create_post(
            &client,
            &app,
            json!({ "title": title, "imageUrl": "http://x/1.jpg" }),
        )
        .await;
        assert_eq!(response.status().as_u16(), 201);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let posts: Vec<Value> = client
        .get(format!("{}/api/posts", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let titles: Vec<&str> = posts.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
    assert_newest_first(&posts);
}

#[tokio::test]
async fn comments_are_scoped_to_their_post() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for (post, text) in [("p1", "one"), ("p2", "other post"), ("p1", "two")] {
        let response = client
            .post(format!("{}/api/posts/{}/comments", app.address, post))
            .json(&json!({ "author": "Ada", "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let comments: Vec<Value> = client
        .get(format!("{}/api/posts/p1/comments", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c["postId"] == "p1"));
    assert_eq!(comments[0]["text"], "two");
    assert_eq!(comments[1]["text"], "one");
    assert_newest_first(&comments);
}

#[tokio::test]
async fn comment_author_is_trimmed_and_defaulted() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/posts/p1/comments", app.address);

    let anonymous: Value = client
        .post(&url)
        .json(&json!({ "text": "  nice shot  " }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(anonymous["author"], "Anonymous");
    assert_eq!(anonymous["text"], "nice shot");

    // Legacy clients send `name`.
    let named: Value = client
        .post(&url)
        .json(&json!({ "name": " Grace ", "text": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(named["author"], "Grace");
}

#[tokio::test]
async fn blank_comment_is_rejected_without_write() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/posts/p1/comments", app.address);

    client
        .post(&url)
        .json(&json!({ "text": "first" }))
        .send()
        .await
        .unwrap();
    let before: Vec<Value> = client.get(&url).send().await.unwrap().json().await.unwrap();

    let response = client
        .post(&url)
        .json(&json!({ "author": "Ada", "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let after: Vec<Value> = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn ratings_aggregate_per_post() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/posts/new-post/rating", app.address);

    let mut last = Value::Null;
    for rating in [json!(5), json!(3), json!("4")] {
        let response = client
            .post(&url)
            .json(&json!({ "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        last = response.json().await.unwrap();
    }

    assert_eq!(last["id"], "new-post");
    assert_eq!(last["postId"], "new-post");
    assert_eq!(last["count"], 3);
    assert_eq!(last["sum"].as_f64(), Some(12.0));
    assert_eq!(last["avg"].as_f64(), Some(4.0));
    assert_eq!(app.documents.document_count(ContainerName::Ratings).await, 1);
}

#[tokio::test]
async fn invalid_ratings_are_rejected_without_write() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/posts/p1/rating", app.address);

    for body in [
        json!({ "rating": 0 }),
        json!({ "rating": 6 }),
        json!({ "rating": "abc" }),
        json!({ "rating": null }),
        json!({}),
    ] {
        let response = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 400, "body: {}", body);
    }
    assert_eq!(app.documents.document_count(ContainerName::Ratings).await, 0);

    let first: Value = client
        .post(&url)
        .json(&json!({ "rating": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["count"], 1);
}

#[tokio::test]
async fn upload_then_create_post() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/uploads", app.address);

    let form = || {
        reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(b"\x89PNG fake image".to_vec())
                .file_name("Sunset.PNG")
                .mime_str("image/png")
                .unwrap(),
        )
    };

    let unauthorized = client.post(&url).multipart(form()).send().await.unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    let no_file = client
        .post(&url)
        .header("x-creator-key", CREATOR_KEY)
        .multipart(reqwest::multipart::Form::new().text("caption", "no file here"))
        .send()
        .await
        .unwrap();
    assert_eq!(no_file.status().as_u16(), 400);
    assert!(app.blobs.keys().await.is_empty());

    let uploaded = client
        .post(&url)
        .header("x-creator-key", CREATOR_KEY)
        .multipart(form())
        .send()
        .await
        .unwrap();
    assert_eq!(uploaded.status().as_u16(), 201);
    let image_url = uploaded.json::<Value>().await.unwrap()["url"]
        .as_str()
        .unwrap()
        .to_string();

    let key = image_url.strip_prefix("http://blobs.test/images/").unwrap();
    assert!(key.ends_with(".png"));
    let blob = app.blobs.get(key).await.unwrap();
    assert_eq!(blob.content_type, "image/png");
    assert_eq!(&blob.bytes[..], b"\x89PNG fake image");

    let post = create_post(
        &client,
        &app,
        json!({ "title": "Uploaded", "imageUrl": image_url }),
    )
    .await;
    assert_eq!(post.status().as_u16(), 201);
}
