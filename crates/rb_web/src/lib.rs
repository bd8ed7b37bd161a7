use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/api/articles/scrape", post(handlers::scrape_articles))
        .route(
            "/api/articles/:id",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `0.0.0.0:<port>` and serves until the process stops.
pub async fn serve(state: AppState, port: u16) -> rb_core::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 API listening on http://{}", addr);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use rb_core::{Article, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rb_core::config::FetchConfig;
    use rb_core::{Article, ArticleStorage, Fetcher, NewArticle};
    use rb_scrapers::{BackwardCrawler, ScraperManager};
    use rb_storage::backends::InMemoryStorage;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use url::Url;

    fn state_for(listing: &str) -> (AppState, Arc<dyn ArticleStorage>) {
        let storage: Arc<dyn ArticleStorage> = Arc::new(InMemoryStorage::new());
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let crawler = BackwardCrawler::new(fetcher, Url::parse(listing).unwrap());
        let manager = ScraperManager::new(storage.clone(), crawler, 5);
        (AppState::new(manager), storage)
    }

    fn app() -> (Router, Arc<dyn ArticleStorage>) {
        let (state, storage) = state_for("http://127.0.0.1:9/blogs/");
        (create_app(state), storage)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn seed(storage: &Arc<dyn ArticleStorage>, title: &str) -> Article {
        storage
            .upsert_by_url(NewArticle {
                title: title.to_string(),
                url: format!("https://beyondchats.com/blogs/{}/", title.to_lowercase()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/articles",
                json!({ "title": "Hello", "url": "https://a.com/hello", "author": "Ana" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["source"], "original");
        assert!(created["id"].as_str().is_some());

        let response = app
            .oneshot(Request::get("/api/articles").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["author"], "Ana");
    }

    #[tokio::test]
    async fn test_create_without_title_is_bad_request() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/api/articles", json!({ "url": "https://a.com/x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (app, _) = app();
        for method in ["GET", "DELETE"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/api/articles/missing")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_json(response).await, json!({ "message": "Article not found" }));
        }

        let response = app
            .oneshot(json_request("PUT", "/api/articles/missing", json!({ "title": "x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (app, storage) = app();
        let article = seed(&storage, "Original").await;
        let uri = format!("/api/articles/{}", article.id);

        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, json!({ "excerpt": "Short" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["excerpt"], "Short");
        assert_eq!(updated["title"], "Original");

        let response = app
            .clone()
            .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_endpoint_stores_batch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/blogs/")
            .with_status(200)
            .with_body(
                r#"<html><body>
                    <article class="entry-card">
                        <h2 class="entry-title"><a href="/blogs/first/">First</a></h2>
                        <time class="ct-meta-element-date" datetime="2022-01-01">Jan 1</time>
                    </article>
                </body></html>"#,
            )
            .create_async()
            .await;

        let (state, storage) = state_for(&format!("{}/blogs/", server.url()));
        let response = create_app(state)
            .oneshot(Request::post("/api/articles/scrape").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["articles"][0]["title"], "First");
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scrape_upstream_failure_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/blogs/")
            .with_status(500)
            .create_async()
            .await;

        let (state, _) = state_for(&format!("{}/blogs/", server.url()));
        let response = create_app(state)
            .oneshot(Request::post("/api/articles/scrape").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
