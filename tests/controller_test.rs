use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

mod common;
use common::{insert_article, seed_articles, setup_test_app, setup_test_db};

/// Sends requests through the app while keeping the session cookie, like a browser.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    async fn send(&mut self, method: &str, uri: &str, form: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    async fn get_json(&mut self, uri: &str) -> Value {
        let response = self.send("GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        json_body(response).await
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn titles(view: &Value) -> Vec<&str> {
    view["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entity| entity["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_index_lists_entities_in_default_order() {
    let db = setup_test_db().await.unwrap();
    seed_articles(&db, 3).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let view = client.get_json("/articles").await;
    assert_eq!(titles(&view), vec!["Article 1", "Article 2", "Article 3"]);
    assert_eq!(view["flashes"], json!([]));
    assert!(view.get("totalCount").is_none() && view.get("total_count").is_none());
}

#[tokio::test]
async fn test_paginated_index_sets_content_range() {
    let db = setup_test_db().await.unwrap();
    seed_articles(&db, 25).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let response = client.send("GET", "/articles/paginated?page=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Content-Range").unwrap(),
        "article 10-19/25"
    );

    let view = json_body(response).await;
    assert_eq!(view["entities"].as_array().unwrap().len(), 10);
    assert_eq!(view["total_count"], json!(25));
    assert_eq!(view["pages"], json!(3));
    assert_eq!(view["entities"][0]["title"], json!("Article 11"));
}

#[tokio::test]
async fn test_filters_stick_until_reset() {
    let db = setup_test_db().await.unwrap();
    seed_articles(&db, 6).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let view = client
        .get_json("/articles?article_filter_status=published&article_sorting_views=desc")
        .await;
    assert_eq!(titles(&view), vec!["Article 6", "Article 4", "Article 2"]);

    let view = client.get_json("/articles").await;
    assert_eq!(titles(&view), vec!["Article 6", "Article 4", "Article 2"]);

    let response = client.send("POST", "/articles/filters/reset", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/articles");

    let view = client.get_json("/articles").await;
    assert_eq!(view["entities"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_search_filter_from_request() {
    let db = setup_test_db().await.unwrap();
    insert_article(&db, "Learning Rust", "draft", 1).await.unwrap();
    insert_article(&db, "Gardening", "draft", 2).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let view = client.get_json("/articles?article_filter_search=rust").await;
    assert_eq!(titles(&view), vec!["Learning Rust"]);
}

#[tokio::test]
async fn test_new_form_is_blank() {
    let db = setup_test_db().await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let view = client.get_json("/articles/new").await;
    assert_eq!(view["entity"], Value::Null);
    assert_eq!(view["method"], json!("POST"));
    assert_eq!(view["action"], json!("/articles"));
    assert_eq!(view["values"]["title"], json!(""));
    assert_eq!(view["errors"], json!([]));
}

#[tokio::test]
async fn test_create_redirects_with_notice() {
    let db = setup_test_db().await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let response = client
        .send("POST", "/articles", Some("title=Hello+World&views=3&status=published"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/articles");

    let view = client.get_json("/articles").await;
    let article = &view["entities"][0];
    assert_eq!(article["slug"], json!("hello-world"));
    assert_eq!(article["views"], json!(3));

    let id = article["id"].as_str().unwrap();
    assert_eq!(
        view["flashes"],
        json!([{
            "kind": "notice",
            "message": format!("The entity with ID '{id}' has been saved.")
        }])
    );

    // Flashes are shown once
    let view = client.get_json("/articles").await;
    assert_eq!(view["flashes"], json!([]));
}

#[tokio::test]
async fn test_create_with_errors_renders_form() {
    let db = setup_test_db().await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let response = client.send("POST", "/articles", Some("title=&views=-4")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view = json_body(response).await;
    assert_eq!(view["method"], json!("POST"));
    assert_eq!(view["values"]["views"], json!("-4"));
    assert_eq!(view["errors"][0]["field"], json!("title"));
    assert_eq!(view["errors"][1]["field"], json!("views"));
    assert_eq!(
        view["flashes"],
        json!([{
            "kind": "error",
            "message": "There are one or more errors inside of the entity's form."
        }])
    );

    let view = client.get_json("/articles").await;
    assert!(view["entities"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_show_and_edit() {
    let db = setup_test_db().await.unwrap();
    let article = insert_article(&db, "Shown", "draft", 1).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let view = client.get_json(&format!("/articles/{}", article.id)).await;
    assert_eq!(view["entity"]["title"], json!("Shown"));

    let view = client.get_json(&format!("/articles/{}/edit", article.id)).await;
    assert_eq!(view["method"], json!("PUT"));
    assert_eq!(view["action"], json!(format!("/articles/{}", article.id)));
    assert_eq!(view["values"]["title"], json!("Shown"));
}

#[tokio::test]
async fn test_missing_entity_redirects_with_warning() {
    let db = setup_test_db().await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));
    let id = Uuid::new_v4();

    for uri in [
        format!("/articles/{id}"),
        format!("/articles/{id}/edit"),
        "/articles/not-a-uuid".to_string(),
    ] {
        let response = client.send("GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&response), "/articles");
    }

    let view = client.get_json("/articles").await;
    let flashes = view["flashes"].as_array().unwrap();
    assert_eq!(flashes.len(), 3);
    assert_eq!(flashes[0]["kind"], json!("warning"));
    assert_eq!(
        flashes[0]["message"],
        json!(format!("The entity with ID '{id}' does not exist."))
    );
    assert_eq!(
        flashes[2]["message"],
        json!("The entity with ID 'not-a-uuid' does not exist.")
    );
}

#[tokio::test]
async fn test_update_redirects_to_show() {
    let db = setup_test_db().await.unwrap();
    let article = insert_article(&db, "Before", "draft", 1).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));
    let uri = format!("/articles/{}", article.id);

    let response = client
        .send("PUT", &uri, Some("title=After&status=published&views=9"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), uri);

    let view = client.get_json(&uri).await;
    assert_eq!(view["entity"]["title"], json!("After"));
    assert_eq!(view["entity"]["slug"], json!("after"));
    assert_eq!(view["flashes"][0]["kind"], json!("notice"));
    assert_eq!(
        view["flashes"][0]["message"],
        json!(format!("The entity with ID '{}' has been saved.", article.id))
    );
}

#[tokio::test]
async fn test_update_through_post() {
    let db = setup_test_db().await.unwrap();
    let article = insert_article(&db, "Before", "draft", 1).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));
    let uri = format!("/articles/{}", article.id);

    let response = client.send("POST", &uri, Some("title=Posted")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let view = client.get_json(&uri).await;
    assert_eq!(view["entity"]["title"], json!("Posted"));
}

#[tokio::test]
async fn test_update_with_errors_keeps_entity() {
    let db = setup_test_db().await.unwrap();
    let article = insert_article(&db, "Before", "draft", 1).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));
    let uri = format!("/articles/{}", article.id);

    let response = client.send("PUT", &uri, Some("title=")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view = json_body(response).await;
    assert_eq!(view["method"], json!("PUT"));
    assert_eq!(view["action"], json!(uri));
    assert_eq!(view["entity"]["title"], json!("Before"));
    assert_eq!(view["flashes"][0]["kind"], json!("error"));

    let view = client.get_json(&uri).await;
    assert_eq!(view["entity"]["title"], json!("Before"));
}

#[tokio::test]
async fn test_delete_redirects_with_notice() {
    let db = setup_test_db().await.unwrap();
    let article = insert_article(&db, "Doomed", "draft", 1).await.unwrap();
    let kept = insert_article(&db, "Kept", "draft", 2).await.unwrap();
    let mut client = Client::new(setup_test_app(db, 10));

    let response = client
        .send("DELETE", &format!("/articles/{}", article.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/articles");

    let response = client
        .send("POST", &format!("/articles/{}/delete", kept.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let view = client.get_json("/articles").await;
    assert!(view["entities"].as_array().unwrap().is_empty());
    assert_eq!(
        view["flashes"],
        json!([
            {
                "kind": "notice",
                "message": format!("The entity with ID '{}' has been deleted.", article.id)
            },
            {
                "kind": "notice",
                "message": format!("The entity with ID '{}' has been deleted.", kept.id)
            }
        ])
    );

    let response = client
        .send("DELETE", &format!("/articles/{}", article.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let view = client.get_json("/articles").await;
    assert_eq!(view["flashes"][0]["kind"], json!("warning"));
}
