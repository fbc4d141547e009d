#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use foodgram::api::AppState;
use foodgram::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// 1x1 transparent PNG.
pub const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.media.root = std::env::temp_dir()
        .join(format!("foodgram-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;

    let state = foodgram::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: foodgram::api::router(state.clone()),
        state,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub text: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        if self.text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&self.text).expect("response is not JSON")
        }
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        Reply {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request("DELETE", uri, token, None).await
    }

    /// Registers `name` and returns `(user_id, token)`.
    pub async fn sign_up(&self, name: &str) -> (i64, String) {
        let email = format!("{name}@example.com");
        let reply = self
            .post(
                "/api/users/",
                None,
                json!({
                    "email": email,
                    "username": name,
                    "first_name": "Test",
                    "last_name": "User",
                    "password": "s3cret-pass",
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
        let id = reply.json()["id"].as_i64().unwrap();

        let reply = self
            .post(
                "/api/auth/token/login/",
                None,
                json!({"email": email, "password": "s3cret-pass"}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
        let token = reply.json()["auth_token"].as_str().unwrap().to_string();

        (id, token)
    }

    /// Seeds ingredients and returns their ids in the given order.
    pub async fn seed_ingredients(&self, rows: &[(&str, &str)]) -> Vec<i64> {
        let store = self.state.store();
        store
            .import_ingredients(
                rows.iter()
                    .map(|(name, unit)| ((*name).to_string(), (*unit).to_string()))
                    .collect(),
            )
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, unit) in rows {
            let found = store.search_ingredients(Some(*name)).await.unwrap();
            let ingredient = found
                .iter()
                .find(|i| i.name == *name && i.measurement_unit == *unit)
                .unwrap();
            ids.push(i64::from(ingredient.id));
        }
        ids
    }

    pub async fn create_recipe(&self, token: &str, name: &str, ingredients: Value) -> i64 {
        let reply = self
            .post(
                "/api/recipes/",
                Some(token),
                json!({
                    "ingredients": ingredients,
                    "image": PNG,
                    "name": name,
                    "text": "Mix and cook",
                    "cooking_time": 10,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
        reply.json()["id"].as_i64().unwrap()
    }
}
