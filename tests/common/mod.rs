#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use village_sacco::backend::{app, AppState};
use village_sacco::config::AppConfig;
use village_sacco::contract::MockSaccoContract;
use village_sacco::database::db::{connection, migrate, queries};
use village_sacco::database::models::WalletAddress;
use village_sacco::sacco::members::Registration;
use village_sacco::sacco::Sacco;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        Self::build(config, MockSaccoContract::instant()).await
    }

    /// Every contract call waits `latency`, so concurrent requests overlap.
    pub async fn with_contract_latency(latency: Duration) -> Self {
        Self::build(AppConfig::default(), MockSaccoContract::new(latency)).await
    }

    async fn build(config: AppConfig, contract: MockSaccoContract) -> Self {
        let pool = connection::memory_pool().await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();

        let sacco = Sacco::new(pool, Arc::new(contract), config);
        let state = AppState::new(sacco);
        Self {
            router: app(state.clone()),
            state,
        }
    }

    pub fn sacco(&self) -> &Sacco {
        &self.state.sacco
    }

    pub fn token_for(&self, wallet: &str) -> String {
        let wallet = WalletAddress::parse(wallet).unwrap();
        self.state.tokens.issue(&wallet, Utc::now()).unwrap().token
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    /// Registers `wallet` and approves it directly in the database.
    /// Returns the member id and a session token.
    pub async fn approved_member(&self, wallet: &str, name: &str) -> (i64, String) {
        let (member, _) = self
            .sacco()
            .register_member(Registration {
                name: name.to_string(),
                email: format!("{}@village.coop", name.to_lowercase()),
                wallet_address: wallet.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        queries::set_member_approved(self.sacco().pool(), member.id, true)
            .await
            .unwrap();
        (member.id, self.token_for(wallet))
    }

    pub async fn super_admin(&self, wallet: &str) -> (i64, String) {
        let wallet_address = WalletAddress::parse(wallet).unwrap();
        let id = self.sacco().grant_super_admin(&wallet_address).await.unwrap();
        (id, self.token_for(wallet))
    }
}

/// `0x` followed by 40 copies of `digit`.
pub fn wallet(digit: char) -> String {
    format!("0x{}", digit.to_string().repeat(40))
}

/// Reads a decimal that was serialized as a JSON string or number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}
