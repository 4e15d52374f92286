#![allow(missing_docs)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, PasswordHash, Role, UserID, build_router,
    currency::{CurrencyCode, ExchangeRateClient},
    db::initialize,
    endpoints, seed_default_categories,
    user::{NewUser, create_user},
};

pub const TEST_PASSWORD: &str = "a.very-safe&secure password 4 budgets";

const TEST_JWT_SECRET: &str = "not-a-real-secret";

/// A rate client that always answers with the same rate and remembers the
/// last currency pair it was asked for.
pub struct FixedRateClient {
    rate: Option<Decimal>,
    last_request: Mutex<Option<(String, String)>>,
}

impl FixedRateClient {
    pub fn new(rate: Option<Decimal>) -> Self {
        Self {
            rate,
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<(String, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeRateClient for FixedRateClient {
    async fn get_exchange_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        _date: Option<Date>,
    ) -> Option<Decimal> {
        *self.last_request.lock().unwrap() = Some((from.to_string(), to.to_string()));
        self.rate
    }
}

/// An in-memory database with the tables created and the default categories seeded.
pub fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();
    seed_default_categories(&connection).unwrap();
    connection
}

pub fn insert_test_user(connection: &Connection, username: &str) -> UserID {
    create_user(
        NewUser {
            username: username.to_owned(),
            email: EmailAddress::from_str(&format!("{username}@example.com")).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            role: Role::User,
        },
        connection,
    )
    .unwrap()
    .id
}

pub fn get_test_state(rate: Option<Decimal>) -> AppState {
    let state = AppState::new(
        Connection::open_in_memory().unwrap(),
        TEST_JWT_SECRET,
        "Etc/UTC",
        Arc::new(FixedRateClient::new(rate)),
    )
    .unwrap()
    .with_password_hash_cost(4);

    seed_default_categories(&state.db_connection.lock().unwrap()).unwrap();

    state
}

pub fn get_test_server() -> TestServer {
    get_test_server_with_rate(Some(Decimal::ONE))
}

pub fn get_test_server_with_rate(rate: Option<Decimal>) -> TestServer {
    let app = build_router(get_test_state(rate));

    TestServer::try_new(app).expect("Could not create test server.")
}

/// Register a user with [TEST_PASSWORD], returning their token and user ID.
pub async fn register_test_user(server: &TestServer, username: &str, email: &str) -> (String, i64) {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({
            "username": username,
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();

    (
        body["token"].as_str().unwrap().to_owned(),
        body["userId"].as_i64().unwrap(),
    )
}

#[track_caller]
pub fn assert_error_message(response: &TestResponse, status_code: StatusCode, message: &str) {
    response.assert_status(status_code);

    let body = response.json::<Value>();
    assert_eq!(body["status"], status_code.as_u16());
    assert_eq!(body["message"], message, "unexpected error body {body}");
}
