//! In-process stub of the remote profile gateway and the postal lookup

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const SIGNING_SECRET: &[u8] = b"stub-gateway-secret";

/// Mint a genuine HS256 token carrying `claims`
pub fn mint_token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(SIGNING_SECRET),
    )
    .unwrap()
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub accounts: HashMap<String, Account>,
    pub profile_requests: Vec<Value>,
    pub bearer_tokens: Vec<String>,
    pub issued_tokens: Vec<String>,
    pub donations: Vec<Value>,
    pub registered_cnpjs: Vec<String>,
}

pub type Shared = Arc<Mutex<StubState>>;

pub struct StubGateway {
    pub base_url: String,
    pub state: Shared,
}

impl StubGateway {
    pub fn api_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn cep_url(&self) -> String {
        format!("{}/ws", self.base_url)
    }

    pub fn profile_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().profile_requests.clone()
    }

    pub fn bearer_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().bearer_tokens.clone()
    }

    pub fn issued_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().issued_tokens.clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    if state.accounts.contains_key(&email) {
        return failure(StatusCode::CONFLICT, "Email already registered");
    }
    let id = format!("u{}", state.accounts.len() + 1);
    state.accounts.insert(
        email,
        Account {
            id,
            name: body["name"].as_str().unwrap_or_default().to_string(),
            password: body["password"].as_str().unwrap_or_default().to_string(),
        },
    );
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered" })),
    )
}

async fn login(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let mut state = state.lock().unwrap();

    let account = match state.accounts.get(email) {
        Some(account) if account.password == password => account.clone(),
        _ => return failure(StatusCode::UNAUTHORIZED, "Bad credentials"),
    };
    let token = mint_token(&json!({
        "sub": account.id,
        "email": email,
        "name": account.name,
        "exp": 4102444800u64
    }));
    state.issued_tokens.push(token.clone());
    (
        StatusCode::OK,
        Json(json!({ "token": token, "profileCompleted": false })),
    )
}

async fn complete_residence(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Missing token");
    };
    let mut state = state.lock().unwrap();
    state.bearer_tokens.push(token);
    state.profile_requests.push(body);
    (StatusCode::CREATED, Json(json!({ "id": 42 })))
}

async fn complete_company(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Missing token");
    };
    let cnpj = body["cnpj"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.bearer_tokens.push(token);
    state.profile_requests.push(body);
    if state.registered_cnpjs.contains(&cnpj) {
        return failure(StatusCode::UNPROCESSABLE_ENTITY, "CNPJ already registered");
    }
    state.registered_cnpjs.push(cnpj);
    (StatusCode::CREATED, Json(json!({ "id": "77" })))
}

async fn donations(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() {
        return failure(StatusCode::UNAUTHORIZED, "Missing token");
    }
    let donations = state.lock().unwrap().donations.clone();
    (StatusCode::OK, Json(Value::Array(donations)))
}

async fn viacep(Path(cep): Path<String>) -> Json<Value> {
    match cep.as_str() {
        "01001000" => Json(json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP"
        })),
        _ => Json(json!({ "erro": true })),
    }
}

/// Start the stub on an ephemeral port with one seeded account
/// (`a@b.com` / `secret1`, id `u1`) and one taken CNPJ (`11.222.333/0001-81`).
pub async fn spawn_gateway() -> StubGateway {
    let mut stub = StubState::default();
    stub.accounts.insert(
        "a@b.com".to_string(),
        Account {
            id: "u1".to_string(),
            name: "Ana Souza".to_string(),
            password: "secret1".to_string(),
        },
    );
    stub.donations = vec![
        json!({ "id": 1, "date": "2024-09-02", "quantity": 2.5 }),
        json!({ "id": 2, "date": "2024-11-17", "quantity": 4.0 }),
        json!({ "id": 3, "date": "2024-10-10", "quantity": 1.5 }),
        json!({ "id": 4, "date": "2024-11-01", "quantity": 3.0 }),
    ];
    stub.registered_cnpjs = vec!["11.222.333/0001-81".to_string()];
    let state: Shared = Arc::new(Mutex::new(stub));

    let app = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/residence/complete-profile", post(complete_residence))
        .route("/api/company/complete-profile", post(complete_company))
        .route("/api/donations", get(donations))
        .route("/ws/:cep/json/", get(viacep))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubGateway {
        base_url: format!("http://{}", addr),
        state,
    }
}
