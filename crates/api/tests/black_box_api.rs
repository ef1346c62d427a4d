use chrono::{Duration as ChronoDuration, Utc};
use finhub_api::config::{AppConfig, BootstrapAdmin};
use finhub_auth::{JwtClaims, Role};
use finhub_core::UserId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "black-box-secret";
const ADMIN_EMAIL: &str = "root@finhub.test";
const ADMIN_PASSWORD: &str = "root-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory storage, ephemeral port.
        let mut config = AppConfig::for_tests(SECRET);
        config.auth.bootstrap_admin = Some(BootstrapAdmin {
            username: "root".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        });
        let app = finhub_api::app::build_app(&config)
            .await
            .expect("failed to build app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, token, None).await
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, Some(body)).await
    }

    async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, token, Some(body)).await
    }

    async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PATCH, path, token, Some(body)).await
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .post(
                "/api/users/login",
                None,
                json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a user and returns `(id, token)`.
    async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/users",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "hunter22",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn set_balance(&self, admin: &str, user_id: &str, balance: i64) {
        let (status, body) = self
            .patch(&format!("/api/users/{user_id}"), Some(admin), json!({"balance": balance}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn balance(&self, token: &str) -> f64 {
        let (status, body) = self.get("/api/users/profile", Some(token)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["balance"].as_f64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        role,
        issued_at: now - ChronoDuration::seconds(1),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = TestServer::spawn().await;

    let (status, body) = server.get("/api/users/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = server.get("/api/withdrawalRequests", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("some-other-secret", Role::Admin);
    let (status, _) = server.get("/api/users/all", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_catalog_reads_need_no_token() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get("/api/assets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = server.get("/api/loanTypes", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_then_login_returns_token_without_password_hash() {
    let server = TestServer::spawn().await;
    let (id, _) = server.register("alice").await;

    let (status, body) = server
        .post(
            "/api/users/login",
            None,
            json!({"email": "ALICE@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["id"], id.as_str());
    assert!(body["user"]["lastLogin"].is_string());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, _) = server
        .post(
            "/api/users/login",
            None,
            json!({"email": "alice@example.com", "password": "wrong"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same email again is a conflict.
    let (status, _) = server
        .post(
            "/api/users",
            None,
            json!({"username": "alice2", "email": "alice@example.com", "password": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("bob").await;

    let (status, _) = server.get("/api/users/all", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.get("/api/assets/all", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = mint_jwt(SECRET, Role::Admin);
    let (status, body) = server.get("/api/users/all", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn withdrawal_holds_then_refunds_on_rejection() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (user_id, token) = server.register("carol").await;
    server.set_balance(&admin, &user_id, 100).await;
    assert_eq!(server.balance(&token).await, 100.0);

    let (status, request) = server
        .post(
            "/api/withdrawalRequests",
            Some(&token),
            json!({"amount": 40, "walletAddress": "bc1qcarol", "method": "bitcoin"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "pending");
    assert_eq!(server.balance(&token).await, 60.0);

    let id = request["id"].as_str().unwrap();
    let path = format!("/api/withdrawalRequests/{id}/status");
    let (status, body) = server.put(&path, Some(&admin), json!({"status": "rejected"})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(server.balance(&token).await, 100.0);

    // Repeating the same status changes nothing.
    let (status, _) = server.put(&path, Some(&admin), json!({"status": "rejected"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.balance(&token).await, 100.0);

    // Leaving a terminal status is refused.
    let (status, body) = server.put(&path, Some(&admin), json!({"status": "confirmed"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = server
        .get(&format!("/api/users/{user_id}/ledger"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cachedBalance"], body["derivedBalance"]);
    assert_eq!(body["entries"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn withdrawal_above_balance_is_rejected() {
    let server = TestServer::spawn().await;
    let (_, token) = server.register("dave").await;

    let (status, body) = server
        .post(
            "/api/withdrawalRequests",
            Some(&token),
            json!({"amount": 10, "walletAddress": "bc1qdave"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_balance");

    let (status, body) = server.get("/api/withdrawalRequests", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn approving_a_loan_twice_credits_once() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (_, token) = server.register("erin").await;

    let (status, loan_type) = server
        .post(
            "/api/loanTypes",
            Some(&admin),
            json!({
                "name": "Starter",
                "interestRate": 12,
                "term": "12 months",
                "amountRange": "100 - 5000",
                "maxAmount": 5000,
                "quota": "unlimited",
                "applicationFee": 0,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{loan_type}");

    let (status, order) = server
        .post(
            "/api/loanOrders",
            Some(&token),
            json!({"loanTypeId": loan_type["id"], "amount": 1000, "duration": 12}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["monthlyPayment"].as_f64().unwrap(), 88.85);

    let path = format!("/api/loanOrders/{}/status", order["id"].as_str().unwrap());
    for _ in 0..2 {
        let (status, body) = server.put(&path, Some(&admin), json!({"status": "approved"})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    assert_eq!(server.balance(&token).await, 1000.0);

    let (status, _) = server
        .post(
            "/api/loanOrders",
            Some(&token),
            json!({"loanTypeId": loan_type["id"], "amount": 5001, "duration": 12}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn records_are_hidden_from_other_users() {
    let server = TestServer::spawn().await;
    let (_, owner) = server.register("frank").await;
    let (_, other) = server.register("grace").await;

    let (status, tx) = server
        .post(
            "/api/transactions",
            Some(&owner),
            json!({"amount": 25, "type": "deposit", "description": "top up"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{tx}");
    assert!(tx["reference"].as_str().unwrap().starts_with("TXN-"));

    let path = format!("/api/transactions/{}", tx["id"].as_str().unwrap());
    let (status, _) = server.get(&path, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get(&path, Some(&other)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.get("/api/transactions/not-an-id", Some(&owner)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completed_deposit_transaction_and_credited_bonus_raise_balance() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (user_id, token) = server.register("heidi").await;

    let (_, tx) = server
        .post("/api/transactions", Some(&token), json!({"amount": 50, "type": "deposit"}))
        .await;
    let path = format!("/api/transactions/{}/status", tx["id"].as_str().unwrap());
    let (status, body) = server.put(&path, Some(&admin), json!({"status": "completed"})).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, bonus) = server
        .post(
            "/api/bonuses",
            Some(&admin),
            json!({"userId": user_id, "amount": 5, "reason": "welcome"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{bonus}");
    assert_eq!(bonus["username"], "heidi");

    let path = format!("/api/bonuses/{}/status", bonus["id"].as_str().unwrap());
    let (status, _) = server.put(&path, Some(&admin), json!({"status": "credited"})).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(server.balance(&token).await, 55.0);
}

#[tokio::test]
async fn confirmed_deposit_request_does_not_touch_balance() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (_, token) = server.register("ivan").await;

    let (status, deposit) = server
        .post(
            "/api/depositRequests",
            Some(&token),
            json!({
                "amount": 75,
                "crypto": "BTC",
                "blockchain": "Bitcoin",
                "walletAddress": "bc1qivan",
                "paymentMethod": "crypto",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{deposit}");
    assert_eq!(deposit["transactionId"], "N/A");

    let path = format!("/api/depositRequests/{}/status", deposit["id"].as_str().unwrap());
    let (status, body) = server
        .put(&path, Some(&admin), json!({"status": "confirmed", "transactionId": "0xabc"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["transactionId"], "0xabc");
    assert_eq!(server.balance(&token).await, 0.0);

    let (status, _) = server.put(&path, Some(&admin), json!({"status": "bogus"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_settings_are_created_on_first_read_and_partially_updated() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (_, token) = server.register("judy").await;

    let (status, body) = server.get("/api/adminSettings/view", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], "globalAdminSettings");

    let (status, _) = server
        .put("/api/adminSettings/edit", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server
        .put(
            "/api/adminSettings/edit",
            Some(&admin),
            json!({"usdt": {"walletAddress": "TXyz"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["usdt"]["walletAddress"], "TXyz");
    assert_eq!(body["usdt"]["blockchain"], "TRC20 (Tron)");
}

#[tokio::test]
async fn activities_list_newest_first_with_user() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let (_, token) = server.register("kim").await;

    for kind in ["login", "profile_update"] {
        let (status, body) = server
            .post(
                "/api/activities",
                Some(&token),
                json!({"activityType": kind, "details": {"city": "Oslo"}}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, mine) = server.get("/api/activities/myactivities", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["activityType"], "profile_update");

    let (status, all) = server.get("/api/activities/all", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all[0]["user"]["username"], "kim");
}
