//! # HTTP Gateway
//!
//! Talks to tally-server over its JSON API.
//!
//! ## Response Mapping
//! ```text
//! 2xx                         → decoded body
//! 401                         → GatewayError::Unauthorized
//! other 4xx                   → GatewayError::Rejected { message }   (server's `message`)
//! 5xx, network, bad payload   → GatewayError::Transport
//! ```

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tally_core::{
    CatalogSource, Category, Credentials, GatewayError, LoginRequest, Product, RegisterRequest,
    Sale, SaleRequest, SalesGateway, Store,
};
use tracing::debug;

/// Account and store calls the register needs besides the sale and
/// catalog seams.
pub trait AccountGateway {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<Credentials, GatewayError>> + Send;

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<Credentials, GatewayError>> + Send;

    fn list_stores(&self) -> impl Future<Output = Result<Vec<Store>, GatewayError>> + Send;

    /// Token sent as `Authorization: Bearer` on later calls.
    fn set_token(&mut self, token: Option<String>);
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(HttpGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        debug!(path, "GET");
        let response = self
            .authorized(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(transport);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(GatewayError::Unauthorized);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status.is_client_error() {
        Err(GatewayError::Rejected { message })
    } else {
        Err(GatewayError::Transport(format!("{}: {}", status, message)))
    }
}

impl SalesGateway for HttpGateway {
    async fn create_sale(&self, request: &SaleRequest) -> Result<Sale, GatewayError> {
        self.post("/api/sales", request).await
    }
}

impl CatalogSource for HttpGateway {
    async fn list_products(&self, store_id: &str) -> Result<Vec<Product>, GatewayError> {
        self.get(&format!("/api/stores/{}/products", store_id)).await
    }

    async fn list_categories(&self, store_id: &str) -> Result<Vec<Category>, GatewayError> {
        self.get(&format!("/api/stores/{}/categories", store_id))
            .await
    }
}

impl AccountGateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<Credentials, GatewayError> {
        // A wrong password is a 401 from the login route, not an expired session.
        match self.post("/api/users/login", request).await {
            Err(GatewayError::Unauthorized) => Err(GatewayError::Rejected {
                message: "Invalid email or password".to_string(),
            }),
            other => other,
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Credentials, GatewayError> {
        self.post("/api/users/register", request).await
    }

    async fn list_stores(&self) -> Result<Vec<Store>, GatewayError> {
        self.get("/api/stores").await
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tally_core::checkout::SaleRequestItem;
    use tally_core::{Money, PaymentDetails, PaymentMethod};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> HttpGateway {
        let mut gateway = HttpGateway::new(&server.uri(), Duration::from_secs(5)).unwrap();
        gateway.set_token(Some("t0ken".to_string()));
        gateway
    }

    fn request() -> SaleRequest {
        SaleRequest {
            store: "s-1".to_string(),
            items: vec![SaleRequestItem {
                product: "p-1".to_string(),
                quantity: 1,
                price: Money::from_cents(700),
                modifiers: Vec::new(),
                discounts: Vec::new(),
            }],
            total: Money::from_cents(700),
            payment_method: PaymentMethod::Cash,
            payment_details: PaymentDetails::default(),
        }
    }

    fn sale_json() -> serde_json::Value {
        json!({
            "id": "sale-1",
            "store": "s-1",
            "items": [{
                "product": "p-1",
                "name": "Toast",
                "quantity": 1,
                "price": 7.0,
                "modifiers": [],
                "discounts": [],
                "subtotal": 7.0
            }],
            "total": 7.0,
            "paymentMethod": "cash",
            "status": "completed",
            "createdAt": Utc::now().to_rfc3339(),
            "updatedAt": Utc::now().to_rfc3339()
        })
    }

    #[tokio::test]
    async fn test_create_sale_posts_camel_case_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sales"))
            .and(header("authorization", "Bearer t0ken"))
            .and(body_partial_json(json!({ "store": "s-1", "paymentMethod": "cash" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(sale_json()))
            .expect(1)
            .mount(&server)
            .await;

        let sale = gateway(&server).create_sale(&request()).await.unwrap();
        assert_eq!(sale.id, "sale-1");
        assert_eq!(sale.total, Money::from_cents(700));
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sales"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "VALIDATION_ERROR",
                "message": "items must not be empty"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stores"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stores/s-1/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gateway = gateway(&server);
        assert_eq!(
            gateway.create_sale(&request()).await.unwrap_err(),
            GatewayError::Rejected {
                message: "items must not be empty".to_string()
            }
        );
        assert_eq!(
            gateway.list_stores().await.unwrap_err(),
            GatewayError::Unauthorized
        );
        assert!(matches!(
            gateway.list_products("s-1").await,
            Err(GatewayError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failure_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "UNAUTHORIZED",
                "message": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .login(&LoginRequest {
                email: "ada@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            gateway.list_categories("s-1").await,
            Err(GatewayError::Transport(_))
        ));
    }
}
