//! HTTP client for the floor server REST API

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::ApiResponse;
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, DisjoinReceipt, DisjoinRequest,
    JoinCommand, JoinReceipt, LayoutUpdate, OccupancyUpdate, OpenOrder, PositionUpdate,
    SubmitOrder, TableId, TablePosition, TransferItemsRequest,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making requests to the floor server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<Option<T>> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Option<T>> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        self.send::<T, ()>(Method::POST, path, None).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Option<T>> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        self.send::<T, ()>(Method::DELETE, path, None).await
    }

    /// Unwrap the `ApiResponse` envelope
    ///
    /// A failed response carrying a known error code becomes
    /// [`ClientError::Api`]; anything else falls back to the HTTP status.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<Option<T>> {
        let status = response.status();
        let url = response.url().path().to_string();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = %status, path = %url, "Request failed");
        }

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(envelope) => {
                if let Some(err) = envelope.to_error() {
                    return Err(ClientError::Api {
                        code: err.code,
                        message: err.message,
                    });
                }
                if !status.is_success() {
                    return Err(Self::status_error(status, envelope.message));
                }
                Ok(envelope.data)
            }
            Err(e) if status.is_success() => {
                tracing::error!(path = %url, error = %e, "Unparseable response body");
                Err(ClientError::InvalidResponse(format!("{e}: {text}")))
            }
            Err(_) => Err(Self::status_error(status, text)),
        }
    }

    fn status_error(status: StatusCode, text: String) -> ClientError {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST => ClientError::Validation(text),
            _ => ClientError::Internal(format!("{status}: {text}")),
        }
    }

    fn required<T>(data: Option<T>, what: &str) -> ClientResult<T> {
        data.ok_or_else(|| ClientError::InvalidResponse(format!("Missing {what} data")))
    }

    // ========== Health ==========

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        let data = self.get("/health").await?;
        Self::required(data, "health")
    }

    // ========== Tables API ==========

    pub async fn list_tables(&self) -> ClientResult<Vec<DiningTable>> {
        let data = self.get("/api/tables").await?;
        Self::required(data, "table list")
    }

    pub async fn get_table(&self, id: TableId) -> ClientResult<DiningTable> {
        let data = self.get(&format!("/api/tables/{id}")).await?;
        Self::required(data, "table")
    }

    pub async fn create_table(&self, payload: &DiningTableCreate) -> ClientResult<DiningTable> {
        let data = self.post("/api/tables", payload).await?;
        Self::required(data, "table")
    }

    pub async fn update_table(
        &self,
        id: TableId,
        payload: &DiningTableUpdate,
    ) -> ClientResult<DiningTable> {
        let data = self.put(&format!("/api/tables/{id}"), payload).await?;
        Self::required(data, "table")
    }

    pub async fn delete_table(&self, id: TableId) -> ClientResult<()> {
        self.delete::<serde_json::Value>(&format!("/api/tables/{id}"))
            .await?;
        Ok(())
    }

    pub async fn update_position(&self, id: TableId, x: f64, y: f64) -> ClientResult<DiningTable> {
        let body = TablePosition {
            position_x: x,
            position_y: y,
        };
        let data = self
            .put(&format!("/api/tables/{id}/position"), &body)
            .await?;
        Self::required(data, "table")
    }

    pub async fn update_occupancy(&self, id: TableId, occupied: bool) -> ClientResult<DiningTable> {
        let body = OccupancyUpdate {
            is_occupied: occupied,
        };
        let data = self
            .put(&format!("/api/tables/{id}/occupancy"), &body)
            .await?;
        Self::required(data, "table")
    }

    pub async fn save_layout(&self, positions: &[PositionUpdate]) -> ClientResult<Vec<DiningTable>> {
        let body = LayoutUpdate {
            positions: positions.to_vec(),
        };
        let data = self.put("/api/tables/layout", &body).await?;
        Self::required(data, "layout")
    }

    pub async fn join_tables(&self, command: &JoinCommand) -> ClientResult<JoinReceipt> {
        let data = self.post("/api/tables/join", command).await?;
        Self::required(data, "join")
    }

    pub async fn disjoin(
        &self,
        table_id: TableId,
        request: &DisjoinRequest,
    ) -> ClientResult<DisjoinReceipt> {
        let data = self
            .post(&format!("/api/tables/{table_id}/disjoin"), request)
            .await?;
        Self::required(data, "disjoin")
    }

    // ========== Orders API ==========

    /// Open order of the table's group, if any
    pub async fn get_order(&self, table_id: TableId) -> ClientResult<Option<OpenOrder>> {
        self.get(&format!("/api/tables/{table_id}/order")).await
    }

    pub async fn submit_order(&self, payload: &SubmitOrder) -> ClientResult<OpenOrder> {
        let data = self.post("/api/orders", payload).await?;
        Self::required(data, "order")
    }

    /// Close the group's open order; returns the settled order
    pub async fn settle(&self, table_id: TableId) -> ClientResult<OpenOrder> {
        let data = self
            .post_empty(&format!("/api/tables/{table_id}/settle"))
            .await?;
        Self::required(data, "order")
    }

    pub async fn transfer_items(&self, request: &TransferItemsRequest) -> ClientResult<()> {
        self.post::<serde_json::Value, _>("/api/orders/transfer", request)
            .await?;
        Ok(())
    }
}
