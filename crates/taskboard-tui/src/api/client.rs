use reqwest::{Client, StatusCode};
use taskboard_shared::{
    api::{CommentListResponse, CreateCommentRequest, ErrorResponse, UpdateCommentRequest},
    CommentWithAuthor,
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// HTTP client for the comment endpoints.
///
/// Cheap to clone; clones share one connection pool, so each in-flight request can own
/// its client.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn comments_path(task_id: Uuid) -> String {
        format!("/tasks/{}/comments", task_id)
    }

    fn comment_path(task_id: Uuid, comment_id: Uuid) -> String {
        format!("/tasks/{}/comments/{}", task_id, comment_id)
    }

    /// Attach the bearer token, if any
    fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = self.token.as_ref().ok_or(ApiError::Unauthorized)?;
        Ok(builder.bearer_auth(token))
    }

    /// Map a non-success response to an error
    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        error_for_status(status, &text)
    }

    /// Handle API response
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                response.json().await.map_err(ApiError::Network)
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    /// Handle empty response
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(Self::error_from(response).await),
        }
    }

    // ============ Comments ============

    pub async fn list_comments(&self, task_id: Uuid) -> Result<Vec<CommentWithAuthor>, ApiError> {
        let request = self.authed(self.client.get(self.url(&Self::comments_path(task_id))))?;
        let response = request.send().await?;
        let list: CommentListResponse = self.handle_response(response).await?;
        Ok(list.comments)
    }

    pub async fn create_comment(
        &self,
        task_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, ApiError> {
        let req = CreateCommentRequest {
            content: content.to_string(),
        };
        let request = self.authed(self.client.post(self.url(&Self::comments_path(task_id))))?;
        let response = request.json(&req).send().await?;
        self.handle_response(response).await
    }

    pub async fn update_comment(
        &self,
        task_id: Uuid,
        comment_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, ApiError> {
        let req = UpdateCommentRequest {
            content: content.to_string(),
        };
        let request = self.authed(
            self.client
                .put(self.url(&Self::comment_path(task_id, comment_id))),
        )?;
        let response = request.json(&req).send().await?;
        self.handle_response(response).await
    }

    pub async fn delete_comment(&self, task_id: Uuid, comment_id: Uuid) -> Result<(), ApiError> {
        let request = self.authed(
            self.client
                .delete(self.url(&Self::comment_path(task_id, comment_id))),
        )?;
        let response = request.send().await?;
        self.handle_empty_response(response).await
    }
}

/// Translate a failed status and its body into an [`ApiError`].
fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Server(format!("{}: {}", status, message)),
    }
}
