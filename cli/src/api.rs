//! `ApiService` over `reqwest`.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use hypewall::api::{ApiError, ApiService, endpoints};
use hypewall::theme::Aesthetic;
use hypewall::types::{Board, Comment, CreateBoardRequest, NewComment};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone, Debug)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base: String,
}

impl ReqwestApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base: base.into() }
    }

    fn url(&self, path: &str) -> String {
        endpoints::url(&self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.client.get(self.url(path)).send().await.map_err(request_error)?;
        decode(resp, path).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        decode(resp, path).await
    }
}

fn request_error(e: reqwest::Error) -> ApiError {
    ApiError::Request(e.to_string())
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, path: &str) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), path, "request failed");
        return Err(ApiError::from_status(status.as_u16(), path));
    }
    resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl ApiService for ReqwestApi {
    async fn create_board(&self, aesthetic: Aesthetic, recipient_name: &str) -> Result<Board, ApiError> {
        let body = CreateBoardRequest { aesthetic, recipient_name: recipient_name.to_owned() };
        self.post_json(&endpoints::boards(), &body).await
    }

    async fn join_board(&self, join_code: &str) -> Result<Board, ApiError> {
        self.get_json(&endpoints::board_by_code(join_code)).await
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, ApiError> {
        self.get_json(&endpoints::board(board_id)).await
    }

    async fn get_board_by_view_token(&self, view_token: &str) -> Result<Board, ApiError> {
        self.get_json(&endpoints::board_by_view_token(view_token)).await
    }

    async fn add_comment(&self, board_id: &str, comment: &NewComment) -> Result<Comment, ApiError> {
        self.post_json(&endpoints::comments(board_id), comment).await
    }

    async fn get_comments(&self, board_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&endpoints::comments(board_id)).await
    }
}
