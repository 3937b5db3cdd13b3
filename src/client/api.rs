use async_trait::async_trait;
use reqwest::{ RequestBuilder, Response, StatusCode };
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::{
    dto::post_dtos::{
        CommentResponse,
        CreateMeetingRequest,
        LikeData,
        ListPostsResponse,
        PostResponse,
    },
    errors::ErrorResponse,
    models::ApiResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")] Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")] Url(#[from] url::ParseError),

    #[error("{0}")] Api(String),
}

/// The filter controls a browsing user can set on the explore page.
/// Empty strings mean "not filtering on this".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedFilters {
    pub search: String,
    pub location: String,
    pub category: String,
    pub tags: String,
}

impl FeedFilters {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.search.trim().is_empty() {
            params.push(("search", self.search.trim().to_string()));
        }
        if !self.location.trim().is_empty() {
            params.push(("location", self.location.trim().to_string()));
        }
        if !self.category.trim().is_empty() {
            params.push(("category", self.category.trim().to_string()));
        }
        if !self.tags.trim().is_empty() {
            params.push(("tags", self.tags.trim().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct MeetingDetails {
    pub date: String,
    pub time: String,
    pub message: String,
}

impl MeetingDetails {
    pub fn is_complete(&self) -> bool {
        !self.date.trim().is_empty() &&
            !self.time.trim().is_empty() &&
            !self.message.trim().is_empty()
    }
}

/// Everything the feed state machine needs from the backend. Kept as a
/// trait so tests can drive the controller with an in-memory fake.
#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn list_posts(
        &self,
        filters: &FeedFilters,
        page: i64,
        limit: i64
    ) -> Result<ListPostsResponse, ClientError>;

    async fn get_post(&self, post_id: Uuid) -> Result<PostResponse, ClientError>;

    async fn toggle_like(&self, post_id: Uuid) -> Result<LikeData, ClientError>;

    async fn add_comment(
        &self,
        post_id: Uuid,
        content: &str
    ) -> Result<CommentResponse, ClientError>;

    async fn request_meeting(
        &self,
        post_id: Uuid,
        details: &MeetingDetails
    ) -> Result<(), ClientError>;
}

/// reqwest-backed implementation talking to the live API. Write calls
/// attach the bearer token handed over by the auth service.
#[derive(Debug, Clone)]
pub struct HttpPostsApi {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpPostsApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(HttpPostsApi {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-2xx response into the server's error message.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => default_error_message(status),
        };

        Err(ClientError::Api(message))
    }
}

fn default_error_message(status: StatusCode) -> String {
    format!("Request failed with status {}", status)
}

fn data_or_error<T>(body: ApiResponse<T>) -> Result<T, ClientError> {
    if !body.success {
        return Err(
            ClientError::Api(
                body.message.unwrap_or_else(|| "Request was not successful".to_string())
            )
        );
    }
    body.data.ok_or_else(|| ClientError::Api("Response carried no data".to_string()))
}

#[async_trait]
impl PostsApi for HttpPostsApi {
    async fn list_posts(
        &self,
        filters: &FeedFilters,
        page: i64,
        limit: i64
    ) -> Result<ListPostsResponse, ClientError> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        params.extend(filters.query_params());

        let response = self.http
            .get(self.url("/api/v1/posts")?)
            .query(&params)
            .send().await?;

        let response = Self::check(response).await?;
        Ok(response.json::<ListPostsResponse>().await?)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<PostResponse, ClientError> {
        let response = self.http
            .get(self.url(&format!("/api/v1/posts/{}", post_id))?)
            .send().await?;

        let response = Self::check(response).await?;
        data_or_error(response.json::<ApiResponse<PostResponse>>().await?)
    }

    async fn toggle_like(&self, post_id: Uuid) -> Result<LikeData, ClientError> {
        let request = self.http.post(self.url(&format!("/api/v1/posts/{}/like", post_id))?);
        let response = self.authorize(request).send().await?;

        let response = Self::check(response).await?;
        data_or_error(response.json::<ApiResponse<LikeData>>().await?)
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        content: &str
    ) -> Result<CommentResponse, ClientError> {
        let request = self.http
            .post(self.url(&format!("/api/v1/posts/{}/comments", post_id))?)
            .json(&serde_json::json!({ "content": content }));
        let response = self.authorize(request).send().await?;

        let response = Self::check(response).await?;
        data_or_error(response.json::<ApiResponse<CommentResponse>>().await?)
    }

    async fn request_meeting(
        &self,
        post_id: Uuid,
        details: &MeetingDetails
    ) -> Result<(), ClientError> {
        let body = CreateMeetingRequest {
            date: Some(details.date.clone()),
            time: Some(details.time.clone()),
            message: Some(details.message.clone()),
        };

        let request = self.http
            .post(self.url(&format!("/api/v1/posts/{}/meeting", post_id))?)
            .json(&body);
        let response = self.authorize(request).send().await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_skip_blank_filters() {
        let filters = FeedFilters {
            search: " seed ".into(),
            location: String::new(),
            category: "fintech".into(),
            tags: "   ".into(),
        };

        let params = filters.query_params();
        assert_eq!(
            params,
            vec![("search", "seed".to_string()), ("category", "fintech".to_string())]
        );
    }

    #[test]
    fn meeting_details_require_every_field() {
        let complete = MeetingDetails {
            date: "2026-09-01".into(),
            time: "10:30".into(),
            message: "Coffee?".into(),
        };
        assert!(complete.is_complete());

        let missing_time = MeetingDetails {
            date: "2026-09-01".into(),
            time: "  ".into(),
            message: "Coffee?".into(),
        };
        assert!(!missing_time.is_complete());
    }
}
