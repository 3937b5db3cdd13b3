use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::{ Comment, GeoPoint, Post, User };

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Raw feed query string. Everything arrives as text so malformed values
/// can be clamped to defaults instead of rejected.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub location: Option<String>,
}

impl FeedQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    /// Canonical filter set. `tags` and `category` both feed the tag
    /// predicate; a non-uuid author value is dropped rather than rejected.
    pub fn filter(&self) -> FeedFilter {
        let mut tags: Vec<String> = Vec::new();
        for raw in [self.tags.as_deref(), self.category.as_deref()].into_iter().flatten() {
            tags.extend(
                raw
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
            );
        }

        FeedFilter {
            search: non_empty(self.search.as_deref()),
            tags,
            author: self.author.as_deref().and_then(|raw| raw.trim().parse::<Uuid>().ok()),
            location: non_empty(self.location.as_deref()),
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Filters applied conjunctively by the feed query; the free-text search
/// is disjunctive across title, content, and tags internally.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedFilter {
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<Uuid>,
    pub location: Option<String>,
}

impl FeedFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() &&
            self.tags.is_empty() &&
            self.author.is_none() &&
            self.location.is_none()
    }
}

/// Tags arrive either pre-split or as one comma-joined string; both are
/// coerced into a trimmed, non-empty sequence at this boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Joined(String),
}

impl TagsInput {
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagsInput::List(tags) =>
                tags
                    .iter()
                    .map(|tag| tag.trim())
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect(),
            TagsInput::Joined(raw) =>
                raw
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect(),
        }
    }
}

/// Coordinates arrive as JSON numbers or as form-encoded strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordValue {
    Number(f64),
    Text(String),
}

impl CoordValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CoordValue::Number(value) => Some(*value),
            CoordValue::Text(raw) => raw.trim().parse::<f64>().ok(),
        }
    }
}

/// A location is accepted only when both coordinates parse as finite
/// numbers inside valid lat/lon ranges; anything else means "no location",
/// never an error.
pub fn parse_location(
    latitude: Option<&CoordValue>,
    longitude: Option<&CoordValue>
) -> Option<GeoPoint> {
    let latitude = latitude?.as_f64()?;
    let longitude = longitude?.as_f64()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(GeoPoint::new(longitude, latitude))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 100, message = "Title cannot be longer than 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Content cannot be longer than 5000 characters"))]
    pub content: Option<String>,

    pub tags: Option<TagsInput>,
    pub latitude: Option<CoordValue>,
    pub longitude: Option<CoordValue>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(max = 100, message = "Title cannot be longer than 100 characters"))]
    #[serde(default)]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Content cannot be longer than 5000 characters"))]
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub tags: Option<TagsInput>,
    #[serde(default)]
    pub latitude: Option<CoordValue>,
    #[serde(default)]
    pub longitude: Option<CoordValue>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateMeetingRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}

impl CreateMeetingRequest {
    pub fn is_complete(&self) -> bool {
        [&self.date, &self.time, &self.message]
            .iter()
            .all(|field| field.as_deref().map(str::trim).is_some_and(|value| !value.is_empty()))
    }
}

/// The only author fields that ever cross the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl AuthorSummary {
    pub fn from_user(user: &User) -> Self {
        AuthorSummary {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub user: Option<AuthorSummary>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn from_comment(comment: &Comment, authors: &HashMap<Uuid, User>) -> Self {
        CommentResponse {
            id: comment.id,
            user: authors.get(&comment.user_id).map(AuthorSummary::from_user),
            content: comment.content.clone(),
            created_at: comment.created_at,
        }
    }
}

/// Flat transport shape for the stored GeoJSON point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub image_url: Option<String>,
    pub location: Option<LocationResponse>,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub comments: Vec<CommentResponse>,
    pub comment_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    /// Project a stored post onto the wire: geo point transposed to
    /// lat/lng, counts materialized, authors reduced to their summary.
    pub fn from_parts(post: &Post, author: &User, comment_authors: &HashMap<Uuid, User>) -> Self {
        let location = post.location.as_ref().map(|point| LocationResponse {
            latitude: point.latitude(),
            longitude: point.longitude(),
            address: post.address.clone(),
        });

        PostResponse {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            author: AuthorSummary::from_user(author),
            image_url: post.image_url.clone(),
            location,
            tags: post.tags.clone(),
            likes: post.likes.clone(),
            like_count: post.like_count(),
            comments: post.comments.0
                .iter()
                .map(|comment| CommentResponse::from_comment(comment, comment_authors))
                .collect(),
            comment_count: post.comment_count(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current: i64,
    pub total: i64,
    pub count: usize,
    pub total_items: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, count: usize, total_items: i64) -> Self {
        PaginationMeta {
            current: page,
            total: (total_items + limit - 1) / limit,
            count,
            total_items,
        }
    }

    pub fn has_more(&self) -> bool {
        self.current < self.total
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListPostsResponse {
    pub success: bool,
    pub posts: Vec<PostResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeData {
    pub liked: bool,
    pub like_count: usize,
}
