use std::{ collections::HashMap, sync::Arc };

use axum::{
    extract::{ Multipart, Path, Query, Request, State },
    http::{ header, StatusCode },
    Extension,
    Json,
    RequestExt,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::post_dtos::{
        AuthorSummary,
        CommentResponse,
        CoordValue,
        CreateCommentRequest,
        CreateMeetingRequest,
        CreatePostRequest,
        FeedQuery,
        LikeData,
        ListPostsResponse,
        PaginationMeta,
        PostResponse,
        TagsInput,
        UpdatePostRequest,
        parse_location,
    },
    errors::{ ErrorMessage, HttpError },
    middleware::auth::AuthenticatedUser,
    models::{ ApiResponse, NewPost, PostChangeset, MAX_COMMENT_LENGTH, MAX_TAG_LENGTH },
    repositories::post_repository::PostRepository,
    AppState,
};

/// GET /api/v1/posts — the paginated, filtered feed.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>
) -> Result<Json<ListPostsResponse>, HttpError> {
    let page = query.page();
    let limit = query.limit();
    let filter = query.filter();

    let feed = PostRepository::list_posts(&state.config.database.pool, &filter, page, limit)?;

    let posts: Vec<PostResponse> = feed.rows
        .iter()
        .map(|(post, author)| PostResponse::from_parts(post, author, &feed.comment_authors))
        .collect();

    let pagination = PaginationMeta::new(page, limit, posts.len(), feed.total);

    Ok(Json(ListPostsResponse { success: true, posts, pagination }))
}

/// GET /api/v1/posts/{id}
pub async fn get_post_by_id(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>
) -> Result<Json<ApiResponse<PostResponse>>, HttpError> {
    let (post, author, comment_authors) = PostRepository::get_post(
        &state.config.database.pool,
        post_id
    )?;

    Ok(Json(ApiResponse::ok(PostResponse::from_parts(&post, &author, &comment_authors))))
}

/// POST /api/v1/posts — accepts either a JSON body or a multipart form
/// carrying one image alongside the text fields.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    req: Request
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), HttpError> {
    let (body, image_url) = extract_create_request(&state, req).await?;

    body
        .validate()
        .map_err(|e| HttpError::validation_error(format!("Validation error: {}", e)))?;

    let title = required_text(body.title.as_deref()).ok_or_else(|| {
        HttpError::validation_error(ErrorMessage::TitleAndContentRequired.to_string())
    })?;
    let content = required_text(body.content.as_deref()).ok_or_else(|| {
        HttpError::validation_error(ErrorMessage::TitleAndContentRequired.to_string())
    })?;

    let tags = normalize_tags(body.tags.as_ref())?;

    // Invalid coordinates mean "no location", never a rejected post.
    let location = parse_location(body.latitude.as_ref(), body.longitude.as_ref());
    let address = if location.is_some() { required_text(body.address.as_deref()) } else { None };

    let new_post = NewPost {
        title,
        content,
        author_id: auth.id(),
        image_url,
        location,
        address,
        tags,
        likes: Vec::new(),
        comments: Default::default(),
    };

    let (post, author) = PostRepository::create_post(&state.config.database.pool, new_post)?;

    info!(post_id = %post.id, author = %author.id, "post created");

    let response = PostResponse::from_parts(&post, &author, &HashMap::new());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(response, "Post created successfully")),
    ))
}

/// PUT /api/v1/posts/{id} — author-only partial update.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>
) -> Result<Json<ApiResponse<PostResponse>>, HttpError> {
    body
        .validate()
        .map_err(|e| HttpError::validation_error(format!("Validation error: {}", e)))?;

    let mut changeset = PostChangeset::empty();
    changeset.title = required_text(body.title.as_deref());
    changeset.content = required_text(body.content.as_deref());

    if let Some(tags_input) = body.tags.as_ref() {
        changeset.tags = Some(normalize_tags(Some(tags_input))?);
    }

    // Coordinates only take effect as a valid pair; the stored address is
    // preserved unless a new one arrives alongside them.
    if let Some(point) = parse_location(body.latitude.as_ref(), body.longitude.as_ref()) {
        changeset.location = Some(point);
        changeset.address = required_text(body.address.as_deref());
    }

    let (post, author) = PostRepository::update_post(
        &state.config.database.pool,
        post_id,
        auth.id(),
        changeset
    )?;

    let response = PostResponse::from_parts(&post, &author, &HashMap::new());
    Ok(Json(ApiResponse::with_message(response, "Post updated successfully")))
}

/// DELETE /api/v1/posts/{id} — author-only; embedded comments go with it.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>
) -> Result<Json<ApiResponse<()>>, HttpError> {
    PostRepository::delete_post(&state.config.database.pool, post_id, auth.id())?;

    info!(post_id = %post_id, "post deleted");

    Ok(Json(ApiResponse::message_only("Post deleted successfully")))
}

/// POST /api/v1/posts/{id}/like — a toggle: current membership decides
/// the direction, not client-supplied intent.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>
) -> Result<Json<ApiResponse<LikeData>>, HttpError> {
    let like = PostRepository::toggle_like(&state.config.database.pool, post_id, auth.id())?;

    let message = if like.liked { "Post liked successfully" } else { "Post unliked successfully" };

    Ok(Json(ApiResponse::with_message(like, message)))
}

/// POST /api/v1/posts/{id}/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), HttpError> {
    let content = required_text(body.content.as_deref()).ok_or_else(|| {
        HttpError::validation_error(ErrorMessage::CommentContentRequired.to_string())
    })?;

    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(
            HttpError::validation_error(
                format!("Comments cannot be longer than {} characters", MAX_COMMENT_LENGTH)
            )
        );
    }

    let (comment, author) = PostRepository::add_comment(
        &state.config.database.pool,
        post_id,
        auth.id(),
        content
    )?;

    let response = CommentResponse {
        id: comment.id,
        user: Some(AuthorSummary::from_user(&author)),
        content: comment.content,
        created_at: comment.created_at,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(response, "Comment added successfully")),
    ))
}

/// DELETE /api/v1/posts/{post_id}/comments/{comment_id} — allowed for the
/// comment's author or the post's author.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>
) -> Result<Json<ApiResponse<()>>, HttpError> {
    PostRepository::delete_comment(&state.config.database.pool, post_id, comment_id, auth.id())?;

    Ok(Json(ApiResponse::message_only("Comment deleted successfully")))
}

/// POST /api/v1/posts/{id}/meeting — accepted and acknowledged
/// synchronously; nothing is persisted.
pub async fn request_meeting(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CreateMeetingRequest>
) -> Result<Json<ApiResponse<()>>, HttpError> {
    if !body.is_complete() {
        return Err(HttpError::validation_error(ErrorMessage::MeetingDetailsRequired.to_string()));
    }

    if !PostRepository::post_exists(&state.config.database.pool, post_id)? {
        return Err(HttpError::not_found(ErrorMessage::PostNotFound.to_string()));
    }

    info!(
        post_id = %post_id,
        requester = %auth.id(),
        date = body.date.as_deref().unwrap_or_default(),
        time = body.time.as_deref().unwrap_or_default(),
        "meeting requested"
    );

    Ok(Json(ApiResponse::message_only("Meeting request sent successfully")))
}

/// Pull a create request out of either a JSON body or a multipart form.
/// The multipart path stores the image through the blob-store collaborator
/// and carries only the returned path forward.
async fn extract_create_request(
    state: &AppState,
    req: Request
) -> Result<(CreatePostRequest, Option<String>), HttpError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let Json(body): Json<CreatePostRequest> = req
            .extract().await
            .map_err(|e| HttpError::bad_request(format!("Invalid request body: {}", e)))?;
        return Ok((body, None));
    }

    let mut multipart: Multipart = req
        .extract().await
        .map_err(|e| HttpError::bad_request(format!("Invalid multipart body: {}", e)))?;

    let mut body = CreatePostRequest::default();
    let mut image_url = None;

    while
        let Some(field) = multipart
            .next_field().await
            .map_err(|e| HttpError::bad_request(format!("Invalid multipart field: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => {
                body.title = Some(read_text_field(field).await?);
            }
            "content" => {
                body.content = Some(read_text_field(field).await?);
            }
            "tags" => {
                body.tags = Some(TagsInput::Joined(read_text_field(field).await?));
            }
            "latitude" => {
                body.latitude = Some(CoordValue::Text(read_text_field(field).await?));
            }
            "longitude" => {
                body.longitude = Some(CoordValue::Text(read_text_field(field).await?));
            }
            "address" => {
                body.address = Some(read_text_field(field).await?);
            }
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes().await
                    .map_err(|e| HttpError::bad_request(format!("Invalid image upload: {}", e)))?;
                if !data.is_empty() {
                    image_url = Some(
                        state.image_store.store_image(content_type.as_deref(), &data).await?
                    );
                }
            }
            _ => {}
        }
    }

    Ok((body, image_url))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, HttpError> {
    field.text().await.map_err(|e| HttpError::bad_request(format!("Invalid form field: {}", e)))
}

fn required_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn normalize_tags(input: Option<&TagsInput>) -> Result<Vec<String>, HttpError> {
    let tags = input.map(TagsInput::normalize).unwrap_or_default();

    if tags.iter().any(|tag| tag.chars().count() > MAX_TAG_LENGTH) {
        return Err(
            HttpError::validation_error(
                format!("Tags cannot be longer than {} characters", MAX_TAG_LENGTH)
            )
        );
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_input() {
        assert_eq!(required_text(Some("  hello ")), Some("hello".to_string()));
        assert_eq!(required_text(Some("   ")), None);
        assert_eq!(required_text(None), None);
    }

    #[test]
    fn tag_normalization_enforces_length_cap() {
        let ok = normalize_tags(Some(&TagsInput::Joined("fintech, seed".into()))).unwrap();
        assert_eq!(ok, vec!["fintech", "seed"]);

        let too_long = "x".repeat(MAX_TAG_LENGTH + 1);
        let err = normalize_tags(Some(&TagsInput::List(vec![too_long])));
        assert!(err.is_err());

        assert!(normalize_tags(None).unwrap().is_empty());
    }
}
