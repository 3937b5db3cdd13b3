use uuid::Uuid;

use crate::dto::post_dtos::{ CommentResponse, LikeData, ListPostsResponse, PostResponse };

use super::api::{ ClientError, FeedFilters, MeetingDetails, PostsApi };

// The explore page renders a 3-column grid, so pages come in nines.
pub const FEED_PAGE_SIZE: i64 = 9;

/// Ticket handed out when a fetch starts. Completing a fetch whose
/// generation no longer matches the controller means the filters changed
/// while the request was in flight; its result is discarded instead of
/// clobbering newer state.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    generation: u64,
    page: i64,
    replace: bool,
}

/// State machine behind the feed UI: current filters, page cursor,
/// accumulated posts, and the modal target. Counts are reconciled only
/// after the server acknowledges a mutation, never optimistically.
pub struct FeedController<A: PostsApi> {
    api: A,
    current_user: Option<Uuid>,
    page_size: i64,
    generation: u64,
    loading: bool,
    pub filters: FeedFilters,
    pub posts: Vec<PostResponse>,
    pub page: i64,
    pub has_more: bool,
    pub open_post: Option<Uuid>,
    pub last_error: Option<String>,
}

impl<A: PostsApi> FeedController<A> {
    pub fn new(api: A) -> Self {
        FeedController {
            api,
            current_user: None,
            page_size: FEED_PAGE_SIZE,
            generation: 0,
            loading: false,
            filters: FeedFilters::default(),
            posts: Vec::new(),
            page: 1,
            has_more: true,
            open_post: None,
            last_error: None,
        }
    }

    /// The signed-in user, used to reconcile like membership locally.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.current_user = Some(user_id);
        self
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the filter set: the page cursor resets and the next page
    /// replaces the list. Any in-flight fetch is invalidated.
    pub fn set_filters(&mut self, filters: FeedFilters) {
        self.filters = filters;
        self.generation += 1;
        self.loading = false;
        self.page = 1;
        self.has_more = true;
    }

    pub async fn apply_filters(&mut self, filters: FeedFilters) -> Result<(), ClientError> {
        self.set_filters(filters);
        self.fetch_page(1, true).await
    }

    pub async fn clear_filters(&mut self) -> Result<(), ClientError> {
        self.apply_filters(FeedFilters::default()).await
    }

    /// First page, replacing whatever is shown.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.fetch_page(1, true).await
    }

    /// Next page, appended to the accumulated list.
    pub async fn load_more(&mut self) -> Result<(), ClientError> {
        self.fetch_page(self.page + 1, false).await
    }

    /// Start a fetch. Returns `None` while another fetch is in flight so
    /// duplicate loads are suppressed rather than raced.
    pub fn begin_fetch(&mut self, page: i64, replace: bool) -> Option<FetchTicket> {
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(FetchTicket {
            generation: self.generation,
            page,
            replace,
        })
    }

    /// Fold a fetch result back into the state. Stale tickets are dropped
    /// without touching anything; failures keep the prior list intact.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListPostsResponse, String>
    ) {
        if ticket.generation != self.generation {
            return;
        }
        self.loading = false;

        match result {
            Ok(response) => {
                self.last_error = None;
                self.page = ticket.page;
                if ticket.replace {
                    self.posts = response.posts;
                } else {
                    self.posts.extend(response.posts);
                }
                self.has_more = response.pagination.has_more();
            }
            Err(message) => {
                self.last_error = Some(message);
            }
        }
    }

    async fn fetch_page(&mut self, page: i64, replace: bool) -> Result<(), ClientError> {
        let Some(ticket) = self.begin_fetch(page, replace) else {
            return Ok(());
        };

        match self.api.list_posts(&self.filters, page, self.page_size).await {
            Ok(response) => {
                self.complete_fetch(ticket, Ok(response));
                Ok(())
            }
            Err(err) => {
                self.complete_fetch(ticket, Err(err.to_string()));
                Err(err)
            }
        }
    }

    /// Toggle a like and reconcile the card once the server answers.
    pub async fn toggle_like(&mut self, post_id: Uuid) -> Result<LikeData, ClientError> {
        match self.api.toggle_like(post_id).await {
            Ok(ack) => {
                self.last_error = None;
                if let Some(post) = self.posts.iter_mut().find(|post| post.id == post_id) {
                    post.like_count = ack.like_count;
                    if let Some(user_id) = self.current_user {
                        if ack.liked {
                            if !post.likes.contains(&user_id) {
                                post.likes.push(user_id);
                            }
                        } else {
                            post.likes.retain(|id| *id != user_id);
                        }
                    }
                }
                Ok(ack)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Open the comment modal and refresh that post's comment thread.
    pub async fn open_comments(&mut self, post_id: Uuid) -> Result<(), ClientError> {
        self.open_post = Some(post_id);

        match self.api.get_post(post_id).await {
            Ok(fresh) => {
                if let Some(post) = self.posts.iter_mut().find(|post| post.id == post_id) {
                    *post = fresh;
                }
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn close_modal(&mut self) {
        self.open_post = None;
    }

    pub async fn submit_comment(
        &mut self,
        post_id: Uuid,
        content: &str
    ) -> Result<CommentResponse, ClientError> {
        if content.trim().is_empty() {
            return Err(ClientError::Api("Please enter a comment".to_string()));
        }

        match self.api.add_comment(post_id, content.trim()).await {
            Ok(comment) => {
                self.last_error = None;
                if let Some(post) = self.posts.iter_mut().find(|post| post.id == post_id) {
                    post.comments.push(comment.clone());
                    post.comment_count = post.comments.len();
                }
                Ok(comment)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn request_meeting(
        &mut self,
        post_id: Uuid,
        details: MeetingDetails
    ) -> Result<(), ClientError> {
        if !details.is_complete() {
            return Err(ClientError::Api("Please fill all meeting details".to_string()));
        }

        match self.api.request_meeting(post_id, &details).await {
            Ok(()) => {
                self.last_error = None;
                self.close_modal();
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
