//! Browser-equivalent feed client: a UI-framework-agnostic state machine
//! over the posts API, plus the reqwest implementation that talks to a
//! running server.

pub mod api;
pub mod feed;

pub use api::{ ClientError, FeedFilters, HttpPostsApi, MeetingDetails, PostsApi };
pub use feed::{ FeedController, FEED_PAGE_SIZE };
