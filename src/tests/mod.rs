// Test utilities and integration tests.
//
// The tests below exercise the post store against a real Postgres
// instance. They are skipped when TEST_DATABASE_URL is not set.

#[cfg(test)]
pub mod test_utils {
    use diesel::prelude::*;
    use diesel::r2d2::{ ConnectionManager, Pool };
    use diesel_migrations::MigrationHarness;
    use uuid::Uuid;

    use crate::{
        config::PgPool,
        models::{ NewPost, NewUser, Post, User },
        repositories::post_repository::PostRepository,
        schema::users,
        MIGRATIONS,
    };

    pub fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;

        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder().max_size(5).build(manager).ok()?;

        let mut conn = pool.get().ok()?;
        conn.run_pending_migrations(MIGRATIONS).ok()?;

        Some(pool)
    }

    pub fn create_test_user(pool: &PgPool) -> User {
        let mut conn = pool.get().expect("Failed to get test connection");
        let suffix = Uuid::new_v4().simple().to_string();

        let new_user = NewUser {
            name: "Test User".to_string(),
            username: format!("testuser{}", &suffix[..12]),
            email: format!("test{}@example.com", suffix),
            avatar_url: None,
        };

        diesel
            ::insert_into(users::table)
            .values(&new_user)
            .get_result(&mut conn)
            .expect("Failed to create test user")
    }

    pub fn create_test_post(pool: &PgPool, author_id: Uuid, title: &str, tags: Vec<String>) -> Post {
        let mut new_post = NewPost::new(author_id, title.to_string(), "test content".to_string());
        new_post.tags = tags;

        let (post, _) = PostRepository::create_post(pool, new_post).expect(
            "Failed to create test post"
        );
        post
    }

    /// Deleting the user cascades to their posts.
    pub fn cleanup_test_user(pool: &PgPool, user_id: Uuid) {
        let mut conn = pool.get().expect("Failed to get test connection");
        diesel
            ::delete(users::table.filter(users::id.eq(user_id)))
            .execute(&mut conn)
            .expect("Failed to delete test user");
    }

    pub fn unique_tag(prefix: &str) -> String {
        format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
    }
}

#[cfg(test)]
mod integration_tests {
    use uuid::Uuid;

    use super::test_utils::*;
    use crate::{
        dto::post_dtos::{ FeedFilter, PaginationMeta, TagsInput },
        errors::StoreError,
        models::{ GeoPoint, NewPost, PostChangeset },
        repositories::post_repository::PostRepository,
    };

    #[test]
    fn create_yields_zero_counts_without_tags_or_location() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);

        let post = create_test_post(&pool, author.id, "Plain post", Vec::new());

        assert_eq!(post.like_count(), 0);
        assert_eq!(post.comment_count(), 0);
        assert!(post.tags.is_empty());
        assert!(post.location.is_none());

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn like_toggle_round_trips_to_original_count() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let liker = create_test_user(&pool);
        let post = create_test_post(&pool, author.id, "Likeable", Vec::new());

        let first = PostRepository::toggle_like(&pool, post.id, liker.id).expect("like");
        assert!(first.liked);
        assert_eq!(first.like_count, 1);

        let second = PostRepository::toggle_like(&pool, post.id, liker.id).expect("unlike");
        assert!(!second.liked);
        assert_eq!(second.like_count, 0);

        let missing = PostRepository::toggle_like(&pool, Uuid::new_v4(), liker.id);
        assert!(matches!(missing, Err(StoreError::PostNotFound(_))));

        cleanup_test_user(&pool, author.id);
        cleanup_test_user(&pool, liker.id);
    }

    #[test]
    fn pagination_returns_remainder_on_last_page_and_empty_beyond() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let marker = unique_tag("page");

        for index in 0..5 {
            create_test_post(&pool, author.id, &format!("Paged {}", index), vec![marker.clone()]);
        }

        let filter = FeedFilter {
            tags: vec![marker],
            ..Default::default()
        };

        // 5 posts, page size 2: the last page holds the remainder of 1.
        let last = PostRepository::list_posts(&pool, &filter, 3, 2).expect("page 3");
        assert_eq!(last.rows.len(), 1);
        assert_eq!(last.total, 5);

        let meta = PaginationMeta::new(3, 2, last.rows.len(), last.total);
        assert_eq!(meta.total, 3);
        assert!(!meta.has_more());

        let beyond = PostRepository::list_posts(&pool, &filter, 4, 2).expect("page 4");
        assert!(beyond.rows.is_empty());
        let beyond_meta = PaginationMeta::new(4, 2, 0, beyond.total);
        assert!(!beyond_meta.has_more());

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn feed_is_newest_first() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let marker = unique_tag("order");

        let older = create_test_post(&pool, author.id, "Older", vec![marker.clone()]);
        let newer = create_test_post(&pool, author.id, "Newer", vec![marker.clone()]);

        let filter = FeedFilter {
            tags: vec![marker],
            ..Default::default()
        };
        let page = PostRepository::list_posts(&pool, &filter, 1, 10).expect("list");

        let ids: Vec<Uuid> = page.rows
            .iter()
            .map(|(post, _)| post.id)
            .collect();
        let older_pos = ids.iter().position(|id| *id == older.id).expect("older present");
        let newer_pos = ids.iter().position(|id| *id == newer.id).expect("newer present");
        assert!(newer_pos < older_pos);

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn compound_filter_requires_every_predicate() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let needle = unique_tag("needle");
        let tag = unique_tag("conj");

        // Matches the search only.
        create_test_post(&pool, author.id, &format!("About {}", needle), Vec::new());
        // Matches both search and tag.
        let both = create_test_post(
            &pool,
            author.id,
            &format!("Also about {}", needle),
            vec![tag.clone()]
        );

        let filter = FeedFilter {
            search: Some(needle),
            tags: vec![tag],
            ..Default::default()
        };
        let page = PostRepository::list_posts(&pool, &filter, 1, 10).expect("list");

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].0.id, both.id);

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn search_also_matches_tags_and_location_matches_address() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let tag = unique_tag("searchable");

        let tagged = create_test_post(&pool, author.id, "Untitled", vec![tag.clone()]);

        let mut with_address = NewPost::new(
            author.id,
            "Located".to_string(),
            "content".to_string()
        );
        let marker = unique_tag("city");
        with_address.location = Some(GeoPoint::new(13.4, 52.5));
        with_address.address = Some(format!("{} Center", marker));
        let (addressed, _) = PostRepository::create_post(&pool, with_address).expect("create");

        // Free-text search reaches into the tag list.
        let by_tag = PostRepository::list_posts(
            &pool,
            &(FeedFilter {
                search: Some(tag.to_uppercase()),
                ..Default::default()
            }),
            1,
            10
        ).expect("search by tag");
        assert!(
            by_tag.rows.iter().any(|(post, _)| post.id == tagged.id),
            "tag substring should match case-insensitively"
        );

        // Location filter matches the stored address; posts without an
        // address never match.
        let by_location = PostRepository::list_posts(
            &pool,
            &(FeedFilter {
                location: Some(marker.to_uppercase()),
                ..Default::default()
            }),
            1,
            10
        ).expect("search by address");
        assert_eq!(by_location.rows.len(), 1);
        assert_eq!(by_location.rows[0].0.id, addressed.id);

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn author_filter_matches_exactly() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let other = create_test_user(&pool);
        let marker = unique_tag("byauthor");

        create_test_post(&pool, author.id, "Mine", vec![marker.clone()]);
        create_test_post(&pool, other.id, "Theirs", vec![marker.clone()]);

        let filter = FeedFilter {
            tags: vec![marker],
            author: Some(author.id),
            ..Default::default()
        };
        let page = PostRepository::list_posts(&pool, &filter, 1, 10).expect("list");

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].0.author_id, author.id);

        cleanup_test_user(&pool, author.id);
        cleanup_test_user(&pool, other.id);
    }

    #[test]
    fn update_and_delete_are_author_only() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);
        let stranger = create_test_user(&pool);
        let post = create_test_post(&pool, author.id, "Owned", Vec::new());

        let mut changeset = PostChangeset::empty();
        changeset.title = Some("Hijacked".to_string());
        let denied = PostRepository::update_post(&pool, post.id, stranger.id, changeset);
        assert!(matches!(denied, Err(StoreError::NotAuthor(_))));

        let mut changeset = PostChangeset::empty();
        changeset.title = Some("Renamed".to_string());
        let (updated, _) = PostRepository::update_post(&pool, post.id, author.id, changeset).expect(
            "author update"
        );
        assert_eq!(updated.title, "Renamed");
        // Untouched fields keep their values.
        assert_eq!(updated.content, post.content);

        let denied = PostRepository::delete_post(&pool, post.id, stranger.id);
        assert!(matches!(denied, Err(StoreError::NotAuthor(_))));

        PostRepository::delete_post(&pool, post.id, author.id).expect("author delete");
        let gone = PostRepository::get_post(&pool, post.id);
        assert!(matches!(gone, Err(StoreError::PostNotFound(_))));

        cleanup_test_user(&pool, author.id);
        cleanup_test_user(&pool, stranger.id);
    }

    #[test]
    fn comment_deletion_allows_comment_author_or_post_author() {
        let Some(pool) = test_pool() else {
            return;
        };
        let post_author = create_test_user(&pool);
        let commenter = create_test_user(&pool);
        let stranger = create_test_user(&pool);
        let post = create_test_post(&pool, post_author.id, "Discussed", Vec::new());

        let (by_commenter, _) = PostRepository::add_comment(
            &pool,
            post.id,
            commenter.id,
            "first".to_string()
        ).expect("comment");
        let (by_author, _) = PostRepository::add_comment(
            &pool,
            post.id,
            post_author.id,
            "second".to_string()
        ).expect("comment");

        let denied = PostRepository::delete_comment(&pool, post.id, by_commenter.id, stranger.id);
        assert!(matches!(denied, Err(StoreError::NotAuthor(_))));

        // The comment's own author may remove it.
        PostRepository::delete_comment(&pool, post.id, by_commenter.id, commenter.id).expect(
            "comment author delete"
        );

        // So may the post's author, for any comment.
        PostRepository::delete_comment(&pool, post.id, by_author.id, post_author.id).expect(
            "post author delete"
        );

        let (refreshed, _, _) = PostRepository::get_post(&pool, post.id).expect("get");
        assert_eq!(refreshed.comment_count(), 0);

        let missing = PostRepository::delete_comment(&pool, post.id, Uuid::new_v4(), post_author.id);
        assert!(matches!(missing, Err(StoreError::CommentNotFound(_))));

        cleanup_test_user(&pool, post_author.id);
        cleanup_test_user(&pool, commenter.id);
        cleanup_test_user(&pool, stranger.id);
    }

    #[test]
    fn stored_location_round_trips_without_axis_swap() {
        let Some(pool) = test_pool() else {
            return;
        };
        let author = create_test_user(&pool);

        let mut new_post = NewPost::new(author.id, "Located".to_string(), "content".to_string());
        new_post.location = Some(GeoPoint::new(-73.0, 40.0));
        let (created, _) = PostRepository::create_post(&pool, new_post).expect("create");

        let (fetched, _, _) = PostRepository::get_post(&pool, created.id).expect("get");
        let point = fetched.location.expect("location");
        assert_eq!(point.latitude(), 40.0);
        assert_eq!(point.longitude(), -73.0);
        assert_eq!(point.coordinates, [-73.0, 40.0]);

        cleanup_test_user(&pool, author.id);
    }

    #[test]
    fn seed_round_scenario_end_to_end() {
        let Some(pool) = test_pool() else {
            return;
        };
        let founder = create_test_user(&pool);
        let investor = create_test_user(&pool);

        let fintech = unique_tag("fintech");
        let seed = unique_tag("seed");
        let tags = TagsInput::Joined(format!("{}, {}", fintech, seed));

        let mut new_post = NewPost::new(
            founder.id,
            "Seed Round".to_string(),
            "Raising $2M".to_string()
        );
        new_post.tags = tags.normalize();
        new_post.location = Some(GeoPoint::new(-74.0, 40.71));
        let (created, _) = PostRepository::create_post(&pool, new_post).expect("create");

        let filter = FeedFilter {
            tags: vec![fintech],
            ..Default::default()
        };
        let page = PostRepository::list_posts(&pool, &filter, 1, 10).expect("list");
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].0.id, created.id);
        assert_eq!(page.rows[0].0.comment_count(), 0);

        let (comment, _) = PostRepository::add_comment(
            &pool,
            created.id,
            investor.id,
            "Interested!".to_string()
        ).expect("comment");

        let (with_comment, _, comment_authors) = PostRepository::get_post(&pool, created.id).expect(
            "get"
        );
        assert_eq!(with_comment.comment_count(), 1);
        assert!(comment_authors.contains_key(&investor.id));

        PostRepository::delete_comment(&pool, created.id, comment.id, investor.id).expect(
            "delete comment"
        );

        let (after, _, _) = PostRepository::get_post(&pool, created.id).expect("get");
        assert_eq!(after.comment_count(), 0);

        cleanup_test_user(&pool, founder.id);
        cleanup_test_user(&pool, investor.id);
    }
}
