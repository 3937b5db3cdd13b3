use std::collections::{ HashMap, HashSet };

use chrono::Utc;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{ Bool, Text };
use uuid::Uuid;

use crate::{
    config::PgPool,
    dto::post_dtos::{ FeedFilter, LikeData },
    errors::StoreError,
    models::{ Comment, NewPost, Post, PostChangeset, User },
    schema::{ posts, users },
};

/// One page of the feed with everything the wire format needs:
/// matched rows joined to their authors, the users referenced by
/// embedded comments, and the total match count for pagination.
#[derive(Debug)]
pub struct PostPage {
    pub rows: Vec<(Post, User)>,
    pub comment_authors: HashMap<Uuid, User>,
    pub total: i64,
}

pub struct PostRepository;

impl PostRepository {
    /// Feed query: filters are conjunctive across kinds, the free-text
    /// search is disjunctive over title, content, and tags. Newest first,
    /// with the id as a deterministic tie-break for equal timestamps.
    pub fn list_posts(
        pool: &PgPool,
        filter: &FeedFilter,
        page: i64,
        limit: i64
    ) -> Result<PostPage, StoreError> {
        let mut conn = pool.get()?;
        let offset = (page - 1) * limit;

        let mut query = posts::table.inner_join(users::table).into_boxed();
        let mut count_query = posts::table.into_boxed();

        if let Some(search) = &filter.search {
            // title OR content OR any tag, case-insensitive substring
            let pattern = format!("%{}%", search);
            query = query.filter(
                posts::title
                    .ilike(pattern.clone())
                    .or(posts::content.ilike(pattern.clone()))
                    .or(
                        sql::<Bool>("array_to_string(posts.tags, ',') ILIKE ").bind::<Text, _>(
                            pattern.clone()
                        )
                    )
            );
            count_query = count_query.filter(
                posts::title
                    .ilike(pattern.clone())
                    .or(posts::content.ilike(pattern.clone()))
                    .or(
                        sql::<Bool>("array_to_string(posts.tags, ',') ILIKE ").bind::<Text, _>(
                            pattern
                        )
                    )
            );
        }

        if !filter.tags.is_empty() {
            query = query.filter(posts::tags.overlaps_with(filter.tags.clone()));
            count_query = count_query.filter(posts::tags.overlaps_with(filter.tags.clone()));
        }

        if let Some(author) = filter.author {
            query = query.filter(posts::author_id.eq(author));
            count_query = count_query.filter(posts::author_id.eq(author));
        }

        // Posts without a stored address never match a location filter.
        if let Some(location) = &filter.location {
            let pattern = format!("%{}%", location);
            query = query.filter(posts::address.ilike(pattern.clone()));
            count_query = count_query.filter(posts::address.ilike(pattern));
        }

        let rows: Vec<(Post, User)> = query
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(limit)
            .offset(offset)
            .select((Post::as_select(), User::as_select()))
            .load(&mut conn)?;

        let total: i64 = count_query.count().get_result(&mut conn)?;

        let post_refs: Vec<&Post> = rows.iter().map(|(post, _)| post).collect();
        let comment_authors = Self::load_comment_authors(&mut conn, &post_refs)?;

        Ok(PostPage { rows, comment_authors, total })
    }

    pub fn get_post(
        pool: &PgPool,
        post_id: Uuid
    ) -> Result<(Post, User, HashMap<Uuid, User>), StoreError> {
        let mut conn = pool.get()?;

        let (post, author) = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(post_id))
            .select((Post::as_select(), User::as_select()))
            .first::<(Post, User)>(&mut conn)
            .optional()?
            .ok_or(StoreError::PostNotFound(post_id))?;

        let comment_authors = Self::load_comment_authors(&mut conn, &[&post])?;

        Ok((post, author, comment_authors))
    }

    pub fn post_exists(pool: &PgPool, post_id: Uuid) -> Result<bool, StoreError> {
        let mut conn = pool.get()?;

        let found = posts::table
            .find(post_id)
            .select(posts::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        Ok(found.is_some())
    }

    /// Insert, then populate the author for the response. If the author
    /// lookup fails after the insert succeeded, the post stays written.
    pub fn create_post(pool: &PgPool, new_post: NewPost) -> Result<(Post, User), StoreError> {
        let mut conn = pool.get()?;

        let post: Post = diesel::insert_into(posts::table).values(&new_post).get_result(&mut conn)?;

        let author = users::table
            .find(post.author_id)
            .first::<User>(&mut conn)
            .optional()?
            .ok_or(StoreError::AuthorMissing)?;

        Ok((post, author))
    }

    /// Author-only partial update. The row is locked so the authorization
    /// check and the write observe the same document.
    pub fn update_post(
        pool: &PgPool,
        post_id: Uuid,
        requester: Uuid,
        changeset: PostChangeset
    ) -> Result<(Post, User), StoreError> {
        let mut conn = pool.get()?;

        let post = conn.transaction::<Post, StoreError, _>(|conn| {
            let current: Post = posts::table
                .find(post_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::PostNotFound(post_id))?;

            if current.author_id != requester {
                return Err(StoreError::NotAuthor(requester));
            }

            let updated: Post = diesel
                ::update(posts::table.find(post_id))
                .set(&changeset)
                .get_result(conn)?;

            Ok(updated)
        })?;

        let author = users::table
            .find(post.author_id)
            .first::<User>(&mut conn)
            .optional()?
            .ok_or(StoreError::AuthorMissing)?;

        Ok((post, author))
    }

    /// Author-only delete. Comments live inside the row, so they go with it.
    pub fn delete_post(pool: &PgPool, post_id: Uuid, requester: Uuid) -> Result<(), StoreError> {
        let mut conn = pool.get()?;

        conn.transaction::<(), StoreError, _>(|conn| {
            let author: Uuid = posts::table
                .find(post_id)
                .select(posts::author_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::PostNotFound(post_id))?;

            if author != requester {
                return Err(StoreError::NotAuthor(requester));
            }

            diesel::delete(posts::table.find(post_id)).execute(conn)?;

            Ok(())
        })
    }

    /// Membership decides the direction: present removes, absent adds.
    /// The row lock serializes concurrent toggles on the same post.
    pub fn toggle_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<LikeData, StoreError> {
        let mut conn = pool.get()?;

        conn.transaction::<LikeData, StoreError, _>(|conn| {
            let post: Post = posts::table
                .find(post_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::PostNotFound(post_id))?;

            let mut likes = post.likes;
            let liked = if likes.contains(&user_id) {
                likes.retain(|id| *id != user_id);
                false
            } else {
                likes.push(user_id);
                true
            };
            let like_count = likes.len();

            diesel
                ::update(posts::table.find(post_id))
                .set((posts::likes.eq(likes), posts::updated_at.eq(Utc::now())))
                .execute(conn)?;

            Ok(LikeData { liked, like_count })
        })
    }

    /// Append a comment with a server-assigned id and timestamp; returns
    /// it together with its author for the response projection.
    pub fn add_comment(
        pool: &PgPool,
        post_id: Uuid,
        user_id: Uuid,
        content: String
    ) -> Result<(Comment, User), StoreError> {
        let mut conn = pool.get()?;

        let comment = conn.transaction::<Comment, StoreError, _>(|conn| {
            let post: Post = posts::table
                .find(post_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::PostNotFound(post_id))?;

            let comment = Comment::new(user_id, content);
            let mut comments = post.comments;
            comments.push(comment.clone());

            diesel
                ::update(posts::table.find(post_id))
                .set((posts::comments.eq(comments), posts::updated_at.eq(Utc::now())))
                .execute(conn)?;

            Ok(comment)
        })?;

        let author = users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .optional()?
            .ok_or(StoreError::AuthorMissing)?;

        Ok((comment, author))
    }

    /// Either the comment's author or the post's author may remove a
    /// comment; anyone else is rejected.
    pub fn delete_comment(
        pool: &PgPool,
        post_id: Uuid,
        comment_id: Uuid,
        requester: Uuid
    ) -> Result<(), StoreError> {
        let mut conn = pool.get()?;

        conn.transaction::<(), StoreError, _>(|conn| {
            let post: Post = posts::table
                .find(post_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::PostNotFound(post_id))?;

            let comment = post.comments
                .find(comment_id)
                .cloned()
                .ok_or(StoreError::CommentNotFound(comment_id))?;

            let is_comment_author = comment.user_id == requester;
            let is_post_author = post.author_id == requester;
            if !is_comment_author && !is_post_author {
                return Err(StoreError::NotAuthor(requester));
            }

            let mut comments = post.comments;
            comments.remove(comment_id);

            diesel
                ::update(posts::table.find(post_id))
                .set((posts::comments.eq(comments), posts::updated_at.eq(Utc::now())))
                .execute(conn)?;

            Ok(())
        })
    }

    fn load_comment_authors(
        conn: &mut PgConnection,
        posts: &[&Post]
    ) -> Result<HashMap<Uuid, User>, StoreError> {
        let ids: HashSet<Uuid> = posts
            .iter()
            .flat_map(|post| post.comments.0.iter().map(|comment| comment.user_id))
            .collect();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let authors: Vec<User> = users::table
            .filter(users::id.eq_any(ids.into_iter().collect::<Vec<_>>()))
            .load(conn)?;

        Ok(
            authors
                .into_iter()
                .map(|user| (user.id, user))
                .collect()
        )
    }
}
