use chrono::{ DateTime, Utc };
use diesel::deserialize::{ self, FromSql, FromSqlRow };
use diesel::expression::AsExpression;
use diesel::pg::{ Pg, PgValue };
use diesel::prelude::*;
use diesel::serialize::{ self, Output, ToSql };
use diesel::sql_types::Jsonb;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::schema::posts;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_CONTENT_LENGTH: usize = 5000;
pub const MAX_TAG_LENGTH: usize = 20;
pub const MAX_COMMENT_LENGTH: usize = 500;

/// GeoJSON point as stored: `coordinates` is `[longitude, latitude]`.
/// The wire format flips this into a flat `{latitude, longitude}` pair,
/// so all axis handling goes through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        GeoPoint {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

impl FromSql<Jsonb, Pg> for GeoPoint {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl ToSql<Jsonb, Pg> for GeoPoint {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let value = serde_json::to_value(self)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&value, &mut out.reborrow())
    }
}

/// A comment lives inside exactly one post row and has no independent
/// lifecycle: appended on create, removed on delete, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, content: String) -> Self {
        Comment {
            id: Uuid::new_v4(),
            user_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Ordered comment list embedded in the post row as `jsonb`.
/// Insertion order is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
pub struct CommentList(pub Vec<Comment>);

impl CommentList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, comment: Comment) {
        self.0.push(comment);
    }

    pub fn find(&self, comment_id: Uuid) -> Option<&Comment> {
        self.0.iter().find(|c| c.id == comment_id)
    }

    /// Remove a comment by id, preserving the order of the rest.
    /// Returns false when no comment matched.
    pub fn remove(&mut self, comment_id: Uuid) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c.id != comment_id);
        self.0.len() != before
    }
}

impl FromSql<Jsonb, Pg> for CommentList {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl ToSql<Jsonb, Pg> for CommentList {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let value = serde_json::to_value(self)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&value, &mut out.reborrow())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: CommentList,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: CommentList,
}

impl NewPost {
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        NewPost {
            title,
            content,
            author_id,
            image_url: None,
            location: None,
            address: None,
            tags: Vec::new(),
            likes: Vec::new(),
            comments: CommentList::default(),
        }
    }
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostChangeset {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl PostChangeset {
    pub fn empty() -> Self {
        PostChangeset {
            title: None,
            content: None,
            image_url: None,
            location: None,
            address: None,
            tags: None,
            updated_at: Utc::now(),
        }
    }
}
