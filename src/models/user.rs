use chrono::{ DateTime, Utc };
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::users;

// Users are provisioned by the external auth service; this service only
// reads them to resolve authors and to validate bearer tokens.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}
