use diesel::prelude::*;
use uuid::Uuid;

use crate::{ config::PgPool, errors::StoreError, models::User, schema::users };

pub struct UserRepository;

impl UserRepository {
    /// Resolve the user a bearer token refers to. `None` means the token
    /// names a user that no longer exists.
    pub fn get_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let mut conn = pool.get()?;

        let user = users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .optional()?;

        Ok(user)
    }
}
