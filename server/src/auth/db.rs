use crate::db::DbPool;
use crate::models::NewSession;
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use larder_core::{Caller, UserId};
use thiserror::Error;

use super::crypto::{generate_token, hash_token};

/// Sessions expire this many days after login.
pub const SESSION_TTL_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database connection failed: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Session query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

/// Open a session for `user_id` and return its bearer token. Only the
/// token's hash is stored. The user's expired sessions are dropped here.
pub fn create_session(conn: &mut PgConnection, user_id: UserId) -> Result<String, SessionError> {
    let now = Utc::now();

    diesel::delete(
        sessions::table
            .filter(sessions::user_id.eq(user_id))
            .filter(sessions::expires_at.le(now)),
    )
    .execute(conn)?;

    let token = generate_token();
    let token_hash = hash_token(&token);

    diesel::insert_into(sessions::table)
        .values(&NewSession {
            user_id,
            token_hash: &token_hash,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        })
        .execute(conn)?;

    Ok(token)
}

/// Resolve a bearer token to the caller it belongs to.
///
/// Unknown or expired tokens, and tokens of deleted users, yield an
/// anonymous caller. Only database failures are errors.
pub fn authenticate(pool: &DbPool, token: &str) -> Result<Caller, SessionError> {
    let mut conn = pool.get()?;

    let user_id: Option<UserId> = sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(hash_token(token)))
        .filter(sessions::expires_at.gt(Utc::now()))
        .filter(users::deleted_at.is_null())
        .select(users::id)
        .first(&mut conn)
        .optional()?;

    Ok(Caller::from(user_id))
}
