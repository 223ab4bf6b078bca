//! Account lookup — webhook tokens are the only credential this service reads.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::profile::Profile;
use crate::schema::profiles;

/// Find the account owning a webhook token.
pub async fn find_by_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> anyhow::Result<Option<Profile>> {
    let result = profiles::table
        .filter(profiles::webhook_token.eq(token))
        .first::<Profile>(conn)
        .await
        .optional()?;
    Ok(result)
}

/// The sole registered account, when exactly one exists.
///
/// Shared-secret providers without an explicit path token resolve to this;
/// with zero or several accounts there is no unambiguous owner.
pub async fn sole_account(conn: &mut AsyncPgConnection) -> anyhow::Result<Option<Profile>> {
    let mut results = profiles::table
        .order(profiles::id.asc())
        .limit(2)
        .load::<Profile>(conn)
        .await?;

    if results.len() == 1 {
        Ok(results.pop())
    } else {
        Ok(None)
    }
}
