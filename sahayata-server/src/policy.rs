//! Row-level access policy
//!
//! | collection | insert | select / get | update | count |
//! |---|---|---|---|---|
//! | form collections | anyone | admin | admin | admin |
//! | `profiles` | own row, role `user` (admin: any) | own row (admin: any) | own row, no role change (admin: any) | admin |

use sahayata_core::{Role, Row};
use serde_json::Value;

use crate::error::ServerError;
use crate::routes::session::Caller;
use crate::store::Collection;

fn denied(message: &str) -> ServerError {
    ServerError::Forbidden(message.to_string())
}

fn require_admin(caller: Option<&Caller>) -> Result<&Caller, ServerError> {
    match caller {
        None => Err(ServerError::NotAuthenticated),
        Some(caller) if caller.is_admin() => Ok(caller),
        Some(_) => Err(denied("Admin role required")),
    }
}

pub fn can_insert(collection: Collection, caller: Option<&Caller>, row: &Row) -> Result<(), ServerError> {
    if collection.is_form() {
        return Ok(());
    }

    let caller = caller.ok_or(ServerError::NotAuthenticated)?;
    if caller.is_admin() {
        return Ok(());
    }

    let own = row.get("id").and_then(Value::as_str).is_some_and(|id| caller.owns(id));
    if !own {
        return Err(denied("Profiles can only be created for yourself"));
    }
    match row.get("role") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(role)) if role == Role::User.as_str() => Ok(()),
        Some(_) => Err(denied("New profiles must use the user role")),
    }
}

/// Whether the caller may see one specific row
pub fn can_read(collection: Collection, caller: Option<&Caller>, id: &str) -> Result<(), ServerError> {
    if collection.is_form() {
        return require_admin(caller).map(|_| ());
    }

    let caller = caller.ok_or(ServerError::NotAuthenticated)?;
    if caller.is_admin() || caller.owns(id) {
        Ok(())
    } else {
        Err(denied("Not your profile"))
    }
}

/// Keep only the rows a listing may return
pub fn visible_rows(
    collection: Collection,
    caller: Option<&Caller>,
    rows: Vec<Row>,
) -> Result<Vec<Row>, ServerError> {
    if collection.is_form() {
        require_admin(caller)?;
        return Ok(rows);
    }

    let caller = caller.ok_or(ServerError::NotAuthenticated)?;
    if caller.is_admin() {
        return Ok(rows);
    }
    Ok(rows
        .into_iter()
        .filter(|row| row.get("id").and_then(Value::as_str).is_some_and(|id| caller.owns(id)))
        .collect())
}

pub fn can_update(
    collection: Collection,
    caller: Option<&Caller>,
    id: &str,
    patch: &Row,
) -> Result<(), ServerError> {
    if collection.is_form() {
        return require_admin(caller).map(|_| ());
    }

    let caller = caller.ok_or(ServerError::NotAuthenticated)?;
    if caller.is_admin() {
        return Ok(());
    }
    if !caller.owns(id) {
        return Err(denied("Not your profile"));
    }
    if patch.contains_key("role") {
        return Err(denied("Only an admin can change roles"));
    }
    Ok(())
}

pub fn can_count(caller: Option<&Caller>) -> Result<(), ServerError> {
    require_admin(caller).map(|_| ())
}
