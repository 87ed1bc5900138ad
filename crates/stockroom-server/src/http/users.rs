use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use serde_json::{json, Value};
use stockroom_store::users;

use crate::auth::{require_admin, CurrentUser};
use crate::http::{ok, store_fail, user_json};
use crate::AppState;

/// Admin-only account listing.
pub(crate) async fn list_users_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    if let Err(response) = require_admin(&current) {
        return response;
    }
    let conn = state.db.lock().await;
    match users::list(&conn) {
        Ok(rows) => {
            let users: Vec<Value> = rows.iter().map(user_json).collect();
            ok(json!({"users": users, "count": users.len()}))
        }
        Err(err) => store_fail(err),
    }
}
