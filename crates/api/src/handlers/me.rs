//! Bootstrap payload for the signed-in dashboard.
//!
//! Bundles the enum tables the client renders labels from with the caller's
//! profile and team memberships, so the UI needs a single request on load.

use autobahn_core::viewport::{ModeCode, Viewport};
use autobahn_db::models::membership::Membership;
use autobahn_db::models::status::{HeartbeatStatus, StatusId};
use autobahn_db::models::user::User;
use autobahn_db::repositories::{MembershipRepo, UserRepo};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub enums: Enums,
    pub me: Me,
    /// Feature flags enabled for the caller. None are defined yet.
    pub features: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Enums {
    pub viewports: Vec<EnumEntry<ModeCode>>,
    pub heartbeat_statuses: Vec<EnumEntry<StatusId>>,
}

#[derive(Debug, Serialize)]
pub struct EnumEntry<T> {
    pub id: T,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub subject: String,
    pub username: String,
    /// Profile row, absent until the user has been provisioned.
    pub user: Option<User>,
    pub memberships: Vec<Membership>,
}

/// GET /api/v1/me
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let identity = user.identity;
    let (profile, memberships) = futures::try_join!(
        UserRepo::find_by_sub(&state.pool, &identity.subject),
        MembershipRepo::list_for_subject(&state.pool, &identity.subject),
    )?;

    Ok(Json(DataResponse {
        data: MeResponse {
            enums: enums(),
            me: Me {
                subject: identity.subject,
                username: identity.username,
                user: profile,
                memberships,
            },
            features: Vec::new(),
        },
    }))
}

fn enums() -> Enums {
    Enums {
        viewports: Viewport::ALL
            .iter()
            .map(|v| EnumEntry {
                id: v.code(),
                name: v.as_str().to_string(),
            })
            .collect(),
        heartbeat_statuses: HeartbeatStatus::ALL
            .iter()
            .map(|s| EnumEntry {
                id: s.id(),
                name: status_name(*s),
            })
            .collect(),
    }
}

fn status_name(status: HeartbeatStatus) -> String {
    // Serde gives the snake_case wire name used everywhere else.
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
