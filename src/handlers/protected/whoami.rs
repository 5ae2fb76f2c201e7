use crate::auth::Principal;
use crate::middleware::response::{ApiResult, ResponseEnvelope};

/// GET /api/v1/auth/whoami - the principal resolved from the presented key
pub async fn whoami(principal: Principal) -> ApiResult<Principal> {
    Ok(ResponseEnvelope::success(principal))
}
