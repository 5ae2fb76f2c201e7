use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::api::{PageQuery, PageRequest, PageResult};
use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::WalletResponse;
use crate::middleware::response::{ApiResult, ResponseEnvelope};

/// GET /api/v1/wallet?page=&size= - the caller's wallets, one page at a time
pub async fn wallet_list(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<PageResult<WalletResponse>> {
    let request = PageRequest::from_query(query, &state.pagination)?;
    Ok(state.wallets.list_by_owner(principal.id, request).await?)
}

/// GET /api/v1/wallet/:wallet_id
pub async fn wallet_get(
    State(state): State<AppState>,
    principal: Principal,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<WalletResponse> {
    let wallet = state.wallets.find_for_owner(principal.id, wallet_id).await?;
    Ok(ResponseEnvelope::success(wallet))
}
