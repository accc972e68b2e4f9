//! HTTP endpoints implemented by the relayer.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/factory` | factory address, version and account implementation |
//! | GET | `/accounts/{owner}/address?salt=` | deterministic account address |
//! | POST | `/accounts` | deploy the account of an owner |
//! | GET | `/account/{address}` | owner, version and balance of an account |
//! | POST | `/account/{address}/execute` | submit a signed authorization |
//! | POST | `/account/{address}/execute-batch` | submit a signed batch authorization |
//!
//! Failed operations answer `400 Bad Request` with an [`ErrorResponse`]; requests
//! for an address without an account answer `404 Not Found`.

use aa_chain_eip155::chain::ChecksummedAddress;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;

use crate::relayer::Relayer;
use crate::relayer_local::RelayerLocalError;
use crate::types::{
    AccountAddressQuery, CreateAccountRequest, ErrorReason, ErrorResponse, ExecuteBatchRequest,
    ExecuteRequest,
};

/// Routes of the relayer, over any shared [`Relayer`] whose errors render as responses.
pub fn routes<R>() -> Router<R>
where
    R: Relayer + Clone + Send + Sync + 'static,
    R::Error: IntoResponse,
{
    Router::new()
        .route("/factory", get(get_factory::<R>))
        .route("/accounts", post(post_accounts::<R>))
        .route("/accounts/{owner}/address", get(get_account_address::<R>))
        .route("/account/{address}", get(get_account::<R>))
        .route("/account/{address}/execute", post(post_execute::<R>))
        .route("/account/{address}/execute-batch", post(post_execute_batch::<R>))
}

/// `GET /factory`
#[instrument(skip_all)]
pub async fn get_factory<R>(State(relayer): State<R>) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    match relayer.factory().await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `GET /accounts/{owner}/address`: the account address is known before deployment,
/// so funds may be sent to it ahead of time.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn get_account_address<R>(
    State(relayer): State<R>,
    Path(owner): Path<ChecksummedAddress>,
    Query(query): Query<AccountAddressQuery>,
) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    let salt = query.salt.unwrap_or_default().0;
    match relayer.account_address(owner.into(), salt).await {
        Ok(address) => (StatusCode::OK, Json(address)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `POST /accounts`
#[instrument(skip_all)]
pub async fn post_accounts<R>(
    State(relayer): State<R>,
    Json(body): Json<CreateAccountRequest>,
) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    match relayer.create_account(&body).await {
        Ok(created) => (StatusCode::OK, Json(created)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `GET /account/{address}`
#[instrument(skip_all, fields(account = %address))]
pub async fn get_account<R>(
    State(relayer): State<R>,
    Path(address): Path<ChecksummedAddress>,
) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    match relayer.account(address.into()).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `POST /account/{address}/execute`: submits an owner-signed authorization.
/// The relayer pays for nothing but the submission.
#[instrument(skip_all, fields(account = %address))]
pub async fn post_execute<R>(
    State(relayer): State<R>,
    Path(address): Path<ChecksummedAddress>,
    Json(body): Json<ExecuteRequest>,
) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    match relayer.execute(address.into(), &body).await {
        Ok(executed) => (StatusCode::OK, Json(executed)).into_response(),
        Err(error) => {
            tracing::warn!(
                error = %error,
                body = %serde_json::to_string(&body)
                    .unwrap_or_else(|_| "<can-not-serialize>".to_string()),
                "Execution failed"
            );
            error.into_response()
        }
    }
}

/// `POST /account/{address}/execute-batch`
#[instrument(skip_all, fields(account = %address))]
pub async fn post_execute_batch<R>(
    State(relayer): State<R>,
    Path(address): Path<ChecksummedAddress>,
    Json(body): Json<ExecuteBatchRequest>,
) -> Response
where
    R: Relayer,
    R::Error: IntoResponse,
{
    match relayer.execute_batch(address.into(), &body).await {
        Ok(executed) => (StatusCode::OK, Json(executed)).into_response(),
        Err(error) => {
            tracing::warn!(
                error = %error,
                body = %serde_json::to_string(&body)
                    .unwrap_or_else(|_| "<can-not-serialize>".to_string()),
                "Batch execution failed"
            );
            error.into_response()
        }
    }
}

impl IntoResponse for RelayerLocalError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            RelayerLocalError::NotDeployed(_) => {
                (StatusCode::NOT_FOUND, ErrorReason::AccountNotDeployed)
            }
            RelayerLocalError::Execution(error) => {
                (StatusCode::BAD_REQUEST, ErrorReason::from(error))
            }
        };
        let body = ErrorResponse {
            error: self.to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}
