//! Core trait of a relayer: the operations exposed over HTTP.

use alloy_primitives::{Address, U256};
use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::types::{
    AccountAddressResponse, AccountResponse, CreateAccountRequest, CreateAccountResponse,
    ExecuteBatchRequest, ExecuteRequest, ExecuteResponse, FactoryResponse,
};

/// Asynchronous interface of a smart account relayer.
///
/// A relayer reads account and factory state, deploys accounts through the factory,
/// and submits authorizations signed by account owners.
pub trait Relayer {
    /// The error type returned by this relayer.
    type Error: Debug + Display;

    /// Describes the factory this relayer deploys accounts with.
    fn factory(&self) -> impl Future<Output = Result<FactoryResponse, Self::Error>> + Send;

    /// Computes the deterministic address of the account for `owner` and `salt`.
    fn account_address(
        &self,
        owner: Address,
        salt: U256,
    ) -> impl Future<Output = Result<AccountAddressResponse, Self::Error>> + Send;

    /// Deploys the account for the request's owner and salt, if not deployed yet.
    fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> impl Future<Output = Result<CreateAccountResponse, Self::Error>> + Send;

    /// Reads owner, version and balance of a deployed account.
    fn account(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<AccountResponse, Self::Error>> + Send;

    /// Submits a signed single-call authorization to `account`.
    fn execute(
        &self,
        account: Address,
        request: &ExecuteRequest,
    ) -> impl Future<Output = Result<ExecuteResponse, Self::Error>> + Send;

    /// Submits a signed batch authorization to `account`.
    fn execute_batch(
        &self,
        account: Address,
        request: &ExecuteBatchRequest,
    ) -> impl Future<Output = Result<ExecuteResponse, Self::Error>> + Send;
}

impl<T: Relayer + Send + Sync> Relayer for Arc<T> {
    type Error = T::Error;

    fn factory(&self) -> impl Future<Output = Result<FactoryResponse, Self::Error>> + Send {
        self.as_ref().factory()
    }

    fn account_address(
        &self,
        owner: Address,
        salt: U256,
    ) -> impl Future<Output = Result<AccountAddressResponse, Self::Error>> + Send {
        self.as_ref().account_address(owner, salt)
    }

    fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> impl Future<Output = Result<CreateAccountResponse, Self::Error>> + Send {
        self.as_ref().create_account(request)
    }

    fn account(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<AccountResponse, Self::Error>> + Send {
        self.as_ref().account(account)
    }

    fn execute(
        &self,
        account: Address,
        request: &ExecuteRequest,
    ) -> impl Future<Output = Result<ExecuteResponse, Self::Error>> + Send {
        self.as_ref().execute(account, request)
    }

    fn execute_batch(
        &self,
        account: Address,
        request: &ExecuteBatchRequest,
    ) -> impl Future<Output = Result<ExecuteResponse, Self::Error>> + Send {
        self.as_ref().execute_batch(account, request)
    }
}
