//! Bootstrapping a factory on a fresh chain.

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use tracing::instrument;

use crate::account::{AccountVersion, SimpleAccount};
use crate::chain::Chain;
use crate::contract::Code;
use crate::error::ExecutionError;
use crate::factory::{FactoryVersion, SimpleAccountFactory, SimpleAccountFactoryInstance};
use crate::interfaces::ISimpleAccountFactory;

/// Addresses of a deployed factory and the logic behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub deployer: Address,
    pub factory: SimpleAccountFactoryInstance,
    pub factory_implementation: Address,
    pub account_implementation: Address,
}

impl Deployment {
    /// Deploys the latest account logic, the latest factory logic bundling it, and a
    /// factory proxy initialized by `deployer`, who becomes its admin.
    #[instrument(skip_all, err, fields(deployer = %deployer))]
    pub fn bootstrap(chain: &mut Chain, deployer: Address) -> Result<Self, ExecutionError> {
        Self::bootstrap_version(chain, deployer, FactoryVersion::LATEST, AccountVersion::LATEST)
    }

    /// Same as [`Deployment::bootstrap`], pinned to older releases.
    pub fn bootstrap_version(
        chain: &mut Chain,
        deployer: Address,
        factory_version: FactoryVersion,
        account_version: AccountVersion,
    ) -> Result<Self, ExecutionError> {
        chain.atomic(|chain| {
            let account_implementation =
                chain.deploy(deployer, Code::logic(SimpleAccount::new(account_version)))?;
            let factory_implementation = chain.deploy(
                deployer,
                Code::logic(SimpleAccountFactory::new(
                    factory_version,
                    account_implementation,
                )),
            )?;
            let factory = chain.deploy_proxy(
                deployer,
                factory_implementation,
                &ISimpleAccountFactory::initializeCall {}.abi_encode(),
            )?;
            tracing::info!(
                %factory,
                %factory_implementation,
                %account_implementation,
                "factory deployed"
            );
            Ok(Deployment {
                deployer,
                factory: SimpleAccountFactoryInstance::new(factory),
                factory_implementation,
                account_implementation,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::DEFAULT_ADMIN_ROLE;
    use crate::test_utils::{DEPLOYER, bootstrapped, chain_at};

    #[test]
    fn test_bootstrap_latest() {
        let (chain, deployment) = bootstrapped();
        let factory = deployment.factory;
        assert_eq!(factory.version(&chain).unwrap(), "3");
        assert_eq!(factory.account_implementation_version(&chain).unwrap(), "3");
        assert_eq!(
            factory.account_implementation(&chain).unwrap(),
            deployment.account_implementation
        );
        assert!(factory.has_role(&chain, DEFAULT_ADMIN_ROLE, DEPLOYER).unwrap());
        assert_eq!(
            chain.implementation(factory.address()),
            Some(deployment.factory_implementation)
        );
    }

    #[test]
    fn test_bootstrap_v1() {
        let mut chain = chain_at(1_000);
        let deployment = Deployment::bootstrap_version(
            &mut chain,
            DEPLOYER,
            FactoryVersion::V1,
            AccountVersion::V1,
        )
        .unwrap();
        assert_eq!(deployment.factory.version(&chain).unwrap(), "1");
        assert_eq!(
            deployment
                .factory
                .account_implementation_version(&chain)
                .unwrap(),
            "1"
        );
    }
}
