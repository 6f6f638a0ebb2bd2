// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The Palisade coordinator.
//!
//! The coordinator is the top-level façade of the control plane. Registering
//! a data request resolves the stated user, expands the named resource,
//! filters through the policy resolver, mints a request token and caches the
//! per-token policy map that data nodes redeem while streaming. User lookup
//! and resource expansion run concurrently; every external call carries a
//! deployment-configured deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use palisade_cache::Cache;
use palisade_directory::UserDirectory;
use palisade_policy::{GetPolicyRequest, PolicyResolver};
use palisade_resource::ResourceProvider;
use palisade_settings::Timeouts;
use palisade_types::{
    collections::OrderedMap,
    policy::Policy,
    request::{DataRequestResponse, RegisterDataRequest},
    resource::LeafResource,
    token::RequestToken,
};
use snafu::{ensure, OptionExt, ResultExt};

mod error;

pub use error::{Error, Result};
use error::{
    CacheSnafu, InvalidRequestSnafu, PolicySnafu, ResourceSnafu, TimeoutSnafu, UserSnafu,
};

/// The cache namespace holding per-token policy maps
pub const NAMESPACE: &str = "palisade";

/// The policy map cached under a request token
pub type PolicyMap = OrderedMap<LeafResource, Policy>;

/// Registration of data requests
#[async_trait]
pub trait PalisadeService: Send + Sync {
    /// Register a request to read a named resource
    ///
    /// On success the returned token redeems the cached policy map and the
    /// resource map names the data node connection for every accessible
    /// leaf.
    async fn register_data_request(
        &self,
        request: RegisterDataRequest,
    ) -> Result<DataRequestResponse>;
}

/// The default coordinator over the user, resource and policy services
pub struct PalisadeCoordinator {
    users: Arc<dyn UserDirectory>,
    resources: Arc<dyn ResourceProvider>,
    policy: Arc<dyn PolicyResolver>,
    cache: Cache<RequestToken, PolicyMap>,
    token_ttl: Duration,
    timeouts: Timeouts,
}

impl PalisadeCoordinator {
    /// Create a coordinator
    ///
    /// `cache` is expected to use the [`NAMESPACE`] namespace; `token_ttl`
    /// bounds how long a minted token stays redeemable. Expiry is the sole
    /// deletion mechanism for token bindings.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        resources: Arc<dyn ResourceProvider>,
        policy: Arc<dyn PolicyResolver>,
        cache: Cache<RequestToken, PolicyMap>,
        token_ttl: Duration,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            users,
            resources,
            policy,
            cache,
            token_ttl,
            timeouts,
        }
    }

    /// Look up the policy map cached for a token
    ///
    /// This is the redemption path data nodes use; `None` means the token
    /// never existed or has expired.
    pub async fn policies_for_token(&self, token: &RequestToken) -> Result<Option<PolicyMap>> {
        self.cache.get(token).await.context(CacheSnafu)
    }
}

#[async_trait]
impl PalisadeService for PalisadeCoordinator {
    #[tracing::instrument(
        level = "debug",
        skip(self, request),
        fields(user = %request.user_id, resource = %request.resource_id)
    )]
    async fn register_data_request(
        &self,
        request: RegisterDataRequest,
    ) -> Result<DataRequestResponse> {
        ensure!(
            !request.user_id.as_str().is_empty(),
            InvalidRequestSnafu {
                message: "user id must not be empty",
            }
        );
        ensure!(
            !request.resource_id.as_str().is_empty(),
            InvalidRequestSnafu {
                message: "resource id must not be empty",
            }
        );

        let user_lookup = async {
            tokio::time::timeout(self.timeouts.user(), self.users.get_user(&request.user_id))
                .await
                .ok()
                .context(TimeoutSnafu {
                    operation: "user directory",
                })?
                .context(UserSnafu)
        };
        let resource_expansion = async {
            tokio::time::timeout(
                self.timeouts.resource(),
                self.resources.get_resources_by_id(&request.resource_id),
            )
            .await
            .ok()
            .context(TimeoutSnafu {
                operation: "resource provider",
            })?
            .context(ResourceSnafu)
        };

        let (user, mut resources) = tokio::try_join!(user_lookup, resource_expansion)?;

        let accessible = tokio::time::timeout(
            self.timeouts.policy(),
            self.policy.can_access(
                &request.context,
                &user,
                resources.keys().cloned().collect(),
            ),
        )
        .await
        .ok()
        .context(TimeoutSnafu {
            operation: "policy resolver",
        })?
        .context(PolicySnafu)?;

        let token = RequestToken::generate();

        let policies = tokio::time::timeout(
            self.timeouts.policy(),
            self.policy.get_policy(GetPolicyRequest {
                context: request.context.clone(),
                user,
                resources: accessible.clone(),
            }),
        )
        .await
        .ok()
        .context(TimeoutSnafu {
            operation: "policy resolver",
        })?
        .context(PolicySnafu)?;

        tokio::time::timeout(
            self.timeouts.cache(),
            self.cache.insert_with_ttl(token, policies, self.token_ttl),
        )
        .await
        .ok()
        .context(TimeoutSnafu { operation: "cache" })?
        .context(CacheSnafu)?;

        resources.retain(|leaf, _| accessible.contains(leaf));
        tracing::debug!(token = %token, resources = resources.len(), "registered data request");

        Ok(DataRequestResponse::new(token, resources))
    }
}
