// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Hierarchical policy resolution for Palisade.
//!
//! Policies are bound either to a resource id or to a data type and stored
//! through the cache gateway. Resolving the rules applicable to a leaf
//! resource walks its ancestor chain (the data-type binding first, then
//! every ancestor from the root down to the leaf itself) and merges the
//! rule chains with negation-aware semantics. Resource-level rules decide which
//! leaves a user may see at all; record-level rules are handed onwards for
//! the data nodes to apply while streaming.

use async_trait::async_trait;
use futures::future::try_join_all;
use palisade_cache::Cache;
use palisade_types::{
    collections::OrderedMap,
    context::Context,
    policy::Policy,
    resource::{LeafResource, ResourceId},
    rules::{RuleEntry, Rules},
    users::User,
};
use snafu::ResultExt;

mod error;
mod merge;
pub mod registry;

pub use error::{Error, Result};
use error::{CacheSnafu, NoConfigSnafu};
use registry::RuleRegistry;

/// The cache namespace holding policy bindings
pub const NAMESPACE: &str = "policies";

/// Key prefix for resource-keyed bindings
pub const RESOURCE_POLICY_PREFIX: &str = "resourcePolicy.";

/// Key prefix for data-type-keyed bindings
pub const DATA_TYPE_POLICY_PREFIX: &str = "dataTypePolicy.";

/// Request payload for [`PolicyResolver::get_policy`]
#[derive(Debug, Clone)]
pub struct GetPolicyRequest {
    pub context: Context,
    pub user: User,
    pub resources: Vec<LeafResource>,
}

/// Resolution and administration of hierarchical policies
#[async_trait]
pub trait PolicyResolver: Send + Sync {
    /// Filter `resources` down to those the user may see
    ///
    /// A resource survives iff its merged resource-rule chain, evaluated
    /// against `(resource, user, context)`, keeps the resource. Resources
    /// without any applicable policy are filtered out.
    async fn can_access(
        &self,
        context: &Context,
        user: &User,
        resources: Vec<LeafResource>,
    ) -> Result<Vec<LeafResource>>;

    /// Resolve the per-resource policies for accessible resources
    ///
    /// Each returned policy carries the merged record-rule chain the data
    /// node applies while streaming. Accessible resources without record
    /// rules are omitted.
    async fn get_policy(
        &self,
        request: GetPolicyRequest,
    ) -> Result<OrderedMap<LeafResource, Policy>>;

    /// Bind a policy to a resource id
    async fn set_resource_policy(&self, id: &ResourceId, policy: Policy) -> Result<()>;

    /// Bind a policy to a data type
    async fn set_type_policy(&self, resource_type: &str, policy: Policy) -> Result<()>;
}

/// Policy resolver over cache-stored bindings
pub struct HierarchicalPolicyService {
    cache: Cache<String, Policy>,
    resource_rules: RuleRegistry<LeafResource>,
}

impl core::fmt::Debug for HierarchicalPolicyService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HierarchicalPolicyService").finish_non_exhaustive()
    }
}

impl HierarchicalPolicyService {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Fetch the present policy bindings along a leaf's source chain
    ///
    /// The chain is iterated up front and all cache fetches are issued
    /// concurrently; the reduce over the results stays in traversal order
    /// regardless of completion order. Absent bindings are skipped.
    async fn policy_sources(&self, leaf: &LeafResource) -> Result<Vec<Policy>> {
        let mut keys = vec![format!(
            "{DATA_TYPE_POLICY_PREFIX}{}",
            leaf.resource_type()
        )];

        let ancestors_start = keys.len();
        keys.extend(
            leaf.ancestors()
                .map(|ancestor| format!("{RESOURCE_POLICY_PREFIX}{}", ancestor.id())),
        );
        // ancestors iterate nearest-first, the merge wants farthest-first
        keys[ancestors_start..].reverse();
        keys.push(format!("{RESOURCE_POLICY_PREFIX}{}", leaf.id()));

        let bindings = try_join_all(keys.iter().map(|key| self.cache.get(key)))
            .await
            .context(CacheSnafu)?;

        Ok(bindings.into_iter().flatten().collect())
    }

    /// Run a merged resource-rule chain against one resource
    fn keeps_resource(
        &self,
        rules: &Rules<LeafResource>,
        resource: &LeafResource,
        user: &User,
        context: &Context,
    ) -> Result<bool> {
        let mut item = Some(resource.clone());

        for entry in rules.entries() {
            let RuleEntry::Rule {
                evaluator, config, ..
            } = entry
            else {
                continue;
            };

            let Some(current) = item.take() else {
                break;
            };
            let rule = self.resource_rules.build(evaluator, config)?;
            item = rule.apply(current, user, context);
        }

        Ok(item.is_some())
    }

    async fn resolve_access(
        &self,
        context: &Context,
        user: &User,
        resource: LeafResource,
    ) -> Result<Option<LeafResource>> {
        let sources = self.policy_sources(&resource).await?;

        let Some(rules) = merge::merge_chain(sources.iter().map(Policy::resource_rules)) else {
            tracing::debug!(resource = %resource.id(), "no policy applies, filtering resource");
            return Ok(None);
        };

        if self.keeps_resource(&rules, &resource, user, context)? {
            Ok(Some(resource))
        } else {
            tracing::debug!(resource = %resource.id(), "resource rules deny access");
            Ok(None)
        }
    }
}

#[async_trait]
impl PolicyResolver for HierarchicalPolicyService {
    #[tracing::instrument(level = "debug", skip_all, fields(user = %user.id, resources = resources.len()))]
    async fn can_access(
        &self,
        context: &Context,
        user: &User,
        resources: Vec<LeafResource>,
    ) -> Result<Vec<LeafResource>> {
        let decisions = try_join_all(
            resources
                .into_iter()
                .map(|resource| self.resolve_access(context, user, resource)),
        )
        .await?;

        Ok(decisions.into_iter().flatten().collect())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(user = %request.user.id, resources = request.resources.len()))]
    async fn get_policy(
        &self,
        request: GetPolicyRequest,
    ) -> Result<OrderedMap<LeafResource, Policy>> {
        let resolved = try_join_all(request.resources.into_iter().map(|resource| async move {
            let sources = self.policy_sources(&resource).await?;

            let resource_rules = merge::merge_chain(sources.iter().map(Policy::resource_rules));
            let record_rules = merge::merge_chain(sources.iter().map(Policy::record_rules));

            Ok::<_, Error>((resource, resource_rules, record_rules))
        }))
        .await?;

        let mut policies = OrderedMap::new();
        for (resource, resource_rules, record_rules) in resolved {
            let Some(record_rules) = record_rules else {
                tracing::warn!(
                    resource = %resource.id(),
                    "resource is accessible but has no record rules, omitting from policy map"
                );
                continue;
            };

            let _ = policies.insert(
                resource,
                Policy::new()
                    .with_resource_rules(resource_rules.unwrap_or_default())
                    .with_record_rules(record_rules),
            );
        }

        Ok(policies)
    }

    #[tracing::instrument(level = "debug", skip(self, policy))]
    async fn set_resource_policy(&self, id: &ResourceId, policy: Policy) -> Result<()> {
        self.cache
            .insert(format!("{RESOURCE_POLICY_PREFIX}{id}"), policy)
            .await
            .context(CacheSnafu)
    }

    #[tracing::instrument(level = "debug", skip(self, policy))]
    async fn set_type_policy(&self, resource_type: &str, policy: Policy) -> Result<()> {
        self.cache
            .insert(format!("{DATA_TYPE_POLICY_PREFIX}{resource_type}"), policy)
            .await
            .context(CacheSnafu)
    }
}

/// Builder for [`HierarchicalPolicyService`]
#[derive(Default)]
pub struct Builder {
    cache: Option<Cache<String, Policy>>,
    resource_rules: RuleRegistry<LeafResource>,
}

impl Builder {
    /// Set the cache holding the policy bindings
    pub fn cache(mut self, cache: Cache<String, Policy>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the registry evaluating resource rules
    pub fn resource_rules(mut self, registry: RuleRegistry<LeafResource>) -> Self {
        self.resource_rules = registry;
        self
    }

    /// Build the service
    ///
    /// Fails with [`Error::NoConfig`] when no cache was configured.
    pub fn build(self) -> Result<HierarchicalPolicyService> {
        let cache = self.cache.ok_or_else(|| NoConfigSnafu.build())?;

        Ok(HierarchicalPolicyService {
            cache,
            resource_rules: self.resource_rules,
        })
    }
}
