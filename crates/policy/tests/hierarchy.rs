// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use std::sync::Arc;
use std::time::Duration;

use palisade_cache::Cache;
use palisade_policy::{
    registry::RuleRegistry, Error, GetPolicyRequest, HierarchicalPolicyService, PolicyResolver,
    NAMESPACE,
};
use palisade_types::{
    context::Context,
    policy::Policy,
    record::Record,
    resource::{DirectoryResource, LeafResource, ResourceId, RootResource},
    rules::{Rule, Rules},
    users::User,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Resource rule keeping a leaf only for users holding a configured auth
struct RequiresAuth {
    auth: String,
}

impl Rule<LeafResource> for RequiresAuth {
    fn apply(&self, item: LeafResource, user: &User, _context: &Context) -> Option<LeafResource> {
        user.has_auth(&self.auth).then_some(item)
    }
}

fn registry() -> RuleRegistry<LeafResource> {
    RuleRegistry::new().with("requires_auth", |config: &serde_json::Value| {
        let auth = config
            .get("auth")
            .and_then(serde_json::Value::as_str)
            .ok_or("missing auth field")?
            .to_owned();

        Ok(Arc::new(RequiresAuth { auth }) as Arc<dyn Rule<LeafResource>>)
    })
}

fn leaf(id: &str, resource_type: &str) -> LeafResource {
    let root = RootResource::new("/");
    let parent = id.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
    if parent.is_empty() || parent == "/" {
        LeafResource::new(id, resource_type, "avro", root)
    } else {
        LeafResource::new(
            id,
            resource_type,
            "avro",
            DirectoryResource::new(parent, root.into()),
        )
    }
}

async fn service() -> HierarchicalPolicyService {
    let service = HierarchicalPolicyService::builder()
        .cache(Cache::new(NAMESPACE, Duration::from_secs(60)))
        .resource_rules(registry())
        .build()
        .unwrap();

    // employee-typed data requires the staff auth
    service
        .set_type_policy(
            "employee",
            Policy::new().with_resource_rules(
                Rules::new().with_rule("vis", "requires_auth", json!({"auth": "staff"})),
            ),
        )
        .await
        .unwrap();

    // everything below /data carries record redaction
    service
        .set_resource_policy(
            &ResourceId::from("/data"),
            Policy::new().with_record_rules(
                Rules::<Record>::new()
                    .with_message("salary redaction applies")
                    .with_rule("redactSalary", "redact_field", json!({"field": "salary"})),
            ),
        )
        .await
        .unwrap();

    // the employees file itself lifts the staff requirement
    service
        .set_resource_policy(
            &ResourceId::from("/data/employees"),
            Policy::new()
                .with_resource_rules(Rules::new().with_negation("vis")),
        )
        .await
        .unwrap();

    service
}

#[tokio::test]
async fn negation_lifts_inherited_requirement() {
    let service = service().await;
    let user = User::new("alice");
    let context = Context::new("quarterly report");

    let accessible = service
        .can_access(
            &context,
            &user,
            vec![
                leaf("/data/employees", "employee"),
                leaf("/data/payroll", "employee"),
            ],
        )
        .await
        .unwrap();

    // alice holds no staff auth: the employees leaf negates the inherited
    // vis rule, the payroll leaf does not
    let ids = accessible
        .iter()
        .map(|resource| resource.id().as_str().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["/data/employees".to_owned()]);
}

#[tokio::test]
async fn auth_satisfies_inherited_requirement() {
    let service = service().await;
    let user = User::new("bob").with_auth("staff");
    let context = Context::new("audit");

    let accessible = service
        .can_access(&context, &user, vec![leaf("/data/payroll", "employee")])
        .await
        .unwrap();

    assert_eq!(accessible.len(), 1);
}

#[tokio::test]
async fn unbound_resource_is_filtered() {
    let service = service().await;
    let user = User::new("alice");
    let context = Context::new("debugging");

    let accessible = service
        .can_access(&context, &user, vec![leaf("/logs/access", "log")])
        .await
        .unwrap();

    assert!(accessible.is_empty());
}

#[tokio::test]
async fn get_policy_returns_merged_record_rules() {
    let service = service().await;

    let policies = service
        .get_policy(GetPolicyRequest {
            context: Context::new("quarterly report"),
            user: User::new("alice"),
            resources: vec![leaf("/data/employees", "employee")],
        })
        .await
        .unwrap();

    let policy = policies.get(&leaf("/data/employees", "employee")).unwrap();
    assert_eq!(policy.record_rules().message(), "salary redaction applies");
    assert_eq!(policy.record_rules().entries().len(), 1);
}

#[tokio::test]
async fn accessible_resource_without_record_rules_is_omitted() {
    let service = service().await;

    // resource-level rules only, no record rules anywhere on the chain
    service
        .set_resource_policy(
            &ResourceId::from("/other"),
            Policy::new().with_resource_rules(Rules::new().with_message("unrestricted")),
        )
        .await
        .unwrap();

    let policies = service
        .get_policy(GetPolicyRequest {
            context: Context::new("export"),
            user: User::new("alice"),
            resources: vec![leaf("/other/file", "misc")],
        })
        .await
        .unwrap();

    assert!(policies.is_empty());
}

#[tokio::test]
async fn unknown_evaluator_is_malformed() {
    let service = service().await;

    service
        .set_resource_policy(
            &ResourceId::from("/broken"),
            Policy::new().with_resource_rules(Rules::new().with_rule(
                "x",
                "nonexistent",
                json!({}),
            )),
        )
        .await
        .unwrap();

    let err = service
        .can_access(
            &Context::new("export"),
            &User::new("alice"),
            vec![leaf("/broken/file", "misc")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PolicyMalformed { .. }));
}

#[test]
fn builder_without_cache_fails() {
    let err = HierarchicalPolicyService::builder().build().unwrap_err();

    assert!(matches!(err, Error::NoConfig));
}
