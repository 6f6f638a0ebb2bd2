// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use palisade_coordinator::PalisadeService;
use palisade_jobs::{
    config::{JobConfiguration, MAX_MAP_HINT_KEY},
    planner::SplitPlanner,
    split::PalisadeSplit,
    Error,
};
use palisade_types::{
    context::Context,
    error::{CodedError, ErrorKind},
    request::{DataRequestResponse, RegisterDataRequest},
    resource::{ConnectionDetail, LeafResource, RootResource},
    token::RequestToken,
};
use pretty_assertions::assert_eq;

/// Coordinator double answering each known resource id with a fixed number
/// of leaves
struct StubCoordinator {
    sizes: HashMap<&'static str, usize>,
}

#[async_trait]
impl PalisadeService for StubCoordinator {
    async fn register_data_request(
        &self,
        request: RegisterDataRequest,
    ) -> palisade_coordinator::Result<DataRequestResponse> {
        let Some(&size) = self.sizes.get(request.resource_id.as_str()) else {
            return Err(palisade_coordinator::Error::InvalidRequest {
                message: format!("unknown resource {}", request.resource_id),
            });
        };

        let resources = (0..size)
            .map(|i| {
                (
                    LeafResource::new(
                        format!("{}/part-{i}", request.resource_id),
                        "employee",
                        "avro",
                        RootResource::new("/"),
                    ),
                    ConnectionDetail::new(format!("node-{i}:8100")),
                )
            })
            .collect();

        Ok(DataRequestResponse::new(RequestToken::generate(), resources))
    }
}

fn planner(sizes: &[(&'static str, usize)], hint: Option<u32>) -> SplitPlanner {
    let mut config = JobConfiguration::new();
    for (resource, _) in sizes {
        config
            .add_data_request(&RegisterDataRequest::new(
                *resource,
                "alice",
                Context::new("bulk analytics"),
            ))
            .unwrap();
    }
    if let Some(hint) = hint {
        config.set_max_map_hint(hint);
    }

    SplitPlanner::new(config).with_coordinator(Arc::new(StubCoordinator {
        sizes: sizes.iter().copied().collect(),
    }))
}

fn sizes(splits: &[PalisadeSplit]) -> Vec<usize> {
    splits.iter().map(|split| split.resources().len()).collect()
}

#[tokio::test]
async fn single_request_hint_one_yields_one_split() {
    let splits = planner(&[("/data", 5)], Some(1)).plan().await.unwrap();

    assert_eq!(sizes(&splits), vec![5]);
}

#[tokio::test]
async fn oversized_hint_caps_at_resource_count() {
    let splits = planner(&[("/data", 5)], Some(99999)).plan().await.unwrap();

    assert_eq!(sizes(&splits), vec![1, 1, 1, 1, 1]);
}

#[tokio::test]
async fn two_requests_hint_one_yields_one_split_each() {
    let splits = planner(&[("/data", 5), ("/logs", 2)], Some(1))
        .plan()
        .await
        .unwrap();

    assert_eq!(sizes(&splits), vec![5, 2]);
}

#[tokio::test]
async fn two_requests_partition_round_robin_per_response() {
    let splits = planner(&[("/data", 5), ("/logs", 2)], Some(2))
        .plan()
        .await
        .unwrap();

    assert_eq!(sizes(&splits), vec![3, 2, 1, 1]);
}

#[tokio::test]
async fn hint_zero_yields_one_split_per_resource() {
    let splits = planner(&[("/data", 5), ("/logs", 2)], Some(0))
        .plan()
        .await
        .unwrap();

    assert_eq!(sizes(&splits), vec![1, 1, 1, 1, 1, 1, 1]);
}

#[tokio::test]
async fn absent_hint_means_unlimited() {
    let splits = planner(&[("/data", 3)], None).plan().await.unwrap();

    assert_eq!(sizes(&splits), vec![1, 1, 1]);
}

#[tokio::test]
async fn splits_of_distinct_requests_carry_distinct_tokens() {
    let splits = planner(&[("/data", 5), ("/logs", 2)], Some(1))
        .plan()
        .await
        .unwrap();

    assert_eq!(splits.len(), 2);
    assert_ne!(splits[0].token(), splits[1].token());
}

#[tokio::test]
async fn splits_are_emitted_in_request_order() {
    let splits = planner(&[("/logs", 1), ("/data", 1)], Some(1))
        .plan()
        .await
        .unwrap();

    let first = splits[0].resources().keys().next().unwrap();
    assert!(first.id().as_str().starts_with("/logs/"));
}

#[tokio::test]
async fn planted_negative_hint_fails_planning() {
    let mut config = JobConfiguration::new();
    config
        .add_data_request(&RegisterDataRequest::new(
            "/data",
            "alice",
            Context::new("bulk analytics"),
        ))
        .unwrap();
    config.set(MAX_MAP_HINT_KEY, "-1");

    let planner = SplitPlanner::new(config).with_coordinator(Arc::new(StubCoordinator {
        sizes: HashMap::from([("/data", 5)]),
    }));

    let err = planner.plan().await.unwrap_err();

    assert!(matches!(err, Error::InvalidHint { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn missing_coordinator_fails_planning() {
    let mut config = JobConfiguration::new();
    config
        .add_data_request(&RegisterDataRequest::new(
            "/data",
            "alice",
            Context::new("bulk analytics"),
        ))
        .unwrap();

    let err = SplitPlanner::new(config).plan().await.unwrap_err();

    assert!(matches!(err, Error::MissingCoordinator));
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn empty_request_list_fails_planning() {
    let planner = SplitPlanner::new(JobConfiguration::new())
        .with_coordinator(Arc::new(StubCoordinator { sizes: HashMap::new() }));

    let err = planner.plan().await.unwrap_err();

    assert!(matches!(err, Error::NoRequests));
}

#[tokio::test]
async fn registration_failure_fails_the_whole_planning() {
    let mut config = JobConfiguration::new();
    for resource in ["/data", "/unknown"] {
        config
            .add_data_request(&RegisterDataRequest::new(
                resource,
                "alice",
                Context::new("bulk analytics"),
            ))
            .unwrap();
    }

    // the stub does not serve /unknown, its registration fails
    let planner = SplitPlanner::new(config).with_coordinator(Arc::new(StubCoordinator {
        sizes: HashMap::from([("/data", 5)]),
    }));

    let err = planner.plan().await.unwrap_err();

    assert!(matches!(err, Error::Registration { .. }));
}
