// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The split planner.
//!
//! Turns the data requests of one job into a flat list of input splits:
//! every request is registered with the coordinator, all registrations in
//! flight at once, and each response is partitioned round-robin under the
//! job's max parallelism hint. Split lists are emitted in request order.

use std::sync::Arc;

use futures::future::try_join_all;
use palisade_coordinator::PalisadeService;
use snafu::{ensure, OptionExt, ResultExt};

use crate::{
    config::JobConfiguration,
    error::{MissingCoordinatorSnafu, NoRequestsSnafu, RegistrationSnafu, Result},
    split::{partition, PalisadeSplit},
};

/// Plans the parallel work units for one job
pub struct SplitPlanner {
    coordinator: Option<Arc<dyn PalisadeService>>,
    config: JobConfiguration,
}

impl SplitPlanner {
    /// Create a planner over the given job configuration
    pub fn new(config: JobConfiguration) -> Self {
        Self {
            coordinator: None,
            config,
        }
    }

    /// Bind the coordinator used to register the job's requests
    pub fn with_coordinator(mut self, coordinator: Arc<dyn PalisadeService>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn config(&self) -> &JobConfiguration {
        &self.config
    }

    /// Plan the job's input splits
    ///
    /// Fails as a whole on the first registration failure; registrations
    /// still in flight are dropped. The union of the returned splits covers
    /// every response's resource map exactly once.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn plan(&self) -> Result<Vec<PalisadeSplit>> {
        let coordinator = self.coordinator.as_ref().context(MissingCoordinatorSnafu)?;

        let requests = self.config.data_requests()?;
        ensure!(!requests.is_empty(), NoRequestsSnafu);

        let hint = self.config.max_map_hint()?;

        let responses = try_join_all(
            requests
                .into_iter()
                .map(|request| coordinator.register_data_request(request)),
        )
        .await
        .context(RegistrationSnafu)?;

        let splits = responses
            .into_iter()
            .flat_map(|response| partition(response, hint))
            .collect::<Vec<_>>();

        tracing::debug!(splits = splits.len(), "planned input splits");

        Ok(splits)
    }
}
