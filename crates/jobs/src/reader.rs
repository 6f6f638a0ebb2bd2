// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The record reader contract.
//!
//! A reader is initialised with one input split and iterates the records of
//! every leaf resource in it. Record-level rules are applied by the data
//! node while streaming; the reader only ever sees already-filtered
//! records.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use palisade_types::{
    record::Record,
    resource::{ConnectionDetail, LeafResource},
    token::RequestToken,
};
use snafu::{ensure, OptionExt};

use crate::{
    error::{EmptySplitSnafu, NotInitializedSnafu, Result, SplitTypeMismatchSnafu},
    split::{InputSplit, PalisadeSplit},
};

/// Stream of filtered records for one leaf resource
pub type RecordStream = BoxStream<'static, Result<Record>>;

/// Connection to data nodes
///
/// Implementations open a stream of records for one leaf resource,
/// presenting the request token so the data node can redeem the cached
/// policy map and apply the record rules while streaming.
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Open the filtered record stream for `resource`
    async fn open(
        &self,
        token: RequestToken,
        resource: &LeafResource,
        connection: &ConnectionDetail,
    ) -> Result<RecordStream>;
}

/// Reads the records of one [`PalisadeSplit`]
pub struct PalisadeRecordReader {
    client: Arc<dyn DataClient>,
    state: Option<ReaderState>,
}

struct ReaderState {
    token: RequestToken,
    pending: VecDeque<(LeafResource, ConnectionDetail)>,
    total: usize,
    completed: usize,
    stream: Option<RecordStream>,
    current_key: Option<LeafResource>,
    current_value: Option<Record>,
}

impl PalisadeRecordReader {
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        Self {
            client,
            state: None,
        }
    }

    /// Initialise the reader with a split
    ///
    /// Fails with [`SplitTypeMismatch`](crate::Error::SplitTypeMismatch)
    /// for splits that are not [`PalisadeSplit`]s and with
    /// [`EmptySplit`](crate::Error::EmptySplit) for splits carrying no
    /// resources.
    pub fn initialize(&mut self, split: &dyn InputSplit) -> Result<()> {
        let split = split
            .as_any()
            .downcast_ref::<PalisadeSplit>()
            .context(SplitTypeMismatchSnafu)?;

        ensure!(!split.resources().is_empty(), EmptySplitSnafu);

        self.state = Some(ReaderState {
            token: split.token(),
            pending: split
                .resources()
                .iter()
                .map(|(leaf, connection)| (leaf.clone(), connection.clone()))
                .collect(),
            total: split.resources().len(),
            completed: 0,
            stream: None,
            current_key: None,
            current_value: None,
        });

        Ok(())
    }

    /// Advance to the next record
    ///
    /// Returns `false` once every resource of the split is exhausted.
    pub async fn next_key_value(&mut self) -> Result<bool> {
        let state = self.state.as_mut().context(NotInitializedSnafu)?;

        loop {
            if state.stream.is_none() {
                let Some((leaf, connection)) = state.pending.pop_front() else {
                    state.current_key = None;
                    state.current_value = None;
                    return Ok(false);
                };

                let stream = self.client.open(state.token, &leaf, &connection).await?;
                state.current_key = Some(leaf);
                state.stream = Some(stream);
            }

            if let Some(stream) = state.stream.as_mut() {
                match stream.next().await {
                    Some(Ok(record)) => {
                        state.current_value = Some(record);
                        return Ok(true);
                    }
                    Some(Err(err)) => return Err(err),
                    None => {
                        state.completed += 1;
                        state.stream = None;
                    }
                }
            }
        }
    }

    /// The resource the current record belongs to
    pub fn current_key(&self) -> Option<&LeafResource> {
        self.state.as_ref()?.current_key.as_ref()
    }

    /// The current record
    pub fn current_value(&self) -> Option<&Record> {
        self.state.as_ref()?.current_value.as_ref()
    }

    /// Fraction of the split's resources fully read, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        match &self.state {
            None => 0.0,
            Some(state) => state.completed as f32 / state.total as f32,
        }
    }

    /// Release the current stream and forget the split
    pub fn close(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use palisade_types::{request::DataRequestResponse, resource::RootResource};
    use pretty_assertions::assert_eq;
    use snafu::whatever;

    use super::*;
    use crate::Error;

    struct StubClient;

    #[async_trait]
    impl DataClient for StubClient {
        async fn open(
            &self,
            _token: RequestToken,
            resource: &LeafResource,
            _connection: &ConnectionDetail,
        ) -> Result<RecordStream> {
            if resource.id().as_str() == "/data/broken" {
                whatever!("data node refused the stream");
            }

            let records = (0..2)
                .map(|i| {
                    Ok(Record::from(serde_json::json!({
                        "resource": resource.id().as_str(),
                        "row": i,
                    })))
                })
                .collect::<Vec<_>>();

            Ok(stream::iter(records).boxed())
        }
    }

    fn leaf(id: &str) -> LeafResource {
        LeafResource::new(id, "employee", "avro", RootResource::new("/"))
    }

    fn split(ids: &[&str]) -> PalisadeSplit {
        let resources = ids
            .iter()
            .map(|id| (leaf(id), ConnectionDetail::new("node-1:8100")))
            .collect();

        PalisadeSplit::new(DataRequestResponse::new(
            RequestToken::from_u128(7),
            resources,
        ))
    }

    struct ForeignSplit;

    impl InputSplit for ForeignSplit {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn resource_count(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn reads_every_resource_of_the_split() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));
        reader.initialize(&split(&["/data/a", "/data/b"])).unwrap();

        let mut seen = Vec::new();
        while reader.next_key_value().await.unwrap() {
            seen.push((
                reader.current_key().unwrap().id().as_str().to_owned(),
                reader.current_value().unwrap().clone(),
            ));
        }

        assert_eq!(seen.len(), 4);
        assert!(seen.iter().take(2).all(|(id, _)| id == "/data/a"));
        assert!(seen.iter().skip(2).all(|(id, _)| id == "/data/b"));
        assert_eq!(reader.progress(), 1.0);
        assert!(reader.current_key().is_none());
    }

    #[tokio::test]
    async fn progress_advances_per_completed_resource() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));
        reader.initialize(&split(&["/data/a", "/data/b"])).unwrap();

        assert_eq!(reader.progress(), 0.0);

        // drain the first resource and touch the second
        for _ in 0..3 {
            assert!(reader.next_key_value().await.unwrap());
        }

        assert_eq!(reader.progress(), 0.5);
    }

    #[tokio::test]
    async fn foreign_split_type_is_rejected() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));

        let err = reader.initialize(&ForeignSplit).unwrap_err();

        assert!(matches!(err, Error::SplitTypeMismatch));
    }

    #[tokio::test]
    async fn empty_split_is_rejected() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));

        let err = reader.initialize(&split(&[])).unwrap_err();

        assert!(matches!(err, Error::EmptySplit));
    }

    #[tokio::test]
    async fn reading_before_initialize_fails() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));

        let err = reader.next_key_value().await.unwrap_err();

        assert!(matches!(err, Error::NotInitialized));
    }

    #[tokio::test]
    async fn stream_errors_surface() {
        let mut reader = PalisadeRecordReader::new(Arc::new(StubClient));
        reader.initialize(&split(&["/data/broken"])).unwrap();

        let err = reader.next_key_value().await.unwrap_err();

        assert!(matches!(err, Error::Other { .. }));
    }
}
