//! Neo4j graph wrapper with a per-call time budget.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, TryStreamExt};
use neo4rs::{Graph, Query, Row};

use crate::infrastructure::ports::RepoError;

/// Store calls default to this budget when none is configured.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Concrete wrapper around `neo4rs::Graph`.
///
/// Every call is bounded by `timeout`; an expired call surfaces as
/// `RepoError::Timeout` and never blocks the caller past the budget.
#[derive(Clone)]
pub struct Neo4jGraph {
    inner: Graph,
    timeout: Duration,
}

struct Neo4jRowStream {
    inner: Pin<Box<dyn Stream<Item = Result<Row, neo4rs::Error>> + Send>>,
}

impl Neo4jRowStream {
    fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Row, neo4rs::Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    async fn next(&mut self) -> Result<Option<Row>, neo4rs::Error> {
        let next = futures_util::future::poll_fn(|cx| self.inner.as_mut().poll_next(cx)).await;
        match next {
            Some(row) => row.map(Some),
            None => Ok(None),
        }
    }
}

impl Neo4jGraph {
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: graph,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inner(&self) -> &Graph {
        &self.inner
    }

    fn timed_out(&self, operation: &'static str) -> RepoError {
        RepoError::timeout(operation, self.timeout.as_millis() as u64)
    }

    /// Run a statement that returns nothing.
    pub async fn run(&self, operation: &'static str, query: Query) -> Result<(), RepoError> {
        tokio::time::timeout(self.timeout, self.inner.run(query))
            .await
            .map_err(|_| self.timed_out(operation))?
            .map_err(|e| RepoError::database(operation, e))
    }

    /// Execute a query and drain every row within the time budget.
    pub async fn fetch(&self, operation: &'static str, query: Query) -> Result<Vec<Row>, RepoError> {
        let drain = async {
            let stream = self.inner.execute(query).await?;
            let stream = stream.into_stream();
            let mut rows = Neo4jRowStream::from_stream(TryStreamExt::into_stream(stream));
            let mut out = Vec::new();
            while let Some(row) = rows.next().await? {
                out.push(row);
            }
            Ok::<_, neo4rs::Error>(out)
        };

        tokio::time::timeout(self.timeout, drain)
            .await
            .map_err(|_| self.timed_out(operation))?
            .map_err(|e| RepoError::database(operation, e))
    }

    /// Execute a query expected to yield at most one row.
    pub async fn fetch_first(
        &self,
        operation: &'static str,
        query: Query,
    ) -> Result<Option<Row>, RepoError> {
        Ok(self.fetch(operation, query).await?.into_iter().next())
    }
}
