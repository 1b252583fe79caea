//! Per-collection work units and the deadline wrapper around a composite write.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::EventError;

/// Result of one sequential unit.
///
/// `touched` lists every id the unit created or overwrote before it stopped,
/// so compensation knows exactly what to undo.
#[derive(Debug)]
pub enum BatchOutcome<Id> {
    Completed(Vec<Id>),
    Failed { touched: Vec<Id>, error: EventError },
}

impl<Id> BatchOutcome<Id> {
    pub fn touched(&self) -> &[Id] {
        match self {
            Self::Completed(ids) => ids,
            Self::Failed { touched, .. } => touched,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_parts(self) -> (Vec<Id>, Option<EventError>) {
        match self {
            Self::Completed(ids) => (ids, None),
            Self::Failed { touched, error } => (touched, Some(error)),
        }
    }
}

/// Run `step` over `items` one at a time, stopping at the first failure.
///
/// Cancellation is checked before each item. An id already produced is not
/// recorded twice.
pub(super) async fn run_unit<I, Id, F, Fut>(
    items: I,
    cancel: &CancellationToken,
    mut step: F,
) -> BatchOutcome<Id>
where
    I: IntoIterator,
    Id: PartialEq,
    F: FnMut(usize, I::Item) -> Fut,
    Fut: Future<Output = Result<Id, EventError>>,
{
    let mut touched = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return BatchOutcome::Failed {
                touched,
                error: EventError::Cancelled,
            };
        }
        match step(index, item).await {
            Ok(id) => {
                if !touched.contains(&id) {
                    touched.push(id);
                }
            }
            Err(error) => return BatchOutcome::Failed { touched, error },
        }
    }
    BatchOutcome::Completed(touched)
}

/// Drive `operation` to completion, cancelling its token once `deadline`
/// passes.
///
/// The operation is never dropped mid-flight: after the deadline it keeps
/// running so it can observe the cancellation and roll back.
pub(super) async fn run_with_deadline<F, Fut, T>(
    deadline: Option<Duration>,
    cancel: &CancellationToken,
    operation: F,
) -> T
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = T>,
{
    let token = cancel.child_token();
    let Some(limit) = deadline else {
        return operation(token).await;
    };

    let op = operation(token.clone());
    tokio::pin!(op);
    tokio::select! {
        out = &mut op => return out,
        _ = tokio::time::sleep(limit) => {}
    }

    tracing::warn!(
        deadline_ms = limit.as_millis() as u64,
        "Event operation deadline expired, cancelling"
    );
    token.cancel();
    op.await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unit_stops_at_first_failure() {
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();
        let outcome = run_unit(1..=5, &cancel, |_, n| {
            seen.push(n);
            async move {
                if n == 3 {
                    Err(EventError::Internal("boom".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(outcome.touched(), &[1, 2]);
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn cancelled_unit_reports_cancellation_with_progress() {
        let cancel = CancellationToken::new();
        let trip = cancel.clone();
        let outcome = run_unit(0..4, &cancel, |i, n| {
            if i == 1 {
                trip.cancel();
            }
            async move { Ok::<_, EventError>(n) }
        })
        .await;

        let (touched, error) = outcome.into_parts();
        assert_eq!(touched, vec![0, 1]);
        assert!(matches!(error, Some(EventError::Cancelled)));
    }

    #[tokio::test]
    async fn deadline_cancels_but_lets_the_operation_finish() {
        let cancel = CancellationToken::new();
        let result = run_with_deadline(Some(Duration::from_millis(20)), &cancel, |token| async move {
            token.cancelled().await;
            "rolled back"
        })
        .await;

        assert_eq!(result, "rolled back");
        assert!(!cancel.is_cancelled(), "caller token is left alone");
    }

    #[tokio::test]
    async fn caller_cancellation_reaches_the_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let observed = run_with_deadline(None, &cancel, |token| async move { token.is_cancelled() }).await;
        assert!(observed);
    }
}
