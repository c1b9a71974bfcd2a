//! Paged enumeration of registered workers
//!
//! The unserved-pool set must be computed from the complete worker list: a
//! partial list would make served pools look unserved and trigger duplicate
//! deployments. A page stream therefore fails instead of ending early when the
//! registry stops returning workers before the advertised count is reached.

use futures_util::stream::{self, Stream, TryStreamExt};
use shared::Worker;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::RegistryClient;

/// Default number of workers requested per page
pub const DEFAULT_WORKER_PAGE_SIZE: u32 = 100;

enum PageCursor {
    Start,
    At { offset: u32, total: u32 },
}

/// Restartable, lazily fetched sequence of worker pages
#[derive(Debug, Clone, Copy)]
pub struct WorkerPager {
    page_size: u32,
}

impl WorkerPager {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Stream of worker pages; each call starts a fresh enumeration
    pub fn pages<'a, R>(&self, registry: &'a R) -> impl Stream<Item = OrchestratorResult<Vec<Worker>>> + 'a
    where
        R: RegistryClient + ?Sized,
    {
        let page_size = self.page_size;
        stream::try_unfold(PageCursor::Start, move |cursor| async move {
            let (offset, total) = match cursor {
                PageCursor::Start => (0, registry.worker_len().await?),
                PageCursor::At { offset, total } => (offset, total),
            };

            if offset >= total {
                return Ok(None);
            }

            let page = registry.list_workers(offset, page_size).await?;
            if page.is_empty() {
                return Err(OrchestratorError::IncompleteEnumeration {
                    expected: total,
                    received: offset,
                });
            }

            let next = offset.saturating_add(page.len() as u32);
            Ok::<_, OrchestratorError>(Some((page, PageCursor::At { offset: next, total })))
        })
    }

    /// Enumerate every registered worker
    pub async fn collect_all<R>(&self, registry: &R) -> OrchestratorResult<Vec<Worker>>
    where
        R: RegistryClient + ?Sized,
    {
        self.pages(registry).try_concat().await
    }
}

impl Default for WorkerPager {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_PAGE_SIZE)
    }
}
