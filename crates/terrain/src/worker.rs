//! Background tessellation workers.
//!
//! Meshing is offloaded to a fixed set of OS threads fed by a bounded queue.
//! Admission is capped process-wide: once `max_active_tasks` requests are in
//! flight, further submissions are rejected immediately instead of queueing,
//! and callers retry on a later frame.

use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};

use serde::Deserialize;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::tessellator::{MeshRequest, TessellatedGrid, tessellate};

/// Default cap on in-flight tessellation requests.
pub const DEFAULT_MAX_ACTIVE_TASKS: usize = 5;

/// Outcome of [`MeshWorkerPool::try_submit`].
#[derive(Debug)]
pub enum Submission {
    /// The request was queued; the handle resolves to its result.
    Accepted(TaskHandle),
    /// The pool is saturated and the request was dropped.
    Rejected,
}

/// A pool that tessellates heightmaps off the calling thread.
pub trait MeshWorkerPool: Send + Sync {
    /// Queue `request` without blocking, or reject it if the pool is at
    /// capacity.
    fn try_submit(&self, request: MeshRequest) -> Submission;

    /// Number of accepted requests that have not finished.
    fn active_tasks(&self) -> usize;

    /// Maximum number of requests in flight at once.
    fn max_active_tasks(&self) -> usize;
}

#[derive(Debug)]
enum Pending {
    Ready(Option<TessellatedGrid>),
    Waiting(oneshot::Receiver<TessellatedGrid>),
}

/// Future resolving to the result of an accepted request.
#[derive(Debug)]
pub struct TaskHandle {
    pending: Pending,
}

impl TaskHandle {
    /// A handle waiting on a worker's reply.
    #[must_use]
    pub fn new(receiver: oneshot::Receiver<TessellatedGrid>) -> Self {
        Self {
            pending: Pending::Waiting(receiver),
        }
    }

    /// A handle that is already complete, for pools that run inline.
    #[must_use]
    pub fn ready(grid: TessellatedGrid) -> Self {
        Self {
            pending: Pending::Ready(Some(grid)),
        }
    }
}

impl Future for TaskHandle {
    type Output = Result<TessellatedGrid>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().pending {
            Pending::Ready(grid) => Poll::Ready(grid.take().ok_or_else(|| Error::Worker {
                message: "task handle polled after completion".to_string(),
            })),
            Pending::Waiting(receiver) => Pin::new(receiver).poll(cx).map_err(Error::from),
        }
    }
}

/// Counts in-flight requests against a fixed limit.
#[derive(Debug)]
pub struct AdmissionCounter {
    active: AtomicUsize,
    limit: usize,
}

impl AdmissionCounter {
    #[must_use]
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            limit,
        })
    }

    /// Reserve a slot, or return `None` if every slot is taken.
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>) -> Option<AdmissionPermit> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < self.limit).then_some(active + 1)
            })
            .ok()
            .map(|_| AdmissionPermit {
                counter: Arc::clone(self),
            })
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A reserved slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    counter: Arc<AdmissionCounter>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Configuration for [`WorkerPool`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Cap on in-flight requests across all tiles.
    pub max_active_tasks: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        // Leave one core for the thread driving the tiles.
        let parallelism = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            workers: parallelism.saturating_sub(1).max(1),
            max_active_tasks: DEFAULT_MAX_ACTIVE_TASKS,
        }
    }
}

struct Job {
    request: MeshRequest,
    reply: oneshot::Sender<TessellatedGrid>,
    permit: AdmissionPermit,
}

/// Thread-backed [`MeshWorkerPool`].
pub struct WorkerPool {
    admission: Arc<AdmissionCounter>,
    jobs: async_channel::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn new(config: &WorkerPoolConfig) -> Result<Self> {
        let admission = AdmissionCounter::new(config.max_active_tasks);
        // Every queued job holds a permit, so the queue never fills first.
        let (jobs, queue) = async_channel::bounded(config.max_active_tasks.max(1));

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers.max(1) {
            let queue = queue.clone();
            let worker = thread::Builder::new()
                .name(format!("mesh-worker-{index}"))
                .spawn(move || run_worker(&queue))
                .map_err(|e| Error::Worker {
                    message: format!("failed to spawn mesh worker {index}: {e}"),
                })?;
            workers.push(worker);
        }

        tracing::debug!(
            workers = workers.len(),
            max_active_tasks = config.max_active_tasks,
            "Started mesh worker pool"
        );

        Ok(Self {
            admission,
            jobs,
            workers,
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("admission", &self.admission)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

fn run_worker(queue: &async_channel::Receiver<Job>) {
    while let Ok(job) = queue.recv_blocking() {
        let Job {
            request,
            reply,
            permit,
        } = job;

        let grid = panic::catch_unwind(AssertUnwindSafe(|| tessellate(&request)));
        drop(permit);

        match grid {
            Ok(grid) => {
                if reply.send(grid).is_err() {
                    tracing::trace!("Mesh request was abandoned before completion");
                }
            }
            Err(_) => {
                tracing::warn!(
                    width = request.width,
                    height = request.height,
                    "Tessellation panicked; dropping request"
                );
            }
        }
    }
}

impl MeshWorkerPool for WorkerPool {
    fn try_submit(&self, request: MeshRequest) -> Submission {
        let Some(permit) = self.admission.try_acquire() else {
            return Submission::Rejected;
        };

        let (reply, receiver) = oneshot::channel();
        let job = Job {
            request,
            reply,
            permit,
        };
        match self.jobs.try_send(job) {
            Ok(()) => Submission::Accepted(TaskHandle::new(receiver)),
            Err(e) => {
                tracing::warn!(error = %e, "Mesh queue refused an admitted request");
                Submission::Rejected
            }
        }
    }

    fn active_tasks(&self) -> usize {
        self.admission.active()
    }

    fn max_active_tasks(&self) -> usize {
        self.admission.limit()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.jobs.close();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("Mesh worker exited abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use terrain_decode::HeightBuffer;

    use super::*;
    use crate::ellipsoid::Ellipsoid;
    use crate::heightmap::HeightmapStructure;
    use crate::tiling::{GeographicTilingScheme, TilingScheme, TilingSchemeKind};

    fn request() -> MeshRequest {
        let scheme = GeographicTilingScheme::default();
        let rectangle = scheme.tile_xy_to_rectangle(0, 0, 1);
        let ellipsoid = Ellipsoid::WGS84;
        MeshRequest {
            heights: Arc::new(HeightBuffer::from(vec![10.0f32; 9])),
            structure: Arc::new(HeightmapStructure::default()),
            width: 3,
            height: 3,
            native_rectangle: scheme.tile_xy_to_native_rectangle(0, 0, 1),
            rectangle,
            relative_to_center: ellipsoid.cartographic_to_cartesian(rectangle.center()),
            ellipsoid,
            skirt_height: 0.0,
            tiling_scheme_kind: TilingSchemeKind::Geographic,
        }
    }

    #[test]
    fn test_admission_counter_limits_and_releases() {
        let counter = AdmissionCounter::new(2);
        let first = counter.try_acquire().unwrap();
        let second = counter.try_acquire().unwrap();
        assert!(counter.try_acquire().is_none());
        assert_eq!(counter.active(), 2);

        drop(first);
        assert_eq!(counter.active(), 1);
        let third = counter.try_acquire().unwrap();
        drop(second);
        drop(third);
        assert_eq!(counter.active(), 0);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let pool = WorkerPool::new(&WorkerPoolConfig {
            workers: 1,
            max_active_tasks: 0,
        })
        .unwrap();
        assert!(matches!(pool.try_submit(request()), Submission::Rejected));
        assert_eq!(pool.active_tasks(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submitted_request_completes() {
        let pool = WorkerPool::new(&WorkerPoolConfig {
            workers: 2,
            max_active_tasks: 3,
        })
        .unwrap();
        assert_eq!(pool.max_active_tasks(), 3);

        let Submission::Accepted(handle) = pool.try_submit(request()) else {
            panic!("expected the request to be accepted");
        };
        let grid = handle.await.unwrap();
        assert_eq!((grid.grid_width, grid.grid_height), (3, 3));
        assert!((grid.maximum_height - 10.0).abs() < 1e-9);
        assert_eq!(pool.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_ready_handle_resolves_immediately() {
        let grid = TessellatedGrid {
            vertices: Vec::new(),
            grid_width: 0,
            grid_height: 0,
            minimum_height: 0.0,
            maximum_height: 0.0,
            bounding_sphere: crate::geo::BoundingSphere {
                center: DVec3::ZERO,
                radius: 0.0,
            },
            occludee_point_in_scaled_space: None,
        };
        let result = TaskHandle::ready(grid).await.unwrap();
        assert!(result.vertices.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_sender_is_a_worker_error() {
        let (sender, receiver) = oneshot::channel();
        drop(sender);
        let result = TaskHandle::new(receiver).await;
        assert!(matches!(result, Err(Error::Worker { .. })));
    }

    #[test]
    fn test_config_defaults() {
        let config = WorkerPoolConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.max_active_tasks, DEFAULT_MAX_ACTIVE_TASKS);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: WorkerPoolConfig = serde_json::from_str(r#"{"max_active_tasks": 8}"#).unwrap();
        assert_eq!(config.max_active_tasks, 8);
        assert_eq!(config.workers, WorkerPoolConfig::default().workers);
    }
}
