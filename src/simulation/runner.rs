//! Drives a layout on the tokio runtime at a fixed frame rate
//!
//! Each `start` bumps the run epoch and aborts the previous task. The
//! epoch check and the publish happen under one lock, so a frame from a
//! replaced run can never reach subscribers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::types::Vec2;
use crate::simulation::forces::ForceConfig;
use crate::simulation::layout::{GraphLayout, LayoutFrame, LayoutSeed, Simulation};
use crate::snapshot::model::RelationshipGraph;

/// A frame tagged with the run it belongs to
#[derive(Debug, Clone)]
pub struct PublishedFrame {
    pub epoch: u64,
    pub layout: Arc<GraphLayout>,
    pub frame: LayoutFrame,
    /// No further frames follow for this epoch
    pub finished: bool,
}

impl PublishedFrame {
    pub fn edge_segments(&self) -> Vec<(Vec2, Vec2)> {
        self.layout.edge_segments(&self.frame)
    }
}

type FrameSlot = Option<Arc<PublishedFrame>>;

struct RunnerInner {
    config: ForceConfig,
    frame_interval: Duration,
    epoch: Mutex<u64>,
    frame_tx: watch::Sender<FrameSlot>,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct LayoutRunner {
    inner: Arc<RunnerInner>,
}

impl LayoutRunner {
    pub fn new(config: ForceConfig, frame_interval: Duration) -> Self {
        let (frame_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(RunnerInner {
                config,
                frame_interval,
                epoch: Mutex::new(0),
                frame_tx,
                task: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameSlot> {
        self.inner.frame_tx.subscribe()
    }

    /// Most recently published frame
    pub fn latest(&self) -> FrameSlot {
        self.inner.frame_tx.borrow().clone()
    }

    pub fn current_epoch(&self) -> u64 {
        *self.inner.epoch()
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .task()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Lay out `graph` on a `width` x `height` canvas, replacing any
    /// run in progress. Returns the new epoch.
    pub fn start(&self, graph: &RelationshipGraph, width: f64, height: f64, seed: LayoutSeed) -> u64 {
        let layout = Arc::new(GraphLayout::from_graph(graph));
        let mut simulation = Simulation::new(&layout, self.inner.config, width, height, seed);

        let mut task = self.inner.task();
        if let Some(old) = task.take() {
            old.abort();
        }

        let epoch = {
            let mut current = self.inner.epoch();
            *current += 1;
            let initial = LayoutFrame {
                positions: simulation.state().positions.clone(),
                iteration: 0,
                alpha: simulation.state().alpha,
                max_displacement: simulation.state().max_displacement,
            };
            self.inner.frame_tx.send_replace(Some(Arc::new(PublishedFrame {
                epoch: *current,
                layout: Arc::clone(&layout),
                frame: initial,
                finished: simulation.is_finished(),
            })));
            *current
        };

        tracing::debug!(
            "Layout run {} started: {} nodes, {} links ({} skipped)",
            epoch,
            layout.node_count(),
            layout.edges().len(),
            layout.skipped_links()
        );

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.frame_interval);
            ticker.tick().await;
            while let Some(frame) = simulation.next() {
                ticker.tick().await;
                let published = PublishedFrame {
                    epoch,
                    layout: Arc::clone(&layout),
                    frame,
                    finished: simulation.is_finished(),
                };
                if !inner.publish(published) {
                    return;
                }
            }
        }));

        epoch
    }

    /// Stop the current run; its remaining frames are never published
    pub fn stop(&self) {
        if let Some(handle) = self.inner.task().take() {
            handle.abort();
        }
        *self.inner.epoch() += 1;
    }
}

impl RunnerInner {
    fn epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish if `frame` still belongs to the current run
    fn publish(&self, frame: PublishedFrame) -> bool {
        let current = self.epoch();
        if *current != frame.epoch {
            return false;
        }
        self.frame_tx.send_replace(Some(Arc::new(frame)));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fallback::seed_snapshot;

    fn runner() -> LayoutRunner {
        LayoutRunner::new(ForceConfig::default(), Duration::from_millis(16))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_until_finished() {
        let runner = runner();
        let mut rx = runner.subscribe();
        let epoch = runner.start(&seed_snapshot().relationships, 400.0, 300.0, LayoutSeed::Phyllotaxis);

        loop {
            rx.changed().await.unwrap();
            let frame = rx.borrow_and_update().clone().unwrap();
            assert_eq!(frame.epoch, epoch);
            assert!(frame.frame.positions.iter().all(|p| p.is_finite()));
            if frame.finished {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_old_run() {
        let runner = runner();
        let graph = seed_snapshot().relationships;
        let first = runner.start(&graph, 400.0, 300.0, LayoutSeed::Phyllotaxis);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = runner.start(&graph, 800.0, 600.0, LayoutSeed::Random(3));
        assert!(second > first);

        let mut rx = runner.subscribe();
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(16)).await;
            let latest = rx.borrow_and_update().clone().unwrap();
            assert_eq!(latest.epoch, second);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_publishing() {
        let runner = runner();
        runner.start(&seed_snapshot().relationships, 400.0, 300.0, LayoutSeed::Phyllotaxis);
        tokio::time::sleep(Duration::from_millis(40)).await;
        runner.stop();
        let before = runner.latest().unwrap().frame.iteration;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runner.latest().unwrap().frame.iteration, before);
        assert!(!runner.is_running());
    }
}
