//! A cancellable repeating task: at most one timer alive at a time.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::{TickConfig, TickError, TickInfo, TickScheduler};

/// The currently spawned timer task and the generation it was armed with.
struct Armed {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Owns the single timer task that runs a job on every tick.
///
/// ```text
/// arm() ──→ [armed g=1] ──arm()──→ [armed g=2] ──disarm()──→ [idle]
///              │                      ↑
///              └──(aborted)───────────┘
/// ```
///
/// Dropping a `RepeatingTask` disarms it.
pub struct RepeatingTask {
    config: TickConfig,
    current: Option<Armed>,
    generation: u64,
}

impl RepeatingTask {
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            current: None,
            generation: 0,
        }
    }

    /// Spawns a timer that calls `job` on every tick, replacing any timer
    /// already running. Returns the generation of the new timer.
    ///
    /// The job is awaited before the next tick is scheduled, so a job
    /// never overlaps with itself. With a zero interval nothing is
    /// spawned and the task stays idle.
    ///
    /// # Errors
    /// [`TickError::NoRuntime`] when called outside a Tokio runtime. Any
    /// previous timer has already been disarmed at that point.
    pub fn arm<F, Fut>(&mut self, mut job: F) -> Result<u64, TickError>
    where
        F: FnMut(TickInfo) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disarm();

        let runtime = crate::ensure_runtime()?;
        self.generation += 1;
        let generation = self.generation;

        if self.config.tick_duration().is_none() {
            debug!(generation, "ticking disabled, timer not spawned");
            return Ok(generation);
        }

        let config = self.config.clone();
        let handle = runtime.spawn(async move {
            let mut scheduler = TickScheduler::new(config);
            loop {
                let info = scheduler.wait_for_tick().await;
                job(info).await;
                scheduler.record_tick_end();
            }
        });

        self.current = Some(Armed { generation, handle });
        debug!(generation, "repeating task armed");
        Ok(generation)
    }

    /// Cancels the running timer, if any. Returns whether one was running.
    ///
    /// Calling this from inside the job itself is allowed: the abort
    /// takes effect at the job's next `.await`.
    pub fn disarm(&mut self) -> bool {
        match self.current.take() {
            Some(armed) => {
                armed.handle.abort();
                debug!(generation = armed.generation, "repeating task disarmed");
                true
            }
            None => false,
        }
    }

    /// Whether a timer task is currently alive.
    pub fn is_armed(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|armed| !armed.handle.is_finished())
    }

    /// Generation of the most recent `arm` call (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.disarm();
    }
}
