//! 轮询调度：定时触发一次四路并发拉取，全部落定后交给下游渲染。
//!
//! 单个调度循环内串行执行 tick，慢请求不会让两个周期重叠。修改间隔会立即
//! 重新计时；已经发出的请求不会被取消，它的结果仍按到达顺序生效。
//! 间隔同步请求与 tick 相互独立，挂起的同步不会拖住轮询。

use std::future::Future;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info, warn};

use crate::api::ClientResult;
use crate::models::{BackendSummary, ErrorRecord, StatusSnapshot, TaskTreeNode};

/// 调度器依赖的后端接口。
#[allow(async_fn_in_trait)]
pub trait PipelineBackend {
    async fn fetch_status(&self) -> ClientResult<StatusSnapshot>;
    async fn fetch_structure(&self) -> ClientResult<Vec<TaskTreeNode>>;
    async fn fetch_errors(&self) -> ClientResult<Vec<ErrorRecord>>;
    async fn fetch_summary(&self) -> ClientResult<BackendSummary>;
    async fn push_interval(&self, interval_ms: u32) -> ClientResult<()>;
}

impl<B: PipelineBackend + ?Sized> PipelineBackend for &B {
    async fn fetch_status(&self) -> ClientResult<StatusSnapshot> {
        (**self).fetch_status().await
    }

    async fn fetch_structure(&self) -> ClientResult<Vec<TaskTreeNode>> {
        (**self).fetch_structure().await
    }

    async fn fetch_errors(&self) -> ClientResult<Vec<ErrorRecord>> {
        (**self).fetch_errors().await
    }

    async fn fetch_summary(&self) -> ClientResult<BackendSummary> {
        (**self).fetch_summary().await
    }

    async fn push_interval(&self, interval_ms: u32) -> ClientResult<()> {
        (**self).push_interval(interval_ms).await
    }
}

pub trait Timer {
    fn sleep(&self, ms: u32) -> impl Future<Output = ()>;
}

/// 浏览器定时器。
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, ms: u32) -> impl Future<Output = ()> {
        gloo_timers::future::TimeoutFuture::new(ms)
    }
}

/// 一次 tick 的结果；`None` 表示该资源拉取失败，下游保留旧值。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub status: Option<StatusSnapshot>,
    pub structure: Option<Vec<TaskTreeNode>>,
    pub errors: Option<Vec<ErrorRecord>>,
    pub summary: Option<BackendSummary>,
}

impl TickOutcome {
    pub fn failures(&self) -> usize {
        [
            self.status.is_none(),
            self.structure.is_none(),
            self.errors.is_none(),
            self.summary.is_none(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

pub async fn tick<B: PipelineBackend>(backend: &B) -> TickOutcome {
    let (status, structure, errors, summary) = futures::join!(
        backend.fetch_status(),
        backend.fetch_structure(),
        backend.fetch_errors(),
        backend.fetch_summary(),
    );

    let outcome = TickOutcome {
        status: settle("status", status),
        structure: settle("structure", structure),
        errors: settle("errors", errors),
        summary: settle("summary", summary),
    };
    debug!(failures = outcome.failures(), "poll tick settled");
    outcome
}

fn settle<T>(resource: &'static str, result: ClientResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(resource, %err, "fetch failed, keeping previous value");
            None
        }
    }
}

async fn sync_interval<B: PipelineBackend>(backend: &B, interval_ms: u32) {
    if let Err(err) = backend.push_interval(interval_ms).await {
        warn!(interval_ms, %err, "failed to push refresh interval");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerCommand {
    SetInterval(u32),
    Pause,
    Resume,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Reschedule,
    Wait,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerState {
    pub interval_ms: u32,
    pub paused: bool,
}

impl SchedulerState {
    fn apply(&mut self, command: SchedulerCommand) -> Control {
        match command {
            SchedulerCommand::SetInterval(ms) => {
                self.interval_ms = ms.max(1);
                Control::Reschedule
            }
            SchedulerCommand::Pause => {
                self.paused = true;
                Control::Wait
            }
            SchedulerCommand::Resume => {
                let was_paused = self.paused;
                self.paused = false;
                if was_paused {
                    Control::Reschedule
                } else {
                    Control::Wait
                }
            }
            SchedulerCommand::Stop => Control::Exit,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    commands: UnboundedSender<SchedulerCommand>,
}

impl SchedulerHandle {
    pub fn set_interval(&self, ms: u32) {
        self.send(SchedulerCommand::SetInterval(ms));
    }

    pub fn pause(&self) {
        self.send(SchedulerCommand::Pause);
    }

    pub fn resume(&self) {
        self.send(SchedulerCommand::Resume);
    }

    pub fn stop(&self) {
        self.send(SchedulerCommand::Stop);
    }

    fn send(&self, command: SchedulerCommand) {
        if self.commands.unbounded_send(command).is_err() {
            warn!(?command, "poll scheduler is no longer running");
        }
    }
}

pub struct PollScheduler {
    state: SchedulerState,
    commands: UnboundedReceiver<SchedulerCommand>,
}

impl PollScheduler {
    pub fn new(interval_ms: u32) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::unbounded();
        let scheduler = Self {
            state: SchedulerState {
                interval_ms: interval_ms.max(1),
                paused: false,
            },
            commands: rx,
        };
        (scheduler, SchedulerHandle { commands: tx })
    }

    /// 启动后立即执行一次 tick，然后按间隔循环，直到收到 `Stop` 或句柄全部释放。
    pub async fn run<B, T, F>(mut self, backend: B, timer: T, mut on_tick: F)
    where
        B: PipelineBackend,
        T: Timer,
        F: FnMut(TickOutcome),
    {
        info!(interval_ms = self.state.interval_ms, "poll scheduler started");
        let mut pushes = FuturesUnordered::new();
        pushes.push(sync_interval(&backend, self.state.interval_ms));
        on_tick(tick(&backend).await);

        'schedule: loop {
            let sleep = timer.sleep(self.state.interval_ms).fuse();
            futures::pin_mut!(sleep);

            loop {
                // 控制命令优先于到期的定时器
                futures::select_biased! {
                    () = pushes.select_next_some() => {}
                    command = self.commands.next() => {
                        let Some(command) = command else {
                            break 'schedule;
                        };
                        match self.state.apply(command) {
                            Control::Reschedule => {
                                if let SchedulerCommand::SetInterval(_) = command {
                                    pushes.push(sync_interval(&backend, self.state.interval_ms));
                                }
                                continue 'schedule;
                            }
                            Control::Wait => {}
                            Control::Exit => break 'schedule,
                        }
                    }
                    _ = sleep => break,
                }
            }

            if self.state.paused {
                continue;
            }
            on_tick(tick(&backend).await);
        }

        info!("poll scheduler stopped");
    }
}
