//! Real-Time Runtime
//!
//! Drives the tracker on wall-clock time with a single-threaded `smol`
//! executor. Timers, scripted user actions and the tracker all live on one
//! thread; everything that happens is funneled through one channel and
//! handled one event at a time.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use dwell_engine::{
    Clock, MonotonicClock, PageEvent, ReportSink, TimerFacility, TimerHandle, TrackerConfig,
    ViewabilityTracker,
};
use smol::channel::{Receiver, Sender};
use smol::stream::StreamExt;
use smol::{LocalExecutor, Task, Timer};

use crate::page::Page;
use crate::session::{SessionScript, SessionSummary, Step};
use crate::SessionError;

/// Event on the host's single queue
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Page(PageEvent),
    Scroll(f32),
    Finished,
}

/// Interval timers backed by executor tasks.
///
/// Clearing a timer drops its task, which cancels it. A firing already
/// queued before the cancel still arrives and is discarded by the tracker.
pub struct SmolTimers {
    executor: Rc<LocalExecutor<'static>>,
    events: Sender<HostEvent>,
    tasks: HashMap<TimerHandle, Task<()>>,
    next_id: u32,
}

impl SmolTimers {
    pub fn new(executor: Rc<LocalExecutor<'static>>, events: Sender<HostEvent>) -> Self {
        Self {
            executor,
            events,
            tasks: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn live_timers(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerFacility for SmolTimers {
    fn set_interval(&mut self, period: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let events = self.events.clone();
        let task = self.executor.spawn(async move {
            let mut ticks = Timer::interval(period);
            while ticks.next().await.is_some() {
                if events.send(HostEvent::Page(PageEvent::TimerFired(handle))).await.is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn clear_interval(&mut self, handle: TimerHandle) {
        self.tasks.remove(&handle);
    }
}

/// Play the script's steps in wall-clock time
async fn play(steps: Vec<Step>, events: Sender<HostEvent>) {
    for step in steps {
        let event = match step {
            Step::Scroll { y } => HostEvent::Scroll(y),
            Step::Hide => HostEvent::Page(PageEvent::VisibilityChange { hidden: true }),
            Step::Show => HostEvent::Page(PageEvent::VisibilityChange { hidden: false }),
            Step::Wait { ms } => {
                Timer::after(Duration::from_millis(ms)).await;
                continue;
            }
        };
        if events.send(event).await.is_err() {
            return;
        }
    }
    let _ = events.send(HostEvent::Finished).await;
}

/// Replay `script` in real time
pub fn run_realtime(
    script: &SessionScript,
    config: TrackerConfig,
    sink: impl ReportSink + 'static,
) -> Result<SessionSummary, SessionError> {
    let executor = Rc::new(LocalExecutor::new());
    let (events, queue): (Sender<HostEvent>, Receiver<HostEvent>) = smol::channel::unbounded();

    let mut page = Page::new(script.page.clone(), config.observer_options())?;
    let timers = SmolTimers::new(executor.clone(), events.clone());
    let mut tracker = ViewabilityTracker::new(
        page.campaign_ids().cloned(),
        MonotonicClock::new(),
        timers,
        config,
    )?
    .with_sink(sink);

    let steps = script.steps.clone();
    smol::block_on(executor.run(async {
        let _player = executor.spawn(play(steps, events));

        let entries = page.observe(tracker.clock().now());
        tracker.dispatch(PageEvent::Intersection(entries));

        while let Ok(event) = queue.recv().await {
            match event {
                HostEvent::Page(event) => tracker.dispatch(event),
                HostEvent::Scroll(y) => {
                    page.scroll_to(y);
                    let entries = page.observe(tracker.clock().now());
                    tracker.dispatch(PageEvent::Intersection(entries));
                }
                HostEvent::Finished => break,
            }
        }
    }));

    log::debug!("{} timers live at end of session", tracker.timers().live_timers());
    Ok(SessionSummary::collect(&mut tracker))
}
