use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use pollbind_model::{identical_with_limit, StateTree};

use crate::binding::Binding;
use crate::diagnostics::{PassFailure, PassReport};
use crate::error::BindError;
use crate::render;
use crate::Engine;

/// Phase of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the period to elapse.
    Idle,
    /// A pass is walking the registry.
    Scanning,
    /// No further passes will run.
    Stopped,
}

/// Cloneable stop switch for a [`PollScheduler`]; may be tripped from a
/// render callback or from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run one poll pass over every binding in registration order:
///   orphaned -> prune, unbound -> skip, otherwise resolve -> compare -> refresh + render
///
/// The pass walks a copy of the registry index, so bindings removed or added
/// meanwhile are skipped or left for the next pass. With
/// `isolate_render_failures` set, a failing binding is recorded in the report
/// and the pass moves on; otherwise the first failure ends the pass.
pub fn run_pass(engine: &mut Engine) -> Result<PassReport, BindError> {
    engine.epoch = engine.epoch.wrapping_add(1);
    let mut report = PassReport::new(engine.epoch);
    let max_depth = engine.config.max_depth;
    let isolate = engine.config.isolate_render_failures;

    for target in engine.registry.targets() {
        let Some(binding) = engine.registry.get_mut(target.as_str()) else {
            continue;
        };
        if binding.is_orphaned() {
            engine.registry.remove(target.as_str());
            debug!("poll: pruned orphaned target={}", target);
            report.pruned.push(target);
            continue;
        }
        if !binding.bound {
            report.skipped += 1;
            continue;
        }

        report.checked += 1;
        match refresh_if_changed(&engine.tree, binding, max_depth) {
            Ok(true) => report.rendered.push(target),
            Ok(false) => {}
            Err(error) if isolate => {
                warn!("poll: target={} failed: {}", target, error);
                report.failures.push(PassFailure { target, error });
            }
            Err(error) => return Err(error),
        }
    }

    trace!(
        "poll: epoch={} checked={} rendered={} pruned={} failures={}",
        report.epoch,
        report.checked,
        report.rendered.len(),
        report.pruned.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Compare the live value at the binding's path with its snapshot; on a
/// difference, take a new snapshot, adopt the live value and render.
fn refresh_if_changed(
    tree: &StateTree,
    binding: &mut Binding,
    max_depth: usize,
) -> Result<bool, BindError> {
    let live = tree.resolve(&binding.path)?;
    if identical_with_limit(&live, binding.snapshot.as_value(), max_depth)? {
        return Ok(false);
    }
    binding.refresh(live, max_depth)?;
    render::invoke(binding)?;
    Ok(true)
}

/// Fixed-period driver for [`run_pass`].
///
/// The next pass is armed only after the current one has finished, so passes
/// never overlap. Hosts with their own loop call [`PollScheduler::advance`];
/// [`PollScheduler::run_until_stopped`] sleeps on the current thread instead.
#[derive(Debug)]
pub struct PollScheduler {
    period: Duration,
    until_next: Duration,
    state: SchedulerState,
    passes: u64,
    stop: StopHandle,
}

impl PollScheduler {
    /// Scheduler with a fixed `period`. A zero period is refused.
    pub fn new(period: Duration) -> Result<Self, BindError> {
        if period.is_zero() {
            return Err(BindError::config("poll period must be non-zero"));
        }
        Ok(Self::armed(period))
    }

    fn armed(period: Duration) -> Self {
        Self {
            period,
            until_next: period,
            state: SchedulerState::Idle,
            passes: 0,
            stop: StopHandle::new(),
        }
    }

    /// Scheduler using the engine's configured poll period.
    pub fn for_engine(engine: &Engine) -> Self {
        // engine configs are validated, so the period is non-zero
        Self::armed(engine.config().poll_period())
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> SchedulerState {
        if self.stop.is_stopped() {
            SchedulerState::Stopped
        } else {
            self.state
        }
    }

    /// Passes completed (successfully or not) since creation.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Time left before the next pass is due.
    pub fn until_next(&self) -> Duration {
        self.until_next
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&mut self) {
        self.stop.stop();
        self.state = SchedulerState::Stopped;
    }

    /// Let `dt` elapse. Runs one pass if the period is up; several missed
    /// periods still produce a single pass.
    pub fn advance(
        &mut self,
        engine: &mut Engine,
        dt: Duration,
    ) -> Result<Option<PassReport>, BindError> {
        if self.state() == SchedulerState::Stopped {
            return Ok(None);
        }
        if dt < self.until_next {
            self.until_next -= dt;
            return Ok(None);
        }
        self.pass(engine).map(Some)
    }

    /// Sleep, pass, re-arm, until the stop handle is tripped. Returns the
    /// number of passes run, or the first error a pass returned.
    pub fn run_until_stopped(&mut self, engine: &mut Engine) -> Result<u64, BindError> {
        let mut ran = 0;
        while self.state() != SchedulerState::Stopped {
            std::thread::sleep(self.until_next);
            if self.state() == SchedulerState::Stopped {
                break;
            }
            self.pass(engine)?;
            ran += 1;
        }
        self.state = SchedulerState::Stopped;
        debug!("scheduler: stopped after {} passes", ran);
        Ok(ran)
    }

    fn pass(&mut self, engine: &mut Engine) -> Result<PassReport, BindError> {
        self.state = SchedulerState::Scanning;
        let result = run_pass(engine);
        self.state = SchedulerState::Idle;
        self.passes += 1;
        self.until_next = self.period;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::target::{RenderTarget, TargetId};
    use pollbind_model::Value;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Pane {
        id: &'static str,
        writes: RefCell<Vec<String>>,
        attached: Cell<bool>,
    }

    impl Pane {
        fn new(id: &'static str) -> Rc<Self> {
            Rc::new(Self {
                id,
                writes: RefCell::new(Vec::new()),
                attached: Cell::new(true),
            })
        }

        fn count(&self) -> usize {
            self.writes.borrow().len()
        }
    }

    impl RenderTarget for Pane {
        fn target_id(&self) -> TargetId {
            self.id.into()
        }

        fn is_attached(&self) -> bool {
            self.attached.get()
        }

        fn write(&self, markup: &str) -> anyhow::Result<()> {
            self.writes.borrow_mut().push(markup.to_string());
            Ok(())
        }
    }

    fn engine() -> Engine {
        let cfg = EngineConfig::default().with_poll_period(Duration::from_millis(10));
        Engine::with_config(StateTree::new(), cfg).unwrap()
    }

    #[test]
    fn advance_waits_for_the_full_period() {
        let mut engine = engine();
        let pane = Pane::new("p");
        engine
            .register("counter", &pane, |v| Ok(v.to_string()))
            .unwrap();
        engine.tree().set("counter", 1).unwrap();

        let mut sched = PollScheduler::for_engine(&engine);
        assert!(sched.advance(&mut engine, Duration::from_millis(4)).unwrap().is_none());
        assert!(sched.advance(&mut engine, Duration::from_millis(4)).unwrap().is_none());
        let report = sched
            .advance(&mut engine, Duration::from_millis(4))
            .unwrap()
            .expect("pass due");
        assert!(report.was_rendered("p"));
        assert_eq!(sched.passes(), 1);
        assert_eq!(sched.until_next(), Duration::from_millis(10));
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(pane.count(), 2);
    }

    #[test]
    fn zero_period_is_refused() {
        assert!(matches!(
            PollScheduler::new(Duration::ZERO),
            Err(BindError::Config { .. })
        ));
        let sched = PollScheduler::new(Duration::from_millis(3)).unwrap();
        assert_eq!(sched.until_next(), Duration::from_millis(3));
    }

    #[test]
    fn missed_periods_coalesce_into_one_pass() {
        let mut engine = engine();
        let mut sched = PollScheduler::for_engine(&engine);
        let report = sched
            .advance(&mut engine, Duration::from_millis(100))
            .unwrap();
        assert!(report.is_some());
        assert_eq!(sched.passes(), 1);
        assert_eq!(engine.epoch(), 1);
    }

    #[test]
    fn stopped_scheduler_runs_nothing() {
        let mut engine = engine();
        let mut sched = PollScheduler::for_engine(&engine);
        sched.stop_handle().stop();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert!(sched
            .advance(&mut engine, Duration::from_secs(1))
            .unwrap()
            .is_none());
        assert_eq!(sched.run_until_stopped(&mut engine).unwrap(), 0);
        assert_eq!(engine.epoch(), 0);
    }

    #[test]
    fn pass_prunes_detached_targets() {
        let mut engine = engine();
        let kept = Pane::new("kept");
        let gone = Pane::new("gone");
        engine.register("a", &kept, |_| Ok("a".into())).unwrap();
        engine.register("b", &gone, |_| Ok("b".into())).unwrap();
        gone.attached.set(false);

        let report = run_pass(&mut engine).unwrap();
        assert!(report.was_pruned("gone"));
        assert_eq!(engine.registry().targets(), vec![TargetId::from("kept")]);
        assert!(matches!(
            engine.is_bound("gone"),
            Err(BindError::BindingNotFound(_))
        ));
    }

    #[test]
    fn pass_prunes_dropped_targets() {
        let mut engine = engine();
        let pane = Pane::new("temp");
        engine.register("a", &pane, |_| Ok(String::new())).unwrap();
        drop(pane);

        let report = run_pass(&mut engine).unwrap();
        assert!(report.was_pruned("temp"));
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn isolated_failure_does_not_starve_later_bindings() {
        let mut engine = engine();
        let bad = Pane::new("bad");
        let good = Pane::new("good");
        engine
            .register("shared", &bad, |v| {
                if v.get("boom").is_some() {
                    anyhow::bail!("cannot render boom");
                }
                Ok(String::new())
            })
            .unwrap();
        engine.register("shared", &good, |_| Ok("ok".into())).unwrap();
        engine.tree().set("shared.boom", true).unwrap();

        let report = run_pass(&mut engine).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target.as_str(), "bad");
        assert!(report.was_rendered("good"));
        assert_eq!(good.count(), 2);
    }

    #[test]
    fn unisolated_failure_ends_the_pass() {
        let cfg = EngineConfig::default().with_isolated_failures(false);
        let mut engine = Engine::with_config(StateTree::new(), cfg).unwrap();
        let bad = Pane::new("bad");
        let good = Pane::new("good");
        engine
            .register("m", &bad, |v| match v {
                Value::Undefined => Ok(String::new()),
                _ => anyhow::bail!("only undefined renders"),
            })
            .unwrap();
        engine.register("m", &good, |_| Ok(String::new())).unwrap();
        engine.tree().set("m", "changed").unwrap();

        let mut sched = PollScheduler::for_engine(&engine);
        let err = sched
            .advance(&mut engine, sched.period())
            .unwrap_err();
        assert!(matches!(err, BindError::Render { .. }));
        assert_eq!(good.count(), 1);
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(sched.until_next(), sched.period());
    }

    #[test]
    fn run_until_stopped_exits_when_a_render_trips_the_handle() {
        let cfg = EngineConfig::default().with_poll_period(Duration::from_millis(1));
        let mut engine = Engine::with_config(StateTree::new(), cfg).unwrap();
        let mut sched = PollScheduler::for_engine(&engine);
        let stop = sched.stop_handle();
        let tree = engine.tree().clone();
        let pane = Pane::new("ticker");

        // each render bumps the model, so every pass finds a change
        engine
            .register("ticks", &pane, move |v| {
                let n = v.as_f64().unwrap_or(0.0);
                if n >= 3.0 {
                    stop.stop();
                } else {
                    tree.set("ticks", n + 1.0)?;
                }
                Ok(n.to_string())
            })
            .unwrap();

        let passes = sched.run_until_stopped(&mut engine).unwrap();
        assert_eq!(passes, 3);
        assert_eq!(pane.count(), 4);
        assert_eq!(sched.state(), SchedulerState::Stopped);
    }
}
