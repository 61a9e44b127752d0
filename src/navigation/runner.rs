//! Periodic control loop driving a `NavigationController` on a tokio task

use super::controller::{NavigationController, NavigationStatus};
use crate::common::types::Point2D;
use crate::control::MotorCommand;
use crate::robot::RobotInterface;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Owns one robot and one controller and ticks them at a fixed period.
///
/// Cancellation is cooperative: `stop` clears the active flag, which the
/// loop polls at the top of every tick before stopping the motors and exiting.
pub struct NavigationRunner<B, R = StdRng> {
    controller: Arc<Mutex<NavigationController<R>>>,
    robot: Arc<Mutex<B>>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl<B, R> NavigationRunner<B, R>
where
    B: RobotInterface + 'static,
    R: Rng + Send + 'static,
{
    /// Wrap a controller and its robot; nothing runs until [`start`](Self::start)
    pub fn new(controller: NavigationController<R>, robot: B) -> Self {
        NavigationRunner {
            controller: Arc::new(Mutex::new(controller)),
            robot: Arc::new(Mutex::new(robot)),
            active: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Set a new goal; takes effect on the next tick
    pub fn set_target(&self, target: Point2D) {
        lock(&self.controller).set_target(target);
    }

    /// Spawn the control loop. Returns false if a loop is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("navigation loop already running");
            return false;
        }

        let period = lock(&self.controller).config().tick_period();
        let controller = Arc::clone(&self.controller);
        let robot = Arc::clone(&self.robot);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        info!(period_ms = period.as_millis() as u64, "starting navigation loop");
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !active.load(Ordering::SeqCst) {
                    let mut robot = lock(&robot);
                    if let Err(err) = robot.set_wheel_speeds(0.0, 0.0) {
                        warn!(error = %err, "failed to stop wheels on cancel");
                    }
                    break;
                }

                let status = {
                    let mut controller = lock(&controller);
                    let mut robot = lock(&robot);
                    controller.tick(&mut *robot);
                    controller.status()
                };
                if !status.is_active() {
                    debug!(?status, "navigation loop finished");
                    active.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }));
        true
    }

    /// Cancel navigation, stop the wheels and wait for the loop to exit
    pub async fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        lock(&self.controller).stop();

        match self.task.take() {
            Some(task) => {
                if let Err(err) = task.await {
                    warn!(error = %err, "navigation loop panicked");
                }
            }
            None => {
                let mut robot = lock(&self.robot);
                if let Err(err) = robot.set_wheel_speeds(0.0, 0.0) {
                    warn!(error = %err, "failed to stop wheels");
                }
            }
        }
    }

    /// Wait until the loop exits on its own (arrival, stop, pose loss)
    pub async fn wait(&mut self) -> NavigationStatus {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "navigation loop panicked");
            }
        }
        self.status()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn status(&self) -> NavigationStatus {
        lock(&self.controller).status()
    }

    pub fn last_distance(&self) -> Option<f64> {
        lock(&self.controller).last_distance()
    }

    /// Run one tick inline, without the timer
    pub fn tick_once(&self) -> Option<MotorCommand> {
        let mut controller = lock(&self.controller);
        let mut robot = lock(&self.robot);
        controller.tick(&mut *robot)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
