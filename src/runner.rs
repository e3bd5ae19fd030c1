//! Runs the engine on its own thread, fed by a command channel and publishing snapshots to a
//! bounded, latest-wins sensor channel.
//!
//! Nothing crosses the thread boundary but owned values: commands in, [`SensorData`] out.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{
    bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    config::{RunnerConfig, SimConfig},
    domain::{Command, SensorData},
    engine::SimEngine,
    error::SimError,
};

/// How many queued commands are consumed per simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPolicy {
    /// Apply every queued command in arrival order, so the newest value of each field wins
    /// within the same step.
    #[default]
    DrainAll,
    /// Apply at most one command per step. A burst of commands takes several steps to drain.
    OnePerTick,
}

/// Sending half of the sensor channel. When the channel is full the oldest snapshot is dropped
/// to make room, so readers always find the most recent data.
pub struct SensorOutbox {
    tx: Sender<SensorData>,
    rx: Receiver<SensorData>,
    dropped: u64,
}

impl SensorOutbox {
    /// Creates the outbox and the receiver readers consume from.
    pub fn new(capacity: usize) -> (Self, Receiver<SensorData>) {
        let (tx, rx) = bounded(capacity.max(1));
        let outbox = Self {
            tx,
            rx: rx.clone(),
            dropped: 0,
        };
        (outbox, rx)
    }

    pub fn publish(&mut self, data: SensorData) {
        let mut data = data;
        loop {
            match self.tx.try_send(data) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if self.rx.try_recv().is_ok() {
                        self.dropped += 1;
                    }
                    data = rejected;
                }
                // The outbox holds a receiver itself, so this only happens while tearing down.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Snapshots discarded because nobody read them in time.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Paces an engine in soft real time and publishes a snapshot whenever the publish period of
/// simulated time has elapsed.
pub struct SimRunner {
    engine: SimEngine,
    outbox: SensorOutbox,
    sim_period: Duration,
    publish_period: f64,
    next_publish: f64,
}

impl SimRunner {
    pub fn new(engine: SimEngine, outbox: SensorOutbox, config: &RunnerConfig) -> Self {
        let next_publish = engine.time();
        Self {
            engine,
            outbox,
            sim_period: config.sim_period(),
            publish_period: config.publish_period(),
            next_publish,
        }
    }

    /// One paced step. Returns whether a snapshot was published.
    pub fn tick(&mut self) -> bool {
        self.engine.step_realtime(self.sim_period);
        if self.engine.time() < self.next_publish {
            return false;
        }
        self.outbox.publish(self.engine.read_all());
        self.next_publish = self.engine.time() + self.publish_period;
        true
    }

    /// Ticks until `stop` is raised and hands the engine back.
    pub fn run(mut self, stop: &AtomicBool) -> SimEngine {
        info!(
            sim_period = ?self.sim_period,
            publish_period = self.publish_period,
            "simulation loop started"
        );
        let mut steps = 0u64;
        while !stop.load(Ordering::Acquire) {
            self.tick();
            steps += 1;
        }
        info!(
            steps,
            time = self.engine.time(),
            dropped = self.outbox.dropped(),
            "simulation loop stopped"
        );
        self.engine
    }

    pub fn engine(&self) -> &SimEngine {
        &self.engine
    }
}

/// Builds an engine fed by `commands` and runs it on the calling thread until `stop` is raised.
pub fn run(
    config: SimConfig,
    commands: Receiver<Command>,
    sensors: SensorOutbox,
    stop: &AtomicBool,
) -> Result<(), SimError> {
    let engine =
        SimEngine::with_command_source(config.clone(), commands, config.runner.command_policy)?;
    SimRunner::new(engine, sensors, &config.runner).run(stop);
    Ok(())
}

/// Owner side of a simulation running on a worker thread.
pub struct SimHandle {
    commands: Sender<Command>,
    sensors: Receiver<SensorData>,
    stop: Arc<AtomicBool>,
    done: Receiver<()>,
    worker: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl SimHandle {
    /// Validates `config`, builds the engine and starts stepping it on a named thread.
    pub fn spawn(config: SimConfig) -> Result<Self, SimError> {
        let (command_tx, command_rx) = unbounded();
        let (outbox, sensors) = SensorOutbox::new(config.runner.sensor_buffer);
        let engine = SimEngine::with_command_source(
            config.clone(),
            command_rx,
            config.runner.command_policy,
        )?;
        let runner = SimRunner::new(engine, outbox, &config.runner);

        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = bounded(1);
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("smartbot-sim".into())
            .spawn(move || {
                runner.run(&worker_stop);
                let _ = done_tx.send(());
            })
            .map_err(SimError::WorkerSpawn)?;

        Ok(Self {
            commands: command_tx,
            sensors,
            stop,
            done,
            worker: Some(worker),
            shutdown_timeout: config.runner.shutdown_timeout(),
        })
    }

    pub fn write(&self, command: Command) -> Result<(), SimError> {
        self.commands
            .send(command)
            .map_err(|_| SimError::WorkerStopped)
    }

    /// Oldest unread snapshot, if any. Never blocks.
    pub fn read(&self) -> Option<SensorData> {
        self.sensors.try_recv().ok()
    }

    /// Drains the channel and returns the newest snapshot, if any.
    pub fn latest(&self) -> Option<SensorData> {
        self.sensors.try_iter().last()
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn read_timeout(&self, timeout: Duration) -> Option<SensorData> {
        self.sensors.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops the worker and waits for it. A worker that does not stop within the configured
    /// timeout is detached and reported.
    pub fn shutdown(mut self) -> Result<(), SimError> {
        self.stop_worker()
    }

    fn stop_worker(&mut self) -> Result<(), SimError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.stop.store(true, Ordering::Release);
        match self.done.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                worker.join().map_err(|_| SimError::WorkerPanicked)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?self.shutdown_timeout, "simulation worker detached");
                Err(SimError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        if let Err(err) = self.stop_worker() {
            warn!(%err, "simulation worker shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tests::quiet_config;

    fn snapshot(time: f64) -> SensorData {
        SensorData {
            time,
            ..Default::default()
        }
    }

    #[test]
    fn test_outbox_keeps_latest() {
        let (mut outbox, rx) = SensorOutbox::new(2);
        for i in 0..5 {
            outbox.publish(snapshot(i as f64));
        }
        let times: Vec<f64> = rx.try_iter().map(|d| d.time).collect();
        assert_eq!(times, vec![3.0, 4.0]);
        assert_eq!(outbox.dropped(), 3);
    }

    #[test]
    fn test_outbox_zero_capacity_still_holds_one() {
        let (mut outbox, rx) = SensorOutbox::new(0);
        outbox.publish(snapshot(1.0));
        outbox.publish(snapshot(2.0));
        assert_eq!(rx.try_recv().map(|d| d.time).ok(), Some(2.0));
    }

    #[test]
    fn test_runner_publishes_at_publish_rate() {
        let mut config = quiet_config();
        config.runner.sim_rate_hz = 1000.0;
        config.runner.publish_rate_hz = 100.0;
        config.runner.sensor_buffer = 64;
        let (outbox, rx) = SensorOutbox::new(config.runner.sensor_buffer);
        let engine = SimEngine::new(config.clone()).unwrap();
        let mut runner = SimRunner::new(engine, outbox, &config.runner);

        let published = (0..25).filter(|_| runner.tick()).count();

        assert_eq!(published, 3);
        let times: Vec<f64> = rx.try_iter().map(|d| d.time).collect();
        assert_eq!(times.len(), 3);
        assert_abs_diff_eq!(times[0], 0.001, epsilon = 1e-9);
        assert!(times.windows(2).all(|w| w[1] - w[0] >= 0.01 - 1e-9));
        assert_abs_diff_eq!(runner.engine().time(), 0.025, epsilon = 1e-9);
    }

    #[test]
    fn test_run_stops_on_flag() {
        let mut config = quiet_config();
        config.runner.sim_rate_hz = 1000.0;
        let (tx, rx) = unbounded();
        let (outbox, sensors) = SensorOutbox::new(4);
        let stop = AtomicBool::new(false);

        thread::scope(|scope| {
            let worker = scope.spawn(|| run(config, rx, outbox, &stop));
            tx.send(Command::gripper(true)).unwrap();
            let data = sensors
                .iter()
                .find(|d| d.gripper_state == "CLOSED")
                .unwrap();
            assert!(data.time > 0.0);
            stop.store(true, Ordering::Release);
            worker.join().unwrap().unwrap();
        });
    }

    #[test]
    fn test_handle_round_trip() {
        let mut config = quiet_config();
        config.runner.sim_rate_hz = 500.0;
        config.runner.publish_rate_hz = 100.0;
        let handle = SimHandle::spawn(config).unwrap();
        assert!(handle.is_running());

        handle.write(Command::velocity(0.5, 0.0)).unwrap();
        let moved = (0..200)
            .filter_map(|_| handle.read_timeout(Duration::from_millis(50)))
            .find(|d| d.odom.x > 0.01);
        assert!(moved.is_some());

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_latest_drains_to_newest_snapshot() {
        let mut config = quiet_config();
        config.runner.sim_rate_hz = 1000.0;
        config.runner.publish_rate_hz = 500.0;
        config.runner.sensor_buffer = 64;
        let handle = SimHandle::spawn(config).unwrap();

        let first = handle.read_timeout(Duration::from_secs(1)).unwrap();
        let second = handle.read_timeout(Duration::from_secs(1)).unwrap();
        assert!(second.time > first.time);

        thread::sleep(Duration::from_millis(50));
        let newest = handle.latest().unwrap();
        assert!(newest.time > second.time);
        if let Some(next) = handle.read() {
            assert!(next.time > newest.time);
        }

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_write_after_worker_exit() {
        let handle = SimHandle::spawn(quiet_config()).unwrap();
        handle.stop.store(true, Ordering::Release);
        while handle.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(
            handle.write(Command::gripper(true)),
            Err(SimError::WorkerStopped)
        ));
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_times_out_on_slow_step() {
        let mut config = quiet_config();
        config.lidar.num_rays = 20_000;
        config.lidar.step = 0.001;
        config.runner.shutdown_timeout_ms = 0;
        let handle = SimHandle::spawn(config).unwrap();
        assert!(matches!(
            handle.shutdown(),
            Err(SimError::ShutdownTimeout(timeout)) if timeout.is_zero()
        ));
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let mut config = quiet_config();
        config.runner.publish_rate_hz = 0.0;
        assert!(matches!(
            SimHandle::spawn(config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
