//! The clock source, the three countdown tasks and the host timer seam.
use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, SyncSender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::definitions::timer;

/// A monotonic source of time, measured from an arbitrary origin.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// The wall clock, backed by [`Instant`](std::time::Instant).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A virtual clock that only moves when told to. All clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Will calculate the whole `60 Hz` ticks contained in `elapsed`.
fn elapsed_ticks(elapsed: Duration) -> u128 {
    elapsed.as_nanos() * timer::HERTZ as u128 / timer::NANOS_PER_SECOND as u128
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    since: Duration,
    ticks: u8,
}

/// A one-shot countdown at `60 Hz`, used for the delay and the sound timer.
///
/// The readable value is `ticks - elapsed_ticks`, a partially elapsed tick still
/// counts as a whole one. The value reaches zero exactly `ticks / 60` seconds
/// after arming.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    armed: Option<Armed>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will (re)start the countdown, arming with `0` disarms it.
    pub fn arm(&mut self, now: Duration, ticks: u8) {
        self.armed = (ticks > 0).then(|| Armed { since: now, ticks });
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Will return the remaining ticks, `0` if the countdown is not armed.
    ///
    /// # Example
    /// ```rust
    /// # use chip::timer::Countdown;
    /// # use std::time::Duration;
    /// let mut countdown = Countdown::new();
    /// countdown.arm(Duration::ZERO, 2);
    /// assert_eq!(2, countdown.remaining_ticks(Duration::from_millis(16)));
    /// assert_eq!(1, countdown.remaining_ticks(Duration::from_millis(17)));
    /// assert_eq!(0, countdown.remaining_ticks(Duration::from_millis(34)));
    /// ```
    pub fn remaining_ticks(&self, now: Duration) -> u8 {
        match self.armed {
            None => 0,
            Some(Armed { since, ticks }) => {
                let elapsed = elapsed_ticks(now.saturating_sub(since));
                (ticks as u128).saturating_sub(elapsed) as u8
            }
        }
    }

    /// Will report an expiration exactly once and disarm the countdown.
    pub fn take_expired(&mut self, now: Duration) -> bool {
        if self.is_armed() && self.remaining_ticks(now) == 0 {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

/// The periodic CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    period: Duration,
    next: Option<Duration>,
    max_backlog: u64,
}

impl Periodic {
    /// Will create a disarmed clock firing `frequency` times a second.
    pub fn new(frequency: u32) -> Self {
        let frequency = frequency.max(1) as u64;
        let nanos = (timer::NANOS_PER_SECOND / frequency).max(1);
        Self {
            period: Duration::from_nanos(nanos),
            next: None,
            max_backlog: (frequency / 10).max(1),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// The most firings a single poll reports, anything above is dropped.
    pub fn max_backlog(&self) -> u64 {
        self.max_backlog
    }

    /// Will arm the clock, the first firing is one period after `now`.
    pub fn arm(&mut self, now: Duration) {
        self.next = Some(now + self.period);
    }

    pub fn disarm(&mut self) {
        self.next = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Will return the amount of firings due at `now` and move the clock past them.
    pub fn poll(&mut self, now: Duration) -> u64 {
        let next = match self.next {
            Some(next) if next <= now => next,
            _ => return 0,
        };

        let period = self.period.as_nanos();
        let due = (now - next).as_nanos() / period + 1;
        let advance = due * period;
        self.next = Some(next + Duration::from_nanos(advance.min(u64::MAX as u128) as u64));

        let due = due.min(u64::MAX as u128) as u64;
        if due > self.max_backlog {
            log::warn!(
                "CPU clock fell behind, dropping {} of {} firings",
                due - self.max_backlog,
                due
            );
            self.max_backlog
        } else {
            due
        }
    }
}

/// What became due during a [`Scheduler::poll`](Scheduler::poll).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    /// The amount of cycles to execute.
    pub cycles: u64,
    /// The sound countdown ran out, playback has to stop.
    pub sound_expired: bool,
}

/// A single clock source driving the three independent tasks: the CPU clock, the
/// delay countdown and the sound countdown.
pub struct Scheduler {
    clock: Box<dyn Clock>,
    cpu: Periodic,
    delay: Countdown,
    sound: Countdown,
}

impl Scheduler {
    pub fn new(clock: Box<dyn Clock>, frequency: u32) -> Self {
        Self {
            clock,
            cpu: Periodic::new(frequency),
            delay: Countdown::new(),
            sound: Countdown::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn arm_cpu(&mut self) {
        let now = self.now();
        self.cpu.arm(now);
    }

    pub fn disarm_cpu(&mut self) {
        self.cpu.disarm();
    }

    pub fn cpu_armed(&self) -> bool {
        self.cpu.is_armed()
    }

    pub fn cpu_period(&self) -> Duration {
        self.cpu.period()
    }

    pub fn arm_delay(&mut self, ticks: u8) {
        let now = self.now();
        self.delay.arm(now, ticks);
    }

    /// The readable value of the delay timer.
    pub fn delay(&self) -> u8 {
        self.delay.remaining_ticks(self.now())
    }

    pub fn arm_sound(&mut self, ticks: u8) {
        let now = self.now();
        self.sound.arm(now, ticks);
    }

    pub fn disarm_sound(&mut self) {
        self.sound.disarm();
    }

    pub fn sound_armed(&self) -> bool {
        self.sound.is_armed()
    }

    /// The readable value of the sound timer.
    pub fn sound(&self) -> u8 {
        self.sound.remaining_ticks(self.now())
    }

    /// Will collect everything that became due since the last poll.
    pub fn poll(&mut self) -> Due {
        let now = self.now();
        Due {
            cycles: self.cpu.poll(now),
            sound_expired: self.sound.take_expired(now),
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("cpu", &self.cpu)
            .field("delay", &self.delay)
            .field("sound", &self.sound)
            .finish()
    }
}

/// The host timer seam, runs a callback on a fixed interval.
pub trait TimedWorker {
    fn new() -> Self;
    fn start<T>(&mut self, callback: T, interval: Duration)
    where
        T: Send + FnMut() + 'static;
    fn stop(&mut self);
    fn is_alive(&self) -> bool;
}

/// Is the internal worker, that exists on the
/// second thread.
pub struct Worker {
    /// Contains the actual thread, that is running.
    thread: Option<JoinHandle<()>>,
    /// Contains the sync sender used to gracefully shutdown the thread.
    shutdown: Option<SyncSender<()>>,
    /// Counts the references held by the running thread.
    alive: Arc<()>,
}

impl TimedWorker for Worker {
    fn new() -> Self {
        Self {
            thread: None,
            shutdown: None,
            alive: Arc::new(()),
        }
    }

    /// Will start the worker that will run the callback function
    /// every interval.
    /// Attention the timer assumes the callback will finish
    /// calculation faster than the interval.
    fn start<T>(&mut self, mut callback: T, interval: Duration)
    where
        T: Send + FnMut() + 'static,
    {
        let (send, recv) = mpsc::sync_channel::<()>(1);
        let alive = self.alive.clone();
        let thread = thread::spawn(move || {
            let _alive = alive;
            let mut timeout = interval;
            loop {
                match recv.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => {
                        let start = Instant::now();

                        callback();

                        // make sure the system will at most wait the interval
                        timeout = interval.saturating_sub(start.elapsed());
                    }
                    Ok(_) | Err(_) => break, // shutdown
                }
            }
        });

        self.thread = Some(thread);
        self.shutdown = Some(send);
    }

    /// Will stop the worker.
    fn stop(&mut self) {
        // sending the message and dropping the only sender both end the loop
        if let Some(sender) = self.shutdown.take() {
            if sender.send(()).is_err() {
                log::debug!("worker thread was already gone");
            }
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("the worker thread panicked");
            }
        }
    }

    /// Checks if the thread is alive.
    fn is_alive(&self) -> bool {
        Arc::strong_count(&self.alive) > 1
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const TICK_NANOS: u64 = timer::NANOS_PER_SECOND / timer::HERTZ;

    #[test]
    fn test_countdown_boundaries() {
        let mut countdown = Countdown::new();
        let start = Duration::from_secs(3);
        countdown.arm(start, 60);

        assert_eq!(60, countdown.remaining_ticks(start));
        // just before the first tick boundary (16_666_666.6 ns)
        assert_eq!(60, countdown.remaining_ticks(start + Duration::from_nanos(16_666_666)));
        assert_eq!(59, countdown.remaining_ticks(start + Duration::from_nanos(16_666_667)));
        assert_eq!(30, countdown.remaining_ticks(start + Duration::from_millis(500)));
        assert_eq!(1, countdown.remaining_ticks(start + Duration::from_nanos(999_999_999)));
        assert_eq!(0, countdown.remaining_ticks(start + Duration::from_secs(1)));
        assert_eq!(0, countdown.remaining_ticks(start + Duration::from_secs(100)));
        // time before arming reads as the full value
        assert_eq!(60, countdown.remaining_ticks(Duration::ZERO));
    }

    #[test]
    fn test_countdown_arm_zero_disarms() {
        let mut countdown = Countdown::new();
        countdown.arm(Duration::ZERO, 10);
        assert!(countdown.is_armed());
        countdown.arm(Duration::ZERO, 0);
        assert!(!countdown.is_armed());
        assert!(!countdown.take_expired(Duration::from_secs(1)));
    }

    #[test]
    fn test_countdown_expires_once() {
        let mut countdown = Countdown::new();
        countdown.arm(Duration::ZERO, 3);
        assert!(!countdown.take_expired(Duration::from_nanos(3 * TICK_NANOS)));
        assert!(countdown.take_expired(Duration::from_millis(50)));
        assert!(!countdown.take_expired(Duration::from_millis(60)));
        assert_eq!(0, countdown.remaining_ticks(Duration::from_millis(60)));
    }

    #[test]
    fn test_periodic_first_firing_after_one_period() {
        let mut cpu = Periodic::new(100);
        assert_eq!(Duration::from_millis(10), cpu.period());
        assert_eq!(0, cpu.poll(Duration::from_millis(50)));

        cpu.arm(Duration::ZERO);
        assert_eq!(0, cpu.poll(Duration::from_millis(9)));
        assert_eq!(1, cpu.poll(Duration::from_millis(10)));
        assert_eq!(0, cpu.poll(Duration::from_millis(19)));
        assert_eq!(1, cpu.poll(Duration::from_millis(25)));
        // 30 was due, next at 40
        assert_eq!(1, cpu.poll(Duration::from_millis(39)));
        assert_eq!(1, cpu.poll(Duration::from_millis(40)));
    }

    #[test]
    fn test_periodic_backlog_is_capped() {
        let mut cpu = Periodic::new(100);
        assert_eq!(10, cpu.max_backlog());
        cpu.arm(Duration::ZERO);

        assert_eq!(5, cpu.poll(Duration::from_millis(50)));
        // 100 firings are due, only the cap is reported
        assert_eq!(10, cpu.poll(Duration::from_millis(1050)));
        // the dropped firings are not replayed
        assert_eq!(0, cpu.poll(Duration::from_millis(1055)));
        assert_eq!(1, cpu.poll(Duration::from_millis(1060)));

        cpu.disarm();
        assert_eq!(0, cpu.poll(Duration::from_secs(5)));
    }

    #[test]
    fn test_periodic_small_frequency() {
        let cpu = Periodic::new(1);
        assert_eq!(Duration::from_secs(1), cpu.period());
        assert_eq!(1, cpu.max_backlog());
    }

    #[test]
    fn test_scheduler_tasks_are_independent() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(Box::new(clock.clone()), 60);

        scheduler.arm_sound(30);
        assert_eq!(0, scheduler.delay());
        assert_eq!(30, scheduler.sound());

        clock.advance(Duration::from_millis(100));
        scheduler.arm_delay(12);
        assert_eq!(12, scheduler.delay());
        assert_eq!(24, scheduler.sound());

        clock.advance(Duration::from_millis(200));
        assert_eq!(0, scheduler.delay());
        assert_eq!(12, scheduler.sound());
    }

    #[test]
    fn test_scheduler_poll() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(Box::new(clock.clone()), 500);
        assert_eq!(Due::default(), scheduler.poll());

        scheduler.arm_cpu();
        scheduler.arm_sound(1);
        clock.advance(Duration::from_millis(10));
        assert_eq!(
            Due {
                cycles: 5,
                sound_expired: false
            },
            scheduler.poll()
        );

        clock.advance(Duration::from_millis(10));
        assert_eq!(
            Due {
                cycles: 5,
                sound_expired: true
            },
            scheduler.poll()
        );
        assert!(!scheduler.sound_armed());

        scheduler.disarm_cpu();
        clock.advance(Duration::from_millis(10));
        assert_eq!(Due::default(), scheduler.poll());
    }

    #[test]
    fn test_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = counter.clone();

        let mut worker = Worker::new();
        assert!(!worker.is_alive());
        worker.start(
            move || {
                inner.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(1),
        );
        assert!(worker.is_alive());

        thread::sleep(Duration::from_millis(100));
        worker.stop();

        assert!(!worker.is_alive());
        assert!(counter.load(Ordering::SeqCst) > 0);
    }
}
