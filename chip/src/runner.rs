use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use parking_lot::{Mutex, MutexGuard};

use crate::{
    chip8::{ChipSet, Tick},
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    timer::TimedWorker,
    ProcessError,
};

/// How often [`Emulator::run`](Emulator::run) checks the quit flag.
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// The outcome of a single CPU clock firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// The previous firing was still running, nothing was done.
    Skipped,
    /// The amount of cycles executed.
    Ran(u64),
    /// A quit was requested.
    Quit,
    /// A fatal error stopped the machine.
    Failed,
}

struct Shared<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    chip: Mutex<ChipSet<D, K, S>>,
    in_cycle: AtomicBool,
    quit: AtomicBool,
    skipped: AtomicU64,
    error: Mutex<Option<ProcessError>>,
}

/// Clears the in-cycle flag once the firing is done.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    /// Will set the flag, returns `None` if it was already set.
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A shareable handle to a running machine.
///
/// The handle is cheap to clone, every clone drives the same [`ChipSet`].
pub struct Emulator<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    shared: Arc<Shared<D, K, S>>,
}

impl<D, K, S> Clone for Emulator<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<D, K, S> Emulator<D, K, S>
where
    D: DisplayCommands + Send + 'static,
    K: KeyboardCommands + Send + 'static,
    S: SoundCommands + Send + 'static,
{
    pub fn new(chip: ChipSet<D, K, S>) -> Self {
        Self {
            shared: Arc::new(Shared {
                chip: Mutex::new(chip),
                in_cycle: AtomicBool::new(false),
                quit: AtomicBool::new(false),
                skipped: AtomicU64::new(0),
                error: Mutex::new(None),
            }),
        }
    }

    /// The CPU clock callback.
    ///
    /// Runs everything that is due. A firing that arrives while the previous one is still
    /// running is skipped and counted.
    pub fn fire(&self) -> Firing {
        let _guard = match CycleGuard::acquire(&self.shared.in_cycle) {
            Some(guard) => guard,
            None => {
                self.shared.skipped.fetch_add(1, Ordering::Relaxed);
                log::warn!("skipped a cycle, the CPU frequency may be too high");
                return Firing::Skipped;
            }
        };

        if self.is_quit() {
            return Firing::Quit;
        }

        let res = self.shared.chip.lock().tick();
        match res {
            Ok(Tick::Ran(cycles)) => Firing::Ran(cycles),
            Ok(Tick::Quit) => {
                self.quit();
                Firing::Quit
            }
            Err(err) => {
                let mut slot = self.shared.error.lock();
                if slot.is_none() {
                    *slot = Some(err);
                }
                self.quit();
                Firing::Failed
            }
        }
    }

    /// Will run the machine until a quit is requested or a fatal error occurs.
    ///
    /// The worker calls [`fire`](Emulator::fire) once per CPU period.
    pub fn run<W>(&self, mut worker: W) -> Result<(), ProcessError>
    where
        W: TimedWorker,
    {
        let period = {
            let mut chip = self.shared.chip.lock();
            chip.arm_cpu();
            chip.get_scheduler().cpu_period()
        };

        let handle = self.clone();
        worker.start(
            move || {
                handle.fire();
            },
            period,
        );

        while !self.is_quit() {
            thread::sleep(QUIT_POLL_INTERVAL);
        }

        worker.stop();
        self.shared.chip.lock().shutdown();

        match self.shared.error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Will ask the machine to stop after the current firing.
    pub fn quit(&self) {
        log::debug!("emulator quit");
        self.shared.quit.store(true, Ordering::Release);
    }

    pub fn is_quit(&self) -> bool {
        self.shared.quit.load(Ordering::Acquire)
    }

    /// The amount of firings that were skipped.
    pub fn get_skipped(&self) -> u64 {
        self.shared.skipped.load(Ordering::Relaxed)
    }

    /// The fatal error that stopped the machine, if any.
    pub fn get_error(&self) -> Option<ProcessError> {
        self.shared.error.lock().clone()
    }

    /// Will lock the machine for inspection.
    pub fn lock(&self) -> MutexGuard<'_, ChipSet<D, K, S>> {
        self.shared.chip.lock()
    }
}
