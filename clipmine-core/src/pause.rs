// ============================================================================
// clipmine-core/src/pause.rs
// ============================================================================
//
// PAUSE SIGNAL: Cooperative Suspension Between Pipeline Steps
//
// The pipeline calls `wait_if_paused` between major steps. Another thread (the
// CLI's stdin reader) flips the flag. Running subprocesses and API calls are
// never interrupted; the pause takes effect at the next checkpoint.
//
// AI-ASSISTANT-INFO: Mutex/Condvar pause gate shared across threads

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Shared pause flag. Clone the surrounding `Arc` to hand it to other threads.
#[derive(Debug, Default)]
pub struct PauseSignal {
    paused: Mutex<bool>,
    changed: Condvar,
}

impl PauseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        *self.lock() = true;
        log::info!("Processing paused. Type 'continue' to resume");
    }

    pub fn resume(&self) {
        *self.lock() = false;
        self.changed.notify_all();
        log::info!("Processing resumed");
    }

    pub fn is_paused(&self) -> bool {
        *self.lock()
    }

    /// Blocks the caller while the signal is paused.
    pub fn wait_if_paused(&self) {
        let mut paused = self.lock();
        while *paused {
            paused = self
                .changed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Applies a console command; returns false when the line is not one.
    pub fn apply_command(&self, line: &str) -> bool {
        match line.trim().to_ascii_lowercase().as_str() {
            "pause" => {
                self.pause();
                true
            }
            "continue" | "resume" => {
                self.resume();
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_running() {
        let signal = PauseSignal::new();
        assert!(!signal.is_paused());
        signal.wait_if_paused();
    }

    #[test]
    fn commands_toggle_state() {
        let signal = PauseSignal::new();
        assert!(signal.apply_command("pause\n"));
        assert!(signal.is_paused());
        assert!(signal.apply_command("  Continue "));
        assert!(!signal.is_paused());
        assert!(!signal.apply_command("stop"));
    }

    #[test]
    fn waiting_thread_resumes_after_resume() {
        let signal = Arc::new(PauseSignal::new());
        signal.pause();

        let passed = Arc::new(AtomicBool::new(false));
        let worker = {
            let signal = Arc::clone(&signal);
            let passed = Arc::clone(&passed);
            thread::spawn(move || {
                signal.wait_if_paused();
                passed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!passed.load(Ordering::SeqCst));

        signal.resume();
        worker.join().unwrap();
        assert!(passed.load(Ordering::SeqCst));
    }
}
