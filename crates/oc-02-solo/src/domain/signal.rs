//! Exit signal shared by a chain, its sequencing task and its observers

use tokio::sync::watch;

/// Flip the exit flag from running to halted.
///
/// Returns `true` for the one caller that performed the transition.
pub fn close(exit: &watch::Sender<bool>) -> bool {
    exit.send_if_modified(|halted| {
        if *halted {
            false
        } else {
            *halted = true;
            true
        }
    })
}

/// Observer handle that becomes ready once the chain has halted
#[derive(Debug, Clone)]
pub struct HaltSignal {
    exit: watch::Receiver<bool>,
}

impl HaltSignal {
    pub fn new(exit: watch::Receiver<bool>) -> Self {
        Self { exit }
    }

    /// Whether the chain has already halted
    pub fn is_halted(&self) -> bool {
        *self.exit.borrow()
    }

    /// Wait until the chain halts
    pub async fn halted(mut self) {
        // A dropped sender means the chain itself is gone
        let _ = self.exit.wait_for(|halted| *halted).await;
    }
}
