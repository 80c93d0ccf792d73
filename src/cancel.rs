use std::{future::Future, time::Duration};

use tokio::{
    select,
    sync::watch,
    time::{sleep, sleep_until, Instant},
};

use crate::error::{Error, Result};

/// Cancellation signal threaded through every long wait: an optional deadline
/// plus an interrupt flag flipped by [`Interrupter`].
#[derive(Debug, Clone)]
pub struct Cancel {
    deadline: Option<Instant>,
    interrupted: watch::Receiver<bool>,
}

#[derive(Debug)]
pub struct Interrupter(watch::Sender<bool>);

impl Interrupter {
    pub fn interrupt(&self) {
        self.0.send_replace(true);
    }
}

impl Cancel {
    pub fn new(timeout: Option<Duration>) -> (Self, Interrupter) {
        let (sender, receiver) = watch::channel(false);
        let cancel = Cancel {
            deadline: timeout.map(|timeout| Instant::now() + timeout),
            interrupted: receiver,
        };
        (cancel, Interrupter(sender))
    }

    pub fn never() -> Self {
        let (cancel, _) = Cancel::new(None);
        cancel
    }

    pub fn is_cancelled(&self) -> bool {
        let past_deadline = self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        past_deadline || *self.interrupted.borrow()
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the deadline passes or an interrupt arrives.
    pub async fn cancelled(&self) {
        let mut interrupted = self.interrupted.clone();
        let interrupt = async move {
            // a dropped interrupter can never fire
            if interrupted.wait_for(|flag| *flag).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        if let Some(deadline) = self.deadline {
            select! {
                () = sleep_until(deadline) => {}
                () = interrupt => {}
            }
        } else {
            interrupt.await;
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.guard(async {
            sleep(duration).await;
            Ok(())
        })
        .await
    }

    /// Runs `future` unless cancellation wins the race.
    pub async fn guard<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        select! {
            result = future => result,
            () = self.cancelled() => Err(Error::Cancelled),
        }
    }
}
