//! Step-by-step progress of a single orchestrated call.
//!
//! Each operation has its own closed step enum with an absorbing
//!  `Error` step. Progress is published over a `watch` channel so a
//!  front end only ever sees the latest step; nothing is persisted.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

pub trait Step: Copy + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Absorbing failure step, reachable from any other step
    const ERROR: Self;
}

macro_rules! steps {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            Error,
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => f.write_str($label),)*
                    $name::Error => f.write_str("error"),
                }
            }
        }

        impl Step for $name {
            const ERROR: Self = $name::Error;
        }
    };
}

steps!(
    /// creating -> verifying -> waiting -> done
    BucketStep {
        Creating => "creating",
        Verifying => "verifying",
        Waiting => "waiting",
        Done => "done",
    }
);

steps!(
    /// preparing -> issuing -> confirming -> finalizing -> done
    UploadStep {
        Preparing => "preparing",
        Issuing => "issuing",
        Confirming => "confirming",
        Finalizing => "finalizing",
        Done => "done",
    }
);

steps!(
    /// requesting -> deletionInProgress -> removed
    DeleteStep {
        Requesting => "requesting",
        DeletionInProgress => "deletionInProgress",
        Removed => "removed",
    }
);

/// Publisher side of an operation's progress
#[derive(Debug, Clone)]
pub struct Progress<S: Step> {
    operation: &'static str,
    tx: Option<Arc<watch::Sender<S>>>,
}

impl<S: Step> Progress<S> {
    /// Progress that is only logged
    pub fn silent(operation: &'static str) -> Self {
        Self { operation, tx: None }
    }

    /// Progress published to the returned receiver, starting at `initial`
    pub fn channel(operation: &'static str, initial: S) -> (Self, watch::Receiver<S>) {
        let (tx, rx) = watch::channel(initial);
        (
            Self {
                operation,
                tx: Some(Arc::new(tx)),
            },
            rx,
        )
    }

    pub fn advance(&self, step: S) {
        tracing::info!(operation = self.operation, %step, "progress");
        if let Some(tx) = &self.tx {
            tx.send_replace(step);
        }
    }

    pub fn fail(&self) {
        self.advance(S::ERROR);
    }

    /// Drive `fut`, moving to the error step if it fails
    pub async fn track<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let result = fut.await;
        if let Err(e) = &result {
            tracing::warn!(operation = self.operation, error = %e, "operation failed");
            self.fail();
        }
        result
    }
}
