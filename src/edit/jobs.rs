use std::sync::mpsc;

use crate::foundation::error::{CollageError, CollageResult};

/// Handle to a result computed on a worker thread.
#[derive(Debug)]
pub struct JobHandle<T> {
    name: String,
    rx: mpsc::Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Job name as given to [`spawn`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the worker delivers its result.
    pub fn wait(self) -> CollageResult<T> {
        self.rx.recv().map_err(|_| {
            CollageError::validation(format!("job '{}' ended without a result", self.name))
        })
    }

    /// Result if the worker is already done; `Ok(None)` while it still runs.
    pub fn try_take(&self) -> CollageResult<Option<T>> {
        match self.rx.try_recv() {
            Ok(v) => Ok(Some(v)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(CollageError::validation(format!(
                "job '{}' ended without a result",
                self.name
            ))),
        }
    }
}

/// Run `f` on a named worker thread.
///
/// The worker never touches session state; it hands its result back through the channel and
/// the interaction thread applies it.
pub fn spawn<T, F>(name: &str, f: F) -> CollageResult<JobHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("collage-{name}"))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| CollageError::Other(anyhow::anyhow!("failed to spawn job '{name}': {e}")))?;
    Ok(JobHandle {
        name: name.to_owned(),
        rx,
    })
}
