//! Serial job queue
//!
//! Jobs submitted from any thread are handed to a single worker that owns the
//! runner, so two jobs never execute at the same time.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use log::debug;
use crate::codec::CodecGateway;
use crate::error::{AudioForgeError, Result};
use crate::processing::{Job, JobReport, JobRunner};

type Request = (Job, Sender<Result<JobReport>>);

/// Handle to the outcome of a submitted job.
pub struct JobTicket {
    rx: Receiver<Result<JobReport>>,
}

impl JobTicket {
    /// Block until the job has finished.
    pub fn wait(self) -> Result<JobReport> {
        self.rx
            .recv()
            .map_err(|_| AudioForgeError::io("Job queue worker stopped before reporting"))?
    }
}

pub struct SerialJobQueue {
    tx: Option<Sender<Option<Request>>>,
    handle: Option<JoinHandle<()>>,
}

impl SerialJobQueue {
    pub fn new<G>(runner: JobRunner<G>) -> Self
    where
        G: CodecGateway + Send + 'static,
    {
        let (tx, rx) = channel::<Option<Request>>();

        let handle = thread::spawn(move || {
            while let Ok(Some((job, reply))) = rx.recv() {
                debug!("Queue picked up {} -> {}", job.operation.name(), job.output.display());
                let _ = reply.send(runner.run(job));
            }
        });

        Self { tx: Some(tx), handle: Some(handle) }
    }

    /// Enqueue `job` behind every job submitted before it.
    pub fn submit(&self, job: Job) -> Result<JobTicket> {
        let (reply_tx, reply_rx) = channel();
        self.tx
            .as_ref()
            .ok_or_else(|| AudioForgeError::io("Job queue is shut down"))?
            .send(Some((job, reply_tx)))
            .map_err(|_| AudioForgeError::io("Job queue worker has stopped"))?;
        Ok(JobTicket { rx: reply_rx })
    }

    /// Submit and wait.
    pub fn run(&self, job: Job) -> Result<JobReport> {
        self.submit(job)?.wait()
    }
}

impl Drop for SerialJobQueue {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(None);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
