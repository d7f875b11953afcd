//! Dedicated classifier thread.
//!
//! Landmark engines and clip models are blocking, stateful and not meant to
//! be shared, so each session gets one OS thread that owns its classifier.
//! The async side talks to it over a job channel and awaits replies on
//! oneshot channels.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::classifier::{Classification, Classifier, ClassifierFactory, ClassifierInput};
use crate::error::{ClassifierError, SessionError};
use crate::perception::Frame;

enum Job {
    Classify {
        input: ClassifierInput,
        reply: oneshot::Sender<Result<Classification, ClassifierError>>,
    },
    Observe(Frame),
    Emitted(String),
}

/// Handle to a session's classifier thread.
///
/// Dropping the handle disconnects the job channel; the thread finishes the
/// job in hand, closes the classifier and exits on its own.
pub struct ClassifierWorker {
    jobs: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    name: String,
    backend: &'static str,
}

impl ClassifierWorker {
    /// Start the thread and build the classifier on it.
    ///
    /// Resolves once the classifier exists, or with the error that
    /// prevented it.
    pub async fn spawn(name: String, factory: ClassifierFactory) -> Result<Self, SessionError> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut classifier = match factory.create() {
                    Ok(classifier) => {
                        let _ = ready_tx.send(Ok(classifier.name()));
                        classifier
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run(classifier.as_mut(), jobs_rx);
                classifier.close();
                debug!(worker = %thread_name, "classifier closed");
            })
            .map_err(|e| SessionError::WorkerStart {
                reason: e.to_string(),
            })?;

        match ready_rx.await {
            Ok(Ok(backend)) => Ok(Self {
                jobs: Some(jobs_tx),
                handle: Some(handle),
                name,
                backend,
            }),
            Ok(Err(e)) => Err(SessionError::Classifier(e)),
            Err(_) => Err(SessionError::WorkerStart {
                reason: "worker exited before the classifier was built".to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the classifier running on the thread.
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub async fn classify(&self, input: ClassifierInput) -> Result<Classification, ClassifierError> {
        let (reply, rx) = oneshot::channel();
        self.send(Job::Classify { input, reply })?;
        rx.await.map_err(|_| ClassifierError::WorkerGone)?
    }

    /// Hand over a frame that was not admitted for classification.
    pub fn observe(&self, frame: Frame) -> Result<(), ClassifierError> {
        self.send(Job::Observe(frame))
    }

    /// Tell the classifier that `label` went out to the client.
    pub fn emitted(&self, label: &str) -> Result<(), ClassifierError> {
        self.send(Job::Emitted(label.to_string()))
    }

    /// Stop accepting jobs and wait for the thread to close the classifier.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<(), SessionError> {
        self.jobs.take();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let join = tokio::task::spawn_blocking(move || handle.join());
        match tokio::time::timeout(timeout, join).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(_))) => {
                warn!(worker = %self.name, "classifier thread panicked");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(worker = %self.name, error = %e, "join task failed");
                Ok(())
            }
            Err(_) => Err(SessionError::ShutdownTimeout { timeout }),
        }
    }

    fn send(&self, job: Job) -> Result<(), ClassifierError> {
        self.jobs
            .as_ref()
            .ok_or(ClassifierError::WorkerGone)?
            .send(job)
            .map_err(|_| ClassifierError::WorkerGone)
    }
}

impl Drop for ClassifierWorker {
    fn drop(&mut self) {
        // Detach rather than join: drop may run on an async executor thread.
        self.jobs.take();
        self.handle.take();
    }
}

fn run(classifier: &mut dyn Classifier, jobs: mpsc::Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Classify { input, reply } => {
                let _ = reply.send(classifier.classify(input));
            }
            Job::Observe(frame) => classifier.observe(frame),
            Job::Emitted(label) => classifier.on_emitted(&label),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use image::RgbImage;

    use super::*;
    use crate::config::StreamConfig;
    use crate::geometry::testing;
    use crate::perception::ScriptedLandmarker;

    fn factory(closed: Arc<AtomicBool>) -> ClassifierFactory {
        let landmarker = ScriptedLandmarker::factory(vec![vec![testing::open_palm()]], closed);
        ClassifierFactory::new(Arc::new(StreamConfig::default()), landmarker)
    }

    fn frame(seq: u64) -> Frame {
        Frame {
            seq,
            ts_ms: seq * 33,
            image: RgbImage::new(2, 2),
        }
    }

    #[tokio::test]
    async fn classifies_on_the_worker_thread() {
        let closed = Arc::new(AtomicBool::new(false));
        let worker = ClassifierWorker::spawn("test-worker".into(), factory(Arc::clone(&closed)))
            .await
            .unwrap();
        assert_eq!(worker.backend(), "rule");

        let mut last = Classification::none();
        for i in 0..4 {
            last = worker
                .classify(ClassifierInput::Frame(frame(i)))
                .await
                .unwrap();
        }
        assert_eq!(last.stable.as_deref(), Some("5"));

        worker.shutdown(Duration::from_secs(2)).await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn dropping_the_handle_closes_the_classifier() {
        let closed = Arc::new(AtomicBool::new(false));
        let worker = ClassifierWorker::spawn("test-worker".into(), factory(Arc::clone(&closed)))
            .await
            .unwrap();
        drop(worker);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !closed.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn startup_failure_is_reported() {
        let config = StreamConfig {
            backend: crate::config::ClassifierBackend::Clip,
            ..StreamConfig::default()
        };
        let factory = ClassifierFactory::new(Arc::new(config), crate::perception::no_hand_factory());
        let result = ClassifierWorker::spawn("test-worker".into(), factory).await;
        assert!(matches!(
            result,
            Err(SessionError::Classifier(ClassifierError::ModelMissing))
        ));
    }

    #[tokio::test]
    async fn engine_failure_reaches_the_caller() {
        let landmarker: crate::perception::LandmarkerFactory = Arc::new(|_config| {
            Ok(Box::new(ScriptedLandmarker::new(vec![]).failing_at(0))
                as Box<dyn crate::perception::HandLandmarker>)
        });
        let factory = ClassifierFactory::new(Arc::new(StreamConfig::default()), landmarker);
        let worker = ClassifierWorker::spawn("test-worker".into(), factory).await.unwrap();
        let result = worker.classify(ClassifierInput::Frame(frame(0))).await;
        assert!(matches!(result, Err(ClassifierError::Perception(_))));
    }
}
