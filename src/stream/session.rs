//! Per-connection processing loop.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::classifier::{ClassifierFactory, ClassifierInput, ClassifierWorker};
use crate::config::StreamConfig;
use crate::error::SessionError;
use crate::stream::decode::decode_frame_blocking;
use crate::stream::emission::EmissionGate;
use crate::stream::mailbox::{Mailbox, Recv};
use crate::stream::protocol::ServerMessage;

/// A frame payload as it came off the socket.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub seq: u64,
    pub arrived: Instant,
    pub payload: String,
}

/// Per-session counters, logged periodically and at teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub received: u64,
    pub dropped: u64,
    pub skipped: u64,
    pub decoded: u64,
    pub decode_errors: u64,
    pub inferences: u64,
    pub emissions: u64,
}

/// State owned by one connection's processing loop.
pub struct Session {
    id: Uuid,
    config: Arc<StreamConfig>,
    worker: ClassifierWorker,
    gate: EmissionGate,
    stats: SessionStats,
    last_inference: Option<Instant>,
    started: Instant,
}

impl Session {
    /// Create the session and its classifier worker.
    pub async fn start(
        id: Uuid,
        config: Arc<StreamConfig>,
        factory: ClassifierFactory,
    ) -> Result<Self, SessionError> {
        let worker = ClassifierWorker::spawn(format!("classifier-{}", id.simple()), factory).await?;
        info!(session = %id, backend = worker.backend(), "session started");

        Ok(Self {
            id,
            gate: EmissionGate::new(config.emit_cooldown),
            config,
            worker,
            stats: SessionStats::default(),
            last_inference: None,
            started: Instant::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Instant that frame timestamps are measured from.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Counters so far, with ingestion counts taken from `mailbox`.
    pub fn stats(&self, mailbox: &Mailbox<Inbound>) -> SessionStats {
        SessionStats {
            received: mailbox.received(),
            dropped: mailbox.dropped(),
            ..self.stats
        }
    }

    /// Consume frames until the mailbox closes or `cancel` fires.
    ///
    /// Returns an error only for failures that end the session: the
    /// classifier failing, or the outbound side going away.
    pub async fn run(
        &mut self,
        mailbox: &Mailbox<Inbound>,
        outbound: &mpsc::Sender<ServerMessage>,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = mailbox.recv_timeout(self.config.recv_timeout) => next,
            };

            match next {
                Recv::Item(inbound) => self.handle(inbound, outbound).await?,
                Recv::Timeout => {
                    let stats = self.stats(mailbox);
                    debug!(
                        session = %self.id,
                        received = stats.received,
                        dropped = stats.dropped,
                        skipped = stats.skipped,
                        decoded = stats.decoded,
                        decode_errors = stats.decode_errors,
                        inferences = stats.inferences,
                        emissions = stats.emissions,
                        "session idle"
                    );
                }
                Recv::Closed => break,
            }
        }
        Ok(())
    }

    async fn handle(
        &mut self,
        inbound: Inbound,
        outbound: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), SessionError> {
        let ts_ms = inbound.arrived.duration_since(self.started).as_millis() as u64;
        let frame = match decode_frame_blocking(
            inbound.payload,
            self.config.frame_width,
            self.config.frame_height,
            inbound.seq,
            ts_ms,
        )
        .await
        {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.decode_errors += 1;
                warn!(session = %self.id, seq = inbound.seq, error = %e, "dropping undecodable frame");
                return Ok(());
            }
        };
        self.stats.decoded += 1;

        let now = Instant::now();
        if !self.admit(now) {
            self.stats.skipped += 1;
            trace!(session = %self.id, seq = frame.seq, "frame not admitted");
            self.worker.observe(frame)?;
            return Ok(());
        }
        self.last_inference = Some(now);
        self.stats.inferences += 1;

        let seq = frame.seq;
        let result = self.worker.classify(ClassifierInput::Frame(frame)).await?;
        if self.config.debug {
            info!(
                session = %self.id,
                seq,
                raw = result.raw.as_deref().unwrap_or("-"),
                stable = result.stable.as_deref().unwrap_or("-"),
                confidence = result.confidence,
                "classified"
            );
        }

        let Some(word) = result.stable else {
            return Ok(());
        };
        if !self.gate.admit(&word, Instant::now()) {
            return Ok(());
        }

        let raw = if self.config.debug { result.raw } else { None };
        outbound
            .send(ServerMessage::detection(word.clone(), result.confidence, raw))
            .await
            .map_err(|_| SessionError::OutboundClosed)?;
        self.worker.emitted(&word)?;
        self.stats.emissions += 1;
        info!(session = %self.id, word = %word, confidence = result.confidence, "emitted");
        Ok(())
    }

    /// Minimum-interval admission control. A zero interval admits everything.
    fn admit(&self, now: Instant) -> bool {
        let interval = self.config.infer_interval;
        interval.is_zero()
            || self
                .last_inference
                .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Stop the worker and wait for it to close the classifier.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        let timeout = self.config.shutdown_timeout;
        self.worker.shutdown(timeout).await
    }
}
