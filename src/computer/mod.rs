// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Client-side worker executing what a compute service hands out.
//!
//! A [`Computer`] owns a pool of compute contexts. Lambdas are registered on
//! every context before the next event is handled. A registration that fails
//! on one context is rolled back on the others, so every context keeps
//! running the same program for each lambda id. Batches are dispatched
//! round-robin and processed on blocking threads, so up to one batch per
//! context runs at a time. Results, errors and every log entry are submitted
//! back through the [`ComputeClient`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ContextConfig;
use crate::context::ComputeContext;
use crate::errors::{codes, ComputerError};
use crate::io::ClientStatus;
use crate::model::{ComputeBatch, ComputeError, ComputeLambda};
use crate::observability::messages::computer::{ComputerStarted, ComputerStopped};
use crate::observability::messages::StructuredLog;
use crate::traits::{ClientEvent, ComputeClient};

/// Counters published by a [`Computer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputerStats {
    /// Lambdas registered successfully since the computer was created
    pub lambda_count: usize,
    /// Batches dispatched whose result has not been submitted yet
    pub pending_batches: usize,
    /// Batches whose output or error has been submitted
    pub processed_batches: usize,
}

pub struct Computer {
    contexts: Vec<Arc<ComputeContext>>,
    /// Last program registered on every context, per lambda id.
    programs: Mutex<HashMap<i32, Arc<ComputeLambda>>>,
    next_context: AtomicUsize,
    stats: Arc<watch::Sender<ComputerStats>>,
    cancel: CancellationToken,
}

impl Computer {
    /// Builds `threads` contexts with `factory`.
    pub fn new<F>(factory: F, threads: usize) -> Result<Self, ComputerError>
    where
        F: Fn() -> Result<ComputeContext, ComputeError>,
    {
        if threads == 0 {
            return Err(ComputerError::NoContexts);
        }
        let contexts = (0..threads)
            .map(|_| factory().map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        let (stats, _) = watch::channel(ComputerStats::default());
        Ok(Self {
            contexts,
            programs: Mutex::new(HashMap::new()),
            next_context: AtomicUsize::new(0),
            stats: Arc::new(stats),
            cancel: CancellationToken::new(),
        })
    }

    pub fn from_config(config: &ContextConfig, threads: usize) -> Result<Self, ComputerError> {
        Self::new(|| ComputeContext::from_config(config), threads)
    }

    pub fn stats(&self) -> ComputerStats {
        *self.stats.borrow()
    }

    /// Follows the counters as they change.
    pub fn watch_stats(&self) -> watch::Receiver<ComputerStats> {
        self.stats.subscribe()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Handles events from `client` until the connection ends or
    /// [`close`](Self::close) is called. Returns once every dispatched batch
    /// has been answered and every log entry forwarded.
    pub async fn run<C>(&self, client: Arc<C>) -> Result<(), ComputerError>
    where
        C: ComputeClient + 'static,
    {
        ComputerStarted {
            context_count: self.contexts.len(),
        }
        .log();

        let stop_forwarding = CancellationToken::new();
        let forwarders: Vec<JoinHandle<()>> = self
            .contexts
            .iter()
            .map(|context| spawn_log_forwarder(context, Arc::clone(&client), stop_forwarding.clone()))
            .collect();

        let outcome = loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => {
                    client.close();
                    break Ok("closed");
                }
                event = client.next_event() => event,
            };

            match event {
                Some(ClientEvent::Lambda(lambda)) => self.register_everywhere(client.as_ref(), lambda).await,
                Some(ClientEvent::Batch(batch)) => self.dispatch(Arc::clone(&client), batch),
                Some(ClientEvent::Status(ClientStatus::Disrupted)) => break Err(ComputerError::Disrupted),
                Some(ClientEvent::Status(ClientStatus::Terminated)) | None => break Ok("terminated"),
                Some(ClientEvent::Status(_)) => {}
                Some(ClientEvent::Exception(e)) => {
                    tracing::warn!(error = %e, "Ignoring malformed message from compute service");
                }
            }
        };

        let mut stats = self.stats.subscribe();
        let _ = stats.wait_for(|s| s.pending_batches == 0).await;
        stop_forwarding.cancel();
        for forwarder in forwarders {
            let _ = forwarder.await;
        }

        let stats = self.stats();
        ComputerStopped {
            reason: match &outcome {
                Ok(reason) => *reason,
                Err(_) => "disrupted",
            },
            lambda_count: stats.lambda_count,
            processed_batches: stats.processed_batches,
        }
        .log();
        outcome.map(|_| ())
    }

    /// Stops [`run`](Self::run) and closes every context.
    pub fn close(&self) {
        self.cancel.cancel();
        for context in &self.contexts {
            context.close();
        }
    }

    async fn register_everywhere<C: ComputeClient + ?Sized>(&self, client: &C, lambda: ComputeLambda) {
        let lambda_id = lambda.lambda_id;
        let lambda = Arc::new(lambda);
        let mut installed = Vec::new();
        let mut failure = None;
        for context in &self.contexts {
            match register_on(context, &lambda).await {
                Ok(()) => installed.push(Arc::clone(context)),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        let Some(error) = failure else {
            self.programs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(lambda_id, lambda);
            self.stats.send_modify(|s| s.lambda_count += 1);
            return;
        };

        let previous = self
            .programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&lambda_id)
            .cloned();
        for context in installed {
            let restored = match &previous {
                Some(previous) => register_on(&context, previous).await,
                None => {
                    let context = Arc::clone(&context);
                    let _ = tokio::task::spawn_blocking(move || context.unregister(lambda_id)).await;
                    Ok(())
                }
            };
            if let Err(e) = restored {
                tracing::warn!(lambda_id, error = %e, "Failed to restore previous program");
            }
        }

        if let Err(e) = client.submit_error(error) {
            tracing::warn!(lambda_id, error = %e, "Failed to report registration error");
        }
    }

    fn dispatch<C: ComputeClient + 'static>(&self, client: Arc<C>, batch: ComputeBatch) {
        let index = self.next_context.fetch_add(1, Ordering::Relaxed) % self.contexts.len();
        let context = Arc::clone(&self.contexts[index]);
        let stats = Arc::clone(&self.stats);
        stats.send_modify(|s| s.pending_batches += 1);

        tokio::spawn(async move {
            let (lambda_id, batch_id) = (batch.lambda_id, batch.batch_id);
            let result = tokio::task::spawn_blocking(move || context.process(&batch))
                .await
                .unwrap_or_else(|e| {
                    Err(ComputeError::new(
                        codes::RUNTIME_FAULT,
                        format!("lambda {lambda_id} batch {batch_id} task failed: {e}"),
                    ))
                });

            let submitted = match result {
                Ok(output) => client.submit_batch(output),
                Err(error) => client.submit_error(error),
            };
            if let Err(e) = submitted {
                tracing::warn!(lambda_id, batch_id, error = %e, "Failed to submit batch result");
            }

            stats.send_modify(|s| {
                s.pending_batches -= 1;
                s.processed_batches += 1;
            });
        });
    }
}

async fn register_on(context: &Arc<ComputeContext>, lambda: &Arc<ComputeLambda>) -> Result<(), ComputeError> {
    let context = Arc::clone(context);
    let lambda = Arc::clone(lambda);
    tokio::task::spawn_blocking(move || context.register(&lambda))
        .await
        .unwrap_or_else(|e| {
            Err(ComputeError::new(
                codes::LOAD_FAILED,
                format!("registration task failed: {e}"),
            ))
        })
}

fn spawn_log_forwarder<C: ComputeClient + 'static>(
    context: &ComputeContext,
    client: Arc<C>,
    stop: CancellationToken,
) -> JoinHandle<()> {
    let mut subscription = context.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                entry = subscription.recv() => match entry {
                    Some(entry) => {
                        if client.submit_log_entry(entry).is_err() {
                            return;
                        }
                    }
                    None => return,
                },
                _ = stop.cancelled() => {
                    for entry in subscription.drain() {
                        if client.submit_log_entry(entry).is_err() {
                            return;
                        }
                    }
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{EchoRuntime, PickyRuntime};
    use crate::config::BackendType;
    use crate::errors::TransportError;
    use crate::model::ComputeLogEntry;
    use crate::traits::LambdaRuntime;
    use async_trait::async_trait;
    use tokio::sync::{mpsc, Mutex};

    #[derive(Debug)]
    enum Submitted {
        Batch(ComputeBatch),
        Error(ComputeError),
        Log(ComputeLogEntry),
    }

    struct FakeClient {
        events: Mutex<mpsc::UnboundedReceiver<ClientEvent>>,
        submitted: mpsc::UnboundedSender<Submitted>,
    }

    #[async_trait]
    impl ComputeClient for FakeClient {
        fn submit_batch(&self, batch: ComputeBatch) -> Result<(), TransportError> {
            self.submitted.send(Submitted::Batch(batch)).map_err(|_| TransportError::Closed)
        }

        fn submit_error(&self, error: ComputeError) -> Result<(), TransportError> {
            self.submitted.send(Submitted::Error(error)).map_err(|_| TransportError::Closed)
        }

        fn submit_log_entry(&self, entry: ComputeLogEntry) -> Result<(), TransportError> {
            self.submitted.send(Submitted::Log(entry)).map_err(|_| TransportError::Closed)
        }

        async fn next_event(&self) -> Option<ClientEvent> {
            self.events.lock().await.recv().await
        }

        fn status(&self) -> ClientStatus {
            ClientStatus::Connected
        }

        fn close(&self) {}
    }

    fn fake_client() -> (
        Arc<FakeClient>,
        mpsc::UnboundedSender<ClientEvent>,
        mpsc::UnboundedReceiver<Submitted>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (submitted_tx, submitted_rx) = mpsc::unbounded_channel();
        let client = FakeClient {
            events: Mutex::new(events_rx),
            submitted: submitted_tx,
        };
        (Arc::new(client), events_tx, submitted_rx)
    }

    fn lua_computer(threads: usize) -> Computer {
        Computer::from_config(&ContextConfig::with_backend(BackendType::Lua), threads).unwrap()
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let result = Computer::from_config(&ContextConfig::default(), 0);
        assert!(matches!(result, Err(ComputerError::NoContexts)));
    }

    #[tokio::test]
    async fn test_processes_batches_and_forwards_logs() {
        let computer = lua_computer(2);
        let (client, events, mut submitted) = fake_client();

        let program = "lcm:register(function (b)\n  lcm:log('saw ' .. b)\n  return b:upper()\nend)";
        events.send(ClientEvent::Lambda(ComputeLambda::new(1, program))).unwrap();
        for batch_id in 1..=4 {
            events
                .send(ClientEvent::Batch(ComputeBatch::new(1, batch_id, format!("b{batch_id}").into_bytes())))
                .unwrap();
        }
        events.send(ClientEvent::Batch(ComputeBatch::new(9, 5, vec![]))).unwrap();
        events.send(ClientEvent::Status(ClientStatus::Terminated)).unwrap();

        computer.run(Arc::clone(&client)).await.unwrap();
        drop(client);

        let mut outputs = Vec::new();
        let mut errors = Vec::new();
        let mut logs = Vec::new();
        while let Some(item) = submitted.recv().await {
            match item {
                Submitted::Batch(batch) => outputs.push(batch),
                Submitted::Error(error) => errors.push(error),
                Submitted::Log(entry) => logs.push(entry),
            }
        }

        outputs.sort_by_key(|b| b.batch_id);
        let data: Vec<Vec<u8>> = outputs.iter().map(|b| b.data.clone()).collect();
        assert_eq!(data, vec![b"B1".to_vec(), b"B2".to_vec(), b"B3".to_vec(), b"B4".to_vec()]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), codes::UNKNOWN_LAMBDA);

        logs.sort_by_key(|e| e.batch_id);
        let messages: Vec<&str> = logs.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["saw b1", "saw b2", "saw b3", "saw b4"]);

        assert_eq!(
            computer.stats(),
            ComputerStats {
                lambda_count: 1,
                pending_batches: 0,
                processed_batches: 5,
            }
        );
    }

    #[tokio::test]
    async fn test_registration_failure_is_submitted() {
        let computer = lua_computer(1);
        let (client, events, mut submitted) = fake_client();

        events.send(ClientEvent::Lambda(ComputeLambda::new(3, "Ã…^()["))).unwrap();
        events.send(ClientEvent::Status(ClientStatus::Terminated)).unwrap();
        computer.run(client).await.unwrap();

        match submitted.recv().await {
            Some(Submitted::Error(error)) => assert_eq!(error.code(), codes::COMPILE_FAILED),
            other => panic!("Expected a registration error, got {:?}", other),
        }
        assert_eq!(computer.stats().lambda_count, 0);
    }

    #[tokio::test]
    async fn test_partial_registration_is_rolled_back() {
        let built = AtomicUsize::new(0);
        let computer = Computer::new(
            || {
                let first = built.fetch_add(1, Ordering::Relaxed) == 0;
                let runtime: Box<dyn LambdaRuntime> = if first {
                    Box::new(EchoRuntime::default())
                } else {
                    Box::new(PickyRuntime::default())
                };
                Ok(ComputeContext::new(runtime))
            },
            2,
        )
        .unwrap();
        let (client, events, mut submitted) = fake_client();

        events.send(ClientEvent::Lambda(ComputeLambda::new(1, "old"))).unwrap();
        events.send(ClientEvent::Lambda(ComputeLambda::new(1, "reject me"))).unwrap();
        events.send(ClientEvent::Lambda(ComputeLambda::new(2, "reject me too"))).unwrap();
        for (lambda_id, batch_id) in [(1, 1), (1, 2), (2, 3), (2, 4)] {
            events.send(ClientEvent::Batch(ComputeBatch::new(lambda_id, batch_id, vec![]))).unwrap();
        }
        events.send(ClientEvent::Status(ClientStatus::Terminated)).unwrap();

        computer.run(Arc::clone(&client)).await.unwrap();
        drop(client);

        let mut outputs = Vec::new();
        let mut error_codes = Vec::new();
        let mut logs = Vec::new();
        while let Some(item) = submitted.recv().await {
            match item {
                Submitted::Batch(batch) => outputs.push(batch.batch_id),
                Submitted::Error(error) => error_codes.push(error.code()),
                Submitted::Log(entry) => logs.push(entry.message),
            }
        }

        // Both contexts still run the first program for lambda 1.
        outputs.sort();
        assert_eq!(outputs, vec![1, 2]);
        assert_eq!(logs, vec!["old".to_string(), "old".to_string()]);

        // Lambda 2 was never registered anywhere.
        error_codes.sort();
        assert_eq!(
            error_codes,
            vec![
                codes::COMPILE_FAILED,
                codes::COMPILE_FAILED,
                codes::UNKNOWN_LAMBDA,
                codes::UNKNOWN_LAMBDA
            ]
        );
        assert!(computer.contexts.iter().all(|c| c.lambda_count() == 1));
        assert_eq!(computer.stats().lambda_count, 1);
    }

    #[tokio::test]
    async fn test_disruption_ends_run_with_error() {
        let computer = lua_computer(1);
        let (client, events, _submitted) = fake_client();
        events.send(ClientEvent::Status(ClientStatus::Disrupted)).unwrap();

        let result = computer.run(client).await;
        assert!(matches!(result, Err(ComputerError::Disrupted)));
    }

    #[tokio::test]
    async fn test_close_stops_run() {
        let computer = Arc::new(lua_computer(1));
        let (client, _events, _submitted) = fake_client();

        let running = Arc::clone(&computer);
        let handle = tokio::spawn(async move { running.run(client).await });
        tokio::task::yield_now().await;
        computer.close();

        handle.await.unwrap().unwrap();
        assert!(computer.contexts.iter().all(|c| c.state() == crate::context::ContextState::Closed));
    }
}
