// SPDX-License-Identifier: Apache-2.0

//! Fans bind requests out over the registry and folds their completions
//! back into per-service attempt state.

use super::types::{AttemptState, ConnectionAttempt};
use crate::{
    services::ServiceDescriptor,
    transport::{BindEvent, BindNotifier, BindOutcome, Binder},
};

use std::{
    sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError},
    time::Duration,
};

/// Owns the attempts of one connect cycle and the queue their
/// completions arrive on.
#[derive(Debug)]
pub(crate) struct Multiplexer<H> {
    attempts: Vec<ConnectionAttempt<H>>,
    cycle: u64,
    sender: Sender<BindEvent<H>>,
    receiver: Receiver<BindEvent<H>>,
}

impl<H> Multiplexer<H> {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            attempts: Vec::new(),
            cycle: 0,
            sender,
            receiver,
        }
    }

    pub fn attempts(&self) -> &[ConnectionAttempt<H>] {
        &self.attempts
    }

    pub fn is_connecting(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.state == AttemptState::Connecting)
    }

    pub fn is_connected(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.state == AttemptState::Connected)
    }

    /// Starts an attempt for every installed service in `services`.
    /// Services already connecting or connected are left alone; failed
    /// ones are unbound and tried again.
    pub fn connect<B>(&mut self, binder: &mut B, services: &'static [ServiceDescriptor])
    where
        B: Binder<Handle = H>,
    {
        for service in services {
            let existing = self.attempts.iter().position(|a| a.service == service);
            if let Some(i) = existing {
                if !self.attempts[i].state.is_terminal() {
                    continue;
                }
            }

            if !binder.is_installed(service.package_name) {
                tracing::debug!(%service, package = service.package_name, "not installed");
                continue;
            }

            if let Some(i) = existing {
                let old = &mut self.attempts[i];
                tracing::debug!(%service, from = %old.state, "releasing failed binding");
                binder.unbind(service, old.handle.take());
            }

            let mut attempt = ConnectionAttempt::new(service);
            let notifier = BindNotifier::new(self.cycle, service, self.sender.clone());
            match binder.bind(service, notifier) {
                Ok(()) => {
                    tracing::debug!(%service, "bind requested");
                    attempt.state = AttemptState::Connecting;
                }
                Err(e) => {
                    tracing::warn!(%service, error = %e, "bind request refused");
                    attempt.state = AttemptState::Failed;
                }
            }

            match existing {
                Some(i) => self.attempts[i] = attempt,
                None => self.attempts.push(attempt),
            }
        }
    }

    /// Unbinds every attempt and forgets them. Completions still in flight
    /// for the finished cycle become stale. Returns whether any attempt
    /// was still pending.
    pub fn disconnect<B>(&mut self, binder: &mut B) -> bool
    where
        B: Binder<Handle = H>,
    {
        let pending = self.is_connecting();
        for attempt in self.attempts.drain(..) {
            tracing::debug!(service = %attempt.service, from = %attempt.state, "unbinding");
            binder.unbind(attempt.service, attempt.handle);
        }

        self.cycle += 1;
        self.drain_stale(binder);
        pending
    }

    /// Applies every queued completion without blocking. Returns how many
    /// were applied to current attempts.
    pub fn process_events<B>(&mut self, binder: &mut B) -> usize
    where
        B: Binder<Handle = H>,
    {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.apply(binder, event) {
                        applied += 1;
                    }
                }
                // The multiplexer holds a sender itself, so the queue
                // never disconnects.
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Waits up to `timeout` for one completion and applies it, along
    /// with anything else already queued.
    pub fn wait_for_events<B>(&mut self, binder: &mut B, timeout: Duration) -> usize
    where
        B: Binder<Handle = H>,
    {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => {
                let applied = usize::from(self.apply(binder, event));
                applied + self.process_events(binder)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn drain_stale<B>(&mut self, binder: &mut B)
    where
        B: Binder<Handle = H>,
    {
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(binder, event);
        }
    }

    fn apply<B>(&mut self, binder: &mut B, event: BindEvent<H>) -> bool
    where
        B: Binder<Handle = H>,
    {
        let BindEvent {
            cycle,
            service,
            outcome,
        } = event;

        let current = cycle == self.cycle;
        let attempt = match self.attempts.iter_mut().find(|a| a.service == service) {
            Some(attempt) if current => attempt,
            _ => {
                tracing::warn!(%service, cycle, current = self.cycle, "stale bind event");
                if let BindOutcome::Connected(handle) = outcome {
                    binder.unbind(service, Some(handle));
                }
                return false;
            }
        };

        let from = attempt.state;
        match outcome {
            BindOutcome::Connected(handle) => {
                if let Some(old) = attempt.handle.replace(handle) {
                    binder.unbind(service, Some(old));
                }
                attempt.state = AttemptState::Connected;
            }
            BindOutcome::Failed(reason) => {
                tracing::warn!(%service, reason = %reason, "bind failed");
                attempt.handle = None;
                attempt.state = AttemptState::Failed;
            }
            BindOutcome::Disconnected => {
                attempt.handle = None;
                attempt.state = AttemptState::Failed;
            }
        }

        tracing::debug!(%service, %from, to = %attempt.state, "attempt transition");
        true
    }
}
