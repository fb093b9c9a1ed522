// SPDX-License-Identifier: Apache-2.0

//! Seams to the platform collaborators.
//!
//! The platform's service-binding IPC, the native signing primitive and
//! the companion-app discovery all live outside this crate. They are
//! reached through the traits below.

use crate::{
    error::{BindError, NativeError},
    services::ServiceDescriptor,
};

use std::{fmt::Debug, sync::mpsc::Sender};

/// How a bind request resolved.
#[derive(Debug)]
pub enum BindOutcome<H> {
    /// The service is bound and reachable through the handle.
    Connected(H),

    /// The bind could not be completed.
    Failed(String),

    /// A previously connected service went away.
    Disconnected,
}

/// A completion posted by a [`Binder`] onto the access layer's queue.
#[derive(Debug)]
pub struct BindEvent<H> {
    /// Connect cycle the originating bind request belongs to.
    pub cycle: u64,

    /// The service the event refers to.
    pub service: &'static ServiceDescriptor,

    /// What happened.
    pub outcome: BindOutcome<H>,
}

/// The posting side of the completion queue, handed to the binder with
/// each bind request. Cheap to clone; may be moved to other threads.
#[derive(Debug)]
pub struct BindNotifier<H> {
    cycle: u64,
    service: &'static ServiceDescriptor,
    sender: Sender<BindEvent<H>>,
}

impl<H> Clone for BindNotifier<H> {
    fn clone(&self) -> Self {
        Self {
            cycle: self.cycle,
            service: self.service,
            sender: self.sender.clone(),
        }
    }
}

impl<H> BindNotifier<H> {
    pub(crate) fn new(
        cycle: u64,
        service: &'static ServiceDescriptor,
        sender: Sender<BindEvent<H>>,
    ) -> Self {
        Self {
            cycle,
            service,
            sender,
        }
    }

    /// The service this notifier reports on.
    pub fn service(&self) -> &'static ServiceDescriptor {
        self.service
    }

    /// Reports a successful bind.
    pub fn connected(&self, handle: H) {
        self.post(BindOutcome::Connected(handle))
    }

    /// Reports a failed bind.
    pub fn failed(&self, reason: impl Into<String>) {
        self.post(BindOutcome::Failed(reason.into()))
    }

    /// Reports that the bound service went away.
    pub fn disconnected(&self) {
        self.post(BindOutcome::Disconnected)
    }

    fn post(&self, outcome: BindOutcome<H>) {
        let event = BindEvent {
            cycle: self.cycle,
            service: self.service,
            outcome,
        };

        // The receiving side is gone once the access layer is dropped.
        if self.sender.send(event).is_err() {
            tracing::debug!(service = %self.service, "bind event dropped, receiver closed");
        }
    }
}

/// A bound security service, as seen through its handle.
pub trait SecurityService {
    /// Signs `challenge` on behalf of `service_name` using the vehicle
    /// security primitive.
    fn sign_challenge(&self, service_name: &str, challenge: &[u8])
        -> Result<Vec<u8>, NativeError>;

    /// Exports the vehicle-issued certificate bundle.
    fn fetch_cert_bundle(&self) -> Result<Vec<u8>, NativeError>;
}

/// The platform service-binding IPC.
pub trait Binder {
    /// The handle to a bound service.
    type Handle: SecurityService + Debug;

    /// Whether the package providing a service is installed.
    fn is_installed(&self, package_name: &str) -> bool;

    /// Starts binding `service`. The outcome is reported later through
    /// `notifier`, possibly from another thread. An `Err` means the request
    /// was refused up front and no outcome will follow.
    fn bind(
        &mut self,
        service: &'static ServiceDescriptor,
        notifier: BindNotifier<Self::Handle>,
    ) -> Result<(), BindError>;

    /// Releases a service binding. Called for every attempt on
    /// disconnect, with the handle when one was delivered.
    fn unbind(&mut self, service: &'static ServiceDescriptor, handle: Option<Self::Handle>);
}

/// Locates installed companion apps and exposes their certificates.
pub trait AppCertificateSource {
    /// Returns the raw certificate bundle of an app, if it is known.
    fn lookup_app_certificate(&self, app_id: &str) -> Option<Vec<u8>>;
}

impl<F> AppCertificateSource for F
where
    F: Fn(&str) -> Option<Vec<u8>>,
{
    fn lookup_app_certificate(&self, app_id: &str) -> Option<Vec<u8>> {
        self(app_id)
    }
}
