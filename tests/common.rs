// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use idrive_security::{
    error::{BindError, NativeError},
    services::ServiceDescriptor,
    transport::{BindNotifier, Binder, SecurityService},
    SIGNED_CHALLENGE_LEN,
};

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

pub const BMW_CERT_DER: &[u8] = include_bytes!("certs_data/app_y.der");
pub const ANDROID_CA_DER: &[u8] = include_bytes!("certs_data/android_ca.der");
pub const ANDROID_CA_REISSUED_DER: &[u8] = include_bytes!("certs_data/android_ca_reissued.der");
pub const APP_CERT_DER: &[u8] = include_bytes!("certs_data/app_x.der");
pub const APP_CHAIN_PEM: &[u8] = include_bytes!("certs_data/app_chain.pem");
pub const NO_CN_DER: &[u8] = include_bytes!("certs_data/no_cn.der");

/// A registry that does not depend on the brand features.
pub static TEST_SERVICES: [ServiceDescriptor; 4] = [
    ServiceDescriptor {
        name: "Alpha",
        class_name: "test.alpha.SECURITY_SERVICE",
        package_name: "test.alpha",
    },
    ServiceDescriptor {
        name: "Bravo",
        class_name: "test.bravo.SECURITY_SERVICE",
        package_name: "test.bravo",
    },
    ServiceDescriptor {
        name: "Charlie",
        class_name: "test.charlie.SECURITY_SERVICE",
        package_name: "test.charlie",
    },
    ServiceDescriptor {
        name: "Delta",
        class_name: "test.delta.SECURITY_SERVICE",
        package_name: "test.delta",
    },
];

pub fn vehicle_bundle() -> Vec<u8> {
    [BMW_CERT_DER, ANDROID_CA_DER].concat()
}

/// What a fake security service does when asked to sign.
#[derive(Debug, Clone)]
pub enum Signing {
    /// 512 bytes, first byte 0x15.
    Ok,
    /// A buffer of the given length.
    Length(usize),
    /// Fails with the given error.
    Err(NativeError),
}

#[derive(Debug, Clone)]
pub struct MockHandle {
    pub service: &'static str,
    pub signing: Signing,
    pub bundle: Vec<u8>,
}

impl MockHandle {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            signing: Signing::Ok,
            bundle: vehicle_bundle(),
        }
    }

    pub fn signing(mut self, signing: Signing) -> Self {
        self.signing = signing;
        self
    }

    pub fn bundle(mut self, bundle: Vec<u8>) -> Self {
        self.bundle = bundle;
        self
    }
}

impl SecurityService for MockHandle {
    fn sign_challenge(&self, _: &str, challenge: &[u8]) -> Result<Vec<u8>, NativeError> {
        let len = match &self.signing {
            Signing::Ok => SIGNED_CHALLENGE_LEN,
            Signing::Length(len) => *len,
            Signing::Err(e) => return Err(e.clone()),
        };

        let mut response: Vec<u8> = challenge.iter().copied().cycle().take(len).collect();
        response.resize(len, 0);
        if let Some(first) = response.first_mut() {
            *first = 0x15;
        }
        Ok(response)
    }

    fn fetch_cert_bundle(&self) -> Result<Vec<u8>, NativeError> {
        Ok(self.bundle.clone())
    }
}

/// How the fake platform answers a bind request.
#[derive(Debug, Clone)]
pub enum Script {
    Connect(MockHandle),
    ConnectAfter(Duration, MockHandle),
    Fail(&'static str),
    Refuse,
    Pending,
}

/// What the fake platform was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub bound: Vec<&'static str>,
    /// (service, whether a handle was released)
    pub unbound: Vec<(&'static str, bool)>,
    pub notifiers: HashMap<&'static str, BindNotifier<MockHandle>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockBinder {
    scripts: HashMap<&'static str, Script>,
    pub journal: Arc<Mutex<Journal>>,
}

impl MockBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the provider of `service` with the given bind behavior.
    pub fn install(mut self, service: &ServiceDescriptor, script: Script) -> Self {
        self.scripts.insert(service.package_name, script);
        self
    }

    pub fn notifier(&self, service: &str) -> BindNotifier<MockHandle> {
        self.journal.lock().unwrap().notifiers[service].clone()
    }

    pub fn unbound(&self) -> Vec<(&'static str, bool)> {
        self.journal.lock().unwrap().unbound.clone()
    }
}

impl Binder for MockBinder {
    type Handle = MockHandle;

    fn is_installed(&self, package_name: &str) -> bool {
        self.scripts.contains_key(package_name)
    }

    fn bind(
        &mut self,
        service: &'static ServiceDescriptor,
        notifier: BindNotifier<MockHandle>,
    ) -> Result<(), BindError> {
        let script = self
            .scripts
            .get(service.package_name)
            .cloned()
            .ok_or(BindError::NotInstalled)?;

        {
            let mut journal = self.journal.lock().unwrap();
            journal.bound.push(service.name);
            journal.notifiers.insert(service.name, notifier.clone());
        }

        match script {
            Script::Connect(handle) => notifier.connected(handle),
            Script::ConnectAfter(delay, handle) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    notifier.connected(handle);
                });
            }
            Script::Fail(reason) => notifier.failed(reason),
            Script::Refuse => return Err(BindError::Refused("not exported".into())),
            Script::Pending => {}
        }
        Ok(())
    }

    fn unbind(&mut self, service: &'static ServiceDescriptor, handle: Option<MockHandle>) {
        self.journal
            .lock()
            .unwrap()
            .unbound
            .push((service.name, handle.is_some()));
    }
}

/// A listener that counts how often it fired.
pub fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = count.clone();
    (count, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

pub fn fired(count: &Arc<AtomicUsize>) -> usize {
    count.load(Ordering::SeqCst)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
