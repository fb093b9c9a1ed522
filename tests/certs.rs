// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;

use idrive_security::{
    certs::{build_trust_chain, get_cn, load_certs, merge_bmw_cert, Certificate, Chain},
    error::Error,
    SecurityAccess,
};

fn names(bundle: &[u8]) -> Vec<String> {
    load_certs(bundle)
        .expect("bundle should parse")
        .iter()
        .filter_map(get_cn)
        .collect()
}

#[test]
fn single_der() {
    let certs = load_certs(APP_CERT_DER).unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(get_cn(&certs[0]).as_deref(), Some("a4a_app_X"));
    assert_eq!(certs[0].as_der(), APP_CERT_DER);
    assert_eq!(certs[0], Certificate::from_der(APP_CERT_DER).unwrap());
}

#[test]
fn concatenated_der() {
    let bundle = [APP_CERT_DER, BMW_CERT_DER, ANDROID_CA_DER].concat();
    let certs = load_certs(&bundle).unwrap();
    assert_eq!(certs.len(), 3);
    assert_eq!(names(&bundle), vec!["a4a_app_X", "a4a_app_Y", "a4a_android-ca"]);
    assert_eq!(certs[2].as_der(), ANDROID_CA_DER);
}

#[test]
fn pem_chain() {
    let certs = load_certs(APP_CHAIN_PEM).unwrap();
    assert_eq!(certs.len(), 2);
    assert_eq!(certs[0].as_der(), APP_CERT_DER);
    assert_eq!(certs[1].as_der(), ANDROID_CA_DER);
    assert_eq!(names(APP_CHAIN_PEM), vec!["a4a_app_X", "a4a_android-ca"]);

    let pem = certs[0].to_pem().unwrap();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(load_certs(pem.as_bytes()).unwrap(), vec![certs[0].clone()]);
}

#[test]
fn missing_common_name() {
    let certs = load_certs(NO_CN_DER).unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(get_cn(&certs[0]), None);
}

#[test]
fn broken_bundles() {
    let truncated = &ANDROID_CA_DER[..ANDROID_CA_DER.len() - 1];
    assert!(load_certs(truncated).is_none());

    let trailing = [APP_CERT_DER, &[0x00, 0x01]].concat();
    assert!(load_certs(&trailing).is_none());

    let mut corrupted = APP_CERT_DER.to_vec();
    corrupted[0] = 0x31;
    assert!(load_certs(&corrupted).is_none());

    assert_eq!(load_certs(&[]).unwrap().len(), 0);
}

#[test]
fn fingerprints() {
    let a = Certificate::from_der(ANDROID_CA_DER).unwrap();
    let b = Certificate::from_der(ANDROID_CA_REISSUED_DER).unwrap();
    assert_eq!(a.common_name(), b.common_name());
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint_hex().len(), 64);
}

#[test]
fn merge_app_and_vehicle() {
    let merged = merge_bmw_cert(APP_CERT_DER, &vehicle_bundle()).unwrap();
    assert_eq!(names(&merged), vec!["a4a_app_X", "a4a_app_Y", "a4a_android-ca"]);
    assert_eq!(merged, [APP_CERT_DER, BMW_CERT_DER, ANDROID_CA_DER].concat());
}

#[test]
fn merge_drops_later_duplicates() {
    let app = [APP_CERT_DER, ANDROID_CA_DER].concat();
    let bmw = [BMW_CERT_DER, ANDROID_CA_REISSUED_DER].concat();

    let merged = merge_bmw_cert(&app, &bmw).unwrap();
    let certs = load_certs(&merged).unwrap();
    assert_eq!(names(&merged), vec!["a4a_app_X", "a4a_android-ca", "a4a_app_Y"]);
    assert_eq!(certs[1].as_der(), ANDROID_CA_DER);
}

#[test]
fn merge_is_idempotent() {
    let merged = merge_bmw_cert(APP_CHAIN_PEM, &vehicle_bundle()).unwrap();
    assert_eq!(names(&merged).len(), 3);

    let again = merge_bmw_cert(&merged, &merged).unwrap();
    assert_eq!(again, merged);

    let again = merge_bmw_cert(APP_CHAIN_PEM, &merged).unwrap();
    assert_eq!(again, merged);
}

#[test]
fn merge_keeps_distinct_anonymous_certificates() {
    let merged = merge_bmw_cert(NO_CN_DER, &[NO_CN_DER, ANDROID_CA_DER].concat()).unwrap();
    let certs = load_certs(&merged).unwrap();
    assert_eq!(certs.len(), 2);
    assert_eq!(get_cn(&certs[0]), None);
}

#[test]
fn merge_rejects_garbage() {
    assert!(merge_bmw_cert(b"not a certificate", &vehicle_bundle()).is_none());
    assert!(merge_bmw_cert(APP_CERT_DER, &vehicle_bundle()[1..]).is_none());
    assert!(matches!(
        Chain::merge(APP_CERT_DER, b"junk"),
        Err(Error::ParseFailure)
    ));
}

#[test]
fn chain_codec() {
    use codicon::{Decoder, Encoder};

    let chain = Chain::merge(APP_CERT_DER, &vehicle_bundle()).unwrap();
    assert_eq!(chain.len(), 3);

    let mut encoded = Vec::new();
    chain.encode(&mut encoded, ()).unwrap();
    assert_eq!(encoded, chain.to_bundle());

    let decoded = Chain::decode(&mut &encoded[..], ()).unwrap();
    assert_eq!(decoded, chain);
    assert_eq!(
        decoded.common_names(),
        vec!["a4a_app_X", "a4a_app_Y", "a4a_android-ca"]
    );
}

#[test]
fn trust_chain_from_live_access() {
    let binder = MockBinder::new().install(
        &TEST_SERVICES[1],
        Script::Connect(MockHandle::new("Bravo")),
    );
    let mut access = SecurityAccess::with_services(binder, &TEST_SERVICES);
    let apps = |app_id: &str| match app_id {
        "com.clearchannel.iheartradio.connect" => Some(APP_CHAIN_PEM.to_vec()),
        _ => None,
    };

    assert!(matches!(
        build_trust_chain(&access, &apps, "com.clearchannel.iheartradio.connect"),
        Err(Error::NotConnected(None))
    ));

    access.connect();
    let chain = build_trust_chain(&access, &apps, "com.clearchannel.iheartradio.connect").unwrap();
    assert_eq!(
        chain.common_names(),
        vec!["a4a_app_X", "a4a_android-ca", "a4a_app_Y"]
    );

    assert!(matches!(
        build_trust_chain(&access, &apps, "com.spotify.music"),
        Err(Error::AppNotFound(ref app)) if app == "com.spotify.music"
    ));
}

mod cached {
    use super::*;
    use idrive_security::cached_chain;
    use serial_test::serial;

    #[test]
    #[serial]
    fn store_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chain");
        std::env::set_var(cached_chain::ENV_VAR, &path);

        assert_eq!(cached_chain::path().first(), Some(&path));

        let chain = Chain::merge(APP_CERT_DER, &vehicle_bundle()).unwrap();
        assert_eq!(cached_chain::store(&chain).unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), chain.to_bundle());
        assert_eq!(cached_chain::get().unwrap(), chain);

        std::env::remove_var(cached_chain::ENV_VAR);
    }

    #[test]
    #[serial]
    fn corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain");
        std::fs::write(&path, b"garbage").unwrap();
        std::env::set_var(cached_chain::ENV_VAR, &path);

        assert!(matches!(cached_chain::get(), Err(Error::ParseFailure)));

        std::env::remove_var(cached_chain::ENV_VAR);
    }
}
