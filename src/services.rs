// SPDX-License-Identifier: Apache-2.0

//! The catalog of vendor security services a companion app may bind to.
//!
//! Each brand, region and app generation ships its own security service
//! under its own package. Which one is installed is not known ahead of
//! time, so every entry compiled into the registry is attempted. The
//! `bmw` and `mini` features control which brands are compiled in.

use std::fmt;

/// A known security service variant.
///
/// Identity is the (`class_name`, `package_name`) pair. Most variants
/// live in the package named by their class name minus its last
/// segment; the "My BMW" generation does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceDescriptor {
    /// Short variant name, e.g. `BMWConnected`.
    pub name: &'static str,

    /// The service class (intent action) to bind to.
    pub class_name: &'static str,

    /// The package providing the service.
    pub package_name: &'static str,
}

impl ServiceDescriptor {
    /// Whether `name` refers to this service, either by variant name or
    /// by class name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.class_name == name
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

macro_rules! service {
    ($name:literal, $class:literal, $package:literal) => {
        ServiceDescriptor {
            name: $name,
            class_name: $class,
            package_name: $package,
        }
    };
}

/// Every security service variant known to this build, in bind order.
pub static KNOWN_SECURITY_SERVICES: &[ServiceDescriptor] = &[
    #[cfg(feature = "bmw")]
    service!(
        "BMWClassicUSA",
        "com.bmwgroup.connected.bmw.usa.SECURITY_SERVICE",
        "com.bmwgroup.connected.bmw.usa"
    ),
    #[cfg(feature = "mini")]
    service!(
        "MiniClassicUSA",
        "com.bmwgroup.connected.mini.usa.SECURITY_SERVICE",
        "com.bmwgroup.connected.mini.usa"
    ),
    #[cfg(feature = "bmw")]
    service!(
        "BMWClassic",
        "com.bmwgroup.connected.bmw.SECURITY_SERVICE",
        "com.bmwgroup.connected.bmw"
    ),
    #[cfg(feature = "mini")]
    service!(
        "MiniClassic",
        "com.bmwgroup.connected.mini.SECURITY_SERVICE",
        "com.bmwgroup.connected.mini"
    ),
    #[cfg(feature = "bmw")]
    service!(
        "BMWConnectedNA",
        "de.bmw.connected.na.SECURITY_SERVICE",
        "de.bmw.connected.na"
    ),
    #[cfg(feature = "mini")]
    service!(
        "MiniConnectedNA",
        "de.mini.connected.na.SECURITY_SERVICE",
        "de.mini.connected.na"
    ),
    #[cfg(feature = "bmw")]
    service!(
        "BMWConnected",
        "de.bmw.connected.SECURITY_SERVICE",
        "de.bmw.connected"
    ),
    #[cfg(feature = "mini")]
    service!(
        "MiniConnected",
        "de.mini.connected.SECURITY_SERVICE",
        "de.mini.connected"
    ),
    // My BMW / My Mini
    #[cfg(feature = "bmw")]
    service!(
        "BMWMine",
        "com.bmwgroup.connected.core.services.security.CarSecurityService",
        "de.bmw.connected.mobile20.row"
    ),
    #[cfg(feature = "mini")]
    service!(
        "MiniMine",
        "com.bmwgroup.connected.core.services.security.CarSecurityService",
        "de.mini.connected.mobile20.row"
    ),
];

/// Lists the known security services in the order they are attempted.
pub fn list_known_services() -> &'static [ServiceDescriptor] {
    KNOWN_SECURITY_SERVICES
}

/// Looks up a known service by variant name or class name.
///
/// Class names are not unique across generations (`BMWMine` and `MiniMine`
/// share one), so this returns the first match in registry order.
/// [`SecurityAccess`](crate::SecurityAccess) resolves names against every
/// matching entry and signs with whichever of them is connected.
pub fn find_service(name: &str) -> Option<&'static ServiceDescriptor> {
    KNOWN_SECURITY_SERVICES.iter().find(|s| s.matches(name))
}
