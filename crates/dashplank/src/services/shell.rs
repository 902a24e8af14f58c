//! GNOME Shell overview control over `org.gnome.Shell`.

use gtk4::gio;
use gtk4::glib::{variant::ToVariant, Variant};
use tracing::warn;

use dashplank_core::{Error, Result};

const SHELL_NAME: &str = "org.gnome.Shell";
const SHELL_PATH: &str = "/org/gnome/Shell";
const SHELL_IFACE: &str = "org.gnome.Shell";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const SHELL_CALL_TIMEOUT_MS: i32 = 2000;

/// An overview the shell can be asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    Applications,
    Activities,
}

impl Overview {
    fn request(self) -> (&'static str, &'static str, Option<Variant>) {
        match self {
            Self::Applications => (SHELL_IFACE, "ShowApplications", None),
            Self::Activities => (
                PROPERTIES_IFACE,
                "Set",
                Some((SHELL_IFACE, "OverviewActive", true.to_variant()).to_variant()),
            ),
        }
    }
}

/// Ask the shell to show `overview` without waiting for the reply.
pub fn show(connection: &gio::DBusConnection, overview: Overview) {
    let (iface, method, params) = overview.request();
    connection.call(
        Some(SHELL_NAME),
        SHELL_PATH,
        iface,
        method,
        params.as_ref(),
        None,
        gio::DBusCallFlags::NONE,
        SHELL_CALL_TIMEOUT_MS,
        None::<&gio::Cancellable>,
        move |result| {
            if let Err(e) = result {
                warn!("Failed to show {:?} overview: {}", overview, e);
            }
        },
    );
}

/// Synchronous shell control for CLI usage.
pub struct ShellCli {
    connection: gio::DBusConnection,
}

impl ShellCli {
    /// Returns `None` if the session bus is unreachable.
    pub fn new() -> Option<Self> {
        let connection =
            gio::bus_get_sync(gio::BusType::Session, None::<&gio::Cancellable>).ok()?;
        Some(Self { connection })
    }

    pub fn show(&self, overview: Overview) -> Result<()> {
        let (iface, method, params) = overview.request();
        self.connection
            .call_sync(
                Some(SHELL_NAME),
                SHELL_PATH,
                iface,
                method,
                params.as_ref(),
                None,
                gio::DBusCallFlags::NONE,
                SHELL_CALL_TIMEOUT_MS,
                None::<&gio::Cancellable>,
            )
            .map(|_| ())
            .map_err(|e| Error::bus(method, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activities_request_sets_property() {
        let (iface, method, params) = Overview::Activities.request();
        assert_eq!(iface, PROPERTIES_IFACE);
        assert_eq!(method, "Set");
        let params = params.unwrap();
        assert_eq!(params.type_().as_str(), "(ssv)");
        assert_eq!(params.child_value(1).str(), Some("OverviewActive"));
    }

    #[test]
    fn test_applications_request_has_no_arguments() {
        let (_, method, params) = Overview::Applications.request();
        assert_eq!(method, "ShowApplications");
        assert!(params.is_none());
    }
}
