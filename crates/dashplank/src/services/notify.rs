//! Desktop notifications for errors the user has to act on.

use std::collections::HashMap;

use gtk4::gio;
use gtk4::glib::{variant::ToVariant, Variant};
use tracing::{debug, warn};

const NOTIFICATIONS_NAME: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const APP_NAME: &str = "dashplank";
const ERROR_ICON: &str = "dialog-error";

/// Show one error notification. Failures are only logged: the error has
/// already been logged by the caller.
pub fn notify_error(summary: &str, body: &str) {
    let connection = match gio::bus_get_sync(gio::BusType::Session, None::<&gio::Cancellable>) {
        Ok(c) => c,
        Err(e) => {
            debug!("No session bus for notifications: {}", e);
            return;
        }
    };

    let hints: HashMap<String, Variant> = HashMap::from([("urgency".to_string(), 2u8.to_variant())]);
    let params = (
        APP_NAME,
        0u32,
        ERROR_ICON,
        summary,
        body,
        Vec::<String>::new(),
        hints,
        -1i32,
    )
        .to_variant();

    if let Err(e) = connection.call_sync(
        Some(NOTIFICATIONS_NAME),
        NOTIFICATIONS_PATH,
        NOTIFICATIONS_NAME,
        "Notify",
        Some(&params),
        None,
        gio::DBusCallFlags::NONE,
        -1,
        None::<&gio::Cancellable>,
    ) {
        warn!("Failed to send notification: {}", e);
    }
}
