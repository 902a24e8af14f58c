//! The "Show Applications" launcher item.
//!
//! The dock only pins desktop files, so the launcher is a generated desktop
//! entry whose `Exec` calls back into this daemon over D-Bus. The daemon
//! exports `io.github.dashplank.Launcher`, which forwards to the shell.

use std::fs;
use std::path::PathBuf;

use gtk4::gio;
use gtk4::glib;
use tracing::{debug, error, info, warn};

use dashplank_core::{Error, Result};

use super::shell::{self, Overview};

/// Bus name owned by the daemon's `gio::Application`.
pub const APPLICATION_ID: &str = "io.github.dashplank";
pub const LAUNCHER_PATH: &str = "/io/github/dashplank/Launcher";
pub const LAUNCHER_IFACE: &str = "io.github.dashplank.Launcher";

const LAUNCHER_XML: &str = r#"
<node>
  <interface name="io.github.dashplank.Launcher">
    <method name="ShowApplications"/>
    <method name="ShowActivities"/>
    <method name="ShowPreferences"/>
  </interface>
</node>
"#;

const DESKTOP_TEMPLATE: &str = include_str!("../../templates/apps-launcher.desktop");
const ICON_TEMPLATE: &str = include_str!("../../templates/apps-launcher.svg");

const DESKTOP_GROUP: &str = "Desktop Entry";
const ACTIVITIES_GROUP: &str = "Desktop Action ShowActivities";
const PREFERENCES_GROUP: &str = "Desktop Action DockPreferences";

/// Command line that invokes `method` on the exported launcher object.
fn launcher_exec(method: &str) -> String {
    format!(
        "gdbus call --session --dest {} --object-path {} --method {}.{}",
        APPLICATION_ID, LAUNCHER_PATH, LAUNCHER_IFACE, method
    )
}

/// The launcher's desktop entry and icon on disk.
#[derive(Debug, Clone)]
pub struct LauncherFiles {
    id: String,
    desktop_path: PathBuf,
    icon_path: PathBuf,
}

impl LauncherFiles {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            desktop_path: glib::user_data_dir()
                .join("applications")
                .join(format!("{}.desktop", id)),
            icon_path: glib::home_dir()
                .join(".icons/hicolor/scalable/apps")
                .join(format!("{}.svg", id)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn desktop_path(&self) -> &PathBuf {
        &self.desktop_path
    }

    /// The desktop entry contents, pointing at the exported object.
    pub fn render(&self) -> Result<glib::KeyFile> {
        let keys = glib::KeyFile::new();
        keys.load_from_data(DESKTOP_TEMPLATE, glib::KeyFileFlags::KEEP_TRANSLATIONS)
            .map_err(|e| Error::MissingResource(format!("launcher template ({})", e)))?;

        keys.set_string(DESKTOP_GROUP, "Icon", &self.id);
        keys.set_string(DESKTOP_GROUP, "Exec", &launcher_exec("ShowApplications"));
        keys.set_string(ACTIVITIES_GROUP, "Exec", &launcher_exec("ShowActivities"));
        keys.set_string(PREFERENCES_GROUP, "Exec", &launcher_exec("ShowPreferences"));
        Ok(keys)
    }

    /// Write the desktop entry and icon, replacing older copies.
    pub fn install(&self) -> Result<()> {
        for path in [&self.desktop_path, &self.icon_path] {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
        }

        fs::write(&self.icon_path, ICON_TEMPLATE)?;
        self.render()?
            .save_to_file(&self.desktop_path)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        debug!("Installed launcher at {}", self.desktop_path.display());
        Ok(())
    }
}

/// Export the launcher object on `connection`.
pub fn export(
    connection: &gio::DBusConnection,
    dock_command: &str,
) -> Result<gio::RegistrationId> {
    let node_info = gio::DBusNodeInfo::for_xml(LAUNCHER_XML)
        .map_err(|e| Error::MissingResource(format!("launcher interface ({})", e)))?;
    let interface_info = node_info
        .lookup_interface(LAUNCHER_IFACE)
        .ok_or_else(|| Error::MissingResource(format!("interface {}", LAUNCHER_IFACE)))?;

    let dock_command = dock_command.to_string();
    let id = connection
        .register_object(LAUNCHER_PATH, &interface_info)
        .method_call(
            move |connection, _sender, _obj_path, _iface_name, method_name, _params, invocation| {
                handle_method_call(&connection, &dock_command, method_name, invocation);
            },
        )
        .build()
        .map_err(|e| Error::bus("RegisterObject", e))?;

    info!("Exported launcher at {}", LAUNCHER_PATH);
    Ok(id)
}

pub fn unexport(connection: &gio::DBusConnection, id: gio::RegistrationId) {
    if let Err(e) = connection.unregister_object(id) {
        warn!("Failed to unexport launcher: {}", e);
    }
}

fn handle_method_call(
    connection: &gio::DBusConnection,
    dock_command: &str,
    method_name: &str,
    invocation: gio::DBusMethodInvocation,
) {
    debug!("Launcher: {}", method_name);
    match method_name {
        "ShowApplications" => shell::show(connection, Overview::Applications),
        "ShowActivities" => shell::show(connection, Overview::Activities),
        "ShowPreferences" => {
            if let Err(e) = open_preferences(dock_command) {
                error!("Failed to open dock preferences: {}", e);
                invocation.return_error(gio::IOErrorEnum::Failed, &e.to_string());
                return;
            }
        }
        _ => {
            invocation.return_error(
                gio::IOErrorEnum::InvalidArgument,
                &format!("Unknown method: {}", method_name),
            );
            return;
        }
    }
    invocation.return_value(None);
}

fn open_preferences(dock_command: &str) -> Result<()> {
    if dock_command.trim().is_empty() {
        return Err(Error::MissingResource("dock command".to_string()));
    }
    glib::spawn_command_line_async(format!("{} --preferences", dock_command).as_str())
        .map_err(|e| Error::bus("ShowPreferences", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_exec_targets_exported_object() {
        assert_eq!(
            launcher_exec("ShowApplications"),
            "gdbus call --session --dest io.github.dashplank \
             --object-path /io/github/dashplank/Launcher \
             --method io.github.dashplank.Launcher.ShowApplications"
        );
    }

    #[test]
    fn test_files_are_named_after_id() {
        let files = LauncherFiles::new("net.launchpad.plank.AppsLauncher");
        assert!(
            files
                .desktop_path()
                .ends_with("applications/net.launchpad.plank.AppsLauncher.desktop")
        );
        assert!(
            files
                .icon_path
                .ends_with(".icons/hicolor/scalable/apps/net.launchpad.plank.AppsLauncher.svg")
        );
    }

    #[test]
    fn test_render_desktop_entry() {
        let files = LauncherFiles::new("net.launchpad.plank.AppsLauncher");
        let keys = files.render().unwrap();

        assert_eq!(
            keys.string(DESKTOP_GROUP, "Icon").unwrap().as_str(),
            "net.launchpad.plank.AppsLauncher"
        );
        assert!(
            keys.string(DESKTOP_GROUP, "Exec")
                .unwrap()
                .ends_with("io.github.dashplank.Launcher.ShowApplications")
        );
        assert!(
            keys.string(PREFERENCES_GROUP, "Exec")
                .unwrap()
                .ends_with("io.github.dashplank.Launcher.ShowPreferences")
        );
    }

    #[test]
    fn test_interface_xml_parses() {
        let node = gio::DBusNodeInfo::for_xml(LAUNCHER_XML).unwrap();
        let iface = node.lookup_interface(LAUNCHER_IFACE).unwrap();
        assert!(iface.lookup_method("ShowApplications").is_some());
    }
}
