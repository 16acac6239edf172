//! Browser side of live reload.
//!
//! WordPress pages come from the dev server, not from wpsync, so the client
//! reaches them as a must-use plugin: `wp-content/mu-plugins/wpsync-reload.php`
//! prints a small WebSocket client into every front-end and admin page.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MU_PLUGIN: &str = include_str!("wpsync-reload.php");
const MU_PLUGIN_FILE: &str = "wpsync-reload.php";
const PORT_PLACEHOLDER: &str = "__WPSYNC_RELOAD_PORT__";

/// The mu-plugin source, connecting to `port`.
pub fn render(port: u16) -> String {
    MU_PLUGIN.replace(PORT_PLACEHOLDER, &port.to_string())
}

/// An installed client. Dropping it uninstalls the mu-plugin.
#[derive(Debug)]
pub struct InstalledClient {
    path: PathBuf,
}

impl InstalledClient {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstalledClient {
    fn drop(&mut self) {
        if fs::remove_file(&self.path).is_ok() {
            crate::debug!("reload"; "removed {}", self.path.display());
        }
    }
}

/// Install the client into `runtime`. `None` when the runtime has no
/// `wp-content` yet.
pub fn install(runtime: &Path, port: u16) -> io::Result<Option<InstalledClient>> {
    let wp_content = runtime.join("wp-content");
    if !wp_content.is_dir() {
        return Ok(None);
    }

    let dir = wp_content.join("mu-plugins");
    fs::create_dir_all(&dir)?;
    let path = dir.join(MU_PLUGIN_FILE);
    fs::write(&path, render(port))?;
    Ok(Some(InstalledClient { path }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sets_port() {
        let php = render(3123);
        assert!(php.contains(":3123'"));
        assert!(!php.contains(PORT_PLACEHOLDER));
        assert!(php.contains("add_action('wp_footer'"));
    }

    #[test]
    fn test_install_and_uninstall() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wp-content")).unwrap();

        let client = install(dir.path(), 3000).unwrap().unwrap();
        let path = dir.path().join("wp-content/mu-plugins/wpsync-reload.php");
        assert_eq!(client.path(), path);
        assert!(std::fs::read_to_string(&path).unwrap().contains(":3000'"));

        drop(client);
        assert!(!path.exists());
    }

    #[test]
    fn test_install_without_wordpress() {
        let dir = tempfile::tempdir().unwrap();
        assert!(install(dir.path(), 3000).unwrap().is_none());
        assert!(!dir.path().join("wp-content").exists());
    }
}
