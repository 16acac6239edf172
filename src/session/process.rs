//! Long-running child processes owned by a session.

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::utils::exec::Cmd;

/// Children spawned for the session. Dropping the group kills them.
#[derive(Default)]
pub struct ProcessGroup {
    children: Vec<(String, JoinHandle<()>)>,
}

impl ProcessGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `cmd` and supervise it under `name`.
    ///
    /// A child that exits on its own ends the session.
    pub fn spawn(&mut self, name: &str, cmd: Cmd) -> Result<()> {
        let mut child = cmd.spawn()?;
        crate::debug!("serve"; "{} started (pid {:?})", name, child.id());

        let label = name.to_string();
        let supervisor = tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => crate::log!("serve"; "{} exited with {}", label, status),
                Err(e) => crate::log!("serve"; "{} failed: {}", label, e),
            }
            crate::core::request_shutdown();
        });

        self.children.push((name.to_string(), supervisor));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Kill every child. Errors are ignored.
    pub fn kill_all(&mut self) {
        for (name, supervisor) in self.children.drain(..) {
            crate::debug!("serve"; "stopping {}", name);
            // The child is dropped with its supervisor, which kills it
            supervisor.abort();
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let mut group = ProcessGroup::new();
        let result = group.spawn("server", Cmd::new("wpsync-definitely-missing-server"));
        assert!(result.is_err());
        assert!(group.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_all_empties_group() {
        let mut group = ProcessGroup::new();
        group.spawn("sleeper", Cmd::from_slice(&["sleep", "30"])).unwrap();
        assert_eq!(group.len(), 1);

        group.kill_all();
        assert!(group.is_empty());
    }
}
