//! Privilege-escalation prefix.

use nix::unistd::geteuid;

use crate::config::PrivilegeConfig;

use super::subprocess::CommandLine;

/// Argument-vector prefix prepended to every command (e.g. `sudo -n`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeWrapper {
    prefix: Vec<String>,
}

impl PrivilegeWrapper {
    /// No escalation: commands run as the current user.
    pub fn none() -> Self {
        Self { prefix: Vec::new() }
    }

    /// Use the given prefix, e.g. `["sudo", "-n"]`.
    pub fn new<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the wrapper from configuration.
    ///
    /// When `skip_when_root` is set and the process already runs as root,
    /// the prefix is dropped.
    pub fn from_config(config: &PrivilegeConfig) -> Self {
        if config.skip_when_root && geteuid().is_root() {
            return Self::none();
        }
        Self::new(config.wrapper.iter().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Produce the command line that actually gets executed.
    pub fn wrap(&self, command: &CommandLine) -> CommandLine {
        let Some((program, rest)) = self.prefix.split_first() else {
            return command.clone();
        };
        CommandLine::new(program)
            .args(rest)
            .arg(&command.program)
            .args(&command.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_wrapper_is_identity() {
        let cmd = CommandLine::new("/usr/bin/systemctl").args(["reload", "nginx"]);
        assert_eq!(PrivilegeWrapper::none().wrap(&cmd), cmd);
    }

    #[test]
    fn test_prefix_is_prepended() {
        let cmd = CommandLine::new("/usr/sbin/ufw").args(["--force", "enable"]);
        let wrapped = PrivilegeWrapper::new(["sudo", "-n"]).wrap(&cmd);
        assert_eq!(wrapped.program, "sudo");
        assert_eq!(wrapped.args, vec!["-n", "/usr/sbin/ufw", "--force", "enable"]);
    }

    #[test]
    fn test_from_config_without_skip() {
        let config = PrivilegeConfig {
            wrapper: vec!["doas".to_string()],
            skip_when_root: false,
        };
        let wrapper = PrivilegeWrapper::from_config(&config);
        assert!(!wrapper.is_empty());
    }
}
