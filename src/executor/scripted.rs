//! Scripted command runner.
//!
//! Records every invocation and answers from a list of canned responses.
//! Used by the test suites and by callers that want to inject a fake host.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::subprocess::{CommandLine, CommandResult, CommandRunner};

struct Rule {
    program: String,
    args_prefix: Vec<String>,
    delay: Option<Duration>,
    response: CommandResult,
    once: bool,
}

impl Rule {
    fn matches(&self, command: &CommandLine) -> bool {
        let program_matches =
            command.program == self.program || command.program_name() == self.program;
        program_matches
            && command.args.len() >= self.args_prefix.len()
            && command
                .args
                .iter()
                .zip(&self.args_prefix)
                .all(|(actual, expected)| actual == expected)
    }
}

/// A [`CommandRunner`] that never touches the host.
///
/// Rules registered later take precedence. Commands with no matching rule
/// succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, rule: Rule) {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(rule);
    }

    /// Answer every matching command with `response`.
    ///
    /// `program` matches either the full program path or its file name.
    pub fn respond(&self, program: &str, args_prefix: &[&str], response: CommandResult) {
        self.push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            delay: None,
            response,
            once: false,
        });
    }

    /// Answer only the next matching command with `response`.
    pub fn respond_once(&self, program: &str, args_prefix: &[&str], response: CommandResult) {
        self.push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            delay: None,
            response,
            once: true,
        });
    }

    /// Answer matching commands with `response` after sleeping for `delay`.
    pub fn respond_after(
        &self,
        program: &str,
        args_prefix: &[&str],
        delay: Duration,
        response: CommandResult,
    ) {
        self.push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            delay: Some(delay),
            response,
            once: false,
        });
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Commands run so far whose program (or file name) equals `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandLine> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program || c.program_name() == program)
            .collect()
    }

    /// Whether any recorded command starts with `program` + `args_prefix`.
    pub fn was_called(&self, program: &str, args_prefix: &[&str]) -> bool {
        self.calls_to(program).iter().any(|c| {
            c.args.len() >= args_prefix.len()
                && c.args.iter().zip(args_prefix).all(|(a, e)| a == e)
        })
    }

    /// Forget recorded calls (rules are kept).
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine) -> CommandResult {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.clone());

        let matched = {
            let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
            let position = rules.iter().rposition(|rule| rule.matches(command));
            match position {
                Some(index) if rules[index].once => {
                    let rule = rules.remove(index);
                    Some((rule.delay, rule.response))
                }
                Some(index) => Some((rules[index].delay, rules[index].response.clone())),
                None => None,
            }
        };

        match matched {
            Some((delay, response)) => {
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
                response
            }
            None => CommandResult::success(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_command_succeeds() {
        let runner = ScriptedRunner::new();
        let result = runner.run(&CommandLine::new("nginx").arg("-t"));
        assert!(result.success);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_later_rules_take_precedence() {
        let runner = ScriptedRunner::new();
        runner.respond("ufw", &[], CommandResult::success("first"));
        runner.respond("ufw", &["status"], CommandResult::success("second"));

        let result = runner.run(&CommandLine::new("/usr/sbin/ufw").arg("status"));
        assert_eq!(result.stdout, "second");

        let result = runner.run(&CommandLine::new("/usr/sbin/ufw").arg("enable"));
        assert_eq!(result.stdout, "first");
    }

    #[test]
    fn test_once_rule_is_consumed() {
        let runner = ScriptedRunner::new();
        runner.respond_once("nginx", &["-t"], CommandResult::failure("broken"));

        assert!(!runner.run(&CommandLine::new("nginx").arg("-t")).success);
        assert!(runner.run(&CommandLine::new("nginx").arg("-t")).success);
    }

    #[test]
    fn test_was_called() {
        let runner = ScriptedRunner::new();
        runner.run(&CommandLine::new("/usr/bin/systemctl").args(["reload", "nginx"]));
        assert!(runner.was_called("systemctl", &["reload"]));
        assert!(!runner.was_called("systemctl", &["restart"]));
    }
}
