// src/exec/invocation.rs

//! How a command line is turned into a process.
//!
//! Plain command lines (`echo A`, `make test`) are split on whitespace and
//! executed directly, so a missing program surfaces as a launch failure
//! rather than as the shell's "command not found" status. Anything that needs
//! shell interpretation goes through `sh -c` (`cmd /C` on Windows).

use tokio::process::Command;

/// Characters that only make sense to a shell.
const SHELL_METACHARACTERS: &[char] = &[
    '*', '?', '{', '}', '[', ']', '<', '>', '(', ')', '~', '&', '|', '\\', '$', ';', '\'', '`',
    '"', '\n', '#', '=', '%',
];

/// Reserved words and special builtins that have no executable on disk.
const SHELL_WORDS: &[&str] = &[
    "!", ".", ":", "break", "case", "continue", "do", "done", "elif", "else", "esac", "eval",
    "exec", "exit", "export", "fi", "for", "if", "in", "readonly", "return", "set", "shift",
    "then", "times", "trap", "unset", "until", "while",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Execute `program` with `args`, no shell involved.
    Direct { program: String, args: Vec<String> },
    /// Hand the whole line to the platform shell.
    Shell(String),
}

impl Invocation {
    pub fn for_command(line: &str) -> Self {
        if cfg!(windows) || needs_shell(line) {
            return Invocation::Shell(line.to_string());
        }

        let mut words = line.split_whitespace().map(str::to_string);
        // An empty line is passed through as an empty program name; the OS
        // refuses to launch it.
        let program = words.next().unwrap_or_default();
        Invocation::Direct {
            program,
            args: words.collect(),
        }
    }

    pub fn into_command(self) -> Command {
        match self {
            Invocation::Direct { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
            Invocation::Shell(line) => {
                if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                }
            }
        }
    }
}

fn needs_shell(line: &str) -> bool {
    if line.contains(SHELL_METACHARACTERS) {
        return true;
    }
    line.split_whitespace()
        .next()
        .is_some_and(|first| SHELL_WORDS.contains(&first))
}
