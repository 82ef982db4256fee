//! REPL command handler
//!
//! Handles special commands starting with ':'.

use crate::session::Session;

/// Command result
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL
    Exit,
    /// Clear the terminal
    ClearScreen,
    /// Output a message
    Output(String),
}

/// Command handler for the REPL
pub struct CommandHandler<'a> {
    session: &'a Session,
    /// Imports injected before every evaluation
    preamble: &'a [String],
}

impl<'a> CommandHandler<'a> {
    pub fn new(
        session: &'a Session,
        preamble: &'a [String],
    ) -> Self {
        Self { session, preamble }
    }

    /// Handle a command line
    pub fn handle(
        &self,
        line: &str,
    ) -> CommandResult {
        let cmd = line.trim().trim_start_matches(':').trim();
        let name = cmd.split_whitespace().next().unwrap_or("");

        match name {
            "quit" | "q" | "exit" => CommandResult::Exit,
            "help" | "h" => CommandResult::Output(help_text()),
            "clear" | "c" => CommandResult::ClearScreen,
            "vars" | "v" => CommandResult::Output(listing(
                self.session.variables(),
                "No variables declared",
            )),
            "methods" | "m" => CommandResult::Output(listing(
                self.session.methods(),
                "No methods declared",
            )),
            "imports" | "i" => {
                let mut imports = self.session.imports();
                for import in self.preamble {
                    if !imports.contains(import) {
                        imports.push(import.clone());
                    }
                }
                CommandResult::Output(listing(imports, "No imports"))
            }
            "classpath" | "cp" => CommandResult::Output(listing(
                self.session
                    .classpath()
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect(),
                "Classpath is empty",
            )),
            "" => CommandResult::Output(String::new()),
            _ => CommandResult::Output(format!(
                "Unknown command: {} (type :help for a list)",
                line.trim()
            )),
        }
    }
}

fn listing(
    items: Vec<String>,
    empty: &str,
) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("  {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn help_text() -> String {
    [
        "Available commands:",
        "  :quit, :q          - Exit the REPL",
        "  :help, :h          - Show this help",
        "  :clear, :c         - Clear the screen",
        "  :vars, :v          - List declared variables",
        "  :methods, :m       - List declared methods",
        "  :imports, :i       - List active imports",
        "  :classpath, :cp    - List classpath entries",
        "",
        "Input is evaluated once it forms complete statements;",
        "an unfinished statement continues on the next line.",
    ]
    .join("\n")
}
