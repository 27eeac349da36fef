//! Interactive confirmation prompts.
use std::io::{BufRead as _, Write as _};

/// Asks the user questions on the terminal.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question. Anything but an explicit `y` answers no.
    fn confirm(&self, msg: &str) -> bool;

    /// Print `msg` and wait for the user to press return.
    fn pause(&self, msg: &str);
}

/// [`Prompt`] reading answers from standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl StdinPrompt {
    #[allow(clippy::print_stdout)]
    fn read_answer(msg: &str) -> String {
        print!("{msg}");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok();
        line
    }
}

impl Prompt for StdinPrompt {
    fn confirm(&self, msg: &str) -> bool {
        is_affirmative(&Self::read_answer(msg))
    }

    fn pause(&self, msg: &str) {
        Self::read_answer(msg);
    }
}

/// Only the first character of the answer counts.
fn is_affirmative(answer: &str) -> bool {
    answer
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}
