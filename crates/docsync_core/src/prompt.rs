use std::io::{BufRead, Write};

use anyhow::{Context, Result};

/// Interaction with the person running a command.
pub trait Prompt {
    /// Print an informational line.
    fn show(&mut self, message: &str) -> Result<()>;
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> Result<bool>;
    /// Offer a numbered list. `None` means the choice was cancelled.
    fn select(&mut self, heading: &str, items: &[String]) -> Result<Option<usize>>;
}

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read from prompt input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn show(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}").context("failed to write to prompt output")
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question} [y/N] ").context("failed to write to prompt output")?;
        self.output
            .flush()
            .context("failed to flush prompt output")?;
        let answer = self.read_line()?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    fn select(&mut self, heading: &str, items: &[String]) -> Result<Option<usize>> {
        self.show(heading)?;
        for (index, item) in items.iter().enumerate() {
            writeln!(self.output, "{}:\t{item}", index + 1)
                .context("failed to write to prompt output")?;
        }
        self.output
            .flush()
            .context("failed to flush prompt output")?;
        let Some(answer) = self.read_line()? else {
            return Ok(None);
        };
        Ok(answer
            .parse::<usize>()
            .ok()
            .filter(|number| (1..=items.len()).contains(number))
            .map(|number| number - 1))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Prompt, TerminalPrompt};

    fn prompt(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn items() -> Vec<String> {
        vec!["(all)".to_string(), "guides".to_string(), "reference".to_string()]
    }

    #[test]
    fn confirm_accepts_only_explicit_yes() {
        assert!(prompt("y\n").confirm("Push?").expect("confirm"));
        assert!(prompt("YES\n").confirm("Push?").expect("confirm"));
        assert!(!prompt("n\n").confirm("Push?").expect("confirm"));
        assert!(!prompt("\n").confirm("Push?").expect("confirm"));
        assert!(!prompt("").confirm("Push?").expect("confirm"));
    }

    #[test]
    fn consecutive_confirms_read_one_line_each() {
        let mut prompt = prompt("y\nn\ny\n");
        assert!(prompt.confirm("first").expect("first"));
        assert!(!prompt.confirm("second").expect("second"));
        assert!(prompt.confirm("third").expect("third"));
    }

    #[test]
    fn confirm_prints_question_with_hint() {
        let mut prompt = prompt("y\n");
        prompt.confirm("Push doc 'a'?").expect("confirm");
        let printed = String::from_utf8(prompt.output).expect("utf8");
        assert_eq!(printed, "Push doc 'a'? [y/N] ");
    }

    #[test]
    fn select_returns_zero_based_index() {
        let mut prompt = prompt("2\n");
        assert_eq!(
            prompt.select("Select category:", &items()).expect("select"),
            Some(1)
        );
        let printed = String::from_utf8(prompt.output).expect("utf8");
        assert!(printed.starts_with("Select category:\n1:\t(all)\n2:\tguides\n"));
    }

    #[test]
    fn select_cancels_on_invalid_input() {
        for input in ["0\n", "4\n", "abc\n", ""] {
            assert_eq!(
                prompt(input).select("Select:", &items()).expect("select"),
                None,
                "input {input:?}"
            );
        }
    }
}
