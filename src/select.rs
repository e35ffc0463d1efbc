//! Operator selection layer
//!
//! Everything interactive goes through the [`Selector`] trait so the
//! reconciliation core and the orchestration flow can be tested with a
//! scripted implementation instead of a terminal.

use crate::core::error::{Error, Result};
use std::io::{BufRead, Write};

/// Presents a list of choices, returns the index of the one picked.
pub trait Selector {
    fn pick(&mut self, prompt: &str, choices: &[String]) -> Result<usize>;
}

/// Numbered menu on stdout, answer read from stdin.
pub struct TerminalSelector;

impl Selector for TerminalSelector {
    fn pick(&mut self, prompt: &str, choices: &[String]) -> Result<usize> {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            println!("{prompt}");
            for (i, choice) in choices.iter().enumerate() {
                println!("  {}) {}", i + 1, choice);
            }
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return Err(Error::Precondition(
                    "input closed before a choice was made".to_string(),
                ));
            };
            let line = line?;
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= choices.len() => return Ok(n - 1),
                _ => println!("Enter a number between 1 and {}.", choices.len()),
            }
        }
    }
}

/// Scripted selector for tests: pops pre-seeded answers in order.
pub struct ScriptedSelector {
    answers: Vec<usize>,
}

impl ScriptedSelector {
    pub fn new(answers: Vec<usize>) -> Self {
        Self { answers }
    }
}

impl Selector for ScriptedSelector {
    fn pick(&mut self, _prompt: &str, choices: &[String]) -> Result<usize> {
        if self.answers.is_empty() {
            return Err(Error::Precondition(
                "scripted selector ran out of answers".to_string(),
            ));
        }
        let answer = self.answers.remove(0);
        assert!(answer < choices.len(), "scripted answer out of range");
        Ok(answer)
    }
}
