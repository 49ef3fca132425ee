// Wallet Vault - Interactive confirmation

use std::io::{self, BufRead, Write};

use crate::vault::Confirm;

/// Asks on stderr and reads the answer from stdin. End of input is a "no".
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        ask(&mut io::stdin().lock(), &mut io::stderr(), prompt)
    }
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
