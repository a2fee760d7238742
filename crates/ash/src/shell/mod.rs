// ── Interactive shell ──
//
// Read a line, run it against the current context, carry on in the
// context the command hands back. Only end of input, `exit`, or a broken
// terminal stop the loop.

pub mod commands;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod view;

use ash_core::Context;

use crate::error::ShellError;
use prompt::PromptError;
pub use session::{Session, Step};

pub async fn run(session: &mut Session) -> Result<(), ShellError> {
    let mut context = Context::Root;
    loop {
        let prompt = view::prompt(&context, &session.console);
        let line = match session.prompter.read_line(&prompt) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(PromptError::Interrupted) => continue,
            Err(PromptError::Io(e)) => return Err(e.into()),
        };
        match session.step(context, &line).await {
            Step::Continue(next) => context = next,
            Step::Exit => break,
        }
    }
    Ok(())
}
