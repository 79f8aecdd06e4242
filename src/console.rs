use std::io::BufRead;
use std::io::StdinLock;
use std::io::Stdout;
use std::io::Write;

/// The operator's side of the workflow: answers prompts and reads reports.
///
/// Tests substitute canned answers; the binary uses `Console::stdio`.
pub trait OperatorConsole {
    /// Show `message` and block until one line of input is available. The
    /// returned line is trimmed; end of input yields an empty string.
    fn prompt(
        &mut self,
        message: &str,
    ) -> std::io::Result<String>;

    fn report(
        &mut self,
        message: &str,
    ) -> std::io::Result<()>;
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W> {
    pub fn new(
        input: R,
        output: W,
    ) -> Self {
        Self { input, output }
    }
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self { Self::new(std::io::stdin().lock(), std::io::stdout()) }
}

impl<R: BufRead, W: Write> OperatorConsole for Console<R, W> {
    fn prompt(
        &mut self,
        message: &str,
    ) -> std::io::Result<String> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_owned())
    }

    fn report(
        &mut self,
        message: &str,
    ) -> std::io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()
    }
}
