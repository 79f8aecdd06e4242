use std::fmt::Formatter;

/// Write an error followed by every error in its `source` chain. Used for
/// `Debug` impls, so that `{:?}` (and `anyhow`'s report in `main`) shows the
/// full cause chain.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
