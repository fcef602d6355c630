use std::fmt::Write as _;

/// Logs `err` with its cause chain and prints a fatal report to stderr.
///
/// Intended for the top of `main`, right before exiting with a failure code.
pub fn report_fatal(err: &anyhow::Error) {
    log::error!("fatal: {err}");
    for cause in err.chain().skip(1) {
        log::error!("  caused by: {cause}");
    }
    eprintln!("{}", fatal_report(err));
}

pub fn fatal_report(err: &anyhow::Error) -> String {
    let mut out = format!("BLITTY: an unhandled error occurred: {err}");
    for (i, cause) in err.chain().skip(1).enumerate() {
        let _ = write!(out, "\n  {i}: {cause}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn report_lists_causes_in_order() {
        let err = Err::<(), _>(std::io::Error::other("disk on fire"))
            .context("failed to read config")
            .context("startup failed")
            .unwrap_err();

        let report = fatal_report(&err);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], "BLITTY: an unhandled error occurred: startup failed");
        assert_eq!(lines[1], "  0: failed to read config");
        assert_eq!(lines[2], "  1: disk on fire");
    }

    #[test]
    fn single_error_is_one_line() {
        let report = fatal_report(&anyhow::anyhow!("boom"));
        assert_eq!(report.lines().count(), 1);
    }
}
