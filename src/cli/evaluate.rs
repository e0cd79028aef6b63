//! Evaluate command - grade a single lab value

use super::{check_fail_threshold, ContextArgs, OutputArgs, Session};
use anyhow::{bail, Result};
use labsig::reporters::{self, Report};
use labsig::{ClinicalSignificanceEngine, EvaluationError};
use tracing::debug;

/// Run the evaluate command
pub fn run(
    engine: &ClinicalSignificanceEngine,
    session: &Session,
    test: &str,
    value: &str,
    context: &ContextArgs,
    output: &OutputArgs,
) -> Result<()> {
    let format = session.format(output.format.as_deref())?;
    let ctx = session.context(&context.overrides());
    debug!(?ctx, "effective patient context");

    let result = match engine.evaluate(test, value, &ctx) {
        Ok(result) => result,
        Err(EvaluationError::UnknownTest { name, suggestions }) => bail!(
            "Lab test \"{}\" not recognized. Known tests: {}",
            name,
            suggestions.join(", ")
        ),
        Err(err) => return Err(err.into()),
    };

    let out = reporters::report_with_format(Report::Result(&result), format, session.color)?;
    println!("{}", out.trim_end());

    check_fail_threshold(output.fail_on, Some(result.significance))
}
