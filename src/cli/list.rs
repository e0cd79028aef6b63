//! Catalog commands - list tests and show decision tables

use super::Session;
use anyhow::{bail, Result};
use labsig::reporters::{self, Report};
use labsig::ClinicalSignificanceEngine;

/// Run the tests command
pub fn tests(
    engine: &ClinicalSignificanceEngine,
    session: &Session,
    format: Option<&str>,
) -> Result<()> {
    let format = session.format(format)?;
    let listing = engine.list_tests();
    let out = reporters::report_with_format(Report::Tests(&listing), format, session.color)?;
    println!("{}", out.trim_end());
    Ok(())
}

/// Run the rules command
pub fn rules(
    engine: &ClinicalSignificanceEngine,
    session: &Session,
    test: &str,
    format: Option<&str>,
) -> Result<()> {
    let format = session.format(format)?;
    let Some(definition) = engine.find_test(test) else {
        bail!(
            "Lab test \"{}\" not recognized. Known tests: {}",
            test,
            engine.catalog().keys().join(", ")
        );
    };
    let out = reporters::report_with_format(Report::Rules(definition), format, session.color)?;
    println!("{}", out.trim_end());
    Ok(())
}
