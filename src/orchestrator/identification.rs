/**
 * Identification
 * Sequential 1:N search of a probe against every stored sample
 */

use tracing::{debug, info};

use super::{Employee, ServiceUnavailable, Verifier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Identification<'a> {
    Match {
        employee: &'a Employee,
        sample_index: usize,
        score: i64,
    },
    NoMatch,
}

/// Whether an identification belongs to the employee expected at the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCheck {
    Confirmed,
    WrongEmployee,
    NotRecognized,
}

/// (employee, slot, sample) in listing order, then stored order.
fn candidates(employees: &[Employee]) -> impl Iterator<Item = (&Employee, usize, &str)> {
    employees.iter().flat_map(|employee| {
        employee
            .samples()
            .map(move |(index, sample)| (employee, index, sample))
    })
}

/// Returns the first (employee, sample) pair that matches `probe`.
///
/// Calls are awaited one at a time and pulled lazily, so the service is never
/// called past the first match. Any service failure aborts the whole scan.
/// A blank capture is never sent and identifies nobody.
pub async fn identify<'a, V: Verifier + ?Sized>(
    verifier: &V,
    probe: &str,
    employees: &'a [Employee],
) -> Result<Identification<'a>, ServiceUnavailable> {
    if probe.trim().is_empty() {
        info!("Empty capture, skipping identification");
        return Ok(Identification::NoMatch);
    }

    let mut compared = 0usize;

    for (employee, sample_index, sample) in candidates(employees) {
        let result = verifier.verify(probe, sample).await?;
        compared += 1;
        debug!(
            "{} (F{}) score={} match={}",
            employee.display_name(),
            sample_index + 1,
            result.score,
            result.is_match
        );

        if result.is_match {
            info!(
                "Identified employee {} after {compared} comparisons (score {})",
                employee.id, result.score
            );
            return Ok(Identification::Match {
                employee,
                sample_index,
                score: result.score,
            });
        }
    }

    info!("No match after {compared} comparisons");
    Ok(Identification::NoMatch)
}

/// Attendance is only marked when the identified employee is the expected one.
pub fn confirm_identity(identification: &Identification<'_>, expected_id: &str) -> IdentityCheck {
    match identification {
        Identification::Match { employee, .. } if employee.id == expected_id => {
            IdentityCheck::Confirmed
        }
        Identification::Match { .. } => IdentityCheck::WrongEmployee,
        Identification::NoMatch => IdentityCheck::NotRecognized,
    }
}
