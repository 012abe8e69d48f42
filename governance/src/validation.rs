//! The admission predicate.
//!
//! One pure function decides whether a proposal fits its template. It is called
//! from two places: optionally while a proposal is constructed, and always when
//! it is submitted to the engine. Checks run in a fixed order and the first
//! violation is returned:
//!
//! 1. executable kind
//! 2. voting duration: too short, too long, min > max
//! 3. start delay: too short, too long
//! 4. agreement: below floor, above 100%
//! 5. turnout: below floor, above 100%
//! 6. option count (admission only)
//! 7. factory origin (admission only)

use crate::deployment::DeployOrigin;
use crate::error::VerificationError;
use crate::proposal::ProposalSnapshot;
use crate::template::Template;
use quorate_types::ProposalType;
use std::collections::BTreeMap;

/// Upper bound on the number of options a proposal may offer.
pub const MAX_OPTIONS: usize = 10;

/// Where the predicate is being evaluated.
#[derive(Clone, Copy, Debug)]
pub enum Checkpoint<'a> {
    /// Advisory check inside a proposal constructor. Covers the template
    /// envelope only; the deployment origin does not exist yet and options
    /// are checked on submission.
    Construction,
    /// The authoritative check at submission.
    Admission {
        origin: &'a DeployOrigin,
        max_options: usize,
    },
}

/// Look up the template for `snapshot` and check the proposal against it,
/// returning the template that admitted it.
///
/// A missing template fails closed.
pub fn verify_in<'t>(
    templates: &'t BTreeMap<ProposalType, Template>,
    snapshot: &ProposalSnapshot,
    checkpoint: Checkpoint<'_>,
) -> Result<&'t Template, VerificationError> {
    let template = templates
        .get(&snapshot.proposal_type)
        .ok_or(VerificationError::TemplateNotFound(snapshot.proposal_type))?;
    check_envelope(template, snapshot, checkpoint)?;
    Ok(template)
}

pub fn check_envelope(
    template: &Template,
    snapshot: &ProposalSnapshot,
    checkpoint: Checkpoint<'_>,
) -> Result<(), VerificationError> {
    use VerificationError::*;

    let terms = &snapshot.body.terms;

    if snapshot.executable != template.executable {
        return Err(ExecutableMismatch {
            declared: snapshot.executable,
            expected: template.executable,
        });
    }

    if terms.min_voting_duration_secs < template.min_voting_duration_secs {
        return Err(DurationTooShort);
    }
    if terms.max_voting_duration_secs > template.max_voting_duration_secs {
        return Err(DurationTooLong);
    }
    if terms.min_voting_duration_secs > terms.max_voting_duration_secs {
        return Err(EndOrderInvalid);
    }

    if terms.start_delay_secs < template.min_start_delay_secs {
        return Err(StartDelayTooShort);
    }
    if terms.start_delay_secs > template.max_start_delay_secs {
        return Err(StartDelayTooLong);
    }

    if terms.min_agreement < template.min_agreement {
        return Err(QuorumTooSmall);
    }
    if terms.min_agreement.exceeds_one() {
        return Err(QuorumExceedsMax);
    }

    if terms.min_votes < template.min_votes {
        return Err(TurnoutTooSmall);
    }
    if terms.min_votes.exceeds_one() {
        return Err(TurnoutExceedsMax);
    }

    let Checkpoint::Admission {
        origin,
        max_options,
    } = checkpoint
    else {
        return Ok(());
    };

    let count = snapshot.body.options.len();
    if count == 0 {
        return Err(OptionsEmpty);
    }
    if count > max_options {
        return Err(TooManyOptions {
            count,
            max: max_options,
        });
    }

    if let Some(factory) = &template.factory {
        if !origin.is_factory(factory) {
            return Err(OriginVerificationFailed);
        }
    }

    Ok(())
}
