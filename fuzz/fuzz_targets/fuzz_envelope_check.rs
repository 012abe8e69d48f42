#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use quorate_governance::validation::check_envelope;
use quorate_governance::{
    Checkpoint, DeployOrigin, ProposalBody, ProposalSnapshot, Template, VerificationError,
    VotingTerms,
};
use quorate_types::{Bytes32, ExecutableKind, Identity, ProposalType, Ratio};
use std::collections::BTreeSet;

#[derive(Debug, Arbitrary)]
struct Input {
    template_durations: (u64, u64),
    template_delays: (u64, u64),
    template_votes: u128,
    template_agreement: u128,
    template_executable: u8,
    requires_factory: bool,
    votes: u128,
    agreement: u128,
    start_delay: u64,
    min_duration: u64,
    max_duration: u64,
    executable: u8,
    option_count: u8,
    max_options: u8,
    via_factory: bool,
}

fn kind(code: u8) -> ExecutableKind {
    ExecutableKind::from_code(code % 3).unwrap_or(ExecutableKind::NonExecutable)
}

// The predicate must never panic, and whatever it admits must actually lie
// inside the envelope.
fuzz_target!(|input: Input| {
    let factory = Identity::new("factory-1");
    let template = Template {
        name: "fuzz".into(),
        factory: input.requires_factory.then(|| factory.clone()),
        executable: kind(input.template_executable),
        min_votes: Ratio::from_raw(input.template_votes),
        min_agreement: Ratio::from_raw(input.template_agreement),
        opinion_scales: BTreeSet::new(),
        min_voting_duration_secs: input.template_durations.0,
        max_voting_duration_secs: input.template_durations.1,
        min_start_delay_secs: input.template_delays.0,
        max_start_delay_secs: input.template_delays.1,
    };
    let terms = VotingTerms {
        min_votes: Ratio::from_raw(input.votes),
        min_agreement: Ratio::from_raw(input.agreement),
        start_delay_secs: input.start_delay,
        min_voting_duration_secs: input.min_duration,
        max_voting_duration_secs: input.max_duration,
    };
    let snapshot = ProposalSnapshot {
        proposal_type: ProposalType::PLAIN_TEXT,
        executable: kind(input.executable),
        body: ProposalBody::new(
            "fuzz",
            "",
            vec![Bytes32::ZERO; input.option_count as usize],
            terms.clone(),
        ),
    };
    let origin = if input.via_factory {
        DeployOrigin::Factory { factory }
    } else {
        DeployOrigin::Direct {
            deployer: Identity::new("factory-1"),
        }
    };
    let max_options = input.max_options as usize;

    let constructed = check_envelope(&template, &snapshot, Checkpoint::Construction);
    let admitted = check_envelope(
        &template,
        &snapshot,
        Checkpoint::Admission {
            origin: &origin,
            max_options,
        },
    );

    // Admission checks a superset of construction.
    if let Err(e) = &constructed {
        assert_eq!(admitted.as_ref().err(), Some(e));
    }

    match admitted {
        Ok(()) => {
            assert_eq!(snapshot.executable, template.executable);
            assert!(terms.min_voting_duration_secs >= template.min_voting_duration_secs);
            assert!(terms.max_voting_duration_secs <= template.max_voting_duration_secs);
            assert!(terms.min_voting_duration_secs <= terms.max_voting_duration_secs);
            assert!(terms.start_delay_secs >= template.min_start_delay_secs);
            assert!(terms.start_delay_secs <= template.max_start_delay_secs);
            assert!(terms.min_agreement >= template.min_agreement);
            assert!(!terms.min_agreement.exceeds_one());
            assert!(terms.min_votes >= template.min_votes);
            assert!(!terms.min_votes.exceeds_one());
            assert!((1..=max_options).contains(&snapshot.body.options.len()));
            assert!(!input.requires_factory || input.via_factory);
        }
        Err(VerificationError::TemplateNotFound(_)) => unreachable!("template passed directly"),
        Err(_) => {}
    }
});
