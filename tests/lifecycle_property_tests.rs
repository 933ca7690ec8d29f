//! Property tests over random transition sequences
//!
//! Whatever order the API layer throws transitions at a referral, three
//! things must hold after every single call: a failed transition leaves the
//! aggregate exactly as it was, at least one requester stays linked, and
//! `sent_at` is set if and only if the referral has left Draft.

use proptest::prelude::*;
use referral_domain::{
    AnswerId, NotificationPreference, Referral, ReferralEvent, ReferralId, ReferralResult,
    ReferralState, ReferralStatus, TopicId, UrgencyLevel, UserId, ValidationVerdict,
};

/// Fixed cast reused across a generated sequence
struct Cast {
    requester: UserId,
    colleague: UserId,
    member: UserId,
    validator: UserId,
    unit: referral_domain::UnitId,
    second_unit: referral_domain::UnitId,
}

impl Cast {
    fn new() -> Self {
        Self {
            requester: UserId::new(),
            colleague: UserId::new(),
            member: UserId::new(),
            validator: UserId::new(),
            unit: referral_domain::UnitId::new(),
            second_unit: referral_domain::UnitId::new(),
        }
    }
}

fn step(
    referral: &mut Referral,
    cast: &Cast,
    op: usize,
) -> ReferralResult<Vec<ReferralEvent>> {
    match op {
        0 => referral.send(cast.requester),
        1 => referral.assign_unit(cast.unit, cast.requester, None),
        2 => referral.assign_unit(cast.second_unit, cast.requester, None),
        3 => referral.assign(cast.member, cast.unit, cast.requester),
        4 => match referral.assignees().keys().next().copied() {
            Some(assignment) => referral.unassign(assignment, cast.requester),
            None => Ok(Vec::new()),
        },
        5 => match referral.units().keys().next().copied() {
            Some(assignment) => referral.unassign_unit(assignment, cast.requester),
            None => Ok(Vec::new()),
        },
        6 => referral.add_version(AnswerId::new(), cast.member, &[cast.unit]),
        7 => referral.ask_for_validation(cast.member),
        8 => referral.request_answer_validation(AnswerId::new(), cast.validator, cast.member),
        9 => match referral
            .validations()
            .iter()
            .find(|r| r.is_pending())
            .map(|r| r.id)
        {
            Some(request) => referral.perform_answer_validation(
                request,
                cast.validator,
                ValidationVerdict::Validated,
                "checked",
            ),
            None => Ok(Vec::new()),
        },
        10 => referral.publish_answer(cast.member),
        11 => referral.close(cast.requester, "wrapped up"),
        12 => referral.reopen(cast.requester, "follow-up question"),
        13 => referral.change_urgency_level(cast.requester, UrgencyLevel::Urgent, "deadline"),
        14 => referral.update_title(cast.requester, "revised title", None),
        15 => referral.update_status(cast.requester, ReferralStatus::Sensitive),
        16 => referral.add_requester(
            cast.colleague,
            cast.requester,
            NotificationPreference::All,
        ),
        17 => referral.remove_requester(cast.colleague, cast.requester),
        18 => referral.remove_requester(cast.requester, cast.colleague),
        19 => referral.add_observer(cast.member, cast.requester, NotificationPreference::None),
        20 => referral.remove_observer(cast.member, cast.requester),
        _ => referral.update_topic(cast.requester, TopicId::new()),
    }
}

proptest! {
    #[test]
    fn random_sequences_preserve_core_invariants(
        ops in prop::collection::vec(0usize..22, 1..50)
    ) {
        let cast = Cast::new();
        let mut referral = Referral::new(
            ReferralId::new(),
            cast.requester,
            TopicId::new(),
            UrgencyLevel::Normal,
            "Record retention for inspection reports",
        );

        for op in ops {
            let before = referral.clone();
            let result = step(&mut referral, &cast, op);

            if result.is_err() {
                // A rejected transition must not leave partial side effects.
                prop_assert_eq!(&referral, &before);
            }

            // The last requester can never disappear.
            prop_assert!(referral.requesters().count() >= 1);

            // sent_at is set exactly when the referral has left Draft.
            prop_assert_eq!(
                referral.sent_at().is_some(),
                referral.state() != ReferralState::Draft
            );

            // History only grows.
            prop_assert!(referral.urgency_history().len() >= before.urgency_history().len());
            prop_assert!(referral.reopenings().len() >= before.reopenings().len());
        }
    }

    #[test]
    fn serde_roundtrip_preserves_the_aggregate(
        ops in prop::collection::vec(0usize..22, 0..15)
    ) {
        let cast = Cast::new();
        let mut referral = Referral::new(
            ReferralId::new(),
            cast.requester,
            TopicId::new(),
            UrgencyLevel::Normal,
            "Record retention for inspection reports",
        );
        for op in ops {
            let _ = step(&mut referral, &cast, op);
        }

        let json = serde_json::to_string(&referral).unwrap();
        let back: Referral = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(referral, back);
    }
}
