mod support;

use std::sync::Arc;
use std::time::Duration;

use factcheck_core::settings::{ReasoningSettings, RetrievalSettings, SessionSettings};
use factcheck_core::types::{CanonicalVerdict, Claim, Degradation, Stance};
use factcheck_core::Error;
use factcheck_engine::{Advocate, AdvocateConfig, Mediator, MediatorConfig, Session, SessionState};

use support::*;

const SUPPORTING: &str = "Passage [E1] reports about 1.1°C of warming.\nConfidence: 0.9\n((correct))";

#[tokio::test]
async fn climate_claim_resolves_to_supports() {
    let advocate_backend = FakeBackend::replying(SUPPORTING);
    let mediator_backend = FakeBackend::replying("The ipcc evidence is direct.\nDecisive: ipcc\n((mostly accurate))");
    let session = session(
        vec![advocate(climate_index("ipcc"), advocate_backend.clone())],
        mediator_backend.clone(),
        "climate-feedback",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    assert_eq!(result.verdict, CanonicalVerdict::Supports);
    assert_eq!(result.taxonomy, "climate-feedback");
    assert_eq!(result.mediator.raw_label, "mostly accurate");
    assert_eq!(result.mediator.decisive_sources, vec!["ipcc"]);
    assert_eq!(
        result.transitions,
        vec![
            SessionState::Created,
            SessionState::AdvocatesRunning,
            SessionState::Adjudicating,
            SessionState::Normalizing,
            SessionState::Complete,
        ]
    );

    let argument = &result.arguments()[0];
    assert_eq!(argument.stance, Stance::Supports);
    assert_eq!(argument.evidence.len(), 1);
    assert!(argument.evidence.entries[0].score >= 0.75);
    assert_eq!(argument.citations, vec![0]);
    assert_eq!(argument.raw_confidence, Some(0.9));
    assert_eq!(argument.cited_evidence().count(), 1);
    assert!(argument.degradation.is_none());

    assert_eq!(advocate_backend.calls(), 1);
    assert!(advocate_backend.systems()[0].contains(CLAIM));
    assert!(advocate_backend.prompts()[0].contains("[E1]"));
    assert!(mediator_backend.prompts()[0].contains("source: ipcc"));
}

#[tokio::test]
async fn empty_retrieval_skips_the_backend() {
    let advocate_backend = FakeBackend::replying(SUPPORTING);
    let mediator_backend = FakeBackend::replying("((not_enough_information))");
    let session = session(
        vec![advocate(glacier_index("nsidc"), advocate_backend.clone())],
        mediator_backend.clone(),
        "advocate-mediator",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    assert_eq!(advocate_backend.calls(), 0);
    let argument = &result.arguments()[0];
    assert_eq!(argument.stance, Stance::InsufficientEvidence);
    assert!(argument.evidence.is_empty());
    assert_eq!(argument.degradation, Some(Degradation::RetrievalEmpty));
    assert!(mediator_backend.prompts()[0].contains("Stance: insufficient-evidence (no usable evidence"));
    assert_eq!(result.verdict, CanonicalVerdict::InsufficientEvidence);
}

#[tokio::test]
async fn unmapped_mediator_label_is_surfaced() {
    let session = session(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        FakeBackend::replying("((mostly_true))"),
        "climate-feedback",
    );

    match session.run(&Claim::new(CLAIM)).await {
        Err(Error::UnmappedVerdict { label, taxonomy }) => {
            assert_eq!(label, "mostly_true");
            assert_eq!(taxonomy, "climate-feedback");
        }
        other => panic!("expected unmapped verdict, got {other:?}"),
    }
}

#[tokio::test]
async fn disagreeing_advocates_reach_the_mediator_unaltered() {
    let refuting = "Passage [E1] is a single estimate and the range includes values below 1°C.\n((incorrect))";
    let mediator_backend = FakeBackend::replying("Both sides considered.\nDecisive: ipcc, skeptic\n((incorrect))");
    let session = session(
        vec![
            advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING)),
            advocate(climate_index("skeptic"), FakeBackend::replying(refuting)),
        ],
        mediator_backend.clone(),
        "advocate-mediator",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    let stances: Vec<Stance> = result.arguments().iter().map(|a| a.stance).collect();
    assert_eq!(stances, vec![Stance::Supports, Stance::Refutes]);
    assert_eq!(result.arguments()[0].rationale, SUPPORTING);
    assert_eq!(result.arguments()[1].rationale, refuting);

    let prompt = &mediator_backend.prompts()[0];
    assert!(prompt.contains("source: ipcc)\nStance: supports"));
    assert!(prompt.contains("source: skeptic)\nStance: refutes"));
    assert!(prompt.contains(refuting));
    assert_eq!(result.verdict, CanonicalVerdict::Refutes);
    assert_eq!(result.mediator.decisive_sources, vec!["ipcc", "skeptic"]);
}

#[tokio::test]
async fn arguments_keep_configuration_order() {
    let slow = Arc::new(
        FakeBackend::new(|_, _| Ok(SUPPORTING.to_string())).with_delay(Duration::from_millis(40)),
    );
    let session = session(
        vec![advocate(climate_index("slow"), slow), advocate(climate_index("fast"), FakeBackend::replying(SUPPORTING))],
        FakeBackend::replying("((correct))"),
        "advocate-mediator",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");
    let order: Vec<&str> = result.arguments().iter().map(|a| a.source_id.as_str()).collect();
    assert_eq!(order, vec!["slow", "fast"]);
}

#[tokio::test]
async fn failing_advocates_still_reach_the_mediator() {
    let mediator_backend = FakeBackend::replying("Nobody had evidence.\n((not_enough_information))");
    let session = session(
        vec![
            advocate(climate_index("ipcc"), FakeBackend::failing("connection refused")),
            advocate(climate_index("nasa"), FakeBackend::failing("connection refused")),
        ],
        mediator_backend.clone(),
        "advocate-mediator",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    assert_eq!(mediator_backend.calls(), 1);
    assert_eq!(result.arguments().len(), 2);
    for argument in result.arguments() {
        assert_eq!(argument.stance, Stance::InsufficientEvidence);
        match &argument.degradation {
            Some(Degradation::BackendFailure { message }) => assert!(message.contains("connection refused")),
            other => panic!("unexpected degradation {other:?}"),
        }
        assert_eq!(argument.evidence.len(), 1);
    }
    assert!(mediator_backend.prompts()[0].contains("Evidence passages: 1"));
    assert_eq!(result.verdict, CanonicalVerdict::InsufficientEvidence);
}

#[tokio::test]
async fn slow_advocate_times_out() {
    let stuck = Arc::new(FakeBackend::new(|_, _| Ok(SUPPORTING.to_string())).with_delay(Duration::from_secs(5)));
    let settings = SessionSettings { advocate_timeout_ms: 50, ..SessionSettings::default() };
    let session = Session::new(
        vec![advocate(climate_index("stuck"), stuck), advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        mediator(FakeBackend::replying("((correct))")),
        mapper(),
        settings,
    )
    .expect("session");

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    assert_eq!(result.arguments()[0].degradation, Some(Degradation::TimedOut { after_ms: 50 }));
    assert_eq!(result.arguments()[0].evidence.len(), 1);
    assert_eq!(result.arguments()[0].stance, Stance::InsufficientEvidence);
    assert_eq!(result.arguments()[1].stance, Stance::Supports);
    assert_eq!(result.verdict, CanonicalVerdict::Supports);
}

#[tokio::test]
async fn cancellation_stops_before_the_mediator() {
    let stuck = Arc::new(FakeBackend::new(|_, _| Ok(SUPPORTING.to_string())).with_delay(Duration::from_secs(10)));
    let mediator_backend = FakeBackend::replying("((correct))");
    let session = session(vec![advocate(climate_index("ipcc"), stuck.clone())], mediator_backend.clone(), "advocate-mediator");

    let outcome = session
        .run_until(&Claim::new(CLAIM), tokio::time::sleep(Duration::from_millis(20)))
        .await;

    assert!(matches!(outcome, Err(Error::Cancelled)));
    assert_eq!(stuck.calls(), 1);
    assert_eq!(mediator_backend.calls(), 0);
}

#[tokio::test]
async fn uncancelled_run_until_completes() {
    let session = session(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        FakeBackend::replying("((correct))"),
        "advocate-mediator",
    );
    let result = session
        .run_until(&Claim::new(CLAIM), std::future::pending::<()>())
        .await
        .expect("verified");
    assert_eq!(result.verdict, CanonicalVerdict::Supports);
}

#[test]
fn session_requires_advocates_and_known_taxonomy() {
    let err = Session::new(Vec::new(), mediator(FakeBackend::replying("")), mapper(), SessionSettings::default());
    assert!(matches!(err, Err(Error::Configuration(_))));

    let settings = SessionSettings { verdict_taxonomy: "politifact".into(), ..SessionSettings::default() };
    let err = Session::new(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(""))],
        mediator(FakeBackend::replying("")),
        mapper(),
        settings,
    );
    assert!(matches!(err, Err(Error::Configuration(_))));
}

#[test]
fn advocate_rejects_invalid_settings() {
    let mut config = advocate_config();
    config.retrieval = RetrievalSettings::new(0, 0.75);
    let err = Advocate::new(climate_index("ipcc"), FakeBackend::replying(""), mapper(), config);
    assert!(matches!(err, Err(Error::Configuration(_))));

    let config = AdvocateConfig { stance_taxonomy: "unknown".into(), ..advocate_config() };
    let err = Advocate::new(climate_index("ipcc"), FakeBackend::replying(""), mapper(), config);
    assert!(matches!(err, Err(Error::Configuration(_))));

    let config = MediatorConfig {
        reasoning: ReasoningSettings { max_attempts: 0, ..ReasoningSettings::default() },
        ..MediatorConfig::default()
    };
    assert!(matches!(Mediator::new(FakeBackend::replying(""), config), Err(Error::Configuration(_))));
}

#[tokio::test]
async fn mediator_requires_arguments() {
    let backend = FakeBackend::replying("((correct))");
    let err = mediator(backend.clone()).adjudicate(&Claim::new(CLAIM), &[]).await;
    assert!(matches!(err, Err(Error::Configuration(_))));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn unparseable_advocate_degrades_after_retries() {
    let backend = FakeBackend::replying("I am not sure what to make of this.");
    let argument = advocate(climate_index("ipcc"), backend.clone()).argue(&Claim::new(CLAIM)).await.expect("argument");

    assert_eq!(backend.calls(), ReasoningSettings::default().max_attempts);
    assert_eq!(argument.stance, Stance::InsufficientEvidence);
    assert_eq!(argument.degradation, Some(Degradation::Unparseable));
    assert_eq!(argument.rationale, "I am not sure what to make of this.");
    assert_eq!(argument.evidence.len(), 1);
}

#[tokio::test]
async fn retry_recovers_a_parseable_response() {
    let backend = FakeBackend::scripted(&["Let me think.", "Passage [E1] says otherwise. ((incorrect))"]);
    let argument = advocate(climate_index("ipcc"), backend.clone()).argue(&Claim::new(CLAIM)).await.expect("argument");

    assert_eq!(backend.calls(), 2);
    assert_eq!(argument.stance, Stance::Refutes);
    assert_eq!(argument.raw_label.as_deref(), Some("incorrect"));
}

#[tokio::test]
async fn unknown_stance_label_is_insufficient() {
    let backend = FakeBackend::replying("Partly right [E1]. ((partly))");
    let argument = advocate(climate_index("ipcc"), backend).argue(&Claim::new(CLAIM)).await.expect("argument");

    assert_eq!(argument.stance, Stance::InsufficientEvidence);
    assert_eq!(argument.degradation, Some(Degradation::AmbiguousStance { label: "partly".into() }));
    assert!(argument.citations.is_empty());
}

#[tokio::test]
async fn unparseable_mediator_fails_the_session() {
    let mediator_backend = FakeBackend::replying("The advocates make interesting points.");
    let session = session(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        mediator_backend.clone(),
        "advocate-mediator",
    );

    let outcome = session.run(&Claim::new(CLAIM)).await;
    assert!(matches!(outcome, Err(Error::MediatorFailure(_))));
    assert_eq!(mediator_backend.calls(), ReasoningSettings::default().max_attempts);
}

#[tokio::test]
async fn mediator_backend_error_is_a_mediator_failure() {
    let session = session(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        FakeBackend::failing("model unloaded"),
        "advocate-mediator",
    );
    match session.run(&Claim::new(CLAIM)).await {
        Err(Error::MediatorFailure(message)) => assert!(message.contains("model unloaded")),
        other => panic!("expected mediator failure, got {other:?}"),
    }
}

#[tokio::test]
async fn thinking_spans_are_ignored() {
    let mut config = advocate_config();
    config.reasoning.thinking_token = Some("think".into());
    let backend = FakeBackend::replying("<think>Maybe ((incorrect)) [E1]?</think>The passage supports it. ((correct))");
    let advocate = Advocate::new(climate_index("ipcc"), backend, mapper(), config).expect("advocate");

    let argument = advocate.argue(&Claim::new(CLAIM)).await.expect("argument");
    assert_eq!(argument.stance, Stance::Supports);
    assert!(!argument.rationale.contains("<think>"));
    assert!(argument.citations.is_empty());
}

#[test]
fn state_transitions_only_move_forward() {
    use SessionState::*;
    assert!(Created.can_advance_to(AdvocatesRunning));
    assert!(Normalizing.can_advance_to(Complete));
    assert!(Adjudicating.can_advance_to(Failed));
    assert!(!Adjudicating.can_advance_to(AdvocatesRunning));
    assert!(!Complete.can_advance_to(Failed));
    assert!(!Created.can_advance_to(Complete));
    assert!(Complete.is_terminal() && Failed.is_terminal());
}

#[tokio::test]
async fn result_serializes() {
    let session = session(
        vec![advocate(climate_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        FakeBackend::replying("((correct))"),
        "advocate-mediator",
    );
    let result = session.run(&Claim::new(CLAIM).with_external_id("cf-1")).await.expect("verified");
    let json = serde_json::to_value(&result).expect("json");

    assert_eq!(json["verdict"], "supports");
    assert_eq!(json["claim"]["external_id"], "cf-1");
    assert_eq!(json["mediator"]["considered"][0]["stance"], "supports");
    assert_eq!(json["transitions"][4], "complete");
}

#[tokio::test]
async fn backend_outage_keeps_retrieved_evidence() {
    let argument = advocate(climate_index("ipcc"), FakeBackend::failing("outage"))
        .argue(&Claim::new(CLAIM))
        .await
        .expect("argument");

    assert_eq!(argument.stance, Stance::InsufficientEvidence);
    assert_eq!(argument.evidence.len(), 1);
    assert!(argument.evidence.entries[0].chunk.content.contains("1.1°C"));
    match argument.degradation {
        Some(Degradation::BackendFailure { message }) => assert!(message.contains("outage")),
        other => panic!("unexpected degradation {other:?}"),
    }
}

#[tokio::test]
async fn embedding_failure_degrades_inside_the_session() {
    let mediator_backend = FakeBackend::replying("((not_enough_information))");
    let session = session(
        vec![advocate(flaky_index("ipcc"), FakeBackend::replying(SUPPORTING))],
        mediator_backend.clone(),
        "advocate-mediator",
    );

    let result = session.run(&Claim::new(CLAIM)).await.expect("verified");

    let argument = &result.arguments()[0];
    assert!(argument.evidence.is_empty());
    match &argument.degradation {
        Some(Degradation::BackendFailure { message }) => assert!(message.contains("embedding service down")),
        other => panic!("unexpected degradation {other:?}"),
    }
    assert_eq!(mediator_backend.calls(), 1);
}

#[tokio::test]
async fn verdict_stated_first_is_the_stance() {
    let reply = "((correct)) The passage [E1] confirms it; calling it ((incorrect)) would ignore the data.";
    let argument = advocate(climate_index("ipcc"), FakeBackend::replying(reply))
        .argue(&Claim::new(CLAIM))
        .await
        .expect("argument");

    assert_eq!(argument.stance, Stance::Supports);
    assert_eq!(argument.raw_label.as_deref(), Some("correct"));
}
