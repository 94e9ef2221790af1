//! End-to-end session behaviour against an in-memory mutation service:
//! submission, caching, found/done progress and the status line.

mod common;

use std::time::Duration;

use common::{hello_world, session, two_sites, ScriptedApi};
use text_mutator_client::progress::StatusClass;
use text_mutator_client::*;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_text_creates_no_request() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    s.on_text_changed("");

    assert_eq!(s.on_submit().unwrap_err(), ValidationError::EmptyText);
    assert!(s.active_request().is_none());
    assert_eq!(s.status(), Status::Prompt);
    tokio::task::yield_now().await;
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_whitespace_text_creates_no_request() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    s.on_text_changed("   \n ");
    assert!(!s.can_submit());
    assert!(s.on_submit().is_err());
    assert!(s.cache().is_empty());
}

#[tokio::test]
async fn test_rejected_submit_keeps_previous_display() {
    let api = ScriptedApi::new();
    api.respond("Hello, world!", hello_world());
    let mut s = session(&api);
    s.on_text_changed("Hello, world!");
    s.on_submit().unwrap();
    s.settle().await;
    s.on_found().unwrap();

    s.on_text_changed("");
    assert!(s.on_submit().is_err());
    assert_eq!(s.active_request().unwrap().text(), "Hello, world!");
    assert_eq!(s.found(), 1, "a rejected submit must not reset progress");
}

#[tokio::test]
async fn test_submitted_payload_matches_wire_contract() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    s.on_text_changed("Their going");
    s.on_option_edit(OptionField::Seed, "17".into()).unwrap();
    s.on_option_edit(OptionField::AllowSwaps, false.into()).unwrap();
    s.on_submit().unwrap();
    s.settle().await;

    let seen = api.seen();
    assert_eq!(seen.len(), 1);
    let body = serde_json::to_value(&seen[0]).unwrap();
    assert_eq!(body["text"], "Their going");
    assert_eq!(body["config"]["seed"], 17);
    assert_eq!(body["config"]["allowSwaps"], false);
    assert_eq!(body["config"]["mutationRate"], 0.05);
}

// ---------------------------------------------------------------------------
// Caching and fingerprints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_identical_back_to_back_submits_issue_one_call() {
    let api = ScriptedApi::with_delay(Duration::from_millis(10));
    let mut s = session(&api);
    s.on_text_changed("same text");
    s.on_submit().unwrap();
    s.on_submit().unwrap();
    s.settle().await;
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_toggle_and_revert_hits_cache() {
    let api = ScriptedApi::new();
    api.respond("Hello, world!", hello_world());
    let mut s = session(&api);
    s.on_text_changed("Hello, world!");
    s.on_submit().unwrap();
    s.settle().await;

    s.on_option_edit(OptionField::AllowHomophones, false.into()).unwrap();
    s.on_option_edit(OptionField::AllowHomophones, true.into()).unwrap();
    let handle = s.on_submit().unwrap();

    assert!(handle.state().response().is_some(), "served from cache");
    assert_eq!(api.calls(), 1);
    assert_eq!(s.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_changed_option_is_a_new_fingerprint() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    s.on_text_changed("some words here");
    s.on_submit().unwrap();
    s.settle().await;

    s.on_option_edit(OptionField::MutationRate, "0.2".into()).unwrap();
    s.on_submit().unwrap();
    s.settle().await;
    assert_eq!(api.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_earlier_response_never_replaces_newer_display() {
    let api = ScriptedApi::with_delay(Duration::from_millis(100));
    api.respond("first", two_sites("first"));
    api.respond("second", hello_world());
    let mut s = session(&api);

    s.on_text_changed("first");
    let mut first = s.on_submit().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    s.on_text_changed("second");
    s.on_submit().unwrap();

    // The first call completes while the second is still pending.
    first.settled().await;
    assert_eq!(s.status(), Status::Loading);
    assert_eq!(s.active_request().unwrap().text(), "second");

    s.settle().await;
    assert_eq!(s.displayed_response().unwrap().mutated_text, "Hello world!");
    assert_eq!(s.status(), Status::Progress { found: 0, total: 1 });
}

#[tokio::test]
async fn test_failed_request_shows_error_and_is_not_retried() {
    let api = ScriptedApi::new();
    api.fail("broken", FetchError::Http { status: 400, url: "/mutate".into(), body: "bad".into() });
    let mut s = session(&api);
    s.on_text_changed("broken");
    s.on_submit().unwrap();
    s.settle().await;

    assert!(matches!(s.status(), Status::Failed(ref e) if e.contains("400")));
    assert_eq!(s.on_done(), Err(ProgressError::PrematureCompletion));

    s.on_submit().unwrap();
    s.settle().await;
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_active_request() {
    let api = ScriptedApi::with_delay(Duration::from_secs(5));
    let mut s = session(&api);
    s.on_text_changed("never mind");
    s.on_submit().unwrap();

    assert!(s.cancel());
    assert_eq!(s.settle().await, QueryState::Failed(FetchError::Cancelled));
    assert!(matches!(s.status(), Status::Failed(_)));
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hello_world_scenario() {
    let api = ScriptedApi::new();
    api.respond("Hello, world!", hello_world());
    let mut s = session(&api);
    s.on_text_changed("Hello, world!");
    s.on_submit().unwrap();
    s.settle().await;

    assert_eq!(s.status().to_string(), "0/1 mutations found.");
    assert!(!s.is_done());

    s.on_found().unwrap();
    assert!(s.status().to_string().to_lowercase().contains("all mutations found"));
    assert_eq!(s.status().class(), StatusClass::Complete);
    assert!(s.is_done());
}

#[tokio::test]
async fn test_point_sites_from_service_are_playable() {
    // Swaps and removed punctuation come back with `start == end`.
    let response: MutationResponse = serde_json::from_str(
        r#"{"mutated_text":"Hello world!","mutations":[
            {"start":5,"end":5,"type":"RemovePunctuation"},
            {"start":7,"end":7,"type":"SwapLetters"}]}"#,
    )
    .unwrap();
    let api = ScriptedApi::new();
    api.respond("Hello, wrold!", response);
    let mut s = session(&api);
    s.on_text_changed("Hello, wrold!");
    s.on_submit().unwrap();

    assert!(matches!(s.settle().await, QueryState::Success(_)));
    assert_eq!(s.status(), Status::Progress { found: 0, total: 2 });
    assert_eq!(s.on_found(), Ok(1));
    s.on_done().unwrap();
    assert_eq!(s.status(), Status::Complete);

    colored::control::set_override(false);
    let revealed = text_mutator_client::ui::reveal(&s.displayed_response().unwrap());
    assert_eq!(revealed, "Hello␣[removed punctuation]wo[swapped letters]rld!");
}

#[tokio::test]
async fn test_found_never_exceeds_total() {
    let api = ScriptedApi::new();
    api.respond("ab cd", two_sites("ab cd"));
    let mut s = session(&api);
    s.on_text_changed("ab cd");
    s.on_submit().unwrap();
    s.settle().await;

    for _ in 0..5 {
        s.on_found().unwrap();
    }
    assert_eq!(s.found(), 2);
}

#[tokio::test]
async fn test_no_mutations_reads_too_short() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    s.on_text_changed("Hi");
    s.on_submit().unwrap();
    s.settle().await;

    assert_eq!(s.status(), Status::TooShort);
    s.on_found().unwrap();
    assert_eq!(s.found(), 0);
    assert_eq!(s.status(), Status::TooShort);
}

#[tokio::test]
async fn test_new_submission_resets_found_even_after_done() {
    let api = ScriptedApi::new();
    api.respond("ab cd", two_sites("ab cd"));
    api.respond("ef gh", two_sites("ef gh"));
    let mut s = session(&api);
    s.on_text_changed("ab cd");
    s.on_submit().unwrap();
    s.settle().await;
    s.on_done().unwrap();
    assert!(s.is_done());

    s.on_text_changed("ef gh");
    s.on_submit().unwrap();
    assert_eq!(s.found(), 0, "reset before the new response arrives");
    s.settle().await;
    assert_eq!(s.status(), Status::Progress { found: 0, total: 2 });
}

#[tokio::test]
async fn test_mark_done_before_response_is_premature() {
    let api = ScriptedApi::new();
    let mut s = session(&api);
    assert_eq!(s.on_done(), Err(ProgressError::PrematureCompletion));
    assert_eq!(s.found(), 0);

    s.on_text_changed("pending text");
    s.on_submit().unwrap();
    assert_eq!(s.on_done(), Err(ProgressError::PrematureCompletion));
    assert_eq!(s.found(), 0);
}

#[tokio::test]
async fn test_done_reveals_all() {
    let api = ScriptedApi::new();
    api.respond("ab cd", two_sites("ab cd"));
    let mut s = session(&api);
    s.on_text_changed("ab cd");
    s.on_submit().unwrap();
    s.settle().await;
    s.on_found().unwrap();
    s.on_done().unwrap();
    assert_eq!(s.found(), 2);
    assert_eq!(s.status(), Status::Complete);
}

// ---------------------------------------------------------------------------
// Terminal front end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_terminal_script_runs_full_session() {
    colored::control::set_override(false);
    let api = ScriptedApi::new();
    api.respond("Hello, world!", hello_world());
    let mut s = session(&api);

    let script = "Hello, world!\n:mutate\n:f\n:status\n:q\n:mutate\n";
    let mut out = Vec::new();
    text_mutator_client::ui::run(&mut s, script.as_bytes(), &mut out, None)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Hello world!"), "mutated text shown: {printed}");
    assert!(printed.contains("0/1 mutations found."), "{printed}");
    assert!(printed.contains("All mutations found!"), "{printed}");
    assert_eq!(api.calls(), 1, "commands after :q are not run");
}

#[tokio::test]
async fn test_terminal_reports_rejected_edits() {
    colored::control::set_override(false);
    let api = ScriptedApi::new();
    let mut s = session(&api);

    let script = ":set mutationRate lots\n:mutate\n:d\n:health\n";
    let mut out = Vec::new();
    text_mutator_client::ui::run(&mut s, script.as_bytes(), &mut out, None)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("not a valid number"), "{printed}");
    assert!(printed.contains("text is empty"), "{printed}");
    assert!(printed.contains("cannot complete"), "{printed}");
    assert!(printed.contains("Backend: Checking..."), "{printed}");
    assert_eq!(s.live_options(), &MutationOptions::default());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_cancels_while_request_is_in_flight() {
    colored::control::set_override(false);
    let api = ScriptedApi::with_delay(Duration::from_secs(5));
    let mut s = session(&api);

    let script = "slow text\n:mutate\n:status\n:cancel\n";
    let mut out = Vec::new();
    text_mutator_client::ui::run(&mut s, script.as_bytes(), &mut out, None)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Mutating...").count(), 2, "{printed}");
    assert!(printed.contains("cancelled"), "{printed}");
    assert!(!printed.contains("nothing in flight"), "{printed}");
    assert!(printed.contains("Error! request was cancelled"), "{printed}");
}

#[tokio::test(start_paused = true)]
async fn test_terminal_shows_response_arriving_after_input_ends() {
    colored::control::set_override(false);
    let api = ScriptedApi::with_delay(Duration::from_secs(1));
    api.respond("Hello, world!", hello_world());
    let mut s = session(&api);

    let mut out = Vec::new();
    text_mutator_client::ui::run(&mut s, ":text Hello, world!\n:mutate\n".as_bytes(), &mut out, None)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Hello world!"), "{printed}");
    assert!(printed.contains("0/1 mutations found."), "{printed}");
}
