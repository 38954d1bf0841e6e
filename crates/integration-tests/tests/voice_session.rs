//! Integration tests for the voice session state machine.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shopdesk_agent::voice::{
    ConnectionState, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, ResponseModality, SessionEvent,
    VoiceError, VoiceSession, encode_pcm16,
};
use shopdesk_agent::{AppContext, CatalogService, Shop, SimulatedSupportDesk};
use shopdesk_core::{CustomerId, Language, ProductId};
use shopdesk_integration_tests::{
    FakeCapture, FakePlayback, FakeTransport, demo_context, function_call, voice_config,
};

struct Rig {
    context: AppContext,
    transport: Arc<FakeTransport>,
    capture: Arc<FakeCapture>,
    playback: Arc<FakePlayback>,
    voice: VoiceSession,
}

fn rig_with(context: AppContext, transport: Arc<FakeTransport>, capture: Arc<FakeCapture>) -> Rig {
    let playback = FakePlayback::new();
    let voice = VoiceSession::new(
        context.clone(),
        Some(voice_config()),
        Arc::clone(&transport) as _,
        Arc::clone(&capture) as _,
        Arc::clone(&playback) as _,
    );
    Rig {
        context,
        transport,
        capture,
        playback,
        voice,
    }
}

fn rig() -> Rig {
    rig_with(demo_context(), FakeTransport::new(), FakeCapture::new())
}

/// Started and opened session.
async fn connected() -> Rig {
    let mut rig = rig();
    rig.voice.start().await.unwrap();
    rig.voice.handle_event(SessionEvent::Opened);
    assert_eq!(rig.voice.state(), ConnectionState::Connected);
    rig
}

/// Base64 PCM fragment lasting `seconds` at the output rate.
fn fragment(seconds: f64) -> SessionEvent {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples = (seconds * f64::from(OUTPUT_SAMPLE_RATE)) as usize;
    SessionEvent::Audio(encode_pcm16(&vec![0.1; samples]))
}

// =============================================================================
// Start and Stop
// =============================================================================

#[tokio::test]
async fn test_start_without_credentials_fails_fast() {
    let transport = FakeTransport::new();
    let capture = FakeCapture::new();
    let playback = FakePlayback::new();
    let mut voice = VoiceSession::new(
        demo_context(),
        None,
        Arc::clone(&transport) as _,
        Arc::clone(&capture) as _,
        Arc::clone(&playback) as _,
    );

    let err = voice.start().await.unwrap_err();

    assert_eq!(err, VoiceError::MissingCredentials);
    assert_eq!(voice.state(), ConnectionState::Error);
    assert_eq!(voice.last_error(), Some(&VoiceError::MissingCredentials));
    assert_eq!(capture.starts(), 0);
    assert!(!playback.is_open());
    assert_eq!(transport.connects(), 0);
}

#[tokio::test]
async fn test_start_opens_everything_with_voice_config() {
    let mut rig = rig();

    rig.voice.start().await.unwrap();

    assert_eq!(rig.voice.state(), ConnectionState::Connecting);
    assert!(rig.capture.is_open());
    assert!(rig.playback.is_open());

    let config = rig.transport.last_config().unwrap();
    assert_eq!(config.response_modality, ResponseModality::Audio);
    assert_eq!(config.input_sample_rate, INPUT_SAMPLE_RATE);
    assert_eq!(config.output_sample_rate, OUTPUT_SAMPLE_RATE);
    assert_eq!(config.voice_name, "Puck");
    assert_eq!(config.tools.len(), 5);
    assert!(config.system_prompt.contains("live voice call"));
    assert!(config.system_prompt.contains("Alex Rivera"));

    rig.voice.handle_event(SessionEvent::Opened);
    assert_eq!(rig.voice.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_start_while_active_is_noop() {
    let mut rig = connected().await;

    rig.voice.start().await.unwrap();

    assert_eq!(rig.transport.connects(), 1);
    assert_eq!(rig.capture.starts(), 1);
    assert_eq!(rig.voice.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_stop_releases_everything() {
    let mut rig = connected().await;
    let session = rig.transport.session().unwrap();

    rig.voice.stop();

    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert!(!rig.capture.is_open());
    assert!(!rig.playback.is_open());
    assert!(session.is_closed());
}

#[tokio::test]
async fn test_stop_is_safe_in_any_state() {
    let mut rig = rig();
    rig.voice.stop();
    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);

    rig.voice.start().await.unwrap();
    rig.voice.stop();
    rig.voice.stop();
    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert_eq!(rig.capture.stops(), 1);
}

#[tokio::test]
async fn test_denied_microphone_opens_nothing() {
    let mut rig = rig_with(demo_context(), FakeTransport::new(), FakeCapture::denied());

    let err = rig.voice.start().await.unwrap_err();

    assert!(matches!(err, VoiceError::Capture(_)));
    assert_eq!(rig.voice.state(), ConnectionState::Error);
    assert!(!rig.playback.is_open());
    assert_eq!(rig.transport.connects(), 0);
}

#[tokio::test]
async fn test_connect_failure_releases_audio() {
    let transport = FakeTransport::failing(VoiceError::Unauthorized("401".to_string()));
    let mut rig = rig_with(demo_context(), transport, FakeCapture::new());

    let err = rig.voice.start().await.unwrap_err();

    assert!(matches!(err, VoiceError::Unauthorized(_)));
    assert_eq!(rig.voice.state(), ConnectionState::Error);
    assert!(!rig.capture.is_open());
    assert_eq!(rig.capture.stops(), 1);
    assert!(!rig.playback.is_open());
    assert_ne!(err.user_message(), VoiceError::InvalidRequest(String::new()).user_message());
}

#[tokio::test]
async fn test_restart_after_error() {
    let mut rig = connected().await;
    rig.voice.handle_event(SessionEvent::Error("socket reset".to_string()));
    assert_eq!(rig.voice.state(), ConnectionState::Error);

    rig.voice.start().await.unwrap();

    assert_eq!(rig.voice.state(), ConnectionState::Connecting);
    assert_eq!(rig.transport.connects(), 2);
    assert!(rig.voice.last_error().is_none());
}

// =============================================================================
// Event Loop
// =============================================================================

#[tokio::test]
async fn test_run_until_service_closes() {
    let mut rig = rig();
    rig.voice.start().await.unwrap();
    let session = rig.transport.session().unwrap();

    assert!(rig.transport.emit(SessionEvent::Opened).await);
    assert!(rig.transport.emit(SessionEvent::Closed).await);
    rig.voice.run().await;

    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert!(session.is_closed());
    assert!(!rig.capture.is_open());
}

#[tokio::test]
async fn test_service_error_is_classified() {
    let mut rig = rig();
    rig.voice.start().await.unwrap();

    rig.transport.emit(SessionEvent::Opened).await;
    rig.transport
        .emit(SessionEvent::Error("401: API key not valid".to_string()))
        .await;
    rig.voice.run().await;

    assert_eq!(rig.voice.state(), ConnectionState::Error);
    assert!(matches!(
        rig.voice.last_error(),
        Some(VoiceError::Unauthorized(_))
    ));
    assert!(!rig.playback.is_open());
}

#[tokio::test]
async fn test_lost_event_stream_is_transport_error() {
    let mut rig = rig();
    rig.voice.start().await.unwrap();

    rig.transport.emit(SessionEvent::Opened).await;
    rig.transport.hang_up();
    rig.voice.run().await;

    assert_eq!(rig.voice.state(), ConnectionState::Error);
    assert!(matches!(
        rig.voice.last_error(),
        Some(VoiceError::Transport(_))
    ));
}

// =============================================================================
// Playback Scheduling
// =============================================================================

#[tokio::test]
async fn test_fragments_play_back_to_back() {
    let mut rig = connected().await;
    rig.playback.set_time(2.0);

    rig.voice.handle_event(fragment(0.5));
    rig.voice.handle_event(fragment(0.25));

    let played = rig.playback.played();
    assert_eq!(played.len(), 2);
    assert!((played[0].start_at - 2.0).abs() < 1e-9);
    assert!((played[1].start_at - 2.5).abs() < 1e-9);
    assert!((rig.voice.scheduler().cursor() - 2.75).abs() < 1e-9);
}

#[tokio::test]
async fn test_interruption_stops_scheduled_fragments() {
    let mut rig = connected().await;
    rig.playback.set_time(1.0);
    rig.voice.handle_event(fragment(0.5));
    rig.voice.handle_event(fragment(0.5));
    let first_two: Vec<_> = rig.playback.played().iter().map(|p| p.id).collect();

    rig.playback.set_time(1.2);
    rig.voice.handle_event(SessionEvent::Interrupted);

    assert_eq!(rig.playback.stopped(), first_two);
    assert_eq!(rig.voice.scheduler().pending(), 0);
    assert!((rig.voice.scheduler().cursor() - 1.2).abs() < 1e-9);

    rig.voice.handle_event(fragment(0.5));
    let next = rig.playback.played()[2];
    assert!((next.start_at - 1.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_undecodable_audio_is_skipped() {
    let mut rig = connected().await;

    rig.voice.handle_event(SessionEvent::Audio("***".to_string()));

    assert!(rig.playback.played().is_empty());
    assert_eq!(rig.voice.state(), ConnectionState::Connected);
}

// =============================================================================
// Tools
// =============================================================================

#[tokio::test]
async fn test_tool_calls_act_on_shared_cart() {
    let mut rig = connected().await;
    let session = rig.transport.session().unwrap();

    rig.voice.handle_event(SessionEvent::ToolCalls(vec![
        function_call("fc_1", "add_to_cart", json!({"product_name": "Slim Fit Jeans", "quantity": 2})),
        function_call("fc_2", "place_order", json!({})),
    ]));
    rig.voice.wait_for_tools().await;

    let results = session.tool_results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].len(), 2);
    assert_eq!(results[0][0].id, "fc_1");
    assert_eq!(results[0][0].response["success"], true);
    assert_eq!(results[0][1].response["data"]["total"], "$100.00");

    let customer = rig.context.shop().active_customer();
    assert_eq!(
        rig.context.catalog().order_history(customer)[0].items[0].product_id,
        ProductId::new(2)
    );
    assert!(rig.context.shop().cart().is_empty());
}

#[tokio::test]
async fn test_tool_calls_ignored_before_open() {
    let mut rig = rig();
    rig.voice.start().await.unwrap();
    let session = rig.transport.session().unwrap();

    rig.voice.handle_event(SessionEvent::ToolCalls(vec![function_call(
        "fc_1",
        "add_to_cart",
        json!({"product_name": "Knit Beanie"}),
    )]));
    rig.voice.wait_for_tools().await;

    assert!(session.tool_results().is_empty());
    assert!(rig.context.shop().cart().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_tool_results_are_dropped() {
    let shop = Shop::new(CatalogService::demo(), CustomerId::new(1));
    let support = Arc::new(SimulatedSupportDesk::new(Duration::from_millis(800)));
    let context = AppContext::new(shop, support, Language::English);
    let mut rig = rig_with(context, FakeTransport::new(), FakeCapture::new());
    rig.voice.start().await.unwrap();
    rig.voice.handle_event(SessionEvent::Opened);
    let session = rig.transport.session().unwrap();

    rig.voice.handle_event(SessionEvent::ToolCalls(vec![function_call(
        "fc_1",
        "escalate_issue",
        json!({"reason": "parcel arrived damaged"}),
    )]));
    rig.voice.stop();
    rig.voice.wait_for_tools().await;

    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert!(session.tool_results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tool_results_dropped_after_customer_switch() {
    let shop = Shop::new(CatalogService::demo(), CustomerId::new(1));
    let support = Arc::new(SimulatedSupportDesk::new(Duration::from_millis(800)));
    let context = AppContext::new(shop, support, Language::English);
    let mut rig = rig_with(context, FakeTransport::new(), FakeCapture::new());
    rig.voice.start().await.unwrap();
    rig.voice.handle_event(SessionEvent::Opened);
    let session = rig.transport.session().unwrap();

    rig.voice.handle_event(SessionEvent::ToolCalls(vec![function_call(
        "fc_1",
        "escalate_issue",
        json!({"reason": "wrong size delivered"}),
    )]));
    rig.context.switch_customer(CustomerId::new(2)).unwrap();
    rig.voice.wait_for_tools().await;

    assert!(rig.voice.is_stale());
    assert!(session.tool_results().is_empty());
}

// =============================================================================
// Customer and Language Switches
// =============================================================================

#[tokio::test]
async fn test_event_after_customer_switch_ends_session() {
    let mut rig = connected().await;
    let session = rig.transport.session().unwrap();

    rig.context.switch_customer(CustomerId::new(2)).unwrap();
    rig.voice.handle_event(fragment(0.5));

    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert!(rig.voice.last_error().is_none());
    assert!(rig.playback.played().is_empty());
    assert!(session.is_closed());
    assert!(!rig.capture.is_open());

    rig.voice.start().await.unwrap();
    assert!(!rig.voice.is_stale());
    let prompt = rig.transport.last_config().unwrap().system_prompt;
    assert!(prompt.contains("Jordan Lee"));
}

#[tokio::test]
async fn test_run_ends_when_language_changes() {
    let mut rig = rig();
    rig.voice.start().await.unwrap();
    rig.transport.emit(SessionEvent::Opened).await;
    let session = rig.transport.session().unwrap();

    let context = rig.context.clone();
    tokio::join!(rig.voice.run(), async move {
        tokio::task::yield_now().await;
        context.set_language(Language::Spanish);
    });

    assert_eq!(rig.voice.state(), ConnectionState::Disconnected);
    assert!(rig.voice.last_error().is_none());
    assert!(session.is_closed());

    rig.voice.start().await.unwrap();
    assert!(
        rig.transport
            .last_config()
            .unwrap()
            .system_prompt
            .contains("Spanish")
    );
}

#[tokio::test]
async fn test_same_customer_keeps_session() {
    let mut rig = connected().await;

    rig.context.switch_customer(CustomerId::new(1)).unwrap();
    rig.voice.handle_event(fragment(0.25));

    assert_eq!(rig.voice.state(), ConnectionState::Connected);
    assert_eq!(rig.playback.played().len(), 1);
}

// =============================================================================
// Capture
// =============================================================================

#[tokio::test]
async fn test_capture_feeds_volume_and_session() {
    let mut rig = connected().await;
    let session = rig.transport.session().unwrap();
    let mut volume = rig.voice.subscribe_volume();

    assert!(rig.capture.push(vec![0.1; 320]).await);
    volume.changed().await.unwrap();
    assert!(*volume.borrow() > 0.0);

    for _ in 0..100 {
        if session.audio_chunks() > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(session.audio_chunks(), 1);

    rig.voice.stop();
    assert!(rig.voice.subscribe_volume().borrow().abs() < f32::EPSILON);
    assert!(!rig.capture.is_open());
}

#[tokio::test]
async fn test_failed_audio_sends_are_dropped() {
    let rig = connected().await;
    let session = rig.transport.session().unwrap();
    let mut volume = rig.voice.subscribe_volume();

    session.set_fail_sends(true);
    assert!(rig.capture.push(vec![0.2; 320]).await);
    volume.changed().await.unwrap();

    assert_eq!(rig.voice.state(), ConnectionState::Connected);
    assert_eq!(session.audio_chunks(), 0);

    session.set_fail_sends(false);
    assert!(rig.capture.push(vec![0.2; 320]).await);
    for _ in 0..100 {
        if session.audio_chunks() > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(session.audio_chunks(), 1);
    assert_eq!(rig.voice.state(), ConnectionState::Connected);
}
