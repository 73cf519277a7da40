//! Contract Tests for Command Dispatch
//!
//! Pins the dispatch contract: mark capture, delta resolution, the
//! no-output sentinel, timing bounds, and fail-fast preconditions.

use std::sync::Arc;
use std::time::Duration;

use credmint::error::Error;
use credmint::protocol::{CommandChannel, NO_OUTPUT_SENTINEL};
use credmint::terminal::OutputBuffer;
use tokio_test::assert_ok;

#[path = "../test_utils/mod.rs"]
mod test_utils;
use test_utils::MockVm;

fn channel_with(buffer: &Arc<OutputBuffer>, vm: MockVm) -> CommandChannel {
    let channel = CommandChannel::new(Arc::clone(buffer))
        .with_timing(Duration::from_millis(20), Duration::from_secs(10));
    channel.bind(Arc::new(vm));
    channel
}

#[tokio::test]
async fn test_send_without_vm_is_not_a_silent_noop() {
    let channel = CommandChannel::new(Arc::new(OutputBuffer::new()));
    assert!(!channel.is_ready());
    let result = channel.send("ls").await;
    assert!(matches!(result, Err(Error::ChannelNotReady)));
}

#[tokio::test]
async fn test_input_reaches_vm_with_trailing_newline() {
    let buffer = Arc::new(OutputBuffer::new());
    let vm = Arc::new(MockVm::new(Arc::clone(&buffer)));
    let channel = CommandChannel::new(Arc::clone(&buffer))
        .with_timing(Duration::from_millis(20), Duration::from_secs(10));
    channel.bind(Arc::clone(&vm) as Arc<dyn credmint::vm::VirtualMachine>);

    let _ = channel
        .send_with_wait("uname -a", Duration::from_millis(100))
        .await;
    assert_eq!(vm.inputs(), vec!["uname -a\n".to_string()]);
}

#[tokio::test]
async fn test_resolves_with_delta_not_full_buffer() {
    let buffer = Arc::new(OutputBuffer::new());
    buffer.append("history before dispatch\n$ ");
    let vm = MockVm::new(Arc::clone(&buffer)).respond("date", "Mon Jan 1\n", Duration::from_millis(30));
    let channel = channel_with(&buffer, vm);

    let delta =
        assert_ok!(channel.send_with_wait("date", Duration::from_millis(500)).await);
    assert_eq!(delta, "Mon Jan 1\n");
}

#[tokio::test]
async fn test_no_output_resolves_sentinel_within_wait_plus_one_poll() {
    let buffer = Arc::new(OutputBuffer::new());
    let channel = channel_with(&buffer, MockVm::new(Arc::clone(&buffer)));

    let wait = Duration::from_millis(200);
    let start = std::time::Instant::now();
    let result = channel.send_with_wait("true", wait).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result, NO_OUTPUT_SENTINEL);
    // wait + one poll interval, with scheduling slack
    assert!(
        elapsed < wait + Duration::from_millis(150),
        "took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_hard_cap_bounds_even_huge_waits() {
    let buffer = Arc::new(OutputBuffer::new());
    let channel = CommandChannel::new(Arc::clone(&buffer))
        .with_timing(Duration::from_millis(20), Duration::from_millis(100));
    channel.bind(Arc::new(MockVm::new(Arc::clone(&buffer))));

    let start = std::time::Instant::now();
    let result = channel
        .send_with_wait("forever", Duration::from_secs(3600))
        .await;
    assert!(matches!(result, Err(Error::DispatchTimeout { .. })));
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_output_before_first_poll_is_still_seen() {
    // Output can beat the first poll tick; the mark-based delta must
    // still capture it
    let buffer = Arc::new(OutputBuffer::new());
    let vm = MockVm::new(Arc::clone(&buffer)).respond("fast", "instant\n", Duration::ZERO);
    let channel = channel_with(&buffer, vm);

    let delta = channel
        .send_with_wait("fast", Duration::from_millis(500))
        .await
        .unwrap();
    assert_eq!(delta, "instant\n");
}
