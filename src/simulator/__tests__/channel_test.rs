use crate::simulator::{pipe, Channel};
use crate::ChannelError;
use std::time::Duration;

#[test]
fn pipes_carry_frames_both_ways() {
    let (mut left, mut right) = pipe();
    left.open().unwrap();
    right.open().unwrap();

    left.write(b"ping").unwrap();
    assert_eq!(right.read(Duration::from_millis(100)).unwrap(), b"ping");

    right.write(b"pong").unwrap();
    assert_eq!(left.read(Duration::from_millis(100)).unwrap(), b"pong");
}

#[test]
fn peeking_does_not_lose_frames() {
    let (mut left, mut right) = pipe();
    left.open().unwrap();
    right.open().unwrap();

    assert!(!right.check_received());
    left.write(b"frame").unwrap();
    assert!(right.check_received());
    assert_eq!(right.read(Duration::from_millis(100)).unwrap(), b"frame");
}

#[test]
fn reads_time_out_when_nothing_arrives() {
    let (_left, mut right) = pipe();
    right.open().unwrap();
    assert_eq!(
        right.read(Duration::from_millis(20)),
        Err(ChannelError::Timeout)
    );
}

#[test]
fn a_dropped_peer_closes_the_channel() {
    let (left, mut right) = pipe();
    right.open().unwrap();
    drop(left);
    assert_eq!(
        right.read(Duration::from_millis(20)),
        Err(ChannelError::Closed)
    );
}
