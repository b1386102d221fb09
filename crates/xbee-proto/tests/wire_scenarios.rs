//! Wire-format scenarios S1-S4: exact byte sequences for the AT "NI" query
//! in both operating modes, a payload containing an escape-set byte, and a
//! checksum mismatch that must resync cleanly.

use xbee_proto::{codec, frame::Frame, ProtocolError};

#[test]
fn s1_api_mode_at_ni_query() {
    let frame = Frame::new(0x08, Some(0x01), &b"NI"[..]);
    let wire = codec::encode(&frame, false).unwrap();
    assert_eq!(wire, vec![0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, 0x5F]);

    let mut decoder = codec::FrameDecoder::new(false);
    let results = decoder.push_bytes(&wire);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].clone().unwrap(), frame);
}

#[test]
fn s2_api_escape_mode_identical_when_no_escapes_needed() {
    let frame = Frame::new(0x08, Some(0x01), &b"NI"[..]);
    let wire = codec::encode(&frame, true).unwrap();
    assert_eq!(wire, vec![0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, 0x5F]);
}

#[test]
fn s3_payload_containing_escape_set_byte_is_escaped() {
    let frame = Frame::new(0x08, Some(0x01), vec![0x4E, 0x49, 0x11]);
    let escaped = codec::encode(&frame, true).unwrap();
    assert_eq!(escaped, vec![0x7E, 0x00, 0x05, 0x08, 0x01, 0x4E, 0x49, 0x7D, 0x31, 0x4E]);

    let mut decoder = codec::FrameDecoder::new(true);
    let results = decoder.push_bytes(&escaped);
    assert_eq!(results[0].clone().unwrap(), frame);
}

#[test]
fn s4_bad_checksum_resyncs_onto_next_frame() {
    let good = codec::encode(&Frame::new(0x08, Some(0x01), &b"NI"[..]), false).unwrap();
    let mut corrupted = good.clone();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;

    let mut stream = corrupted;
    stream.extend_from_slice(&good);

    let mut decoder = codec::FrameDecoder::new(false);
    let results = decoder.push_bytes(&stream);

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(ProtocolError::BadChecksum { .. })));
    assert!(results[1].is_ok());
}

#[test]
fn invariant_1_round_trip_is_identity_across_frame_types() {
    for (frame_type, frame_id) in [(0x08, Some(1u8)), (0x88, Some(2)), (0x8A, None), (0x95, None)] {
        let frame = Frame::new(frame_type, frame_id, vec![1, 2, 3]);
        let wire = codec::encode(&frame, true).unwrap();
        let (result, consumed) = codec::decode_one(&wire, true).unwrap();
        assert_eq!(consumed, wire.len());
        assert_eq!(result.unwrap(), frame);
    }
}

#[test]
fn invariant_2_checksum_complements_the_byte_sum() {
    let body = [0x08, 0x01, 0x4E, 0x49];
    let trailing = xbee_proto::checksum::generate(&body);
    let sum: u32 = body.iter().map(|&b| u32::from(b)).sum();
    assert_eq!((sum + u32::from(trailing)) % 256, 0xFF);
}

#[test]
fn invariant_3_resync_never_drops_a_following_valid_frame() {
    let good = codec::encode(&Frame::new(0x08, Some(5), &b"VR"[..]), false).unwrap();
    let mut stream = vec![0x7E, 0x00, 0x01, 0x99]; // a truncated bogus frame header
    stream.extend_from_slice(&good);

    let mut decoder = codec::FrameDecoder::new(false);
    let results = decoder.push_bytes(&stream);
    let ok_frames: Vec<_> = results.into_iter().filter_map(std::result::Result::ok).collect();
    assert_eq!(ok_frames.len(), 1);
    assert_eq!(ok_frames[0].frame_type, 0x08);
}
