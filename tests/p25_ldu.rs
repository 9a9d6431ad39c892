extern crate dsd;

use dsd::bits::{Dibit, Dibits};
use dsd::p25::ldu::{self, LDU_DIBITS, VOICE_FRAMES};
use dsd::p25::nid::{DataUnit, NetworkAccessCode, NetworkId};
use dsd::p25::P25Event;
use dsd::sync::{Protocol, WARMUP};
use dsd::{Config, DecodeMode, Decoder, Event, FsmState, SyncType};

const SYNC: &[u8] = b"111113113311333313133333";

/// Group call to talkgroup 100 from unit 5000.
const LC: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x00, 100, 0x00, 0x13, 0x88];

/// Sync, NID, and body of an LDU1 with NAC 0x123.
fn ldu1() -> Vec<Dibit> {
    let nid = NetworkId::new(NetworkAccessCode::from_bits(0x123), DataUnit::VoiceLCFrameGroup);

    let mut out = SYNC.iter().map(|&c| Dibit::new(c - b'0')).collect::<Vec<_>>();

    out.extend(Dibits::new(nid.encode().iter().cloned()));
    out.extend((0..32).map(|_| Dibit::new(0)));
    out.extend((0..VOICE_FRAMES * ldu::FRAME_DIBITS).map(|i| Dibit::new((i % 4) as u8)));
    out.extend(ldu::encode_extra(&LC).iter().cloned());
    out.extend((0..72).map(|_| Dibit::new(0b10)));

    out
}

fn warm_up(d: &mut Decoder) {
    for _ in 0..WARMUP {
        assert_eq!(d.advance(Dibit::new(0), 0), None);
    }
}

fn check(d: &mut Decoder, stream: &[Dibit], sync: SyncType) {
    let mut events = vec![];

    for (i, &b) in stream.iter().enumerate() {
        events.extend(d.advance(b, 1000));

        // The frame ends exactly on the final LDU dibit.
        if i + 1 == stream.len() - 1 {
            assert_ne!(d.state(), FsmState::LookForSync);
        }
    }

    assert_eq!(d.state(), FsmState::LookForSync);
    assert_eq!(stream.len(), 24 + 64 + LDU_DIBITS);

    assert_eq!(events[0], Event::SyncFound(sync));

    match events[1] {
        Event::P25(P25Event::Nid(nid)) => {
            assert_eq!(nid.access_code, NetworkAccessCode::Other(0x123));
            assert_eq!(nid.data_unit, DataUnit::VoiceLCFrameGroup);
        },
        _ => panic!(),
    }

    let voice = events.iter().filter_map(|e| match *e {
        Event::Voice(vf) => Some(vf.index),
        _ => None,
    }).collect::<Vec<_>>();

    assert_eq!(voice, (0..VOICE_FRAMES).collect::<Vec<_>>());

    match events.last() {
        Some(&Event::P25(P25Event::LinkControl(lc))) => {
            assert_eq!(lc.talkgroup(), 100);
            assert_eq!(lc.src_unit(), 5000);
        },
        _ => panic!(),
    }

    let snap = d.snapshot();

    assert_eq!(snap.protocol, Some(Protocol::P25p1));
    assert_eq!(snap.sync, Some(sync));
    assert_eq!(snap.nac, 0x123);
    assert_eq!(snap.talkgroup, 100);
    assert_eq!(snap.source, 5000);
    assert_eq!(snap.frame_type, "LDU1");
    assert!(!snap.emergency);
}

#[test]
fn test_ldu1() {
    let mut d = Decoder::new(Config::with_mode(DecodeMode::P25P1));

    warm_up(&mut d);
    check(&mut d, &ldu1(), SyncType::P25p1Pos);
}

#[test]
fn test_ldu1_inverted() {
    let mut d = Decoder::new(Config::with_mode(DecodeMode::P25P1));
    let stream = ldu1().iter().map(|d| d.invert()).collect::<Vec<_>>();

    warm_up(&mut d);
    check(&mut d, &stream, SyncType::P25p1Neg);
}

#[test]
fn test_back_to_back() {
    let mut d = Decoder::new(Config::with_mode(DecodeMode::P25P1));

    warm_up(&mut d);
    check(&mut d, &ldu1(), SyncType::P25p1Pos);
    check(&mut d, &ldu1(), SyncType::P25p1Pos);
}
