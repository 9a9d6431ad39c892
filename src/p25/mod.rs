//! P25 Phase 1 frame processing, from the NID that follows the frame sync through the
//! end of the data unit it announces.

pub mod control;
pub mod crypto;
pub mod header;
pub mod heuristics;
pub mod ldu;
pub mod nid;
pub mod status;
pub mod term;
pub mod tsbk;

use crate::bits::Dibit;
use crate::decoder::{Context, Event, Step, VoiceFrame};
use crate::error::Result;
use crate::stats::{HasStats, Stats};

use self::control::LinkControlFields;
use self::crypto::EncryptionSync;
use self::header::{VoiceHeaderFields, VoiceHeaderReceiver};
use self::heuristics::{AnalogSample, FRAME_SAMPLES};
use self::ldu::{Extra, Ldu1Receiver, Ldu2Receiver, LduEvent, LduReceiver};
use self::nid::{DataUnit, NetworkId, NidReceiver};
use self::status::{StatusDeinterleaver, StreamSymbol};
use self::term::TerminatorReceiver;
use self::tsbk::{TsbkFields, TsbkReceiver, MAX_BLOCKS};

/// Decoded P25 fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum P25Event {
    /// The NID at the start of a frame was decoded.
    Nid(NetworkId),
    /// A voice header was decoded.
    Header(VoiceHeaderFields),
    /// The link control word of an LDU1 was decoded.
    LinkControl(LinkControlFields),
    /// The encryption sync word of an LDU2 was decoded.
    EncryptionSync(EncryptionSync),
    /// The link control word of a terminator was decoded.
    Terminator(LinkControlFields),
    /// A trunking signalling block was decoded.
    Tsbk(TsbkFields),
}

/// Data unit currently being received.
enum State {
    /// Receiving the NID.
    Nid(NidReceiver),
    Ldu1(Ldu1Receiver),
    Ldu2(Ldu2Receiver),
    Header(StatusDeinterleaver, VoiceHeaderReceiver),
    Terminator(StatusDeinterleaver, TerminatorReceiver),
    /// Receiving trunking blocks, along with the number received so far.
    Tsbk(StatusDeinterleaver, TsbkReceiver, usize),
}

/// Action the state machine should take.
enum StateChange {
    /// Report the step without changing state.
    Keep(Step),
    /// Report the step and move to the given state.
    Change(Step, State),
}

/// Processes the dibits following a P25 frame sync.
pub struct P25Processor {
    state: State,
    /// Analog samples of the frame, kept for the symbol heuristics.
    samples: Vec<AnalogSample>,
    stats: Stats,
}

impl P25Processor {
    pub fn new() -> P25Processor {
        P25Processor {
            state: State::Nid(NidReceiver::new()),
            samples: Vec::with_capacity(FRAME_SAMPLES),
            stats: Stats::default(),
        }
    }

    /// Feed in a polarity-corrected dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        if self.samples.len() < FRAME_SAMPLES {
            self.samples.push(AnalogSample { value: ctx.sample, dibit });
        }

        match self.handle(dibit, ctx) {
            StateChange::Keep(step) => step,
            StateChange::Change(step, state) => {
                self.state = state;
                step
            },
        }
    }

    fn handle(&mut self, dibit: Dibit, ctx: &mut Context) -> StateChange {
        use self::StateChange::*;

        match self.state {
            State::Nid(ref mut nid) => {
                let res = nid.feed(dibit);
                self.stats.merge(nid);

                match res {
                    Some(Ok(nid)) => Self::dispatch(nid, ctx),
                    Some(Err(e)) => Keep(Step::Abort(e)),
                    None => Keep(Step::Pending),
                }
            },
            State::Ldu1(ref mut ldu) => {
                let res = ldu.feed(dibit);
                self.stats.merge(ldu);

                Keep(Self::ldu_step(res, &mut self.samples, ctx))
            },
            State::Ldu2(ref mut ldu) => {
                let res = ldu.feed(dibit);
                self.stats.merge(ldu);

                Keep(Self::ldu_step(res, &mut self.samples, ctx))
            },
            State::Header(ref mut status, ref mut recv) => {
                let dibit = match Self::data(status, dibit, ctx) {
                    Some(d) => d,
                    None => return Keep(Step::Pending),
                };

                let res = recv.feed(dibit);
                self.stats.merge(recv);

                Keep(match res {
                    Some(Ok(h)) => {
                        ctx.session.algid = h.algid();
                        ctx.session.keyid = h.crypto_key();
                        ctx.session.talkgroup = h.talkgroup() as u32;
                        ctx.session.encrypted = h.encrypted();

                        info!("P25 HDU TG:{} ALG:{:02X} KEY:{:04X}", h.talkgroup(), h.algid(),
                              h.crypto_key());

                        Step::Done(Some(Event::P25(P25Event::Header(h))))
                    },
                    Some(Err(e)) => Step::Abort(e),
                    None => Step::Pending,
                })
            },
            State::Terminator(ref mut status, ref mut recv) => {
                let dibit = match Self::data(status, dibit, ctx) {
                    Some(d) => d,
                    None => return Keep(Step::Pending),
                };

                let res = recv.feed(dibit);
                self.stats.merge(recv);

                Keep(match res {
                    Some(Ok(lc)) => {
                        let s = &mut *ctx.session;

                        s.voice_active = false;
                        s.tdulc_count += 1;

                        let limit = ctx.config.resume_after_tdulc;

                        if limit > 0 && s.tdulc_count > limit {
                            info!("dropping call after {} terminators", s.tdulc_count);
                            s.no_carrier();
                        }

                        Step::Done(Some(Event::P25(P25Event::Terminator(lc))))
                    },
                    Some(Err(e)) => Step::Abort(e),
                    None => Step::Pending,
                })
            },
            State::Tsbk(ref mut status, ref mut recv, ref mut blocks) => {
                let dibit = match Self::data(status, dibit, ctx) {
                    Some(d) => d,
                    None => return Keep(Step::Pending),
                };

                let res = recv.feed(dibit);
                self.stats.merge(recv);

                let tsbk = match res {
                    Some(Ok(tsbk)) => tsbk,
                    Some(Err(e)) => return Keep(Step::Abort(e)),
                    None => return Keep(Step::Pending),
                };

                *blocks += 1;

                let done = tsbk.is_tail() || *blocks == MAX_BLOCKS;

                let event = if tsbk.standard() {
                    if let Some((tg, src)) = tsbk.group_grant() {
                        info!("P25 TSBK group grant TG:{} SRC:{}", tg, src);
                    }

                    Some(Event::P25(P25Event::Tsbk(tsbk)))
                } else {
                    debug!("skipping TSBK with vendor MFID {:02X}", tsbk.mfg());
                    None
                };

                Keep(match (done, event) {
                    (true, e) => Step::Done(e),
                    (false, Some(e)) => Step::Event(e),
                    (false, None) => Step::Pending,
                })
            },
        }
    }

    /// Choose the state for the data unit announced by the given NID.
    fn dispatch(nid: NetworkId, ctx: &mut Context) -> StateChange {
        use self::DataUnit::*;
        use self::StateChange::*;

        let s = &mut *ctx.session;

        s.nac = nid.access_code.to_bits();
        s.frame_type = nid.data_unit.label();

        debug!("P25 NAC:{:03X} DUID:{}", s.nac, s.frame_type);

        let event = Event::P25(P25Event::Nid(nid));

        let next = match nid.data_unit {
            VoiceHeader => State::Header(StatusDeinterleaver::new(),
                                         VoiceHeaderReceiver::new()),
            VoiceLCTerminator => State::Terminator(StatusDeinterleaver::new(),
                                                   TerminatorReceiver::new()),
            VoiceLCFrameGroup => {
                s.voice_active = true;
                s.tdulc_count = 0;
                State::Ldu1(Ldu1Receiver::new())
            },
            VoiceCCFrameGroup => {
                s.voice_active = true;
                s.tdulc_count = 0;
                State::Ldu2(Ldu2Receiver::new())
            },
            TrunkingSignaling => State::Tsbk(StatusDeinterleaver::new(),
                                             TsbkReceiver::new(), 0),
            DataPacket => {
                info!("P25 PDU decoding not implemented");
                return Keep(Step::Done(Some(event)));
            },
            VoiceSimpleTerminator => {
                s.voice_active = false;
                return Keep(Step::Done(Some(event)));
            },
        };

        Change(Step::Event(event), next)
    }

    /// Separate out status symbols, recording them into the session.
    fn data(status: &mut StatusDeinterleaver, dibit: Dibit, ctx: &mut Context)
        -> Option<Dibit>
    {
        match status.feed(dibit) {
            StreamSymbol::Data(d) => Some(d),
            StreamSymbol::Status(s) => {
                ctx.session.status = Some(s);
                None
            },
        }
    }

    fn ldu_step<E: Extra>(res: Option<Result<LduEvent<E>>>, samples: &mut Vec<AnalogSample>,
                          ctx: &mut Context)
        -> Step
    {
        match res {
            Some(Ok(LduEvent::VoiceFrame(idx, bytes))) => {
                let mut vf = VoiceFrame::new(ctx.session.mbe_rate, idx, &bytes);
                vf.ready = !(ctx.session.encrypted && ctx.config.mute_encrypted);

                Step::Event(Event::Voice(vf))
            },
            Some(Ok(LduEvent::Extra(fields))) => {
                E::update(&fields, ctx.session);
                Step::Event(Event::P25(E::event(fields)))
            },
            Some(Ok(LduEvent::Done(status))) => {
                ctx.session.status = Some(status);
                ctx.heuristics.contribute(&samples[..]);
                samples.clear();

                Step::Done(None)
            },
            Some(Err(e)) => Step::Abort(e),
            None => Step::Pending,
        }
    }
}

impl HasStats for P25Processor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}
