//! Channel driven ingestion loop.
//!
//! The host feeds [`InboundPacket`]s in, reads [`EnrichedRecord`]s out and
//! may stop the loop through a control channel. Malformed lines are logged
//! and dropped; they never stop the loop.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::constants::POLL_INTERVAL;
use crate::processing::HeatflowProcessor;
use crate::record::{EnrichedRecord, InboundPacket};

/// Control message; receiving any command halts the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stop,
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A command arrived on the control channel
    Commanded,
    /// Every inbound sender was dropped and the queue drained
    InputClosed,
    /// The outbound receiver was dropped
    OutputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub received: usize,
    pub emitted: usize,
    pub dropped: usize,
    pub reason: StopReason,
}

enum Flow {
    Continue,
    Stop(StopReason),
}

struct Counters {
    received: usize,
    emitted: usize,
    dropped: usize,
}

impl Counters {
    fn summary(&self, reason: StopReason) -> IngestSummary {
        IngestSummary {
            received: self.received,
            emitted: self.emitted,
            dropped: self.dropped,
            reason,
        }
    }
}

fn handle(
    processor: &HeatflowProcessor,
    packet: InboundPacket,
    outbound: &Sender<EnrichedRecord>,
    counters: &mut Counters,
) -> Flow {
    counters.received += 1;
    match processor.process(&packet) {
        Ok(record) => {
            if outbound.send(record).is_err() {
                log::warn!("{}: output channel closed", processor.device());
                return Flow::Stop(StopReason::OutputClosed);
            }
            counters.emitted += 1;
        }
        Err(e) => {
            counters.dropped += 1;
            log::warn!("{}: dropped line: {}", processor.device(), e);
        }
    }
    Flow::Continue
}

/// Run the ingestion loop on the current thread until stopped.
pub fn run_ingest(
    processor: &HeatflowProcessor,
    inbound: &Receiver<InboundPacket>,
    outbound: &Sender<EnrichedRecord>,
    control: &Receiver<Command>,
) -> IngestSummary {
    let mut counters = Counters {
        received: 0,
        emitted: 0,
        dropped: 0,
    };

    log::info!("{}: ingest started", processor.device());

    loop {
        match control.try_recv() {
            Ok(command) => {
                log::info!("{}: received {:?}", processor.device(), command);
                return counters.summary(StopReason::Commanded);
            }
            // A host that drops its control sender can still stop us by
            // closing the input.
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        // One packet per iteration, so a backlog never delays a stop command.
        let packet = match inbound.recv_timeout(POLL_INTERVAL) {
            Ok(packet) => packet,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("{}: input closed", processor.device());
                return counters.summary(StopReason::InputClosed);
            }
        };

        if let Flow::Stop(reason) = handle(processor, packet, outbound, &mut counters) {
            return counters.summary(reason);
        }
    }
}

/// Run [`run_ingest`] on a dedicated, named thread.
pub fn spawn_ingest(
    processor: HeatflowProcessor,
    inbound: Receiver<InboundPacket>,
    outbound: Sender<EnrichedRecord>,
    control: Receiver<Command>,
) -> std::io::Result<JoinHandle<IngestSummary>> {
    thread::Builder::new()
        .name(format!("ingest-{}", processor.device()))
        .spawn(move || run_ingest(&processor, &inbound, &outbound, &control))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Calibration;
    use crossbeam_channel::{bounded, unbounded};

    const SAMPLE: &str = "$SN01,00000315.1035,HFS,-0.000196,V,-0.000392,W/m2,NTC,+0.028857,V,+33.926881,degC,VIN,+0.114332,V,+1.257654,VCC";

    fn processor() -> HeatflowProcessor {
        HeatflowProcessor::new("test", Calibration::default())
    }

    #[test]
    fn test_drains_and_stops_on_closed_input() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        let (_ctrl_tx, ctrl_rx) = unbounded::<Command>();

        in_tx.send(InboundPacket::new(SAMPLE, 1.0)).unwrap();
        in_tx.send(InboundPacket::new("garbage", 2.0)).unwrap();
        in_tx.send(InboundPacket::new(SAMPLE, 3.0)).unwrap();
        drop(in_tx);

        let summary = run_ingest(&processor(), &in_rx, &out_tx, &ctrl_rx);
        assert_eq!(summary.received, 3);
        assert_eq!(summary.emitted, 2);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.reason, StopReason::InputClosed);

        let times: Vec<f64> = out_rx.try_iter().map(|r| r.meta.t).collect();
        assert_eq!(times, vec![1.0, 3.0]);
    }

    #[test]
    fn test_stop_command() {
        let (_in_tx, in_rx) = unbounded::<InboundPacket>();
        let (out_tx, _out_rx) = unbounded();
        let (ctrl_tx, ctrl_rx) = unbounded();

        ctrl_tx.send(Command::Stop).unwrap();
        let summary = run_ingest(&processor(), &in_rx, &out_tx, &ctrl_rx);
        assert_eq!(summary.reason, StopReason::Commanded);
        assert_eq!(summary.received, 0);
    }

    #[test]
    fn test_output_closed() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = bounded(1);
        let (_ctrl_tx, ctrl_rx) = unbounded::<Command>();
        drop(out_rx);

        in_tx.send(InboundPacket::new(SAMPLE, 1.0)).unwrap();
        let summary = run_ingest(&processor(), &in_rx, &out_tx, &ctrl_rx);
        assert_eq!(summary.reason, StopReason::OutputClosed);
        assert_eq!(summary.emitted, 0);
    }

    #[test]
    fn test_spawned_worker() {
        let (in_tx, in_rx) = bounded(4);
        let (out_tx, out_rx) = bounded(4);
        let (_ctrl_tx, ctrl_rx) = bounded(1);

        let handle = spawn_ingest(processor(), in_rx, out_tx, ctrl_rx).unwrap();
        for i in 0..10 {
            in_tx.send(InboundPacket::new(SAMPLE, i as f64)).unwrap();
            let record = out_rx.recv().unwrap();
            assert_eq!(record.meta.t, i as f64);
        }
        drop(in_tx);

        let summary = handle.join().unwrap();
        assert_eq!(summary.emitted, 10);
        assert_eq!(summary.reason, StopReason::InputClosed);
    }
}
