//! Packet scheduling: phase-ordered, stable execution order.
//!
//! Packets carry no explicit dependencies. Ordering them by classified phase
//! (scaffold first, polish last) is what keeps integration work from running
//! before the shared utilities it builds on. Within a phase the caller's
//! original order is kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::packet::WorkPacket;
use crate::phase::GenerationPhase;

/// One step of the execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Position in the scheduled order (0-based).
    pub index: usize,
    pub packet_id: String,
    pub title: String,
    pub phase: GenerationPhase,
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. [{}] {}", self.index + 1, self.phase, self.title)
    }
}

/// Return the packets ordered by phase rank.
///
/// `sort_by_key` is stable, so packets sharing a phase keep their relative
/// order. The input is not modified.
pub fn schedule(packets: &[WorkPacket]) -> Vec<WorkPacket> {
    let mut ranked: Vec<(u8, &WorkPacket)> =
        packets.iter().map(|p| (p.phase().rank(), p)).collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, p)| p.clone()).collect()
}

/// Schedule the packets and describe the result as a plan.
pub fn execution_plan(packets: &[WorkPacket]) -> Vec<PlanEntry> {
    schedule(packets)
        .iter()
        .enumerate()
        .map(|(index, packet)| PlanEntry {
            index,
            packet_id: packet.id.clone(),
            title: packet.title.clone(),
            phase: packet.phase(),
        })
        .collect()
}

/// Packets per phase, in phase order. Phases with no packets are omitted.
pub fn phase_histogram(packets: &[WorkPacket]) -> BTreeMap<GenerationPhase, usize> {
    let mut counts = BTreeMap::new();
    for packet in packets {
        *counts.entry(packet.phase()).or_insert(0) += 1;
    }
    counts
}

/// One-line summary such as `scaffold: 1, features: 3, polish: 1`.
pub fn describe_histogram(histogram: &BTreeMap<GenerationPhase, usize>) -> String {
    if histogram.is_empty() {
        return "no packets".to_string();
    }
    histogram
        .iter()
        .map(|(phase, count)| format!("{}: {}", phase, count))
        .collect::<Vec<_>>()
        .join(", ")
}
