//! Energy simulator: per-arm traction and braking series and the reuse ratio.
//!
//! Every interval contributes its traction window to the departing station's
//! arm and its braking window to the arriving station's arm. Each window adds
//! the matching curve, indexed by seconds since the window opened, into a
//! day-long per-arm series. The reuse ratio compares the two series second
//! by second.
//!
//! Series buffers live in the simulator and are reused across evaluations;
//! only the range written by the previous evaluation is cleared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Timetable;
use crate::schema::{ArmId, KiloJoule, ReuseRule, ScheduleParams, Second};

/// Traction energy at `offset` seconds into a consume window. The ramp
/// saturates: offsets past the curve hold its last value.
#[inline]
pub fn consume_at(curve: &[KiloJoule], offset: usize) -> KiloJoule {
    match curve.get(offset) {
        Some(&v) => v,
        None => curve.last().copied().unwrap_or(0.0),
    }
}

/// Braking energy at `offset` seconds into a produce window. Offsets past
/// the curve produce nothing.
#[inline]
pub fn produce_at(curve: &[KiloJoule], offset: usize) -> KiloJoule {
    curve.get(offset).copied().unwrap_or(0.0)
}

/// `[begin, end)` windows grouped by supply arm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyWindows {
    pub consume: BTreeMap<ArmId, Vec<(Second, Second)>>,
    pub produce: BTreeMap<ArmId, Vec<(Second, Second)>>,
}

impl EnergyWindows {
    /// Bucket every interval's windows under their arms.
    pub fn collect(timetable: &Timetable) -> Self {
        let mut windows = Self::default();
        for interval in timetable.intervals() {
            windows
                .consume
                .entry(interval.consume_arm)
                .or_default()
                .push((interval.consume_begin, interval.consume_end));
            windows
                .produce
                .entry(interval.produce_arm)
                .or_default()
                .push((interval.produce_begin, interval.produce_end));
        }
        windows
    }
}

/// Energy totals of one supply arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmEnergy {
    /// Braking energy produced over the day (kJ).
    pub produced: KiloJoule,
    /// Braking energy counted as reusable under the active rule (kJ).
    pub reusable: KiloJoule,
}

impl ArmEnergy {
    pub fn ratio(&self) -> f64 {
        reuse_ratio(self.reusable, self.produced)
    }
}

/// Totals for a whole timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySummary {
    pub arms: BTreeMap<ArmId, ArmEnergy>,
}

impl EnergySummary {
    pub fn total_produced(&self) -> KiloJoule {
        self.arms.values().map(|a| a.produced).sum()
    }

    pub fn total_reusable(&self) -> KiloJoule {
        self.arms.values().map(|a| a.reusable).sum()
    }

    /// Reusable over produced, summed across arms; `0.0` when nothing is produced.
    pub fn reuse_ratio(&self) -> f64 {
        reuse_ratio(self.total_reusable(), self.total_produced())
    }

    pub fn arm_ratios(&self) -> BTreeMap<ArmId, f64> {
        self.arms.iter().map(|(&id, a)| (id, a.ratio())).collect()
    }
}

/// Full per-arm series for export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnergyDistribution {
    pub consume: BTreeMap<ArmId, Vec<KiloJoule>>,
    pub produce: BTreeMap<ArmId, Vec<KiloJoule>>,
}

#[inline]
fn reuse_ratio(reusable: f64, produced: f64) -> f64 {
    if produced > 0.0 {
        reusable / produced
    } else {
        0.0
    }
}

/// Reusable per-arm series buffers plus the curves and reduction rule.
#[derive(Debug, Clone)]
pub struct EnergySimulator {
    /// Arm ids, ascending; index into the buffers.
    arms: Vec<ArmId>,
    horizon: usize,
    consume: Vec<Vec<KiloJoule>>,
    produce: Vec<Vec<KiloJoule>>,
    consume_curve: Vec<KiloJoule>,
    produce_curve: Vec<KiloJoule>,
    rule: ReuseRule,
    /// Seconds `[lo, hi)` written by the last accumulation.
    dirty: Option<(usize, usize)>,
}

impl EnergySimulator {
    /// Allocate buffers for every arm over `params.day_span` seconds.
    pub fn new(params: &ScheduleParams, rule: ReuseRule) -> Self {
        let arms = params.arm_ids();
        let horizon = params.day_span.max(0) as usize;
        Self {
            consume: vec![vec![0.0; horizon]; arms.len()],
            produce: vec![vec![0.0; horizon]; arms.len()],
            arms,
            horizon,
            consume_curve: params.consume_curve.clone(),
            produce_curve: params.produce_curve.clone(),
            rule,
            dirty: None,
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Total reuse ratio of a timetable.
    pub fn reuse_ratio(&mut self, timetable: &Timetable) -> f64 {
        self.summary(timetable).reuse_ratio()
    }

    /// Reuse ratio per supply arm.
    pub fn arm_ratios(&mut self, timetable: &Timetable) -> BTreeMap<ArmId, f64> {
        self.summary(timetable).arm_ratios()
    }

    /// Produced and reusable energy per arm. Only arms that both draw
    /// traction and receive braking energy are reduced; the others are
    /// absent from the summary.
    pub fn summary(&mut self, timetable: &Timetable) -> EnergySummary {
        let windows = EnergyWindows::collect(timetable);
        self.accumulate(&windows);

        let (lo, hi) = self.dirty.unwrap_or((0, 0));
        let arms = self
            .arms
            .iter()
            .enumerate()
            .filter(|&(_, id)| {
                windows.consume.contains_key(id) && windows.produce.contains_key(id)
            })
            .map(|(k, &id)| {
                let consumed = &self.consume[k][lo..hi];
                let produced = &self.produce[k][lo..hi];
                let mut energy = ArmEnergy {
                    produced: 0.0,
                    reusable: 0.0,
                };
                for (&p, &c) in produced.iter().zip(consumed) {
                    energy.produced += p;
                    energy.reusable += self.rule.reusable(p, c);
                }
                (id, energy)
            })
            .collect();

        EnergySummary { arms }
    }

    /// Copy out the full per-arm series of a timetable.
    pub fn distribution(&mut self, timetable: &Timetable) -> EnergyDistribution {
        self.accumulate(&EnergyWindows::collect(timetable));
        let mut distribution = EnergyDistribution::default();
        for (k, &id) in self.arms.iter().enumerate() {
            distribution.consume.insert(id, self.consume[k].clone());
            distribution.produce.insert(id, self.produce[k].clone());
        }
        distribution
    }

    /// Clear the previously written range and add every window.
    fn accumulate(&mut self, windows: &EnergyWindows) {
        if let Some((lo, hi)) = self.dirty.take() {
            for series in self.consume.iter_mut().chain(self.produce.iter_mut()) {
                series[lo..hi].fill(0.0);
            }
        }

        let mut lo = self.horizon;
        let mut hi = 0;
        let mut clipped = 0usize;

        for (arm, list) in &windows.consume {
            let k = self.arm_index(*arm);
            for &(begin, end) in list {
                let (written, lost) = add_window(
                    &mut self.consume[k],
                    begin,
                    end,
                    &self.consume_curve,
                    consume_at,
                );
                clipped += lost;
                if let Some((a, b)) = written {
                    lo = lo.min(a);
                    hi = hi.max(b);
                }
            }
        }
        for (arm, list) in &windows.produce {
            let k = self.arm_index(*arm);
            for &(begin, end) in list {
                let (written, lost) = add_window(
                    &mut self.produce[k],
                    begin,
                    end,
                    &self.produce_curve,
                    produce_at,
                );
                clipped += lost;
                if let Some((a, b)) = written {
                    lo = lo.min(a);
                    hi = hi.max(b);
                }
            }
        }

        if clipped > 0 {
            log::warn!(
                "{} seconds of energy windows fall outside [0, {}) and were dropped",
                clipped,
                self.horizon
            );
        }
        self.dirty = (lo < hi).then_some((lo, hi));
    }

    fn arm_index(&self, arm: ArmId) -> usize {
        match self.arms.binary_search(&arm) {
            Ok(k) => k,
            Err(_) => panic!("supply arm {arm} is not part of the schedule parameters"),
        }
    }
}

/// Add `curve` over `[begin, end)` into `series`, clipped to the series.
/// Returns the written range and the number of seconds dropped.
fn add_window(
    series: &mut [KiloJoule],
    begin: Second,
    end: Second,
    curve: &[KiloJoule],
    lookup: fn(&[KiloJoule], usize) -> KiloJoule,
) -> (Option<(usize, usize)>, usize) {
    let len = series.len() as i64;
    let (begin, end) = (begin as i64, end as i64);
    let from = begin.clamp(0, len);
    let to = end.clamp(0, len);
    let lost = (end - begin).max(0) - (to - from).max(0);

    if from >= to {
        return (None, lost as usize);
    }
    for i in from..to {
        series[i as usize] += lookup(curve, (i - begin) as usize);
    }
    (Some((from as usize, to as usize)), lost as usize)
}
