//! Wait-time statistics and the end-of-run report.

use std::fmt;

use serde::Serialize;

use crate::core::{Counters, ProcessRecord, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaitStats {
    pub sum: Ticks,
    pub min: Ticks,
    pub max: Ticks,
    pub avg: f64,
}

impl WaitStats {
    /// Pure function of the final records; an empty table yields all zeros.
    pub fn aggregate(records: &[ProcessRecord]) -> Self {
        let waits = records.iter().map(|r| r.wait_accumulated);
        let sum: Ticks = waits.clone().sum();
        let min = waits.clone().min().unwrap_or(0);
        let max = waits.max().unwrap_or(0);
        let avg = if records.is_empty() {
            0.0
        } else {
            sum as f64 / records.len() as f64
        };

        Self { sum, min, max, avg }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub quantum: Ticks,
    pub total_ticks: Ticks,
    pub ctx_switches: u64,
    pub idle_ticks: u64,
    pub avg_wait: f64,
    pub min_wait: Ticks,
    pub max_wait: Ticks,
    pub wait_each: Vec<Ticks>,
}

impl Report {
    pub fn new(quantum: Ticks, counters: &Counters, records: &[ProcessRecord]) -> Self {
        let waits = WaitStats::aggregate(records);
        Self {
            quantum,
            total_ticks: counters.total_ticks,
            ctx_switches: counters.ctx_switches,
            idle_ticks: counters.idle_ticks,
            avg_wait: waits.avg,
            min_wait: waits.min,
            max_wait: waits.max,
            wait_each: records.iter().map(|r| r.wait_accumulated).collect(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TQ={}", self.quantum)?;
        writeln!(
            f,
            "total_ticks={}, ctx_switches={}, idle_ticks={}",
            self.total_ticks, self.ctx_switches, self.idle_ticks
        )?;
        writeln!(
            f,
            "avg_wait={:.2}, min_wait={}, max_wait={}",
            self.avg_wait, self.min_wait, self.max_wait
        )?;

        write!(f, "wait_each=[")?;
        for (i, wait) in self.wait_each.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{wait}")?;
        }
        writeln!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProcState, ProcTable, WorkerId};
    use slotmap::SlotMap;

    fn records(waits: &[Ticks]) -> Vec<ProcessRecord> {
        let mut keys: SlotMap<WorkerId, ()> = SlotMap::with_key();
        let mut table = ProcTable::with_capacity(waits.len());
        for &wait in waits {
            let id = table.create_proc(keys.insert(()), 2);
            let proc = table.proc_mut(id);
            proc.state = ProcState::Done;
            proc.wait_accumulated = wait;
        }
        table.records().to_vec()
    }

    #[test]
    fn aggregates_sum_min_max_avg() {
        let stats = WaitStats::aggregate(&records(&[4, 0, 9, 3]));
        assert_eq!(stats.sum, 16);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 9);
        assert_eq!(stats.avg, 4.0);
    }

    #[test]
    fn aggregate_ignores_record_order() {
        let forward = records(&[7, 1, 5, 2, 2]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(WaitStats::aggregate(&forward), WaitStats::aggregate(&backward));
        assert_eq!(WaitStats::aggregate(&forward), WaitStats::aggregate(&forward));
    }

    #[test]
    fn empty_table_is_all_zero() {
        let stats = WaitStats::aggregate(&[]);
        assert_eq!(stats, WaitStats { sum: 0, min: 0, max: 0, avg: 0.0 });
    }

    #[test]
    fn renders_fixed_text_format() {
        let counters = Counters {
            total_ticks: 31,
            ctx_switches: 17,
            idle_ticks: 4,
            finished: 3,
        };
        let report = Report::new(2, &counters, &records(&[3, 10, 0]));
        assert_eq!(
            report.to_string(),
            "TQ=2\n\
             total_ticks=31, ctx_switches=17, idle_ticks=4\n\
             avg_wait=4.33, min_wait=0, max_wait=10\n\
             wait_each=[3, 10, 0]\n"
        );
    }

    #[test]
    fn single_process_list_has_no_separator() {
        let report = Report::new(2, &Counters::default(), &records(&[0]));
        assert!(report.to_string().ends_with("wait_each=[0]\n"));
        assert!(report.to_string().contains("avg_wait=0.00"));
    }

    #[test]
    fn serializes_to_json() {
        let report = Report::new(3, &Counters::default(), &records(&[1, 2]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["quantum"], 3);
        assert_eq!(json["wait_each"], serde_json::json!([1, 2]));
        assert_eq!(json["avg_wait"], 1.5);
    }
}
