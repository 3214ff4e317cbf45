use std::fmt;

/// One of the four operational metrics tracked by the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricField {
    /// Live SSTable count, summed across the stress column families.
    LiveSsTableCount,
    /// Live data size of all memtables, summed across the stress column families.
    AllMemtablesLiveDataSize,
    /// 95th percentile client read latency.
    ReadLatencyP95,
    /// 95th percentile client write latency.
    WriteLatencyP95,
}

impl MetricField {
    /// All fields in serialization order.
    pub const ALL: [MetricField; 4] = [
        MetricField::LiveSsTableCount,
        MetricField::AllMemtablesLiveDataSize,
        MetricField::ReadLatencyP95,
        MetricField::WriteLatencyP95,
    ];

    /// Name used in logs, report headers and storage columns.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LiveSsTableCount => "liveSSTableCount",
            Self::AllMemtablesLiveDataSize => "allMemtablesLiveDataSize",
            Self::ReadLatencyP95 => "readLatency95thPercentile",
            Self::WriteLatencyP95 => "writeLatency95thPercentile",
        }
    }

    /// Position of the field inside a serialized row.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::LiveSsTableCount => 0,
            Self::AllMemtablesLiveDataSize => 1,
            Self::ReadLatencyP95 => 2,
            Self::WriteLatencyP95 => 3,
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
