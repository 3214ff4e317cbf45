//! Metric source abstraction and the MBean queries behind each tracked field.

use async_trait::async_trait;
use qascreen_core::MetricField;

use crate::error::SourceResult;

/// Column families written by the mixed stress workload.
pub const STRESS_COLUMN_FAMILIES: [&str; 2] = ["standard1", "counter1"];

const METRICS_DOMAIN: &str = "org.apache.cassandra.metrics";

/// Reads numeric attributes from the cluster's management interface.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Reads `attribute` of the MBean `object_name`.
    async fn get_attribute(&self, object_name: &str, attribute: &str) -> SourceResult<f64>;
}

/// One attribute read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeQuery {
    pub object_name: String,
    pub attribute: &'static str,
}

impl AttributeQuery {
    fn new(object_name: String, attribute: &'static str) -> Self {
        Self {
            object_name,
            attribute,
        }
    }
}

/// The attribute reads that make up each field. Multi-query fields are summed.
#[derive(Debug, Clone)]
pub struct MetricPlan {
    queries: [Vec<AttributeQuery>; 4],
}

impl MetricPlan {
    /// Plan for a stress run writing into `keyspace`.
    pub fn for_keyspace(keyspace: &str) -> Self {
        let per_table = |name: &str| -> Vec<AttributeQuery> {
            STRESS_COLUMN_FAMILIES
                .iter()
                .map(|scope| {
                    AttributeQuery::new(
                        format!(
                            "{METRICS_DOMAIN}:keyspace={keyspace},name={name},scope={scope},type=ColumnFamily"
                        ),
                        "Value",
                    )
                })
                .collect()
        };
        let client_latency = |scope: &str| -> Vec<AttributeQuery> {
            vec![AttributeQuery::new(
                format!("{METRICS_DOMAIN}:type=ClientRequest,scope={scope},name=Latency"),
                "95thPercentile",
            )]
        };

        Self {
            queries: [
                per_table("LiveSSTableCount"),
                per_table("AllMemtablesLiveDataSize"),
                client_latency("Read"),
                client_latency("Write"),
            ],
        }
    }

    pub fn queries(&self, field: MetricField) -> &[AttributeQuery] {
        &self.queries[field.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_metrics_sum_both_column_families() {
        let plan = MetricPlan::for_keyspace("keyspace1");
        let queries = plan.queries(MetricField::LiveSsTableCount);

        assert_eq!(queries.len(), 2);
        assert_eq!(
            queries[0].object_name,
            "org.apache.cassandra.metrics:keyspace=keyspace1,name=LiveSSTableCount,scope=standard1,type=ColumnFamily"
        );
        assert!(queries[1].object_name.contains("scope=counter1"));
        assert_eq!(queries[0].attribute, "Value");
    }

    #[test]
    fn test_latency_metrics_read_95th_percentile() {
        let plan = MetricPlan::for_keyspace("keyspace1");
        let queries = plan.queries(MetricField::WriteLatencyP95);

        assert_eq!(
            queries,
            &[AttributeQuery {
                object_name: "org.apache.cassandra.metrics:type=ClientRequest,scope=Write,name=Latency"
                    .to_string(),
                attribute: "95thPercentile",
            }]
        );
    }
}
