//! Distribution of the value set from the coordinator to every process
use crate::partition::Partition;
use crate::traits::Cluster;
use crate::types::{Error, Result, Tag, COORDINATOR};
use log::{debug, info};

/// Tag used for value transfers unless configured otherwise
pub const DATA_TAG: Tag = 0;

/// Send every other process its range of `values` and return the coordinator's own range.
///
/// The coordinator's range is borrowed from `values` rather than copied. Sends
/// are blocking and issued in rank order.
pub fn scatter_from_coordinator<'a, C: Cluster + ?Sized>(
    cluster: &C,
    partition: &Partition,
    values: &'a [u32],
    tag: Tag,
) -> Result<&'a [u32]> {
    let size = cluster.identity().size;
    let expected = partition.total_count(size)?;
    if values.len() != expected {
        return Err(Error::BufferLength {
            expected,
            actual: values.len(),
        });
    }
    for destination in (COORDINATOR + 1)..size {
        let range = partition.process_range(destination);
        debug!("Sending values {range:?} to rank {destination}");
        cluster.send(&values[range], destination, tag)?;
    }
    info!(
        "Distributed {} values to {} worker processes",
        values.len() - partition.values_per_process(),
        size - 1
    );
    Ok(&values[partition.process_range(COORDINATOR)])
}

/// Receive this process's range from the coordinator
pub fn receive_from_coordinator<C: Cluster + ?Sized>(
    cluster: &C,
    partition: &Partition,
    tag: Tag,
) -> Result<Vec<u32>> {
    let values = cluster.receive(partition.values_per_process(), COORDINATOR, tag)?;
    debug!(
        "Rank {} received {} values",
        cluster.identity().rank,
        values.len()
    );
    Ok(values)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster::LocalCluster;
    use crate::types::ThreadSupport;

    #[test]
    fn test_every_process_gets_its_range() {
        let partition = Partition::new(2, 3).unwrap();
        let values = (0..12).collect::<Vec<u32>>();
        let cluster = LocalCluster::new(2, ThreadSupport::Funneled);
        let received = cluster
            .run(|endpoint| {
                if endpoint.identity().is_coordinator() {
                    scatter_from_coordinator(&endpoint, &partition, &values, DATA_TAG)
                        .unwrap()
                        .to_vec()
                } else {
                    receive_from_coordinator(&endpoint, &partition, DATA_TAG).unwrap()
                }
            })
            .unwrap();
        assert_eq!(received[0], vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(received[1], vec![6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_coordinator_range_is_borrowed() {
        let partition = Partition::new(1, 4).unwrap();
        let values = vec![9u32, 8, 7, 6];
        let cluster = LocalCluster::new(1, ThreadSupport::Single);
        let same = cluster
            .run(|endpoint| {
                let own = scatter_from_coordinator(&endpoint, &partition, &values, DATA_TAG)
                    .unwrap();
                std::ptr::eq(own.as_ptr(), values.as_ptr())
            })
            .unwrap();
        assert!(same[0]);
    }

    #[test]
    fn test_wrong_value_count() {
        let partition = Partition::new(2, 2).unwrap();
        let cluster = LocalCluster::new(1, ThreadSupport::Single);
        let results = cluster
            .run(|endpoint| {
                scatter_from_coordinator(&endpoint, &partition, &[1, 2, 3], DATA_TAG).map(|_| ())
            })
            .unwrap();
        assert!(matches!(
            results[0],
            Err(Error::BufferLength {
                expected: 4,
                actual: 3
            })
        ));
    }
}
