// src/pool/partition.rs

use std::num::NonZeroUsize;

/// Round-robin split: item `i` goes to bucket `i % worker_count`, keeping
/// input order inside each bucket.
///
/// Only buckets that receive work are materialised, so the result holds
/// `min(worker_count, items)` buckets. Bucket `i` still belongs to worker
/// `i + 1`; workers past the end of the result have nothing to do.
pub fn partition<T>(items: impl IntoIterator<Item = T>, worker_count: NonZeroUsize) -> Vec<Vec<T>> {
    let items: Vec<T> = items.into_iter().collect();
    let count = worker_count.get().min(items.len());
    let mut buckets: Vec<Vec<T>> = (0..count).map(|_| Vec::new()).collect();
    for (index, item) in items.into_iter().enumerate() {
        buckets[index % count].push(item);
    }
    buckets
}
