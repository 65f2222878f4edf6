//! Pending registrations, keyed by subscriber.

use std::collections::HashMap;
use std::fmt;

use contracts::{SubscriberId, Transformer};

/// All transformers registered for one subscriber since the last dispatch.
pub(crate) struct PendingEntry<R> {
    pub(crate) subscriber_id: SubscriberId,
    transformers: Vec<Transformer<R>>,
}

impl<R> PendingEntry<R> {
    pub(crate) fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Evaluate every transformer against `timestamp`, in registration order.
    pub(crate) fn evaluate(self, timestamp: f64) -> Vec<R> {
        self.transformers.into_iter().map(|f| f(timestamp)).collect()
    }
}

impl<R> fmt::Debug for PendingEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEntry")
            .field("subscriber_id", &self.subscriber_id)
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

/// Whether an append created a new entry or extended an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppendOutcome {
    Created,
    Merged,
}

/// Subscriber id -> pending entry.
pub(crate) struct PendingSet<R> {
    entries: HashMap<SubscriberId, PendingEntry<R>>,
}

impl<R> Default for PendingSet<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<R> PendingSet<R> {
    /// Append `transformers` to the subscriber's entry, creating it if needed.
    pub(crate) fn append(
        &mut self,
        subscriber_id: SubscriberId,
        transformers: Vec<Transformer<R>>,
    ) -> AppendOutcome {
        if let Some(entry) = self.entries.get_mut(&subscriber_id) {
            entry.transformers.extend(transformers);
            return AppendOutcome::Merged;
        }

        self.entries.insert(
            subscriber_id.clone(),
            PendingEntry {
                subscriber_id,
                transformers,
            },
        );
        AppendOutcome::Created
    }

    /// Take every entry, leaving the set empty.
    pub(crate) fn drain(&mut self) -> Vec<PendingEntry<R>> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.entries.len()
    }
}

impl<R> fmt::Debug for PendingSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::transformer;

    fn constant(v: u32) -> Transformer<u32> {
        transformer(move |_| v)
    }

    #[test]
    fn test_append_merges_same_subscriber() {
        let mut set = PendingSet::default();
        assert_eq!(
            set.append("a".into(), vec![constant(1)]),
            AppendOutcome::Created
        );
        assert_eq!(
            set.append("a".into(), vec![constant(2), constant(3)]),
            AppendOutcome::Merged
        );
        assert_eq!(set.subscriber_count(), 1);

        let entries = set.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].len(), 3);
        assert_eq!(entries.into_iter().next().unwrap().evaluate(0.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_drain_empties_set() {
        let mut set = PendingSet::default();
        set.append("a".into(), vec![constant(1)]);
        set.append("b".into(), vec![constant(2)]);

        assert_eq!(set.drain().len(), 2);
        assert_eq!(set.subscriber_count(), 0);
        assert!(set.drain().is_empty());
    }

    #[test]
    fn test_evaluate_passes_timestamp() {
        let mut set: PendingSet<f64> = PendingSet::default();
        set.append(
            "a".into(),
            vec![transformer(|t| t), transformer(|t| t * 2.0)],
        );
        let entry = set.drain().pop().unwrap();
        assert_eq!(entry.evaluate(100.0), vec![100.0, 200.0]);
    }
}
