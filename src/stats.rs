//! Reuse statistics over the address column of a trace.

use std::collections::HashMap;

/// Number of accesses per address, in order of first appearance.
pub fn frequency_histogram<I, T>(addresses: I) -> Vec<(T, u64)>
where
    I: IntoIterator<Item = T>,
    T: std::hash::Hash + Eq + Clone,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, u64)> = Vec::new();
    for address in addresses {
        match index.get(&address) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(address.clone(), counts.len());
                counts.push((address, 1));
            }
        }
    }
    counts
}

/// Stack distance of every access: the number of distinct addresses touched since
/// the previous access to the same address, `None` on first touch.
///
/// ```
/// use trace_atf::stats::stack_distances;
///
/// let distances = stack_distances([0, 0, 1, 0, 3, 0, 1]);
/// let expected: &[Option<usize>] = &[None, Some(0), None, Some(1), None, Some(1), Some(2)];
/// assert_eq!(distances.inner(), expected);
/// ```
pub fn stack_distances<I, T>(addresses: I) -> StackDistances
where
    I: IntoIterator<Item = T>,
    T: PartialEq,
{
    // most recent on the right
    let mut stack: Vec<T> = Vec::new();
    let mut distances = Vec::new();
    for address in addresses {
        let position = stack.iter().position(|a| a == &address);
        distances.push(position.map(|pos| stack.len() - pos - 1));
        if let Some(pos) = position {
            stack.remove(pos);
        }
        stack.push(address);
    }
    StackDistances { inner: distances }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDistances {
    inner: Vec<Option<usize>>,
}

impl StackDistances {
    /// Count of each finite distance, indexed by distance, plus the count of
    /// first touches.
    pub fn histogram(&self) -> (Vec<u64>, u64) {
        let max = self.inner.iter().flatten().max();
        let mut counts = max.map_or_else(Vec::new, |&max| vec![0; max + 1]);
        let mut infinities = 0;
        for distance in &self.inner {
            match distance {
                Some(d) => counts[*d] += 1,
                None => infinities += 1,
            }
        }
        (counts, infinities)
    }

    pub fn inner(&self) -> &[Option<usize>] {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
