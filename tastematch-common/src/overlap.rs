//! Attribute overlap counting
//!
//! Each attribute dimension (interests, artists, genres, dishes, drinks,
//! dish categories, drink categories) is compared on its own; counts are
//! never blended into a single score.

use std::collections::HashSet;
use std::hash::Hash;

/// Size of the intersection of two sets
pub fn overlap_count<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|item| large.contains(item)).count()
}

/// Number of distinct items of `items` found in `wanted`
///
/// Duplicates in `items` count once, so this equals
/// `overlap_count(&items.collect(), wanted)`.
pub fn distinct_hits<'a, T, I>(items: I, wanted: &HashSet<T>) -> usize
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let seen: HashSet<&T> = items.into_iter().filter(|i| wanted.contains(*i)).collect();
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_overlap_count_basic() {
        assert_eq!(overlap_count(&set(&[1, 2, 3]), &set(&[2, 3, 4])), 2);
    }

    #[test]
    fn test_overlap_count_disjoint_and_empty() {
        assert_eq!(overlap_count(&set(&[1, 2]), &set(&[3])), 0);
        assert_eq!(overlap_count(&set(&[]), &set(&[3])), 0);
    }

    #[test]
    fn test_overlap_count_symmetric() {
        let a = set(&[1, 5, 9, 12]);
        let b = set(&[9, 1]);
        assert_eq!(overlap_count(&a, &b), overlap_count(&b, &a));
    }

    #[test]
    fn test_distinct_hits_ignores_duplicates() {
        let categories = [7, 7, 8, 9];
        assert_eq!(distinct_hits(categories.iter(), &set(&[7, 9, 10])), 2);
    }
}
