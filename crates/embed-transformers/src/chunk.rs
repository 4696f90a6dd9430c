//! Order-preserving batching helpers.

/// Split `items` into contiguous chunks of at most `size` elements.
///
/// Chunks keep the input order and only the last one may be shorter.
/// A `size` of zero is treated as one.
pub fn chunk_array<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    chunk_slices(items, size)
        .into_iter()
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Borrowing variant of [`chunk_array`].
pub fn chunk_slices<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_chunks() {
        let items: Vec<u32> = vec![];
        assert!(chunk_array(&items, 3).is_empty());
    }

    #[test]
    fn test_last_chunk_is_shorter() {
        let chunks = chunk_array(&[1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_exact_multiple() {
        let chunks = chunk_slices(&["a", "b", "c", "d"], 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], &["c", "d"]);
    }

    #[test]
    fn test_size_larger_than_input() {
        let chunks = chunk_array(&[1, 2, 3], 512);
        assert_eq!(chunks, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_zero_size_acts_as_one() {
        let chunks = chunk_array(&[7, 8], 0);
        assert_eq!(chunks, vec![vec![7], vec![8]]);
    }

    #[test]
    fn test_concatenation_restores_input() {
        let items: Vec<usize> = (0..1030).collect();
        let flattened: Vec<usize> = chunk_array(&items, 512).into_iter().flatten().collect();
        assert_eq!(flattened, items);
    }
}
