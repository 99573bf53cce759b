//! Stack growth for the recursive passes over model expressions.
//!
//! Dependency ordering, type inference, deep copying and constant evaluation
//! all recurse along the expression tree, and a generated model can nest
//! thousands of binary operators or chained declarations. Each of those
//! walks wraps its recursive step in [`ensure_sufficient_stack`].
//!
//! On native targets the `stacker` crate allocates a fresh segment when the
//! remaining stack drops below the red zone. On `wasm32` the call is a plain
//! passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn infer(&mut self, id: ExprId) -> Result<(), TypeCheckError> {
///     ensure_sufficient_stack(|| self.infer_inner(id))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Passthrough on `wasm32`.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shape of a left-leaning `a + (b + (c + ...))` chain.
    enum Chain {
        Leaf,
        Node(Box<Chain>),
    }

    fn build(depth: usize) -> Chain {
        let mut chain = Chain::Leaf;
        for _ in 0..depth {
            chain = Chain::Node(Box::new(chain));
        }
        chain
    }

    fn depth_of(chain: &Chain) -> usize {
        ensure_sufficient_stack(|| match chain {
            Chain::Leaf => 0,
            Chain::Node(inner) => depth_of(inner) + 1,
        })
    }

    #[test]
    fn test_shallow_chain() {
        assert_eq!(depth_of(&build(16)), 16);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let chain = build(200_000);
        assert_eq!(depth_of(&chain), 200_000);
        // Dropping the boxed chain recursively would overflow on its own.
        let mut cur = chain;
        while let Chain::Node(inner) = cur {
            cur = *inner;
        }
    }

    #[test]
    fn test_propagates_result() {
        let r: Result<u8, String> = ensure_sufficient_stack(|| Err("boom".to_string()));
        assert_eq!(r, Err("boom".to_string()));
    }
}
