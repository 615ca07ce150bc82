use super::error::RankError;
use super::generator::RankGenerator;
use super::value::Rank;

/// Assign evenly spaced ranks to `items`, in the given order.
///
/// With `n` items and an alphabet of `len` chars, the k-th item gets the
/// single char at index `round((k+1) * len / (n+1))`. Once a single char can
/// no longer tell `n` items apart, the same spacing is applied over the
/// smallest fixed width `w` with `len^w > n`, and trailing min chars are
/// trimmed (which leaves the padded order unchanged).
///
/// `w` must stay below the generator's `max_len`: keys of width `w` can
/// always be split with one extra char, so any `before`, `after` or
/// `between` on the result fits.
pub fn rebalance<T: Clone>(
    generator: &RankGenerator,
    items: &[T],
) -> Result<Vec<(T, Rank)>, RankError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let alphabet = generator.alphabet();
    let base = alphabet.len() as u128;
    let slots = items.len() as u128 + 1;

    let mut width = 1usize;
    let mut space = base;
    while space < slots {
        space = space
            .checked_mul(base)
            .ok_or_else(|| exhausted(generator, items.len()))?;
        width += 1;
    }
    if width >= generator.max_len() {
        return Err(exhausted(generator, items.len()));
    }

    let mut out = Vec::with_capacity(items.len());
    for (k, item) in items.iter().enumerate() {
        let k = k as u128 + 1;
        // round(k * space / slots), halves rounding up
        let value = (2 * k * space + slots) / (2 * slots);
        let rank = Rank::from_digits(&to_digits(value, base, width), alphabet)?;
        out.push((item.clone(), rank));
    }

    tracing::debug!(
        count = items.len(),
        width,
        "rebalanced {} items",
        items.len()
    );
    Ok(out)
}

/// Fixed-width base-`base` digits of `value`, min chars trimmed from the end.
fn to_digits(mut value: u128, base: u128, width: usize) -> Vec<usize> {
    let mut digits = vec![0usize; width];
    for slot in digits.iter_mut().rev() {
        *slot = (value % base) as usize;
        value /= base;
    }
    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    digits
}

fn exhausted(generator: &RankGenerator, count: usize) -> RankError {
    RankError::ExhaustedPrecision {
        near: format!("{} items", count),
        max_len: generator.max_len(),
    }
}
