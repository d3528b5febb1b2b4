pub(crate) fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut divisor = 5usize;
    while divisor.checked_mul(divisor).is_some_and(|square| square <= n) {
        if n % divisor == 0 || n % (divisor + 2) == 0 {
            return false;
        }
        divisor += 6;
    }
    true
}

/// Smallest prime `>= n`, or `None` if there is none below `usize::MAX`.
pub(crate) fn next_prime(n: usize) -> Option<usize> {
    if n <= 2 {
        return Some(2);
    }

    let mut candidate = n | 1;
    while !is_prime(candidate) {
        candidate = candidate.checked_add(2)?;
    }
    Some(candidate)
}
