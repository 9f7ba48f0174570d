use rand::Rng;
use rand::rngs::SmallRng;

/// A number in 10..=99, used in place of a dictionary word.
pub fn two_digit_number(rng: &mut SmallRng) -> String {
    rng.gen_range(10..=99u8).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_always_two_digits() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let n = two_digit_number(&mut rng);
            assert_eq!(n.len(), 2, "{n}");
            assert!(n.chars().all(|c| c.is_ascii_digit()));
            assert!(!n.starts_with('0'));
        }
    }
}
