use rand::Rng;
use rand::rngs::SmallRng;

pub const MARKS: [char; 6] = ['.', ',', '!', '?', ';', ':'];

pub fn random_mark(rng: &mut SmallRng) -> char {
    MARKS[rng.gen_range(0..MARKS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_marks_drawn_from_set() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut seen = [false; MARKS.len()];
        for _ in 0..600 {
            let mark = random_mark(&mut rng);
            let idx = MARKS.iter().position(|&m| m == mark).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s), "every mark should appear: {seen:?}");
    }
}
