/// Countdown QuickPerm: visits every permutation of a slice with one swap per step.
#[derive(Clone, Debug)]
pub struct QuickPerm {
    p: Vec<usize>,
    i: usize,
}

impl QuickPerm {
    pub fn new(n: usize) -> Self {
        Self {
            p: (0..=n).collect(),
            i: 1,
        }
    }

    /// Applies the next swap to `a`. Returns `false` once all permutations of
    /// the starting arrangement have been produced, leaving `a` untouched.
    pub fn advance<T>(&mut self, a: &mut [T]) -> bool {
        let n = self.p.len() - 1;
        if self.i >= n || n != a.len() {
            return false;
        }
        let i = self.i;
        self.p[i] -= 1;
        let j = if i % 2 == 1 { self.p[i] } else { 0 };
        a.swap(j, i);
        self.i = 1;
        while self.p[self.i] == 0 {
            self.p[self.i] = self.i;
            self.i += 1;
        }
        true
    }
}

/// `n!`, saturating at `usize::MAX`.
pub fn factorial(n: usize) -> usize {
    (2..=n).fold(1usize, |acc, k| acc.saturating_mul(k))
}
