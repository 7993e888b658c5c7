/// Number of error samples the derivative is averaged over
pub const DERIVATIVE_WINDOW: usize = 50;

/// Fixed length window of error samples, oldest evicted on every push.
/// Unfilled slots read as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorHistory<const N: usize> {
    samples: [f32; N],
    /// Slot holding the oldest sample, written next
    head: usize,
}

impl<const N: usize> Default for ErrorHistory<N> {
    fn default() -> Self {
        Self {
            samples: [0.0; N],
            head: 0,
        }
    }
}

impl<const N: usize> ErrorHistory<N> {
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.samples = [0.0; N];
        self.head = 0;
    }

    /// Append `sample` as the newest entry and return the evicted oldest one.
    pub fn push(&mut self, sample: f32) -> f32 {
        let evicted = self.samples[self.head];

        self.samples[self.head] = sample;
        self.head = (self.head + 1) % N;

        evicted
    }

    /// Sample `age` pushes ago, 0 being the newest. Ages past the window
    /// return the oldest sample.
    pub fn from_end(&self, age: usize) -> f32 {
        let age = age.min(N - 1);

        self.samples[(self.head + N - 1 - age) % N]
    }

    #[inline]
    pub fn newest(&self) -> f32 {
        self.from_end(0)
    }

    #[inline]
    pub fn oldest(&self) -> f32 {
        self.samples[self.head]
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..N).map(move |i| self.samples[(self.head + i) % N])
    }
}
