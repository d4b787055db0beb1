const DOT_FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Braille dot spinner advanced one frame per host tick.
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % DOT_FRAMES.len();
    }

    pub fn frame(&self) -> &'static str {
        DOT_FRAMES[self.frame]
    }
}

#[cfg(test)]
mod tests {
    use super::{DOT_FRAMES, Spinner};

    #[test]
    fn tick_cycles_through_frames() {
        let mut spinner = Spinner::default();
        let first = spinner.frame();
        for _ in 0..DOT_FRAMES.len() {
            spinner.tick();
        }
        assert_eq!(spinner.frame(), first);
        spinner.tick();
        assert_ne!(spinner.frame(), first);
    }
}
