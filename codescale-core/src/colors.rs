/// Coarse quality band for a `[0, 10]` score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 8.0 {
            ScoreBand::Excellent
        } else if score >= 6.0 {
            ScoreBand::Good
        } else if score >= 4.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// Dependency-injection seam for score color mapping.
///
/// Implement this trait to provide alternative palettes (e.g. colour-blind
/// friendly ones).  The built-in implementation is [`DefaultTheme`].
pub trait ColorTheme: Send + Sync {
    /// Terminal color name accepted by the `colored` crate (e.g. `"green"`).
    fn terminal_color(&self, band: ScoreBand) -> &'static str;
}

pub struct DefaultTheme;

impl ColorTheme for DefaultTheme {
    fn terminal_color(&self, band: ScoreBand) -> &'static str {
        match band {
            ScoreBand::Excellent => "green",
            ScoreBand::Good      => "cyan",
            ScoreBand::Fair      => "yellow",
            ScoreBand::Poor      => "red",
        }
    }
}
