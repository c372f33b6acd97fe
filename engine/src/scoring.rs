// Momentum score rule table
use shared::TrendLabel;

/// The indicator readings the rule table looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub close: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub rsi: f64,
    pub macd_histogram: f64,
    pub macd_above_signal: bool,
    pub volume_ratio: f64,
    pub adx: f64,
    pub bullish_crossover: bool,
    pub bearish_crossover: bool,
}

/// Points awarded per category. Each category contributes at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub trend: i32,
    pub rsi: i32,
    pub macd: i32,
    pub volume: i32,
    pub adx: i32,
    pub crossover: i32,
}

impl ScoreBreakdown {
    /// Sum of all categories clamped to `[0, 100]`.
    pub fn total(&self) -> u8 {
        let sum = self.trend + self.rsi + self.macd + self.volume + self.adx + self.crossover;
        sum.clamp(0, 100) as u8
    }
}

pub fn score_breakdown(inputs: &ScoreInputs) -> ScoreBreakdown {
    let ScoreInputs {
        close,
        ema20,
        ema50,
        ema200,
        rsi,
        ..
    } = *inputs;

    let trend = if close > ema20 && ema20 > ema50 && ema50 > ema200 {
        30
    } else if close > ema50 && ema50 > ema200 {
        20
    } else if close > ema200 {
        10
    } else {
        0
    };

    let rsi = if (60.0..80.0).contains(&rsi) {
        20
    } else if (50.0..60.0).contains(&rsi) || (80.0..=90.0).contains(&rsi) {
        10
    } else {
        0
    };

    let macd = if inputs.macd_histogram > 0.0 && inputs.macd_above_signal { 15 } else { 0 };

    let volume = if inputs.volume_ratio > 1.5 {
        15
    } else if inputs.volume_ratio > 1.2 {
        10
    } else {
        0
    };

    let adx = if inputs.adx > 30.0 {
        20
    } else if inputs.adx > 25.0 {
        15
    } else if inputs.adx > 20.0 {
        10
    } else {
        0
    };

    let crossover = match (inputs.bullish_crossover, inputs.bearish_crossover) {
        (true, false) => 10,
        (false, true) => -10,
        _ => 0,
    };

    ScoreBreakdown {
        trend,
        rsi,
        macd,
        volume,
        adx,
        crossover,
    }
}

pub fn momentum_score(inputs: &ScoreInputs) -> u8 {
    score_breakdown(inputs).total()
}

pub fn trend_label(score: u8) -> TrendLabel {
    TrendLabel::from_score(score)
}
