// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The eight dimension scorers feeding the classifier.
//!
//! Every scorer is a pure function returning a value in `[0, 1]`. Most count
//! pattern hits, multiply by a per-hit weight, and cap each contribution so
//! no single signal saturates its axis. Volume-style axes use breakpoint
//! interpolation instead.

use std::sync::LazyLock;

use modelgate_config::model::DimensionWeights;
use regex::Regex;

/// Request metadata consulted alongside the message text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMeta<'a> {
    /// System prompt, if the request carries one.
    pub system_prompt: Option<&'a str>,
    /// Number of messages in the conversation, including the current one.
    pub message_count: usize,
}

/// One score per classifier axis, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DimensionScores {
    pub token_count: f64,
    pub code_presence: f64,
    pub reasoning_markers: f64,
    pub simple_indicators: f64,
    pub multi_step: f64,
    pub question_complexity: f64,
    pub system_prompt_complexity: f64,
    pub conversation_depth: f64,
}

impl DimensionScores {
    /// Evaluate all eight scorers.
    pub fn score(text: &str, meta: &RequestMeta<'_>) -> Self {
        Self {
            token_count: token_count(text),
            code_presence: code_presence(text),
            reasoning_markers: reasoning_markers(text),
            simple_indicators: simple_indicators(text),
            multi_step: multi_step(text),
            question_complexity: question_complexity(text),
            system_prompt_complexity: system_prompt_complexity(meta.system_prompt),
            conversation_depth: conversation_depth(meta.message_count),
        }
    }

    /// Dot product with a weight vector. Not clamped.
    pub fn weighted_sum(&self, w: &DimensionWeights) -> f64 {
        self.token_count * w.token_count
            + self.code_presence * w.code_presence
            + self.reasoning_markers * w.reasoning_markers
            + self.simple_indicators * w.simple_indicators
            + self.multi_step * w.multi_step
            + self.question_complexity * w.question_complexity
            + self.system_prompt_complexity * w.system_prompt_complexity
            + self.conversation_depth * w.conversation_depth
    }

    /// `(name, score)` pairs in axis order.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("token_count", self.token_count),
            ("code_presence", self.code_presence),
            ("reasoning_markers", self.reasoning_markers),
            ("simple_indicators", self.simple_indicators),
            ("multi_step", self.multi_step),
            ("question_complexity", self.question_complexity),
            ("system_prompt_complexity", self.system_prompt_complexity),
            ("conversation_depth", self.conversation_depth),
        ]
    }
}

const TOKEN_BREAKPOINTS: &[(f64, f64)] = &[
    (0.0, 0.0),
    (50.0, 0.1),
    (200.0, 0.3),
    (500.0, 0.5),
    (1000.0, 0.7),
    (3000.0, 0.9),
    (8000.0, 1.0),
];

const QUESTION_BREAKPOINTS: &[(f64, f64)] =
    &[(0.0, 0.0), (1.0, 0.2), (2.0, 0.4), (4.0, 0.7), (6.0, 1.0)];

const SYSTEM_PROMPT_BREAKPOINTS: &[(f64, f64)] =
    &[(0.0, 0.0), (100.0, 0.3), (500.0, 0.6), (2000.0, 1.0)];

const DEPTH_BREAKPOINTS: &[(f64, f64)] = &[
    (1.0, 0.0),
    (3.0, 0.2),
    (6.0, 0.4),
    (10.0, 0.6),
    (20.0, 0.8),
    (40.0, 1.0),
];

/// Greetings and acknowledgments that score 1.0 on the simple axis outright.
const SIMPLE_EXACT: &[&str] = &[
    "hi", "hello", "hey", "yo", "thanks", "thank you", "thx", "ty", "bye", "goodbye", "ok",
    "okay", "k", "yes", "no", "sure", "good", "great", "cool", "nice", "wow", "lol", "haha",
    "yep", "nope", "yea", "yeah", "nah", "got it", "sounds good", "good morning",
    "good night", "ping",
];

const CASUAL_QUESTIONS: &[&str] = &[
    "what time",
    "what day",
    "what date",
    "how are you",
    "what's up",
    "who are you",
    "what's your name",
    "what is your name",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"```[\s\S]*?```"));

static INLINE_CODE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"`[^`\n]+`",
        r"\b(fn|def|class|function|impl|struct|enum|const|let|var|import|return|pub)\s+\w",
        r"(?m)[{};]\s*$",
        r"=>|->|::",
        r"\b\w+\([^()\n]*\)\s*[{;]",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static STRONG_REASONING: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(step[- ]by[- ]step|prove|derive|analy[sz]e|trade-?offs?|reason through|think through|root cause|compare and contrast|evaluate|formally)\b",
    )
});

static WEAK_REASONING: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(explain|why|compare|consider|implications?|pros and cons|because|how does|justify|assess)\b",
    )
});

static GREETING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(hi|hello|hey|thanks|thank you|good (morning|afternoon|evening))\b")
});

static BUILD_VERBS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(build|implement|refactor|create|design|set up|migrate|deploy|integrate)\b")
});

static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^\s*\d+[.)]\s+"));

static SEQUENCING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(first|then|next|after that|afterwards|finally)\b"));

static OPEN_ENDED: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(how (would|could|should|can|do)|what are the|why (is|are|do|does|would)|in what ways|what if)\b",
    )
});

static CONSTRAINT_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(must|never|always|do not|don't|only|required|format|json|schema)\b")
});

/// Cheap token estimate: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Piecewise-linear interpolation over `(value, score)` breakpoints.
///
/// Clamps to the first score below the first breakpoint and to the last
/// score above the last. An empty breakpoint list scores 0.
pub fn interpolate(value: f64, breakpoints: &[(f64, f64)]) -> f64 {
    let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) =
        (breakpoints.first(), breakpoints.last())
    else {
        return 0.0;
    };
    if value <= first_x {
        return first_y;
    }
    if value >= last_x {
        return last_y;
    }
    for pair in breakpoints.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if value <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (value - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    last_y
}

fn capped(hits: usize, per_hit: f64, cap: f64) -> f64 {
    (hits as f64 * per_hit).min(cap)
}

pub fn token_count(text: &str) -> f64 {
    interpolate(estimate_tokens(text) as f64, TOKEN_BREAKPOINTS)
}

pub fn code_presence(text: &str) -> f64 {
    let fenced = FENCED_BLOCK.find_iter(text).count();
    let inline: usize = INLINE_CODE.iter().map(|re| re.find_iter(text).count()).sum();
    (capped(fenced, 0.4, 0.8) + capped(inline, 0.1, 0.3)).min(1.0)
}

pub fn reasoning_markers(text: &str) -> f64 {
    let strong = STRONG_REASONING.find_iter(text).count();
    let weak = WEAK_REASONING.find_iter(text).count();
    (capped(strong, 0.3, 0.6) + capped(weak, 0.15, 0.45)).min(1.0)
}

pub fn simple_indicators(text: &str) -> f64 {
    let trimmed = text.trim();
    let normalized = trimmed
        .to_lowercase()
        .trim_end_matches(['!', '.', '?', ',', ' '])
        .to_string();
    if SIMPLE_EXACT.contains(&normalized.as_str()) {
        return 1.0;
    }

    let mut score = 0.0;
    if GREETING_PREFIX.is_match(trimmed) {
        score += 0.4;
    }
    if CASUAL_QUESTIONS.iter().any(|q| normalized.contains(q)) {
        score += 0.4;
    }
    if trimmed.split_whitespace().count() <= 5 {
        score += 0.2;
    }
    f64::min(score, 1.0)
}

pub fn multi_step(text: &str) -> f64 {
    let build = BUILD_VERBS.find_iter(text).count();
    let numbered = NUMBERED_LINE.find_iter(text).count();
    let sequencing = SEQUENCING.find_iter(text).count();
    (capped(build, 0.3, 0.6) + capped(numbered, 0.1, 0.3) + capped(sequencing, 0.1, 0.2)).min(1.0)
}

pub fn question_complexity(text: &str) -> f64 {
    let marks = text.matches('?').count();
    let open = OPEN_ENDED.find_iter(text).count();
    (interpolate(marks as f64, QUESTION_BREAKPOINTS) + capped(open, 0.15, 0.3)).min(1.0)
}

pub fn system_prompt_complexity(system_prompt: Option<&str>) -> f64 {
    let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) else {
        return 0.0;
    };
    let length = interpolate(estimate_tokens(prompt) as f64, SYSTEM_PROMPT_BREAKPOINTS) * 0.6;
    let constraints = capped(CONSTRAINT_MARKERS.find_iter(prompt).count(), 0.1, 0.4);
    (length + constraints).min(1.0)
}

pub fn conversation_depth(message_count: usize) -> f64 {
    interpolate(message_count as f64, DEPTH_BREAKPOINTS)
}
