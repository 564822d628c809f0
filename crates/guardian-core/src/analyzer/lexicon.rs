//! Word, phrase, and category tables backing the per-axis heuristics.
//!
//! All lexicons live here as data so they can be reviewed and extended
//! without touching the scoring logic. Entries are matched against
//! lowercased text; multi-word entries are substring phrases.

/// Sensitive keywords scanned as case-insensitive substrings. Each first
/// occurrence contributes 0.2 to the composite score.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "credit card",
    "social security",
    "private",
    "classified",
    "illegal",
    "secret",
    "confidential",
    "personal",
    "ssn",
    "cvv",
    "banking",
    "authentication",
    "access code",
    "credentials",
    "hack",
    "exploit",
    "bypass",
    "security",
    "token",
];

/// Positive sentiment words.
pub const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "wonderful", "happy", "positive", "best", "love", "like",
    "helpful", "useful",
];

/// Negative sentiment words.
pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "sad", "negative", "worst", "hate", "dislike",
    "useless", "harmful", "angry", "upset",
];

/// Toxic words; occurrence count is scaled by [`TOXICITY_WEIGHT`].
pub const TOXIC_WORDS: &[&str] = &[
    "idiot", "stupid", "dumb", "retard", "moron", "loser", "kill", "die", "attack", "destroy",
    "hate", "violent", "death",
];

/// Profane words; occurrence count is scaled by [`PROFANITY_WEIGHT`].
pub const PROFANE_WORDS: &[&str] = &[
    "fuck", "shit", "ass", "damn", "bitch", "cunt", "dick", "bastard",
];

/// Phrases that signal biased generalizations; scaled by [`BIAS_WEIGHT`].
pub const BIASED_PHRASES: &[&str] = &[
    "all men",
    "all women",
    "those people",
    "you people",
    "typical",
    "always",
    "never",
    "everyone knows",
    "obviously",
    "clearly",
    "all immigrants",
    "all conservatives",
    "all liberals",
    "those immigrants",
    "those minorities",
    "all muslims",
    "all christians",
    "all jews",
];

/// Emotionally charged words; scaled by [`EMOTIONAL_WEIGHT`].
pub const EMOTIONAL_WORDS: &[&str] = &[
    "love",
    "hate",
    "adore",
    "despise",
    "excited",
    "furious",
    "terrified",
    "ecstatic",
    "heartbroken",
    "devastated",
    "thrilled",
    "angry",
    "sad",
    "happy",
    "overjoyed",
    "frustrated",
    "exhilarated",
    "depressed",
    "anxious",
    "outraged",
    "scared",
];

/// Manipulative phrasing; scaled by [`MANIPULATIVE_WEIGHT`].
pub const MANIPULATIVE_PHRASES: &[&str] = &[
    "you must",
    "you need to",
    "you have to",
    "don't you think",
    "everyone is doing it",
    "limited time",
    "act now",
    "last chance",
    "once in a lifetime",
    "you won't regret",
    "trust me",
    "believe me",
    "you'd be foolish",
    "don't be stupid",
    "i need you to",
    "only you can",
    "i'm begging you",
    "i'm counting on you",
    "i'll be disappointed if you don't",
];

/// Jailbreak phrases; each containment counts +1 toward the jailbreak
/// intent tally (higher-precision regexes in `axes` count +2).
pub const JAILBREAK_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "ignore prior instructions",
    "ignore your programming",
    "disregard your instructions",
    "system prompt",
    "pretend to be",
    "simulate being",
    "you are now",
    "act as if",
    "bypass your",
    "let's play a game",
    "hypothetically",
    "please continue",
    "complete the text",
    "write from another perspective",
    "for educational purposes",
    "for a fictional scenario",
    "in a fictional world",
    "as a thought experiment",
    "bypass safety",
    "ignore ethical guidelines",
    "ignore your ethical constraints",
    "let's imagine",
    "i want you to pretend",
];

/// PII keywords counted alongside the structural PII patterns.
pub const PII_KEYWORDS: &[&str] = &[
    "address",
    "password",
    "social security",
    "ssn",
    "credit card",
    "secret",
    "private",
    "phone number",
];

/// Keyword extraction categories. Keys in the extracted map are
/// `category:term`.
pub const KEYWORD_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "security",
        &[
            "password",
            "secure",
            "vulnerability",
            "access",
            "protection",
            "authentication",
            "authorization",
            "threat",
            "risk",
        ],
    ),
    (
        "finance",
        &[
            "money",
            "payment",
            "bank",
            "credit",
            "debit",
            "transaction",
            "financial",
            "fund",
            "cash",
            "invest",
        ],
    ),
    (
        "personal",
        &[
            "name",
            "address",
            "phone",
            "email",
            "identification",
            "identity",
            "profile",
            "personal",
            "private",
            "confidential",
        ],
    ),
    (
        "harmful",
        &[
            "hack",
            "exploit",
            "attack",
            "damage",
            "destroy",
            "harm",
            "dangerous",
            "malicious",
            "virus",
            "malware",
        ],
    ),
    (
        "sensitive",
        &[
            "secret",
            "classified",
            "private",
            "confidential",
            "restricted",
            "sensitive",
            "hidden",
            "undisclosed",
            "internal",
        ],
    ),
    (
        "prompt_hacking",
        &[
            "prompt",
            "instruction",
            "command",
            "directive",
            "forget",
            "ignore",
            "bypass",
            "override",
            "disregard",
            "pretend",
        ],
    ),
];

/// Per-axis scaling weights, empirically chosen in the original rule set.
pub const TOXICITY_WEIGHT: f64 = 5.0;
pub const PROFANITY_WEIGHT: f64 = 8.0;
pub const BIAS_WEIGHT: f64 = 3.0;
pub const EMOTIONAL_WEIGHT: f64 = 4.0;
pub const MANIPULATIVE_WEIGHT: f64 = 4.0;

/// Scaling applied to each PII hit.
pub const PII_HIT_WEIGHT: f64 = 0.25;

/// Scaling applied to the jailbreak tally.
pub const JAILBREAK_HIT_WEIGHT: f64 = 0.2;

/// Score added for each distinct sensitive keyword.
pub const SENSITIVE_KEYWORD_WEIGHT: f64 = 0.2;

/// Scaling applied to keyword-extraction frequencies.
pub const KEYWORD_FREQUENCY_WEIGHT: f64 = 0.3;
