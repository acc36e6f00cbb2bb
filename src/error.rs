use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputValidationError {
    #[error("section id must not be empty (title: {title:?})")]
    EmptyId { title: String },

    #[error("section id {id:?} appears more than once; shared or cyclic references are not allowed")]
    DuplicateId { id: String },

    #[error("section {id:?} has negative word count {word_count}")]
    NegativeWordCount { id: String, word_count: i64 },

    #[error("section {id:?} has word count {word_count} above the supported maximum of {max}")]
    WordCountTooLarge { id: String, word_count: i64, max: u32 },

    #[error("section {id:?} has quality score {score} outside 0..=100")]
    ScoreOutOfRange { id: String, score: i64 },

    #[error("section {id:?} has unknown kind {kind:?}")]
    InvalidKind { id: String, kind: String },

    #[error("section {id:?} has unknown status {status:?}")]
    InvalidStatus { id: String, status: String },

    #[error("section {id:?} has rank {rank} but its parent {parent_id:?} has rank {parent_rank}")]
    RankOrder {
        id: String,
        rank: u32,
        parent_id: String,
        parent_rank: u32,
    },

    #[error("section {id:?} has rank {rank} but its siblings have rank {expected}")]
    SiblingRankMismatch { id: String, rank: u32, expected: u32 },

    #[error("tree has {count} sections, above the configured maximum of {max}")]
    TooManySections { count: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("structure extraction failed: {0}")]
    Extraction(String),

    #[error("structure extraction returned unparsable content: {0}")]
    UnparsableStructure(String),

    #[error("structure extraction returned an empty tree")]
    EmptyStructure,

    #[error("invalid section tree: {0}")]
    InvalidInput(#[from] InputValidationError),

    #[error("citation lookup failed: {0}")]
    Citations(String),
}

#[derive(Error, Debug)]
pub enum RecommendationGenerationError {
    #[error("recommendation advisor failed: {0}")]
    Advisor(String),

    #[error("recommendation advisor returned unparsable content: {0}")]
    Unparsable(String),

    #[error("recommendation advisor returned no valid suggestions")]
    NoValidSuggestions,
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
