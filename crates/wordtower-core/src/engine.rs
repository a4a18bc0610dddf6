//! The tower quiz engine.
//!
//! One engine drives one learner's session: floors are started per grade
//! tier, questions are built from the floor's sampled words with
//! distractors drawn from the graph, and answers are graded into floor
//! results.
//!
//! A floor asks either multiple-choice questions ([`QuizMode::Choice`]) or
//! spelling questions ([`QuizMode::Spell`]), chosen by [`QuizConfig::mode`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{normalize_key, normalize_root, Word, WordRef};
use crate::report::{FloorResult, FloorScore, SessionSummary};
use crate::traits::{GradingEvent, GradingSink, GraphStore};

/// Points for a correct multiple-choice answer.
pub const CHOICE_POINTS: u32 = 10;
/// Points for a word spelled without a hint.
pub const SPELL_POINTS: u32 = 20;
/// Points for a word spelled after taking the hint.
pub const SPELL_HINT_POINTS: u32 = 10;

/// Letters revealed by a spelling hint.
const HINT_LETTERS: usize = 2;

/// Kind of question a floor asks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Pick the gloss of the shown word.
    #[default]
    Choice,
    /// Type the word whose gloss is shown.
    Spell,
}

impl std::fmt::Display for QuizMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizMode::Choice => write!(f, "choice"),
            QuizMode::Spell => write!(f, "spell"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "choice" => Ok(QuizMode::Choice),
            "spell" => Ok(QuizMode::Spell),
            other => Err(format!("unknown quiz mode: {other} (expected choice or spell)")),
        }
    }
}

/// Configuration for the quiz engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Words sampled per floor.
    #[serde(default = "default_questions_per_floor")]
    pub questions_per_floor: usize,
    /// Options per question, correct gloss included.
    #[serde(default = "default_options_per_question")]
    pub options_per_question: usize,
    /// Highest floor / grade tier.
    #[serde(default = "default_grade_count")]
    pub grade_count: u8,
    /// Whether multi-word phrases may be asked as questions.
    #[serde(default)]
    pub include_phrases: bool,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub mode: QuizMode,
    /// Tries per spelling question before the word is counted as missed.
    #[serde(default = "default_spelling_attempts")]
    pub spelling_attempts: u8,
}

fn default_questions_per_floor() -> usize {
    10
}

fn default_options_per_question() -> usize {
    4
}

fn default_grade_count() -> u8 {
    9
}

fn default_spelling_attempts() -> u8 {
    3
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions_per_floor: default_questions_per_floor(),
            options_per_question: default_options_per_question(),
            grade_count: default_grade_count(),
            include_phrases: false,
            seed: None,
            mode: QuizMode::default(),
            spelling_attempts: default_spelling_attempts(),
        }
    }
}

impl QuizConfig {
    /// Reject settings under which a floor could never be played.
    pub fn validate(&self) -> Result<(), QuizError> {
        let invalid =
            |reason: &str| -> Result<(), QuizError> { Err(QuizError::InvalidConfig(reason.to_string())) };
        if self.questions_per_floor == 0 {
            return invalid("questions_per_floor must be at least 1");
        }
        if self.options_per_question < 2 {
            return invalid("options_per_question must be at least 2");
        }
        if self.grade_count == 0 {
            return invalid("grade_count must be at least 1");
        }
        if self.spelling_attempts == 0 {
            return invalid("spelling_attempts must be at least 1");
        }
        Ok(())
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    FloorInProgress { tier: u8 },
    FloorComplete { tier: u8 },
    SessionComplete,
}

/// Non-fatal notes from starting a floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorWarning {
    /// The grade had fewer eligible words than a full floor.
    ReducedCount {
        tier: u8,
        available: usize,
        requested: usize,
    },
}

impl std::fmt::Display for FloorWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloorWarning::ReducedCount {
                tier,
                available,
                requested,
            } => write!(
                f,
                "floor {tier} has only {available} of {requested} questions"
            ),
        }
    }
}

/// Returned by [`QuizEngine::start_floor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorStart {
    pub tier: u8,
    pub mode: QuizMode,
    pub question_count: usize,
    pub warning: Option<FloorWarning>,
}

/// A multiple-choice question about one word.
///
/// The correct gloss stays inside the engine until the question is
/// answered; [`AnswerOutcome::correct_gloss`] reveals it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub tier: u8,
    /// 1-based position within the floor.
    pub number: usize,
    /// Questions in the floor.
    pub total: usize,
    /// The word being asked about.
    pub prompt: String,
    pub phonetic: Option<String>,
    pub pos: Option<String>,
    /// Candidate glosses in display order.
    pub options: Vec<String>,
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub question_id: Uuid,
    pub correct: bool,
    pub correct_gloss: String,
    pub points: u32,
    /// Floor score including this answer.
    pub score: FloorScore,
    pub floor_complete: bool,
}

/// A spelling question: the gloss is shown and the word must be typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellingPrompt {
    pub id: Uuid,
    pub tier: u8,
    pub number: usize,
    pub total: usize,
    pub gloss: String,
    pub phonetic: Option<String>,
    pub pos: Option<String>,
    /// Characters in the expected answer.
    pub length: usize,
    pub attempts: u8,
}

/// Result of one spelling attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SpellingOutcome {
    pub question_id: Uuid,
    pub correct: bool,
    /// Tries left on this question; 0 once it is resolved.
    pub attempts_left: u8,
    /// The word, revealed once the question is resolved.
    pub answer: Option<String>,
    pub points: u32,
    pub score: FloorScore,
    pub floor_complete: bool,
}

impl SpellingOutcome {
    /// Whether the question is settled (spelled, failed or skipped).
    pub fn resolved(&self) -> bool {
        self.answer.is_some()
    }
}

enum Asked {
    Choice { options: Vec<String>, correct_index: usize },
    Spell { attempts_left: u8, hinted: bool },
}

struct IssuedQuestion {
    word: Word,
    asked: Asked,
}

struct FloorRun {
    tier: u8,
    mode: QuizMode,
    total: usize,
    queue: VecDeque<Word>,
    /// Every word of the floor's grade, phrases included.
    grade_pool: Vec<Word>,
    /// Words of every grade, loaded on first backfill.
    whole_pool: Option<Vec<Word>>,
    issued: HashMap<Uuid, IssuedQuestion>,
    score: FloorScore,
    points: u32,
    missed: Vec<WordRef>,
}

/// The tower quiz engine.
pub struct QuizEngine {
    store: Arc<dyn GraphStore>,
    config: QuizConfig,
    rng: StdRng,
    state: SessionState,
    floor: Option<FloorRun>,
    /// Questions resolved in this session, across every floor.
    answered: HashSet<Uuid>,
    results: Vec<FloorResult>,
    session_id: Uuid,
    started_at: DateTime<Utc>,
}

impl QuizEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: QuizConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            config,
            rng,
            state: SessionState::NotStarted,
            floor: None,
            answered: HashSet::new(),
            results: Vec::new(),
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Completed floors so far.
    pub fn results(&self) -> &[FloorResult] {
        &self.results
    }

    /// Score of the current (or just completed) floor.
    pub fn score(&self) -> Option<FloorScore> {
        self.floor.as_ref().map(|f| f.score)
    }

    /// Sample a new floor of questions from grade `tier`.
    pub async fn start_floor(&mut self, tier: u8) -> Result<FloorStart, QuizError> {
        match self.state {
            SessionState::FloorInProgress { tier } => {
                return Err(QuizError::FloorInProgress { tier })
            }
            SessionState::SessionComplete => return Err(QuizError::SessionComplete),
            SessionState::NotStarted | SessionState::FloorComplete { .. } => {}
        }
        self.config.validate()?;
        if tier < 1 || tier > self.config.grade_count {
            return Err(QuizError::InvalidTier {
                tier,
                max: self.config.grade_count,
            });
        }

        let grade_pool = self.store.query_words_by_grade(tier).await?;
        let mut eligible: Vec<Word> = grade_pool
            .iter()
            .filter(|w| self.config.include_phrases || !w.is_phrase)
            .cloned()
            .collect();
        if eligible.is_empty() {
            return Err(QuizError::InsufficientWords { tier });
        }

        let requested = self.config.questions_per_floor;
        eligible.shuffle(&mut self.rng);
        eligible.truncate(requested);

        let warning = (eligible.len() < requested).then(|| {
            tracing::warn!(
                "floor {tier}: only {} eligible words, wanted {requested}",
                eligible.len()
            );
            FloorWarning::ReducedCount {
                tier,
                available: eligible.len(),
                requested,
            }
        });

        let mode = self.config.mode;
        let question_count = eligible.len();
        self.floor = Some(FloorRun {
            tier,
            mode,
            total: question_count,
            queue: eligible.into(),
            grade_pool,
            whole_pool: None,
            issued: HashMap::new(),
            score: FloorScore::default(),
            points: 0,
            missed: Vec::new(),
        });
        self.state = SessionState::FloorInProgress { tier };
        tracing::info!("started {mode} floor {tier} with {question_count} questions");

        Ok(FloorStart {
            tier,
            mode,
            question_count,
            warning,
        })
    }

    /// Start the floor above the one just completed.
    pub async fn next_floor(&mut self) -> Result<FloorStart, QuizError> {
        match self.state {
            SessionState::FloorComplete { tier } => {
                match tier.checked_add(1).filter(|next| *next <= self.config.grade_count) {
                    Some(next) => self.start_floor(next).await,
                    None => Err(QuizError::TopFloorReached { tier }),
                }
            }
            SessionState::FloorInProgress { tier } => Err(QuizError::FloorNotComplete { tier }),
            SessionState::NotStarted => Err(QuizError::NoActiveFloor),
            SessionState::SessionComplete => Err(QuizError::SessionComplete),
        }
    }

    /// Drop the floor in progress without recording a result.
    pub fn abandon_floor(&mut self) -> Result<(), QuizError> {
        let SessionState::FloorInProgress { tier } = self.state else {
            return Err(QuizError::NoActiveFloor);
        };
        self.floor = None;
        self.state = match self.results.last() {
            Some(last) => SessionState::FloorComplete { tier: last.tier },
            None => SessionState::NotStarted,
        };
        tracing::info!("abandoned floor {tier}");
        Ok(())
    }

    /// The floor in progress and its next word, checked against `mode`.
    fn next_word(&self, mode: QuizMode) -> Result<(u8, Word), QuizError> {
        let tier = match self.state {
            SessionState::FloorInProgress { tier } => tier,
            SessionState::FloorComplete { tier } => return Err(QuizError::FloorExhausted { tier }),
            SessionState::NotStarted => return Err(QuizError::NoActiveFloor),
            SessionState::SessionComplete => return Err(QuizError::SessionComplete),
        };
        let floor = self.floor.as_ref().ok_or(QuizError::NoActiveFloor)?;
        if floor.mode != mode {
            return Err(QuizError::ModeMismatch { mode: floor.mode });
        }
        let word = floor
            .queue
            .front()
            .cloned()
            .ok_or(QuizError::FloorExhausted { tier })?;
        Ok((tier, word))
    }

    /// Build the next multiple-choice question of the current floor.
    pub async fn next_question(&mut self) -> Result<Question, QuizError> {
        let (tier, word) = self.next_word(QuizMode::Choice)?;
        let floor = self.floor.as_ref().ok_or(QuizError::NoActiveFloor)?;

        let need = self.config.options_per_question.saturating_sub(1);
        let mut distractors = pick_distractors(&word, &floor.grade_pool, &[], need, &mut self.rng);

        if distractors.len() < need {
            if floor.whole_pool.is_none() {
                let pool = load_whole_pool(self.store.as_ref(), self.config.grade_count).await?;
                if let Some(floor) = self.floor.as_mut() {
                    floor.whole_pool = Some(pool);
                }
            }
            let floor = self.floor.as_ref().ok_or(QuizError::NoActiveFloor)?;
            let pool = floor.whole_pool.as_deref().unwrap_or_default();
            let more = pick_distractors(
                &word,
                pool,
                &distractors,
                need - distractors.len(),
                &mut self.rng,
            );
            distractors.extend(more);
            if distractors.len() < need {
                tracing::warn!(
                    "'{}': only {} distractors available, wanted {need}",
                    word.key,
                    distractors.len()
                );
            }
        }

        let mut options = distractors;
        options.push(word.gloss.clone());
        options.shuffle(&mut self.rng);
        let correct_index = options
            .iter()
            .position(|o| *o == word.gloss)
            .unwrap_or_default();

        let floor = self.floor.as_mut().ok_or(QuizError::NoActiveFloor)?;
        floor.queue.pop_front();
        let id = Uuid::new_v4();
        let question = Question {
            id,
            tier,
            number: floor.total - floor.queue.len(),
            total: floor.total,
            prompt: word.text.clone(),
            phonetic: word.phonetic.clone(),
            pos: word.pos.clone(),
            options: options.clone(),
        };
        tracing::debug!("question {} on floor {tier}: '{}'", question.number, word.key);
        floor.issued.insert(
            id,
            IssuedQuestion {
                word,
                asked: Asked::Choice {
                    options,
                    correct_index,
                },
            },
        );
        Ok(question)
    }

    /// Pose the next word of a spelling floor.
    pub fn next_spelling(&mut self) -> Result<SpellingPrompt, QuizError> {
        let (tier, word) = self.next_word(QuizMode::Spell)?;
        let attempts = self.config.spelling_attempts;
        let floor = self.floor.as_mut().ok_or(QuizError::NoActiveFloor)?;
        floor.queue.pop_front();

        let id = Uuid::new_v4();
        let prompt = SpellingPrompt {
            id,
            tier,
            number: floor.total - floor.queue.len(),
            total: floor.total,
            gloss: word.gloss.clone(),
            phonetic: word.phonetic.clone(),
            pos: word.pos.clone(),
            length: word.key.chars().count(),
            attempts,
        };
        tracing::debug!("spelling {} on floor {tier}: '{}'", prompt.number, word.key);
        floor.issued.insert(
            id,
            IssuedQuestion {
                word,
                asked: Asked::Spell {
                    attempts_left: attempts,
                    hinted: false,
                },
            },
        );
        Ok(prompt)
    }

    /// An unresolved question of the current floor.
    fn open_question(&mut self, question_id: Uuid) -> Result<&mut IssuedQuestion, QuizError> {
        if self.answered.contains(&question_id) {
            return Err(QuizError::AlreadyAnswered(question_id));
        }
        self.floor
            .as_mut()
            .ok_or(QuizError::NoActiveFloor)?
            .issued
            .get_mut(&question_id)
            .ok_or(QuizError::UnknownQuestion(question_id))
    }

    /// Grade the option at `option` for question `question_id`, reporting
    /// the result to `sink`.
    pub fn submit_answer(
        &mut self,
        question_id: Uuid,
        option: usize,
        sink: &mut dyn GradingSink,
    ) -> Result<AnswerOutcome, QuizError> {
        let issued = self.open_question(question_id)?;
        let Asked::Choice {
            options,
            correct_index,
        } = &issued.asked
        else {
            return Err(QuizError::ModeMismatch {
                mode: QuizMode::Spell,
            });
        };
        if option >= options.len() {
            return Err(QuizError::InvalidOption {
                index: option,
                count: options.len(),
            });
        }
        let correct = option == *correct_index;
        let correct_gloss = issued.word.gloss.clone();
        let points = if correct { CHOICE_POINTS } else { 0 };

        let (score, floor_complete) = self.resolve(question_id, correct, points, sink)?;
        Ok(AnswerOutcome {
            question_id,
            correct,
            correct_gloss,
            points,
            score,
            floor_complete,
        })
    }

    /// Reveal the first letters of a spelling question's word. Taking the
    /// hint lowers the points a correct spelling earns.
    pub fn spelling_hint(&mut self, question_id: Uuid) -> Result<String, QuizError> {
        let issued = self.open_question(question_id)?;
        let Asked::Spell { hinted, .. } = &mut issued.asked else {
            return Err(QuizError::ModeMismatch {
                mode: QuizMode::Choice,
            });
        };
        *hinted = true;
        Ok(hint_for(&issued.word.key))
    }

    /// Check a typed spelling. The question resolves when the answer
    /// matches the word key or when the last attempt is used up.
    pub fn submit_spelling(
        &mut self,
        question_id: Uuid,
        answer: &str,
        sink: &mut dyn GradingSink,
    ) -> Result<SpellingOutcome, QuizError> {
        let issued = self.open_question(question_id)?;
        let Asked::Spell {
            attempts_left,
            hinted,
        } = &mut issued.asked
        else {
            return Err(QuizError::ModeMismatch {
                mode: QuizMode::Choice,
            });
        };
        let correct = normalize_key(answer) == issued.word.key;
        if !correct {
            *attempts_left = attempts_left.saturating_sub(1);
        }
        let left = *attempts_left;
        let points = match (correct, *hinted) {
            (false, _) => 0,
            (true, false) => SPELL_POINTS,
            (true, true) => SPELL_HINT_POINTS,
        };
        let text = issued.word.text.clone();

        if !correct && left > 0 {
            let score = self.score().unwrap_or_default();
            return Ok(SpellingOutcome {
                question_id,
                correct,
                attempts_left: left,
                answer: None,
                points,
                score,
                floor_complete: false,
            });
        }

        let (score, floor_complete) = self.resolve(question_id, correct, points, sink)?;
        Ok(SpellingOutcome {
            question_id,
            correct,
            attempts_left: 0,
            answer: Some(text),
            points,
            score,
            floor_complete,
        })
    }

    /// Give up on a spelling question; the word counts as missed.
    pub fn skip_spelling(
        &mut self,
        question_id: Uuid,
        sink: &mut dyn GradingSink,
    ) -> Result<SpellingOutcome, QuizError> {
        let issued = self.open_question(question_id)?;
        if !matches!(issued.asked, Asked::Spell { .. }) {
            return Err(QuizError::ModeMismatch {
                mode: QuizMode::Choice,
            });
        }
        let text = issued.word.text.clone();

        let (score, floor_complete) = self.resolve(question_id, false, 0, sink)?;
        Ok(SpellingOutcome {
            question_id,
            correct: false,
            attempts_left: 0,
            answer: Some(text),
            points: 0,
            score,
            floor_complete,
        })
    }

    /// Count a settled question toward its floor, close the floor once every
    /// question is settled, and report the answer to `sink`.
    fn resolve(
        &mut self,
        question_id: Uuid,
        correct: bool,
        points: u32,
        sink: &mut dyn GradingSink,
    ) -> Result<(FloorScore, bool), QuizError> {
        let floor = self.floor.as_mut().ok_or(QuizError::NoActiveFloor)?;
        let word = floor
            .issued
            .get(&question_id)
            .ok_or(QuizError::UnknownQuestion(question_id))?
            .word
            .to_ref();

        floor.score.asked += 1;
        if correct {
            floor.score.correct += 1;
            floor.points += points;
        } else {
            floor.missed.push(word.clone());
        }
        let score = floor.score;
        let floor_complete = score.asked == floor.total;
        let event = GradingEvent {
            question_id,
            tier: floor.tier,
            word,
            correct,
        };

        if floor_complete {
            let result = FloorResult {
                tier: floor.tier,
                mode: floor.mode,
                correct: score.correct,
                total: floor.total,
                score: score.ratio(),
                points: floor.points,
                missed: floor.missed.clone(),
                completed_at: Utc::now(),
            };
            tracing::info!(
                "floor {} complete: {}/{}",
                result.tier,
                result.correct,
                result.total
            );
            self.state = SessionState::FloorComplete { tier: result.tier };
            self.results.push(result);
        }
        self.answered.insert(question_id);

        sink.on_graded(&event);
        Ok((score, floor_complete))
    }

    /// End the session and summarize every completed floor.
    pub fn finish(&mut self) -> Result<SessionSummary, QuizError> {
        match self.state {
            SessionState::FloorInProgress { tier } => {
                return Err(QuizError::FloorNotComplete { tier })
            }
            SessionState::SessionComplete => return Err(QuizError::SessionComplete),
            SessionState::NotStarted | SessionState::FloorComplete { .. } => {}
        }
        self.state = SessionState::SessionComplete;
        Ok(SessionSummary {
            id: self.session_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            floors: self.results.clone(),
        })
    }

    /// Words sharing the root `tag`.
    pub async fn explore_family(&self, tag: &str) -> Result<Vec<Word>, QuizError> {
        match normalize_root(tag) {
            Some(root) => Ok(self.store.query_family(&root).await?),
            None => Ok(Vec::new()),
        }
    }
}

/// `ex____`: the first letters of `key`, then one underscore per hidden
/// character. Spaces inside phrases stay visible.
fn hint_for(key: &str) -> String {
    key.chars()
        .enumerate()
        .map(|(i, c)| match c {
            _ if i < HINT_LETTERS => c,
            ' ' => ' ',
            _ => '_',
        })
        .collect()
}

/// Choose up to `need` distractor glosses from `pool`: never the word's own
/// gloss, never one already in `taken`, never the same gloss twice.
fn pick_distractors(
    word: &Word,
    pool: &[Word],
    taken: &[String],
    need: usize,
    rng: &mut StdRng,
) -> Vec<String> {
    let mut seen: HashSet<&str> = taken.iter().map(String::as_str).collect();
    seen.insert(word.gloss.as_str());

    let mut candidates: Vec<&str> = Vec::new();
    for other in pool.iter().filter(|w| w.key != word.key) {
        if seen.insert(other.gloss.as_str()) {
            candidates.push(other.gloss.as_str());
        }
    }
    candidates.shuffle(rng);
    candidates
        .into_iter()
        .take(need)
        .map(str::to_string)
        .collect()
}

async fn load_whole_pool(store: &dyn GraphStore, grade_count: u8) -> Result<Vec<Word>, QuizError> {
    let grades = try_join_all((1..=grade_count).map(|tier| store.query_words_by_grade(tier))).await?;
    Ok(grades.into_iter().flatten().collect())
}
