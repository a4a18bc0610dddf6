//! The `wordtower play` command: an interactive tower over stdin.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use wordtower_core::engine::{QuizEngine, QuizMode, SessionState};
use wordtower_core::error::QuizError;
use wordtower_core::mistakes::MistakeLog;
use wordtower_core::report::SessionSummary;
use wordtower_core::traits::MistakeBook;
use wordtower_store::open_store;

use super::GlobalOpts;

/// Arguments of `wordtower play`.
#[derive(Debug, Clone)]
pub struct PlayArgs {
    pub floor: u8,
    pub floors: u8,
    pub mode: Option<QuizMode>,
    pub seed: Option<u64>,
    pub mistakes: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

pub async fn execute(opts: &GlobalOpts, args: PlayArgs) -> Result<()> {
    let mut config = opts.settings()?;
    if args.seed.is_some() {
        config.quiz.seed = args.seed;
    }
    if let Some(mode) = args.mode {
        config.quiz.mode = mode;
    }
    let mistakes_path = args.mistakes.clone().unwrap_or_else(|| config.mistakes_path());

    let store = open_store(&config.store)?;
    let mut engine = QuizEngine::new(store, config.quiz.clone());
    let mut book = MistakeLog::load_json(&mistakes_path)?;
    let before = book.pending().count();

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let played = run_tower(&mut engine, &mut book, &args, &mut input, &mut output).await;

    book.save_json(&mistakes_path)?;
    let summary = played?;

    println!("\n{}", summary.to_text());
    let after = book.pending().count();
    if after > before {
        println!(
            "{} new word(s) in the mistake book ({}).",
            after - before,
            mistakes_path.display()
        );
    }
    if let Some(path) = &args.summary {
        summary.save_json(path)?;
        println!("Session summary written to {}", path.display());
    }

    Ok(())
}

/// Play up to `args.floors` floors starting at `args.floor`, reading one
/// answer per line from `input`. A `q` line or end of input quits.
pub async fn run_tower<R: BufRead, W: Write>(
    engine: &mut QuizEngine,
    book: &mut MistakeLog,
    args: &PlayArgs,
    input: &mut R,
    output: &mut W,
) -> Result<SessionSummary> {
    let last = args
        .floor
        .saturating_add(args.floors.max(1) - 1)
        .min(engine.config().grade_count)
        .max(args.floor);

    for tier in args.floor..=last {
        let started = if tier == args.floor {
            engine.start_floor(tier).await
        } else {
            engine.next_floor().await
        };
        let start = match started {
            Ok(start) => start,
            Err(QuizError::InsufficientWords { tier }) if tier != args.floor => {
                writeln!(output, "Floor {tier} has no words yet; the tower ends here.")?;
                break;
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(output, "\n=== Floor {} ({} questions) ===", start.tier, start.question_count)?;
        if let Some(warning) = &start.warning {
            writeln!(output, "Note: {warning}")?;
        }
        if start.mode == QuizMode::Spell {
            writeln!(output, "Type the word for each meaning. ? shows a hint, ! skips.")?;
        }

        let finished = match start.mode {
            QuizMode::Choice => play_choice_floor(engine, book, input, output).await?,
            QuizMode::Spell => play_spelling_floor(engine, book, input, output)?,
        };
        if !finished {
            engine.abandon_floor()?;
            writeln!(output, "\nLeaving the tower.")?;
            break;
        }

        if let SessionState::FloorComplete { .. } = engine.state() {
            if let Some(result) = engine.results().last() {
                writeln!(
                    output,
                    "Floor {} cleared: {}/{} ({:.0}%), {} points",
                    result.tier,
                    result.correct,
                    result.total,
                    result.score * 100.0,
                    result.points
                )?;
            }
        }
    }

    Ok(engine.finish()?)
}

/// Next trimmed input line, or `None` at end of input or on `q`.
fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<String>> {
    write!(output, "> ")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read answer")? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

/// Ask every multiple-choice question of the floor. Returns `false` if the
/// player quit.
async fn play_choice_floor<R: BufRead, W: Write>(
    engine: &mut QuizEngine,
    book: &mut MistakeLog,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    loop {
        let question = match engine.next_question().await {
            Ok(q) => q,
            Err(QuizError::FloorExhausted { .. }) => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        let mut heading = format!("\n[{}/{}] {}", question.number, question.total, question.prompt);
        if let Some(phonetic) = &question.phonetic {
            heading.push_str(&format!(" /{phonetic}/"));
        }
        if let Some(pos) = &question.pos {
            heading.push_str(&format!(" {pos}"));
        }
        writeln!(output, "{heading}")?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(output, "  {}. {option}", option_label(i))?;
        }

        let index = loop {
            let Some(line) = read_answer(input, output)? else {
                return Ok(false);
            };
            match parse_answer(&line, question.options.len()) {
                Some(index) => break index,
                None => writeln!(
                    output,
                    "Answer with A-{} or 1-{}, or q to quit.",
                    option_label(question.options.len() - 1),
                    question.options.len()
                )?,
            }
        };

        let outcome = engine.submit_answer(question.id, index, book)?;
        if outcome.correct {
            writeln!(output, "Correct!")?;
        } else {
            writeln!(
                output,
                "Wrong: {} = {}",
                question.prompt, outcome.correct_gloss
            )?;
        }
    }
}

/// Ask every spelling question of the floor. Returns `false` if the player
/// quit.
fn play_spelling_floor<R: BufRead, W: Write>(
    engine: &mut QuizEngine,
    book: &mut MistakeLog,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    loop {
        let prompt = match engine.next_spelling() {
            Ok(p) => p,
            Err(QuizError::FloorExhausted { .. }) => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        let mut heading = format!("\n[{}/{}] {}", prompt.number, prompt.total, prompt.gloss);
        if let Some(pos) = &prompt.pos {
            heading.push_str(&format!(" {pos}"));
        }
        heading.push_str(&format!(" ({} letters)", prompt.length));
        writeln!(output, "{heading}")?;

        loop {
            let Some(line) = read_answer(input, output)? else {
                return Ok(false);
            };
            match line.as_str() {
                "" => writeln!(output, "Type the word, ? for a hint, ! to skip, or q to quit.")?,
                "?" => writeln!(output, "Hint: {}", engine.spelling_hint(prompt.id)?)?,
                "!" => {
                    let outcome = engine.skip_spelling(prompt.id, book)?;
                    writeln!(output, "Skipped: {}", outcome.answer.unwrap_or_default())?;
                    break;
                }
                answer => {
                    let outcome = engine.submit_spelling(prompt.id, answer, book)?;
                    if outcome.correct {
                        writeln!(output, "Correct! (+{})", outcome.points)?;
                        break;
                    }
                    match outcome.answer {
                        Some(word) => {
                            writeln!(output, "Wrong: the word is {word}")?;
                            break;
                        }
                        None => writeln!(
                            output,
                            "Not quite, {} attempt(s) left.",
                            outcome.attempts_left
                        )?,
                    }
                }
            }
        }
    }
}

fn option_label(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

/// Accept a letter (`a`/`A` is the first option) or a 1-based number.
fn parse_answer(answer: &str, count: usize) -> Option<usize> {
    let index = match answer.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = answer.chars();
            let c = chars.next()?.to_ascii_uppercase();
            if chars.next().is_some() || !c.is_ascii_uppercase() {
                return None;
            }
            (c as u8 - b'A') as usize
        }
    };
    (index < count).then_some(index)
}
