// The text console used to take the survey.
//
// This is the only place that talks to the user: the survey itself is only
// queried and driven from here.

use std::io::{self, BufRead, Write};

use crate::survey::{chart::ChartRenderer, *};

const PROGRESS_WIDTH: usize = 24;

const HELP: &str = "Commands:
  up N       toggle an upvote on work N of this batch (up #N for catalog index N)
  down N     toggle a downvote on work N of this batch (down #N for catalog index N)
  submit     submit this batch
  results    show the chart of the current votes
  restart    start over, once all the works are rated
  help       show this message
  quit       leave";

/// Which work a vote is for.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Target {
    /// Position in the batch on screen, starting at 1.
    InBatch(usize),
    /// Index in the catalog, starting at 0.
    Catalog(usize),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Command {
    Vote(Target, Vote),
    Submit,
    Results,
    Restart,
    Help,
    Quit,
}

/// Parses one line of input. Blank lines and comments give no command.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let keyword = words[0].to_lowercase();
    let vote = match keyword.as_str() {
        "up" | "u" | "+" => Some(Vote::Upvote),
        "down" | "d" | "-" => Some(Vote::Downvote),
        _ => None,
    };
    if let Some(v) = vote {
        return match words.as_slice() {
            [_, arg] => parse_target(arg).map(|t| Some(Command::Vote(t, v))),
            _ => Err(format!("Usage: {} N", keyword)),
        };
    }
    if words.len() > 1 {
        return Err(format!("'{}' does not take arguments", keyword));
    }
    match keyword.as_str() {
        "submit" | "s" => Ok(Some(Command::Submit)),
        "results" => Ok(Some(Command::Results)),
        "restart" => Ok(Some(Command::Restart)),
        "help" | "h" | "?" => Ok(Some(Command::Help)),
        "quit" | "q" | "exit" => Ok(Some(Command::Quit)),
        x => Err(format!("Unknown command '{}', type 'help' for the list", x)),
    }
}

fn parse_target(arg: &str) -> Result<Target, String> {
    let (digits, catalog) = match arg.strip_prefix('#') {
        Some(rest) => (rest, true),
        None => (arg, false),
    };
    let n = digits
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a work number", arg))?;
    if catalog {
        Ok(Target::Catalog(n))
    } else {
        Ok(Target::InBatch(n))
    }
}

/// Runs the survey until the input ends or the user quits.
pub fn run_console<R: BufRead, W: Write>(
    survey: &mut Survey,
    input: R,
    out: &mut W,
    chart: &dyn ChartRenderer,
    chart_title: &str,
) -> SurveyResult<()> {
    show_batch(survey, out).context(ConsoleSnafu {})?;
    for line_r in input.lines() {
        let line = line_r.context(ConsoleSnafu {})?;
        let cmd = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(out, "{}", msg).context(ConsoleSnafu {})?;
                continue;
            }
        };
        debug!("run_console: command: {:?}", cmd);
        match cmd {
            Command::Quit => break,
            Command::Help => writeln!(out, "{}", HELP).context(ConsoleSnafu {})?,
            Command::Vote(target, vote) => handle_vote(survey, target, vote, out)?,
            Command::Submit => handle_submit(survey, out, chart, chart_title)?,
            Command::Results => show_results(survey, out, chart, chart_title).context(ConsoleSnafu {})?,
            Command::Restart => match survey.restart() {
                Ok(()) => {
                    writeln!(out, "Starting over.").context(ConsoleSnafu {})?;
                    show_batch(survey, out).context(ConsoleSnafu {})?;
                }
                Err(SurveyErrors::NotFinished) => {
                    writeln!(out, "You can restart once all the works are rated.")
                        .context(ConsoleSnafu {})?;
                }
                Err(e) => return Err(SurveyError::InvalidSurvey { source: e }),
            },
        }
    }
    info!("Leaving the survey in phase {:?}", survey.phase());
    Ok(())
}

fn resolve_target(survey: &Survey, target: Target) -> Result<usize, String> {
    match target {
        Target::InBatch(n) => {
            let batch = survey.current_batch();
            if n == 0 || n > batch.len() {
                Err(format!(
                    "There is no work {} in this batch (1 to {}).",
                    n,
                    batch.len()
                ))
            } else {
                Ok(batch[n - 1].index)
            }
        }
        Target::Catalog(idx) if idx < survey.items().len() => Ok(idx),
        Target::Catalog(idx) => Err(format!("There is no work #{} in the catalog.", idx)),
    }
}

fn handle_vote<W: Write>(
    survey: &mut Survey,
    target: Target,
    vote: Vote,
    out: &mut W,
) -> SurveyResult<()> {
    if survey.phase() != Phase::Rating {
        writeln!(out, "All the works are rated: type 'restart' to start over.")
            .context(ConsoleSnafu {})?;
        return Ok(());
    }
    let index = match resolve_target(survey, target) {
        Ok(idx) => idx,
        Err(msg) => {
            writeln!(out, "{}", msg).context(ConsoleSnafu {})?;
            return Ok(());
        }
    };
    // The index was checked against the catalog: a failure here is a bug.
    let state = survey
        .toggle_vote(index, vote)
        .map_err(|e| SurveyError::InvalidSurvey { source: e })?;
    let title = &survey.items()[index].title;
    writeln!(out, "{}: {}", title, vote_label(state)).context(ConsoleSnafu {})?;
    show_progress(survey, out).context(ConsoleSnafu {})?;
    Ok(())
}

fn handle_submit<W: Write>(
    survey: &mut Survey,
    out: &mut W,
    chart: &dyn ChartRenderer,
    chart_title: &str,
) -> SurveyResult<()> {
    match survey.submit() {
        Ok(Phase::Finished) => {
            writeln!(out, "All the works are rated!").context(ConsoleSnafu {})?;
            show_results(survey, out, chart, chart_title).context(ConsoleSnafu {})?;
            writeln!(out, "Type 'restart' to take the survey again.").context(ConsoleSnafu {})?;
        }
        Ok(_) => show_batch(survey, out).context(ConsoleSnafu {})?,
        Err(SurveyErrors::IncompleteBatch { start, missing, .. }) => {
            let positions: Vec<String> = missing
                .iter()
                .map(|idx| (idx - start + 1).to_string())
                .collect();
            writeln!(
                out,
                "Please rate all works before submitting! Still to rate: {}",
                positions.join(", ")
            )
            .context(ConsoleSnafu {})?;
        }
        Err(SurveyErrors::NotRating) => {
            writeln!(out, "All the works are rated: type 'restart' to start over.")
                .context(ConsoleSnafu {})?;
        }
        Err(e) => return Err(SurveyError::InvalidSurvey { source: e }),
    }
    Ok(())
}

fn vote_label(vote: Option<Vote>) -> &'static str {
    match vote {
        Some(Vote::Upvote) => "upvoted",
        Some(Vote::Downvote) => "downvoted",
        None => "no vote",
    }
}

fn show_batch<W: Write>(survey: &Survey, out: &mut W) -> io::Result<()> {
    let window = match survey.current_window() {
        Some(w) => w,
        None => {
            writeln!(
                out,
                "All the works are rated. Type 'results' for the chart or 'restart' to start over."
            )?;
            return Ok(());
        }
    };
    let batches = survey.batches();
    writeln!(
        out,
        "Batch {} of {} (works {} to {} of {})",
        batches.batch_index() + 1,
        batches.batch_count(),
        window.start + 1,
        window.end,
        survey.items().len()
    )?;
    for (pos, item) in survey.current_batch().iter().enumerate() {
        writeln!(out, "{:>3}. {}", pos + 1, item.title)?;
        writeln!(out, "     by {}", item.author)?;
        match &item.period {
            Some(p) => writeln!(out, "     {}, {}", item.category_label(), p)?,
            None => writeln!(out, "     {}", item.category_label())?,
        }
        if let Some(v) = survey.votes().get(item.index) {
            writeln!(out, "     [{}]", vote_label(Some(v)))?;
        }
    }
    show_progress(survey, out)?;
    writeln!(out, "Vote with 'up N' or 'down N', then 'submit'.")
}

fn show_progress<W: Write>(survey: &Survey, out: &mut W) -> io::Result<()> {
    let progress = survey.progress();
    let filled = ((progress.percentage() * PROGRESS_WIDTH as f64) / 100.0).round() as usize;
    writeln!(
        out,
        "Progress: [{}{}] {}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        progress
    )
}

fn show_results<W: Write>(
    survey: &Survey,
    out: &mut W,
    chart: &dyn ChartRenderer,
    chart_title: &str,
) -> io::Result<()> {
    let results = survey.results();
    chart.render(chart_title, &results.chart_rows(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::chart::TextChart;
    use std::io::Cursor;
    use work_survey::builder::Builder;

    fn survey(categories: &[&str], batch_size: usize) -> Survey {
        let mut builder = Builder::new(&SurveyRules { batch_size }).unwrap();
        for (idx, c) in categories.iter().enumerate() {
            builder.add_item_simple(&format!("Work {}", idx), "Someone", c);
        }
        builder.build().unwrap()
    }

    fn run(survey: &mut Survey, script: &str) -> String {
        let mut out: Vec<u8> = Vec::new();
        let chart = TextChart {
            width: 4,
            palette: vec!['#'],
        };
        run_console(survey, Cursor::new(script), &mut out, &chart, "Upvotes").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("up 2"),
            Ok(Some(Command::Vote(Target::InBatch(2), Vote::Upvote)))
        );
        assert_eq!(
            parse_command("  D  #7 "),
            Ok(Some(Command::Vote(Target::Catalog(7), Vote::Downvote)))
        );
        assert_eq!(parse_command("submit"), Ok(Some(Command::Submit)));
        assert_eq!(parse_command("restart"), Ok(Some(Command::Restart)));
        assert_eq!(parse_command("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("// a comment"), Ok(None));
        assert!(parse_command("up").is_err());
        assert!(parse_command("up x").is_err());
        assert!(parse_command("submit now").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn scripted_survey() {
        let mut s = survey(&["A", "A", "B"], 2);
        let output = run(&mut s, "up 1\ndown 2\nsubmit\nup 1\nsubmit\n");
        assert_eq!(s.phase(), Phase::Finished);
        assert!(output.contains("Batch 1 of 2 (works 1 to 2 of 3)"));
        assert!(output.contains("Batch 2 of 2 (works 3 to 3 of 3)"));
        assert!(output.contains("All the works are rated!"));
        assert!(output.contains("A | #### 1"));
        assert!(output.contains("B | #### 1"));
        assert!(output.contains("3 / 3"));
    }

    #[test]
    fn incomplete_batch_is_rejected() {
        let mut s = survey(&["A", "A", "B"], 2);
        let output = run(&mut s, "up 1\nsubmit\n");
        assert!(output.contains("Please rate all works before submitting! Still to rate: 2"));
        assert_eq!(s.batches().batch_index(), 0);
        assert_eq!(s.votes().count(), 1);
    }

    #[test]
    fn toggles_and_switches() {
        let mut s = survey(&["A", "B"], 2);
        let output = run(&mut s, "up 1\nup 1\ndown #1\nup 2\n");
        assert!(output.contains("Work 0: upvoted"));
        assert!(output.contains("Work 0: no vote"));
        assert!(output.contains("Work 1: downvoted"));
        assert!(output.contains("Work 1: upvoted"));
        assert_eq!(s.votes().get(0), None);
        assert_eq!(s.votes().get(1), Some(Vote::Upvote));
    }

    #[test]
    fn bad_targets_are_reported() {
        let mut s = survey(&["A", "B", "C"], 2);
        let output = run(&mut s, "up 3\nup 0\ndown #9\n");
        assert!(output.contains("There is no work 3 in this batch (1 to 2)."));
        assert!(output.contains("There is no work 0 in this batch (1 to 2)."));
        assert!(output.contains("There is no work #9 in the catalog."));
        assert_eq!(s.votes().count(), 0);
    }

    #[test]
    fn restart_only_when_finished() {
        let mut s = survey(&["A"], 5);
        let output = run(&mut s, "restart\nup 1\nsubmit\nup 1\nrestart\nquit\nup 1\n");
        assert!(output.contains("You can restart once all the works are rated."));
        assert!(output.contains("All the works are rated: type 'restart' to start over."));
        assert!(output.contains("Starting over."));
        // The vote after quit is never read.
        assert_eq!(s.votes().count(), 0);
        assert_eq!(s.phase(), Phase::Rating);
    }

    #[test]
    fn empty_catalog() {
        let mut s = survey(&[], 5);
        let output = run(&mut s, "results\n");
        assert!(output.contains("All the works are rated."));
        assert!(output.contains("(no data)"));
    }
}
