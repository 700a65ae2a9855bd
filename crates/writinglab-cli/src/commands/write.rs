//! Line-oriented writing session.
//!
//! Each plain line is appended to the story as one burst of typing and
//! settled straight away. Lines starting with `:` are commands.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use writinglab_core::{
    Config, Evaluation, FormResponses, RuleState, RuleTransition, SessionPhase, StorageBackend,
    WritingLab,
};

#[derive(Args)]
pub struct WriteArgs {
    /// Override the configured storage backend ("local" or "remote")
    #[arg(long)]
    backend: Option<String>,
}

pub fn run(args: WriteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if let Some(backend) = args.backend {
        config.set("storage.backend", &backend)?;
    }
    if config.storage.backend == StorageBackend::Remote {
        tracing::info!(url = %config.storage.remote_url, "using remote store");
    }

    let mut lab = WritingLab::with_defaults(&config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl(&mut lab, stdin.lock(), &mut stdout)?;
    Ok(())
}

const HELP: &str = "\
Type your story line by line. Commands:
  :rules         show revealed rules
  :skip <id>     skip an optional rule
  :submit        submit the story
  :feedback      answer the feedback questions and save
  :export [dir]  write the session as JSON (default: current directory)
  :status        show session status
  :new           start over with a new session
  :quit          leave";

pub fn repl<R: BufRead, W: Write>(lab: &mut WritingLab, input: R, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Session {} ({} store). Type :help for commands.",
        lab.session().id(),
        lab.gateway().name()
    )?;
    if !lab.session().current_text().is_empty() {
        writeln!(out, "Restored draft ({} words).", lab.session().word_count())?;
    }
    print_rules(lab, out)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let Some(command) = line.strip_prefix(':') else {
            append_line(lab, &line, out)?;
            continue;
        };

        let command = command.trim();
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, rest)| (name, rest.trim()));
        let mut parts = rest.split_whitespace();
        match name {
            "help" => writeln!(out, "{HELP}")?,
            "rules" => print_rules(lab, out)?,
            "skip" => match parts.next() {
                Some(id) => match lab.skip_rule(id) {
                    Ok(()) => writeln!(out, "Skipped {id}.")?,
                    Err(e) => writeln!(out, "{}", e.user_message())?,
                },
                None => writeln!(out, "usage: :skip <rule id>")?,
            },
            "submit" => match lab.submit() {
                Ok(words) => writeln!(
                    out,
                    "Story submitted ({words} words). Type :feedback to finish."
                )?,
                Err(e) => writeln!(out, "{}", e.user_message())?,
            },
            "feedback" => feedback(lab, &mut lines, out)?,
            "export" => {
                let dir = if rest.is_empty() { "." } else { rest };
                export(lab, PathBuf::from(dir), out)?;
            }
            "status" => status(lab, out)?,
            "new" => {
                lab.reset();
                writeln!(out, "New session {}.", lab.session().id())?;
                print_rules(lab, out)?;
            }
            "quit" | "q" => break,
            other => writeln!(out, "unknown command :{other} (try :help)")?,
        }
    }

    // Anything still buffered is logged and saved as a draft before leaving.
    lab.settle();
    Ok(())
}

fn append_line<W: Write>(lab: &mut WritingLab, line: &str, out: &mut W) -> io::Result<()> {
    let mut text = lab.session().current_text().to_string();
    let inserted = if text.is_empty() {
        line.to_string()
    } else {
        format!("\n{line}")
    };
    text.push_str(&inserted);

    if let Err(e) = lab.input(&text, Some(&inserted)) {
        return writeln!(out, "{}", e.user_message());
    }
    let evaluation = lab.settle();
    report(lab, &evaluation, out)
}

fn report<W: Write>(lab: &WritingLab, evaluation: &Evaluation, out: &mut W) -> io::Result<()> {
    for transition in &evaluation.transitions {
        let title = lab
            .session()
            .rules()
            .get(transition.rule_id())
            .map(|r| r.title.as_str())
            .unwrap_or_else(|| transition.rule_id());
        match transition {
            RuleTransition::Activated(_) => writeln!(out, "  new rule: {title}")?,
            RuleTransition::Met(_) => writeln!(out, "  met: {title}")?,
        }
    }
    Ok(())
}

fn print_rules<W: Write>(lab: &WritingLab, out: &mut W) -> io::Result<()> {
    for rule in lab.session().rules().visible() {
        let mark = match rule.state {
            RuleState::Met => "x",
            RuleState::Skipped => "-",
            _ => " ",
        };
        let optional = if rule.can_skip() { " (optional)" } else { "" };
        writeln!(out, "  [{mark}] {:<11} {}{optional}", rule.id, rule.title)?;
    }
    Ok(())
}

fn status<W: Write>(lab: &WritingLab, out: &mut W) -> io::Result<()> {
    let session = lab.session();
    writeln!(out, "session:  {}", session.id())?;
    writeln!(out, "phase:    {}", session.phase())?;
    writeln!(out, "words:    {}", session.word_count())?;
    writeln!(out, "events:   {}", session.events().len())?;
    writeln!(
        out,
        "resolved: {}/{}",
        session.rules().resolved().count(),
        session.rules().rules().len()
    )
}

fn ask<I, W>(lines: &mut I, out: &mut W, prompt: &str) -> io::Result<Option<String>>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    writeln!(out, "{prompt}")?;
    out.flush()?;
    lines.next().transpose().map(|l| l.map(|s| s.trim().to_string()))
}

fn feedback<I, W>(lab: &mut WritingLab, lines: &mut I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    if lab.phase() != SessionPhase::AwaitingFeedback {
        return writeln!(out, "Submit your story first (:submit).");
    }

    let options: Vec<String> = lab
        .session()
        .rules()
        .resolved()
        .map(|r| r.id.clone())
        .collect();

    let questions = [
        (
            "emotionalResponse",
            "How did writing with the rules feel? (enjoyable/neutral/frustrating)".to_string(),
        ),
        (
            "influentialRule",
            format!("Which rule influenced your story most? ({})", options.join("/")),
        ),
        (
            "creativeDecisions",
            "Describe one creative decision you made:".to_string(),
        ),
    ];

    let mut responses = FormResponses::new();
    for (key, prompt) in questions {
        let Some(answer) = ask(lines, out, &prompt)? else {
            return writeln!(out, "Feedback cancelled.");
        };
        responses.insert(key.to_string(), answer);
    }

    match lab.submit_feedback(responses) {
        Ok(()) => writeln!(out, "Thank you! Your session has been saved."),
        Err(e) => writeln!(out, "{}", e.user_message()),
    }
}

fn export<W: Write>(lab: &mut WritingLab, dir: PathBuf, out: &mut W) -> io::Result<()> {
    let doc = match lab.export() {
        Ok(doc) => doc,
        Err(e) => return writeln!(out, "export failed: {e}"),
    };
    let path = dir.join(&doc.file_name);
    match std::fs::write(&path, &doc.contents) {
        Ok(()) => writeln!(out, "Exported to {}.", path.display()),
        Err(e) => writeln!(out, "export failed: {e}"),
    }
}
