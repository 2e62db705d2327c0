use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use factfeed::{
    FeedApp, FeedConfig, LayoutBox, ScrollSentinel, StyleAnimation, TOPICS,
    bevy_ecs::{entity::Entity, query::With},
    bevy_math::Vec2,
    heart_of, init_logging, init_logging_with, topic_indicator,
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{info, warn};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(20);

/// Browse encyclopedia facts from the terminal.
#[derive(Parser, Debug)]
#[command(name = "factfeed", version, about)]
struct Args {
    /// RON config file. Defaults are used for anything it leaves out.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Topic id to load first, e.g. "space".
    #[arg(long)]
    topic: Option<String>,

    /// Log filter, overriding RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Show,
    Topics,
    Topic(String),
    Type(String),
    Search,
    Tap(usize),
    Like(usize),
    Swipe { index: usize, dx: f32, dy: f32 },
    Scroll(f32),
    More,
    Help,
    Quit,
}

const HELP: &str = "\
show                 list the current facts
topics               list topic ids
topic <id>           switch topic
type <text>          set the search text
search               press the search button
tap <n>              tap card n once
like <n>             double-tap card n
swipe <n> <dx> [dy]  swipe across card n
scroll <y>           scroll the page to y
more                 scroll to the end of the list
help                 show this help
quit                 leave";

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args = rest.split_whitespace().collect::<Vec<_>>();

        let command = match word {
            "show" | "ls" => Self::Show,
            "topics" => Self::Topics,
            "topic" => Self::Topic(one_arg(&args, "topic <id>")?.to_string()),
            // inner spacing is kept as typed
            "type" => Self::Type(rest.to_string()),
            "search" => Self::Search,
            "tap" => Self::Tap(parse_arg(one_arg(&args, "tap <n>")?)?),
            "like" => Self::Like(parse_arg(one_arg(&args, "like <n>")?)?),
            "swipe" => match args.as_slice() {
                [index, dx] => Self::Swipe {
                    index: parse_arg(index)?,
                    dx: parse_arg(dx)?,
                    dy: 0.0,
                },
                [index, dx, dy] => Self::Swipe {
                    index: parse_arg(index)?,
                    dx: parse_arg(dx)?,
                    dy: parse_arg(dy)?,
                },
                _ => bail!("usage: swipe <n> <dx> [dy]"),
            },
            "scroll" => Self::Scroll(parse_arg(one_arg(&args, "scroll <y>")?)?),
            "more" => Self::More,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };
        Ok(command)
    }
}

fn one_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(anyhow!("usage: {usage}")),
    }
}

fn parse_arg<T: std::str::FromStr>(arg: &str) -> Result<T> {
    arg.parse().map_err(|_| anyhow!("`{arg}` is not a number"))
}

struct Shell {
    feed: FeedApp,
}

impl Shell {
    fn element(&self, selector: &str) -> Result<Entity> {
        let found = self.feed.query(selector).first().copied();
        found.with_context(|| format!("page has no `{selector}`"))
    }

    fn card(&self, index: usize) -> Result<Entity> {
        let cards = self.feed.query("div.card");
        let count = cards.len();
        let card = cards.get(index).copied();
        card.with_context(|| format!("no card {index} of {count}"))
    }

    fn settle(&mut self) {
        if !self.feed.run_until_idle(SETTLE_TIMEOUT) {
            warn!("requests still running after {SETTLE_TIMEOUT:?}");
        }
    }

    fn like_count(&self, card: Entity) -> u32 {
        let world = self.feed.world();
        heart_of(world, card)
            .and_then(|heart| world.get::<StyleAnimation>(heart))
            .map_or(0, |animation| animation.starts)
    }

    fn sentinel_top(&mut self) -> Option<f32> {
        let world = self.feed.world_mut();
        let mut sentinels = world.query_filtered::<&LayoutBox, With<ScrollSentinel>>();
        sentinels.iter(world).next().map(|layout_box| layout_box.top)
    }

    fn show(&self) {
        let state = self.feed.state();
        println!("[{}]", topic_indicator(state));
        if state.is_searching {
            println!("  (searching...)");
        }
        for (index, fact) in state.facts.iter().enumerate() {
            println!("{index:>3}  {}", fact.text);
        }
        if state.facts.is_empty() {
            println!("  (no facts)");
        }
    }

    fn run(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Show => self.show(),
            Command::Topics => {
                let current = self.feed.state().fact_topic.clone();
                for topic in TOPICS {
                    let marker = if topic.id == current { '*' } else { ' ' };
                    println!("{marker} {:<12} {}", topic.id, topic.name);
                }
            }
            Command::Topic(id) => {
                let select = self.element("select.input")?;
                self.feed.change(select, id);
                self.settle();
                self.show();
            }
            Command::Type(text) => {
                let input = self.element("input.input")?;
                self.feed.input(input, text);
                self.feed.update();
            }
            Command::Search => {
                let button = self.element("button.btn")?;
                let at = self.feed.now();
                if self.feed.click(button, at) == 0 {
                    println!("search is disabled");
                    return Ok(true);
                }
                self.settle();
                self.show();
            }
            Command::Tap(index) => {
                let card = self.card(index)?;
                let at = self.feed.now();
                self.feed.click(card, at);
                self.feed.update();
                println!("card {index}: {} likes", self.like_count(card));
            }
            Command::Like(index) => {
                let card = self.card(index)?;
                let at = self.feed.now();
                self.feed.click(card, at);
                self.feed.click(card, at + Duration::from_millis(100));
                self.feed.update();
                println!("card {index}: {} likes", self.like_count(card));
            }
            Command::Swipe { index, dx, dy } => {
                let card = self.card(index)?;
                let from = Vec2::new(300.0, 200.0);
                let at = self.feed.now();
                let to = from + Vec2::new(dx, dy);
                self.feed.swipe(card, from, to, at);
                self.feed.update();
                println!("card {index}: {} likes", self.like_count(card));
            }
            Command::Scroll(y) => {
                self.feed.scroll_to(y);
                self.settle();
                println!("{} facts", self.feed.state().facts.len());
            }
            Command::More => {
                let top = self.sentinel_top().context("list has no sentinel")?;
                self.feed.scroll_to(top);
                self.settle();
                println!("{} facts", self.feed.state().facts.len());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.log.as_deref() {
        Some(filter) => init_logging_with(filter),
        None => init_logging(),
    }

    let mut config = match &args.config {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };
    if let Some(topic) = args.topic {
        config.feed.initial_topic = topic;
    }
    let topic = &config.feed.initial_topic;
    info!(endpoint = %config.api.endpoint, %topic, "starting");

    let mut shell = Shell {
        feed: FeedApp::with_wikipedia(config)?,
    };
    shell.settle();
    shell.show();

    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    loop {
        let line = match editor.readline("factfeed> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read command"),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let keep_going = match Command::parse(&line) {
            Ok(command) => shell.run(command),
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match keep_going {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => println!("{err:#}"),
        }
    }
    Ok(())
}
