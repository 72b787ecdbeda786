use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trivia_quiz::cache::FileStore;
use trivia_quiz::clients::{DuckDuckGoClient, OpenTdbClient, WikipediaClient};
use trivia_quiz::config::{FromEnv, QuizConfig};
use trivia_quiz::{
    make_snippet, CancellationToken, Category, Difficulty, ExplainRequest, ExplanationResolver, QuestionLoader,
    QuestionRequest, QuizSession,
};

#[derive(Parser)]
#[command(author, version, about = "Trivia quiz with answer explanations", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    TRIVIA_API_URL           Trivia source base URL
    WIKIPEDIA_API_URL        Encyclopedia base URL
    INSTANT_ANSWER_API_URL   Instant-answer API base URL
    SEARCH_FALLBACK_URL      Base of generic search links
    QUIZ_HTTP_TIMEOUT_SECS   Per-request timeout
    QUIZ_CACHE_DIR           Question cache directory
    RUST_LOG                 Log filter (e.g. trivia_quiz=debug)")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a question batch and print it
    Questions {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
        #[arg(long, default_value = "any")]
        category: Category,
    },
    /// Resolve an explanation for an answer
    Explain {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        answer: String,
        #[arg(short, long, default_value = "")]
        meta: String,
    },
    /// Play an interactive quiz in the terminal
    Play {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
        #[arg(long, default_value = "any")]
        category: Category,
    },
}

fn loader(config: &QuizConfig) -> Result<QuestionLoader<OpenTdbClient, FileStore>> {
    let source = OpenTdbClient::from_config(config).context("building trivia client")?;
    Ok(QuestionLoader::new(source, FileStore::new(config.cache_dir.clone())))
}

fn resolver(config: &QuizConfig) -> Result<ExplanationResolver<WikipediaClient, DuckDuckGoClient>> {
    let encyclopedia = WikipediaClient::from_config(config).context("building encyclopedia client")?;
    let instant = DuckDuckGoClient::from_config(config).context("building instant-answer client")?;
    Ok(ExplanationResolver::new(encyclopedia, instant).with_config(config))
}

fn prompt(line: &str) -> Result<String> {
    print!("{}", line);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

async fn play(config: &QuizConfig, request: QuestionRequest) -> Result<()> {
    let cancel = CancellationToken::new();
    let batch = loader(config)?
        .load(&request, &cancel)
        .await
        .context("question load was cancelled")?;
    if batch.is_degraded() {
        println!("(offline: using {:?} questions)", batch.origin);
    }
    let resolver = resolver(config)?;
    let mut session = QuizSession::new(batch);

    loop {
        while let Some(question) = session.current().cloned() {
            println!("\nQ{}/{}  [{}]", session.position() + 1, session.len(), question.meta);
            println!("{}", question.text);
            for (i, choice) in question.choices.iter().enumerate() {
                println!("  {}) {}", i + 1, choice);
            }

            let outcome = loop {
                let input = prompt("Your answer (number, h for hint): ")?;
                if input.eq_ignore_ascii_case("h") {
                    match session.hint(session.position()) {
                        Some(i) => println!("Hint: it is not {}", i + 1),
                        None => println!("No hint for this one."),
                    }
                    continue;
                }
                let Ok(n) = input.parse::<usize>() else { continue };
                match session.select_and_submit(n.wrapping_sub(1)) {
                    Ok(outcome) => break outcome,
                    Err(e) => println!("{}", e),
                }
            };

            if outcome.correct {
                println!("Correct!");
            } else {
                println!("Wrong, the answer was: {}", question.choices[outcome.correct_index]);
            }

            if let Some(explanation) = resolver.resolve(&ExplainRequest::from(&question), &cancel).await {
                println!("{}", explanation.snippet(2, 400));
                println!("Read more: {}", explanation.source_url);
            }
            session.advance();
        }

        println!("\nScore: {}", session.summary());
        println!("Share: {}", session.share_text());
        if !prompt("Play again? (y/N): ")?.eq_ignore_ascii_case("y") {
            return Ok(());
        }
        session.restart();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = QuizConfig::from_env().context("loading configuration")?;

    match args.command {
        Command::Questions { count, difficulty, category } => {
            let request = QuestionRequest::new(count, difficulty, category);
            let batch = loader(&config)?
                .load(&request, &CancellationToken::new())
                .await
                .context("question load was cancelled")?;
            println!("{}", serde_json::to_string_pretty(&batch.questions)?);
            eprintln!("origin: {:?}", batch.origin);
        }
        Command::Explain { question, answer, meta } => {
            let request = ExplainRequest::new(question, answer, meta);
            if let Some(explanation) = resolver(&config)?.resolve(&request, &CancellationToken::new()).await {
                println!("{}\n", explanation.text);
                println!("Snippet: {}", make_snippet(&explanation.text, 2, 400));
                println!("Source:  {:?} {}", explanation.source, explanation.source_url);
            }
        }
        Command::Play { count, difficulty, category } => {
            play(&config, QuestionRequest::new(count, difficulty, category)).await?;
        }
    }

    Ok(())
}
