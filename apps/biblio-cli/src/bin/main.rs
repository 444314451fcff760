use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use biblio_core::config::Config;
use biblio_embed::default_embedder;
use biblio_llm::{ChatCompletionClient, LlmConfig};
use biblio_rag::{Answer, Assistant, KbConfig, KnowledgeBase, DEFAULT_TOP_K};

#[derive(Parser)]
#[command(name = "biblio", version, about = "Ask questions against a local document library")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the documents, build the index and persist it.
    Ingest {
        /// Directory or single file to ingest instead of `data.docs_path`.
        #[arg(long)]
        docs: Option<PathBuf>,
    },
    /// Answer one question and exit.
    Query {
        question: String,
        /// How many passages to ground the answer on.
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Interactive question loop.
    Chat,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    match cli.command {
        Command::Ingest { docs } => ingest(&config, docs),
        Command::Query { question, k } => query(&config, &question, k),
        Command::Chat => chat(&config),
    }
}

fn ingest(config: &Config, docs: Option<PathBuf>) -> anyhow::Result<()> {
    let mut kb_config = KbConfig::from_config(config);
    if let Some(docs) = docs {
        kb_config.docs_path = docs;
    }
    println!("📚 Ingesting from {}", kb_config.docs_path.display());

    let embedder = default_embedder(config)?;
    let kb = KnowledgeBase::build(&kb_config, embedder)?;

    println!("✅ Indexed {} passages", kb.len());
    for skip in kb.skipped() {
        println!("⚠️  Skipped {}: {}", skip.path.display(), skip.reason);
    }
    Ok(())
}

fn query(config: &Config, question: &str, k: Option<usize>) -> anyhow::Result<()> {
    let assistant = make_assistant(config, k)?;
    let answer = assistant.answer(question)?;
    print_answer(&answer);
    Ok(())
}

fn chat(config: &Config) -> anyhow::Result<()> {
    let assistant = make_assistant(config, None)?;

    println!("📚 Library Assistant");
    println!("====================");
    let kb = assistant.knowledge_base();
    if kb.is_empty() {
        println!("⚠️  The knowledge base is empty. Run `biblio ingest` first.");
    } else {
        println!("✅ Knowledge base ready ({} passages)", kb.len());
    }
    println!("Type a question, or quit/exit to leave.");
    println!();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // stdin closed
            println!();
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        match assistant.answer(input) {
            Ok(answer) => print_answer(&answer),
            Err(e) => println!("❌ {:#}", e),
        }
        println!();
    }

    println!("👋 Goodbye!");
    Ok(())
}

fn make_assistant(config: &Config, k: Option<usize>) -> anyhow::Result<Assistant> {
    let kb_config = KbConfig::from_config(config);
    let embedder = default_embedder(config)?;
    let kb = KnowledgeBase::open_or_build(&kb_config, embedder)?;
    let llm = ChatCompletionClient::new(LlmConfig::from_config(config))?;
    let top_k = k
        .or_else(|| config.get::<usize>("retrieval.top_k").ok())
        .unwrap_or(DEFAULT_TOP_K);
    Ok(Assistant::new(kb, Box::new(llm), top_k))
}

fn print_answer(answer: &Answer) {
    print!("{}", render_answer(answer));
}

/// One turn of output: the retrieved-sources status line, then the
/// answer. Empty context drops the status line.
fn render_answer(answer: &Answer) -> String {
    let mut out = String::new();
    if !answer.context.is_empty() {
        let mut sources: Vec<&str> = Vec::new();
        for chunk in &answer.context {
            if !sources.contains(&chunk.source.as_str()) {
                sources.push(&chunk.source);
            }
        }
        out.push_str("📖 Sources: ");
        out.push_str(&sources.join(", "));
        out.push_str("\n\n");
    }
    out.push_str(answer.text.trim());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::render_answer;
    use biblio_core::types::RetrievedChunk;
    use biblio_rag::Answer;

    fn chunk(source: &str) -> RetrievedChunk {
        RetrievedChunk { text: "text".to_string(), source: source.to_string(), score: 0.5 }
    }

    #[test]
    fn sources_status_precedes_the_answer() {
        let answer = Answer {
            text: "Opens at 9am.".to_string(),
            context: vec![chunk("rules.txt"), chunk("hours.txt"), chunk("rules.txt")],
        };

        let turn = render_answer(&answer);

        assert_eq!(turn, "📖 Sources: rules.txt, hours.txt\n\nOpens at 9am.\n");
    }

    #[test]
    fn no_status_line_without_retrieved_context() {
        let answer = Answer { text: " nothing known ".to_string(), context: Vec::new() };

        assert_eq!(render_answer(&answer), "nothing known\n");
    }
}
