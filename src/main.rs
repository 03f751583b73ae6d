// ABOUTME: CLI entrypoint for classnotes command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use classnotes::{
    cli::{prompt_month, Cli, Commands},
    compile::{compile_summaries, CompileOptions},
    config::{load_dotenv, resolve_notion_token, resolve_openai_key, resolve_student_list_page},
    logging::init_tracing,
    notion::NotionClient,
    store::SummaryBook,
    summary::{set_api_key_in_keychain, OpenAiSummarizer},
    Month, Result,
};
use std::io;
use tracing::{debug, warn};

fn main() {
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_level.as_deref()) {
        eprintln!("classnotes: failed to initialize logging: {}", e);
    }

    match dotenv {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded .env"),
        Ok(None) => debug!("no .env file found"),
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    if let Err(e) = run(cli) {
        eprintln!("classnotes: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn resolve_month(month: Option<Month>) -> Result<Month> {
    match month {
        Some(month) => Ok(month),
        None => prompt_month(&mut io::stdin().lock(), &mut io::stderr(), Month::current()),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command() {
        Commands::Compile => {
            let page_id = resolve_student_list_page(cli.student_list_page.clone())?;
            let token = resolve_notion_token(cli.notion_token.clone())?;
            let mut notion = NotionClient::new(token, Some(cli.notion_base.clone()))?;

            if cli.no_throttle {
                notion = notion.disable_throttle();
            } else if let Some((min, max)) = cli.throttle_ms {
                notion = notion.with_throttle(min, max);
            }

            // A dry run never calls the model, so a missing key is fine there
            let api_key = match resolve_openai_key(cli.openai_key.clone()) {
                Ok(key) => key,
                Err(_) if cli.dry_run => String::new(),
                Err(e) => return Err(e),
            };
            let summarizer =
                OpenAiSummarizer::new(&api_key, cli.openai_base.clone(), Some(cli.model.clone()))?;

            let month = resolve_month(cli.month)?;
            let options = CompileOptions {
                student_list_page_id: page_id,
                month,
                output_dir: cli.output_dir.clone(),
                dry_run: cli.dry_run,
                min_notes_len: cli.min_notes_len,
            };

            let stats = compile_summaries(&notion, &summarizer, &options)?;
            println!("{}", stats.report(options.dry_run));
        }
        Commands::List => {
            let month = resolve_month(cli.month)?;
            let path = cli.output_dir.join(month.summary_file_name());
            let book = SummaryBook::read(&path)?;

            if book.is_empty() {
                println!("No summaries for {} ({})", month, path.display());
                return Ok(());
            }

            for section in book.students() {
                println!("{} ({} classes)", section.name, section.len());
                for entry in section.entries() {
                    println!("  {}: {}", entry.title, entry.summary.replace('\n', " "));
                }
            }
        }
        Commands::SetApiKey { key } => {
            set_api_key_in_keychain(&key)?;
            println!("OpenAI API key stored in keychain");
        }
    }

    Ok(())
}
