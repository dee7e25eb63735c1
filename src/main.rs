use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use drivetest_scraper::{
    LoadFromEnv, LocalJsonStore, QuestionBank, ScrapeOrchestrator, ScrapingContext, ScrapingEnv,
    logger, render_chapter_list, render_question, run_quiz,
};
use log::info;

#[derive(Parser)]
#[command(version, about = "Scrapes the driving test question bank into a local JSON database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every chapter and save the result.
    Scrape,
    /// Print the saved chapters, or one chapter's questions with answers.
    Show {
        #[arg(short, long)]
        chapter: Option<u32>,
        /// Hide answers and reveal each one on request.
        #[arg(short, long, requires = "chapter")]
        quiz: bool,
    },
}

async fn run_scrape_job(env: ScrapingEnv) -> anyhow::Result<()> {
    let ctx = ScrapingContext::new(env).context("Failed to set up scraping")?;
    let store = LocalJsonStore::new(&ctx.scraping_env.db_path, &ctx.scraping_env.db_image_dir);

    info!("Creating empty question bank");
    let mut bank = QuestionBank::new(&ctx.scraping_env.scrape_image_dir);
    let summary = ScrapeOrchestrator::new(&ctx.request_client, &ctx.site_config)
        .fill_question_bank(&mut bank)
        .await
        .context("Scraping aborted")?;

    info!("Scraping completed, saving to {}", store.db_file_path().display());
    store
        .save(&bank)
        .with_context(|| format!("Failed to save to {}", store.db_file_path().display()))?;
    println!(
        "Scraped {} questions across {} chapters ({} skipped).",
        summary.scraped, summary.chapters, summary.skipped
    );
    Ok(())
}

fn run_show_job(env: &ScrapingEnv, chapter: Option<u32>, quiz: bool) -> anyhow::Result<()> {
    let store = LocalJsonStore::new(&env.db_path, &env.db_image_dir);
    let bank = store
        .load()
        .with_context(|| format!("Failed to load {}", store.db_file_path().display()))?;

    let Some(number) = chapter else {
        print!("{}", render_chapter_list(&bank));
        return Ok(());
    };

    let ids = match bank.get_ids_for_chapter(number) {
        Ok(ids) => ids,
        Err(e) => bail!("{e}; run `show` without --chapter to list chapters"),
    };
    if ids.is_empty() {
        println!("No questions found for this chapter.");
        return Ok(());
    }
    println!("Chapter {}: {}", number, bank.describe_chapter(number)?);
    if quiz {
        let revealed = run_quiz(&bank, ids, std::io::stdin().lock(), std::io::stdout())?;
        println!("\nRevealed {} of {} answers.", revealed, ids.len());
        return Ok(());
    }
    for id in ids {
        println!();
        print!("{}", render_question(bank.get_question(id)?, true));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let env = ScrapingEnv::load_from_env().context("Failed to read environment configuration")?;
    logger::init(&env.log_dir);

    match cli.command {
        Command::Scrape => run_scrape_job(env).await,
        Command::Show { chapter, quiz } => run_show_job(&env, chapter, quiz),
    }
}
