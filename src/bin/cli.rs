use chrono::NaiveDate;
use colored::*;
use formd::{
    core::{
        config::FormDConfig,
        service::FormDService,
        session::Session,
        shell::{Command, Reply, Shell},
    },
    render::{self, ExportFormat},
    repl,
};
use rustyline::error::ReadlineError;
use std::{error::Error, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "formd-cli", about = "Daily Form D filings from SEC EDGAR")]
struct Opt {
    /// First filing date (YYYY-MM-DD). With --end, runs one query and exits.
    #[structopt(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Last filing date (YYYY-MM-DD)
    #[structopt(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Also write the results as CSV
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,

    /// Also write the results as an HTML table
    #[structopt(long, parse(from_os_str))]
    html: Option<PathBuf>,
}

fn print_replies(replies: &[Reply]) -> bool {
    let mut quit = false;
    for reply in replies {
        match reply {
            Reply::Table(records) => {
                println!("{}", render::render_table(records));
                println!("{}", format!("{} filings", records.len()).dimmed());
            }
            Reply::Message(msg) => println!("{}", msg.yellow()),
            Reply::Error(msg) => eprintln!("{}", msg.red()),
            Reply::Assistant(msg) => println!("{} {}", "assistant:".green().bold(), msg),
            Reply::Quit => quit = true,
        }
    }
    quit
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::debug!("Logger initialized");

    let opt = Opt::from_args();
    let config = FormDConfig::from_env()?;

    let service = FormDService::from_config(&config, true)?;
    let mut shell = Shell::new(service, Session::new(config.openai_key.clone()));

    if let (Some(start), Some(end)) = (opt.start, opt.end) {
        let replies = shell
            .handle(Command::Filings(formd::edgar::query::SearchQuery::new(start, end)))
            .await;
        print_replies(&replies);
        shell.rendered();

        let exports = [(ExportFormat::Csv, opt.csv), (ExportFormat::Html, opt.html)];
        for (format, path) in exports {
            if let Some(path) = path {
                let replies = shell.handle(Command::Export(format, path)).await;
                print_replies(&replies);
            }
        }
        return Ok(());
    }

    println!("{}", "Daily Form D Filings".bold());
    println!("Type /help for commands, 'quit' to exit");

    let mut rl = repl::create_editor()?;

    loop {
        match rl.readline(&format!("{}", "> ".green().bold())) {
            Ok(line) => {
                let input = line.trim().to_string();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(&input)?;

                let replies = shell.dispatch(&input).await;
                let quit = print_replies(&replies);
                shell.rendered();
                if quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("\nGoodbye!");

    log::debug!("Saving REPL history");
    repl::save_history(&mut rl)?;

    Ok(())
}
