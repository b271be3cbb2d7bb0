use std::{
    io::{
        self,
        BufRead,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
};

use chrono::Local;
use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use log::warn;

use kanshu::{
    audio,
    backup,
    core::{
        http::http_client,
        Config,
        StudyError,
    },
    quiz::{
        normalize_english,
        QuizMode,
        QuizSession,
        RomajiBackend,
    },
    scoring::ScoringService,
    store::{
        words,
        Store,
    },
    wanikani::{
        KanjiCache,
        WaniKaniClient,
    },
};

#[derive(Parser)]
#[command(name = "kanshu", about = "Kanji and listening practice from the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Force-refresh the kanji cache from the remote API
    Refresh,
    /// Quiz kanji readings or meanings
    Quiz {
        #[arg(long, value_enum, default_value_t = ModeArg::Meaning)]
        mode: ModeArg,
        /// Re-fetch the dataset before starting
        #[arg(long)]
        refresh: bool,
    },
    /// Listening practice over a daily word bundle
    Listen {
        /// Bundle date as yyyymmdd (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show review totals and accuracy
    Stats,
    /// Manage the vocabulary word list
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },
    /// Copy the database into its backups/ directory
    Backup,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Onyomi,
    Kunyomi,
    Meaning,
}

impl From<ModeArg> for QuizMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Onyomi => QuizMode::Onyomi,
            ModeArg::Kunyomi => QuizMode::Kunyomi,
            ModeArg::Meaning => QuizMode::Meaning,
        }
    }
}

#[derive(Subcommand)]
enum WordsAction {
    /// Add a word
    Add {
        word: String,
        translation: String,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        audio: Option<String>,
    },
    /// List all words, newest first
    List,
    /// Replace a word's fields by id
    Update {
        id: i64,
        word: String,
        translation: String,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        audio: Option<String>,
    },
    /// Delete a word by id
    Remove { id: i64 },
    /// Import words from a CSV file
    Import { path: PathBuf },
    /// Export words to a CSV file
    Export { path: PathBuf },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = run(cli, &config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), StudyError> {
    let store = Store::open(&config.db_path)?;

    match cli.command {
        Command::Refresh => {
            let items = kanji_cache(&store, config)?.get_kanji(true)?;
            println!("cached {} kanji", items.len());
        }
        Command::Quiz { mode, refresh } => run_quiz(&store, config, mode.into(), refresh)?,
        Command::Listen { date } => run_listen(&store, config, date)?,
        Command::Stats => {
            let stats = ScoringService::new(&store).read()?;
            println!("Total Reviews: {}", stats.total);
            println!("Correct: {}", stats.correct);
            println!("Wrong: {}", stats.wrong);
            println!("Accuracy: {:.1}%", stats.accuracy());
        }
        Command::Words { action } => run_words(&store, action)?,
        Command::Backup => match backup::backup_db(&config.db_path)? {
            Some(path) => println!("backed up to {}", path.display()),
            None => println!("nothing to back up today"),
        },
    }
    Ok(())
}

fn kanji_cache<'a>(
    store: &'a Store,
    config: &Config,
) -> Result<KanjiCache<'a, WaniKaniClient>, StudyError> {
    let client = WaniKaniClient::new(&config.api_url, &config.api_token)?;
    Ok(KanjiCache::new(store, client, config.cache_ttl_days, config.cache_payload_path()))
}

fn run_quiz(
    store: &Store,
    config: &Config,
    mode: QuizMode,
    refresh: bool,
) -> Result<(), StudyError> {
    let items = kanji_cache(store, config)?.get_kanji(refresh)?;
    let backend = RomajiBackend::from_name(&config.romaji_backend);
    let mut session = QuizSession::new(items, mode, backend, ScoringService::new(store));
    if session.is_empty() {
        println!("no kanji cached yet; run `kanshu refresh` first");
        return Ok(());
    }

    println!("Type your answer. :u undoes a typo, :q quits.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    'session: loop {
        let Some(prompt) =
            session.draw().map(|item| item.characters.clone().unwrap_or_else(|| "?".to_string()))
        else {
            break;
        };

        // Wrong answers keep the same prompt up, like retyping after a typo
        loop {
            print!("{prompt} > ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else { break 'session };
            let line = line?;

            match line.trim() {
                ":q" | ":quit" => break 'session,
                ":u" | ":undo" => {
                    if session.undo_last()? {
                        println!("undone, you got credit");
                    } else {
                        println!("nothing to undo");
                    }
                }
                guess => {
                    let Some(outcome) = session.submit(guess)? else { break 'session };
                    if outcome.correct {
                        println!("correct!");
                        break;
                    }
                    let expected = if outcome.expected.is_empty() {
                        "(none)".to_string()
                    } else {
                        outcome.expected.join(", ")
                    };
                    println!("wrong. expected: {expected}");
                }
            }
        }
    }

    let stats = ScoringService::new(store).read()?;
    println!(
        "total {} / correct {} / wrong {} / accuracy {:.1}%",
        stats.total,
        stats.correct,
        stats.wrong,
        stats.accuracy()
    );
    Ok(())
}

fn run_listen(store: &Store, config: &Config, date: Option<String>) -> Result<(), StudyError> {
    let date = date.unwrap_or_else(|| Local::now().format("%Y%m%d").to_string());
    let bundle = store.bundle_for_date(&date)?;
    if bundle.is_empty() {
        println!("no words available; add some with `kanshu words add`");
        return Ok(());
    }

    let client = http_client()?;
    let scoring = ScoringService::new(store);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("{} words in the {date} bundle. Type the English meaning, :q quits.", bundle.len());
    for (idx, word) in bundle.iter().enumerate() {
        let audio_path = match word.audio_path.as_deref() {
            Some(p) if Path::new(p).exists() => Some(PathBuf::from(p)),
            _ => match audio::ensure_audio(&client, &config.media_dir, &word.word) {
                Ok(path) => {
                    store.set_word_audio(word.id, &path.to_string_lossy())?;
                    Some(path)
                }
                Err(e) => {
                    warn!("audio unavailable for {}: {e}", word.word);
                    None
                }
            },
        };

        match audio_path {
            Some(path) => println!("[{}/{}] play: {}", idx + 1, bundle.len(), path.display()),
            // No audio to play, fall back to showing the word itself
            None => println!("[{}/{}] word: {}", idx + 1, bundle.len(), word.word),
        }

        print!("meaning > ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim() == ":q" {
            break;
        }

        let correct = normalize_english(&line) == normalize_english(&word.translation);
        scoring.record(correct)?;
        if correct {
            println!("correct!");
        } else {
            println!("wrong. it means: {}", word.translation);
        }
    }

    let stats = scoring.read()?;
    println!("accuracy so far: {:.1}%", stats.accuracy());
    Ok(())
}

fn run_words(store: &Store, action: WordsAction) -> Result<(), StudyError> {
    match action {
        WordsAction::Add { word, translation, tags, audio } => {
            let id = store.insert_word(&word, &translation, tags.as_deref(), audio.as_deref())?;
            println!("added #{id}");
        }
        WordsAction::List => {
            for w in store.list_words()? {
                println!(
                    "{:>4}  {}  {}  {}",
                    w.id,
                    w.word,
                    w.translation,
                    w.tags.as_deref().unwrap_or("")
                );
            }
        }
        WordsAction::Update { id, word, translation, tags, audio } => {
            if store.update_word(id, &word, &translation, tags.as_deref(), audio.as_deref())? {
                println!("updated #{id}");
            } else {
                println!("no word #{id}");
            }
        }
        WordsAction::Remove { id } => {
            if store.delete_word(id)? {
                println!("removed #{id}");
            } else {
                println!("no word #{id}");
            }
        }
        WordsAction::Import { path } => {
            let count = words::import_csv(store, &path)?;
            println!("imported {count} words");
        }
        WordsAction::Export { path } => {
            let count = words::export_csv(store, &path)?;
            println!("exported {count} words");
        }
    }
    Ok(())
}
