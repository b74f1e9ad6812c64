use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spotify_chatbot::chat::Conversation;
use spotify_chatbot::cli_style::{get_styles, print_banner, print_error, print_tokens, print_turn};
use spotify_chatbot::config::{self, AppConfig, ConfigArgs, Secrets};
use spotify_chatbot::context::AppContext;

use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    history::FileHistory,
    validate::Validator,
    CompletionType, Config, Editor, Helper,
};

const PROMPT: &str = ">> ";

const COMMANDS: &[&str] = &[":tokens", ":history", ":clear", ":exit"];

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

enum LineOutcome {
    Continue,
    Exit,
}

#[derive(rustyline_derive::Hinter)]
struct ChatHelper {
    commands_names: Vec<String>,
}

impl ChatHelper {
    pub fn new() -> Self {
        ChatHelper {
            commands_names: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Completer for ChatHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with(':') || line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for ChatHelper {}
impl Validator for ChatHelper {}
impl Helper for ChatHelper {}

fn reprint(conversation: &Conversation) {
    print_banner();
    for turn in conversation.turns() {
        print_turn(turn);
    }
}

fn handle_line(
    line: &str,
    conversation: &mut Conversation,
    context: &AppContext,
    runtime: &tokio::runtime::Runtime,
) -> LineOutcome {
    match line {
        ":exit" => return LineOutcome::Exit,
        ":clear" => {
            *conversation = Conversation::new();
            reprint(conversation);
        }
        ":history" => reprint(conversation),
        ":tokens" => {
            reprint(conversation);
            match conversation.last_user_utterance() {
                Some(utterance) => {
                    println!();
                    print_tokens(&context.pipeline.classifier().analyze(utterance));
                }
                None => print_error("Nothing typed yet."),
            }
        }
        text => {
            conversation.push_user(text);
            let reply = runtime.block_on(context.pipeline.respond(text));
            match reply {
                Ok(reply) => {
                    conversation.push_bot(reply.reply);
                    reprint(conversation);
                }
                Err(e) => {
                    reprint(conversation);
                    print_error(&e.to_string());
                }
            }
        }
    }
    LineOutcome::Continue
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // Quiet by default so logs don't interleave with the conversation.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config.config {
        Some(path) => Some(config::FileConfig::load(path)?),
        None => None,
    };
    let cli_config: config::CliConfig = (&cli_args.config).into();
    let app_config = AppConfig::resolve(&cli_config, file_config, Secrets::from_env()?)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;
    let context = runtime
        .block_on(AppContext::initialize(&app_config))
        .context("Failed to initialize application context")?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<ChatHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(ChatHelper::new()));

    let mut conversation = Conversation::new();
    let _ = rl.clear_screen();
    print_banner();

    loop {
        let readline = rl.readline(PROMPT);

        let _ = rl.clear_screen();
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    reprint(&conversation);
                    continue;
                }
                let _ = rl.add_history_entry(line);
                match handle_line(line, &mut conversation, &context, &runtime) {
                    LineOutcome::Continue => {}
                    LineOutcome::Exit => break,
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }

    context.shutdown();
    Ok(())
}
