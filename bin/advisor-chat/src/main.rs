//! advisor-chat – terminal rendition of the site's chat widget.
//!
//! Type a message to chat, `/contact` to send a consultation request with
//! the conversation attached, `/quit` to leave.

mod client;

use std::io::Write;
use std::time::Duration;

use advisor_core::session::{ChatSession, GREETING, INQUIRY_SENT};
use advisor_core::validation::{ContactForm, validate_chat_input};
use advisor_core::{InquiryKind, InquiryRequest, RateDecision, RateLimitPolicy, RateLimiter};
use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::client::FunctionsClient;

const CHAT_BUCKET: &str = "chat";
const FORM_BUCKET: &str = "form";

/// Chat with the AI advisor from a terminal.
#[derive(Debug, Parser)]
#[command(name = "advisor-chat", version)]
struct Cli {
    /// Base URL the functions are mounted under.
    #[arg(
        long,
        env = "ADVISOR_FUNCTIONS_URL",
        default_value = "http://127.0.0.1:3000/functions/v1"
    )]
    base_url: String,

    /// Key sent as the bearer token on every call.
    #[arg(long, env = "ADVISOR_PUBLISHABLE_KEY", default_value = "")]
    publishable_key: String,

    /// `tracing` filter for diagnostics on stderr.
    #[arg(long, env = "ADVISOR_LOG", default_value = "warn")]
    log: String,
}

type Input = Lines<BufReader<Stdin>>;

struct Widget {
    client: FunctionsClient,
    session: ChatSession,
    chat_limiter: RateLimiter,
    form_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_new(&cli.log)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut widget = Widget {
        client: FunctionsClient::new(&cli.base_url, &cli.publishable_key)?,
        session: ChatSession::new(),
        chat_limiter: RateLimiter::new(RateLimitPolicy::new(10, Duration::from_secs(60))),
        form_limiter: RateLimiter::new(RateLimitPolicy::new(3, Duration::from_secs(300))),
    };
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("Assistant: {GREETING}");
    loop {
        prompt("\nYou: ")?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/contact" => widget.contact(&mut input).await?,
            text => widget.chat(text).await?,
        }
    }
    Ok(())
}

impl Widget {
    async fn chat(&mut self, text: &str) -> Result<()> {
        let content = match validate_chat_input(text) {
            Ok(content) => content,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };
        if let RateDecision::Limited { retry_after_secs } = self.chat_limiter.check(CHAT_BUCKET) {
            println!("Too many messages. Please wait {retry_after_secs} seconds.");
            return Ok(());
        }

        let history = self.session.push_user(content).to_vec();
        self.session.begin_reply();
        print!("Assistant: ");

        let session = &mut self.session;
        let streamed = self
            .client
            .stream_chat(&history, |delta| {
                session.append_delta(delta);
                print!("{delta}");
                // A closed stdout only loses echo; the reply is still kept.
                let _ = std::io::stdout().flush();
            })
            .await;

        match streamed {
            Ok(()) => {
                self.session.finish_reply();
                println!();
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "chat error");
                self.session.abandon_reply();
                println!("\nUnable to connect. Please try again.");
            }
        }
        Ok(())
    }

    async fn contact(&mut self, input: &mut Input) -> Result<()> {
        println!("Contact Form (leave a field empty to see what is missing)");
        let form = ContactForm {
            name: ask(input, "Name: ").await?,
            email: ask(input, "Email: ").await?,
            message: ask(input, "How can Larry help? ").await?,
        };
        let form = match form.validate() {
            Ok(form) => form,
            Err(errors) => {
                for e in errors.iter() {
                    println!("  {}: {}", e.field, e.message);
                }
                return Ok(());
            }
        };
        if let RateDecision::Limited { retry_after_secs } = self.form_limiter.check(FORM_BUCKET) {
            println!("Too many submissions. Please wait {retry_after_secs} seconds.");
            return Ok(());
        }

        let inquiry = InquiryRequest {
            kind: InquiryKind::Consultation,
            name: form.name,
            email: form.email,
            message: form.message,
            context: Some(self.session.transcript()),
        };
        match self.client.send_inquiry(&inquiry).await {
            Ok(()) => {
                println!("Message sent! Larry will get back to you soon.");
                self.session.push_assistant(INQUIRY_SENT);
                println!("Assistant: {INQUIRY_SENT}");
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "form submission error");
                println!("Failed to send. Please try again or email directly.");
            }
        }
        Ok(())
    }
}

fn prompt(label: &str) -> Result<()> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(())
}

/// Read one answer; end of input counts as an empty answer.
async fn ask(input: &mut Input, label: &str) -> Result<String> {
    prompt(label)?;
    Ok(input.next_line().await?.unwrap_or_default())
}
