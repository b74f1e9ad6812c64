//! Terminal styling shared by the binaries.

use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::chat::{Speaker, Turn};
use crate::intent::Token;

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .valid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

pub mod colors {
    use crossterm::style::Color;

    pub const GREEN: Color = Color::Rgb {
        r: 30,
        g: 215,
        b: 96,
    };
    pub const CYAN: Color = Color::Rgb {
        r: 0,
        g: 200,
        b: 255,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
}

pub fn print_banner() {
    println!("{}", "  ♫  spotify-chatbot".with(colors::GREEN).bold());
    println!(
        "{}",
        "  Type a message, or :tokens, :history, :clear, :exit".with(colors::DIM)
    );
    println!();
}

pub fn print_error(message: &str) {
    println!(" {} {}", "✗".with(colors::RED).bold(), message.with(colors::RED));
}

pub fn print_turn(turn: &Turn) {
    let label = format!("{:>4}:", turn.speaker.to_string());
    let label = match turn.speaker {
        Speaker::User => label.with(colors::CYAN).bold(),
        Speaker::Bot => label.with(colors::GREEN).bold(),
    };
    let mut lines = turn.utterance.lines();
    println!("{} {}", label, lines.next().unwrap_or_default());
    for line in lines {
        println!("      {}", line);
    }
}

/// Spaces that bring `text` up to `width` terminal columns.
fn padding_for(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(text.width()))
}

/// One row per token: the surface form and its lemma.
pub fn print_tokens(tokens: &[Token]) {
    if tokens.is_empty() {
        println!("{}", "  (no tokens)".with(colors::DIM));
        return;
    }
    let width = tokens.iter().map(|t| t.text.width()).max().unwrap_or(0);
    for token in tokens {
        println!(
            "  {}{}  {}  {}",
            token.text.as_str().with(colors::CYAN),
            padding_for(&token.text, width),
            "→".with(colors::DIM),
            token.lemma.as_str().with(colors::GREEN)
        );
    }
}
