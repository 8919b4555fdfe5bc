use std::io::{self, IsTerminal, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
    ExecutableCommand, QueueableCommand,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core::models::payment::PaymentChannel;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("selection cancelled")]
    Cancelled,
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

pub struct SelectableChannel {
    pub uuid: String,
    pub display_name: String,
    pub fee_hint: String,
}

/// RAII guard that restores terminal state on drop (even on panic).
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = io::stdout().execute(cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// "3% fee" / "2 flat fee" / "no fee".
pub fn fee_hint(channel: &PaymentChannel) -> String {
    if channel.has_fixed_fee() {
        format!("{} flat fee", channel.fixed_fee.normalize())
    } else if channel.percent_fee > Decimal::ZERO {
        match channel.percent_fee.checked_mul(Decimal::ONE_HUNDRED) {
            Some(percent) => format!("{}% fee", percent.normalize()),
            None => "percentage fee".to_string(),
        }
    } else {
        "no fee".to_string()
    }
}

/// Build picker rows in display order.
pub fn build_selectable_list(channels: &[&PaymentChannel]) -> Vec<SelectableChannel> {
    channels
        .iter()
        .map(|c| SelectableChannel {
            uuid: c.uuid.clone(),
            display_name: c.display_name(),
            fee_hint: fee_hint(c),
        })
        .collect()
}

/// Returns `Ok(Some(uuid))` on confirm, `Ok(None)` if not a TTY,
/// `Err(SelectError::Cancelled)` on Esc/q/Ctrl-C.
pub fn interactive_select(items: &[SelectableChannel]) -> Result<Option<String>, SelectError> {
    if !io::stdin().is_terminal() || items.is_empty() {
        return Ok(None);
    }

    let _guard = RawModeGuard::enable()?;

    let mut cursor_pos: usize = 0;

    draw(items, cursor_pos)?;

    loop {
        if let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        {
            match (code, modifiers) {
                (KeyCode::Char('c'), KeyModifiers::CONTROL)
                | (KeyCode::Esc, _)
                | (KeyCode::Char('q'), KeyModifiers::NONE) => {
                    clear_ui(items.len())?;
                    return Err(SelectError::Cancelled);
                }
                (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                    cursor_pos = cursor_pos.saturating_sub(1);
                }
                (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                    if cursor_pos + 1 < items.len() {
                        cursor_pos += 1;
                    }
                }
                (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => {
                    clear_ui(items.len())?;
                    return Ok(Some(items[cursor_pos].uuid.clone()));
                }
                _ => {}
            }
            draw(items, cursor_pos)?;
        }
    }
}

fn draw(items: &[SelectableChannel], cursor_pos: usize) -> io::Result<()> {
    let mut stdout = io::stdout();

    stdout
        .queue(cursor::MoveToColumn(0))?
        .queue(terminal::Clear(ClearType::FromCursorDown))?;

    stdout
        .queue(Print("Select a payment method\r\n"))?
        .queue(Print("\r\n"))?
        .queue(Print("  Use arrow keys to navigate, enter to confirm\r\n"))?
        .queue(Print("\r\n"))?;

    for (i, item) in items.iter().enumerate() {
        let marker = if i == cursor_pos { "> " } else { "  " };

        if i == cursor_pos {
            stdout.queue(SetAttribute(Attribute::Reverse))?;
        }

        stdout.queue(Print(format!(
            "{marker}{:<24} {}\r\n",
            item.display_name, item.fee_hint
        )))?;

        if i == cursor_pos {
            stdout.queue(SetAttribute(Attribute::Reset))?;
        }
    }

    stdout
        .queue(Print("\r\n"))?
        .queue(Print("  enter: select | q: cancel\r\n"))?;

    // header(4) + items + footer(2)
    let total_lines = items.len() + 5;
    stdout.queue(cursor::MoveUp(total_lines as u16 + 1))?;

    stdout.flush()?;
    Ok(())
}

fn clear_ui(item_count: usize) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout
        .queue(cursor::MoveToColumn(0))?
        .queue(terminal::Clear(ClearType::FromCursorDown))?;
    let total_lines = item_count + 6;
    for _ in 0..total_lines {
        stdout.queue(Print(format!("{:66}\r\n", "")))?;
    }
    stdout.queue(cursor::MoveUp(total_lines as u16))?;
    stdout
        .queue(cursor::MoveToColumn(0))?
        .queue(terminal::Clear(ClearType::FromCursorDown))?;
    stdout.flush()?;
    Ok(())
}
