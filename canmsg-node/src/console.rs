//! Operator console: blocking line-based prompts for target id and message
//! text. All character-level editing is left to the terminal.

use std::io::{self, BufRead, Write};

use canmsg_core::TargetId;

/// Print `prompt` and read one line. `None` on EOF.
pub fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Prompt for a target id until the operator enters a valid 1..=5 value.
/// `None` on EOF.
pub fn prompt_target_id() -> io::Result<Option<TargetId>> {
    loop {
        let Some(line) = read_line("Enter target ID (1-5): ")? else {
            return Ok(None);
        };
        if line.is_empty() {
            continue;
        }
        match line.parse::<u8>().ok().and_then(|v| TargetId::new(v).ok()) {
            Some(target) => return Ok(Some(target)),
            None => println!("Invalid ID. Please enter a number 1..5."),
        }
    }
}

/// Prompt for the message text. `None` on EOF.
pub fn prompt_message() -> io::Result<Option<String>> {
    read_line("Enter message text: ")
}

/// Boxed banner for a completed message.
pub fn print_received(receiver_id: u8, message: &[u8]) {
    println!();
    println!("┌─────────────────────────────────");
    println!("│ Receiver #{receiver_id} - Message Received:");
    println!("│ Length: {} bytes", message.len());
    println!("├─────────────────────────────────");
    println!("│ {}", String::from_utf8_lossy(message));
    println!("└─────────────────────────────────");
    println!();
}
